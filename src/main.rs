use anyhow::{bail, Context, Result};
use std::env;
use std::fs::File;
use std::io::Read;

use chip8::display::MonoTermDisplay;
use chip8::input::StdinInput;
use chip8::memory::CHIP8_MAX_PROGRAM_BYTES;
use chip8::{Chip8Config, Chip8Interpreter, Environment, Exit, LoadError, ProgramTooLarge};

/// read a whole ROM, rejecting it up front if it can't fit in memory
fn read_rom(reader: &mut impl Read) -> Result<Vec<u8>, LoadError> {
    let mut rom = Vec::new();
    reader.read_to_end(&mut rom)?;
    if rom.len() > CHIP8_MAX_PROGRAM_BYTES {
        return Err(ProgramTooLarge {
            len: rom.len(),
            available: CHIP8_MAX_PROGRAM_BYTES,
        }
        .into());
    }
    Ok(rom)
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let rom_path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => bail!("usage: chip8 <ROM file>"),
    };

    let config = Chip8Config::from_env();

    // read the program before touching the terminal, so errors print cleanly
    let mut f = File::open(&rom_path).with_context(|| format!("failed to open ROM {}", rom_path))?;
    let rom = read_rom(&mut f).with_context(|| format!("failed to load ROM {}", rom_path))?;

    let input = StdinInput::new(config.key_hold).context("failed to set up keyboard")?;
    let mut interpreter =
        Chip8Interpreter::new(input).with_max_stack_depth(config.max_stack_depth);
    interpreter.load_program(&rom)?;

    let mut display = MonoTermDisplay::new().context("failed to set up display")?;
    let exit = Environment::new(interpreter, &mut display, config).main_loop()?;
    drop(display);

    // shove a newline on stdout to stop the cli messing up the last frame
    println!();
    match exit {
        Exit::Fault(fault) => bail!("halted: {}", fault),
        Exit::Quit | Exit::FramesElapsed => Ok(()),
    }
}
