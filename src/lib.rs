//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * the interpreter owns all machine state: memory, registers, stack,
//!   timers and the framebuffer; nothing is global
//! * one instruction per `step()`; the host decides how many steps to run
//!   between timer ticks (conventionally ten per 60Hz frame)
//! * Fx0A never blocks: with no key down the instruction is simply re-run
//!   on the next step
//! * faults (bad return, call too deep, out-of-bounds memory) come back from
//!   `step()` as values; the interpreter never exits the process
//! * display and input sit behind traits so the interpreter doesn't need to
//!   know how the screen or keyboard work
//!
//! Model
//!
//! Environment
//!  |-- display, config
//!  |-- interpreter(input, rng, config)
//!  |    |-- memory map (font, program)
//!  |    |-- framebuffer
//!  |    `-- instruction decode
//!  `-- main loop
//!       |-- input.poll()            // stop if the user quits
//!       |-- interpreter.tick_timers()
//!       |-- interpreter.step() x cycles_per_frame
//!       |-- display.draw(interpreter.framebuffer())
//!       `-- sleep until the next frame
pub mod config;
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;

pub use config::Chip8Config;
pub use display::{Display, Framebuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use environment::{Environment, Exit};
pub use error::{FaultKind, LoadError, MemoryError, ProgramTooLarge, RuntimeFault};
pub use input::Input;
pub use instruction::Instruction;
pub use interpreter::Chip8Interpreter;
