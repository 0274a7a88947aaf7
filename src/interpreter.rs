//! # interpreter
//!
//! One owned CHIP-8 machine: 4K of memory, sixteen 8-bit registers V0-VF,
//! the 16-bit index register I, the program counter (0x200 at reset), a call
//! stack of return addresses, and two 8-bit countdown timers (delay, sound).
//!
//! The host drives it:
//!  * `step()` runs exactly one instruction and always returns promptly;
//!    Fx0A with no key down just leaves pc where it is, so the next step
//!    re-executes it
//!  * `tick_timers()` counts both timers down by one, nominally at 60Hz
//!  * `framebuffer()` is read whenever the host wants to redraw
//!
//! VF doubles as the carry/borrow/collision flag and is clobbered by 8xy4-8xyE
//! and Dxyn. The flag is written before the result, so with x == F the result
//! wins.

use crate::display::Framebuffer;
use crate::error::{FaultKind, LoadError, ProgramTooLarge, RuntimeFault};
use crate::input::{Input, KEY_COUNT};
use crate::instruction::Instruction;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_FONT_GLYPH_BYTES, CHIP8_PROGRAM_ADDR};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::io;

pub const REGISTER_COUNT: usize = 16;

/// conventional hardware limit on nested calls
pub const DEFAULT_MAX_STACK_DEPTH: usize = 16;

const VF: usize = 0xf;

/// where pc goes once an instruction has executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Advance,
    Skip,
    Jump(u16),
    /// re-execute the same instruction next step
    Stall,
}

impl Next {
    fn skip_if(cond: bool) -> Self {
        if cond {
            Next::Skip
        } else {
            Next::Advance
        }
    }
}

pub struct Chip8Interpreter<I: Input> {
    memory: Chip8MemoryMap,
    framebuffer: Framebuffer,
    input: I,
    rng: Box<dyn RngCore>,
    v: [u8; REGISTER_COUNT],
    i: u16,
    program_counter: u16,
    stack: Vec<u16>,
    max_stack_depth: usize,
    delay_timer: u8,
    sound_timer: u8,
}

impl<I: Input> Chip8Interpreter<I> {
    /// zeroed machine with the font loaded, randomness seeded from the OS
    pub fn new(input: I) -> Self {
        Self::with_rng(input, Box::new(StdRng::from_entropy()))
    }

    /// as `new`, drawing Cxkk's random bytes from `rng`
    pub fn with_rng(input: I, rng: Box<dyn RngCore>) -> Self {
        let mut i = Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            framebuffer: Framebuffer::new(),
            input,
            rng,
            v: [0; REGISTER_COUNT],
            i: 0x0000,
            program_counter: CHIP8_PROGRAM_ADDR,
            stack: Vec::with_capacity(DEFAULT_MAX_STACK_DEPTH),
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            delay_timer: 0,
            sound_timer: 0,
        };
        i.load_font();
        i
    }

    /// limit how deep 2nnn may nest before it faults
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// (re)write the hex digit glyphs at 0x050
    pub fn load_font(&mut self) {
        self.memory.load_font();
    }

    /// load a chip8 program at 0x200
    pub fn load_program(&mut self, data: &[u8]) -> Result<(), ProgramTooLarge> {
        self.memory.load_program(data)
    }

    /// load a chip8 program from a file or whatever
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<(), LoadError> {
        self.memory.load_program_from(reader)
    }

    /// fetch, decode and execute one instruction. On a fault nothing has
    /// changed, pc included.
    pub fn step(&mut self) -> Result<(), RuntimeFault> {
        let pc = self.program_counter;
        let word = self.memory.get_word(pc).map_err(|e| RuntimeFault {
            pc,
            opcode: 0,
            kind: e.into(),
        })?;
        let instruction = Instruction::decode(word);
        log::trace!("0x{:03x}: {:04x}  {}", pc, word, instruction);

        let next = self.execute(instruction).map_err(|kind| RuntimeFault {
            pc,
            opcode: word,
            kind,
        })?;
        self.program_counter = match next {
            Next::Advance => pc.wrapping_add(2),
            Next::Skip => pc.wrapping_add(4),
            Next::Jump(addr) => addr,
            Next::Stall => pc,
        };
        Ok(())
    }

    /// count both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// move past the current instruction without executing it; lets a host
    /// carry on after a fault
    pub fn skip_instruction(&mut self) {
        self.program_counter = self.program_counter.wrapping_add(2);
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// return addresses, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// the tone should be playing while the sound timer is running
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// every check that can fault runs before any state is written
    fn execute(&mut self, instruction: Instruction) -> Result<Next, FaultKind> {
        use Instruction::*;
        let v = &mut self.v;
        let next = match instruction {
            Cls => {
                self.framebuffer.clear();
                Next::Advance
            }
            Ret => match self.stack.pop() {
                Some(addr) => Next::Jump(addr),
                None => return Err(FaultKind::StackUnderflow),
            },
            Jp(addr) => Next::Jump(addr),
            Call(addr) => {
                if self.stack.len() >= self.max_stack_depth {
                    return Err(FaultKind::StackOverflow {
                        depth: self.stack.len(),
                    });
                }
                self.stack.push(self.program_counter.wrapping_add(2));
                Next::Jump(addr)
            }
            SeByte(x, kk) => Next::skip_if(v[x as usize] == kk),
            SneByte(x, kk) => Next::skip_if(v[x as usize] != kk),
            SeReg(x, y) => Next::skip_if(v[x as usize] == v[y as usize]),
            LdByte(x, kk) => {
                v[x as usize] = kk;
                Next::Advance
            }
            AddByte(x, kk) => {
                v[x as usize] = v[x as usize].wrapping_add(kk);
                Next::Advance
            }
            LdReg(x, y) => {
                v[x as usize] = v[y as usize];
                Next::Advance
            }
            Or(x, y) => {
                v[x as usize] |= v[y as usize];
                Next::Advance
            }
            And(x, y) => {
                v[x as usize] &= v[y as usize];
                Next::Advance
            }
            Xor(x, y) => {
                v[x as usize] ^= v[y as usize];
                Next::Advance
            }
            AddReg(x, y) => {
                let (sum, carry) = v[x as usize].overflowing_add(v[y as usize]);
                v[VF] = carry as u8;
                v[x as usize] = sum;
                Next::Advance
            }
            Sub(x, y) => {
                v[VF] = (v[x as usize] > v[y as usize]) as u8;
                v[x as usize] = v[x as usize].wrapping_sub(v[y as usize]);
                Next::Advance
            }
            Shr(x) => {
                v[VF] = v[x as usize] & 0x01;
                v[x as usize] >>= 1;
                Next::Advance
            }
            Subn(x, y) => {
                v[VF] = (v[y as usize] > v[x as usize]) as u8;
                v[x as usize] = v[y as usize].wrapping_sub(v[x as usize]);
                Next::Advance
            }
            Shl(x) => {
                v[VF] = (v[x as usize] >> 7) & 0x01;
                v[x as usize] <<= 1;
                Next::Advance
            }
            SneReg(x, y) => Next::skip_if(v[x as usize] != v[y as usize]),
            LdI(addr) => {
                self.i = addr;
                Next::Advance
            }
            JpV0(addr) => Next::Jump(addr + v[0] as u16),
            Rnd(x, kk) => {
                v[x as usize] = self.rng.gen::<u8>() & kk;
                Next::Advance
            }
            Drw(x, y, n) => {
                let sprite = self.memory.get_ro_slice(self.i, n as usize)?;
                let collision = self
                    .framebuffer
                    .draw_sprite(v[x as usize], v[y as usize], sprite);
                v[VF] = collision as u8;
                Next::Advance
            }
            Skp(x) => Next::skip_if(self.input.is_key_down(v[x as usize])),
            Sknp(x) => Next::skip_if(!self.input.is_key_down(v[x as usize])),
            LdRegDt(x) => {
                v[x as usize] = self.delay_timer;
                Next::Advance
            }
            LdKey(x) => {
                // lowest-numbered key wins
                let input = &self.input;
                match (0..KEY_COUNT as u8).find(|&k| input.is_key_down(k)) {
                    Some(k) => {
                        v[x as usize] = k;
                        Next::Advance
                    }
                    None => Next::Stall,
                }
            }
            LdDtReg(x) => {
                self.delay_timer = v[x as usize];
                Next::Advance
            }
            LdSt(x) => {
                self.sound_timer = v[x as usize];
                Next::Advance
            }
            AddI(x) => {
                self.i = self.i.wrapping_add(v[x as usize] as u16);
                Next::Advance
            }
            LdF(x) => {
                self.i = self.memory.font_addr + v[x as usize] as u16 * CHIP8_FONT_GLYPH_BYTES;
                Next::Advance
            }
            LdB(x) => {
                let value = v[x as usize];
                self.memory
                    .write(&[value / 100, (value / 10) % 10, value % 10], self.i)?;
                Next::Advance
            }
            LdDerefIReg(x) => {
                self.memory.write(&v[..=x as usize], self.i)?;
                Next::Advance
            }
            LdRegDerefI(x) => {
                let src = self.memory.get_ro_slice(self.i, x as usize + 1)?;
                v[..=x as usize].copy_from_slice(src);
                Next::Advance
            }
            Unknown(word) => {
                log::trace!("ignoring unrecognised opcode 0x{:04x}", word);
                Next::Advance
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DummyInput;
    use rand::rngs::mock::StepRng;

    /// every Cxkk draws 0xab
    fn machine(program: &[u8]) -> Chip8Interpreter<DummyInput> {
        let mut m = Chip8Interpreter::with_rng(DummyInput::default(), Box::new(StepRng::new(0xab, 0)));
        m.load_program(program).unwrap();
        m
    }

    fn run(m: &mut Chip8Interpreter<DummyInput>, steps: usize) {
        for _ in 0..steps {
            m.step().unwrap();
        }
    }

    #[test]
    fn test_initial_state() {
        let m = machine(&[]);
        assert_eq!(m.program_counter(), 0x200);
        assert_eq!(m.index(), 0);
        assert_eq!(m.registers(), &[0; 16]);
        assert!(m.stack().is_empty());
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
        assert_eq!(m.framebuffer().lit_count(), 0);
        // font is in place
        assert_eq!(m.memory().get_byte(0x50).unwrap(), 0xf0);
    }

    #[test]
    fn test_program_load_from_reader() -> Result<(), LoadError> {
        let mut m = machine(&[]);
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        m.load_program_from(&mut prog)?;
        assert_eq!(m.memory().get_word(0x200).unwrap(), 0x00e0);
        Ok(())
    }

    #[test]
    fn test_program_size_limits() {
        let mut m = machine(&[]);
        assert!(m.load_program(&vec![0; 4096 - 0x200]).is_ok());
        assert!(m.load_program(&vec![0; 4096 - 0x200 + 1]).is_err());
    }

    #[test]
    fn test_cls() {
        let mut m = machine(&[0x00, 0xe0]);
        m.framebuffer.draw_sprite(0, 0, &[0xff, 0xff]);
        run(&mut m, 1);
        assert_eq!(m.framebuffer().lit_count(), 0);
        assert_eq!(m.program_counter(), 0x202);
    }

    #[test]
    fn test_jp() {
        let mut m = machine(&[0x13, 0x45]);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x345);
    }

    #[test]
    fn test_call_then_ret() {
        // 0x200: CALL 0x206; 0x202: junk; 0x206: LD V1, 0x42; 0x208: RET
        let mut m = machine(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x61, 0x42, 0x00, 0xee]);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x206);
        assert_eq!(m.stack(), &[0x202]);
        run(&mut m, 2);
        assert_eq!(m.program_counter(), 0x202);
        assert!(m.stack().is_empty());
        assert_eq!(m.registers()[1], 0x42);
    }

    #[test]
    fn test_ret_with_empty_stack_faults() {
        let mut m = machine(&[0x60, 0x01, 0x00, 0xee]);
        run(&mut m, 1);
        let fault = m.step().unwrap_err();
        assert_eq!(
            fault,
            RuntimeFault {
                pc: 0x202,
                opcode: 0x00ee,
                kind: FaultKind::StackUnderflow,
            }
        );
        // nothing moved
        assert_eq!(m.program_counter(), 0x202);
        assert_eq!(m.registers()[0], 0x01);
    }

    #[test]
    fn test_call_overflow_faults() {
        // 0x200: CALL 0x200, forever
        let mut m = machine(&[0x22, 0x00]);
        run(&mut m, 16);
        assert_eq!(m.stack().len(), 16);
        let fault = m.step().unwrap_err();
        assert_eq!(fault.kind, FaultKind::StackOverflow { depth: 16 });
        assert_eq!(fault.opcode, 0x2200);
        assert_eq!(m.stack().len(), 16);
    }

    #[test]
    fn test_call_depth_is_configurable() {
        let mut m = machine(&[0x22, 0x00]).with_max_stack_depth(2);
        run(&mut m, 2);
        assert!(m.step().is_err());
    }

    #[test]
    fn test_se_sne_byte() {
        // LD V3, 0x10; SE V3, 0x10 (skips); ...; SE V3, 0x11 (no skip)
        let mut m = machine(&[0x63, 0x10, 0x33, 0x10, 0x00, 0x00, 0x33, 0x11]);
        run(&mut m, 2);
        assert_eq!(m.program_counter(), 0x206);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x208);

        let mut m = machine(&[0x43, 0x10, 0x00, 0x00, 0x43, 0x00]);
        run(&mut m, 1); // V3 == 0, != 0x10, skip
        assert_eq!(m.program_counter(), 0x204);
        run(&mut m, 1); // V3 == 0, no skip
        assert_eq!(m.program_counter(), 0x206);
    }

    #[test]
    fn test_se_sne_reg() {
        let mut m = machine(&[0x51, 0x20, 0x00, 0x00, 0x91, 0x20]);
        run(&mut m, 1); // V1 == V2
        assert_eq!(m.program_counter(), 0x204);
        run(&mut m, 1); // not different
        assert_eq!(m.program_counter(), 0x206);

        let mut m = machine(&[0x61, 0x01, 0x51, 0x20, 0x91, 0x20]);
        run(&mut m, 2); // V1 != V2, no skip
        assert_eq!(m.program_counter(), 0x204);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x208);
    }

    #[test]
    fn test_se_sne_reg_ignore_low_nibble() {
        let mut m = machine(&[0x51, 0x21]);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x204);

        let mut m = machine(&[0x61, 0x01, 0x91, 0x21]);
        run(&mut m, 2);
        assert_eq!(m.program_counter(), 0x206);
    }

    #[test]
    fn test_ld_then_add_byte() {
        let mut m = machine(&[0x6a, 0xf0, 0x7a, 0x20]);
        m.v[VF] = 0x77;
        run(&mut m, 2);
        assert_eq!(m.registers()[0xa], 0x10);
        // carry doesn't touch VF
        assert_eq!(m.registers()[VF], 0x77);
        assert_eq!(m.program_counter(), 0x204);
    }

    #[test]
    fn test_logic_ops() {
        let mut m = machine(&[0x81, 0x21, 0x83, 0x22, 0x84, 0x23, 0x85, 0x20]);
        m.v[1] = 0b1100;
        m.v[2] = 0b1010;
        m.v[3] = 0b1100;
        m.v[4] = 0b1100;
        run(&mut m, 4);
        assert_eq!(m.registers()[1], 0b1110);
        assert_eq!(m.registers()[3], 0b1000);
        assert_eq!(m.registers()[4], 0b0110);
        assert_eq!(m.registers()[5], 0b1010);
    }

    #[test]
    fn test_add_reg_carry() {
        let mut m = machine(&[0x81, 0x24, 0x81, 0x24]);
        m.v[1] = 0xff;
        m.v[2] = 0x01;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x00);
        assert_eq!(m.registers()[VF], 1);
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x01);
        assert_eq!(m.registers()[VF], 0);
    }

    #[test]
    fn test_add_reg_into_vf_keeps_result() {
        let mut m = machine(&[0x8f, 0x14]);
        m.v[VF] = 0xff;
        m.v[1] = 0x02;
        run(&mut m, 1);
        assert_eq!(m.registers()[VF], 0x01);
    }

    #[test]
    fn test_flag_ops_into_vf_keep_result() {
        // (opcode, VF, V1, expected VF)
        let cases = [
            ([0x8f, 0x15], 0x10, 0x05, 0xfc),
            ([0x8f, 0x06], 0x03, 0x00, 0x00),
            ([0x8f, 0x0e], 0x81, 0x00, 0x02),
            ([0x8f, 0x17], 0x01, 0x05, 0x04),
        ];
        for (program, vf, v1, expected) in cases {
            let mut m = machine(&program);
            m.v[VF] = vf;
            m.v[1] = v1;
            run(&mut m, 1);
            assert_eq!(m.registers()[VF], expected, "{:02x}{:02x}", program[0], program[1]);
        }
    }

    #[test]
    fn test_sub_borrow() {
        let mut m = machine(&[0x81, 0x25]);
        m.v[1] = 0x05;
        m.v[2] = 0x01;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x04);
        assert_eq!(m.registers()[VF], 1);

        let mut m = machine(&[0x81, 0x25]);
        m.v[1] = 0x01;
        m.v[2] = 0x05;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0xfc);
        assert_eq!(m.registers()[VF], 0);
    }

    #[test]
    fn test_sub_equal_is_no_borrow_flag_zero() {
        let mut m = machine(&[0x81, 0x25]);
        m.v[1] = 0x07;
        m.v[2] = 0x07;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x00);
        assert_eq!(m.registers()[VF], 0);
    }

    #[test]
    fn test_subn() {
        let mut m = machine(&[0x81, 0x27]);
        m.v[1] = 0x01;
        m.v[2] = 0x05;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x04);
        assert_eq!(m.registers()[VF], 1);

        let mut m = machine(&[0x81, 0x27]);
        m.v[1] = 0x05;
        m.v[2] = 0x01;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0xfc);
        assert_eq!(m.registers()[VF], 0);
    }

    #[test]
    fn test_shifts() {
        let mut m = machine(&[0x81, 0x06, 0x82, 0x0e]);
        m.v[1] = 0b1000_0011;
        m.v[2] = 0b1000_0011;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0b0100_0001);
        assert_eq!(m.registers()[VF], 1);
        run(&mut m, 1);
        assert_eq!(m.registers()[2], 0b0000_0110);
        assert_eq!(m.registers()[VF], 1);

        let mut m = machine(&[0x81, 0x06, 0x81, 0x0e]);
        m.v[1] = 0b0100_0010;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0b0010_0001);
        assert_eq!(m.registers()[VF], 0);
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0b0100_0010);
        assert_eq!(m.registers()[VF], 0);
    }

    #[test]
    fn test_shift_ignores_vy() {
        let mut m = machine(&[0x81, 0x26]);
        m.v[1] = 0x04;
        m.v[2] = 0xff;
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 0x02);
        assert_eq!(m.registers()[2], 0xff);
    }

    #[test]
    fn test_ld_i_and_jp_v0() {
        let mut m = machine(&[0xa1, 0x23, 0x60, 0x10, 0xb3, 0x00]);
        run(&mut m, 3);
        assert_eq!(m.index(), 0x123);
        assert_eq!(m.program_counter(), 0x310);
    }

    #[test]
    fn test_rnd_masks() {
        let mut m = machine(&[0xc1, 0x0f, 0xc2, 0xff]);
        run(&mut m, 2);
        assert_eq!(m.registers()[1], 0x0b);
        assert_eq!(m.registers()[2], 0xab);
    }

    #[test]
    fn test_rnd_uses_one_generator() {
        let mut m = Chip8Interpreter::with_rng(DummyInput::default(), Box::new(StepRng::new(1, 1)));
        m.load_program(&[0xc1, 0xff, 0xc2, 0xff]).unwrap();
        run(&mut m, 2);
        assert_eq!(m.registers()[1], 1);
        assert_eq!(m.registers()[2], 2);
    }

    #[test]
    fn test_draw_twice_collides() {
        // LD I, 0x20a; DRW V0, V1, 1; DRW V0, V1, 1; ...; 0x20a: 0xff
        let mut m = machine(&[0xa2, 0x0a, 0xd0, 0x11, 0xd0, 0x11, 0x00, 0x00, 0x00, 0x00, 0xff]);
        m.v[0] = 4;
        m.v[1] = 2;
        m.v[VF] = 0x55;
        run(&mut m, 2);
        assert_eq!(m.framebuffer().lit_count(), 8);
        assert!((4..12).all(|x| m.framebuffer().pixel(x, 2)));
        assert_eq!(m.registers()[VF], 0);
        run(&mut m, 1);
        assert_eq!(m.framebuffer().lit_count(), 0);
        assert_eq!(m.registers()[VF], 1);
        assert_eq!(m.program_counter(), 0x206);
    }

    #[test]
    fn test_draw_wraps() {
        let mut m = machine(&[0xa2, 0x04, 0xd0, 0x11, 0xff]);
        m.v[0] = 60;
        run(&mut m, 2);
        let fb = m.framebuffer();
        assert!((60..64).all(|x| fb.pixel(x, 0)));
        assert!((0..4).all(|x| fb.pixel(x, 0)));
        assert_eq!(fb.lit_count(), 8);
    }

    #[test]
    fn test_draw_font_glyph() {
        // LD V0, 0xA; LD F, V0; DRW V1, V1, 5
        let mut m = machine(&[0x60, 0x0a, 0xf0, 0x29, 0xd1, 0x15]);
        run(&mut m, 3);
        assert_eq!(m.index(), 0x50 + 50);
        // A: F0 90 F0 90 90
        let fb = m.framebuffer();
        assert!((0..4).all(|x| fb.pixel(x, 0)));
        assert!(fb.pixel(0, 1) && !fb.pixel(1, 1) && fb.pixel(3, 1));
        assert_eq!(fb.lit_count(), 4 + 2 + 4 + 2 + 2);
    }

    #[test]
    fn test_draw_out_of_bounds_faults() {
        let mut m = machine(&[0xd0, 0x13]);
        m.i = 0x0ffe;
        let fault = m.step().unwrap_err();
        assert_eq!(
            fault.kind,
            FaultKind::MemoryOutOfBounds {
                addr: 0x0ffe,
                len: 3
            }
        );
        assert_eq!(m.framebuffer().lit_count(), 0);
    }

    #[test]
    fn test_skp_sknp() {
        let mut m = machine(&[0xe1, 0x9e, 0x00, 0x00, 0xe1, 0xa1]);
        m.v[1] = 0x7;
        m.input_mut().press(0x7);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x204);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x206);

        let mut m = machine(&[0xe1, 0x9e, 0xe1, 0xa1]);
        m.v[1] = 0x7;
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x202);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x206);
    }

    #[test]
    fn test_wait_for_key_stalls_then_stores() {
        let mut m = machine(&[0xf5, 0x0a]);
        m.v[5] = 0x99;
        run(&mut m, 5);
        assert_eq!(m.program_counter(), 0x200);
        assert_eq!(m.registers()[5], 0x99);

        m.input_mut().press(0xc);
        m.input_mut().press(0x3);
        run(&mut m, 1);
        assert_eq!(m.registers()[5], 0x3);
        assert_eq!(m.program_counter(), 0x202);
    }

    #[test]
    fn test_key_index_beyond_keypad_is_up() {
        let mut m = machine(&[0xe1, 0x9e, 0xe1, 0xa1]);
        m.v[1] = 0x17;
        m.input_mut().press(0x7);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x202);
        run(&mut m, 1);
        assert_eq!(m.program_counter(), 0x206);
    }

    #[test]
    fn test_font_addr_is_not_masked() {
        let mut m = machine(&[0xf1, 0x29]);
        m.v[1] = 0x10;
        run(&mut m, 1);
        assert_eq!(m.index(), 0x50 + 0x10 * 5);
    }

    #[test]
    fn test_timers() {
        // LD V0, 3; LD DT, V0; LD ST, V0; LD V1, DT
        let mut m = machine(&[0x60, 0x03, 0xf0, 0x15, 0xf0, 0x18, 0xf1, 0x07]);
        run(&mut m, 3);
        assert_eq!(m.delay_timer(), 3);
        assert_eq!(m.sound_timer(), 3);
        assert!(m.sound_active());
        m.tick_timers();
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 2);
        m.tick_timers();
        m.tick_timers();
        assert_eq!(m.delay_timer(), 0);
        assert!(!m.sound_active());
        m.tick_timers();
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
    }

    #[test]
    fn test_add_i() {
        let mut m = machine(&[0xf1, 0x1e, 0xf1, 0x1e]);
        m.i = 0x0ffe;
        m.v[1] = 0x04;
        run(&mut m, 1);
        assert_eq!(m.index(), 0x1002);
        // VF untouched
        assert_eq!(m.registers()[VF], 0);
        m.i = 0xfffe;
        run(&mut m, 1);
        assert_eq!(m.index(), 0x0002);
    }

    #[test]
    fn test_bcd() {
        let mut m = machine(&[0xa3, 0x00, 0xf2, 0x33]);
        m.v[2] = 254;
        run(&mut m, 2);
        assert_eq!(m.memory().get_ro_slice(0x300, 3).unwrap(), &[2, 5, 4]);

        let mut m = machine(&[0xa3, 0x00, 0xf2, 0x33]);
        m.v[2] = 7;
        run(&mut m, 2);
        assert_eq!(m.memory().get_ro_slice(0x300, 3).unwrap(), &[0, 0, 7]);
    }

    #[test]
    fn test_bcd_out_of_bounds_faults_without_writing() {
        let mut m = machine(&[0xf2, 0x33]);
        m.i = 0x0ffe;
        m.v[2] = 123;
        assert!(m.step().is_err());
        assert_eq!(m.memory().get_ro_slice(0x0ffe, 2).unwrap(), &[0, 0]);
        assert_eq!(m.program_counter(), 0x200);
    }

    #[test]
    fn test_store_and_load_registers() {
        // LD I, 0x300; LD [I], V3; LD I, 0x400; LD V3, [I]
        let mut m = machine(&[0xa3, 0x00, 0xf3, 0x55, 0xa4, 0x00, 0xf2, 0x65]);
        m.v[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        run(&mut m, 2);
        assert_eq!(m.memory().get_ro_slice(0x300, 5).unwrap(), &[1, 2, 3, 4, 0]);
        // I is left alone
        assert_eq!(m.index(), 0x300);

        m.memory.write(&[9, 8, 7, 6], 0x400).unwrap();
        run(&mut m, 2);
        assert_eq!(&m.registers()[..5], &[9, 8, 7, 4, 5]);
        assert_eq!(m.index(), 0x400);
    }

    #[test]
    fn test_store_all_registers_at_top_of_memory() {
        let mut m = machine(&[0xff, 0x55]);
        m.i = 0x0ff0;
        m.v = [0x11; 16];
        run(&mut m, 1);
        assert_eq!(m.memory().get_byte(0x0fff).unwrap(), 0x11);

        let mut m = machine(&[0xff, 0x55]);
        m.i = 0x0ff1;
        assert!(matches!(
            m.step().unwrap_err().kind,
            FaultKind::MemoryOutOfBounds { addr: 0x0ff1, len: 16 }
        ));
    }

    #[test]
    fn test_fetch_out_of_bounds_faults() {
        let mut m = machine(&[0x1f, 0xff]);
        run(&mut m, 1);
        let fault = m.step().unwrap_err();
        assert_eq!(fault.pc, 0x0fff);
        assert_eq!(fault.opcode, 0);
        assert!(matches!(fault.kind, FaultKind::MemoryOutOfBounds { .. }));
    }

    #[test]
    fn test_unknown_opcodes_are_noops() {
        let mut m = machine(&[0x01, 0x23, 0x81, 0x2f, 0xe1, 0x00, 0xf1, 0xff]);
        let before = m.v;
        run(&mut m, 4);
        assert_eq!(m.program_counter(), 0x208);
        assert_eq!(m.v, before);
        assert!(m.stack().is_empty());
    }

    #[test]
    fn test_skip_instruction() {
        let mut m = machine(&[0x00, 0xee, 0x61, 0x05]);
        assert!(m.step().is_err());
        m.skip_instruction();
        run(&mut m, 1);
        assert_eq!(m.registers()[1], 5);
    }
}
