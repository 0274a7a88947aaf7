//! Decoding of 16-bit CHIP-8 instruction words.
//!
//! Operand positions within a word `0xTXYN`:
//!   x   = second nibble (register)
//!   y   = third nibble (register)
//!   n   = low nibble
//!   kk  = low byte
//!   nnn = low 12 bits (address)
use std::fmt;

/// One decoded CHIP-8 instruction. Anything that doesn't match a known
/// pattern decodes to `Unknown` and is executed as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SeByte(u8, u8),
    /// 4xkk
    SneByte(u8, u8),
    /// 5xy0
    SeReg(u8, u8),
    /// 6xkk
    LdByte(u8, u8),
    /// 7xkk
    AddByte(u8, u8),
    /// 8xy0
    LdReg(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4
    AddReg(u8, u8),
    /// 8xy5
    Sub(u8, u8),
    /// 8xy6
    Shr(u8),
    /// 8xy7
    Subn(u8, u8),
    /// 8xyE
    Shl(u8),
    /// 9xy0
    SneReg(u8, u8),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxkk
    Rnd(u8, u8),
    /// Dxyn
    Drw(u8, u8, u8),
    /// Ex9E
    Skp(u8),
    /// ExA1
    Sknp(u8),
    /// Fx07
    LdRegDt(u8),
    /// Fx0A
    LdKey(u8),
    /// Fx15
    LdDtReg(u8),
    /// Fx18
    LdSt(u8),
    /// Fx1E
    AddI(u8),
    /// Fx29
    LdF(u8),
    /// Fx33
    LdB(u8),
    /// Fx55
    LdDerefIReg(u8),
    /// Fx65
    LdRegDerefI(u8),
    Unknown(u16),
}

#[inline]
fn x(word: u16) -> u8 {
    ((word >> 8) & 0x0f) as u8
}

#[inline]
fn y(word: u16) -> u8 {
    ((word >> 4) & 0x0f) as u8
}

#[inline]
fn n(word: u16) -> u8 {
    (word & 0x000f) as u8
}

#[inline]
fn kk(word: u16) -> u8 {
    (word & 0x00ff) as u8
}

#[inline]
fn nnn(word: u16) -> u16 {
    word & 0x0fff
}

impl Instruction {
    /// decode a big-endian instruction word; families 0, 8, E and F look at
    /// the low byte or nibble as well
    pub fn decode(word: u16) -> Self {
        use Instruction::*;
        match word >> 12 {
            0x0 => match word {
                0x00e0 => Cls,
                0x00ee => Ret,
                _ => Unknown(word),
            },
            0x1 => Jp(nnn(word)),
            0x2 => Call(nnn(word)),
            0x3 => SeByte(x(word), kk(word)),
            0x4 => SneByte(x(word), kk(word)),
            0x5 => SeReg(x(word), y(word)),
            0x6 => LdByte(x(word), kk(word)),
            0x7 => AddByte(x(word), kk(word)),
            0x8 => match n(word) {
                0x0 => LdReg(x(word), y(word)),
                0x1 => Or(x(word), y(word)),
                0x2 => And(x(word), y(word)),
                0x3 => Xor(x(word), y(word)),
                0x4 => AddReg(x(word), y(word)),
                0x5 => Sub(x(word), y(word)),
                0x6 => Shr(x(word)),
                0x7 => Subn(x(word), y(word)),
                0xe => Shl(x(word)),
                _ => Unknown(word),
            },
            0x9 => SneReg(x(word), y(word)),
            0xa => LdI(nnn(word)),
            0xb => JpV0(nnn(word)),
            0xc => Rnd(x(word), kk(word)),
            0xd => Drw(x(word), y(word), n(word)),
            0xe => match kk(word) {
                0x9e => Skp(x(word)),
                0xa1 => Sknp(x(word)),
                _ => Unknown(word),
            },
            0xf => match kk(word) {
                0x07 => LdRegDt(x(word)),
                0x0a => LdKey(x(word)),
                0x15 => LdDtReg(x(word)),
                0x18 => LdSt(x(word)),
                0x1e => AddI(x(word)),
                0x29 => LdF(x(word)),
                0x33 => LdB(x(word)),
                0x55 => LdDerefIReg(x(word)),
                0x65 => LdRegDerefI(x(word)),
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Instruction::decode(word)
    }
}

// conventional mnemonics, used in trace logging
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP 0x{:03x}", a),
            Call(a) => write!(f, "CALL 0x{:03x}", a),
            SeByte(x, kk) => write!(f, "SE V{:X}, 0x{:02x}", x, kk),
            SneByte(x, kk) => write!(f, "SNE V{:X}, 0x{:02x}", x, kk),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte(x, kk) => write!(f, "LD V{:X}, 0x{:02x}", x, kk),
            AddByte(x, kk) => write!(f, "ADD V{:X}, 0x{:02x}", x, kk),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x) => write!(f, "SHR V{:X}", x),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x) => write!(f, "SHL V{:X}", x),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, 0x{:03x}", a),
            JpV0(a) => write!(f, "JP V0, 0x{:03x}", a),
            Rnd(x, kk) => write!(f, "RND V{:X}, 0x{:02x}", x, kk),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdRegDt(x) => write!(f, "LD V{:X}, DT", x),
            LdKey(x) => write!(f, "LD V{:X}, K", x),
            LdDtReg(x) => write!(f, "LD DT, V{:X}", x),
            LdSt(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdF(x) => write!(f, "LD F, V{:X}", x),
            LdB(x) => write!(f, "LD B, V{:X}", x),
            LdDerefIReg(x) => write!(f, "LD [I], V{:X}", x),
            LdRegDerefI(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(w) => write!(f, "??? 0x{:04x}", w),
        }
    }
}
