use std::io;
use thiserror::Error;

/// A program that would run off the end of memory when loaded at 0x200.
/// Nothing is written when this is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("program of {len} bytes does not fit in memory ({available} bytes available)")]
pub struct ProgramTooLarge {
    pub len: usize,
    pub available: usize,
}

/// Failure to stage a program from an arbitrary reader
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    TooLarge(#[from] ProgramTooLarge),
}

/// Raised by the memory map when an access strays outside [0, 4096)
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("access of {len} byte(s) at 0x{addr:04x} is outside memory")]
pub struct MemoryError {
    pub addr: usize,
    pub len: usize,
}

/// What went wrong while executing an instruction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// 00EE with nothing on the call stack
    #[error("return with empty call stack")]
    StackUnderflow,

    /// 2nnn with the call stack already at its configured depth
    #[error("call stack overflow (depth {depth})")]
    StackOverflow { depth: usize },

    #[error("memory access of {len} byte(s) at 0x{addr:04x} out of bounds")]
    MemoryOutOfBounds { addr: usize, len: usize },
}

impl From<MemoryError> for FaultKind {
    fn from(e: MemoryError) -> Self {
        FaultKind::MemoryOutOfBounds {
            addr: e.addr,
            len: e.len,
        }
    }
}

/// A recoverable fault surfaced from `step()`. The machine state is left as
/// it was before the faulting instruction, so the host may stop or carry on.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at pc 0x{pc:04x} (opcode 0x{opcode:04x})")]
pub struct RuntimeFault {
    pub pc: u16,
    /// the instruction word, or 0 if it could not be fetched
    pub opcode: u16,
    pub kind: FaultKind,
}
