use std::io;

/// Everything that can go wrong inside the virtual machine.
///
/// `ProgramTooLarge` is recoverable (retry with a smaller ROM). The stack
/// and address errors are fatal: they mean either a broken program or an
/// interpreter bug, and the run loop stops rather than corrupt state.
/// `UnknownOpcode` is surfaced here but the machine's policy is to log it
/// and skip, since the real hardware has no defined behaviour and halting
/// the loop on every stray word would freeze otherwise-working ROMs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("program is {len} bytes, at most {max} fit above the load address")]
    ProgramTooLarge { len: usize, max: usize },

    #[error("memory access out of range at {addr:#05x}")]
    AddressOutOfRange { addr: u16 },

    #[error("call stack overflow while pushing {addr:#05x}")]
    StackOverflow { addr: u16 },

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("unknown opcode {opcode:#06x} at {pc:#05x}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("no program loaded")]
    NoProgram,

    #[error(transparent)]
    Io(#[from] io::Error),
}
