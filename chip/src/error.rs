use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal errors raised while the interpreter is running.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessError {
    #[error("Stack overflow, all {0} nesting levels are in use.")]
    StackOverflow(usize),
    #[error("Stack underflow, returned from a subroutine with an empty stack.")]
    StackUnderflow,
    #[error("Pointer location invalid there can not be an opcode at {pointer:#06X}, if data len is {len:#06X}")]
    MemoryInvalid { pointer: usize, len: usize },
    #[error("Memory access at {address:#06X} is outside of the address space.")]
    AddressOutOfBounds { address: usize },
    #[error("Refusing to write into the reserved font region at {address:#06X}.")]
    ReservedMemoryWrite { address: usize },
}

/// Errors raised while a program image is put into memory.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unable to read the rom image '{path}'.")]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("The rom image is {len} bytes long, but only {max} bytes are available.")]
    ImageTooLarge { len: usize, max: usize },
    #[error("A rom image was already loaded into this chipset.")]
    AlreadyLoaded,
    #[error("Invalid load address {0:#06X}.")]
    InvalidLoadAddress(usize),
}

/// Everything that can stop the emulation.
#[derive(Error, Debug)]
pub enum ChipError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}
