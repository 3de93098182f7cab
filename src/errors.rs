use displaydoc::Display;
use std::error::Error;
use std::io;
use std::path::Path;

use crate::emulator::instruction::Opcode;

#[derive(Display, Debug, PartialEq, Eq)]
pub enum LoadProgramError {
    /// Program is missing valid .ORIG header
    ProgramMissingOrigHeader,
    /// Program has an odd byte count of {byte_count}, it must consist of complete u16 words
    ProgramOddByteCount { byte_count: usize },
    /// Program too long, got {actual_instructions} u16 instructions at origin {origin:#06X} while limit is {maximum_instructions}
    ProgramTooLong {
        origin: u16,
        actual_instructions: usize,
        maximum_instructions: usize,
    },
    /// Program '{file}' could not be loaded: {message}
    ProgramNotLoadable { file: String, message: String },
}
impl Error for LoadProgramError {}

impl LoadProgramError {
    pub(crate) fn not_loadable(file: &Path, error: &io::Error) -> Self {
        Self::ProgramNotLoadable {
            file: file.display().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Display, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// Unimplemented opcode {opcode:?} at address {address:#06X}
    UnimplementedOpcode { opcode: Opcode, address: u16 },
    /// Unknown trap vector {vector:#04X} at address {address:#06X}
    UnknownTrapVector { vector: u8, address: u16 },
    /// Error during reading Stdin or writing program output to Stdout: {0}
    IOInputOutputError(String),
    /// Execution interrupted by user
    Interrupted,
}
impl Error for ExecutionError {}

impl ExecutionError {
    /// Process exit code to report for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::UnimplementedOpcode { .. } | Self::UnknownTrapVector { .. } => 127,
            Self::Interrupted => 130,
            Self::IOInputOutputError(_) => 1,
        }
    }
}

impl From<io::Error> for ExecutionError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::IOInputOutputError(error.to_string())
        }
    }
}
