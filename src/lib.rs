//! # LC-3 Virtual Machine.
//!
//! `lc3-vm` runs pre-assembled program images for the LC-3 (Little Computer 3).
//! Usage starts with loading a program via [`emulator::from_program`] or
//! [`emulator::Emulator::load_program`], followed by [`emulator::Emulator::execute`].
//!
//!  # Example
//! ```
//! use lc3_vm::emulator::{self, ExecutionState};
//! // ADD R0, R0, #3; HALT
//! let mut emu = emulator::from_program_words(&[0x3000, 0x1023, 0xF025]).unwrap();
//! let mut output = Vec::new();
//! emu.run(&mut output).unwrap();
//! assert_eq!(emu.state(), ExecutionState::Halted);
//! assert_eq!(emu.registers().get(0).as_decimal(), 3);
//! ```
//! # Errors
//! - Program image is missing the origin word
//! - Program image too long for the memory following its origin
//! - Unimplemented opcode (RTI, reserved) or unknown trap vector during execution

pub mod emulator;
pub mod errors;
pub mod hardware;
pub(crate) mod numbers;
pub(crate) mod terminal;
