//! The LC-3 machine state: memory including memory mapped devices and the register file.
pub mod keyboard;
pub mod memory;
pub mod registers;
