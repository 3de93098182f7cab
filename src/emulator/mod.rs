pub mod instruction;
pub mod opcodes;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod trap_routines;

use crate::errors::{ExecutionError, LoadProgramError};
use crate::hardware::keyboard::{KeyboardInputProvider, TerminalInputProvider};
use crate::hardware::memory::Memory;
use crate::hardware::registers::Registers;
use crate::terminal;
use instruction::{Instruction, Opcode};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::io;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;
use trap_routines::TrapVector;

/// Instructions executed between two checks for CTRL-C.
const INTERRUPT_CHECK_INTERVAL: u64 = 4096;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    /// HALT trap was executed.
    Halted,
    /// Execution stopped on an error.
    Fatal,
}

/// The public facing emulator used to run LC-3 programs.
pub struct Emulator {
    memory: Memory,
    registers: Registers,
    state: ExecutionState,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Emulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "State: {:?}, Registers: {:?}, {:?}",
            self.state, self.registers, self.memory
        )
    }
}

/// Creates an emulator reading the keyboard from the terminal and loads the program image
/// file at `path`.
///
/// # Errors
/// See [`Emulator::load_program`]
pub fn from_program(path: impl AsRef<Path>) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new();
    emu.load_program(path)?;
    Ok(emu)
}

/// Creates an emulator reading the keyboard from the terminal and loads `program`,
/// the first word being the origin.
///
/// # Errors
/// See [`Memory::load_program`]
pub fn from_program_words(program: &[u16]) -> Result<Emulator, LoadProgramError> {
    let mut emu = Emulator::new();
    emu.load_program_words(program)?;
    Ok(emu)
}

impl Emulator {
    /// Constructor method, keyboard input is read from the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_keyboard(Box::new(TerminalInputProvider::new()))
    }

    #[must_use]
    pub fn with_keyboard(keyboard: Box<dyn KeyboardInputProvider>) -> Self {
        Self {
            memory: Memory::new(keyboard),
            registers: Registers::new(),
            state: ExecutionState::Running,
        }
    }

    /// Loads a big-endian program image file, returns its origin.
    /// Several images can be loaded, later ones overwrite overlapping memory.
    ///
    /// # Errors
    /// - File cannot be read
    /// - Odd byte count, missing origin or program too long, see [`Memory::load_program_bytes`]
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> Result<u16, LoadProgramError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| LoadProgramError::not_loadable(path, &e))?;
        let origin = self.memory.load_program_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            origin = format_args!("{origin:#06X}"),
            words = bytes.len() / 2 - 1,
            "Loaded program image"
        );
        Ok(origin)
    }

    /// Loads a program image given as words, returns its origin.
    ///
    /// # Errors
    /// See [`Memory::load_program`]
    pub fn load_program_words(&mut self, program: &[u16]) -> Result<u16, LoadProgramError> {
        self.memory.load_program(program)
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }
    pub const fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }
    pub const fn memory(&mut self) -> &mut Memory {
        &mut self.memory
    }
    #[must_use]
    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    /// Resets all registers, so a loaded program can be run again.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.state = ExecutionState::Running;
    }

    /// Executes the program until it halts.
    /// The terminal is switched to raw mode until this returns.
    ///
    /// # Errors
    /// - Unimplemented opcode or unknown trap vector
    /// - IO error reading the keyboard or writing to stdout
    /// - CTRL-C pressed
    pub fn execute(&mut self) -> Result<(), ExecutionError> {
        let mut stdout = io::stdout();
        let _lock = terminal::set_terminal_raw(&mut stdout);
        let mut writer = terminal::RawModeWriter::new(stdout.lock());
        self.run(&mut writer)
    }

    /// Executes instructions until the program halts, console output goes to `stdout`.
    ///
    /// # Errors
    /// See [`Emulator::execute`]
    pub fn run(&mut self, stdout: &mut impl Write) -> Result<(), ExecutionError> {
        let mut executed: u64 = 0;
        while self.step(stdout)? == ExecutionState::Running {
            executed = executed.wrapping_add(1);
            let keyboard = self.memory.keyboard();
            if (executed % INTERRUPT_CHECK_INTERVAL == 0 && keyboard.check_interrupt())
                || keyboard.is_interrupted()
            {
                self.state = ExecutionState::Fatal;
                tracing::info!(
                    pc = format_args!("{:#06X}", self.registers.pc().as_binary()),
                    "Execution interrupted"
                );
                return Err(ExecutionError::Interrupted);
            }
        }
        Ok(())
    }

    /// Fetches, decodes and executes one instruction.
    /// Does nothing once the emulator is not running anymore.
    ///
    /// # Errors
    /// See [`Emulator::execute`]
    pub fn step(&mut self, stdout: &mut impl Write) -> Result<ExecutionState, ExecutionError> {
        if self.state != ExecutionState::Running {
            return Ok(self.state);
        }
        let address = self.registers.pc().as_binary();
        let instruction = Instruction::from(self.memory.read(address));
        self.registers.inc_pc();
        tracing::trace!(
            address = format_args!("{address:#06X}"),
            ?instruction,
            "Executing"
        );
        match self.execute_instruction(instruction, address, stdout) {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(Ok(())) => {
                self.state = ExecutionState::Halted;
                tracing::debug!(address = format_args!("{address:#06X}"), "Program halted");
            }
            ControlFlow::Break(Err(e)) => {
                self.state = ExecutionState::Fatal;
                if e == ExecutionError::Interrupted {
                    tracing::info!("Execution interrupted while waiting for input");
                } else {
                    tracing::error!(address = format_args!("{address:#06X}"), "{e}");
                }
                return Err(e);
            }
        }
        Ok(self.state)
    }

    fn execute_instruction(
        &mut self,
        i: Instruction,
        address: u16,
        stdout: &mut impl Write,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        let r = &mut self.registers;
        let m = &mut self.memory;
        match i.opcode() {
            Opcode::Br => opcodes::br(i, r),
            Opcode::Add => opcodes::add(i, r),
            Opcode::Ld => opcodes::ld(i, r, m),
            Opcode::St => opcodes::st(i, r, m),
            Opcode::Jsr => opcodes::jsr(i, r),
            Opcode::And => opcodes::and(i, r),
            Opcode::Ldr => opcodes::ldr(i, r, m),
            Opcode::Str => opcodes::str(i, r, m),
            Opcode::Not => opcodes::not(i, r),
            Opcode::Ldi => opcodes::ldi(i, r, m),
            Opcode::Sti => opcodes::sti(i, r, m),
            Opcode::Jmp => opcodes::jmp_or_ret(i, r),
            Opcode::Lea => opcodes::lea(i, r),
            Opcode::Trap => return self.trap(i, address, stdout),
            opcode @ (Opcode::Rti | Opcode::Res) => {
                return ControlFlow::Break(Err(ExecutionError::UnimplementedOpcode {
                    opcode,
                    address,
                }));
            }
        }
        ControlFlow::Continue(())
    }

    /// TRAP: saves PC in R7 and runs the service routine of the trap vector.
    fn trap(
        &mut self,
        i: Instruction,
        address: u16,
        stdout: &mut impl Write,
    ) -> ControlFlow<Result<(), ExecutionError>> {
        self.registers.set(7, self.registers.pc());
        let vector = i.trap_vector();
        let Some(trap_vector) = TrapVector::n(vector) else {
            return ControlFlow::Break(Err(ExecutionError::UnknownTrapVector { vector, address }));
        };
        trap_routines::dispatch(trap_vector, &mut self.registers, &mut self.memory, stdout)
    }
}
