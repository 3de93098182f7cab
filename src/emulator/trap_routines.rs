use crate::errors::ExecutionError;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};
use std::io;
use std::io::Write;
use std::ops::ControlFlow;

/// Trap vectors of the service routines, the operand of the TRAP opcode.
/// ```text
///  15__12__11__8___7_______0_
/// | 1111 | 0000 | trapvect8 |
///  -------------------------
/// ```
#[repr(u8)]
#[derive(enumn::N, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

pub const HALT_MESSAGE: &str = "\nProgram halted\n";
pub const IN_PROMPT: &str = "Input: ";

/// Runs the service routine of `trap_vector`.
///
/// The return address has to be saved in R7 by the caller.
pub fn dispatch(
    trap_vector: TrapVector,
    regs: &mut Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    match trap_vector {
        TrapVector::GetC => get_c(regs, mem),
        TrapVector::Out => out(regs, stdout),
        TrapVector::PutS => put_s(regs, mem, stdout),
        TrapVector::In => in_trap(regs, mem, stdout),
        TrapVector::PutSp => put_sp(regs, mem, stdout),
        TrapVector::Halt => halt(stdout),
    }
}

fn read_character_from_console(
    regs: &mut Registers,
    mem: &mut Memory,
) -> ControlFlow<Result<(), ExecutionError>, u8> {
    match mem.keyboard().read_input() {
        Ok(b) => {
            regs.set(0, from_binary(u16::from(b)));
            regs.update_conditional_register(0);
            ControlFlow::Continue(b)
        }
        Err(e) => wrap_io_error_in_cf(e),
    }
}

/// GETC: Read a single character from the keyboard. The character is not echoed onto the console.
///
/// Its ASCII code is copied into R0. The high eight bits of R0 are cleared.
pub fn get_c(regs: &mut Registers, mem: &mut Memory) -> ControlFlow<Result<(), ExecutionError>> {
    read_character_from_console(regs, mem)?;
    ControlFlow::Continue(())
}

/// IN: Print a prompt on the screen and read a single character echoed back from the keyboard.
///
/// Otherwise, like 0x20 GETC.
pub fn in_trap(
    regs: &mut Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    write_bytes_out(IN_PROMPT.as_bytes(), stdout)?;
    let b = read_character_from_console(regs, mem)?;
    write_bytes_out(&[b], stdout)
}

/// OUT: Write a character in R0[7:0] to the console display.
pub fn out(regs: &Registers, stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    write_bytes_out(&[low_byte(regs.get(0).as_binary())], stdout)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Truncation is what is expected here"
)]
const fn low_byte(input: u16) -> u8 {
    input as u8
}

fn put_one_char_per_u16(input: u16, append_to: &mut Vec<u8>) {
    append_to.push(low_byte(input));
}

fn put_two_chars_per_u16(input: u16, append_to: &mut Vec<u8>) {
    append_to.push(low_byte(input));
    let high = low_byte(input >> 8);
    if high != 0 {
        append_to.push(high);
    }
}

/// Collects characters from consecutive words starting at the address in R0 up to,
/// but excluding, the first zero word.
fn put(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
    handle_char: fn(u16, &mut Vec<u8>),
) -> ControlFlow<Result<(), ExecutionError>> {
    let mut address = regs.get(0).as_binary();
    let mut s = Vec::with_capacity(120);
    loop {
        let word = mem.read(address);
        if word == 0 {
            break;
        }
        handle_char(word, &mut s);
        address = address.wrapping_add(1);
    }
    write_bytes_out(&s, stdout)
}

/// PUTS: print null-delimited char* from register 0's address
pub fn put_s(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_one_char_per_u16)
}

/// PUTSP: Packed version of PUTS
///
/// The ASCII code contained in bits [7:0] of a memory location is written to the console first.
/// The second character of the last memory location can be 0x00.
/// Writing terminates with a 0x0000 word.
pub fn put_sp(
    regs: &Registers,
    mem: &mut Memory,
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    put(regs, mem, stdout, put_two_chars_per_u16)
}

/// HALT: End program and stdout a message
pub fn halt(stdout: &mut impl Write) -> ControlFlow<Result<(), ExecutionError>> {
    write_bytes_out(HALT_MESSAGE.as_bytes(), stdout)?;
    ControlFlow::Break(Ok(()))
}

fn write_bytes_out(
    message: &[u8],
    stdout: &mut impl Write,
) -> ControlFlow<Result<(), ExecutionError>> {
    match stdout.write_all(message).and_then(|()| stdout.flush()) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => wrap_io_error_in_cf(e),
    }
}

fn wrap_io_error_in_cf<C>(error: io::Error) -> ControlFlow<Result<(), ExecutionError>, C> {
    ControlFlow::Break(Err(ExecutionError::from(error)))
}
