use crate::errors::LoadProgramError;
use crate::hardware::keyboard::KeyboardInputProvider;
use std::fmt::{Debug, Formatter};

/// Number of addressable u16 cells, every u16 is a valid address.
pub const MEMORY_SIZE_U16: usize = 1 << 16;

/// Memory regions mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMappedIOLocations {
    /// Keyboard Status Register
    Kbsr = 0xFE00,
    /// Keyboard Data Register
    Kbdr = 0xFE02,
}

/// An abstraction for the LC-3 memory excluding registers.
pub struct Memory {
    /// Index equals memory address
    data: Box<[u16]>,
    keyboard: Box<dyn KeyboardInputProvider>,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|&&w| w != 0).count();
        write!(f, "Memory: {used} non-zero cells of {MEMORY_SIZE_U16}")
    }
}

impl Memory {
    const KEYBOARD_STATUS_REGISTER_SET: u16 = 1 << 15;
    const KEYBOARD_STATUS_REGISTER_UNSET: u16 = 0;

    #[must_use]
    pub fn new(keyboard: Box<dyn KeyboardInputProvider>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_SIZE_U16].into_boxed_slice(),
            keyboard,
        }
    }

    /// Reads the word at `address`.
    ///
    /// Reading the keyboard status register polls the keyboard without blocking:
    /// if a character is pending the status gets bit 15 set and the character is put into the
    /// keyboard data register, otherwise the status is cleared.
    /// Failing to poll counts as no character pending.
    pub fn read(&mut self, address: u16) -> u16 {
        if MemoryMappedIOLocations::n(address) == Some(MemoryMappedIOLocations::Kbsr) {
            self.poll_keyboard();
        }
        self.data[usize::from(address)]
    }

    /// Stores `value` at `address`, memory mapped registers included.
    pub fn write(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    fn poll_keyboard(&mut self) {
        let input = self.keyboard.poll_input().unwrap_or_else(|e| {
            tracing::debug!("Keyboard poll failed, treating as no input: {e}");
            None
        });
        match input {
            Some(b) => {
                self.write(
                    MemoryMappedIOLocations::Kbsr as u16,
                    Self::KEYBOARD_STATUS_REGISTER_SET,
                );
                self.write(MemoryMappedIOLocations::Kbdr as u16, u16::from(b));
            }
            None => self.write(
                MemoryMappedIOLocations::Kbsr as u16,
                Self::KEYBOARD_STATUS_REGISTER_UNSET,
            ),
        }
    }

    pub fn keyboard(&mut self) -> &mut dyn KeyboardInputProvider {
        self.keyboard.as_mut()
    }

    /// Loads a program image: the first word is the origin, all following words are stored
    /// at consecutive addresses starting there.
    /// Nothing is written if the image does not fit.
    ///
    /// Returns the origin.
    ///
    /// # Errors
    /// - Program is missing the origin header
    /// - Program too long to fit between origin and the end of memory
    pub fn load_program(&mut self, image: &[u16]) -> Result<u16, LoadProgramError> {
        let Some((&origin, program)) = image.split_first() else {
            return Err(LoadProgramError::ProgramMissingOrigHeader);
        };
        let maximum_instructions = MEMORY_SIZE_U16 - usize::from(origin);
        if program.len() > maximum_instructions {
            return Err(LoadProgramError::ProgramTooLong {
                origin,
                actual_instructions: program.len(),
                maximum_instructions,
            });
        }
        let start = usize::from(origin);
        self.data[start..start + program.len()].copy_from_slice(program);
        Ok(origin)
    }

    /// Loads a program image given as big-endian bytes, see [`Memory::load_program`].
    ///
    /// # Errors
    /// - Odd number of bytes
    /// - all errors of [`Memory::load_program`]
    pub fn load_program_bytes(&mut self, bytes: &[u8]) -> Result<u16, LoadProgramError> {
        let words = words_from_be_bytes(bytes)?;
        self.load_program(&words)
    }
}

/// Converts big-endian bytes into u16 words.
///
/// # Errors
/// - Odd number of bytes
pub fn words_from_be_bytes(bytes: &[u8]) -> Result<Vec<u16>, LoadProgramError> {
    let chunks = bytes.chunks_exact(2);
    if !chunks.remainder().is_empty() {
        return Err(LoadProgramError::ProgramOddByteCount {
            byte_count: bytes.len(),
        });
    }
    Ok(chunks.map(|c| u16::from_be_bytes([c[0], c[1]])).collect())
}
