use crate::hardware::keyboard::KeyboardInputProvider;
use std::collections::VecDeque;
use std::io;
use std::io::Write;

pub struct StringWriter {
    vec: Vec<u8>,
}
impl Write for StringWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.vec.write(data)
    }
    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
impl StringWriter {
    pub fn new() -> Self {
        let vec = Vec::<u8>::with_capacity(120);
        Self { vec }
    }
    pub fn get_string(&self) -> String {
        String::from_utf8(self.vec.clone()).unwrap()
    }
    pub fn get_bytes(&self) -> &[u8] {
        &self.vec
    }
}

/// Keyboard fed from a fixed input, blocking reads fail once the input is used up.
pub struct FakeKeyboardInputProvider {
    input: VecDeque<u8>,
    error: Option<String>,
    interrupt_after: Option<usize>,
    is_interrupted: bool,
}
impl FakeKeyboardInputProvider {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            error: None,
            interrupt_after: None,
            is_interrupted: false,
        }
    }
    /// Every access fails with `message`.
    pub fn with_error(message: &str) -> Self {
        Self {
            error: Some(message.to_owned()),
            ..Self::new("")
        }
    }
    /// Simulates CTRL-C on the `checks`-th call of `check_interrupt`.
    pub fn interrupting_after(checks: usize) -> Self {
        Self {
            interrupt_after: Some(checks),
            ..Self::new("")
        }
    }
    fn fail_if_configured(&self) -> io::Result<()> {
        self.error
            .as_ref()
            .map_or(Ok(()), |message| Err(io::Error::other(message.clone())))
    }
}
impl KeyboardInputProvider for FakeKeyboardInputProvider {
    fn poll_input(&mut self) -> io::Result<Option<u8>> {
        self.fail_if_configured()?;
        Ok(self.input.pop_front())
    }
    fn read_input(&mut self) -> io::Result<u8> {
        self.fail_if_configured()?;
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"))
    }
    fn check_interrupt(&mut self) -> bool {
        if let Some(remaining) = self.interrupt_after.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.is_interrupted = true;
            }
        }
        self.is_interrupted
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}
