use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Providing Keyboard Input independent of an implementation.
pub trait KeyboardInputProvider {
    /// Returns the next pending byte, does not block.
    fn poll_input(&mut self) -> io::Result<Option<u8>>;
    /// Blocks until a byte is available.
    ///
    /// # Errors
    /// - [`io::ErrorKind::Interrupted`] if CTRL-C was pressed while waiting
    fn read_input(&mut self) -> io::Result<u8>;
    /// Looks for CTRL-C without blocking, other input seen meanwhile is kept for later reads.
    fn check_interrupt(&mut self) -> bool;
    /// True if CTRL-C was triggered
    fn is_interrupted(&self) -> bool;
}

/// Set once SIGINT or SIGTERM arrived, handlers are registered on first use.
///
/// Raw mode delivers CTRL-C typed in the terminal as key event, these signals come from
/// other processes.
fn termination_signal_flag() -> Arc<AtomicBool> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    Arc::clone(FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&flag)) {
                tracing::warn!("Could not register handler for signal {signal}: {e}");
            }
        }
        flag
    }))
}

/// Keyboard input read from the terminal, expects raw mode to be active,
/// otherwise input is only seen line by line.
///
/// SIGINT and SIGTERM count as CTRL-C.
pub struct TerminalInputProvider {
    pending: VecDeque<u8>,
    is_interrupted: bool,
    termination_signal: Arc<AtomicBool>,
}

impl Default for TerminalInputProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalInputProvider {
    /// Blocking reads wake up this often to look for termination signals.
    const SIGNAL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

    #[must_use]
    pub fn new() -> Self {
        Self::with_termination_signal(termination_signal_flag())
    }

    fn with_termination_signal(termination_signal: Arc<AtomicBool>) -> Self {
        Self {
            pending: VecDeque::new(),
            is_interrupted: false,
            termination_signal,
        }
    }

    fn interrupted(&self) -> bool {
        self.is_interrupted || self.termination_signal.load(Ordering::Relaxed)
    }

    /// Reads and buffers all events available without blocking.
    fn drain_events(&mut self) -> io::Result<()> {
        while !self.interrupted() && poll(Duration::from_secs(0))? {
            self.handle_event(&read()?);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) {
        let Some(key) = event.as_key_press_event() else {
            return;
        };
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.is_interrupted = true;
        } else {
            self.pending.extend(key_to_bytes(key));
        }
    }

    fn interrupted_error() -> io::Error {
        io::Error::new(io::ErrorKind::Interrupted, "CTRL-C pressed or termination signal")
    }
}

/// Bytes a terminal would send for `key`: control characters for CTRL + letter or `@[\]^_`,
/// ANSI escape sequences for arrow keys.
/// Keys without a byte representation give nothing.
fn key_to_bytes(key: KeyEvent) -> Vec<u8> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char(c) if ctrl && (c.is_ascii_alphabetic() || "@[\\]^_".contains(c)) => {
            #[expect(clippy::cast_possible_truncation)]
            let byte = c.to_ascii_uppercase() as u8 & 0x1F;
            vec![byte]
        }
        KeyCode::Char(c) if c.is_ascii() => u8::try_from(c).map(|b| vec![b]).unwrap_or_default(),
        KeyCode::Enter => vec![b'\n'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Backspace => vec![0x08],
        KeyCode::Esc => vec![0x1B],
        KeyCode::Up => vec![0x1B, b'[', b'A'],
        KeyCode::Down => vec![0x1B, b'[', b'B'],
        KeyCode::Right => vec![0x1B, b'[', b'C'],
        KeyCode::Left => vec![0x1B, b'[', b'D'],
        _ => Vec::new(),
    }
}

impl KeyboardInputProvider for TerminalInputProvider {
    fn poll_input(&mut self) -> io::Result<Option<u8>> {
        if self.pending.is_empty() {
            self.drain_events()?;
        }
        if self.interrupted() {
            return Err(Self::interrupted_error());
        }
        Ok(self.pending.pop_front())
    }
    fn read_input(&mut self) -> io::Result<u8> {
        loop {
            if self.interrupted() {
                return Err(Self::interrupted_error());
            }
            if let Some(b) = self.pending.pop_front() {
                return Ok(b);
            }
            if poll(Self::SIGNAL_CHECK_INTERVAL)? {
                let event = read()?;
                self.handle_event(&event);
            }
        }
    }
    fn check_interrupt(&mut self) -> bool {
        if let Err(e) = self.drain_events() {
            tracing::debug!("Ignoring error while checking for CTRL-C: {e}");
        }
        self.interrupted()
    }
    fn is_interrupted(&self) -> bool {
        self.interrupted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use googletest::prelude::*;
    use yare::parameterized;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new_with_kind(code, modifiers, KeyEventKind::Press))
    }

    fn create_provider() -> TerminalInputProvider {
        TerminalInputProvider::with_termination_signal(Arc::new(AtomicBool::new(false)))
    }

    #[gtest]
    fn test_handle_event_buffers_characters() {
        let mut sut = create_provider();
        sut.handle_event(&press(KeyCode::Char('a'), KeyModifiers::NONE));
        sut.handle_event(&press(KeyCode::Enter, KeyModifiers::NONE));
        sut.handle_event(&press(KeyCode::F(1), KeyModifiers::NONE));
        expect_that!(sut.read_input().unwrap(), eq(b'a'));
        expect_that!(sut.poll_input().unwrap(), eq(Some(b'\n')));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[gtest]
    fn test_handle_event_ctrl_c_interrupts() {
        let mut sut = create_provider();
        sut.handle_event(&press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        expect_that!(sut.is_interrupted(), eq(true));
        let err = sut.read_input().unwrap_err();
        expect_that!(err.kind(), eq(io::ErrorKind::Interrupted));
    }

    #[gtest]
    fn test_handle_event_ctrl_d_gives_end_of_transmission() {
        let mut sut = create_provider();
        sut.handle_event(&press(KeyCode::Char('d'), KeyModifiers::CONTROL));
        expect_that!(sut.read_input().unwrap(), eq(4));
        expect_that!(sut.is_interrupted(), eq(false));
    }

    #[parameterized(
        ctrl_a = { 'a', 0x01 },
        ctrl_upper_z = { 'Z', 0x1A },
        ctrl_at = { '@', 0x00 },
        ctrl_open_bracket = { '[', 0x1B },
        ctrl_backslash = { '\\', 0x1C },
        ctrl_underscore = { '_', 0x1F },
    )]
    fn test_handle_event_control_characters(c: char, expected: u8) {
        let mut sut = create_provider();
        sut.handle_event(&press(KeyCode::Char(c), KeyModifiers::CONTROL));
        assert_eq!(sut.pending, [expected]);
    }

    #[gtest]
    fn test_handle_event_ctrl_digit_keeps_character() {
        let mut sut = create_provider();
        sut.handle_event(&press(KeyCode::Char('1'), KeyModifiers::CONTROL));
        expect_that!(sut.read_input().unwrap(), eq(b'1'));
    }

    #[parameterized(
        up = { KeyCode::Up, b'A' },
        down = { KeyCode::Down, b'B' },
        right = { KeyCode::Right, b'C' },
        left = { KeyCode::Left, b'D' },
    )]
    fn test_handle_event_arrow_keys(code: KeyCode, last: u8) {
        let mut sut = create_provider();
        sut.handle_event(&press(code, KeyModifiers::NONE));
        assert_eq!(sut.pending, [0x1B, b'[', last]);
    }

    #[gtest]
    fn test_handle_event_ignores_release() {
        let mut sut = create_provider();
        sut.handle_event(&Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('x'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        )));
        expect_that!(sut.pending.is_empty(), eq(true));
    }

    #[gtest]
    fn test_termination_signal_interrupts() {
        let signal = Arc::new(AtomicBool::new(false));
        let mut sut = TerminalInputProvider::with_termination_signal(Arc::clone(&signal));
        sut.handle_event(&press(KeyCode::Char('a'), KeyModifiers::NONE));
        expect_that!(sut.is_interrupted(), eq(false));
        signal.store(true, Ordering::Relaxed);
        expect_that!(sut.is_interrupted(), eq(true));
        expect_that!(sut.check_interrupt(), eq(true));
        expect_that!(sut.read_input().unwrap_err().kind(), eq(io::ErrorKind::Interrupted));
        expect_that!(sut.poll_input().unwrap_err().kind(), eq(io::ErrorKind::Interrupted));
    }
}
