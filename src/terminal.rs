use crossterm::{ExecutableCommand, terminal};
use std::io;
use std::io::Write;

/// Restores the terminal from raw mode when dropped, also when unwinding from a panic.
pub struct RawLock {
    is_raw: bool,
}

impl Drop for RawLock {
    fn drop(&mut self) {
        if !self.is_raw {
            return;
        }
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Error resetting terminal {e}");
        }
    }
}

fn handle_set_raw_error(e: &io::Error) {
    tracing::warn!("Could not set terminal to raw mode: {e}");
}

/// Set terminal to raw in best-effort mode, only log on failure, since it does not work when
/// stdin is no terminal, e.g. for cargo doc tests.
///
/// Raw mode disables line buffering and echo, CTRL-C is delivered as key event.
pub fn set_terminal_raw(mut stdout: impl Write) -> RawLock {
    match terminal::enable_raw_mode().and_then(|()| stdout.execute(terminal::EnableLineWrap)) {
        Ok(_) => RawLock { is_raw: true },
        Err(e) => {
            handle_set_raw_error(&e);
            // enabling might have succeeded before the line wrap failed
            RawLock {
                is_raw: terminal::is_raw_mode_enabled().unwrap_or(false),
            }
        }
    }
}

/// Writer for program output, in raw mode `\n` only moves the cursor down,
/// so it is written as `\r\n` while raw mode is active.
pub struct RawModeWriter<W: Write> {
    inner: W,
    translate_newlines: bool,
}

impl<W: Write> RawModeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            translate_newlines: terminal::is_raw_mode_enabled().unwrap_or(false),
        }
    }
    #[cfg(test)]
    const fn with_translation(inner: W) -> Self {
        Self {
            inner,
            translate_newlines: true,
        }
    }
}

impl<W: Write> Write for RawModeWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.translate_newlines {
            return self.inner.write(data);
        }
        for (idx, part) in data.split(|&b| b == b'\n').enumerate() {
            if idx > 0 {
                self.inner.write_all(b"\r\n")?;
            }
            self.inner.write_all(part)?;
        }
        Ok(data.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
