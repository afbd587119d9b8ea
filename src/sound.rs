use std::io::{self, Write};

pub(crate) trait Sound {
    /// Fire-and-forget. Implementations log their own failures.
    fn play_click(&mut self);
}

/// Rings the terminal bell. Each ring starts from the beginning; there is no
/// playback position to rewind.
pub(crate) struct TerminalBell<W: Write> {
    out: W,
    enabled: bool,
}

impl TerminalBell<io::Stdout> {
    pub(crate) fn stdout(enabled: bool) -> Self {
        Self::new(io::stdout(), enabled)
    }
}

impl<W: Write> TerminalBell<W> {
    pub(crate) fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }
}

impl<W: Write> Sound for TerminalBell<W> {
    fn play_click(&mut self) {
        if !self.enabled {
            return;
        }
        let res = self.out.write_all(b"\x07").and_then(|_| self.out.flush());
        if let Err(e) = res {
            log::warn!("sound play failed: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingSound;
