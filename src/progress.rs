use std::io::{self, Write};
use std::time::Instant;

/// Timestamped progress lines on stderr.
pub struct ConsoleProgress {
    enabled: bool,
    started: Instant,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {}", self.elapsed(), msg.as_ref());
    }

    pub fn progress(&self, label: &str, current: usize, total: usize) {
        if !self.enabled {
            return;
        }
        let total = total.max(1);
        let current = current.min(total);
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {label} {current}/{total}", self.elapsed());
    }

    fn elapsed(&self) -> String {
        let secs = self.started.elapsed().as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
