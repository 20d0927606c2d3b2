use std::collections::VecDeque;

/// The message pane under the tank. Every line also goes to the log.
#[derive(Debug)]
pub(crate) struct Console {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Console {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn println(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// The newest `n` lines, oldest first.
    pub(crate) fn tail(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).map(String::as_str)
    }
}
