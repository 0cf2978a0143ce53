use std::collections::VecDeque;

use reptrack_app::{
    Settings,
    log::{Entry, Error, Repository},
};

/// Keeps the most recent log entries, newest first.
pub struct MemoryLog {
    entries: VecDeque<Entry>,
    capacity: usize,
}

impl MemoryLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.log_capacity)
    }
}

impl Repository for MemoryLog {
    fn read_entries(&self) -> Result<VecDeque<Entry>, Error> {
        Ok(self.entries.clone())
    }

    fn write_entry(&mut self, entry: Entry) -> Result<(), Error> {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        Ok(())
    }
}
