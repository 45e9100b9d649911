use std::time::{Duration, Instant};
use crate::core::error::{Error, ErrorKind, Result};

/// Per-query execution options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub deadline: Option<Instant>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        QueryOptions::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Checks the deadline once every `interval` visited documents,
/// including the first
pub struct DeadlineGuard {
    deadline: Option<Instant>,
    interval: usize,
    visited: usize,
}

impl DeadlineGuard {
    pub fn new(deadline: Option<Instant>, interval: usize) -> Self {
        DeadlineGuard {
            deadline,
            interval: interval.max(1),
            visited: 0,
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        let check = self.visited % self.interval == 0;
        self.visited += 1;
        match self.deadline {
            Some(deadline) if check && Instant::now() >= deadline => Err(Error::new(
                ErrorKind::DeadlineExceeded,
                format!("query deadline passed after visiting {} documents", self.visited - 1),
            )),
            _ => Ok(()),
        }
    }

    pub fn visited(&self) -> usize {
        self.visited
    }
}
