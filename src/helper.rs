//! Capabilities injected into the note store: a wall clock and an id generator.
use std::{cell::Cell, rc::Rc};

use chrono::Utc;
use log::trace;
use uuid::Uuid;

/// Source of timestamps in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono`, clamped so it never goes backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Cell<i64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis().max(self.last.get());
        self.last.set(now);
        now
    }
}

/// Clock driven by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn starting_at(millis: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(millis)),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.set(millis);
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

/// Produces collision-free note identifiers.
pub trait IdGenerator {
    fn next_id(&self) -> String;
}

/// Random 128-bit identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        let id = Uuid::new_v4().to_string();
        trace!("Generated note id {}", id);
        id
    }
}

/// Monotonic counter ids (`note-1`, `note-2`, ...).
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.get() + 1;
        self.next.set(n);
        format!("note-{}", n)
    }
}
