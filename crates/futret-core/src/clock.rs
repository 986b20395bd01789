use crate::UtcDateTime;

/// Source of the current instant.
///
/// The engine reads the clock once per run, so a report is internally
/// consistent and tests can pin time with [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        UtcDateTime::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(UtcDateTime);

impl FixedClock {
    pub const fn new(now: UtcDateTime) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> UtcDateTime {
        self.0
    }
}
