//! Per-direction packet counter.
//!
//! Reusing a counter under the same session key exposes the XOR of two
//! plaintexts. The counter only moves forward: taking a value consumes the
//! counter and hands back its successor, and the last value hands back none.

#[derive(Debug, PartialEq, Eq)]
pub struct Counter(u32);

impl Counter {
    pub const fn starting_at(first: u32) -> Self {
        Self(first)
    }

    /// Peek at the value the next `harvest` will produce.
    pub const fn peek(&self) -> u32 {
        self.0
    }

    /// Consumes the counter, returning its value and the counter to use next.
    /// `None` once `u32::MAX` has been handed out.
    pub fn harvest(self) -> (u32, Option<Self>) {
        let next = self.0.checked_add(1).map(Self);
        (self.0, next)
    }
}
