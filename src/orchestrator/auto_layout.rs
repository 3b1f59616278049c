//! Auto-layout batch ids.
//!
//! Every relayout bumps the id the host tags rendered batches with. A batch
//! tagged with an older id still carries valid sizes, but its offsets are
//! only trustworthy when it was produced after the last data change (the
//! base id). Ids wrap at 31 bits, so "after" is a circular comparison.

const ID_MASK: u32 = 0x7FFF_FFFF;
const BASE_TOGGLE: u32 = 0x4000_0000;

/// How a reported batch relates to the current layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchValidity {
    /// Produced for the current layout.
    Current,
    /// Produced for an older layout of the same data; sizes are usable.
    Stale,
    /// Produced before the last data change; ignore it.
    Invalid,
}

/// Current and base auto-layout ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoLayoutIds {
    current: u32,
    base: u32,
}

impl AutoLayoutIds {
    /// Id the host should tag batches with.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Id of the first layout after the last data change.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Advance after a relayout. The base moves away if the wrap caught up with it.
    pub fn bump(&mut self) -> u32 {
        self.current = (self.current + 1) & ID_MASK;
        if self.current == self.base {
            self.base ^= BASE_TOGGLE;
        }
        self.current
    }

    /// Advance after a data change; older batches become invalid.
    pub fn rebase(&mut self) -> u32 {
        self.current = (self.current + 1) & ID_MASK;
        self.base = self.current;
        self.current
    }

    /// Classify a batch tagged with `reported`.
    pub fn classify(&self, reported: u32) -> BatchValidity {
        if reported == self.current {
            return BatchValidity::Current;
        }
        let after_base = if self.current >= self.base {
            self.current > reported && reported >= self.base
        } else {
            self.current > reported || reported >= self.base
        };
        if after_base {
            BatchValidity::Stale
        } else {
            BatchValidity::Invalid
        }
    }
}
