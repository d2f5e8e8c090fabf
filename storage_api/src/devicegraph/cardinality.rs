use serde::{Deserialize, Serialize};

/// Valid number of children a device can hold.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidCardinality {
    max_count: Option<usize>,
}

impl ValidCardinality {
    pub fn new_zero() -> Self {
        Self::new_at_most(0)
    }

    pub fn new_at_most(v: usize) -> Self {
        Self { max_count: Some(v) }
    }

    pub fn new_unbounded() -> Self {
        Self { max_count: None }
    }

    /// Returns whether one more child can be added to a device that
    /// currently has `current` of them.
    pub fn has_room_for_one_more(&self, current: usize) -> bool {
        self.max_count.map_or(true, |max| current < max)
    }
}
