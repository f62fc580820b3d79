use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, Result};

/// Number of slots in a priority array.
pub const PRIORITY_LEVELS: usize = 16;

/// A command priority in `1..=16`; 1 takes precedence over everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MANUAL_LIFE_SAFETY: Self = Self(1);
    pub const AUTOMATIC_LIFE_SAFETY: Self = Self(2);
    /// Default level the Load Control objects command their outputs at.
    pub const LOAD_CONTROL: Self = Self(4);
    pub const CRITICAL_EQUIPMENT_CONTROL: Self = Self(5);
    /// Reserved for minimum on/off timing; protocol writes may not use it.
    pub const MINIMUM_ON_OFF: Self = Self(6);
    pub const MANUAL_OPERATOR: Self = Self(8);
    pub const LOWEST: Self = Self(16);

    /// # Errors
    ///
    /// `InvalidArgument` when `level` is outside `1..=16`.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=PRIORITY_LEVELS as u8).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ObjectError::InvalidArgument(format!(
                "priority {level} outside 1..=16"
            )))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    const fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for Priority {
    type Error = ObjectError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sixteen independently settable command slots.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityArray<T> {
    slots: [Option<T>; PRIORITY_LEVELS],
}

impl<T: Copy> Default for PriorityArray<T> {
    fn default() -> Self {
        Self {
            slots: [None; PRIORITY_LEVELS],
        }
    }
}

impl<T: Copy> PriorityArray<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, priority: Priority, value: T) {
        self.slots[priority.slot()] = Some(value);
    }

    pub fn relinquish(&mut self, priority: Priority) {
        self.slots[priority.slot()] = None;
    }

    pub fn get(&self, priority: Priority) -> Option<T> {
        self.slots[priority.slot()]
    }

    /// The most important occupied slot and its value.
    pub fn active(&self) -> Option<(Priority, T)> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(i, slot)| slot.map(|value| (Priority(i as u8 + 1), value)))
    }

    /// Resolved value: the active slot, or `default` when every slot is empty.
    pub fn resolve(&self, default: T) -> T {
        self.active().map_or(default, |(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots = [None; PRIORITY_LEVELS];
    }

    /// Slots in priority order, 1 first.
    pub fn slots(&self) -> &[Option<T>; PRIORITY_LEVELS] {
        &self.slots
    }
}
