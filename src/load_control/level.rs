use serde::{Deserialize, Serialize};

use crate::codec::ApplicationValue;
use crate::dispatch::PropertyValue;
use crate::error::PropertyError;
use crate::object::priority::Priority;

/// A shed request, expressed in one of three ways.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ShedLevel {
    /// Percent of full duty to run at; 100 means no shed.
    Percent(u32),
    /// Index into the shed level table; 0 means no shed.
    Level(u32),
    /// Absolute reduction from full duty.
    Amount(f32),
}

impl Default for ShedLevel {
    fn default() -> Self {
        Self::Level(0)
    }
}

impl ShedLevel {
    /// The "no shed" value of the same choice.
    pub fn default_of(self) -> Self {
        match self {
            Self::Percent(_) => Self::Percent(100),
            Self::Level(_) => Self::Level(0),
            Self::Amount(_) => Self::Amount(0.0),
        }
    }

    pub fn is_default(self) -> bool {
        self == self.default_of()
    }

    /// Context tag of the choice on the wire.
    pub const fn context_tag(self) -> u8 {
        match self {
            Self::Percent(_) => 0,
            Self::Level(_) => 1,
            Self::Amount(_) => 2,
        }
    }

    pub fn to_property_value(self) -> PropertyValue {
        let value = match self {
            Self::Percent(p) => ApplicationValue::Unsigned(p),
            Self::Level(l) => ApplicationValue::Unsigned(l),
            Self::Amount(a) => ApplicationValue::Real(a),
        };
        PropertyValue::Choice {
            tag: self.context_tag(),
            value,
        }
    }

    /// # Errors
    ///
    /// `InvalidDataType` for an unknown choice or wrong value type,
    /// `ValueOutOfRange` for a percent above 100 or a negative amount.
    pub fn from_choice(tag: u8, value: &ApplicationValue) -> Result<Self, PropertyError> {
        match (tag, value) {
            (0, ApplicationValue::Unsigned(p)) if *p <= 100 => Ok(Self::Percent(*p)),
            (0, ApplicationValue::Unsigned(_)) => Err(PropertyError::value_out_of_range()),
            (1, ApplicationValue::Unsigned(l)) => Ok(Self::Level(*l)),
            (2, ApplicationValue::Real(a)) if a.is_finite() && *a >= 0.0 => Ok(Self::Amount(*a)),
            (2, ApplicationValue::Real(_)) => Err(PropertyError::value_out_of_range()),
            _ => Err(PropertyError::invalid_data_type()),
        }
    }
}

/// One row of the shed level table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShedLevelEntry {
    pub level: u32,
    /// Percent of full duty the level runs at.
    pub percent: f32,
    pub description: String,
}

impl ShedLevelEntry {
    pub fn new(level: u32, percent: f32, description: &str) -> Self {
        Self {
            level,
            percent,
            description: description.to_string(),
        }
    }
}

/// How the monitored value is compared with the shed target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    /// The monitored value must be at or above the target, so there is
    /// headroom to bring it down.
    #[default]
    AtOrAbove,
    /// The monitored value must already be at or below the target.
    AtOrBelow,
}

/// Device-wide rules shared by every Load Control object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShedPolicy {
    /// Slot the shed target is commanded at.
    pub control_priority: Priority,
    /// Slack allowed when comparing the monitored value with the target.
    pub tolerance: f32,
    pub compliance: Compliance,
    pub levels: Vec<ShedLevelEntry>,
}

impl Default for ShedPolicy {
    fn default() -> Self {
        Self {
            control_priority: Priority::LOAD_CONTROL,
            tolerance: 0.0,
            compliance: Compliance::AtOrAbove,
            levels: vec![
                ShedLevelEntry::new(1, 90.0, "shed 10 percent"),
                ShedLevelEntry::new(2, 80.0, "shed 20 percent"),
                ShedLevelEntry::new(3, 70.0, "shed 30 percent"),
            ],
        }
    }
}

impl ShedPolicy {
    pub fn level_percent(&self, level: u32) -> Option<f32> {
        self.levels
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.percent)
    }

    /// Absolute output value `level` asks for, given the full-duty baseline.
    ///
    /// `None` for a table level that does not exist.
    pub fn target(&self, level: ShedLevel, baseline: f32) -> Option<f32> {
        match level {
            ShedLevel::Percent(p) => Some(baseline * p as f32 / 100.0),
            ShedLevel::Level(0) => Some(baseline),
            ShedLevel::Level(l) => self.level_percent(l).map(|pct| baseline * pct / 100.0),
            ShedLevel::Amount(a) => Some(baseline - a),
        }
    }

    pub fn complies(&self, monitored: f32, target: f32) -> bool {
        match self.compliance {
            Compliance::AtOrAbove => monitored + self.tolerance >= target,
            Compliance::AtOrBelow => monitored - self.tolerance <= target,
        }
    }
}
