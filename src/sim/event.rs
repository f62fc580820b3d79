use chrono::NaiveDateTime;
use tracing::info;

use crate::codec::{ApplicationValue, PropertyCodec};
use crate::config::EventConfig;
use crate::datetime::BacnetDateTime;
use crate::device::Device;
use crate::dispatch::{PropertyValue, WriteResult};
use crate::load_control::ShedLevel;
use crate::object::{ObjectType, PropertyId};

/// A scripted shed request, issued to one Load Control object through
/// write-property once its issue time is reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShedEvent {
    pub load_control: u32,
    /// When the request is written.
    pub issue_at: NaiveDateTime,
    /// Start_Time of the shed.
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub duty_window_minutes: u32,
    pub level: ShedLevel,
}

impl ShedEvent {
    /// Creates a shed request.
    ///
    /// # Panics
    ///
    /// Panics if `duration_minutes` is zero or `issue_at` is after `start`.
    pub fn new(
        load_control: u32,
        issue_at: NaiveDateTime,
        start: NaiveDateTime,
        duration_minutes: u32,
        duty_window_minutes: u32,
        level: ShedLevel,
    ) -> Self {
        assert!(duration_minutes > 0);
        assert!(issue_at <= start);

        Self {
            load_control,
            issue_at,
            start,
            duration_minutes,
            duty_window_minutes,
            level,
        }
    }

    /// Returns `true` once `now` has reached the issue time.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.issue_at
    }

    /// Writes the request properties, start time last.
    ///
    /// # Errors
    ///
    /// The first rejected write; earlier writes stay applied.
    pub fn issue<C: PropertyCodec>(&self, device: &mut Device<C>) -> WriteResult {
        let start = BacnetDateTime::from_naive(self.start);
        let writes = [
            (PropertyId::RequestedShedLevel, self.level.to_property_value()),
            (
                PropertyId::ShedDuration,
                PropertyValue::Single(ApplicationValue::Unsigned(self.duration_minutes)),
            ),
            (
                PropertyId::DutyWindow,
                PropertyValue::Single(ApplicationValue::Unsigned(self.duty_window_minutes)),
            ),
            (
                PropertyId::StartTime,
                PropertyValue::Sequence(vec![
                    ApplicationValue::Date(start.date),
                    ApplicationValue::Time(start.time),
                ]),
            ),
        ];
        for (property, value) in &writes {
            device.write_value(ObjectType::LoadControl, self.load_control, *property, value, None)?;
        }
        info!(
            load_control = self.load_control,
            level = ?self.level,
            start = %self.start,
            minutes = self.duration_minutes,
            "shed request issued"
        );
        Ok(())
    }
}

impl From<&EventConfig> for ShedEvent {
    fn from(cfg: &EventConfig) -> Self {
        Self::new(
            cfg.load_control,
            cfg.issue_at,
            cfg.start,
            cfg.duration_minutes,
            cfg.duty_window_minutes,
            cfg.level,
        )
    }
}
