use chrono::{NaiveDateTime, Timelike};

/// Hour-of-day profile for the Analog Outputs' priority-16 slot.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchedule {
    hourly: Vec<f32>,
}

impl OutputSchedule {
    /// Creates a schedule from one value per hour.
    ///
    /// # Panics
    ///
    /// Panics if `hourly` does not hold exactly 24 values.
    pub fn new(hourly: Vec<f32>) -> Self {
        assert_eq!(hourly.len(), 24, "hourly profile must have 24 values");
        Self { hourly }
    }

    /// A schedule holding `value` all day.
    pub fn flat(value: f32) -> Self {
        Self {
            hourly: vec![value; 24],
        }
    }

    /// Scheduled value for the hour `now` falls in.
    pub fn value_at(&self, now: NaiveDateTime) -> f32 {
        self.hourly[now.hour() as usize % self.hourly.len()]
    }

    pub fn hourly(&self) -> &[f32] {
        &self.hourly
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::OutputSchedule;

    #[test]
    fn value_follows_hour_of_day() {
        let mut hourly = vec![10.0; 24];
        hourly[15] = 55.0;
        let schedule = OutputSchedule::new(hourly);
        let now = NaiveDate::from_ymd_opt(2007, 2, 27)
            .and_then(|d| d.and_hms_opt(15, 45, 0))
            .expect("valid");
        assert_eq!(schedule.value_at(now), 55.0);
        assert_eq!(schedule.value_at(now - chrono::Duration::hours(1)), 10.0);
    }

    #[test]
    fn flat_is_constant() {
        let schedule = OutputSchedule::flat(70.0);
        assert!(schedule.hourly().iter().all(|v| *v == 70.0));
    }

    #[test]
    #[should_panic]
    fn short_profile_panics() {
        OutputSchedule::new(vec![1.0; 12]);
    }
}
