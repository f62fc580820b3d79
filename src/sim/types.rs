//! Core simulation types: run parameters and per-step records.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::load_control::{ShedLevel, ShedState, ShedTransition};

/// Centralized simulation configuration.
///
/// # Examples
///
/// ```
/// use bacnet_shed::sim::types::SimConfig;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2007, 2, 27)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .unwrap();
/// let cfg = SimConfig::new(start, 15, 96, 42);
/// assert_eq!(cfg.step.num_minutes(), 15);
/// assert_eq!(cfg.end(), start + chrono::Duration::days(1));
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Wall-clock time of step 0.
    pub start: NaiveDateTime,
    /// Wall-clock time between steps.
    pub step: Duration,
    /// Number of steps to run.
    pub steps: usize,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Arguments
    ///
    /// * `start` - Wall-clock time of step 0
    /// * `step_minutes` - Minutes between steps (must be > 0)
    /// * `steps` - Number of steps to run (must be > 0)
    /// * `seed` - Master random seed
    ///
    /// # Panics
    ///
    /// Panics if `step_minutes` or `steps` is zero.
    pub fn new(start: NaiveDateTime, step_minutes: u32, steps: usize, seed: u64) -> Self {
        assert!(step_minutes > 0, "step_minutes must be > 0");
        assert!(steps > 0, "steps must be > 0");
        Self {
            start,
            step: Duration::minutes(i64::from(step_minutes)),
            steps,
            seed,
        }
    }

    /// Wall-clock time just after the last step.
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.step * self.steps as i32
    }
}

/// Record of one Load Control object after one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Step index.
    pub step: usize,
    /// Wall-clock time the device was ticked at.
    pub time: NaiveDateTime,
    /// Load Control instance.
    pub load_control: u32,
    /// State after the tick.
    pub state: ShedState,
    /// Transition the tick fired, if any.
    pub transition: Option<ShedTransition>,
    pub requested_level: ShedLevel,
    pub actual_level: ShedLevel,
    /// Analog Output instance the object manipulates.
    pub output: u32,
    /// Present value of that output after the tick; `None` when the
    /// reference does not resolve.
    pub present_value: Option<f32>,
    /// Slot currently in control of the output; `None` when relinquished.
    pub command_priority: Option<u8>,
    /// Shed target while a shed is requested or running.
    pub target: Option<f32>,
}

impl StepResult {
    /// Whether the object is inside a shed episode (pending, compliant or not).
    pub fn is_shedding(&self) -> bool {
        self.state != ShedState::Inactive
    }
}

fn level_text(level: ShedLevel) -> String {
    match level {
        ShedLevel::Percent(p) => format!("{p}%"),
        ShedLevel::Level(l) => format!("L{l}"),
        ShedLevel::Amount(a) => format!("-{a:.1}"),
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({}) | lc={} {:<22} | req={:<6} act={:<6} | ao{}={:>6} @{}",
            self.step,
            self.time.format("%m-%d %H:%M"),
            self.load_control,
            self.state.to_string(),
            level_text(self.requested_level),
            level_text(self.actual_level),
            self.output,
            self.present_value
                .map_or_else(|| "?".to_string(), |pv| format!("{pv:.2}")),
            self.command_priority
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
        )?;
        if let Some(transition) = self.transition {
            write!(f, " | {transition}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2007, 2, 27)
            .and_then(|d| d.and_hms_opt(5, 0, 0))
            .expect("valid")
    }

    #[test]
    fn sim_config_basic() {
        let cfg = SimConfig::new(start(), 30, 4, 42);
        assert_eq!(cfg.step, Duration::minutes(30));
        assert_eq!(cfg.steps, 4);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.end(), start() + Duration::hours(2));
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_step_panics() {
        SimConfig::new(start(), 0, 1, 0);
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_steps_panics() {
        SimConfig::new(start(), 15, 0, 0);
    }

    #[test]
    fn step_result_display_names_the_transition() {
        let r = StepResult {
            step: 3,
            time: start(),
            load_control: 0,
            state: ShedState::Compliant,
            transition: Some(ShedTransition::AbleToMeetShed),
            requested_level: ShedLevel::Level(1),
            actual_level: ShedLevel::Level(1),
            output: 0,
            present_value: Some(90.0),
            command_priority: Some(4),
            target: Some(90.0),
        };
        let s = format!("{r}");
        assert!(s.contains("shed-compliant"));
        assert!(s.contains("AbleToMeetShed"));
        assert!(s.contains("ao0= 90.00 @4"));
        assert!(r.is_shedding());
    }

    #[test]
    fn step_result_display_marks_unresolved_output() {
        let r = StepResult {
            step: 0,
            time: start(),
            load_control: 1,
            state: ShedState::NonCompliant,
            transition: None,
            requested_level: ShedLevel::Level(1),
            actual_level: ShedLevel::Level(0),
            output: 9,
            present_value: None,
            command_priority: None,
            target: Some(90.0),
        };
        assert!(format!("{r}").contains("ao9=     ? @-"));
    }
}
