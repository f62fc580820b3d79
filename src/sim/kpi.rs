//! Post-hoc shed statistics computed from simulation results.

use std::fmt;

use serde::Serialize;

use crate::load_control::{ShedState, ShedTransition};

use super::types::StepResult;

/// Aggregate shed outcomes of a complete simulation run.
///
/// Computed post-hoc from `Vec<StepResult>` to ensure consistency between
/// step data and reported metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShedReport {
    /// Total transitions fired.
    pub transitions: usize,
    /// Sheds that reached their start time (compliant or not).
    pub episodes_started: usize,
    pub finished_successful: usize,
    pub finished_unsuccessful: usize,
    /// Requests dropped before they started.
    pub cancelled: usize,
    /// Object-steps spent compliant.
    pub compliant_steps: usize,
    /// Object-steps spent non-compliant.
    pub non_compliant_steps: usize,
    /// Compliant share of the object-steps spent shedding past the start.
    pub compliance_pct: f32,
    /// Object-steps where a shed was running but a more important slot held
    /// the output.
    pub overridden_steps: usize,
}

impl ShedReport {
    /// Computes the report from the complete step record vector.
    ///
    /// # Arguments
    ///
    /// * `results` - Complete simulation step results
    /// * `control_priority` - Slot the Load Control objects command at
    pub fn from_results(results: &[StepResult], control_priority: u8) -> Self {
        let mut report = Self::default();

        for r in results {
            match r.state {
                ShedState::Compliant => report.compliant_steps += 1,
                ShedState::NonCompliant => report.non_compliant_steps += 1,
                _ => {}
            }
            if r.is_shedding() && r.command_priority.is_some_and(|p| p < control_priority) {
                report.overridden_steps += 1;
            }

            let Some(transition) = r.transition else {
                continue;
            };
            report.transitions += 1;
            match transition {
                ShedTransition::AbleToMeetShed | ShedTransition::CannotMeetShed => {
                    report.episodes_started += 1;
                }
                ShedTransition::FinishedSuccessfulShed => report.finished_successful += 1,
                ShedTransition::FinishedUnsuccessfulShed => report.finished_unsuccessful += 1,
                ShedTransition::CancelShed => report.cancelled += 1,
                _ => {}
            }
        }

        let active = report.compliant_steps + report.non_compliant_steps;
        if active > 0 {
            report.compliance_pct = 100.0 * report.compliant_steps as f32 / active as f32;
        }
        report
    }
}

impl fmt::Display for ShedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Shed Report ---")?;
        writeln!(f, "Transitions fired:     {}", self.transitions)?;
        writeln!(f, "Sheds started:         {}", self.episodes_started)?;
        writeln!(
            f,
            "Sheds finished:        {} successful, {} unsuccessful",
            self.finished_successful, self.finished_unsuccessful
        )?;
        writeln!(f, "Requests cancelled:    {}", self.cancelled)?;
        writeln!(
            f,
            "Compliance:            {:.1}% ({} of {} steps)",
            self.compliance_pct,
            self.compliant_steps,
            self.compliant_steps + self.non_compliant_steps
        )?;
        write!(f, "Overridden steps:      {}", self.overridden_steps)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::load_control::ShedLevel;

    fn make_result(state: ShedState, transition: Option<ShedTransition>) -> StepResult {
        StepResult {
            step: 0,
            time: NaiveDate::from_ymd_opt(2007, 2, 27)
                .and_then(|d| d.and_hms_opt(15, 0, 0))
                .expect("valid"),
            load_control: 0,
            state,
            transition,
            requested_level: ShedLevel::Level(1),
            actual_level: ShedLevel::Level(1),
            output: 0,
            present_value: Some(90.0),
            command_priority: Some(4),
            target: Some(90.0),
        }
    }

    #[test]
    fn compliance_share() {
        let results = vec![
            make_result(ShedState::Compliant, Some(ShedTransition::AbleToMeetShed)),
            make_result(ShedState::Compliant, None),
            make_result(ShedState::Compliant, None),
            make_result(
                ShedState::NonCompliant,
                Some(ShedTransition::CanNoLongerComplyWithShed),
            ),
        ];
        let report = ShedReport::from_results(&results, 4);
        assert_eq!(report.compliant_steps, 3);
        assert_eq!(report.non_compliant_steps, 1);
        assert!((report.compliance_pct - 75.0).abs() < 1e-4);
        assert_eq!(report.transitions, 2);
        assert_eq!(report.episodes_started, 1);
    }

    #[test]
    fn counts_episode_outcomes() {
        let results = vec![
            make_result(ShedState::Inactive, Some(ShedTransition::FinishedSuccessfulShed)),
            make_result(ShedState::Inactive, Some(ShedTransition::FinishedUnsuccessfulShed)),
            make_result(ShedState::Inactive, Some(ShedTransition::CancelShed)),
        ];
        let report = ShedReport::from_results(&results, 4);
        assert_eq!(report.finished_successful, 1);
        assert_eq!(report.finished_unsuccessful, 1);
        assert_eq!(report.cancelled, 1);
    }

    #[test]
    fn higher_priority_slot_counts_as_override() {
        let mut r = make_result(ShedState::NonCompliant, None);
        r.command_priority = Some(2);
        let report = ShedReport::from_results(&[r], 4);
        assert_eq!(report.overridden_steps, 1);
    }

    #[test]
    fn empty_results() {
        let report = ShedReport::from_results(&[], 4);
        assert_eq!(report, ShedReport::default());
        assert!(!format!("{report}").is_empty());
    }
}
