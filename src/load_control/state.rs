use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::datetime::BacnetDateTime;
use crate::object::analog_output::AnalogOutputs;

use super::LoadControl;
use super::level::ShedPolicy;

/// Load Control state, in wire order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShedState {
    #[default]
    Inactive,
    RequestPending,
    Compliant,
    NonCompliant,
}

impl ShedState {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Inactive => 0,
            Self::RequestPending => 1,
            Self::Compliant => 2,
            Self::NonCompliant => 3,
        }
    }
}

impl fmt::Display for ShedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "shed-inactive",
            Self::RequestPending => "shed-request-pending",
            Self::Compliant => "shed-compliant",
            Self::NonCompliant => "shed-non-compliant",
        })
    }
}

/// Named transition applied by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShedTransition {
    ReceivedShedRequest,
    CancelShed,
    ReconfigurePending,
    AbleToMeetShed,
    AwaitingCompliance,
    CannotMeetShed,
    FinishedUnsuccessfulShed,
    UnsuccessfulShedReconfigured,
    CanNowComplyWithShed,
    FinishedSuccessfulShed,
    SuccessfulShedReconfigured,
    CanNoLongerComplyWithShed,
    Disabled,
}

impl fmt::Display for ShedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

impl LoadControl {
    /// Advances the machine by at most one transition.
    ///
    /// Never fails: unresolvable output references and impossible start
    /// times are logged and treated as "cannot meet" or "cancel".
    pub(crate) fn step(
        &mut self,
        instance: u32,
        now: NaiveDateTime,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        let from = self.state;
        let transition = if !self.enable {
            self.disabled(instance, outputs, policy)
        } else {
            match self.state {
                ShedState::Inactive => self.inactive(),
                ShedState::RequestPending => self.pending(instance, now, outputs, policy),
                ShedState::NonCompliant => self.non_compliant(instance, now, outputs, policy),
                ShedState::Compliant => self.compliant(instance, now, outputs, policy),
            }
        };

        if let Some(transition) = transition {
            if self.state != from {
                self.state_entry_time = Some(self.entry_time(transition, now));
            }
            debug!(instance, %from, to = %self.state, %transition, "shed transition");
        }
        self.last_transition = transition;
        transition
    }

    /// A non-compliant shed that is reconfigured restarts from the new start
    /// boundary; every other state change is stamped with the tick time.
    fn entry_time(&self, transition: ShedTransition, now: NaiveDateTime) -> NaiveDateTime {
        match transition {
            ShedTransition::UnsuccessfulShedReconfigured => {
                self.start_time.resolve().unwrap_or(now)
            }
            _ => now,
        }
    }

    fn flags_raised(&self) -> bool {
        self.request_written || self.start_time_written
    }

    fn clear_flags(&mut self) {
        self.request_written = false;
        self.start_time_written = false;
    }

    fn reset_levels(&mut self) {
        let idle = self.requested_shed_level.default_of();
        self.expected_shed_level = idle;
        self.actual_shed_level = idle;
    }

    fn episode_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.start_time.resolve()?;
        let end = start.checked_add_signed(minutes(self.shed_duration))?;
        Some((start, end))
    }

    fn disabled(
        &mut self,
        instance: u32,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        if self.state == ShedState::Inactive {
            return None;
        }
        self.release(instance, outputs, policy);
        self.clear_flags();
        self.reset_levels();
        self.state = ShedState::Inactive;
        Some(ShedTransition::Disabled)
    }

    fn inactive(&mut self) -> Option<ShedTransition> {
        if !self.flags_raised() {
            return None;
        }
        // flags stay raised for the pending evaluation
        self.state = ShedState::RequestPending;
        Some(ShedTransition::ReceivedShedRequest)
    }

    fn cancel(
        &mut self,
        instance: u32,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        self.release(instance, outputs, policy);
        self.clear_flags();
        self.reset_levels();
        self.state = ShedState::Inactive;
        Some(ShedTransition::CancelShed)
    }

    fn pending(
        &mut self,
        instance: u32,
        now: NaiveDateTime,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        if self.request_written && self.requested_shed_level.is_default() {
            return self.cancel(instance, outputs, policy);
        }
        if self.start_time_written && self.start_time.is_wildcard() {
            return self.cancel(instance, outputs, policy);
        }
        let Some((start, end)) = self.episode_bounds() else {
            debug!(instance, start_time = %self.start_time, "start time cannot be resolved");
            return self.cancel(instance, outputs, policy);
        };
        if end < now {
            return self.cancel(instance, outputs, policy);
        }
        if now < start {
            if !self.flags_raised() {
                return None;
            }
            self.clear_flags();
            self.expected_shed_level = self.requested_shed_level;
            self.actual_shed_level = self.requested_shed_level.default_of();
            return Some(ShedTransition::ReconfigurePending);
        }
        if now == start {
            return None;
        }

        self.clear_flags();
        if self.able_to_meet(instance, outputs, policy) {
            self.shed(instance, outputs, policy);
            self.state = ShedState::Compliant;
            info!(instance, level = ?self.requested_shed_level, "shed started, compliant");
            return Some(ShedTransition::AbleToMeetShed);
        }
        let window_end = start.checked_add_signed(minutes(self.duty_window));
        if window_end.is_some_and(|window_end| now < window_end) {
            return Some(ShedTransition::AwaitingCompliance);
        }
        self.release(instance, outputs, policy);
        self.reset_levels();
        self.state = ShedState::NonCompliant;
        info!(instance, level = ?self.requested_shed_level, "shed started, cannot comply");
        Some(ShedTransition::CannotMeetShed)
    }

    fn finish(&mut self, instance: u32, outputs: &mut AnalogOutputs, policy: &ShedPolicy) {
        self.release(instance, outputs, policy);
        self.clear_flags();
        self.reset_levels();
        self.start_time = BacnetDateTime::wildcard();
        self.state = ShedState::Inactive;
    }

    fn is_finished(&self, now: NaiveDateTime) -> bool {
        self.episode_bounds().is_none_or(|(_, end)| now >= end)
    }

    fn non_compliant(
        &mut self,
        instance: u32,
        now: NaiveDateTime,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        if self.is_finished(now) {
            self.finish(instance, outputs, policy);
            info!(instance, "shed finished unsuccessfully");
            return Some(ShedTransition::FinishedUnsuccessfulShed);
        }
        if self.flags_raised() {
            self.clear_flags();
            self.state = ShedState::RequestPending;
            return Some(ShedTransition::UnsuccessfulShedReconfigured);
        }
        if self.able_to_meet(instance, outputs, policy) {
            self.shed(instance, outputs, policy);
            self.state = ShedState::Compliant;
            return Some(ShedTransition::CanNowComplyWithShed);
        }
        None
    }

    fn compliant(
        &mut self,
        instance: u32,
        now: NaiveDateTime,
        outputs: &mut AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<ShedTransition> {
        if self.is_finished(now) {
            self.finish(instance, outputs, policy);
            info!(instance, "shed finished successfully");
            return Some(ShedTransition::FinishedSuccessfulShed);
        }
        if self.flags_raised() {
            self.clear_flags();
            self.state = ShedState::RequestPending;
            return Some(ShedTransition::SuccessfulShedReconfigured);
        }
        if !self.able_to_meet(instance, outputs, policy) {
            self.reset_levels();
            self.state = ShedState::NonCompliant;
            return Some(ShedTransition::CanNoLongerComplyWithShed);
        }
        None
    }

    /// Whether the manipulated output is free to be commanded at the control
    /// priority and the monitored output satisfies the target.
    fn able_to_meet(&self, instance: u32, outputs: &AnalogOutputs, policy: &ShedPolicy) -> bool {
        let Some(target) = self.shed_target(instance, outputs, policy) else {
            return false;
        };
        match outputs.present_value_priority(self.manipulated_output) {
            Ok(Some(active)) if active < policy.control_priority => return false,
            Ok(_) => {}
            Err(err) => {
                warn!(instance, %err, "manipulated output unresolved");
                return false;
            }
        }
        match outputs.present_value(self.monitored_output) {
            Ok(value) => policy.complies(value, target),
            Err(err) => {
                warn!(instance, %err, "monitored output unresolved");
                false
            }
        }
    }

    /// Target for the requested level, provided the manipulated output can
    /// hold it.
    fn shed_target(
        &self,
        instance: u32,
        outputs: &AnalogOutputs,
        policy: &ShedPolicy,
    ) -> Option<f32> {
        let Some(target) = policy.target(self.requested_shed_level, self.full_duty_baseline)
        else {
            warn!(instance, level = ?self.requested_shed_level, "shed level not in table");
            return None;
        };
        match outputs.attributes(self.manipulated_output) {
            Ok(limits) if (limits.min_pres_value..=limits.max_pres_value).contains(&target) => {
                Some(target)
            }
            Ok(limits) => {
                warn!(
                    instance,
                    target,
                    min = limits.min_pres_value,
                    max = limits.max_pres_value,
                    "shed target outside output limits"
                );
                None
            }
            Err(err) => {
                warn!(instance, %err, "manipulated output unresolved");
                None
            }
        }
    }

    /// Commands the target, capturing the pre-shed value on first write.
    fn shed(&mut self, instance: u32, outputs: &mut AnalogOutputs, policy: &ShedPolicy) {
        let Some(target) = self.shed_target(instance, outputs, policy) else {
            return;
        };
        if self.captured_baseline.is_none() {
            self.captured_baseline = outputs.present_value(self.manipulated_output).ok();
        }
        match outputs.present_value_set(self.manipulated_output, target, policy.control_priority.get()) {
            Ok(()) => self.output_written = true,
            Err(err) => warn!(instance, %err, "failed to command shed target"),
        }
        self.expected_shed_level = self.requested_shed_level;
        self.actual_shed_level = self.requested_shed_level;
    }

    /// Gives the control slot back, if this machine holds it.
    fn release(&mut self, instance: u32, outputs: &mut AnalogOutputs, policy: &ShedPolicy) {
        if !self.output_written {
            return;
        }
        match outputs.present_value_relinquish(self.manipulated_output, policy.control_priority.get()) {
            Ok(()) => debug!(
                instance,
                restored = ?outputs.present_value(self.manipulated_output).ok(),
                captured = ?self.captured_baseline,
                "control slot relinquished"
            ),
            Err(err) => warn!(instance, %err, "failed to relinquish control slot"),
        }
        self.output_written = false;
        self.captured_baseline = None;
    }
}
