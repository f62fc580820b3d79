//! Load Control objects: demand-response shed episodes driven against an
//! Analog Output.
//!
//! Each object is an independent state machine advanced by
//! [`LoadControls::tick`]. Writes to the shed request properties raise
//! flags that the next tick consumes; nothing happens between ticks.

/// Shed levels and the device-wide shed policy.
pub mod level;
mod property;
/// States, transitions and the per-tick evaluation.
pub mod state;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::datetime::BacnetDateTime;
use crate::error::{ObjectError, Result};
use crate::object::ObjectType;
use crate::object::analog_output::AnalogOutputs;
use crate::object::directory::ObjectDirectory;

pub use level::{Compliance, ShedLevel, ShedLevelEntry, ShedPolicy};
pub use state::{ShedState, ShedTransition};

/// One Load Control object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadControl {
    object_name: String,
    description: String,
    enable: bool,
    requested_shed_level: ShedLevel,
    expected_shed_level: ShedLevel,
    actual_shed_level: ShedLevel,
    /// Minutes.
    shed_duration: u32,
    /// Minutes.
    duty_window: u32,
    start_time: BacnetDateTime,
    full_duty_baseline: f32,
    state: ShedState,
    state_entry_time: Option<NaiveDateTime>,
    manipulated_output: u32,
    monitored_output: u32,
    #[serde(skip)]
    request_written: bool,
    #[serde(skip)]
    start_time_written: bool,
    #[serde(skip)]
    output_written: bool,
    captured_baseline: Option<f32>,
    last_transition: Option<ShedTransition>,
}

impl LoadControl {
    /// A machine that manipulates and monitors Analog Output `output`.
    pub fn new(instance: u32, output: u32) -> Self {
        Self {
            object_name: format!("{}-{instance}", ObjectType::LoadControl),
            description: String::new(),
            enable: true,
            requested_shed_level: ShedLevel::default(),
            expected_shed_level: ShedLevel::default(),
            actual_shed_level: ShedLevel::default(),
            shed_duration: 0,
            duty_window: 0,
            start_time: BacnetDateTime::wildcard(),
            full_duty_baseline: 100.0,
            state: ShedState::Inactive,
            state_entry_time: None,
            manipulated_output: output,
            monitored_output: output,
            request_written: false,
            start_time_written: false,
            output_written: false,
            captured_baseline: None,
            last_transition: None,
        }
    }

    pub fn state(&self) -> ShedState {
        self.state
    }

    pub fn state_entry_time(&self) -> Option<NaiveDateTime> {
        self.state_entry_time
    }

    pub fn last_transition(&self) -> Option<ShedTransition> {
        self.last_transition
    }

    pub fn enable(&self) -> bool {
        self.enable
    }

    /// Disabling takes effect on the next tick.
    pub fn enable_set(&mut self, enable: bool) {
        self.enable = enable;
    }

    pub fn requested_shed_level(&self) -> ShedLevel {
        self.requested_shed_level
    }

    pub fn requested_shed_level_set(&mut self, level: ShedLevel) {
        self.requested_shed_level = level;
        self.request_written = true;
    }

    pub fn expected_shed_level(&self) -> ShedLevel {
        self.expected_shed_level
    }

    pub fn actual_shed_level(&self) -> ShedLevel {
        self.actual_shed_level
    }

    pub fn shed_duration(&self) -> u32 {
        self.shed_duration
    }

    pub fn shed_duration_set(&mut self, minutes: u32) {
        self.shed_duration = minutes;
        self.request_written = true;
    }

    pub fn duty_window(&self) -> u32 {
        self.duty_window
    }

    pub fn duty_window_set(&mut self, minutes: u32) {
        self.duty_window = minutes;
        self.request_written = true;
    }

    pub fn start_time(&self) -> BacnetDateTime {
        self.start_time
    }

    pub fn start_time_set(&mut self, start: BacnetDateTime) {
        self.start_time = start;
        self.start_time_written = true;
    }

    pub fn full_duty_baseline(&self) -> f32 {
        self.full_duty_baseline
    }

    /// # Errors
    ///
    /// `InvalidArgument` for a negative or non-finite baseline.
    pub fn full_duty_baseline_set(&mut self, baseline: f32) -> Result<()> {
        if !baseline.is_finite() || baseline < 0.0 {
            return Err(ObjectError::InvalidArgument(format!(
                "full duty baseline {baseline}"
            )));
        }
        self.full_duty_baseline = baseline;
        Ok(())
    }

    /// Pre-shed value of the manipulated output, held while this machine
    /// commands it.
    pub fn captured_baseline(&self) -> Option<f32> {
        self.captured_baseline
    }

    pub fn manipulated_output(&self) -> u32 {
        self.manipulated_output
    }

    pub fn manipulated_output_set(&mut self, instance: u32) {
        self.manipulated_output = instance;
    }

    pub fn monitored_output(&self) -> u32 {
        self.monitored_output
    }

    pub fn monitored_output_set(&mut self, instance: u32) {
        self.monitored_output = instance;
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// # Errors
    ///
    /// `InvalidArgument` for an empty name.
    pub fn object_name_set(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ObjectError::InvalidArgument("object name is empty".into()));
        }
        self.object_name = name.to_string();
        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn description_set(&mut self, text: &str) {
        self.description = text.to_string();
    }
}

/// Every Load Control object of a device plus the shed policy they share.
#[derive(Debug, Clone)]
pub struct LoadControls {
    directory: ObjectDirectory<LoadControl>,
    policy: ShedPolicy,
}

impl LoadControls {
    pub fn new(capacity: usize, policy: ShedPolicy) -> Self {
        Self {
            directory: ObjectDirectory::new(ObjectType::LoadControl, capacity),
            policy,
        }
    }

    /// Builds instances `0..count`, each driving the Analog Output with the
    /// same instance number.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when `count > capacity`.
    pub fn with_instances(capacity: usize, count: u32, policy: ShedPolicy) -> Result<Self> {
        let mut store = Self::new(capacity, policy);
        for instance in 0..count {
            store.create(Some(instance))?;
        }
        Ok(store)
    }

    pub fn policy(&self) -> &ShedPolicy {
        &self.policy
    }

    pub fn directory(&self) -> &ObjectDirectory<LoadControl> {
        &self.directory
    }

    pub fn count(&self) -> usize {
        self.directory.count()
    }

    pub fn valid_instance(&self, instance: u32) -> bool {
        self.directory.valid_instance(instance)
    }

    pub fn index_to_instance(&self, index: usize) -> u32 {
        self.directory.index_to_instance(index)
    }

    pub fn instance_to_index(&self, instance: u32) -> usize {
        self.directory.instance_to_index(instance)
    }

    /// Creates an object. `None` picks the lowest free instance; an existing
    /// instance is returned unchanged.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the table is full.
    pub fn create(&mut self, instance: Option<u32>) -> Result<u32> {
        let instance = match instance {
            Some(instance) => instance,
            None => self
                .directory
                .next_free_instance()
                .ok_or(ObjectError::CapacityExceeded {
                    object_type: ObjectType::LoadControl,
                    capacity: self.directory.capacity(),
                })?,
        };
        self.directory
            .object_instance_add(instance, LoadControl::new(instance, instance))?;
        Ok(instance)
    }

    pub fn delete(&mut self, instance: u32) -> bool {
        self.directory.remove(instance).is_some()
    }

    pub fn cleanup(&mut self) {
        self.directory.clear();
    }

    pub fn get(&self, instance: u32) -> Result<&LoadControl> {
        self.directory.lookup(instance)
    }

    pub fn get_mut(&mut self, instance: u32) -> Result<&mut LoadControl> {
        self.directory.lookup_mut(instance)
    }

    pub fn state(&self, instance: u32) -> Result<ShedState> {
        Ok(self.get(instance)?.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &LoadControl)> {
        self.directory.iter()
    }

    /// Advances every machine once; returns the transitions that fired.
    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        outputs: &mut AnalogOutputs,
    ) -> Vec<(u32, ShedTransition)> {
        let policy = &self.policy;
        self.directory
            .iter_mut()
            .filter_map(|(instance, lc)| {
                lc.step(instance, now, outputs, policy)
                    .map(|transition| (instance, transition))
            })
            .collect()
    }
}
