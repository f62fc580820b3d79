//! Simulation engine that drives a device through a scripted day.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::codec::{PropertyCodec, TagCodec};
use crate::config::{ConfigError, ScenarioConfig};
use crate::device::Device;
use crate::load_control::{ShedState, ShedTransition};
use crate::object::priority::Priority;

use super::clock::SimClock;
use super::event::ShedEvent;
use super::operator::Operator;
use super::schedule::OutputSchedule;
use super::types::{SimConfig, StepResult};

/// Simulation engine owning the device, its load profile, the operator and
/// the scripted shed requests.
pub struct Engine<C: PropertyCodec = TagCodec> {
    config: SimConfig,
    clock: SimClock,
    device: Device<C>,
    schedule: OutputSchedule,
    operator: Operator,
    events: Vec<ShedEvent>,
    issued: Vec<bool>,
}

impl Engine<TagCodec> {
    /// Builds an engine from a scenario.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or a `ConfigError` on `device`
    /// when the object tables cannot be built.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, ConfigError> {
        if let Some(err) = scenario.validate().into_iter().next() {
            return Err(err);
        }
        let s = &scenario.simulation;
        let config = SimConfig::new(s.start, s.step_minutes, s.steps, s.seed);
        let device =
            Device::from_settings(&scenario.device, scenario.policy.clone()).map_err(|e| {
                ConfigError {
                    field: "device".to_string(),
                    message: e.to_string(),
                }
            })?;
        Ok(Self::new(
            config,
            device,
            OutputSchedule::new(scenario.schedule.hourly.clone()),
            Operator::new(&scenario.operator, s.seed),
            scenario.events.iter().map(ShedEvent::from).collect(),
        ))
    }
}

impl<C: PropertyCodec> Engine<C> {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulation configuration
    /// * `device` - Device whose objects are simulated
    /// * `schedule` - Priority-16 profile for every Analog Output
    /// * `operator` - Random high-priority overrides
    /// * `events` - Shed requests, issued once each when due
    pub fn new(
        config: SimConfig,
        device: Device<C>,
        schedule: OutputSchedule,
        operator: Operator,
        events: Vec<ShedEvent>,
    ) -> Self {
        let clock = SimClock::new(config.start, config.step, config.steps);
        let issued = vec![false; events.len()];
        Self {
            config,
            clock,
            device,
            schedule,
            operator,
            events,
            issued,
        }
    }

    /// Executes one simulation step and returns one record per Load Control
    /// object.
    ///
    /// # Arguments
    ///
    /// * `step` - Step index
    /// * `now` - Wall-clock time of the step
    pub fn step(&mut self, step: usize, now: NaiveDateTime) -> Vec<StepResult> {
        // 1. Scheduled load at the lowest priority
        let scheduled = self.schedule.value_at(now);
        let outputs: Vec<u32> = self.device.analog_outputs.directory().instances().collect();
        for output in outputs {
            if let Err(err) =
                self.device
                    .analog_outputs
                    .present_value_set(output, scheduled, Priority::LOWEST.get())
            {
                warn!(output, %err, "scheduled write failed");
            }
        }

        // 2. Operator overrides
        self.operator.step(step, &mut self.device);

        // 3. Shed requests that came due
        for (event, issued) in self.events.iter().zip(self.issued.iter_mut()) {
            if *issued || !event.is_due(now) {
                continue;
            }
            *issued = true;
            if let Err(err) = event.issue(&mut self.device) {
                warn!(load_control = event.load_control, ?err, "shed request rejected");
            }
        }

        // 4. Advance every Load Control machine
        let fired = self.device.tick(now);

        // 5. Record
        self.record(step, now, &fired)
    }

    fn record(
        &self,
        step: usize,
        now: NaiveDateTime,
        fired: &[(u32, ShedTransition)],
    ) -> Vec<StepResult> {
        let outputs = &self.device.analog_outputs;
        let policy = self.device.load_controls.policy();
        self.device
            .load_controls
            .iter()
            .map(|(instance, lc)| {
                let output = lc.manipulated_output();
                let target = (lc.state() != ShedState::Inactive)
                    .then(|| policy.target(lc.requested_shed_level(), lc.full_duty_baseline()))
                    .flatten();
                StepResult {
                    step,
                    time: now,
                    load_control: instance,
                    state: lc.state(),
                    transition: fired
                        .iter()
                        .find(|(fired_instance, _)| *fired_instance == instance)
                        .map(|(_, transition)| *transition),
                    requested_level: lc.requested_shed_level(),
                    actual_level: lc.actual_shed_level(),
                    output,
                    present_value: outputs.present_value(output).ok(),
                    command_priority: outputs
                        .present_value_priority(output)
                        .ok()
                        .flatten()
                        .map(|p| p.get()),
                    target,
                }
            })
            .collect()
    }

    /// Executes every remaining step and returns the complete record vector.
    pub fn run(&mut self) -> Vec<StepResult> {
        let per_step = self.device.load_controls.count();
        let mut results = Vec::with_capacity(self.config.steps * per_step);
        while let Some((step, now)) = self.clock.tick() {
            results.extend(self.step(step, now));
        }
        results
    }

    pub fn device(&self) -> &Device<C> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut Device<C> {
        &mut self.device
    }

    /// Hands the device over, e.g. to the REST API after a run.
    pub fn into_device(self) -> Device<C> {
        self.device
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
