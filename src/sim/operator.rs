use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::codec::{ApplicationValue, PropertyCodec};
use crate::config::OperatorConfig;
use crate::device::Device;
use crate::dispatch::PropertyValue;
use crate::object::priority::Priority;
use crate::object::{ObjectType, PropertyId};

/// An override currently held on one Analog Output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    pub output: u32,
    /// Step at which the override is relinquished.
    pub until_step: usize,
}

/// Random operator commanding the Analog Outputs above the Load Control
/// priority.
///
/// Each step, every output without an override has a fixed chance of
/// getting one; an override is held for a fixed number of steps and then
/// relinquished with a Null write at the same priority.
#[derive(Debug, Clone)]
pub struct Operator {
    enabled: bool,
    probability: f64,
    priority: Priority,
    hold_steps: usize,
    value: f32,
    rng: StdRng,
    active: Vec<Override>,
}

impl Operator {
    /// Creates an operator.
    ///
    /// # Arguments
    ///
    /// * `config` - Override settings
    /// * `seed` - Random seed for reproducibility
    ///
    /// # Panics
    ///
    /// Panics if `config.probability` is outside `0.0..=1.0` or
    /// `config.hold_steps` is zero.
    pub fn new(config: &OperatorConfig, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&config.probability));
        assert!(config.hold_steps > 0);
        Self {
            enabled: config.enabled,
            probability: config.probability,
            priority: config.priority,
            hold_steps: config.hold_steps,
            value: config.value,
            rng: StdRng::seed_from_u64(seed),
            active: Vec::new(),
        }
    }

    /// An operator that never acts.
    pub fn disabled() -> Self {
        Self::new(
            &OperatorConfig {
                enabled: false,
                ..OperatorConfig::default()
            },
            0,
        )
    }

    pub fn active(&self) -> &[Override] {
        &self.active
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Releases expired overrides, then rolls for new ones.
    pub fn step<C: PropertyCodec>(&mut self, step: usize, device: &mut Device<C>) {
        let priority = Some(self.priority.get());

        let (expired, held): (Vec<Override>, Vec<Override>) =
            self.active.iter().partition(|o| step >= o.until_step);
        self.active = held;
        for released in expired {
            let relinquish = PropertyValue::Single(ApplicationValue::Null);
            if device
                .write_value(
                    ObjectType::AnalogOutput,
                    released.output,
                    PropertyId::PresentValue,
                    &relinquish,
                    priority,
                )
                .is_ok()
            {
                debug!(output = released.output, step, "operator override released");
            }
        }

        if !self.enabled {
            return;
        }
        let outputs: Vec<u32> = device.analog_outputs.directory().instances().collect();
        for output in outputs {
            if self.active.iter().any(|o| o.output == output) {
                continue;
            }
            if !self.rng.random_bool(self.probability) {
                continue;
            }
            let command = PropertyValue::Single(ApplicationValue::Real(self.value));
            if device
                .write_value(
                    ObjectType::AnalogOutput,
                    output,
                    PropertyId::PresentValue,
                    &command,
                    priority,
                )
                .is_ok()
            {
                debug!(output, step, value = self.value, "operator override");
                self.active.push(Override {
                    output,
                    until_step: step + self.hold_steps,
                });
            }
        }
    }
}
