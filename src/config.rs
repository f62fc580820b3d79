//! TOML-based scenario configuration and preset definitions.
//!
//! Date-times are written as quoted ISO strings, e.g.
//! `start = "2007-02-27T05:00:00"`.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::load_control::{ShedLevel, ShedPolicy};
use crate::object::MAX_INSTANCE;
use crate::object::priority::Priority;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Object counts of the simulated device.
    #[serde(default)]
    pub device: DeviceSettings,
    /// Shed policy shared by every Load Control object.
    #[serde(default)]
    pub policy: ShedPolicy,
    /// Priority-16 profile applied to the Analog Outputs.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Random operator overrides.
    #[serde(default)]
    pub operator: OperatorConfig,
    /// Scripted shed requests.
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Wall-clock time of step 0.
    pub start: NaiveDateTime,
    /// Minutes between steps (must be > 0).
    pub step_minutes: u32,
    /// Number of steps to simulate (must be > 0).
    pub steps: usize,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: at(5, 0),
            step_minutes: 15,
            steps: 96,
            seed: 42,
        }
    }
}

/// Objects hosted by the simulated device.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSettings {
    /// Device object instance.
    pub instance: u32,
    /// Table capacity of each object type.
    pub capacity: usize,
    pub analog_outputs: u32,
    pub binary_outputs: u32,
    /// Load Control `n` drives Analog Output `n`.
    pub load_controls: u32,
    /// Full-duty baseline per Load Control, by instance; missing entries keep
    /// the object default.
    pub full_duty_baselines: Vec<f32>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            instance: 260_001,
            capacity: 8,
            analog_outputs: 4,
            binary_outputs: 4,
            load_controls: 4,
            full_duty_baselines: Vec::new(),
        }
    }
}

/// Hourly profile commanded at priority 16 on every Analog Output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// One value per hour of the day, in percent.
    pub hourly: Vec<f32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let mut hourly = vec![60.0; 24];
        for value in &mut hourly[7..22] {
            *value = 100.0;
        }
        Self { hourly }
    }
}

/// Random high-priority overrides of the Analog Outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorConfig {
    pub enabled: bool,
    /// Chance per step and output that an override starts (0.0-1.0).
    pub probability: f64,
    /// Priority the override is written at.
    pub priority: Priority,
    /// Steps an override is held before it is relinquished (must be > 0).
    pub hold_steps: usize,
    /// Value written by the override.
    pub value: f32,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.05,
            priority: Priority::MANUAL_OPERATOR,
            hold_steps: 4,
            value: 100.0,
        }
    }
}

/// A shed request written to one Load Control object.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventConfig {
    /// Load Control instance the request is written to.
    pub load_control: u32,
    /// When the request is written.
    pub issue_at: NaiveDateTime,
    /// Start_Time of the shed.
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub duty_window_minutes: u32,
    /// e.g. `level = { type = "level", value = 1 }`.
    pub level: ShedLevel,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.step_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2007, 2, 27)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

impl ScenarioConfig {
    /// Returns the baseline scenario: two sheds the outputs can meet.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            device: DeviceSettings::default(),
            policy: ShedPolicy::default(),
            schedule: ScheduleConfig::default(),
            operator: OperatorConfig::default(),
            events: vec![
                EventConfig {
                    load_control: 0,
                    issue_at: at(6, 0),
                    start: at(15, 0),
                    duration_minutes: 120,
                    duty_window_minutes: 0,
                    level: ShedLevel::Level(1),
                },
                EventConfig {
                    load_control: 1,
                    issue_at: at(12, 0),
                    start: at(18, 0),
                    duration_minutes: 60,
                    duty_window_minutes: 15,
                    level: ShedLevel::Amount(20.0),
                },
            ],
        }
    }

    /// Returns the non-compliant preset: the afternoon load sits below the
    /// shed target until early evening.
    pub fn non_compliant() -> Self {
        let mut schedule = ScheduleConfig::default();
        for value in &mut schedule.hourly[13..18] {
            *value = 40.0;
        }
        Self {
            schedule,
            events: vec![EventConfig {
                load_control: 0,
                issue_at: at(6, 0),
                start: at(15, 0),
                duration_minutes: 240,
                duty_window_minutes: 30,
                level: ShedLevel::Level(1),
            }],
            ..Self::baseline()
        }
    }

    /// Returns the operator-override preset: frequent life-safety overrides
    /// compete with the sheds.
    pub fn operator_override() -> Self {
        Self {
            operator: OperatorConfig {
                enabled: true,
                probability: 0.2,
                priority: Priority::AUTOMATIC_LIFE_SAFETY,
                hold_steps: 6,
                value: 100.0,
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "non_compliant", "operator_override"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "non_compliant" => Ok(Self::non_compliant()),
            "operator_override" => Ok(Self::operator_override()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.step_minutes == 0 {
            errors.push(ConfigError::new("simulation.step_minutes", "must be > 0"));
        }
        if s.steps == 0 {
            errors.push(ConfigError::new("simulation.steps", "must be > 0"));
        }

        let d = &self.device;
        if d.instance > MAX_INSTANCE {
            errors.push(ConfigError::new(
                "device.instance",
                format!("must be <= {MAX_INSTANCE}"),
            ));
        }
        for (field, count) in [
            ("device.analog_outputs", d.analog_outputs),
            ("device.binary_outputs", d.binary_outputs),
            ("device.load_controls", d.load_controls),
        ] {
            if count as usize > d.capacity {
                errors.push(ConfigError::new(field, "must be <= device.capacity"));
            }
        }
        if d.load_controls > d.analog_outputs {
            errors.push(ConfigError::new(
                "device.load_controls",
                "must be <= device.analog_outputs",
            ));
        }
        if d.full_duty_baselines.len() > d.load_controls as usize {
            errors.push(ConfigError::new(
                "device.full_duty_baselines",
                "has more entries than device.load_controls",
            ));
        }
        if d
            .full_duty_baselines
            .iter()
            .any(|b| !b.is_finite() || *b < 0.0)
        {
            errors.push(ConfigError::new(
                "device.full_duty_baselines",
                "entries must be finite and >= 0",
            ));
        }

        let p = &self.policy;
        if !p.tolerance.is_finite() || p.tolerance < 0.0 {
            errors.push(ConfigError::new("policy.tolerance", "must be >= 0"));
        }
        if p.control_priority == Priority::MINIMUM_ON_OFF {
            errors.push(ConfigError::new(
                "policy.control_priority",
                "priority 6 is reserved for minimum on/off",
            ));
        }
        for (i, entry) in p.levels.iter().enumerate() {
            if entry.level == 0 {
                errors.push(ConfigError::new(
                    format!("policy.levels[{i}].level"),
                    "must be > 0",
                ));
            }
            if !(0.0..=100.0).contains(&entry.percent) {
                errors.push(ConfigError::new(
                    format!("policy.levels[{i}].percent"),
                    "must be in [0, 100]",
                ));
            }
            if p.levels[..i].iter().any(|e| e.level == entry.level) {
                errors.push(ConfigError::new(
                    format!("policy.levels[{i}].level"),
                    format!("duplicate level {}", entry.level),
                ));
            }
        }

        let sched = &self.schedule;
        if sched.hourly.len() != 24 {
            errors.push(ConfigError::new(
                "schedule.hourly",
                format!("must have 24 entries, got {}", sched.hourly.len()),
            ));
        }
        if sched.hourly.iter().any(|v| !(0.0..=100.0).contains(v)) {
            errors.push(ConfigError::new(
                "schedule.hourly",
                "entries must be in [0, 100]",
            ));
        }

        let op = &self.operator;
        if !(0.0..=1.0).contains(&op.probability) {
            errors.push(ConfigError::new(
                "operator.probability",
                "must be in [0.0, 1.0]",
            ));
        }
        if op.hold_steps == 0 {
            errors.push(ConfigError::new("operator.hold_steps", "must be > 0"));
        }
        if op.priority == Priority::MINIMUM_ON_OFF {
            errors.push(ConfigError::new(
                "operator.priority",
                "priority 6 is reserved for minimum on/off",
            ));
        }
        if !(0.0..=100.0).contains(&op.value) {
            errors.push(ConfigError::new("operator.value", "must be in [0, 100]"));
        }

        for (i, event) in self.events.iter().enumerate() {
            if event.load_control >= d.load_controls {
                errors.push(ConfigError::new(
                    format!("events[{i}].load_control"),
                    "no such Load Control object",
                ));
            }
            if event.duration_minutes == 0 {
                errors.push(ConfigError::new(
                    format!("events[{i}].duration_minutes"),
                    "must be > 0",
                ));
            }
            if event.issue_at > event.start {
                errors.push(ConfigError::new(
                    format!("events[{i}].issue_at"),
                    "must be <= events.start",
                ));
            }
            let level_ok = match event.level {
                ShedLevel::Percent(pct) => pct <= 100,
                ShedLevel::Level(l) => l == 0 || p.level_percent(l).is_some(),
                ShedLevel::Amount(a) => a.is_finite() && a >= 0.0,
            };
            if !level_ok {
                errors.push(ConfigError::new(
                    format!("events[{i}].level"),
                    format!("{:?} is not a valid shed level", event.level),
                ));
            }
        }

        errors
    }
}
