//! The device: owns one store per object type and routes property requests
//! to them.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::codec::{PropertyCodec, TagCodec};
use crate::config::DeviceSettings;
use crate::dispatch::{
    PropertyAccess, PropertyValue, ReadPropertyRequest, ReadResult, WritePropertyRequest,
    WriteResult,
};
use crate::error::{PropertyError, Result};
use crate::load_control::{LoadControls, ShedPolicy, ShedTransition};
use crate::object::analog_output::AnalogOutputs;
use crate::object::binary_output::BinaryOutputs;
use crate::object::{ArrayIndex, ObjectType, PropertyId, PropertyLists};

/// Largest encoded value the device produces or accepts.
pub const MAX_APDU: usize = 480;

/// Object stores of one device plus the codec used on the request boundary.
#[derive(Debug)]
pub struct Device<C: PropertyCodec = TagCodec> {
    instance: u32,
    codec: C,
    pub analog_outputs: AnalogOutputs,
    pub binary_outputs: BinaryOutputs,
    pub load_controls: LoadControls,
}

impl Device<TagCodec> {
    /// Builds a device from its settings using the bundled codec.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when a configured count exceeds its capacity.
    pub fn from_settings(settings: &DeviceSettings, policy: ShedPolicy) -> Result<Self> {
        Self::with_codec(TagCodec, settings, policy)
    }
}

impl<C: PropertyCodec> Device<C> {
    /// # Errors
    ///
    /// Same as [`Device::from_settings`].
    pub fn with_codec(codec: C, settings: &DeviceSettings, policy: ShedPolicy) -> Result<Self> {
        let mut load_controls =
            LoadControls::with_instances(settings.capacity, settings.load_controls, policy)?;
        for (index, baseline) in settings.full_duty_baselines.iter().enumerate() {
            if let Ok(lc) = load_controls.get_mut(index as u32) {
                lc.full_duty_baseline_set(*baseline)?;
            }
        }
        Ok(Self {
            instance: settings.instance,
            codec,
            analog_outputs: AnalogOutputs::with_instances(
                settings.capacity,
                settings.analog_outputs,
            )?,
            binary_outputs: BinaryOutputs::with_instances(
                settings.capacity,
                settings.binary_outputs,
            )?,
            load_controls,
        })
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    fn access(&self, object_type: ObjectType) -> Option<&dyn PropertyAccess> {
        match object_type {
            ObjectType::AnalogOutput => Some(&self.analog_outputs),
            ObjectType::BinaryOutput => Some(&self.binary_outputs),
            ObjectType::LoadControl => Some(&self.load_controls),
            _ => None,
        }
    }

    /// Required, optional and proprietary properties of an object type.
    pub fn property_lists(&self, object_type: ObjectType) -> Option<PropertyLists> {
        self.access(object_type).map(|access| access.property_lists())
    }

    /// # Errors
    ///
    /// `UnknownObject` for an object type the device does not host, else
    /// whatever the object type reports.
    pub fn read_property(&self, request: &mut ReadPropertyRequest<'_>) -> ReadResult {
        let access = self
            .access(request.object_type)
            .ok_or(PropertyError::unknown_object())?;
        access.read_property(&self.codec, request)
    }

    /// Typed read that stops short of encoding.
    pub fn read_value(
        &self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyId,
        index: ArrayIndex,
    ) -> std::result::Result<PropertyValue, PropertyError> {
        self.access(object_type)
            .ok_or(PropertyError::unknown_object())?
            .read_value(instance, property, index)
    }

    /// # Errors
    ///
    /// `UnknownObject` for an object type the device does not host, else
    /// whatever the object type reports.
    pub fn write_property(&mut self, request: &WritePropertyRequest<'_>) -> WriteResult {
        let Self {
            codec,
            analog_outputs,
            binary_outputs,
            load_controls,
            ..
        } = self;
        let access: &mut dyn PropertyAccess = match request.object_type {
            ObjectType::AnalogOutput => analog_outputs,
            ObjectType::BinaryOutput => binary_outputs,
            ObjectType::LoadControl => load_controls,
            _ => return Err(PropertyError::unknown_object()),
        };
        access.write_property(&*codec, request)
    }

    /// Encodes `value` with the device codec and writes it.
    ///
    /// # Errors
    ///
    /// The codec's overflow error when the value does not fit, else as
    /// [`write_property`](Self::write_property).
    pub fn write_value(
        &mut self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyId,
        value: &PropertyValue,
        priority: Option<u8>,
    ) -> WriteResult {
        let mut buf = [0u8; MAX_APDU];
        let len = value.encode(&self.codec, &mut buf)?;
        let mut request = WritePropertyRequest::new(object_type, instance, property, &buf[..len]);
        request.priority = priority;
        let result = self.write_property(&request);
        if let Err(err) = &result {
            warn!(%object_type, instance, property = %property.name(), ?err, "write failed");
        }
        result
    }

    /// Advances every Load Control machine once.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<(u32, ShedTransition)> {
        self.load_controls.tick(now, &mut self.analog_outputs)
    }

    /// Drops every object of every type.
    pub fn cleanup(&mut self) {
        self.analog_outputs.cleanup();
        self.binary_outputs.cleanup();
        self.load_controls.cleanup();
    }
}
