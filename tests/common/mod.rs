//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use bacnet_shed::codec::{ApplicationValue, PropertyCodec, TagCodec, decode_all, encode_all};
use bacnet_shed::config::DeviceSettings;
use bacnet_shed::datetime::{BacnetDate, BacnetTime};
use bacnet_shed::device::Device;
use bacnet_shed::dispatch::{ReadPropertyRequest, WritePropertyRequest, WriteResult};
use bacnet_shed::error::PropertyError;
use bacnet_shed::load_control::{ShedLevel, ShedPolicy};
use bacnet_shed::object::{ArrayIndex, ObjectType, PropertyId};

/// Wall-clock time on the day every scenario runs on (2007-02-27).
pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2007, 2, 27)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .expect("valid time")
}

/// Device with four objects of each type and the default shed policy.
pub fn device() -> Device {
    Device::from_settings(&DeviceSettings::default(), ShedPolicy::default()).expect("valid")
}

/// Encodes `values` back to back and writes them as one property.
pub fn write(
    dev: &mut Device,
    object_type: ObjectType,
    instance: u32,
    property: PropertyId,
    values: &[ApplicationValue],
    priority: Option<u8>,
) -> WriteResult {
    let mut buf = [0u8; 64];
    let len = encode_all(&TagCodec, values, &mut buf).expect("fits");
    let mut request = WritePropertyRequest::new(object_type, instance, property, &buf[..len]);
    request.priority = priority;
    dev.write_property(&request)
}

/// Commands an Analog Output's present value.
pub fn command_ao(dev: &mut Device, instance: u32, value: f32, priority: Option<u8>) -> WriteResult {
    write(
        dev,
        ObjectType::AnalogOutput,
        instance,
        PropertyId::PresentValue,
        &[ApplicationValue::Real(value)],
        priority,
    )
}

/// Writes Requested_Shed_Level as its context-tagged choice.
pub fn write_shed_level(dev: &mut Device, instance: u32, level: ShedLevel) -> WriteResult {
    let (tag, value) = match level {
        ShedLevel::Percent(p) => (0, ApplicationValue::Unsigned(p)),
        ShedLevel::Level(l) => (1, ApplicationValue::Unsigned(l)),
        ShedLevel::Amount(a) => (2, ApplicationValue::Real(a)),
    };
    let mut buf = [0u8; 16];
    let len = TagCodec.encode_context(tag, &value, &mut buf).expect("fits");
    let request = WritePropertyRequest::new(
        ObjectType::LoadControl,
        instance,
        PropertyId::RequestedShedLevel,
        &buf[..len],
    );
    dev.write_property(&request)
}

/// Writes Start_Time as an application Date followed by a Time.
pub fn write_start_time(
    dev: &mut Device,
    instance: u32,
    date: BacnetDate,
    time: BacnetTime,
) -> WriteResult {
    write(
        dev,
        ObjectType::LoadControl,
        instance,
        PropertyId::StartTime,
        &[ApplicationValue::Date(date), ApplicationValue::Time(time)],
        None,
    )
}

pub fn write_unsigned(dev: &mut Device, instance: u32, property: PropertyId, value: u32) -> WriteResult {
    write(
        dev,
        ObjectType::LoadControl,
        instance,
        property,
        &[ApplicationValue::Unsigned(value)],
        None,
    )
}

/// Issues the shed request the scenarios share: `level`, `minutes` long,
/// starting 2007-02-27 at `hour`:00.
pub fn request_shed(dev: &mut Device, instance: u32, level: ShedLevel, hour: u8, minutes: u32) {
    write_shed_level(dev, instance, level).expect("level accepted");
    write_unsigned(dev, instance, PropertyId::ShedDuration, minutes).expect("duration accepted");
    write_start_time(
        dev,
        instance,
        BacnetDate::new(2007, 2, 27),
        BacnetTime::new(hour, 0, 0, 0),
    )
    .expect("start accepted");
}

/// Reads a property through dispatch and returns the raw encoding.
pub fn read_bytes(
    dev: &Device,
    object_type: ObjectType,
    instance: u32,
    property: PropertyId,
    array_index: ArrayIndex,
) -> Result<Vec<u8>, PropertyError> {
    let mut buf = [0u8; 480];
    let mut request = ReadPropertyRequest {
        object_type,
        object_instance: instance,
        property,
        array_index,
        application_data: &mut buf,
    };
    let len = dev.read_property(&mut request)?;
    Ok(buf[..len].to_vec())
}

/// Reads a property through dispatch and decodes the application values.
pub fn read(
    dev: &Device,
    object_type: ObjectType,
    instance: u32,
    property: PropertyId,
    array_index: ArrayIndex,
) -> Result<Vec<ApplicationValue>, PropertyError> {
    let bytes = read_bytes(dev, object_type, instance, property, array_index)?;
    Ok(decode_all(&TagCodec, &bytes).expect("decodable"))
}
