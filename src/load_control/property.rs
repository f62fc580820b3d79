use crate::codec::{AppTag, ApplicationValue, PropertyCodec, decode_all};
use crate::datetime::BacnetDateTime;
use crate::dispatch::{
    self, PropertyAccess, PropertyValue, WritePropertyRequest, WriteResult, decode_error,
};
use crate::error::PropertyError;
use crate::object::{EVENT_STATE_NORMAL, ObjectId, ObjectType, PropertyId, PropertyLists, StatusFlags};

use super::{LoadControls, ShedLevel};

const REQUIRED: &[PropertyId] = &[
    PropertyId::ObjectIdentifier,
    PropertyId::ObjectName,
    PropertyId::ObjectType,
    PropertyId::PresentValue,
    PropertyId::StatusFlags,
    PropertyId::EventState,
    PropertyId::RequestedShedLevel,
    PropertyId::StartTime,
    PropertyId::ShedDuration,
    PropertyId::DutyWindow,
    PropertyId::Enable,
    PropertyId::ExpectedShedLevel,
    PropertyId::ActualShedLevel,
    PropertyId::ShedLevels,
    PropertyId::ShedLevelDescriptions,
    PropertyId::PropertyList,
];

const OPTIONAL: &[PropertyId] = &[
    PropertyId::Description,
    PropertyId::StateDescription,
    PropertyId::FullDutyBaseline,
];

pub(super) const PROPERTY_LISTS: PropertyLists = PropertyLists {
    required: REQUIRED,
    optional: OPTIONAL,
    proprietary: &[],
};

const SHED_LEVEL_CHOICES: [(u8, AppTag); 3] =
    [(0, AppTag::Unsigned), (1, AppTag::Unsigned), (2, AppTag::Real)];

fn decode_shed_level(
    codec: &dyn PropertyCodec,
    data: &[u8],
) -> Result<ShedLevel, PropertyError> {
    for (tag, kind) in SHED_LEVEL_CHOICES {
        match codec.decode_context(tag, kind, data) {
            Ok(Some((value, used))) if used == data.len() => {
                return ShedLevel::from_choice(tag, &value);
            }
            Ok(Some(_)) => return Err(PropertyError::invalid_data_type()),
            Ok(None) => {}
            Err(err) => return Err(decode_error(err)),
        }
    }
    Err(PropertyError::invalid_data_type())
}

fn decode_start_time(
    codec: &dyn PropertyCodec,
    data: &[u8],
) -> Result<BacnetDateTime, PropertyError> {
    match decode_all(codec, data).map_err(decode_error)?.as_slice() {
        [ApplicationValue::Date(date), ApplicationValue::Time(time)] => {
            Ok(BacnetDateTime::new(*date, *time))
        }
        _ => Err(PropertyError::invalid_data_type()),
    }
}

fn unsigned(value: &ApplicationValue) -> Result<u32, PropertyError> {
    match value {
        ApplicationValue::Unsigned(v) => Ok(*v),
        _ => Err(PropertyError::invalid_data_type()),
    }
}

impl PropertyAccess for LoadControls {
    fn object_type(&self) -> ObjectType {
        ObjectType::LoadControl
    }

    fn property_lists(&self) -> PropertyLists {
        PROPERTY_LISTS
    }

    fn valid_instance(&self, instance: u32) -> bool {
        LoadControls::valid_instance(self, instance)
    }

    fn property_value(
        &self,
        instance: u32,
        property: PropertyId,
    ) -> Result<PropertyValue, PropertyError> {
        use ApplicationValue as A;
        use PropertyValue::Single;

        let lc = self.get(instance)?;
        let value = match property {
            PropertyId::ObjectIdentifier => {
                Single(A::ObjectId(ObjectId::new(ObjectType::LoadControl, instance)))
            }
            PropertyId::ObjectName => Single(A::CharacterString(lc.object_name().to_string())),
            PropertyId::ObjectType => {
                Single(A::Enumerated(u32::from(ObjectType::LoadControl.to_u16())))
            }
            PropertyId::Description => Single(A::CharacterString(lc.description().to_string())),
            PropertyId::PresentValue => Single(A::Enumerated(lc.state().to_u32())),
            PropertyId::StateDescription => Single(A::CharacterString(lc.state().to_string())),
            PropertyId::StatusFlags => Single(A::BitString(StatusFlags::default().bits())),
            PropertyId::EventState => Single(A::Enumerated(EVENT_STATE_NORMAL)),
            PropertyId::RequestedShedLevel => lc.requested_shed_level().to_property_value(),
            PropertyId::ExpectedShedLevel => lc.expected_shed_level().to_property_value(),
            PropertyId::ActualShedLevel => lc.actual_shed_level().to_property_value(),
            PropertyId::StartTime => {
                let start = lc.start_time();
                PropertyValue::Sequence(vec![A::Date(start.date), A::Time(start.time)])
            }
            PropertyId::ShedDuration => Single(A::Unsigned(lc.shed_duration())),
            PropertyId::DutyWindow => Single(A::Unsigned(lc.duty_window())),
            PropertyId::Enable => Single(A::Boolean(lc.enable())),
            PropertyId::FullDutyBaseline => Single(A::Real(lc.full_duty_baseline())),
            PropertyId::ShedLevels => PropertyValue::Array(
                self.policy()
                    .levels
                    .iter()
                    .map(|entry| A::Unsigned(entry.level))
                    .collect(),
            ),
            PropertyId::ShedLevelDescriptions => PropertyValue::Array(
                self.policy()
                    .levels
                    .iter()
                    .map(|entry| A::CharacterString(entry.description.clone()))
                    .collect(),
            ),
            PropertyId::PropertyList => PropertyValue::Array(
                PROPERTY_LISTS
                    .property_list()
                    .into_iter()
                    .map(|p| A::Enumerated(p.to_u32()))
                    .collect(),
            ),
            _ => return Err(PropertyError::unknown_property()),
        };
        Ok(value)
    }

    fn write_value(
        &mut self,
        codec: &dyn PropertyCodec,
        request: &WritePropertyRequest<'_>,
    ) -> WriteResult {
        let data = request.application_data;
        let lc = self.get_mut(request.object_instance)?;
        match request.property {
            PropertyId::RequestedShedLevel => {
                lc.requested_shed_level_set(decode_shed_level(codec, data)?);
            }
            PropertyId::StartTime => lc.start_time_set(decode_start_time(codec, data)?),
            PropertyId::ShedDuration => {
                let minutes = unsigned(&dispatch::decode_single(codec, data)?)?;
                lc.shed_duration_set(minutes);
            }
            PropertyId::DutyWindow => {
                let minutes = unsigned(&dispatch::decode_single(codec, data)?)?;
                lc.duty_window_set(minutes);
            }
            PropertyId::Enable => match dispatch::decode_single(codec, data)? {
                ApplicationValue::Boolean(enable) => lc.enable_set(enable),
                _ => return Err(PropertyError::invalid_data_type()),
            },
            PropertyId::FullDutyBaseline => match dispatch::decode_single(codec, data)? {
                ApplicationValue::Real(baseline) => lc.full_duty_baseline_set(baseline)?,
                _ => return Err(PropertyError::invalid_data_type()),
            },
            _ => return Err(PropertyError::write_access_denied()),
        }
        Ok(())
    }
}
