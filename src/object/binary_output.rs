use serde::{Deserialize, Serialize};

use crate::codec::ApplicationValue;
use crate::dispatch::{PropertyValue, WriteResult};
use crate::error::PropertyError;

use super::commandable::{CommandableStore, OutputValue};
use super::{ObjectType, PropertyId, PropertyLists};

/// Binary Output objects, commanded with two-state values.
pub type BinaryOutputs = CommandableStore<BinaryPv>;

/// Two-state present value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryPv {
    #[default]
    Inactive,
    Active,
}

impl BinaryPv {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            _ => None,
        }
    }

    pub const fn inverted(self) -> Self {
        match self {
            Self::Inactive => Self::Active,
            Self::Active => Self::Inactive,
        }
    }
}

/// Mapping from the logical present value to the physical output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Normal,
    Reverse,
}

impl Polarity {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Reverse => 1,
        }
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Reverse),
            _ => None,
        }
    }
}

/// Properties only Binary Outputs carry.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryAttributes {
    pub polarity: Polarity,
    pub active_text: String,
    pub inactive_text: String,
}

impl Default for BinaryAttributes {
    fn default() -> Self {
        Self {
            polarity: Polarity::Normal,
            active_text: "Active".to_string(),
            inactive_text: "Inactive".to_string(),
        }
    }
}

impl BinaryAttributes {
    /// State actually driven onto the output after polarity.
    pub fn physical_value(&self, present_value: BinaryPv) -> BinaryPv {
        match self.polarity {
            Polarity::Normal => present_value,
            Polarity::Reverse => present_value.inverted(),
        }
    }
}

impl BinaryOutputs {
    /// Present value as driven onto the output, after polarity. The write
    /// observer and Present_Value reads stay logical.
    pub fn physical_value(&self, instance: u32) -> crate::error::Result<BinaryPv> {
        let object = self.get(instance)?;
        Ok(object.attributes().physical_value(object.present_value()))
    }
}

const REQUIRED: &[PropertyId] = &[
    PropertyId::ObjectIdentifier,
    PropertyId::ObjectName,
    PropertyId::ObjectType,
    PropertyId::PresentValue,
    PropertyId::StatusFlags,
    PropertyId::EventState,
    PropertyId::OutOfService,
    PropertyId::Polarity,
    PropertyId::PriorityArray,
    PropertyId::RelinquishDefault,
    PropertyId::CurrentCommandPriority,
    PropertyId::PropertyList,
];

const OPTIONAL: &[PropertyId] = &[
    PropertyId::Description,
    PropertyId::Reliability,
    PropertyId::ActiveText,
    PropertyId::InactiveText,
];

fn text(value: &ApplicationValue) -> Result<String, PropertyError> {
    match value {
        ApplicationValue::CharacterString(s) => Ok(s.clone()),
        _ => Err(PropertyError::invalid_data_type()),
    }
}

impl OutputValue for BinaryPv {
    type Attributes = BinaryAttributes;

    const OBJECT_TYPE: ObjectType = ObjectType::BinaryOutput;
    const PROPERTY_LISTS: PropertyLists = PropertyLists {
        required: REQUIRED,
        optional: OPTIONAL,
        proprietary: &[],
    };

    fn to_application(self) -> ApplicationValue {
        ApplicationValue::Enumerated(self.to_u32())
    }

    fn from_application(value: &ApplicationValue) -> Result<Self, PropertyError> {
        match value {
            ApplicationValue::Enumerated(v) => {
                Self::from_u32(*v).ok_or(PropertyError::value_out_of_range())
            }
            _ => Err(PropertyError::invalid_data_type()),
        }
    }

    fn attribute_value(attributes: &BinaryAttributes, property: PropertyId) -> Option<PropertyValue> {
        let value = match property {
            PropertyId::Polarity => ApplicationValue::Enumerated(attributes.polarity.to_u32()),
            PropertyId::ActiveText => ApplicationValue::CharacterString(attributes.active_text.clone()),
            PropertyId::InactiveText => {
                ApplicationValue::CharacterString(attributes.inactive_text.clone())
            }
            _ => return None,
        };
        Some(PropertyValue::Single(value))
    }

    fn write_attribute(
        attributes: &mut BinaryAttributes,
        property: PropertyId,
        value: &ApplicationValue,
    ) -> Option<WriteResult> {
        let result = match property {
            PropertyId::Polarity => match value {
                ApplicationValue::Enumerated(v) => Polarity::from_u32(*v)
                    .map(|polarity| attributes.polarity = polarity)
                    .ok_or(PropertyError::value_out_of_range()),
                _ => Err(PropertyError::invalid_data_type()),
            },
            PropertyId::ActiveText => text(value).map(|s| attributes.active_text = s),
            PropertyId::InactiveText => text(value).map(|s| attributes.inactive_text = s),
            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{PropertyCodec, TagCodec};
    use crate::dispatch::{PropertyAccess, ReadPropertyRequest, WritePropertyRequest};
    use crate::object::ArrayIndex;

    fn outputs() -> BinaryOutputs {
        BinaryOutputs::with_instances(4, 1).expect("within capacity")
    }

    fn encoded(value: ApplicationValue) -> Vec<u8> {
        let mut buf = [0u8; 32];
        let len = TagCodec.encode(&value, &mut buf).expect("fits");
        buf[..len].to_vec()
    }

    fn write(store: &mut BinaryOutputs, property: PropertyId, value: ApplicationValue, priority: Option<u8>) -> WriteResult {
        let data = encoded(value);
        let mut request = WritePropertyRequest::new(ObjectType::BinaryOutput, 0, property, &data);
        request.priority = priority;
        store.write_property(&TagCodec, &request)
    }

    #[test]
    fn reverse_polarity_inverts_physical_output() {
        let mut bo = outputs();
        bo.present_value_set(0, BinaryPv::Active, 8).expect("valid");
        assert_eq!(bo.physical_value(0), Ok(BinaryPv::Active));

        write(&mut bo, PropertyId::Polarity, ApplicationValue::Enumerated(1), None)
            .expect("accepted");
        assert_eq!(bo.physical_value(0), Ok(BinaryPv::Inactive));
        // logical value is unaffected
        assert_eq!(bo.present_value(0), Ok(BinaryPv::Active));
        assert!(bo.physical_value(7).is_err());
    }

    #[test]
    fn write_without_priority_lands_in_slot_sixteen() {
        let mut bo = outputs();
        write(&mut bo, PropertyId::PresentValue, ApplicationValue::Enumerated(1), None)
            .expect("accepted");
        assert_eq!(bo.present_value_priority(0).ok().flatten().map(|p| p.get()), Some(16));
    }

    #[test]
    fn null_write_relinquishes() {
        let mut bo = outputs();
        write(&mut bo, PropertyId::PresentValue, ApplicationValue::Enumerated(1), Some(9))
            .expect("accepted");
        write(&mut bo, PropertyId::PresentValue, ApplicationValue::Null, Some(9)).expect("accepted");
        assert_eq!(bo.present_value(0), Ok(BinaryPv::Inactive));
        assert_eq!(bo.present_value_priority(0), Ok(None));
    }

    #[test]
    fn rejects_bad_values_and_reserved_priority() {
        let mut bo = outputs();
        assert_eq!(
            write(&mut bo, PropertyId::PresentValue, ApplicationValue::Enumerated(2), None),
            Err(PropertyError::value_out_of_range())
        );
        assert_eq!(
            write(&mut bo, PropertyId::PresentValue, ApplicationValue::Real(1.0), None),
            Err(PropertyError::invalid_data_type())
        );
        assert_eq!(
            write(&mut bo, PropertyId::PresentValue, ApplicationValue::Enumerated(1), Some(6)),
            Err(PropertyError::write_access_denied())
        );
        assert_eq!(
            write(&mut bo, PropertyId::PresentValue, ApplicationValue::Enumerated(1), Some(17)),
            Err(PropertyError::value_out_of_range())
        );
    }

    #[test]
    fn text_properties_are_writable() {
        let mut bo = outputs();
        write(
            &mut bo,
            PropertyId::ActiveText,
            ApplicationValue::CharacterString("On".into()),
            None,
        )
        .expect("accepted");
        assert_eq!(bo.attributes(0).map(|a| a.active_text.as_str()), Ok("On"));
    }

    #[test]
    fn read_priority_array_element() {
        let mut bo = outputs();
        bo.present_value_set(0, BinaryPv::Active, 3).expect("valid");
        let mut buf = [0u8; 8];
        let mut request = ReadPropertyRequest {
            object_type: ObjectType::BinaryOutput,
            object_instance: 0,
            property: PropertyId::PriorityArray,
            array_index: ArrayIndex::Index(3),
            application_data: &mut buf,
        };
        let len = bo.read_property(&TagCodec, &mut request).expect("readable");
        assert_eq!(&buf[..len], &[0x91, 0x01]);
    }
}
