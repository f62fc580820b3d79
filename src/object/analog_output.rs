use crate::codec::ApplicationValue;
use crate::dispatch::{PropertyValue, WriteResult};
use crate::error::PropertyError;

use super::commandable::{CommandableStore, OutputValue};
use super::{ObjectType, PropertyId, PropertyLists};

/// Engineering units code for percent.
pub const UNITS_PERCENT: u32 = 98;

/// Analog Output objects, commanded with REAL values.
pub type AnalogOutputs = CommandableStore<f32>;

/// Properties only Analog Outputs carry.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogAttributes {
    pub units: u32,
    pub min_pres_value: f32,
    pub max_pres_value: f32,
    /// Smallest present-value change that raises a COV.
    pub cov_increment: f32,
}

impl Default for AnalogAttributes {
    fn default() -> Self {
        Self {
            units: UNITS_PERCENT,
            min_pres_value: 0.0,
            max_pres_value: 100.0,
            cov_increment: 1.0,
        }
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
    PropertyId::Units,
    PropertyId::PriorityArray,
    PropertyId::RelinquishDefault,
    PropertyId::CurrentCommandPriority,
    PropertyId::PropertyList,
];

const OPTIONAL: &[PropertyId] = &[
    PropertyId::Description,
    PropertyId::Reliability,
    PropertyId::MinPresValue,
    PropertyId::MaxPresValue,
    PropertyId::CovIncrement,
];

impl OutputValue for f32 {
    type Attributes = AnalogAttributes;

    const OBJECT_TYPE: ObjectType = ObjectType::AnalogOutput;
    const PROPERTY_LISTS: PropertyLists = PropertyLists {
        required: REQUIRED,
        optional: OPTIONAL,
        proprietary: &[],
    };

    fn to_application(self) -> ApplicationValue {
        ApplicationValue::Real(self)
    }

    fn from_application(value: &ApplicationValue) -> Result<Self, PropertyError> {
        match value {
            ApplicationValue::Real(v) if v.is_finite() => Ok(*v),
            ApplicationValue::Real(_) => Err(PropertyError::value_out_of_range()),
            _ => Err(PropertyError::invalid_data_type()),
        }
    }

    fn in_range(self, attributes: &AnalogAttributes) -> bool {
        (attributes.min_pres_value..=attributes.max_pres_value).contains(&self)
    }

    fn cov_changed(old: Self, new: Self, attributes: &AnalogAttributes) -> bool {
        old != new && (new - old).abs() >= attributes.cov_increment
    }

    fn attribute_value(attributes: &AnalogAttributes, property: PropertyId) -> Option<PropertyValue> {
        let value = match property {
            PropertyId::Units => ApplicationValue::Enumerated(attributes.units),
            PropertyId::MinPresValue => ApplicationValue::Real(attributes.min_pres_value),
            PropertyId::MaxPresValue => ApplicationValue::Real(attributes.max_pres_value),
            PropertyId::CovIncrement => ApplicationValue::Real(attributes.cov_increment),
            _ => return None,
        };
        Some(PropertyValue::Single(value))
    }

    fn write_attribute(
        attributes: &mut AnalogAttributes,
        property: PropertyId,
        value: &ApplicationValue,
    ) -> Option<WriteResult> {
        if property != PropertyId::CovIncrement {
            return None;
        }
        Some(match value {
            ApplicationValue::Real(v) if v.is_finite() && *v >= 0.0 => {
                attributes.cov_increment = *v;
                Ok(())
            }
            ApplicationValue::Real(_) => Err(PropertyError::value_out_of_range()),
            _ => Err(PropertyError::invalid_data_type()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::object::priority::Priority;

    fn outputs() -> AnalogOutputs {
        AnalogOutputs::with_instances(4, 2).expect("within capacity")
    }

    #[test]
    fn relinquishing_last_slot_restores_default() {
        let mut ao = outputs();
        ao.relinquish_default_set(0, 25.0).expect("exists");
        ao.present_value_set(0, 80.0, 8).expect("valid");
        assert_eq!(ao.present_value(0), Ok(80.0));
        ao.present_value_relinquish(0, 8).expect("valid");
        assert_eq!(ao.present_value(0), Ok(25.0));
        assert_eq!(ao.present_value_priority(0), Ok(None));
    }

    #[test]
    fn reports_active_priority() {
        let mut ao = outputs();
        ao.present_value_set(1, 10.0, 12).expect("valid");
        assert_eq!(ao.present_value_priority(1), Ok(Some(Priority::new(12).expect("valid"))));
        ao.present_value_set(1, 20.0, 3).expect("valid");
        assert_eq!(ao.present_value_priority(1).ok().flatten().map(Priority::get), Some(3));
    }

    #[test]
    fn bad_priority_changes_nothing() {
        let mut ao = outputs();
        ao.present_value_set(0, 50.0, 16).expect("valid");
        ao.change_of_value_clear(0).expect("exists");
        assert!(ao.present_value_set(0, 60.0, 0).is_err());
        assert!(ao.present_value_set(0, 60.0, 17).is_err());
        assert_eq!(ao.present_value(0), Ok(50.0));
        assert_eq!(ao.change_of_value(0), Ok(false));
    }

    #[test]
    fn callback_sees_resolved_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut ao = outputs();
        ao.write_present_value_callback_set(move |instance, old, new| {
            sink.lock().expect("not poisoned").push((instance, old, new));
        });
        ao.present_value_set(0, 40.0, 5).expect("valid");
        // hidden behind priority 5
        ao.present_value_set(0, 70.0, 9).expect("valid");
        ao.present_value_relinquish(0, 5).expect("valid");
        assert_eq!(
            *seen.lock().expect("not poisoned"),
            vec![(0, 0.0, 40.0), (0, 40.0, 70.0)]
        );
    }

    #[test]
    fn out_of_service_decouples_callback_but_keeps_cov() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let mut ao = outputs();
        ao.write_present_value_callback_set(move |_, _, _| {
            *counter.lock().expect("not poisoned") += 1;
        });
        ao.out_of_service_set(0, true).expect("exists");
        ao.change_of_value_clear(0).expect("exists");
        ao.present_value_set(0, 55.0, 16).expect("valid");
        assert_eq!(*calls.lock().expect("not poisoned"), 0);
        assert_eq!(ao.change_of_value(0), Ok(true));
        assert_eq!(ao.present_value(0), Ok(55.0));
    }

    #[test]
    fn cov_increment_filters_small_changes() {
        let mut ao = outputs();
        ao.attributes_mut(0).expect("exists").cov_increment = 5.0;
        ao.present_value_set(0, 3.0, 16).expect("valid");
        assert_eq!(ao.change_of_value(0), Ok(false));
        ao.present_value_set(0, 9.0, 16).expect("valid");
        assert_eq!(ao.change_of_value(0), Ok(true));
    }

    #[test]
    fn zero_increment_ignores_hidden_writes() {
        let mut ao = outputs();
        ao.attributes_mut(0).expect("exists").cov_increment = 0.0;
        ao.present_value_set(0, 50.0, 8).expect("valid");
        assert_eq!(ao.change_of_value(0), Ok(true));
        ao.change_of_value_clear(0).expect("exists");

        // priority 8 still wins, so the resolved value does not move
        ao.present_value_set(0, 10.0, 16).expect("valid");
        assert_eq!(ao.present_value(0), Ok(50.0));
        assert_eq!(ao.change_of_value(0), Ok(false));
    }

    #[test]
    fn unknown_instance_is_not_found() {
        let mut ao = outputs();
        assert!(ao.present_value(9).is_err());
        assert!(ao.present_value_set(9, 1.0, 16).is_err());
    }

    #[test]
    fn value_list_carries_present_value_and_flags() {
        let mut ao = outputs();
        ao.present_value_set(1, 12.5, 16).expect("valid");
        let list = ao.encode_value_list(1).expect("exists");
        assert_eq!(list[0], (PropertyId::PresentValue, ApplicationValue::Real(12.5)));
        assert_eq!(
            list[1],
            (
                PropertyId::StatusFlags,
                ApplicationValue::BitString(vec![false; 4])
            )
        );
    }

    #[test]
    fn create_picks_lowest_free_instance() {
        let mut ao = outputs();
        assert!(ao.delete(0));
        assert_eq!(ao.create(None), Ok(0));
        assert_eq!(ao.create(None), Ok(2));
        assert_eq!(ao.count(), 3);
        ao.cleanup();
        assert_eq!(ao.count(), 0);
    }
}
