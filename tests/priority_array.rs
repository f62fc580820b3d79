//! Command prioritization of the commandable outputs through write-property.

mod common;

use std::sync::{Arc, Mutex};

use bacnet_shed::codec::ApplicationValue;
use bacnet_shed::error::PropertyError;
use bacnet_shed::object::binary_output::BinaryPv;
use bacnet_shed::object::priority::Priority;
use bacnet_shed::object::{ArrayIndex, ObjectType, PropertyId};

#[test]
fn more_important_slot_wins() {
    let mut dev = common::device();
    common::command_ao(&mut dev, 0, 70.0, Some(10)).expect("accepted");
    common::command_ao(&mut dev, 0, 20.0, Some(3)).expect("accepted");
    assert_eq!(dev.analog_outputs.present_value(0), Ok(20.0));

    common::command_ao(&mut dev, 0, 50.0, Some(12)).expect("accepted");
    assert_eq!(dev.analog_outputs.present_value(0), Ok(20.0));
    assert_eq!(
        dev.analog_outputs.present_value_priority(0),
        Ok(Some(Priority::new(3).expect("valid")))
    );
}

#[test]
fn relinquishing_only_slot_restores_default() {
    let mut dev = common::device();
    dev.analog_outputs
        .relinquish_default_set(1, 12.5)
        .expect("exists");
    common::command_ao(&mut dev, 1, 80.0, Some(9)).expect("accepted");
    common::write(
        &mut dev,
        ObjectType::AnalogOutput,
        1,
        PropertyId::PresentValue,
        &[ApplicationValue::Null],
        Some(9),
    )
    .expect("relinquish accepted");
    assert_eq!(dev.analog_outputs.present_value(1), Ok(12.5));
    assert_eq!(dev.analog_outputs.present_value_priority(1), Ok(None));
}

#[test]
fn missing_priority_means_lowest() {
    let mut dev = common::device();
    common::command_ao(&mut dev, 2, 33.0, None).expect("accepted");
    assert_eq!(
        dev.analog_outputs.present_value_priority(2),
        Ok(Some(Priority::LOWEST))
    );
}

#[test]
fn minimum_on_off_slot_is_not_writable() {
    let mut dev = common::device();
    assert_eq!(
        common::command_ao(&mut dev, 0, 10.0, Some(6)),
        Err(PropertyError::write_access_denied())
    );
    assert_eq!(dev.analog_outputs.present_value_priority(0), Ok(None));
}

#[test]
fn out_of_range_priority_is_rejected() {
    let mut dev = common::device();
    for priority in [0, 17] {
        assert_eq!(
            common::command_ao(&mut dev, 0, 10.0, Some(priority)),
            Err(PropertyError::value_out_of_range())
        );
    }
    assert!(dev.analog_outputs.priority_array(0).expect("exists").is_empty());
}

#[test]
fn value_outside_limits_is_rejected() {
    let mut dev = common::device();
    assert_eq!(
        common::command_ao(&mut dev, 0, 150.0, Some(8)),
        Err(PropertyError::value_out_of_range())
    );
    assert_eq!(
        common::write(
            &mut dev,
            ObjectType::AnalogOutput,
            0,
            PropertyId::PresentValue,
            &[ApplicationValue::Unsigned(10)],
            Some(8),
        ),
        Err(PropertyError::invalid_data_type())
    );
}

#[test]
fn priority_array_reads_null_for_empty_slots() {
    let mut dev = common::device();
    common::command_ao(&mut dev, 0, 42.0, Some(5)).expect("accepted");
    let slots = common::read(
        &dev,
        ObjectType::AnalogOutput,
        0,
        PropertyId::PriorityArray,
        ArrayIndex::All,
    )
    .expect("readable");
    assert_eq!(slots.len(), 16);
    assert_eq!(slots[4], ApplicationValue::Real(42.0));
    assert!(
        slots
            .iter()
            .enumerate()
            .all(|(i, v)| i == 4 || *v == ApplicationValue::Null)
    );

    let fifth = common::read(
        &dev,
        ObjectType::AnalogOutput,
        0,
        PropertyId::PriorityArray,
        ArrayIndex::Index(5),
    );
    assert_eq!(fifth, Ok(vec![ApplicationValue::Real(42.0)]));
    assert_eq!(
        common::read(
            &dev,
            ObjectType::AnalogOutput,
            0,
            PropertyId::PriorityArray,
            ArrayIndex::Index(17),
        ),
        Err(PropertyError::invalid_array_index())
    );
}

#[test]
fn binary_output_follows_the_same_rules() {
    let mut dev = common::device();
    let active = [ApplicationValue::Enumerated(1)];
    let inactive = [ApplicationValue::Enumerated(0)];
    common::write(
        &mut dev,
        ObjectType::BinaryOutput,
        3,
        PropertyId::PresentValue,
        &active,
        Some(14),
    )
    .expect("accepted");
    common::write(
        &mut dev,
        ObjectType::BinaryOutput,
        3,
        PropertyId::PresentValue,
        &inactive,
        Some(2),
    )
    .expect("accepted");
    assert_eq!(dev.binary_outputs.present_value(3), Ok(BinaryPv::Inactive));

    common::write(
        &mut dev,
        ObjectType::BinaryOutput,
        3,
        PropertyId::PresentValue,
        &[ApplicationValue::Null],
        Some(2),
    )
    .expect("relinquish accepted");
    assert_eq!(dev.binary_outputs.present_value(3), Ok(BinaryPv::Active));
    assert_eq!(
        common::write(
            &mut dev,
            ObjectType::BinaryOutput,
            3,
            PropertyId::PresentValue,
            &[ApplicationValue::Enumerated(2)],
            Some(2),
        ),
        Err(PropertyError::value_out_of_range())
    );
}

#[test]
fn observer_sees_effective_changes_only() {
    let mut dev = common::device();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    dev.analog_outputs
        .write_present_value_callback_set(move |instance, old, new| {
            sink.lock().expect("not poisoned").push((instance, old, new));
        });

    common::command_ao(&mut dev, 0, 40.0, Some(8)).expect("accepted");
    // masked by priority 8, no effective change
    common::command_ao(&mut dev, 0, 60.0, Some(12)).expect("accepted");
    common::command_ao(&mut dev, 0, 25.0, Some(1)).expect("accepted");

    let seen = seen.lock().expect("not poisoned").clone();
    assert_eq!(seen, vec![(0, 0.0, 40.0), (0, 40.0, 25.0)]);
}
