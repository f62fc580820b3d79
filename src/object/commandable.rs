use std::fmt;

use tracing::debug;

use crate::codec::{ApplicationValue, PropertyCodec};
use crate::dispatch::{self, PropertyAccess, PropertyValue, WritePropertyRequest, WriteResult};
use crate::error::{ObjectError, PropertyError, Result};

use super::directory::ObjectDirectory;
use super::priority::{Priority, PriorityArray};
use super::{
    EVENT_STATE_NORMAL, ObjectId, ObjectType, PropertyId, PropertyLists, Reliability,
    StatusFlags,
};

/// Value type of a commandable output's present value.
///
/// Implemented by `f32` for Analog Outputs and
/// [`BinaryPv`](super::binary_output::BinaryPv) for Binary Outputs; the
/// store and its property dispatch are shared.
pub trait OutputValue: Copy + Default + PartialEq + fmt::Debug + Send + 'static {
    /// Type-specific properties (units, polarity, ...).
    type Attributes: Default + Clone + fmt::Debug + Send;

    const OBJECT_TYPE: ObjectType;
    const PROPERTY_LISTS: PropertyLists;

    fn to_application(self) -> ApplicationValue;

    /// # Errors
    ///
    /// `InvalidDataType` for the wrong tag, `ValueOutOfRange` for a value the
    /// type cannot hold.
    fn from_application(value: &ApplicationValue) -> std::result::Result<Self, PropertyError>;

    /// Range check against the object's own limits.
    fn in_range(self, _attributes: &Self::Attributes) -> bool {
        true
    }

    /// Whether a present-value change is large enough to report.
    fn cov_changed(old: Self, new: Self, _attributes: &Self::Attributes) -> bool {
        old != new
    }

    /// Reads a type-specific property; `None` when it is not one.
    fn attribute_value(attributes: &Self::Attributes, property: PropertyId)
    -> Option<PropertyValue>;

    /// Writes a type-specific property; `None` when it is not one.
    fn write_attribute(
        _attributes: &mut Self::Attributes,
        _property: PropertyId,
        _value: &ApplicationValue,
    ) -> Option<WriteResult> {
        None
    }
}

/// One commandable output object.
#[derive(Debug, Clone)]
pub struct CommandableOutput<V: OutputValue> {
    object_name: String,
    description: String,
    priority_array: PriorityArray<V>,
    relinquish_default: V,
    out_of_service: bool,
    reliability: Reliability,
    cov_pending: bool,
    attributes: V::Attributes,
}

impl<V: OutputValue> CommandableOutput<V> {
    fn new(instance: u32) -> Self {
        Self {
            object_name: format!("{}-{instance}", V::OBJECT_TYPE),
            description: String::new(),
            priority_array: PriorityArray::new(),
            relinquish_default: V::default(),
            out_of_service: false,
            reliability: Reliability::NoFaultDetected,
            cov_pending: false,
            attributes: V::Attributes::default(),
        }
    }

    pub fn present_value(&self) -> V {
        self.priority_array.resolve(self.relinquish_default)
    }

    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags::new(self.reliability, self.out_of_service)
    }

    pub fn priority_array(&self) -> &PriorityArray<V> {
        &self.priority_array
    }

    pub fn attributes(&self) -> &V::Attributes {
        &self.attributes
    }
}

/// Observer of resolved present-value changes: `(instance, old, new)`.
pub type WriteCallback<V> = Box<dyn FnMut(u32, V, V) + Send>;

/// All objects of one commandable output type plus their write observer.
pub struct CommandableStore<V: OutputValue> {
    directory: ObjectDirectory<CommandableOutput<V>>,
    write_callback: Option<WriteCallback<V>>,
}

impl<V: OutputValue> fmt::Debug for CommandableStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandableStore")
            .field("directory", &self.directory)
            .field("write_callback", &self.write_callback.is_some())
            .finish()
    }
}

impl<V: OutputValue> CommandableStore<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            directory: ObjectDirectory::new(V::OBJECT_TYPE, capacity),
            write_callback: None,
        }
    }

    /// Builds a store holding instances `0..count`.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when `count > capacity`.
    pub fn with_instances(capacity: usize, count: u32) -> Result<Self> {
        let mut store = Self::new(capacity);
        for instance in 0..count {
            store.create(Some(instance))?;
        }
        Ok(store)
    }

    pub fn directory(&self) -> &ObjectDirectory<CommandableOutput<V>> {
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

    pub fn get(&self, instance: u32) -> Result<&CommandableOutput<V>> {
        self.directory.lookup(instance)
    }

    /// Creates an object. `None` picks the lowest free instance; an existing
    /// instance is returned unchanged.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the table is full, `InvalidArgument` for an
    /// instance above the protocol maximum.
    pub fn create(&mut self, instance: Option<u32>) -> Result<u32> {
        let instance = match instance {
            Some(instance) => instance,
            None => self
                .directory
                .next_free_instance()
                .ok_or(ObjectError::CapacityExceeded {
                    object_type: V::OBJECT_TYPE,
                    capacity: self.directory.capacity(),
                })?,
        };
        if self
            .directory
            .object_instance_add(instance, CommandableOutput::new(instance))?
        {
            debug!(object_type = %V::OBJECT_TYPE, instance, "object created");
        }
        Ok(instance)
    }

    /// Returns `true` when the instance existed.
    pub fn delete(&mut self, instance: u32) -> bool {
        self.directory.remove(instance).is_some()
    }

    /// Drops every object and the write observer.
    pub fn cleanup(&mut self) {
        self.directory.clear();
        self.write_callback = None;
    }

    /// Registers the write observer, replacing any previous one.
    pub fn write_present_value_callback_set<F>(&mut self, callback: F)
    where
        F: FnMut(u32, V, V) + Send + 'static,
    {
        self.write_callback = Some(Box::new(callback));
    }

    /// Applies `change` to one object, then raises COV and notifies the
    /// observer according to what actually changed.
    fn modify<F>(&mut self, instance: u32, change: F) -> Result<()>
    where
        F: FnOnce(&mut CommandableOutput<V>),
    {
        let object = self.directory.lookup_mut(instance)?;
        let old = object.present_value();
        let old_flags = object.status_flags();
        change(object);
        let new = object.present_value();
        if V::cov_changed(old, new, &object.attributes) || old_flags != object.status_flags() {
            object.cov_pending = true;
        }
        let decoupled = object.out_of_service;

        if old != new && !decoupled {
            if let Some(callback) = self.write_callback.as_mut() {
                callback(instance, old, new);
            }
        }
        Ok(())
    }

    pub fn present_value(&self, instance: u32) -> Result<V> {
        Ok(self.directory.lookup(instance)?.present_value())
    }

    /// Lowest-numbered occupied slot; `None` means the value is the
    /// relinquish default.
    pub fn present_value_priority(&self, instance: u32) -> Result<Option<Priority>> {
        Ok(self
            .directory
            .lookup(instance)?
            .priority_array
            .active()
            .map(|(priority, _)| priority))
    }

    /// Commands `value` at `priority`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a priority outside `1..=16` (nothing changes),
    /// `NotFound` for an unknown instance.
    pub fn present_value_set(&mut self, instance: u32, value: V, priority: u8) -> Result<()> {
        let priority = Priority::new(priority)?;
        self.modify(instance, |object| object.priority_array.set(priority, value))
    }

    /// Clears the slot at `priority`.
    ///
    /// # Errors
    ///
    /// Same as [`present_value_set`](Self::present_value_set).
    pub fn present_value_relinquish(&mut self, instance: u32, priority: u8) -> Result<()> {
        let priority = Priority::new(priority)?;
        self.modify(instance, |object| object.priority_array.relinquish(priority))
    }

    pub fn priority_array(&self, instance: u32) -> Result<&PriorityArray<V>> {
        Ok(&self.directory.lookup(instance)?.priority_array)
    }

    pub fn relinquish_default(&self, instance: u32) -> Result<V> {
        Ok(self.directory.lookup(instance)?.relinquish_default)
    }

    pub fn relinquish_default_set(&mut self, instance: u32, value: V) -> Result<()> {
        self.modify(instance, |object| object.relinquish_default = value)
    }

    pub fn out_of_service(&self, instance: u32) -> Result<bool> {
        Ok(self.directory.lookup(instance)?.out_of_service)
    }

    pub fn out_of_service_set(&mut self, instance: u32, value: bool) -> Result<()> {
        self.modify(instance, |object| object.out_of_service = value)
    }

    pub fn reliability(&self, instance: u32) -> Result<Reliability> {
        Ok(self.directory.lookup(instance)?.reliability)
    }

    pub fn reliability_set(&mut self, instance: u32, value: Reliability) -> Result<()> {
        self.modify(instance, |object| object.reliability = value)
    }

    pub fn change_of_value(&self, instance: u32) -> Result<bool> {
        Ok(self.directory.lookup(instance)?.cov_pending)
    }

    pub fn change_of_value_clear(&mut self, instance: u32) -> Result<()> {
        self.directory.lookup_mut(instance)?.cov_pending = false;
        Ok(())
    }

    pub fn object_name(&self, instance: u32) -> Result<&str> {
        Ok(&self.directory.lookup(instance)?.object_name)
    }

    /// # Errors
    ///
    /// `InvalidArgument` for an empty name.
    pub fn object_name_set(&mut self, instance: u32, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ObjectError::InvalidArgument("object name is empty".into()));
        }
        self.directory.lookup_mut(instance)?.object_name = name.to_string();
        Ok(())
    }

    pub fn description(&self, instance: u32) -> Result<&str> {
        Ok(&self.directory.lookup(instance)?.description)
    }

    pub fn description_set(&mut self, instance: u32, text: &str) -> Result<()> {
        self.directory.lookup_mut(instance)?.description = text.to_string();
        Ok(())
    }

    pub fn attributes(&self, instance: u32) -> Result<&V::Attributes> {
        Ok(&self.directory.lookup(instance)?.attributes)
    }

    pub fn attributes_mut(&mut self, instance: u32) -> Result<&mut V::Attributes> {
        Ok(&mut self.directory.lookup_mut(instance)?.attributes)
    }

    /// Present value and status flags, the payload of a COV notification.
    pub fn encode_value_list(&self, instance: u32) -> Result<Vec<(PropertyId, ApplicationValue)>> {
        let object = self.directory.lookup(instance)?;
        Ok(vec![
            (PropertyId::PresentValue, object.present_value().to_application()),
            (
                PropertyId::StatusFlags,
                ApplicationValue::BitString(object.status_flags().bits()),
            ),
        ])
    }

    fn write_present_value(
        &mut self,
        instance: u32,
        priority: Option<u8>,
        value: &ApplicationValue,
    ) -> WriteResult {
        let level = priority.unwrap_or(Priority::LOWEST.get());
        if level == Priority::MINIMUM_ON_OFF.get() {
            return Err(PropertyError::write_access_denied());
        }
        let priority = Priority::new(level).map_err(|_| PropertyError::value_out_of_range())?;
        match value {
            ApplicationValue::Null => self.modify(instance, |object| {
                object.priority_array.relinquish(priority);
            })?,
            other => {
                let value = V::from_application(other)?;
                if !value.in_range(self.attributes(instance)?) {
                    return Err(PropertyError::value_out_of_range());
                }
                self.modify(instance, |object| object.priority_array.set(priority, value))?;
            }
        }
        Ok(())
    }
}

impl<V: OutputValue> PropertyAccess for CommandableStore<V> {
    fn object_type(&self) -> ObjectType {
        V::OBJECT_TYPE
    }

    fn property_lists(&self) -> PropertyLists {
        V::PROPERTY_LISTS
    }

    fn valid_instance(&self, instance: u32) -> bool {
        self.directory.valid_instance(instance)
    }

    fn property_value(
        &self,
        instance: u32,
        property: PropertyId,
    ) -> std::result::Result<PropertyValue, PropertyError> {
        use ApplicationValue as A;
        use PropertyValue::Single;

        let object = self.directory.lookup(instance)?;
        let value = match property {
            PropertyId::ObjectIdentifier => {
                Single(A::ObjectId(ObjectId::new(V::OBJECT_TYPE, instance)))
            }
            PropertyId::ObjectName => Single(A::CharacterString(object.object_name.clone())),
            PropertyId::ObjectType => Single(A::Enumerated(u32::from(V::OBJECT_TYPE.to_u16()))),
            PropertyId::Description => Single(A::CharacterString(object.description.clone())),
            PropertyId::PresentValue => Single(object.present_value().to_application()),
            PropertyId::StatusFlags => Single(A::BitString(object.status_flags().bits())),
            PropertyId::EventState => Single(A::Enumerated(EVENT_STATE_NORMAL)),
            PropertyId::Reliability => Single(A::Enumerated(object.reliability.to_u32())),
            PropertyId::OutOfService => Single(A::Boolean(object.out_of_service)),
            PropertyId::RelinquishDefault => Single(object.relinquish_default.to_application()),
            PropertyId::PriorityArray => PropertyValue::Array(
                object
                    .priority_array
                    .slots()
                    .iter()
                    .map(|slot| slot.map_or(A::Null, V::to_application))
                    .collect(),
            ),
            PropertyId::CurrentCommandPriority => Single(
                object
                    .priority_array
                    .active()
                    .map_or(A::Null, |(priority, _)| A::Unsigned(u32::from(priority.get()))),
            ),
            PropertyId::PropertyList => PropertyValue::Array(
                V::PROPERTY_LISTS
                    .property_list()
                    .into_iter()
                    .map(|p| A::Enumerated(p.to_u32()))
                    .collect(),
            ),
            other => V::attribute_value(&object.attributes, other)
                .ok_or(PropertyError::unknown_property())?,
        };
        Ok(value)
    }

    fn write_value(
        &mut self,
        codec: &dyn PropertyCodec,
        request: &WritePropertyRequest<'_>,
    ) -> WriteResult {
        let instance = request.object_instance;
        let value = dispatch::decode_single(codec, request.application_data)?;
        match (request.property, &value) {
            (PropertyId::PresentValue, value) => {
                self.write_present_value(instance, request.priority, value)
            }
            (PropertyId::OutOfService, ApplicationValue::Boolean(flag)) => {
                Ok(self.out_of_service_set(instance, *flag)?)
            }
            (PropertyId::RelinquishDefault, ApplicationValue::Null) => {
                Err(PropertyError::invalid_data_type())
            }
            (PropertyId::RelinquishDefault, value) => {
                let value = V::from_application(value)?;
                if !value.in_range(self.attributes(instance)?) {
                    return Err(PropertyError::value_out_of_range());
                }
                Ok(self.relinquish_default_set(instance, value)?)
            }
            (PropertyId::OutOfService, _) => Err(PropertyError::invalid_data_type()),
            (property, value) => {
                let attributes = self.attributes_mut(instance)?;
                V::write_attribute(attributes, property, value)
                    .unwrap_or(Err(PropertyError::write_access_denied()))
            }
        }
    }
}
