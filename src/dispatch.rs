//! Read-property / write-property request records and the per-object-type
//! dispatch trait.

use serde::Serialize;

use crate::codec::{ApplicationValue, PropertyCodec};
use crate::error::{ObjectError, PropertyError};
use crate::object::{ArrayIndex, ObjectType, PropertyId, PropertyLists};

pub type ReadResult = std::result::Result<usize, PropertyError>;
pub type WriteResult = std::result::Result<(), PropertyError>;

/// A read-property request. The encoded value is written to
/// `application_data`.
#[derive(Debug)]
pub struct ReadPropertyRequest<'a> {
    pub object_type: ObjectType,
    pub object_instance: u32,
    pub property: PropertyId,
    pub array_index: ArrayIndex,
    pub application_data: &'a mut [u8],
}

/// A write-property request carrying already tag-encoded data.
#[derive(Debug, Clone, Copy)]
pub struct WritePropertyRequest<'a> {
    pub object_type: ObjectType,
    pub object_instance: u32,
    pub property: PropertyId,
    pub array_index: ArrayIndex,
    /// `None` when the requester sent no priority.
    pub priority: Option<u8>,
    pub application_data: &'a [u8],
}

impl<'a> WritePropertyRequest<'a> {
    pub fn new(
        object_type: ObjectType,
        object_instance: u32,
        property: PropertyId,
        application_data: &'a [u8],
    ) -> Self {
        Self {
            object_type,
            object_instance,
            property,
            array_index: ArrayIndex::All,
            priority: None,
            application_data,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.array_index = ArrayIndex::Index(index);
        self
    }
}

/// Decoded form of a property before it is encoded for the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Single(ApplicationValue),
    /// A constructed value, such as a date followed by a time.
    Sequence(Vec<ApplicationValue>),
    /// An array property; elements are addressed 1-based.
    Array(Vec<ApplicationValue>),
    /// A choice encoded under a context tag.
    Choice { tag: u8, value: ApplicationValue },
}

impl PropertyValue {
    /// Narrows the value to what `index` addresses.
    ///
    /// # Errors
    ///
    /// `PropertyIsNotAnArray` for an index on a non-array value,
    /// `InvalidArrayIndex` for index 0 or past the end.
    pub fn select(self, index: ArrayIndex) -> Result<Self, PropertyError> {
        match (self, index) {
            (value, ArrayIndex::All) => Ok(value),
            (Self::Array(items), ArrayIndex::Index(n)) => {
                let at = (n as usize)
                    .checked_sub(1)
                    .ok_or(PropertyError::invalid_array_index())?;
                items
                    .into_iter()
                    .nth(at)
                    .map(Self::Single)
                    .ok_or(PropertyError::invalid_array_index())
            }
            (_, ArrayIndex::Index(_)) => Err(PropertyError::not_an_array()),
        }
    }

    /// Encodes the value into `buf`; returns bytes written.
    pub fn encode(&self, codec: &dyn PropertyCodec, buf: &mut [u8]) -> ReadResult {
        let len = match self {
            Self::Single(value) => codec.encode(value, buf)?,
            Self::Sequence(items) | Self::Array(items) => {
                crate::codec::encode_all(codec, items, buf)?
            }
            Self::Choice { tag, value } => codec.encode_context(*tag, value, buf)?,
        };
        Ok(len)
    }
}

/// Properties that accept an array index.
pub fn is_array_property(property: PropertyId) -> bool {
    matches!(
        property,
        PropertyId::PriorityArray
            | PropertyId::ShedLevels
            | PropertyId::ShedLevelDescriptions
            | PropertyId::PropertyList
    )
}

/// Decodes exactly one application-tagged value from a write request.
pub fn decode_single(
    codec: &dyn PropertyCodec,
    data: &[u8],
) -> Result<ApplicationValue, PropertyError> {
    match codec.decode(data) {
        Ok((value, used)) if used == data.len() => Ok(value),
        Ok(_) => Err(PropertyError::invalid_data_type()),
        Err(err) => Err(decode_error(err)),
    }
}

/// A malformed value is the requester's data-type problem, not an overflow.
pub fn decode_error(err: ObjectError) -> PropertyError {
    match err {
        ObjectError::EncodingFailed(message) => {
            tracing::warn!(%message, "rejected undecodable write");
            PropertyError::invalid_data_type()
        }
        other => other.into(),
    }
}

/// Read/write access for one object type.
pub trait PropertyAccess {
    fn object_type(&self) -> ObjectType;

    fn property_lists(&self) -> PropertyLists;

    fn valid_instance(&self, instance: u32) -> bool;

    /// Current value of a listed property of an existing instance.
    fn property_value(
        &self,
        instance: u32,
        property: PropertyId,
    ) -> Result<PropertyValue, PropertyError>;

    /// Applies a write to a listed property of an existing instance.
    fn write_value(
        &mut self,
        codec: &dyn PropertyCodec,
        request: &WritePropertyRequest<'_>,
    ) -> WriteResult;

    /// Looks up, narrows and encodes a property.
    ///
    /// # Errors
    ///
    /// `UnknownObject`, `UnknownProperty`, array index errors, or a buffer
    /// overflow from the codec.
    fn read_property(
        &self,
        codec: &dyn PropertyCodec,
        request: &mut ReadPropertyRequest<'_>,
    ) -> ReadResult {
        let value = self.read_value(request.object_instance, request.property, request.array_index)?;
        value.encode(codec, request.application_data)
    }

    /// Like [`read_property`](Self::read_property) but stops before encoding.
    fn read_value(
        &self,
        instance: u32,
        property: PropertyId,
        index: ArrayIndex,
    ) -> Result<PropertyValue, PropertyError> {
        if !self.valid_instance(instance) {
            return Err(PropertyError::unknown_object());
        }
        if !self.property_lists().contains(property) {
            return Err(PropertyError::unknown_property());
        }
        self.property_value(instance, property)?.select(index)
    }

    /// Validates the target and hands the request to
    /// [`write_value`](Self::write_value).
    fn write_property(
        &mut self,
        codec: &dyn PropertyCodec,
        request: &WritePropertyRequest<'_>,
    ) -> WriteResult {
        if !self.valid_instance(request.object_instance) {
            return Err(PropertyError::unknown_object());
        }
        if !self.property_lists().contains(request.property) {
            return Err(PropertyError::unknown_property());
        }
        if request.array_index != ArrayIndex::All && !is_array_property(request.property) {
            return Err(PropertyError::not_an_array());
        }
        let result = self.write_value(codec, request);
        if let Err(err) = &result {
            tracing::debug!(
                object_type = %request.object_type,
                instance = request.object_instance,
                property = %request.property.name(),
                ?err,
                "write rejected"
            );
        }
        result
    }
}
