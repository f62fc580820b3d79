//! Error types shared by the object stores and the property dispatch layer.

use thiserror::Error;

use crate::object::ObjectType;

/// Failure of a store, directory, or codec operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    #[error("{object_type} {instance} not found")]
    NotFound { object_type: ObjectType, instance: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{object_type} table is full ({capacity} objects)")]
    CapacityExceeded {
        object_type: ObjectType,
        capacity: usize,
    },

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, ObjectError>;

/// BACnet error class reported back to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Object,
    Property,
    Resources,
    Services,
}

/// BACnet error code reported back to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownObject,
    UnknownProperty,
    WriteAccessDenied,
    InvalidDataType,
    ValueOutOfRange,
    InvalidArrayIndex,
    PropertyIsNotAnArray,
    NoSpaceForObject,
    AbortBufferOverflow,
}

/// Error produced by a read-property or write-property request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{class:?}: {code:?}")]
pub struct PropertyError {
    pub class: ErrorClass,
    pub code: ErrorCode,
}

impl PropertyError {
    pub const fn new(class: ErrorClass, code: ErrorCode) -> Self {
        Self { class, code }
    }

    pub const fn unknown_object() -> Self {
        Self::new(ErrorClass::Object, ErrorCode::UnknownObject)
    }

    pub const fn unknown_property() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::UnknownProperty)
    }

    pub const fn write_access_denied() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::WriteAccessDenied)
    }

    pub const fn invalid_data_type() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::InvalidDataType)
    }

    pub const fn value_out_of_range() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::ValueOutOfRange)
    }

    pub const fn invalid_array_index() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::InvalidArrayIndex)
    }

    pub const fn not_an_array() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::PropertyIsNotAnArray)
    }
}

impl From<ObjectError> for PropertyError {
    fn from(err: ObjectError) -> Self {
        match err {
            ObjectError::NotFound { .. } => Self::unknown_object(),
            ObjectError::InvalidArgument(_) => Self::value_out_of_range(),
            ObjectError::CapacityExceeded { .. } => {
                Self::new(ErrorClass::Resources, ErrorCode::NoSpaceForObject)
            }
            ObjectError::EncodingFailed(_) => {
                Self::new(ErrorClass::Services, ErrorCode::AbortBufferOverflow)
            }
            ObjectError::Unsupported(_) => Self::write_access_denied(),
        }
    }
}
