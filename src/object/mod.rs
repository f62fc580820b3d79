//! BACnet object model: identifiers, property ids, and the per-type stores.

/// Analog Output objects.
pub mod analog_output;
/// Binary Output objects.
pub mod binary_output;
/// Commandable output store shared by all output object types.
pub mod commandable;
/// Fixed-capacity instance tables.
pub mod directory;
/// Priority levels and the 16-slot priority array.
pub mod priority;

use std::fmt;

use serde::Serialize;

/// Largest instance number; also the "pick one for me" value on create.
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// BACnet object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectType {
    AnalogOutput,
    BinaryOutput,
    Device,
    LoadControl,
    Other(u16),
}

impl ObjectType {
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::AnalogOutput => 1,
            Self::BinaryOutput => 4,
            Self::Device => 8,
            Self::LoadControl => 28,
            Self::Other(v) => v,
        }
    }

    pub const fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::AnalogOutput,
            4 => Self::BinaryOutput,
            8 => Self::Device,
            28 => Self::LoadControl,
            v => Self::Other(v),
        }
    }

    /// Parses a kebab-case name (`"analog-output"`) or a numeric type.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "analog-output" => Some(Self::AnalogOutput),
            "binary-output" => Some(Self::BinaryOutput),
            "device" => Some(Self::Device),
            "load-control" => Some(Self::LoadControl),
            other => other.parse::<u16>().ok().map(Self::from_u16),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnalogOutput => f.write_str("analog-output"),
            Self::BinaryOutput => f.write_str("binary-output"),
            Self::Device => f.write_str("device"),
            Self::LoadControl => f.write_str("load-control"),
            Self::Other(v) => write!(f, "object-type-{v}"),
        }
    }
}

/// Object type plus instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectId {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectId {
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }
}

macro_rules! property_ids {
    ($($variant:ident = $id:literal, $name:literal;)*) => {
        /// Property identifier. Ids outside the supported subset are kept as
        /// [`PropertyId::Other`] so dispatch can answer `UnknownProperty`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum PropertyId {
            $($variant,)*
            Other(u32),
        }

        impl PropertyId {
            pub const fn to_u32(self) -> u32 {
                match self {
                    $(Self::$variant => $id,)*
                    Self::Other(v) => v,
                }
            }

            pub const fn from_u32(value: u32) -> Self {
                match value {
                    $($id => Self::$variant,)*
                    v => Self::Other(v),
                }
            }

            /// Kebab-case property name, e.g. `"present-value"`.
            pub fn name(self) -> String {
                match self {
                    $(Self::$variant => $name.to_string(),)*
                    Self::Other(v) => format!("property-{v}"),
                }
            }

            /// Parses a kebab-case name or a numeric id.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    other => other.parse::<u32>().ok().map(Self::from_u32),
                }
            }
        }
    };
}

property_ids! {
    ActiveText = 4, "active-text";
    CovIncrement = 22, "cov-increment";
    Description = 28, "description";
    EventState = 36, "event-state";
    InactiveText = 46, "inactive-text";
    MaxPresValue = 65, "max-pres-value";
    MinPresValue = 69, "min-pres-value";
    ObjectIdentifier = 75, "object-identifier";
    ObjectName = 77, "object-name";
    ObjectType = 79, "object-type";
    OutOfService = 81, "out-of-service";
    Polarity = 84, "polarity";
    PresentValue = 85, "present-value";
    PriorityArray = 87, "priority-array";
    Reliability = 103, "reliability";
    RelinquishDefault = 104, "relinquish-default";
    StatusFlags = 111, "status-flags";
    Units = 117, "units";
    Enable = 133, "enable";
    StartTime = 142, "start-time";
    ActualShedLevel = 212, "actual-shed-level";
    DutyWindow = 213, "duty-window";
    ExpectedShedLevel = 214, "expected-shed-level";
    FullDutyBaseline = 215, "full-duty-baseline";
    RequestedShedLevel = 218, "requested-shed-level";
    ShedDuration = 219, "shed-duration";
    ShedLevelDescriptions = 220, "shed-level-descriptions";
    ShedLevels = 221, "shed-levels";
    StateDescription = 222, "state-description";
    PropertyList = 371, "property-list";
    CurrentCommandPriority = 431, "current-command-priority";
}

/// Array index of a property request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayIndex {
    /// The whole property.
    #[default]
    All,
    /// One 1-based element of an array property.
    Index(u32),
}

/// Property partitions an object type supports.
#[derive(Debug, Clone, Copy)]
pub struct PropertyLists {
    pub required: &'static [PropertyId],
    pub optional: &'static [PropertyId],
    pub proprietary: &'static [PropertyId],
}

impl PropertyLists {
    pub fn contains(&self, property: PropertyId) -> bool {
        self.iter().any(|p| p == property)
    }

    pub fn iter(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.required
            .iter()
            .chain(self.optional)
            .chain(self.proprietary)
            .copied()
    }

    /// Contents of the Property_List property, which omits the identity
    /// properties and itself.
    pub fn property_list(&self) -> Vec<PropertyId> {
        self.iter()
            .filter(|p| {
                !matches!(
                    p,
                    PropertyId::ObjectIdentifier
                        | PropertyId::ObjectName
                        | PropertyId::ObjectType
                        | PropertyId::PropertyList
                )
            })
            .collect()
    }
}

/// Fault/health status of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Reliability {
    #[default]
    NoFaultDetected,
    NoSensor,
    OverRange,
    UnderRange,
    OpenLoop,
    ShortedLoop,
    NoOutput,
    UnreliableOther,
    ProcessError,
    ConfigurationError,
    CommunicationFailure,
}

impl Reliability {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::NoFaultDetected => 0,
            Self::NoSensor => 1,
            Self::OverRange => 2,
            Self::UnderRange => 3,
            Self::OpenLoop => 4,
            Self::ShortedLoop => 5,
            Self::NoOutput => 6,
            Self::UnreliableOther => 7,
            Self::ProcessError => 8,
            Self::ConfigurationError => 10,
            Self::CommunicationFailure => 12,
        }
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::NoFaultDetected),
            1 => Some(Self::NoSensor),
            2 => Some(Self::OverRange),
            3 => Some(Self::UnderRange),
            4 => Some(Self::OpenLoop),
            5 => Some(Self::ShortedLoop),
            6 => Some(Self::NoOutput),
            7 => Some(Self::UnreliableOther),
            8 => Some(Self::ProcessError),
            10 => Some(Self::ConfigurationError),
            12 => Some(Self::CommunicationFailure),
            _ => None,
        }
    }
}

/// The four Status_Flags bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags {
    pub in_alarm: bool,
    pub fault: bool,
    pub overridden: bool,
    pub out_of_service: bool,
}

impl StatusFlags {
    pub fn new(reliability: Reliability, out_of_service: bool) -> Self {
        Self {
            in_alarm: false,
            fault: reliability != Reliability::NoFaultDetected,
            overridden: false,
            out_of_service,
        }
    }

    pub fn bits(&self) -> Vec<bool> {
        vec![self.in_alarm, self.fault, self.overridden, self.out_of_service]
    }
}

/// Event_State value reported by every object; alarming is not modelled.
pub const EVENT_STATE_NORMAL: u32 = 0;
