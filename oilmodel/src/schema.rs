//! The schema of the OIL objects: which attributes each object type has, their types and defaults
//!
//! In OIL terms this is the content of the `IMPLEMENTATION` section. It is static
//! configuration data, not parsed by this crate.

use crate::itemlist::ItemList;
use crate::value::{AttributeValue, Literal};
use crate::{OilError, OilObjectName};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// names of the attributes that the analysis passes read
pub(crate) mod attr {
    pub(crate) const ACTIVATION: &str = "ACTIVATION";
    pub(crate) const AUTOSTART: &str = "AUTOSTART";
    pub(crate) const EVENT: &str = "EVENT";
    pub(crate) const MASK: &str = "MASK";
    pub(crate) const MESSAGEPROPERTY: &str = "MESSAGEPROPERTY";
    pub(crate) const PRIORITY: &str = "PRIORITY";
    pub(crate) const RESOURCE: &str = "RESOURCE";
    pub(crate) const RESOURCEPROPERTY: &str = "RESOURCEPROPERTY";
    pub(crate) const SCHEDULE: &str = "SCHEDULE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectType {
    Os,
    AppMode,
    Task,
    Isr,
    Counter,
    Alarm,
    Resource,
    Event,
    Message,
    Com,
    Nm,
}

impl ObjectType {
    pub const ALL: [ObjectType; 11] = [
        Self::Os,
        Self::AppMode,
        Self::Task,
        Self::Isr,
        Self::Counter,
        Self::Alarm,
        Self::Resource,
        Self::Event,
        Self::Message,
        Self::Com,
        Self::Nm,
    ];

    /// the OIL keyword of the object type
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Os => "OS",
            Self::AppMode => "APPMODE",
            Self::Task => "TASK",
            Self::Isr => "ISR",
            Self::Counter => "COUNTER",
            Self::Alarm => "ALARM",
            Self::Resource => "RESOURCE",
            Self::Event => "EVENT",
            Self::Message => "MESSAGE",
            Self::Com => "COM",
            Self::Nm => "NM",
        }
    }
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ObjectType {
    type Err = OilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|object_type| object_type.keyword() == s)
            .ok_or_else(|| OilError::UnknownObjectType {
                object_type: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Uint32,
    Uint64,
    Int32,
    Int64,
    Float,
    Boolean,
    String,
    /// an enumeration with the given set of allowed identifiers
    Enum(Vec<String>),
    /// the name of an object of the given type
    Reference(ObjectType),
}

impl DataType {
    /// convenience constructor for enumerations
    #[must_use]
    pub fn enumeration(values: &[&str]) -> Self {
        Self::Enum(values.iter().map(ToString::to_string).collect())
    }

    /// convert a parser literal into a value of this type
    ///
    /// `AUTO` is accepted for every type. Nested literals are converted by their main
    /// value; the sub-parameters are kept untyped. Enumeration membership is not
    /// checked here.
    #[must_use]
    pub fn convert(&self, literal: &Literal) -> Option<AttributeValue> {
        if literal.is_auto() {
            return Some(AttributeValue::Auto);
        }
        if let Literal::Nested { value, .. } = literal {
            let AttributeValue::Nested { parameters, .. } = AttributeValue::from_untyped(literal)
            else {
                return None;
            };
            return Some(AttributeValue::Nested {
                value: Box::new(self.convert(value)?),
                parameters,
            });
        }

        match (self, literal) {
            (Self::Uint32, Literal::Int(val)) => u32::try_from(*val)
                .ok()
                .map(|val| AttributeValue::Uint(u64::from(val))),
            (Self::Uint64, Literal::Int(val)) => u64::try_from(*val).ok().map(AttributeValue::Uint),
            (Self::Int32, Literal::Int(val)) => i32::try_from(*val)
                .ok()
                .map(|val| AttributeValue::Int(i64::from(val))),
            (Self::Int64, Literal::Int(val)) => Some(AttributeValue::Int(*val)),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float, Literal::Int(val)) => Some(AttributeValue::Float(*val as f64)),
            (Self::Float, Literal::Float(val)) => Some(AttributeValue::Float(*val)),
            (Self::Boolean, Literal::Bool(val)) => Some(AttributeValue::Bool(*val)),
            (Self::Boolean, Literal::Ident(ident)) => match ident.as_str() {
                "TRUE" => Some(AttributeValue::Bool(true)),
                "FALSE" => Some(AttributeValue::Bool(false)),
                _ => None,
            },
            (Self::String, Literal::Str(text)) => Some(AttributeValue::Str(text.clone())),
            (Self::Enum(_), Literal::Ident(ident)) => Some(AttributeValue::Enum(ident.clone())),
            (Self::Reference(_), Literal::Ident(ident)) => Some(AttributeValue::Ref(ident.clone())),
            _ => None,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uint32 => f.write_str("UINT32"),
            Self::Uint64 => f.write_str("UINT64"),
            Self::Int32 => f.write_str("INT32"),
            Self::Int64 => f.write_str("INT64"),
            Self::Float => f.write_str("FLOAT"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::String => f.write_str("STRING"),
            Self::Enum(values) => write!(f, "ENUM [{}]", values.join(", ")),
            Self::Reference(object_type) => write!(f, "{object_type}_TYPE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Single,
    List,
}

/// Definition of one attribute of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    pub name: String,
    pub data_type: DataType,
    pub default: Option<Literal>,
    pub multiplicity: Multiplicity,
    pub required: bool,
}

impl AttributeDefinition {
    /// create a single-valued, optional attribute without default
    #[must_use]
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            default: None,
            multiplicity: Multiplicity::Single,
            required: false,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Literal) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn list(mut self) -> Self {
        self.multiplicity = Multiplicity::List;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl OilObjectName for AttributeDefinition {
    fn get_name(&self) -> &str {
        &self.name
    }
}

/// The attribute definitions of all object types
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    objects: BTreeMap<ObjectType, ItemList<AttributeDefinition>>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// make an object type known to the schema, even if it has no attributes
    #[must_use]
    pub fn with_object(mut self, object_type: ObjectType) -> Self {
        self.objects.entry(object_type).or_default();
        self
    }

    /// add an attribute definition; a definition with the same name replaces the earlier one
    #[must_use]
    pub fn with_attribute(mut self, object_type: ObjectType, definition: AttributeDefinition) -> Self {
        let attributes = self.objects.entry(object_type).or_default();
        if let Some(existing) = attributes.get_mut(&definition.name) {
            *existing = definition;
        } else {
            attributes.push(definition);
        }
        self
    }

    /// all attribute definitions of an object type, in definition order
    #[must_use]
    pub fn object(&self, object_type: ObjectType) -> Option<&ItemList<AttributeDefinition>> {
        self.objects.get(&object_type)
    }

    #[must_use]
    pub fn attribute(&self, object_type: ObjectType, name: &str) -> Option<&AttributeDefinition> {
        self.objects.get(&object_type)?.get(name)
    }

    #[must_use]
    pub fn contains_type(&self, object_type: ObjectType) -> bool {
        self.objects.contains_key(&object_type)
    }

    pub fn object_types(&self) -> impl Iterator<Item = ObjectType> + '_ {
        self.objects.keys().copied()
    }

    /// The standard OSEK OS / COM attributes
    ///
    /// Attributes which the standard declares without a default are required here,
    /// except for the references lists (`RESOURCE`, `EVENT`, `MESSAGE`) and `STACKSIZE`.
    /// `ACTIVATION` defaults to 1 and the boolean hooks default to `FALSE`.
    #[must_use]
    pub fn osek() -> Self {
        use DataType::{Boolean, Reference, Uint32, Uint64};
        use ObjectType::{Alarm, AppMode, Com, Counter, Event, Isr, Message, Nm, Os, Resource, Task};

        let flag = |name: &str| AttributeDefinition::new(name, Boolean).with_default(Literal::Bool(false));

        let mut schema = Self::new()
            .with_attribute(
                Os,
                AttributeDefinition::new("STATUS", DataType::enumeration(&["STANDARD", "EXTENDED"]))
                    .required(),
            )
            .with_object(AppMode)
            .with_object(Nm);
        for hook in [
            "STARTUPHOOK",
            "ERRORHOOK",
            "SHUTDOWNHOOK",
            "PRETASKHOOK",
            "POSTTASKHOOK",
            "USEGETSERVICEID",
            "USEPARAMETERACCESS",
        ] {
            schema = schema.with_attribute(Os, flag(hook));
        }
        schema = schema.with_attribute(
            Os,
            AttributeDefinition::new("USERESSCHEDULER", Boolean).with_default(Literal::Bool(true)),
        );

        schema
            .with_attribute(Task, AttributeDefinition::new(attr::PRIORITY, Uint32).required())
            .with_attribute(
                Task,
                AttributeDefinition::new(attr::SCHEDULE, DataType::enumeration(&["NON", "FULL"]))
                    .required(),
            )
            .with_attribute(
                Task,
                AttributeDefinition::new(attr::ACTIVATION, Uint32).with_default(Literal::Int(1)),
            )
            .with_attribute(Task, flag(attr::AUTOSTART))
            .with_attribute(Task, AttributeDefinition::new(attr::RESOURCE, Reference(Resource)).list())
            .with_attribute(Task, AttributeDefinition::new(attr::EVENT, Reference(Event)).list())
            .with_attribute(Task, AttributeDefinition::new("MESSAGE", Reference(Message)).list())
            .with_attribute(Task, AttributeDefinition::new("STACKSIZE", Uint32))
            .with_attribute(Isr, AttributeDefinition::new("CATEGORY", Uint32).required())
            .with_attribute(Isr, AttributeDefinition::new(attr::RESOURCE, Reference(Resource)).list())
            .with_attribute(Isr, AttributeDefinition::new("MESSAGE", Reference(Message)).list())
            .with_attribute(Counter, AttributeDefinition::new("MAXALLOWEDVALUE", Uint64).required())
            .with_attribute(Counter, AttributeDefinition::new("TICKSPERBASE", Uint64).required())
            .with_attribute(Counter, AttributeDefinition::new("MINCYCLE", Uint64).required())
            .with_attribute(Alarm, AttributeDefinition::new("COUNTER", Reference(Counter)).required())
            .with_attribute(
                Alarm,
                AttributeDefinition::new(
                    "ACTION",
                    DataType::enumeration(&["ACTIVATETASK", "SETEVENT", "ALARMCALLBACK"]),
                )
                .required(),
            )
            .with_attribute(Alarm, flag(attr::AUTOSTART))
            .with_attribute(
                Resource,
                AttributeDefinition::new(
                    attr::RESOURCEPROPERTY,
                    DataType::enumeration(&["STANDARD", "LINKED", "INTERNAL"]),
                )
                .required(),
            )
            .with_attribute(Event, AttributeDefinition::new(attr::MASK, Uint64).required())
            .with_attribute(
                Message,
                AttributeDefinition::new(
                    attr::MESSAGEPROPERTY,
                    DataType::enumeration(&[
                        "SEND_STATIC_INTERNAL",
                        "SEND_STATIC_EXTERNAL",
                        "SEND_DYNAMIC_EXTERNAL",
                        "SEND_ZERO_INTERNAL",
                        "SEND_ZERO_EXTERNAL",
                        "RECEIVE_ZERO_INTERNAL",
                        "RECEIVE_ZERO_EXTERNAL",
                        "RECEIVE_UNQUEUED_INTERNAL",
                        "RECEIVE_QUEUED_INTERNAL",
                        "RECEIVE_UNQUEUED_EXTERNAL",
                        "RECEIVE_QUEUED_EXTERNAL",
                        "RECEIVE_DYNAMIC_EXTERNAL",
                        "RECEIVE_ZERO_SENDERS",
                    ]),
                )
                .required(),
            )
            .with_attribute(Com, flag("COMERRORHOOK"))
            .with_attribute(Com, flag("COMUSEGETSERVICEID"))
    }
}
