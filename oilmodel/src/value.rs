use crate::declaration::RawParameter;
use std::fmt::Display;

/// The keyword that marks a value for automatic assignment
pub const AUTO_KEYWORD: &str = "AUTO";

/// An untyped literal, as delivered by the OIL parser
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(String),
    Str(String),
    Auto,
    /// a value with sub-parameters, e.g. `AUTOSTART = TRUE { APPMODE = std; }`
    Nested {
        value: Box<Literal>,
        parameters: Vec<RawParameter>,
    },
}

impl Literal {
    /// convenience constructor for identifiers
    pub fn ident(text: &str) -> Self {
        Self::Ident(text.to_string())
    }

    /// true if this literal is the `AUTO` sentinel, either as a dedicated token or as a plain identifier
    #[must_use]
    pub fn is_auto(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Ident(ident) => ident == AUTO_KEYWORD,
            _ => false,
        }
    }
}

/// A typed attribute value
///
/// The type is determined by the `DataType` of the attribute in the schema.
/// Sub-parameters of a nested value are not described by the schema, so they are typed
/// by the shape of their literal.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Uint(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Enum(String),
    Str(String),
    /// name of another OIL object
    Ref(String),
    Auto,
    Nested {
        value: Box<AttributeValue>,
        parameters: Vec<(String, AttributeValue)>,
    },
}

impl AttributeValue {
    pub(crate) fn from_untyped(literal: &Literal) -> Self {
        if literal.is_auto() {
            return Self::Auto;
        }
        match literal {
            Literal::Int(val) => Self::Int(*val),
            Literal::Float(val) => Self::Float(*val),
            Literal::Bool(val) => Self::Bool(*val),
            Literal::Ident(val) => Self::Enum(val.clone()),
            Literal::Str(val) => Self::Str(val.clone()),
            Literal::Auto => Self::Auto,
            Literal::Nested { value, parameters } => Self::Nested {
                value: Box::new(Self::from_untyped(value)),
                parameters: parameters
                    .iter()
                    .map(|param| (param.name.clone(), Self::from_untyped(&param.value)))
                    .collect(),
            },
        }
    }

    /// integer content of the value, regardless of signedness
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(val) => Some(*val),
            Self::Uint(val) => i64::try_from(*val).ok(),
            Self::Nested { value, .. } => value.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(val) => Some(*val),
            Self::Int(val) => u64::try_from(*val).ok(),
            Self::Nested { value, .. } => value.as_u64(),
            _ => None,
        }
    }

    /// the identifier of an enum value or of a reference
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Enum(ident) | Self::Ref(ident) => Some(ident),
            Self::Nested { value, .. } => value.as_ident(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// evaluate the value as a boolean
    ///
    /// A nested value such as `TRUE { APPMODE = ... }` evaluates to its own value; the sub-parameters do not matter.
    #[must_use]
    pub fn is_true(&self) -> bool {
        match self {
            Self::Bool(val) => *val,
            Self::Nested { value, .. } => value.is_true(),
            _ => false,
        }
    }

    /// look up a sub-parameter of a nested value
    #[must_use]
    pub fn sub_parameter(&self, name: &str) -> Option<&AttributeValue> {
        match self {
            Self::Nested { parameters, .. } => parameters
                .iter()
                .find(|(param_name, _)| param_name == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uint(val) => write!(f, "{val}"),
            Self::Int(val) => write!(f, "{val}"),
            Self::Float(val) => write!(f, "{val}"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Enum(ident) | Self::Ref(ident) => f.write_str(ident),
            Self::Str(text) => write!(f, "\"{text}\""),
            Self::Auto => f.write_str(AUTO_KEYWORD),
            Self::Nested { value, parameters } => {
                write!(f, "{value} {{")?;
                for (name, param) in parameters {
                    write!(f, " {name} = {param};")?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// The resolved content of one attribute of an object
///
/// The variant follows the multiplicity of the attribute in the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSlot {
    Single(AttributeValue),
    /// all values of a multi-valued attribute, in declaration order
    List(Vec<AttributeValue>),
}

impl AttributeSlot {
    /// all values held by the slot; a single value yields a one-element slice
    #[must_use]
    pub fn values(&self) -> &[AttributeValue] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }

    pub(crate) fn values_mut(&mut self) -> &mut [AttributeValue] {
        match self {
            Self::Single(value) => std::slice::from_mut(value),
            Self::List(values) => values,
        }
    }

    #[must_use]
    pub fn contains_auto(&self) -> bool {
        self.values().iter().any(AttributeValue::is_auto)
    }
}
