//! Raw object declarations, as handed over by the OIL parser

use crate::schema::ObjectType;
use crate::value::Literal;

/// One `NAME = value;` assignment inside an object declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawParameter {
    pub name: String,
    pub value: Literal,
    pub description: Option<String>,
    pub line: u32,
}

impl RawParameter {
    #[must_use]
    pub fn new(name: &str, value: Literal) -> Self {
        Self {
            name: name.to_string(),
            value,
            description: None,
            line: 0,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

/// A single object declaration, e.g. `TASK t1 { PRIORITY = 5; ... } : "description";`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub object_type: ObjectType,
    pub name: String,
    pub parameters: Vec<RawParameter>,
    pub description: Option<String>,
    pub line: u32,
    /// set if this declaration intentionally extends an earlier declaration of the same object
    pub extend: bool,
}

impl Declaration {
    #[must_use]
    pub fn new(object_type: ObjectType, name: &str) -> Self {
        Self {
            object_type,
            name: name.to_string(),
            parameters: Vec::new(),
            description: None,
            line: 0,
            extend: false,
        }
    }

    /// append a parameter; repeated names are allowed and keep their order
    #[must_use]
    pub fn with(mut self, name: &str, value: Literal) -> Self {
        self.parameters.push(RawParameter::new(name, value));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    #[must_use]
    pub fn extending(mut self) -> Self {
        self.extend = true;
        self
    }

    /// group the parameters by name
    ///
    /// The groups are ordered by the first appearance of each name, and the parameters
    /// inside each group keep their declaration order.
    #[must_use]
    pub fn grouped(&self) -> Vec<(&str, Vec<&RawParameter>)> {
        let mut groups: Vec<(&str, Vec<&RawParameter>)> = Vec::new();
        for param in &self.parameters {
            if let Some((_, group)) = groups.iter_mut().find(|(name, _)| *name == param.name) {
                group.push(param);
            } else {
                groups.push((&param.name, vec![param]));
            }
        }
        groups
    }
}
