//! Resolved OIL objects

use crate::itemlist::ItemList;
use crate::scheduling::TaskFlags;
use crate::schema::ObjectType;
use crate::value::{AttributeSlot, AttributeValue};
use crate::{OilError, OilObjectName};

/// Where the value of an attribute came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Declared,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub slot: AttributeSlot,
    pub origin: Origin,
}

impl OilObjectName for Attribute {
    fn get_name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Basic,
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceProperty {
    Standard,
    Internal,
    Linked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Internal,
    External,
}

/// A fully resolved OIL object
///
/// The attributes are filled in by the resolver. The facets (`task_type`, `has_*`,
/// `resource_property`, `message_direction`) are set by the classifier, the remaining
/// fields by the scheduling analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDefinition {
    pub object_type: ObjectType,
    pub name: String,
    pub description: String,
    pub line: u32,
    pub(crate) attributes: ItemList<Attribute>,

    pub task_type: Option<TaskType>,
    pub has_resources: bool,
    pub has_events: bool,
    pub has_autostarts: bool,
    pub resource_property: Option<ResourceProperty>,
    pub message_direction: Option<MessageDirection>,

    pub absolute_priority: Option<u32>,
    /// 0 if no task uses the resource
    pub relative_ceiling_priority: u32,
    pub flags: TaskFlags,
    pub position: Option<usize>,
}

impl ObjectDefinition {
    pub(crate) fn new(
        object_type: ObjectType,
        name: &str,
        description: Option<&str>,
        line: u32,
        attributes: ItemList<Attribute>,
    ) -> Self {
        Self {
            object_type,
            name: name.to_string(),
            description: description.unwrap_or_default().to_string(),
            line,
            attributes,
            task_type: None,
            has_resources: false,
            has_events: false,
            has_autostarts: false,
            resource_property: None,
            message_direction: None,
            absolute_priority: None,
            relative_ceiling_priority: 0,
            flags: TaskFlags::empty(),
            position: None,
        }
    }

    /// all attributes, in schema order for defaults and declaration order otherwise
    #[must_use]
    pub fn attributes(&self) -> &ItemList<Attribute> {
        &self.attributes
    }

    /// get the slot of an attribute
    ///
    /// # Errors
    ///
    /// [`OilError::AttributeNotFound`] if the object has no such attribute, neither declared nor by default
    pub fn get(&self, attribute: &str) -> Result<&AttributeSlot, OilError> {
        self.attributes
            .get(attribute)
            .map(|attr| &attr.slot)
            .ok_or_else(|| OilError::AttributeNotFound {
                object_type: self.object_type.to_string(),
                name: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }

    /// get the value of a single-valued attribute
    ///
    /// # Errors
    ///
    /// [`OilError::AttributeNotFound`] if the attribute is absent, [`OilError::InvalidAttributeValue`] if it holds a list
    pub fn value(&self, attribute: &str) -> Result<&AttributeValue, OilError> {
        match self.get(attribute)? {
            AttributeSlot::Single(value) => Ok(value),
            AttributeSlot::List(_) => Err(self.invalid_value(attribute, "a single value")),
        }
    }

    /// get all values of an attribute; single-valued attributes yield one value
    ///
    /// # Errors
    ///
    /// [`OilError::AttributeNotFound`] if the attribute is absent
    pub fn values(&self, attribute: &str) -> Result<&[AttributeValue], OilError> {
        Ok(self.get(attribute)?.values())
    }

    /// get a single-valued attribute as an unsigned integer
    ///
    /// # Errors
    ///
    /// [`OilError::AttributeNotFound`] or [`OilError::InvalidAttributeValue`]
    pub fn uint(&self, attribute: &str) -> Result<u64, OilError> {
        self.value(attribute)?
            .as_u64()
            .ok_or_else(|| self.invalid_value(attribute, "an unsigned integer"))
    }

    /// get a single-valued attribute as an identifier
    ///
    /// # Errors
    ///
    /// [`OilError::AttributeNotFound`] or [`OilError::InvalidAttributeValue`]
    pub fn ident(&self, attribute: &str) -> Result<&str, OilError> {
        self.value(attribute)?
            .as_ident()
            .ok_or_else(|| self.invalid_value(attribute, "an identifier"))
    }

    /// true if the attribute is present, either declared or from a default
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }

    /// true if the attribute was given explicitly in a declaration
    #[must_use]
    pub fn is_declared(&self, attribute: &str) -> bool {
        self.attributes
            .get(attribute)
            .is_some_and(|attr| attr.origin == Origin::Declared)
    }

    pub(crate) fn invalid_value(&self, attribute: &str, expected: &str) -> OilError {
        OilError::InvalidAttributeValue {
            object_type: self.object_type.to_string(),
            name: self.name.clone(),
            attribute: attribute.to_string(),
            expected: expected.to_string(),
        }
    }
}

impl OilObjectName for ObjectDefinition {
    fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn task() -> ObjectDefinition {
        let attributes = [
            Attribute {
                name: "PRIORITY".to_string(),
                slot: AttributeSlot::Single(AttributeValue::Uint(4)),
                origin: Origin::Declared,
            },
            Attribute {
                name: "SCHEDULE".to_string(),
                slot: AttributeSlot::Single(AttributeValue::Enum("FULL".to_string())),
                origin: Origin::Declared,
            },
            Attribute {
                name: "RESOURCE".to_string(),
                slot: AttributeSlot::List(vec![
                    AttributeValue::Ref("r1".to_string()),
                    AttributeValue::Ref("r2".to_string()),
                ]),
                origin: Origin::Declared,
            },
            Attribute {
                name: "ACTIVATION".to_string(),
                slot: AttributeSlot::Single(AttributeValue::Uint(1)),
                origin: Origin::Default,
            },
        ]
        .into_iter()
        .collect();
        ObjectDefinition::new(ObjectType::Task, "t1", None, 3, attributes)
    }

    #[test]
    fn typed_access() {
        let task = task();
        assert_eq!(task.uint("PRIORITY").unwrap(), 4);
        assert_eq!(task.ident("SCHEDULE").unwrap(), "FULL");
        assert_eq!(task.values("RESOURCE").unwrap().len(), 2);
        assert_eq!(task.values("PRIORITY").unwrap().len(), 1);
        assert_eq!(task.description, "");

        let result = task.value("RESOURCE");
        assert!(matches!(result, Err(OilError::InvalidAttributeValue { .. })));
        let result = task.uint("SCHEDULE");
        assert!(matches!(result, Err(OilError::InvalidAttributeValue { .. })));
        let result = task.get("EVENT");
        assert!(matches!(result, Err(OilError::AttributeNotFound { .. })));
    }

    #[test]
    fn declared_and_default() {
        let task = task();
        assert!(task.contains("ACTIVATION"));
        assert!(!task.is_declared("ACTIVATION"));
        assert!(task.is_declared("PRIORITY"));
        assert!(!task.contains("EVENT"));
    }
}
