//! oilmodel is the semantic analysis stage of an OSEK/VDX OIL compiler.
//!
//! It takes the object declarations produced by an OIL parser and turns them into a
//! validated application model: attributes are resolved against a [`Schema`], objects are
//! classified and stored in a [`Registry`], and the static scheduling data (priority levels,
//! resource ceiling priorities, task flags, alarm positions and autostarts) is derived.
//!
//! All problems are collected in a [`Diagnostics`] object. Fatal problems additionally stop
//! the analysis and are returned as an [`OilError`].
//!
//! # Features
//!
//! - `check`: check the references between objects

mod auto;
#[cfg(feature = "check")]
mod checker;
mod classifier;
mod declaration;
mod definition;
mod diagnostics;
mod itemlist;
mod registry;
mod resolver;
mod schema;
mod scheduling;
mod value;

use thiserror::Error;

pub use auto::{AutoAssign, NoAutoAssign, event_mask_assigner, resolve_auto};
pub use classifier::classify;
pub use declaration::{Declaration, RawParameter};
pub use definition::{Attribute, MessageDirection, ObjectDefinition, Origin, ResourceProperty, TaskType};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use itemlist::ItemList;
pub use registry::{MessageBuckets, Registry, ResourceBuckets};
pub use resolver::{AutoRef, ResolvedAttributes, complete, missing_required, resolve};
pub use schema::{AttributeDefinition, DataType, Multiplicity, ObjectType, Schema};
pub use scheduling::{ApplicationSummary, ConformanceClass, PriorityLevel, TaskFlags, analyze};
pub use value::{AUTO_KEYWORD, AttributeSlot, AttributeValue, Literal};

/// Access to the name of a named object
pub trait OilObjectName {
    fn get_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum OilError {
    /// `UnknownObjectType`: the object type is not described by the schema
    #[error("Unknown object type {object_type}")]
    UnknownObjectType { object_type: String },

    /// `UnknownAttribute`: a declaration uses an attribute that the schema does not define for its object type
    #[error("Unknown attribute: {object_type} {name} on line {line} uses {attribute}, which is not defined for {object_type}")]
    UnknownAttribute {
        object_type: String,
        name: String,
        attribute: String,
        line: u32,
    },

    /// `AttributeNotFound`: an attribute was requested that the object does not have
    #[error("Attribute not found: {object_type} {name} has no attribute {attribute}")]
    AttributeNotFound {
        object_type: String,
        name: String,
        attribute: String,
    },

    /// `InvalidAttributeValue`: the value of an attribute does not have the expected type
    #[error("Invalid value: attribute {attribute} of {object_type} {name} must be of type {expected}")]
    InvalidAttributeValue {
        object_type: String,
        name: String,
        attribute: String,
        expected: String,
    },

    /// `MissingRequiredAttribute`: a required attribute without default was not declared
    #[error("Missing attribute: {object_type} {name} on line {line} requires attribute {attribute}")]
    MissingRequiredAttribute {
        object_type: String,
        name: String,
        attribute: String,
        line: u32,
    },

    /// `UnclassifiedResourceProperty`: the RESOURCEPROPERTY of a resource is not STANDARD, INTERNAL or LINKED
    #[error("Unclassified resource: RESOURCE {name} has the unknown RESOURCEPROPERTY {value}")]
    UnclassifiedResourceProperty { name: String, value: String },

    /// `UnclassifiedMessageProperty`: the MESSAGEPROPERTY of a message is neither internal nor a known external property
    #[error("Unclassified message: MESSAGE {name} has the unknown MESSAGEPROPERTY {value}")]
    UnclassifiedMessageProperty { name: String, value: String },

    /// `UndefinedResourceReference`: a task uses a resource that was never declared
    #[error("Undefined resource reference: TASK {task} uses RESOURCE {resource}, which is not declared")]
    UndefinedResourceReference { task: String, resource: String },

    /// `DuplicateObjectDefinition`: an object was declared a second time without `extend`
    #[error("Duplicate definition: {object_type} {name} on line {line_2} was already defined on line {line_1}")]
    DuplicateObjectDefinition {
        object_type: String,
        name: String,
        line_1: u32,
        line_2: u32,
    },

    /// `ConflictingAttribute`: an extending declaration changes a previously declared attribute value
    #[error("Conflicting attribute: {object_type} {name} on line {line} changes the declared value of {attribute}")]
    ConflictingAttribute {
        object_type: String,
        name: String,
        attribute: String,
        line: u32,
    },

    /// `UnresolvedAuto`: no value was assigned to an attribute declared as AUTO
    #[error("Unresolved AUTO: attribute {attribute} of {object_type} {name} has no assigned value")]
    UnresolvedAuto {
        object_type: String,
        name: String,
        attribute: String,
    },

    /// `OsInstanceCount`: an application must contain exactly one OS object
    #[error("Expected exactly one OS object, but found {count}")]
    OsInstanceCount { count: usize },

    /// `CrossReferenceError`: a reference to an object that was not declared
    #[error(
        "Cross-reference error: {source_type} {source_name} on line {source_line} references a non-existent {target_type} {target_name}"
    )]
    CrossReferenceError {
        source_type: String,
        source_name: String,
        source_line: u32,
        target_type: String,
        target_name: String,
    },
}

impl OilError {
    /// short identifier of the error kind, used in diagnostics
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownObjectType { .. } => "UNKNOWN-OBJECT-TYPE",
            Self::UnknownAttribute { .. } => "UNKNOWN-ATTRIBUTE",
            Self::AttributeNotFound { .. } => "ATTRIBUTE-NOT-FOUND",
            Self::InvalidAttributeValue { .. } => "INVALID-VALUE",
            Self::MissingRequiredAttribute { .. } => "MISSING-ATTRIBUTE",
            Self::UnclassifiedResourceProperty { .. } => "UNCLASSIFIED-RESOURCE",
            Self::UnclassifiedMessageProperty { .. } => "UNCLASSIFIED-MESSAGE",
            Self::UndefinedResourceReference { .. } => "UNDEFINED-RESOURCE",
            Self::DuplicateObjectDefinition { .. } => "DUPLICATE-OBJECT",
            Self::ConflictingAttribute { .. } => "CONFLICTING-ATTRIBUTE",
            Self::UnresolvedAuto { .. } => "UNRESOLVED-AUTO",
            Self::OsInstanceCount { .. } => "OS-COUNT",
            Self::CrossReferenceError { .. } => "CROSS-REFERENCE",
        }
    }

    /// the source line the error refers to, if it is known
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::UnknownAttribute { line, .. }
            | Self::MissingRequiredAttribute { line, .. }
            | Self::ConflictingAttribute { line, .. }
            | Self::DuplicateObjectDefinition { line_2: line, .. }
            | Self::CrossReferenceError {
                source_line: line, ..
            } => Some(*line),
            _ => None,
        }
    }

    /// fatal errors stop the analysis
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownObjectType { .. }
                | Self::UnknownAttribute { .. }
                | Self::AttributeNotFound { .. }
                | Self::InvalidAttributeValue { .. }
                | Self::UnclassifiedResourceProperty { .. }
                | Self::UnclassifiedMessageProperty { .. }
        )
    }
}

/// Options of one analysis run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// report warnings as errors
    pub strict: bool,
}

/// The analyzed application
#[derive(Debug, Clone)]
pub struct Application {
    pub registry: Registry,
    pub summary: ApplicationSummary,
    schema: Schema,
}

/**
Analyze the declarations of an application

Attributes declared as `AUTO` are left unassigned and reported as warnings; use
[`build_with_auto`] to assign them.

# Example

```rust
use oilmodel::{AnalysisOptions, Declaration, Diagnostics, Literal, ObjectType, Schema};

let declarations = vec![
    Declaration::new(ObjectType::Os, "os").with("STATUS", Literal::ident("EXTENDED")),
    Declaration::new(ObjectType::Task, "idle")
        .with("PRIORITY", Literal::Int(1))
        .with("SCHEDULE", Literal::ident("FULL"))
        .with("AUTOSTART", Literal::Bool(true)),
];
let mut diagnostics = Diagnostics::new();
let app = oilmodel::build(&declarations, &Schema::osek(), &AnalysisOptions::default(), &mut diagnostics).unwrap();
assert!(diagnostics.may_generate());
assert_eq!(app.autostarted_tasks(), ["idle"]);
```

# Errors

Any fatal [`OilError`]. It is also recorded in `diagnostics`.
 */
pub fn build<'a, I>(
    declarations: I,
    schema: &Schema,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Application, OilError>
where
    I: IntoIterator<Item = &'a Declaration>,
{
    build_with_auto(declarations, schema, &mut NoAutoAssign, options, diagnostics)
}

/// Analyze the declarations of an application, with values for `AUTO` attributes supplied by `assigner`
///
/// # Errors
///
/// Any fatal [`OilError`]. It is also recorded in `diagnostics`.
pub fn build_with_auto<'a, I>(
    declarations: I,
    schema: &Schema,
    assigner: &mut dyn AutoAssign,
    options: &AnalysisOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Application, OilError>
where
    I: IntoIterator<Item = &'a Declaration>,
{
    diagnostics.set_strict(options.strict);

    let mut registry = Registry::build(declarations, schema, diagnostics).map_err(|err| diagnostics.fatal(err))?;
    resolve_auto(&mut registry, schema, assigner, diagnostics).map_err(|err| diagnostics.fatal(err))?;

    if schema.contains_type(ObjectType::Os) {
        let count = registry.get(ObjectType::Os).map_or(0, ItemList::len);
        if count != 1 {
            diagnostics.error(OilError::OsInstanceCount { count });
        }
    }

    let summary = analyze(&mut registry, diagnostics).map_err(|err| diagnostics.fatal(err))?;

    Ok(Application {
        registry,
        summary,
        schema: schema.clone(),
    })
}

impl Application {
    /// names of the tasks that are started automatically
    #[must_use]
    pub fn autostarted_tasks(&self) -> &[String] {
        &self.summary.autostarted_tasks
    }

    /// names of the alarms that are started automatically
    #[must_use]
    pub fn autostarted_alarms(&self) -> &[String] {
        &self.summary.autostarted_alarms
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceBuckets {
        self.registry.resources()
    }

    #[must_use]
    pub fn messages(&self) -> &MessageBuckets {
        self.registry.messages()
    }

    /// the schema the application was analyzed with
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[cfg(feature = "check")]
    /// check the references between the objects of the application
    ///
    /// Every attribute value that refers to an object which was not declared is reported
    /// as [`OilError::CrossReferenceError`]. References from tasks to resources are
    /// already covered by the scheduling analysis and are not checked again.
    #[must_use]
    pub fn check(&self) -> Vec<OilError> {
        checker::check(&self.registry, &self.schema)
    }
}
