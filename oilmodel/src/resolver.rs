//! Attribute resolution: typed conversion of the declared parameters and default injection

use crate::OilError;
use crate::declaration::{Declaration, RawParameter};
use crate::definition::{Attribute, ObjectDefinition, Origin};
use crate::itemlist::ItemList;
use crate::schema::{AttributeDefinition, Multiplicity, ObjectType, Schema};
use crate::value::{AttributeSlot, AttributeValue};

/// An attribute whose value is `AUTO` and must be assigned in a later pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRef {
    pub object_type: ObjectType,
    pub name: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttributes {
    pub attributes: ItemList<Attribute>,
    /// required attributes which are neither declared nor have a default
    pub missing_required: Vec<String>,
    pub auto: Vec<AutoRef>,
}

/// resolve the parameters of one declaration against the schema
///
/// # Errors
///
/// - [`OilError::UnknownObjectType`] if the schema does not describe the object type
/// - [`OilError::UnknownAttribute`] for a parameter that the schema does not define
/// - [`OilError::InvalidAttributeValue`] if a literal does not fit the data type of its attribute
pub fn resolve(declaration: &Declaration, schema: &Schema) -> Result<ResolvedAttributes, OilError> {
    let object_type = declaration.object_type;
    let definitions = schema
        .object(object_type)
        .ok_or_else(|| OilError::UnknownObjectType {
            object_type: object_type.to_string(),
        })?;

    let mut attributes = ItemList::with_capacity(definitions.len());
    let mut auto = Vec::new();

    for (attribute, params) in declaration.grouped() {
        let definition = definitions
            .get(attribute)
            .ok_or_else(|| OilError::UnknownAttribute {
                object_type: object_type.to_string(),
                name: declaration.name.clone(),
                attribute: attribute.to_string(),
                line: params.first().map_or(declaration.line, |param| param.line),
            })?;
        let values = params
            .iter()
            .map(|param| convert(declaration, definition, param))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(slot) = make_slot(definition, values) else {
            continue;
        };
        if slot.contains_auto() {
            auto.push(auto_ref(object_type, &declaration.name, attribute));
        }
        attributes.push(Attribute {
            name: attribute.to_string(),
            slot,
            origin: Origin::Declared,
        });
    }

    auto.extend(inject_defaults(
        object_type,
        &declaration.name,
        &mut attributes,
        definitions,
    )?);
    let missing_required = missing(definitions, &attributes);

    Ok(ResolvedAttributes {
        attributes,
        missing_required,
        auto,
    })
}

/// apply the schema defaults to an already resolved object
///
/// Attributes that are present are left alone, so calling this on a complete object
/// changes nothing. Returns the `AUTO` references introduced by new defaults.
///
/// # Errors
///
/// [`OilError::UnknownObjectType`] or [`OilError::InvalidAttributeValue`] for a default that does not fit its type
pub fn complete(definition: &mut ObjectDefinition, schema: &Schema) -> Result<Vec<AutoRef>, OilError> {
    let definitions = schema
        .object(definition.object_type)
        .ok_or_else(|| OilError::UnknownObjectType {
            object_type: definition.object_type.to_string(),
        })?;
    inject_defaults(
        definition.object_type,
        &definition.name,
        &mut definition.attributes,
        definitions,
    )
}

/// names of the required attributes that the object lacks
#[must_use]
pub fn missing_required(definition: &ObjectDefinition, schema: &Schema) -> Vec<String> {
    schema
        .object(definition.object_type)
        .map(|definitions| missing(definitions, &definition.attributes))
        .unwrap_or_default()
}

fn inject_defaults(
    object_type: ObjectType,
    name: &str,
    attributes: &mut ItemList<Attribute>,
    definitions: &ItemList<AttributeDefinition>,
) -> Result<Vec<AutoRef>, OilError> {
    let mut auto = Vec::new();
    for definition in definitions {
        let Some(default) = &definition.default else {
            continue;
        };
        if attributes.contains_key(&definition.name) {
            continue;
        }
        let value = definition
            .data_type
            .convert(default)
            .ok_or_else(|| OilError::InvalidAttributeValue {
                object_type: object_type.to_string(),
                name: name.to_string(),
                attribute: definition.name.clone(),
                expected: definition.data_type.to_string(),
            })?;
        let Some(slot) = make_slot(definition, vec![value]) else {
            continue;
        };
        if slot.contains_auto() {
            auto.push(auto_ref(object_type, name, &definition.name));
        }
        attributes.push(Attribute {
            name: definition.name.clone(),
            slot,
            origin: Origin::Default,
        });
    }
    Ok(auto)
}

fn missing(definitions: &ItemList<AttributeDefinition>, attributes: &ItemList<Attribute>) -> Vec<String> {
    definitions
        .iter()
        .filter(|def| def.required && def.default.is_none() && !attributes.contains_key(&def.name))
        .map(|def| def.name.clone())
        .collect()
}

fn convert(
    declaration: &Declaration,
    definition: &AttributeDefinition,
    param: &RawParameter,
) -> Result<AttributeValue, OilError> {
    definition
        .data_type
        .convert(&param.value)
        .ok_or_else(|| OilError::InvalidAttributeValue {
            object_type: declaration.object_type.to_string(),
            name: declaration.name.clone(),
            attribute: definition.name.clone(),
            expected: definition.data_type.to_string(),
        })
}

// a single-valued attribute keeps its first occurrence
fn make_slot(definition: &AttributeDefinition, values: Vec<AttributeValue>) -> Option<AttributeSlot> {
    match definition.multiplicity {
        Multiplicity::List => Some(AttributeSlot::List(values)),
        Multiplicity::Single => values.into_iter().next().map(AttributeSlot::Single),
    }
}

fn auto_ref(object_type: ObjectType, name: &str, attribute: &str) -> AutoRef {
    AutoRef {
        object_type,
        name: name.to_string(),
        attribute: attribute.to_string(),
    }
}
