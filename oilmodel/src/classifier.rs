use crate::OilError;
use crate::definition::{MessageDirection, ObjectDefinition, ResourceProperty, TaskType};
use crate::schema::{ObjectType, attr};

const EXTERNAL_MESSAGE_PROPERTIES: [&str; 8] = [
    "SEND_STATIC_EXTERNAL",
    "SEND_DYNAMIC_EXTERNAL",
    "SEND_ZERO_EXTERNAL",
    "RECEIVE_ZERO_EXTERNAL",
    "RECEIVE_UNQUEUED_EXTERNAL",
    "RECEIVE_QUEUED_EXTERNAL",
    "RECEIVE_DYNAMIC_EXTERNAL",
    "RECEIVE_ZERO_SENDERS",
];

/// derive the object type specific facets of a resolved object
///
/// The facets are recomputed from the attributes on every call.
///
/// # Errors
///
/// - [`OilError::UnclassifiedResourceProperty`] / [`OilError::UnclassifiedMessageProperty`] for an unknown property
/// - [`OilError::AttributeNotFound`] if a RESOURCE or MESSAGE lacks its property
pub fn classify(definition: &mut ObjectDefinition) -> Result<(), OilError> {
    definition.task_type = None;
    definition.has_resources = false;
    definition.has_events = false;
    definition.has_autostarts = false;
    definition.resource_property = None;
    definition.message_direction = None;

    match definition.object_type {
        ObjectType::Task => {
            // presence means "declared"; a default AUTOSTART = FALSE does not count
            definition.has_events = definition.is_declared(attr::EVENT);
            definition.has_resources = definition.is_declared(attr::RESOURCE);
            definition.has_autostarts = definition.is_declared(attr::AUTOSTART);
            definition.task_type = Some(if definition.has_events {
                TaskType::Extended
            } else {
                TaskType::Basic
            });
        }
        ObjectType::Alarm => {
            definition.has_autostarts = definition.is_declared(attr::AUTOSTART);
        }
        ObjectType::Resource => {
            definition.resource_property = Some(resource_property(definition)?);
        }
        ObjectType::Message => {
            definition.message_direction = Some(message_direction(definition)?);
        }
        _ => {}
    }

    Ok(())
}

fn resource_property(definition: &ObjectDefinition) -> Result<ResourceProperty, OilError> {
    let property = definition.ident(attr::RESOURCEPROPERTY)?;
    match property {
        "STANDARD" => Ok(ResourceProperty::Standard),
        "INTERNAL" => Ok(ResourceProperty::Internal),
        "LINKED" => Ok(ResourceProperty::Linked),
        _ => Err(OilError::UnclassifiedResourceProperty {
            name: definition.name.clone(),
            value: property.to_string(),
        }),
    }
}

fn message_direction(definition: &ObjectDefinition) -> Result<MessageDirection, OilError> {
    let property = definition.ident(attr::MESSAGEPROPERTY)?;
    if property.contains("INTERNAL") {
        Ok(MessageDirection::Internal)
    } else if EXTERNAL_MESSAGE_PROPERTIES.contains(&property) {
        Ok(MessageDirection::External)
    } else {
        Err(OilError::UnclassifiedMessageProperty {
            name: definition.name.clone(),
            value: property.to_string(),
        })
    }
}
