use crate::OilError;
use crate::classifier::classify;
use crate::declaration::Declaration;
use crate::definition::{MessageDirection, ObjectDefinition, Origin, ResourceProperty};
use crate::diagnostics::Diagnostics;
use crate::itemlist::ItemList;
use crate::resolver::{self, AutoRef};
use crate::schema::{ObjectType, Schema};
use crate::value::AttributeSlot;
use std::collections::BTreeMap;

/// names of the RESOURCEs, by property, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBuckets {
    pub standard: Vec<String>,
    pub internal: Vec<String>,
    pub linked: Vec<String>,
}

/// names of the MESSAGEs, by direction, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuckets {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

/// `Registry` holds all resolved and classified objects, grouped by object type
///
/// Within each object type the objects are kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    objects: BTreeMap<ObjectType, ItemList<ObjectDefinition>>,
    resources: ResourceBuckets,
    messages: MessageBuckets,
    auto: Vec<AutoRef>,
}

impl Registry {
    /// resolve and classify all declarations
    ///
    /// A second declaration of an existing object is only accepted if it is marked as
    /// `extend`; otherwise it is reported as [`OilError::DuplicateObjectDefinition`] and
    /// ignored. When extending, the values of a multi-valued attribute are appended to the
    /// earlier declared ones. A single-valued attribute that changes an earlier declared
    /// value is reported as [`OilError::ConflictingAttribute`], and the new value is used.
    /// Required attributes that are still missing once all declarations are processed are
    /// reported as [`OilError::MissingRequiredAttribute`].
    ///
    /// # Errors
    ///
    /// Any fatal error of the resolver or the classifier.
    pub fn build<'a, I>(declarations: I, schema: &Schema, diagnostics: &mut Diagnostics) -> Result<Self, OilError>
    where
        I: IntoIterator<Item = &'a Declaration>,
    {
        let mut registry = Self {
            objects: schema
                .object_types()
                .map(|object_type| (object_type, ItemList::new()))
                .collect(),
            resources: ResourceBuckets::default(),
            messages: MessageBuckets::default(),
            auto: Vec::new(),
        };

        for declaration in declarations {
            registry.insert(declaration, schema, diagnostics)?;
        }

        for definitions in registry.objects.values() {
            for definition in definitions {
                for attribute in resolver::missing_required(definition, schema) {
                    diagnostics.error(OilError::MissingRequiredAttribute {
                        object_type: definition.object_type.to_string(),
                        name: definition.name.clone(),
                        attribute,
                        line: definition.line,
                    });
                }
            }
        }
        registry.fill_buckets();

        Ok(registry)
    }

    fn insert(
        &mut self,
        declaration: &Declaration,
        schema: &Schema,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), OilError> {
        let resolved = resolver::resolve(declaration, schema)?;
        let definitions = self
            .objects
            .get_mut(&declaration.object_type)
            .ok_or_else(|| OilError::UnknownObjectType {
                object_type: declaration.object_type.to_string(),
            })?;

        let Some(existing) = definitions.get_mut(&declaration.name) else {
            let mut definition = ObjectDefinition::new(
                declaration.object_type,
                &declaration.name,
                declaration.description.as_deref(),
                declaration.line,
                resolved.attributes,
            );
            classify(&mut definition)?;
            log::debug!("resolved {} {}", definition.object_type, definition.name);
            definitions.push(definition);
            self.auto.extend(resolved.auto);
            return Ok(());
        };

        if !declaration.extend {
            diagnostics.error(OilError::DuplicateObjectDefinition {
                object_type: declaration.object_type.to_string(),
                name: declaration.name.clone(),
                line_1: existing.line,
                line_2: declaration.line,
            });
            return Ok(());
        }

        for attribute in resolved.attributes {
            if attribute.origin != Origin::Declared {
                continue;
            }
            if let Some(current) = existing.attributes.get_mut(&attribute.name) {
                if current.origin == Origin::Declared {
                    // declared lists are extended, e.g. more RESOURCEs for a TASK
                    if let (AttributeSlot::List(values), AttributeSlot::List(added)) =
                        (&mut current.slot, &attribute.slot)
                    {
                        values.extend(added.iter().cloned());
                        continue;
                    }
                    if current.slot != attribute.slot {
                        diagnostics.error(OilError::ConflictingAttribute {
                            object_type: declaration.object_type.to_string(),
                            name: declaration.name.clone(),
                            attribute: attribute.name.clone(),
                            line: declaration.line,
                        });
                    }
                }
                *current = attribute;
            } else {
                existing.attributes.push(attribute);
            }
        }
        if let Some(description) = &declaration.description {
            existing.description.clone_from(description);
        }
        classify(existing)?;
        log::debug!("extended {} {}", existing.object_type, existing.name);

        // the merge may have replaced or added AUTO values
        self.auto.retain(|auto| {
            auto.object_type != declaration.object_type || auto.name != declaration.name
        });
        self.auto.extend(collect_auto(existing));
        Ok(())
    }

    fn fill_buckets(&mut self) {
        self.resources = ResourceBuckets::default();
        self.messages = MessageBuckets::default();
        if let Some(resources) = self.objects.get(&ObjectType::Resource) {
            for resource in resources {
                let bucket = match resource.resource_property {
                    Some(ResourceProperty::Standard) => &mut self.resources.standard,
                    Some(ResourceProperty::Internal) => &mut self.resources.internal,
                    Some(ResourceProperty::Linked) => &mut self.resources.linked,
                    None => continue,
                };
                bucket.push(resource.name.clone());
            }
        }
        if let Some(messages) = self.objects.get(&ObjectType::Message) {
            for message in messages {
                let bucket = match message.message_direction {
                    Some(MessageDirection::Internal) => &mut self.messages.internal,
                    Some(MessageDirection::External) => &mut self.messages.external,
                    None => continue,
                };
                bucket.push(message.name.clone());
            }
        }
    }

    /// all objects of one type
    ///
    /// An object type that the schema knows but that has no declarations yields an empty list.
    ///
    /// # Errors
    ///
    /// [`OilError::UnknownObjectType`] if the schema does not describe the object type
    pub fn get(&self, object_type: ObjectType) -> Result<&ItemList<ObjectDefinition>, OilError> {
        self.objects
            .get(&object_type)
            .ok_or_else(|| OilError::UnknownObjectType {
                object_type: object_type.to_string(),
            })
    }

    /// mutable access to all objects of one type
    ///
    /// # Errors
    ///
    /// [`OilError::UnknownObjectType`] if the schema does not describe the object type
    pub fn get_mut(&mut self, object_type: ObjectType) -> Result<&mut ItemList<ObjectDefinition>, OilError> {
        self.objects
            .get_mut(&object_type)
            .ok_or_else(|| OilError::UnknownObjectType {
                object_type: object_type.to_string(),
            })
    }

    #[must_use]
    pub fn definition(&self, object_type: ObjectType, name: &str) -> Option<&ObjectDefinition> {
        self.objects.get(&object_type)?.get(name)
    }

    pub fn definition_mut(&mut self, object_type: ObjectType, name: &str) -> Option<&mut ObjectDefinition> {
        self.objects.get_mut(&object_type)?.get_mut(name)
    }

    /// iterate over all objects, ordered by object type and then by declaration
    pub fn iter(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.objects.values().flat_map(ItemList::iter)
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceBuckets {
        &self.resources
    }

    #[must_use]
    pub fn messages(&self) -> &MessageBuckets {
        &self.messages
    }

    /// the attributes that still need an automatically assigned value
    #[must_use]
    pub fn auto_worklist(&self) -> &[AutoRef] {
        &self.auto
    }

    pub(crate) fn take_auto_worklist(&mut self) -> Vec<AutoRef> {
        std::mem::take(&mut self.auto)
    }

    pub(crate) fn set_auto_worklist(&mut self, auto: Vec<AutoRef>) {
        self.auto = auto;
    }
}

fn collect_auto(definition: &ObjectDefinition) -> Vec<AutoRef> {
    definition
        .attributes
        .iter()
        .filter(|attribute| attribute.slot.contains_auto())
        .map(|attribute| AutoRef {
            object_type: definition.object_type,
            name: definition.name.clone(),
            attribute: attribute.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::value::{AttributeSlot, AttributeValue, Literal};

    fn task(name: &str, priority: i64) -> Declaration {
        Declaration::new(ObjectType::Task, name)
            .with("PRIORITY", Literal::Int(priority))
            .with("SCHEDULE", Literal::ident("FULL"))
    }

    fn resource(name: &str, property: &str) -> Declaration {
        Declaration::new(ObjectType::Resource, name).with("RESOURCEPROPERTY", Literal::ident(property))
    }

    #[test]
    fn build_keeps_declaration_order() {
        let declarations = vec![task("t_b", 1), task("t_a", 2), task("t_c", 3)];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        let tasks = registry.get(ObjectType::Task).unwrap();
        assert_eq!(tasks.names().collect::<Vec<_>>(), vec!["t_b", "t_a", "t_c"]);
        assert!(diag.may_generate());
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn empty_and_unknown_types() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&Vec::<Declaration>::new(), &schema, &mut diag).unwrap();
        assert!(registry.get(ObjectType::Alarm).unwrap().is_empty());

        let schema = Schema::new().with_object(ObjectType::AppMode);
        let registry = Registry::build(&Vec::<Declaration>::new(), &schema, &mut diag).unwrap();
        assert!(registry.get(ObjectType::AppMode).unwrap().is_empty());
        let result = registry.get(ObjectType::Task);
        assert!(matches!(result, Err(OilError::UnknownObjectType { .. })));
    }

    #[test]
    fn buckets() {
        let declarations = vec![
            resource("r_std", "STANDARD"),
            resource("r_int", "INTERNAL"),
            resource("r_std2", "STANDARD"),
            resource("r_lnk", "LINKED"),
            Declaration::new(ObjectType::Message, "m_in")
                .with("MESSAGEPROPERTY", Literal::ident("RECEIVE_UNQUEUED_INTERNAL")),
            Declaration::new(ObjectType::Message, "m_out")
                .with("MESSAGEPROPERTY", Literal::ident("SEND_STATIC_EXTERNAL")),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        assert_eq!(registry.resources().standard, vec!["r_std", "r_std2"]);
        assert_eq!(registry.resources().internal, vec!["r_int"]);
        assert_eq!(registry.resources().linked, vec!["r_lnk"]);
        assert_eq!(registry.messages().internal, vec!["m_in"]);
        assert_eq!(registry.messages().external, vec!["m_out"]);
    }

    #[test]
    fn classification_failure_is_fatal() {
        let declarations = vec![resource("r1", "STANDARD"), resource("r2", "GLOBAL")];
        let mut diag = Diagnostics::new();
        let result = Registry::build(&declarations, &Schema::osek(), &mut diag);
        assert!(matches!(
            result,
            Err(OilError::UnclassifiedResourceProperty { ref value, .. }) if value == "GLOBAL"
        ));
    }

    #[test]
    fn duplicate_is_rejected() {
        let declarations = vec![task("t1", 1).at_line(3), task("t1", 7).at_line(9)];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        let tasks = registry.get(ObjectType::Task).unwrap();
        assert_eq!(tasks.len(), 1);
        // the first definition wins
        assert_eq!(tasks[0].uint("PRIORITY").unwrap(), 1);
        assert_eq!(diag.count(Severity::Error), 1);
        assert!(matches!(
            diag.errors().next(),
            Some(OilError::DuplicateObjectDefinition {
                line_1: 3,
                line_2: 9,
                ..
            })
        ));
    }

    #[test]
    fn extend_merges() {
        let declarations = vec![
            Declaration::new(ObjectType::Task, "t1")
                .with("PRIORITY", Literal::Int(1))
                .with("SCHEDULE", Literal::ident("FULL")),
            Declaration::new(ObjectType::Task, "t1")
                .with("EVENT", Literal::ident("ev1"))
                .with_description("worker")
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        assert!(diag.may_generate());
        let t1 = registry.definition(ObjectType::Task, "t1").unwrap();
        assert_eq!(t1.uint("PRIORITY").unwrap(), 1);
        assert_eq!(t1.values("EVENT").unwrap().len(), 1);
        assert_eq!(t1.description, "worker");
        // re-classified after the merge
        assert!(t1.has_events);
    }

    #[test]
    fn extend_appends_lists() {
        let declarations = vec![
            task("t1", 1).with("RESOURCE", Literal::ident("r1")),
            Declaration::new(ObjectType::Task, "t1")
                .with("RESOURCE", Literal::ident("r2"))
                .with("RESOURCE", Literal::ident("r1"))
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        assert!(diag.may_generate());
        let t1 = registry.definition(ObjectType::Task, "t1").unwrap();
        assert_eq!(
            t1.values("RESOURCE").unwrap(),
            &[
                AttributeValue::Ref("r1".to_string()),
                AttributeValue::Ref("r2".to_string()),
                AttributeValue::Ref("r1".to_string())
            ]
        );
        assert!(t1.has_resources);
    }

    #[test]
    fn extend_with_conflict() {
        let declarations = vec![
            task("t1", 1),
            Declaration::new(ObjectType::Task, "t1")
                .with("PRIORITY", Literal::Int(4))
                .with("SCHEDULE", Literal::ident("FULL"))
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        // PRIORITY changed, SCHEDULE was repeated with the same value
        assert_eq!(diag.count(Severity::Error), 1);
        assert!(matches!(
            diag.errors().next(),
            Some(OilError::ConflictingAttribute { attribute, .. }) if attribute == "PRIORITY"
        ));
        let t1 = registry.definition(ObjectType::Task, "t1").unwrap();
        assert_eq!(t1.uint("PRIORITY").unwrap(), 4);
    }

    #[test]
    fn extend_overrides_default_silently() {
        let declarations = vec![
            task("t1", 1),
            Declaration::new(ObjectType::Task, "t1")
                .with("ACTIVATION", Literal::Int(3))
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        assert!(diag.may_generate());
        let t1 = registry.definition(ObjectType::Task, "t1").unwrap();
        assert_eq!(t1.uint("ACTIVATION").unwrap(), 3);
        assert!(t1.is_declared("ACTIVATION"));
    }

    #[test]
    fn missing_required_after_merge() {
        let declarations = vec![
            Declaration::new(ObjectType::Task, "t1").with("PRIORITY", Literal::Int(1)),
            Declaration::new(ObjectType::Task, "t2").with("PRIORITY", Literal::Int(1)),
            Declaration::new(ObjectType::Task, "t1")
                .with("SCHEDULE", Literal::ident("NON"))
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        // only t2 still lacks SCHEDULE
        let missing: Vec<&OilError> = diag.errors().collect();
        assert_eq!(missing.len(), 1);
        assert!(matches!(
            missing[0],
            OilError::MissingRequiredAttribute { name, attribute, .. } if name == "t2" && attribute == "SCHEDULE"
        ));
    }

    #[test]
    fn auto_worklist_follows_merges() {
        let declarations = vec![
            Declaration::new(ObjectType::Event, "ev1").with("MASK", Literal::Auto),
            Declaration::new(ObjectType::Event, "ev2").with("MASK", Literal::Auto),
            Declaration::new(ObjectType::Event, "ev1")
                .with("MASK", Literal::Int(4))
                .extending(),
        ];
        let mut diag = Diagnostics::new();
        let registry = Registry::build(&declarations, &Schema::osek(), &mut diag).unwrap();
        let names: Vec<&str> = registry
            .auto_worklist()
            .iter()
            .map(|auto| auto.name.as_str())
            .collect();
        assert_eq!(names, vec!["ev2"]);
        let ev1 = registry.definition(ObjectType::Event, "ev1").unwrap();
        assert_eq!(ev1.get("MASK").unwrap(), &AttributeSlot::Single(AttributeValue::Uint(4)));
    }
}
