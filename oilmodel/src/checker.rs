use crate::OilError;
use crate::definition::ObjectDefinition;
use crate::registry::Registry;
use crate::schema::{DataType, ObjectType, Schema};

// check the references between objects
pub(crate) fn check(registry: &Registry, schema: &Schema) -> Vec<OilError> {
    let mut results = Vec::new();

    for definition in registry.iter() {
        check_references(definition, registry, schema, &mut results);
    }

    results
}

fn check_references(
    definition: &ObjectDefinition,
    registry: &Registry,
    schema: &Schema,
    log_msgs: &mut Vec<OilError>,
) {
    for attribute in definition.attributes() {
        let Some(DataType::Reference(target_type)) = schema
            .attribute(definition.object_type, &attribute.name)
            .map(|attrdef| &attrdef.data_type)
        else {
            continue;
        };
        // undefined resources of tasks are reported by the scheduling analysis
        if definition.object_type == ObjectType::Task && *target_type == ObjectType::Resource {
            continue;
        }

        for value in attribute.slot.values() {
            if value.is_auto() {
                continue;
            }
            if let Some(target_name) = value.as_ident() {
                if registry.definition(*target_type, target_name).is_none() {
                    log_msgs.push(OilError::CrossReferenceError {
                        source_type: definition.object_type.to_string(),
                        source_name: definition.name.clone(),
                        source_line: definition.line,
                        target_type: target_type.to_string(),
                        target_name: target_name.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::declaration::Declaration;
    use crate::diagnostics::Diagnostics;
    use crate::value::Literal;

    fn alarm(name: &str, counter: &str) -> Declaration {
        Declaration::new(ObjectType::Alarm, name)
            .with("COUNTER", Literal::ident(counter))
            .with("ACTION", Literal::ident("ACTIVATETASK"))
            .at_line(20)
    }

    fn counter(name: &str) -> Declaration {
        Declaration::new(ObjectType::Counter, name)
            .with("MAXALLOWEDVALUE", Literal::Int(65535))
            .with("TICKSPERBASE", Literal::Int(1))
            .with("MINCYCLE", Literal::Int(1))
    }

    #[test]
    fn check_alarm_counter() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let registry = Registry::build(
            &[counter("sys_counter"), alarm("a_ok", "sys_counter"), alarm("a_bad", "no_counter")],
            &schema,
            &mut diag,
        )
        .unwrap();

        let results = check(&registry, &schema);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0],
            OilError::CrossReferenceError {
                source_type: "ALARM".to_string(),
                source_name: "a_bad".to_string(),
                source_line: 20,
                target_type: "COUNTER".to_string(),
                target_name: "no_counter".to_string(),
            }
        );
    }

    #[test]
    fn check_lists_and_skips() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let registry = Registry::build(
            &[
                Declaration::new(ObjectType::Event, "ev1").with("MASK", Literal::Int(1)),
                Declaration::new(ObjectType::Task, "t1")
                    .with("PRIORITY", Literal::Int(1))
                    .with("SCHEDULE", Literal::ident("FULL"))
                    .with("EVENT", Literal::ident("ev1"))
                    .with("EVENT", Literal::ident("ev2"))
                    .with("EVENT", Literal::Auto)
                    .with("RESOURCE", Literal::ident("missing_resource")),
            ],
            &schema,
            &mut diag,
        )
        .unwrap();

        let results = check(&registry, &schema);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            &results[0],
            OilError::CrossReferenceError { target_type, target_name, .. }
                if target_type == "EVENT" && target_name == "ev2"
        ));
    }
}
