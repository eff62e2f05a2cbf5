//! Assignment of `AUTO` values
//!
//! The resolver only collects the attributes whose value is `AUTO`. The values are
//! assigned here, in a second pass over the complete registry, so that an assigner can
//! look at all other objects.

use crate::OilError;
use crate::classifier::classify;
use crate::definition::ObjectDefinition;
use crate::diagnostics::Diagnostics;
use crate::registry::Registry;
use crate::resolver::AutoRef;
use crate::schema::{ObjectType, Schema, attr};
use crate::value::{AttributeValue, Literal};

/// Supplies values for attributes that were declared as `AUTO`
pub trait AutoAssign {
    /// return the value for the attribute, or None to leave it as `AUTO`
    fn assign(&mut self, auto: &AutoRef, definition: &ObjectDefinition) -> Option<Literal>;
}

impl<F> AutoAssign for F
where
    F: FnMut(&AutoRef, &ObjectDefinition) -> Option<Literal>,
{
    fn assign(&mut self, auto: &AutoRef, definition: &ObjectDefinition) -> Option<Literal> {
        self(auto, definition)
    }
}

/// An assigner that never assigns anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAutoAssign;

impl AutoAssign for NoAutoAssign {
    fn assign(&mut self, _auto: &AutoRef, _definition: &ObjectDefinition) -> Option<Literal> {
        None
    }
}

/// assign values to all entries of the `AUTO` worklist of the registry
///
/// An assigned literal is converted with the data type of the attribute and replaces
/// every `AUTO` value of the attribute. The object is classified again afterwards.
/// Entries without an assignment are reported as [`OilError::UnresolvedAuto`] warnings and
/// stay on the worklist.
///
/// # Errors
///
/// [`OilError::InvalidAttributeValue`] if an assigned literal does not fit the attribute,
/// or any classification error of the updated object.
pub fn resolve_auto(
    registry: &mut Registry,
    schema: &Schema,
    assigner: &mut dyn AutoAssign,
    diagnostics: &mut Diagnostics,
) -> Result<(), OilError> {
    let mut unresolved = Vec::new();

    for auto in registry.take_auto_worklist() {
        let Some(definition) = registry.definition(auto.object_type, &auto.name) else {
            continue;
        };
        let Some(attribute) = schema.attribute(auto.object_type, &auto.attribute) else {
            continue;
        };

        let value = match assigner.assign(&auto, definition) {
            Some(literal) => Some(
                attribute
                    .data_type
                    .convert(&literal)
                    .ok_or_else(|| definition.invalid_value(&auto.attribute, &attribute.data_type.to_string()))?,
            ),
            None => None,
        };
        let Some(value) = value.filter(|value| !value.is_auto()) else {
            diagnostics.warning(OilError::UnresolvedAuto {
                object_type: auto.object_type.to_string(),
                name: auto.name.clone(),
                attribute: auto.attribute.clone(),
            });
            unresolved.push(auto);
            continue;
        };

        if let Some(definition) = registry.definition_mut(auto.object_type, &auto.name) {
            if let Some(slot) = definition.attributes.get_mut(&auto.attribute) {
                for current in slot.slot.values_mut() {
                    if current.is_auto() {
                        current.clone_from(&value);
                    }
                }
            }
            classify(definition)?;
            log::debug!(
                "assigned {} {}.{} = {value}",
                auto.object_type,
                auto.name,
                auto.attribute
            );
        }
    }

    registry.set_auto_worklist(unresolved);
    Ok(())
}

// the highest mask bit that an integer literal can carry
const MAX_MASK_BIT: u32 = i64::BITS - 2;

/// an assigner that gives every `AUTO` EVENT mask its own bit, in declaration order
///
/// Bits that are already used by explicit masks are skipped. Bit 63 is never assigned;
/// masks that find no free bit stay `AUTO`.
#[must_use]
pub fn event_mask_assigner(registry: &Registry) -> impl AutoAssign + use<> {
    let mut used: u64 = registry
        .get(ObjectType::Event)
        .map(|events| {
            events
                .iter()
                .filter_map(|event| match event.value(attr::MASK) {
                    Ok(AttributeValue::Uint(mask)) => Some(*mask),
                    _ => None,
                })
                .fold(0, |acc, mask| acc | mask)
        })
        .unwrap_or(0);

    move |auto: &AutoRef, _definition: &ObjectDefinition| {
        if auto.object_type != ObjectType::Event || auto.attribute != attr::MASK {
            return None;
        }
        let bit = (!used).trailing_zeros();
        if bit > MAX_MASK_BIT {
            return None;
        }
        used |= 1 << bit;
        Some(Literal::Int(1_i64 << bit))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::declaration::Declaration;
    use crate::diagnostics::Severity;

    fn event(name: &str, mask: Literal) -> Declaration {
        Declaration::new(ObjectType::Event, name).with("MASK", mask)
    }

    fn mask(registry: &Registry, name: &str) -> AttributeValue {
        registry
            .definition(ObjectType::Event, name)
            .unwrap()
            .value("MASK")
            .unwrap()
            .clone()
    }

    #[test]
    fn event_masks() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let mut registry = Registry::build(
            &[
                event("ev_a", Literal::Auto),
                event("ev_b", Literal::Int(2)),
                event("ev_c", Literal::ident("AUTO")),
            ],
            &schema,
            &mut diag,
        )
        .unwrap();
        assert_eq!(registry.auto_worklist().len(), 2);

        let mut assigner = event_mask_assigner(&registry);
        resolve_auto(&mut registry, &schema, &mut assigner, &mut diag).unwrap();
        assert!(registry.auto_worklist().is_empty());
        assert_eq!(mask(&registry, "ev_a"), AttributeValue::Uint(1));
        assert_eq!(mask(&registry, "ev_b"), AttributeValue::Uint(2));
        assert_eq!(mask(&registry, "ev_c"), AttributeValue::Uint(4));
        assert_eq!(diag.count(Severity::Warning), 0);
    }

    #[test]
    fn event_masks_run_out_of_bits() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let declarations: Vec<Declaration> = (0..64).map(|idx| event(&format!("ev{idx}"), Literal::Auto)).collect();
        let mut registry = Registry::build(&declarations, &schema, &mut diag).unwrap();

        let mut assigner = event_mask_assigner(&registry);
        resolve_auto(&mut registry, &schema, &mut assigner, &mut diag).unwrap();
        assert_eq!(mask(&registry, "ev0"), AttributeValue::Uint(1));
        assert_eq!(mask(&registry, "ev62"), AttributeValue::Uint(1 << 62));
        // no literal can hold bit 63
        assert_eq!(mask(&registry, "ev63"), AttributeValue::Auto);
        assert_eq!(registry.auto_worklist().len(), 1);
        assert_eq!(registry.auto_worklist()[0].name, "ev63");
        assert_eq!(diag.count(Severity::Warning), 1);
        assert_eq!(diag.count(Severity::Fatal), 0);
    }

    #[test]
    fn unresolved_stays_on_worklist() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let mut registry = Registry::build(&[event("ev", Literal::Auto)], &schema, &mut diag).unwrap();
        resolve_auto(&mut registry, &schema, &mut NoAutoAssign, &mut diag).unwrap();
        assert_eq!(registry.auto_worklist().len(), 1);
        assert_eq!(mask(&registry, "ev"), AttributeValue::Auto);
        assert_eq!(diag.count(Severity::Warning), 1);
        assert!(diag.may_generate());
    }

    #[test]
    fn assigned_value_is_validated() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let mut registry = Registry::build(&[event("ev", Literal::Auto)], &schema, &mut diag).unwrap();
        let mut assigner =
            |_: &AutoRef, _: &ObjectDefinition| Some(Literal::Str("not a mask".to_string()));
        let result = resolve_auto(&mut registry, &schema, &mut assigner, &mut diag);
        assert!(matches!(result, Err(OilError::InvalidAttributeValue { .. })));
    }

    #[test]
    fn list_values_are_replaced() {
        let schema = Schema::osek();
        let mut diag = Diagnostics::new();
        let mut registry = Registry::build(
            &[Declaration::new(ObjectType::Task, "t")
                .with("PRIORITY", Literal::Int(1))
                .with("SCHEDULE", Literal::ident("FULL"))
                .with("RESOURCE", Literal::ident("r1"))
                .with("RESOURCE", Literal::Auto)],
            &schema,
            &mut diag,
        )
        .unwrap();
        let mut assigner = |auto: &AutoRef, definition: &ObjectDefinition| {
            assert_eq!(auto.attribute, "RESOURCE");
            assert!(definition.has_resources);
            Some(Literal::ident("RES_SCHEDULER"))
        };
        resolve_auto(&mut registry, &schema, &mut assigner, &mut diag).unwrap();
        let task = registry.definition(ObjectType::Task, "t").unwrap();
        assert_eq!(
            task.values("RESOURCE").unwrap(),
            &[
                AttributeValue::Ref("r1".to_string()),
                AttributeValue::Ref("RES_SCHEDULER".to_string())
            ]
        );
    }
}
