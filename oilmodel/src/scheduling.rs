//! Static scheduling analysis: task flags, priority levels, ceiling priorities, alarm positions and autostarts
//!
//! The analysis runs once, after the registry is complete, because it reads across
//! object types. The absolute task priorities are assigned before the resource ceiling
//! priorities are computed from them.

use crate::OilError;
use crate::definition::{ObjectDefinition, TaskType};
use crate::diagnostics::Diagnostics;
use crate::registry::Registry;
use crate::schema::{ObjectType, attr};
use bitflags::bitflags;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

bitflags! {
    /// Attribute flags of a task, as used by the generated task control blocks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TaskFlags: u8 {
        const EXTENDED = 0x01;
        const FULLPREEMPT = 0x02;
    }
}

impl TaskFlags {
    /// the explicit "no flags" marker
    pub const NONE: Self = Self::empty();
}

impl Display for TaskFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("OS_TASK_ATTR_NONE");
        }
        let mut separator = "";
        for (name, _) in self.iter_names() {
            write!(f, "{separator}OS_TASK_ATTR_{name}")?;
            separator = " | ";
        }
        Ok(())
    }
}

/// The OSEK conformance class required by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceClass {
    Bcc1,
    Bcc2,
    Ecc1,
    Ecc2,
}

/// All tasks that share one declared priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityLevel {
    pub declared_priority: u64,
    /// dense rank of the level, starting at 1 for the lowest declared priority
    pub absolute_priority: u32,
    /// sum of the ACTIVATION values of all tasks on this level
    pub total_activations: u64,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSummary {
    pub number_of_preemptive_tasks: usize,
    pub number_of_non_preemptive_tasks: usize,
    pub number_of_distinct_priorities: usize,
    /// ordered by ascending declared priority
    pub priority_levels: Vec<PriorityLevel>,
    pub conformance_class: ConformanceClass,
    pub autostarted_tasks: Vec<String>,
    pub autostarted_alarms: Vec<String>,
}

impl ApplicationSummary {
    /// the level of a declared priority
    #[must_use]
    pub fn level(&self, declared_priority: u64) -> Option<&PriorityLevel> {
        self.priority_levels
            .iter()
            .find(|level| level.declared_priority == declared_priority)
    }
}

/// run the scheduling analysis on a complete registry
///
/// References from tasks to undeclared resources are reported as
/// [`OilError::UndefinedResourceReference`], once per task and resource name, and do
/// not stop the analysis.
///
/// # Errors
///
/// [`OilError::AttributeNotFound`] or [`OilError::InvalidAttributeValue`] if a task lacks a
/// usable PRIORITY or SCHEDULE, or a TASK / ALARM has an unusable AUTOSTART.
pub fn analyze(registry: &mut Registry, diagnostics: &mut Diagnostics) -> Result<ApplicationSummary, OilError> {
    set_task_flags(registry)?;
    let (levels, preemptive, non_preemptive) = calculate_priorities(registry)?;
    calculate_ceiling_priorities(registry, diagnostics)?;
    assign_alarm_positions(registry)?;
    let autostarted_tasks = autostarted_objects(registry, ObjectType::Task)?;
    let autostarted_alarms = autostarted_objects(registry, ObjectType::Alarm)?;
    let conformance_class = conformance_class(registry, &levels)?;

    log::debug!(
        "{} priority levels, {preemptive} preemptive and {non_preemptive} non-preemptive tasks, conformance class {conformance_class:?}",
        levels.len()
    );

    Ok(ApplicationSummary {
        number_of_preemptive_tasks: preemptive,
        number_of_non_preemptive_tasks: non_preemptive,
        number_of_distinct_priorities: levels.len(),
        priority_levels: levels,
        conformance_class,
        autostarted_tasks,
        autostarted_alarms,
    })
}

fn is_full_preemptive(schedule: &str) -> bool {
    schedule == "FULL"
}

fn set_task_flags(registry: &mut Registry) -> Result<(), OilError> {
    for task in registry.get_mut(ObjectType::Task)? {
        let mut flags = TaskFlags::NONE;
        if task.is_declared(attr::EVENT) {
            flags |= TaskFlags::EXTENDED;
        }
        if is_full_preemptive(task.ident(attr::SCHEDULE)?) {
            flags |= TaskFlags::FULLPREEMPT;
        }
        task.flags = flags;
    }
    Ok(())
}

// returns the levels and the numbers of preemptive and non-preemptive tasks
fn calculate_priorities(registry: &mut Registry) -> Result<(Vec<PriorityLevel>, usize, usize), OilError> {
    let tasks = registry.get_mut(ObjectType::Task)?;
    let mut preemptive = 0;
    let mut non_preemptive = 0;
    // declared priority -> task indices; the BTreeMap keeps the levels sorted
    let mut groups = BTreeMap::<u64, Vec<usize>>::new();

    for (idx, task) in tasks.iter().enumerate() {
        if is_full_preemptive(task.ident(attr::SCHEDULE)?) {
            preemptive += 1;
        } else {
            non_preemptive += 1;
        }
        groups.entry(task.uint(attr::PRIORITY)?).or_default().push(idx);
    }

    let mut levels = Vec::with_capacity(groups.len());
    let mut absolute_priority = 0;
    for (declared_priority, members) in groups {
        absolute_priority += 1;
        let mut total_activations: u64 = 0;
        let mut names = Vec::with_capacity(members.len());
        for idx in members {
            let task = &mut tasks[idx];
            total_activations = total_activations
                .checked_add(activations(task)?)
                .ok_or_else(|| task.invalid_value(attr::ACTIVATION, "an activation total within UINT64"))?;
            task.absolute_priority = Some(absolute_priority);
            names.push(task.name.clone());
        }
        levels.push(PriorityLevel {
            declared_priority,
            absolute_priority,
            total_activations,
            tasks: names,
        });
    }

    Ok((levels, preemptive, non_preemptive))
}

fn activations(task: &ObjectDefinition) -> Result<u64, OilError> {
    if task.contains(attr::ACTIVATION) {
        task.uint(attr::ACTIVATION)
    } else {
        Ok(1)
    }
}

fn calculate_ceiling_priorities(registry: &mut Registry, diagnostics: &mut Diagnostics) -> Result<(), OilError> {
    // (task name, absolute priority, referenced resource names)
    let mut usage = Vec::new();
    for task in registry.get(ObjectType::Task)? {
        if !task.contains(attr::RESOURCE) {
            continue;
        }
        let resources: Vec<String> = task
            .values(attr::RESOURCE)?
            .iter()
            .filter_map(|value| value.as_ident().map(ToString::to_string))
            .collect();
        usage.push((task.name.clone(), task.absolute_priority.unwrap_or(0), resources));
    }

    let resources = registry.get_mut(ObjectType::Resource)?;
    for resource in resources.iter_mut() {
        resource.relative_ceiling_priority = 0;
    }

    let mut reported = HashSet::new();
    for (task_name, priority, resource_names) in usage {
        for resource_name in resource_names {
            if let Some(resource) = resources.get_mut(&resource_name) {
                resource.relative_ceiling_priority = resource.relative_ceiling_priority.max(priority);
            } else if reported.insert((task_name.clone(), resource_name.clone())) {
                diagnostics.error(OilError::UndefinedResourceReference {
                    task: task_name.clone(),
                    resource: resource_name,
                });
            }
        }
    }

    Ok(())
}

fn assign_alarm_positions(registry: &mut Registry) -> Result<(), OilError> {
    for (position, alarm) in registry.get_mut(ObjectType::Alarm)?.iter_mut().enumerate() {
        alarm.position = Some(position);
    }
    Ok(())
}

fn autostarted_objects(registry: &Registry, object_type: ObjectType) -> Result<Vec<String>, OilError> {
    let mut result = Vec::new();
    for object in registry.get(object_type)? {
        if object.has_autostarts && object.value(attr::AUTOSTART)?.is_true() {
            result.push(object.name.clone());
        }
    }
    Ok(result)
}

fn conformance_class(registry: &Registry, levels: &[PriorityLevel]) -> Result<ConformanceClass, OilError> {
    let tasks = registry.get(ObjectType::Task)?;
    let extended = tasks
        .iter()
        .any(|task| task.task_type == Some(TaskType::Extended));
    let mut multiple = levels.iter().any(|level| level.tasks.len() > 1);
    for task in tasks {
        if activations(task)? > 1 {
            multiple = true;
        }
    }
    Ok(match (extended, multiple) {
        (false, false) => ConformanceClass::Bcc1,
        (false, true) => ConformanceClass::Bcc2,
        (true, false) => ConformanceClass::Ecc1,
        (true, true) => ConformanceClass::Ecc2,
    })
}
