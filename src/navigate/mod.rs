//! Walking property paths on live reflected values and assigning at the leaf.


use std::sync::Arc;

use bevy::log::warn;
use bevy::reflect::{PartialReflect, ReflectFromReflect, ReflectMut, TypeInfo, TypeRegistry};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::coerce::{parse_color, parse_padded_vec4, shape_of, Coercer};
use crate::error::{CoercionError, MutationError};
use crate::model::{ReflectSlotCarrier, SlotValue};
use crate::path::{self, PathStep};
use crate::registry::{MemberInfo, MemberKind, MemberTable, ReflectAccessors, TypeResolver};
use crate::suggest::Suggester;

pub type MutationOutcome = Result<(), MutationError>;

/// One path of a batch that could not be applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyFailure {
    pub path: String,
    pub reason: String,
    /// Shape of the value that was offered (`number`, `array`, ...).
    pub value_kind: &'static str,
    pub suggestions: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub applied_count: usize,
    pub failures: Vec<PropertyFailure>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Navigator<'a> {
    registry: &'a TypeRegistry,
    resolver: &'a TypeResolver,
    suggester: &'a Suggester,
    coercer: Coercer<'a>,
    slot_prefix: &'a str,
}

impl<'a> Navigator<'a> {
    pub fn new(
        coercer: Coercer<'a>,
        resolver: &'a TypeResolver,
        suggester: &'a Suggester,
        slot_prefix: &'a str,
    ) -> Self {
        Self {
            registry: coercer.registry(),
            resolver,
            suggester,
            coercer,
            slot_prefix,
        }
    }

    /// Applies every `path -> value` pair, collecting failures instead of stopping.
    pub fn apply_properties(
        &self,
        root: &mut dyn PartialReflect,
        properties: &Map<String, Value>,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        for (path, value) in properties {
            match self.apply_path(root, path, value) {
                Ok(()) => report.applied_count += 1,
                Err(err) => {
                    warn!("[Axiom inspect] Failed to set '{path}': {err}");
                    report.failures.push(PropertyFailure {
                        path: path.clone(),
                        reason: err.to_string(),
                        value_kind: shape_of(value),
                        suggestions: err.suggestions().to_vec(),
                    });
                }
            }
        }
        report
    }

    pub fn apply_path(&self, root: &mut dyn PartialReflect, path: &str, value: &Value) -> MutationOutcome {
        let steps = path::parse(path);
        if steps.is_empty() || steps.iter().any(|step| step.member.trim().is_empty()) {
            return Err(MutationError::InvalidPath {
                path: path.to_string(),
            });
        }
        self.walk(root, &steps, value)
    }

    fn walk(&self, current: &mut dyn PartialReflect, steps: &[PathStep], value: &Value) -> MutationOutcome {
        let Some((step, rest)) = steps.split_first() else {
            return Ok(());
        };
        let leaf = rest.is_empty();
        if leaf && self.assign_slot(current, step, value)? {
            return Ok(());
        }

        let (info, table) = self.table_of(current)?;
        let member = self.writable_member(&table, &step.member)?;
        let name = member.name;
        match member.kind {
            MemberKind::Property => {
                let accessor = self
                    .registry
                    .get_type_data::<ReflectAccessors>(info.type_id())
                    .and_then(|accessors| accessors.get(name))
                    .ok_or_else(|| self.not_found(&table, &step.member))?;
                let mut copy = accessor
                    .get(&*current)
                    .ok_or_else(|| MutationError::NullIntermediate {
                        member: name.to_string(),
                    })?;
                let target = self.descend(&mut *copy, step, leaf)?;
                if leaf {
                    self.assign(target, name, value)?;
                } else {
                    self.walk(target, rest, value)?;
                }
                accessor
                    .set(current, &*copy)
                    .map_err(|message| MutationError::Assignment {
                        member: name.to_string(),
                        message,
                    })
            }
            MemberKind::Field => {
                let child = field_mut(current, name).ok_or_else(|| self.not_found(&table, &step.member))?;
                let target = self.descend(child, step, leaf)?;
                if leaf {
                    self.assign(target, name, value)
                } else {
                    self.walk(target, rest, value)
                }
            }
        }
    }

    /// Steps from a member's value to what the path continues on: unwraps
    /// options around intermediates and applies the step's index.
    fn descend<'v>(
        &self,
        value: &'v mut dyn PartialReflect,
        step: &PathStep,
        leaf: bool,
    ) -> Result<&'v mut dyn PartialReflect, MutationError> {
        let member = step.member.as_str();
        let Some(index) = step.index else {
            return if leaf { Ok(value) } else { deref_option(value, member) };
        };
        let collection = deref_option(value, member)?;
        let element = index_into(collection, member, index)?;
        if leaf {
            Ok(element)
        } else {
            deref_option(element, member)
        }
    }

    fn assign(&self, target: &mut dyn PartialReflect, member: &str, value: &Value) -> MutationOutcome {
        let info = target
            .get_represented_type_info()
            .ok_or_else(|| MutationError::Assignment {
                member: member.to_string(),
                message: format!("{} is not a reflected type", target.reflect_type_path()),
            })?;
        let coerced = self
            .coercer
            .coerce(value, info)
            .map_err(|source| MutationError::Conversion {
                member: member.to_string(),
                source,
            })?;
        write(self.registry, target, &*coerced, info, member)
    }

    /// Assigns `_Name` style slots on carriers. Returns false when the step is
    /// not a slot so normal member lookup proceeds.
    fn assign_slot(&self, current: &mut dyn PartialReflect, step: &PathStep, value: &Value) -> Result<bool, MutationError> {
        if self.slot_prefix.is_empty()
            || step.index.is_some()
            || !step.member.starts_with(self.slot_prefix)
        {
            return Ok(false);
        }
        let Some(data) = current
            .get_represented_type_info()
            .and_then(|info| self.registry.get_type_data::<ReflectSlotCarrier>(info.type_id()))
        else {
            return Ok(false);
        };
        let Some(carrier) = current
            .try_as_reflect_mut()
            .and_then(|reflect| data.get_mut(reflect))
        else {
            return Ok(false);
        };
        let slot = slot_value(value).ok_or_else(|| MutationError::Conversion {
            member: step.member.clone(),
            source: CoercionError::Shape {
                expected: "a color, vector, number, bool or texture reference",
                found: shape_of(value),
            },
        })?;
        carrier.set_slot(&step.member, slot);
        Ok(true)
    }

    fn table_of(&self, current: &dyn PartialReflect) -> Result<(&'static TypeInfo, Arc<MemberTable>), MutationError> {
        match current.get_represented_type_info() {
            Some(info) => Ok((info, self.resolver.members_of(self.registry, info))),
            None => Err(MutationError::Assignment {
                member: String::new(),
                message: format!("{} is not a reflected type", current.reflect_type_path()),
            }),
        }
    }

    fn writable_member<'t>(&self, table: &'t MemberTable, name: &str) -> Result<&'t MemberInfo, MutationError> {
        if let Some(member) = table.lookup_writable(name) {
            return Ok(member);
        }
        match table.lookup(name) {
            Some(member) => Err(MutationError::NotWritable {
                member: member.name.to_string(),
                type_path: table.type_path().to_string(),
            }),
            None => Err(self.not_found(table, name)),
        }
    }

    fn not_found(&self, table: &MemberTable, name: &str) -> MutationError {
        MutationError::MemberNotFound {
            member: name.to_string(),
            type_path: table.type_path().to_string(),
            suggestions: self.suggester.suggest(name, &table.writable_names()),
            available: table.available(),
        }
    }
}

fn field_mut<'v>(value: &'v mut dyn PartialReflect, name: &str) -> Option<&'v mut dyn PartialReflect> {
    match value.reflect_mut() {
        ReflectMut::Struct(s) => s.field_mut(name),
        ReflectMut::TupleStruct(t) => name.parse::<usize>().ok().and_then(|i| t.field_mut(i)),
        _ => None,
    }
}

fn is_option(value: &dyn PartialReflect) -> bool {
    value
        .get_represented_type_info()
        .is_some_and(|info| info.type_path().starts_with("core::option::Option<"))
}

fn deref_option<'v>(value: &'v mut dyn PartialReflect, member: &str) -> Result<&'v mut dyn PartialReflect, MutationError> {
    if !is_option(value) {
        return Ok(value);
    }
    let null = || MutationError::NullIntermediate {
        member: member.to_string(),
    };
    match value.reflect_mut() {
        ReflectMut::Enum(option) if option.variant_name() == "Some" => {
            option.field_at_mut(0).ok_or_else(null)
        }
        _ => Err(null()),
    }
}

fn index_into<'v>(
    value: &'v mut dyn PartialReflect,
    member: &str,
    index: usize,
) -> Result<&'v mut dyn PartialReflect, MutationError> {
    let out_of_range = |len| MutationError::IndexOutOfRange {
        member: member.to_string(),
        index,
        len,
    };
    match value.reflect_mut() {
        ReflectMut::List(list) => {
            let len = list.len();
            list.get_mut(index).ok_or_else(|| out_of_range(len))
        }
        ReflectMut::Array(array) => {
            let len = array.len();
            array.get_mut(index).ok_or_else(|| out_of_range(len))
        }
        _ => Err(MutationError::NotIndexable {
            member: member.to_string(),
        }),
    }
}

/// Overwrites `target` with `value`, replacing it wholesale when the type can
/// be rebuilt from reflection.
fn write(
    registry: &TypeRegistry,
    target: &mut dyn PartialReflect,
    value: &dyn PartialReflect,
    info: &'static TypeInfo,
    member: &str,
) -> MutationOutcome {
    let failed = |message: String| MutationError::Assignment {
        member: member.to_string(),
        message,
    };
    if let Some(from_reflect) = registry.get_type_data::<ReflectFromReflect>(info.type_id()) {
        if let Some(concrete) = from_reflect.from_reflect(value) {
            if let Some(target) = target.try_as_reflect_mut() {
                return target
                    .set(concrete)
                    .map_err(|_| failed(format!("value is not a {}", info.type_path())));
            }
        }
    }
    // Stage on a copy so a mismatch deep in the value leaves the target untouched.
    let mut staged = target.clone_value();
    staged
        .try_apply(value)
        .map_err(|err| failed(err.to_string()))?;
    target
        .try_apply(&*staged)
        .map_err(|err| failed(err.to_string()))
}

/// Slot shapes in priority order: color, vector, float, bool, texture.
fn slot_value(value: &Value) -> Option<SlotValue> {
    if let Ok(color) = parse_color(value) {
        return Some(SlotValue::Color(color));
    }
    if let Some(vector) = parse_padded_vec4(value) {
        return Some(SlotValue::Vector(vector));
    }
    match value {
        Value::Number(n) => n.as_f64().map(|f| SlotValue::Float(f as f32)),
        Value::Bool(b) => Some(SlotValue::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => Some(SlotValue::Texture(s.clone())),
        Value::Object(map) => map
            .get("find")
            .and_then(Value::as_str)
            .map(|reference| SlotValue::Texture(reference.to_string())),
        _ => None,
    }
}
