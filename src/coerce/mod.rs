//! Turning untyped JSON values into reflected values of a target type.

mod composite;
#[cfg(test)]
mod tests;

use std::any::TypeId;

use bevy::log::warn;
use bevy::prelude::Entity;
use bevy::reflect::serde::TypedReflectDeserializer;
use bevy::reflect::std_traits::ReflectDefault;
use bevy::reflect::{
    DynamicEnum, DynamicTuple, DynamicVariant, PartialReflect, TypeInfo, TypeRegistry, VariantInfo,
};
use serde::de::DeserializeSeed;
use serde_json::Value;

pub use composite::{parse_color, parse_padded_vec4, Composite};

use crate::error::CoercionError;
use crate::locate::{EntityLocator, SearchMethod};
use crate::registry::TypeResolver;

/// Name of a JSON value's shape, used in error messages.
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `{"find": ..., "method": ..., "component": ...}`: how to reach a live entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindInstruction {
    pub reference: String,
    pub method: Option<String>,
    pub component: Option<String>,
}

impl FindInstruction {
    /// Objects carrying `find`, or a bare string or number used as the reference.
    pub fn from_value(value: &Value) -> Option<Self> {
        let reference = |v: &Value| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        match value {
            Value::Object(map) => Some(Self {
                reference: map.get("find").and_then(reference)?,
                method: map.get("method").and_then(Value::as_str).map(str::to_string),
                component: map
                    .get("component")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            other => reference(other).map(|reference| Self {
                reference,
                method: None,
                component: None,
            }),
        }
    }
}

pub struct Coercer<'a> {
    registry: &'a TypeRegistry,
    resolver: &'a TypeResolver,
    locator: Option<&'a dyn EntityLocator>,
    default_method: SearchMethod,
    include_inactive: bool,
}

impl<'a> Coercer<'a> {
    pub fn new(registry: &'a TypeRegistry, resolver: &'a TypeResolver) -> Self {
        Self {
            registry,
            resolver,
            locator: None,
            default_method: SearchMethod::default(),
            include_inactive: true,
        }
    }

    pub fn with_locator(mut self, locator: Option<&'a dyn EntityLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_search(mut self, default_method: SearchMethod, include_inactive: bool) -> Self {
        self.default_method = default_method;
        self.include_inactive = include_inactive;
        self
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn coerce(
        &self,
        value: &Value,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn PartialReflect>, CoercionError> {
        let type_id = target.type_id();
        let references_entity =
            type_id == TypeId::of::<Entity>() || type_id == TypeId::of::<Option<Entity>>();
        if references_entity && !value.is_null() {
            if let Some(instruction) = FindInstruction::from_value(value) {
                return match self.find(&instruction) {
                    Some(entity) if type_id == TypeId::of::<Entity>() => Ok(Box::new(entity)),
                    Some(entity) => Ok(Box::new(Some(entity))),
                    None => self.null_of(target),
                };
            }
        }

        if value.is_null() {
            return self.null_of(target);
        }

        if let Some(inner) = option_inner(self.registry, target) {
            let inner = self.coerce(value, inner)?;
            let mut tuple = DynamicTuple::default();
            tuple.insert_boxed(inner);
            let mut some = DynamicEnum::new("Some", DynamicVariant::Tuple(tuple));
            some.set_represented_type(Some(target));
            return Ok(Box::new(some));
        }

        if let Some(composite) = Composite::of(type_id) {
            return composite.parse(value);
        }

        self.structural(value, target)
    }

    /// The value null stands for: `None`, a placeholder entity, or the type's default.
    fn null_of(&self, target: &'static TypeInfo) -> Result<Box<dyn PartialReflect>, CoercionError> {
        if option_inner(self.registry, target).is_some() {
            let mut none = DynamicEnum::new("None", DynamicVariant::Unit);
            none.set_represented_type(Some(target));
            return Ok(Box::new(none));
        }
        if target.type_id() == TypeId::of::<Entity>() {
            warn!("[Axiom inspect] Null assigned to an entity reference, using a placeholder");
            return Ok(Box::new(Entity::PLACEHOLDER));
        }
        match self
            .registry
            .get_type_data::<ReflectDefault>(target.type_id())
        {
            Some(default) => {
                warn!(
                    "[Axiom inspect] Null assigned to {}, using its default value",
                    target.type_path()
                );
                Ok(default.default().into_partial_reflect())
            }
            None => Err(CoercionError::NoDefault {
                type_path: target.type_path().to_string(),
            }),
        }
    }

    fn find(&self, instruction: &FindInstruction) -> Option<Entity> {
        let Some(locator) = self.locator else {
            warn!(
                "[Axiom inspect] Cannot resolve '{}' without an entity locator",
                instruction.reference
            );
            return None;
        };
        let method = match instruction.method.as_deref() {
            None => self.default_method,
            Some(raw) => match raw.parse::<SearchMethod>() {
                Ok(method) => method,
                Err(err) => {
                    warn!("[Axiom inspect] {err}");
                    return None;
                }
            },
        };
        let Some(entity) = locator.locate(&instruction.reference, method, self.include_inactive)
        else {
            warn!(
                "[Axiom inspect] No entity matched '{}' ({method:?})",
                instruction.reference
            );
            return None;
        };
        let Some(component) = instruction.component.as_deref() else {
            return Some(entity);
        };
        match self.resolver.resolve(self.registry, component) {
            Ok(resolved) if locator.has_component(entity, resolved.type_id()) => Some(entity),
            Ok(resolved) => {
                warn!(
                    "[Axiom inspect] Entity {entity:?} found for '{}' has no {}",
                    instruction.reference,
                    resolved.type_path()
                );
                None
            }
            Err(err) => {
                warn!("[Axiom inspect] Ignoring component filter '{component}': {err}");
                Some(entity)
            }
        }
    }

    fn structural(
        &self,
        value: &Value,
        target: &'static TypeInfo,
    ) -> Result<Box<dyn PartialReflect>, CoercionError> {
        let registration =
            self.registry
                .get(target.type_id())
                .ok_or_else(|| CoercionError::Unregistered {
                    type_path: target.type_path().to_string(),
                })?;
        TypedReflectDeserializer::new(registration, self.registry)
            .deserialize(value)
            .map_err(|err| CoercionError::Structural {
                type_path: target.type_path().to_string(),
                found: shape_of(value),
                message: err.to_string(),
            })
    }
}

/// The payload type of an `Option<T>` target.
fn option_inner(registry: &TypeRegistry, target: &'static TypeInfo) -> Option<&'static TypeInfo> {
    let TypeInfo::Enum(info) = target else {
        return None;
    };
    if !info.type_path().starts_with("core::option::Option<") {
        return None;
    }
    let VariantInfo::Tuple(some) = info.variant("Some")? else {
        return None;
    };
    registry.get_type_info(some.field_at(0)?.type_id())
}
