//! World-facing entry points: mutate a component by name and snapshot an entity.

use bevy::ecs::reflect::{AppTypeRegistry, ReflectComponent};
use bevy::log::{info, warn};
use bevy::prelude::*;
use bevy::reflect::serde::TypedReflectSerializer;
use serde_json::{json, Map, Value};

use crate::error::SceneError;
use crate::inspector::Inspector;
use crate::locate::SceneIndex;
use crate::navigate::ApplyReport;

/// Picks the property map out of a payload, either flat or nested under the
/// component name.
fn properties_for<'p>(component: &str, payload: &'p Value) -> Result<&'p Map<String, Value>, SceneError> {
    let empty = || SceneError::EmptyPayload(component.to_string());
    let map = payload.as_object().ok_or_else(empty)?;
    let map = match map.get(component) {
        Some(Value::Object(nested)) => nested,
        _ => map,
    };
    if map.is_empty() {
        return Err(empty());
    }
    Ok(map)
}

/// Applies `payload` to `component` on `entity`, resolving the component by
/// short or qualified name. Per-property failures land in the report.
pub fn set_component_properties(
    world: &mut World,
    entity: Entity,
    component: &str,
    payload: &Value,
) -> Result<ApplyReport, SceneError> {
    let properties = properties_for(component, payload)?;
    let registry = world
        .get_resource_or_insert_with(AppTypeRegistry::default)
        .clone();
    world.init_resource::<Inspector>();

    world.resource_scope(|world, inspector: Mut<Inspector>| -> Result<ApplyReport, SceneError> {
        let registry = registry.read();
        let resolved = inspector.resolve_type(&registry, component)?;
        let reflect_component = registry
            .get_type_data::<ReflectComponent>(resolved.type_id())
            .ok_or_else(|| SceneError::NotAComponent(resolved.type_path().to_string()))?;
        if !world.entities().contains(entity) {
            return Err(SceneError::EntityNotFound(entity));
        }

        let index = SceneIndex::build(world, &registry, inspector.resolver());
        let mut entity_mut = world.entity_mut(entity);
        let mut reflected = reflect_component
            .reflect_mut(&mut entity_mut)
            .ok_or_else(|| SceneError::ComponentMissing {
                component: resolved.short_path().to_string(),
                entity,
            })?;
        let report = inspector.apply_properties(
            &registry,
            Some(&index),
            reflected.as_partial_reflect_mut(),
            properties,
        );
        info!(
            "[Axiom inspect] {} on {entity:?}: applied {} of {} properties",
            resolved.short_path(),
            report.applied_count,
            properties.len()
        );
        Ok(report)
    })
}

/// JSON view of an entity: id, name, and every reflected component keyed by
/// short type name.
pub fn entity_snapshot(world: &World, entity: Entity) -> Result<Value, SceneError> {
    if !world.entities().contains(entity) {
        return Err(SceneError::EntityNotFound(entity));
    }
    let entity_ref = world.entity(entity);
    let name = entity_ref.get::<Name>().map(|n| n.as_str().to_string());
    let mut components = Map::new();
    if let Some(registry) = world.get_resource::<AppTypeRegistry>() {
        let registry = registry.read();
        for info in world.inspect_entity(entity) {
            let Some(registration) = info.type_id().and_then(|id| registry.get(id)) else {
                continue;
            };
            let Some(value) = registration
                .data::<ReflectComponent>()
                .and_then(|reflect| reflect.reflect(entity_ref))
            else {
                continue;
            };
            let short = registration.type_info().type_path_table().short_path();
            let serializer = TypedReflectSerializer::new(value.as_partial_reflect(), &registry);
            match serde_json::to_value(&serializer) {
                Ok(json) => {
                    components.insert(short.to_string(), json);
                }
                Err(err) => warn!("[Axiom inspect] Skipping {short} in snapshot of {entity:?}: {err}"),
            }
        }
    } else {
        warn!("[Axiom inspect] No type registry in world, snapshot has no components");
    }
    Ok(json!({
        "entity": entity.to_bits(),
        "name": name,
        "components": components,
    }))
}
