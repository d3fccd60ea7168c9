//! Reflective inspection and mutation of live Bevy entities by name.
//!
//! Callers hand over a component name and a `{path: value}` map of untyped
//! JSON. The component type is resolved against the app's type registry,
//! each path is walked on the live component, and every value is coerced to
//! the member's exact type before it is written.

pub mod coerce;
pub mod config;
pub mod error;
pub mod inspector;
pub mod locate;
pub mod model;
pub mod navigate;
pub mod path;
pub mod registry;
pub mod scene;
pub mod suggest;

use bevy::prelude::*;

pub use config::InspectorConfig;
pub use error::{CoercionError, MutationError, ResolveError, SceneError};
pub use inspector::Inspector;
pub use locate::{EntityLocator, SceneIndex, SearchMethod};
pub use navigate::{ApplyReport, PropertyFailure};
pub use registry::{MemberAccess, ReflectAccessors, ResolvedType};
pub use scene::{entity_snapshot, set_component_properties};

use model::{transform_accessors, Bounds, Inactive, ShaderMaterial, Tags};

/// Registers the inspectable model types and the shared [`Inspector`].
pub struct InspectorPlugin;

impl Plugin for InspectorPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Tags>()
            .register_type::<Inactive>()
            .register_type::<Bounds>()
            .register_type::<ShaderMaterial>()
            .register_type::<Transform>()
            .insert_resource(Inspector::new(InspectorConfig::load()));

        let type_registry = app.world().resource::<AppTypeRegistry>().clone();
        registry::register_accessors::<Transform>(&mut type_registry.write(), transform_accessors());
    }
}
