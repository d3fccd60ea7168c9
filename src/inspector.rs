use bevy::prelude::*;
use bevy::reflect::{PartialReflect, TypeRegistry};
use serde_json::{Map, Value};

use crate::coerce::Coercer;
use crate::config::InspectorConfig;
use crate::error::ResolveError;
use crate::locate::EntityLocator;
use crate::navigate::{ApplyReport, MutationOutcome, Navigator};
use crate::registry::{ResolvedType, TypeCategory, TypeResolver};
use crate::suggest::Suggester;

/// Process-wide entry point: owns the resolution caches and the suggestion memo.
#[derive(Resource, Debug)]
pub struct Inspector {
    config: InspectorConfig,
    resolver: TypeResolver,
    suggester: Suggester,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(InspectorConfig::default())
    }
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            resolver: TypeResolver::new(TypeCategory::Component, config.clone()),
            suggester: Suggester::new(config.max_suggestions),
            config,
        }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn resolve_type(&self, registry: &TypeRegistry, query: &str) -> Result<ResolvedType, ResolveError> {
        self.resolver.resolve(registry, query)
    }

    pub fn apply_path(
        &self,
        registry: &TypeRegistry,
        locator: Option<&dyn EntityLocator>,
        root: &mut dyn PartialReflect,
        path: &str,
        value: &Value,
    ) -> MutationOutcome {
        self.navigator(registry, locator).apply_path(root, path, value)
    }

    pub fn apply_properties(
        &self,
        registry: &TypeRegistry,
        locator: Option<&dyn EntityLocator>,
        root: &mut dyn PartialReflect,
        properties: &Map<String, Value>,
    ) -> ApplyReport {
        self.navigator(registry, locator)
            .apply_properties(root, properties)
    }

    /// Sorted names of the settable members of a component type.
    pub fn available_members(&self, registry: &TypeRegistry, query: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self.resolve_type(registry, query)?.members().available())
    }

    /// Drops cached resolutions, member tables and suggestions.
    pub fn reset(&self) {
        self.resolver.reset();
        self.suggester.clear();
    }

    fn navigator<'a>(
        &'a self,
        registry: &'a TypeRegistry,
        locator: Option<&'a dyn EntityLocator>,
    ) -> Navigator<'a> {
        let coercer = Coercer::new(registry, &self.resolver)
            .with_locator(locator)
            .with_search(self.config.default_search_method, self.config.include_inactive);
        Navigator::new(coercer, &self.resolver, &self.suggester, &self.config.slot_prefix)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Component, Reflect, Default)]
    #[reflect(Component, Default)]
    struct Lamp {
        brightness: f32,
        color: Color,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::default();
        registry.register::<Lamp>();
        registry
    }

    #[test]
    fn available_members_are_sorted() {
        let registry = registry();
        let inspector = Inspector::default();
        assert_eq!(
            inspector
                .available_members(&registry, "Lamp")
                .expect("Lamp is registered"),
            vec!["brightness", "color"]
        );
    }

    #[test]
    fn suggestion_limit_follows_config() {
        let registry = registry();
        let inspector = Inspector::new(InspectorConfig {
            max_suggestions: 1,
            ..Default::default()
        });
        let mut lamp = Lamp::default();
        let err = inspector
            .apply_path(&registry, None, &mut lamp, "colr", &json!([1.0, 1.0, 1.0]))
            .expect_err("typo");
        assert_eq!(err.suggestions().len(), 1);
        inspector.reset();
        assert!(inspector.resolve_type(&registry, "Lamp").is_ok());
    }
}
