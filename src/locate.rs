//! Finding live entities from the string references carried by find-instructions.

use std::any::TypeId;
use std::str::FromStr;

use bevy::ecs::query::Has;
use bevy::log::warn;
use bevy::prelude::*;
use bevy::reflect::TypeRegistry;
use serde::{Deserialize, Serialize};

use crate::model::{Inactive, Tags};
use crate::registry::TypeResolver;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    ById,
    ByName,
    ByPath,
    ByTag,
    ByComponent,
    #[default]
    ByIdOrNameOrPath,
}

impl FromStr for SearchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "by_id" => Ok(SearchMethod::ById),
            "by_name" => Ok(SearchMethod::ByName),
            "by_path" => Ok(SearchMethod::ByPath),
            "by_tag" => Ok(SearchMethod::ByTag),
            "by_component" => Ok(SearchMethod::ByComponent),
            "by_id_or_name_or_path" => Ok(SearchMethod::ByIdOrNameOrPath),
            other => Err(format!("unknown search method '{other}'")),
        }
    }
}

/// Resolves entity references for find-instructions.
pub trait EntityLocator {
    fn locate(&self, reference: &str, method: SearchMethod, include_inactive: bool) -> Option<Entity>;

    fn has_component(&self, entity: Entity, component: TypeId) -> bool;
}

#[derive(Clone, Debug)]
struct IndexedEntity {
    entity: Entity,
    name: Option<String>,
    parent: Option<Entity>,
    active: bool,
    tags: Vec<String>,
    components: Vec<TypeId>,
}

/// Point-in-time index of the entities in a world.
pub struct SceneIndex<'a> {
    entries: Vec<IndexedEntity>,
    registry: &'a TypeRegistry,
    resolver: &'a TypeResolver,
}

impl<'a> SceneIndex<'a> {
    pub fn build(world: &mut World, registry: &'a TypeRegistry, resolver: &'a TypeResolver) -> Self {
        let mut query =
            world.query::<(Entity, Option<&Name>, Option<&Parent>, Has<Inactive>, Option<&Tags>)>();
        let mut entries: Vec<IndexedEntity> = query
            .iter(world)
            .map(|(entity, name, parent, inactive, tags)| IndexedEntity {
                entity,
                name: name.map(|n| n.as_str().to_string()),
                parent: parent.map(Parent::get),
                active: !inactive,
                tags: tags.map(|t| t.0.clone()).unwrap_or_default(),
                components: Vec::new(),
            })
            .collect();
        for entry in &mut entries {
            entry.components = world
                .inspect_entity(entry.entity)
                .into_iter()
                .filter_map(|info| info.type_id())
                .collect();
        }
        entries.sort_by_key(|e| e.entity.index());
        Self {
            entries,
            registry,
            resolver,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slash-separated names from the root down, if every ancestor is named.
    pub fn path_of(&self, entity: Entity) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(entity);
        while let Some(id) = current {
            let entry = self.entry(id)?;
            names.push(entry.name.as_deref()?);
            current = entry.parent;
            if names.len() > self.entries.len() {
                return None;
            }
        }
        names.reverse();
        Some(names.join("/"))
    }

    fn entry(&self, entity: Entity) -> Option<&IndexedEntity> {
        self.entries.iter().find(|e| e.entity == entity)
    }

    fn first(&self, include_inactive: bool, pred: impl Fn(&IndexedEntity) -> bool) -> Option<Entity> {
        self.entries
            .iter()
            .filter(|e| include_inactive || e.active)
            .find(|e| pred(e))
            .map(|e| e.entity)
    }

    fn by_id(&self, reference: &str, include_inactive: bool) -> Option<Entity> {
        let id = reference.trim().parse::<u64>().ok()?;
        self.first(include_inactive, |e| {
            e.entity.to_bits() == id || u64::from(e.entity.index()) == id
        })
    }

    fn by_path(&self, reference: &str, include_inactive: bool) -> Option<Entity> {
        let wanted = reference.trim().trim_start_matches('/');
        self.first(include_inactive, |e| {
            self.path_of(e.entity).as_deref() == Some(wanted)
        })
    }

    fn by_name(&self, reference: &str, include_inactive: bool) -> Option<Entity> {
        self.first(include_inactive, |e| e.name.as_deref() == Some(reference))
    }
}

impl EntityLocator for SceneIndex<'_> {
    fn locate(&self, reference: &str, method: SearchMethod, include_inactive: bool) -> Option<Entity> {
        match method {
            SearchMethod::ById => self.by_id(reference, include_inactive),
            SearchMethod::ByName => self.by_name(reference, include_inactive),
            SearchMethod::ByPath => self.by_path(reference, include_inactive),
            SearchMethod::ByTag => {
                self.first(include_inactive, |e| e.tags.iter().any(|t| t == reference))
            }
            SearchMethod::ByComponent => match self.resolver.resolve(self.registry, reference) {
                Ok(resolved) => self.first(include_inactive, |e| {
                    e.components.contains(&resolved.type_id())
                }),
                Err(err) => {
                    warn!("[Axiom inspect] Component search for '{reference}' failed: {err}");
                    None
                }
            },
            SearchMethod::ByIdOrNameOrPath => self
                .by_id(reference, include_inactive)
                .or_else(|| self.by_path(reference, include_inactive))
                .or_else(|| self.by_name(reference, include_inactive)),
        }
    }

    fn has_component(&self, entity: Entity, component: TypeId) -> bool {
        self.entry(entity)
            .is_some_and(|e| e.components.contains(&component))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Component, Reflect, Default)]
    #[reflect(Component)]
    struct Beacon;

    struct Scene {
        world: World,
        root: Entity,
        arm: Entity,
        hand: Entity,
        hidden: Entity,
    }

    fn scene() -> Scene {
        let mut world = World::new();
        let root = world.spawn(Name::new("Robot")).id();
        let arm = world.spawn(Name::new("Arm")).set_parent(root).id();
        let hand = world
            .spawn((Name::new("Hand"), Beacon, Tags(vec!["grabber".to_string()])))
            .set_parent(arm)
            .id();
        let hidden = world.spawn((Name::new("Ghost"), Inactive)).id();
        Scene {
            world,
            root,
            arm,
            hand,
            hidden,
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::default();
        registry.register::<Beacon>();
        registry
    }

    #[test]
    fn search_method_parses_case_insensitively() {
        assert_eq!("BY_PATH".parse::<SearchMethod>(), Ok(SearchMethod::ByPath));
        assert!("by_layer".parse::<SearchMethod>().is_err());
    }

    #[test]
    fn paths_join_ancestor_names() {
        let mut scene = scene();
        let registry = registry();
        let resolver = TypeResolver::default();
        let index = SceneIndex::build(&mut scene.world, &registry, &resolver);
        assert_eq!(index.path_of(scene.hand).as_deref(), Some("Robot/Arm/Hand"));
        assert_eq!(index.path_of(scene.root).as_deref(), Some("Robot"));
    }

    #[test]
    fn locate_by_each_method() {
        let mut scene = scene();
        let registry = registry();
        let resolver = TypeResolver::default();
        let index = SceneIndex::build(&mut scene.world, &registry, &resolver);

        assert_eq!(index.locate("Arm", SearchMethod::ByName, true), Some(scene.arm));
        assert_eq!(
            index.locate("/Robot/Arm/Hand", SearchMethod::ByPath, true),
            Some(scene.hand)
        );
        assert_eq!(
            index.locate("grabber", SearchMethod::ByTag, true),
            Some(scene.hand)
        );
        assert_eq!(
            index.locate("Beacon", SearchMethod::ByComponent, true),
            Some(scene.hand)
        );
        let bits = scene.arm.to_bits().to_string();
        assert_eq!(index.locate(&bits, SearchMethod::ById, true), Some(scene.arm));
        assert_eq!(index.locate("Nobody", SearchMethod::ByName, true), None);
    }

    #[test]
    fn flexible_method_tries_id_then_path_then_name() {
        let mut scene = scene();
        let registry = registry();
        let resolver = TypeResolver::default();
        let index = SceneIndex::build(&mut scene.world, &registry, &resolver);

        let method = SearchMethod::ByIdOrNameOrPath;
        let index_ref = scene.root.index().to_string();
        assert_eq!(index.locate(&index_ref, method, true), Some(scene.root));
        assert_eq!(index.locate("Robot/Arm", method, true), Some(scene.arm));
        assert_eq!(index.locate("Hand", method, true), Some(scene.hand));
    }

    #[test]
    fn inactive_entities_are_skipped_on_request() {
        let mut scene = scene();
        let registry = registry();
        let resolver = TypeResolver::default();
        let index = SceneIndex::build(&mut scene.world, &registry, &resolver);

        assert_eq!(
            index.locate("Ghost", SearchMethod::ByName, true),
            Some(scene.hidden)
        );
        assert_eq!(index.locate("Ghost", SearchMethod::ByName, false), None);
        assert!(index.has_component(scene.hand, TypeId::of::<Beacon>()));
        assert!(!index.has_component(scene.arm, TypeId::of::<Beacon>()));
    }
}
