//! Resolution of type names against the reflection registry.

mod members;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bevy::ecs::reflect::{ReflectComponent, ReflectResource};
use bevy::log::debug;
use bevy::reflect::{TypeInfo, TypeRegistration, TypeRegistry};
use serde::Serialize;

pub use members::{
    register_accessors, Accessor, MemberAccess, MemberInfo, MemberKind, MemberTable,
    ReflectAccessors,
};

use crate::config::InspectorConfig;
use crate::error::{ResolveError, TypeCandidate};

/// Priority tier of a registered type. Runtime types shadow tooling types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Partition {
    Runtime,
    Tooling,
}

/// Which registrations a resolver accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypeCategory {
    #[default]
    Component,
    Resource,
    Any,
}

impl TypeCategory {
    pub fn admits(self, registration: &TypeRegistration) -> bool {
        match self {
            TypeCategory::Component => registration.data::<ReflectComponent>().is_some(),
            TypeCategory::Resource => registration.data::<ReflectResource>().is_some(),
            TypeCategory::Any => true,
        }
    }
}

/// A type a query resolved to, with its member table.
#[derive(Clone, Debug)]
pub struct ResolvedType {
    type_id: TypeId,
    type_path: &'static str,
    short_path: &'static str,
    module: &'static str,
    partition: Partition,
    members: Arc<MemberTable>,
}

impl ResolvedType {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    pub fn short_path(&self) -> &'static str {
        self.short_path
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn members(&self) -> &MemberTable {
        &self.members
    }
}

/// Resolves short or qualified type names and caches the answers.
///
/// Caches are append-only for the resolver's lifetime; [`TypeResolver::reset`]
/// empties them.
#[derive(Debug)]
pub struct TypeResolver {
    category: TypeCategory,
    config: InspectorConfig,
    by_path: RwLock<HashMap<String, ResolvedType>>,
    by_name: RwLock<HashMap<String, ResolvedType>>,
    members: RwLock<HashMap<TypeId, Arc<MemberTable>>>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(TypeCategory::default(), InspectorConfig::default())
    }
}

impl TypeResolver {
    pub fn new(category: TypeCategory, config: InspectorConfig) -> Self {
        Self {
            category,
            config,
            by_path: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
        }
    }

    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn partition_of(&self, module_path: &str) -> Partition {
        if self.config.is_tooling_module(module_path) {
            Partition::Tooling
        } else {
            Partition::Runtime
        }
    }

    pub fn resolve(&self, registry: &TypeRegistry, query: &str) -> Result<ResolvedType, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }
        let qualified = query.contains("::");
        if let Some(hit) = self.cached(query, qualified) {
            debug!("[Axiom inspect] Type cache hit for '{query}'");
            return Ok(hit);
        }

        if let Some(registration) = registry
            .get_with_type_path(query)
            .filter(|r| self.category.admits(r))
        {
            let resolved = self.describe(registry, registration);
            self.remember(registry, query, &resolved);
            return Ok(resolved);
        }

        let mut runtime = Vec::new();
        let mut tooling = Vec::new();
        for registration in registry.iter().filter(|r| self.category.admits(r)) {
            let table = registration.type_info().type_path_table();
            let matches = table.short_path() == query || (qualified && table.path() == query);
            if !matches {
                continue;
            }
            match self.partition_of(table.module_path().unwrap_or_default()) {
                Partition::Runtime => runtime.push(registration),
                Partition::Tooling => tooling.push(registration),
            }
        }

        for tier in [runtime, tooling] {
            match tier.as_slice() {
                [] => continue,
                [only] => {
                    let resolved = self.describe(registry, only);
                    debug!(
                        "[Axiom inspect] Resolved '{query}' to {} ({:?})",
                        resolved.type_path, resolved.partition
                    );
                    self.remember(registry, query, &resolved);
                    return Ok(resolved);
                }
                many => {
                    let mut candidates: Vec<TypeCandidate> = many
                        .iter()
                        .map(|r| {
                            let table = r.type_info().type_path_table();
                            let module = table.module_path().unwrap_or_default();
                            TypeCandidate {
                                type_path: table.path().to_string(),
                                module: module.to_string(),
                                partition: self.partition_of(module),
                            }
                        })
                        .collect();
                    candidates.sort_by(|a, b| a.type_path.cmp(&b.type_path));
                    return Err(ResolveError::Ambiguous {
                        query: query.to_string(),
                        candidates,
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            query: query.to_string(),
        })
    }

    /// Member table of `info`, built once per type.
    pub fn members_of(&self, registry: &TypeRegistry, info: &'static TypeInfo) -> Arc<MemberTable> {
        let type_id = info.type_id();
        if let Some(table) = self
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Arc::clone(table);
        }
        let table = Arc::new(MemberTable::build(registry, info));
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_id, Arc::clone(&table));
        table
    }

    /// Forgets every cached resolution and member table.
    pub fn reset(&self) {
        self.by_path
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.by_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached(&self, query: &str, qualified: bool) -> Option<ResolvedType> {
        if let Some(hit) = self
            .by_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
        {
            return Some(hit.clone());
        }
        if qualified {
            return None;
        }
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
            .cloned()
    }

    fn describe(&self, registry: &TypeRegistry, registration: &TypeRegistration) -> ResolvedType {
        let info = registration.type_info();
        let table = info.type_path_table();
        let module = table.module_path().unwrap_or_default();
        ResolvedType {
            type_id: info.type_id(),
            type_path: table.path(),
            short_path: table.short_path(),
            module,
            partition: self.partition_of(module),
            members: self.members_of(registry, info),
        }
    }

    fn remember(&self, registry: &TypeRegistry, query: &str, resolved: &ResolvedType) {
        {
            let mut by_path = self
                .by_path
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            by_path.insert(resolved.type_path.to_string(), resolved.clone());
            if query.contains("::") {
                by_path.insert(query.to_string(), resolved.clone());
            }
        }
        // A short name shared by several types only caches for the query that
        // actually picked this one.
        let short = resolved.short_path;
        if query == short || !registry.is_ambiguous(short) {
            self.by_name
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(short.to_string(), resolved.clone());
        }
    }
}
