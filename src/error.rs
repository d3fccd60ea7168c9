use bevy::prelude::Entity;
use thiserror::Error;

use crate::registry::Partition;

/// One type that matched an ambiguous query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCandidate {
    pub type_path: String,
    pub module: String,
    pub partition: Partition,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("type name cannot be empty")]
    EmptyQuery,
    #[error(
        "type '{query}' not found among registered types. Use a fully-qualified path \
         (crate::module::Type) and make sure the type is registered"
    )]
    NotFound { query: String },
    #[error(
        "multiple types matched '{query}':{}\nProvide a fully-qualified type path to disambiguate",
        list_candidates(.candidates)
    )]
    Ambiguous {
        query: String,
        candidates: Vec<TypeCandidate>,
    },
}

fn list_candidates(candidates: &[TypeCandidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("\n - {} (module {}, {:?})", c.type_path, c.module, c.partition))
        .collect()
}

/// Failure to turn an untyped value into a reflected value of the target type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("expected {expected}, got {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot assign null to {type_path}: the type has no default value")]
    NoDefault { type_path: String },
    #[error("type {type_path} is not registered")]
    Unregistered { type_path: String },
    #[error("could not convert {found} into {type_path}: {message}")]
    Structural {
        type_path: String,
        found: &'static str,
        message: String,
    },
}

/// Everything that can go wrong while applying a single path/value pair.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("invalid path '{path}'")]
    InvalidPath { path: String },
    #[error(
        "member '{member}' not found on {type_path}.{}",
        did_you_mean(.suggestions, .available)
    )]
    MemberNotFound {
        member: String,
        type_path: String,
        suggestions: Vec<String>,
        available: Vec<String>,
    },
    #[error("member '{member}' on {type_path} is not writable")]
    NotWritable { member: String, type_path: String },
    #[error("'{member}' is null, cannot continue")]
    NullIntermediate { member: String },
    #[error("'{member}' is not an array or list, cannot access by index")]
    NotIndexable { member: String },
    #[error("index {index} out of range for '{member}' ({})", range_hint(.len))]
    IndexOutOfRange {
        member: String,
        index: usize,
        len: usize,
    },
    #[error("conversion failed for '{member}': {source}")]
    Conversion {
        member: String,
        #[source]
        source: CoercionError,
    },
    #[error("conversion failed for '{member}': {message}")]
    Assignment { member: String, message: String },
}

impl MutationError {
    pub fn suggestions(&self) -> &[String] {
        match self {
            MutationError::MemberNotFound { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

fn did_you_mean(suggestions: &[String], available: &[String]) -> String {
    let available = available.join(", ");
    if suggestions.is_empty() {
        format!(" Available: [{available}]")
    } else {
        format!(
            " Did you mean: {}? Available: [{available}]",
            suggestions.join(", ")
        )
    }
}

fn range_hint(len: &usize) -> String {
    match *len {
        0 => "collection is empty".to_string(),
        len => format!("valid range 0-{}", len - 1),
    }
}

/// World-level failures that happen before any property is touched.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("entity {0:?} not found")]
    EntityNotFound(Entity),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("type {0} is not a reflected component")]
    NotAComponent(String),
    #[error("component '{component}' not found on entity {entity:?}")]
    ComponentMissing { component: String, entity: Entity },
    #[error("properties for component '{0}' must be a non-empty object")]
    EmptyPayload(String),
}
