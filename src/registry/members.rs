use std::any::TypeId;
use std::sync::Arc;

use bevy::reflect::{
    FromReflect, GetTypeRegistration, PartialReflect, Reflect, TypeInfo, TypeRegistry, Typed,
};

/// How a reflected member may be reached from outside.
///
/// Attach to a field with `#[reflect(@MemberAccess::Serialized)]`. Untagged
/// fields are `Public`.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemberAccess {
    #[default]
    Public,
    /// Not part of the public surface, but explicitly settable from outside.
    Serialized,
    ReadOnly,
    /// Hidden from lookup, suggestions and assignment.
    Internal,
}

impl MemberAccess {
    pub fn is_readable(self) -> bool {
        self != MemberAccess::Internal
    }

    pub fn is_writable(self) -> bool {
        matches!(self, MemberAccess::Public | MemberAccess::Serialized)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
}

#[derive(Clone, Debug)]
pub struct MemberInfo {
    pub name: &'static str,
    pub kind: MemberKind,
    pub access: MemberAccess,
    pub type_id: TypeId,
    pub type_path: &'static str,
}

/// Members of one type: properties first, then fields, each in declaration order.
#[derive(Clone, Debug)]
pub struct MemberTable {
    type_path: &'static str,
    members: Vec<MemberInfo>,
}

impl MemberTable {
    pub fn build(registry: &TypeRegistry, info: &'static TypeInfo) -> Self {
        let mut members = Vec::new();
        if let Some(accessors) = registry.get_type_data::<ReflectAccessors>(info.type_id()) {
            members.extend(accessors.properties.iter().map(|property| {
                let declared = (property.type_info)();
                MemberInfo {
                    name: property.name,
                    kind: MemberKind::Property,
                    access: if property.set.is_some() {
                        MemberAccess::Public
                    } else {
                        MemberAccess::ReadOnly
                    },
                    type_id: declared.type_id(),
                    type_path: declared.type_path(),
                }
            }));
        }
        match info {
            TypeInfo::Struct(info) => {
                members.extend(info.iter().map(|field| MemberInfo {
                    name: field.name(),
                    kind: MemberKind::Field,
                    access: field
                        .get_attribute::<MemberAccess>()
                        .copied()
                        .unwrap_or_default(),
                    type_id: field.type_id(),
                    type_path: field.type_path(),
                }));
            }
            TypeInfo::TupleStruct(info) => {
                members.extend(info.iter().map(|field| MemberInfo {
                    name: TUPLE_FIELD_NAMES
                        .get(field.index())
                        .copied()
                        .unwrap_or("?"),
                    kind: MemberKind::Field,
                    access: field
                        .get_attribute::<MemberAccess>()
                        .copied()
                        .unwrap_or_default(),
                    type_id: field.type_id(),
                    type_path: field.type_path(),
                }));
            }
            _ => {}
        }
        Self {
            type_path: info.type_path(),
            members,
        }
    }

    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter()
    }

    /// Any visible member, property before field, exact case before case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&MemberInfo> {
        self.find(name, |m| m.access.is_readable())
    }

    /// The member an assignment to `name` should target, if one is writable.
    pub fn lookup_writable(&self, name: &str) -> Option<&MemberInfo> {
        self.find(name, |m| m.access == MemberAccess::Public)
            .or_else(|| self.find(name, |m| m.access == MemberAccess::Serialized))
    }

    fn find(&self, name: &str, filter: impl Fn(&MemberInfo) -> bool) -> Option<&MemberInfo> {
        let visible = || self.members.iter().filter(|m| filter(m));
        visible()
            .find(|m| m.name == name)
            .or_else(|| visible().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    /// Writable member names in declaration order, the suggestion candidates.
    pub fn writable_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for member in self.members.iter().filter(|m| m.access.is_writable()) {
            if !names.contains(&member.name) {
                names.push(member.name);
            }
        }
        names
    }

    /// Sorted, de-duplicated writable member names.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .writable_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

const TUPLE_FIELD_NAMES: [&str; 12] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"];

type Getter = Arc<dyn Fn(&dyn PartialReflect) -> Option<Box<dyn PartialReflect>> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn PartialReflect, &dyn PartialReflect) -> Result<(), String> + Send + Sync>;

/// A computed member backed by a getter and an optional setter.
#[derive(Clone)]
pub struct Accessor {
    pub name: &'static str,
    pub type_info: fn() -> &'static TypeInfo,
    get: Getter,
    set: Option<Setter>,
}

impl Accessor {
    pub fn get(&self, target: &dyn PartialReflect) -> Option<Box<dyn PartialReflect>> {
        (self.get)(target)
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    pub fn set(&self, target: &mut dyn PartialReflect, value: &dyn PartialReflect) -> Result<(), String> {
        match &self.set {
            Some(set) => set(target, value),
            None => Err(format!("property '{}' has no setter", self.name)),
        }
    }
}

/// Type data listing the computed properties of a type.
#[derive(Clone, Default)]
pub struct ReflectAccessors {
    properties: Vec<Accessor>,
}

impl ReflectAccessors {
    pub fn with_property<T, V>(
        mut self,
        name: &'static str,
        get: fn(&T) -> V,
        set: Option<fn(&mut T, V)>,
    ) -> Self
    where
        T: Reflect,
        V: Reflect + FromReflect + Typed,
    {
        let getter: Getter = Arc::new(move |target: &dyn PartialReflect| {
            target
                .try_as_reflect()
                .and_then(|target| target.downcast_ref::<T>())
                .map(|target| Box::new(get(target)) as Box<dyn PartialReflect>)
        });
        let setter = set.map(|set| {
            Arc::new(
                move |target: &mut dyn PartialReflect, value: &dyn PartialReflect| {
                    let target = target
                        .try_as_reflect_mut()
                        .and_then(|target| target.downcast_mut::<T>())
                        .ok_or_else(|| format!("property '{name}' applied to the wrong type"))?;
                    let value = V::from_reflect(value).ok_or_else(|| {
                        format!("value is not a {}", V::type_info().type_path())
                    })?;
                    set(target, value);
                    Ok(())
                },
            ) as Setter
        });
        self.properties.push(Accessor {
            name,
            type_info: V::type_info,
            get: getter,
            set: setter,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Registers `T` and attaches `accessors` to it.
pub fn register_accessors<T>(registry: &mut TypeRegistry, accessors: ReflectAccessors)
where
    T: Reflect + GetTypeRegistration,
{
    registry.register::<T>();
    if let Some(registration) = registry.get_mut(TypeId::of::<T>()) {
        registration.insert(accessors);
    }
}
