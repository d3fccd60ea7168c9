use bevy::prelude::*;
use bevy::reflect::reflect_trait;
use bevy::utils::HashMap;

use crate::registry::{MemberAccess, ReflectAccessors};

/// Axis-aligned box given by its center and full size.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Default)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }
}

/// Value held by a dynamically named slot.
#[derive(Reflect, Clone, Debug, PartialEq)]
pub enum SlotValue {
    Float(f32),
    Color(Color),
    Vector(Vec4),
    Texture(String),
}

/// A bag of dynamically named slots, addressed by names carrying the
/// configured slot prefix (`_Color`, `_Glossiness`).
#[reflect_trait]
pub trait SlotCarrier {
    fn set_slot(&mut self, name: &str, value: SlotValue);
    fn slot(&self, name: &str) -> Option<&SlotValue>;
}

/// Surface description with fixed fields plus shader-style slots.
#[derive(Reflect, Clone, Debug, PartialEq)]
#[reflect(Default, SlotCarrier)]
pub struct ShaderMaterial {
    pub name: String,
    pub color: Color,
    pub main_texture: Option<String>,
    #[reflect(@MemberAccess::Internal)]
    slots: HashMap<String, SlotValue>,
}

impl Default for ShaderMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::WHITE,
            main_texture: None,
            slots: HashMap::default(),
        }
    }
}

impl ShaderMaterial {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl SlotCarrier for ShaderMaterial {
    fn set_slot(&mut self, name: &str, value: SlotValue) {
        self.slots.insert(name.to_string(), value);
    }

    fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }
}

/// Free-form labels used by tag searches.
#[derive(Component, Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Component, Default)]
pub struct Tags(pub Vec<String>);

impl Tags {
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

/// Marks an entity as disabled; searches skip it unless told otherwise.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component, Default)]
pub struct Inactive;

/// Computed members of [`Transform`]: rotation as XYZ Euler degrees, plus
/// the read-only forward direction.
pub fn transform_accessors() -> ReflectAccessors {
    ReflectAccessors::default()
        .with_property::<Transform, Vec3>(
            "euler_degrees",
            |t| {
                let (x, y, z) = t.rotation.to_euler(EulerRot::XYZ);
                Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
            },
            Some(|t, degrees| {
                t.rotation = Quat::from_euler(
                    EulerRot::XYZ,
                    degrees.x.to_radians(),
                    degrees.y.to_radians(),
                    degrees.z.to_radians(),
                );
            }),
        )
        .with_property::<Transform, Vec3>("forward", |t| t.forward().as_vec3(), None)
}
