use bevy::prelude::*;
use bevy::reflect::{FromReflect, Typed};
use serde_json::json;

use super::*;

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Stats {
    level: u32,
    title: String,
}

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
struct Marker;

struct Fixed(Entity);

impl EntityLocator for Fixed {
    fn locate(&self, reference: &str, method: SearchMethod, _include_inactive: bool) -> Option<Entity> {
        (reference == "Target" && method != SearchMethod::ByTag).then_some(self.0)
    }

    fn has_component(&self, _entity: Entity, _component: TypeId) -> bool {
        false
    }
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::default();
    registry.register::<f32>();
    registry.register::<u32>();
    registry.register::<Vec2>();
    registry.register::<Entity>();
    registry.register::<Stats>();
    registry.register::<Marker>();
    registry.register::<Option<Vec2>>();
    registry.register::<Option<Entity>>();
    registry
}

fn take<T: FromReflect>(value: Box<dyn PartialReflect>) -> T {
    T::from_reflect(&*value).expect("coerced value should convert")
}

#[test]
fn color_round_trips_field_for_field() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);
    let value = coercer
        .coerce(&json!({"r": 0.2, "g": 0.4, "b": 0.6, "a": 0.8}), Color::type_info())
        .expect("color should coerce");
    let color = take::<Color>(value).to_srgba();
    for (got, want) in [
        (color.red, 0.2),
        (color.green, 0.4),
        (color.blue, 0.6),
        (color.alpha, 0.8),
    ] {
        assert!((got - want).abs() < 1e-6, "{got} != {want}");
    }
}

#[test]
fn null_becomes_default_for_value_types() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);
    let value = coercer
        .coerce(&Value::Null, f32::type_info())
        .expect("f32 has a default");
    assert_eq!(take::<f32>(value), 0.0);
}

#[test]
fn null_without_default_is_an_error() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);
    let err = coercer
        .coerce(&Value::Null, Stats::type_info())
        .err()
        .expect("Stats has no registered default");
    assert!(matches!(err, CoercionError::NoDefault { .. }));
}

#[test]
fn options_wrap_and_clear() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);

    let mut live: Option<Vec2> = None;
    let some = coercer
        .coerce(&json!([1.0, 2.0]), <Option<Vec2>>::type_info())
        .expect("inner vector should coerce");
    live.try_apply(&*some).expect("Some applies");
    assert_eq!(live, Some(Vec2::new(1.0, 2.0)));

    let none = coercer
        .coerce(&Value::Null, <Option<Vec2>>::type_info())
        .expect("null clears options");
    live.try_apply(&*none).expect("None applies");
    assert_eq!(live, None);
}

#[test]
fn structs_convert_structurally() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);
    let value = coercer
        .coerce(&json!({"level": 3, "title": "scout"}), Stats::type_info())
        .expect("shape matches");
    assert_eq!(
        take::<Stats>(value),
        Stats {
            level: 3,
            title: "scout".to_string()
        }
    );
}

#[test]
fn structural_mismatch_names_target_and_shape() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let coercer = Coercer::new(&registry, &resolver);
    let err = coercer
        .coerce(&json!("high"), u32::type_info())
        .err()
        .expect("a string is not a u32");
    let CoercionError::Structural {
        type_path, found, ..
    } = err
    else {
        panic!("expected a structural error");
    };
    assert_eq!(type_path, "u32");
    assert_eq!(found, "string");
}

#[test]
fn find_instruction_resolves_through_locator() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let target = Entity::from_raw(7);
    let locator = Fixed(target);
    let coercer = Coercer::new(&registry, &resolver).with_locator(Some(&locator));

    let value = coercer
        .coerce(&json!({"find": "Target"}), Entity::type_info())
        .expect("entity found");
    assert_eq!(take::<Entity>(value), target);

    let value = coercer
        .coerce(
            &json!({"find": "Target", "method": "by_name"}),
            <Option<Entity>>::type_info(),
        )
        .expect("optional entity found");
    assert_eq!(take::<Option<Entity>>(value), Some(target));
}

#[test]
fn unresolved_find_instruction_yields_null() {
    let registry = registry();
    let resolver = TypeResolver::default();
    let locator = Fixed(Entity::from_raw(7));
    let coercer = Coercer::new(&registry, &resolver).with_locator(Some(&locator));

    let missing = coercer
        .coerce(&json!({"find": "Elsewhere"}), <Option<Entity>>::type_info())
        .expect("unresolved is not fatal");
    assert_eq!(take::<Option<Entity>>(missing), None);

    let filtered = coercer
        .coerce(
            &json!({"find": "Target", "component": "Marker"}),
            <Option<Entity>>::type_info(),
        )
        .expect("component mismatch is not fatal");
    assert_eq!(take::<Option<Entity>>(filtered), None);

    let bad_method = coercer
        .coerce(&json!({"find": "Target", "method": "by_layer"}), Entity::type_info())
        .expect("unknown method is not fatal");
    assert_eq!(take::<Entity>(bad_method), Entity::PLACEHOLDER);
}

#[test]
fn find_instruction_parsing() {
    assert_eq!(
        FindInstruction::from_value(&json!({"find": 42, "method": "by_id"})),
        Some(FindInstruction {
            reference: "42".to_string(),
            method: Some("by_id".to_string()),
            component: None,
        })
    );
    assert_eq!(FindInstruction::from_value(&json!({"method": "by_id"})), None);
    assert_eq!(FindInstruction::from_value(&json!([1, 2])), None);
}
