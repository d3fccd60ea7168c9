use std::any::TypeId;

use bevy::math::Rect;
use bevy::prelude::*;
use bevy::reflect::PartialReflect;
use serde_json::Value;

use super::shape_of;
use crate::error::CoercionError;
use crate::model::Bounds;

/// Fixed-shape value types accepted as keyed objects or positional arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
    Srgba,
    LinearRgba,
    Rect,
    Bounds,
}

impl Composite {
    pub fn of(type_id: TypeId) -> Option<Self> {
        let table = [
            (TypeId::of::<Vec2>(), Composite::Vec2),
            (TypeId::of::<Vec3>(), Composite::Vec3),
            (TypeId::of::<Vec4>(), Composite::Vec4),
            (TypeId::of::<Quat>(), Composite::Quat),
            (TypeId::of::<Color>(), Composite::Color),
            (TypeId::of::<Srgba>(), Composite::Srgba),
            (TypeId::of::<LinearRgba>(), Composite::LinearRgba),
            (TypeId::of::<Rect>(), Composite::Rect),
            (TypeId::of::<Bounds>(), Composite::Bounds),
        ];
        table
            .into_iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, composite)| composite)
    }

    pub fn expected(self) -> &'static str {
        match self {
            Composite::Vec2 => "[x, y] or {x, y}",
            Composite::Vec3 => "[x, y, z] or {x, y, z}",
            Composite::Vec4 => "[x, y, z, w] or {x, y, z, w}",
            Composite::Quat => "[x, y, z, w] or {x, y, z, w}",
            Composite::Color | Composite::Srgba | Composite::LinearRgba => {
                "[r, g, b, a?] or {r, g, b, a?}"
            }
            Composite::Rect => "[x, y, width, height], {x, y, width, height} or {min, max}",
            Composite::Bounds => "[center, size] or {center, size}",
        }
    }

    pub fn parse(self, value: &Value) -> Result<Box<dyn PartialReflect>, CoercionError> {
        let expected = self.expected();
        let parsed: Box<dyn PartialReflect> = match self {
            Composite::Vec2 => Box::new(parse_vec2(value, expected)?),
            Composite::Vec3 => Box::new(parse_vec3(value, expected)?),
            Composite::Vec4 => Box::new(Vec4::from_array(floats(value, ["x", "y", "z", "w"], expected)?)),
            Composite::Quat => {
                let [x, y, z, w] = floats(value, ["x", "y", "z", "w"], expected)?;
                Box::new(Quat::from_xyzw(x, y, z, w))
            }
            Composite::Color => Box::new(Color::Srgba(parse_srgba(value)?)),
            Composite::Srgba => Box::new(parse_srgba(value)?),
            Composite::LinearRgba => {
                let [r, g, b, a] = rgba(value)?;
                Box::new(LinearRgba::new(r, g, b, a))
            }
            Composite::Rect => Box::new(parse_rect(value)?),
            Composite::Bounds => Box::new(parse_bounds(value)?),
        };
        Ok(parsed)
    }
}

/// Reads `keys` from an object, or an array of exactly `N` numbers in key order.
fn floats<const N: usize>(
    value: &Value,
    keys: [&str; N],
    expected: &'static str,
) -> Result<[f32; N], CoercionError> {
    let mismatch = || CoercionError::Shape {
        expected,
        found: shape_of(value),
    };
    let mut out = [0.0; N];
    match value {
        Value::Array(items) if items.len() == N => {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = number(item).ok_or_else(mismatch)?;
            }
        }
        Value::Object(map) => {
            for (slot, key) in out.iter_mut().zip(keys) {
                *slot = map.get(key).and_then(number).ok_or_else(mismatch)?;
            }
        }
        _ => return Err(mismatch()),
    }
    Ok(out)
}

fn number(value: &Value) -> Option<f32> {
    value.as_f64().map(|n| n as f32)
}

fn parse_vec2(value: &Value, expected: &'static str) -> Result<Vec2, CoercionError> {
    floats(value, ["x", "y"], expected).map(Vec2::from_array)
}

fn parse_vec3(value: &Value, expected: &'static str) -> Result<Vec3, CoercionError> {
    floats(value, ["x", "y", "z"], expected).map(Vec3::from_array)
}

/// `[r, g, b]`, `[r, g, b, a]`, `{r, g, b, a?}` or `{red, green, blue, alpha?}`.
/// Alpha defaults to 1.
fn rgba(value: &Value) -> Result<[f32; 4], CoercionError> {
    let mismatch = || CoercionError::Shape {
        expected: Composite::Color.expected(),
        found: shape_of(value),
    };
    match value {
        Value::Array(items) if items.len() == 3 || items.len() == 4 => {
            let mut out = [0.0, 0.0, 0.0, 1.0];
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = number(item).ok_or_else(mismatch)?;
            }
            Ok(out)
        }
        Value::Object(map) => {
            let channel = |short: &str, long: &str| map.get(short).or_else(|| map.get(long));
            let mut out = [0.0; 4];
            for (slot, (short, long)) in out
                .iter_mut()
                .zip([("r", "red"), ("g", "green"), ("b", "blue")])
            {
                *slot = channel(short, long).and_then(number).ok_or_else(mismatch)?;
            }
            out[3] = match channel("a", "alpha") {
                Some(alpha) => number(alpha).ok_or_else(mismatch)?,
                None => 1.0,
            };
            Ok(out)
        }
        _ => Err(mismatch()),
    }
}

fn parse_srgba(value: &Value) -> Result<Srgba, CoercionError> {
    let [r, g, b, a] = rgba(value)?;
    Ok(Srgba::new(r, g, b, a))
}

pub fn parse_color(value: &Value) -> Result<Color, CoercionError> {
    parse_srgba(value).map(Color::Srgba)
}

/// Two to four numbers, missing trailing components are zero.
pub fn parse_padded_vec4(value: &Value) -> Option<Vec4> {
    let mut out = [0.0; 4];
    match value {
        Value::Array(items) if (2..=4).contains(&items.len()) => {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = number(item)?;
            }
        }
        Value::Object(map) if map.contains_key("x") && map.contains_key("y") => {
            for (slot, key) in out.iter_mut().zip(["x", "y", "z", "w"]) {
                if let Some(component) = map.get(key) {
                    *slot = number(component)?;
                }
            }
        }
        _ => return None,
    }
    Some(Vec4::from_array(out))
}

fn parse_rect(value: &Value) -> Result<Rect, CoercionError> {
    let expected = Composite::Rect.expected();
    if let Some(map) = value.as_object() {
        if let (Some(min), Some(max)) = (map.get("min"), map.get("max")) {
            return Ok(Rect::from_corners(
                parse_vec2(min, expected)?,
                parse_vec2(max, expected)?,
            ));
        }
    }
    let [x, y, width, height] = floats(value, ["x", "y", "width", "height"], expected)?;
    Ok(Rect::new(x, y, x + width, y + height))
}

fn parse_bounds(value: &Value) -> Result<Bounds, CoercionError> {
    let expected = Composite::Bounds.expected();
    let (center, size) = match value {
        Value::Array(items) if items.len() == 2 => (&items[0], &items[1]),
        Value::Object(map) => match (map.get("center"), map.get("size")) {
            (Some(center), Some(size)) => (center, size),
            _ => {
                return Err(CoercionError::Shape {
                    expected,
                    found: shape_of(value),
                })
            }
        },
        _ => {
            return Err(CoercionError::Shape {
                expected,
                found: shape_of(value),
            })
        }
    };
    Ok(Bounds::new(
        parse_vec3(center, expected)?,
        parse_vec3(size, expected)?,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn downcast<T: Reflect + Copy>(value: Box<dyn PartialReflect>) -> T {
        *value
            .try_as_reflect()
            .and_then(|v| v.downcast_ref::<T>())
            .expect("composite produced the wrong type")
    }

    #[test]
    fn vectors_accept_arrays_and_objects() {
        let from_array = Composite::Vec3.parse(&json!([1.0, 2.0, 3.0])).expect("array");
        let from_object = Composite::Vec3
            .parse(&json!({"x": 1.0, "y": 2.0, "z": 3.0}))
            .expect("object");
        assert_eq!(downcast::<Vec3>(from_array), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(downcast::<Vec3>(from_object), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn wrong_array_length_is_a_shape_error() {
        let err = Composite::Vec3.parse(&json!([1.0, 2.0])).err();
        assert_eq!(
            err,
            Some(CoercionError::Shape {
                expected: "[x, y, z] or {x, y, z}",
                found: "array",
            })
        );
    }

    #[test]
    fn color_alpha_is_optional() {
        let color = parse_color(&json!({"red": 0.5, "green": 0.25, "blue": 1.0})).expect("color");
        assert_eq!(color, Color::srgba(0.5, 0.25, 1.0, 1.0));
        let color = parse_color(&json!([0.1, 0.2, 0.3, 0.4])).expect("color");
        assert_eq!(color, Color::srgba(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn rect_accepts_origin_and_size_or_corners() {
        let rect = downcast::<Rect>(
            Composite::Rect
                .parse(&json!({"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}))
                .expect("rect"),
        );
        assert_eq!(rect, Rect::new(1.0, 2.0, 4.0, 6.0));
        let rect = downcast::<Rect>(
            Composite::Rect
                .parse(&json!({"min": [0.0, 0.0], "max": [2.0, 2.0]}))
                .expect("rect"),
        );
        assert_eq!(rect.size(), Vec2::splat(2.0));
    }

    #[test]
    fn bounds_take_center_and_size() {
        let bounds = downcast::<Bounds>(
            Composite::Bounds
                .parse(&json!({"center": [0.0, 1.0, 0.0], "size": {"x": 2.0, "y": 2.0, "z": 2.0}}))
                .expect("bounds"),
        );
        assert_eq!(bounds.min(), Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max(), Vec3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn padded_vectors_fill_missing_components() {
        assert_eq!(
            parse_padded_vec4(&json!([1.0, 2.0])),
            Some(Vec4::new(1.0, 2.0, 0.0, 0.0))
        );
        assert_eq!(parse_padded_vec4(&json!(3.0)), None);
    }
}
