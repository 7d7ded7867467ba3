//! Copy-in/copy-out between a [`SceneObject`] and the script-side `self` map.
//!
//! Only an allow-listed projection of the object crosses the boundary.
//! Copy-back builds the new state first and assigns it only if every field
//! converts, so a bad write never leaves an object half-updated.

use crate::object::SceneObject;
use crate::shapes::{hex_to_rgb, ColorError, Rgb, Shape, ShapeColor, ShapeKind, UnknownShapeKind};
use kurbo::{Point, Size};
use rhai::{Array, Dynamic, Map, FLOAT, INT};
use serde_json::Value;
use thiserror::Error;

pub const KEY_KIND: &str = "kind";
pub const KEY_POSITION: &str = "position";
pub const KEY_SIZE: &str = "size";
pub const KEY_RADIUS: &str = "radius";
pub const KEY_COLOR: &str = "color";
pub const KEY_TEXT: &str = "text";
pub const KEY_FONT_SIZE: &str = "font_size";

/// Keys a script may see but never write back.
const READ_ONLY: &[&str] = &[KEY_RADIUS];
/// Editor/runtime state that never crosses into a script.
const RESERVED: &[&str] = &["selected", "script", "id"];

/// Errors converting the script-side map back into native fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    #[error("`self` was replaced by a {0}, expected an object map")]
    NotAMap(String),
    #[error("field `{field}` expects {expected}, got {got}")]
    Field {
        field: &'static str,
        expected: &'static str,
        got: String,
    },
    #[error("field `color`: {0}")]
    Color(#[from] ColorError),
    #[error("field `kind`: {0}")]
    Kind(#[from] UnknownShapeKind),
}

fn field_error(field: &'static str, expected: &'static str, value: &Dynamic) -> MarshalError {
    MarshalError::Field {
        field,
        expected,
        got: value.type_name().to_string(),
    }
}

fn pair(a: f64, b: f64) -> Dynamic {
    Dynamic::from_array(vec![Dynamic::from_float(a as FLOAT), Dynamic::from_float(b as FLOAT)])
}

/// Build the `self` map for an object.
pub fn project(object: &SceneObject) -> Map {
    let shape = &object.shape;
    let mut map = Map::new();
    map.insert(KEY_KIND.into(), Dynamic::from(shape.kind.as_str().to_string()));
    map.insert(KEY_POSITION.into(), pair(shape.position.x, shape.position.y));
    map.insert(KEY_SIZE.into(), pair(shape.size.width, shape.size.height));
    map.insert(KEY_RADIUS.into(), Dynamic::from_float(shape.radius() as FLOAT));
    let color = match &shape.color {
        ShapeColor::Rgb(rgb) => Dynamic::from_array(
            [rgb.r, rgb.g, rgb.b]
                .iter()
                .map(|&c| Dynamic::from_int(INT::from(c)))
                .collect(),
        ),
        ShapeColor::Hex(hex) => Dynamic::from(hex.clone()),
    };
    map.insert(KEY_COLOR.into(), color);
    map.insert(KEY_TEXT.into(), Dynamic::from(shape.text.clone()));
    map.insert(KEY_FONT_SIZE.into(), Dynamic::from_int(INT::from(shape.font_size)));
    for (key, value) in &object.extras {
        map.insert(key.as_str().into(), json_to_dynamic(value));
    }
    map
}

/// Copy every key of `map` back onto `object`.
///
/// Returns the names of new fields that could not be kept because their
/// values have no data form (functions, closures).
pub fn apply(object: &mut SceneObject, map: &Map) -> Result<Vec<String>, MarshalError> {
    let mut shape: Shape = object.shape.clone();
    let mut extras = object.extras.clone();
    let mut dropped = Vec::new();

    for (key, value) in map {
        match key.as_str() {
            KEY_KIND => {
                let name = value
                    .clone()
                    .into_string()
                    .map_err(|_| field_error("kind", "a kind name", value))?;
                shape.kind = name.parse()?;
            }
            KEY_POSITION => {
                let (x, y) = read_pair(value, "position", ("x", "y"))?;
                shape.position = Point::new(x, y);
            }
            KEY_SIZE => {
                let (w, h) = read_pair(value, "size", ("w", "h"))?;
                shape.size = Size::new(w, h);
            }
            KEY_COLOR => shape.color = read_color(value)?,
            KEY_TEXT => {
                shape.text = value
                    .clone()
                    .into_string()
                    .map_err(|_| field_error("text", "a string", value))?;
            }
            KEY_FONT_SIZE => {
                let size = read_number(value).ok_or_else(|| field_error("font_size", "a number", value))?;
                if !(size >= 1.0 && size <= f64::from(u32::MAX)) {
                    return Err(MarshalError::Field {
                        field: "font_size",
                        expected: "a positive size",
                        got: size.to_string(),
                    });
                }
                shape.font_size = size.round() as u32;
            }
            k if READ_ONLY.contains(&k) => {}
            k if RESERVED.contains(&k) => {
                log::warn!("Script tried to write reserved field `{}`; ignored", k);
            }
            k => match dynamic_to_json(value) {
                Some(json) => {
                    extras.insert(k.to_string(), json);
                }
                None => {
                    log::warn!("Dropping script field `{}` of unsupported type {}", k, value.type_name());
                    dropped.push(k.to_string());
                }
            },
        }
    }

    object.shape = shape;
    object.extras = extras;
    Ok(dropped)
}

fn read_number(value: &Dynamic) -> Option<f64> {
    if let Ok(f) = value.as_float() {
        return Some(f as f64);
    }
    value.as_int().ok().map(|i| i as f64)
}

/// Accept `[a, b]` or `#{ x: a, y: b }` (keys given by `names`).
fn read_pair(value: &Dynamic, field: &'static str, names: (&str, &str)) -> Result<(f64, f64), MarshalError> {
    const EXPECTED: &str = "a pair of numbers";
    if let Some(arr) = value.clone().try_cast::<Array>() {
        if let [a, b] = arr.as_slice() {
            if let (Some(a), Some(b)) = (read_number(a), read_number(b)) {
                return Ok((a, b));
            }
        }
        return Err(field_error(field, EXPECTED, value));
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        let a = map.get(names.0).and_then(read_number);
        let b = map.get(names.1).and_then(read_number);
        if let (Some(a), Some(b)) = (a, b) {
            return Ok((a, b));
        }
    }
    Err(field_error(field, EXPECTED, value))
}

fn read_color(value: &Dynamic) -> Result<ShapeColor, MarshalError> {
    const EXPECTED: &str = "[r, g, b] or a #rrggbb string";
    if let Ok(hex) = value.clone().into_string() {
        hex_to_rgb(&hex)?;
        return Ok(ShapeColor::Hex(hex));
    }
    let Some(arr) = value.clone().try_cast::<Array>() else {
        return Err(field_error("color", EXPECTED, value));
    };
    let channels: Vec<u8> = arr
        .iter()
        .filter_map(|c| c.as_int().ok())
        .filter_map(|c| u8::try_from(c).ok())
        .collect();
    match channels.as_slice() {
        [r, g, b] if arr.len() == 3 => Ok(ShapeColor::Rgb(Rgb::new(*r, *g, *b))),
        _ => Err(field_error("color", EXPECTED, value)),
    }
}

/// Convert script state into JSON for storage as an extra field.
/// Returns `None` for values with no data representation (functions, custom types).
pub fn dynamic_to_json(value: &Dynamic) -> Option<Value> {
    if value.is_unit() {
        return Some(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Some(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Some(Value::from(i));
    }
    if let Ok(f) = value.as_float() {
        return Some(serde_json::Number::from_f64(f as f64).map_or(Value::Null, Value::Number));
    }
    if let Ok(c) = value.as_char() {
        return Some(Value::String(c.to_string()));
    }
    if value.is_string() {
        return value.clone().into_string().ok().map(Value::String);
    }
    if let Some(arr) = value.clone().try_cast::<Array>() {
        return arr.iter().map(dynamic_to_json).collect::<Option<Vec<_>>>().map(Value::Array);
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        return map
            .iter()
            .map(|(k, v)| dynamic_to_json(v).map(|v| (k.to_string(), v)))
            .collect::<Option<serde_json::Map<_, _>>>()
            .map(Value::Object);
    }
    None
}

/// Convert a stored extra field back into a script value.
pub fn json_to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from_bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::from_int(i as INT),
            None => Dynamic::from_float(n.as_f64().unwrap_or_default() as FLOAT),
        },
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => Dynamic::from_array(items.iter().map(json_to_dynamic).collect()),
        Value::Object(fields) => {
            let map: Map = fields
                .iter()
                .map(|(k, v)| (k.as_str().into(), json_to_dynamic(v)))
                .collect();
            Dynamic::from_map(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SceneObject {
        SceneObject::new_shape(ShapeKind::Square, Point::new(10.0, 10.0), Size::new(50.0, 50.0), Rgb::blue())
            .with_script("let x = 1;")
    }

    #[test]
    fn test_projection_is_allow_listed() {
        let obj = square();
        let map = project(&obj);
        for key in ["selected", "script", "id"] {
            assert!(!map.contains_key(key), "{key} must not be exposed");
        }
        assert_eq!(map.get("kind").unwrap().clone().into_string().unwrap(), "square");
        assert!((map.get("radius").unwrap().as_float().unwrap() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unchanged_round_trip() {
        let mut obj = square();
        let before = obj.clone();
        let map = project(&obj);
        apply(&mut obj, &map).unwrap();
        assert_eq!(obj, before);
    }

    #[test]
    fn test_apply_accepts_ints_and_maps() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("position".into(), Dynamic::from_array(vec![Dynamic::from_int(100), Dynamic::from_int(100)]));
        let mut size = Map::new();
        size.insert("w".into(), Dynamic::from_float(80.0));
        size.insert("h".into(), Dynamic::from_int(20));
        map.insert("size".into(), Dynamic::from_map(size));
        apply(&mut obj, &map).unwrap();

        assert_eq!(obj.shape.position, Point::new(100.0, 100.0));
        assert_eq!(obj.shape.size, Size::new(80.0, 20.0));
        assert!((obj.shape.radius() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reserved_and_read_only_ignored() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("selected".into(), Dynamic::from_bool(true));
        map.insert("script".into(), Dynamic::from("evil".to_string()));
        map.insert("radius".into(), Dynamic::from_float(999.0));
        apply(&mut obj, &map).unwrap();

        assert!(!obj.is_selected());
        assert_eq!(obj.script, "let x = 1;");
        assert!((obj.shape.radius() - 25.0).abs() < f64::EPSILON);
        assert!(obj.extras.is_empty());
    }

    #[test]
    fn test_new_fields_become_extras() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("speed".into(), Dynamic::from_int(3));
        map.insert("tags".into(), Dynamic::from_array(vec![Dynamic::from("a".to_string())]));
        apply(&mut obj, &map).unwrap();

        assert_eq!(obj.extras.get("speed"), Some(&Value::from(3)));
        assert_eq!(obj.extras.get("tags"), Some(&serde_json::json!(["a"])));

        // extras are projected on the next run
        let map = project(&obj);
        assert_eq!(map.get("speed").unwrap().as_int().unwrap(), 3);
        assert_eq!(map.get("tags").unwrap().clone().into_array().unwrap().len(), 1);
    }

    #[test]
    fn test_function_fields_are_reported() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("n".into(), Dynamic::from_int(1));
        map.insert("update".into(), Dynamic::from(rhai::FnPtr::new("update").unwrap()));
        let dropped = apply(&mut obj, &map).unwrap();

        assert_eq!(dropped, vec!["update".to_string()]);
        assert_eq!(obj.extras.get("n"), Some(&Value::from(1)));
        assert!(!obj.extras.contains_key("update"));
    }

    #[test]
    fn test_bad_write_is_atomic() {
        let mut obj = square();
        let before = obj.clone();
        let mut map = project(&obj);
        map.insert("position".into(), Dynamic::from_array(vec![Dynamic::from_int(1), Dynamic::from_int(2)]));
        map.insert("text".into(), Dynamic::from_int(7));
        let err = apply(&mut obj, &map).unwrap_err();

        assert!(matches!(err, MarshalError::Field { field: "text", .. }));
        assert_eq!(obj, before);
    }

    #[test]
    fn test_color_writes() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("color".into(), Dynamic::from("#ff8800".to_string()));
        apply(&mut obj, &map).unwrap();
        assert_eq!(obj.shape.color, ShapeColor::Hex("#ff8800".to_string()));

        map.insert("color".into(), Dynamic::from("#ff88".to_string()));
        assert!(matches!(apply(&mut obj, &map), Err(MarshalError::Color(_))));

        map.insert(
            "color".into(),
            Dynamic::from_array(vec![Dynamic::from_int(1), Dynamic::from_int(2), Dynamic::from_int(300)]),
        );
        assert!(matches!(apply(&mut obj, &map), Err(MarshalError::Field { field: "color", .. })));
    }

    #[test]
    fn test_kind_write() {
        let mut obj = square();
        let mut map = project(&obj);
        map.insert("kind".into(), Dynamic::from("circle".to_string()));
        apply(&mut obj, &map).unwrap();
        assert_eq!(obj.shape.kind, ShapeKind::Circle);

        map.insert("kind".into(), Dynamic::from("hexagon".to_string()));
        assert!(matches!(apply(&mut obj, &map), Err(MarshalError::Kind(_))));
    }
}
