//! Helpers for entity configuration documents.
//!
//! Entities are configured through structured JSON documents (nested maps,
//! sequences, scalars) supplied by a scene or robot loader. The registry
//! treats these documents opaquely except for a handful of keys with defined
//! meaning: `assembly` (grouping tag), `root` and `main_entity` (assembly
//! role flags), `position`/`rotation` (initial pose), and `anchor`
//! (world-anchoring mode).

use glam::{Quat, Vec3};
use serde_json::{Map, Value};

use crate::physics::Pose;

/// Key carrying the assembly grouping tag.
pub const KEY_ASSEMBLY: &str = "assembly";
/// Key flagging the root entity of an assembly.
pub const KEY_ROOT: &str = "root";
/// Key flagging the main entity of an assembly.
pub const KEY_MAIN_ENTITY: &str = "main_entity";
/// Key holding the initial position, `[x, y, z]`.
pub const KEY_POSITION: &str = "position";
/// Key holding the initial rotation, `[x, y, z, w]` or `{w, x, y, z}`.
pub const KEY_ROTATION: &str = "rotation";
/// Key selecting the anchoring mode (`"none"`, `"world"`, `"parent"`).
pub const KEY_ANCHOR: &str = "anchor";

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge `patch` into `target` at the top level: every key in the patch
/// replaces the same key in the target wholesale. Deterministic, last
/// applied key wins; nested objects are not merged recursively.
pub fn merge_top_level(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

// ---------------------------------------------------------------------------
// Flag and tag reading
// ---------------------------------------------------------------------------

/// Loose boolean reading for config flags. Accepts booleans, non-zero
/// numbers, and the usual affirmative strings; everything else is false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.as_str(), "true" | "True" | "yes" | "1"),
        _ => false,
    }
}

/// Read a truthy flag from a config document; absent keys are false.
pub fn flag(config: &Map<String, Value>, key: &str) -> bool {
    config.get(key).map(truthy).unwrap_or(false)
}

/// The assembly tag, if present and non-empty.
pub fn assembly(config: &Map<String, Value>) -> Option<&str> {
    config
        .get(KEY_ASSEMBLY)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Pose extraction
// ---------------------------------------------------------------------------

/// Read a `[x, y, z]` vector.
pub fn vec3(value: &Value) -> Option<Vec3> {
    let arr = value.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let x = arr[0].as_f64()? as f32;
    let y = arr[1].as_f64()? as f32;
    let z = arr[2].as_f64()? as f32;
    Some(Vec3::new(x, y, z))
}

/// Read a quaternion, either as `[x, y, z, w]` or as an object with
/// `w`/`x`/`y`/`z` keys.
pub fn quat(value: &Value) -> Option<Quat> {
    match value {
        Value::Array(arr) if arr.len() == 4 => {
            let x = arr[0].as_f64()? as f32;
            let y = arr[1].as_f64()? as f32;
            let z = arr[2].as_f64()? as f32;
            let w = arr[3].as_f64()? as f32;
            Some(Quat::from_xyzw(x, y, z, w))
        }
        Value::Object(map) => {
            let get = |k: &str| map.get(k).and_then(Value::as_f64).map(|f| f as f32);
            Some(Quat::from_xyzw(get("x")?, get("y")?, get("z")?, get("w")?))
        }
        _ => None,
    }
}

/// Extract the initial pose from a config document.
///
/// Returns `None` when neither `position` nor `rotation` is present. A
/// document carrying only one of the two gets the identity for the other.
pub fn pose(config: &Map<String, Value>) -> Option<Pose> {
    let position = config.get(KEY_POSITION).and_then(vec3);
    let rotation = config.get(KEY_ROTATION).and_then(quat);
    if position.is_none() && rotation.is_none() {
        return None;
    }
    Some(Pose {
        position: position.unwrap_or(Vec3::ZERO),
        rotation: rotation.unwrap_or(Quat::IDENTITY),
    })
}

/// Whether the document asks for the entity to be anchored. `"none"` and an
/// absent key both mean unanchored.
pub fn anchored(config: &Map<String, Value>) -> bool {
    config
        .get(KEY_ANCHOR)
        .and_then(Value::as_str)
        .is_some_and(|mode| mode != "none")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
