//! The built-in robot-description factory.
//!
//! A robot document is a JSON object with a `name` plus optional `links`,
//! `joints`, `motors`, and `sensors` sequences and a `controllers` id list.
//! The whole document becomes the entity's configuration, so assembly tags,
//! `root`/`main_entity` flags, and pose keys pass straight through to the
//! registry layer.
//!
//! Sub-object entries may carry an explicit `id`; entries without one get
//! sequential ids continuing after the largest explicit id in their
//! category. Id `0` is rejected -- it is the reserved "no id" value
//! throughout the registry. Id uniqueness across entities is the simulation
//! backend's concern, as it is the backend that normally assigns these ids.

use atlas_registry::entity::Entity;
use serde_json::{Map, Value};

use crate::factory::EntityFactory;
use crate::SceneError;

/// Factory for `type: "smurf"` robot-description documents.
pub struct SmurfFactory;

impl SmurfFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SmurfFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityFactory for SmurfFactory {
    fn type_name(&self) -> &str {
        "smurf"
    }

    fn build(&self, document: &Value) -> Result<Entity, SceneError> {
        let Some(map) = document.as_object() else {
            return Err(SceneError::MalformedDocument(
                "robot description must be an object".to_owned(),
            ));
        };
        let mut entity = Entity::from_config(document.clone())?;

        register_category(map, "links", |id, name| entity.add_node(id, name))?;
        register_category(map, "joints", |id, name| entity.add_joint(id, name))?;
        register_category(map, "motors", |id, name| entity.add_motor(id, name))?;
        register_category(map, "sensors", |id, name| entity.add_sensor(id, name))?;
        register_controllers(map, &mut entity)?;

        tracing::debug!(
            name = %entity.name(),
            nodes = entity.all_nodes().len(),
            controllers = entity.controllers().len(),
            "built robot description entity"
        );
        Ok(entity)
    }
}

/// Walk one named/id'd sub-object sequence, handing each entry to `add`.
fn register_category(
    document: &Map<String, Value>,
    category: &str,
    mut add: impl FnMut(u64, &str),
) -> Result<(), SceneError> {
    let Some(value) = document.get(category) else {
        return Ok(());
    };
    let entries = value.as_array().ok_or_else(|| {
        SceneError::MalformedDocument(format!("'{category}' must be an array"))
    })?;

    // Explicit ids win; implicit ones continue after the largest explicit id.
    let mut next_id = entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0);

    for (index, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SceneError::MalformedDocument(format!(
                    "'{category}' entry {index} is missing a name"
                ))
            })?;
        let id = match entry.get("id").and_then(Value::as_u64) {
            Some(0) => {
                return Err(SceneError::MalformedDocument(format!(
                    "'{category}' entry '{name}' uses reserved id 0"
                )))
            }
            Some(id) => id,
            None => {
                next_id += 1;
                next_id
            }
        };
        add(id, name);
    }
    Ok(())
}

fn register_controllers(
    document: &Map<String, Value>,
    entity: &mut Entity,
) -> Result<(), SceneError> {
    let Some(value) = document.get("controllers") else {
        return Ok(());
    };
    let entries = value.as_array().ok_or_else(|| {
        SceneError::MalformedDocument("'controllers' must be an array of ids".to_owned())
    })?;
    for entry in entries {
        let id = entry.as_u64().filter(|&id| id != 0).ok_or_else(|| {
            SceneError::MalformedDocument("controller ids must be non-zero integers".to_owned())
        })?;
        entity.add_controller(id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
