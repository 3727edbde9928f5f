//! Scene loading: from a parsed scene document to registered entities.
//!
//! A scene document is a JSON object carrying `entities` and/or `smurfs`
//! sequences (both are walked; the two names exist because robot
//! descriptions and plain scene objects historically lived in separate
//! lists). Each entry is an entity configuration document with an optional
//! `type` key selecting the factory, defaulting to `"smurf"`.
//!
//! A [`ScenePlacement`] can be applied while loading to drop a whole scene
//! file somewhere else in the world: it transforms every entity's configured
//! pose and can request anchoring.

use atlas_registry::config::{self, KEY_ANCHOR, KEY_POSITION, KEY_ROTATION};
use atlas_registry::entity::EntityId;
use atlas_registry::physics::Pose;
use atlas_registry::registry::EntityRegistry;
use glam::{Quat, Vec3};
use serde_json::{json, Map, Value};

use crate::factory::FactoryManager;
use crate::SceneError;

/// Factory type used for entries without a `type` key.
const DEFAULT_ENTITY_TYPE: &str = "smurf";

// ---------------------------------------------------------------------------
// ScenePlacement
// ---------------------------------------------------------------------------

/// Where and how to place the entities of a scene document.
///
/// The placement pose is composed with each entity's own configured pose:
/// entity positions are rotated and translated into the placement frame,
/// entity rotations are pre-multiplied. `anchor` other than `"none"`
/// requests world-anchoring for every placed entity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScenePlacement {
    pub position: Vec3,
    pub rotation: Quat,
    pub anchor: String,
    pub parent: String,
}

impl Default for ScenePlacement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            anchor: "none".to_owned(),
            parent: "world".to_owned(),
        }
    }
}

impl ScenePlacement {
    /// A placement that only translates.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Compose this placement onto an entity configuration, rewriting its
    /// `position`/`rotation` keys and recording `anchor`/`parent` when they
    /// differ from the defaults.
    pub fn apply(&self, entity_config: &mut Map<String, Value>) {
        let own = config::pose(entity_config).unwrap_or(Pose::IDENTITY);
        let position = self.rotation * own.position + self.position;
        let rotation = self.rotation * own.rotation;
        entity_config.insert(
            KEY_POSITION.to_owned(),
            json!([position.x, position.y, position.z]),
        );
        entity_config.insert(
            KEY_ROTATION.to_owned(),
            json!([rotation.x, rotation.y, rotation.z, rotation.w]),
        );
        if self.anchor != "none" {
            entity_config.insert(KEY_ANCHOR.to_owned(), json!(self.anchor));
        }
        if self.parent != "world" {
            entity_config.insert("parent".to_owned(), json!(self.parent));
        }
    }
}

// ---------------------------------------------------------------------------
// SceneLoader
// ---------------------------------------------------------------------------

/// Loads scene documents into an [`EntityRegistry`].
pub struct SceneLoader {
    factories: FactoryManager,
}

impl SceneLoader {
    /// A loader dispatching to the given factories.
    pub fn new(factories: FactoryManager) -> Self {
        Self { factories }
    }

    /// A loader with the built-in factories registered.
    pub fn with_default_factories() -> Self {
        Self::new(FactoryManager::with_defaults())
    }

    /// The factory registry, for registering additional entity types.
    pub fn factories_mut(&mut self) -> &mut FactoryManager {
        &mut self.factories
    }

    /// Load every entity of the document into the registry, in document
    /// order. Returns the assigned ids.
    ///
    /// Loading stops at the first malformed entry; entities registered
    /// before the failure stay registered.
    pub fn load(
        &self,
        document: &Value,
        registry: &EntityRegistry,
    ) -> Result<Vec<EntityId>, SceneError> {
        self.load_with(document, None, registry)
    }

    /// Like [`load`](Self::load), with a placement composed onto every
    /// entity's configured pose.
    pub fn load_placed(
        &self,
        document: &Value,
        placement: &ScenePlacement,
        registry: &EntityRegistry,
    ) -> Result<Vec<EntityId>, SceneError> {
        self.load_with(document, Some(placement), registry)
    }

    fn load_with(
        &self,
        document: &Value,
        placement: Option<&ScenePlacement>,
        registry: &EntityRegistry,
    ) -> Result<Vec<EntityId>, SceneError> {
        let Some(root) = document.as_object() else {
            return Err(SceneError::MalformedDocument(
                "scene root must be an object".to_owned(),
            ));
        };

        let mut ids = Vec::new();
        for list_key in ["entities", "smurfs"] {
            let Some(list) = root.get(list_key) else {
                continue;
            };
            let entries = list.as_array().ok_or_else(|| {
                SceneError::MalformedDocument(format!("'{list_key}' must be an array"))
            })?;
            for (index, entry) in entries.iter().enumerate() {
                let id = self.load_entry(list_key, index, entry, placement, registry)?;
                ids.push(id);
            }
        }
        tracing::info!(count = ids.len(), "scene loaded");
        Ok(ids)
    }

    fn load_entry(
        &self,
        list_key: &str,
        index: usize,
        entry: &Value,
        placement: Option<&ScenePlacement>,
        registry: &EntityRegistry,
    ) -> Result<EntityId, SceneError> {
        let Some(map) = entry.as_object() else {
            return Err(SceneError::MalformedDocument(format!(
                "'{list_key}' entry {index} must be an object"
            )));
        };
        let type_name = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ENTITY_TYPE);

        let document = match placement {
            Some(placement) => {
                let mut placed = map.clone();
                placement.apply(&mut placed);
                Value::Object(placed)
            }
            None => entry.clone(),
        };

        let entity = self.factories.build(type_name, &document)?;
        let name = entity.name().to_owned();
        let id = registry.insert(entity);
        tracing::debug!(%id, name = %name, type_name, "entity loaded into registry");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
