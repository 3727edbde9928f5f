//! Atlas Scene -- scene-description loading for the Atlas entity registry.
//!
//! This crate turns parsed scene documents into registered entities. A scene
//! document is a JSON object whose `entities`/`smurfs` sequences describe
//! robots and assembly members; each entry is dispatched by its `type` key
//! to a registered [`EntityFactory`](factory::EntityFactory), which builds
//! the [`Entity`](atlas_registry::entity::Entity) record that the
//! [`EntityRegistry`](atlas_registry::registry::EntityRegistry) then owns.
//!
//! Reading and unpacking scene files from disk is out of scope here; callers
//! hand over already-parsed `serde_json` documents.
//!
//! # Quick Start
//!
//! ```
//! use atlas_registry::prelude::*;
//! use atlas_scene::loader::SceneLoader;
//! use serde_json::json;
//!
//! let registry = EntityRegistry::new();
//! let loader = SceneLoader::with_default_factories();
//! let scene = json!({
//!     "entities": [
//!         {"name": "rover", "links": [{"name": "chassis"}]},
//!     ]
//! });
//! let ids = loader.load(&scene, &registry).unwrap();
//! assert_eq!(ids.len(), 1);
//! assert_eq!(registry.entity_node("rover", "chassis"), Some(1));
//! ```

#![deny(unsafe_code)]

pub mod factory;
pub mod loader;
pub mod smurf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while turning a scene document into registered entities.
///
/// Unlike the registry's best-effort lookups, loading is a boundary where
/// malformed input is worth failing loudly on.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// No factory is registered for the entry's `type` key.
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    /// The document or one of its entries has an unexpected shape.
    #[error("malformed scene document: {0}")]
    MalformedDocument(String),

    /// An entity configuration was rejected by the registry layer.
    #[error(transparent)]
    Config(#[from] atlas_registry::ConfigError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::factory::{EntityFactory, FactoryManager};
    pub use crate::loader::{SceneLoader, ScenePlacement};
    pub use crate::smurf::SmurfFactory;
    pub use crate::SceneError;
}
