//! Entity factories and their registry.
//!
//! A factory knows how to turn one kind of configuration document into an
//! [`Entity`] record. The [`FactoryManager`] dispatches scene entries to
//! factories by type name (case-insensitive), so loaders never hard-code
//! entity kinds.

use std::collections::HashMap;

use atlas_registry::entity::Entity;
use serde_json::Value;

use crate::smurf::SmurfFactory;
use crate::SceneError;

// ---------------------------------------------------------------------------
// EntityFactory
// ---------------------------------------------------------------------------

/// Builds entity records from configuration documents of one type.
pub trait EntityFactory: Send + Sync {
    /// The `type` key this factory handles, e.g. `"smurf"`.
    fn type_name(&self) -> &str;

    /// Build an entity from its configuration document.
    fn build(&self, document: &Value) -> Result<Entity, SceneError>;
}

// ---------------------------------------------------------------------------
// FactoryManager
// ---------------------------------------------------------------------------

/// Registry of entity factories, keyed by lower-cased type name.
pub struct FactoryManager {
    factories: HashMap<String, Box<dyn EntityFactory>>,
}

impl FactoryManager {
    /// An empty manager with no factories registered.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A manager with the built-in robot-description factory registered.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(SmurfFactory::new()));
        manager
    }

    /// Register a factory under its type name. Re-registering a type name
    /// replaces the previous factory.
    pub fn register(&mut self, factory: Box<dyn EntityFactory>) {
        let key = factory.type_name().to_lowercase();
        tracing::debug!(type_name = %key, "registering entity factory");
        self.factories.insert(key, factory);
    }

    /// Build an entity of the given type from its document.
    pub fn build(&self, type_name: &str, document: &Value) -> Result<Entity, SceneError> {
        let factory = self
            .factories
            .get(&type_name.to_lowercase())
            .ok_or_else(|| SceneError::UnknownEntityType(type_name.to_owned()))?;
        factory.build(document)
    }

    /// Whether a factory is registered for the type name.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(&type_name.to_lowercase())
    }

    /// The registered type names, in no particular order.
    pub fn type_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for FactoryManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
