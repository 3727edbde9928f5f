//! Atlas Registry -- thread-safe entity/robot bookkeeping for simulation.
//!
//! This crate provides the entity registry at the core of the Atlas
//! simulation framework. An [`Entity`](entity::Entity) is the record of one
//! simulated robot or assembly member: its name, its configuration document,
//! and the id/name tables of the nodes, motors, joints, sensors, and
//! controllers it owns. The [`EntityRegistry`](registry::EntityRegistry) is
//! the single owner of all entities; it assigns ids, answers exact and
//! glob-pattern queries, manages assembly-wide removal, and notifies
//! subscribers of entity creation.
//!
//! Physical state (poses, masses, bounding volumes, joints) lives in the
//! simulation backend, reached through the narrow
//! [`PhysicsAdapter`](physics::PhysicsAdapter) trait. The registry itself
//! never stores physical state, only id/name associations.
//!
//! # Quick Start
//!
//! ```
//! use atlas_registry::prelude::*;
//!
//! let registry = EntityRegistry::new();
//! let id = registry.add("rover");
//! registry.add_node("rover", 4, "chassis");
//!
//! assert_eq!(registry.entity_node("rover", "chassis"), Some(4));
//! assert_eq!(registry.get(id).unwrap().name(), "rover");
//! ```
//!
//! Lookup misses are signalled through `Option`/empty returns, never through
//! errors: a missing entity must not take down a running simulation.

#![deny(unsafe_code)]

pub mod config;
pub mod entity;
pub mod physics;
pub mod registry;
pub mod subscriber;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when building entities from configuration documents.
///
/// Plain registry lookups never error; this type only surfaces at the
/// document boundary, where a malformed configuration is a caller bug worth
/// reporting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required key is absent from the configuration document.
    #[error("configuration document is missing required key '{0}'")]
    MissingKey(&'static str),

    /// A key is present but holds a value of the wrong shape.
    #[error("configuration key '{key}' has unexpected shape: expected {expected}")]
    BadValue {
        key: &'static str,
        expected: &'static str,
    },

    /// The document root is not an object.
    #[error("configuration document root must be an object")]
    NotAnObject,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{
        ControllerId, Entity, EntityId, JointId, MotorId, NodeId, SensorId,
    };
    pub use crate::physics::{Aabb, PhysicsAdapter, Pose};
    pub use crate::registry::{EntityGuard, EntityRegistry, RemovalScope};
    pub use crate::subscriber::EntitySubscriber;
    pub use crate::ConfigError;
}
