//! The global entity registry.
//!
//! [`EntityRegistry`] is the single entry point for all mutation of the
//! entity set and the exclusive owner of every [`Entity`] it holds. It
//! assigns ids (starting at 1, strictly increasing, never reused), resolves
//! exact-name and glob-pattern queries, manages assembly-wide removal, and
//! notifies subscribers of entity creation.
//!
//! # Lookup modes
//!
//! Exact lookups (`entity_by_name`, the name-indexed `add_*` operations)
//! compare names with `==`. Pattern lookups (`ids_matching`,
//! `entities_of_assembly` and the assembly root/main queries,
//! `remove_assembly`) use glob syntax (`*`, `?`). The two modes are never
//! mixed: an entity named `arm*` is only found by the exact lookups under
//! that literal name.
//!
//! # Locking
//!
//! One reader-writer lock guards the whole registry state. Every operation,
//! read or write, takes it; there are no lock-free traversals, so queries
//! from GUI or scripting threads stay consistent with concurrent mutation
//! from the simulation thread. The lock is not reentrant: callers holding a
//! guard returned by [`get`](EntityRegistry::get) must drop it before
//! calling mutating registry methods.

use std::sync::{Arc, Weak};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use wildmatch::WildMatch;

use crate::entity::{ControllerId, Entity, EntityId, JointId, MotorId, NodeId, SensorId};
use crate::physics::PhysicsAdapter;
use crate::subscriber::EntitySubscriber;

/// Shared read access to a single registered entity.
pub type EntityGuard<'a> = MappedRwLockReadGuard<'a, Entity>;

// ---------------------------------------------------------------------------
// RemovalScope
// ---------------------------------------------------------------------------

/// How much to remove when removing an entity by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalScope {
    /// Remove only the named entity.
    Entity,
    /// If the named entity belongs to an assembly, remove the whole
    /// assembly; otherwise fall back to removing just the entity.
    Assembly,
}

// ---------------------------------------------------------------------------
// Registry state
// ---------------------------------------------------------------------------

struct RegistryState {
    /// Id-ordered entity map. Ids are monotonic, so iteration order equals
    /// insertion order and "first match" ties resolve to the oldest entity.
    entities: std::collections::BTreeMap<EntityId, Entity>,
    /// Next id to hand out. Starts at 1; 0 stays reserved as "invalid".
    next_id: u64,
    /// Creation observers. Non-owning; dead entries are pruned on insert.
    subscribers: Vec<Weak<dyn EntitySubscriber>>,
}

impl RegistryState {
    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// First entity (in id order) with exactly the given name.
    fn id_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, entity)| entity.name() == name)
            .map(|(&id, _)| id)
    }

    /// Ids of all entities whose assembly tag glob-matches the pattern.
    /// Entities without an assembly tag never match.
    fn assembly_members(&self, pattern: &str) -> Vec<EntityId> {
        let matcher = WildMatch::new(pattern);
        self.entities
            .iter()
            .filter(|(_, entity)| entity.assembly().is_some_and(|tag| matcher.matches(tag)))
            .map(|(&id, _)| id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// The id-indexed registry of all simulated entities.
pub struct EntityRegistry {
    inner: RwLock<RegistryState>,
}

impl EntityRegistry {
    /// Create an empty registry. The first assigned id is 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState {
                entities: std::collections::BTreeMap::new(),
                next_id: 1,
                subscribers: Vec::new(),
            }),
        }
    }

    // -- creation -----------------------------------------------------------

    /// Create a new empty entity with the given name and register it.
    /// Subscribers are notified before the call returns.
    pub fn add(&self, name: impl Into<String>) -> EntityId {
        self.insert(Entity::new(name))
    }

    /// Register an already-built entity, taking ownership. The registry is
    /// the sole owner from this point on. Subscribers are notified before
    /// the call returns.
    pub fn insert(&self, entity: Entity) -> EntityId {
        let mut state = self.inner.write();
        state.subscribers.retain(|sub| sub.strong_count() > 0);
        let id = state.allocate_id();
        tracing::debug!(%id, name = %entity.name(), "registering entity");
        state.entities.insert(id, entity);
        let subscribers: Vec<_> = state.subscribers.iter().filter_map(Weak::upgrade).collect();

        // Downgrade before notifying: callbacks see the fully inserted
        // entity and concurrent readers are not blocked out, but they must
        // not call mutating registry methods.
        let state = RwLockReadGuard::map(RwLockWriteGuard::downgrade(state), |s| &s.entities);
        if let Some(entity) = state.get(&id) {
            for subscriber in subscribers {
                subscriber.entity_registered(id, entity);
            }
        }
        id
    }

    /// Register a creation observer. Returns the ids registered so far, so
    /// the subscriber can catch up on entities that predate it. The
    /// registry keeps only a weak reference.
    pub fn subscribe(&self, subscriber: Arc<dyn EntitySubscriber>) -> Vec<EntityId> {
        let mut state = self.inner.write();
        state.subscribers.push(Arc::downgrade(&subscriber));
        state.entities.keys().copied().collect()
    }

    // -- removal ------------------------------------------------------------

    /// Remove the first entity with the given name. With
    /// [`RemovalScope::Assembly`], an entity carrying an assembly tag takes
    /// its whole assembly down with it. Unknown names are a silent no-op.
    ///
    /// The entity is erased from the registry before its teardown runs, so
    /// no query can observe a half-removed entity.
    pub fn remove(&self, name: &str, scope: RemovalScope, adapter: &mut dyn PhysicsAdapter) {
        let mut state = self.inner.write();
        let Some(id) = state.id_by_name(name) else {
            tracing::debug!(name, "remove: no such entity");
            return;
        };
        let assembly = state
            .entities
            .get(&id)
            .and_then(|entity| entity.assembly().map(str::to_owned));
        match (scope, assembly) {
            (RemovalScope::Assembly, Some(tag)) => {
                Self::remove_assembly_locked(&mut state, &tag, adapter);
            }
            _ => {
                if let Some(mut entity) = state.entities.remove(&id) {
                    entity.teardown(adapter);
                }
            }
        }
    }

    /// Remove every entity whose assembly tag glob-matches the pattern.
    /// Entities of other assemblies (or with no assembly) are untouched.
    pub fn remove_assembly(&self, pattern: &str, adapter: &mut dyn PhysicsAdapter) {
        let mut state = self.inner.write();
        Self::remove_assembly_locked(&mut state, pattern, adapter);
    }

    fn remove_assembly_locked(
        state: &mut RegistryState,
        pattern: &str,
        adapter: &mut dyn PhysicsAdapter,
    ) {
        for id in state.assembly_members(pattern) {
            if let Some(mut entity) = state.entities.remove(&id) {
                tracing::info!(%id, name = %entity.name(), "removing assembly member");
                entity.teardown(adapter);
            }
        }
    }

    // -- configuration and sub-object registration --------------------------

    /// Merge new configuration keys into the named entity. Unknown names
    /// are a silent no-op.
    pub fn append_config(&self, name: &str, patch: &Value) {
        self.with_entity_mut(name, |entity| entity.append_config(patch));
    }

    /// Record a node as belonging to the named entity.
    pub fn add_node(&self, entity_name: &str, node: NodeId, node_name: &str) {
        self.with_entity_mut(entity_name, |entity| entity.add_node(node, node_name));
    }

    /// Record a motor as belonging to the named entity.
    pub fn add_motor(&self, entity_name: &str, motor: MotorId, motor_name: &str) {
        self.with_entity_mut(entity_name, |entity| entity.add_motor(motor, motor_name));
    }

    /// Record a joint as belonging to the named entity.
    pub fn add_joint(&self, entity_name: &str, joint: JointId, joint_name: &str) {
        self.with_entity_mut(entity_name, |entity| entity.add_joint(joint, joint_name));
    }

    /// Record a sensor as belonging to the named entity.
    pub fn add_sensor(&self, entity_name: &str, sensor: SensorId, sensor_name: &str) {
        self.with_entity_mut(entity_name, |entity| entity.add_sensor(sensor, sensor_name));
    }

    /// Append a controller id to the named entity's controller list.
    pub fn add_controller(&self, entity_name: &str, controller: ControllerId) {
        self.with_entity_mut(entity_name, |entity| entity.add_controller(controller));
    }

    fn with_entity_mut(&self, name: &str, f: impl FnOnce(&mut Entity)) {
        let mut state = self.inner.write();
        let Some(id) = state.id_by_name(name) else {
            tracing::debug!(name, "no such entity");
            return;
        };
        if let Some(entity) = state.entities.get_mut(&id) {
            f(entity);
        }
    }

    // -- selection events ---------------------------------------------------

    /// Viewport picking event. On selection, every entity is asked in id
    /// order whether it owns the node; the first claimant marks the node
    /// selected.
    ///
    /// Deselection events (`selected == false`) are accepted but not acted
    /// upon: deselection state is managed per entity via
    /// [`Entity::deselect`], not through this event path.
    pub fn select_event(&self, node: NodeId, selected: bool) {
        if !selected {
            tracing::trace!(node, "deselect event ignored");
            return;
        }
        let mut state = self.inner.write();
        for (id, entity) in state.entities.iter_mut() {
            if entity.select(node) {
                tracing::info!(%id, name = %entity.name(), node, "entity selected");
                break;
            }
        }
    }

    // -- exact lookup -------------------------------------------------------

    /// Borrow the entity with the given id.
    ///
    /// The returned guard holds the registry's read lock; drop it before
    /// calling mutating registry methods.
    pub fn get(&self, id: EntityId) -> Option<EntityGuard<'_>> {
        RwLockReadGuard::try_map(self.inner.read(), |state| state.entities.get(&id)).ok()
    }

    /// Borrow the first entity (in id order) with exactly the given name,
    /// logging a diagnostic on a miss.
    pub fn entity_by_name(&self, name: &str) -> Option<EntityGuard<'_>> {
        self.entity_by_name_verbose(name, true)
    }

    /// Like [`entity_by_name`](Self::entity_by_name), with the miss
    /// diagnostic made optional.
    pub fn entity_by_name_verbose(&self, name: &str, verbose: bool) -> Option<EntityGuard<'_>> {
        let guard = RwLockReadGuard::try_map(self.inner.read(), |state| {
            state
                .id_by_name(name)
                .and_then(|id| state.entities.get(&id))
        })
        .ok();
        if guard.is_none() && verbose {
            tracing::warn!(name, "entity not found");
        }
        guard
    }

    /// Id of the first entity with exactly the given name.
    pub fn id_by_name(&self, name: &str) -> Option<EntityId> {
        self.inner.read().id_by_name(name)
    }

    // -- pattern lookup -----------------------------------------------------

    /// Ids of all entities whose name glob-matches the pattern, in id order.
    pub fn ids_matching(&self, pattern: &str) -> Vec<EntityId> {
        let matcher = WildMatch::new(pattern);
        self.inner
            .read()
            .entities
            .iter()
            .filter(|(_, entity)| matcher.matches(entity.name()))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Ids of all entities whose assembly tag glob-matches the pattern, in
    /// id order. Entities without an assembly tag never match.
    pub fn entities_of_assembly(&self, pattern: &str) -> Vec<EntityId> {
        self.inner.read().assembly_members(pattern)
    }

    /// The entity of the matching assembly whose configuration flags it as
    /// `root`. `None` when no member is flagged.
    pub fn root_of_assembly(&self, pattern: &str) -> Option<EntityId> {
        let state = self.inner.read();
        state
            .assembly_members(pattern)
            .into_iter()
            .find(|id| state.entities[id].is_assembly_root())
    }

    /// The entity of the matching assembly flagged `main_entity`, falling
    /// back to the assembly root when none is flagged.
    pub fn main_entity_of_assembly(&self, pattern: &str) -> Option<EntityId> {
        let state = self.inner.read();
        let members = state.assembly_members(pattern);
        members
            .iter()
            .copied()
            .find(|id| state.entities[id].is_main_entity())
            .or_else(|| {
                members
                    .into_iter()
                    .find(|id| state.entities[id].is_assembly_root())
            })
    }

    // -- sub-object resolution ----------------------------------------------

    /// Id of the named node of the named entity.
    pub fn entity_node(&self, entity_name: &str, node_name: &str) -> Option<NodeId> {
        self.with_entity(entity_name, |entity| entity.node_id(node_name))
            .flatten()
    }

    /// Id of the named motor of the named entity.
    pub fn entity_motor(&self, entity_name: &str, motor_name: &str) -> Option<MotorId> {
        self.with_entity(entity_name, |entity| entity.motor_id(motor_name))
            .flatten()
    }

    /// Id of the named sensor of the named entity.
    pub fn entity_sensor(&self, entity_name: &str, sensor_name: &str) -> Option<SensorId> {
        self.with_entity(entity_name, |entity| entity.sensor_id(sensor_name))
            .flatten()
    }

    /// Id of the named joint of the named entity.
    pub fn entity_joint(&self, entity_name: &str, joint_name: &str) -> Option<JointId> {
        self.with_entity(entity_name, |entity| entity.joint_id(joint_name))
            .flatten()
    }

    /// The named entity's controller ids, empty when the entity is unknown.
    pub fn entity_controllers(&self, entity_name: &str) -> Vec<ControllerId> {
        self.with_entity(entity_name, |entity| entity.controllers().to_vec())
            .unwrap_or_default()
    }

    fn with_entity<R>(&self, name: &str, f: impl FnOnce(&Entity) -> R) -> Option<R> {
        let state = self.inner.read();
        let id = state.id_by_name(name)?;
        state.entities.get(&id).map(f)
    }

    // -- pose ---------------------------------------------------------------

    /// Reset every entity to its initial pose.
    ///
    /// Two phases: first every anchor joint is removed, then every entity's
    /// initial pose is applied. Anchors come off globally before any pose
    /// changes so that no entity is moved while still constrained against
    /// another one.
    pub fn reset_pose(&self, adapter: &mut dyn PhysicsAdapter) {
        let mut state = self.inner.write();
        for entity in state.entities.values_mut() {
            entity.remove_anchor(adapter);
        }
        for entity in state.entities.values_mut() {
            entity.set_initial_pose(adapter, true, None);
        }
    }

    // -- diagnostics --------------------------------------------------------

    /// Dump the named entity's node table to the trace output.
    pub fn log_entity_nodes(&self, name: &str) {
        let _ = self.with_entity(name, |entity| entity.log_nodes());
    }

    /// Dump the named entity's motor table to the trace output.
    pub fn log_entity_motors(&self, name: &str) {
        let _ = self.with_entity(name, |entity| entity.log_motors());
    }

    /// Dump the named entity's controller list to the trace output.
    pub fn log_entity_controllers(&self, name: &str) {
        let _ = self.with_entity(name, |entity| entity.log_controllers());
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.inner.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entities.is_empty()
    }

    /// All registered ids, in id (= creation) order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.inner.read().entities.keys().copied().collect()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
