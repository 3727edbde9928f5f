//! Entity records: identity, sub-object tables, selection, and the
//! aggregate physical queries of one simulated robot.
//!
//! An [`Entity`] owns no physical state. It records which node, motor,
//! joint, sensor, and controller ids belong to the robot and under which
//! names, carries the robot's configuration document, and aggregates
//! per-node physics results (mass, center of mass, bounding box) fetched
//! through a [`PhysicsAdapter`].
//!
//! All by-name and by-id lookups signal a miss with `None`. Raw sub-object
//! ids reserve `0` as "no id", so the simulation backend must never hand out
//! id `0` for a live node, motor, joint, or sensor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config;
use crate::physics::{Aabb, PhysicsAdapter, Pose};
use crate::ConfigError;

/// Raw id of a node owned by an entity. `0` is reserved for "no id".
pub type NodeId = u64;
/// Raw id of a joint. `0` is reserved.
pub type JointId = u64;
/// Raw id of a motor. `0` is reserved.
pub type MotorId = u64;
/// Raw id of a sensor. `0` is reserved.
pub type SensorId = u64;
/// Raw id of a controller. `0` is reserved.
pub type ControllerId = u64;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Identifier of a registered entity.
///
/// Assigned by the registry, starting at 1 and strictly increasing for the
/// lifetime of the process; ids are never reused after removal. The raw
/// value `0` is reserved and never assigned, keeping the "invalid id"
/// sentinel meaningful for callers that move raw ids across FFI or config
/// boundaries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// The record of one simulated robot or assembly member.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    config: Map<String, Value>,
    anchor_joint: Option<JointId>,
    nodes: BTreeMap<NodeId, String>,
    motors: BTreeMap<MotorId, String>,
    joints: BTreeMap<JointId, String>,
    sensors: BTreeMap<SensorId, String>,
    controllers: Vec<ControllerId>,
    selected_nodes: BTreeSet<NodeId>,
}

impl Entity {
    /// Create an empty entity with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Map::new(),
            anchor_joint: None,
            nodes: BTreeMap::new(),
            motors: BTreeMap::new(),
            joints: BTreeMap::new(),
            sensors: BTreeMap::new(),
            controllers: Vec::new(),
            selected_nodes: BTreeSet::new(),
        }
    }

    /// Create an entity from a configuration document. The document must be
    /// an object carrying a string `name`; it is stored wholesale as the
    /// entity's configuration.
    pub fn from_config(document: Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = document else {
            return Err(ConfigError::NotAnObject);
        };
        let name = match map.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(_) => {
                return Err(ConfigError::BadValue {
                    key: "name",
                    expected: "non-empty string",
                })
            }
            None => return Err(ConfigError::MissingKey("name")),
        };
        let mut entity = Self::new(name);
        entity.config = map;
        Ok(entity)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- configuration ------------------------------------------------------

    /// Read-only view of the configuration document.
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// Merge new keys into the configuration. Top-level keys from the patch
    /// replace existing ones wholesale; last applied key wins.
    pub fn append_config(&mut self, patch: &Value) {
        if let Value::Object(map) = patch {
            config::merge_top_level(&mut self.config, map);
        }
    }

    /// The assembly this entity belongs to, `None` when it is standalone.
    pub fn assembly(&self) -> Option<&str> {
        config::assembly(&self.config)
    }

    /// Whether the configuration flags this entity as its assembly's root.
    pub fn is_assembly_root(&self) -> bool {
        config::flag(&self.config, config::KEY_ROOT)
    }

    /// Whether the configuration flags this entity as its assembly's main
    /// entity.
    pub fn is_main_entity(&self) -> bool {
        config::flag(&self.config, config::KEY_MAIN_ENTITY)
    }

    // -- sub-object registration --------------------------------------------

    /// Record a node as belonging to this robot. Reusing an id replaces the
    /// stored name; no duplicate checking is done.
    pub fn add_node(&mut self, id: NodeId, name: impl Into<String>) {
        self.nodes.insert(id, name.into());
    }

    /// Record a motor as belonging to this robot.
    pub fn add_motor(&mut self, id: MotorId, name: impl Into<String>) {
        self.motors.insert(id, name.into());
    }

    /// Record a joint as belonging to this robot.
    pub fn add_joint(&mut self, id: JointId, name: impl Into<String>) {
        self.joints.insert(id, name.into());
    }

    /// Record a sensor as belonging to this robot.
    pub fn add_sensor(&mut self, id: SensorId, name: impl Into<String>) {
        self.sensors.insert(id, name.into());
    }

    /// Append a controller id to the ordered controller list.
    pub fn add_controller(&mut self, id: ControllerId) {
        self.controllers.push(id);
    }

    // -- sub-object lookup --------------------------------------------------

    /// Id of the node with the given name. Linear scan; first match in id
    /// order wins when names repeat.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        lookup_id(&self.nodes, name)
    }

    /// Name of the node with the given id.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(String::as_str)
    }

    /// Id of the motor with the given name.
    pub fn motor_id(&self, name: &str) -> Option<MotorId> {
        lookup_id(&self.motors, name)
    }

    /// Name of the motor with the given id.
    pub fn motor_name(&self, id: MotorId) -> Option<&str> {
        self.motors.get(&id).map(String::as_str)
    }

    /// Id of the joint with the given name.
    pub fn joint_id(&self, name: &str) -> Option<JointId> {
        lookup_id(&self.joints, name)
    }

    /// Name of the joint with the given id.
    pub fn joint_name(&self, id: JointId) -> Option<&str> {
        self.joints.get(&id).map(String::as_str)
    }

    /// Id of the sensor with the given name.
    pub fn sensor_id(&self, name: &str) -> Option<SensorId> {
        lookup_id(&self.sensors, name)
    }

    /// Name of the sensor with the given id.
    pub fn sensor_name(&self, id: SensorId) -> Option<&str> {
        self.sensors.get(&id).map(String::as_str)
    }

    /// The full id -> name node table.
    pub fn all_nodes(&self) -> &BTreeMap<NodeId, String> {
        &self.nodes
    }

    /// Ids of all nodes whose name contains the given fragment.
    pub fn nodes_matching(&self, fragment: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, name)| name.contains(fragment))
            .map(|(&id, _)| id)
            .collect()
    }

    /// The smallest node id among nodes whose name contains the fragment.
    /// An empty fragment considers every node, which yields the robot's
    /// lowest-numbered (typically first-created) node.
    pub fn rootest_node(&self, fragment: &str) -> Option<NodeId> {
        // BTreeMap iterates in ascending id order.
        self.nodes
            .iter()
            .find(|(_, name)| name.contains(fragment))
            .map(|(&id, _)| id)
    }

    /// The ordered controller id list.
    pub fn controllers(&self) -> &[ControllerId] {
        &self.controllers
    }

    /// True iff the node id is owned by this robot.
    pub fn owns_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    // -- selection ----------------------------------------------------------

    /// Notify the robot that a node was picked. If the node belongs to this
    /// robot it joins the selected set and `true` is returned; foreign ids
    /// return `false` without mutation.
    pub fn select(&mut self, node: NodeId) -> bool {
        if !self.owns_node(node) {
            return false;
        }
        self.selected_nodes.insert(node);
        true
    }

    /// Notify the robot that a node was un-picked. Returns `true` iff the
    /// node belongs to this robot; foreign ids leave the selection untouched.
    pub fn deselect(&mut self, node: NodeId) -> bool {
        if !self.owns_node(node) {
            return false;
        }
        self.selected_nodes.remove(&node);
        true
    }

    /// A robot counts as selected while any of its nodes is selected.
    pub fn is_selected(&self) -> bool {
        !self.selected_nodes.is_empty()
    }

    /// The currently selected node ids.
    pub fn selected_nodes(&self) -> &BTreeSet<NodeId> {
        &self.selected_nodes
    }

    // -- anchor -------------------------------------------------------------

    pub fn has_anchor_joint(&self) -> bool {
        self.anchor_joint.is_some()
    }

    pub fn anchor_joint(&self) -> Option<JointId> {
        self.anchor_joint
    }

    /// Release the anchor joint, if any, dropping it in the backend.
    pub fn remove_anchor(&mut self, adapter: &mut dyn PhysicsAdapter) {
        if let Some(joint) = self.anchor_joint.take() {
            adapter.remove_joint(joint);
        }
    }

    /// Tear down backend resources held on behalf of this entity. Only the
    /// anchor joint is owned here; nodes, motors, and the rest belong to
    /// their own managers and stay untouched.
    pub fn teardown(&mut self, adapter: &mut dyn PhysicsAdapter) {
        self.remove_anchor(adapter);
        self.selected_nodes.clear();
    }

    // -- pose ---------------------------------------------------------------

    /// Move the robot to its initial pose.
    ///
    /// The pose comes from `pose_override` when given, otherwise from the
    /// configuration's `position`/`rotation` keys. Without either, a reset
    /// falls back to the identity pose and a non-reset call does nothing.
    /// The robot is moved by its rootest node; when the configuration asks
    /// for anchoring and no anchor joint exists, one is created.
    pub fn set_initial_pose(
        &mut self,
        adapter: &mut dyn PhysicsAdapter,
        reset: bool,
        pose_override: Option<&Pose>,
    ) {
        let pose = match pose_override.copied().or_else(|| config::pose(&self.config)) {
            Some(pose) => pose,
            None if reset => Pose::IDENTITY,
            None => return,
        };
        let Some(root) = self.rootest_node("") else {
            return;
        };
        adapter.move_node(root, &pose);
        if config::anchored(&self.config) && self.anchor_joint.is_none() {
            self.anchor_joint = Some(adapter.create_anchor(root));
        }
    }

    // -- aggregate physical queries -----------------------------------------

    /// Total mass of the robot: sum of the masses of all owned nodes the
    /// backend knows. `None` when the robot owns no nodes.
    pub fn mass(&self, adapter: &dyn PhysicsAdapter) -> Option<f32> {
        if self.nodes.is_empty() {
            return None;
        }
        Some(
            self.nodes
                .keys()
                .filter_map(|&id| adapter.node_mass(id))
                .sum(),
        )
    }

    /// Mass-weighted center of the robot. `None` when the robot owns no
    /// nodes or the total mass is zero.
    pub fn center_of_mass(&self, adapter: &dyn PhysicsAdapter) -> Option<Vec3> {
        let mut total = 0.0f32;
        let mut weighted = Vec3::ZERO;
        for &id in self.nodes.keys() {
            let (Some(mass), Some(center)) = (adapter.node_mass(id), adapter.node_center(id))
            else {
                continue;
            };
            total += mass;
            weighted += center * mass;
        }
        if total == 0.0 {
            return None;
        }
        Some(weighted / total)
    }

    /// Union bounding box over all owned nodes. `None` when no owned node
    /// has a box in the backend.
    pub fn bounding_box(&self, adapter: &dyn PhysicsAdapter) -> Option<Aabb> {
        self.nodes
            .keys()
            .filter_map(|&id| adapter.node_bounding_box(id))
            .reduce(Aabb::union)
    }

    // -- diagnostics --------------------------------------------------------

    /// Dump the node table to the trace output.
    pub fn log_nodes(&self) {
        for (id, name) in &self.nodes {
            tracing::info!(entity = %self.name, id, name = %name, "node");
        }
    }

    /// Dump the motor table to the trace output.
    pub fn log_motors(&self) {
        for (id, name) in &self.motors {
            tracing::info!(entity = %self.name, id, name = %name, "motor");
        }
    }

    /// Dump the controller list to the trace output.
    pub fn log_controllers(&self) {
        for id in &self.controllers {
            tracing::info!(entity = %self.name, id, "controller");
        }
    }
}

/// First id (in ascending id order) whose stored name matches exactly.
fn lookup_id(table: &BTreeMap<u64, String>, name: &str) -> Option<u64> {
    table
        .iter()
        .find(|(_, stored)| stored.as_str() == name)
        .map(|(&id, _)| id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
