//! The narrow seam between the registry and the simulation backend.
//!
//! Entities keep id/name records only; everything physical -- node poses,
//! masses, bounding volumes, anchor joints -- belongs to the simulation
//! backend. The [`PhysicsAdapter`] trait is the registry's only way to reach
//! it. Aggregation over a robot's nodes (union bounding box, total mass,
//! mass-weighted center) is done on the registry side from the per-node
//! primitives this trait exposes.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::entity::{JointId, NodeId};

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// A rigid-body pose: translation plus rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    /// The identity pose: origin, no rotation.
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Aabb
// ---------------------------------------------------------------------------

/// An axis-aligned bounding box, stored as min/max corners.
///
/// Robot-level boxes are built by [`union`](Aabb::union) over the boxes of
/// all owned nodes, so the result is always axis-aligned even when the
/// individual bodies are rotated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build a box from its center and full extent (edge lengths).
    pub fn from_center_extent(center: Vec3, extent: Vec3) -> Self {
        let half = extent * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// The smallest box enclosing both `self` and `other`.
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The 8 corner vertices, in `(z, y, x)` minor-to-major bit order:
    /// index bit 0 selects x, bit 1 selects y, bit 2 selects z.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        let mut out = [Vec3::ZERO; 8];
        for (i, v) in out.iter_mut().enumerate() {
            *v = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
        }
        out
    }
}

// ---------------------------------------------------------------------------
// PhysicsAdapter
// ---------------------------------------------------------------------------

/// Per-node/per-joint operations provided by the simulation backend.
///
/// Query methods return `None` for ids the backend does not know; the
/// registry skips such nodes when aggregating. Mutating methods are expected
/// to be infallible best-effort, matching the registry's own policy of never
/// erroring on stale ids.
pub trait PhysicsAdapter {
    /// Mass of a single node.
    fn node_mass(&self, node: NodeId) -> Option<f32>;

    /// Center position of a single node, world frame.
    fn node_center(&self, node: NodeId) -> Option<Vec3>;

    /// Bounding box of a single node, world frame.
    fn node_bounding_box(&self, node: NodeId) -> Option<Aabb>;

    /// Move a node (and the bodies attached to it) to the given pose.
    fn move_node(&mut self, node: NodeId, pose: &Pose);

    /// Create a joint anchoring the node to the world, returning its id.
    fn create_anchor(&mut self, node: NodeId) -> JointId;

    /// Remove a joint. Unknown ids are ignored.
    fn remove_joint(&mut self, joint: JointId);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
