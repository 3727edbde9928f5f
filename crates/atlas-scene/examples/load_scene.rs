//! Load a small two-robot scene, query it, then tear the assembly down.
//!
//! Run with: `cargo run -p atlas-scene --example load_scene`
//! (set `RUST_LOG=debug` for the registry's trace output)

use std::collections::HashMap;

use anyhow::Result;
use atlas_registry::prelude::*;
use atlas_scene::prelude::*;
use glam::Vec3;
use serde_json::json;

/// In-memory stand-in for the simulation backend.
#[derive(Default)]
struct DemoPhysics {
    masses: HashMap<NodeId, f32>,
    next_joint: u64,
}

impl DemoPhysics {
    fn with_node(mut self, node: NodeId, mass: f32) -> Self {
        self.masses.insert(node, mass);
        self
    }
}

impl PhysicsAdapter for DemoPhysics {
    fn node_mass(&self, node: NodeId) -> Option<f32> {
        self.masses.get(&node).copied()
    }
    fn node_center(&self, _node: NodeId) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }
    fn node_bounding_box(&self, node: NodeId) -> Option<Aabb> {
        self.masses
            .contains_key(&node)
            .then(|| Aabb::from_center_extent(Vec3::ZERO, Vec3::ONE))
    }
    fn move_node(&mut self, node: NodeId, pose: &Pose) {
        tracing::info!(node, position = ?pose.position, "moving node");
    }
    fn create_anchor(&mut self, node: NodeId) -> JointId {
        self.next_joint += 1;
        tracing::info!(node, joint = self.next_joint, "anchoring node");
        self.next_joint
    }
    fn remove_joint(&mut self, joint: JointId) {
        tracing::info!(joint, "removing joint");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut physics = DemoPhysics::default()
        .with_node(1, 12.0)
        .with_node(2, 3.5)
        .with_node(10, 1.2);

    let registry = EntityRegistry::new();
    let loader = SceneLoader::with_default_factories();

    let scene = json!({
        "entities": [
            {
                "name": "crawler",
                "assembly": "expedition",
                "root": true,
                "anchor": "world",
                "position": [0.0, 0.0, 0.2],
                "links": [
                    {"name": "chassis", "id": 1},
                    {"name": "boom_arm", "id": 2},
                ],
                "motors": [{"name": "track_drive", "id": 1}],
            },
            {
                "name": "scout",
                "assembly": "expedition",
                "links": [{"name": "body", "id": 10}],
                "sensors": [{"name": "lidar", "id": 1}],
            },
        ]
    });

    let ids = loader.load_placed(&scene, &ScenePlacement::at(Vec3::new(5.0, 0.0, 0.0)), &registry)?;
    println!("loaded {} entities: {:?}", ids.len(), ids);

    let root = registry
        .root_of_assembly("expedition")
        .expect("scene declares an assembly root");
    {
        let crawler = registry.get(root).expect("root entity is registered");
        println!(
            "assembly root: {} (mass {:?}, bbox {:?})",
            crawler.name(),
            crawler.mass(&physics),
            crawler.bounding_box(&physics),
        );
    }

    println!(
        "scout lidar sensor id: {:?}",
        registry.entity_sensor("scout", "lidar")
    );

    registry.reset_pose(&mut physics);
    registry.remove_assembly("expedition", &mut physics);
    println!("registry is empty again: {}", registry.is_empty());
    Ok(())
}
