//! Property tests for the entity registry.
//!
//! Random operation sequences are applied to a registry and checked against
//! the registry's core invariants: id monotonicity and uniqueness, the
//! first-inserted tie-break for duplicate names, and last-wins configuration
//! merging.

use atlas_registry::prelude::*;
use glam::Vec3;
use proptest::prelude::*;
use serde_json::json;

#[derive(Default)]
struct NullPhysics;

impl PhysicsAdapter for NullPhysics {
    fn node_mass(&self, _node: NodeId) -> Option<f32> {
        None
    }
    fn node_center(&self, _node: NodeId) -> Option<Vec3> {
        None
    }
    fn node_bounding_box(&self, _node: NodeId) -> Option<Aabb> {
        None
    }
    fn move_node(&mut self, _node: NodeId, _pose: &Pose) {}
    fn create_anchor(&mut self, _node: NodeId) -> JointId {
        1
    }
    fn remove_joint(&mut self, _joint: JointId) {}
}

/// Operations applied to the registry under test.
#[derive(Debug, Clone)]
enum RegistryOp {
    Add(u8),
    Remove(u8),
    AddNode(u8, u64),
    AppendConfig(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        (0..8u8).prop_map(RegistryOp::Add),
        (0..8u8).prop_map(RegistryOp::Remove),
        (0..8u8, 1..64u64).prop_map(|(n, id)| RegistryOp::AddNode(n, id)),
        (0..8u8, 0..250u8).prop_map(|(n, v)| RegistryOp::AppendConfig(n, v)),
    ]
}

fn name_for(tag: u8) -> String {
    format!("robot_{tag}")
}

proptest! {
    #[test]
    fn ids_stay_unique_and_strictly_increasing(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut physics = NullPhysics;
        let registry = EntityRegistry::new();
        let mut issued: Vec<u64> = Vec::new();

        for op in ops {
            match op {
                RegistryOp::Add(tag) => {
                    let id = registry.add(name_for(tag)).to_raw();
                    prop_assert_ne!(id, 0);
                    if let Some(&last) = issued.last() {
                        prop_assert!(id > last);
                    }
                    issued.push(id);
                }
                RegistryOp::Remove(tag) => {
                    registry.remove(&name_for(tag), RemovalScope::Entity, &mut physics);
                }
                RegistryOp::AddNode(tag, node) => {
                    registry.add_node(&name_for(tag), node, "node");
                }
                RegistryOp::AppendConfig(tag, value) => {
                    registry.append_config(&name_for(tag), &json!({ "value": value }));
                }
            }
        }

        // No id was handed out twice, removals included.
        let mut deduped = issued.clone();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), issued.len());
    }

    #[test]
    fn name_lookup_returns_oldest_surviving_entity(
        tags in prop::collection::vec(0..4u8, 1..40),
        removals in prop::collection::vec(0..4u8, 0..10),
    ) {
        let mut physics = NullPhysics;
        let registry = EntityRegistry::new();
        // Track what the registry should contain: (id, name) in insertion order.
        let mut expected: Vec<(u64, String)> = Vec::new();

        for tag in tags {
            let name = name_for(tag);
            let id = registry.add(name.as_str()).to_raw();
            expected.push((id, name));
        }
        for tag in removals {
            let name = name_for(tag);
            if let Some(pos) = expected.iter().position(|(_, n)| n == &name) {
                expected.remove(pos);
            }
            registry.remove(&name, RemovalScope::Entity, &mut physics);
        }

        for tag in 0..4u8 {
            let name = name_for(tag);
            let oldest = expected
                .iter()
                .filter(|(_, n)| n == &name)
                .map(|(id, _)| *id)
                .min();
            prop_assert_eq!(registry.id_by_name(&name).map(EntityId::to_raw), oldest);
        }
    }

    #[test]
    fn config_merge_is_last_write_wins(values in prop::collection::vec((0..5u8, 0..250u8), 1..30)) {
        let registry = EntityRegistry::new();
        let id = registry.add("robot");
        let mut expected: std::collections::HashMap<u8, u8> = std::collections::HashMap::new();

        for (key, value) in values {
            registry.append_config("robot", &json!({ format!("k{key}"): value }));
            expected.insert(key, value);
        }

        let entity = registry.get(id).unwrap();
        for (key, value) in expected {
            prop_assert_eq!(
                entity.config().get(&format!("k{key}")),
                Some(&json!(value))
            );
        }
    }

    #[test]
    fn pattern_queries_agree_with_exact_lookup(tags in prop::collection::vec(0..6u8, 1..30)) {
        let registry = EntityRegistry::new();
        for tag in &tags {
            registry.add(name_for(*tag));
        }

        // Every entity is found by the all-pattern, in id order.
        let all = registry.ids_matching("*");
        prop_assert_eq!(all.len(), tags.len());
        let raws: Vec<u64> = all.iter().map(|id| id.to_raw()).collect();
        let mut sorted = raws.clone();
        sorted.sort();
        prop_assert_eq!(raws, sorted);

        // A concrete name pattern finds exactly the matching entities.
        for tag in 0..6u8 {
            let name = name_for(tag);
            let matched = registry.ids_matching(&name);
            let expected = tags.iter().filter(|&&t| t == tag).count();
            prop_assert_eq!(matched.len(), expected);
            // Exact lookup is the first of the pattern matches.
            prop_assert_eq!(registry.id_by_name(&name), matched.first().copied());
        }
    }
}
