//! End-to-end scenarios for the entity registry: lifecycle, assembly
//! handling, selection, and subscriber notification.

use std::sync::{Arc, Mutex};

use atlas_registry::prelude::*;
use glam::Vec3;
use serde_json::json;

// -- backend double ---------------------------------------------------------

#[derive(Default)]
struct FakePhysics {
    next_joint: u64,
}

impl PhysicsAdapter for FakePhysics {
    fn node_mass(&self, _node: NodeId) -> Option<f32> {
        Some(1.0)
    }
    fn node_center(&self, _node: NodeId) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }
    fn node_bounding_box(&self, _node: NodeId) -> Option<Aabb> {
        Some(Aabb::from_center_extent(Vec3::ZERO, Vec3::ONE))
    }
    fn move_node(&mut self, _node: NodeId, _pose: &Pose) {}
    fn create_anchor(&mut self, _node: NodeId) -> JointId {
        self.next_joint += 1;
        self.next_joint
    }
    fn remove_joint(&mut self, _joint: JointId) {}
}

// -- id assignment ----------------------------------------------------------

#[test]
fn ids_are_strictly_increasing_and_never_zero() {
    let registry = EntityRegistry::new();
    let mut previous = 0u64;
    for i in 0..64 {
        let id = registry.add(format!("robot_{i}")).to_raw();
        assert_ne!(id, 0);
        assert!(id > previous);
        previous = id;
    }
}

// -- removal ----------------------------------------------------------------

#[test]
fn removed_entity_is_no_longer_found() {
    let mut physics = FakePhysics::default();
    let registry = EntityRegistry::new();
    registry.add("rover");
    registry.remove("rover", RemovalScope::Entity, &mut physics);
    assert_eq!(registry.id_by_name("rover"), None);
    assert!(registry.entity_by_name_verbose("rover", false).is_none());
}

#[test]
fn remove_assembly_spares_other_assemblies() {
    let mut physics = FakePhysics::default();
    let registry = EntityRegistry::new();
    for (name, assembly) in [
        ("a1", "alpha"),
        ("a2", "alpha"),
        ("b1", "beta"),
        ("solo", ""),
    ] {
        registry.add(name);
        if !assembly.is_empty() {
            registry.append_config(name, &json!({ "assembly": assembly }));
        }
    }

    registry.remove_assembly("alpha", &mut physics);

    assert_eq!(registry.id_by_name("a1"), None);
    assert_eq!(registry.id_by_name("a2"), None);
    assert!(registry.id_by_name("b1").is_some());
    assert!(registry.id_by_name("solo").is_some());
}

// -- assembly root and main resolution --------------------------------------

#[test]
fn root_and_main_entity_resolution() {
    let registry = EntityRegistry::new();
    let root = registry.add("base");
    let main = registry.add("torso");
    let plain = registry.add("tool");
    registry.append_config("base", &json!({"assembly": "walker", "root": true}));
    registry.append_config("torso", &json!({"assembly": "walker", "main_entity": true}));
    registry.append_config("tool", &json!({"assembly": "walker"}));

    assert_eq!(registry.root_of_assembly("walker"), Some(root));
    assert_eq!(registry.main_entity_of_assembly("walker"), Some(main));
    assert_eq!(
        registry.entities_of_assembly("walker"),
        vec![root, main, plain]
    );
}

#[test]
fn main_entity_falls_back_to_root() {
    let registry = EntityRegistry::new();
    let root = registry.add("base");
    registry.add("tool");
    registry.append_config("base", &json!({"assembly": "crane", "root": true}));
    registry.append_config("tool", &json!({"assembly": "crane"}));

    assert_eq!(registry.main_entity_of_assembly("crane"), Some(root));
}

#[test]
fn unflagged_assembly_has_no_root_and_no_main() {
    let registry = EntityRegistry::new();
    registry.add("a");
    registry.append_config("a", &json!({"assembly": "loose"}));

    assert_eq!(registry.root_of_assembly("loose"), None);
    assert_eq!(registry.main_entity_of_assembly("loose"), None);
}

#[test]
fn assembly_queries_accept_glob_patterns() {
    let registry = EntityRegistry::new();
    let left = registry.add("l");
    let right = registry.add("r");
    registry.append_config("l", &json!({"assembly": "arm_left"}));
    registry.append_config("r", &json!({"assembly": "arm_right"}));

    assert_eq!(registry.entities_of_assembly("arm_*"), vec![left, right]);
    assert_eq!(registry.entities_of_assembly("arm_l*"), vec![left]);
}

// -- selection --------------------------------------------------------------

#[test]
fn selection_respects_node_ownership() {
    let registry = EntityRegistry::new();
    let a = registry.add("a");
    let b = registry.add("b");
    registry.add_node("a", 11, "body");
    registry.add_node("b", 22, "body");

    registry.select_event(11, true);
    assert!(registry.get(a).unwrap().is_selected());
    assert!(!registry.get(b).unwrap().is_selected());
}

// -- subscribers ------------------------------------------------------------

struct Recorder(Mutex<Vec<(EntityId, String)>>);

impl EntitySubscriber for Recorder {
    fn entity_registered(&self, id: EntityId, entity: &Entity) {
        self.0.lock().unwrap().push((id, entity.name().to_owned()));
    }
}

#[test]
fn subscribers_see_every_creation_in_order() {
    let registry = EntityRegistry::new();
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let snapshot = registry.subscribe(recorder.clone());
    assert!(snapshot.is_empty());

    let a = registry.add("first");
    let b = registry.add("second");
    let mut prebuilt = Entity::new("third");
    prebuilt.add_node(1, "base");
    let c = registry.insert(prebuilt);

    let seen = recorder.0.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (a, "first".to_owned()),
            (b, "second".to_owned()),
            (c, "third".to_owned()),
        ]
    );
}

// -- sub-object round-trips --------------------------------------------------

#[test]
fn node_roundtrip_through_the_registry() {
    let registry = EntityRegistry::new();
    let id = registry.add("rover");
    registry.add_node("rover", 42, "foo");

    assert_eq!(registry.entity_node("rover", "foo"), Some(42));
    assert_eq!(registry.get(id).unwrap().node_name(42), Some("foo"));
    assert_eq!(registry.entity_node("rover", "bar"), None);
    assert_eq!(registry.entity_node("ghost", "foo"), None);
}

#[test]
fn motor_sensor_joint_resolution() {
    let registry = EntityRegistry::new();
    registry.add("rover");
    registry.add_motor("rover", 5, "wheel_drive");
    registry.add_sensor("rover", 6, "imu");
    registry.add_joint("rover", 7, "shoulder");

    assert_eq!(registry.entity_motor("rover", "wheel_drive"), Some(5));
    assert_eq!(registry.entity_sensor("rover", "imu"), Some(6));
    assert_eq!(registry.entity_joint("rover", "shoulder"), Some(7));
    assert_eq!(registry.entity_motor("rover", "imu"), None);
}

// -- full scenarios ----------------------------------------------------------

#[test]
fn assembly_lifecycle_scenario() {
    let mut physics = FakePhysics::default();
    let registry = EntityRegistry::new();

    let robot_a = registry.add("robotA");
    registry.append_config("robotA", &json!({"assembly": "assemblyX", "root": true}));
    let robot_b = registry.add("robotB");
    registry.append_config("robotB", &json!({"assembly": "assemblyX"}));

    assert_eq!(robot_a.to_raw(), 1);
    assert_eq!(robot_b.to_raw(), 2);
    assert_eq!(registry.root_of_assembly("assemblyX"), Some(robot_a));

    let mut members = registry.entities_of_assembly("assemblyX");
    members.sort();
    assert_eq!(members, vec![robot_a, robot_b]);

    registry.remove_assembly("assemblyX", &mut physics);
    assert!(registry.is_empty());
}

#[test]
fn duplicate_name_scenario() {
    let registry = EntityRegistry::new();
    let first = registry.add("x");
    let second = registry.add("x");
    assert_eq!(first.to_raw(), 1);
    assert_eq!(second.to_raw(), 2);

    // Exact lookup resolves to the first-inserted entity.
    assert_eq!(registry.id_by_name("x"), Some(first));
    // Pattern lookup sees both.
    assert_eq!(registry.ids_matching("x"), vec![first, second]);
}

// -- concurrent access -------------------------------------------------------

#[test]
fn concurrent_adds_produce_unique_ids() {
    let registry = Arc::new(EntityRegistry::new());
    let mut handles = Vec::new();
    for t in 0..4 {
        let registry = registry.clone();
        handles.push(std::thread::spawn(move || {
            (0..100)
                .map(|i| registry.add(format!("t{t}_{i}")).to_raw())
                .collect::<Vec<_>>()
        }));
    }
    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("worker thread"))
        .collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 400);
    assert_eq!(registry.len(), 400);
}

#[test]
fn queries_run_against_concurrent_mutation() {
    let registry = Arc::new(EntityRegistry::new());
    for i in 0..50 {
        registry.add(format!("seed_{i}"));
        registry.append_config(&format!("seed_{i}"), &json!({"assembly": "seed"}));
    }

    let writer = {
        let registry = registry.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                registry.add(format!("extra_{i}"));
            }
        })
    };
    let reader = {
        let registry = registry.clone();
        std::thread::spawn(move || {
            for _ in 0..200 {
                // Seed entities never go away, so the count may only grow.
                assert_eq!(registry.entities_of_assembly("seed").len(), 50);
                let _ = registry.ids_matching("extra_*");
            }
        })
    };
    writer.join().expect("writer thread");
    reader.join().expect("reader thread");
    assert_eq!(registry.len(), 250);
}
