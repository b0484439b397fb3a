//! End-to-end simulation tests driving the full pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use kin_world::{
    ConvexShape, MassProperties, PhysicsWorld, Pose, RigidBodyState, SimulationConfig, Stepper,
    Twist,
};
use nalgebra::{Point3, Vector3};

fn cube_world(timestep: f64) -> PhysicsWorld {
    PhysicsWorld::new(SimulationConfig::with_timestep(timestep))
}

/// The canonical scenario: a unit cube dropped onto a static unit cube.
///
/// Body A sits at the origin, immovable. Body B starts at (0, 0, 1.5) with
/// mass 1 and falls under -9.81 m/s^2. Once B reaches A's top face the
/// collision pass must produce contacts, and solving them must shed B's
/// downward velocity instead of letting it fall through.
#[test]
fn falling_cube_lands_on_static_cube() {
    let dt = 1.0 / 120.0;
    let mut world = cube_world(dt);

    let ground = world.add_static_body(Pose::identity());
    world.body_mut(ground).unwrap().shape = Some(ConvexShape::unit_cube());

    let falling = world
        .add_body(
            RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 1.5))),
            MassProperties::cuboid(1.0, Vector3::new(0.5, 0.5, 0.5)),
        )
        .unwrap();
    world.body_mut(falling).unwrap().shape = Some(ConvexShape::unit_cube());

    let mut stepper = Stepper::new();

    let mut contact_step = None;
    for step in 0..240 {
        let velocity_before = world.body(falling).unwrap().state.twist.linear.z;
        let report = stepper.step(&mut world).unwrap();

        if report.contact_points > 0 {
            contact_step = Some((step, velocity_before));
            break;
        }
    }

    let (step, velocity_before) = contact_step.expect("the cube must reach the ground");

    // Free fall up to the contact: the cube must actually have been falling
    assert!(velocity_before < -1.0, "expected free fall, got {velocity_before}");

    // The contact solve must reduce the downward speed below free fall
    let elapsed = (step + 1) as f64 * dt;
    let free_fall_velocity = -9.81 * elapsed;
    let velocity_after = world.body(falling).unwrap().state.twist.linear.z;
    assert!(
        velocity_after > free_fall_velocity + 1.0,
        "contact failed to slow the cube: {velocity_after} vs free fall {free_fall_velocity}"
    );

    // Keep simulating: the cube settles on the face instead of passing through
    stepper.run_for(&mut world, 3.0).unwrap();

    let body = world.body(falling).unwrap();
    assert_relative_eq!(body.state.pose.position.z, 1.0, epsilon = 0.05);
    assert!(body.state.twist.linear.norm() < 0.1);
    assert_relative_eq!(body.state.pose.rotation.norm(), 1.0, epsilon = 1e-4);
}

/// Without gravity or contacts, two drifting bodies conserve momentum and
/// velocity exactly.
#[test]
fn zero_gravity_drift_conserves_momentum() {
    let mut world = PhysicsWorld::new(SimulationConfig::with_timestep(1.0 / 120.0).zero_gravity());

    world
        .add_body(
            RigidBodyState::new(
                Pose::from_position(Point3::new(-5.0, 0.0, 0.0)),
                Twist::linear(Vector3::new(1.0, 0.0, 0.0)),
            ),
            MassProperties::sphere(1.0, 0.5),
        )
        .unwrap();
    world
        .add_body(
            RigidBodyState::new(
                Pose::from_position(Point3::new(5.0, 0.0, 0.0)),
                Twist::linear(Vector3::new(-1.0, 0.0, 0.0)),
            ),
            MassProperties::sphere(2.0, 0.5),
        )
        .unwrap();

    let initial_momentum = world.total_linear_momentum();
    let initial_energy = world.total_kinetic_energy();

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 2.0).unwrap();

    assert_relative_eq!(
        world.total_linear_momentum(),
        initial_momentum,
        epsilon = 1e-10
    );
    assert_relative_eq!(world.total_kinetic_energy(), initial_energy, epsilon = 1e-10);
}

/// A pair of cubes linked by a persistent distance constraint converges to
/// the rest length through the full stepper pipeline.
#[test]
fn linked_cubes_converge_to_rest_length() {
    let mut world = PhysicsWorld::new(
        SimulationConfig::with_timestep(1.0 / 120.0)
            .zero_gravity()
            .solver(
                kin_world::SolverConfig::default()
                    .with_iterations(64)
                    .with_baumgarte(0.5),
            ),
    );

    let a = world
        .add_body(
            RigidBodyState::default(),
            MassProperties::cuboid(1.0, Vector3::new(0.5, 0.5, 0.5)),
        )
        .unwrap();
    let b = world
        .add_body(
            RigidBodyState::at_rest(Pose::from_position(Point3::new(3.0, 0.0, 0.0))),
            MassProperties::cuboid(1.0, Vector3::new(0.5, 0.5, 0.5)),
        )
        .unwrap();

    world
        .add_constraint(kin_world::Constraint::Distance {
            body_a: a,
            body_b: b,
            anchor_a: Vector3::zeros(),
            anchor_b: Vector3::zeros(),
            rest_length: 1.0,
        })
        .unwrap();

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 10.0).unwrap();

    let separation = (world.body(b).unwrap().state.pose.position
        - world.body(a).unwrap().state.pose.position)
        .norm();
    assert_relative_eq!(separation, 1.0, epsilon = 0.05);
}

/// A small stack stays standing: cube on cube on static ground.
#[test]
fn two_cube_stack_settles() {
    let dt = 1.0 / 120.0;
    let mut world = cube_world(dt);

    let ground = world.add_static_body(Pose::identity());
    world.body_mut(ground).unwrap().shape = Some(ConvexShape::unit_cube());

    let mut ids = Vec::new();
    for level in 1..=2 {
        let id = world
            .add_body(
                RigidBodyState::at_rest(Pose::from_position(Point3::new(
                    0.0,
                    0.0,
                    level as f64 * 1.01,
                ))),
                MassProperties::cuboid(1.0, Vector3::new(0.5, 0.5, 0.5)),
            )
            .unwrap();
        world.body_mut(id).unwrap().shape = Some(ConvexShape::unit_cube());
        ids.push(id);
    }

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 4.0).unwrap();

    for (level, id) in ids.iter().enumerate() {
        let body = world.body(*id).unwrap();
        let expected_z = (level + 1) as f64;
        assert_relative_eq!(body.state.pose.position.z, expected_z, epsilon = 0.08);
        assert!(
            body.state.twist.linear.norm() < 0.2,
            "cube {level} still moving at {}",
            body.state.twist.linear.norm()
        );
        // Lateral drift stays negligible for an axis-aligned stack
        assert!(body.state.pose.position.x.abs() < 0.05);
        assert!(body.state.pose.position.y.abs() < 0.05);
    }
}
