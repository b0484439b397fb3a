//! Narrow-phase collision detection for convex shapes.
//!
//! This crate provides the collision queries consumed by the Kinetica frame
//! driver:
//!
//! - [`gjk_query`] / [`gjk_intersection`] - GJK intersection tests between
//!   any two convex shapes via support mapping
//! - [`epa_query`] - penetration depth, contact normal, and an interpolated
//!   contact point for overlapping shapes
//! - [`cuboid_cuboid_manifold`] - SAT-based multi-point contact manifolds for
//!   oriented cuboid pairs
//! - [`hull_contact`] - single-point GJK+EPA contact for general convex pairs
//!
//! # Algorithm Overview
//!
//! ## GJK (Gilbert-Johnson-Keerthi)
//!
//! GJK works in Minkowski space (the "Minkowski difference" of two shapes).
//! If two convex shapes overlap, their Minkowski difference contains the
//! origin. GJK iteratively builds a simplex (point, line, triangle,
//! tetrahedron) that tries to enclose the origin.
//!
//! ## EPA (Expanding Polytope Algorithm)
//!
//! When GJK determines that shapes overlap, EPA expands the terminal simplex
//! into a polytope whose face nearest the origin converges on the boundary of
//! the Minkowski difference. That face yields the penetration depth and
//! contact normal.
//!
//! ## SAT (Separating Axis Theorem)
//!
//! Cuboid pairs get a dedicated SAT test over the 15 candidate axes, with
//! reference-face clipping to produce stable multi-point manifolds for
//! stacking.
//!
//! # References
//!
//! - Gilbert, Johnson, Keerthi: "A Fast Procedure for Computing the Distance
//!   Between Complex Objects in Three-Dimensional Space" (1988)
//! - van den Bergen: "Collision Detection in Interactive 3D Environments"
//!   (2003)

#![doc(html_root_url = "https://docs.rs/kin-collision/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
)]

mod contact;
mod epa;
mod gjk;
mod sat;
mod shape;

pub use contact::{ContactManifold, ContactPoint};
pub use epa::{epa_query, EpaResult, EPA_MAX_FACES, EPA_MAX_ITERATIONS};
pub use gjk::{
    gjk_intersection, gjk_query, support, GjkResult, MinkowskiPoint, Simplex, SimplexStep,
    GJK_MAX_ITERATIONS,
};
pub use sat::cuboid_cuboid_manifold;
pub use shape::ConvexShape;

use kin_types::{BodyId, Pose, SolverConfig};

/// Compute contact information between two convex shapes using GJK+EPA.
///
/// Returns `None` if the shapes don't intersect or the penetration query
/// degenerates. The manifold holds a single contact point; cuboid pairs
/// should prefer [`cuboid_cuboid_manifold`], which produces multi-point
/// manifolds. Iteration budgets and the EPA face cap come from `config`.
#[must_use]
pub fn hull_contact(
    shape_a: &ConvexShape,
    pose_a: &Pose,
    shape_b: &ConvexShape,
    pose_b: &Pose,
    body_a: BodyId,
    body_b: BodyId,
    config: &SolverConfig,
) -> Option<ContactManifold> {
    let gjk = gjk_query(shape_a, pose_a, shape_b, pose_b, config.gjk_max_iterations);
    if !gjk.intersecting {
        return None;
    }

    let epa = epa_query(
        shape_a,
        pose_a,
        shape_b,
        pose_b,
        &gjk.simplex,
        config.epa_max_iterations,
        config.epa_max_faces,
    )?;

    Some(ContactManifold {
        body_a,
        body_b,
        normal: epa.normal,
        points: vec![ContactPoint {
            position: epa.contact_point,
            depth: epa.depth.max(0.0),
        }],
    })
}
