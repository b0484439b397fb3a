//! SAT-based contact manifold generation for oriented cuboid pairs.
//!
//! Cuboid-cuboid contact is the dominant case for stacking, and a single
//! GJK/EPA point is not enough to keep a resting box from rocking. This
//! module runs a separating-axis test over the 15 candidate axes (6 face
//! normals, 9 edge-pair cross products) and, for face contacts, clips the
//! incident face against the reference face to produce up to 8 contact
//! points sharing one normal.

use kin_types::{BodyId, Pose};
use nalgebra::{Matrix3, Point3, Vector3};

use crate::{ContactManifold, ContactPoint};

/// Cross-product axes shorter than this are near-parallel edge pairs and
/// are skipped.
const AXIS_EPSILON: f64 = 1e-6;

/// Absolute preference margin for face axes over edge axes. An edge-pair
/// axis only wins when its overlap is smaller by more than this, which
/// keeps resting face contact from flickering into edge contact.
const FACE_PREFERENCE: f64 = 1e-4;

/// Points this far above the reference face still count as touching.
const CONTACT_SLOP: f64 = 1e-6;

/// One oriented cuboid, unpacked for the SAT test.
struct SatBox {
    center: Point3<f64>,
    axes: [Vector3<f64>; 3],
    half: Vector3<f64>,
}

impl SatBox {
    fn new(half_extents: &Vector3<f64>, pose: &Pose) -> Self {
        let rotation: Matrix3<f64> = pose.rotation_matrix();
        Self {
            center: pose.position,
            axes: [
                rotation.column(0).into_owned(),
                rotation.column(1).into_owned(),
                rotation.column(2).into_owned(),
            ],
            half: *half_extents,
        }
    }

    /// Projection radius onto a unit axis.
    fn radius(&self, axis: &Vector3<f64>) -> f64 {
        self.half.x * self.axes[0].dot(axis).abs()
            + self.half.y * self.axes[1].dot(axis).abs()
            + self.half.z * self.axes[2].dot(axis).abs()
    }

    /// The face whose outward normal is most aligned with `world_dir`,
    /// returned as its four world-space corners plus center and tangents.
    fn face_toward(&self, world_dir: &Vector3<f64>) -> BoxFace {
        let dots = [
            self.axes[0].dot(world_dir),
            self.axes[1].dot(world_dir),
            self.axes[2].dot(world_dir),
        ];

        let mut k = 0;
        for i in 1..3 {
            if dots[i].abs() > dots[k].abs() {
                k = i;
            }
        }
        let sign = dots[k].signum();

        let normal = self.axes[k] * sign;
        let center = self.center + normal * self.half[k];

        let (u_idx, v_idx) = ((k + 1) % 3, (k + 2) % 3);
        let u = self.axes[u_idx];
        let v = self.axes[v_idx];
        let hu = self.half[u_idx];
        let hv = self.half[v_idx];

        BoxFace {
            normal,
            center,
            u,
            v,
            hu,
            hv,
            corners: [
                center + u * hu + v * hv,
                center - u * hu + v * hv,
                center - u * hu - v * hv,
                center + u * hu - v * hv,
            ],
        }
    }

    /// The edge most anti-parallel to `push_dir` (the supporting edge for a
    /// separating push), along local axis `edge_axis`.
    fn supporting_edge(&self, edge_axis: usize, push_dir: &Vector3<f64>) -> (Point3<f64>, Point3<f64>) {
        let mut center = self.center;
        for k in 0..3 {
            if k == edge_axis {
                continue;
            }
            // Move against the push direction toward the other box
            let sign = -self.axes[k].dot(push_dir).signum();
            center += self.axes[k] * (sign * self.half[k]);
        }

        let offset = self.axes[edge_axis] * self.half[edge_axis];
        (center - offset, center + offset)
    }
}

/// A box face with enough structure to clip against.
struct BoxFace {
    normal: Vector3<f64>,
    center: Point3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
    hu: f64,
    hv: f64,
    corners: [Point3<f64>; 4],
}

/// The winning separating-axis candidate.
enum BestAxis {
    /// Face normal of A or B.
    Face { of_a: bool },
    /// Cross product of edge directions `a_idx` of A and `b_idx` of B.
    Edge { a_idx: usize, b_idx: usize },
}

/// Compute a contact manifold between two oriented cuboids, or `None` when a
/// separating axis exists.
///
/// The manifold normal points from body B toward body A. Face contacts
/// produce up to 8 clipped points; edge-edge contacts produce one.
#[must_use]
pub fn cuboid_cuboid_manifold(
    half_a: &Vector3<f64>,
    pose_a: &Pose,
    half_b: &Vector3<f64>,
    pose_b: &Pose,
    body_a: BodyId,
    body_b: BodyId,
) -> Option<ContactManifold> {
    let box_a = SatBox::new(half_a, pose_a);
    let box_b = SatBox::new(half_b, pose_b);

    let b_to_a = box_a.center - box_b.center;

    let overlap_on = |axis: &Vector3<f64>| -> f64 {
        box_a.radius(axis) + box_b.radius(axis) - b_to_a.dot(axis).abs()
    };

    // Face axes of both boxes
    let mut best_face_overlap = f64::INFINITY;
    let mut best_face = BestAxis::Face { of_a: true };
    let mut best_face_axis = Vector3::x();

    for (of_a, axes) in [(true, &box_a.axes), (false, &box_b.axes)] {
        for axis in axes {
            let overlap = overlap_on(axis);
            if overlap < 0.0 {
                return None;
            }
            if overlap < best_face_overlap {
                best_face_overlap = overlap;
                best_face = BestAxis::Face { of_a };
                best_face_axis = *axis;
            }
        }
    }

    // Edge-pair cross axes
    let mut best_edge_overlap = f64::INFINITY;
    let mut best_edge = None;
    let mut best_edge_axis = Vector3::x();

    for a_idx in 0..3 {
        for b_idx in 0..3 {
            let cross = box_a.axes[a_idx].cross(&box_b.axes[b_idx]);
            let norm = cross.norm();
            if norm < AXIS_EPSILON {
                continue;
            }
            let axis = cross / norm;

            let overlap = overlap_on(&axis);
            if overlap < 0.0 {
                return None;
            }
            if overlap < best_edge_overlap {
                best_edge_overlap = overlap;
                best_edge = Some(BestAxis::Edge { a_idx, b_idx });
                best_edge_axis = axis;
            }
        }
    }

    let (best, mut normal, overlap) = match best_edge {
        Some(edge) if best_edge_overlap < best_face_overlap - FACE_PREFERENCE => {
            (edge, best_edge_axis, best_edge_overlap)
        }
        _ => (best_face, best_face_axis, best_face_overlap),
    };

    // Orient the normal from B toward A
    if normal.dot(&b_to_a) < 0.0 {
        normal = -normal;
    }

    let points = match best {
        BestAxis::Face { of_a } => {
            if of_a {
                // A owns the reference face, which looks toward B (-normal)
                face_contact_points(&box_a.face_toward(&-normal), &box_b, overlap)
            } else {
                face_contact_points(&box_b.face_toward(&normal), &box_a, overlap)
            }
        }
        BestAxis::Edge { a_idx, b_idx } => {
            // Supporting edges: A pushed along +normal, B along -normal
            let (a0, a1) = box_a.supporting_edge(a_idx, &normal);
            let (b0, b1) = box_b.supporting_edge(b_idx, &-normal);
            let (on_a, on_b) = closest_points_on_segments(&a0, &a1, &b0, &b1);

            vec![ContactPoint {
                position: Point3::from((on_a.coords + on_b.coords) * 0.5),
                depth: overlap,
            }]
        }
    };

    if points.is_empty() {
        return None;
    }

    Some(ContactManifold {
        body_a,
        body_b,
        normal,
        points,
    })
}

/// Clip the incident face of `incident_box` against `reference` and keep the
/// points at or below the reference plane.
fn face_contact_points(
    reference: &BoxFace,
    incident_box: &SatBox,
    overlap: f64,
) -> Vec<ContactPoint> {
    // Incident face: the face of the other box most opposed to the reference
    let incident = incident_box.face_toward(&-reference.normal);

    let mut polygon: Vec<Point3<f64>> = incident.corners.to_vec();

    // Clip against the four side planes of the reference face
    let c = reference.center.coords;
    polygon = clip_against_plane(&polygon, &reference.u, reference.u.dot(&c) + reference.hu);
    polygon = clip_against_plane(&polygon, &-reference.u, -reference.u.dot(&c) + reference.hu);
    polygon = clip_against_plane(&polygon, &reference.v, reference.v.dot(&c) + reference.hv);
    polygon = clip_against_plane(&polygon, &-reference.v, -reference.v.dot(&c) + reference.hv);

    let mut points = Vec::with_capacity(polygon.len());
    for p in &polygon {
        let separation = reference.normal.dot(&(p - reference.center));
        if separation <= CONTACT_SLOP {
            points.push(ContactPoint {
                position: *p,
                depth: (-separation).max(0.0),
            });
        }
    }

    if points.is_empty() {
        // Shallow tilted contact where every clipped corner sits above the
        // plane: keep the deepest incident corner so the solver still sees
        // the SAT overlap.
        if let Some(deepest) = incident
            .corners
            .iter()
            .min_by(|a, b| {
                let sa = reference.normal.dot(&(*a - reference.center));
                let sb = reference.normal.dot(&(*b - reference.center));
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
        {
            points.push(ContactPoint {
                position: *deepest,
                depth: overlap,
            });
        }
    }

    points
}

/// One Sutherland-Hodgman clipping step: keep the region `normal . p <= offset`.
fn clip_against_plane(
    polygon: &[Point3<f64>],
    normal: &Vector3<f64>,
    offset: f64,
) -> Vec<Point3<f64>> {
    let mut out = Vec::with_capacity(polygon.len() + 1);

    for i in 0..polygon.len() {
        let current = polygon[i];
        let next = polygon[(i + 1) % polygon.len()];

        let d_current = normal.dot(&current.coords) - offset;
        let d_next = normal.dot(&next.coords) - offset;

        if d_current <= 0.0 {
            out.push(current);
        }

        // Edge crosses the plane: emit the intersection
        if (d_current < 0.0 && d_next > 0.0) || (d_current > 0.0 && d_next < 0.0) {
            let t = d_current / (d_current - d_next);
            out.push(current + (next - current) * t);
        }
    }

    out
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`.
fn closest_points_on_segments(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> (Point3<f64>, Point3<f64>) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;

    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= AXIS_EPSILON && e <= AXIS_EPSILON {
        (0.0, 0.0)
    } else if a <= AXIS_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= AXIS_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;

            let s = if denom.abs() > AXIS_EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (s, ((b * s + f) / e).clamp(0.0, 1.0))
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}
