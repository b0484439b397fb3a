//! Debug visualization side channel.
//!
//! The stepper can push line segments and wireframe spheres describing
//! velocities, contact normals, and resolved contact forces to a collaborator
//! implementing [`DebugDraw`]. The channel is write-only and has no effect on
//! simulation; headless hosts use [`NoopDebugDraw`].

use nalgebra::Point3;

/// Sink for debug visualization primitives.
pub trait DebugDraw {
    /// Push a line segment in world space.
    fn push_line(&mut self, from: Point3<f64>, to: Point3<f64>);

    /// Push a wireframe sphere in world space.
    fn push_wireframe_sphere(&mut self, center: Point3<f64>, radius: f64);
}

/// A [`DebugDraw`] that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDebugDraw;

impl DebugDraw for NoopDebugDraw {
    fn push_line(&mut self, _from: Point3<f64>, _to: Point3<f64>) {}

    fn push_wireframe_sphere(&mut self, _center: Point3<f64>, _radius: f64) {}
}

/// A [`DebugDraw`] that records primitives, for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct RecordingDebugDraw {
    /// Recorded line segments.
    pub lines: Vec<(Point3<f64>, Point3<f64>)>,
    /// Recorded spheres.
    pub spheres: Vec<(Point3<f64>, f64)>,
}

impl RecordingDebugDraw {
    /// Clear everything recorded so far.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.spheres.clear();
    }
}

impl DebugDraw for RecordingDebugDraw {
    fn push_line(&mut self, from: Point3<f64>, to: Point3<f64>) {
        self.lines.push((from, to));
    }

    fn push_wireframe_sphere(&mut self, center: Point3<f64>, radius: f64) {
        self.spheres.push((center, radius));
    }
}
