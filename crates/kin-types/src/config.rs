//! Configuration types for simulation.
//!
//! All tuning state lives here and is carried by the world; there are no
//! process-wide statics. Callers hand a [`SimulationConfig`] to the world at
//! construction and may mutate it between steps.

use crate::dynamics::Gravity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Main configuration for a simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Fixed timestep for physics integration (seconds).
    pub timestep: f64,
    /// Gravity configuration.
    pub gravity: Gravity,
    /// Whether gravity is applied at all (per-body opt-out is separate).
    pub use_gravity: bool,
    /// Solver configuration.
    pub solver: SolverConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 120.0,
            gravity: Gravity::earth(),
            use_gravity: true,
            solver: SolverConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new simulation config with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Create a configuration for real-time simulation (60 Hz).
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            solver: SolverConfig::realtime(),
            ..Default::default()
        }
    }

    /// Create a configuration for high-fidelity simulation (480 Hz).
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self {
            timestep: 1.0 / 480.0,
            solver: SolverConfig::high_accuracy(),
            ..Default::default()
        }
    }

    /// Disable gravity (zero-G environment).
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.use_gravity = false;
        self
    }

    /// Set the gravity field.
    #[must_use]
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the solver configuration.
    #[must_use]
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidTimestep`](crate::KinError) for
    /// non-positive or non-finite timesteps, and propagates solver
    /// configuration errors.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(crate::KinError::InvalidTimestep(self.timestep));
        }

        if self.timestep > 1.0 {
            return Err(crate::KinError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }

        self.solver.validate()?;

        Ok(())
    }
}

/// Configuration for the constraint solver and collision queries.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Number of projected Gauss-Seidel iterations.
    ///
    /// The solver always runs this many sweeps; it is not convergence
    /// checked. More iterations approach the true LCP solution, fewer are
    /// cheaper but leave constraints softer.
    pub iterations: usize,

    /// Baumgarte stabilization factor.
    ///
    /// Scales how much positional constraint error is fed back into the
    /// velocity solve. Higher values correct drift faster but inject energy.
    /// Typical values: 0.1-0.3.
    pub baumgarte: f64,

    /// Numeric floor for effective-mass diagonal entries.
    ///
    /// Rows whose diagonal falls below this are skipped during the
    /// Gauss-Seidel sweep rather than divided through.
    pub diagonal_floor: f64,

    /// Relaxation factor for the Gauss-Seidel update.
    /// 1.0 = plain Gauss-Seidel, <1 under-relaxed, >1 over-relaxed.
    pub relaxation: f64,

    /// Maximum GJK iterations before reporting "no intersection".
    pub gjk_max_iterations: usize,

    /// Maximum EPA expansion iterations.
    pub epa_max_iterations: usize,

    /// Cap on EPA polytope faces; reaching it ends expansion with the best
    /// estimate so far.
    pub epa_max_faces: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 32,
            baumgarte: 0.2,
            diagonal_floor: 1e-7,
            relaxation: 1.0,
            gjk_max_iterations: 64,
            epa_max_iterations: 64,
            epa_max_faces: 128,
        }
    }
}

impl SolverConfig {
    /// High-accuracy configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            iterations: 128,
            baumgarte: 0.1,
            ..Default::default()
        }
    }

    /// Fast configuration for real-time use.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            iterations: 12,
            baumgarte: 0.3,
            ..Default::default()
        }
    }

    /// Set the iteration count.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the Baumgarte factor.
    #[must_use]
    pub const fn with_baumgarte(mut self, baumgarte: f64) -> Self {
        self.baumgarte = baumgarte;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KinError::InvalidConfig`](crate::KinError) when a value is
    /// out of its meaningful range.
    pub fn validate(&self) -> crate::Result<()> {
        if self.baumgarte < 0.0 || self.baumgarte > 1.0 {
            return Err(crate::KinError::invalid_config(
                "Baumgarte factor must be in [0, 1]",
            ));
        }
        if self.relaxation <= 0.0 || self.relaxation >= 2.0 {
            return Err(crate::KinError::invalid_config(
                "relaxation must be in (0, 2)",
            ));
        }
        if self.diagonal_floor <= 0.0 {
            return Err(crate::KinError::invalid_config(
                "diagonal floor must be positive",
            ));
        }
        if self.epa_max_faces < 4 {
            return Err(crate::KinError::invalid_config(
                "EPA face cap must allow at least a tetrahedron",
            ));
        }
        Ok(())
    }
}
