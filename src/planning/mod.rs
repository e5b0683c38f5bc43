//! Free-space sampling for motion planning state spaces
//!
//! Draws 3D points uniformly from an axis-aligned region and rejects those
//! that fall inside any extruded polygon obstacle.

mod polygon;

use std::fmt;

use nalgebra::Vector3;
use rand::Rng;

pub use polygon::{BoundingBox, Polygon, PrismObstacle};

/// Default number of draws before [`FreeSpaceSampler::sample`] gives up
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Errors from the free-space sampler
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// Polygon or obstacle geometry is unusable
    InvalidPolygon {
        /// What was wrong
        description: String,
    },
    /// Sampling region is empty or not finite
    InvalidBounds {
        /// What was wrong
        description: String,
    },
    /// No free point found within the attempt budget
    SamplingExhausted {
        /// Draws made before giving up
        attempts: usize,
    },
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::InvalidPolygon { description } => {
                write!(f, "Invalid polygon: {}", description)
            }
            SamplingError::InvalidBounds { description } => {
                write!(f, "Invalid sampling bounds: {}", description)
            }
            SamplingError::SamplingExhausted { attempts } => {
                write!(f, "No free point found after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for SamplingError {}

/// Axis-aligned sampling region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    /// Lower corner
    pub min: Vector3<f64>,
    /// Upper corner
    pub max: Vector3<f64>,
}

impl Bounds3 {
    /// Create bounds; every `min` component must be strictly below `max`
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Result<Self, SamplingError> {
        let finite = min.iter().chain(max.iter()).all(|c| c.is_finite());
        if !finite || (0..3).any(|i| !(min[i] < max[i])) {
            return Err(SamplingError::InvalidBounds {
                description: format!("min {:?} must be finite and below max {:?}", min, max),
            });
        }
        Ok(Self { min, max })
    }

    /// Whether `p` lies inside or on the boundary
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Uniform draw from the region
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        Vector3::from_fn(|i, _| rng.gen_range(self.min[i]..self.max[i]))
    }
}

/// Rejection sampler over the free part of a region
#[derive(Debug, Clone)]
pub struct FreeSpaceSampler {
    bounds: Bounds3,
    obstacles: Vec<PrismObstacle>,
    max_attempts: usize,
}

impl FreeSpaceSampler {
    /// Sampler over `bounds` avoiding `obstacles`
    pub fn new(bounds: Bounds3, obstacles: Vec<PrismObstacle>) -> Self {
        Self {
            bounds,
            obstacles,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the attempt budget per sample
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sampling region
    pub fn bounds(&self) -> &Bounds3 {
        &self.bounds
    }

    /// Obstacles being avoided
    pub fn obstacles(&self) -> &[PrismObstacle] {
        &self.obstacles
    }

    /// Whether `p` is inside the region and outside every obstacle
    pub fn is_free(&self, p: &Vector3<f64>) -> bool {
        self.bounds.contains(p) && !self.obstacles.iter().any(|o| o.contains(p))
    }

    /// Draw one free point
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vector3<f64>, SamplingError> {
        for _ in 0..self.max_attempts {
            let p = self.bounds.sample_uniform(rng);
            if self.is_free(&p) {
                return Ok(p);
            }
        }
        log::debug!(
            "Free-space sampling gave up after {} attempts ({} obstacles)",
            self.max_attempts,
            self.obstacles.len()
        );
        Err(SamplingError::SamplingExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Draw `n` free points
    pub fn sample_n<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
    ) -> Result<Vec<Vector3<f64>>, SamplingError> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}
