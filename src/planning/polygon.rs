//! Planar polygons and extruded polygon obstacles

use nalgebra::{Vector2, Vector3};

use super::SamplingError;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower-left corner
    pub min: Vector2<f64>,
    /// Upper-right corner
    pub max: Vector2<f64>,
}

impl BoundingBox {
    /// Whether `p` lies inside or on the boundary
    #[inline]
    pub fn contains(&self, p: &Vector2<f64>) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }
}

/// Simple polygon given by its vertices in order (either winding)
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vector2<f64>>,
    bbox: BoundingBox,
}

impl Polygon {
    /// Create a polygon; needs at least three finite vertices
    pub fn new(vertices: Vec<Vector2<f64>>) -> Result<Self, SamplingError> {
        if vertices.len() < 3 {
            return Err(SamplingError::InvalidPolygon {
                description: format!("need at least 3 vertices, got {}", vertices.len()),
            });
        }
        if !vertices.iter().flat_map(|v| v.iter()).all(|c| c.is_finite()) {
            return Err(SamplingError::InvalidPolygon {
                description: "vertex coordinates must be finite".to_string(),
            });
        }

        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in &vertices[1..] {
            min = min.inf(v);
            max = max.sup(v);
        }

        Ok(Self {
            vertices,
            bbox: BoundingBox { min, max },
        })
    }

    /// Polygon from `(x, y)` pairs
    pub fn from_points(points: &[[f64; 2]]) -> Result<Self, SamplingError> {
        Self::new(points.iter().map(|&p| Vector2::from(p)).collect())
    }

    /// Vertices in the order given
    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices
    }

    /// Axis-aligned bounding box
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Even-odd point-in-polygon test
    ///
    /// The bounding box is checked first. Points exactly on an edge may
    /// land on either side.
    pub fn contains(&self, p: &Vector2<f64>) -> bool {
        if !self.bbox.contains(p) {
            return false;
        }

        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[j];
            if (a[1] > p[1]) != (b[1] > p[1]) {
                let x_cross = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                if p[0] < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Polygon footprint in the xy plane extruded over `[z_min, z_max]`
#[derive(Debug, Clone, PartialEq)]
pub struct PrismObstacle {
    /// Footprint
    pub footprint: Polygon,
    /// Bottom of the obstacle
    pub z_min: f64,
    /// Top of the obstacle
    pub z_max: f64,
}

impl PrismObstacle {
    /// Create an obstacle; requires `z_min <= z_max`
    pub fn new(footprint: Polygon, z_min: f64, z_max: f64) -> Result<Self, SamplingError> {
        if !(z_min <= z_max) {
            return Err(SamplingError::InvalidPolygon {
                description: format!("z range [{}, {}] is empty", z_min, z_max),
            });
        }
        Ok(Self {
            footprint,
            z_min,
            z_max,
        })
    }

    /// Whether `p` lies inside the obstacle
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        p[2] >= self.z_min && p[2] <= self.z_max && self.footprint.contains(&p.xy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_points(&[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]).unwrap()
    }

    #[test]
    fn test_convex_containment() {
        let sq = square();
        assert!(sq.contains(&Vector2::new(1.0, 1.0)));
        assert!(!sq.contains(&Vector2::new(3.0, 1.0)));
        assert!(!sq.contains(&Vector2::new(1.0, -0.5)));
        assert_eq!(sq.bounding_box().max, Vector2::new(2.0, 2.0));
    }

    #[test]
    fn test_concave_containment() {
        // U shape opening upward; the notch is outside but within the bbox
        let u = Polygon::from_points(&[
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ])
        .unwrap();
        assert!(u.contains(&Vector2::new(0.5, 2.5)));
        assert!(u.contains(&Vector2::new(2.5, 2.5)));
        assert!(u.contains(&Vector2::new(1.5, 0.5)));
        assert!(!u.contains(&Vector2::new(1.5, 2.0)));
        assert!(u.bounding_box().contains(&Vector2::new(1.5, 2.0)));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let cw = Polygon::from_points(&[[0.0, 0.0], [0.0, 2.0], [2.0, 2.0], [2.0, 0.0]]).unwrap();
        assert!(cw.contains(&Vector2::new(1.0, 1.0)));
    }

    #[test]
    fn test_invalid_polygons() {
        assert!(Polygon::from_points(&[[0.0, 0.0], [1.0, 1.0]]).is_err());
        assert!(Polygon::from_points(&[[0.0, 0.0], [1.0, f64::NAN], [1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_prism_z_extent() {
        let obstacle = PrismObstacle::new(square(), 0.0, 1.0).unwrap();
        assert!(obstacle.contains(&Vector3::new(1.0, 1.0, 0.5)));
        assert!(!obstacle.contains(&Vector3::new(1.0, 1.0, 1.5)));
        assert!(!obstacle.contains(&Vector3::new(3.0, 1.0, 0.5)));
        assert!(PrismObstacle::new(square(), 2.0, 1.0).is_err());
    }
}
