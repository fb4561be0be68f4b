use crate::errors::SimulationError;
use std::f64::consts::PI;
use std::fmt::Debug;

/// Area of a circle of the given diameter.
pub fn circle_area(diameter: f64) -> f64 {
    PI * diameter * diameter / 4.0
}

/// Dimensions shared by every grain segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGeometry {
    pub outer_diameter: f64,
    pub length: f64,
    pub spacing: f64,
    pub inhibited_ends: u8,
}

impl SegmentGeometry {
    pub fn new(
        outer_diameter: f64,
        length: f64,
        spacing: f64,
        inhibited_ends: u8,
    ) -> Result<Self, SimulationError> {
        if !(outer_diameter > 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "outer diameter must be positive, got {outer_diameter} m"
            )));
        }
        if !(length > 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "segment length must be positive, got {length} m"
            )));
        }
        if !(spacing >= 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "segment spacing must be non-negative, got {spacing} m"
            )));
        }
        if inhibited_ends > 2 {
            return Err(SimulationError::GeometryError(format!(
                "inhibited ends must be 0, 1 or 2, got {inhibited_ends}"
            )));
        }
        Ok(Self {
            outer_diameter,
            length,
            spacing,
            inhibited_ends,
        })
    }

    /// Number of end faces that burn.
    pub fn burning_ends(&self) -> f64 {
        f64::from(2 - self.inhibited_ends)
    }

    /// Length left once each burning end has receded by `web`.
    pub fn regressed_length(&self, web: f64) -> f64 {
        (self.length - self.burning_ends() * web).max(0.0)
    }

    /// Web at which the end faces meet, if any end burns.
    pub fn axial_web_limit(&self) -> Option<f64> {
        (self.inhibited_ends < 2).then(|| self.length / self.burning_ends())
    }

    /// Maps a physical length onto the unit-radius grid frame.
    pub fn normalize(&self, value: f64) -> f64 {
        value / (0.5 * self.outer_diameter)
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * 0.5 * self.outer_diameter
    }
}

/// Common interface of every grain segment geometry.
///
/// All quantities are in SI units. Once `web` exceeds the segment's web
/// thickness, burn area, port area, volume and length are all zero.
pub trait GrainSegment: Debug + Send + Sync {
    fn geometry(&self) -> &SegmentGeometry;

    fn get_web_thickness(&self) -> f64;

    fn get_burn_area(&self, web: f64) -> f64;

    fn get_port_area(&self, web: f64) -> f64;

    fn get_volume(&self, web: f64) -> f64;

    fn get_length(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            0.0
        } else {
            self.geometry().regressed_length(web)
        }
    }

    fn get_outer_diameter(&self) -> f64 {
        self.geometry().outer_diameter
    }

    fn get_spacing(&self) -> f64 {
        self.geometry().spacing
    }

    fn is_consumed(&self, web: f64) -> bool {
        web > self.get_web_thickness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_geometry_validation() {
        assert!(SegmentGeometry::new(0.041, 0.068, 0.0, 0).is_ok());
        assert!(SegmentGeometry::new(0.0, 0.068, 0.0, 0).is_err());
        assert!(SegmentGeometry::new(0.041, -1.0, 0.0, 0).is_err());
        assert!(SegmentGeometry::new(0.041, 0.068, -0.001, 0).is_err());
        assert!(SegmentGeometry::new(0.041, 0.068, 0.0, 3).is_err());
        assert!(SegmentGeometry::new(f64::NAN, 0.068, 0.0, 0).is_err());
    }

    #[test]
    fn test_regressed_length_scales_with_burning_ends() {
        let both = SegmentGeometry::new(0.041, 0.068, 0.0, 0).unwrap();
        let one = SegmentGeometry::new(0.041, 0.068, 0.0, 1).unwrap();
        let none = SegmentGeometry::new(0.041, 0.068, 0.0, 2).unwrap();

        assert_abs_diff_eq!(both.regressed_length(0.005), 0.058, epsilon = 1e-12);
        assert_abs_diff_eq!(one.regressed_length(0.005), 0.063, epsilon = 1e-12);
        assert_abs_diff_eq!(none.regressed_length(0.005), 0.068, epsilon = 1e-12);
        assert_eq!(none.axial_web_limit(), None);
        assert_abs_diff_eq!(both.axial_web_limit().unwrap(), 0.034, epsilon = 1e-12);
    }

    #[test]
    fn test_normalization_round_trip() {
        let geometry = SegmentGeometry::new(0.05, 0.1, 0.0, 0).unwrap();
        assert_abs_diff_eq!(geometry.normalize(0.025), 1.0, epsilon = 1e-12);
        let web = geometry.denormalize(geometry.normalize(0.013));
        assert_abs_diff_eq!(web, 0.013, epsilon = 1e-12);
    }
}
