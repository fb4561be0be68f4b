use super::segment::{circle_area, GrainSegment, SegmentGeometry};
use crate::errors::SimulationError;
use std::f64::consts::PI;

/// Cylindrical grain with a circular core, solved in closed form.
#[derive(Debug, Clone)]
pub struct BatesSegment {
    geometry: SegmentGeometry,
    pub core_diameter: f64,
}

impl BatesSegment {
    pub fn new(geometry: SegmentGeometry, core_diameter: f64) -> Result<Self, SimulationError> {
        if !(core_diameter > 0.0 && core_diameter < geometry.outer_diameter) {
            return Err(SimulationError::GeometryError(format!(
                "BATES core diameter {core_diameter} m must lie in (0, {}) m",
                geometry.outer_diameter
            )));
        }
        Ok(Self {
            geometry,
            core_diameter,
        })
    }

    /// Length giving the most neutral burn area profile for this cross-section.
    pub fn get_optimal_length(&self) -> f64 {
        0.5 * (3.0 * self.geometry.outer_diameter + self.core_diameter)
    }

    fn burning_core_diameter(&self, web: f64) -> f64 {
        self.core_diameter + 2.0 * web
    }
}

impl GrainSegment for BatesSegment {
    fn geometry(&self) -> &SegmentGeometry {
        &self.geometry
    }

    fn get_web_thickness(&self) -> f64 {
        let radial = 0.5 * (self.geometry.outer_diameter - self.core_diameter);
        match self.geometry.axial_web_limit() {
            Some(axial) => radial.min(axial),
            None => radial,
        }
    }

    fn get_burn_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        let core = self.burning_core_diameter(web);
        let outer = self.geometry.outer_diameter;
        let core_area = PI * core * self.geometry.regressed_length(web);
        let face_area = 0.25 * PI * (outer * outer - core * core);
        core_area + self.geometry.burning_ends() * face_area
    }

    fn get_port_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        circle_area(self.burning_core_diameter(web))
    }

    fn get_volume(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        let core = self.burning_core_diameter(web);
        let outer = self.geometry.outer_diameter;
        0.25 * PI * (outer * outer - core * core) * self.geometry.regressed_length(web)
    }
}
