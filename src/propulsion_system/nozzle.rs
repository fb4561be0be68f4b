use crate::errors::SimulationError;
use crate::grain_system::segment::circle_area;
use crate::propulsion_system::isentropic::get_divergent_correction_factor;
use serde::Deserialize;
use std::f64::consts::PI;

/// Nozzle wall materials with their boundary-layer loss constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NozzleMaterial {
    #[default]
    Steel,
    Aluminium,
}

impl NozzleMaterial {
    /// `(C1, C2)` of the boundary-layer loss correlation.
    pub fn get_loss_constants(&self) -> (f64, f64) {
        match self {
            NozzleMaterial::Steel | NozzleMaterial::Aluminium => (0.00506, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nozzle {
    pub throat_diameter: f64,
    pub divergent_angle: f64,  // degrees, half angle
    pub convergent_angle: f64, // degrees, half angle
    pub expansion_ratio: f64,
    pub material: NozzleMaterial,
}

impl Nozzle {
    pub fn new(
        throat_diameter: f64,
        divergent_angle: f64,
        convergent_angle: f64,
        expansion_ratio: f64,
        material: NozzleMaterial,
    ) -> Result<Self, SimulationError> {
        if !(throat_diameter > 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "throat diameter must be positive, got {throat_diameter} m"
            )));
        }
        if !(expansion_ratio >= 1.0) {
            return Err(SimulationError::GeometryError(format!(
                "expansion ratio must be at least 1, got {expansion_ratio}"
            )));
        }
        if !(0.0..90.0).contains(&divergent_angle) || !(0.0..90.0).contains(&convergent_angle) {
            return Err(SimulationError::GeometryError(
                "nozzle half angles must lie in [0, 90) degrees".to_string(),
            ));
        }
        Ok(Nozzle {
            throat_diameter,
            divergent_angle,
            convergent_angle,
            expansion_ratio,
            material,
        })
    }

    pub fn get_throat_area(&self) -> f64 {
        circle_area(self.throat_diameter)
    }

    pub fn get_exit_diameter(&self) -> f64 {
        self.throat_diameter * self.expansion_ratio.sqrt()
    }

    pub fn get_divergent_correction_factor(&self) -> f64 {
        get_divergent_correction_factor(self.divergent_angle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombustionChamber {
    pub casing_inner_diameter: f64,
    pub liner_thickness: f64,
    pub length: f64,
}

impl CombustionChamber {
    pub fn new(
        casing_inner_diameter: f64,
        liner_thickness: f64,
        length: f64,
    ) -> Result<Self, SimulationError> {
        if !(length > 0.0
            && liner_thickness >= 0.0
            && casing_inner_diameter > 2.0 * liner_thickness)
        {
            return Err(SimulationError::InitializationError(format!(
                "empty chamber: length {} m, bore {} m, liner {} m",
                length, casing_inner_diameter, liner_thickness
            )));
        }
        Ok(CombustionChamber {
            casing_inner_diameter,
            liner_thickness,
            length,
        })
    }

    /// Bore diameter inside the thermal liner.
    pub fn get_inner_diameter(&self) -> f64 {
        self.casing_inner_diameter - 2.0 * self.liner_thickness
    }

    pub fn get_empty_volume(&self) -> f64 {
        0.25 * PI * self.get_inner_diameter().powi(2) * self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nozzle_areas() {
        let nozzle = Nozzle::new(0.0045, 12.0, 45.0, 4.0, NozzleMaterial::Steel).unwrap();
        assert_relative_eq!(nozzle.get_throat_area(), PI * 0.0045f64.powi(2) / 4.0);
        assert_relative_eq!(nozzle.get_exit_diameter(), 0.009, max_relative = 1e-12);
        assert_relative_eq!(
            nozzle.get_divergent_correction_factor(),
            0.989_07,
            max_relative = 1e-5
        );
        assert_eq!(nozzle.material.get_loss_constants(), (0.00506, 0.0));
    }

    #[test]
    fn test_nozzle_validation() {
        let steel = NozzleMaterial::Steel;
        assert!(Nozzle::new(0.0, 12.0, 45.0, 4.0, steel).is_err());
        assert!(Nozzle::new(0.005, 12.0, 45.0, 0.5, steel).is_err());
        assert!(Nozzle::new(0.005, 95.0, 45.0, 4.0, NozzleMaterial::Aluminium).is_err());
    }

    #[test]
    fn test_chamber_volume() {
        let chamber = CombustionChamber::new(0.045, 0.002, 0.08).unwrap();
        assert_relative_eq!(chamber.get_inner_diameter(), 0.041, max_relative = 1e-12);
        assert_relative_eq!(
            chamber.get_empty_volume(),
            0.25 * PI * 0.041f64.powi(2) * 0.08,
            max_relative = 1e-12
        );
        assert!(CombustionChamber::new(0.004, 0.002, 0.08).is_err());
    }
}
