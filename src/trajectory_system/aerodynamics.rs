use crate::errors::SimulationError;
use crate::grain_system::segment::circle_area;

#[derive(Debug, Clone)]
pub struct Fuselage {
    pub outer_diameter: f64,
    pub drag_coefficient: f64,
    pub frontal_area: f64,
}

impl Fuselage {
    /// Frontal area defaults to the circle of the outer diameter.
    pub fn new(
        outer_diameter: f64,
        drag_coefficient: f64,
        frontal_area: Option<f64>,
    ) -> Result<Self, SimulationError> {
        if !(outer_diameter > 0.0) || !(drag_coefficient >= 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "invalid fuselage: diameter {} m, drag coefficient {}",
                outer_diameter, drag_coefficient
            )));
        }
        let frontal_area = frontal_area.unwrap_or_else(|| circle_area(outer_diameter));
        if !(frontal_area > 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "fuselage frontal area must be positive, got {} m²",
                frontal_area
            )));
        }

        Ok(Fuselage {
            outer_diameter,
            drag_coefficient,
            frontal_area,
        })
    }

    pub fn get_drag_area(&self) -> f64 {
        self.frontal_area * self.drag_coefficient
    }
}

pub fn calculate_dynamic_pressure(air_density: f64, velocity: f64) -> f64 {
    0.5 * air_density * velocity.powi(2)
}

/// Drag constant `D` such that the drag force is `D·v²`.
pub fn calculate_drag_constant(
    air_density: f64,
    fuselage: &Fuselage,
    recovery_drag_area: f64,
) -> f64 {
    calculate_dynamic_pressure(air_density, 1.0) * (fuselage.get_drag_area() + recovery_drag_area)
}
