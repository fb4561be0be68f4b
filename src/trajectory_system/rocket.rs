use crate::errors::SimulationError;

use super::{aerodynamics::Fuselage, recovery::Recovery};

/// Airframe flown by the motor: everything except the propellant.
#[derive(Debug, Clone)]
pub struct Rocket {
    pub fuselage: Fuselage,
    pub recovery: Recovery,
    pub mass_without_motor: f64, // kg
    pub motor_dry_mass: f64,     // kg
}

impl Rocket {
    pub fn new(
        fuselage: Fuselage,
        recovery: Recovery,
        mass_without_motor: f64,
        motor_dry_mass: f64,
    ) -> Result<Self, SimulationError> {
        if !(mass_without_motor >= 0.0)
            || !(motor_dry_mass >= 0.0)
            || !(mass_without_motor + motor_dry_mass > 0.0)
        {
            return Err(SimulationError::InitializationError(format!(
                "rocket masses must be non-negative with a positive sum, got {} kg and {} kg",
                mass_without_motor, motor_dry_mass
            )));
        }

        Ok(Rocket {
            fuselage,
            recovery,
            mass_without_motor,
            motor_dry_mass,
        })
    }

    pub fn get_dry_mass(&self) -> f64 {
        self.mass_without_motor + self.motor_dry_mass
    }

    pub fn get_vehicle_mass(&self, propellant_mass: f64) -> f64 {
        self.get_dry_mass() + propellant_mass
    }
}
