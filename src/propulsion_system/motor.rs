use crate::errors::SimulationError;
use crate::grain_system::grain::Grain;
use crate::propulsion_system::nozzle::{CombustionChamber, Nozzle};
use crate::propulsion_system::propellant::SolidPropellant;
use tracing::info;

#[derive(Debug)]
pub struct SolidMotor {
    pub grain: Grain,
    pub propellant: SolidPropellant,
    pub nozzle: Nozzle,
    pub chamber: CombustionChamber,
}

impl SolidMotor {
    pub fn new(
        grain: Grain,
        propellant: SolidPropellant,
        nozzle: Nozzle,
        chamber: CombustionChamber,
    ) -> Result<Self, SimulationError> {
        if grain.is_empty() {
            return Err(SimulationError::InitializationError(
                "motor grain has no segments".to_string(),
            ));
        }
        propellant.validate()?;

        let inner_diameter = chamber.get_inner_diameter();
        if let Some(outer_diameter) = grain.get_outer_diameter() {
            if outer_diameter > inner_diameter + 1e-9 {
                return Err(SimulationError::GeometryError(format!(
                    "grain diameter {outer_diameter} m exceeds the {inner_diameter} m bore"
                )));
            }
        }
        if grain.get_total_length() > chamber.length + 1e-9 {
            return Err(SimulationError::GeometryError(format!(
                "grain stack of {} m does not fit the {} m chamber",
                grain.get_total_length(),
                chamber.length
            )));
        }
        if nozzle.throat_diameter >= inner_diameter {
            return Err(SimulationError::GeometryError(format!(
                "throat diameter {} m is not smaller than the chamber bore",
                nozzle.throat_diameter
            )));
        }

        let motor = SolidMotor {
            grain,
            propellant,
            nozzle,
            chamber,
        };
        let propellant_volume = motor.grain.get_propellant_volume(0.0);
        if !(motor.get_free_chamber_volume(propellant_volume) > 0.0) {
            return Err(SimulationError::InitializationError(
                "grain leaves no free volume in the chamber".to_string(),
            ));
        }

        info!(
            propellant = %motor.propellant.name,
            segments = motor.grain.segment_count(),
            propellant_mass = motor.get_initial_propellant_mass(),
            "motor assembled"
        );
        Ok(motor)
    }

    pub fn get_initial_propellant_mass(&self) -> f64 {
        self.grain.get_propellant_volume(0.0) * self.propellant.density
    }

    /// Chamber volume not taken up by propellant.
    pub fn get_free_chamber_volume(&self, propellant_volume: f64) -> f64 {
        self.chamber.get_empty_volume() - propellant_volume
    }

    /// Ratio of burn area to throat area.
    pub fn get_klemmung(&self, web: f64) -> f64 {
        self.grain.get_burn_area(web) / self.nozzle.get_throat_area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grain_system::bates::BatesSegment;
    use crate::grain_system::segment::SegmentGeometry;
    use crate::propulsion_system::nozzle::NozzleMaterial;
    use approx::assert_relative_eq;

    fn grain(outer_diameter: f64, length: f64) -> Grain {
        let mut grain = Grain::new();
        let geometry = SegmentGeometry::new(outer_diameter, length, 0.0, 0).unwrap();
        grain
            .add_segment(Box::new(BatesSegment::new(geometry, 0.015).unwrap()))
            .unwrap();
        grain
    }

    fn nozzle() -> Nozzle {
        Nozzle::new(0.0045, 12.0, 45.0, 4.0, NozzleMaterial::Steel).unwrap()
    }

    #[test]
    fn test_motor_mass_and_volume() {
        let motor = SolidMotor::new(
            grain(0.041, 0.068),
            SolidPropellant::knsb(),
            nozzle(),
            CombustionChamber::new(0.045, 0.002, 0.08).unwrap(),
        )
        .unwrap();

        let volume = motor.grain.get_propellant_volume(0.0);
        assert_relative_eq!(
            motor.get_initial_propellant_mass(),
            volume * 1837.3 * 0.95,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            motor.get_free_chamber_volume(volume),
            motor.chamber.get_empty_volume() - volume,
            max_relative = 1e-12
        );
        assert!(motor.get_klemmung(0.0) > 300.0);
    }

    #[test]
    fn test_grain_must_fit_chamber() {
        let too_wide = SolidMotor::new(
            grain(0.041, 0.068),
            SolidPropellant::knsb(),
            nozzle(),
            CombustionChamber::new(0.043, 0.002, 0.08).unwrap(),
        );
        assert!(matches!(too_wide, Err(SimulationError::GeometryError(_))));

        let too_long = SolidMotor::new(
            grain(0.041, 0.1),
            SolidPropellant::knsb(),
            nozzle(),
            CombustionChamber::new(0.045, 0.002, 0.08).unwrap(),
        );
        assert!(matches!(too_long, Err(SimulationError::GeometryError(_))));

        let empty = SolidMotor::new(
            Grain::new(),
            SolidPropellant::knsb(),
            nozzle(),
            CombustionChamber::new(0.045, 0.002, 0.08).unwrap(),
        );
        assert!(matches!(empty, Err(SimulationError::InitializationError(_))));
    }
}
