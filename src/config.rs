use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{DEFAULT_MAP_DIM_2D, DEFAULT_MAP_DIM_3D};
use crate::errors::SimulationError;
use crate::grain_system::bates::BatesSegment;
use crate::grain_system::grain::Grain;
use crate::grain_system::segment::{circle_area, GrainSegment, SegmentGeometry};
use crate::grain_system::shapes::{CoreShape, FmmSegment2D};
use crate::grain_system::solid::FmmSegment3D;
use crate::propulsion_system::motor::SolidMotor;
use crate::propulsion_system::nozzle::{CombustionChamber, Nozzle, NozzleMaterial};
use crate::propulsion_system::propellant::SolidPropellant;
use crate::simulation::{CoupledSimulation, SimulationParams};
use crate::trajectory_system::aerodynamics::Fuselage;
use crate::trajectory_system::recovery::{Parachute, Recovery, RecoveryEvent};
use crate::trajectory_system::rocket::Rocket;

/// Complete description of one run, as read from a TOML file. Lengths are
/// in metres, pressures in pascals, masses in kilograms.
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    #[serde(default)]
    pub simulation: SimulationParams,
    pub propellant: SolidPropellant,
    pub nozzle: NozzleConfig,
    pub chamber: ChamberConfig,
    pub grain: GrainConfig,
    pub rocket: RocketConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NozzleConfig {
    pub throat_diameter: f64,
    pub divergent_angle: f64,
    pub convergent_angle: f64,
    pub expansion_ratio: f64,
    #[serde(default)]
    pub material: NozzleMaterial,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChamberConfig {
    pub casing_inner_diameter: f64,
    pub liner_thickness: f64,
    pub length: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrainConfig {
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SegmentConfig {
    pub outer_diameter: f64,
    pub length: f64,
    #[serde(default)]
    pub spacing: f64,
    #[serde(default)]
    pub inhibited_ends: u8,
    /// Regression grid cells per side, for the fast-marching variants.
    #[serde(default)]
    pub map_dim: Option<usize>,
    #[serde(flatten)]
    pub kind: SegmentKind,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    Bates {
        core_diameter: f64,
    },
    Tube {
        core_diameter: f64,
    },
    Star {
        point_count: u32,
        point_length: f64,
        point_width: f64,
    },
    WagonWheel {
        core_diameter: f64,
        port_count: u32,
        port_inner_diameter: f64,
        port_outer_diameter: f64,
        port_angular_width: f64,
    },
    RodAndTube {
        rod_outer_diameter: f64,
        tube_inner_diameter: f64,
    },
    DGrain {
        slot_offset: f64,
    },
    MultiPort {
        port_diameter: f64,
        radial_count: u32,
        level_count: u32,
    },
    Conical {
        upper_core_diameter: f64,
        lower_core_diameter: f64,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct RocketConfig {
    pub mass_without_motor: f64,
    pub motor_dry_mass: f64,
    pub drag_coefficient: f64,
    pub outer_diameter: f64,
    #[serde(default)]
    pub frontal_area: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub events: Vec<RecoveryEventConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryEventConfig {
    Altitude {
        trigger: f64,
        parachute: ParachuteConfig,
    },
    Apogee {
        trigger: f64,
        parachute: ParachuteConfig,
    },
}

/// Hemispherical canopy unless a drag coefficient is given.
#[derive(Debug, Deserialize, Clone)]
pub struct ParachuteConfig {
    pub diameter: f64,
    #[serde(default)]
    pub drag_coefficient: Option<f64>,
}

impl SimulationConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            SimulationError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SimulationError> {
        toml::from_str(text)
            .map_err(|e| SimulationError::ConfigError(format!("failed to parse TOML: {}", e)))
    }

    /// Validates every section and assembles a ready-to-run simulation.
    pub fn build(&self) -> Result<CoupledSimulation, SimulationError> {
        let mut grain = Grain::new();
        for segment in &self.grain.segments {
            grain.add_segment(segment.build()?)?;
        }

        let nozzle = Nozzle::new(
            self.nozzle.throat_diameter,
            self.nozzle.divergent_angle,
            self.nozzle.convergent_angle,
            self.nozzle.expansion_ratio,
            self.nozzle.material,
        )?;
        let chamber = CombustionChamber::new(
            self.chamber.casing_inner_diameter,
            self.chamber.liner_thickness,
            self.chamber.length,
        )?;
        let motor = SolidMotor::new(grain, self.propellant.clone(), nozzle, chamber)?;

        let mut recovery = Recovery::new();
        for event in &self.recovery.events {
            recovery.add_event(event.build()?);
        }
        let fuselage = Fuselage::new(
            self.rocket.outer_diameter,
            self.rocket.drag_coefficient,
            self.rocket.frontal_area,
        )?;
        let rocket = Rocket::new(
            fuselage,
            recovery,
            self.rocket.mass_without_motor,
            self.rocket.motor_dry_mass,
        )?;

        CoupledSimulation::new(motor, rocket, self.simulation.clone())
    }
}

impl SegmentConfig {
    pub fn build(&self) -> Result<Box<dyn GrainSegment>, SimulationError> {
        let geometry = SegmentGeometry::new(
            self.outer_diameter,
            self.length,
            self.spacing,
            self.inhibited_ends,
        )?;

        let shape = match self.kind {
            SegmentKind::Bates { core_diameter } => {
                return Ok(Box::new(BatesSegment::new(geometry, core_diameter)?));
            }
            SegmentKind::Conical {
                upper_core_diameter,
                lower_core_diameter,
            } => {
                let map_dim = self.map_dim.unwrap_or(DEFAULT_MAP_DIM_3D);
                return Ok(Box::new(FmmSegment3D::conical(
                    geometry,
                    upper_core_diameter,
                    lower_core_diameter,
                    map_dim,
                )?));
            }
            SegmentKind::Tube { core_diameter } => CoreShape::Tube { core_diameter },
            SegmentKind::Star {
                point_count,
                point_length,
                point_width,
            } => CoreShape::Star {
                point_count,
                point_length,
                point_width,
            },
            SegmentKind::WagonWheel {
                core_diameter,
                port_count,
                port_inner_diameter,
                port_outer_diameter,
                port_angular_width,
            } => CoreShape::WagonWheel {
                core_diameter,
                port_count,
                port_inner_diameter,
                port_outer_diameter,
                port_angular_width,
            },
            SegmentKind::RodAndTube {
                rod_outer_diameter,
                tube_inner_diameter,
            } => CoreShape::RodAndTube {
                rod_outer_diameter,
                tube_inner_diameter,
            },
            SegmentKind::DGrain { slot_offset } => CoreShape::DGrain { slot_offset },
            SegmentKind::MultiPort {
                port_diameter,
                radial_count,
                level_count,
            } => CoreShape::MultiPort {
                port_diameter,
                radial_count,
                level_count,
            },
        };
        let map_dim = self.map_dim.unwrap_or(DEFAULT_MAP_DIM_2D);
        Ok(Box::new(FmmSegment2D::new(geometry, shape, map_dim)?))
    }
}

impl ParachuteConfig {
    pub fn build(&self) -> Result<Parachute, SimulationError> {
        match self.drag_coefficient {
            Some(drag_coefficient) => Parachute::new(drag_coefficient, circle_area(self.diameter)),
            None => Parachute::hemispherical(self.diameter),
        }
    }
}

impl RecoveryEventConfig {
    pub fn build(&self) -> Result<RecoveryEvent, SimulationError> {
        match self {
            RecoveryEventConfig::Altitude { trigger, parachute } => Ok(RecoveryEvent::Altitude {
                trigger: *trigger,
                parachute: parachute.build()?,
            }),
            RecoveryEventConfig::Apogee { trigger, parachute } => Ok(RecoveryEvent::Apogee {
                trigger: *trigger,
                parachute: parachute.build()?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCENARIO: &str = r#"
[simulation]
d_t = 0.01
dd_t = 10.0
igniter_pressure = 1.5e6
rail_length = 3.0

[propellant]
name = "KNSB"
combustion_efficiency = 0.95
density = 1745.435
k_mix_ch = 1.1361
k_2ph_ex = 1.0420
t0_ideal = 1603.0
m_ch = 0.039857
m_ex = 0.040048
isp_frozen = 151.4
isp_shifting = 153.5
qsi_ch = 0.316
qsi_ex = 0.321

[[propellant.burn_rate]]
min = 0.0
max = 11.0e6
a = 5.13
n = 0.222

[nozzle]
throat_diameter = 0.0045
divergent_angle = 12.0
convergent_angle = 45.0
expansion_ratio = 4.0

[chamber]
casing_inner_diameter = 0.045
liner_thickness = 0.002
length = 0.08

[[grain.segments]]
type = "bates"
outer_diameter = 0.041
length = 0.068
core_diameter = 0.015

[rocket]
mass_without_motor = 0.3
motor_dry_mass = 0.2
drag_coefficient = 0.45
outer_diameter = 0.05

[[recovery.events]]
type = "apogee"
trigger = 1.0
parachute = { diameter = 0.5 }

[[recovery.events]]
type = "altitude"
trigger = 100.0
parachute = { diameter = 1.0, drag_coefficient = 1.5 }
"#;

    #[test]
    fn test_parse_scenario() {
        let config = SimulationConfig::from_toml_str(SCENARIO).unwrap();

        assert_relative_eq!(config.simulation.d_t, 0.01);
        assert_relative_eq!(config.simulation.rail_length, 3.0);
        // Unset keys fall back to the defaults
        assert_relative_eq!(config.simulation.initial_elevation_amsl, 0.0);
        assert_eq!(
            config.simulation.max_steps,
            SimulationParams::default().max_steps
        );

        assert_eq!(config.propellant.burn_rate.len(), 1);
        assert_eq!(config.nozzle.material, NozzleMaterial::Steel);
        assert_eq!(config.grain.segments.len(), 1);
        assert!(matches!(config.grain.segments[0].kind, SegmentKind::Bates { .. }));
        assert_eq!(config.recovery.events.len(), 2);
    }

    #[test]
    fn test_build_simulation() {
        let simulation = SimulationConfig::from_toml_str(SCENARIO).unwrap().build().unwrap();

        assert_eq!(simulation.motor.grain.segment_count(), 1);
        assert_relative_eq!(simulation.rocket.get_dry_mass(), 0.5);
        assert_eq!(simulation.rocket.recovery.events.len(), 2);

        let drogue = simulation.rocket.recovery.events[0].parachute();
        assert_relative_eq!(drogue.drag_coefficient, 0.71);
        let main = simulation.rocket.recovery.events[1].parachute();
        assert_relative_eq!(main.drag_coefficient, 1.5);
    }

    #[test]
    fn test_fmm_segment_types() {
        let text = SCENARIO.replace(
            "type = \"bates\"\nouter_diameter = 0.041\nlength = 0.068\ncore_diameter = 0.015",
            "type = \"star\"\nouter_diameter = 0.041\nlength = 0.068\nmap_dim = 100\n\
             point_count = 5\npoint_length = 0.008\npoint_width = 0.004",
        );
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        let segment = config.grain.segments[0].build().unwrap();

        assert!(segment.get_web_thickness() > 0.0);
        assert!(matches!(config.grain.segments[0].kind, SegmentKind::Star { point_count: 5, .. }));
    }

    #[test]
    fn test_invalid_geometry_surfaces() {
        let text = SCENARIO.replace("core_diameter = 0.015", "core_diameter = 0.05");
        let config = SimulationConfig::from_toml_str(&text).unwrap();
        assert!(matches!(config.build(), Err(SimulationError::GeometryError(_))));
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[simulation]\nd_t = \"fast\""),
            Err(SimulationError::ConfigError(_))
        ));
        assert!(matches!(
            SimulationConfig::load("does/not/exist.toml"),
            Err(SimulationError::ConfigError(_))
        ));
    }
}
