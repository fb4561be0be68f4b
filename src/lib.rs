pub mod config;
pub mod constants;
pub mod errors;
pub mod grain_system;
pub mod propulsion_system;
pub mod simulation;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use config::SimulationConfig;
pub use constants::*;
pub use errors::SimulationError;
pub use simulation::{CoupledSimulation, SimulationParams, SimulationResult, SimulationSummary};

// Re-export commonly used items from grain_system
pub use grain_system::bates::BatesSegment;
pub use grain_system::grain::Grain;
pub use grain_system::segment::{GrainSegment, SegmentGeometry};
pub use grain_system::shapes::{CoreShape, FmmSegment2D};
pub use grain_system::solid::FmmSegment3D;

// Re-export commonly used items from propulsion_system
pub use propulsion_system::motor::SolidMotor;
pub use propulsion_system::motor_operation::{BurnProfile, MotorOperation, MotorState};
pub use propulsion_system::nozzle::{CombustionChamber, Nozzle, NozzleMaterial};
pub use propulsion_system::propellant::{BurnRateBand, SolidPropellant};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::aerodynamics::Fuselage;
pub use trajectory_system::atmosphere::{Atmosphere, StandardAtmosphere};
pub use trajectory_system::ballistic_operation::{BallisticOperation, FlightState};
pub use trajectory_system::recovery::{Parachute, Recovery, RecoveryEvent};
pub use trajectory_system::rocket::Rocket;

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::Telemetry;
