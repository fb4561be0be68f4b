use crate::constants::{DEFAULT_MAX_STEPS, DEFAULT_TIME_STEP, DEFAULT_TIME_STEP_MULTIPLIER};
use crate::errors::SimulationError;
use crate::propulsion_system::motor::SolidMotor;
use crate::propulsion_system::motor_operation::MotorOperation;
use crate::trajectory_system::atmosphere::{Atmosphere, StandardAtmosphere};
use crate::trajectory_system::ballistic_operation::BallisticOperation;
use crate::trajectory_system::rocket::Rocket;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub d_t: f64,                    // s
    pub dd_t: f64,                   // step multiplier after thrust end
    pub igniter_pressure: f64,       // Pa
    pub initial_elevation_amsl: f64, // m
    pub rail_length: f64,            // m
    pub max_steps: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            d_t: DEFAULT_TIME_STEP,
            dd_t: DEFAULT_TIME_STEP_MULTIPLIER,
            igniter_pressure: 1.5e6,
            initial_elevation_amsl: 0.0,
            rail_length: 5.0,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.d_t > 0.0) {
            return Err(SimulationError::InitializationError(format!(
                "time step must be positive, got {} s",
                self.d_t
            )));
        }
        if !(self.dd_t >= 1.0) {
            return Err(SimulationError::InitializationError(format!(
                "time step multiplier must be at least 1, got {}",
                self.dd_t
            )));
        }
        if !(self.igniter_pressure > 0.0) {
            return Err(SimulationError::InitializationError(format!(
                "igniter pressure must be positive, got {} Pa",
                self.igniter_pressure
            )));
        }
        if !(self.rail_length >= 0.0) || !self.initial_elevation_amsl.is_finite() {
            return Err(SimulationError::InitializationError(format!(
                "invalid launch site: rail {} m, elevation {} m",
                self.rail_length, self.initial_elevation_amsl
            )));
        }
        if self.max_steps == 0 {
            return Err(SimulationError::InitializationError(
                "step cap must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Headline figures of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub total_impulse: f64,       // N·s
    pub specific_impulse: f64,    // s
    pub burnout_time: Option<f64>,
    pub thrust_time: Option<f64>,
    pub max_chamber_pressure: f64, // Pa
    pub max_thrust: f64,           // N
    pub apogee: f64,               // m AGL
    pub apogee_time: f64,
    pub max_velocity: f64,
    pub max_mach: f64,
    pub velocity_out_of_rail: Option<f64>,
    pub flight_time: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub motor_operation: MotorOperation,
    pub ballistic_operation: BallisticOperation,
}

impl SimulationResult {
    pub fn get_summary(&self) -> SimulationSummary {
        let motor = &self.motor_operation;
        let flight = &self.ballistic_operation;
        SimulationSummary {
            total_impulse: motor.get_total_impulse(),
            specific_impulse: motor.get_specific_impulse(),
            burnout_time: motor.burnout_time,
            thrust_time: motor.thrust_time,
            max_chamber_pressure: motor.get_max_chamber_pressure(),
            max_thrust: motor.get_max_thrust(),
            apogee: flight.get_apogee(),
            apogee_time: flight.get_apogee_time(),
            max_velocity: flight.get_max_velocity(),
            max_mach: flight.get_max_mach(),
            velocity_out_of_rail: flight.velocity_out_of_rail,
            flight_time: flight.get_flight_time(),
        }
    }
}

/// Couples the motor firing to the vertical flight of the rocket carrying it.
#[derive(Debug)]
pub struct CoupledSimulation<A: Atmosphere = StandardAtmosphere> {
    pub motor: SolidMotor,
    pub rocket: Rocket,
    pub params: SimulationParams,
    pub atmosphere: A,
}

impl CoupledSimulation<StandardAtmosphere> {
    pub fn new(
        motor: SolidMotor,
        rocket: Rocket,
        params: SimulationParams,
    ) -> Result<Self, SimulationError> {
        Self::with_atmosphere(motor, rocket, params, StandardAtmosphere::new())
    }
}

impl<A: Atmosphere> CoupledSimulation<A> {
    pub fn with_atmosphere(
        motor: SolidMotor,
        rocket: Rocket,
        params: SimulationParams,
        atmosphere: A,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(CoupledSimulation {
            motor,
            rocket,
            params,
            atmosphere,
        })
    }

    /// Runs until the rocket is back on the ground with no propellant left.
    ///
    /// Both operations advance once per tick on a shared time axis. After
    /// thrust end the motor stops and the flight continues at `d_t·dd_t`.
    pub fn run(&self) -> Result<SimulationResult, SimulationError> {
        let params = &self.params;
        let elevation = params.initial_elevation_amsl;

        let mut motor_operation = MotorOperation::new(
            &self.motor,
            params.igniter_pressure,
            self.atmosphere.get_pressure(elevation),
        )?;
        let mut ballistic_operation = BallisticOperation::new(
            &self.rocket,
            &self.atmosphere,
            self.rocket.get_vehicle_mass(motor_operation.get_propellant_mass()),
            params.rail_length,
            elevation,
        );

        info!(
            d_t = params.d_t,
            dd_t = params.dd_t,
            propellant_mass = motor_operation.get_propellant_mass(),
            "starting coupled simulation"
        );

        let mut propellant_mass = motor_operation.get_propellant_mass();
        let mut steps = 0;
        while ballistic_operation.get_height() >= 0.0 || propellant_mass > 0.0 {
            if steps >= params.max_steps {
                return Err(SimulationError::InitializationError(format!(
                    "step cap of {} exceeded at t = {:.2} s",
                    params.max_steps,
                    ballistic_operation.get_time()
                )));
            }
            steps += 1;

            let (thrust, d_t) = if motor_operation.is_thrust_ended() {
                propellant_mass = 0.0;
                (0.0, params.d_t * params.dd_t)
            } else {
                let external_pressure = self
                    .atmosphere
                    .get_pressure(elevation + ballistic_operation.get_height());
                motor_operation.iterate(&self.motor, params.d_t, external_pressure)?;
                propellant_mass = motor_operation.get_propellant_mass();
                (motor_operation.get_thrust(), params.d_t)
            };

            ballistic_operation.iterate(
                &self.rocket,
                &self.atmosphere,
                propellant_mass,
                thrust,
                d_t,
            )?;

            if motor_operation.is_thrust_ended() && !ballistic_operation.has_lifted_off() {
                warn!(
                    t = ballistic_operation.get_time(),
                    "thrust ended without liftoff, stopping"
                );
                break;
            }
        }
        debug!(steps, "coupled loop finished");

        ballistic_operation.discard_below_ground();
        info!(
            apogee = ballistic_operation.get_apogee(),
            flight_time = ballistic_operation.get_flight_time(),
            total_impulse = motor_operation.get_total_impulse(),
            "simulation finished"
        );

        Ok(SimulationResult {
            motor_operation,
            ballistic_operation,
        })
    }
}
