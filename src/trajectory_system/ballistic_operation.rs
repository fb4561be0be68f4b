use crate::constants::GRAVITY;
use crate::errors::SimulationError;
use tracing::info;

use super::aerodynamics::calculate_drag_constant;
use super::atmosphere::Atmosphere;
use super::kinematics::{self, StepForces};
use super::rocket::Rocket;

#[derive(PartialEq, Debug, Clone)]
pub enum FlightState {
    OnPad,
    Ascent,
    Descent,
}

/// Time series of a vertical flight. Heights are above ground level,
/// atmospheric properties are taken at `initial_elevation_amsl + y`.
#[derive(Debug, Clone)]
pub struct BallisticOperation {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
    pub v: Vec<f64>,
    pub acceleration: Vec<f64>,
    pub mach: Vec<f64>,
    pub p_ext: Vec<f64>,
    pub rho_air: Vec<f64>,
    pub g: Vec<f64>,
    pub vehicle_mass: Vec<f64>,
    pub rail_length: f64,
    pub initial_elevation_amsl: f64,
    pub velocity_out_of_rail: Option<f64>,
    /// First activation time of each recovery event, in event order.
    pub deployment_times: Vec<Option<f64>>,
    pub state: FlightState,
}

impl BallisticOperation {
    pub fn new(
        rocket: &Rocket,
        atmosphere: &dyn Atmosphere,
        initial_vehicle_mass: f64,
        rail_length: f64,
        initial_elevation_amsl: f64,
    ) -> Self {
        BallisticOperation {
            t: vec![0.0],
            y: vec![0.0],
            v: vec![0.0],
            acceleration: vec![0.0],
            mach: vec![0.0],
            p_ext: vec![atmosphere.get_pressure(initial_elevation_amsl)],
            rho_air: vec![atmosphere.get_density(initial_elevation_amsl)],
            g: vec![atmosphere.get_gravity(initial_elevation_amsl)],
            vehicle_mass: vec![initial_vehicle_mass],
            rail_length,
            initial_elevation_amsl,
            velocity_out_of_rail: None,
            deployment_times: vec![None; rocket.recovery.events.len()],
            state: FlightState::OnPad,
        }
    }

    /// Advances the flight by `d_t` under the given thrust, with
    /// `propellant_mass` still on board.
    pub fn iterate(
        &mut self,
        rocket: &Rocket,
        atmosphere: &dyn Atmosphere,
        propellant_mass: f64,
        thrust: f64,
        d_t: f64,
    ) -> Result<(), SimulationError> {
        let time = self.get_time() + d_t;
        let height = self.get_height();
        let velocity = self.get_velocity();
        let y_amsl = self.initial_elevation_amsl + height;

        let rho_air = atmosphere.get_density(y_amsl);
        let gravity = atmosphere.get_gravity(y_amsl);
        let vehicle_mass = rocket.get_vehicle_mass(propellant_mass);

        for index in rocket.recovery.get_active_events(&self.y, &self.t, &self.v, propellant_mass) {
            if self.deployment_times[index].is_none() {
                self.deployment_times[index] = Some(time);
                info!(
                    event = rocket.recovery.events[index].name(),
                    t = time,
                    height,
                    "recovery event deployed"
                );
            }
        }
        let recovery_drag_area =
            rocket.recovery.get_drag_area(&self.y, &self.t, &self.v, propellant_mass);

        let forces = StepForces {
            thrust,
            drag_constant: calculate_drag_constant(rho_air, &rocket.fuselage, recovery_drag_area),
            vehicle_mass,
            gravity,
        };
        let mut next = kinematics::solve(height, velocity, &forces, d_t);

        if !(next.height.is_finite()
            && next.velocity.is_finite()
            && next.acceleration.is_finite())
        {
            return Err(SimulationError::NumericalDivergence {
                subsystem: "trajectory",
                time,
                step: d_t,
                state: format!(
                    "y = {} m, v = {} m/s, a = {} m/s², mass = {} kg",
                    next.height, next.velocity, next.acceleration, vehicle_mass
                ),
            });
        }

        // Resting on the pad until thrust exceeds weight.
        if next.height < 0.0 && self.state == FlightState::OnPad {
            next.height = 0.0;
            next.velocity = 0.0;
            next.acceleration = 0.0;
        }

        let y_amsl = self.initial_elevation_amsl + next.height;
        self.t.push(time);
        self.y.push(next.height);
        self.v.push(next.velocity);
        self.acceleration.push(next.acceleration);
        self.mach.push(next.velocity / atmosphere.get_sonic_velocity(y_amsl));
        self.p_ext.push(atmosphere.get_pressure(y_amsl));
        self.rho_air.push(rho_air);
        self.g.push(gravity);
        self.vehicle_mass.push(vehicle_mass);

        if self.velocity_out_of_rail.is_none() && next.height > self.rail_length {
            self.velocity_out_of_rail = Some(velocity);
            info!(t = time, velocity, "left the launch rail");
        }

        match self.state {
            FlightState::OnPad if next.height > 0.0 => {
                self.state = FlightState::Ascent;
                info!(t = time, "liftoff");
            }
            FlightState::Ascent if next.velocity < 0.0 => {
                self.state = FlightState::Descent;
                info!(
                    apogee = self.get_apogee(),
                    t_apogee = self.get_apogee_time(),
                    "apogee reached"
                );
            }
            _ => {}
        }
        Ok(())
    }

    /// Drops the trailing samples below ground left by the landing step.
    pub fn discard_below_ground(&mut self) {
        if !self.has_lifted_off() {
            return;
        }
        let keep = self.y.iter().rposition(|&h| h >= 0.0).map_or(1, |i| i + 1);
        for series in [
            &mut self.t,
            &mut self.y,
            &mut self.v,
            &mut self.acceleration,
            &mut self.mach,
            &mut self.p_ext,
            &mut self.rho_air,
            &mut self.g,
            &mut self.vehicle_mass,
        ] {
            series.truncate(keep);
        }
    }

    pub fn has_lifted_off(&self) -> bool {
        self.state != FlightState::OnPad
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    fn last(series: &[f64]) -> f64 {
        series.last().copied().unwrap_or(0.0)
    }

    fn argmax(series: &[f64]) -> usize {
        series
            .iter()
            .enumerate()
            .fold(0, |best, (i, &value)| {
                if value > series[best] {
                    i
                } else {
                    best
                }
            })
    }

    fn max(series: &[f64]) -> f64 {
        series.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn get_time(&self) -> f64 {
        Self::last(&self.t)
    }

    pub fn get_height(&self) -> f64 {
        Self::last(&self.y)
    }

    pub fn get_velocity(&self) -> f64 {
        Self::last(&self.v)
    }

    pub fn get_apogee(&self) -> f64 {
        Self::max(&self.y)
    }

    pub fn get_apogee_time(&self) -> f64 {
        self.t[Self::argmax(&self.y)]
    }

    pub fn get_max_velocity(&self) -> f64 {
        Self::max(&self.v)
    }

    pub fn get_max_velocity_time(&self) -> f64 {
        self.t[Self::argmax(&self.v)]
    }

    pub fn get_max_mach(&self) -> f64 {
        Self::max(&self.mach)
    }

    /// Peak acceleration in multiples of g0.
    pub fn get_max_acceleration(&self) -> f64 {
        Self::max(&self.acceleration) / GRAVITY
    }

    pub fn get_liftoff_mass(&self) -> f64 {
        self.vehicle_mass[0]
    }

    pub fn get_flight_time(&self) -> f64 {
        self.get_time()
    }
}
