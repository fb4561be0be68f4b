use crate::constants::GRAVITY;
use crate::errors::SimulationError;
use crate::propulsion_system::chamber_solver::ChamberPressureSolver;
use crate::propulsion_system::isentropic::{
    get_critical_pressure_ratio, get_exit_pressure, get_operational_correction_factors,
    get_optimal_expansion_ratio, get_overall_nozzle_efficiency, get_thrust_coefficients,
    get_thrust_from_cf, is_flow_choked, LossInputs,
};
use crate::propulsion_system::motor::SolidMotor;
use std::fmt;
use tracing::info;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum MotorState {
    Burning,
    /// Propellant exhausted, nozzle still choked.
    Tailoff,
    ThrustEnded,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BurnProfile {
    Regressive,
    Progressive,
    Neutral,
}

impl fmt::Display for BurnProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BurnProfile::Regressive => "regressive",
            BurnProfile::Progressive => "progressive",
            BurnProfile::Neutral => "neutral",
        };
        write!(f, "{name}")
    }
}

/// Time series of one motor firing. Every series gains exactly one sample
/// per step, so all of them share the indices of `t`.
#[derive(Debug, Clone)]
pub struct MotorOperation {
    pub t: Vec<f64>,
    pub web: Vec<f64>,
    pub burn_area: Vec<f64>,
    pub propellant_volume: Vec<f64>,
    pub free_volume: Vec<f64>,
    pub propellant_mass: Vec<f64>,
    pub burn_rate: Vec<f64>,
    pub chamber_pressure: Vec<f64>,
    pub exit_pressure: Vec<f64>,
    pub optimal_expansion_ratio: Vec<f64>,
    pub n_kin: Vec<f64>,
    pub n_tp: Vec<f64>,
    pub n_bl: Vec<f64>,
    pub n_cf: Vec<f64>,
    pub c_f: Vec<f64>,
    pub c_f_ideal: Vec<f64>,
    pub thrust: Vec<f64>,
    pub state: MotorState,
    pub burnout_time: Option<f64>,
    pub thrust_time: Option<f64>,
}

impl MotorOperation {
    pub fn new(
        motor: &SolidMotor,
        igniter_pressure: f64,
        external_pressure: f64,
    ) -> Result<Self, SimulationError> {
        if !(igniter_pressure > 0.0) {
            return Err(SimulationError::InitializationError(format!(
                "igniter pressure must be positive, got {igniter_pressure} Pa"
            )));
        }
        let propellant_volume = motor.grain.get_propellant_volume(0.0);

        Ok(MotorOperation {
            t: vec![0.0],
            web: vec![0.0],
            burn_area: vec![motor.grain.get_burn_area(0.0)],
            propellant_volume: vec![propellant_volume],
            free_volume: vec![motor.get_free_chamber_volume(propellant_volume)],
            propellant_mass: vec![motor.get_initial_propellant_mass()],
            burn_rate: vec![0.0],
            chamber_pressure: vec![igniter_pressure],
            exit_pressure: vec![external_pressure],
            optimal_expansion_ratio: vec![1.0],
            n_kin: vec![0.0],
            n_tp: vec![0.0],
            n_bl: vec![0.0],
            n_cf: vec![0.0],
            c_f: vec![0.0],
            c_f_ideal: vec![0.0],
            thrust: vec![0.0],
            state: MotorState::Burning,
            burnout_time: None,
            thrust_time: None,
        })
    }

    /// Advances the firing by `d_t` against the given ambient pressure.
    /// Does nothing once thrust has ended.
    pub fn iterate(
        &mut self,
        motor: &SolidMotor,
        d_t: f64,
        external_pressure: f64,
    ) -> Result<(), SimulationError> {
        if self.is_thrust_ended() {
            return Ok(());
        }
        let propellant = &motor.propellant;
        let nozzle = &motor.nozzle;

        let time = self.get_time() + d_t;
        let web = self.get_web();
        let pressure = self.get_chamber_pressure();

        let burn_area = motor.grain.get_burn_area(web);
        let propellant_volume = motor.grain.get_propellant_volume(web);
        let free_volume = motor.get_free_chamber_volume(propellant_volume);
        let propellant_mass = propellant_volume * propellant.density;
        let burn_rate = if propellant_volume > 0.0 {
            propellant.get_burn_rate(pressure)?
        } else {
            0.0
        };

        let solver = ChamberPressureSolver {
            burn_area,
            propellant_density: propellant.density,
            burn_rate,
            free_volume,
            throat_area: nozzle.get_throat_area(),
            r_ch: propellant.get_r_ch(),
            t0: propellant.get_t0(),
            k: propellant.k_mix_ch,
            external_pressure,
        };
        let chamber_pressure = solver.solve(pressure, d_t, time)?;

        let critical_pressure_ratio = get_critical_pressure_ratio(propellant.k_mix_ch);
        let optimal_expansion_ratio =
            get_optimal_expansion_ratio(propellant.k_2ph_ex, chamber_pressure, external_pressure);
        let exit_pressure =
            get_exit_pressure(propellant.k_2ph_ex, nozzle.expansion_ratio, chamber_pressure);

        let (c1, c2) = nozzle.material.get_loss_constants();
        let factors = get_operational_correction_factors(&LossInputs {
            chamber_pressure,
            external_pressure,
            critical_pressure_ratio,
            expansion_ratio: nozzle.expansion_ratio,
            throat_diameter: nozzle.throat_diameter,
            throat_area: nozzle.get_throat_area(),
            initial_free_volume: self.free_volume[0],
            time,
            isp_frozen: propellant.isp_frozen,
            isp_shifting: propellant.isp_shifting,
            qsi_ch: propellant.qsi_ch,
            m_ch: propellant.m_ch,
            c1,
            c2,
        });
        let n_cf = get_overall_nozzle_efficiency(
            &factors,
            nozzle.get_divergent_correction_factor(),
            propellant.combustion_efficiency,
        );
        let (c_f, c_f_ideal) = get_thrust_coefficients(
            chamber_pressure,
            exit_pressure,
            external_pressure,
            nozzle.expansion_ratio,
            propellant.k_2ph_ex,
            n_cf,
        );
        let thrust = get_thrust_from_cf(c_f, chamber_pressure, nozzle.get_throat_area());

        self.t.push(time);
        self.web.push(web + burn_rate * d_t);
        self.burn_area.push(burn_area);
        self.propellant_volume.push(propellant_volume);
        self.free_volume.push(free_volume);
        self.propellant_mass.push(propellant_mass);
        self.burn_rate.push(burn_rate);
        self.chamber_pressure.push(chamber_pressure);
        self.exit_pressure.push(exit_pressure);
        self.optimal_expansion_ratio.push(optimal_expansion_ratio);
        self.n_kin.push(factors.n_kin);
        self.n_tp.push(factors.n_tp);
        self.n_bl.push(factors.n_bl);
        self.n_cf.push(n_cf);
        self.c_f.push(c_f);
        self.c_f_ideal.push(c_f_ideal);
        self.thrust.push(thrust);

        if propellant_mass == 0.0 && self.burnout_time.is_none() {
            self.burnout_time = Some(time);
            self.state = MotorState::Tailoff;
            info!(t_burnout = time, "propellant burnout");
        }
        if !is_flow_choked(chamber_pressure, external_pressure, critical_pressure_ratio) {
            self.thrust_time = Some(time);
            self.state = MotorState::ThrustEnded;
            info!(t_thrust = time, chamber_pressure, "nozzle unchoked, thrust ended");
        }
        Ok(())
    }

    pub fn is_thrust_ended(&self) -> bool {
        self.state == MotorState::ThrustEnded
    }

    pub fn is_burned_out(&self) -> bool {
        self.burnout_time.is_some()
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

    pub fn get_time(&self) -> f64 {
        Self::last(&self.t)
    }

    pub fn get_web(&self) -> f64 {
        Self::last(&self.web)
    }

    pub fn get_chamber_pressure(&self) -> f64 {
        Self::last(&self.chamber_pressure)
    }

    pub fn get_propellant_mass(&self) -> f64 {
        Self::last(&self.propellant_mass)
    }

    pub fn get_thrust(&self) -> f64 {
        Self::last(&self.thrust)
    }

    pub fn get_initial_propellant_mass(&self) -> f64 {
        self.propellant_mass.first().copied().unwrap_or(0.0)
    }

    /// Burn area to throat area ratio over the burning samples.
    pub fn get_klemmung(&self, motor: &SolidMotor) -> Vec<f64> {
        let throat_area = motor.nozzle.get_throat_area();
        self.burn_area
            .iter()
            .filter(|&&area| area > 0.0)
            .map(|area| area / throat_area)
            .collect()
    }

    pub fn get_initial_to_final_klemmung_ratio(&self, motor: &SolidMotor) -> Option<f64> {
        let klemmung = self.get_klemmung(motor);
        match (klemmung.first(), klemmung.last()) {
            (Some(first), Some(last)) => Some(first / last),
            _ => None,
        }
    }

    /// Share of the chamber volume initially filled with propellant.
    pub fn get_volumetric_efficiency(&self, motor: &SolidMotor) -> f64 {
        self.propellant_volume[0] / motor.chamber.get_empty_volume()
    }

    /// Classifies the burn area history, treating changes under `deviancy` as neutral.
    pub fn get_burn_profile(&self, deviancy: f64) -> Option<BurnProfile> {
        let burning: Vec<f64> = self.burn_area.iter().copied().filter(|&area| area > 0.0).collect();
        let ratio = burning.first()? / burning.last()?;
        Some(if ratio > 1.0 + deviancy {
            BurnProfile::Regressive
        } else if ratio < 1.0 - deviancy {
            BurnProfile::Progressive
        } else {
            BurnProfile::Neutral
        })
    }

    /// Port mass flux of every segment at every sample, kg/(m²·s).
    pub fn get_grain_mass_flux(&self, motor: &SolidMotor) -> Vec<Vec<f64>> {
        motor
            .grain
            .get_mass_flux_per_segment(&self.burn_rate, &self.web, motor.propellant.density)
    }

    pub fn get_max_mass_flux(&self, motor: &SolidMotor) -> f64 {
        self.get_grain_mass_flux(motor)
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    fn mean(series: &[f64]) -> f64 {
        if series.is_empty() {
            0.0
        } else {
            series.iter().sum::<f64>() / series.len() as f64
        }
    }

    fn max(series: &[f64]) -> f64 {
        series.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mean thrust over the firing times its duration.
    pub fn get_total_impulse(&self) -> f64 {
        Self::mean(&self.thrust) * self.get_time()
    }

    pub fn get_specific_impulse(&self) -> f64 {
        self.get_total_impulse() / self.get_initial_propellant_mass() / GRAVITY
    }

    pub fn get_max_chamber_pressure(&self) -> f64 {
        Self::max(&self.chamber_pressure)
    }

    pub fn get_mean_chamber_pressure(&self) -> f64 {
        Self::mean(&self.chamber_pressure)
    }

    pub fn get_max_thrust(&self) -> f64 {
        Self::max(&self.thrust)
    }

    pub fn get_mean_thrust(&self) -> f64 {
        Self::mean(&self.thrust)
    }

    pub fn get_mean_nozzle_efficiency(&self) -> f64 {
        Self::mean(&self.n_cf)
    }
}
