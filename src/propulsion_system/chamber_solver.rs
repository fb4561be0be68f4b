use crate::errors::SimulationError;
use crate::propulsion_system::isentropic::get_critical_pressure_ratio;
use crate::utils::odes::rk4_step;

/// Chamber conditions held constant across one pressure step.
#[derive(Debug, Clone, Copy)]
pub struct ChamberPressureSolver {
    pub burn_area: f64,
    pub propellant_density: f64,
    pub burn_rate: f64,
    pub free_volume: f64,
    pub throat_area: f64,
    pub r_ch: f64,
    pub t0: f64,
    pub k: f64,
    pub external_pressure: f64,
}

impl ChamberPressureSolver {
    /// Outflow factor of the throat for the current pressure ratio.
    fn get_flow_factor(&self, chamber_pressure: f64) -> f64 {
        let k = self.k;
        let pressure_ratio = self.external_pressure / chamber_pressure;
        if pressure_ratio <= get_critical_pressure_ratio(k) {
            (k / (k + 1.0)).sqrt() * (2.0 / (k + 1.0)).powf(1.0 / (k - 1.0))
        } else {
            // Subsonic throat; no outflow once the chamber falls to ambient.
            let radicand = (k / (k - 1.0)) * (1.0 - pressure_ratio.powf((k - 1.0) / k));
            pressure_ratio.powf(1.0 / k) * radicand.max(0.0).sqrt()
        }
    }

    /// Seidel's chamber pressure equation, `dP0/dt`.
    pub fn get_pressure_derivative(&self, chamber_pressure: f64) -> f64 {
        let generation =
            self.r_ch * self.t0 * self.burn_area * self.propellant_density * self.burn_rate;
        let discharge = chamber_pressure
            * self.throat_area
            * self.get_flow_factor(chamber_pressure)
            * (2.0 * self.r_ch * self.t0).sqrt();
        (generation - discharge) / self.free_volume
    }

    /// Advances the chamber pressure by one RK4 step.
    ///
    /// A negative or non-finite result is a numerical divergence and is never
    /// clamped.
    pub fn solve(
        &self,
        chamber_pressure: f64,
        d_t: f64,
        time: f64,
    ) -> Result<f64, SimulationError> {
        let ([next], _) = rk4_step([chamber_pressure], d_t, |p| {
            [self.get_pressure_derivative(p[0])]
        });
        if !next.is_finite() || next < 0.0 {
            return Err(SimulationError::NumericalDivergence {
                subsystem: "chamber",
                time,
                step: d_t,
                state: format!("P0 went from {chamber_pressure:.1} Pa to {next:.1} Pa"),
            });
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solver(burn_area: f64) -> ChamberPressureSolver {
        ChamberPressureSolver {
            burn_area,
            propellant_density: 1745.0,
            burn_rate: 0.007,
            free_volume: 3e-5,
            throat_area: 1.59e-5,
            r_ch: 208.6,
            t0: 1523.0,
            k: 1.1361,
            external_pressure: 101_325.0,
        }
    }

    #[test]
    fn test_pressure_rises_when_generation_dominates() {
        let s = solver(5.5e-3);
        assert!(s.get_pressure_derivative(1.5e6) > 0.0);
        let next = s.solve(1.5e6, 0.001, 0.0).unwrap();
        assert!(next > 1.5e6);
    }

    #[test]
    fn test_equilibrium_is_stationary() {
        let mut s = solver(5.5e-3);
        // Choose the burn area that balances discharge at 3 MPa.
        let p = 3e6;
        s.burn_area = 0.0;
        let discharge = -s.get_pressure_derivative(p) * s.free_volume;
        s.burn_area = discharge / (s.r_ch * s.t0 * s.propellant_density * s.burn_rate);
        assert_relative_eq!(s.get_pressure_derivative(p), 0.0, epsilon = 1e-3);
        assert_relative_eq!(s.solve(p, 0.01, 0.0).unwrap(), p, max_relative = 1e-9);
    }

    #[test]
    fn test_tailoff_decays_without_burn_area() {
        let s = solver(0.0);
        let mut p = 2e6;
        for _ in 0..10 {
            let next = s.solve(p, 0.001, 0.0).unwrap();
            assert!(next < p);
            p = next;
        }
    }

    #[test]
    fn test_oversized_step_is_divergence() {
        let s = solver(5.5e-3);
        match s.solve(1.5e6, 1.0, 0.42) {
            Err(SimulationError::NumericalDivergence {
                subsystem,
                time,
                step,
                ..
            }) => {
                assert_eq!(subsystem, "chamber");
                assert_eq!(time, 0.42);
                assert_eq!(step, 1.0);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn test_no_outflow_below_ambient() {
        let s = solver(0.0);
        assert_eq!(s.get_pressure_derivative(90_000.0), 0.0);
    }
}
