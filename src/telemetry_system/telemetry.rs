use crate::propulsion_system::motor::SolidMotor;
use crate::simulation::SimulationResult;
use std::fmt::Write;

/// Text report of a finished run: sampled time series plus summaries.
pub struct Telemetry {
    pub log: Vec<String>,
    pub summary: Vec<String>,
}

impl Telemetry {
    /// Collects every `sample_interval`-th flight sample into the log; zero
    /// keeps the summary only.
    pub fn collect_data(
        result: &SimulationResult,
        motor: &SolidMotor,
        sample_interval: usize,
    ) -> Self {
        let motor_operation = &result.motor_operation;
        let flight = &result.ballistic_operation;
        let mut log = Vec::new();
        let samples = if sample_interval == 0 { 0 } else { flight.len() };
        for i in (0..samples).step_by(sample_interval.max(1)) {
            let chamber_pressure = motor_operation.chamber_pressure.get(i).copied().unwrap_or(0.0);
            let thrust = motor_operation.thrust.get(i).copied().unwrap_or(0.0);
            log.push(format!(
                "Time: {}\n\
                 Altitude: {}\n\
                 Velocity: {:.2} m/s (Mach {:.3})\n\
                 Acceleration: {:.2} m/s²\n\
                 Thrust: {:.2} N\n\
                 Chamber Pressure: {:.3} MPa\n\
                 Air Density: {:.4} kg/m³\n\
                 Total Mass: {:.3} kg\n",
                Self::format_time(flight.t[i]),
                Self::format_altitude(flight.y[i]),
                flight.v[i],
                flight.mach[i],
                flight.acceleration[i],
                thrust,
                chamber_pressure * 1e-6,
                flight.rho_air[i],
                flight.vehicle_mass[i],
            ));
        }

        Telemetry {
            log,
            summary: Self::summarize(result, motor),
        }
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 3600.0 {
            let hours = (elapsed_time / 3600.0).floor();
            let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
        } else if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    fn format_altitude(altitude: f64) -> String {
        if altitude >= 1000.0 {
            format!("{:.2} km", altitude / 1000.0)
        } else {
            format!("{:.2} m", altitude)
        }
    }

    fn format_optional_time(time: Option<f64>) -> String {
        time.map_or_else(|| "not reached".to_string(), Self::format_time)
    }

    fn summarize(result: &SimulationResult, motor: &SolidMotor) -> Vec<String> {
        let operation = &result.motor_operation;
        let flight = &result.ballistic_operation;
        let mut lines = Vec::new();

        lines.push("--- Motor Summary ---".to_string());
        lines.push(format!("Propellant: {}", motor.propellant.name));
        lines.push(format!("Segments: {}", motor.grain.segment_count()));
        lines.push(format!("Propellant Mass: {:.3} kg", operation.get_initial_propellant_mass()));
        lines.push(format!("Burnout Time: {}", Self::format_optional_time(operation.burnout_time)));
        lines.push(format!("Thrust Time: {}", Self::format_optional_time(operation.thrust_time)));
        lines.push(format!("Total Impulse: {:.2} N·s", operation.get_total_impulse()));
        lines.push(format!("Specific Impulse: {:.2} s", operation.get_specific_impulse()));
        lines.push(format!("Max Thrust: {:.2} N", operation.get_max_thrust()));
        lines.push(format!("Mean Thrust: {:.2} N", operation.get_mean_thrust()));
        lines.push(format!(
            "Max Chamber Pressure: {:.3} MPa",
            operation.get_max_chamber_pressure() * 1e-6
        ));
        lines.push(format!(
            "Mean Chamber Pressure: {:.3} MPa",
            operation.get_mean_chamber_pressure() * 1e-6
        ));
        if let Some(ratio) = operation.get_initial_to_final_klemmung_ratio(motor) {
            lines.push(format!("Initial to Final Klemmung: {:.3}", ratio));
        }
        if let Some(profile) = operation.get_burn_profile(0.02) {
            lines.push(format!("Burn Profile: {}", profile));
        }
        lines.push(format!(
            "Volumetric Efficiency: {:.2} %",
            operation.get_volumetric_efficiency(motor) * 100.0
        ));
        lines.push(format!("Max Mass Flux: {:.2} kg/(m²·s)", operation.get_max_mass_flux(motor)));
        lines.push(format!(
            "Mean Nozzle Efficiency: {:.2} %",
            operation.get_mean_nozzle_efficiency() * 100.0
        ));

        lines.push(String::new());
        lines.push("--- Flight Summary ---".to_string());
        lines.push(format!("Apogee: {}", Self::format_altitude(flight.get_apogee())));
        lines.push(format!("Time to Apogee: {}", Self::format_time(flight.get_apogee_time())));
        lines.push(format!("Max Velocity: {:.2} m/s", flight.get_max_velocity()));
        lines.push(format!("Max Mach: {:.3}", flight.get_max_mach()));
        lines.push(format!("Max Acceleration: {:.2} g", flight.get_max_acceleration()));
        if let Some(velocity) = flight.velocity_out_of_rail {
            lines.push(format!("Velocity out of Rail: {:.2} m/s", velocity));
        }
        lines.push(format!("Liftoff Mass: {:.3} kg", flight.get_liftoff_mass()));
        lines.push(format!("Flight Time: {}", Self::format_time(flight.get_flight_time())));
        for (i, time) in flight.deployment_times.iter().enumerate() {
            lines.push(format!(
                "Recovery Event {} deployed at: {}",
                i + 1,
                Self::format_optional_time(*time)
            ));
        }
        lines
    }

    pub fn report(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "--- Telemetry Data ---");
        for entry in &self.log {
            let _ = writeln!(report, "{}", entry);
        }
        let _ = writeln!(report, "--- End of Telemetry ---");
        let _ = writeln!(report, "\n--- Simulation Summary ---");
        for line in &self.summary {
            let _ = writeln!(report, "{}", line);
        }
        report
    }

    pub fn display_data(&self) {
        print!("{}", self.report());
    }
}
