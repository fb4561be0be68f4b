//! Quasi-one-dimensional isentropic nozzle relations.

use crate::constants::{METERS_PER_INCH, PASCALS_PER_PSI};

pub fn get_critical_pressure_ratio(k: f64) -> f64 {
    (2.0 / (k + 1.0)).powf(k / (k - 1.0))
}

/// Whether the throat is choked for the given chamber and ambient pressures.
pub fn is_flow_choked(
    chamber_pressure: f64,
    external_pressure: f64,
    critical_pressure_ratio: f64,
) -> bool {
    chamber_pressure > external_pressure / critical_pressure_ratio
}

fn area_ratio_at(mach: f64, k: f64) -> f64 {
    let exponent = (k + 1.0) / (2.0 * (k - 1.0));
    ((1.0 + 0.5 * (k - 1.0) * mach * mach) / (1.0 + 0.5 * (k - 1.0))).powf(exponent) / mach
}

/// Supersonic exit Mach number for an area expansion ratio.
pub fn get_exit_mach(k: f64, expansion_ratio: f64) -> f64 {
    if expansion_ratio <= 1.0 {
        return 1.0;
    }
    // The area ratio rises monotonically with Mach above one, so bisection is safe.
    let (mut low, mut high) = (1.0, 2.0);
    while area_ratio_at(high, k) < expansion_ratio && high < 1e3 {
        high *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        if area_ratio_at(mid, k) < expansion_ratio {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < 1e-12 {
            break;
        }
    }
    0.5 * (low + high)
}

pub fn get_exit_pressure(k: f64, expansion_ratio: f64, chamber_pressure: f64) -> f64 {
    let mach = get_exit_mach(k, expansion_ratio);
    chamber_pressure * (1.0 + 0.5 * (k - 1.0) * mach * mach).powf(-k / (k - 1.0))
}

/// Expansion ratio that exhausts exactly to the external pressure.
pub fn get_optimal_expansion_ratio(k: f64, chamber_pressure: f64, external_pressure: f64) -> f64 {
    let pressure_ratio = external_pressure / chamber_pressure;
    let inverse = ((k + 1.0) / 2.0).powf(1.0 / (k - 1.0))
        * pressure_ratio.powf(1.0 / k)
        * (((k + 1.0) / (k - 1.0)) * (1.0 - pressure_ratio.powf((k - 1.0) / k))).sqrt();
    1.0 / inverse
}

/// Delivered and ideal thrust coefficients `(c_f, c_f_ideal)`, both floored at zero.
pub fn get_thrust_coefficients(
    chamber_pressure: f64,
    exit_pressure: f64,
    external_pressure: f64,
    expansion_ratio: f64,
    k: f64,
    n_cf: f64,
) -> (f64, f64) {
    let pressure_ratio = exit_pressure / chamber_pressure;
    let c_f_ideal = ((2.0 * k * k / (k - 1.0))
        * (2.0 / (k + 1.0)).powf((k + 1.0) / (k - 1.0))
        * (1.0 - pressure_ratio.powf((k - 1.0) / k)))
    .max(0.0)
    .sqrt();
    let pressure_thrust = expansion_ratio * (exit_pressure - external_pressure) / chamber_pressure;
    let c_f = (c_f_ideal + pressure_thrust) * n_cf;
    (c_f.max(0.0), c_f_ideal)
}

pub fn get_thrust_from_cf(c_f: f64, chamber_pressure: f64, throat_area: f64) -> f64 {
    c_f * chamber_pressure * throat_area
}

/// Loss factor of a conical divergent section with the given half angle.
pub fn get_divergent_correction_factor(divergent_angle_deg: f64) -> f64 {
    0.5 * (1.0 + divergent_angle_deg.to_radians().cos())
}

/// Operational losses, in percent of the ideal thrust coefficient.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CorrectionFactors {
    pub n_kin: f64,
    pub n_tp: f64,
    pub n_bl: f64,
}

impl CorrectionFactors {
    pub fn total(&self) -> f64 {
        self.n_kin + self.n_tp + self.n_bl
    }
}

/// Inputs of the empirical nozzle loss correlations.
#[derive(Debug, Clone, Copy)]
pub struct LossInputs {
    pub chamber_pressure: f64,
    pub external_pressure: f64,
    pub critical_pressure_ratio: f64,
    pub expansion_ratio: f64,
    pub throat_diameter: f64,
    pub throat_area: f64,
    pub initial_free_volume: f64,
    pub time: f64,
    pub isp_frozen: f64,
    pub isp_shifting: f64,
    pub qsi_ch: f64,
    pub m_ch: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Kinetic, two-phase and boundary-layer losses from chamber conditions.
///
/// Correlations take pressure in psi and throat diameter in inches. Two-phase
/// and boundary-layer losses only apply while the nozzle is choked.
pub fn get_operational_correction_factors(inputs: &LossInputs) -> CorrectionFactors {
    let p_psi = inputs.chamber_pressure / PASCALS_PER_PSI;
    let throat_in = inputs.throat_diameter / METERS_PER_INCH;

    let n_kin = if p_psi >= 200.0 {
        33.3 * 200.0 * (inputs.isp_frozen / inputs.isp_shifting) / p_psi
    } else {
        0.0
    };

    if !is_flow_choked(
        inputs.chamber_pressure,
        inputs.external_pressure,
        inputs.critical_pressure_ratio,
    ) {
        return CorrectionFactors {
            n_kin,
            ..CorrectionFactors::default()
        };
    }

    let term_c2 =
        1.0 + 2.0 * (-inputs.c2 * p_psi.powf(0.8) * inputs.time / throat_in.powf(0.2)).exp();
    let e_cf = 1.0 + 0.016 * inputs.expansion_ratio.powf(-9.0);
    let n_bl = inputs.c1 * (p_psi.powf(0.8) / throat_in.powf(0.2)) * term_c2 * e_cf;

    let c7 = 0.454
        * p_psi.powf(0.33)
        * inputs.qsi_ch.powf(0.33)
        * (1.0
            - (-0.004 * (inputs.initial_free_volume / inputs.throat_area) / METERS_PER_INCH).exp()
                * (1.0 + 0.045 * throat_in));
    let (c3, c4, c5, c6) = two_phase_coefficients(inputs.m_ch, inputs.throat_diameter, c7);
    let n_tp = c3 * (inputs.qsi_ch * c4 * c7.powf(c5))
        / (p_psi.powf(0.15) * inputs.expansion_ratio.powf(0.08) * throat_in.powf(c6));

    CorrectionFactors { n_kin, n_tp, n_bl }
}

/// `(C3, C4, C5, C6)` of the two-phase loss correlation.
fn two_phase_coefficients(m_ch: f64, throat_diameter: f64, c7: f64) -> (f64, f64, f64, f64) {
    let throat_in = throat_diameter / METERS_PER_INCH;
    let by_c7 = |low: (f64, f64, f64), mid: (f64, f64, f64), high: (f64, f64, f64)| {
        if c7 < 4.0 {
            low
        } else if c7 <= 8.0 {
            mid
        } else {
            high
        }
    };

    if 1.0 / m_ch >= 0.9 {
        let (c3, c5, c6) = if throat_in < 1.0 {
            (9.0, 1.0, 1.0)
        } else if throat_in < 2.0 {
            (9.0, 1.0, 0.8)
        } else {
            by_c7((13.4, 0.8, 0.8), (10.2, 0.8, 0.4), (7.58, 0.8, 0.33))
        };
        (c3, 0.5, c5, c6)
    } else {
        // Small-throat test divides by 0.0245, not by an inch.
        let (c3, c5, c6) = if throat_diameter / 0.0245 < 1.0 {
            (44.5, 0.8, 0.8)
        } else if throat_in < 2.0 {
            (30.4, 0.8, 0.4)
        } else {
            by_c7((44.5, 0.8, 0.8), (30.4, 0.8, 0.4), (25.2, 0.8, 0.33))
        };
        (c3, 1.0, c5, c6)
    }
}

/// Overall thrust coefficient correction from the operational losses.
pub fn get_overall_nozzle_efficiency(
    factors: &CorrectionFactors,
    divergent_correction_factor: f64,
    combustion_efficiency: f64,
) -> f64 {
    (100.0 - factors.total()) * divergent_correction_factor / 100.0 * combustion_efficiency
}
