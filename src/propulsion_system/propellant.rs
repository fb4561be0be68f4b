use crate::constants::UNIVERSAL_GAS_CONSTANT;
use crate::errors::SimulationError;
use serde::Deserialize;

/// Saint-Robert law `r = a·P^n` valid over `[min, max]` Pa, with `a` in
/// mm/s/MPa^n.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BurnRateBand {
    pub min: f64,
    pub max: f64,
    pub a: f64,
    pub n: f64,
}

impl BurnRateBand {
    pub fn new(min: f64, max: f64, a: f64, n: f64) -> Self {
        BurnRateBand { min, max, a, n }
    }

    pub fn contains(&self, pressure: f64) -> bool {
        pressure >= self.min && pressure <= self.max
    }

    /// Burn rate in m/s.
    pub fn rate(&self, pressure: f64) -> f64 {
        self.a * (pressure * 1e-6).powf(self.n) * 1e-3
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolidPropellant {
    pub name: String,
    pub burn_rate: Vec<BurnRateBand>,
    pub combustion_efficiency: f64,
    pub density: f64, // kg/m³, already scaled by the ideal density ratio
    pub k_mix_ch: f64,
    pub k_2ph_ex: f64,
    pub t0_ideal: f64, // K
    pub m_ch: f64,     // kg/mol
    pub m_ex: f64,     // kg/mol
    pub isp_frozen: f64,
    pub isp_shifting: f64,
    pub qsi_ch: f64,
    pub qsi_ex: f64,
}

impl SolidPropellant {
    pub fn validate(&self) -> Result<(), SimulationError> {
        let fail = |message: String| Err(SimulationError::InitializationError(message));

        if self.burn_rate.is_empty() {
            return fail(format!("propellant {} has no burn rate bands", self.name));
        }
        for band in &self.burn_rate {
            if !(band.min >= 0.0 && band.max > band.min && band.a > 0.0) {
                return fail(format!(
                    "propellant {} has an invalid burn rate band {:?}",
                    self.name, band
                ));
            }
        }
        if !(self.combustion_efficiency > 0.0 && self.combustion_efficiency <= 1.0) {
            return fail(format!(
                "combustion efficiency must lie in (0, 1], got {}",
                self.combustion_efficiency
            ));
        }
        if !(self.density > 0.0 && self.t0_ideal > 0.0 && self.m_ch > 0.0 && self.m_ex > 0.0) {
            return fail(format!(
                "propellant {} needs positive density, temperature and molar masses",
                self.name
            ));
        }
        if !(self.k_mix_ch > 1.0 && self.k_2ph_ex > 1.0) {
            return fail(format!(
                "propellant {} needs heat capacity ratios above 1",
                self.name
            ));
        }
        Ok(())
    }

    /// Burn rate in m/s from the first band containing `pressure`.
    pub fn get_burn_rate(&self, pressure: f64) -> Result<f64, SimulationError> {
        self.burn_rate
            .iter()
            .find(|band| band.contains(pressure))
            .map(|band| band.rate(pressure))
            .ok_or(SimulationError::BurnRateOutOfBounds { pressure })
    }

    /// Adiabatic flame temperature after combustion losses.
    pub fn get_t0(&self) -> f64 {
        self.t0_ideal * self.combustion_efficiency
    }

    /// Specific gas constant of the chamber products.
    pub fn get_r_ch(&self) -> f64 {
        UNIVERSAL_GAS_CONSTANT / self.m_ch
    }

    pub fn get_r_ex(&self) -> f64 {
        UNIVERSAL_GAS_CONSTANT / self.m_ex
    }

    /// Potassium nitrate / sorbitol.
    pub fn knsb() -> Self {
        SolidPropellant {
            name: "KNSB".to_string(),
            burn_rate: vec![BurnRateBand::new(0.0, 11e6, 5.13, 0.222)],
            combustion_efficiency: 0.95,
            density: 1837.3 * 0.95,
            k_mix_ch: 1.1361,
            k_2ph_ex: 1.0420,
            t0_ideal: 1603.0,
            m_ch: 39.857e-3,
            m_ex: 40.048e-3,
            isp_frozen: 151.4,
            isp_shifting: 153.5,
            qsi_ch: 0.316,
            qsi_ex: 0.321,
        }
    }

    /// Potassium nitrate / dextrose.
    pub fn kndx() -> Self {
        SolidPropellant {
            name: "KNDX".to_string(),
            burn_rate: vec![
                BurnRateBand::new(0.0, 0.779e6, 8.875, 0.619),
                BurnRateBand::new(0.779e6, 2.572e6, 7.553, -0.009),
                BurnRateBand::new(2.572e6, 5.930e6, 3.841, 0.688),
                BurnRateBand::new(5.930e6, 8.502e6, 17.20, -0.148),
                BurnRateBand::new(8.502e6, 11.20e6, 4.775, 0.442),
            ],
            combustion_efficiency: 0.95,
            density: 1795.0,
            k_mix_ch: 1.1308,
            k_2ph_ex: 1.0430,
            t0_ideal: 1712.0,
            m_ch: 42.391e-3,
            m_ex: 42.882e-3,
            isp_frozen: 152.4,
            isp_shifting: 154.1,
            qsi_ch: 0.307,
            qsi_ex: 0.321,
        }
    }
}
