use crate::constants::{
    AIR_GAS_CONSTANT, AIR_HEAT_CAPACITY_RATIO, AIR_MOLAR_MASS, ATMOSPHERE_HEIGHT, EARTH_RADIUS,
    GRAVITY, SEA_LEVEL_PRESSURE, SEA_LEVEL_TEMPERATURE, STANDARD_GRAVITY, TROPOSPHERE_HEIGHT,
    TROPOSPHERE_TEMP_GRADIENT, UNIVERSAL_GAS_CONSTANT,
};

/// Ambient conditions as a function of altitude above mean sea level (m).
pub trait Atmosphere {
    fn get_density(&self, y_amsl: f64) -> f64;
    fn get_gravity(&self, y_amsl: f64) -> f64;
    fn get_pressure(&self, y_amsl: f64) -> f64;
    fn get_sonic_velocity(&self, y_amsl: f64) -> f64;
    fn get_temperature(&self, y_amsl: f64) -> f64;
}

/// Base of one layer of the 1976 standard atmosphere.
#[derive(Debug, Clone, Copy)]
struct Layer {
    base_height: f64,      // m, geopotential
    base_temperature: f64, // K
    lapse_rate: f64,       // K/m
    base_pressure: f64,    // Pa
}

const LAYERS: [Layer; 7] = [
    Layer {
        base_height: 0.0,
        base_temperature: SEA_LEVEL_TEMPERATURE,
        lapse_rate: TROPOSPHERE_TEMP_GRADIENT,
        base_pressure: SEA_LEVEL_PRESSURE,
    },
    Layer {
        base_height: TROPOSPHERE_HEIGHT,
        base_temperature: 216.65,
        lapse_rate: 0.0,
        base_pressure: 22_632.06,
    },
    Layer {
        base_height: 20_000.0,
        base_temperature: 216.65,
        lapse_rate: 1.0e-3,
        base_pressure: 5_474.889,
    },
    Layer {
        base_height: 32_000.0,
        base_temperature: 228.65,
        lapse_rate: 2.8e-3,
        base_pressure: 868.018_7,
    },
    Layer {
        base_height: 47_000.0,
        base_temperature: 270.65,
        lapse_rate: 0.0,
        base_pressure: 110.906_3,
    },
    Layer {
        base_height: 51_000.0,
        base_temperature: 270.65,
        lapse_rate: -2.8e-3,
        base_pressure: 66.938_87,
    },
    Layer {
        base_height: 71_000.0,
        base_temperature: 214.65,
        lapse_rate: -2.0e-3,
        base_pressure: 3.956_420,
    },
];

/// US Standard Atmosphere 1976 up to 86 km. Above that pressure and
/// density are zero and the temperature stays at its 86 km value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAtmosphere;

impl StandardAtmosphere {
    pub fn new() -> Self {
        StandardAtmosphere
    }

    pub fn get_geopotential_altitude(y_amsl: f64) -> f64 {
        EARTH_RADIUS * y_amsl / (EARTH_RADIUS + y_amsl)
    }

    fn layer(height: f64) -> &'static Layer {
        LAYERS
            .iter()
            .rev()
            .find(|layer| height >= layer.base_height)
            .unwrap_or(&LAYERS[0])
    }

    fn is_in_atmosphere(y_amsl: f64) -> bool {
        y_amsl < ATMOSPHERE_HEIGHT
    }

    fn temperature_at(height: f64) -> f64 {
        let layer = Self::layer(height);
        layer.base_temperature + layer.lapse_rate * (height - layer.base_height)
    }

    fn pressure_at(height: f64) -> f64 {
        let layer = Self::layer(height);
        // g0·M/R, K/m
        let hydrostatic = STANDARD_GRAVITY * AIR_MOLAR_MASS / UNIVERSAL_GAS_CONSTANT;
        if layer.lapse_rate == 0.0 {
            let exponent = -hydrostatic * (height - layer.base_height) / layer.base_temperature;
            layer.base_pressure * exponent.exp()
        } else {
            let temperature = Self::temperature_at(height);
            let exponent = hydrostatic / layer.lapse_rate;
            layer.base_pressure * (layer.base_temperature / temperature).powf(exponent)
        }
    }
}

impl Atmosphere for StandardAtmosphere {
    fn get_density(&self, y_amsl: f64) -> f64 {
        if !Self::is_in_atmosphere(y_amsl) {
            return 0.0;
        }
        self.get_pressure(y_amsl) / (AIR_GAS_CONSTANT * self.get_temperature(y_amsl))
    }

    fn get_gravity(&self, y_amsl: f64) -> f64 {
        GRAVITY * (EARTH_RADIUS / (EARTH_RADIUS + y_amsl)).powi(2)
    }

    fn get_pressure(&self, y_amsl: f64) -> f64 {
        if !Self::is_in_atmosphere(y_amsl) {
            return 0.0;
        }
        Self::pressure_at(Self::get_geopotential_altitude(y_amsl))
    }

    fn get_sonic_velocity(&self, y_amsl: f64) -> f64 {
        (AIR_HEAT_CAPACITY_RATIO * AIR_GAS_CONSTANT * self.get_temperature(y_amsl)).sqrt()
    }

    fn get_temperature(&self, y_amsl: f64) -> f64 {
        let y_amsl = y_amsl.min(ATMOSPHERE_HEIGHT);
        Self::temperature_at(Self::get_geopotential_altitude(y_amsl))
    }
}
