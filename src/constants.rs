// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²
pub const EARTH_RADIUS: f64 = 6_356_766.0; // meters (US 1976 effective radius)
pub const UNIVERSAL_GAS_CONSTANT: f64 = 8.314_462_618; // J/(mol⋅K)
pub const STANDARD_GRAVITY: f64 = 9.806_65; // m/s², US 1976 reference

// Environmental Constants
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m³
pub const AIR_GAS_CONSTANT: f64 = 287.053; // J/(kg⋅K)
pub const AIR_HEAT_CAPACITY_RATIO: f64 = 1.4;
pub const AIR_MOLAR_MASS: f64 = 0.028_964_4; // kg/mol
pub const TROPOSPHERE_TEMP_GRADIENT: f64 = -6.5 / 1_000.0; // K per meter
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const ATMOSPHERE_HEIGHT: f64 = 86_000.0; // m, top of the layered model

// Unit conversions
pub const METERS_PER_INCH: f64 = 0.0254;
pub const PASCALS_PER_PSI: f64 = 6_894.757;

// Regression grid defaults
pub const DEFAULT_MAP_DIM_2D: usize = 200;
pub const DEFAULT_MAP_DIM_3D: usize = 60;
pub const MIN_MAP_DIM_2D: usize = 100;
pub const MIN_MAP_DIM_3D: usize = 50;
pub const CONTOUR_EDGE_TOLERANCE: f64 = 3.0; // cells
pub const REGRESSION_CURVE_SAMPLES: usize = 128;

// Simulation Parameters
pub const DEFAULT_TIME_STEP: f64 = 0.01; // s
pub const DEFAULT_TIME_STEP_MULTIPLIER: f64 = 10.0;
pub const DEFAULT_MAX_STEPS: usize = 2_000_000;
