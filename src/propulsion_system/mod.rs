pub mod chamber_solver;
pub mod isentropic;
pub mod motor;
pub mod motor_operation;
pub mod nozzle;
pub mod propellant;
