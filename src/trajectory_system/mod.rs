pub mod aerodynamics;
pub mod atmosphere;
pub mod ballistic_operation;
pub mod kinematics;
pub mod recovery;
pub mod rocket;
