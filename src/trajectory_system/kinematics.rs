use crate::utils::odes::rk4_step;

/// Forces acting on the vehicle during one step, held constant across it.
#[derive(Debug, Clone, Copy)]
pub struct StepForces {
    pub thrust: f64,         // N
    pub drag_constant: f64,  // kg/m, drag = D·v²
    pub vehicle_mass: f64,   // kg
    pub gravity: f64,        // m/s²
}

/// Height and velocity rates of the vertical flight.
pub fn ballistics_ode(velocity: f64, forces: &StepForces) -> (f64, f64) {
    let direction = if velocity < 0.0 { -1.0 } else { 1.0 };
    let drag = direction * forces.drag_constant * velocity.powi(2);
    let dv_dt = (forces.thrust - drag) / forces.vehicle_mass - forces.gravity;
    (velocity, dv_dt)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub height: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

/// One RK4 step. The returned acceleration is the step's averaged slope.
pub fn solve(height: f64, velocity: f64, forces: &StepForces, d_t: f64) -> KinematicState {
    let ([height, velocity], [_, acceleration]) = rk4_step([height, velocity], d_t, |state| {
        let (dy_dt, dv_dt) = ballistics_ode(state[1], forces);
        [dy_dt, dv_dt]
    });

    KinematicState {
        height,
        velocity,
        acceleration,
    }
}
