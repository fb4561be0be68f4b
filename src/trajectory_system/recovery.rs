use crate::errors::SimulationError;
use crate::grain_system::segment::circle_area;

pub const HEMISPHERICAL_DRAG_COEFFICIENT: f64 = 0.71;

#[derive(Debug, Clone, PartialEq)]
pub struct Parachute {
    pub drag_coefficient: f64,
    pub area: f64,
}

impl Parachute {
    pub fn new(drag_coefficient: f64, area: f64) -> Result<Self, SimulationError> {
        if !(drag_coefficient > 0.0) || !(area > 0.0) {
            return Err(SimulationError::GeometryError(format!(
                "parachute needs positive drag coefficient and area, got {} and {} m²",
                drag_coefficient, area
            )));
        }
        Ok(Parachute {
            drag_coefficient,
            area,
        })
    }

    pub fn hemispherical(diameter: f64) -> Result<Self, SimulationError> {
        Self::new(HEMISPHERICAL_DRAG_COEFFICIENT, circle_area(diameter))
    }

    pub fn get_drag_area(&self) -> f64 {
        self.drag_coefficient * self.area
    }
}

/// Condition deploying a parachute, evaluated against the flight history.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryEvent {
    /// Descending at or below `trigger` metres above ground.
    Altitude { trigger: f64, parachute: Parachute },
    /// Descending with no propellant left, `trigger` seconds after apogee.
    Apogee { trigger: f64, parachute: Parachute },
}

impl RecoveryEvent {
    pub fn parachute(&self) -> &Parachute {
        match self {
            RecoveryEvent::Altitude { parachute, .. }
            | RecoveryEvent::Apogee { parachute, .. } => parachute,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecoveryEvent::Altitude { .. } => "altitude",
            RecoveryEvent::Apogee { .. } => "apogee",
        }
    }

    pub fn is_active(
        &self,
        height: &[f64],
        time: &[f64],
        velocity: &[f64],
        propellant_mass: f64,
    ) -> bool {
        let (Some(&current_height), Some(&current_time), Some(&current_velocity)) =
            (height.last(), time.last(), velocity.last())
        else {
            return false;
        };

        match self {
            RecoveryEvent::Altitude { trigger, .. } => {
                current_velocity < 0.0 && current_height <= *trigger
            }
            RecoveryEvent::Apogee { trigger, .. } => {
                let apogee_index = height
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, &h)| if h > height[best] { i } else { best });
                let Some(&apogee_time) = time.get(apogee_index) else {
                    return false;
                };
                propellant_mass == 0.0
                    && current_velocity < 0.0
                    && current_time >= apogee_time + trigger
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recovery {
    pub events: Vec<RecoveryEvent>,
}

impl Recovery {
    pub fn new() -> Self {
        Recovery { events: Vec::new() }
    }

    pub fn add_event(&mut self, event: RecoveryEvent) {
        self.events.push(event);
    }

    /// Indices of the events active for the given history.
    pub fn get_active_events(
        &self,
        height: &[f64],
        time: &[f64],
        velocity: &[f64],
        propellant_mass: f64,
    ) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| {
                event.is_active(height, time, velocity, propellant_mass)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of area·Cd over the active events.
    pub fn get_drag_area(
        &self,
        height: &[f64],
        time: &[f64],
        velocity: &[f64],
        propellant_mass: f64,
    ) -> f64 {
        self.events
            .iter()
            .filter(|event| {
                event.is_active(height, time, velocity, propellant_mass)
            })
            .map(|event| event.parachute().get_drag_area())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chute() -> Parachute {
        Parachute::hemispherical(1.0).unwrap()
    }

    #[test]
    fn test_hemispherical_parachute() {
        let parachute = chute();
        assert_relative_eq!(parachute.drag_coefficient, 0.71);
        assert_relative_eq!(parachute.area, std::f64::consts::PI * 0.25, epsilon = 1e-12);
        assert!(Parachute::hemispherical(0.0).is_err());
    }

    #[test]
    fn test_altitude_event_fires_on_descent_below_trigger() {
        let event = RecoveryEvent::Altitude {
            trigger: 500.0,
            parachute: chute(),
        };
        let time = [0.0, 1.0, 2.0];
        let falling = [-100.0; 3];
        let rising = [100.0; 3];

        // Descending through the trigger altitude
        assert!(event.is_active(&[700.0, 600.0, 500.0], &time, &falling, 0.0));
        assert!(event.is_active(&[600.0, 500.0, 400.0], &time, &falling, 0.0));
        // Above the trigger
        assert!(!event.is_active(&[800.0, 700.0, 600.0], &time, &falling, 0.0));
        // Still ascending below the trigger
        assert!(!event.is_active(&[100.0, 200.0, 300.0], &time, &rising, 0.0));
    }

    #[test]
    fn test_apogee_event_waits_for_delay() {
        let event = RecoveryEvent::Apogee {
            trigger: 1.0,
            parachute: chute(),
        };
        let height = [0.0, 50.0, 100.0, 95.0, 85.0];
        let velocity = [10.0, 5.0, 0.0, -5.0, -10.0];

        let history = |last: f64| [0.0, 1.0, 2.0, 2.5, last];

        // Apogee at t = 2.0
        assert!(!event.is_active(&height, &history(2.9), &velocity, 0.0));
        assert!(event.is_active(&height, &history(3.0), &velocity, 0.0));
        assert!(event.is_active(&height, &history(3.5), &velocity, 0.0));
        // Propellant left
        assert!(!event.is_active(&height, &history(3.5), &velocity, 0.01));
    }

    #[test]
    fn test_empty_history_is_inactive() {
        let event = RecoveryEvent::Apogee {
            trigger: 0.0,
            parachute: chute(),
        };
        assert!(!event.is_active(&[], &[], &[], 0.0));
    }

    #[test]
    fn test_recovery_sums_active_drag_areas() {
        let mut recovery = Recovery::new();
        recovery.add_event(RecoveryEvent::Apogee {
            trigger: 0.0,
            parachute: Parachute::new(1.5, 0.1).unwrap(),
        });
        recovery.add_event(RecoveryEvent::Altitude {
            trigger: 50.0,
            parachute: Parachute::new(0.8, 2.0).unwrap(),
        });

        let time = [0.0, 1.0, 2.0];
        let velocity = [10.0, 0.0, -5.0];

        let high = [0.0, 120.0, 110.0];
        assert_relative_eq!(
            recovery.get_drag_area(&high, &time, &velocity, 0.0),
            0.15,
            epsilon = 1e-12
        );
        assert_eq!(
            recovery.get_active_events(&high, &time, &velocity, 0.0),
            vec![0]
        );

        let low = [0.0, 45.0, 40.0];
        assert_relative_eq!(
            recovery.get_drag_area(&low, &time, &velocity, 0.0),
            0.15 + 1.6,
            epsilon = 1e-12
        );
    }
}
