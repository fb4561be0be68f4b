use super::segment::GrainSegment;
use crate::errors::SimulationError;
use tracing::debug;

/// Ordered stack of segments sharing one casing.
#[derive(Debug, Default)]
pub struct Grain {
    segments: Vec<Box<dyn GrainSegment>>,
}

impl Grain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_segment(&mut self, segment: Box<dyn GrainSegment>) -> Result<(), SimulationError> {
        if let Some(first) = self.segments.first() {
            let expected = first.get_outer_diameter();
            let found = segment.get_outer_diameter();
            if (expected - found).abs() > 1e-9 {
                return Err(SimulationError::GeometryError(format!(
                    "segment outer diameter {found} m does not match the grain's {expected} m"
                )));
            }
        }
        debug!(
            index = self.segments.len(),
            outer_diameter = segment.get_outer_diameter(),
            length = segment.geometry().length,
            "segment added to grain"
        );
        self.segments.push(segment);
        Ok(())
    }

    pub fn segments(&self) -> &[Box<dyn GrainSegment>] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get_outer_diameter(&self) -> Option<f64> {
        self.segments.first().map(|segment| segment.get_outer_diameter())
    }

    /// Stack length including the spacing after every segment.
    pub fn get_total_length(&self) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.geometry().length + segment.get_spacing())
            .sum()
    }

    pub fn get_burn_area(&self, web: f64) -> f64 {
        self.segments.iter().map(|segment| segment.get_burn_area(web)).sum()
    }

    pub fn get_propellant_volume(&self, web: f64) -> f64 {
        self.segments.iter().map(|segment| segment.get_volume(web)).sum()
    }

    /// Web of the segment that burns longest.
    pub fn get_web_thickness(&self) -> f64 {
        self.segments
            .iter()
            .map(|segment| segment.get_web_thickness())
            .fold(0.0, f64::max)
    }

    /// Mass flux through the port of every segment at every sample.
    ///
    /// The gas crossing segment `j`'s port is generated by segments `0..=j`.
    /// Returns one series per segment; consumed ports report zero.
    pub fn get_mass_flux_per_segment(
        &self,
        burn_rate: &[f64],
        web: &[f64],
        density: f64,
    ) -> Vec<Vec<f64>> {
        (0..self.segments.len())
            .map(|j| {
                burn_rate
                    .iter()
                    .zip(web)
                    .map(|(&rate, &w)| {
                        let port_area = self.segments[j].get_port_area(w);
                        if port_area <= 0.0 {
                            return 0.0;
                        }
                        let upstream_area: f64 = self.segments[..=j]
                            .iter()
                            .map(|segment| segment.get_burn_area(w))
                            .sum();
                        upstream_area * density * rate / port_area
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grain_system::bates::BatesSegment;
    use crate::grain_system::segment::{circle_area, SegmentGeometry};
    use approx::assert_relative_eq;

    fn bates(outer: f64, length: f64, spacing: f64) -> Box<dyn GrainSegment> {
        let geometry = SegmentGeometry::new(outer, length, spacing, 0).unwrap();
        Box::new(BatesSegment::new(geometry, 0.015).unwrap())
    }

    #[test]
    fn test_totals_sum_segments() {
        let mut grain = Grain::new();
        grain.add_segment(bates(0.041, 0.068, 0.002)).unwrap();
        grain.add_segment(bates(0.041, 0.068, 0.002)).unwrap();

        let single = bates(0.041, 0.068, 0.002);
        assert_eq!(grain.segment_count(), 2);
        assert_relative_eq!(grain.get_total_length(), 0.14, epsilon = 1e-12);
        assert_relative_eq!(
            grain.get_burn_area(0.004),
            2.0 * single.get_burn_area(0.004)
        );
        assert_relative_eq!(
            grain.get_propellant_volume(0.004),
            2.0 * single.get_volume(0.004)
        );
        assert_relative_eq!(grain.get_web_thickness(), 0.013);
    }

    #[test]
    fn test_mismatched_diameter_rejected() {
        let mut grain = Grain::new();
        grain.add_segment(bates(0.041, 0.068, 0.0)).unwrap();
        let result = grain.add_segment(bates(0.045, 0.068, 0.0));
        assert!(matches!(result, Err(SimulationError::GeometryError(_))));
        assert_eq!(grain.segment_count(), 1);
    }

    #[test]
    fn test_mass_flux_accumulates_downstream() {
        let mut grain = Grain::new();
        grain.add_segment(bates(0.041, 0.068, 0.0)).unwrap();
        grain.add_segment(bates(0.041, 0.068, 0.0)).unwrap();

        let density = 1745.0;
        let burn_rate = [0.007, 0.007];
        let web = [0.0, 0.02];
        let flux = grain.get_mass_flux_per_segment(&burn_rate, &web, density);

        assert_eq!(flux.len(), 2);
        let area = grain.segments()[0].get_burn_area(0.0);
        let expected_first = area * density * 0.007 / circle_area(0.015);
        assert_relative_eq!(flux[0][0], expected_first, max_relative = 1e-12);
        assert_relative_eq!(flux[1][0], 2.0 * expected_first, max_relative = 1e-12);
        assert_eq!(flux[1][1], 0.0);
    }
}
