use super::contour::contour_length;
use super::regression::{FaceMap, RegressionField};
use super::segment::{circle_area, GrainSegment, SegmentGeometry};
use crate::constants::{
    CONTOUR_EDGE_TOLERANCE, DEFAULT_MAP_DIM_2D, MIN_MAP_DIM_2D, REGRESSION_CURVE_SAMPLES,
};
use crate::errors::SimulationError;
use std::f64::consts::PI;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Port cross-sections solved on a planar regression grid.
///
/// Dimensions are physical; angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreShape {
    Tube {
        core_diameter: f64,
    },
    Star {
        point_count: u32,
        point_length: f64,
        point_width: f64,
    },
    WagonWheel {
        core_diameter: f64,
        port_count: u32,
        port_inner_diameter: f64,
        port_outer_diameter: f64,
        port_angular_width: f64,
    },
    RodAndTube {
        rod_outer_diameter: f64,
        tube_inner_diameter: f64,
    },
    DGrain {
        slot_offset: f64,
    },
    MultiPort {
        port_diameter: f64,
        radial_count: u32,
        level_count: u32,
    },
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<(), SimulationError> {
    if condition {
        Ok(())
    } else {
        Err(SimulationError::GeometryError(message()))
    }
}

impl CoreShape {
    pub fn name(&self) -> &'static str {
        match self {
            CoreShape::Tube { .. } => "tube",
            CoreShape::Star { .. } => "star",
            CoreShape::WagonWheel { .. } => "wagon wheel",
            CoreShape::RodAndTube { .. } => "rod and tube",
            CoreShape::DGrain { .. } => "D-grain",
            CoreShape::MultiPort { .. } => "multi-port",
        }
    }

    pub fn validate(&self, outer_diameter: f64) -> Result<(), SimulationError> {
        match *self {
            CoreShape::Tube { core_diameter } => {
                check(core_diameter > 0.0 && core_diameter < outer_diameter, || {
                    format!("tube core {core_diameter} m must lie in (0, {outer_diameter}) m")
                })
            }
            CoreShape::Star {
                point_count,
                point_length,
                point_width,
            } => {
                check(point_count > 0 && point_count < 12, || {
                    format!("star needs between 1 and 11 points, got {point_count}")
                })?;
                check(point_length > 0.0 && point_length < 0.5 * outer_diameter, || {
                    format!("star point length {point_length} m must lie inside the casing")
                })?;
                check(point_width > 0.0, || {
                    format!("star point width must be positive, got {point_width} m")
                })
            }
            CoreShape::WagonWheel {
                core_diameter,
                port_count,
                port_inner_diameter,
                port_outer_diameter,
                port_angular_width,
            } => {
                check(port_count > 0 && port_count < 12 && port_count % 2 == 0, || {
                    format!("wagon wheel needs an even port count below 12, got {port_count}")
                })?;
                check(core_diameter > 0.0, || {
                    format!("wagon wheel core diameter must be positive, got {core_diameter} m")
                })?;
                check(port_inner_diameter > core_diameter, || {
                    "wagon wheel ports must start outside the core".to_string()
                })?;
                check(
                    port_outer_diameter > port_inner_diameter
                        && port_outer_diameter < outer_diameter,
                    || "wagon wheel ports must end inside the casing".to_string(),
                )?;
                check(
                    port_angular_width > 0.0 && port_angular_width < 360.0 / f64::from(port_count),
                    || format!("wagon wheel port width {port_angular_width}° overlaps"),
                )
            }
            CoreShape::RodAndTube {
                rod_outer_diameter,
                tube_inner_diameter,
            } => {
                check(rod_outer_diameter > 0.0, || {
                    format!("rod outer diameter must be positive, got {rod_outer_diameter} m")
                })?;
                check(
                    tube_inner_diameter > rod_outer_diameter
                        && tube_inner_diameter < outer_diameter,
                    || format!("tube bore {tube_inner_diameter} m must lie between rod and casing"),
                )
            }
            CoreShape::DGrain { slot_offset } => {
                let radius = 0.5 * outer_diameter;
                check(slot_offset >= 0.0 && slot_offset < radius, || {
                    format!("D-grain slot offset {slot_offset} m must lie in [0, {radius}) m")
                })
            }
            CoreShape::MultiPort {
                port_diameter,
                radial_count,
                level_count,
            } => {
                check(port_diameter > 0.0, || {
                    format!("port diameter must be positive, got {port_diameter} m")
                })?;
                check(radial_count > 0 && level_count > 0, || {
                    "multi-port grain needs at least one radial and one level".to_string()
                })?;
                check(
                    f64::from(level_count) * port_diameter < 0.5 * outer_diameter,
                    || "multi-port levels do not fit inside the casing".to_string(),
                )
            }
        }
    }

    /// Whether the normalized point `(x, y)` lies in the initial port.
    pub fn is_port(&self, x: f64, y: f64, geometry: &SegmentGeometry) -> bool {
        let radius = (x * x + y * y).sqrt();
        match *self {
            CoreShape::Tube { core_diameter } => radius < 0.5 * geometry.normalize(core_diameter),
            CoreShape::Star {
                point_count,
                point_length,
                point_width,
            } => {
                let length = geometry.normalize(point_length);
                let width = 0.5 * geometry.normalize(point_width) * (1.0 - radius / length);
                (0..point_count).any(|i| {
                    let theta = 2.0 * PI * f64::from(i) / f64::from(point_count);
                    let across = (theta.cos() * x + theta.sin() * y).abs();
                    let along = theta.sin() * x - theta.cos() * y;
                    across < width && along > -0.025
                })
            }
            CoreShape::WagonWheel {
                core_diameter,
                port_count,
                port_inner_diameter,
                port_outer_diameter,
                port_angular_width,
            } => {
                if radius < 0.5 * geometry.normalize(core_diameter) {
                    return true;
                }
                let in_band = radius > 0.5 * geometry.normalize(port_inner_diameter)
                    && radius < 0.5 * geometry.normalize(port_outer_diameter);
                let half_width = 0.5 * port_angular_width.to_radians();
                let angle = y.atan2(x);
                in_band
                    && (0..port_count).any(|i| {
                        let centre = 2.0 * PI * f64::from(i) / f64::from(port_count);
                        let offset = (angle - centre + PI).rem_euclid(2.0 * PI) - PI;
                        offset.abs() < half_width
                    })
            }
            CoreShape::RodAndTube {
                rod_outer_diameter,
                tube_inner_diameter,
            } => {
                radius > 0.5 * geometry.normalize(rod_outer_diameter)
                    && radius < 0.5 * geometry.normalize(tube_inner_diameter)
            }
            CoreShape::DGrain { slot_offset } => x > geometry.normalize(slot_offset),
            CoreShape::MultiPort {
                port_diameter,
                radial_count,
                level_count,
            } => {
                let port_radius = 0.5 * geometry.normalize(port_diameter);
                (0..radial_count).any(|radial| {
                    let angle = 2.0 * PI * f64::from(radial) / f64::from(radial_count);
                    (0..level_count).any(|level| {
                        let distance = f64::from(level) / f64::from(level_count);
                        let (cx, cy) = (distance * angle.cos(), distance * angle.sin());
                        ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() < port_radius
                    })
                })
            }
        }
    }
}

/// Linear interpolation in a curve sampled uniformly over `[0, span]`.
pub(crate) fn sample_curve(curve: &[f64], span: f64, at: f64) -> f64 {
    if curve.is_empty() || span <= 0.0 {
        return curve.first().copied().unwrap_or(0.0);
    }
    let last = curve.len() - 1;
    let position = (at / span).clamp(0.0, 1.0) * last as f64;
    let index = (position.floor() as usize).min(last.saturating_sub(1));
    let fraction = position - index as f64;
    if last == 0 {
        curve[0]
    } else {
        curve[index] + fraction * (curve[index + 1] - curve[index])
    }
}

/// Prismatic segment whose cross-section is regressed by fast marching.
///
/// The regression field and the perimeter curve are computed on first use
/// and kept for the lifetime of the segment.
#[derive(Debug)]
pub struct FmmSegment2D {
    geometry: SegmentGeometry,
    shape: CoreShape,
    face_map: FaceMap,
    field: OnceLock<RegressionField>,
    perimeter_curve: OnceLock<Vec<f64>>,
}

impl FmmSegment2D {
    pub fn new(
        geometry: SegmentGeometry,
        shape: CoreShape,
        map_dim: usize,
    ) -> Result<Self, SimulationError> {
        if map_dim < MIN_MAP_DIM_2D {
            return Err(SimulationError::GeometryError(format!(
                "planar grid needs at least {MIN_MAP_DIM_2D} cells per side, got {map_dim}"
            )));
        }
        if map_dim < DEFAULT_MAP_DIM_2D {
            warn!(map_dim, default = DEFAULT_MAP_DIM_2D, "coarse planar regression grid");
        }
        shape.validate(geometry.outer_diameter)?;
        let face_map = FaceMap::planar(map_dim, |x, y| shape.is_port(x, y, &geometry));
        face_map.check_burnable()?;

        Ok(Self {
            geometry,
            shape,
            face_map,
            field: OnceLock::new(),
            perimeter_curve: OnceLock::new(),
        })
    }

    pub fn shape(&self) -> &CoreShape {
        &self.shape
    }

    pub fn map_dim(&self) -> usize {
        self.face_map.shape().cols
    }

    pub fn face_map(&self) -> &FaceMap {
        &self.face_map
    }

    pub fn regression_field(&self) -> &RegressionField {
        self.field.get_or_init(|| {
            debug!(shape = self.shape.name(), map_dim = self.map_dim(), "regressing cross-section");
            RegressionField::march(&self.face_map)
        })
    }

    fn map_to_area(&self, cells: usize) -> f64 {
        let dim = self.map_dim() as f64;
        self.geometry.outer_diameter.powi(2) * cells as f64 / (dim * dim)
    }

    fn map_to_length(&self, cells: f64) -> f64 {
        self.geometry.outer_diameter * cells / self.map_dim() as f64
    }

    /// Web at which the front reaches the casing.
    pub fn get_wall_web(&self) -> f64 {
        self.geometry.denormalize(self.regression_field().max_distance())
    }

    /// Area of unburned propellant in the cross-section.
    pub fn get_face_area(&self, web: f64) -> f64 {
        let level = self.geometry.normalize(web);
        self.map_to_area(self.regression_field().unburned_cells(level))
    }

    /// Open port area of the cross-section.
    pub fn get_core_area(&self, web: f64) -> f64 {
        (circle_area(self.geometry.outer_diameter) - self.get_face_area(web)).max(0.0)
    }

    /// Burning perimeter measured directly from the field's iso-line.
    pub fn get_core_perimeter(&self, web: f64) -> f64 {
        let field = self.regression_field();
        let dim = self.map_dim();
        let cells = contour_length(
            field.slice(0),
            dim,
            dim,
            self.geometry.normalize(web),
            CONTOUR_EDGE_TOLERANCE,
        );
        self.map_to_length(cells)
    }

    fn perimeter_curve(&self) -> &[f64] {
        self.perimeter_curve.get_or_init(|| {
            let wall_web = self.get_wall_web();
            let step = wall_web / REGRESSION_CURVE_SAMPLES as f64;
            (0..=REGRESSION_CURVE_SAMPLES)
                .map(|i| self.get_core_perimeter(step * i as f64))
                .collect()
        })
    }

    /// Burning perimeter, interpolated from the memoized curve.
    pub fn get_perimeter(&self, web: f64) -> f64 {
        sample_curve(self.perimeter_curve(), self.get_wall_web(), web)
    }
}

impl GrainSegment for FmmSegment2D {
    fn geometry(&self) -> &SegmentGeometry {
        &self.geometry
    }

    fn get_web_thickness(&self) -> f64 {
        let wall_web = self.get_wall_web();
        match self.geometry.axial_web_limit() {
            Some(axial) => wall_web.min(axial),
            None => wall_web,
        }
    }

    fn get_burn_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        self.get_perimeter(web) * self.geometry.regressed_length(web)
            + self.geometry.burning_ends() * self.get_face_area(web)
    }

    fn get_port_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        self.get_core_area(web)
    }

    fn get_volume(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        self.get_face_area(web) * self.geometry.regressed_length(web)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grain_system::bates::BatesSegment;
    use crate::grain_system::regression::{PROPELLANT, VOID};
    use approx::assert_relative_eq;

    fn geometry() -> SegmentGeometry {
        SegmentGeometry::new(0.041, 0.068, 0.0, 0).unwrap()
    }

    fn tube(map_dim: usize) -> FmmSegment2D {
        let shape = CoreShape::Tube {
            core_diameter: 0.015,
        };
        FmmSegment2D::new(geometry(), shape, map_dim).unwrap()
    }

    #[test]
    fn test_tube_converges_to_bates() {
        let fmm = tube(200);
        let bates = BatesSegment::new(geometry(), 0.015).unwrap();

        assert_relative_eq!(
            fmm.get_web_thickness(),
            bates.get_web_thickness(),
            max_relative = 0.05
        );

        // The last part of the web is under-resolved near the casing.
        for i in 0..=7 {
            let web = bates.get_web_thickness() * i as f64 / 10.0;
            let fmm_area = fmm.get_burn_area(web);
            let bates_area = bates.get_burn_area(web);
            println!("web {:.4} m: fmm {:.6e} m², bates {:.6e} m²", web, fmm_area, bates_area);
            assert_relative_eq!(fmm_area, bates_area, max_relative = 0.1);
            assert_relative_eq!(
                fmm.get_volume(web),
                bates.get_volume(web),
                max_relative = 0.1
            );
        }
    }

    #[test]
    fn test_perimeter_matches_face_area_loss() {
        // Face area lost over a small web increment equals perimeter × increment.
        let fmm = tube(200);
        let delta = 0.0005;
        for web in [0.002, 0.005, 0.008] {
            let lost = fmm.get_face_area(web) - fmm.get_face_area(web + delta);
            let perimeter = fmm.get_core_perimeter(web + 0.5 * delta);
            assert_relative_eq!(lost / delta, perimeter, max_relative = 0.1);
        }
    }

    #[test]
    fn test_volume_non_increasing_and_zero_past_web() {
        let segment = FmmSegment2D::new(
            geometry(),
            CoreShape::Star {
                point_count: 5,
                point_length: 0.012,
                point_width: 0.006,
            },
            100,
        )
        .unwrap();
        let web_thickness = segment.get_web_thickness();
        let mut previous = f64::INFINITY;
        for i in 0..=50 {
            let volume = segment.get_volume(web_thickness * i as f64 / 50.0);
            assert!(volume <= previous, "volume rose at sample {i}");
            previous = volume;
        }
        assert_eq!(segment.get_volume(web_thickness * 1.01), 0.0);
        assert_eq!(segment.get_burn_area(web_thickness * 1.01), 0.0);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let segment = tube(100);
        let first = segment.get_burn_area(0.004);
        let second = segment.get_burn_area(0.004);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_inhibited_ends_keep_length() {
        let inhibited = FmmSegment2D::new(
            SegmentGeometry::new(0.041, 0.068, 0.0, 2).unwrap(),
            CoreShape::Tube {
                core_diameter: 0.015,
            },
            100,
        )
        .unwrap();
        assert_eq!(inhibited.get_length(0.005), 0.068);
        // Without burning ends there is no face contribution.
        let area = inhibited.get_burn_area(0.005);
        assert_relative_eq!(
            area,
            inhibited.get_perimeter(0.005) * 0.068,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_d_grain_half_void() {
        let shape = CoreShape::DGrain { slot_offset: 0.0 };
        let segment = FmmSegment2D::new(geometry(), shape, 100).unwrap();
        let face = segment.get_face_area(0.0);
        assert_relative_eq!(face, 0.5 * circle_area(0.041), max_relative = 0.03);
        assert_relative_eq!(segment.get_wall_web(), 0.0205, max_relative = 0.05);
    }

    #[test]
    fn test_shape_masks() {
        let g = geometry();
        let wagon = CoreShape::WagonWheel {
            core_diameter: 0.01,
            port_count: 4,
            port_inner_diameter: 0.014,
            port_outer_diameter: 0.03,
            port_angular_width: 30.0,
        };
        // Port centred on the +x axis, none at 45°.
        assert!(wagon.is_port(g.normalize(0.011), 0.0, &g));
        let r = g.normalize(0.011);
        assert!(!wagon.is_port(r * 0.707, r * 0.707, &g));
        assert!(wagon.is_port(0.0, 0.0, &g));

        let ring = CoreShape::RodAndTube {
            rod_outer_diameter: 0.01,
            tube_inner_diameter: 0.02,
        };
        assert!(!ring.is_port(0.0, 0.0, &g));
        assert!(ring.is_port(g.normalize(0.0075), 0.0, &g));

        let multi = CoreShape::MultiPort {
            port_diameter: 0.004,
            radial_count: 6,
            level_count: 2,
        };
        assert!(multi.is_port(0.0, 0.0, &g));
        assert!(multi.is_port(0.5, 0.0, &g));
        assert!(!multi.is_port(0.25, 0.0, &g));
    }

    #[test]
    fn test_face_map_contents() {
        let segment = tube(100);
        let map = segment.face_map();
        assert!(map.count(VOID) > 0);
        assert!(map.count(PROPELLANT) > map.count(VOID));
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        let shapes = [
            CoreShape::Star {
                point_count: 12,
                point_length: 0.01,
                point_width: 0.005,
            },
            CoreShape::Star {
                point_count: 5,
                point_length: 0.03,
                point_width: 0.005,
            },
            CoreShape::WagonWheel {
                core_diameter: 0.01,
                port_count: 3,
                port_inner_diameter: 0.014,
                port_outer_diameter: 0.03,
                port_angular_width: 30.0,
            },
            CoreShape::WagonWheel {
                core_diameter: 0.01,
                port_count: 4,
                port_inner_diameter: 0.014,
                port_outer_diameter: 0.03,
                port_angular_width: 95.0,
            },
            CoreShape::RodAndTube {
                rod_outer_diameter: 0.02,
                tube_inner_diameter: 0.01,
            },
            CoreShape::DGrain {
                slot_offset: 0.0205,
            },
            CoreShape::MultiPort {
                port_diameter: 0.011,
                radial_count: 4,
                level_count: 2,
            },
        ];
        for shape in shapes {
            let result = FmmSegment2D::new(geometry(), shape.clone(), 100);
            assert!(
                matches!(result, Err(SimulationError::GeometryError(_))),
                "{} should be rejected: {:?}",
                shape.name(),
                shape
            );
        }
    }

    #[test]
    fn test_coarse_grid_rejected() {
        let shape = CoreShape::Tube {
            core_diameter: 0.015,
        };
        let result = FmmSegment2D::new(geometry(), shape, 40);
        assert!(result.is_err());
    }

    #[test]
    fn test_sample_curve_interpolates() {
        let curve = [0.0, 10.0, 20.0];
        assert_relative_eq!(sample_curve(&curve, 2.0, 0.5), 5.0);
        assert_relative_eq!(sample_curve(&curve, 2.0, 2.0), 20.0);
        assert_relative_eq!(sample_curve(&curve, 2.0, 5.0), 20.0);
    }
}
