use super::contour::contour_length;
use super::regression::{FaceMap, GridShape, RegressionField, VOID};
use super::segment::{circle_area, GrainSegment, SegmentGeometry};
use super::shapes::sample_curve;
use crate::constants::{
    CONTOUR_EDGE_TOLERANCE, DEFAULT_MAP_DIM_3D, MIN_MAP_DIM_3D, REGRESSION_CURVE_SAMPLES,
};
use crate::errors::SimulationError;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Segment regressed on a volumetric grid, for ports that vary along the axis.
///
/// Slice 0 is the forward end. Burn area is built from slice perimeters
/// integrated along the axis, combined with the change in face area between
/// neighbouring slices so that end faces and tapers are counted.
#[derive(Debug)]
pub struct FmmSegment3D {
    geometry: SegmentGeometry,
    face_map: FaceMap,
    field: OnceLock<RegressionField>,
    burn_area_curve: OnceLock<Vec<f64>>,
}

/// Number of propellant slices that keeps the axial pitch close to the radial one.
pub fn slice_count(geometry: &SegmentGeometry, map_dim: usize) -> usize {
    ((map_dim as f64 * geometry.length / geometry.outer_diameter).round() as usize).max(2)
}

impl FmmSegment3D {
    /// Conical core tapering linearly from `upper_core_diameter` at the
    /// forward end to `lower_core_diameter` at the aft end.
    pub fn conical(
        geometry: SegmentGeometry,
        upper_core_diameter: f64,
        lower_core_diameter: f64,
        map_dim: usize,
    ) -> Result<Self, SimulationError> {
        for (name, diameter) in [("upper", upper_core_diameter), ("lower", lower_core_diameter)] {
            if !(diameter > 0.0 && diameter < geometry.outer_diameter) {
                return Err(SimulationError::GeometryError(format!(
                    "{name} core diameter {diameter} m must lie in (0, {}) m",
                    geometry.outer_diameter
                )));
            }
        }
        Self::check_map_dim(map_dim)?;

        let slices = slice_count(&geometry, map_dim);
        let grid = GridShape::volumetric(slices, map_dim);
        let upper = geometry.normalize(upper_core_diameter);
        let lower = geometry.normalize(lower_core_diameter);
        let is_void = |slice: usize, row: usize, col: usize| {
            let s = (slice as f64 + 0.5) / slices as f64;
            let core_radius = 0.5 * (upper + s * (lower - upper));
            let (x, y) = (grid.coordinate(col), grid.coordinate(row));
            (x * x + y * y).sqrt() < core_radius
        };
        let face_map = FaceMap::volumetric(map_dim, slices, geometry.inhibited_ends, is_void);
        Self::from_face_map(geometry, face_map)
    }

    /// Segment from a voxelized boundary. `propellant` is indexed
    /// `[slice][row][col]` in row-major order and is `true` where propellant
    /// exists; cells outside the casing are ignored.
    pub fn from_voxels(
        geometry: SegmentGeometry,
        map_dim: usize,
        slices: usize,
        propellant: &[bool],
    ) -> Result<Self, SimulationError> {
        Self::check_map_dim(map_dim)?;
        let grid = GridShape::volumetric(slices, map_dim);
        if slices == 0 || propellant.len() != grid.len() {
            return Err(SimulationError::GeometryError(format!(
                "voxel grid holds {} cells but {slices} slices of {map_dim}² need {}",
                propellant.len(),
                grid.len()
            )));
        }
        let is_void =
            |slice: usize, row: usize, col: usize| !propellant[grid.index(slice, row, col)];
        let face_map = FaceMap::volumetric(map_dim, slices, geometry.inhibited_ends, is_void);
        Self::from_face_map(geometry, face_map)
    }

    fn check_map_dim(map_dim: usize) -> Result<(), SimulationError> {
        if map_dim < MIN_MAP_DIM_3D {
            return Err(SimulationError::GeometryError(format!(
                "volumetric grid needs at least {MIN_MAP_DIM_3D} cells per side, got {map_dim}"
            )));
        }
        if map_dim < DEFAULT_MAP_DIM_3D {
            warn!(map_dim, default = DEFAULT_MAP_DIM_3D, "coarse volumetric regression grid");
        }
        Ok(())
    }

    fn from_face_map(
        geometry: SegmentGeometry,
        face_map: FaceMap,
    ) -> Result<Self, SimulationError> {
        face_map.check_burnable()?;
        Ok(Self {
            geometry,
            face_map,
            field: OnceLock::new(),
            burn_area_curve: OnceLock::new(),
        })
    }

    pub fn map_dim(&self) -> usize {
        self.face_map.shape().cols
    }

    /// Propellant slices, excluding the end padding.
    pub fn slices(&self) -> usize {
        self.face_map.shape().depth - 2
    }

    pub fn face_map(&self) -> &FaceMap {
        &self.face_map
    }

    pub fn regression_field(&self) -> &RegressionField {
        self.field.get_or_init(|| {
            debug!(map_dim = self.map_dim(), slices = self.slices(), "regressing volume");
            RegressionField::march(&self.face_map)
        })
    }

    fn cell_area(&self) -> f64 {
        (self.geometry.outer_diameter / self.map_dim() as f64).powi(2)
    }

    fn slice_thickness(&self) -> f64 {
        self.geometry.length / self.slices() as f64
    }

    /// Unburned area of every grid layer, padding included.
    fn layer_face_areas(&self, level: f64) -> Vec<f64> {
        let field = self.regression_field();
        (0..field.shape().depth)
            .map(|z| {
                field.unburned_cells_in_slice(z, level) as f64 * self.cell_area()
            })
            .collect()
    }

    fn layer_perimeters(&self, level: f64) -> Vec<f64> {
        let field = self.regression_field();
        let dim = self.map_dim();
        (0..field.shape().depth)
            .map(|z| {
                let cells = contour_length(field.slice(z), dim, dim, level, CONTOUR_EDGE_TOLERANCE);
                self.geometry.outer_diameter * cells / dim as f64
            })
            .collect()
    }

    /// Whether the padding layer `z` is open to the flame.
    fn end_burns(&self, z: usize) -> bool {
        self.face_map.slice(z).contains(&VOID)
    }

    /// Burn area computed directly from the field.
    ///
    /// Between propellant slices the lateral band and the change in face area
    /// form one tilted surface. Next to a padding layer the end face is a
    /// separate surface and only counts when that end is not inhibited.
    pub fn get_exact_burn_area(&self, web: f64) -> f64 {
        let level = self.geometry.normalize(web);
        let areas = self.layer_face_areas(level);
        let perimeters = self.layer_perimeters(level);
        let dz = self.slice_thickness();
        let last = areas.len() - 1;
        (0..last)
            .map(|z| {
                let lateral = 0.5 * (perimeters[z] + perimeters[z + 1]) * dz;
                let axial = areas[z] - areas[z + 1];
                if z == 0 || z + 1 == last {
                    let end = if z == 0 { 0 } else { last };
                    if self.end_burns(end) {
                        lateral + axial.abs()
                    } else {
                        lateral
                    }
                } else {
                    (lateral * lateral + axial * axial).sqrt()
                }
            })
            .sum()
    }

    fn burn_area_curve(&self) -> &[f64] {
        self.burn_area_curve.get_or_init(|| {
            let web_thickness = self.get_web_thickness();
            let step = web_thickness / REGRESSION_CURVE_SAMPLES as f64;
            (0..=REGRESSION_CURVE_SAMPLES)
                .map(|i| self.get_exact_burn_area(step * i as f64))
                .collect()
        })
    }

    /// Port area of every propellant slice, forward end first.
    pub fn get_port_area_profile(&self, web: f64) -> Vec<f64> {
        let level = self.geometry.normalize(web);
        let casing = circle_area(self.geometry.outer_diameter);
        let areas = self.layer_face_areas(level);
        areas[1..areas.len() - 1]
            .iter()
            .map(|area| (casing - area).max(0.0))
            .collect()
    }

    /// Axial position of the unburned propellant's centroid, measured from the
    /// forward end.
    pub fn center_of_gravity(&self, web: f64) -> Result<f64, SimulationError> {
        if self.is_consumed(web) {
            return Err(SimulationError::GeometryError(format!(
                "no propellant left at web {web} m, web thickness is {} m",
                self.get_web_thickness()
            )));
        }
        let level = self.geometry.normalize(web);
        let field = self.regression_field();
        let (mut moment, mut cells) = (0.0, 0usize);
        for slice in 0..self.slices() {
            let count = field.unburned_cells_in_slice(slice + 1, level);
            moment += count as f64 * (slice as f64 + 0.5);
            cells += count;
        }
        if cells == 0 {
            return Err(SimulationError::GeometryError(format!(
                "no propellant left at web {web} m"
            )));
        }
        Ok(moment / cells as f64 * self.slice_thickness())
    }
}

impl GrainSegment for FmmSegment3D {
    fn geometry(&self) -> &SegmentGeometry {
        &self.geometry
    }

    fn get_web_thickness(&self) -> f64 {
        self.geometry.denormalize(self.regression_field().max_distance())
    }

    fn get_burn_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        sample_curve(self.burn_area_curve(), self.get_web_thickness(), web)
    }

    /// Port area at the aft slice, where the segment's flow leaves its core.
    fn get_port_area(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        self.get_port_area_profile(web).last().copied().unwrap_or(0.0)
    }

    fn get_volume(&self, web: f64) -> f64 {
        if self.is_consumed(web) {
            return 0.0;
        }
        let level = self.geometry.normalize(web);
        let cells = self.regression_field().unburned_cells(level);
        cells as f64 * self.cell_area() * self.slice_thickness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grain_system::bates::BatesSegment;
    use approx::assert_relative_eq;

    fn geometry(inhibited_ends: u8) -> SegmentGeometry {
        SegmentGeometry::new(0.04, 0.048, 0.0, inhibited_ends).unwrap()
    }

    #[test]
    fn test_straight_core_matches_bates() {
        let solid = FmmSegment3D::conical(geometry(0), 0.014, 0.014, 50).unwrap();
        let bates = BatesSegment::new(geometry(0), 0.014).unwrap();

        assert_eq!(solid.slices(), 60);
        assert_relative_eq!(
            solid.get_web_thickness(),
            bates.get_web_thickness(),
            max_relative = 0.08
        );
        for i in 0..=6 {
            let web = bates.get_web_thickness() * i as f64 / 10.0;
            println!(
                "web {:.4}: volume {:.4e} vs {:.4e}, area {:.4e} vs {:.4e}",
                web,
                solid.get_volume(web),
                bates.get_volume(web),
                solid.get_exact_burn_area(web),
                bates.get_burn_area(web)
            );
            let area = solid.get_exact_burn_area(web);
            assert_relative_eq!(
                solid.get_volume(web),
                bates.get_volume(web),
                max_relative = 0.1
            );
            assert_relative_eq!(area, bates.get_burn_area(web), max_relative = 0.1);
        }
    }

    #[test]
    fn test_inhibited_ends_match_bates() {
        for inhibited_ends in [1, 2] {
            let solid = FmmSegment3D::conical(geometry(inhibited_ends), 0.014, 0.014, 50).unwrap();
            let bates = BatesSegment::new(geometry(inhibited_ends), 0.014).unwrap();
            for i in 0..=6 {
                let web = bates.get_web_thickness() * i as f64 / 10.0;
                let area = solid.get_exact_burn_area(web);
                println!(
                    "inhibited {}, web {:.4}: area {:.4e} vs {:.4e}",
                    inhibited_ends,
                    web,
                    area,
                    bates.get_burn_area(web)
                );
                assert_relative_eq!(area, bates.get_burn_area(web), max_relative = 0.1);
            }
        }

        // Inhibiting both ends removes both end faces.
        let open = FmmSegment3D::conical(geometry(0), 0.014, 0.014, 50).unwrap();
        let closed = FmmSegment3D::conical(geometry(2), 0.014, 0.014, 50).unwrap();
        let open_area = open.get_exact_burn_area(0.002);
        assert!(closed.get_exact_burn_area(0.002) < open_area * 0.7);
    }

    #[test]
    fn test_conical_port_profile_widens_aft() {
        let solid = FmmSegment3D::conical(geometry(2), 0.008, 0.02, 50).unwrap();
        let profile = solid.get_port_area_profile(0.0);
        assert_eq!(profile.len(), solid.slices());
        assert!(profile.first().unwrap() < profile.last().unwrap());
        assert_relative_eq!(solid.get_port_area(0.0), *profile.last().unwrap());
    }

    #[test]
    fn test_center_of_gravity() {
        let straight = FmmSegment3D::conical(geometry(0), 0.014, 0.014, 50).unwrap();
        assert_relative_eq!(
            straight.center_of_gravity(0.0).unwrap(),
            0.024,
            max_relative = 0.01
        );

        // More propellant remains forward of a core that opens aft.
        let tapered = FmmSegment3D::conical(geometry(2), 0.008, 0.02, 50).unwrap();
        assert!(tapered.center_of_gravity(0.0).unwrap() < 0.024);

        let past = straight.get_web_thickness() * 1.01;
        assert!(matches!(
            straight.center_of_gravity(past),
            Err(SimulationError::GeometryError(_))
        ));
    }

    #[test]
    fn test_volume_decreases_to_zero() {
        let solid = FmmSegment3D::conical(geometry(1), 0.01, 0.016, 50).unwrap();
        let web_thickness = solid.get_web_thickness();
        let mut previous = f64::INFINITY;
        for i in 0..=20 {
            let volume = solid.get_volume(web_thickness * i as f64 / 20.0);
            assert!(volume <= previous);
            previous = volume;
        }
        assert_eq!(solid.get_volume(web_thickness * 1.001), 0.0);
        assert_eq!(solid.get_burn_area(web_thickness * 1.001), 0.0);
    }

    #[test]
    fn test_voxel_segment_matches_conical() {
        let g = geometry(0);
        let map_dim = 50;
        let slices = slice_count(&g, map_dim);
        let grid = GridShape::volumetric(slices, map_dim);
        let mut voxels = vec![true; grid.len()];
        for slice in 0..slices {
            for row in 0..map_dim {
                for col in 0..map_dim {
                    let (x, y) = (grid.coordinate(col), grid.coordinate(row));
                    if (x * x + y * y).sqrt() < g.normalize(0.014) / 2.0 {
                        voxels[grid.index(slice, row, col)] = false;
                    }
                }
            }
        }
        let voxel = FmmSegment3D::from_voxels(g.clone(), map_dim, slices, &voxels).unwrap();
        let conical = FmmSegment3D::conical(g, 0.014, 0.014, map_dim).unwrap();
        assert_eq!(voxel.get_volume(0.002), conical.get_volume(0.002));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(FmmSegment3D::conical(geometry(0), 0.0, 0.01, 50).is_err());
        assert!(FmmSegment3D::conical(geometry(0), 0.01, 0.04, 50).is_err());
        assert!(FmmSegment3D::conical(geometry(0), 0.01, 0.01, 20).is_err());
        assert!(FmmSegment3D::from_voxels(geometry(0), 50, 3, &[true; 10]).is_err());
    }
}
