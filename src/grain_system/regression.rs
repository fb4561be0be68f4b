use crate::errors::SimulationError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};

// Face map cell states
pub const OUTSIDE: i8 = -1; // casing, inhibitor or anything that never burns
pub const VOID: i8 = 0; // port, where the flame front starts
pub const PROPELLANT: i8 = 1;

/// Dimensions of a regression grid. Planar grids have a depth of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub depth: usize,
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub fn planar(map_dim: usize) -> Self {
        Self {
            depth: 1,
            rows: map_dim,
            cols: map_dim,
        }
    }

    pub fn volumetric(depth: usize, map_dim: usize) -> Self {
        Self {
            depth,
            rows: map_dim,
            cols: map_dim,
        }
    }

    pub fn len(&self) -> usize {
        self.depth * self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn index(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.rows + y) * self.cols + x
    }

    /// Cell pitch in the normalized frame, where the outer radius is 1.
    pub fn cell_pitch(&self) -> f64 {
        2.0 / self.cols as f64
    }

    /// Normalized coordinate of the centre of cell `i` along a cross-section axis.
    pub fn coordinate(&self, i: usize) -> f64 {
        -1.0 + (i as f64 + 0.5) * self.cell_pitch()
    }
}

/// Cell-by-cell classification of a grain cross-section or volume.
#[derive(Debug, Clone)]
pub struct FaceMap {
    shape: GridShape,
    cells: Vec<i8>,
}

impl FaceMap {
    /// Builds a planar map on `[-1, 1]²`. Cells outside the unit circle are
    /// `OUTSIDE`; `is_void(x, y)` marks the port.
    pub fn planar<F>(map_dim: usize, is_void: F) -> Self
    where
        F: Fn(f64, f64) -> bool,
    {
        let shape = GridShape::planar(map_dim);
        let mut cells = Vec::with_capacity(shape.len());
        for row in 0..shape.rows {
            let y = shape.coordinate(row);
            for col in 0..shape.cols {
                let x = shape.coordinate(col);
                cells.push(if x * x + y * y > 1.0 {
                    OUTSIDE
                } else if is_void(x, y) {
                    VOID
                } else {
                    PROPELLANT
                });
            }
        }
        Self { shape, cells }
    }

    /// Builds a volumetric map of `slices` propellant slices, padded with one
    /// slice at each end. A padding slice is void when that end burns and
    /// `OUTSIDE` when it is inhibited; the forward end is inhibited first.
    /// `is_void(slice, row, col)` indexes the propellant slices only.
    pub fn volumetric<F>(map_dim: usize, slices: usize, inhibited_ends: u8, is_void: F) -> Self
    where
        F: Fn(usize, usize, usize) -> bool,
    {
        let shape = GridShape::volumetric(slices + 2, map_dim);
        let mut cells = Vec::with_capacity(shape.len());
        for z in 0..shape.depth {
            let padding = if z == 0 {
                Some(inhibited_ends >= 1)
            } else if z == shape.depth - 1 {
                Some(inhibited_ends >= 2)
            } else {
                None
            };
            for row in 0..shape.rows {
                let y = shape.coordinate(row);
                for col in 0..shape.cols {
                    let x = shape.coordinate(col);
                    cells.push(if x * x + y * y > 1.0 {
                        OUTSIDE
                    } else {
                        match padding {
                            Some(true) => OUTSIDE,
                            Some(false) => VOID,
                            None if is_void(z - 1, row, col) => VOID,
                            None => PROPELLANT,
                        }
                    });
                }
            }
        }
        Self { shape, cells }
    }

    pub fn from_cells(shape: GridShape, cells: Vec<i8>) -> Result<Self, SimulationError> {
        if cells.len() != shape.len() {
            return Err(SimulationError::GeometryError(format!(
                "face map holds {} cells but its shape needs {}",
                cells.len(),
                shape.len()
            )));
        }
        Ok(Self { shape, cells })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    pub fn slice(&self, z: usize) -> &[i8] {
        let start = z * self.shape.slice_len();
        &self.cells[start..start + self.shape.slice_len()]
    }

    pub fn count(&self, state: i8) -> usize {
        self.cells.iter().filter(|&&cell| cell == state).count()
    }

    /// Fails unless the map has both a port and some propellant.
    pub fn check_burnable(&self) -> Result<(), SimulationError> {
        if self.count(VOID) == 0 {
            return Err(SimulationError::GeometryError(
                "face map has no port for the flame front to start from".to_string(),
            ));
        }
        if self.count(PROPELLANT) == 0 {
            return Err(SimulationError::GeometryError(
                "face map holds no propellant".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarchState {
    Far,
    Trial,
    Known,
}

#[derive(Debug, PartialEq)]
struct Trial {
    distance: f64,
    index: usize,
}

impl Eq for Trial {}

impl Ord for Trial {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so the smallest distance must compare greatest.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Trial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distance of every propellant cell from the port, in normalized units.
///
/// Cells that never burn hold `NaN`, so any `value > level` test is false
/// for them.
#[derive(Debug, Clone)]
pub struct RegressionField {
    shape: GridShape,
    values: Vec<f64>,
    sorted: Vec<f64>,
    max_distance: f64,
}

impl RegressionField {
    pub fn compute(face_map: &FaceMap) -> Result<Self, SimulationError> {
        face_map.check_burnable()?;
        Ok(Self::march(face_map))
    }

    /// Marches a map already known to be burnable.
    pub(crate) fn march(face_map: &FaceMap) -> Self {
        let shape = face_map.shape();
        let mut values = fast_march(shape, face_map.cells());

        let mut unreachable = 0usize;
        for (value, &cell) in values.iter_mut().zip(face_map.cells()) {
            match cell {
                OUTSIDE => *value = f64::NAN,
                PROPELLANT if !value.is_finite() => {
                    *value = f64::NAN;
                    unreachable += 1;
                }
                _ => {}
            }
        }
        if unreachable > 0 {
            warn!(
                cells = unreachable,
                "propellant cells are cut off from the port and will never burn"
            );
        }

        let mut sorted: Vec<f64> = values
            .iter()
            .zip(face_map.cells())
            .filter(|(value, &cell)| cell == PROPELLANT && value.is_finite())
            .map(|(value, _)| *value)
            .collect();
        sorted.sort_by(f64::total_cmp);
        let max_distance = sorted.last().copied().unwrap_or(0.0);

        debug!(
            depth = shape.depth,
            map_dim = shape.cols,
            propellant_cells = sorted.len(),
            max_distance,
            "regression field computed"
        );

        Self {
            shape,
            values,
            sorted,
            max_distance,
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Largest regression distance, i.e. the normalized wall web.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn value(&self, z: usize, y: usize, x: usize) -> f64 {
        self.values[self.shape.index(z, y, x)]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn slice(&self, z: usize) -> &[f64] {
        let start = z * self.shape.slice_len();
        &self.values[start..start + self.shape.slice_len()]
    }

    pub fn propellant_cells(&self) -> usize {
        self.sorted.len()
    }

    /// Number of cells not yet reached by a front at `level`.
    pub fn unburned_cells(&self, level: f64) -> usize {
        self.sorted.len() - self.sorted.partition_point(|&value| value <= level)
    }

    pub fn unburned_cells_in_slice(&self, z: usize, level: f64) -> usize {
        self.slice(z).iter().filter(|&&value| value > level).count()
    }
}

/// First-order fast marching solution of `|∇T| = 1` seeded from every void cell.
fn fast_march(shape: GridShape, cells: &[i8]) -> Vec<f64> {
    let pitch = shape.cell_pitch();
    let mut distance = vec![f64::INFINITY; shape.len()];
    let mut state = vec![MarchState::Far; shape.len()];
    let mut heap = BinaryHeap::new();

    for (index, &cell) in cells.iter().enumerate() {
        if cell == VOID {
            distance[index] = 0.0;
            state[index] = MarchState::Known;
        }
    }

    let mut neighbors = Vec::with_capacity(6);
    for index in 0..shape.len() {
        if state[index] != MarchState::Known {
            continue;
        }
        collect_neighbors(shape, index, &mut neighbors);
        for &neighbor in &neighbors {
            if cells[neighbor] == PROPELLANT && state[neighbor] == MarchState::Far {
                let tentative = solve_eikonal(shape, &distance, &state, neighbor, pitch);
                distance[neighbor] = tentative;
                state[neighbor] = MarchState::Trial;
                heap.push(Trial {
                    distance: tentative,
                    index: neighbor,
                });
            }
        }
    }

    while let Some(Trial { distance: d, index }) = heap.pop() {
        if state[index] == MarchState::Known || d > distance[index] {
            continue;
        }
        state[index] = MarchState::Known;

        collect_neighbors(shape, index, &mut neighbors);
        for &neighbor in &neighbors {
            if cells[neighbor] != PROPELLANT || state[neighbor] == MarchState::Known {
                continue;
            }
            let tentative = solve_eikonal(shape, &distance, &state, neighbor, pitch);
            if tentative < distance[neighbor] {
                distance[neighbor] = tentative;
                state[neighbor] = MarchState::Trial;
                heap.push(Trial {
                    distance: tentative,
                    index: neighbor,
                });
            }
        }
    }

    distance
}

fn collect_neighbors(shape: GridShape, index: usize, out: &mut Vec<usize>) {
    out.clear();
    let x = index % shape.cols;
    let y = (index / shape.cols) % shape.rows;
    let z = index / shape.slice_len();

    if x > 0 {
        out.push(index - 1);
    }
    if x + 1 < shape.cols {
        out.push(index + 1);
    }
    if y > 0 {
        out.push(index - shape.cols);
    }
    if y + 1 < shape.rows {
        out.push(index + shape.cols);
    }
    if z > 0 {
        out.push(index - shape.slice_len());
    }
    if z + 1 < shape.depth {
        out.push(index + shape.slice_len());
    }
}

/// Upwind update of one cell from its known neighbours along each axis.
fn solve_eikonal(
    shape: GridShape,
    distance: &[f64],
    state: &[MarchState],
    index: usize,
    pitch: f64,
) -> f64 {
    let x = index % shape.cols;
    let y = (index / shape.cols) % shape.rows;
    let z = index / shape.slice_len();

    let known = |i: usize| {
        if state[i] == MarchState::Known {
            distance[i]
        } else {
            f64::INFINITY
        }
    };
    let axis_min = |has_low: bool, has_high: bool, stride: usize| {
        let low = if has_low { known(index - stride) } else { f64::INFINITY };
        let high = if has_high { known(index + stride) } else { f64::INFINITY };
        low.min(high)
    };

    let mut upwind = [
        axis_min(x > 0, x + 1 < shape.cols, 1),
        axis_min(y > 0, y + 1 < shape.rows, shape.cols),
        axis_min(z > 0, z + 1 < shape.depth, shape.slice_len()),
    ];
    upwind.sort_by(f64::total_cmp);

    let mut result = upwind[0] + pitch;
    for used in 2..=3 {
        let next = upwind[used - 1];
        if !next.is_finite() || result <= next {
            break;
        }
        let terms = &upwind[..used];
        let sum: f64 = terms.iter().sum();
        let sum_sq: f64 = terms.iter().map(|v| v * v).sum();
        let n = used as f64;
        let discriminant = sum * sum - n * (sum_sq - pitch * pitch);
        if discriminant < 0.0 {
            break;
        }
        result = (sum + discriminant.sqrt()) / n;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_planar_front_is_exact() {
        // Port on the left half of a square slab: distance is linear in x.
        let shape = GridShape::planar(40);
        let cells: Vec<i8> = (0..shape.len())
            .map(|i| if i % shape.cols < 20 { VOID } else { PROPELLANT })
            .collect();
        let field = RegressionField::compute(&FaceMap::from_cells(shape, cells).unwrap()).unwrap();

        let pitch = shape.cell_pitch();
        for x in 20..40 {
            let expected = (x - 19) as f64 * pitch;
            assert_abs_diff_eq!(field.value(0, 7, x), expected, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(field.max_distance(), 20.0 * pitch, epsilon = 1e-12);
    }

    #[test]
    fn test_diagonal_front_advances_at_unit_speed() {
        // Away from the grid edges a diagonal front advances by pitch·√2 every
        // two cells, up to the first-order error of the scheme.
        let shape = GridShape::planar(30);
        let cells: Vec<i8> = (0..shape.len())
            .map(|i| {
                let (x, y) = (i % shape.cols, i / shape.cols);
                if x + y < 10 { VOID } else { PROPELLANT }
            })
            .collect();
        let field = RegressionField::compute(&FaceMap::from_cells(shape, cells).unwrap()).unwrap();
        let a = field.value(0, 15, 15);
        let b = field.value(0, 16, 16);
        assert_relative_eq!(
            b - a,
            2.0f64.sqrt() * shape.cell_pitch(),
            max_relative = 0.01
        );
    }

    #[test]
    fn test_circular_port_distances() {
        let map = FaceMap::planar(120, |x, y| x * x + y * y < 0.3 * 0.3);
        let field = RegressionField::compute(&map).unwrap();

        // Wall web of a centred circular port is the annulus thickness.
        assert_abs_diff_eq!(field.max_distance(), 0.7, epsilon = 0.04);

        let shape = field.shape();
        for row in (0..shape.rows).step_by(7) {
            for col in (0..shape.cols).step_by(7) {
                let value = field.value(0, row, col);
                if value.is_nan() || value == 0.0 {
                    continue;
                }
                let (x, y) = (shape.coordinate(col), shape.coordinate(row));
                let exact = (x * x + y * y).sqrt() - 0.3;
                assert!(
                    (value - exact).abs() < 0.04,
                    "distance at ({x:.3}, {y:.3}) was {value}, expected {exact}"
                );
            }
        }
    }

    #[test]
    fn test_outside_never_burns() {
        let map = FaceMap::planar(50, |x, _| x > 0.5);
        let field = RegressionField::compute(&map).unwrap();
        assert!(field.value(0, 0, 0).is_nan());
        assert_eq!(field.unburned_cells(f64::MAX), 0);
        assert_eq!(field.unburned_cells(-1.0), map.count(PROPELLANT));
    }

    #[test]
    fn test_isolated_pocket_is_excluded() {
        let shape = GridShape::planar(10);
        let mut cells = vec![PROPELLANT; shape.len()];
        for x in 0..10 {
            cells[shape.index(0, 5, x)] = OUTSIDE;
        }
        cells[shape.index(0, 0, 0)] = VOID;
        let field = RegressionField::compute(&FaceMap::from_cells(shape, cells).unwrap()).unwrap();
        assert_eq!(field.propellant_cells(), 49);
        assert!(field.value(0, 8, 8).is_nan());
    }

    #[test]
    fn test_missing_port_is_rejected() {
        let map = FaceMap::planar(30, |_, _| false);
        assert!(matches!(
            RegressionField::compute(&map),
            Err(SimulationError::GeometryError(_))
        ));
    }

    #[test]
    fn test_volumetric_padding_follows_inhibited_ends() {
        let open = FaceMap::volumetric(20, 10, 0, |_, _, _| false);
        let inhibited = FaceMap::volumetric(20, 10, 2, |_, _, _| false);
        let shape = open.shape();
        let centre = shape.index(0, 10, 10);
        let aft = shape.index(shape.depth - 1, 10, 10);

        assert_eq!(shape.depth, 12);
        assert_eq!(open.cells()[centre], VOID);
        assert_eq!(open.cells()[aft], VOID);
        assert_eq!(inhibited.cells()[centre], OUTSIDE);
        assert_eq!(inhibited.cells()[aft], OUTSIDE);
    }
}
