/// A straight piece of an iso-line, in cell-index coordinates `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourSegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl ContourSegment {
    pub fn length(&self) -> f64 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self) -> (f64, f64) {
        (
            0.5 * (self.start.0 + self.end.0),
            0.5 * (self.start.1 + self.end.1),
        )
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Marching squares over one `rows × cols` slice.
///
/// A cell counts as inside when its value is strictly above `level`. `NaN`
/// cells are read as `fill`, which callers set above every level of interest
/// so that non-burning cells behave like unburned propellant.
pub fn marching_squares(
    values: &[f64],
    rows: usize,
    cols: usize,
    level: f64,
    fill: f64,
) -> Vec<ContourSegment> {
    let read = |y: usize, x: usize| {
        let value = values[y * cols + x];
        if value.is_nan() {
            fill
        } else {
            value
        }
    };

    let mut segments = Vec::new();
    for y in 0..rows.saturating_sub(1) {
        for x in 0..cols.saturating_sub(1) {
            let corners = [read(y, x), read(y, x + 1), read(y + 1, x + 1), read(y + 1, x)];
            let inside = corners.map(|value| value > level);
            let case = (inside[0] as u8) << 3
                | (inside[1] as u8) << 2
                | (inside[2] as u8) << 1
                | inside[3] as u8;
            if case == 0 || case == 15 {
                continue;
            }

            let point = |edge: Edge| -> (f64, f64) {
                let (a, b, from, to) = match edge {
                    Edge::Top => (corners[0], corners[1], (0.0, 0.0), (1.0, 0.0)),
                    Edge::Right => (corners[1], corners[2], (1.0, 0.0), (1.0, 1.0)),
                    Edge::Bottom => (corners[3], corners[2], (0.0, 1.0), (1.0, 1.0)),
                    Edge::Left => (corners[0], corners[3], (0.0, 0.0), (0.0, 1.0)),
                };
                let t = ((level - a) / (b - a)).clamp(0.0, 1.0);
                (
                    x as f64 + from.0 + t * (to.0 - from.0),
                    y as f64 + from.1 + t * (to.1 - from.1),
                )
            };
            let mut push = |a: Edge, b: Edge| {
                segments.push(ContourSegment {
                    start: point(a),
                    end: point(b),
                })
            };

            let centre_inside = corners.iter().sum::<f64>() / 4.0 > level;
            match case {
                // Saddles: the centre value decides which diagonal is connected.
                0b1010 if centre_inside => {
                    push(Edge::Top, Edge::Right);
                    push(Edge::Bottom, Edge::Left);
                }
                0b1010 => {
                    push(Edge::Left, Edge::Top);
                    push(Edge::Right, Edge::Bottom);
                }
                0b0101 if centre_inside => {
                    push(Edge::Left, Edge::Top);
                    push(Edge::Right, Edge::Bottom);
                }
                0b0101 => {
                    push(Edge::Top, Edge::Right);
                    push(Edge::Bottom, Edge::Left);
                }
                _ => {
                    let crossings: Vec<Edge> = [
                        (Edge::Top, inside[0] != inside[1]),
                        (Edge::Right, inside[1] != inside[2]),
                        (Edge::Bottom, inside[3] != inside[2]),
                        (Edge::Left, inside[0] != inside[3]),
                    ]
                    .into_iter()
                    .filter_map(|(edge, crosses)| crosses.then_some(edge))
                    .collect();
                    if let [a, b] = crossings[..] {
                        push(a, b);
                    }
                }
            }
        }
    }
    segments
}

/// Total length, in cells, of the segments whose midpoints lie at least
/// `tolerance` cells inside the circle inscribed in the slice.
pub fn interior_length(
    segments: &[ContourSegment],
    rows: usize,
    cols: usize,
    tolerance: f64,
) -> f64 {
    let centre = (0.5 * (cols as f64 - 1.0), 0.5 * (rows as f64 - 1.0));
    let limit = 0.5 * cols as f64 - tolerance;
    segments
        .iter()
        .filter(|segment| {
            let (x, y) = segment.midpoint();
            let (dx, dy) = (x - centre.0, y - centre.1);
            (dx * dx + dy * dy).sqrt() < limit
        })
        .map(ContourSegment::length)
        .sum()
}

/// Length, in cells, of the `level` iso-line of a slice, excluding the parts
/// that run along the casing.
pub fn contour_length(values: &[f64], rows: usize, cols: usize, level: f64, tolerance: f64) -> f64 {
    let fill = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(level, f64::max)
        + 1.0;
    let segments = marching_squares(values, rows, cols, level, fill);
    interior_length(&segments, rows, cols, tolerance)
}
