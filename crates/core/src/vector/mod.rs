//! Outlet polyline rasterization
//!
//! The delineation core consumes outlet lines as ordered grid-cell runs.
//! An external vector reader supplies the line coordinates as
//! `geo_types::LineString<f64>`; this module converts them to cell runs
//! using the raster's geotransform and Bresenham line traversal.

use geo_types::LineString;

use crate::raster::GeoTransform;

/// Rasterize a polyline onto a grid of the given shape.
///
/// Each vertex is mapped through `transform`, then consecutive vertices
/// are connected with integer Bresenham segments. The result is an
/// ordered run of distinct (row, col) cells following the line from its
/// first vertex to its last, clipped to the grid. Vertices falling
/// outside the grid contribute only the in-bounds portion of their
/// segments.
pub fn rasterize_polyline(
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
    line: &LineString<f64>,
) -> Vec<(usize, usize)> {
    let mut cells: Vec<(i64, i64)> = Vec::new();

    let points: Vec<(i64, i64)> = line
        .coords()
        .map(|c| {
            let (col, row) = transform.geo_to_pixel(c.x, c.y);
            (row.floor() as i64, col.floor() as i64)
        })
        .collect();

    match points.len() {
        0 => {}
        1 => cells.push(points[0]),
        _ => {
            for pair in points.windows(2) {
                append_segment(&mut cells, pair[0], pair[1]);
            }
        }
    }

    let mut run: Vec<(usize, usize)> = Vec::with_capacity(cells.len());
    for (r, c) in cells {
        if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            continue;
        }
        let cell = (r as usize, c as usize);
        if run.last() != Some(&cell) {
            run.push(cell);
        }
    }
    run
}

/// Integer Bresenham walk from `a` to `b` in (row, col) space, inclusive.
/// Appends to `out`, skipping a repeated start cell.
fn append_segment(out: &mut Vec<(i64, i64)>, a: (i64, i64), b: (i64, i64)) {
    let (mut r, mut c) = a;
    let (r1, c1) = b;

    let dr = (r1 - r).abs();
    let dc = (c1 - c).abs();
    let sr = if r < r1 { 1 } else { -1 };
    let sc = if c < c1 { 1 } else { -1 };
    let mut err = dc - dr;

    loop {
        if out.last() != Some(&(r, c)) {
            out.push((r, c));
        }
        if r == r1 && c == c1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dr {
            err -= dr;
            c += sc;
        }
        if e2 < dc {
            err += dc;
            r += sr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    fn unit_transform() -> GeoTransform {
        // Origin at top-left, 1x1 cells, y decreasing downward
        GeoTransform::new(0.0, 10.0, 1.0, -1.0)
    }

    #[test]
    fn test_single_segment_horizontal() {
        let line = line_string![(x: 0.5, y: 9.5), (x: 4.5, y: 9.5)];
        let run = rasterize_polyline(&unit_transform(), 10, 10, &line);
        assert_eq!(run, vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]);
    }

    #[test]
    fn test_diagonal_segment() {
        let line = line_string![(x: 0.5, y: 9.5), (x: 3.5, y: 6.5)];
        let run = rasterize_polyline(&unit_transform(), 10, 10, &line);
        assert_eq!(run.first(), Some(&(0, 0)));
        assert_eq!(run.last(), Some(&(3, 3)));
        // Each step moves at most one cell in each axis
        for pair in run.windows(2) {
            let (r0, c0) = pair[0];
            let (r1, c1) = pair[1];
            assert!(r1.abs_diff(r0) <= 1 && c1.abs_diff(c0) <= 1);
        }
    }

    #[test]
    fn test_multi_vertex_no_duplicate_at_joint() {
        let line = line_string![
            (x: 0.5, y: 9.5),
            (x: 2.5, y: 9.5),
            (x: 2.5, y: 7.5),
        ];
        let run = rasterize_polyline(&unit_transform(), 10, 10, &line);
        let joint_count = run.iter().filter(|&&cell| cell == (0, 2)).count();
        assert_eq!(joint_count, 1, "joint vertex must appear once");
        assert_eq!(run.last(), Some(&(2, 2)));
    }

    #[test]
    fn test_clipping_outside_grid() {
        let line = line_string![(x: -3.5, y: 9.5), (x: 2.5, y: 9.5)];
        let run = rasterize_polyline(&unit_transform(), 10, 10, &line);
        assert_eq!(run.first(), Some(&(0, 0)));
        assert_eq!(run.last(), Some(&(0, 2)));
    }
}
