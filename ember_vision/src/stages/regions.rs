// THEORY:
// The color and motion stages each produce a mask of suspicious pixels. This
// stage fuses them (a pixel counts only when BOTH stages agree) and groups
// the survivors into connected regions, the candidate flames the temporal
// filter will judge over time.
//
// Key architectural principles:
// 1.  **Eight-connected growth**: Regions grow through diagonal neighbors.
//     Flame edges are ragged, and four-connectivity would shatter one fire
//     into many sub-threshold fragments.
// 2.  **Area floor**: Anything smaller than `min_area` is noise (a glinting
//     reflection, a single flickering pixel) and is dropped before it can
//     contribute to the fire signal.
// 3.  **Solidity ceiling**: Real flame is concave and ragged, so its pixel
//     area falls well short of its convex hull's area. A region that fills
//     more than 90% of its hull is a rigid shape (a brake light, a screen,
//     a poster edge) and is rejected.

use std::collections::BTreeMap;

use crate::frame::Mask;

const SOLIDITY_EPSILON: f64 = 1e-5;
const MAX_SOLIDITY: f64 = 0.9;

/// A connected group of pixels that passed both the color and motion stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Left edge of the bounding box, in pixels.
    pub x: u32,
    /// Top edge of the bounding box, in pixels.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Number of pixels in the region, not the bounding box area.
    pub area: usize,
    /// Pixel area divided by convex hull area, in `0.0..=1.0`.
    pub solidity: f64,
}

/// Fuses the two masks and extracts every connected region that clears the
/// area floor and the solidity ceiling. Returns the surviving regions in
/// scan order together with their summed pixel area.
///
/// Both masks must share the frame's dimensions.
pub fn extract(color: &Mask, motion: &Mask, min_area: usize) -> (Vec<Region>, usize) {
    debug_assert_eq!((color.width, color.height), (motion.width, motion.height));

    let width = color.width as usize;
    let height = color.height as usize;
    let fused: Vec<bool> = color
        .data
        .iter()
        .zip(&motion.data)
        .map(|(c, m)| *c == Mask::SET && *m == Mask::SET)
        .collect();

    let mut visited = vec![false; fused.len()];
    let mut regions = Vec::new();
    let mut total_area = 0;

    for start in 0..fused.len() {
        if !fused[start] || visited[start] {
            continue;
        }

        let pixels = grow_region(&fused, &mut visited, width, height, start);
        if pixels.len() < min_area {
            continue;
        }

        let region = measure(&pixels);
        if region.solidity > MAX_SOLIDITY {
            continue;
        }

        total_area += region.area;
        regions.push(region);
    }

    (regions, total_area)
}

/// Collects one connected region by flood fill, marking every member visited.
fn grow_region(
    fused: &[bool],
    visited: &mut [bool],
    width: usize,
    height: usize,
    start: usize,
) -> Vec<(u32, u32)> {
    let mut pixels = Vec::new();
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(index) = stack.pop() {
        let x = (index % width) as i64;
        let y = (index / width) as i64;
        pixels.push((x as u32, y as u32));

        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let neighbor = ny as usize * width + nx as usize;
                if fused[neighbor] && !visited[neighbor] {
                    visited[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }
    }

    pixels
}

/// Computes the bounding box and solidity of a region from its pixel list.
fn measure(pixels: &[(u32, u32)]) -> Region {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;

    // Leftmost and rightmost pixel per occupied row. The convex hull of the
    // region's pixel squares only ever turns at corners of these extremes.
    let mut row_extents: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for &(x, y) in pixels {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        row_extents
            .entry(y)
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(x);
                *hi = (*hi).max(x);
            })
            .or_insert((x, x));
    }

    let mut corners = Vec::with_capacity(row_extents.len() * 4);
    for (&y, &(lo, hi)) in &row_extents {
        let (y, lo, hi) = (y as i64, lo as i64, hi as i64);
        corners.push((lo, y));
        corners.push((lo, y + 1));
        corners.push((hi + 1, y));
        corners.push((hi + 1, y + 1));
    }

    let hull_area = polygon_area(&convex_hull(corners));
    let area = pixels.len();

    Region {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
        area,
        solidity: area as f64 / (hull_area + SOLIDITY_EPSILON),
    }
}

/// Andrew's monotone chain over integer points.
fn convex_hull(mut points: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    points.sort_unstable();
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut hull: Vec<(i64, i64)> = Vec::with_capacity(points.len() * 2);
    for &point in &points {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0 {
            hull.pop();
        }
        hull.push(point);
    }

    let lower_len = hull.len() + 1;
    for &point in points.iter().rev() {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0
        {
            hull.pop();
        }
        hull.push(point);
    }

    hull.pop();
    hull
}

fn cross(o: (i64, i64), a: (i64, i64), b: (i64, i64)) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn polygon_area(hull: &[(i64, i64)]) -> f64 {
    if hull.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for i in 0..hull.len() {
        let (x1, y1) = hull[i];
        let (x2, y2) = hull[(i + 1) % hull.len()];
        twice += x1 * y2 - x2 * y1;
    }
    twice.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    mask.set(xx, yy);
                }
            }
        }
        mask
    }

    fn full_mask(width: u32, height: u32) -> Mask {
        let mut mask = Mask::new(width, height);
        mask.data.fill(Mask::SET);
        mask
    }

    #[test]
    fn regions_form_only_where_color_and_motion_agree() {
        let color = mask_with_rects(32, 32, &[(0, 0, 4, 4)]);
        let motion = mask_with_rects(32, 32, &[(20, 20, 4, 4)]);
        let (regions, total) = extract(&color, &motion, 1);
        assert!(regions.is_empty());
        assert_eq!(total, 0);

        // An L shape: concave enough to survive the solidity ceiling.
        let color = full_mask(32, 32);
        let motion = mask_with_rects(32, 32, &[(0, 0, 4, 2), (0, 2, 2, 2)]);
        let (regions, total) = extract(&color, &motion, 1);
        assert_eq!(regions.len(), 1);
        assert_eq!(total, 12);
    }

    #[test]
    fn specks_below_the_area_floor_are_dropped() {
        let color = full_mask(32, 32);
        let motion = mask_with_rects(32, 32, &[(5, 5, 3, 3)]);
        let (regions, total) = extract(&color, &motion, 50);
        assert!(regions.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn solid_rectangles_are_rejected_as_too_regular() {
        let color = full_mask(32, 32);
        let motion = mask_with_rects(32, 32, &[(2, 2, 10, 20)]);
        let (regions, total) = extract(&color, &motion, 50);
        assert!(regions.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn ragged_plus_shape_is_kept_with_its_measurements() {
        // A plus whose arms are 10 wide on a 30x30 canvas: 500 pixels against
        // a 700 pixel octagonal hull.
        let color = full_mask(30, 30);
        let motion = mask_with_rects(30, 30, &[(10, 0, 10, 30), (0, 10, 30, 10)]);
        let (regions, total) = extract(&color, &motion, 500);

        assert_eq!(regions.len(), 1);
        assert_eq!(total, 500);
        let region = &regions[0];
        assert_eq!(region.area, 500);
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 30, 30));
        assert!((region.solidity - 500.0 / 700.0).abs() < 1e-3);
    }

    #[test]
    fn diagonal_contact_joins_regions() {
        let color = full_mask(32, 32);
        let motion = mask_with_rects(32, 32, &[(0, 0, 3, 3), (3, 3, 3, 3)]);
        let (regions, _) = extract(&color, &motion, 1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 18);
    }

    #[test]
    fn regions_are_reported_in_scan_order() {
        let color = full_mask(32, 32);
        let motion = mask_with_rects(
            32,
            32,
            &[(0, 0, 4, 2), (0, 2, 2, 2), (10, 10, 4, 2), (10, 12, 2, 2)],
        );
        let (regions, total) = extract(&color, &motion, 1);
        assert_eq!(regions.len(), 2);
        assert_eq!(total, 24);
        assert_eq!((regions[0].x, regions[0].y), (0, 0));
        assert_eq!((regions[1].x, regions[1].y), (10, 10));
    }
}
