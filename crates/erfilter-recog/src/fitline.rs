//! Line fitting over region corners
//!
//! Two robust slope estimators for the corners of a row of characters:
//!
//! - [`avg_slope`]: average of local slopes over consecutive point triples.
//!   A triple whose three pairwise slopes agree contributes their mean;
//!   otherwise the pairwise slope of smallest magnitude is used, so a
//!   single outlier (a descender, a punctuation mark) does not tilt the line.
//! - [`lms_slope`]: least median of squares regression (Rousseeuw 1984,
//!   Steele & Steiger 1985) over all point pairs.
//!
//! Slopes are `dy / dx` in image coordinates (y grows downward).

use erfilter_core::Point;

/// Maximum spread between the three pairwise slopes of an agreeing triple
const SLOPE_AGREEMENT: f64 = 0.07;

/// Slope of the segment `a`-`b`.
///
/// Vertical segments have an infinite slope carrying the sign of `dy`;
/// coincident points have slope 0.
fn pair_slope(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    if dx != 0 {
        f64::from(dy) / f64::from(dx)
    } else if dy == 0 {
        0.0
    } else {
        f64::INFINITY.copysign(f64::from(dy))
    }
}

/// Average local slope of a sequence of points ordered along x.
///
/// Returns `None` for fewer than three points.
pub fn avg_slope(points: &[Point]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }

    let total: f64 = points
        .windows(3)
        .map(|w| {
            let s12 = pair_slope(w[0], w[1]);
            let s23 = pair_slope(w[1], w[2]);
            let s13 = pair_slope(w[0], w[2]);

            if (s12 - s23).abs() < SLOPE_AGREEMENT
                && (s23 - s13).abs() < SLOPE_AGREEMENT
                && (s12 - s13).abs() < SLOPE_AGREEMENT
            {
                (s12 + s23 + s13) / 3.0
            } else {
                // Smallest magnitude wins; ties keep the earlier pair
                [s23, s13]
                    .into_iter()
                    .fold(s12, |best, s| if s.abs() < best.abs() { s } else { best })
            }
        })
        .sum();

    Some(total / (points.len() - 2) as f64)
}

/// Least median of squares slope.
///
/// Each non-vertical pair of points proposes a slope `beta`; the residual
/// intercepts `y - beta * x` are sorted and the narrowest window covering
/// half of them scores the proposal. Returns `None` when no pair of points
/// has distinct x coordinates.
pub fn lms_slope(points: &[Point]) -> Option<f64> {
    let half = points.len() / 2;
    let mut best: Option<(f64, f64)> = None;
    let mut intercepts = Vec::with_capacity(points.len());

    for (r, &p) in points.iter().enumerate() {
        for &q in &points[r + 1..] {
            if p.x == q.x {
                continue;
            }
            let beta = pair_slope(p, q);

            intercepts.clear();
            intercepts.extend(
                points
                    .iter()
                    .map(|pt| f64::from(pt.y) - beta * f64::from(pt.x)),
            );
            intercepts.sort_by(f64::total_cmp);

            for j in 0..half {
                let width = intercepts[j + half] - intercepts[j];
                if best.is_none_or(|(d, _)| width < d) {
                    best = Some((width, beta));
                }
            }
        }
    }

    best.map(|(_, beta)| beta)
}
