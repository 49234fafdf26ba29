//! Spatial grouping regression test
//!
//! Groups hand-placed character candidates:
//!
//! 1. Two separate text lines plus scattered noise
//! 2. Irregular sets rejected by the statistical filter
//! 3. Sibling-set merging terminates within a bounded number of passes
//! 4. Grouping is repeatable
//! 5. Triplet grouping over two lines
//!
//! Run with:
//! ```
//! cargo test -p erfilter-recog --test grouping_reg
//! ```

use erfilter_core::Box;
use erfilter_recog::group::{link_neighbors, merge_sibling_sets, sibling_sets};
use erfilter_recog::{
    GroupingOptions, NeighborThresholds, SpatialGrouper, TextLine, TripletGrouper, TripletOptions,
};
use erfilter_region::Region;
use erfilter_test::RegParams;

fn candidate(x: i32, y: i32, w: i32, h: i32, area: u32) -> Region {
    let mut r = Region::new(1, 0, x, y);
    r.bound = Box::new_unchecked(x, y, w, h);
    r.area = area;
    r.center = r.bound.center();
    r.color = [40.0, 120.0, 130.0];
    r.score = 1.0;
    r
}

/// `count` glyphs of 14x24 at pitch 20, starting at `(x, y)`
fn text_row(x: i32, y: i32, count: i32) -> Vec<Region> {
    (0..count)
        .map(|i| candidate(x + i * 20, y, 14, 24, 200))
        .collect()
}

fn member_bounds(line: &TextLine, pool: &[Region]) -> Vec<Box> {
    line.members.iter().map(|&m| pool[m].bound).collect()
}

#[test]
fn grouping_reg_two_lines() {
    let mut rp = RegParams::new("grouping_two_lines");

    let mut pool = text_row(20, 30, 6);
    pool.extend(text_row(40, 120, 5));
    // Isolated noise: too far, too small, wrong color
    pool.push(candidate(400, 300, 14, 24, 200));
    pool.push(candidate(150, 33, 4, 6, 20));
    let mut odd = candidate(160, 120, 14, 24, 200);
    odd.color = [200.0, 10.0, 10.0];
    pool.push(odd);
    pool.reverse();

    let lines = SpatialGrouper::default().group(&mut pool).expect("group");
    rp.compare_values(2.0, lines.len() as f64, 0.0);

    let mut sorted = lines.clone();
    sorted.sort_by_key(|l| l.bound.y);
    if let [first, second] = sorted.as_slice() {
        rp.compare_values(6.0, first.len() as f64, 0.0);
        rp.compare_bool(true, first.bound == Box::new_unchecked(20, 30, 114, 24));
        rp.compare_values(5.0, second.len() as f64, 0.0);
        rp.compare_bool(true, second.bound == Box::new_unchecked(40, 120, 94, 24));

        // Members are left to right
        let xs: Vec<i32> = member_bounds(first, &pool).iter().map(|b| b.x).collect();
        rp.compare_bool(true, xs.windows(2).all(|w| w[0] < w[1]));
        rp.compare_values(0.0, first.slope, 0.0);
    }

    assert!(rp.cleanup(), "grouping two lines test failed");
}

#[test]
fn grouping_reg_irregular_set() {
    let mut rp = RegParams::new("grouping_irregular");

    // Areas drift by nearly 3x per neighbour and one gap is 7x the others
    let areas = [10u32, 28, 78, 218, 610];
    let xs = [0, 10, 20, 30, 100];
    let build = || -> Vec<Region> {
        xs.iter()
            .zip(areas)
            .map(|(&x, area)| candidate(20 + x, 40, 25, 30, area))
            .collect()
    };

    let mut pool = build();
    let lines = SpatialGrouper::default().group(&mut pool).expect("group");
    rp.compare_values(0.0, lines.len() as f64, 0.0);

    let tolerant = GroupingOptions::new().with_irregularity(1.5);
    let mut pool = build();
    let lines = SpatialGrouper::new(tolerant).group(&mut pool).expect("group");
    rp.compare_values(1.0, lines.len() as f64, 0.0);
    rp.compare_values(5.0, lines.first().map_or(0, TextLine::len) as f64, 0.0);

    assert!(rp.cleanup(), "grouping irregular set test failed");
}

#[test]
fn grouping_reg_fixpoint() {
    let mut rp = RegParams::new("grouping_fixpoint");

    // Several rows with jittered positions
    let mut pool = Vec::new();
    for row in 0..4 {
        for i in 0..15 {
            let jitter = (i * 7 + row * 3) % 5;
            pool.push(candidate(10 + i * 20 + jitter, 20 + row * 60 + jitter, 14, 24, 200));
        }
    }
    pool.sort_by_key(|r| r.center.x);

    link_neighbors(&mut pool, &NeighborThresholds::default());
    let mut sets = sibling_sets(&pool);
    let n = sets.len();
    let passes = merge_sibling_sets(&mut sets);

    rp.compare_bool(true, passes <= n);
    // No two surviving sets still share two members
    let survivors: Vec<_> = sets.iter().filter(|s| !s.is_empty()).collect();
    let mut shared = 0;
    for (i, a) in survivors.iter().enumerate() {
        for b in &survivors[i + 1..] {
            if a.intersection(b).count() >= 2 {
                shared += 1;
            }
        }
    }
    rp.compare_values(0.0, shared as f64, 0.0);
    rp.compare_values(4.0, survivors.len() as f64, 0.0);

    assert!(rp.cleanup(), "grouping fixpoint test failed");
}

#[test]
fn grouping_reg_repeatable() {
    let mut rp = RegParams::new("grouping_repeat");

    let mut base = text_row(20, 30, 7);
    base.extend(text_row(30, 100, 4));
    base.reverse();

    let mut pool_a = base.clone();
    let mut pool_b = base;
    let lines_a = SpatialGrouper::default().group(&mut pool_a).expect("group");
    let lines_b = SpatialGrouper::default().group(&mut pool_b).expect("group");
    rp.compare_bool(true, lines_a == lines_b);
    rp.compare_bool(true, pool_a == pool_b);

    assert!(rp.cleanup(), "grouping repeatability test failed");
}

#[test]
fn grouping_reg_triplets() {
    let mut rp = RegParams::new("grouping_triplets");

    let mut pool = text_row(20, 30, 6);
    pool.extend(text_row(400, 30, 6));
    pool.reverse();

    let lines = TripletGrouper::default().group(&mut pool).expect("group");
    rp.compare_values(2.0, lines.len() as f64, 0.0);
    for line in &lines {
        rp.compare_values(6.0, line.len() as f64, 0.0);
        rp.compare_values(0.0, line.angle, 0.0);
    }

    // Too few regions
    let mut small = text_row(20, 30, 6);
    let lines = TripletGrouper::default().group(&mut small).expect("group");
    rp.compare_values(0.0, lines.len() as f64, 0.0);

    // A smaller minimum and a wider window accept the single row
    let opts = TripletOptions::new()
        .with_min_regions(3)
        .with_search_fraction(0.5);
    let lines = TripletGrouper::new(opts).group(&mut small).expect("group");
    rp.compare_values(1.0, lines.len() as f64, 0.0);

    assert!(rp.cleanup(), "grouping triplets test failed");
}
