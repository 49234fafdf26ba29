//! Component tree regression test
//!
//! Builds component trees of small synthetic images and checks the
//! structural properties of the result:
//!
//! 1. Uniform image: a single real region covering the image
//! 2. Area conservation with merge thresholds disabled
//! 3. Level ordering along every parent link
//! 4. Two separated blobs become siblings under the background region
//! 5. Repeated extraction is deterministic
//! 6. Default thresholds keep character-sized regions and fold the rest
//!
//! Run with:
//! ```
//! cargo test -p erfilter-region --test component_tree_reg
//! ```

use erfilter_core::{Box, GrayImage};
use erfilter_region::{ComponentTree, ErTreeOptions, SENTINEL_LEVEL, extract_tree};
use erfilter_test::{RegParams, synth};

/// Deterministic textured image with many grey levels
fn textured_image(width: u32, height: u32) -> GrayImage {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 37 + y * 91 + (x * y) % 13) % 256) as u8))
        .collect();
    GrayImage::from_vec(width, height, data).unwrap()
}

/// (level, area, bound) of every reachable region, in preorder
fn signature(tree: &ComponentTree) -> Vec<(u32, u32, Box)> {
    tree.descendants()
        .into_iter()
        .map(|id| (tree[id].level, tree[id].area, tree[id].bound))
        .collect()
}

#[test]
fn component_tree_reg_uniform() {
    let mut rp = RegParams::new("component_tree_uniform");

    let (w, h) = (20u32, 30u32);
    let pix = synth::uniform(w, h, 128).expect("uniform image");
    let tree = extract_tree(&pix, &ErTreeOptions::unfiltered()).expect("extract_tree");
    let root = tree.root().expect("root");

    rp.compare_values(SENTINEL_LEVEL as f64, tree[root].level as f64, 0.0);
    rp.compare_bool(true, tree[root].is_sentinel());
    rp.compare_values(2.0, tree.len() as f64, 0.0);

    let kids: Vec<_> = tree.children(root).collect();
    rp.compare_values(1.0, kids.len() as f64, 0.0);
    let region = &tree[kids[0]];
    rp.compare_values(128.0, region.level as f64, 0.0);
    rp.compare_values((w * h) as f64, region.area as f64, 0.0);
    rp.compare_bool(true, region.bound == Box::new_unchecked(0, 0, w as i32, h as i32));
    rp.compare_bool(true, region.child.is_none());

    assert!(rp.cleanup(), "component_tree uniform test failed");
}

#[test]
fn component_tree_reg_area_conservation() {
    let mut rp = RegParams::new("component_tree_area");

    for (w, h) in [(1u32, 1u32), (7, 3), (32, 24), (61, 17)] {
        let pix = textured_image(w, h);
        let tree = extract_tree(&pix, &ErTreeOptions::unfiltered()).expect("extract_tree");
        let root = tree.root().expect("root");
        rp.compare_values((w * h) as f64, tree[root].area as f64, 0.0);
        rp.compare_bool(
            true,
            tree[root].bound == Box::new_unchecked(0, 0, w as i32, h as i32),
        );

        // Every region holds at least one pixel and at least the pixels of
        // its children.
        for id in tree.descendants() {
            let child_area: u32 = tree.children(id).map(|c| tree[c].area).sum();
            rp.compare_bool(true, tree[id].area >= 1);
            rp.compare_bool(true, tree[id].area >= child_area);
        }
    }

    assert!(rp.cleanup(), "component_tree area conservation test failed");
}

#[test]
fn component_tree_reg_level_ordering() {
    let mut rp = RegParams::new("component_tree_levels");

    for step in [1u32, 4, 16] {
        let pix = textured_image(40, 30);
        let opts = ErTreeOptions::unfiltered().with_thresh_step(step);
        let tree = extract_tree(&pix, &opts).expect("extract_tree");
        let root = tree.root().expect("root");

        rp.compare_values(SENTINEL_LEVEL as f64, tree[root].level as f64, 0.0);
        rp.compare_bool(true, tree[root].parent.is_none());

        let mut violations = 0;
        for id in tree.descendants() {
            if let Some(parent) = tree[id].parent {
                if tree[id].level > tree[parent].level {
                    violations += 1;
                }
                let bound = tree[id].bound;
                if !tree[parent].bound.contains_box(&bound) {
                    violations += 1;
                }
            } else if id != root {
                violations += 1;
            }
            if id != root && tree[id].level >= opts.highest_level() {
                violations += 1;
            }
        }
        rp.compare_values(0.0, violations as f64, 0.0);
    }

    assert!(rp.cleanup(), "component_tree level ordering test failed");
}

#[test]
fn component_tree_reg_two_blobs() {
    let mut rp = RegParams::new("component_tree_blobs");

    let blob_a = Box::new_unchecked(3, 3, 5, 5);
    let blob_b = Box::new_unchecked(20, 10, 5, 5);

    // Dark blobs on a bright background: the flood descends into each blob,
    // which closes as a child of the background region.
    let pix = synth::blobs(30, 20, 200, 0, &[blob_a, blob_b]).expect("blobs");
    let tree = extract_tree(&pix, &ErTreeOptions::unfiltered()).expect("extract_tree");
    check_two_blobs(&mut rp, &tree, 200, 0, blob_a, blob_b);

    // Bright blobs on a dark background are found on the inverted channel.
    let pix = synth::blobs(30, 20, 0, 200, &[blob_a, blob_b]).expect("blobs");
    let tree = extract_tree(&pix.invert(), &ErTreeOptions::unfiltered()).expect("extract_tree");
    check_two_blobs(&mut rp, &tree, 255, 55, blob_a, blob_b);

    assert!(rp.cleanup(), "component_tree two blobs test failed");
}

fn check_two_blobs(
    rp: &mut RegParams,
    tree: &ComponentTree,
    background: u32,
    blob_level: u32,
    blob_a: Box,
    blob_b: Box,
) {
    let root = tree.root().expect("root");
    let top: Vec<_> = tree.children(root).collect();
    rp.compare_values(1.0, top.len() as f64, 0.0);

    let bg = &tree[top[0]];
    rp.compare_values(background as f64, bg.level as f64, 0.0);
    rp.compare_values(600.0, bg.area as f64, 0.0);
    rp.compare_bool(true, bg.bound.contains_box(&blob_a.union(&blob_b)));

    let mut blobs: Vec<_> = tree.children(top[0]).map(|id| &tree[id]).collect();
    rp.compare_values(2.0, blobs.len() as f64, 0.0);
    blobs.sort_by_key(|r| r.bound.x);
    for (region, expected) in blobs.iter().zip([blob_a, blob_b]) {
        rp.compare_values(blob_level as f64, region.level as f64, 0.0);
        rp.compare_values(25.0, region.area as f64, 0.0);
        rp.compare_bool(true, region.bound == expected);
        rp.compare_bool(true, region.parent == Some(top[0]));
    }
}

#[test]
fn component_tree_reg_deterministic() {
    let mut rp = RegParams::new("component_tree_determinism");

    let pix = textured_image(48, 36);
    let opts = ErTreeOptions::new().with_thresh_step(4).with_min_area(4);
    let first = signature(&extract_tree(&pix, &opts).expect("extract_tree"));
    let second = signature(&extract_tree(&pix, &opts).expect("extract_tree"));

    rp.compare_values(first.len() as f64, second.len() as f64, 0.0);
    rp.compare_bool(true, first == second);

    assert!(rp.cleanup(), "component_tree determinism test failed");
}

#[test]
fn component_tree_reg_default_thresholds() {
    let mut rp = RegParams::new("component_tree_defaults");

    let bar = Box::new_unchecked(50, 50, 20, 40);
    let speck = Box::new_unchecked(150, 150, 3, 3);
    let pix = synth::blobs(200, 200, 220, 10, &[bar, speck]).expect("blobs");
    let tree = extract_tree(&pix, &ErTreeOptions::default()).expect("extract_tree");

    let regions: Vec<_> = tree.descendants().into_iter().map(|id| &tree[id]).collect();

    // Sentinel, background, bar; the 3x3 speck is folded into the background
    rp.compare_values(3.0, regions.len() as f64, 0.0);
    rp.compare_bool(true, regions.iter().any(|r| r.bound == bar && r.area == 800));
    rp.compare_bool(true, !regions.iter().any(|r| r.bound == speck));
    rp.compare_values(40_000.0, regions[0].area as f64, 0.0);

    assert!(rp.cleanup(), "component_tree default thresholds test failed");
}
