// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Searches never change what the index holds.

use understory_inverted_index::{Aabb3D, Axis, Face, InvertedIndex};

fn digest(idx: &InvertedIndex) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for face in Face::ALL {
        hasher.update(&[face as u8]);
        for entry in idx.entries(face) {
            hasher.update(&entry.offset().to_le_bytes());
            for id in entry.ids() {
                hasher.update(&id.get().to_le_bytes());
            }
        }
    }
    for w in idx.max_width() {
        hasher.update(&w.to_le_bytes());
    }
    hasher.update(&(idx.len() as u64).to_le_bytes());
    hasher.finalize()
}

fn scene() -> InvertedIndex {
    let mut idx = InvertedIndex::new();
    for i in 0..8_u8 {
        let x = f32::from(i) * 1.5;
        idx.index(Aabb3D::new(x, 0.0, -1.0, x + 1.0, 1.0, 1.0));
    }
    idx.index(Aabb3D::new(-20.0, -1.0, -20.0, 20.0, 0.0, 20.0));
    idx.index(Aabb3D::new(3.0, 3.0, 3.0, 3.0, 4.0, 4.0));
    idx
}

#[test]
fn searches_leave_the_index_untouched() {
    let idx = scene();
    let before = digest(&idx);

    for face in Face::ALL {
        for x in [-30.0, -1.0, 0.0, 0.5, 3.0, 11.5, 40.0] {
            let lo = idx.lower_attribute_bound(face, x);
            let hi = idx.upper_attribute_bound(face, x);
            let _ = idx.lower_back_attribute_bound(face, x);
            let _ = idx.upper_back_attribute_bound(face, x);
            let _ = idx.upper_attribute_bound_in(face, x, lo, idx.end(face));
            let _ = idx.lower_back_attribute_bound_in(face, x, hi.prev(), idx.begin(face).prev());
            let _ = idx.try_attribute_index(lo);
            let _ = idx.interval(face, x, x + 2.0);
            let _ = idx.half_open_interval(face, x + 2.0, x);
        }
    }
    for axis in Axis::ALL {
        let _ = idx.axis_overlap(axis, -0.5, 2.5);
    }
    let _ = idx.overlapping(&Aabb3D::new(0.0, 0.0, 0.0, 4.0, 2.0, 1.0));

    assert_eq!(digest(&idx), before, "index changed under searches");
}

#[test]
fn cloned_index_digests_equal() {
    let idx = scene();
    assert_eq!(digest(&idx), digest(&idx.clone()), "clone differs");
}
