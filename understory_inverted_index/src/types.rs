// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: axes, faces, face masks and 3D boxes.

use core::cmp::Ordering;

/// One of the three coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// All axes, in index order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Position of this axis in `[x, y, z]` arrays.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The face on the low side of this axis.
    #[inline]
    pub const fn min_face(self) -> Face {
        match self {
            Self::X => Face::MinX,
            Self::Y => Face::MinY,
            Self::Z => Face::MinZ,
        }
    }

    /// The face on the high side of this axis.
    #[inline]
    pub const fn max_face(self) -> Face {
        match self {
            Self::X => Face::MaxX,
            Self::Y => Face::MaxY,
            Self::Z => Face::MaxZ,
        }
    }
}

/// One of the six faces of an axis-aligned box.
///
/// The discriminant is the face's slot in six-element arrays, so per-face
/// storage can be a plain `[T; 6]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    /// Low X face.
    MinX = 0,
    /// Low Y face.
    MinY = 1,
    /// Low Z face.
    MinZ = 2,
    /// High X face.
    MaxX = 3,
    /// High Y face.
    MaxY = 4,
    /// High Z face.
    MaxZ = 5,
}

impl Face {
    /// All faces, in index order.
    pub const ALL: [Self; 6] = [
        Self::MinX,
        Self::MinY,
        Self::MinZ,
        Self::MaxX,
        Self::MaxY,
        Self::MaxZ,
    ];

    /// Position of this face in six-element arrays.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The axis this face is perpendicular to.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Self::MinX | Self::MaxX => Axis::X,
            Self::MinY | Self::MaxY => Axis::Y,
            Self::MinZ | Self::MaxZ => Axis::Z,
        }
    }

    /// Whether this is the low face of its axis.
    #[inline]
    pub const fn is_min(self) -> bool {
        matches!(self, Self::MinX | Self::MinY | Self::MinZ)
    }

    /// The face on the other side of the same axis.
    ///
    /// When two boxes touch, the touching faces are opposites of each other:
    /// a box's `MaxX` meets the other box's `MinX`.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::MinX => Self::MaxX,
            Self::MinY => Self::MaxY,
            Self::MinZ => Self::MaxZ,
            Self::MaxX => Self::MinX,
            Self::MaxY => Self::MinY,
            Self::MaxZ => Self::MinZ,
        }
    }

    /// The single-bit mask for this face.
    #[inline]
    pub const fn mask(self) -> FaceMask {
        FaceMask::from_bits_retain(1 << self as u8)
    }
}

bitflags::bitflags! {
    /// A set of faces.
    ///
    /// Besides the six single faces, the composite per-axis masks `X`, `Y`
    /// and `Z` name "either face of this axis".
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FaceMask: u8 {
        /// Low X face.
        const MIN_X = 1 << 0;
        /// Low Y face.
        const MIN_Y = 1 << 1;
        /// Low Z face.
        const MIN_Z = 1 << 2;
        /// High X face.
        const MAX_X = 1 << 3;
        /// High Y face.
        const MAX_Y = 1 << 4;
        /// High Z face.
        const MAX_Z = 1 << 5;
        /// Either X face.
        const X = Self::MIN_X.bits() | Self::MAX_X.bits();
        /// Either Y face.
        const Y = Self::MIN_Y.bits() | Self::MAX_Y.bits();
        /// Either Z face.
        const Z = Self::MIN_Z.bits() | Self::MAX_Z.bits();
    }
}

impl FaceMask {
    /// Both faces of `axis`.
    #[inline]
    pub const fn of_axis(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
            Axis::Z => Self::Z,
        }
    }

    /// Whether every axis contributes at least one face.
    #[inline]
    pub const fn covers_all_axes(self) -> bool {
        self.intersects(Self::X) && self.intersects(Self::Y) && self.intersects(Self::Z)
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3D {
    /// Minimum x
    pub min_x: f32,
    /// Minimum y
    pub min_y: f32,
    /// Minimum z
    pub min_z: f32,
    /// Maximum x
    pub max_x: f32,
    /// Maximum y
    pub max_y: f32,
    /// Maximum z
    pub max_z: f32,
}

impl Aabb3D {
    /// Create a new AABB from min/max corners.
    #[inline(always)]
    pub const fn new(
        min_x: f32,
        min_y: f32,
        min_z: f32,
        max_x: f32,
        max_y: f32,
        max_z: f32,
    ) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// Create an AABB from its minimum corner and size.
    #[inline]
    pub fn from_origin_size(origin: [f32; 3], size: [f32; 3]) -> Self {
        Self::new(
            origin[0],
            origin[1],
            origin[2],
            origin[0] + size[0],
            origin[1] + size[1],
            origin[2] + size[2],
        )
    }

    /// Offset of one face.
    #[inline]
    pub const fn face(&self, face: Face) -> f32 {
        match face {
            Face::MinX => self.min_x,
            Face::MinY => self.min_y,
            Face::MinZ => self.min_z,
            Face::MaxX => self.max_x,
            Face::MaxY => self.max_y,
            Face::MaxZ => self.max_z,
        }
    }

    /// All six face offsets, indexed by [`Face::index`].
    #[inline]
    pub const fn faces(&self) -> [f32; 6] {
        [
            self.min_x, self.min_y, self.min_z, self.max_x, self.max_y, self.max_z,
        ]
    }

    /// `max - min` along `axis`.
    #[inline]
    pub fn width(&self, axis: Axis) -> f32 {
        self.face(axis.max_face()) - self.face(axis.min_face())
    }

    /// Widths along all three axes.
    #[inline]
    pub fn widths(&self) -> [f32; 3] {
        [
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        ]
    }

    /// Return true if the box has no volume: a width that is zero, negative or NaN.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.widths()
            .iter()
            .any(|w| w.partial_cmp(&0.0) != Some(Ordering::Greater))
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Faces are part of the box, so two boxes that only touch overlap.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
            && self.min_z <= other.max_z
            && self.max_z >= other.min_z
    }

    /// This box moved by `delta` along `axis`.
    #[inline]
    #[must_use]
    pub fn translated(&self, axis: Axis, delta: f32) -> Self {
        let mut out = *self;
        match axis {
            Axis::X => {
                out.min_x += delta;
                out.max_x += delta;
            }
            Axis::Y => {
                out.min_y += delta;
                out.max_y += delta;
            }
            Axis::Z => {
                out.min_z += delta;
                out.max_z += delta;
            }
        }
        out
    }
}
