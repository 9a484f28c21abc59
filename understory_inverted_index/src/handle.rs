// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-checked positions into a face sequence.

use crate::types::Face;

/// A position in one face's sorted sequence of [`AttributeIndex`] entries.
///
/// Handles are returned by the bound searches of [`InvertedIndex`]. The
/// position is signed because the back bounds report `-1` for "before the
/// first entry".
///
/// A handle remembers which face it belongs to and the generation of that
/// face when it was created. Inserting a box with a new offset shifts the
/// entries after the insertion point, so the index bumps the face's
/// generation and refuses to dereference older handles.
///
/// [`AttributeIndex`]: crate::AttributeIndex
/// [`InvertedIndex`]: crate::InvertedIndex
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    face: Face,
    position: isize,
    generation: u32,
}

impl Handle {
    pub(crate) const fn new(face: Face, position: isize, generation: u32) -> Self {
        Self {
            face,
            position,
            generation,
        }
    }

    /// The face sequence this handle points into.
    #[inline]
    pub const fn face(self) -> Face {
        self.face
    }

    /// The entry position; `-1` means "before the first entry".
    #[inline]
    pub const fn position(self) -> isize {
        self.position
    }

    /// Generation of the face sequence when this handle was created.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// The handle one entry further in ascending order.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        self.offset_by(1)
    }

    /// The handle one entry further in descending order.
    #[inline]
    #[must_use]
    pub const fn prev(self) -> Self {
        self.offset_by(-1)
    }

    /// The handle `delta` entries away.
    #[inline]
    #[must_use]
    pub const fn offset_by(self, delta: isize) -> Self {
        Self {
            position: self.position + delta,
            ..self
        }
    }
}

/// Reasons a [`Handle`] cannot be dereferenced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    /// The face gained entries since the handle was created.
    #[error("stale handle into {face:?}: generation {found}, index is at {expected}")]
    Stale {
        /// The face the handle points into.
        face: Face,
        /// Current generation of the face.
        expected: u32,
        /// Generation carried by the handle.
        found: u32,
    },
    /// The handle belongs to another face.
    #[error("handle into {found:?} used on {expected:?}")]
    WrongFace {
        /// The face that was asked for.
        expected: Face,
        /// The face the handle points into.
        found: Face,
    },
    /// The handle is before the first or past the last entry.
    #[error("handle position {position} out of range for {face:?} ({len} entries)")]
    OutOfRange {
        /// The face the handle points into.
        face: Face,
        /// Position carried by the handle.
        position: isize,
        /// Number of entries in the face.
        len: usize,
    },
}
