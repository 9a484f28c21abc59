// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sweeping a box along one axis through simulated time.

use alloc::vec::Vec;

use understory_inverted_index::{Aabb3D, Axis, Handle, InvertedIndex};

use crate::collision::{Collision, CollisionType};
use crate::context::CollisionQueryContext;

/// Which way a [`CollisionQuery`] sweeps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// No motion: only the contacts present at construction.
    Static,
    /// Towards increasing offsets.
    Forward,
    /// Towards decreasing offsets.
    Backward,
}

/// A walk along one face sequence of the index.
///
/// Forward cursors step up from `handle` to `end`, backward cursors step down.
#[derive(Copy, Clone, Debug)]
struct Cursor {
    handle: Handle,
    end: Handle,
    /// Offset of the mover's face that meets this sequence, at time zero.
    start: f32,
    kind: CollisionType,
}

impl Cursor {
    fn is_done(&self) -> bool {
        self.handle.position() == self.end.position()
    }
}

/// The two cursors of a moving query.
#[derive(Copy, Clone, Debug)]
struct Sweep {
    velocity: f32,
    /// The mover's front face against the near faces of what lies ahead.
    leading: Cursor,
    /// The mover's back face against the far faces of what it passes.
    trailing: Cursor,
}

/// A box swept along one axis, reporting contacts in time order.
///
/// The query owns its [`CollisionQueryContext`]. Each call to
/// [`get_collisions`](Self::get_collisions) advances simulated time up to a
/// limit and appends the contacts met on the way; time never runs backwards,
/// so repeating a call with the same limit reports nothing new.
///
/// Contacts are classified per entry of the face sequences:
///
/// - every box face the mover's front face reaches within `endtime`,
///   inclusive, is an [`Entry`](CollisionType::Entry) candidate;
/// - every box face the mover's back face passes strictly before `endtime`
///   is an [`Exit`](CollisionType::Exit) candidate.
///
/// At equal times entries are handled before exits.
#[derive(Clone, Debug)]
pub struct CollisionQuery<'a> {
    context: CollisionQueryContext<'a>,
    direction: Direction,
    axis: Axis,
    dtime: f32,
    endtime: f32,
    sweep: Option<Sweep>,
}

impl<'a> CollisionQuery<'a> {
    /// A query that does not move; it only hands out the static contacts.
    pub fn stationary(context: CollisionQueryContext<'a>, axis: Axis, dtime: f32) -> Self {
        Self {
            context,
            direction: Direction::Static,
            axis,
            dtime: 0.0,
            endtime: dtime,
            sweep: None,
        }
    }

    /// Sweep towards increasing offsets on `axis` for `dtime` at `velocity`.
    ///
    /// # Panics
    ///
    /// Panics if `velocity` is not strictly positive.
    pub fn forward(
        context: CollisionQueryContext<'a>,
        axis: Axis,
        velocity: f32,
        dtime: f32,
    ) -> Self {
        assert!(
            velocity > 0.0,
            "forward query needs a positive velocity, got {velocity}"
        );
        let index = context.index();
        let aabb = context.aabb();
        let (lo, hi) = (aabb.face(axis.min_face()), aabb.face(axis.max_face()));
        let travel = velocity * dtime;

        // The mover's max face meets box min faces in [hi, hi + travel].
        let face = axis.min_face();
        let handle = index.lower_attribute_bound(face, hi);
        let end = index.upper_attribute_bound_in(face, hi + travel, handle, index.end(face));
        let leading = Cursor {
            handle,
            end,
            start: hi,
            kind: CollisionType::Entry,
        };

        // The mover's min face passes box max faces in [lo, lo + travel).
        let face = axis.max_face();
        let handle = index.lower_attribute_bound(face, lo);
        let end = index.lower_attribute_bound_in(face, lo + travel, handle, index.end(face));
        let trailing = Cursor {
            handle,
            end,
            start: lo,
            kind: CollisionType::Exit,
        };

        Self::moving(context, Direction::Forward, axis, velocity, dtime, leading, trailing)
    }

    /// Sweep towards decreasing offsets on `axis` for `dtime` at `velocity`.
    ///
    /// # Panics
    ///
    /// Panics if `velocity` is not strictly negative.
    pub fn backward(
        context: CollisionQueryContext<'a>,
        axis: Axis,
        velocity: f32,
        dtime: f32,
    ) -> Self {
        assert!(
            velocity < 0.0,
            "backward query needs a negative velocity, got {velocity}"
        );
        let index = context.index();
        let aabb = context.aabb();
        let (lo, hi) = (aabb.face(axis.min_face()), aabb.face(axis.max_face()));
        let travel = velocity * dtime;

        // The mover's min face meets box max faces in [lo + travel, lo].
        let face = axis.max_face();
        let handle = index.lower_back_attribute_bound(face, lo);
        let end = index.upper_back_attribute_bound_in(
            face,
            lo + travel,
            handle,
            index.begin(face).prev(),
        );
        let leading = Cursor {
            handle,
            end,
            start: lo,
            kind: CollisionType::Entry,
        };

        // The mover's max face passes box min faces in (hi + travel, hi].
        let face = axis.min_face();
        let handle = index.lower_back_attribute_bound(face, hi);
        let end = index.lower_back_attribute_bound_in(
            face,
            hi + travel,
            handle,
            index.begin(face).prev(),
        );
        let trailing = Cursor {
            handle,
            end,
            start: hi,
            kind: CollisionType::Exit,
        };

        Self::moving(context, Direction::Backward, axis, velocity, dtime, leading, trailing)
    }

    fn moving(
        context: CollisionQueryContext<'a>,
        direction: Direction,
        axis: Axis,
        velocity: f32,
        dtime: f32,
        leading: Cursor,
        trailing: Cursor,
    ) -> Self {
        tracing::debug!(
            context_id = context.context_id(),
            ?direction,
            ?axis,
            velocity,
            dtime,
            entries = (leading.end.position() - leading.handle.position()).abs(),
            exits = (trailing.end.position() - trailing.handle.position()).abs(),
            "collision query built"
        );
        Self {
            context,
            direction,
            axis,
            dtime: 0.0,
            endtime: dtime,
            sweep: Some(Sweep {
                velocity,
                leading,
                trailing,
            }),
        }
    }

    /// Which way this query sweeps.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The axis this query sweeps along.
    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Time simulated so far.
    #[inline]
    pub fn dtime(&self) -> f32 {
        self.dtime
    }

    /// Time at which the sweep ends.
    #[inline]
    pub fn endtime(&self) -> f32 {
        self.endtime
    }

    /// The context tracking this query's candidates.
    #[inline]
    pub fn context(&self) -> &CollisionQueryContext<'a> {
        &self.context
    }

    /// Give up the query, keeping its context.
    pub fn into_context(self) -> CollisionQueryContext<'a> {
        self.context
    }

    /// Time of the next contact candidate, if any remains.
    pub fn next_event_time(&self) -> Option<f32> {
        let sweep = self.sweep.as_ref()?;
        let index = self.context.index();
        let leading = event_time(index, sweep.velocity, &sweep.leading);
        let trailing = event_time(index, sweep.velocity, &sweep.trailing);
        match (leading, trailing) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Whether every contact of this query has been reported.
    pub fn is_finished(&self) -> bool {
        !self.context.has_pending() && self.next_event_time().is_none()
    }

    /// Advance to `dtime_limit` and append the contacts met on the way.
    ///
    /// Static contacts not yet handed out come first. Returns the number of
    /// records appended by this call.
    pub fn get_collisions(&mut self, dtime_limit: f32, out: &mut Vec<Collision>) -> usize {
        let mut count = self.context.take_pending(out);
        let Some(mut sweep) = self.sweep else {
            self.dtime = self.dtime.max(dtime_limit.min(self.endtime));
            return count;
        };
        // The cursors already end at `endtime`; past it, drain them.
        let limit = if dtime_limit >= self.endtime {
            f32::INFINITY
        } else {
            dtime_limit
        };
        let index = self.context.index();

        loop {
            let leading = event_time(index, sweep.velocity, &sweep.leading);
            let trailing = event_time(index, sweep.velocity, &sweep.trailing);
            let (cursor, t) = match (leading, trailing) {
                (Some(a), Some(b)) if a <= b => (&mut sweep.leading, a),
                (_, Some(b)) => (&mut sweep.trailing, b),
                (Some(a), None) => (&mut sweep.leading, a),
                (None, None) => break,
            };
            if t > limit {
                break;
            }

            let face = cursor.handle.face();
            let entry = index.attribute_index(cursor.handle);
            cursor.handle = match self.direction {
                Direction::Backward => cursor.handle.prev(),
                _ => cursor.handle.next(),
            };
            let found = match cursor.kind {
                CollisionType::Exit => {
                    self.context
                        .move_remove(face, entry.offset(), entry.ids(), t, out)
                }
                _ => self.context.move_add(face, entry.offset(), entry.ids(), t, out),
            };
            tracing::trace!(
                context_id = self.context.context_id(),
                ?face,
                offset = entry.offset(),
                t,
                found,
                "sweep event"
            );
            count += found;
        }

        self.sweep = Some(sweep);
        self.dtime = self.dtime.max(dtime_limit.min(self.endtime));
        count
    }
}

/// Time at which the mover reaches the cursor's current entry.
fn event_time(index: &InvertedIndex, velocity: f32, cursor: &Cursor) -> Option<f32> {
    if cursor.is_done() {
        return None;
    }
    let offset = index.attribute_index(cursor.handle).offset();
    Some(((offset - cursor.start) / velocity).max(0.0))
}

/// Build a context for `aabb` and a query sweeping it along `axis`.
///
/// The sign of `velocity` picks a [`Forward`](Direction::Forward) or
/// [`Backward`](Direction::Backward) sweep; zero yields a
/// [`Static`](Direction::Static) query. Static contacts go to `out` when given,
/// otherwise they are returned by the first
/// [`get_collisions`](CollisionQuery::get_collisions) call.
///
/// # Panics
///
/// Panics if `velocity` is NaN.
pub fn get_1d_query<'a>(
    context_id: u32,
    aabb: Aabb3D,
    dtime: f32,
    axis: Axis,
    velocity: f32,
    index: &'a InvertedIndex,
    out: Option<&mut Vec<Collision>>,
) -> CollisionQuery<'a> {
    assert!(!velocity.is_nan(), "collision query velocity must not be NaN");
    let context = CollisionQueryContext::new(context_id, aabb, index, out);
    if velocity > 0.0 {
        CollisionQuery::forward(context, axis, velocity, dtime)
    } else if velocity < 0.0 {
        CollisionQuery::backward(context, axis, velocity, dtime)
    } else {
        CollisionQuery::stationary(context, axis, dtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_inverted_index::{Face, FaceMask};

    fn unit() -> Aabb3D {
        Aabb3D::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    }

    fn one_box(aabb: Aabb3D) -> InvertedIndex {
        let mut idx = InvertedIndex::new();
        idx.index(aabb);
        idx
    }

    #[test]
    fn forward_entry_at_contact_time() {
        let idx = one_box(Aabb3D::new(3.0, 0.0, 0.0, 4.0, 1.0, 1.0));
        let mut q = get_1d_query(1, unit(), 2.0, Axis::X, 2.0, &idx, None);
        assert_eq!(q.direction(), Direction::Forward);
        assert_eq!(q.next_event_time(), Some(1.0));

        let mut out = Vec::new();
        assert_eq!(q.get_collisions(0.5, &mut out), 0);
        assert_eq!(q.dtime(), 0.5);
        assert_eq!(q.get_collisions(1.0, &mut out), 1);
        assert_eq!(out[0].kind, CollisionType::Entry);
        assert_eq!(out[0].face, Face::MaxX);
        assert_eq!(out[0].dtime, 1.0);
        assert_eq!(out[0].overlap, 0.0);
        assert_eq!(q.context().aabb().max_x, 3.0);

        // Same limit again: nothing new.
        assert_eq!(q.get_collisions(1.0, &mut out), 0);
        // The back face would reach the far side exactly at the end: not an exit.
        assert_eq!(q.get_collisions(2.0, &mut out), 0);
        assert!(q.is_finished());
        assert_eq!(q.dtime(), q.endtime());
    }

    #[test]
    fn forward_entry_then_exit() {
        let idx = one_box(Aabb3D::new(3.0, 0.0, 0.0, 4.0, 1.0, 1.0));
        let mut q = get_1d_query(1, unit(), 2.0, Axis::X, 4.0, &idx, None);
        let mut out = Vec::new();
        assert_eq!(q.get_collisions(2.0, &mut out), 2);
        assert_eq!(out[0].kind, CollisionType::Entry);
        assert_eq!(out[0].dtime, 0.5);
        assert_eq!(out[1].kind, CollisionType::Exit);
        assert_eq!(out[1].face, Face::MinX);
        assert_eq!(out[1].dtime, 1.0);
        assert_eq!(out[1].overlap, 0.0);

        // The box stays tracked on Y and Z only.
        let (mask, _) = q.context().valid_faces(out[0].id).unwrap();
        assert!(!mask.intersects(FaceMask::X));
    }

    #[test]
    fn backward_mirrors_forward() {
        let idx = one_box(Aabb3D::new(-4.0, 0.0, 0.0, -3.0, 1.0, 1.0));
        let mut q = get_1d_query(2, unit(), 2.0, Axis::X, -4.0, &idx, None);
        assert_eq!(q.direction(), Direction::Backward);

        let mut out = Vec::new();
        assert_eq!(q.get_collisions(1.0, &mut out), 1);
        assert_eq!(out[0].kind, CollisionType::Entry);
        assert_eq!(out[0].face, Face::MinX);
        assert_eq!(out[0].dtime, 0.75);
        assert_eq!(q.get_collisions(2.0, &mut out), 1);
        assert_eq!(out[1].kind, CollisionType::Exit);
        assert_eq!(out[1].face, Face::MaxX);
        assert_eq!(out[1].dtime, 1.25);
        assert!(q.is_finished());
    }

    #[test]
    fn landing_on_the_floor() {
        let mut idx = InvertedIndex::new();
        let floor = idx.index(Aabb3D::new(-10.0, -1.0, -10.0, 10.0, 0.0, 10.0));
        idx.index(Aabb3D::new(5.0, 0.0, 5.0, 6.0, 1.0, 6.0));
        let player = Aabb3D::new(0.0, 5.0, 0.0, 1.0, 7.0, 1.0);

        let mut q = get_1d_query(9, player, 1.0, Axis::Y, -10.0, &idx, None);
        let mut out = Vec::new();
        // The crate's top is passed at 0.4, but it is off to the side.
        assert_eq!(q.get_collisions(0.6, &mut out), 1);
        assert_eq!(out[0].id, floor);
        assert_eq!(out[0].kind, CollisionType::Entry);
        assert_eq!(out[0].face, Face::MinY);
        assert_eq!(out[0].dtime, 0.5);
        assert_eq!(out[0].context_id, 9);

        // Left unchecked, the player falls through and out the bottom.
        assert_eq!(q.get_collisions(1.0, &mut out), 1);
        assert_eq!(out[1].kind, CollisionType::Exit);
        assert_eq!(out[1].face, Face::MaxY);
        assert_eq!(out[1].dtime, 0.8);
    }

    #[test]
    fn zero_velocity_reports_statics_once() {
        let idx = one_box(Aabb3D::new(1.0, 1.0, -1.0, 2.0, 2.0, 0.0));
        let mut q = get_1d_query(5, unit(), 1.0, Axis::Z, 0.0, &idx, None);
        assert_eq!(q.direction(), Direction::Static);
        assert!(!q.is_finished());

        let mut out = Vec::new();
        assert_eq!(q.get_collisions(0.0, &mut out), 3);
        assert_eq!(q.get_collisions(0.0, &mut out), 0);
        assert_eq!(q.get_collisions(1.0, &mut out), 0);
        assert!(out.iter().all(|c| c.kind == CollisionType::Static && c.dtime == 0.0));
        assert!(q.is_finished());
    }

    #[test]
    fn statics_to_output_are_not_repeated() {
        let idx = one_box(Aabb3D::new(1.0, 1.0, -1.0, 2.0, 2.0, 0.0));
        let mut out = Vec::new();
        let mut q = get_1d_query(5, unit(), 1.0, Axis::X, 1.0, &idx, Some(&mut out));
        assert_eq!(out.len(), 3);
        // Moving away on X: the box is left behind right away.
        let n = q.get_collisions(1.0, &mut out);
        assert_eq!(n, 0, "box only touched on MaxX, which is not the trailing face");
    }

    #[test]
    fn leaving_a_resting_contact_exits_at_zero() {
        let idx = one_box(Aabb3D::new(-1.0, -1.0, 0.0, 2.0, 0.0, 1.0));
        let mut out = Vec::new();
        let mut q = get_1d_query(0, unit(), 1.0, Axis::Y, 3.0, &idx, Some(&mut out));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, CollisionType::Static);
        assert_eq!(out[0].face, Face::MinY);

        assert_eq!(q.get_collisions(1.0, &mut out), 1);
        assert_eq!(out[1].kind, CollisionType::Exit);
        assert_eq!(out[1].face, Face::MinY);
        assert_eq!(out[1].dtime, 0.0);
        // Forgotten on Y; still tracked on the other axes.
        let (mask, _) = q.context().valid_faces(out[0].id).unwrap();
        assert!(!mask.intersects(FaceMask::Y));
    }

    #[test]
    fn stepped_limits_match_one_call() {
        let mut idx = InvertedIndex::new();
        for i in 0..6_u8 {
            let x = 2.0 + 1.5 * f32::from(i);
            idx.index(Aabb3D::new(x, 0.0, 0.0, x + 1.0, 1.0, 1.0));
        }
        let mut all = Vec::new();
        get_1d_query(0, unit(), 1.0, Axis::X, 8.0, &idx, None).get_collisions(1.0, &mut all);

        let mut stepped = Vec::new();
        let mut q = get_1d_query(0, unit(), 1.0, Axis::X, 8.0, &idx, None);
        for step in 1..=8_u8 {
            q.get_collisions(f32::from(step) / 8.0, &mut stepped);
        }
        assert_eq!(stepped, all);
        assert!(!all.is_empty());
        assert!(all.windows(2).all(|w| w[0].dtime <= w[1].dtime));
    }

    #[test]
    #[should_panic(expected = "positive velocity")]
    fn forward_rejects_negative_velocity() {
        let idx = InvertedIndex::new();
        let ctx = CollisionQueryContext::new(0, unit(), &idx, None);
        let _ = CollisionQuery::forward(ctx, Axis::X, -1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "must not be NaN")]
    fn nan_velocity_is_rejected() {
        let idx = one_box(Aabb3D::new(1.0, 1.0, -1.0, 2.0, 2.0, 0.0));
        let _ = get_1d_query(0, unit(), 1.0, Axis::X, f32::NAN, &idx, None);
    }

    #[test]
    fn into_context_keeps_candidates() {
        let idx = one_box(Aabb3D::new(0.0, 3.0, 0.0, 1.0, 4.0, 1.0));
        let q = get_1d_query(0, unit(), 1.0, Axis::Y, 1.0, &idx, None);
        let ctx = q.into_context();
        assert_eq!(ctx.candidate_count(), 1);
        assert_eq!(ctx.context_id(), 0);
    }
}
