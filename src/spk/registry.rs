//! Body → segment registry with a reuse-expense heuristic.
//!
//! The registry maps a body id to the ordered list of segments discovered
//! for it, in registration order. Two access patterns matter:
//!
//! * **Sequential time-stepped queries** hit the same body over and over.
//!   Every [`SpkRegistry::segments_for`] call updates the body's
//!   reuse-expense counter: a repeat of the immediately preceding body
//!   increments it, a body switch applies the configured
//!   [`ExpensePolicy`] to the newly queried body's prior value. An outer
//!   cache (e.g. an LRU keyed by body id) can use the counter as a priority
//!   signal for which segment list to keep resident; the registry itself
//!   never evicts.
//! * **Overlapping coverage**: when several segments cover the same epoch,
//!   the last-registered one wins, matching "later kernel overrides earlier
//!   kernel" precedence. [`SpkRegistry::find_covering_segment`] therefore
//!   scans the list back to front.
//!
//! Unknown bodies and uncovered epochs are `None`, never errors.

use std::collections::HashMap;

use ahash::RandomState;
use smallvec::SmallVec;

use crate::constants::{BodyId, EtSeconds};
use crate::daf::DafFile;
use crate::errors::SpiceError;
use crate::spk::body::SpkBody;
use crate::spk::segment::{SegmentDescriptor, SpkSegment};

type SegmentList = SmallVec<[SpkSegment; 4]>;

/// Decay/reset rule applied to a body's reuse-expense counter.
///
/// The exact rule is policy, not format: callers with unusual access
/// patterns supply their own implementation.
pub trait ExpensePolicy {
    /// New counter value when the same body is queried twice in a row.
    fn on_repeat(&self, expense: i32) -> i32 {
        expense.saturating_add(1)
    }

    /// New counter value for a body that was not the previous query target,
    /// given its prior value.
    fn on_switch(&self, expense: i32) -> i32;
}

/// Default policy: repeats add one, a body switch halves the accumulated
/// expense, so recently hot bodies decay instead of dropping to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalvingExpensePolicy;

impl ExpensePolicy for HalvingExpensePolicy {
    fn on_switch(&self, expense: i32) -> i32 {
        expense / 2
    }
}

/// Registry of every SPK segment discovered for each body.
#[derive(Debug, Default)]
pub struct SpkRegistry<P: ExpensePolicy = HalvingExpensePolicy> {
    bodies: HashMap<SpkBody, SegmentList, RandomState>,
    last_queried: Option<BodyId>,
    policy: P,
}

impl SpkRegistry<HalvingExpensePolicy> {
    pub fn new() -> Self {
        SpkRegistry::default()
    }
}

impl<P: ExpensePolicy> SpkRegistry<P> {
    pub fn with_policy(policy: P) -> Self {
        SpkRegistry {
            bodies: HashMap::default(),
            last_queried: None,
            policy,
        }
    }

    /// Append `segment` to the body's list, creating the body entry (with a
    /// zeroed expense counter) on first encounter.
    pub fn register_segment(&mut self, body_id: BodyId, segment: SpkSegment) {
        self.bodies
            .entry(SpkBody::new(body_id))
            .or_default()
            .push(segment);
    }

    /// The body's segment list, in registration order.
    ///
    /// Updates the reuse-expense counter on every hit: an increment when
    /// `body_id` repeats the immediately preceding lookup, otherwise the
    /// policy's switch rule applied to the body's prior value. Unknown
    /// bodies are `None` and leave all counters untouched.
    pub fn segments_for(&mut self, body_id: BodyId) -> Option<&[SpkSegment]> {
        let (body, segments) = self.bodies.get_key_value(&SpkBody::new(body_id))?;

        let expense = body.expense();
        if self.last_queried == Some(body_id) {
            body.set_expense(self.policy.on_repeat(expense));
        } else {
            body.set_expense(self.policy.on_switch(expense));
        }
        self.last_queried = Some(body_id);

        Some(segments)
    }

    /// The segment covering `et` for `body_id`; on overlapping coverage the
    /// last-registered segment wins.
    pub fn find_covering_segment(
        &mut self,
        body_id: BodyId,
        et: EtSeconds,
    ) -> Option<&SpkSegment> {
        self.segments_for(body_id)?
            .iter()
            .rev()
            .find(|segment| segment.covers(et))
    }

    /// Current reuse-expense counter of a body, without updating it.
    pub fn expense_of(&self, body_id: BodyId) -> Option<i32> {
        self.bodies
            .get_key_value(&SpkBody::new(body_id))
            .map(|(body, _)| body.expense())
    }

    /// Bodies known to the registry, in no particular order.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().map(|body| body.id())
    }

    pub fn segment_count(&self) -> usize {
        self.bodies.values().map(|segments| segments.len()).sum()
    }

    /// Scan an open SPK file's summary directory and register every segment
    /// under `source` (typically the kernel's file name).
    ///
    /// Return
    /// ----------
    /// * The number of segments registered.
    pub fn scan_file(&mut self, daf: &mut DafFile, source: &str) -> Result<usize, SpiceError> {
        let endianness = daf.endianness();
        let handle = daf.handle();
        let blocks = daf.summary_blocks()?;

        let count = blocks.len();
        for block in &blocks {
            let (_, descriptor) = SegmentDescriptor::parse(block, endianness)?;
            let segment = SpkSegment::new(handle, descriptor, source)?;
            self.register_segment(descriptor.target(), segment);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod test_registry {
    use super::*;

    fn segment(
        start: f64,
        end: f64,
        body: BodyId,
        handle: i32,
        source: &str,
    ) -> SpkSegment {
        let descriptor = SegmentDescriptor::pack(start, end, body, 0, 1, 2, 257, 268);
        SpkSegment::new(handle, descriptor, source).unwrap()
    }

    #[test]
    fn test_unknown_body_is_a_miss() {
        let mut registry = SpkRegistry::new();
        assert!(registry.segments_for(399).is_none());
        assert!(registry.find_covering_segment(399, 0.0).is_none());
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = SpkRegistry::new();
        let a = segment(0.0, 10.0, 399, 1, "a.bsp");
        let b = segment(10.0, 20.0, 399, 2, "b.bsp");
        registry.register_segment(399, a.clone());
        registry.register_segment(399, b.clone());

        let segments = registry.segments_for(399).unwrap();
        assert_eq!(segments, &[a, b][..]);
    }

    #[test]
    fn test_last_registered_wins_on_overlap() {
        // Body 399: [t0, t1) from kernel A, [t1, t2) from kernel B, then an
        // overlapping [t0, t2] from kernel C registered last.
        let (t0, t1, t2) = (0.0, 100.0, 200.0);
        let mut registry = SpkRegistry::new();
        registry.register_segment(399, segment(t0, t1, 399, 1, "a.bsp"));
        registry.register_segment(399, segment(t1, t2, 399, 2, "b.bsp"));
        let c = segment(t0, t2, 399, 3, "c.bsp");
        registry.register_segment(399, c.clone());

        let found = registry
            .find_covering_segment(399, (t0 + t1) / 2.0)
            .unwrap();
        assert_eq!(found, &c);

        // Outside every segment: a miss, not an error.
        assert!(registry.find_covering_segment(399, t2 + 1.0).is_none());
    }

    #[test]
    fn test_expense_rewards_temporal_locality() {
        let mut registry = SpkRegistry::new();
        registry.register_segment(399, segment(0.0, 10.0, 399, 1, "a.bsp"));
        registry.register_segment(301, segment(0.0, 10.0, 301, 1, "a.bsp"));

        assert_eq!(registry.expense_of(399), Some(0));

        // First query is a switch from "nothing": 0 / 2 == 0.
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(0));

        // Repeats increment.
        registry.segments_for(399).unwrap();
        registry.segments_for(399).unwrap();
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(3));

        // Switching away applies the policy to the new body only.
        registry.segments_for(301).unwrap();
        assert_eq!(registry.expense_of(301), Some(0));
        assert_eq!(registry.expense_of(399), Some(3));

        // Coming back halves the accumulated expense of 399.
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(1));
    }

    #[test]
    fn test_custom_expense_policy() {
        struct ResetPolicy;
        impl ExpensePolicy for ResetPolicy {
            fn on_switch(&self, _expense: i32) -> i32 {
                0
            }
        }

        let mut registry = SpkRegistry::with_policy(ResetPolicy);
        registry.register_segment(399, segment(0.0, 10.0, 399, 1, "a.bsp"));
        registry.register_segment(301, segment(0.0, 10.0, 301, 1, "a.bsp"));

        registry.segments_for(399).unwrap();
        registry.segments_for(399).unwrap();
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(2));

        registry.segments_for(301).unwrap();
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(0));
    }

    #[test]
    fn test_miss_does_not_disturb_locality() {
        let mut registry = SpkRegistry::new();
        registry.register_segment(399, segment(0.0, 10.0, 399, 1, "a.bsp"));

        registry.segments_for(399).unwrap();
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(1));

        // A miss for an unknown body leaves the streak intact.
        assert!(registry.segments_for(12345).is_none());
        registry.segments_for(399).unwrap();
        assert_eq!(registry.expense_of(399), Some(2));
    }
}
