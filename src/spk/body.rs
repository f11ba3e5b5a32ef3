//! Per-body bookkeeping for the segment registry.

use std::cell::Cell;
use std::hash::{Hash, Hasher};

use crate::constants::BodyId;

/// A body known to the registry, with its reuse-expense counter.
///
/// Equality and hash are defined by the body id **alone**: the expense
/// counter is a cache-priority signal mutated on every lookup, and excluding
/// it keeps the value usable as a map key while it changes. The counter sits
/// behind a [`Cell`] so the registry can update it through the shared key
/// reference a map lookup yields.
#[derive(Debug, Clone)]
pub struct SpkBody {
    id: BodyId,
    expense: Cell<i32>,
}

impl SpkBody {
    /// A body starts with zero accumulated expense.
    pub fn new(id: BodyId) -> Self {
        SpkBody {
            id,
            expense: Cell::new(0),
        }
    }

    pub fn with_expense(id: BodyId, expense: i32) -> Self {
        SpkBody {
            id,
            expense: Cell::new(expense),
        }
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn expense(&self) -> i32 {
        self.expense.get()
    }

    pub(crate) fn set_expense(&self, expense: i32) {
        self.expense.set(expense);
    }
}

impl PartialEq for SpkBody {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SpkBody {}

impl Hash for SpkBody {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod test_body {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(body: &SpkBody) -> u64 {
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_excludes_expense() {
        let fresh = SpkBody::new(399);
        let queried = SpkBody::with_expense(399, 12);

        assert_eq!(fresh, queried);
        assert_eq!(hash_of(&fresh), hash_of(&queried));

        assert_ne!(fresh, SpkBody::new(301));
    }

    #[test]
    fn test_expense_mutation_through_shared_ref() {
        let body = SpkBody::new(399);
        let shared: &SpkBody = &body;
        shared.set_expense(3);
        assert_eq!(body.expense(), 3);
        // Still the same key.
        assert_eq!(body, SpkBody::new(399));
    }
}
