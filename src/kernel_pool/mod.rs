//! Named-variable store for kernel-supplied data ("the kernel pool").
//!
//! The pool maps variable names to numeric or textual values, the way SPICE
//! text kernels populate them. Two mechanisms make it useful for cache
//! invalidation:
//!
//! * every `set` bumps a per-name **update counter**;
//! * a [`Watcher`] holds the counter value it saw last, and
//!   [`KernelPool::has_changed`] compares and advances that bookmark.
//!
//! This is a minimal observer pattern without callbacks: no subscriber
//! lifetimes, no reentrancy. The frame catalog uses it to drop composed
//! rotations when a kernel-supplied frame definition is reloaded.
//!
//! Pools are explicit, injectable store objects — one per loaded kernel set —
//! rather than a hidden process singleton, so tests run in isolation without
//! a `clear()` ritual. All mutation goes through `set`/`append`/`clear`; a
//! multi-threaded caller serializes those behind a single mutex.

pub mod text_kernel;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use ahash::RandomState;
use itertools::Itertools;

use crate::errors::SpiceError;

/// Declared data kind of a pool variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Numeric,
    Text,
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::Numeric => write!(f, "Numeric"),
            DataKind::Text => write!(f, "Text"),
        }
    }
}

/// Value of a pool variable. Scalars are one-element vectors, matching the
/// text-kernel data model.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolValue {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl PoolValue {
    pub fn kind(&self) -> DataKind {
        match self {
            PoolValue::Numeric(_) => DataKind::Numeric,
            PoolValue::Text(_) => DataKind::Text,
        }
    }
}

/// Listing record of one pool variable: its name and declared kind.
///
/// Equality is structural over the **ordered pair** — a `(name, kind)` entry
/// never equals a `(kind, name)` one, which makes a swapped-argument
/// construction detectable instead of silently aliasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolEntry {
    pub name: String,
    pub kind: DataKind,
}

impl PoolEntry {
    pub fn new(name: impl Into<String>, kind: DataKind) -> Result<Self, SpiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "pool entry name must not be empty".into(),
            ));
        }
        Ok(PoolEntry { name, kind })
    }
}

/// A subscriber tracking whether one pool variable has changed since it last
/// checked. Identity, equality and hash are defined by the watched name
/// alone; the bookmark is bookkeeping, not identity.
#[derive(Debug, Clone)]
pub struct Watcher {
    name: String,
    last_seen: u64,
}

impl Watcher {
    pub fn new(name: impl Into<String>) -> Result<Self, SpiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "watcher name must not be empty".into(),
            ));
        }
        Ok(Watcher { name, last_seen: 0 })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Watcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Watcher {}

impl Hash for Watcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Debug, Clone)]
struct PoolVariable {
    value: PoolValue,
    version: u64,
}

/// The kernel pool itself.
#[derive(Debug, Clone, Default)]
pub struct KernelPool {
    variables: HashMap<String, PoolVariable, RandomState>,
}

impl KernelPool {
    pub fn new() -> Self {
        KernelPool::default()
    }

    /// Upsert a variable and bump its update counter.
    pub fn set(&mut self, name: &str, value: PoolValue) -> Result<(), SpiceError> {
        if name.is_empty() {
            return Err(SpiceError::InvalidArgument(
                "pool variable name must not be empty".into(),
            ));
        }
        let version = self.variables.get(name).map_or(0, |v| v.version) + 1;
        self.variables
            .insert(name.to_string(), PoolVariable { value, version });
        Ok(())
    }

    /// Extend a variable in place (the text-kernel `+=` operator). Creates
    /// the variable when absent; mixing kinds is an `InvalidArgument`.
    pub fn append(&mut self, name: &str, value: PoolValue) -> Result<(), SpiceError> {
        let merged = match self.variables.get(name).map(|v| &v.value) {
            None => value,
            Some(PoolValue::Numeric(existing)) => match value {
                PoolValue::Numeric(more) => {
                    let mut merged = existing.clone();
                    merged.extend(more);
                    PoolValue::Numeric(merged)
                }
                PoolValue::Text(_) => {
                    return Err(SpiceError::InvalidArgument(format!(
                        "cannot append text values to numeric variable {name}"
                    )))
                }
            },
            Some(PoolValue::Text(existing)) => match value {
                PoolValue::Text(more) => {
                    let mut merged = existing.clone();
                    merged.extend(more);
                    PoolValue::Text(merged)
                }
                PoolValue::Numeric(_) => {
                    return Err(SpiceError::InvalidArgument(format!(
                        "cannot append numeric values to text variable {name}"
                    )))
                }
            },
        };
        self.set(name, merged)
    }

    pub fn get(&self, name: &str) -> Option<&PoolValue> {
        self.variables.get(name).map(|v| &v.value)
    }

    pub fn get_numeric(&self, name: &str) -> Option<&[f64]> {
        match self.get(name)? {
            PoolValue::Numeric(values) => Some(values),
            PoolValue::Text(_) => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&[String]> {
        match self.get(name)? {
            PoolValue::Text(values) => Some(values),
            PoolValue::Numeric(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Register a watcher for `name`, bookmarked at the current counter so
    /// only *subsequent* changes report as stale.
    pub fn watch(&self, name: &str) -> Result<Watcher, SpiceError> {
        let mut watcher = Watcher::new(name)?;
        watcher.last_seen = self.variables.get(name).map_or(0, |v| v.version);
        Ok(watcher)
    }

    /// Compare a watcher's bookmark against the variable's current counter.
    ///
    /// Returns `true` and advances the bookmark when they differ, so a
    /// change reports stale exactly once.
    pub fn has_changed(&self, watcher: &mut Watcher) -> bool {
        let current = self.variables.get(&watcher.name).map_or(0, |v| v.version);
        if current != watcher.last_seen {
            watcher.last_seen = current;
            true
        } else {
            false
        }
    }

    /// Enumerate the pool as `(name, kind)` listing records, sorted by name.
    pub fn entries(&self) -> Vec<PoolEntry> {
        self.variables
            .iter()
            .map(|(name, variable)| PoolEntry {
                name: name.clone(),
                kind: variable.value.kind(),
            })
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Remove every variable and its update counter. Watchers created before
    /// the clear report one final change on their next check.
    pub fn clear(&mut self) {
        self.variables.clear();
    }

    /// Load text-kernel assignments into the pool.
    ///
    /// Return
    /// ----------
    /// * The number of assignments applied, or a parse/kind error.
    pub fn load_text(&mut self, text: &str) -> Result<usize, SpiceError> {
        let assignments = text_kernel::parse_assignments(text)?;
        let count = assignments.len();
        for assignment in assignments {
            match assignment.op {
                text_kernel::AssignOp::Set => self.set(&assignment.name, assignment.value)?,
                text_kernel::AssignOp::Append => {
                    self.append(&assignment.name, assignment.value)?
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod test_kernel_pool {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_entry_order_sensitivity() {
        // (name, kind) with the fields conceptually swapped never compare equal.
        let named_numeric = PoolEntry::new("GM_SUN", DataKind::Numeric).unwrap();
        let named_text = PoolEntry::new("GM_SUN", DataKind::Text).unwrap();
        let other = PoolEntry::new("GM_EARTH", DataKind::Numeric).unwrap();

        assert_ne!(named_numeric, named_text);
        assert_ne!(named_numeric, other);
        assert_eq!(
            named_numeric,
            PoolEntry::new("GM_SUN", DataKind::Numeric).unwrap()
        );
    }

    #[test]
    fn test_entry_validation() {
        assert!(matches!(
            PoolEntry::new("", DataKind::Numeric),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_watcher_identity_by_name() {
        let mut pool = KernelPool::new();
        pool.set("X", PoolValue::Numeric(vec![1.0])).unwrap();

        let a = pool.watch("X").unwrap();
        pool.set("X", PoolValue::Numeric(vec![2.0])).unwrap();
        let b = pool.watch("X").unwrap();

        // Different bookmarks, same identity.
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        assert!(matches!(
            Watcher::new(""),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_watcher_staleness_reports_once() {
        let mut pool = KernelPool::new();
        pool.set("X", PoolValue::Numeric(vec![1.0])).unwrap();

        let mut watcher = pool.watch("X").unwrap();
        assert!(!pool.has_changed(&mut watcher));

        pool.set("X", PoolValue::Numeric(vec![2.0])).unwrap();
        assert!(pool.has_changed(&mut watcher));
        assert!(!pool.has_changed(&mut watcher));
        assert!(!pool.has_changed(&mut watcher));

        pool.set("X", PoolValue::Numeric(vec![3.0])).unwrap();
        assert!(pool.has_changed(&mut watcher));
        assert!(!pool.has_changed(&mut watcher));
    }

    #[test]
    fn test_get_and_kind_accessors() {
        let mut pool = KernelPool::new();
        pool.set("BODY399_RADII", PoolValue::Numeric(vec![6378.1, 6378.1, 6356.8]))
            .unwrap();
        pool.set(
            "FRAME_1500001_NAME",
            PoolValue::Text(vec!["ROVER".to_string()]),
        )
        .unwrap();

        assert_eq!(
            pool.get_numeric("BODY399_RADII").unwrap(),
            &[6378.1, 6378.1, 6356.8]
        );
        assert_eq!(
            pool.get_text("FRAME_1500001_NAME").unwrap(),
            &["ROVER".to_string()]
        );
        // Kind mismatch is a miss, not an error.
        assert!(pool.get_text("BODY399_RADII").is_none());
        assert!(pool.get_numeric("MISSING").is_none());

        let entries = pool.entries();
        assert_eq!(
            entries,
            vec![
                PoolEntry::new("BODY399_RADII", DataKind::Numeric).unwrap(),
                PoolEntry::new("FRAME_1500001_NAME", DataKind::Text).unwrap(),
            ]
        );
    }

    #[test]
    fn test_append_mixed_kind_rejected() {
        let mut pool = KernelPool::new();
        pool.set("IDS", PoolValue::Numeric(vec![399.0])).unwrap();
        pool.append("IDS", PoolValue::Numeric(vec![301.0])).unwrap();
        assert_eq!(pool.get_numeric("IDS").unwrap(), &[399.0, 301.0]);

        assert!(matches!(
            pool.append("IDS", PoolValue::Text(vec!["EARTH".into()])),
            Err(SpiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_clear_isolates() {
        let mut pool = KernelPool::new();
        pool.set("X", PoolValue::Numeric(vec![1.0])).unwrap();
        let mut watcher = pool.watch("X").unwrap();

        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.get("X").is_none());
        // The removed variable reads as version 0 again: one last change.
        assert!(pool.has_changed(&mut watcher));
        assert!(!pool.has_changed(&mut watcher));
    }
}
