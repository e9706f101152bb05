//! Tool option bundles with live two-way linking.
//!
//! A [`ToolOptions`] value is a shared handle to a small name → value map.
//! Cloning the handle does not copy the settings: every clone observes the same
//! bundle.  Use [`ToolOptions::duplicate`] for an independent copy.
//!
//! # Linking (for beginners)
//!
//! Two bundles can be *connected*.  From then on, setting a value on either one
//! writes the same value into the other, in both directions, until they are
//! disconnected again.  This is how a device preset follows every edit the user
//! makes to the active tool while that device is current.
//!
//! ```text
//!  tool options  ◄──── connect ────►  device preset options
//!     set("size", 12)   ─────────►      size = 12
//!     size = 3          ◄─────────   set("size", 3)
//! ```
//!
//! A set reaches every bundle in the linked group, each one exactly once, so
//! chains converge and cycles terminate.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

/// A single tool setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Equality used to stop propagation.  Floats compare by bit pattern so a
    /// NaN value does not bounce between linked bundles forever.
    fn is_same(&self, other: &OptionValue) -> bool {
        match (self, other) {
            (OptionValue::Float(a), OptionValue::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Default)]
struct OptionsInner {
    values: BTreeMap<String, OptionValue>,
    links: Vec<Weak<RefCell<OptionsInner>>>,
}

/// Shared, linkable settings bundle.
#[derive(Clone, Default)]
pub struct ToolOptions {
    inner: Rc<RefCell<OptionsInner>>,
}

impl ToolOptions {
    /// Creates an empty, unlinked bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unlinked bundle holding `values`.
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: Into<String>,
    {
        let options = Self::new();
        options.inner.borrow_mut().values =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        options
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<OptionValue> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Returns a snapshot of every value in the bundle.
    pub fn values(&self) -> BTreeMap<String, OptionValue> {
        self.inner.borrow().values.clone()
    }

    /// Stores `value` under `key` in this bundle and in every bundle
    /// reachable through links.
    ///
    /// Setting a value the bundle already holds is a no-op and does not
    /// propagate.
    pub fn set(&self, key: &str, value: OptionValue) {
        if self
            .inner
            .borrow()
            .values
            .get(key)
            .is_some_and(|old| old.is_same(&value))
        {
            return;
        }

        let mut visited: Vec<Rc<RefCell<OptionsInner>>> = Vec::new();
        let mut pending = vec![Rc::clone(&self.inner)];
        while let Some(bundle) = pending.pop() {
            if visited.iter().any(|seen| Rc::ptr_eq(seen, &bundle)) {
                continue;
            }
            {
                let mut inner = bundle.borrow_mut();
                inner.values.insert(key.to_owned(), value.clone());
                inner.links.retain(|link| link.strong_count() > 0);
                pending.extend(inner.links.iter().filter_map(Weak::upgrade));
            }
            visited.push(bundle);
        }
    }

    /// Copies every value of `source` into this bundle through [`set`](Self::set),
    /// so links on this bundle see the new values.
    pub fn sync_from(&self, source: &ToolOptions) {
        if self.ptr_eq(source) {
            return;
        }
        for (key, value) in source.values() {
            self.set(&key, value);
        }
    }

    /// Returns an independent, unlinked copy of this bundle.
    pub fn duplicate(&self) -> ToolOptions {
        Self::from_values(self.values())
    }

    /// Links this bundle and `other` in both directions.
    ///
    /// Values are not copied at connect time; only later edits propagate.
    /// Connecting an already linked pair, or a bundle to itself, does nothing.
    pub fn connect(&self, other: &ToolOptions) {
        if self.ptr_eq(other) || self.is_connected(other) {
            return;
        }
        self.inner
            .borrow_mut()
            .links
            .push(Rc::downgrade(&other.inner));
        other
            .inner
            .borrow_mut()
            .links
            .push(Rc::downgrade(&self.inner));
    }

    /// Removes the link between this bundle and `other`, if there is one.
    pub fn disconnect(&self, other: &ToolOptions) {
        if self.ptr_eq(other) {
            return;
        }
        let other_ptr = Rc::as_ptr(&other.inner);
        let self_ptr = Rc::as_ptr(&self.inner);
        self.inner
            .borrow_mut()
            .links
            .retain(|link| link.as_ptr() != other_ptr);
        other
            .inner
            .borrow_mut()
            .links
            .retain(|link| link.as_ptr() != self_ptr);
    }

    /// Returns `true` if this bundle is linked to `other`.
    pub fn is_connected(&self, other: &ToolOptions) -> bool {
        let other_ptr = Rc::as_ptr(&other.inner);
        self.inner
            .borrow()
            .links
            .iter()
            .any(|link| link.as_ptr() == other_ptr && link.strong_count() > 0)
    }

    /// Number of live bundles linked to this one.
    pub fn link_count(&self) -> usize {
        self.inner
            .borrow()
            .links
            .iter()
            .filter(|link| link.strong_count() > 0)
            .count()
    }

    /// Returns `true` if both handles refer to the same bundle.
    pub fn ptr_eq(&self, other: &ToolOptions) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ToolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ToolOptions")
            .field("values", &inner.values)
            .field("links", &inner.links.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush() -> ToolOptions {
        ToolOptions::from_values([
            ("size", OptionValue::Int(10)),
            ("opacity", OptionValue::Float(1.0)),
        ])
    }

    #[test]
    fn test_clone_shares_the_same_bundle() {
        let a = brush();
        let b = a.clone();
        b.set("size", OptionValue::Int(3));
        assert_eq!(a.get("size"), Some(OptionValue::Int(3)));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_duplicate_is_independent() {
        let a = brush();
        let copy = a.duplicate();
        copy.set("size", OptionValue::Int(99));
        assert_eq!(a.get("size"), Some(OptionValue::Int(10)));
        assert!(!a.ptr_eq(&copy));
        assert_eq!(copy.link_count(), 0);
    }

    #[test]
    fn test_connect_propagates_in_both_directions() {
        // Arrange
        let tool = brush();
        let preset = brush();
        tool.connect(&preset);

        // Act / Assert
        tool.set("size", OptionValue::Int(20));
        assert_eq!(preset.get("size"), Some(OptionValue::Int(20)));

        preset.set("opacity", OptionValue::Float(0.5));
        assert_eq!(tool.get("opacity"), Some(OptionValue::Float(0.5)));
    }

    #[test]
    fn test_connect_does_not_copy_existing_values() {
        let tool = brush();
        let preset = ToolOptions::from_values([("size", OptionValue::Int(1))]);
        tool.connect(&preset);
        assert_eq!(tool.get("size"), Some(OptionValue::Int(10)));
        assert_eq!(preset.get("size"), Some(OptionValue::Int(1)));
    }

    #[test]
    fn test_disconnect_stops_propagation() {
        let tool = brush();
        let preset = brush();
        tool.connect(&preset);
        preset.disconnect(&tool);

        tool.set("size", OptionValue::Int(42));

        assert_eq!(preset.get("size"), Some(OptionValue::Int(10)));
        assert!(!tool.is_connected(&preset));
        assert!(!preset.is_connected(&tool));
    }

    #[test]
    fn test_disconnect_unlinked_pair_is_noop() {
        let a = brush();
        let b = brush();
        a.disconnect(&b);
        assert_eq!(a.link_count(), 0);
        assert_eq!(b.link_count(), 0);
    }

    #[test]
    fn test_connect_twice_keeps_single_link() {
        let a = brush();
        let b = brush();
        a.connect(&b);
        b.connect(&a);
        assert_eq!(a.link_count(), 1);
        assert_eq!(b.link_count(), 1);
    }

    #[test]
    fn test_connect_to_self_is_ignored() {
        let a = brush();
        a.connect(&a.clone());
        assert_eq!(a.link_count(), 0);
    }

    #[test]
    fn test_cycle_of_three_terminates() {
        let a = brush();
        let b = brush();
        let c = brush();
        a.connect(&b);
        b.connect(&c);
        c.connect(&a);

        b.set("size", OptionValue::Int(7));

        for bundle in [&a, &b, &c] {
            assert_eq!(bundle.get("size"), Some(OptionValue::Int(7)));
        }
    }

    #[test]
    fn test_chain_converges_past_a_bundle_already_holding_the_value() {
        // Arrange – the middle bundle already holds the new value
        let a = ToolOptions::from_values([("size", OptionValue::Int(1))]);
        let b = ToolOptions::from_values([("size", OptionValue::Int(5))]);
        let c = ToolOptions::from_values([("size", OptionValue::Int(1))]);
        a.connect(&b);
        b.connect(&c);

        // Act
        a.set("size", OptionValue::Int(5));

        // Assert
        assert_eq!(c.get("size"), Some(OptionValue::Int(5)));
    }

    #[test]
    fn test_nan_does_not_loop() {
        let a = brush();
        let b = brush();
        a.connect(&b);
        a.set("opacity", OptionValue::Float(f64::NAN));
        assert!(matches!(b.get("opacity"), Some(OptionValue::Float(v)) if v.is_nan()));
    }

    #[test]
    fn test_dropped_peer_is_not_counted() {
        let a = brush();
        {
            let b = brush();
            a.connect(&b);
            assert_eq!(a.link_count(), 1);
        }
        assert_eq!(a.link_count(), 0);
        a.set("size", OptionValue::Int(5));
        assert_eq!(a.get("size"), Some(OptionValue::Int(5)));
    }

    #[test]
    fn test_sync_from_propagates_through_links() {
        // Arrange
        let tool = brush();
        let mirror = brush();
        tool.connect(&mirror);
        let saved = ToolOptions::from_values([("size", OptionValue::Int(2))]);

        // Act
        tool.sync_from(&saved);

        // Assert
        assert_eq!(tool.get("size"), Some(OptionValue::Int(2)));
        assert_eq!(mirror.get("size"), Some(OptionValue::Int(2)));
        // Keys absent from the source are left alone.
        assert_eq!(tool.get("opacity"), Some(OptionValue::Float(1.0)));
    }
}
