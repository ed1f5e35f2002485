//! Interned style maps
//!
//! Styles are opaque property bags, mapping names to [`StyleValue`]s. They're attached to every
//! leaf in a tree, which means that there are a *lot* of references to a comparatively small
//! number of distinct styles. So we intern them: every [`Style`] handle is produced by a
//! [`StylePool`], which guarantees that two handles with equal maps are the same allocation.
//!
//! That guarantee is what makes comparisons cheap. Deciding whether two neighboring runs of text
//! can be fused (or whether two runs returned by [`get_styles`] should be reported as one) is just
//! a pointer comparison.
//!
//! The pool never evicts anything. The number of distinct styles is bounded by the diversity of
//! the documents, not their length, so this is fine in practice.
//!
//! [`get_styles`]: crate::tree::get_styles

use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single value in a style map
///
/// Maps are consumed structurally (by iteration and equality), so we only need values that are
/// comparable and hashable. There is no floating-point variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// The contents of a style: a sorted map from property names to values
///
/// The map is sorted so that it has a single canonical form, independent of the order in which
/// properties were set.
pub type StyleMap = BTreeMap<String, StyleValue>;

impl From<bool> for StyleValue {
    fn from(b: bool) -> Self {
        StyleValue::Bool(b)
    }
}

impl From<i64> for StyleValue {
    fn from(i: i64) -> Self {
        StyleValue::Int(i)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Str(s.to_owned())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Str(s)
    }
}

/// A handle on an interned style map
///
/// Equality (and hashing) is by *identity*: two `Style`s are equal exactly when they point to the
/// same interned map. Because all `Style`s are produced by interning, this coincides with equality
/// of the maps themselves, so long as both came from the same [`StylePool`]. Everything in this
/// crate uses the [global pool](pool).
///
/// The contents of the map are available through the implementation of `Deref`.
#[derive(Clone)]
pub struct Style(Arc<StyleMap>);

impl Style {
    /// Interns the map in the global pool, returning its canonical handle
    pub fn intern(map: StyleMap) -> Style {
        pool().intern(map)
    }

    /// Returns the style produced by overriding this one with every property in `patch`
    ///
    /// The result is interned in the global pool.
    pub fn update(&self, patch: &StyleMap) -> Style {
        pool().update(self, patch)
    }

    /// Returns whether the two handles refer to the same interned map
    pub fn same(a: &Style, b: &Style) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the map behind the handle
    pub fn map(&self) -> &StyleMap {
        &self.0
    }
}

impl Default for Style {
    /// The empty style
    fn default() -> Style {
        Style::intern(StyleMap::new())
    }
}

impl Deref for Style {
    type Target = StyleMap;

    fn deref(&self) -> &StyleMap {
        &self.0
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Style) -> bool {
        Style::same(self, other)
    }
}

impl Eq for Style {}

impl Hash for Style {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state)
    }
}

impl Debug for Style {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl Serialize for Style {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Style, D::Error> {
        StyleMap::deserialize(deserializer).map(Style::intern)
    }
}

/// An interning table for style maps
///
/// Handles from different pools are never equal to each other, even if their maps are. There's
/// normally no reason to construct one of these directly; the crate uses the global pool, given by
/// [`pool`].
pub struct StylePool {
    // Writes are rare compared to reads of the handles themselves, which never touch the lock. A
    // plain mutex is fine here.
    styles: Mutex<HashSet<Arc<StyleMap>>>,
}

lazy_static! {
    static ref POOL: StylePool = StylePool::new();
}

/// Returns the global style pool
pub fn pool() -> &'static StylePool {
    &POOL
}

impl StylePool {
    /// Creates a new, empty pool
    pub fn new() -> Self {
        StylePool {
            styles: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the canonical handle for the map, adding it to the pool if it isn't already present
    pub fn intern(&self, map: StyleMap) -> Style {
        let mut styles = self.lock();

        if let Some(existing) = styles.get(&map) {
            return Style(existing.clone());
        }

        let arc = Arc::new(map);
        styles.insert(arc.clone());
        log::trace!("style pool: interned new style #{}", styles.len());
        Style(arc)
    }

    /// Merges `patch` into the map behind `style`, returning the handle for the result
    ///
    /// Properties in `patch` take precedence. If nothing would change, the original handle is
    /// returned without touching the pool.
    pub fn update(&self, style: &Style, patch: &StyleMap) -> Style {
        if patch.iter().all(|(k, v)| style.get(k) == Some(v)) {
            return style.clone();
        }

        let mut merged = style.map().clone();
        merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.intern(merged)
    }

    /// Returns the number of distinct styles in the pool
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether the pool has no styles
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<HashSet<Arc<StyleMap>>> {
        // Nothing can be left half-written by a panic while the lock is held, so a poisoned lock
        // is still perfectly usable.
        self.styles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn map(pairs: &[(&str, StyleValue)]) -> StyleMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn interning_is_identity() {
        let pool = StylePool::new();

        // Built in different orders, equal as maps
        let a = pool.intern(map(&[("bold", true.into()), ("size", 12.into())]));
        let b = pool.intern(map(&[("size", 12.into()), ("bold", true.into())]));
        let c = pool.intern(map(&[("bold", false.into())]));

        assert!(Style::same(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn separate_pools_are_distinct() {
        let p1 = StylePool::new();
        let p2 = StylePool::new();

        let a = p1.intern(StyleMap::new());
        let b = p2.intern(StyleMap::new());
        assert_eq!(a.map(), b.map());
        assert_ne!(a, b);
    }

    #[test]
    fn update_reinterns() {
        let base = Style::default();
        let patch = btreemap! { "bold".to_string() => StyleValue::Bool(true) };

        let bold = base.update(&patch);
        assert_ne!(bold, base);
        assert_eq!(bold.get("bold"), Some(&StyleValue::Bool(true)));

        // Equal patches give the identical handle
        assert_eq!(base.update(&patch), bold);
        // And a no-op patch gives back the same style
        assert_eq!(bold.update(&patch), bold);

        let unbold = bold.update(&btreemap! { "bold".to_string() => StyleValue::Bool(false) });
        assert_eq!(unbold.get("bold"), Some(&StyleValue::Bool(false)));
        assert_eq!(unbold, base.update(&btreemap! { "bold".to_string() => false.into() }));
    }

    #[test]
    fn serde_goes_through_the_pool() {
        let style = Style::intern(btreemap! {
            "family".to_string() => "serif".into(),
            "size".to_string() => 10.into(),
        });

        let yaml = serde_yaml::to_string(&style).unwrap();
        let back: Style = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, style);
    }
}
