//! String interner for schema names.
//!
//! Uses `Arc<str>` for cheap cloning (reference count increment instead of allocation).
//! The interner deduplicates strings so identical names share the same allocation,
//! and every name stored in the compiled schema is a [`Name`] handle rather than a copy.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use rustc_hash::FxHashSet;

/// An interned name - cheap to clone (just an `Arc` increment).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// The underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two handles share the same allocation.
    pub fn ptr_eq(&self, other: &Name) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// String interner that deduplicates names.
///
/// Interning a string returns a [`Name`] that can be cheaply cloned.
/// If the same string is interned multiple times, the same allocation is returned.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    strings: FxHashSet<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning a cheap-to-clone handle.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(existing) = self.strings.get(s) {
            Name(Arc::clone(existing))
        } else {
            let rc: Arc<str> = Arc::from(s);
            self.strings.insert(Arc::clone(&rc));
            Name(rc)
        }
    }

    /// Get an interned name if it exists, without creating it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.strings.get(s).cloned().map(Name)
    }

    /// Release a handle.
    ///
    /// The dictionary entry is dropped once the released handle was the last
    /// one held outside the interner.
    pub fn release(&mut self, name: Name) {
        // One count for the set, one for `name` itself.
        if Arc::strong_count(&name.0) <= 2 {
            self.strings.remove(name.as_str());
        }
    }

    /// Number of unique strings interned.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if no strings have been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
