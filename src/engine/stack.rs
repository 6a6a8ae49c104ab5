//! Ordered directive list.
//!
//! `DirectiveList` mirrors source order. Expansion replaces a delegation
//! directive with the directives of the delegated file *at the same
//! position*, so the list never reorders, sorts or deduplicates anything.
//!
//! ```text
//! before:  [A, include(D), B]        D resolves to [X, Y]
//! splice_replace(1, [X, Y]) -> Some(3)
//! after:   [A, X, Y, B]
//!                    ^ returned position
//! ```

use crate::{Directive, Phase};

/// An ordered, owned sequence of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveList {
    items: Vec<Directive>,
}

impl DirectiveList {
    /// Create an empty list.
    pub fn new() -> Self {
        DirectiveList { items: Vec::new() }
    }

    /// Push `item` at the end.
    pub fn append(&mut self, item: Directive) {
        self.items.push(item);
    }

    /// Replace the item at `position` with all items of `replacement`, in
    /// order, and return the position right after the inserted items.
    ///
    /// Returns `None` and leaves the list untouched if `position` is out of
    /// bounds.
    pub fn splice_replace(&mut self, position: usize, replacement: DirectiveList) -> Option<usize> {
        if position >= self.items.len() {
            return None;
        }
        let inserted = replacement.items.len();
        self.items.splice(position..=position, replacement.items);
        Some(position + inserted)
    }

    /// Append every item of `other`, consuming it.
    pub fn concatenate(&mut self, mut other: DirectiveList) {
        self.items.append(&mut other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Directive> {
        self.items.get(position)
    }

    pub fn first(&self) -> Option<&Directive> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.items.iter()
    }

    /// Iterate the directives of one phase, in stack order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &Directive> {
        self.items.iter().filter(move |d| d.phase() == phase)
    }

    /// First directive matching `phase` and `module`. See [`crate::find`].
    pub fn find(&self, phase: Phase, module: &str) -> Option<&Directive> {
        super::find_directive(self, phase, module)
    }

    /// Canonical text of every directive, in order.
    pub fn lines(&self) -> Vec<&str> {
        self.items.iter().map(Directive::canonical_text).collect()
    }
}

impl FromIterator<Directive> for DirectiveList {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        DirectiveList { items: iter.into_iter().collect() }
    }
}

impl Extend<Directive> for DirectiveList {
    fn extend<I: IntoIterator<Item = Directive>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl IntoIterator for DirectiveList {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a DirectiveList {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
