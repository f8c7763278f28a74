// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, VisualId};
use super::store::VisualTree;

/// An iterator over the direct children of a visual.
///
/// Created by [`VisualTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a VisualTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_unchecked(idx))
    }
}

/// An iterator over the ancestors of a visual, innermost first.
///
/// Created by [`VisualTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a VisualTree,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a VisualTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = VisualId;

    fn next(&mut self) -> Option<VisualId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(self.tree.id_unchecked(idx))
    }
}
