#![forbid(unsafe_code)]

//! Focus traversal over the host's renderable tree.
//!
//! The tree itself is opaque: the host implements [`FocusTree`], exposing
//! only parent/child topology, the focusability predicates, and the
//! `focus`/`blur` side effects. [`TreeWalker`] walks that topology in
//! DOM-TreeWalker pre-order, skipping nodes rejected by the predicate
//! `focusable ∧ visible`. [`FocusController`] keeps the focus cursor and
//! drives forward/backward navigation with wrap-around.
//!
//! # Invariants
//!
//! 1. Starting from any accepted node, iterating `next_accepted` visits
//!    every accepted node exactly once, in pre-order, before returning
//!    `None` at the tree end.
//! 2. On an advance that changes the target, `blur` fires on the outgoing
//!    node before `focus` fires on the incoming one.
//! 3. A wrap-around that lands on the current node is a no-op (no
//!    blur/focus churn for a single focusable element).

use weft_core::event::ParsedKey;

/// The host's renderable tree, as seen by focus traversal.
///
/// `children` must return a stable ordering; `parent` must be consistent
/// with it. `focus`/`blur` are side-effecting notifications and must not
/// restructure the tree during a traversal.
pub trait FocusTree {
    /// Node handle.
    type Id: Copy + PartialEq;

    /// The parent of `node`, or `None` for the root.
    fn parent(&self, node: Self::Id) -> Option<Self::Id>;

    /// The ordered children of `node`.
    fn children(&self, node: Self::Id) -> Vec<Self::Id>;

    /// Whether `node` can take focus.
    fn focusable(&self, node: Self::Id) -> bool;

    /// Whether `node` is currently visible.
    fn visible(&self, node: Self::Id) -> bool;

    /// Notify `node` that it gained focus.
    fn focus(&mut self, node: Self::Id);

    /// Notify `node` that it lost focus.
    fn blur(&mut self, node: Self::Id);
}

// ---------------------------------------------------------------------------
// TreeWalker
// ---------------------------------------------------------------------------

/// Pre-order walker over a [`FocusTree`], filtered by the acceptance
/// predicate `focusable ∧ visible`.
pub struct TreeWalker<'a, T: FocusTree> {
    tree: &'a T,
    root: T::Id,
}

impl<'a, T: FocusTree> TreeWalker<'a, T> {
    /// Create a walker anchored at `root`.
    pub fn new(tree: &'a T, root: T::Id) -> Self {
        Self { tree, root }
    }

    /// The acceptance predicate.
    pub fn accepted(&self, node: T::Id) -> bool {
        self.tree.focusable(node) && self.tree.visible(node)
    }

    /// Next node in pre-order, unfiltered: first child, else the nearest
    /// ancestor-or-self's next sibling.
    pub fn next_raw(&self, node: T::Id) -> Option<T::Id> {
        if let Some(&first) = self.tree.children(node).first() {
            return Some(first);
        }
        let mut cur = node;
        loop {
            if cur == self.root {
                return None;
            }
            let parent = self.tree.parent(cur)?;
            let siblings = self.tree.children(parent);
            let index = siblings.iter().position(|&s| s == cur)?;
            if index + 1 < siblings.len() {
                return Some(siblings[index + 1]);
            }
            cur = parent;
        }
    }

    /// Previous node in pre-order, unfiltered: the deepest last descendant
    /// of the previous sibling, else the parent.
    pub fn prev_raw(&self, node: T::Id) -> Option<T::Id> {
        if node == self.root {
            return None;
        }
        let parent = self.tree.parent(node)?;
        let siblings = self.tree.children(parent);
        let index = siblings.iter().position(|&s| s == node)?;
        if index == 0 {
            return Some(parent);
        }
        Some(self.deepest_last(siblings[index - 1]))
    }

    fn deepest_last(&self, mut node: T::Id) -> T::Id {
        loop {
            match self.tree.children(node).last() {
                Some(&last) => node = last,
                None => return node,
            }
        }
    }

    /// Next accepted node after `node`, or `None` at the tree end.
    pub fn next_accepted(&self, node: T::Id) -> Option<T::Id> {
        let mut cur = node;
        loop {
            cur = self.next_raw(cur)?;
            if self.accepted(cur) {
                return Some(cur);
            }
        }
    }

    /// Previous accepted node before `node`, or `None` at the tree start.
    pub fn prev_accepted(&self, node: T::Id) -> Option<T::Id> {
        let mut cur = node;
        loop {
            cur = self.prev_raw(cur)?;
            if self.accepted(cur) {
                return Some(cur);
            }
        }
    }

    /// First accepted node in pre-order (the root itself participates).
    pub fn first_accepted(&self) -> Option<T::Id> {
        if self.accepted(self.root) {
            Some(self.root)
        } else {
            self.next_accepted(self.root)
        }
    }

    /// Last accepted node in pre-order.
    pub fn last_accepted(&self) -> Option<T::Id> {
        let mut cur = self.deepest_last(self.root);
        loop {
            if self.accepted(cur) {
                return Some(cur);
            }
            cur = self.prev_raw(cur)?;
        }
    }
}

// ---------------------------------------------------------------------------
// FocusController
// ---------------------------------------------------------------------------

/// The focus cursor and its navigation policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusController<Id> {
    current: Option<Id>,
}

impl<Id: Copy + PartialEq> FocusController<Id> {
    /// Create a controller with no focused node.
    #[must_use]
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The currently focused node, if any.
    #[must_use]
    pub fn current(&self) -> Option<Id> {
        self.current
    }

    /// Move the cursor without firing focus/blur (e.g. after the host
    /// focused a node directly).
    pub fn set_current(&mut self, node: Option<Id>) {
        self.current = node;
    }

    /// Advance to the next accepted node, wrapping to the first at the
    /// tree end. Returns the newly focused node, if any exists.
    pub fn focus_next<T: FocusTree<Id = Id>>(&mut self, tree: &mut T, root: Id) -> Option<Id> {
        let target = {
            let walker = TreeWalker::new(&*tree, root);
            match self.current {
                Some(cur) => walker.next_accepted(cur).or_else(|| walker.first_accepted()),
                None => walker.first_accepted(),
            }
        };
        self.apply(tree, target)
    }

    /// Retreat to the previous accepted node, wrapping to the last at the
    /// tree start. Returns the newly focused node, if any exists.
    pub fn focus_prev<T: FocusTree<Id = Id>>(&mut self, tree: &mut T, root: Id) -> Option<Id> {
        let target = {
            let walker = TreeWalker::new(&*tree, root);
            match self.current {
                Some(cur) => walker.prev_accepted(cur).or_else(|| walker.last_accepted()),
                None => walker.last_accepted(),
            }
        };
        self.apply(tree, target)
    }

    fn apply<T: FocusTree<Id = Id>>(&mut self, tree: &mut T, target: Option<Id>) -> Option<Id> {
        let target = target?;
        if self.current == Some(target) {
            return Some(target);
        }
        if let Some(outgoing) = self.current {
            tree.blur(outgoing);
        }
        tree.focus(target);
        self.current = Some(target);
        Some(target)
    }

    /// Default navigation binding: Tab advances, Shift+Tab retreats.
    /// Returns true iff the key was consumed. Hosts that register their own
    /// navigation handler skip this.
    pub fn handle_key<T: FocusTree<Id = Id>>(
        &mut self,
        tree: &mut T,
        root: Id,
        key: &ParsedKey,
    ) -> bool {
        if !key.is_named("tab") || key.ctrl() || key.alt() || key.super_key() {
            return false;
        }
        if key.shift() {
            self.focus_prev(tree, root);
        } else {
            self.focus_next(tree, root);
        }
        true
    }
}
