//! Tree operations: add, insert, remove, inflate, walk.
//!
//! Structural operations on a leaf widget fail with
//! [`Error::InvalidOperation`] naming the operation before anything changes.

use std::rc::Rc;

use super::node::View;
use crate::error::{Error, Result};
use crate::geometry::Offset;

impl View {
    fn require_container(&self, operation: &str) -> Result<()> {
        if self.is_container() {
            Ok(())
        } else {
            Err(Error::invalid(operation, "called on non-container type"))
        }
    }

    fn check_not_ancestor(&self, operation: &str, child: &View) -> Result<()> {
        if child.ptr_eq(self) || self.ancestors().iter().any(|a| a.ptr_eq(child)) {
            return Err(Error::invalid(operation, "a view cannot contain itself"));
        }
        Ok(())
    }

    /// Remove `self` from its current parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.update(|s| s.children.retain(|c| !c.ptr_eq(self)));
        }
        self.update(|s| s.parent = None);
        self.sync_anchor();
    }

    fn attach(&self, child: &View, index: usize) {
        child.detach();
        child.update(|s| s.parent = Some(Rc::downgrade(self.rc())));
        self.update(|s| s.children.insert(index, child.clone()));
        child.sync_anchor();
    }

    /// Append `child`. A child attached elsewhere is moved.
    pub fn add_view(&self, child: &View) -> Result<()> {
        self.require_container("addView")?;
        self.check_not_ancestor("addView", child)?;
        let len = self.update(|s| {
            s.children.retain(|c| !c.ptr_eq(child));
            s.children.len()
        });
        self.attach(child, len);
        Ok(())
    }

    /// Insert `child` so that it ends up at `index` (0-based, at most the child count).
    pub fn add_view_at(&self, index: usize, child: &View) -> Result<()> {
        self.require_container("addViewAtIndex")?;
        self.check_not_ancestor("addViewAtIndex", child)?;
        if child.parent().is_some_and(|p| p.ptr_eq(self)) {
            child.detach();
        }
        let len = self.state().children.len();
        if index > len {
            return Err(Error::invalid(
                "addViewAtIndex",
                format!("index {index} out of range (size {len})"),
            ));
        }
        self.attach(child, index);
        Ok(())
    }

    /// Append `child` and exclude it from this container's layout.
    pub fn add_view_custom_layout(&self, child: &View) -> Result<()> {
        self.add_view(child)?;
        child.update(|s| s.custom_layout = true);
        Ok(())
    }

    /// Remove `child` if it is a direct child. Returns whether it was.
    pub fn remove_view(&self, child: &View) -> Result<bool> {
        self.require_container("removeView")?;
        let was_child = child.parent().is_some_and(|p| p.ptr_eq(self));
        if was_child {
            child.detach();
            child.update(|s| s.custom_layout = false);
        }
        Ok(was_child)
    }

    /// Remove the child at `index` (0-based).
    pub fn remove_view_at(&self, index: usize) -> Result<View> {
        self.require_container("removeViewAtIndex")?;
        let child = self.view_at_index(index).ok_or_else(|| {
            Error::invalid(
                "removeViewAtIndex",
                format!("index {index} out of range (size {})", self.state().children.len()),
            )
        })?;
        child.detach();
        Ok(child)
    }

    /// Remove every child, returning them in their former order.
    pub fn remove_all_views(&self) -> Result<Vec<View>> {
        self.require_container("removeAllViews")?;
        let children = self.update(|s| std::mem::take(&mut s.children));
        for child in &children {
            child.update(|s| {
                s.parent = None;
                s.custom_layout = false;
            });
            child.sync_anchor();
        }
        Ok(children)
    }

    /// Replace all children with `child`, which expands to fill this container.
    pub fn set_contents(&self, child: &View) -> Result<()> {
        self.require_container("inflateView")?;
        self.check_not_ancestor("inflateView", child)?;
        self.remove_all_views()?;
        child.set_expanding(true);
        self.add_view(child)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn parent(&self) -> Option<View> {
        let weak = self.state().parent.clone()?;
        weak.upgrade().map(View::from_node)
    }

    pub fn children(&self) -> Vec<View> {
        self.state().children.clone()
    }

    /// Number of children, `None` for a leaf.
    pub fn child_count(&self) -> Option<usize> {
        if self.is_container() {
            Some(self.state().children.len())
        } else {
            None
        }
    }

    pub fn view_at_index(&self, index: usize) -> Option<View> {
        self.state().children.get(index).cloned()
    }

    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let children = parent.state();
        children.children.iter().position(|c| c.ptr_eq(self))
    }

    /// Parent first, root last.
    pub fn ancestors(&self) -> Vec<View> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(v) = current {
            current = v.parent();
            out.push(v);
        }
        out
    }

    /// Root of the tree this view belongs to (itself when detached).
    pub fn root(&self) -> View {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    pub fn depth(&self) -> usize {
        self.ancestors().len()
    }

    /// Visit `self` and every descendant, pre-order.
    ///
    /// The child list is snapshotted per level, so the visitor may restructure
    /// the tree without invalidating the walk.
    pub fn walk(&self, visit: &mut dyn FnMut(&View)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Descendants (and `self`) in pre-order.
    pub fn descendants(&self) -> Vec<View> {
        let mut out = Vec::new();
        self.walk(&mut |v| out.push(v.clone()));
        out
    }

    /// Position of `self` in root coordinates.
    pub fn global_position(&self) -> Offset {
        let mut pos = self.position();
        for ancestor in self.ancestors() {
            pos = pos + ancestor.position();
        }
        pos
    }

    /// Convert a point local to `self` into root coordinates.
    pub fn map_local_to_global(&self, point: Offset) -> Offset {
        self.global_position() + point
    }

    /// Convert a root-coordinate point into coordinates local to `self`.
    pub fn map_global_to_local(&self, point: Offset) -> Offset {
        point - self.global_position()
    }

    /// Whether `self` is `other` or one of its descendants.
    pub fn is_within(&self, other: &View) -> bool {
        self.ptr_eq(other) || self.ancestors().iter().any(|a| a.ptr_eq(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::container::Container;

    //  root
    //   ├─ a
    //   └─ b
    //       └─ c
    fn tree() -> (View, View, View, View) {
        let root = Container::vertical();
        let a = View::plain();
        let b = Container::vertical();
        let c = View::plain();
        root.add_view(&a).unwrap();
        root.add_view(&b).unwrap();
        b.add_view(&c).unwrap();
        (root, a, b, c)
    }

    #[test]
    fn add_sets_parent_and_order() {
        let (root, a, b, _) = tree();
        assert_eq!(root.children(), vec![a.clone(), b.clone()]);
        assert_eq!(a.parent(), Some(root.clone()));
        assert_eq!(root.child_count(), Some(2));
    }

    #[test]
    fn leaf_rejects_structural_operations() {
        let leaf = View::plain();
        let err = leaf.add_view(&View::plain()).unwrap_err();
        assert_eq!(err, Error::invalid("addView", "called on non-container type"));
        assert!(leaf.remove_all_views().is_err());
        assert_eq!(leaf.child_count(), None);
    }

    #[test]
    fn add_moves_between_parents() {
        let (root, a, b, _) = tree();
        b.add_view(&a).unwrap();
        assert_eq!(root.children(), vec![b.clone()]);
        assert_eq!(a.parent(), Some(b.clone()));
    }

    #[test]
    fn add_at_index_bounds() {
        let (root, a, _, _) = tree();
        let x = View::plain();
        root.add_view_at(0, &x).unwrap();
        assert_eq!(root.view_at_index(0), Some(x.clone()));
        assert_eq!(root.view_at_index(1), Some(a));
        let err = root.add_view_at(9, &View::plain()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
        root.add_view_at(3, &View::plain()).unwrap();
        assert_eq!(root.child_count(), Some(4));
    }

    #[test]
    fn cycles_are_rejected() {
        let (root, _, b, _) = tree();
        assert!(b.add_view(&root).is_err());
        assert!(b.add_view(&b).is_err());
    }

    #[test]
    fn remove_clears_parent() {
        let (root, a, _, _) = tree();
        assert!(root.remove_view(&a).unwrap());
        assert!(a.parent().is_none());
        assert!(!root.remove_view(&a).unwrap());
    }

    #[test]
    fn remove_at_index_out_of_range() {
        let (root, ..) = tree();
        assert!(root.remove_view_at(5).is_err());
        let removed = root.remove_view_at(0).unwrap();
        assert!(removed.parent().is_none());
    }

    #[test]
    fn set_contents_replaces_children() {
        let (root, a, _, _) = tree();
        let only = View::plain();
        root.set_contents(&only).unwrap();
        assert_eq!(root.children(), vec![only.clone()]);
        assert!(only.is_expanding());
        assert!(a.parent().is_none());
    }

    #[test]
    fn walk_is_pre_order() {
        let (root, a, b, c) = tree();
        assert_eq!(root.descendants(), vec![root.clone(), a, b.clone(), c.clone()]);
        assert_eq!(c.ancestors(), vec![b, root.clone()]);
        assert_eq!(c.root(), root);
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn global_coordinates_accumulate() {
        let (root, _, b, c) = tree();
        root.set_position(Offset::new(5, 5));
        b.set_position(Offset::new(10, 0));
        c.set_position(Offset::new(1, 2));
        assert_eq!(c.global_position(), Offset::new(16, 7));
        assert_eq!(c.map_local_to_global(Offset::new(1, 1)), Offset::new(17, 8));
        assert_eq!(c.map_global_to_local(Offset::new(17, 8)), Offset::new(1, 1));
    }

    #[test]
    fn children_keep_detached_parent_alive_only_through_handles() {
        let root = Container::vertical();
        let child = View::plain();
        root.add_view(&child).unwrap();
        let weak_root = root.downgrade();
        drop(root);
        assert!(!weak_root.is_alive());
        assert!(child.parent().is_none());
    }
}
