//! TaffyTree wrapper for layout computation.
//!
//! [`LayoutEngine`] mirrors a view tree into a taffy layout tree, runs layout
//! and writes the results back into the views. Views whose position or size
//! changed then emit `PositionChanged`, `SizeChanged` and `GeometryChanged`.

use std::collections::{HashMap, HashSet};

use taffy::prelude::*;

use crate::error::Result;
use crate::geometry::{Offset, Region, Size as ViewSize};
use crate::view::node::{View, ViewId};
use crate::view::signal::{Payload, SignalKind};

use super::resolve::{resolve_view, Placement};

type TaffyId = taffy::NodeId;

/// Wraps a [`TaffyTree`] and maintains a mapping from [`ViewId`]s to taffy
/// node ids.
pub struct LayoutEngine {
    tree: TaffyTree<ViewId>,
    node_map: HashMap<ViewId, TaffyId>,
    root: Option<TaffyId>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self { tree: TaffyTree::new(), node_map: HashMap::new(), root: None }
    }

    /// Sync, compute and apply in one go.
    pub fn update(&mut self, root: &View, viewport: ViewSize) -> Result<()> {
        self.sync_tree(root, viewport);
        self.compute(viewport);
        self.apply(root)
    }

    /// Synchronize the taffy tree with the view tree under `root`.
    ///
    /// Taffy nodes of views that left the tree are removed; styles of the
    /// remaining ones are refreshed and child lists rebuilt.
    pub fn sync_tree(&mut self, root: &View, viewport: ViewSize) {
        let mut live: Vec<(View, Placement)> = Vec::new();
        collect(root, Placement::Root(viewport), &mut live);
        let live_set: HashSet<ViewId> = live.iter().map(|(v, _)| v.id()).collect();

        let stale: Vec<ViewId> =
            self.node_map.keys().filter(|k| !live_set.contains(k)).copied().collect();
        for key in stale {
            if let Some(taffy_id) = self.node_map.remove(&key) {
                let _ = self.tree.remove(taffy_id);
            }
        }

        for (view, placement) in &live {
            let style = resolve_view(view, &view.computed_style(), *placement);
            match self.node_map.get(&view.id()) {
                Some(&taffy_id) => {
                    let _ = self.tree.set_style(taffy_id, style);
                }
                None => match self.tree.new_leaf_with_context(style, view.id()) {
                    Ok(taffy_id) => {
                        self.node_map.insert(view.id(), taffy_id);
                    }
                    Err(err) => tracing::warn!(view = %view, error = %err, "layout node creation failed"),
                },
            }
        }

        for (view, _) in &live {
            let children: Vec<TaffyId> = view
                .children()
                .iter()
                .filter_map(|c| self.node_map.get(&c.id()).copied())
                .collect();
            if let Some(&taffy_id) = self.node_map.get(&view.id()) {
                let _ = self.tree.set_children(taffy_id, &children);
            }
        }

        self.root = self.node_map.get(&root.id()).copied();
        tracing::debug!(nodes = self.node_map.len(), "layout tree synced");
    }

    pub fn compute(&mut self, viewport: ViewSize) {
        if let Some(root) = self.root {
            let _ = self.tree.compute_layout(
                root,
                taffy::geometry::Size {
                    width: AvailableSpace::Definite(viewport.width as f32),
                    height: AvailableSpace::Definite(viewport.height as f32),
                },
            );
        }
    }

    /// Layout result of one view, relative to its parent.
    pub fn get_layout(&self, id: ViewId) -> Option<Region> {
        let taffy_id = self.node_map.get(&id)?;
        let layout = self.tree.layout(*taffy_id).ok()?;
        Some(Region::new(
            Offset::from_f32(layout.location.x, layout.location.y),
            ViewSize::from_f32(layout.size.width, layout.size.height),
        ))
    }

    /// Write computed geometry into every view under `root`, then emit change
    /// signals. The first subscriber failure is returned.
    pub fn apply(&self, root: &View) -> Result<()> {
        emit_changes(self.store(root))
    }

    /// Write computed geometry into every view under `root` and report which
    /// views moved or resized. Nothing is emitted yet.
    pub fn store(&self, root: &View) -> Vec<GeometryChange> {
        let mut changed = Vec::new();
        root.walk(&mut |view| {
            if let Some(region) = self.get_layout(view.id()) {
                let (moved, resized) = view.apply_geometry(region.origin, region.size);
                if moved || resized {
                    changed.push(GeometryChange { view: view.clone(), moved, resized });
                }
            }
        });
        changed
    }

    pub fn node_count(&self) -> usize {
        self.node_map.len()
    }

    pub fn clear(&mut self) {
        let keys: Vec<_> = self.node_map.drain().map(|(_, v)| v).collect();
        for taffy_id in keys {
            let _ = self.tree.remove(taffy_id);
        }
        self.root = None;
    }
}

/// A view whose geometry changed during [`LayoutEngine::store`].
pub struct GeometryChange {
    pub view: View,
    pub moved: bool,
    pub resized: bool,
}

/// Emit position, size and geometry signals for `changes`. Emission happens
/// after all geometry is stored so subscribers observe a consistent tree.
pub fn emit_changes(changes: Vec<GeometryChange>) -> Result<()> {
    let mut first_error = None;
    for GeometryChange { view, moved, resized } in changes {
        let mut emissions = Vec::with_capacity(3);
        if moved {
            emissions.push((SignalKind::PositionChanged, Payload::Position(view.position())));
        }
        if resized {
            emissions.push((SignalKind::SizeChanged, Payload::Size(view.size())));
        }
        emissions.push((SignalKind::GeometryChanged, Payload::Geometry(view.region())));
        for (kind, payload) in emissions {
            if let Err(err) = view.emit(kind, payload) {
                first_error.get_or_insert(err);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn collect(view: &View, placement: Placement, out: &mut Vec<(View, Placement)>) {
    out.push((view.clone(), placement));
    if let Some(kind) = view.with_widget(|w| w.layout_kind()) {
        for child in view.children() {
            collect(&child, Placement::Child(kind), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::style::metric::{EdgeBox, Metric, Unset};
    use crate::style::property::{Dimensions, Property, Visibility};
    use crate::widgets::Container;

    const VP: ViewSize = ViewSize::new(200, 100);

    fn fixed(w: f32, h: f32) -> Property {
        Property::FixedSize(Dimensions {
            width: Unset::set(Metric(w)),
            height: Unset::set(Metric(h)),
        })
    }

    #[test]
    fn root_fills_viewport() {
        let root = Container::vertical();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(root.size(), VP);
        assert_eq!(root.position(), Offset::ZERO);
    }

    #[test]
    fn vertical_stacks_children() {
        let root = Container::vertical();
        let a = View::plain();
        let b = View::plain();
        a.set_custom_style(vec![fixed(50.0, 10.0)]);
        b.set_custom_style(vec![fixed(50.0, 20.0)]);
        root.add_view(&a).unwrap();
        root.add_view(&b).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(a.position(), Offset::new(0, 0));
        assert_eq!(b.position(), Offset::new(0, 10));
        assert_eq!(b.size().height, 20);
    }

    #[test]
    fn horizontal_places_side_by_side() {
        let root = Container::horizontal();
        let a = View::plain();
        let b = View::plain();
        a.set_custom_style(vec![fixed(30.0, 10.0)]);
        b.set_custom_style(vec![fixed(50.0, 10.0)]);
        root.add_view(&a).unwrap();
        root.add_view(&b).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(b.position(), Offset::new(30, 0));
        assert_eq!(b.size().width, 50);
    }

    #[test]
    fn padding_offsets_children() {
        let root = Container::vertical();
        root.set_custom_style(vec![Property::Padding(EdgeBox::all(Unset::set(Metric(5.0))))]);
        let a = View::plain();
        a.set_custom_style(vec![fixed(10.0, 10.0)]);
        root.add_view(&a).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(a.position(), Offset::new(5, 5));
    }

    #[test]
    fn gone_children_have_no_size() {
        let root = Container::vertical();
        let a = View::plain();
        a.set_custom_style(vec![fixed(10.0, 10.0)]);
        a.set_visibility(Visibility::Gone);
        root.add_view(&a).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(a.size(), ViewSize::ZERO);
    }

    #[test]
    fn stale_nodes_are_dropped() {
        let root = Container::vertical();
        let a = View::plain();
        root.add_view(&a).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(engine.node_count(), 2);
        root.remove_view(&a).unwrap();
        engine.update(&root, VP).unwrap();
        assert_eq!(engine.node_count(), 1);
        assert!(engine.get_layout(a.id()).is_none());
    }

    #[test]
    fn geometry_changes_emit_once_per_change() {
        let root = Container::vertical();
        let a = View::plain();
        a.set_custom_style(vec![fixed(10.0, 10.0)]);
        root.add_view(&a).unwrap();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let s = sizes.clone();
        a.connect(SignalKind::SizeChanged, move |_, p| {
            if let Payload::Size(size) = p {
                s.borrow_mut().push(*size);
            }
            Ok(())
        });
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        engine.update(&root, VP).unwrap();
        assert_eq!(*sizes.borrow(), vec![ViewSize::new(10, 10)]);
    }

    #[test]
    fn absolute_children_keep_positions() {
        let root = Container::view(crate::widget::traits::LayoutKind::Absolute);
        let a = View::plain();
        a.set_custom_style(vec![fixed(10.0, 10.0)]);
        a.set_position(Offset::new(40, 30));
        root.add_view(&a).unwrap();
        let mut engine = LayoutEngine::new();
        engine.update(&root, VP).unwrap();
        assert_eq!(a.position(), Offset::new(40, 30));
    }
}
