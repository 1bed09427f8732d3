//! View handles and per-view state.
//!
//! A [`View`] is a reference-counted handle to a node of the widget tree.
//! Parents own their children through the child list; children point back to
//! their parent weakly. Any number of extra handles (script values, the
//! window's focus, tests) may keep a view alive after it left the tree.
//!
//! A view paired with script data anchors its script handle while native code
//! owns it (a parent or the window), so script state reachable only from the
//! native tree is not collected. Views held by nothing but host handles do
//! not anchor anything.
//!
//! Every live node is also listed in a thread-local registry keyed by
//! [`ViewId`]. The registry holds weak references only.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

use super::signal::SignalTable;
use crate::animation::Animator;
use crate::error::{Error, Result};
use crate::geometry::{Offset, Region, Size};
use crate::script::companion::Companion;
use crate::style::cascade::{compute_style, StyleNode};
use crate::style::computed::ComputedStyle;
use crate::style::metric::{Metric, Unset};
use crate::style::model::{PseudoState, Stylesheet};
use crate::style::property::{CursorStyle, Property, Visibility};
use crate::widget::traits::{Emission, Widget};
use crate::widgets::PlainView;

new_key_type! {
    /// Stable identifier of a live view.
    pub struct ViewId;
}

thread_local! {
    static REGISTRY: RefCell<SlotMap<ViewId, Weak<ViewNode>>> = RefCell::new(SlotMap::with_key());
}

/// Number of views currently alive on this thread.
pub fn live_view_count() -> usize {
    REGISTRY.with(|r| r.borrow().values().filter(|w| w.strong_count() > 0).count())
}

/// Every view currently alive on this thread, in no particular order.
pub fn live_views() -> Vec<View> {
    REGISTRY.with(|r| r.borrow().values().filter_map(Weak::upgrade).map(View).collect())
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Mutable per-view state. Geometry is relative to the parent.
#[derive(Default)]
pub struct ViewState {
    pub style_names: Vec<String>,
    pub enabled: bool,
    pub visibility: Visibility,
    pub position: Offset,
    pub size: Size,
    /// Size requested through `set_size`; layout keeps it.
    pub requested_size: Option<Size>,
    pub hovered: bool,
    pub pressed: bool,
    pub focused: bool,
    pub selected: bool,
    pub block_clicks_when_pressed: bool,
    /// Excluded from the parent's layout; positioned manually.
    pub custom_layout: bool,
    pub expanding: bool,
    pub cursor: Option<CursorStyle>,
    pub stylesheet: Option<Rc<Stylesheet>>,
    pub custom_style: Vec<Property>,
    pub animator: Option<Animator>,
    /// Native owners other than a parent, e.g. the window holding its surface.
    pub(crate) roots: u32,
    pub(crate) parent: Option<Weak<ViewNode>>,
    pub(crate) children: Vec<View>,
}

pub struct ViewNode {
    id: ViewId,
    pub(crate) state: RefCell<ViewState>,
    pub(crate) widget: RefCell<Box<dyn Widget>>,
    pub(crate) signals: RefCell<SignalTable>,
    pub(crate) companion: RefCell<Option<Companion>>,
}

impl Drop for ViewNode {
    fn drop(&mut self) {
        let children = std::mem::take(&mut self.state.get_mut().children);
        for child in children {
            child.update(|s| s.parent = None);
            child.sync_anchor();
        }
        // The registry may already be gone during thread teardown.
        let _ = REGISTRY.try_with(|r| {
            if let Ok(mut r) = r.try_borrow_mut() {
                r.remove(self.id);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// View / WeakView
// ---------------------------------------------------------------------------

/// Shared handle to a view.
#[derive(Clone)]
pub struct View(Rc<ViewNode>);

/// Non-owning handle to a view.
#[derive(Clone, Default)]
pub struct WeakView(Weak<ViewNode>);

impl WeakView {
    pub fn upgrade(&self) -> Option<View> {
        self.0.upgrade().map(View)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn points_to(&self, view: &View) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&view.0))
    }
}

impl fmt::Debug for WeakView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(v) => write!(f, "WeakView({v})"),
            None => f.write_str("WeakView(<dropped>)"),
        }
    }
}

impl View {
    pub fn new(widget: impl Widget + 'static) -> View {
        View::from_box(Box::new(widget))
    }

    pub fn from_box(widget: Box<dyn Widget>) -> View {
        let node = Rc::new_cyclic(|weak: &Weak<ViewNode>| {
            let id = REGISTRY.with(|r| r.borrow_mut().insert(weak.clone()));
            ViewNode {
                id,
                state: RefCell::new(ViewState { enabled: true, ..Default::default() }),
                widget: RefCell::new(widget),
                signals: RefCell::new(SignalTable::default()),
                companion: RefCell::new(None),
            }
        });
        View(node)
    }

    /// A plain leaf view with no behaviour of its own.
    pub fn plain() -> View {
        View::new(PlainView)
    }

    /// Look up a live view by id.
    pub fn from_id(id: ViewId) -> Option<View> {
        REGISTRY.with(|r| r.borrow().get(id).and_then(Weak::upgrade)).map(View)
    }

    pub fn id(&self) -> ViewId {
        self.0.id
    }

    pub(crate) fn node(&self) -> &ViewNode {
        &self.0
    }

    pub(crate) fn rc(&self) -> &Rc<ViewNode> {
        &self.0
    }

    pub(crate) fn from_node(node: Rc<ViewNode>) -> View {
        View(node)
    }

    pub(crate) fn state(&self) -> Ref<'_, ViewState> {
        self.0.state.borrow()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.0.state.borrow_mut())
    }

    pub fn downgrade(&self) -> WeakView {
        WeakView(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of strong handles, for lifetime diagnostics.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    // ── Widget ───────────────────────────────────────────────────────

    pub fn widget_type(&self) -> &'static str {
        self.0.widget.borrow().widget_type()
    }

    pub fn is_container(&self) -> bool {
        self.0.widget.borrow().is_container()
    }

    pub fn with_widget<R>(&self, f: impl FnOnce(&dyn Widget) -> R) -> R {
        f(self.0.widget.borrow().as_ref())
    }

    pub fn with_widget_mut<R>(&self, f: impl FnOnce(&mut dyn Widget) -> R) -> R {
        f(self.0.widget.borrow_mut().as_mut())
    }

    /// Run `f` on the widget downcast to `T`, or fail with a type mismatch.
    pub fn downcast<T: Widget + 'static, R>(
        &self,
        expected: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let mut widget = self.0.widget.borrow_mut();
        let actual = widget.widget_type();
        match widget.as_any_mut().downcast_mut::<T>() {
            Some(w) => Ok(f(w)),
            None => Err(Error::type_mismatch(expected, actual)),
        }
    }

    /// Run a widget operation that may produce emissions, then emit them
    /// once the widget borrow is released.
    pub fn perform<T: Widget + 'static>(
        &self,
        expected: &str,
        f: impl FnOnce(&mut T) -> Vec<Emission>,
    ) -> Result<()> {
        let emissions = self.downcast(expected, f)?;
        self.emit_all(emissions)
    }

    /// Emit each `(kind, payload)` in order, stopping at the first failure.
    pub fn emit_all(&self, emissions: Vec<Emission>) -> Result<()> {
        for (kind, payload) in emissions {
            self.emit(kind, payload)?;
        }
        Ok(())
    }

    pub fn is<T: Widget + 'static>(&self) -> bool {
        self.0.widget.borrow().as_any().is::<T>()
    }

    pub fn text(&self) -> Option<String> {
        self.0.widget.borrow().text()
    }

    // ── Style names ──────────────────────────────────────────────────

    pub fn style_names(&self) -> Vec<String> {
        self.state().style_names.clone()
    }

    pub fn has_style_name(&self, name: &str) -> bool {
        self.state().style_names.iter().any(|n| n == name)
    }

    /// Append a style name. Already present names keep their position.
    pub fn add_style_name(&self, name: &str) {
        self.update(|s| {
            if !s.style_names.iter().any(|n| n == name) {
                s.style_names.push(name.to_string());
            }
        });
    }

    pub fn remove_style_name(&self, name: &str) {
        self.update(|s| s.style_names.retain(|n| n != name));
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.update(|s| s.enabled = enabled);
    }

    pub fn visibility(&self) -> Visibility {
        match self.computed_style().visibility() {
            Some(v) => v,
            None => self.state().visibility,
        }
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        self.update(|s| s.visibility = visibility);
    }

    pub fn is_visible(&self) -> bool {
        self.visibility().is_visible()
    }

    pub fn is_hovered(&self) -> bool {
        self.state().hovered
    }

    pub fn is_pressed(&self) -> bool {
        self.state().pressed
    }

    pub fn is_focused(&self) -> bool {
        self.state().focused
    }

    pub fn is_selected(&self) -> bool {
        self.state().selected || self.0.widget.borrow().is_selected()
    }

    pub fn set_selected(&self, selected: bool) {
        self.update(|s| s.selected = selected);
    }

    pub(crate) fn set_hovered(&self, hovered: bool) {
        self.update(|s| s.hovered = hovered);
    }

    pub(crate) fn set_pressed(&self, pressed: bool) {
        self.update(|s| s.pressed = pressed);
    }

    pub(crate) fn set_focused(&self, focused: bool) {
        self.update(|s| s.focused = focused);
    }

    pub fn blocks_clicks_when_pressed(&self) -> bool {
        self.state().block_clicks_when_pressed
    }

    pub fn set_block_clicks_when_pressed(&self, block: bool) {
        self.update(|s| s.block_clicks_when_pressed = block);
    }

    pub fn is_custom_layout(&self) -> bool {
        self.state().custom_layout
    }

    pub fn is_expanding(&self) -> bool {
        self.state().expanding
    }

    pub fn set_expanding(&self, expanding: bool) {
        self.update(|s| s.expanding = expanding);
    }

    pub fn cursor(&self) -> Option<CursorStyle> {
        self.state().cursor.clone()
    }

    pub fn set_cursor(&self, cursor: Option<CursorStyle>) {
        self.update(|s| s.cursor = cursor);
    }

    pub fn animator(&self) -> Option<Animator> {
        self.state().animator.clone()
    }

    pub fn set_animator(&self, animator: Option<Animator>) {
        self.update(|s| s.animator = animator);
    }

    // ── Geometry ─────────────────────────────────────────────────────

    pub fn position(&self) -> Offset {
        self.state().position
    }

    pub fn size(&self) -> Size {
        self.state().size
    }

    pub fn region(&self) -> Region {
        let s = self.state();
        Region::new(s.position, s.size)
    }

    pub fn set_position(&self, position: Offset) {
        self.update(|s| s.position = position);
    }

    /// Resize and remember the size as requested, so layout keeps it.
    pub fn set_size(&self, size: Size) {
        self.update(|s| {
            s.size = size;
            s.requested_size = Some(size);
        });
    }

    pub fn requested_size(&self) -> Option<Size> {
        self.state().requested_size
    }

    /// Store computed geometry. Returns `(moved, resized)`.
    pub(crate) fn apply_geometry(&self, position: Offset, size: Size) -> (bool, bool) {
        self.update(|s| {
            let moved = s.position != position;
            let resized = s.size != size;
            s.position = position;
            s.size = size;
            (moved, resized)
        })
    }

    /// Content size reported by the widget, ignoring script overrides.
    pub fn widget_content_size(&self) -> Size {
        self.0.widget.borrow().content_size()
    }

    /// Minimum size: widget content plus padding, at least the fixed/min size
    /// from the computed style.
    pub fn minimum_size(&self) -> Size {
        let style = self.computed_style();
        let padding = style.padding();
        let content = self.content_size();
        let side = |u: Unset<Metric>| u.or_value(Metric::ZERO).0;
        let pad_w = side(padding.left) + side(padding.right);
        let pad_h = side(padding.top) + side(padding.bottom);
        let mut size = Size::from_f32(content.width as f32 + pad_w, content.height as f32 + pad_h);
        let min = style.min_size();
        let fixed = style.fixed_size();
        for dims in [min, fixed] {
            if let Some(w) = dims.width.get() {
                size.width = size.width.max(w.0.round() as i32);
            }
            if let Some(h) = dims.height.get() {
                size.height = size.height.max(h.0.round() as i32);
            }
        }
        size
    }

    // ── Style ────────────────────────────────────────────────────────

    pub fn stylesheet(&self) -> Option<Rc<Stylesheet>> {
        self.state().stylesheet.clone()
    }

    /// Replace the extra stylesheet that applies to this view and its descendants.
    pub fn set_stylesheet(&self, sheet: Option<Stylesheet>) {
        self.update(|s| s.stylesheet = sheet.map(Rc::new));
    }

    pub fn custom_style(&self) -> Vec<Property> {
        self.state().custom_style.clone()
    }

    /// Replace the declarations that apply to this view only.
    pub fn set_custom_style(&self, declarations: Vec<Property>) {
        self.update(|s| s.custom_style = declarations);
    }

    pub fn computed_style(&self) -> ComputedStyle {
        compute_style(self)
    }

    // ── Companion ────────────────────────────────────────────────────

    pub fn companion(&self) -> Option<Companion> {
        self.0.companion.borrow().clone()
    }

    pub(crate) fn set_companion(&self, companion: Companion) {
        let old = self.0.companion.borrow_mut().replace(companion);
        if let Some(old) = old {
            old.release(self);
        }
    }

    /// End the pairing made for the handle with `serial`, if it is current.
    pub(crate) fn release_companion(&self, serial: u64) {
        let Ok(mut slot) = self.0.companion.try_borrow_mut() else {
            return;
        };
        let released = match slot.as_ref() {
            Some(c) if c.serial() == serial => slot.take(),
            _ => None,
        };
        drop(slot);
        if let Some(companion) = released {
            companion.release(self);
        }
    }

    /// End whatever pairing the view has.
    pub(crate) fn release_companion_any(&self) {
        let released = self.0.companion.borrow_mut().take();
        if let Some(companion) = released {
            companion.release(self);
        }
    }

    /// Whether a parent or another native owner holds this view.
    pub fn is_natively_owned(&self) -> bool {
        let s = self.state();
        s.parent.is_some() || s.roots > 0
    }

    pub(crate) fn retain_root(&self) {
        self.update(|s| s.roots += 1);
        self.sync_anchor();
    }

    pub(crate) fn release_root(&self) {
        self.update(|s| s.roots = s.roots.saturating_sub(1));
        self.sync_anchor();
    }

    /// Anchor or release the script handle to match native ownership.
    pub(crate) fn sync_anchor(&self) {
        if let Some(companion) = self.companion() {
            companion.set_anchored(self.is_natively_owned());
        }
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for View {}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:?}", self.widget_type(), self.id())
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View({self})")
    }
}

impl StyleNode for View {
    fn has_style_name(&self, name: &str) -> bool {
        View::has_style_name(self, name)
    }

    fn in_state(&self, state: PseudoState) -> bool {
        match state {
            PseudoState::Hover => self.is_hovered(),
            PseudoState::Active => self.is_pressed(),
            PseudoState::Focus => self.is_focused(),
            PseudoState::Disabled => !self.is_enabled(),
            PseudoState::Selected => self.is_selected(),
        }
    }

    fn style_parent(&self) -> Option<Self> {
        self.parent()
    }

    fn stylesheet(&self) -> Option<Rc<Stylesheet>> {
        View::stylesheet(self)
    }

    fn custom_style(&self) -> Vec<Property> {
        View::custom_style(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::color::Color;

    #[test]
    fn new_view_defaults() {
        let v = View::plain();
        assert!(v.is_enabled());
        assert!(v.is_visible());
        assert!(v.style_names().is_empty());
        assert_eq!(v.position(), Offset::ZERO);
        assert!(v.companion().is_none());
        assert_eq!(v.widget_type(), "View");
    }

    #[test]
    fn registry_tracks_lifetime() {
        let v = View::plain();
        let id = v.id();
        assert!(View::from_id(id).is_some());
        drop(v);
        assert!(View::from_id(id).is_none());
    }

    #[test]
    fn weak_view_dies_with_last_handle() {
        let v = View::plain();
        let weak = v.downgrade();
        assert!(weak.points_to(&v));
        let extra = v.clone();
        drop(v);
        assert!(weak.is_alive());
        drop(extra);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn style_names_keep_insertion_order() {
        let v = View::plain();
        v.add_style_name("fuk");
        v.add_style_name("abuduba");
        v.add_style_name("fuk");
        assert_eq!(v.style_names(), vec!["fuk", "abuduba"]);
        v.remove_style_name("fuk");
        assert_eq!(v.style_names(), vec!["abuduba"]);
    }

    #[test]
    fn set_size_is_remembered() {
        let v = View::plain();
        v.set_size(Size::new(20, 10));
        assert_eq!(v.size(), Size::new(20, 10));
        assert_eq!(v.requested_size(), Some(Size::new(20, 10)));
        assert_eq!(v.apply_geometry(Offset::new(1, 1), Size::new(20, 10)), (true, false));
    }

    #[test]
    fn custom_style_feeds_computed_style() {
        let v = View::plain();
        v.set_custom_style(vec![Property::BackgroundSolid(Color::RED)]);
        assert_eq!(v.computed_style().background(), Some(Color::RED));
    }

    #[test]
    fn visibility_style_overrides_state() {
        let v = View::plain();
        v.set_custom_style(vec![Property::Visibility(Visibility::Gone)]);
        assert_eq!(v.visibility(), Visibility::Gone);
    }

    #[test]
    fn roots_count_as_native_ownership() {
        let v = View::plain();
        assert!(!v.is_natively_owned());
        v.retain_root();
        assert!(v.is_natively_owned());
        v.release_root();
        v.release_root();
        assert!(!v.is_natively_owned());
    }

    #[test]
    fn dropped_parent_releases_children() {
        let parent = crate::widgets::Container::vertical();
        let child = View::plain();
        parent.add_view(&child).unwrap();
        assert!(child.is_natively_owned());
        drop(parent);
        assert!(!child.is_natively_owned());
        assert!(child.parent().is_none());
    }
}
