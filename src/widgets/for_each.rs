//! List container whose children are built from a model.
//!
//! The model and the factory live with the script; this widget only holds
//! the built rows and swaps them in one step on a rebuild.

use std::any::Any;

use crate::error::Result;
use crate::view::node::View;
use crate::widget::traits::{LayoutKind, Widget};

#[derive(Debug, Clone, Copy, Default)]
pub struct ForEach {
    rebuilds: usize,
}

impl ForEach {
    pub fn view() -> View {
        View::new(ForEach::default())
    }

    /// How many times the rows were replaced.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Replace the rows with `rows`, in order. A row already shown is moved,
    /// not rebuilt.
    pub fn set_rows(view: &View, rows: &[View]) -> Result<()> {
        view.downcast::<ForEach, _>("ForEachUI", |f| f.rebuilds += 1)?;
        for old in view.children() {
            if !rows.iter().any(|r| r.ptr_eq(&old)) {
                view.remove_view(&old)?;
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if view.view_at_index(index).is_some_and(|v| v.ptr_eq(row)) {
                continue;
            }
            view.add_view_at(index, row)?;
        }
        tracing::trace!(view = %view, rows = rows.len(), "for-each rebuild");
        Ok(())
    }
}

impl Widget for ForEach {
    fn widget_type(&self) -> &'static str {
        "ForEachUI"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Vertical)
    }

    fn describe(&self) -> String {
        format!("ForEachUI rebuilt {}x", self.rebuilds)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::Label;

    #[test]
    fn rows_are_reordered_and_dropped() {
        let list = ForEach::view();
        let a = View::new(Label::new("a"));
        let b = View::new(Label::new("b"));
        let c = View::new(Label::new("c"));
        ForEach::set_rows(&list, &[a.clone(), b.clone(), c.clone()]).unwrap();
        ForEach::set_rows(&list, &[c.clone(), a.clone()]).unwrap();

        let children = list.children();
        assert_eq!(children.len(), 2);
        assert!(children[0].ptr_eq(&c) && children[1].ptr_eq(&a));
        assert!(b.parent().is_none());
        assert_eq!(list.with_widget(|w| w.describe()), "ForEachUI rebuilt 2x");
    }
}
