//! Page and tab views: containers that show one child at a time.
//!
//! Hidden pages are `Gone`, so they take no space and receive no input. A
//! [`TabView`] is a tab bar of buttons over a [`PageView`]; clicking a tab
//! selects its page.

use std::any::Any;

use crate::error::{Error, Result};
use crate::style::property::Visibility;
use crate::view::node::View;
use crate::view::signal::SignalKind;
use crate::widget::traits::{LayoutKind, Widget};
use crate::widgets::{Button, Container};

/// Style name of the tab bar.
pub const TAB_BAR_STYLE_NAME: &str = "TabViewTabs";
/// Style name of each tab button.
pub const TAB_STYLE_NAME: &str = "TabViewTab";

#[derive(Debug, Clone, Default)]
pub struct PageView {
    current: usize,
}

impl PageView {
    pub fn current(&self) -> usize {
        self.current
    }

    /// A page view over `pages`, the first one shown.
    pub fn view(pages: &[View]) -> Result<View> {
        let view = View::new(PageView::default());
        for page in pages {
            view.add_view(page)?;
        }
        if !pages.is_empty() {
            PageView::select(&view, 0, "PageView")?;
        }
        Ok(view)
    }

    /// Show page `index` (0-based) and hide the rest.
    pub fn select(view: &View, index: usize, operation: &str) -> Result<()> {
        let pages = view.children();
        if index >= pages.len() {
            return Err(Error::invalid(operation, format!("page {} out of range 1..={}", index + 1, pages.len())));
        }
        for (i, page) in pages.iter().enumerate() {
            page.set_visibility(if i == index { Visibility::Visible } else { Visibility::Gone });
        }
        view.downcast::<PageView, _>("PageView", |p| p.current = index)
    }
}

impl Widget for PageView {
    fn widget_type(&self) -> &'static str {
        "PageView"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Vertical)
    }

    fn describe(&self) -> String {
        format!("PageView page {}", self.current + 1)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabView {
    titles: Vec<String>,
    current: usize,
}

impl TabView {
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// A tab view over `(title, page)` pairs, the first tab selected.
    pub fn view(tabs: Vec<(String, View)>) -> Result<View> {
        let (titles, pages): (Vec<String>, Vec<View>) = tabs.into_iter().unzip();
        let bar = Container::horizontal();
        bar.add_style_name(TAB_BAR_STYLE_NAME);
        let view = View::new(TabView { titles: titles.clone(), current: 0 });
        view.add_view(&bar)?;
        view.add_view(&PageView::view(&pages)?)?;
        for (i, title) in titles.into_iter().enumerate() {
            let tab = View::new(Button::new(title));
            tab.add_style_name(TAB_STYLE_NAME);
            let weak = view.downgrade();
            tab.connect(SignalKind::Clicked, move |_, _| match weak.upgrade() {
                Some(view) => TabView::select(&view, i, "TabView"),
                None => Ok(()),
            });
            bar.add_view(&tab)?;
        }
        if !pages.is_empty() {
            TabView::select(&view, 0, "TabView")?;
        }
        Ok(view)
    }

    /// Select tab `index` (0-based): its page is shown, its button selected.
    pub fn select(view: &View, index: usize, operation: &str) -> Result<()> {
        let (Some(bar), Some(pages)) = (view.view_at_index(0), view.view_at_index(1)) else {
            return Err(Error::invalid(operation, "tab view has lost its pages"));
        };
        PageView::select(&pages, index, operation)?;
        for (i, tab) in bar.children().iter().enumerate() {
            tab.set_selected(i == index);
        }
        view.downcast::<TabView, _>("TabView", |t| t.current = index)
    }
}

impl Widget for TabView {
    fn widget_type(&self) -> &'static str {
        "TabView"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Vertical)
    }

    fn describe(&self) -> String {
        match self.titles.get(self.current) {
            Some(title) => format!("TabView {title:?}"),
            None => "TabView".to_string(),
        }
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
    use crate::view::signal::Payload;
    use crate::widgets::Label;

    fn label(text: &str) -> View {
        View::new(Label::new(text))
    }

    #[test]
    fn only_selected_page_is_visible() {
        let pages = [label("a"), label("b"), label("c")];
        let view = PageView::view(&pages).unwrap();
        let shown = |pages: &[View]| pages.iter().map(|p| p.visibility() == Visibility::Visible).collect::<Vec<_>>();
        assert_eq!(shown(&pages), vec![true, false, false]);
        PageView::select(&view, 2, "setPageId").unwrap();
        assert_eq!(shown(&pages), vec![false, false, true]);
        assert_eq!(view.with_widget(|w| w.describe()), "PageView page 3");
    }

    #[test]
    fn out_of_range_page_names_operation() {
        let view = PageView::view(&[label("a")]).unwrap();
        let err = PageView::select(&view, 1, "setPageId").unwrap_err();
        assert_eq!(err.to_string(), "setPageId: page 2 out of range 1..=1");
    }

    #[test]
    fn clicking_a_tab_selects_its_page() {
        let first = label("one");
        let second = label("two");
        let view = TabView::view(vec![("One".into(), first.clone()), ("Two".into(), second.clone())]).unwrap();
        let bar = view.view_at_index(0).unwrap();
        assert_eq!(bar.child_count(), Some(2));
        assert!(bar.children()[0].is_selected());

        bar.children()[1].emit(SignalKind::Clicked, Payload::None).unwrap();
        assert_eq!(second.visibility(), Visibility::Visible);
        assert_eq!(first.visibility(), Visibility::Gone);
        assert!(bar.children()[1].is_selected());
        assert_eq!(view.with_widget(|w| w.describe()), "TabView \"Two\"");
    }
}
