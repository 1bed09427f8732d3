//! Rich text: a flow of text runs and inline views.

use std::any::Any;

use crate::error::Result;
use crate::view::node::View;
use crate::widget::traits::{LayoutKind, Widget};
use crate::widgets::Label;

/// Style name of the label each text run becomes.
pub const TEXT_RUN_STYLE_NAME: &str = "TextRun";

/// One entry of a [`Text`].
#[derive(Debug, Clone)]
pub enum TextItem {
    Run(String),
    View(View),
}

/// Multi-part text. Runs are laid out as labels next to the inline views.
#[derive(Debug, Clone, Default)]
pub struct Text {
    runs: Vec<String>,
}

impl Text {
    pub fn view(items: Vec<TextItem>) -> Result<View> {
        let view = View::new(Text::default());
        Text::set_items(&view, items)?;
        Ok(view)
    }

    /// Replace the content.
    pub fn set_items(view: &View, items: Vec<TextItem>) -> Result<()> {
        view.remove_all_views()?;
        let mut runs = Vec::new();
        for item in items {
            match item {
                TextItem::Run(text) => {
                    let run = View::new(Label::new(text.clone()));
                    run.add_style_name(TEXT_RUN_STYLE_NAME);
                    view.add_view(&run)?;
                    runs.push(text);
                }
                TextItem::View(inline) => view.add_view(&inline)?,
            }
        }
        view.downcast::<Text, _>("Text", |t| t.runs = runs)
    }
}

impl Widget for Text {
    fn widget_type(&self) -> &'static str {
        "Text"
    }

    fn layout_kind(&self) -> Option<LayoutKind> {
        Some(LayoutKind::Horizontal)
    }

    fn text(&self) -> Option<String> {
        Some(self.runs.concat())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
