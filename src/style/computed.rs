//! The merged result of every declaration that applies to one view.

use std::collections::BTreeMap;

use super::color::Color;
use super::metric::{EdgeBox, Metric};
use super::property::{Dimensions, Expanding, Property, PropertyKind, Visibility};

/// Computed style of a view: at most one declaration per [`PropertyKind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    properties: BTreeMap<PropertyKind, Property>,
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a declaration of higher precedence than everything applied so far.
    pub fn apply(&mut self, property: &Property) {
        let kind = property.kind();
        let merged = match self.properties.get(&kind) {
            Some(lower) => property.clone().over(lower),
            None => property.clone(),
        };
        self.properties.insert(kind, merged);
    }

    pub fn get(&self, kind: PropertyKind) -> Option<&Property> {
        self.properties.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn background(&self) -> Option<Color> {
        match self.get(PropertyKind::BackgroundSolid) {
            Some(Property::BackgroundSolid(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn text_color(&self) -> Option<Color> {
        match self.get(PropertyKind::TextColor) {
            Some(Property::TextColor(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn padding(&self) -> EdgeBox {
        match self.get(PropertyKind::Padding) {
            Some(Property::Padding(b)) => *b,
            _ => EdgeBox::default(),
        }
    }

    pub fn margin(&self) -> EdgeBox {
        match self.get(PropertyKind::Margin) {
            Some(Property::Margin(b)) => *b,
            _ => EdgeBox::default(),
        }
    }

    pub fn fixed_size(&self) -> Dimensions {
        match self.get(PropertyKind::FixedSize) {
            Some(Property::FixedSize(d)) => *d,
            _ => Dimensions::default(),
        }
    }

    pub fn min_size(&self) -> Dimensions {
        match self.get(PropertyKind::MinSize) {
            Some(Property::MinSize(d)) => *d,
            _ => Dimensions::default(),
        }
    }

    pub fn max_size(&self) -> Dimensions {
        match self.get(PropertyKind::MaxSize) {
            Some(Property::MaxSize(d)) => *d,
            _ => Dimensions::default(),
        }
    }

    pub fn expanding(&self) -> Expanding {
        match self.get(PropertyKind::Expanding) {
            Some(Property::Expanding(e)) => *e,
            _ => Expanding::default(),
        }
    }

    pub fn layout_spacing(&self) -> Metric {
        match self.get(PropertyKind::LayoutSpacing) {
            Some(Property::LayoutSpacing(m)) => *m,
            _ => Metric::ZERO,
        }
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match self.get(PropertyKind::Visibility) {
            Some(Property::Visibility(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self.get(PropertyKind::Opacity) {
            Some(Property::Opacity(v)) => *v,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::metric::Unset;
    use crate::style::property::{BackgroundImage, Sizing};

    #[test]
    fn later_apply_wins() {
        let mut style = ComputedStyle::new();
        style.apply(&Property::BackgroundSolid(Color::RED));
        style.apply(&Property::BackgroundSolid(Color::GREEN));
        assert_eq!(style.background(), Some(Color::GREEN));
    }

    #[test]
    fn unset_fields_fall_through() {
        let mut style = ComputedStyle::new();
        style.apply(&Property::BackgroundImage(BackgroundImage {
            url: Unset::set("close.svg".into()),
            sizing: Unset::set(Sizing::Cover),
            ..Default::default()
        }));
        style.apply(&Property::BackgroundImage(BackgroundImage {
            overlay: Unset::set(Color::RED),
            ..Default::default()
        }));
        let Some(Property::BackgroundImage(img)) = style.get(PropertyKind::BackgroundImage) else {
            panic!("missing background image");
        };
        assert_eq!(img.url, Unset::set("close.svg".to_string()));
        assert_eq!(img.overlay, Unset::set(Color::RED));
        assert_eq!(img.sizing, Unset::set(Sizing::Cover));
    }

    #[test]
    fn defaults_when_missing() {
        let style = ComputedStyle::new();
        assert!(style.is_empty());
        assert_eq!(style.background(), None);
        assert_eq!(style.opacity(), 1.0);
        assert_eq!(style.layout_spacing(), Metric::ZERO);
        assert!(!style.fixed_size().width.is_set());
    }
}
