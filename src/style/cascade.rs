//! Cascade resolution over a view and its ancestors.
//!
//! Every view may carry an extra [`Stylesheet`] that applies to itself and its
//! descendants, plus a flat custom declaration list that applies to itself
//! only. [`compute_style`] gathers matching rules from the view's own sheet and
//! every ancestor's sheet, orders them by [`Specificity`] and merges them.

use std::rc::Rc;

use super::computed::ComputedStyle;
use super::model::{PseudoState, Selector, SelectorStep, Stylesheet};
use super::property::Property;
use super::specificity::Specificity;

/// What the cascade needs to know about a node of the view tree.
pub trait StyleNode: Clone {
    fn has_style_name(&self, name: &str) -> bool;
    fn in_state(&self, state: PseudoState) -> bool;
    fn style_parent(&self) -> Option<Self>;
    fn stylesheet(&self) -> Option<Rc<Stylesheet>>;
    fn custom_style(&self) -> Vec<Property>;
}

/// Whether a single compound step matches `node`.
pub fn matches_step<N: StyleNode>(step: &SelectorStep, node: &N) -> bool {
    node.has_style_name(&step.name) && step.state.map_or(true, |s| node.in_state(s))
}

/// Whether `selector` matches `node`.
///
/// The subject step must match `node`; each earlier step must match some
/// ancestor, with the ancestors matched in order going up the tree.
pub fn matches_selector<N: StyleNode>(selector: &Selector, node: &N) -> bool {
    let Some((subject, rest)) = selector.steps.split_last() else {
        return false;
    };
    if !matches_step(subject, node) {
        return false;
    }
    matches_ancestors(rest, node.style_parent())
}

fn matches_ancestors<N: StyleNode>(steps: &[SelectorStep], start: Option<N>) -> bool {
    let Some((step, rest)) = steps.split_last() else {
        return true;
    };
    let mut current = start;
    while let Some(node) = current {
        if matches_step(step, &node) && matches_ancestors(rest, node.style_parent()) {
            return true;
        }
        current = node.style_parent();
    }
    false
}

/// Compute the style of `node`.
pub fn compute_style<N: StyleNode>(node: &N) -> ComputedStyle {
    let mut sheets: Vec<Rc<Stylesheet>> = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let Some(sheet) = n.stylesheet() {
            sheets.push(sheet);
        }
        current = n.style_parent();
    }
    // Outermost sheet first so depth grows towards the node.
    sheets.reverse();

    let mut matched: Vec<(Specificity, &Property)> = Vec::new();
    for (depth, sheet) in sheets.iter().enumerate() {
        for (order, rule) in sheet.rules.iter().enumerate() {
            if !matches_selector(&rule.selector, node) {
                continue;
            }
            let spec = Specificity::from_selector(&rule.selector, depth as u16, order as u32);
            matched.extend(rule.declarations.iter().map(|d| (spec, d)));
        }
    }
    // Stable sort keeps within-rule declaration order.
    matched.sort_by(|a, b| a.0.cmp(&b.0));

    let mut style = ComputedStyle::new();
    for (_, property) in matched {
        style.apply(property);
    }
    for property in node.custom_style() {
        style.apply(&property);
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::color::Color;
    use crate::style::model::Rule;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockData {
        names: Vec<&'static str>,
        states: Vec<PseudoState>,
        parent: Option<Mock>,
        sheet: Option<Rc<Stylesheet>>,
        custom: Vec<Property>,
    }

    #[derive(Clone, Default)]
    struct Mock(Rc<RefCell<MockData>>);

    impl Mock {
        fn new(names: &[&'static str], parent: Option<&Mock>) -> Mock {
            Mock(Rc::new(RefCell::new(MockData {
                names: names.to_vec(),
                parent: parent.cloned(),
                ..Default::default()
            })))
        }

        fn sheet(&self, rules: Vec<Rule>) {
            self.0.borrow_mut().sheet = Some(Rc::new(Stylesheet::new(rules)));
        }
    }

    impl StyleNode for Mock {
        fn has_style_name(&self, name: &str) -> bool {
            self.0.borrow().names.contains(&name)
        }
        fn in_state(&self, state: PseudoState) -> bool {
            self.0.borrow().states.contains(&state)
        }
        fn style_parent(&self) -> Option<Self> {
            self.0.borrow().parent.clone()
        }
        fn stylesheet(&self) -> Option<Rc<Stylesheet>> {
            self.0.borrow().sheet.clone()
        }
        fn custom_style(&self) -> Vec<Property> {
            self.0.borrow().custom.clone()
        }
    }

    fn rule(sel: &[(&str, Option<PseudoState>)], color: Color) -> Rule {
        let selector = Selector {
            steps: sel
                .iter()
                .map(|(n, s)| SelectorStep { name: n.to_string(), state: *s })
                .collect(),
        };
        Rule::new(selector).with(Property::BackgroundSolid(color))
    }

    //  root (ViewContainer)
    //   └─ mid (ViewContainer)
    //       └─ leaf (Button, CellStyle)
    fn tree() -> (Mock, Mock, Mock) {
        let root = Mock::new(&["ViewContainer"], None);
        let mid = Mock::new(&["ViewContainer"], Some(&root));
        let leaf = Mock::new(&["Button", "CellStyle"], Some(&mid));
        (root, mid, leaf)
    }

    #[test]
    fn subject_must_match() {
        let (_, _, leaf) = tree();
        assert!(matches_selector(&Selector::new(SelectorStep::name("Button")), &leaf));
        assert!(!matches_selector(&Selector::new(SelectorStep::name("Label")), &leaf));
    }

    #[test]
    fn descendant_matches_any_ancestor() {
        let (_, _, leaf) = tree();
        let sel = Selector::new(SelectorStep::name("ViewContainer"))
            .descendant(SelectorStep::name("ViewContainer"))
            .descendant(SelectorStep::name("Button"));
        assert!(matches_selector(&sel, &leaf));

        let too_deep = Selector::new(SelectorStep::name("ViewContainer"))
            .descendant(SelectorStep::name("ViewContainer"))
            .descendant(SelectorStep::name("ViewContainer"))
            .descendant(SelectorStep::name("Button"));
        assert!(!matches_selector(&too_deep, &leaf));
    }

    #[test]
    fn pseudo_state_on_ancestor() {
        let (root, _, leaf) = tree();
        let sel = Selector::new(SelectorStep::with_state("ViewContainer", PseudoState::Hover))
            .descendant(SelectorStep::name("Button"));
        assert!(!matches_selector(&sel, &leaf));
        root.0.borrow_mut().states.push(PseudoState::Hover);
        assert!(matches_selector(&sel, &leaf));
    }

    #[test]
    fn inner_sheet_beats_outer_sheet() {
        let (root, mid, leaf) = tree();
        root.sheet(vec![rule(&[("CellStyle", None)], Color::WHITE)]);
        mid.sheet(vec![rule(&[("Button", None)], Color::RED)]);
        assert_eq!(compute_style(&leaf).background(), Some(Color::RED));
    }

    #[test]
    fn custom_style_beats_sheets() {
        let (root, _, leaf) = tree();
        root.sheet(vec![rule(&[("ViewContainer", None), ("CellStyle", None)], Color::WHITE)]);
        leaf.0.borrow_mut().custom = vec![Property::BackgroundSolid(Color::RED)];
        assert_eq!(compute_style(&leaf).background(), Some(Color::RED));
    }

    #[test]
    fn hover_rule_applies_only_when_hovered() {
        let (root, _, leaf) = tree();
        root.sheet(vec![
            rule(&[("Button", None)], Color::RED),
            rule(&[("Button", Some(PseudoState::Hover))], Color::GREEN),
        ]);
        assert_eq!(compute_style(&leaf).background(), Some(Color::RED));
        leaf.0.borrow_mut().states.push(PseudoState::Hover);
        assert_eq!(compute_style(&leaf).background(), Some(Color::GREEN));
    }

    #[test]
    fn later_rule_wins_at_equal_specificity() {
        let (root, _, leaf) = tree();
        root.sheet(vec![
            rule(&[("CellStyle", None)], Color::RED),
            rule(&[("Button", None)], Color::GREEN),
        ]);
        assert_eq!(compute_style(&leaf).background(), Some(Color::GREEN));
    }
}
