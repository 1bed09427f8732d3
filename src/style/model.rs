//! Selectors, rules and stylesheets.

use std::fmt;

use super::property::Property;

/// A selector modifier narrowing when a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PseudoState {
    Hover,
    Active,
    Focus,
    Disabled,
    /// Checked or selected; both keywords map here.
    Selected,
}

impl PseudoState {
    /// Map a declaration table key to a pseudo-state.
    pub fn from_keyword(key: &str) -> Option<Self> {
        match key {
            "hover" => Some(PseudoState::Hover),
            "active" => Some(PseudoState::Active),
            "focus" => Some(PseudoState::Focus),
            "disabled" => Some(PseudoState::Disabled),
            "checked" | "selected" => Some(PseudoState::Selected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PseudoState::Hover => "hover",
            PseudoState::Active => "active",
            PseudoState::Focus => "focus",
            PseudoState::Disabled => "disabled",
            PseudoState::Selected => "selected",
        }
    }

    /// Rule emission order of pseudo-state sub-rules after the base rule.
    pub const EMISSION_ORDER: [PseudoState; 5] = [
        PseudoState::Hover,
        PseudoState::Focus,
        PseudoState::Active,
        PseudoState::Disabled,
        PseudoState::Selected,
    ];
}

/// One compound selector: a style name, optionally narrowed by a pseudo-state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorStep {
    pub name: String,
    pub state: Option<PseudoState>,
}

impl SelectorStep {
    pub fn name(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: None }
    }

    pub fn with_state(name: impl Into<String>, state: PseudoState) -> Self {
        Self { name: name.into(), state: Some(state) }
    }
}

impl fmt::Display for SelectorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            Some(state) => write!(f, "{}:{}", self.name, state.as_str()),
            None => f.write_str(&self.name),
        }
    }
}

/// A chain of compound selectors joined by the descendant combinator.
///
/// The last step is the subject; earlier steps must match some ancestors, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Selector {
    pub steps: Vec<SelectorStep>,
}

impl Selector {
    pub fn new(step: SelectorStep) -> Self {
        Self { steps: vec![step] }
    }

    /// `self >> step`: a descendant selector with `step` as the new subject.
    pub fn descendant(&self, step: SelectorStep) -> Selector {
        let mut steps = self.steps.clone();
        steps.push(step);
        Selector { steps }
    }

    /// Compose an optional parent with a new subject step.
    pub fn under(parent: Option<&Selector>, step: SelectorStep) -> Selector {
        match parent {
            Some(p) => p.descendant(step),
            None => Selector::new(step),
        }
    }

    pub fn subject(&self) -> Option<&SelectorStep> {
        self.steps.last()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// A selector with its ordered declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Property>,
}

impl Rule {
    pub fn new(selector: Selector) -> Self {
        Self { selector, declarations: Vec::new() }
    }

    pub fn with(mut self, property: Property) -> Self {
        self.declarations.push(property);
        self
    }
}

/// An ordered list of rules. Later rules win over earlier ones of equal specificity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
