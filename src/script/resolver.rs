//! Declaration table → ordered style rules.
//!
//! ```lua
//! view:setStyle {
//!   Button = {
//!     BackgroundSolid "#f00",
//!     hover = { BackgroundSolid "#0f0" },
//!     Icon = { Opacity(0.5) },          -- "Button Icon"
//!   },
//! }
//! ```
//!
//! Every entry is classified before anything recurses. Positional entries
//! are declarations of the current selector, pseudo-state keywords open a
//! sub-rule of the current selector and any other name opens a nested
//! (descendant) selector. Per selector the emitted order is fixed: nested
//! rules as they are met, then the base rule, then hover, focus, active,
//! disabled and selected, whatever order the source table used.

use mlua::prelude::*;

use super::dump;
use super::rules::property_of;
use crate::error::{Error, Result, StyleError};
use crate::style::model::{PseudoState, Rule, Selector, SelectorStep, Stylesheet};
use crate::style::property::Property;
use crate::view::View;

/// What one table entry means.
enum EntryClass {
    Skip,
    Declaration(Property),
    Pseudo(PseudoState, LuaTable),
    Nested(String, LuaTable),
}

fn is_positional(key: &LuaValue) -> bool {
    match key {
        LuaValue::Integer(_) | LuaValue::Number(_) => true,
        LuaValue::String(s) => s.as_bytes().first().is_some_and(u8::is_ascii_digit),
        _ => false,
    }
}

fn key_name(key: &LuaValue) -> String {
    match key {
        LuaValue::String(s) => s.to_string_lossy(),
        other => dump::render(other),
    }
}

fn unexpected(path: String, value: &LuaValue, hint: Option<&str>) -> Error {
    Error::Style(StyleError { path, value: dump::render(value), hint: hint.map(str::to_string) })
}

fn entries(table: &LuaTable) -> Result<Vec<(LuaValue, LuaValue)>> {
    table
        .clone()
        .pairs::<LuaValue, LuaValue>()
        .collect::<LuaResult<Vec<_>>>()
        .map_err(|e| Error::invalid("setStyle", e.to_string()))
}

/// Classify an entry of the table of `class_name`. Pseudo-state keys are only
/// meaningful at rule level, not inside another pseudo-state table.
fn classify(class_name: &str, key: &LuaValue, value: &LuaValue, allow_pseudo: bool) -> Result<EntryClass> {
    if value.is_nil() {
        return Ok(EntryClass::Skip);
    }
    if is_positional(key) {
        return property_of(value)
            .map(EntryClass::Declaration)
            .ok_or_else(|| unexpected(format!("{class_name} {}", key_name(key)), value, None));
    }
    let name = key_name(key);
    if name.is_empty() {
        return Ok(EntryClass::Skip);
    }
    if allow_pseudo {
        if let Some(state) = PseudoState::from_keyword(&name) {
            return match value {
                LuaValue::Table(t) => Ok(EntryClass::Pseudo(state, t.clone())),
                other => Err(unexpected(format!("{class_name} {name}"), other, Some("table expected"))),
            };
        }
    }
    match value {
        LuaValue::Table(t) if property_of(value).is_none() => Ok(EntryClass::Nested(name, t.clone())),
        other => Err(unexpected(
            format!("{class_name} {name}"),
            other,
            Some("table expected to make sass-style nested selector"),
        )),
    }
}

/// Accumulates rules from declaration tables.
#[derive(Debug, Default)]
pub struct StyleResolver {
    rules: Vec<Rule>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `table` as `{ StyleName = {...}, ... }`.
    ///
    /// Returns `Ok(false)` when some top-level value is not a table: the table
    /// is then a bare declaration list for the view itself, see
    /// [`declarations`].
    pub fn process(&mut self, table: &LuaTable) -> Result<bool> {
        let entries = entries(table)?;
        if entries.iter().any(|(_, v)| !v.is_nil() && !matches!(v, LuaValue::Table(_))) {
            return Ok(false);
        }
        for (key, value) in entries {
            if let LuaValue::Table(t) = value {
                self.resolve(&t, &key_name(&key), None)?;
            }
        }
        Ok(true)
    }

    /// Resolve the rule table of `class_name`, under `parent` if given.
    pub fn resolve(&mut self, table: &LuaTable, class_name: &str, parent: Option<&Selector>) -> Result<()> {
        let mut base = Rule::new(Selector::under(parent, SelectorStep::name(class_name)));
        let mut pseudo: Vec<(PseudoState, Rule)> = Vec::new();

        for (key, value) in entries(table)? {
            match classify(class_name, &key, &value, true)? {
                EntryClass::Skip => {}
                EntryClass::Declaration(p) => base.declarations.push(p),
                EntryClass::Nested(name, t) => {
                    let parent = base.selector.clone();
                    self.resolve(&t, &name, Some(&parent))?;
                }
                EntryClass::Pseudo(state, t) => {
                    let selector = Selector::under(parent, SelectorStep::with_state(class_name, state));
                    let rule = self.resolve_pseudo(&t, selector)?;
                    // A repeated keyword (checked + selected) replaces the earlier one.
                    pseudo.retain(|(s, _)| *s != state);
                    pseudo.push((state, rule));
                }
            }
        }

        tracing::trace!(selector = %base.selector, declarations = base.declarations.len(), "rule");
        self.rules.push(base);
        for state in PseudoState::EMISSION_ORDER {
            if let Some(i) = pseudo.iter().position(|(s, _)| *s == state) {
                self.rules.push(pseudo.swap_remove(i).1);
            }
        }
        Ok(())
    }

    fn resolve_pseudo(&mut self, table: &LuaTable, selector: Selector) -> Result<Rule> {
        let mut rule = Rule::new(selector);
        let path = rule.selector.to_string();
        for (key, value) in entries(table)? {
            match classify(&path, &key, &value, false)? {
                EntryClass::Skip | EntryClass::Pseudo(..) => {}
                EntryClass::Declaration(p) => rule.declarations.push(p),
                EntryClass::Nested(name, t) => self.resolve(&t, &name, Some(&rule.selector.clone()))?,
            }
        }
        Ok(rule)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn into_stylesheet(self) -> Stylesheet {
        Stylesheet::new(self.rules)
    }
}

/// The array part of `table` as declarations. Holes are skipped rather than
/// ending the list.
pub fn declarations(table: &LuaTable) -> Result<Vec<Property>> {
    let mut out = Vec::new();
    for i in 1..=table.raw_len() {
        let value: LuaValue = table.raw_get(i).map_err(|e| Error::invalid("setStyle", e.to_string()))?;
        if value.is_nil() {
            continue;
        }
        let property = property_of(&value).ok_or_else(|| unexpected(format!("{i}"), &value, None))?;
        out.push(property);
    }
    Ok(out)
}

/// `view:setStyle(table)`.
///
/// `{}` clears both the extra stylesheet and the custom style. A selector
/// keyed table replaces the extra stylesheet; a bare declaration list
/// replaces the custom style.
pub fn apply_style(view: &View, table: &LuaTable) -> Result<()> {
    if entries(table)?.is_empty() {
        view.set_custom_style(Vec::new());
        view.set_stylesheet(None);
        return Ok(());
    }
    let mut resolver = StyleResolver::new();
    if resolver.process(table)? {
        tracing::debug!(view = %view, rules = resolver.rules().len(), "stylesheet set");
        view.set_stylesheet(Some(resolver.into_stylesheet()));
    } else {
        let declarations = declarations(table)?;
        tracing::debug!(view = %view, declarations = declarations.len(), "custom style set");
        view.set_custom_style(declarations);
    }
    Ok(())
}
