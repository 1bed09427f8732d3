//! JSON-like rendering of arbitrary Lua values for logs.

use std::collections::HashSet;
use std::ffi::c_void;
use std::fmt::Write;

use mlua::prelude::*;

/// Render `value`. Tables with a metatable render as `[table, metatable]`;
/// tables already being rendered further up render as `"<cycle>"`.
pub fn render(value: &LuaValue) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    write_value(&mut out, value, &mut seen);
    out
}

fn write_value(out: &mut String, value: &LuaValue, seen: &mut HashSet<*const c_void>) {
    match value {
        LuaValue::Nil => out.push_str("null"),
        LuaValue::Boolean(b) => {
            let _ = write!(out, "{b}");
        }
        LuaValue::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        LuaValue::Number(n) => {
            let _ = write!(out, "{n}");
        }
        LuaValue::String(s) => write_string(out, &s.to_string_lossy()),
        LuaValue::Table(t) => {
            match t.metatable() {
                Some(mt) => {
                    out.push('[');
                    write_table(out, t, seen);
                    out.push_str(", ");
                    write_table(out, &mt, seen);
                    out.push(']');
                }
                None => write_table(out, t, seen),
            }
        }
        LuaValue::Function(_) => out.push_str("\"<function>\""),
        LuaValue::UserData(_) => {
            let text = value.to_string().unwrap_or_else(|_| "<userdata>".to_string());
            write_string(out, &text);
        }
        other => write_string(out, &format!("<{}>", other.type_name())),
    }
}

fn write_table(out: &mut String, table: &LuaTable, seen: &mut HashSet<*const c_void>) {
    let ptr = table.to_pointer();
    if !seen.insert(ptr) {
        out.push_str("\"<cycle>\"");
        return;
    }
    let entries: Vec<(LuaValue, LuaValue)> = table.clone().pairs::<LuaValue, LuaValue>().filter_map(Result::ok).collect();
    let len = table.raw_len();
    if entries.is_empty() {
        out.push_str("{}");
    } else if entries.len() == len {
        out.push('[');
        for i in 1..=len {
            if i > 1 {
                out.push_str(", ");
            }
            let item: LuaValue = table.raw_get(i).unwrap_or(LuaValue::Nil);
            write_value(out, &item, seen);
        }
        out.push(']');
    } else {
        let mut rendered: Vec<(String, String)> = entries
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    LuaValue::String(s) => s.to_string_lossy(),
                    other => render_nested(other, seen),
                };
                (key, render_nested(v, seen))
            })
            .collect();
        rendered.sort_by(|a, b| a.0.cmp(&b.0));
        out.push('{');
        for (i, (k, v)) in rendered.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_string(out, k);
            out.push_str(": ");
            out.push_str(v);
        }
        out.push('}');
    }
    seen.remove(&ptr);
}

fn render_nested(value: &LuaValue, seen: &mut HashSet<*const c_void>) -> String {
    let mut s = String::new();
    write_value(&mut s, value, seen);
    s
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
