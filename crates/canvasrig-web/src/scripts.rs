#![forbid(unsafe_code)]

//! Page scripts and protocol payload decoding.
//!
//! Everything here is pure so it can be tested without a browser. Scripts
//! always return a string; `null` results would otherwise arrive as a
//! missing value and be indistinguishable from a protocol failure.

use canvasrig_core::SurfaceRect;
use canvasrig_harness::{ElementState, HostError};
use serde_json::Value;

/// Quote `selector` as a JavaScript string literal.
fn js_string(selector: &str) -> String {
    // JSON string syntax is a subset of JS string syntax.
    serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string())
}

/// Script reporting `absent`, `hidden` or `visible` for the first match.
pub fn probe_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return "absent";
  const s = window.getComputedStyle(el);
  const hidden =
    s.display === "none" || s.visibility === "hidden" || parseFloat(s.opacity) === 0;
  if (hidden) return "hidden";
  return "visible";
}})()"#,
        sel = js_string(selector)
    )
}

/// Script returning the first match's bounding rectangle as JSON, or
/// `"null"`.
pub fn rect_script(selector: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector({sel});
  if (!el) return "null";
  const r = el.getBoundingClientRect();
  return JSON.stringify({{ x: r.x, y: r.y, width: r.width, height: r.height }});
}})()"#,
        sel = js_string(selector)
    )
}

pub fn parse_element_state(raw: &str) -> Result<ElementState, HostError> {
    match raw {
        "absent" => Ok(ElementState::Absent),
        "hidden" => Ok(ElementState::Hidden),
        "visible" => Ok(ElementState::Visible),
        other => Err(HostError::Script(format!("unexpected probe result '{other}'"))),
    }
}

pub fn parse_rect(raw: &str) -> Result<Option<SurfaceRect>, HostError> {
    serde_json::from_str(raw).map_err(|err| HostError::Script(format!("bad rect payload: {err}")))
}

/// Text of one console argument, the way a test runner prints it.
pub fn arg_text(value: Option<&Value>, description: Option<&str>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => description.map(str::to_string),
        Some(other) => Some(other.to_string()),
    }
}

/// Join console arguments with single spaces.
pub fn join_args<I>(parts: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    parts.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// Message of an uncaught exception, without the error class prefix.
///
/// `ReferenceError: x is not defined\n    at ...` becomes
/// `x is not defined`. Thrown primitives report their value; if nothing
/// else is available the protocol's summary text is used.
pub fn page_error_message(description: Option<&str>, value: Option<&Value>, text: &str) -> String {
    if let Some(desc) = description {
        let first = desc.lines().next().unwrap_or_default();
        return strip_error_class(first).to_string();
    }
    if let Some(value) = value {
        if let Some(s) = value.as_str() {
            return s.to_string();
        }
        if !value.is_null() {
            return value.to_string();
        }
    }
    text.to_string()
}

fn strip_error_class(line: &str) -> &str {
    let Some((class, rest)) = line.split_once(": ") else {
        return line;
    };
    let is_ident = !class.is_empty()
        && class
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident { rest } else { line }
}

/// Text for a browser log entry. The URL is appended since failed resource
/// loads only name the resource there.
pub fn log_entry_text(text: &str, url: Option<&str>) -> String {
    match url {
        Some(url) if !url.is_empty() && !text.contains(url) => format!("{text} ({url})"),
        _ => text.to_string(),
    }
}
