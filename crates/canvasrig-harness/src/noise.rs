#![forbid(unsafe_code)]

//! Separating benign environment chatter from real failures.
//!
//! Headless browsers running a canvas engine on software GL are noisy:
//! missing favicons, WebGL driver warnings, audio autoplay refusals, engine
//! resource warnings with their backtraces. None of these mean the target
//! is broken. The [`NoiseClassifier`] discards anything matching a known
//! pattern and fails on whatever is left.
//!
//! Filtering is per message, so the result does not depend on order and
//! running it twice gives the same residue.

use std::borrow::Cow;

use crate::error::{HarnessError, Result};

/// Substrings that mark a message as environment noise.
pub const DEFAULT_SUBSTRINGS: &[&str] = &[
    "favicon",
    "SharedArrayBuffer",
    "AudioContext was not allowed",
    "WebGL warning",
    "CONTEXT_LOST_WEBGL",
    "GPU stall",
    "WARNING: Node AnimationLibrary",
    "at: instantiate",
    "invalid bus index",
    "GL Driver Message",
    "GDScript backtrace",
];

/// Resource scheme of engine stack frames.
pub const RESOURCE_SCHEME: &str = "res://";

/// Structural matcher for engine backtrace lines such as
/// `[0] _ready (res://scenes/main.gd:12)`.
///
/// Shape: optional leading whitespace (line breaks included), `[`, one or
/// more ASCII digits, `] `, at least one character, then `(` immediately
/// followed by the scheme. The frame itself must fit on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrameMatcher {
    scheme: Cow<'static, str>,
}

impl StackFrameMatcher {
    pub fn new(scheme: impl Into<Cow<'static, str>>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        let line = message
            .trim_start()
            .split(['\n', '\r'])
            .next()
            .unwrap_or_default();
        let Some(rest) = line.strip_prefix('[') else {
            return false;
        };
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        let Some(tail) = rest[digits..].strip_prefix("] ") else {
            return false;
        };
        let needle = format!("({}", self.scheme);
        // The frame label needs at least one character before the location.
        tail.match_indices(&needle).any(|(idx, _)| idx >= 1)
    }
}

impl Default for StackFrameMatcher {
    fn default() -> Self {
        Self::new(RESOURCE_SCHEME)
    }
}

/// One entry of the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoisePattern {
    /// Matches any message containing the text.
    Substring(Cow<'static, str>),
    /// Matches engine backtrace lines.
    StackFrame(StackFrameMatcher),
}

impl NoisePattern {
    pub fn substring(text: impl Into<Cow<'static, str>>) -> Self {
        Self::Substring(text.into())
    }

    pub fn matches(&self, message: &str) -> bool {
        match self {
            Self::Substring(text) => message.contains(text.as_ref()),
            Self::StackFrame(matcher) => matcher.matches(message),
        }
    }
}

/// Allow-list filter over diagnostic messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseClassifier {
    patterns: Vec<NoisePattern>,
}

impl Default for NoiseClassifier {
    /// The allow-list for a canvas engine on software WebGL.
    fn default() -> Self {
        let mut patterns: Vec<NoisePattern> = DEFAULT_SUBSTRINGS
            .iter()
            .map(|s| NoisePattern::substring(*s))
            .collect();
        patterns.push(NoisePattern::StackFrame(StackFrameMatcher::default()));
        Self { patterns }
    }
}

impl NoiseClassifier {
    /// A classifier that treats every message as a failure.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: NoisePattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn with_substring(self, text: impl Into<Cow<'static, str>>) -> Self {
        self.with_pattern(NoisePattern::substring(text))
    }

    /// Add several substrings at once. Empty strings are skipped since they
    /// would match everything.
    #[must_use]
    pub fn with_substrings<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            let text = text.into();
            if !text.is_empty() {
                self.patterns.push(NoisePattern::Substring(Cow::Owned(text)));
            }
        }
        self
    }

    pub fn patterns(&self) -> &[NoisePattern] {
        &self.patterns
    }

    pub fn is_noise(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(message))
    }

    /// Messages that match no pattern, in input order.
    pub fn residue<'a, S: AsRef<str>>(&self, messages: &'a [S]) -> Vec<&'a str> {
        messages
            .iter()
            .map(AsRef::as_ref)
            .filter(|msg| !self.is_noise(msg))
            .collect()
    }

    /// Fail with [`HarnessError::UnexpectedDiagnostics`] if anything survives
    /// the filter.
    pub fn assert_healthy<S: AsRef<str>>(&self, messages: &[S], context: &str) -> Result<()> {
        let residue = self.residue(messages);
        if residue.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            context,
            residue = residue.len(),
            total = messages.len(),
            "diagnostics survived noise filter"
        );
        Err(HarnessError::UnexpectedDiagnostics {
            context: context.to_string(),
            residue: residue.into_iter().map(str::to_string).collect(),
        })
    }
}
