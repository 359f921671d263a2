//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Turn `/product/{id:\d+}` into an anchored regular expression
//! - Extract named parameters from a matching path
//!
//! # Design Decisions
//! - Literal text is escaped; `{name:fragment}` becomes `(?P<name>fragment)`
//! - Fragments are used verbatim, so they may not contain `}`
//! - Compilation is lazy and cached; errors surface at resolution time
//! - Extracted values are raw strings, never coerced

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use thiserror::Error;

/// Named path parameters extracted from a pattern match.
pub type PathParams = HashMap<String, String>;

static PARAM_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+):([^}]+)\}").expect("parameter segment regex is valid"));

/// A route pattern that failed to compile.
#[derive(Debug, Clone, Error)]
#[error("pattern `{pattern}` does not compile: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// Returns true if `pattern` contains a dynamic segment.
pub fn is_dynamic(pattern: &str) -> bool {
    pattern.contains('{')
}

/// Build the anchored regex source for a pattern.
pub fn regex_source(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 16);
    source.push('^');

    let mut last = 0;
    for caps in PARAM_SEGMENT.captures_iter(pattern) {
        let Some(segment) = caps.get(0) else { continue };
        source.push_str(&regex::escape(&pattern[last..segment.start()]));
        source.push_str("(?P<");
        source.push_str(&caps[1]);
        source.push('>');
        source.push_str(&caps[2]);
        source.push(')');
        last = segment.end();
    }

    source.push_str(&regex::escape(&pattern[last..]));
    source.push('$');
    source
}

/// Compile a pattern into a regex.
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(&regex_source(pattern)).map_err(|e| PatternError {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// A registered pattern with its lazily compiled regex.
#[derive(Debug)]
pub struct PathPattern {
    source: String,
    compiled: OnceLock<Result<Regex, PatternError>>,
}

impl PathPattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    /// The pattern as registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn regex(&self) -> Result<&Regex, PatternError> {
        self.compiled
            .get_or_init(|| compile(&self.source))
            .as_ref()
            .map_err(|e| e.clone())
    }

    /// Force compilation, reporting a broken fragment.
    pub fn check(&self) -> Result<(), PatternError> {
        self.regex().map(|_| ())
    }

    /// Match `path` in full. `Ok(None)` means no match.
    pub fn captures(&self, path: &str) -> Result<Option<PathParams>, PatternError> {
        let regex = self.regex()?;
        let Some(caps) = regex.captures(path) else {
            return Ok(None);
        };

        let params = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Ok(Some(params))
    }
}
