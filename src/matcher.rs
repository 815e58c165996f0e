//! Path patterns for rule selectors.
//!
//! Patterns are regular expressions over normalized, forward-slash,
//! case-sensitive module paths. A "to" pattern may refer to the capture
//! groups of the paired "from" match with `$1`..`$9`; the captures travel
//! explicitly as a [`CaptureContext`] from the "from" match into the "to"
//! test.
//!
//! ```
//! use cruise_kernel::matcher::PathMatcher;
//!
//! let from = PathMatcher::compile("^src/([^/]+)/").unwrap();
//! let to = PathMatcher::compile("^src/$1/").unwrap();
//!
//! let ctx = from.captures("src/billing/invoice.js").unwrap();
//! assert!(to.test("src/billing/tax.js", Some(&ctx)));
//! assert!(!to.test("src/shipping/route.js", Some(&ctx)));
//! ```

use lru::LruCache;
use parking_lot::Mutex;
use regex_lite::Regex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Placeholder substituted for group references when validating a template.
const TEMPLATE_PLACEHOLDER: &str = "(?:x)";

/// Expanded templates kept per pattern, least recently used evicted first.
const EXPANSION_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => panic!("expansion capacity must be non-zero"),
};

/// Capture groups of a "from" match. Group 0 is the whole match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureContext {
    groups: Vec<Option<String>>,
}

impl CaptureContext {
    /// A context without groups.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Text of group `index`, if it participated in the match.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// Number of groups including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when there are no groups at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A compiled path pattern.
#[derive(Clone)]
pub struct PathMatcher {
    source: String,
    regex: Regex,
    template: bool,
    expanded: Arc<Mutex<LruCache<String, Option<Regex>>>>,
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("source", &self.source)
            .field("template", &self.template)
            .finish()
    }
}

impl PathMatcher {
    /// Compile a pattern.
    ///
    /// Patterns containing group references are validated by compiling them
    /// with a placeholder in place of each reference, so a template that
    /// compiles here also compiles for any captured text.
    pub fn compile(pattern: &str) -> Result<Self, regex_lite::Error> {
        let template = has_group_reference(pattern);
        let regex = if template {
            Regex::new(&substitute(pattern, |_| Some(TEMPLATE_PLACEHOLDER.to_string())))?
        } else {
            Regex::new(pattern)?
        };

        Ok(Self {
            source: pattern.to_string(),
            regex,
            template,
            expanded: Arc::new(Mutex::new(LruCache::new(EXPANSION_CAPACITY))),
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern refers to "from" capture groups.
    pub fn is_template(&self) -> bool {
        self.template
    }

    /// Match `path` and return its capture groups.
    ///
    /// Only meaningful for plain patterns; a template's captures are those of
    /// its placeholder form.
    pub fn captures(&self, path: &str) -> Option<CaptureContext> {
        let caps = self.regex.captures(path)?;
        let groups = (0..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();
        Some(CaptureContext { groups })
    }

    /// Test `path` against the pattern, expanding group references from
    /// `captures`. Missing groups expand to the empty string.
    pub fn test(&self, path: &str, captures: Option<&CaptureContext>) -> bool {
        if !self.template {
            return self.regex.is_match(path);
        }

        let expanded = substitute(&self.source, |index| {
            let text = captures.and_then(|c| c.group(index)).unwrap_or("");
            Some(format!("(?:{})", regex_lite::escape(text)))
        });

        let mut cache = self.expanded.lock();
        let regex = cache.get_or_insert(expanded.clone(), || match Regex::new(&expanded) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(pattern = %expanded, error = %e, "expanded path pattern does not compile");
                None
            }
        });
        regex.as_ref().map_or(false, |r| r.is_match(path))
    }
}

/// A positive and a negative pattern; both optional.
#[derive(Debug, Clone, Default)]
pub struct PathSelector {
    path: Option<PathMatcher>,
    path_not: Option<PathMatcher>,
}

impl PathSelector {
    /// A selector that matches every path.
    pub fn any() -> Self {
        Self::default()
    }

    /// Combine already compiled matchers.
    pub fn new(path: Option<PathMatcher>, path_not: Option<PathMatcher>) -> Self {
        Self { path, path_not }
    }

    /// Compile a selector from optional patterns.
    pub fn compile(path: Option<&str>, path_not: Option<&str>) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            path: path.map(PathMatcher::compile).transpose()?,
            path_not: path_not.map(PathMatcher::compile).transpose()?,
        })
    }

    /// True when neither pattern is set.
    pub fn is_unconstrained(&self) -> bool {
        self.path.is_none() && self.path_not.is_none()
    }

    /// "From" side: if `path` is selected, return the captures of the
    /// positive pattern (empty when there is none).
    pub fn select(&self, path: &str) -> Option<CaptureContext> {
        if let Some(not) = &self.path_not {
            if not.test(path, None) {
                return None;
            }
        }
        match &self.path {
            Some(matcher) => matcher.captures(path),
            None => Some(CaptureContext::empty()),
        }
    }

    /// "To" side: test `path` with group references expanded from `captures`.
    pub fn matches(&self, path: &str, captures: Option<&CaptureContext>) -> bool {
        if let Some(not) = &self.path_not {
            if not.test(path, captures) {
                return false;
            }
        }
        self.path.as_ref().map_or(true, |m| m.test(path, captures))
    }

    /// Pattern sources, for fingerprinting.
    pub fn sources(&self) -> (Option<&str>, Option<&str>) {
        (
            self.path.as_ref().map(PathMatcher::as_str),
            self.path_not.as_ref().map(PathMatcher::as_str),
        )
    }
}

fn has_group_reference(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    bytes
        .windows(2)
        .enumerate()
        .any(|(i, w)| w[0] == b'$' && matches!(w[1], b'1'..=b'9') && !is_escaped(bytes, i))
}

/// Replace each unescaped `$n` (n in 1..=9) with `replace(n)`.
fn substitute(pattern: &str, mut replace: impl FnMut(usize) -> Option<String>) -> String {
    let bytes = pattern.as_bytes();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$'
            && i + 1 < bytes.len()
            && matches!(bytes[i + 1], b'1'..=b'9')
            && !is_escaped(bytes, i)
        {
            let index = (bytes[i + 1] - b'0') as usize;
            if let Some(text) = replace(index) {
                out.push_str(&text);
                i += 2;
                continue;
            }
        }
        // Multi-byte characters are copied whole.
        let ch_len = pattern[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&pattern[i..i + ch_len]);
        i += ch_len;
    }
    out
}

/// An odd number of backslashes before position `i` escapes it.
fn is_escaped(bytes: &[u8], i: usize) -> bool {
    bytes[..i].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}
