//! Wildcard pattern compilation.
//!
//! A rule pattern is plain URL text where `*` stands for any run of
//! characters (including none, and crossing `/`, `?` and `#`). Every other
//! character is literal, so `https://a.com/a+b?` only ever matches itself.
//!
//! Patterns are parsed once into a [`Pattern`] (literal segments and wildcard
//! markers). The full-match predicate and the capture predicate are both
//! rendered from that single representation.

use crate::error::{RuleError, Result};
use regex::{Regex, RegexBuilder};

/// Upper bound on the compiled size of a single rule pattern. Same as the
/// regex crate's default; all-literal patterns up to a few hundred thousand
/// characters fit.
pub const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// One piece of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that must appear verbatim.
    Literal(String),
    /// `*`: zero or more characters of any kind.
    Wildcard,
}

/// Parsed form of a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

/// How wildcards are rendered into a regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendering {
    /// Anchored at both ends, no groups.
    FullMatch,
    /// Unanchored, first wildcard captured.
    FirstCapture,
}

impl Pattern {
    /// Splits a pattern into literal segments and wildcards.
    ///
    /// Parsing never fails; adjacent wildcards are kept as separate markers.
    pub fn parse(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();

        for ch in pattern.chars() {
            if ch == '*' {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Wildcard);
            } else {
                literal.push(ch);
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: pattern.to_string(),
            segments,
        }
    }

    /// The pattern text as written by the user.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of `*` markers in the pattern.
    pub fn wildcard_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count()
    }

    /// Builds the anchored full-URL predicate.
    pub fn compile_match(&self) -> Result<MatchPredicate> {
        let regex = self.build_regex(Rendering::FullMatch)?;
        Ok(MatchPredicate { regex })
    }

    /// Builds the predicate that extracts the text matched by the first `*`.
    pub fn compile_capture(&self) -> Result<CapturePredicate> {
        let regex = self.build_regex(Rendering::FirstCapture)?;
        Ok(CapturePredicate {
            regex,
            captures: self.wildcard_count() > 0,
        })
    }

    fn build_regex(&self, rendering: Rendering) -> Result<Regex> {
        // `(?s)` lets wildcards span any character, newlines included.
        let mut re = String::from("(?s)");
        if rendering == Rendering::FullMatch {
            re.push('^');
        }

        let mut captured = false;
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => re.push_str(&regex::escape(text)),
                Segment::Wildcard => {
                    if rendering == Rendering::FirstCapture && !captured {
                        re.push_str("(.*)");
                        captured = true;
                    } else {
                        re.push_str(".*");
                    }
                }
            }
        }

        if rendering == Rendering::FullMatch {
            re.push('$');
        }

        RegexBuilder::new(&re)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| RuleError::pattern(&self.source, e.to_string()))
    }
}

/// Tests whether a URL matches a pattern in its entirety.
#[derive(Debug, Clone)]
pub struct MatchPredicate {
    regex: Regex,
}

impl MatchPredicate {
    pub fn test(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

/// Extracts the substring matched by a pattern's first wildcard.
#[derive(Debug, Clone)]
pub struct CapturePredicate {
    regex: Regex,
    captures: bool,
}

impl CapturePredicate {
    /// Returns the captured text, or `None` when the pattern has no wildcard
    /// or does not match `url`. An empty capture is `Some("")`.
    pub fn capture<'u>(&self, url: &'u str) -> Option<&'u str> {
        if !self.captures {
            return None;
        }
        self.regex
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Compiles a pattern into a full-match predicate.
pub fn compile_match(pattern: &str) -> Result<MatchPredicate> {
    Pattern::parse(pattern).compile_match()
}

/// Compiles a pattern into a first-wildcard capture predicate.
pub fn compile_capture(pattern: &str) -> Result<CapturePredicate> {
    Pattern::parse(pattern).compile_capture()
}

/// Both predicates for one pattern, compiled together.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: Pattern,
    matcher: MatchPredicate,
    capture: CapturePredicate,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let pattern = Pattern::parse(pattern);
        let matcher = pattern.compile_match()?;
        let capture = pattern.compile_capture()?;
        Ok(Self {
            pattern,
            matcher,
            capture,
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.matcher.test(url)
    }

    pub fn capture<'u>(&self, url: &'u str) -> Option<&'u str> {
        self.capture.capture(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let pattern = Pattern::parse("https://*.a.com/*");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("https://".to_string()),
                Segment::Wildcard,
                Segment::Literal(".a.com/".to_string()),
                Segment::Wildcard,
            ]
        );
        assert_eq!(pattern.wildcard_count(), 2);
        assert_eq!(pattern.as_str(), "https://*.a.com/*");
    }

    #[test]
    fn test_parse_adjacent_wildcards() {
        let pattern = Pattern::parse("a**b");
        assert_eq!(pattern.wildcard_count(), 2);
        assert!(Pattern::parse("").segments().is_empty());
    }

    #[test]
    fn test_literal_match_is_anchored() {
        let m = compile_match("https://a.com/x").unwrap();
        assert!(m.test("https://a.com/x"));
        assert!(!m.test("https://a.com/xy"));
        assert!(!m.test("xhttps://a.com/x"));
        assert!(!m.test("https://a.com/y"));
    }

    #[test]
    fn test_wildcard_crosses_boundaries() {
        let m = compile_match("https://a.com/*").unwrap();
        assert!(m.test("https://a.com/"));
        assert!(m.test("https://a.com/path/to?q=1#frag"));
        assert!(!m.test("https://b.com/x"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let m = compile_match("https://a.com/a+b?").unwrap();
        assert!(m.test("https://a.com/a+b?"));
        assert!(!m.test("https://a.com/aXb"));
        assert!(!m.test("https://a.com/aab"));

        let m = compile_match(r"https://a.com/(x)[y]{1}|^$\.").unwrap();
        assert!(m.test(r"https://a.com/(x)[y]{1}|^$\."));
        assert!(!m.test("https://a.com/x"));

        let m = compile_match("https://a.com/x.js").unwrap();
        assert!(!m.test("https://a.com/xzjs"));
    }

    #[test]
    fn test_capture_first_wildcard() {
        let c = compile_capture("https://a.com/*").unwrap();
        assert_eq!(c.capture("https://a.com/page1"), Some("page1"));
        assert_eq!(c.capture("https://a.com/"), Some(""));
    }

    #[test]
    fn test_capture_only_first_of_many() {
        let c = compile_capture("https://*.a.com/*").unwrap();
        assert_eq!(c.capture("https://cdn.a.com/lib.js"), Some("cdn"));
    }

    #[test]
    fn test_no_wildcard_no_capture() {
        let c = compile_capture("https://a.com/x").unwrap();
        assert_eq!(c.capture("https://a.com/x"), None);
    }

    #[test]
    fn test_long_literal_pattern_compiles() {
        let long = format!("https://a.com/{}", "x".repeat(50_000));
        let compiled = CompiledPattern::compile(&long).unwrap();
        assert!(compiled.is_match(&long));
    }

    #[test]
    fn test_oversized_pattern_fails() {
        let huge = format!("https://a.com/{}", "x".repeat(5_000_000));
        let err = CompiledPattern::compile(&huge).unwrap_err();
        assert!(matches!(err, RuleError::PatternCompile { .. }));
    }

    #[test]
    fn test_compiled_pattern() {
        let compiled = CompiledPattern::compile("http://*/api").unwrap();
        assert!(compiled.is_match("http://localhost:8080/api"));
        assert!(!compiled.is_match("http://localhost:8080/api/v2"));
        assert_eq!(compiled.capture("http://localhost:8080/api"), Some("localhost:8080"));
        assert_eq!(compiled.pattern().wildcard_count(), 1);
    }
}
