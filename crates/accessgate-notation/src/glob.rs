//! # Globs
//!
//! Dotted-path attribute globs such as `account.balance`, `*`, `!secret`
//! or `account.*`. A glob selects the matched path together with its whole
//! subtree, so `account` selects `account.id` as well.
//!
//! Segments are matched the same way event topics are: `*` as a whole
//! segment matches any single key, and a `*` inside a segment (`acc*`)
//! matches any run of characters within that key.

use std::cmp::Ordering;
use std::fmt;

/// Whole-segment wildcard.
pub const WILDCARD: &str = "*";

/// Prefix that turns a glob into an exclusion.
pub const NEGATION: char = '!';

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed attribute glob.
///
/// # Example
///
/// ```
/// use accessgate_notation::Glob;
///
/// let glob = Glob::parse("!account.*");
/// assert!(glob.is_negated());
/// assert_eq!(glob.notation(), "account.*");
/// assert!(glob.matches(&["account", "id"]));
/// assert!(!glob.matches(&["account"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Glob {
    negated: bool,
    segments: Vec<String>,
}

impl Glob {
    /// Parse a glob string. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let (negated, body) = match trimmed.strip_prefix(NEGATION) {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };

        Self {
            negated,
            segments: body
                .split(SEPARATOR)
                .map(|segment| segment.trim().to_string())
                .collect(),
        }
    }

    /// Whether this glob excludes the paths it matches.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The path segments, without the negation prefix.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this is the bare positive `*` glob (all fields).
    pub fn is_wildcard(&self) -> bool {
        !self.negated && self.segments.len() == 1 && self.segments[0] == WILDCARD
    }

    /// The dotted path of this glob, without the negation prefix.
    pub fn notation(&self) -> String {
        self.segments.join(".")
    }

    /// Copy of this glob with the given polarity.
    pub fn with_negation(&self, negated: bool) -> Self {
        Self {
            negated,
            segments: self.segments.clone(),
        }
    }

    /// Check if this glob selects the given path.
    ///
    /// A glob selects every path it is a prefix of, so `a.*` selects
    /// `a.b` and `a.b.c` but not `a` itself.
    ///
    /// # Arguments
    ///
    /// * `path` - The path segments to test
    ///
    /// # Returns
    ///
    /// `true` if the path lies inside the glob's subtree
    pub fn matches(&self, path: &[&str]) -> bool {
        path.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(pattern, key)| segment_matches(pattern, key))
    }

    /// Check if every path selected by `other` is also selected by this
    /// glob. Negation flags are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use accessgate_notation::Glob;
    ///
    /// assert!(Glob::parse("*").covers(&Glob::parse("account.id")));
    /// assert!(Glob::parse("account").covers(&Glob::parse("!account.*")));
    /// assert!(!Glob::parse("account.*").covers(&Glob::parse("account")));
    /// ```
    pub fn covers(&self, other: &Glob) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| segment_covers(a, b))
    }

    /// Check if some path is selected by both globs. Negation flags are
    /// ignored.
    pub fn intersects(&self, other: &Glob) -> bool {
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| segment_intersects(a, b))
    }

    /// The positive glob selecting exactly the paths both globs select, or
    /// `None` when they share no path or the overlap has no single-glob
    /// form (two different partial wildcards in one segment).
    ///
    /// # Example
    ///
    /// ```
    /// use accessgate_notation::Glob;
    ///
    /// let shared = Glob::parse("a").intersection(&Glob::parse("!*.b"));
    /// assert_eq!(shared, Some(Glob::parse("a.b")));
    /// assert_eq!(Glob::parse("a").intersection(&Glob::parse("b")), None);
    /// ```
    pub fn intersection(&self, other: &Glob) -> Option<Glob> {
        let (long, short) = if self.segments.len() >= other.segments.len() {
            (self, other)
        } else {
            (other, self)
        };

        let mut segments = Vec::with_capacity(long.segments.len());
        for (idx, segment) in long.segments.iter().enumerate() {
            let narrower = match short.segments.get(idx) {
                None => segment,
                Some(pattern) if segment_covers(pattern, segment) => segment,
                Some(pattern) if segment_covers(segment, pattern) => pattern,
                Some(_) => return None,
            };
            segments.push(narrower.clone());
        }

        Some(Self {
            negated: false,
            segments,
        })
    }

    /// Ordering used when globs are applied one after another: loose
    /// globs first, verbose globs last, positives before negations of the
    /// same shape.
    ///
    /// `[ "car.model", "*", "!car.*" ]` orders as
    /// `[ "*", "!car.*", "car.model" ]`.
    pub fn application_order(&self, other: &Glob) -> Ordering {
        self.segments
            .len()
            .cmp(&other.segments.len())
            .then_with(|| {
                let ranks = self.segments.iter().map(|s| segment_rank(s));
                ranks.cmp(other.segments.iter().map(|s| segment_rank(s)))
            })
            .then_with(|| self.negated.cmp(&other.negated))
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "{}{}", NEGATION, self.notation())
        } else {
            write!(f, "{}", self.notation())
        }
    }
}

impl From<&str> for Glob {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Sort globs into application order. The sort is stable, so globs of the
/// same shape keep their relative order.
pub fn sort_globs(globs: &mut [Glob]) {
    globs.sort_by(|a, b| a.application_order(b));
}

/// Check if a single segment pattern matches a key.
///
/// # Example
///
/// ```
/// use accessgate_notation::glob::segment_matches;
///
/// assert!(segment_matches("*", "anything"));
/// assert!(segment_matches("acc*", "account"));
/// assert!(segment_matches("*_id", "user_id"));
/// assert!(!segment_matches("acc*", "balance"));
/// ```
pub fn segment_matches(pattern: &str, key: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == key;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let mut p_idx = 0;
    let mut k_idx = 0;
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while k_idx < key.len() {
        if p_idx < pattern.len() && pattern[p_idx] == '*' {
            star = Some(p_idx);
            resume = k_idx;
            p_idx += 1;
        } else if p_idx < pattern.len() && pattern[p_idx] == key[k_idx] {
            p_idx += 1;
            k_idx += 1;
        } else if let Some(star_idx) = star {
            // Let the last star swallow one more character
            p_idx = star_idx + 1;
            resume += 1;
            k_idx = resume;
        } else {
            return false;
        }
    }

    pattern[p_idx..].iter().all(|c| *c == '*')
}

fn segment_covers(a: &str, b: &str) -> bool {
    if a == WILDCARD {
        return true;
    }
    if b.contains('*') {
        return a == b;
    }
    segment_matches(a, b)
}

fn segment_intersects(a: &str, b: &str) -> bool {
    match (a.contains('*'), b.contains('*')) {
        (false, false) => a == b,
        (true, false) => segment_matches(a, b),
        (false, true) => segment_matches(b, a),
        (true, true) => true,
    }
}

/// `*` sorts first, partial wildcards next, literal keys last.
fn segment_rank(segment: &str) -> u8 {
    if segment == WILDCARD {
        0
    } else if segment.contains('*') {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let glob = Glob::parse(" !account.balance ");
        assert!(glob.is_negated());
        assert_eq!(glob.segments(), &["account".to_string(), "balance".to_string()]);
        assert_eq!(glob.to_string(), "!account.balance");

        let glob = Glob::parse("*");
        assert!(glob.is_wildcard());
        assert!(!Glob::parse("!*").is_wildcard());
    }

    #[test]
    fn test_matches_subtree() {
        let glob = Glob::parse("account");
        assert!(glob.matches(&["account"]));
        assert!(glob.matches(&["account", "balance", "credit"]));
        assert!(!glob.matches(&["accounts"]));

        let glob = Glob::parse("account.*");
        assert!(!glob.matches(&["account"]));
        assert!(glob.matches(&["account", "id"]));
    }

    #[test]
    fn test_segment_matches() {
        assert!(segment_matches("a*c", "abc"));
        assert!(segment_matches("a*c", "ac"));
        assert!(segment_matches("a*b*c", "aXbYc"));
        assert!(!segment_matches("a*c", "abd"));
        assert!(segment_matches("**", ""));
        assert!(!segment_matches("name", "names"));
    }

    #[test]
    fn test_covers() {
        assert!(Glob::parse("*").covers(&Glob::parse("a.b.c")));
        assert!(Glob::parse("a").covers(&Glob::parse("a.b")));
        assert!(Glob::parse("a.*").covers(&Glob::parse("a.b")));
        assert!(Glob::parse("a*").covers(&Glob::parse("abc")));
        assert!(!Glob::parse("a*").covers(&Glob::parse("*")));
        assert!(!Glob::parse("a.b").covers(&Glob::parse("a")));
        assert!(!Glob::parse("a").covers(&Glob::parse("b")));
    }

    #[test]
    fn test_intersects() {
        assert!(Glob::parse("a").intersects(&Glob::parse("a.b")));
        assert!(Glob::parse("a.b").intersects(&Glob::parse("a")));
        assert!(Glob::parse("*.b").intersects(&Glob::parse("a.*")));
        assert!(!Glob::parse("a.b").intersects(&Glob::parse("a.c")));
        assert!(!Glob::parse("location").intersects(&Glob::parse("name")));
    }

    #[test]
    fn test_intersection() {
        let shared = |a: &str, b: &str| Glob::parse(a).intersection(&Glob::parse(b));

        assert_eq!(shared("*.b", "a.*"), Some(Glob::parse("a.b")));
        assert_eq!(shared("a", "a.b.c"), Some(Glob::parse("a.b.c")));
        assert_eq!(shared("acc*", "account"), Some(Glob::parse("account")));
        assert_eq!(shared("!a.*", "*"), Some(Glob::parse("a.*")));
        assert_eq!(shared("a.b", "a.c"), None);
        assert_eq!(shared("a*", "*b"), None);
    }

    #[test]
    fn test_application_order() {
        let mut globs: Vec<Glob> = ["car.model", "*", "!car.*"]
            .iter()
            .map(|s| Glob::parse(s))
            .collect();
        sort_globs(&mut globs);

        let ordered: Vec<String> = globs.iter().map(|g| g.to_string()).collect();
        assert_eq!(ordered, vec!["*", "!car.*", "car.model"]);
    }

    #[test]
    fn test_application_order_is_stable() {
        let mut globs: Vec<Glob> = ["name", "image", "!pwd", "title"]
            .iter()
            .map(|s| Glob::parse(s))
            .collect();
        sort_globs(&mut globs);

        let ordered: Vec<String> = globs.iter().map(|g| g.to_string()).collect();
        assert_eq!(ordered, vec!["name", "image", "title", "!pwd"]);
    }
}
