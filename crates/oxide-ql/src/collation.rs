//! Text collation and LIKE pattern matching.
//!
//! No ICU-equivalent crate sits in this engine's dependency stack, so the
//! "process-default locale collator" from §3 is implemented as a primary/
//! secondary weighted comparison (case-insensitive primary order, original
//! case as a tiebreak) rather than true locale-tailored collation. A real
//! deployment replacing this module would plug in an ICU- or
//! `unicode-collation`-backed implementation behind the same [`Collator`]
//! trait; see `DESIGN.md`.

use std::cmp::Ordering;

/// A pluggable text comparator. The index packing rules in §3 require the
/// packed byte key to be byte-sort equivalent to whatever a `Collator`
/// produces, so `sort_key` and `compare` must agree.
pub trait Collator: Send + Sync + std::fmt::Debug {
    /// Compares two strings under this collation.
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Produces a byte string such that byte-lexicographic order on the
    /// result matches `compare`'s order.
    fn sort_key(&self, s: &str) -> Vec<u8>;
}

/// The process-default collator: case-insensitive primary weight (by
/// lowercased bytes), original-case secondary weight as a tiebreaker so
/// that `"apple" < "Apple"` only when they'd otherwise tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollator;

impl Collator for DefaultCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let (la, lb) = (a.to_lowercase(), b.to_lowercase());
        la.as_bytes()
            .cmp(lb.as_bytes())
            .then_with(|| a.as_bytes().cmp(b.as_bytes()))
    }

    fn sort_key(&self, s: &str) -> Vec<u8> {
        let mut key = s.to_lowercase().into_bytes();
        // Separator byte (0x00 cannot appear in the lowercased primary
        // weight since it's stripped from valid UTF-8 text columns) then
        // the original bytes as the secondary weight.
        key.push(0);
        key.extend_from_slice(s.as_bytes());
        key
    }
}

/// Compiles a SQL LIKE pattern (`%` = any sequence, `_` = any single
/// character) into a case-insensitive matcher. Null never matches (callers
/// check for null before invoking this).
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: regex::Regex,
}

impl LikePattern {
    #[must_use]
    pub fn compile(pattern: &str) -> Self {
        let mut out = String::from("(?is)^");
        for ch in pattern.chars() {
            match ch {
                '%' => out.push_str(".*"),
                '_' => out.push('.'),
                c => out.push_str(&regex::escape(&c.to_string())),
            }
        }
        out.push('$');
        // A pattern built purely from literal/`%`/`_` tokens always
        // compiles; `unwrap` documents that invariant rather than
        // threading a Result through every LIKE call site.
        let regex = regex::Regex::new(&out).expect("LIKE pattern always compiles to valid regex");
        Self { regex }
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collator_is_case_insensitive_primary() {
        let c = DefaultCollator;
        assert_eq!(c.compare("apple", "APPLE"), Ordering::Less);
        assert_eq!(c.compare("apple", "banana"), Ordering::Less);
    }

    #[test]
    fn sort_key_order_matches_compare_order() {
        let c = DefaultCollator;
        let mut words = vec!["banana", "Apple", "apple", "cherry"];
        words.sort_by(|a, b| c.compare(a, b));
        let mut by_key = vec!["banana", "Apple", "apple", "cherry"];
        by_key.sort_by_key(|s| c.sort_key(s));
        assert_eq!(words, by_key);
    }

    #[test]
    fn like_percent_and_underscore() {
        let p = LikePattern::compile("a%e");
        assert!(p.is_match("apple"));
        assert!(p.is_match("ae"));
        assert!(!p.is_match("banana"));

        let p = LikePattern::compile("a_c");
        assert!(p.is_match("abc"));
        assert!(!p.is_match("ac"));
        assert!(!p.is_match("abbc"));
    }

    #[test]
    fn like_is_case_insensitive() {
        let p = LikePattern::compile("HELLO%");
        assert!(p.is_match("hello world"));
    }
}
