use regex_lite::Regex;

use super::QueryError;

/// How the words of a name search are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Every word appears, in the given order.
    #[default]
    Ordered,
    /// Every word appears, in any order.
    Unordered,
    /// At least one word appears.
    Any,
    /// The search string is a case-sensitive regular expression.
    Regex,
}

/// Name predicate shared by every query worker.
///
/// Word modes compare lower-cased text; an empty search matches everything.
#[derive(Debug, Clone)]
pub enum NameMatcher {
    Ordered(Vec<String>),
    Unordered(Vec<String>),
    Any(Vec<String>),
    Regex(Regex),
}

impl NameMatcher {
    pub fn new(mode: MatchMode, search: &str) -> Result<Self, QueryError> {
        let words = || {
            search
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        };

        Ok(match mode {
            MatchMode::Ordered => NameMatcher::Ordered(words()),
            MatchMode::Unordered => NameMatcher::Unordered(words()),
            MatchMode::Any => NameMatcher::Any(words()),
            MatchMode::Regex => NameMatcher::Regex(
                Regex::new(search).map_err(|e| QueryError::InvalidPattern(e.to_string()))?,
            ),
        })
    }

    /// Matches every name.
    pub fn everything() -> Self {
        NameMatcher::Ordered(Vec::new())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Regex(re) => re.is_match(name),
            NameMatcher::Ordered(words) => {
                let name = name.to_lowercase();
                let mut rest = name.as_str();
                for word in words {
                    match rest.find(word.as_str()) {
                        Some(i) => rest = &rest[i + word.len()..],
                        None => return false,
                    }
                }
                true
            }
            NameMatcher::Unordered(words) => {
                let name = name.to_lowercase();
                words.iter().all(|w| name.contains(w.as_str()))
            }
            NameMatcher::Any(words) => {
                let name = name.to_lowercase();
                words.is_empty() || words.iter().any(|w| name.contains(w.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(mode: MatchMode, search: &str) -> NameMatcher {
        NameMatcher::new(mode, search).unwrap()
    }

    #[test]
    fn test_ordered_requires_word_order() {
        let m = matcher(MatchMode::Ordered, "Gentoo AMD64");
        assert!(m.matches("gentoo-install-amd64-minimal.iso"));
        assert!(!m.matches("amd64 gentoo"));
        assert!(!m.matches("gentoo only"));
    }

    #[test]
    fn test_ordered_words_do_not_overlap() {
        let m = matcher(MatchMode::Ordered, "ab ab");
        assert!(m.matches("ab-ab"));
        assert!(!m.matches("aab"));
    }

    #[test]
    fn test_unordered_and_any() {
        let unordered = matcher(MatchMode::Unordered, "amd64 gentoo");
        assert!(unordered.matches("Gentoo AMD64"));
        assert!(!unordered.matches("Gentoo x86"));

        let any = matcher(MatchMode::Any, "debian gentoo");
        assert!(any.matches("GENTOO x86"));
        assert!(!any.matches("arch linux"));
    }

    #[test]
    fn test_regex_is_case_sensitive() {
        let m = matcher(MatchMode::Regex, r"^Gentoo-\d+");
        assert!(m.matches("Gentoo-2024"));
        assert!(!m.matches("gentoo-2024"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            NameMatcher::new(MatchMode::Regex, "(unclosed"),
            Err(QueryError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_empty_search_matches_everything() {
        for mode in [MatchMode::Ordered, MatchMode::Unordered, MatchMode::Any] {
            assert!(matcher(mode, "  ").matches("anything"), "{mode:?}");
        }
        assert!(NameMatcher::everything().matches(""));
    }
}
