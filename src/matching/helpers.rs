//! Similarity scorers on an integer 0-100 scale.

use strsim::{jaro_winkler, levenshtein};

/// Pluggable similarity capability used by the matcher.
pub trait Similarity: Send + Sync {
    /// Score in `0..=100`; identical strings score 100.
    fn similarity(&self, a: &str, b: &str) -> u8;
}

#[inline]
fn to_score(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Normalized Indel similarity (insertions/deletions only), as in `fuzz.ratio`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn similarity(&self, a: &str, b: &str) -> u8 {
        if a == b {
            return 100;
        }
        to_score(rapidfuzz::fuzz::ratio(a.chars(), b.chars()))
    }
}

/// Levenshtein distance scaled by the longer string's length in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl Similarity for LevenshteinRatio {
    fn similarity(&self, a: &str, b: &str) -> u8 {
        if a == b {
            return 100;
        }
        let max_len = a.chars().count().max(b.chars().count());
        let dist = levenshtein(a, b);
        to_score(1.0 - dist as f64 / max_len as f64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerRatio;

impl Similarity for JaroWinklerRatio {
    fn similarity(&self, a: &str, b: &str) -> u8 {
        if a == b {
            return 100;
        }
        to_score(jaro_winkler(a, b))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, clap::ValueEnum)]
pub enum ScorerKind {
    #[default]
    Indel,
    Levenshtein,
    JaroWinkler,
}

impl ScorerKind {
    pub fn build(&self) -> Box<dyn Similarity> {
        match self {
            ScorerKind::Indel => Box::new(IndelRatio),
            ScorerKind::Levenshtein => Box::new(LevenshteinRatio),
            ScorerKind::JaroWinkler => Box::new(JaroWinklerRatio),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indel => "indel",
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro-winkler",
        }
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ScorerKind; 3] = [
        ScorerKind::Indel,
        ScorerKind::Levenshtein,
        ScorerKind::JaroWinkler,
    ];

    #[test]
    fn indel_matches_reference_example() {
        assert_eq!(
            IndelRatio.similarity("medicispharmaceutical", "medicispharmaceutcp"),
            90
        );
        // 2 * 3 / (4 + 3)
        assert_eq!(IndelRatio.similarity("abcd", "abc"), 86);
    }

    #[test]
    fn identical_strings_score_100() {
        for kind in ALL {
            let s = kind.build();
            assert_eq!(s.similarity("acme", "acme"), 100, "{kind}");
            assert_eq!(s.similarity("", ""), 100, "{kind}");
        }
    }

    #[test]
    fn scores_are_bounded() {
        let pairs = [
            ("", "abc"),
            ("abc", "xyz"),
            ("medicis", "medicispharmaceutical"),
            ("zürich", "zurich"),
        ];
        for kind in ALL {
            let s = kind.build();
            for (a, b) in pairs {
                assert!(s.similarity(a, b) <= 100, "{kind}: {a} / {b}");
            }
            assert_eq!(s.similarity("abc", "xyz"), 0, "{kind}");
        }
    }

    #[test]
    fn levenshtein_counts_characters() {
        // one substitution over six characters
        assert_eq!(LevenshteinRatio.similarity("zürich", "zurich"), 83);
    }
}
