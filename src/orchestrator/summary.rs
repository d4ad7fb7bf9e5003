//! Run summary for a merge.

use chrono::{DateTime, Utc};

use crate::models::{EntityProfile, MatchResult};
use crate::util::partition::PeriodMode;

#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub primary_path: String,
    pub secondary_path: String,
    pub profile: EntityProfile,
    pub scorer: String,
    pub period_mode: PeriodMode,
    pub period_partitions: usize,
    pub total_primary: usize,
    pub total_secondary: usize,
    pub matched: usize,
    pub exact_matches: usize,
    pub unmatched: usize,
    pub mean_score: f64,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Builder for MergeSummary; statistics come from the result set.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    summary: MergeSummary,
}

impl SummaryBuilder {
    pub fn new(primary_path: &str, secondary_path: &str, started_utc: DateTime<Utc>) -> Self {
        Self {
            summary: MergeSummary {
                primary_path: primary_path.to_string(),
                secondary_path: secondary_path.to_string(),
                profile: EntityProfile::FirmUs,
                scorer: String::new(),
                period_mode: PeriodMode::None,
                period_partitions: 0,
                total_primary: 0,
                total_secondary: 0,
                matched: 0,
                exact_matches: 0,
                unmatched: 0,
                mean_score: 0.0,
                started_utc,
                ended_utc: started_utc,
                duration_secs: 0.0,
            },
        }
    }

    pub fn method(mut self, profile: EntityProfile, scorer: &str) -> Self {
        self.summary.profile = profile;
        self.summary.scorer = scorer.to_string();
        self
    }

    pub fn periods(mut self, mode: PeriodMode, partitions: usize) -> Self {
        self.summary.period_mode = mode;
        self.summary.period_partitions = partitions;
        self
    }

    pub fn totals(mut self, primary: usize, secondary: usize) -> Self {
        self.summary.total_primary = primary;
        self.summary.total_secondary = secondary;
        self
    }

    pub fn results(mut self, results: &[MatchResult]) -> Self {
        let matched: Vec<&MatchResult> = results.iter().filter(|r| r.is_matched()).collect();
        self.summary.matched = matched.len();
        self.summary.exact_matches = matched.iter().filter(|r| r.score == 100).count();
        self.summary.unmatched = results.len() - matched.len();
        self.summary.mean_score = if matched.is_empty() {
            0.0
        } else {
            matched.iter().map(|r| r.score as f64).sum::<f64>() / matched.len() as f64
        };
        self
    }

    pub fn finish(mut self, ended_utc: DateTime<Utc>) -> MergeSummary {
        self.summary.ended_utc = ended_utc;
        self.summary.duration_secs =
            (ended_utc - self.summary.started_utc).num_milliseconds().max(0) as f64 / 1000.0;
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u8, matched: bool) -> MatchResult {
        MatchResult {
            primary_row: 0,
            primary_id: "1".into(),
            primary_name: "A".into(),
            primary_norm: "a".into(),
            match_norm: matched.then(|| "a".to_string()),
            score,
            secondary_id: matched.then(|| "9".to_string()),
            secondary_name: matched.then(|| "A".to_string()),
        }
    }

    #[test]
    fn counts_and_mean_exclude_unmatched_rows() {
        let start = Utc::now();
        let rs = vec![result(100, true), result(80, true), result(0, false)];
        let s = SummaryBuilder::new("p.csv", "s.csv", start)
            .method(EntityProfile::Person, "indel")
            .totals(3, 5)
            .results(&rs)
            .finish(start + chrono::Duration::milliseconds(1500));
        assert_eq!(s.matched, 2);
        assert_eq!(s.exact_matches, 1);
        assert_eq!(s.unmatched, 1);
        assert_eq!(s.mean_score, 90.0);
        assert_eq!(s.duration_secs, 1.5);
        assert_eq!(s.profile, EntityProfile::Person);
    }
}
