use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::MatchError;
use crate::models::{BoundColumns, EntityProfile, MatchResult, NormalizedEntity, Table};
use crate::normalize::normalize_row;
use crate::util::partition::{PeriodIndex, PeriodMode};

// Similarity scorers
mod helpers;
pub use helpers::{IndelRatio, JaroWinklerRatio, LevenshteinRatio, ScorerKind, Similarity};

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub update_every: usize,
    pub batch_size: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            update_every: 1000,
            batch_size: 256,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f32,
    pub eta_secs: u64,
    pub stage: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Best candidates scoring below this are reported as unmatched.
    pub min_score: u8,
    /// Report every pool row sharing the winning normalized name.
    pub join_duplicates: bool,
    pub parallel: bool,
    pub progress: ProgressConfig,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_score: 0,
            join_duplicates: false,
            parallel: true,
            progress: ProgressConfig::default(),
        }
    }
}

/// Cancellation handle shared between the matcher and whoever drives the run.
#[derive(Clone, Default)]
pub struct MatchControl {
    cancel: Arc<AtomicBool>,
}

impl MatchControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// Normalize every row of a table; output keeps table order.
pub fn normalize_table(
    table: &Table,
    cols: &BoundColumns,
    profile: EntityProfile,
    mode: PeriodMode,
    parallel: bool,
) -> Vec<NormalizedEntity> {
    if parallel {
        table
            .rows
            .par_iter()
            .enumerate()
            .map(|(i, r)| normalize_row(i, r, cols, profile, mode))
            .collect()
    } else {
        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| normalize_row(i, r, cols, profile, mode))
            .collect()
    }
}

/// Highest-scoring pool position; ties keep the earliest candidate.
fn best_candidate(
    query: &str,
    pool: &[usize],
    secondary: &[NormalizedEntity],
    scorer: &dyn Similarity,
) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;
    for &i in pool {
        let score = scorer.similarity(query, &secondary[i].norm);
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((i, score));
            if score == 100 {
                break;
            }
        }
    }
    best
}

fn match_one(
    p: &NormalizedEntity,
    secondary: &[NormalizedEntity],
    index: &PeriodIndex,
    scorer: &dyn Similarity,
    opts: &MatchOptions,
) -> MatchResult {
    let pool = index.pool(p.period.as_ref());
    let Some((best, score)) = best_candidate(&p.norm, pool, secondary, scorer) else {
        return MatchResult::unmatched(p);
    };
    if score < opts.min_score {
        return MatchResult::unmatched(p);
    }
    let winner = &secondary[best];
    let (secondary_id, secondary_name) = if opts.join_duplicates {
        let dups: Vec<&NormalizedEntity> = pool
            .iter()
            .map(|&i| &secondary[i])
            .filter(|s| s.norm == winner.norm)
            .collect();
        (
            dups.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", "),
            dups.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", "),
        )
    } else {
        (winner.id.clone(), winner.name.clone())
    };
    MatchResult {
        primary_row: p.row,
        primary_id: p.id.clone(),
        primary_name: p.name.clone(),
        primary_norm: p.norm.clone(),
        match_norm: Some(winner.norm.clone()),
        score,
        secondary_id: Some(secondary_id),
        secondary_name: Some(secondary_name),
    }
}

/// Left join: one result per primary entity, in primary order.
///
/// Work proceeds in batches of `opts.progress.batch_size` primary rows. The
/// cancel flag is checked before each batch; a cancelled run discards its
/// partial results and returns [`MatchError::Stopped`].
pub fn fuzzy_left_join<F>(
    primary: &[NormalizedEntity],
    secondary: &[NormalizedEntity],
    index: &PeriodIndex,
    scorer: &dyn Similarity,
    opts: &MatchOptions,
    control: Option<&MatchControl>,
    progress: F,
) -> Result<Vec<MatchResult>, MatchError>
where
    F: Fn(ProgressUpdate),
{
    let start = Instant::now();
    let total = primary.len();
    let batch_size = opts.progress.batch_size.max(1);
    let update_every = opts.progress.update_every.max(1);
    let mut results: Vec<MatchResult> = Vec::with_capacity(total);
    let mut last_update = 0usize;

    for chunk in primary.chunks(batch_size) {
        if control.is_some_and(MatchControl::is_cancelled) {
            return Err(MatchError::Stopped {
                processed: results.len(),
                total,
            });
        }
        if opts.parallel {
            let batch: Vec<MatchResult> = chunk
                .par_iter()
                .map(|p| match_one(p, secondary, index, scorer, opts))
                .collect();
            results.extend(batch);
        } else {
            results.extend(
                chunk
                    .iter()
                    .map(|p| match_one(p, secondary, index, scorer, opts)),
            );
        }

        let processed = results.len();
        if processed - last_update >= update_every || processed == total {
            last_update = processed;
            progress(make_update(processed, total, start.elapsed(), "match"));
        }
    }

    if total == 0 {
        progress(make_update(0, 0, start.elapsed(), "match"));
    }
    Ok(results)
}

fn make_update(processed: usize, total: usize, elapsed: Duration, stage: &'static str) -> ProgressUpdate {
    let percent = if total == 0 {
        100.0
    } else {
        processed as f32 / total as f32 * 100.0
    };
    let eta_secs = if processed == 0 || processed >= total {
        0
    } else {
        let per_row = elapsed.as_secs_f64() / processed as f64;
        (per_row * (total - processed) as f64).round() as u64
    };
    ProgressUpdate {
        processed,
        total,
        percent,
        eta_secs,
        stage,
    }
}
