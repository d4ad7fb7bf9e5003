//! Orchestrator module: one merge run from input files to output CSV.
//!
//! Steps: load both tables, bind the configured columns, normalize names,
//! index the secondary side by period, run the left join, then write the
//! merged file and, when asked, the run summary.

pub mod summary;

use anyhow::{Context, Result};
use log::info;

use crate::config::AppConfig;
use crate::export::csv_export::{ResultLayout, export_results_csv, export_summary_csv};
use crate::import::{bind_columns, read_table};
use crate::matching::{MatchControl, fuzzy_left_join, normalize_table};
use crate::util::partition::{PeriodIndex, PeriodMode};
use summary::{MergeSummary, SummaryBuilder};

/// Execute a full merge. A cancelled run writes nothing and returns
/// [`crate::error::MatchError::Stopped`] inside the error.
pub fn run_merge(cfg: &AppConfig, control: &MatchControl) -> Result<MergeSummary> {
    cfg.validate().context("invalid configuration")?;
    let run_start_utc = chrono::Utc::now();

    let primary = read_table(&cfg.primary.path, cfg.primary.delimiter)
        .with_context(|| format!("loading primary file {}", cfg.primary.path))?;
    let secondary = read_table(&cfg.secondary.path, cfg.secondary.delimiter)
        .with_context(|| format!("loading secondary file {}", cfg.secondary.path))?;
    info!(
        "Loaded {} primary rows from {} and {} secondary rows from {}",
        primary.len(),
        cfg.primary.path,
        secondary.len(),
        cfg.secondary.path
    );

    let p_cols = bind_columns(&primary, &cfg.primary.columns, "primary")?;
    let s_cols = bind_columns(&secondary, &cfg.secondary.columns, "secondary")?;

    let mode = PeriodMode::resolve(&cfg.primary.columns, &cfg.secondary.columns);
    let m = &cfg.matching;
    info!(
        "Matching as {} with {} scorer, period filter: {}",
        m.profile,
        m.scorer,
        mode.as_str()
    );

    let p_norm = normalize_table(&primary, &p_cols, m.profile, mode, m.parallel);
    let s_norm = normalize_table(&secondary, &s_cols, m.profile, mode, m.parallel);
    let index = PeriodIndex::build(&s_norm, mode);

    let scorer = m.scorer.build();
    let opts = m.match_options();
    let results = fuzzy_left_join(
        &p_norm,
        &s_norm,
        &index,
        scorer.as_ref(),
        &opts,
        Some(control),
        |u| {
            info!(
                "[{}] Progress: {:.1}% ({} / {}) | ETA: {}s",
                u.stage, u.percent, u.processed, u.total, u.eta_secs
            );
        },
    )?;

    let layout = ResultLayout::new(
        &primary,
        &cfg.primary.columns,
        &cfg.secondary.columns,
        cfg.export.keep_columns,
    );
    export_results_csv(
        &results,
        &primary,
        &layout,
        &cfg.export.out_path,
        cfg.export.delimiter,
    )
    .with_context(|| format!("writing {}", cfg.export.out_path))?;
    info!("Wrote {} rows to {}", results.len(), cfg.export.out_path);

    let summary = SummaryBuilder::new(&cfg.primary.path, &cfg.secondary.path, run_start_utc)
        .method(m.profile, m.scorer.as_str())
        .periods(mode, index.partition_count())
        .totals(primary.len(), secondary.len())
        .results(&results)
        .finish(chrono::Utc::now());
    info!(
        "Matched {} of {} primary rows ({} exact), mean score {:.2}",
        summary.matched, summary.total_primary, summary.exact_matches, summary.mean_score
    );

    if cfg.export.summary {
        let path = cfg.export.summary_path();
        export_summary_csv(&path, &summary).with_context(|| format!("writing {}", path))?;
        info!("Summary written to {}", path);
    }
    Ok(summary)
}
