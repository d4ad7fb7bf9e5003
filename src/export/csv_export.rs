use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;

use crate::error::ExportError;
use crate::models::{ColumnMapping, MatchResult, Table};
use crate::orchestrator::summary::MergeSummary;

/// Column layout of the merged file.
#[derive(Debug, Clone)]
pub struct ResultLayout {
    pub headers: Vec<String>,
    /// Write every primary column ahead of the derived ones.
    pub keep_columns: bool,
}

impl ResultLayout {
    pub fn new(
        primary: &Table,
        p_map: &ColumnMapping,
        s_map: &ColumnMapping,
        keep_columns: bool,
    ) -> Self {
        let mut headers: Vec<String> = if keep_columns {
            primary.headers.clone()
        } else {
            vec![p_map.id.clone(), p_map.name.clone()]
        };
        headers.push(format!("{}_norm", p_map.name));
        headers.push("nn_match".to_string());
        headers.push("nn_score".to_string());
        headers.push(format!("nn_{}", s_map.id));
        headers.push(format!("nn_{}", s_map.name));
        Self {
            headers,
            keep_columns,
        }
    }
}

fn create_writer(path: &str, delimiter: u8) -> Result<Writer<BufWriter<File>>, ExportError> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    Ok(WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(buf_writer))
}

fn write_result<W: std::io::Write>(
    w: &mut Writer<W>,
    r: &MatchResult,
    primary: &Table,
    layout: &ResultLayout,
) -> Result<(), ExportError> {
    let score = r.score.to_string();
    let mut record: Vec<&str> = if layout.keep_columns {
        primary
            .rows
            .get(r.primary_row)
            .map(|row| row.values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    } else {
        vec![r.primary_id.as_str(), r.primary_name.as_str()]
    };
    // pad short rows so the derived columns stay aligned
    if layout.keep_columns {
        record.resize(primary.headers.len(), "");
    }
    record.push(&r.primary_norm);
    record.push(r.match_norm.as_deref().unwrap_or(""));
    record.push(&score);
    record.push(r.secondary_id.as_deref().unwrap_or(""));
    record.push(r.secondary_name.as_deref().unwrap_or(""));
    w.write_record(&record)?;
    Ok(())
}

pub fn export_results_csv(
    results: &[MatchResult],
    primary: &Table,
    layout: &ResultLayout,
    path: &str,
    delimiter: u8,
) -> Result<(), ExportError> {
    let mut w = create_writer(path, delimiter)?;
    w.write_record(&layout.headers)?;
    for r in results {
        write_result(&mut w, r, primary, layout)?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SummaryEntry<'a> {
    key: &'a str,
    value: String,
}

pub fn export_summary_csv(path: &str, s: &MergeSummary) -> Result<(), ExportError> {
    let mut w = create_writer(path, b',')?;
    let fmt_time = |dt: &chrono::DateTime<chrono::Utc>| -> String {
        format!("{} UTC", dt.format("%Y-%m-%d %H:%M:%S"))
    };
    // HH:MM:SS, hours may exceed 23
    let fmt_duration = |secs: f64| -> String {
        let total = secs.floor() as u64;
        format!(
            "{:02}:{:02}:{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    };
    let entries = [
        ("Primary file", s.primary_path.clone()),
        ("Secondary file", s.secondary_path.clone()),
        ("Entity type", s.profile.to_string()),
        ("Scorer", s.scorer.clone()),
        ("Period filter", s.period_mode.as_str().to_string()),
        ("Period partitions", s.period_partitions.to_string()),
        ("Total records (primary)", s.total_primary.to_string()),
        ("Total records (secondary)", s.total_secondary.to_string()),
        ("Matched", s.matched.to_string()),
        ("Exact matches (score 100)", s.exact_matches.to_string()),
        ("Unmatched", s.unmatched.to_string()),
        ("Mean score (matched)", format!("{:.2}", s.mean_score)),
        ("Started (UTC)", fmt_time(&s.started_utc)),
        ("Ended (UTC)", fmt_time(&s.ended_utc)),
        ("Duration", fmt_duration(s.duration_secs)),
    ];
    for (key, value) in entries {
        w.serialize(SummaryEntry { key, value })?;
    }
    w.flush()?;
    Ok(())
}
