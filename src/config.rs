use crate::error::ConfigError;
use crate::matching::{MatchOptions, ProgressConfig, ScorerKind};
use crate::models::{ColumnMapping, EntityProfile};

/// One input file and the columns to read from it.
#[derive(Clone, Debug, Default)]
pub struct TableSource {
    pub path: String,
    pub columns: ColumnMapping,
    /// Field delimiter; sniffed from the header when absent.
    pub delimiter: Option<u8>,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub profile: EntityProfile,
    pub scorer: ScorerKind,
    pub min_score: u8,
    pub join_duplicates: bool,
    pub parallel: bool,
    pub batch_size: usize,
    pub update_every: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let progress = ProgressConfig::default();
        Self {
            profile: EntityProfile::FirmUs,
            scorer: ScorerKind::Indel,
            min_score: 0,
            join_duplicates: false,
            parallel: true,
            batch_size: progress.batch_size,
            update_every: progress.update_every,
        }
    }
}

impl MatchingConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            min_score: self.min_score,
            join_duplicates: self.join_duplicates,
            parallel: self.parallel,
            progress: ProgressConfig {
                update_every: self.update_every,
                batch_size: self.batch_size,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub out_path: String,
    pub delimiter: u8,
    pub keep_columns: bool,
    pub summary: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: "merge.csv".into(),
            delimiter: b';',
            keep_columns: false,
            summary: false,
        }
    }
}

impl ExportConfig {
    /// `<dir>/<stem>_summary.csv` next to the merged file.
    pub fn summary_path(&self) -> String {
        let p = std::path::Path::new(&self.out_path);
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("merge");
        let name = format!("{}_summary.csv", stem);
        match p.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(name).to_string_lossy().into_owned(),
            _ => name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub primary: TableSource,
    pub secondary: TableSource,
    pub matching: MatchingConfig,
    pub export: ExportConfig,
}

/// Parse a delimiter argument: a single ASCII character, or `tab` / `\t`.
pub fn parse_delimiter(s: &str) -> Result<u8, ConfigError> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(ConfigError::InvalidValue {
            field: "delimiter",
            reason: format!("'{}' is not a single ASCII character", other),
        }),
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sides = [
            (&self.primary, "primary.path", "primary.id", "primary.name"),
            (&self.secondary, "secondary.path", "secondary.id", "secondary.name"),
        ];
        for (src, path, id, name) in sides {
            if src.path.trim().is_empty() {
                return Err(ConfigError::MissingField { field: path });
            }
            if src.columns.id.trim().is_empty() {
                return Err(ConfigError::MissingField { field: id });
            }
            if src.columns.name.trim().is_empty() {
                return Err(ConfigError::MissingField { field: name });
            }
        }
        if self.matching.min_score > 100 {
            return Err(ConfigError::InvalidValue {
                field: "matching.min_score",
                reason: format!("{} not in 0..=100", self.matching.min_score),
            });
        }
        if self.matching.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.batch_size",
                reason: "must be > 0".into(),
            });
        }
        if self.matching.update_every == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.update_every",
                reason: "must be > 0".into(),
            });
        }
        if self.export.out_path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "export.out_path",
            });
        }
        if matches!(self.export.delimiter, b'"' | b'\n' | b'\r') {
            return Err(ConfigError::InvalidValue {
                field: "export.delimiter",
                reason: "quote and newline cannot be used as delimiters".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            primary: TableSource {
                path: "p.csv".into(),
                columns: ColumnMapping::new("gvkey", "conm"),
                delimiter: None,
            },
            secondary: TableSource {
                path: "s.csv".into(),
                columns: ColumnMapping::new("id", "name"),
                delimiter: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn default_config_with_sources_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_required_columns_are_reported() {
        let mut cfg = valid();
        cfg.secondary.columns.name = " ".into();
        match cfg.validate() {
            Err(ConfigError::MissingField { field }) => assert_eq!(field, "secondary.name"),
            other => panic!("unexpected: {:?}", other),
        }
        let mut cfg = valid();
        cfg.primary.columns.id.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField { field: "primary.id" })
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = valid();
        cfg.matching.min_score = 101;
        assert!(cfg.validate().is_err());
        let mut cfg = valid();
        cfg.matching.batch_size = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = valid();
        cfg.export.delimiter = b'"';
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_delimiters() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn summary_path_sits_next_to_output() {
        let mut e = ExportConfig::default();
        assert_eq!(e.summary_path(), "merge_summary.csv");
        e.out_path = "out/run1.csv".into();
        assert_eq!(e.summary_path(), "out/run1_summary.csv");
    }
}
