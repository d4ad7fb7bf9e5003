use crate::config::{AppConfig, ExportConfig, MatchingConfig, TableSource, parse_delimiter};
use crate::error::ConfigError;
use crate::matching::ScorerKind;
use crate::models::{ColumnMapping, EntityProfile};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fuzzy_merge",
    version,
    about = "Fuzzy left join of two tables on normalized entity names",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match every primary row to its most similar secondary row
    Match(MatchArgs),
    /// Write a commented .env template
    EnvTemplate {
        #[arg(value_name = "PATH", default_value = ".env.template")]
        path: String,
    },
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Primary file; every row appears in the output (env: FUZZY_MERGE_PRIMARY)
    #[arg(long, value_name = "FILE", env = "FUZZY_MERGE_PRIMARY")]
    pub primary: String,
    /// Primary ID column
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_PRIMARY_ID")]
    pub primary_id: String,
    /// Primary entity name column
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_PRIMARY_NAME")]
    pub primary_name: String,
    /// Primary year column (optional)
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_PRIMARY_YEAR")]
    pub primary_year: Option<String>,
    /// Primary quarter column (optional, needs a year column)
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_PRIMARY_QUARTER")]
    pub primary_quarter: Option<String>,

    /// Secondary file searched for matches (env: FUZZY_MERGE_SECONDARY)
    #[arg(long, value_name = "FILE", env = "FUZZY_MERGE_SECONDARY")]
    pub secondary: String,
    /// Secondary ID column
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_SECONDARY_ID")]
    pub secondary_id: String,
    /// Secondary entity name column
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_SECONDARY_NAME")]
    pub secondary_name: String,
    /// Secondary year column (optional)
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_SECONDARY_YEAR")]
    pub secondary_year: Option<String>,
    /// Secondary quarter column (optional, needs a year column)
    #[arg(long, value_name = "COLUMN", env = "FUZZY_MERGE_SECONDARY_QUARTER")]
    pub secondary_quarter: Option<String>,
    /// Input field delimiter for both files; sniffed from the header when omitted
    #[arg(long, value_name = "CHAR", env = "FUZZY_MERGE_INPUT_DELIMITER", value_parser = parse_delimiter)]
    pub input_delimiter: Option<u8>,

    /// Entity type selecting the normalization rules
    #[arg(long, value_enum, env = "FUZZY_MERGE_ENTITY", default_value_t = EntityProfile::FirmUs)]
    pub entity: EntityProfile,
    /// Similarity scorer
    #[arg(long, value_enum, env = "FUZZY_MERGE_SCORER", default_value_t = ScorerKind::Indel)]
    pub scorer: ScorerKind,
    /// Best candidates scoring below this are left unmatched
    #[arg(
        long,
        value_name = "SCORE",
        env = "FUZZY_MERGE_MIN_SCORE",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub min_score: u8,
    /// Report every secondary row sharing the winning normalized name
    #[arg(long = "join-duplicates", env = "FUZZY_MERGE_JOIN_DUPLICATES")]
    pub join_duplicates: bool,

    /// Output path
    #[arg(long, value_name = "FILE", env = "FUZZY_MERGE_OUT", default_value = "merge.csv")]
    pub out: String,
    /// Output field delimiter
    #[arg(long, value_name = "CHAR", env = "FUZZY_MERGE_DELIMITER", default_value = ";", value_parser = parse_delimiter)]
    pub delimiter: u8,
    /// Carry every primary column into the output
    #[arg(long = "keep-columns", env = "FUZZY_MERGE_KEEP_COLUMNS")]
    pub keep_columns: bool,
    /// Also write <out stem>_summary.csv
    #[arg(long, env = "FUZZY_MERGE_SUMMARY")]
    pub summary: bool,

    /// Search rows on a single thread
    #[arg(long, env = "FUZZY_MERGE_SEQUENTIAL")]
    pub sequential: bool,
    /// Primary rows per batch; cancellation is checked between batches
    #[arg(long, value_name = "ROWS", env = "FUZZY_MERGE_BATCH_SIZE", default_value_t = 256)]
    pub batch_size: usize,
    /// Log progress every N primary rows
    #[arg(long, value_name = "ROWS", env = "FUZZY_MERGE_PROGRESS_EVERY", default_value_t = 1000)]
    pub progress_every: usize,
}

impl MatchArgs {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let cfg = AppConfig {
            primary: TableSource {
                path: self.primary.clone(),
                columns: ColumnMapping::new(&self.primary_id, &self.primary_name).with_period(
                    self.primary_year.as_deref(),
                    self.primary_quarter.as_deref(),
                ),
                delimiter: self.input_delimiter,
            },
            secondary: TableSource {
                path: self.secondary.clone(),
                columns: ColumnMapping::new(&self.secondary_id, &self.secondary_name)
                    .with_period(
                        self.secondary_year.as_deref(),
                        self.secondary_quarter.as_deref(),
                    ),
                delimiter: self.input_delimiter,
            },
            matching: MatchingConfig {
                profile: self.entity,
                scorer: self.scorer,
                min_score: self.min_score,
                join_duplicates: self.join_duplicates,
                parallel: !self.sequential,
                batch_size: self.batch_size,
                update_every: self.progress_every,
            },
            export: ExportConfig {
                out_path: self.out.clone(),
                delimiter: self.delimiter,
                keep_columns: self.keep_columns,
                summary: self.summary,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec![
            "fuzzy_merge",
            "match",
            "--primary",
            "p.csv",
            "--primary-id",
            "gvkey",
            "--primary-name",
            "conm",
            "--secondary",
            "s.csv",
            "--secondary-id",
            "execid",
            "--secondary-name",
            "coname",
        ];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    fn match_args(cli: Cli) -> MatchArgs {
        match cli.command {
            Command::Match(m) => m,
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_follow_firm_us_indel() {
        let m = match_args(parse(&[]).unwrap());
        let cfg = m.to_app_config().unwrap();
        assert_eq!(cfg.matching.profile, EntityProfile::FirmUs);
        assert_eq!(cfg.matching.scorer, ScorerKind::Indel);
        assert_eq!(cfg.export.out_path, "merge.csv");
        assert_eq!(cfg.export.delimiter, b';');
        assert!(cfg.matching.parallel);
        assert!(cfg.primary.columns.year.is_none());
    }

    #[test]
    fn period_and_matching_flags() {
        let m = match_args(
            parse(&[
                "--primary-year",
                "fyear",
                "--primary-quarter",
                "",
                "--secondary-year",
                "year",
                "--entity",
                "person",
                "--scorer",
                "jaro-winkler",
                "--min-score",
                "85",
                "--delimiter",
                "tab",
                "--sequential",
                "--keep-columns",
            ])
            .unwrap(),
        );
        let cfg = m.to_app_config().unwrap();
        assert_eq!(cfg.primary.columns.year.as_deref(), Some("fyear"));
        // blank optional columns count as not configured
        assert!(cfg.primary.columns.quarter.is_none());
        assert_eq!(cfg.secondary.columns.year.as_deref(), Some("year"));
        assert_eq!(cfg.matching.profile, EntityProfile::Person);
        assert_eq!(cfg.matching.scorer, ScorerKind::JaroWinkler);
        assert_eq!(cfg.matching.min_score, 85);
        assert_eq!(cfg.export.delimiter, b'\t');
        assert!(!cfg.matching.parallel);
        assert!(cfg.export.keep_columns);
    }

    #[test]
    fn rejects_out_of_range_score_and_bad_entity() {
        assert!(parse(&["--min-score", "120"]).is_err());
        assert!(parse(&["--entity", "government"]).is_err());
    }

    #[test]
    fn blank_required_column_fails_validation() {
        let mut m = match_args(parse(&[]).unwrap());
        m.secondary_id = "  ".into();
        assert!(matches!(
            m.to_app_config(),
            Err(ConfigError::MissingField {
                field: "secondary.id"
            })
        ));
    }

    #[test]
    fn env_template_subcommand() {
        let cli = Cli::try_parse_from(["fuzzy_merge", "env-template"]).unwrap();
        match cli.command {
            Command::EnvTemplate { path } => assert_eq!(path, ".env.template"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
