use crate::util::partition::PeriodKey;

/// Rule set used to bring raw entity names into comparison form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum EntityProfile {
    /// Person names: titles dropped, tokens sorted.
    Person,
    /// US firms: domestic legal forms stripped.
    #[value(name = "firm-us")]
    FirmUs,
    /// International firms: domestic and foreign legal forms stripped.
    #[value(name = "firm-int")]
    FirmInternational,
}

impl EntityProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::FirmUs => "firm-us",
            Self::FirmInternational => "firm-int",
        }
    }
}

impl std::fmt::Display for EntityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Column mapping for one side of the merge; optional names left empty are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    pub id: String,
    pub name: String,
    pub year: Option<String>,
    pub quarter: Option<String>,
}

impl ColumnMapping {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            year: None,
            quarter: None,
        }
    }

    pub fn with_period(mut self, year: Option<&str>, quarter: Option<&str>) -> Self {
        self.year = non_empty(year);
        self.quarter = non_empty(quarter);
        self
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One input record; values are aligned with the owning table's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<String>,
}

impl Row {
    pub fn get(&self, idx: usize) -> &str {
        self.values.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column positions resolved from a [`ColumnMapping`] against a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundColumns {
    pub id: usize,
    pub name: usize,
    pub year: Option<usize>,
    pub quarter: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct NormalizedEntity {
    /// Position of the source row in its table.
    pub row: usize,
    pub id: String,
    pub name: String,
    pub norm: String,
    pub period: Option<PeriodKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub primary_row: usize,
    pub primary_id: String,
    pub primary_name: String,
    pub primary_norm: String,
    pub match_norm: Option<String>,
    pub score: u8,
    pub secondary_id: Option<String>,
    pub secondary_name: Option<String>,
}

impl MatchResult {
    pub fn unmatched(p: &NormalizedEntity) -> Self {
        Self {
            primary_row: p.row,
            primary_id: p.id.clone(),
            primary_name: p.name.clone(),
            primary_norm: p.norm.clone(),
            match_norm: None,
            score: 0,
            secondary_id: None,
            secondary_name: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.match_norm.is_some()
    }
}
