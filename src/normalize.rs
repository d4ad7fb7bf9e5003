use regex::Regex;
use std::sync::OnceLock;

use crate::models::{BoundColumns, EntityProfile, NormalizedEntity, Row};
use crate::util::partition::{PeriodKey, PeriodMode};

const US_LEGAL_FORMS: &str = "public limited company|public limited|limited|unlimited|partnership|\
incorporation|incorporated|corporation|plc|pbc|ltd|inc|corp|llc|lp|co|company|companies|\
hldgs|holdings|holding";

const INT_LEGAL_FORMS: &str = "ab|ag|as|asa|berhad|bhd|bv|cva|esp|jsc|jscb|kgaa|kpsc|ksc|kscp|\
nv|oyj|pcl|pt|publ|spa|sae|sa|saa|saog|se|spv|tbk";

const PERSON_TITLES: &[&str] = &[
    "Economics", "PharmD", "CISA", "MPPM", "Hons", "Hon", "BBA", "MBA", "JD", "MIM", "PhD",
    "FCPA", "CFA", "CPA", "FCA", "CMA", "MAI", "BSc", "BSC", "MSc", "MSC", "ESQ", "MS", "BA",
    "CA", "BE", "AM", "PE", "AO", "MD",
];

struct FirmPatterns {
    vendor_artifact: Regex,
    share_class: Regex,
    legal_us: Regex,
    legal_int: Regex,
    article_us: Regex,
    article_int: Regex,
}

fn firm_patterns() -> &'static FirmPatterns {
    static PATTERNS: OnceLock<FirmPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |re: &str| Regex::new(re).expect("static firm pattern");
        FirmPatterns {
            vendor_artifact: compile(r" (q[1-4].*?|old|adr)$"),
            share_class: compile(r" (cl ?a|cl ?b|redh)$"),
            legal_us: compile(&format!(" ({})$", US_LEGAL_FORMS)),
            legal_int: compile(&format!(" ({}|{})$", US_LEGAL_FORMS, INT_LEGAL_FORMS)),
            article_us: compile(r"^the "),
            article_int: compile(r"^(the|pt) "),
        }
    })
}

/// Strip diacritics by NFD decomposition, dropping combining marks.
pub fn fold_diacritics(input: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

pub fn normalize_name(raw: &str, profile: EntityProfile) -> String {
    match profile {
        EntityProfile::Person => normalize_person_name(raw),
        EntityProfile::FirmUs => normalize_firm_name(raw, false),
        EntityProfile::FirmInternational => normalize_firm_name(raw, true),
    }
}

pub fn normalize_firm_name(raw: &str, international: bool) -> String {
    let pats = firm_patterns();
    let lowered = fold_diacritics(raw).to_lowercase();
    let mut x: String = lowered
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();

    x = pats.vendor_artifact.replace(&x, "").into_owned();
    x = pats.share_class.replace(&x, "").into_owned();

    let legal = if international {
        &pats.legal_int
    } else {
        &pats.legal_us
    };
    while legal.is_match(&x) {
        x = legal.replace(&x, "").trim().to_string();
    }

    let article = if international {
        &pats.article_int
    } else {
        &pats.article_us
    };
    x = article.replace(&x, "").into_owned();
    x = x.replace(" and ", " ");
    x.retain(|c| c != ' ');
    x
}

pub fn normalize_person_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    let mut tokens: Vec<String> = cleaned
        .split_whitespace()
        .enumerate()
        // titles only count after the first token
        .filter(|(i, t)| *i == 0 || !PERSON_TITLES.contains(t))
        .map(|(_, t)| t.to_lowercase())
        .collect();
    tokens.sort();
    tokens.concat()
}

/// Build the comparison view of one row: normalized name plus its period key.
pub fn normalize_row(
    idx: usize,
    row: &Row,
    cols: &BoundColumns,
    profile: EntityProfile,
    mode: PeriodMode,
) -> NormalizedEntity {
    let name = row.get(cols.name);
    let period = match mode {
        PeriodMode::None => None,
        PeriodMode::Year => cols
            .year
            .and_then(|y| PeriodKey::from_values(row.get(y), None)),
        PeriodMode::YearQuarter => match (cols.year, cols.quarter) {
            (Some(y), Some(q)) => PeriodKey::from_values(row.get(y), Some(row.get(q))),
            _ => None,
        },
    };
    NormalizedEntity {
        row: idx,
        id: row.get(cols.id).to_string(),
        name: name.to_string(),
        norm: normalize_name(name, profile),
        period,
    }
}
