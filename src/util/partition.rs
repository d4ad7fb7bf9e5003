use std::collections::HashMap;

use crate::models::{ColumnMapping, NormalizedEntity};

/// How candidate pools are restricted by period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMode {
    None,
    Year,
    YearQuarter,
}

impl PeriodMode {
    /// Year + quarter needs both columns on both sides; year alone needs year on both sides.
    pub fn resolve(primary: &ColumnMapping, secondary: &ColumnMapping) -> Self {
        let years = primary.year.is_some() && secondary.year.is_some();
        let quarters = primary.quarter.is_some() && secondary.quarter.is_some();
        if years && quarters {
            PeriodMode::YearQuarter
        } else if years {
            if primary.quarter.is_some() || secondary.quarter.is_some() {
                log::warn!("Quarter column configured on one side only; filtering by year only");
            }
            PeriodMode::Year
        } else {
            if primary.year.is_some() || secondary.year.is_some() {
                log::warn!("Year column configured on one side only; period filtering disabled");
            } else if primary.quarter.is_some() || secondary.quarter.is_some() {
                log::warn!("Quarter filtering requires year columns on both sides; ignored");
            }
            PeriodMode::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Year => "year",
            Self::YearQuarter => "year+quarter",
        }
    }
}

/// Canonical period value: trimmed, integral numbers written without a fraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub year: String,
    pub quarter: Option<String>,
}

impl PeriodKey {
    /// Returns `None` when any configured period value is blank.
    pub fn from_values(year: &str, quarter: Option<&str>) -> Option<Self> {
        let year = canonical_value(year)?;
        let quarter = match quarter {
            Some(q) => Some(canonical_value(q)?),
            None => None,
        };
        Some(Self { year, quarter })
    }
}

fn canonical_value(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
            Some(format!("{}", v as i64))
        }
        Ok(v) if v.is_nan() => None,
        Ok(v) if v.is_finite() => Some(v.to_string()),
        _ => Some(s.to_string()),
    }
}

/// Secondary rows grouped by period, each group in original table order.
#[derive(Debug, Clone)]
pub struct PeriodIndex {
    mode: PeriodMode,
    all: Vec<usize>,
    by_period: HashMap<PeriodKey, Vec<usize>>,
}

impl PeriodIndex {
    pub fn build(secondary: &[NormalizedEntity], mode: PeriodMode) -> Self {
        let all: Vec<usize> = (0..secondary.len()).collect();
        let mut by_period: HashMap<PeriodKey, Vec<usize>> = HashMap::new();
        if mode != PeriodMode::None {
            for (i, e) in secondary.iter().enumerate() {
                if let Some(key) = &e.period {
                    by_period.entry(key.clone()).or_default().push(i);
                }
            }
            log::debug!(
                "Indexed {} secondary rows into {} period partitions",
                secondary.len(),
                by_period.len()
            );
        }
        Self {
            mode,
            all,
            by_period,
        }
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn partition_count(&self) -> usize {
        match self.mode {
            PeriodMode::None => 1,
            _ => self.by_period.len(),
        }
    }

    /// Candidate positions for a primary row with the given period.
    pub fn pool(&self, period: Option<&PeriodKey>) -> &[usize] {
        match self.mode {
            PeriodMode::None => &self.all,
            _ => period
                .and_then(|k| self.by_period.get(k))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(row: usize, period: Option<PeriodKey>) -> NormalizedEntity {
        NormalizedEntity {
            row,
            id: row.to_string(),
            name: String::new(),
            norm: String::new(),
            period,
        }
    }

    #[test]
    fn numeric_period_values_compare_numerically() {
        assert_eq!(
            PeriodKey::from_values("2020", None),
            PeriodKey::from_values(" 2020.0 ", None)
        );
        assert_ne!(
            PeriodKey::from_values("2020", Some("1")),
            PeriodKey::from_values("2020", Some("2"))
        );
        assert_eq!(
            PeriodKey::from_values("FY2020", None).map(|k| k.year),
            Some("FY2020".to_string())
        );
    }

    #[test]
    fn blank_period_values_have_no_key() {
        assert!(PeriodKey::from_values("", None).is_none());
        assert!(PeriodKey::from_values("2020", Some(" ")).is_none());
        assert!(PeriodKey::from_values("NaN", None).is_none());
    }

    #[test]
    fn mode_requires_both_sides() {
        let p = ColumnMapping::new("id", "name").with_period(Some("fyear"), Some("fqtr"));
        let s = ColumnMapping::new("id", "name").with_period(Some("year"), Some("qtr"));
        assert_eq!(PeriodMode::resolve(&p, &s), PeriodMode::YearQuarter);

        let s_year = ColumnMapping::new("id", "name").with_period(Some("year"), None);
        assert_eq!(PeriodMode::resolve(&p, &s_year), PeriodMode::Year);

        let s_none = ColumnMapping::new("id", "name");
        assert_eq!(PeriodMode::resolve(&p, &s_none), PeriodMode::None);

        let q_only = ColumnMapping::new("id", "name").with_period(None, Some("qtr"));
        assert_eq!(PeriodMode::resolve(&q_only, &q_only), PeriodMode::None);
    }

    #[test]
    fn pool_preserves_order_and_handles_missing_periods() {
        let y2020 = PeriodKey::from_values("2020", None);
        let y2021 = PeriodKey::from_values("2021", None);
        let sec = vec![
            entity(0, y2020.clone()),
            entity(1, y2021.clone()),
            entity(2, y2020.clone()),
            entity(3, None),
        ];
        let idx = PeriodIndex::build(&sec, PeriodMode::Year);
        assert_eq!(idx.partition_count(), 2);
        assert_eq!(idx.pool(y2020.as_ref()), &[0, 2]);
        assert_eq!(idx.pool(y2021.as_ref()), &[1]);
        assert!(idx.pool(PeriodKey::from_values("1999", None).as_ref()).is_empty());
        assert!(idx.pool(None).is_empty());

        let flat = PeriodIndex::build(&sec, PeriodMode::None);
        assert_eq!(flat.pool(None), &[0, 1, 2, 3]);
    }
}
