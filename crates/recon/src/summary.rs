use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::admit::RejectionReason;
use crate::model::TitleRecord;

/// What one snapshot did to a domain's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub date: NaiveDate,
    pub features: usize,
    pub admitted: usize,
    pub rejected: BTreeMap<RejectionReason, usize>,
    pub opened: usize,
    pub superseded: usize,
    pub unchanged: usize,
    pub ceased: usize,
}

impl SnapshotStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            features: 0,
            admitted: 0,
            rejected: BTreeMap::new(),
            opened: 0,
            superseded: 0,
            unchanged: 0,
            ceased: 0,
        }
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    pub domain: String,
    pub snapshots: Vec<SnapshotStats>,
    pub titles: usize,
    pub records: usize,
    pub open: usize,
    pub closed: usize,
    pub features_read: usize,
    pub rejected: BTreeMap<RejectionReason, usize>,
}

/// Compute summary statistics from a domain's records and per-snapshot stats.
pub fn compute_summary(
    domain: &str,
    records: &[TitleRecord],
    snapshots: Vec<SnapshotStats>,
) -> DomainSummary {
    let mut rejected: BTreeMap<RejectionReason, usize> = BTreeMap::new();
    let mut features_read = 0;
    for s in &snapshots {
        features_read += s.features;
        for (reason, count) in &s.rejected {
            *rejected.entry(*reason).or_insert(0) += count;
        }
    }

    let open = records.iter().filter(|r| r.validity.is_open()).count();
    let mut keys: Vec<_> = records.iter().map(|r| &r.key).collect();
    keys.sort();
    keys.dedup();

    DomainSummary {
        domain: domain.to_string(),
        snapshots,
        titles: keys.len(),
        records: records.len(),
        open,
        closed: records.len() - open,
        features_read,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Boundary;
    use crate::model::{Classification, EntityKey, Validity};
    use geo_types::MultiPolygon;
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(key: &str, start: &str, end: Option<&str>) -> TitleRecord {
        TitleRecord {
            key: EntityKey::new(key),
            domain: "h".into(),
            name: None,
            indicative_label: None,
            classification: Classification {
                title_type: "prh".into(),
                type_label: None,
                stage: "dex".into(),
                procedure: None,
            },
            geometry: Boundary::MultiPolygon(MultiPolygon::new(vec![])),
            areas: BTreeSet::new(),
            validity: Validity {
                start: date(start),
                end: end.map(date),
            },
        }
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            record("12", "2001-01-01", Some("2002-01-01")),
            record("12", "2002-01-01", None),
            record("C7", "2001-01-01", Some("2003-01-01")),
        ];
        let mut first = SnapshotStats::new(date("2001-01-01"));
        first.features = 4;
        first.rejected.insert(RejectionReason::InvalidIdentifier, 1);
        first.rejected.insert(RejectionReason::MissingGeometry, 1);
        let mut second = SnapshotStats::new(date("2002-01-01"));
        second.features = 2;
        second.rejected.insert(RejectionReason::InvalidIdentifier, 1);

        let summary = compute_summary("h", &records, vec![first, second]);
        assert_eq!(summary.titles, 2);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.closed, 2);
        assert_eq!(summary.features_read, 6);
        assert_eq!(summary.rejected[&RejectionReason::InvalidIdentifier], 2);
        assert_eq!(summary.rejected[&RejectionReason::MissingGeometry], 1);
        assert_eq!(summary.snapshots[0].rejected_total(), 2);
    }
}
