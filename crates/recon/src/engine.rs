//! Lifecycle reconciliation: folds dated snapshots into interval-stamped
//! title records.
//!
//! Per domain, at most one record per key is open at any time. For each
//! admitted feature of a snapshot:
//! - no open record → open one at the snapshot date;
//! - open record whose boundary differs by more than the tolerance → close it
//!   at the snapshot date and open a new one;
//! - otherwise the feature re-asserts the open record and is discarded.
//!
//! After the snapshot, every open record whose key was not seen is closed at
//! the snapshot date. Snapshots must be folded in ascending date order.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info, info_span, trace, warn};

use crate::admit::Admission;
use crate::classify::Classify;
use crate::config::{DomainConfig, RunConfig, SourceConfig};
use crate::error::ReconError;
use crate::geometry::{diff_area, AreaMeasure};
use crate::model::{
    AdmittedFeature, DomainHistory, EntityKey, RawFeature, RunMeta, RunResult, Snapshot,
    TitleRecord, Validity,
};
use crate::spatial::AreaIndex;
use crate::summary::{compute_summary, SnapshotStats};

pub struct Reconciler {
    domain: String,
    tolerance: f64,
    measure: AreaMeasure,
    /// Key → index in `records` of the key's open record.
    open: HashMap<EntityKey, usize>,
    records: Vec<TitleRecord>,
    last_date: Option<NaiveDate>,
    snapshots: Vec<SnapshotStats>,
}

impl Reconciler {
    pub fn new(domain: impl Into<String>, tolerance: f64, measure: AreaMeasure) -> Self {
        Self {
            domain: domain.into(),
            tolerance,
            measure,
            open: HashMap::new(),
            records: Vec::new(),
            last_date: None,
            snapshots: Vec::new(),
        }
    }

    pub fn for_domain(config: &DomainConfig) -> Self {
        Self::new(config.name.clone(), config.tolerance, config.measure)
    }

    /// Fold a snapshot of already-admitted features.
    pub fn fold_snapshot<I>(
        &mut self,
        date: NaiveDate,
        features: I,
        areas: &AreaIndex,
    ) -> Result<&SnapshotStats, ReconError>
    where
        I: IntoIterator<Item = AdmittedFeature>,
    {
        let features: Vec<AdmittedFeature> = features.into_iter().collect();
        let mut stats = SnapshotStats::new(date);
        stats.features = features.len();
        self.fold(date, features, areas, stats)
    }

    /// Admit the raw features of `snapshot`, then fold the admitted ones.
    /// Rejected features are logged and counted, never fatal.
    pub fn ingest<C: Classify>(
        &mut self,
        snapshot: Snapshot,
        admission: &Admission<C>,
        areas: &AreaIndex,
    ) -> Result<&SnapshotStats, ReconError> {
        let Snapshot { date, features } = snapshot;

        let span = info_span!("snapshot", domain = %self.domain, %date);
        let _guard = span.enter();

        let mut stats = SnapshotStats::new(date);
        stats.features = features.len();
        let mut admitted = Vec::with_capacity(features.len());
        for feature in features {
            let raw_id = feature.attribute(admission.identifier_field()).map(str::to_string);
            match admission.admit(feature) {
                Ok(f) => admitted.push(f),
                Err(rejection) => {
                    warn!(
                        raw_id = raw_id.as_deref().unwrap_or(""),
                        reason = ?rejection.reason(),
                        "feature skipped: {rejection}"
                    );
                    *stats.rejected.entry(rejection.reason()).or_insert(0) += 1;
                }
            }
        }
        self.fold(date, admitted, areas, stats)
    }

    fn check_order(&self, date: NaiveDate) -> Result<(), ReconError> {
        match self.last_date {
            Some(previous) if date < previous => Err(ReconError::SnapshotOrder {
                domain: self.domain.clone(),
                date,
                previous,
            }),
            _ => Ok(()),
        }
    }

    fn fold(
        &mut self,
        date: NaiveDate,
        features: Vec<AdmittedFeature>,
        areas: &AreaIndex,
        mut stats: SnapshotStats,
    ) -> Result<&SnapshotStats, ReconError> {
        self.check_order(date)?;
        self.last_date = Some(date);

        let mut seen: HashSet<EntityKey> = HashSet::new();
        for feature in features {
            stats.admitted += 1;
            seen.insert(feature.key.clone());

            match self.open.get(&feature.key).copied() {
                None => {
                    self.open_record_at(date, feature, areas);
                    stats.opened += 1;
                }
                Some(index) => {
                    let current = &mut self.records[index];
                    let diff = diff_area(Some(&current.geometry), Some(&feature.geometry), self.measure);
                    if diff > self.tolerance {
                        debug!(key = %feature.key, diff, "boundary changed, record superseded");
                        current.validity.end = Some(date);
                        self.open_record_at(date, feature, areas);
                        stats.superseded += 1;
                    } else {
                        trace!(key = %feature.key, diff, "unchanged");
                        stats.unchanged += 1;
                    }
                }
            }
        }

        let ceased: Vec<EntityKey> = self
            .open
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        for key in ceased {
            if let Some(index) = self.open.remove(&key) {
                trace!(key = %key, "absent from snapshot, record closed");
                self.records[index].validity.end = Some(date);
                stats.ceased += 1;
            }
        }

        info!(
            domain = %self.domain,
            %date,
            features = stats.features,
            opened = stats.opened,
            superseded = stats.superseded,
            ceased = stats.ceased,
            rejected = stats.rejected_total(),
            "snapshot folded"
        );
        self.snapshots.push(stats);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    fn open_record_at(&mut self, date: NaiveDate, feature: AdmittedFeature, areas: &AreaIndex) {
        let AdmittedFeature {
            key,
            name,
            indicative_label,
            classification,
            geometry,
        } = feature;
        let record = TitleRecord {
            areas: areas.query(&geometry),
            domain: self.domain.clone(),
            key: key.clone(),
            name,
            indicative_label,
            classification,
            geometry,
            validity: Validity::open(date),
        };
        self.open.insert(key, self.records.len());
        self.records.push(record);
    }

    pub fn open_record(&self, key: &EntityKey) -> Option<&TitleRecord> {
        self.open.get(key).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[TitleRecord] {
        &self.records
    }

    /// Records still open stay open: the title is active as of the latest source.
    pub fn finish(self) -> DomainHistory {
        let summary = compute_summary(&self.domain, &self.records, self.snapshots);
        DomainHistory {
            domain: self.domain,
            records: self.records,
            summary,
        }
    }
}

/// Reconcile in-memory snapshots of one domain. Snapshots are sorted by date
/// (stable) before folding.
pub fn reconcile_domain<C: Classify>(
    config: &DomainConfig,
    admission: &Admission<C>,
    mut snapshots: Vec<Snapshot>,
    areas: &AreaIndex,
) -> Result<DomainHistory, ReconError> {
    snapshots.sort_by_key(|s| s.date);
    let mut reconciler = Reconciler::for_domain(config);
    for snapshot in snapshots {
        reconciler.ingest(snapshot, admission, areas)?;
    }
    Ok(reconciler.finish())
}

/// Run every domain of `config`, loading each snapshot on demand, one at a
/// time, in ascending date order. The first error aborts the whole run.
pub fn reconcile<F, E>(config: &RunConfig, areas: &AreaIndex, mut load: F) -> Result<RunResult, E>
where
    F: FnMut(&DomainConfig, &SourceConfig) -> Result<Vec<RawFeature>, E>,
    E: From<ReconError>,
{
    let mut domains = Vec::with_capacity(config.domains.len());
    for domain in &config.domains {
        info!(domain = %domain.name, sources = domain.sources.len(), "reconciling domain");
        let admission = domain.admission()?;
        let mut reconciler = Reconciler::for_domain(domain);
        for source in domain.sorted_sources() {
            let features = load(domain, source)?;
            let snapshot = Snapshot {
                date: source.date,
                features,
            };
            reconciler.ingest(snapshot, &admission, areas)?;
        }
        domains.push(reconciler.finish());
    }

    Ok(RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        domains,
    })
}
