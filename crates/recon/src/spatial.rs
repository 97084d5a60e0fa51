//! Reference-area membership lookup.
//!
//! Bounding rectangles of the reference polygons are bulk-loaded into an
//! R-tree once per run. A query keeps the candidates whose rectangle overlaps
//! the query's rectangle, then runs the exact intersection predicate on each.

use std::collections::BTreeSet;

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use tracing::warn;

use crate::geometry::{shares_area, Boundary};
use crate::model::{AreaId, ReferenceArea};

type Envelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

pub struct AreaIndex {
    areas: Vec<ReferenceArea>,
    tree: RTree<Envelope>,
}

impl AreaIndex {
    /// Areas without a bounding rectangle (empty geometries) can never match
    /// and are left out of the tree.
    pub fn new(areas: Vec<ReferenceArea>) -> Self {
        let envelopes: Vec<Envelope> = areas
            .iter()
            .enumerate()
            .filter_map(|(i, area)| {
                let rect = area.geometry.bounding_rect()?;
                let (min, max) = (rect.min(), rect.max());
                Some(GeomWithData::new(
                    Rectangle::from_corners([min.x, min.y], [max.x, max.y]),
                    i,
                ))
            })
            .collect();

        Self {
            areas,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// An index with no reference areas; every query returns an empty set.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Identifiers of every reference area sharing a non-empty region with `geometry`.
    pub fn query(&self, geometry: &Boundary) -> BTreeSet<AreaId> {
        let Some(rect) = geometry.bounding_rect() else {
            return BTreeSet::new();
        };
        let (min, max) = (rect.min(), rect.max());
        let envelope = AABB::from_corners([min.x, min.y], [max.x, max.y]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| {
                let area = &self.areas[candidate.data];
                match shares_area(&area.geometry, geometry) {
                    Ok(true) => Some(area.id.clone()),
                    Ok(false) => None,
                    Err(error) => {
                        warn!(area = %area.id, %error, "intersection test failed, area skipped");
                        None
                    }
                }
            })
            .collect()
    }
}
