//! Polygonal boundaries and the change detector.
//!
//! A title boundary is either a `Polygon` or a `MultiPolygon`; boolean
//! operations always run on the `MultiPolygon` form so both shapes (and a
//! single-polygon or multi-polygon difference) are measured the same way.
//!
//! An empty symmetric difference always means "no change" (area 0). An absent
//! or empty side contributes the full area of the other side.

use geo::{Area, BooleanOps, BoundingRect, ChamberlainDuquetteArea};
use geo_types::{Geometry, LineString, MultiPolygon, Polygon, Rect};
use serde::Deserialize;

use crate::error::GeometryError;

/// How areas are measured. The tolerance of a domain is expressed in this unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMeasure {
    /// Square metres on a spherical Earth (coordinates in lon/lat degrees).
    #[default]
    Geodesic,
    /// Square units of a projected reference frame.
    Planar,
}

impl AreaMeasure {
    pub fn of(&self, geometry: &MultiPolygon<f64>) -> f64 {
        match self {
            Self::Geodesic => geometry.chamberlain_duquette_unsigned_area(),
            Self::Planar => geometry.unsigned_area(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Boundary {
    pub fn from_geometry(geometry: Geometry<f64>) -> Result<Self, GeometryError> {
        match geometry {
            Geometry::Polygon(p) => Ok(Self::Polygon(p)),
            Geometry::MultiPolygon(mp) => Ok(Self::MultiPolygon(mp)),
            other => Err(GeometryError::NotPolygonal(geometry_type(&other))),
        }
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match self {
            Self::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            Self::MultiPolygon(mp) => mp.clone(),
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Self::Polygon(p) => Geometry::Polygon(p.clone()),
            Self::MultiPolygon(mp) => Geometry::MultiPolygon(mp.clone()),
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Polygon(p) => p.bounding_rect(),
            Self::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Polygon(p) => p.exterior().0.is_empty(),
            Self::MultiPolygon(mp) => mp.0.iter().all(|p| p.exterior().0.is_empty()),
        }
    }

    pub fn area(&self, measure: AreaMeasure) -> f64 {
        measure.of(&self.to_multi_polygon())
    }

    /// Structural checks: at least one polygon, every ring has 4+ positions,
    /// every coordinate is finite. No topology validation is attempted.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let polygons: Vec<&Polygon<f64>> = match self {
            Self::Polygon(p) => vec![p],
            Self::MultiPolygon(mp) => mp.0.iter().collect(),
        };
        if polygons.is_empty() {
            return Err(GeometryError::Empty);
        }

        let rings = polygons
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors().iter()));
        for (ring, line) in rings.enumerate() {
            check_ring(ring, line)?;
        }
        Ok(())
    }
}

fn check_ring(ring: usize, line: &LineString<f64>) -> Result<(), GeometryError> {
    let positions = line.0.len();
    if positions < 4 {
        return Err(GeometryError::DegenerateRing { ring, positions });
    }
    if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite { ring });
    }
    Ok(())
}

fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Area of the region covered by exactly one of `a` and `b`.
pub fn diff_area(a: Option<&Boundary>, b: Option<&Boundary>, measure: AreaMeasure) -> f64 {
    let a = a.filter(|g| !g.is_empty());
    let b = b.filter(|g| !g.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => {
            let difference = a.to_multi_polygon().xor(&b.to_multi_polygon());
            if difference.0.is_empty() {
                return 0.0;
            }
            measure.of(&difference)
        }
        (Some(only), None) | (None, Some(only)) => only.area(measure),
        (None, None) => 0.0,
    }
}

/// True when `a` and `b` share a region of non-zero area.
pub fn shares_area(a: &Boundary, b: &Boundary) -> Result<bool, GeometryError> {
    a.validate()?;
    b.validate()?;
    let common = a.to_multi_polygon().intersection(&b.to_multi_polygon());
    Ok(!common.0.is_empty() && common.unsigned_area() > 0.0)
}
