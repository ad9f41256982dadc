use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::{Result, StayscanError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Rectangular search area given by its north-east and south-west corners.
///
/// Always non-degenerate in orientation: `ne` is never south or west of `sw`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRegion {
    ne: Coordinate,
    sw: Coordinate,
}

impl GeoRegion {
    pub fn new(ne: Coordinate, sw: Coordinate) -> Result<Self> {
        if !(ne.lat.is_finite() && ne.lng.is_finite() && sw.lat.is_finite() && sw.lng.is_finite()) {
            return Err(StayscanError::InvalidRegion(format!(
                "non-finite corner in ne={} sw={}",
                ne, sw
            )));
        }
        if ne.lat < sw.lat || ne.lng < sw.lng {
            return Err(StayscanError::InvalidRegion(format!(
                "north-east corner {} lies south or west of south-west corner {}",
                ne, sw
            )));
        }
        Ok(Self { ne, sw })
    }

    pub fn ne(&self) -> Coordinate {
        self.ne
    }

    pub fn sw(&self) -> Coordinate {
        self.sw
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.ne.lat + self.sw.lat) / 2.0,
            (self.ne.lng + self.sw.lng) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.ne.lat - self.sw.lat
    }

    pub fn lng_span(&self) -> f64 {
        self.ne.lng - self.sw.lng
    }

    /// True when either axis is narrower than `min_span` degrees.
    pub fn is_degenerate(&self, min_span: f64) -> bool {
        self.lat_span() < min_span || self.lng_span() < min_span
    }

    /// Split into four quadrants around the midpoint, ordered NE, NW, SW, SE.
    ///
    /// The quadrants tile the region exactly: neighbours share the midpoint
    /// and the edges through it.
    pub fn quadrants(&self) -> [GeoRegion; 4] {
        let c = self.center();
        let (ne, sw) = (self.ne, self.sw);

        [
            GeoRegion {
                ne,
                sw: c,
            },
            GeoRegion {
                ne: Coordinate::new(ne.lat, c.lng),
                sw: Coordinate::new(c.lat, sw.lng),
            },
            GeoRegion {
                ne: c,
                sw,
            },
            GeoRegion {
                ne: Coordinate::new(c.lat, ne.lng),
                sw: Coordinate::new(sw.lat, c.lng),
            },
        ]
    }
}

impl fmt::Display for GeoRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ne={} sw={}", self.ne, self.sw)
    }
}
