//! Coordinate reference system detection from `.prj` companion files.
//!
//! Only the distinction needed for display is made: geographic degrees can be
//! projected onto Web Mercator and Web Mercator is used as-is, so both can sit
//! on a basemap. Any other projected system is drawn in its native units.

use std::fmt;

/// Coordinate reference system of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// Longitude/latitude degrees (e.g. WGS 84, NAD83).
    Geographic { name: String, wkt: String },
    /// EPSG:3857 pseudo-Mercator metres.
    WebMercator { wkt: String },
    /// Any other projected system.
    Projected { name: String, wkt: String },
    /// No `.prj` file was present.
    Unknown,
}

impl Crs {
    /// Classifies a WKT string as found in a `.prj` file.
    pub fn from_wkt(wkt: &str) -> Self {
        let wkt = wkt.trim().to_string();
        if wkt.is_empty() {
            return Crs::Unknown;
        }
        let upper = wkt.to_uppercase();
        let name = leading_name(&wkt).unwrap_or_default();

        if upper.starts_with("PROJCS") || upper.starts_with("PROJCRS") {
            let is_web_mercator = upper.contains("PSEUDO-MERCATOR")
                || upper.contains("PSEUDO_MERCATOR")
                || upper.contains("MERCATOR_AUXILIARY_SPHERE")
                || upper.contains("WEB_MERCATOR")
                || upper.contains("\"3857\"")
                || upper.contains("\"900913\"");
            if is_web_mercator {
                Crs::WebMercator { wkt }
            } else {
                Crs::Projected { name, wkt }
            }
        } else if upper.starts_with("GEOGCS") || upper.starts_with("GEOGCRS") {
            Crs::Geographic { name, wkt }
        } else {
            Crs::Projected { name, wkt }
        }
    }

    /// WKT to write back as `.prj`, if any.
    pub fn wkt(&self) -> Option<&str> {
        match self {
            Crs::Geographic { wkt, .. } | Crs::WebMercator { wkt } | Crs::Projected { wkt, .. } => {
                Some(wkt)
            }
            Crs::Unknown => None,
        }
    }

    /// Whether coordinates are planar lengths (so areas are meaningful).
    pub fn is_projected(&self) -> bool {
        matches!(self, Crs::WebMercator { .. } | Crs::Projected { .. })
    }

    /// Whether features can be placed on a Web Mercator basemap.
    pub fn supports_basemap(&self) -> bool {
        matches!(self, Crs::Geographic { .. } | Crs::WebMercator { .. })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Geographic { name, .. } => write!(f, "{} (geographic)", name),
            Crs::WebMercator { .. } => f.write_str("WGS 84 / Pseudo-Mercator (EPSG:3857)"),
            Crs::Projected { name, .. } => write!(f, "{} (projected)", name),
            Crs::Unknown => f.write_str("None"),
        }
    }
}

/// Extracts the quoted name after the first `[`.
fn leading_name(wkt: &str) -> Option<String> {
    let start = wkt.find('[')?;
    let rest = &wkt[start + 1..];
    let open = rest.find('"')?;
    let rest = &rest[open + 1..];
    let close = rest.find('"')?;
    Some(rest[..close].to_string())
}
