use std::fmt;
use serde::{Deserialize, Serialize};

/// Kind of a coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsKind {
    #[serde(rename = "geographic_2d")]
    Geographic2D,
    #[serde(rename = "geographic_3d")]
    Geographic3D,
    #[serde(rename = "geocentric")]
    Geocentric,
    #[serde(rename = "projected")]
    Projected,
    #[serde(rename = "vertical")]
    Vertical,
    #[serde(rename = "engineering")]
    Engineering,
    #[serde(rename = "compound")]
    Compound,
}

impl CrsKind {
    /// Whether a system of this kind can be the horizontal part of a compound
    pub fn is_horizontal(&self) -> bool {
        matches!(self, CrsKind::Geographic2D | CrsKind::Projected | CrsKind::Engineering)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, CrsKind::Vertical)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CrsKind::Geographic2D => "geographic 2D",
            CrsKind::Geographic3D => "geographic 3D",
            CrsKind::Geocentric => "geocentric",
            CrsKind::Projected => "projected",
            CrsKind::Vertical => "vertical",
            CrsKind::Engineering => "engineering",
            CrsKind::Compound => "compound",
        }
    }
}

/// A registered coordinate reference system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateSystem {
    pub id: u32,
    pub name: String,
    pub kind: CrsKind,
}

impl CoordinateSystem {
    pub fn new(id: u32, name: impl Into<String>, kind: CrsKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} {} ({})", self.id, self.name, self.kind.name())
    }
}

/// A horizontal system paired with a vertical one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundCoordinateSystem {
    pub id: u32,
    pub name: String,
    pub horizontal: CoordinateSystem,
    pub vertical: CoordinateSystem,
    /// False when the id was synthesized from the component ids
    pub registered: bool,
}

impl fmt::Display for CompoundCoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = if self.registered { "registered" } else { "synthesized" };
        write!(
            f,
            "{} {} [{} + {}, {}]",
            self.id, self.name, self.horizontal.id, self.vertical.id, origin
        )
    }
}

/// CRS resolved for a georeferenced image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedCrs {
    Single(CoordinateSystem),
    Compound(CompoundCoordinateSystem),
}

impl ResolvedCrs {
    pub fn id(&self) -> u32 {
        match self {
            ResolvedCrs::Single(cs) => cs.id,
            ResolvedCrs::Compound(compound) => compound.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResolvedCrs::Single(cs) => &cs.name,
            ResolvedCrs::Compound(compound) => &compound.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roles() {
        assert!(CrsKind::Geographic2D.is_horizontal());
        assert!(CrsKind::Projected.is_horizontal());
        assert!(!CrsKind::Geographic3D.is_horizontal());
        assert!(!CrsKind::Vertical.is_horizontal());
        assert!(CrsKind::Vertical.is_vertical());
        assert!(!CrsKind::Compound.is_vertical());
    }

    #[test]
    fn test_display() {
        let cs = CoordinateSystem::new(4269, "NAD83", CrsKind::Geographic2D);
        assert_eq!(cs.to_string(), "EPSG:4269 NAD83 (geographic 2D)");
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_string(&CrsKind::Geographic2D).unwrap(), "\"geographic_2d\"");
        let kind: CrsKind = serde_json::from_str("\"vertical\"").unwrap();
        assert_eq!(kind, CrsKind::Vertical);
    }
}
