//! CRS lookup and compound resolution

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use serde::Deserialize;
use tracing::{debug, info};
use crate::error::{Error, Result};
use super::catalog;
use super::system::{CompoundCoordinateSystem, CoordinateSystem, CrsKind, ResolvedCrs};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Bit set on every synthesized compound id; registered EPSG codes stay below it
pub const SYNTHESIZED_ID_FLAG: u32 = 0x8000_0000;

/// Deterministic id for a compound with no registered code
///
/// FNV-1a (32-bit) over `"{horizontal}+{vertical}"` with the top bit set.
pub fn synthesize_compound_id(horizontal: u32, vertical: u32) -> u32 {
    let key = format!("{}+{}", horizontal, vertical);
    let hash = key
        .bytes()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ byte as u32).wrapping_mul(FNV_PRIME));
    hash | SYNTHESIZED_ID_FLAG
}

/// One row of a catalog CSV (`code,name,kind,horizontal,vertical`)
#[derive(Debug, Deserialize)]
struct CatalogRow {
    code: u32,
    name: String,
    kind: CrsKind,
    horizontal: Option<u32>,
    vertical: Option<u32>,
}

/// Catalog of coordinate systems keyed by numeric id
///
/// Built and extended through `&mut self`, then shared read-only (usually
/// behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct CrsRegistry {
    systems: HashMap<u32, CoordinateSystem>,
    /// (horizontal, vertical) -> smallest registered compound id
    compounds: HashMap<(u32, u32), u32>,
    /// compound id -> (horizontal, vertical)
    components: HashMap<u32, (u32, u32)>,
}

impl CrsRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in catalog
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for &(id, name, kind) in catalog::SYSTEMS {
            registry.systems.insert(id, CoordinateSystem::new(id, name, kind));
        }
        for &(id, name, horizontal, vertical) in catalog::COMPOUNDS {
            registry.insert_compound(id, name, horizontal, vertical);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// All systems ordered by id
    pub fn systems(&self) -> Vec<&CoordinateSystem> {
        let mut systems: Vec<_> = self.systems.values().collect();
        systems.sort_by_key(|cs| cs.id);
        systems
    }

    /// Registers a single (non-compound) system
    ///
    /// Re-registering an id replaces its name; changing the kind of an
    /// existing id is rejected.
    pub fn register(&mut self, system: CoordinateSystem) -> Result<()> {
        if system.kind == CrsKind::Compound {
            return Err(Error::InvalidFormat(format!(
                "compound system {} needs its components, use register_compound",
                system.id
            )));
        }
        if system.id == 0 {
            return Err(Error::InvalidFormat("coordinate system id must be positive".to_string()));
        }
        if let Some(existing) = self.systems.get(&system.id) {
            if existing.kind != system.kind {
                return Err(Error::InvalidFormat(format!(
                    "{} is already registered as {}",
                    system.id,
                    existing.kind.name()
                )));
            }
        }
        self.systems.insert(system.id, system);
        Ok(())
    }

    /// Registers a compound system for a horizontal + vertical pair
    ///
    /// Several ids may be registered for the same pair; resolution always
    /// returns the smallest. An id keeps the pair it was first registered
    /// with.
    pub fn register_compound(
        &mut self,
        id: u32,
        name: impl Into<String>,
        horizontal: u32,
        vertical: u32,
    ) -> Result<()> {
        if id == 0 {
            return Err(Error::InvalidFormat("coordinate system id must be positive".to_string()));
        }
        self.check_components(horizontal, vertical)?;
        if let Some(existing) = self.systems.get(&id) {
            match self.components.get(&id) {
                Some(&pair) if pair == (horizontal, vertical) => {}
                Some(&(h, v)) => {
                    return Err(Error::InvalidFormat(format!(
                        "compound {} already combines {} + {}",
                        id, h, v
                    )));
                }
                None => {
                    return Err(Error::InvalidFormat(format!(
                        "{} is already registered as {}",
                        id,
                        existing.kind.name()
                    )));
                }
            }
        }
        self.insert_compound(id, &name.into(), horizontal, vertical);
        Ok(())
    }

    fn insert_compound(&mut self, id: u32, name: &str, horizontal: u32, vertical: u32) {
        self.systems.insert(id, CoordinateSystem::new(id, name, CrsKind::Compound));
        self.components.insert(id, (horizontal, vertical));
        self.compounds
            .entry((horizontal, vertical))
            .and_modify(|existing| *existing = (*existing).min(id))
            .or_insert(id);
    }

    /// Looks up a system by id
    pub fn get(&self, id: u32) -> Result<&CoordinateSystem> {
        self.systems.get(&id).ok_or(Error::UnknownCoordinateSystem(id))
    }

    /// Components of a registered compound id
    pub fn components(&self, id: u32) -> Option<(u32, u32)> {
        self.components.get(&id).copied()
    }

    /// Looks up an id, expanding registered compounds into their components
    pub fn resolve(&self, id: u32) -> Result<ResolvedCrs> {
        match self.components(id) {
            Some((horizontal, vertical)) => {
                let mut compound = self.get_compound(horizontal, vertical)?;
                if compound.id != id {
                    compound.id = id;
                    compound.name = self.get(id)?.name.clone();
                }
                Ok(ResolvedCrs::Compound(compound))
            }
            None => Ok(ResolvedCrs::Single(self.get(id)?.clone())),
        }
    }

    fn check_components(&self, horizontal: u32, vertical: u32) -> Result<(&CoordinateSystem, &CoordinateSystem)> {
        let h = self.get(horizontal)?;
        let v = self.get(vertical)?;

        if !h.kind.is_horizontal() {
            return Err(Error::InvalidFormat(format!(
                "{} is {}, not a horizontal system",
                h.id,
                h.kind.name()
            )));
        }
        if !v.kind.is_vertical() {
            return Err(Error::InvalidFormat(format!(
                "{} is {}, not a vertical system",
                v.id,
                v.kind.name()
            )));
        }
        Ok((h, v))
    }

    /// Resolves the compound system for a horizontal + vertical pair
    ///
    /// A registered compound for the exact pair wins; otherwise the id is
    /// synthesized with [`synthesize_compound_id`]. Either way the result
    /// depends only on the pair and the registered entries.
    pub fn get_compound(&self, horizontal: u32, vertical: u32) -> Result<CompoundCoordinateSystem> {
        let (h, v) = self.check_components(horizontal, vertical)?;

        if let Some(&id) = self.compounds.get(&(horizontal, vertical)) {
            let name = self.get(id)?.name.clone();
            return Ok(CompoundCoordinateSystem {
                id,
                name,
                horizontal: h.clone(),
                vertical: v.clone(),
                registered: true,
            });
        }

        let id = synthesize_compound_id(horizontal, vertical);
        debug!(horizontal, vertical, id, "synthesized compound id");
        Ok(CompoundCoordinateSystem {
            id,
            name: format!("{} + {}", h.name, v.name),
            horizontal: h.clone(),
            vertical: v.clone(),
            registered: false,
        })
    }

    /// Adds entries from a catalog CSV with the header
    /// `code,name,kind,horizontal,vertical`
    ///
    /// Compound rows may reference systems defined later in the same file.
    /// Returns the number of rows registered. On error the registry is left
    /// as it was.
    pub fn load_csv<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut staged = self.clone();
        let count = staged.load_rows(reader)?;
        *self = staged;
        Ok(count)
    }

    fn load_rows<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut compounds = Vec::new();
        let mut count = 0;

        for (line, result) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = result.map_err(|e| Error::InvalidFormat(format!("catalog row {}: {}", line + 1, e)))?;

            if row.kind == CrsKind::Compound {
                compounds.push(row);
                continue;
            }
            self.register(CoordinateSystem::new(row.code, row.name, row.kind))?;
            count += 1;
        }

        for row in compounds {
            let (Some(horizontal), Some(vertical)) = (row.horizontal, row.vertical) else {
                return Err(Error::InvalidFormat(format!(
                    "compound {} is missing its horizontal or vertical component",
                    row.code
                )));
            };
            self.register_compound(row.code, row.name, horizontal, vertical)?;
            count += 1;
        }

        Ok(count)
    }

    /// Adds entries from a catalog CSV file
    pub fn load_csv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let file = File::open(path.as_ref())?;
        let count = self.load_csv(file)?;
        info!(path = %path.as_ref().display(), entries = count, "loaded CRS catalog");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = CrsRegistry::with_builtin();
        assert_eq!(registry.get(4269).unwrap().name, "NAD83");
        assert_eq!(registry.get(5703).unwrap().kind, CrsKind::Vertical);
        assert!(matches!(registry.get(999_999), Err(Error::UnknownCoordinateSystem(999_999))));
    }

    #[test]
    fn test_resolve_expands_compounds() {
        let registry = CrsRegistry::with_builtin();
        assert!(matches!(registry.resolve(4326).unwrap(), ResolvedCrs::Single(cs) if cs.id == 4326));

        match registry.resolve(5498).unwrap() {
            ResolvedCrs::Compound(compound) => {
                assert_eq!(compound.id, 5498);
                assert_eq!(compound.vertical.id, 5703);
            }
            other => panic!("expected compound, got {:?}", other),
        }
        assert!(registry.resolve(1).is_err());
    }

    #[test]
    fn test_nad83_navd88_resolves_to_5498() {
        let registry = CrsRegistry::with_builtin();
        let compound = registry.get_compound(4269, 5703).unwrap();
        assert_eq!(compound.id, 5498);
        assert!(compound.registered);
        assert_eq!(compound.horizontal.id, 4269);
        assert_eq!(compound.vertical.id, 5703);
        assert_eq!(registry.components(5498), Some((4269, 5703)));
    }

    #[test]
    fn test_synthesized_id_is_deterministic() {
        let first = CrsRegistry::with_builtin();
        let second = CrsRegistry::with_builtin();

        let a = first.get_compound(4326, 5703).unwrap();
        let b = first.get_compound(4326, 5703).unwrap();
        let c = second.get_compound(4326, 5703).unwrap();

        assert!(!a.registered);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, c.id);
        assert_eq!(a.id, synthesize_compound_id(4326, 5703));
        assert!(a.id & SYNTHESIZED_ID_FLAG != 0);
        assert_eq!(a.name, "WGS 84 + NAVD88 height");
    }

    #[test]
    fn test_synthesized_ids_differ_by_order_of_components() {
        assert_ne!(synthesize_compound_id(4326, 5703), synthesize_compound_id(5703, 4326));
        assert_ne!(synthesize_compound_id(4326, 5703), synthesize_compound_id(4326, 5773));
    }

    #[test]
    fn test_fnv1a_reference_value() {
        // FNV-1a 32 of "a" is 0xe40c292c
        let hash = b"a"
            .iter()
            .fold(FNV_OFFSET_BASIS, |h, &b| (h ^ b as u32).wrapping_mul(FNV_PRIME));
        assert_eq!(hash, 0xe40c_292c);
    }

    #[test]
    fn test_missing_component() {
        let registry = CrsRegistry::with_builtin();
        assert!(matches!(
            registry.get_compound(4269, 1),
            Err(Error::UnknownCoordinateSystem(1))
        ));
        assert!(matches!(
            registry.get_compound(2, 5703),
            Err(Error::UnknownCoordinateSystem(2))
        ));
    }

    #[test]
    fn test_component_kinds_checked() {
        let registry = CrsRegistry::with_builtin();
        assert!(matches!(registry.get_compound(5703, 4269), Err(Error::InvalidFormat(_))));
        assert!(matches!(registry.get_compound(4269, 4326), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_smallest_registered_id_wins_regardless_of_order() {
        let mut forward = CrsRegistry::with_builtin();
        forward.register_compound(9001, "alias high", 4269, 5703).unwrap();

        let mut reverse = CrsRegistry::new();
        reverse.register(CoordinateSystem::new(4269, "NAD83", CrsKind::Geographic2D)).unwrap();
        reverse.register(CoordinateSystem::new(5703, "NAVD88 height", CrsKind::Vertical)).unwrap();
        reverse.register_compound(9001, "alias high", 4269, 5703).unwrap();
        reverse.register_compound(5498, "NAD83 + NAVD88 height", 4269, 5703).unwrap();

        assert_eq!(forward.get_compound(4269, 5703).unwrap().id, 5498);
        assert_eq!(reverse.get_compound(4269, 5703).unwrap().id, 5498);
    }

    #[test]
    fn test_register_rejects_bare_compound() {
        let mut registry = CrsRegistry::new();
        let err = registry.register(CoordinateSystem::new(5498, "x", CrsKind::Compound));
        assert!(err.is_err());
    }

    #[test]
    fn test_load_csv() {
        let csv = "\
code,name,kind,horizontal,vertical
900001,Local compound,compound,900002,5703
900002,Local grid,engineering,,
";
        let mut registry = CrsRegistry::with_builtin();
        assert_eq!(registry.load_csv(csv.as_bytes()).unwrap(), 2);
        assert_eq!(registry.get(900002).unwrap().kind, CrsKind::Engineering);

        let compound = registry.get_compound(900002, 5703).unwrap();
        assert_eq!(compound.id, 900001);
        assert_eq!(compound.name, "Local compound");
    }

    #[test]
    fn test_load_csv_errors() {
        let mut registry = CrsRegistry::with_builtin();
        let bad_kind = "code,name,kind,horizontal,vertical\n1,X,spherical,,\n";
        assert!(matches!(registry.load_csv(bad_kind.as_bytes()), Err(Error::InvalidFormat(_))));

        let incomplete = "code,name,kind,horizontal,vertical\n2,X,compound,4269,\n";
        assert!(matches!(registry.load_csv(incomplete.as_bytes()), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_failed_load_leaves_registry_unchanged() {
        let mut registry = CrsRegistry::with_builtin();
        let before = registry.len();

        let bad_tail = "code,name,kind,horizontal,vertical\n900020,Fine,vertical,,\n900021,X,spherical,,\n";
        assert!(registry.load_csv(bad_tail.as_bytes()).is_err());
        assert_eq!(registry.len(), before);
        assert!(registry.get(900020).is_err());

        let bad_compound = "code,name,kind,horizontal,vertical\n900022,Fine,vertical,,\n900023,C,compound,4269,1\n";
        assert!(registry.load_csv(bad_compound.as_bytes()).is_err());
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_compound_id_keeps_its_pair() {
        let mut registry = CrsRegistry::with_builtin();
        assert!(matches!(
            registry.register_compound(5498, "moved", 4326, 5703),
            Err(Error::InvalidFormat(_))
        ));
        assert_eq!(registry.components(5498), Some((4269, 5703)));
        assert_ne!(registry.get_compound(4326, 5703).unwrap().id, 5498);

        registry.register_compound(5498, "renamed", 4269, 5703).unwrap();
        let compound = registry.get_compound(4269, 5703).unwrap();
        assert_eq!(compound.id, 5498);
        assert_eq!(compound.name, "renamed");
    }

    #[test]
    fn test_registered_kind_is_fixed() {
        let mut registry = CrsRegistry::with_builtin();
        assert!(matches!(
            registry.register(CoordinateSystem::new(5498, "not a compound", CrsKind::Geographic2D)),
            Err(Error::InvalidFormat(_))
        ));
        assert_eq!(registry.get(5498).unwrap().kind, CrsKind::Compound);
        assert_eq!(registry.get_compound(4269, 5703).unwrap().name, registry.get(5498).unwrap().name);

        assert!(registry
            .register(CoordinateSystem::new(4269, "NAD83 vertical", CrsKind::Vertical))
            .is_err());
        assert!(registry
            .register_compound(4326, "clash", 4269, 5703)
            .is_err());

        registry
            .register(CoordinateSystem::new(4269, "NAD83 (renamed)", CrsKind::Geographic2D))
            .unwrap();
        assert_eq!(registry.get(4269).unwrap().name, "NAD83 (renamed)");
    }

    #[test]
    fn test_load_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, "code,name,kind,horizontal,vertical\n900010,Test height,vertical,,\n").unwrap();

        let mut registry = CrsRegistry::new();
        assert_eq!(registry.load_csv_file(&path).unwrap(), 1);
        assert_eq!(registry.len(), 1);
    }
}
