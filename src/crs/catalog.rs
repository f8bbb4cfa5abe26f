//! Built-in EPSG entries

use super::system::CrsKind;

/// (code, name, kind) of the built-in single systems
pub const SYSTEMS: &[(u32, &str, CrsKind)] = &[
    (4326, "WGS 84", CrsKind::Geographic2D),
    (4269, "NAD83", CrsKind::Geographic2D),
    (4267, "NAD27", CrsKind::Geographic2D),
    (4258, "ETRS89", CrsKind::Geographic2D),
    (4283, "GDA94", CrsKind::Geographic2D),
    (7844, "GDA2020", CrsKind::Geographic2D),
    (4759, "NAD83(NSRS2007)", CrsKind::Geographic2D),
    (6318, "NAD83(2011)", CrsKind::Geographic2D),
    (4277, "OSGB36", CrsKind::Geographic2D),
    (4979, "WGS 84", CrsKind::Geographic3D),
    (4978, "WGS 84", CrsKind::Geocentric),
    (3857, "WGS 84 / Pseudo-Mercator", CrsKind::Projected),
    (26910, "NAD83 / UTM zone 10N", CrsKind::Projected),
    (27700, "OSGB36 / British National Grid", CrsKind::Projected),
    (5703, "NAVD88 height", CrsKind::Vertical),
    (5702, "NGVD29 height (ftUS)", CrsKind::Vertical),
    (5773, "EGM96 height", CrsKind::Vertical),
    (3855, "EGM2008 height", CrsKind::Vertical),
    (5714, "MSL height", CrsKind::Vertical),
    (5701, "ODN height", CrsKind::Vertical),
];

/// (code, name, horizontal, vertical) of the built-in compound systems
pub const COMPOUNDS: &[(u32, &str, u32, u32)] = &[
    (5498, "NAD83 + NAVD88 height", 4269, 5703),
    (5500, "NAD83(NSRS2007) + NAVD88 height", 4759, 5703),
    (6349, "NAD83(2011) + NAVD88 height", 6318, 5703),
    (7405, "OSGB36 / British National Grid + ODN height", 27700, 5701),
    (9518, "WGS 84 + EGM2008 height", 4326, 3855),
];
