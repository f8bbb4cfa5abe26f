use serde::{Deserialize, Serialize};

/// A point moved in place by transform steps
///
/// `x` is longitude (or easting), `y` latitude (or northing). Geographic
/// values are decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatesOperationPoint {
    pub x: f64,
    pub y: f64,
}

impl CoordinatesOperationPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a point from longitude/latitude in degrees
    pub fn from_lonlat(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.x
    }

    pub fn lat(&self) -> f64 {
        self.y
    }
}

/// Longitude and latitude in degrees to arc-seconds, longitude positive west
pub fn to_arcsec_pw(point: &CoordinatesOperationPoint) -> (f64, f64) {
    (-point.x * 3600.0, point.y * 3600.0)
}

/// Inverse of [`to_arcsec_pw`]
pub fn from_arcsec_pw(lon_pw: f64, lat: f64) -> CoordinatesOperationPoint {
    CoordinatesOperationPoint::new(-lon_pw / 3600.0, lat / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arcsec_conversion() {
        let point = CoordinatesOperationPoint::from_lonlat(-100.5, 45.25);
        let (lon_pw, lat) = to_arcsec_pw(&point);
        assert_eq!(lon_pw, 361800.0);
        assert_eq!(lat, 162900.0);
        assert_eq!(from_arcsec_pw(lon_pw, lat), point);
    }
}
