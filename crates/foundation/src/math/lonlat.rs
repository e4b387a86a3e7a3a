use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in degrees (WGS84), serialized as `[lon, lat]`
/// the way map styles and GeoJSON expect.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl LonLat {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_valid(&self) -> bool {
        self.lon_deg.is_finite()
            && self.lat_deg.is_finite()
            && (-180.0..=180.0).contains(&self.lon_deg)
            && (-90.0..=90.0).contains(&self.lat_deg)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(v: LonLat) -> Self {
        v.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::LonLat;

    #[test]
    fn validity_bounds() {
        assert!(LonLat::new(132.5, 34.4).is_valid());
        assert!(LonLat::new(-180.0, -90.0).is_valid());
        assert!(!LonLat::new(181.0, 0.0).is_valid());
        assert!(!LonLat::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn serializes_as_pair() {
        let json = serde_json::to_string(&LonLat::new(-1.5, 48.0)).unwrap();
        assert_eq!(json, "[-1.5,48.0]");
    }
}
