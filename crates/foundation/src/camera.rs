use serde::{Deserialize, Serialize};

use crate::math::LonLat;
use crate::time::Millis;

/// Camera pose for the map viewport: where to look and how long to fly there.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub center: LonLat,
    pub zoom: f64,
    #[serde(default)]
    pub bearing_deg: f64,
    #[serde(default)]
    pub pitch_deg: f64,
    pub duration: Millis,
}

impl CameraPose {
    /// Flat, north-up pose.
    pub const fn new(center: LonLat, zoom: f64, duration: Millis) -> Self {
        Self {
            center,
            zoom,
            bearing_deg: 0.0,
            pitch_deg: 0.0,
            duration,
        }
    }

    pub const fn with_bearing(mut self, bearing_deg: f64) -> Self {
        self.bearing_deg = bearing_deg;
        self
    }

    pub const fn with_pitch(mut self, pitch_deg: f64) -> Self {
        self.pitch_deg = pitch_deg;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_valid()
            && self.zoom.is_finite()
            && (0.0..=24.0).contains(&self.zoom)
            && self.bearing_deg.is_finite()
            && (0.0..=85.0).contains(&self.pitch_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::CameraPose;
    use crate::math::LonLat;
    use crate::time::Millis;

    #[test]
    fn builder_sets_angles() {
        let p = CameraPose::new(LonLat::new(129.88, 32.76), 12.1, Millis(8000))
            .with_bearing(-49.6)
            .with_pitch(34.5);
        assert_eq!(p.bearing_deg, -49.6);
        assert_eq!(p.pitch_deg, 34.5);
        assert!(p.is_valid());
    }

    #[test]
    fn rejects_out_of_range_pitch() {
        let p = CameraPose::new(LonLat::new(0.0, 0.0), 3.0, Millis(1500)).with_pitch(90.0);
        assert!(!p.is_valid());
    }

    #[test]
    fn angles_default_to_zero_when_omitted() {
        let p: CameraPose =
            serde_json::from_str(r#"{"center":[160.0,0.0],"zoom":3.0,"duration":1500}"#).unwrap();
        assert_eq!(p.bearing_deg, 0.0);
        assert_eq!(p.pitch_deg, 0.0);
        assert_eq!(p.duration, Millis(1500));
    }
}
