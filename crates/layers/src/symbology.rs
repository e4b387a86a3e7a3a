use std::fmt;

use serde::{Deserialize, Serialize};

/// CSS colour, written either as `#rrggbb` or `rgba(r, g, b, a)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub rgb: [u8; 3],
    pub alpha: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            rgb: [r, g, b],
            alpha: 1.0,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self {
            rgb: [r, g, b],
            alpha,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let inner = s.strip_prefix("rgba(")?.strip_suffix(')')?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [r, g, b, a] = parts.as_slice() else {
            return None;
        };
        let alpha: f32 = a.parse().ok()?;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        Some(Color::rgba(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?, alpha))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.rgb;
        if self.alpha >= 1.0 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "rgba({r}, {g}, {b}, {})", self.alpha)
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s).ok_or_else(|| format!("invalid colour: {s}"))
    }
}

/// How a layer is drawn. Mirrors the three layer types the story uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerStyle {
    /// Area polygons (destruction zones, simulated blast radii).
    Fill {
        color: Color,
        opacity: f32,
        outline: Color,
    },
    /// Point markers.
    Circle {
        radius_px: f32,
        color: Color,
        opacity: f32,
        stroke_width_px: f32,
        stroke_color: Color,
    },
    /// Text labels read from a feature property.
    Label {
        /// Feature property holding the label text.
        field: String,
        font: String,
        color: Color,
        halo_color: Color,
        halo_width_px: f32,
        /// `(zoom, size_px)` steps; below the first zoom labels are hidden.
        size_steps: Vec<(f32, f32)>,
    },
}

impl LayerStyle {
    /// Destruction-zone fill with the translucent dark outline every polygon
    /// layer shares.
    pub fn area(color: Color) -> Self {
        LayerStyle::Fill {
            color,
            opacity: 0.8,
            outline: Color::rgba(0, 0, 0, 0.2),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LayerStyle::Fill { .. } => "fill",
            LayerStyle::Circle { .. } => "circle",
            LayerStyle::Label { .. } => "symbol",
        }
    }

    /// Label size for `zoom`, following the step list.
    pub fn label_size_at(&self, zoom: f32) -> Option<f32> {
        let LayerStyle::Label { size_steps, .. } = self else {
            return None;
        };
        let mut size = 0.0;
        for &(z, s) in size_steps {
            if zoom >= z {
                size = s;
            }
        }
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, LayerStyle};

    #[test]
    fn parses_hex_and_rgba() {
        assert_eq!(Color::parse("#af0d1d"), Some(Color::rgb(0xaf, 0x0d, 0x1d)));
        assert_eq!(
            Color::parse("rgba(0, 0, 0, 0.2)"),
            Some(Color::rgba(0, 0, 0, 0.2))
        );
        assert_eq!(Color::parse("#af0d"), None);
        assert_eq!(Color::parse("rgba(0, 0, 0, 2)"), None);
        assert_eq!(Color::parse("red"), None);
    }

    #[test]
    fn displays_css() {
        assert_eq!(Color::rgb(0xea, 0x50, 0x4c).to_string(), "#ea504c");
        assert_eq!(Color::rgba(0, 0, 0, 0.2).to_string(), "rgba(0, 0, 0, 0.2)");
    }

    #[test]
    fn style_serializes_with_type_tag() {
        let json = serde_json::to_value(LayerStyle::area(Color::rgb(0xf3, 0x9c, 0x9e))).unwrap();
        assert_eq!(json["type"], "fill");
        assert_eq!(json["color"], "#f39c9e");
        assert_eq!(json["outline"], "rgba(0, 0, 0, 0.2)");
    }

    #[test]
    fn label_size_follows_steps() {
        let style = LayerStyle::Label {
            field: "nom".into(),
            font: "Open Sans Bold".into(),
            color: Color::WHITE,
            halo_color: Color::BLACK,
            halo_width_px: 1.0,
            size_steps: vec![(0.0, 0.0), (10.0, 8.0), (12.0, 12.0), (14.0, 13.0)],
        };
        assert_eq!(style.label_size_at(5.0), Some(0.0));
        assert_eq!(style.label_size_at(11.4), Some(8.0));
        assert_eq!(style.label_size_at(16.0), Some(13.0));
        assert_eq!(LayerStyle::area(Color::BLACK).label_size_at(12.0), None);
    }
}
