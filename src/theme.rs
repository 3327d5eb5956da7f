use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Neutral fill for nodes without a usable color value.
pub const DEFAULT_NODE_COLOR: &str = "#aaa";

/// Appearance constants consumed by the selection machine and render
/// adapters. Node fills come from the dataset; the theme only carries the
/// neutral defaults and the opacity levels used for fading/highlighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub default_node_color: String,
    /// Fill opacity of a flow faded out by a selection.
    pub flow_fade_opacity: f32,
    /// Fill opacity of a flow highlighted by a selection.
    pub flow_highlight_opacity: f32,
    /// Brighten amount applied to hovered nodes.
    pub hover_brighten: f32,
    pub layer_label_color: String,
    pub group_label_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            default_node_color: DEFAULT_NODE_COLOR.to_string(),
            flow_fade_opacity: 0.04,
            flow_highlight_opacity: 0.8,
            hover_brighten: 0.5,
            layer_label_color: "#333333".to_string(),
            group_label_color: "#333333".to_string(),
        }
    }
}

static RGB_FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[0-9.]+\s*)?\)$")
        .expect("rgb pattern")
});

static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("orange", "#ffa500"),
        ("purple", "#800080"),
        ("gray", "#808080"),
        ("grey", "#808080"),
        ("silver", "#c0c0c0"),
        ("maroon", "#800000"),
        ("olive", "#808000"),
        ("lime", "#00ff00"),
        ("aqua", "#00ffff"),
        ("cyan", "#00ffff"),
        ("teal", "#008080"),
        ("navy", "#000080"),
        ("fuchsia", "#ff00ff"),
        ("magenta", "#ff00ff"),
        ("brown", "#a52a2a"),
        ("pink", "#ffc0cb"),
        ("gold", "#ffd700"),
        ("indigo", "#4b0082"),
        ("violet", "#ee82ee"),
        ("coral", "#ff7f50"),
        ("salmon", "#fa8072"),
        ("khaki", "#f0e68c"),
        ("crimson", "#dc143c"),
        ("steelblue", "#4682b4"),
        ("tomato", "#ff6347"),
        ("orchid", "#da70d6"),
        ("seagreen", "#2e8b57"),
        ("slategray", "#708090"),
    ])
});

/// A color stored in HSL space so brighten/darken adjustments stay cheap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Hue in degrees, 0..360.
    pub h: f32,
    /// Saturation, 0..1.
    pub s: f32,
    /// Lightness, 0..1.
    pub l: f32,
}

impl Color {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = r as f32 / 255.0;
        let g = g as f32 / 255.0;
        let b = b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if (max - min).abs() < f32::EPSILON {
            return Self { h: 0.0, s: 0.0, l };
        }
        let delta = max - min;
        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let h = if (max - r).abs() < f32::EPSILON {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if (max - g).abs() < f32::EPSILON {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        Self { h: h * 60.0, s, l }
    }

    /// Parse a CSS color value: `#rgb`, `#rrggbb`, `rgb()`/`rgba()` or a
    /// named color. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(caps) = RGB_FN.captures(&lower) {
            let channel = |idx: usize| -> Option<u8> { caps.get(idx)?.as_str().parse().ok() };
            return Some(Self::from_rgb(channel(1)?, channel(2)?, channel(3)?));
        }
        let hex = NAMED_COLORS.get(lower.as_str())?;
        Self::parse_hex(hex.strip_prefix('#').unwrap_or(hex))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        // Byte-offset slicing below requires ASCII; multi-byte input is
        // just an invalid color, not a panic.
        if !hex.is_ascii() {
            return None;
        }
        let expand = |c: u8| (c << 4) | c;
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::from_rgb(expand(r), expand(g), expand(b)))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::from_rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Lighten by `k` steps, d3-style: each step divides lightness by 0.7.
    pub fn brighter(&self, k: f32) -> Self {
        Self {
            h: self.h,
            s: self.s,
            l: (self.l * 0.7f32.powf(-k)).clamp(0.0, 1.0),
        }
    }

    /// Darken by `k` steps, the inverse of [`Color::brighter`].
    pub fn darker(&self, k: f32) -> Self {
        Self {
            h: self.h,
            s: self.s,
            l: (self.l * 0.7f32.powf(k)).clamp(0.0, 1.0),
        }
    }

    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let hp = (self.h.rem_euclid(360.0)) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.l - c / 2.0;
        let to_byte = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        (to_byte(r1), to_byte(g1), to_byte(b1))
    }

    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#fff").unwrap().to_hex(), "#ffffff");
        assert_eq!(Color::parse("#4e79a7").unwrap().to_hex(), "#4e79a7");
        assert_eq!(Color::parse(" #000000 ").unwrap().to_hex(), "#000000");
    }

    #[test]
    fn parses_rgb_and_named() {
        assert_eq!(Color::parse("rgb(255, 0, 0)").unwrap().to_hex(), "#ff0000");
        assert_eq!(
            Color::parse("rgba(70, 130, 180, 0.5)").unwrap().to_hex(),
            "#4682b4"
        );
        assert_eq!(Color::parse("SteelBlue").unwrap().to_hex(), "#4682b4");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Color::parse("").is_none());
        assert!(Color::parse("#12").is_none());
        assert!(Color::parse("not-a-color").is_none());
        assert!(Color::parse("rgb(1,2)").is_none());
    }

    #[test]
    fn rejects_non_ascii_hex_without_panicking() {
        // Multi-byte characters land on non-char byte boundaries when
        // the hex digits are sliced; they must parse as None.
        assert!(Color::parse("#é0").is_none());
        assert!(Color::parse("#ééé").is_none());
        assert!(Color::parse("#4e79a\u{e9}").is_none());
    }

    #[test]
    fn brighter_raises_lightness() {
        let base = Color::parse("#808080").unwrap();
        let bright = base.brighter(0.5);
        assert!(bright.l > base.l);
        assert_eq!(bright.darker(0.5).to_hex(), base.to_hex());
        // Already-white stays white.
        assert_eq!(Color::parse("#fff").unwrap().brighter(1.0).to_hex(), "#ffffff");
    }

    #[test]
    fn default_node_color_parses() {
        assert!(Color::parse(DEFAULT_NODE_COLOR).is_some());
    }
}
