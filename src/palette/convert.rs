//! # 颜色空间转换
//!
//! RGB → HEX / HSL。所有中间计算使用 `f64`，只在最终输出时取整，避免误差累积。

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// HSL 表示：`h` 为整数角度（0..=360），`s` / `l` 为整数百分比（0..=100）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        rgb_to_hex(self)
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self)
    }

    /// CSS 写法：`rgb(r, g, b)`。
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Hsl {
    /// CSS 写法：`hsl(h, s%, l%)`。
    pub fn to_css(self) -> String {
        format!("hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

/// # 示例
/// ```rust
/// use palette_extractor::palette::{Rgb, rgb_to_hex};
///
/// assert_eq!(rgb_to_hex(Rgb::new(0, 128, 255)), "#0080ff");
/// ```
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// 解析 `#rrggbb` / `rrggbb`（大小写不敏感）。
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = f64::from(rgb.r) / 255.0;
    let g = f64::from(rgb.g) / 255.0;
    let b = f64::from(rgb.b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let (h, s) = if max == min {
        (0.0, 0.0)
    } else {
        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h / 6.0, s)
    };

    Hsl {
        h: (h * 360.0).round() as u16,
        s: (s * 100.0).round() as u8,
        l: (l * 100.0).round() as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_known_values() {
        assert_eq!(rgb_to_hex(Rgb::new(0, 128, 255)), "#0080ff");
        assert_eq!(rgb_to_hex(Rgb::new(255, 255, 255)), "#ffffff");
        assert_eq!(rgb_to_hex(Rgb::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn parse_hex_accepts_common_spellings() {
        assert_eq!(parse_hex("#0080FF"), Some(Rgb::new(0, 128, 255)));
        assert_eq!(parse_hex("f0f0f0"), Some(Rgb::new(240, 240, 240)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex("#ééé"), None);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(rgb_to_hsl(Rgb::new(255, 0, 0)), Hsl { h: 0, s: 100, l: 50 });
        assert_eq!(rgb_to_hsl(Rgb::new(0, 255, 0)), Hsl { h: 120, s: 100, l: 50 });
        assert_eq!(rgb_to_hsl(Rgb::new(0, 0, 255)), Hsl { h: 240, s: 100, l: 50 });
    }

    #[test]
    fn hsl_achromatic_has_zero_saturation() {
        assert_eq!(rgb_to_hsl(Rgb::new(128, 128, 128)).s, 0);
        assert_eq!(rgb_to_hsl(Rgb::new(255, 255, 255)).l, 100);
        assert_eq!(rgb_to_hsl(Rgb::new(0, 0, 0)).l, 0);
    }

    #[test]
    fn hsl_rounds_only_at_output() {
        // h' = 6 - 224/240 = 5.0667 -> 304 deg
        assert_eq!(rgb_to_hsl(Rgb::new(240, 0, 224)).h, 304);
        assert_eq!(rgb_to_hsl(Rgb::new(240, 0, 224)).s, 100);
        assert_eq!(rgb_to_hsl(Rgb::new(240, 0, 224)).l, 47);
        // l > 0.5 branch
        assert_eq!(rgb_to_hsl(Rgb::new(255, 128, 128)), Hsl { h: 0, s: 100, l: 75 });
    }

    #[test]
    fn css_strings() {
        assert_eq!(Rgb::new(1, 2, 3).to_css(), "rgb(1, 2, 3)");
        assert_eq!(Hsl { h: 120, s: 100, l: 50 }.to_css(), "hsl(120, 100%, 50%)");
    }

    proptest! {
        #[test]
        fn hex_round_trips(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let rgb = Rgb::new(r, g, b);
            prop_assert_eq!(parse_hex(&rgb_to_hex(rgb)), Some(rgb));
        }

        #[test]
        fn hsl_stays_in_range(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let hsl = rgb_to_hsl(Rgb::new(r, g, b));
            prop_assert!(hsl.h <= 360);
            prop_assert!(hsl.s <= 100);
            prop_assert!(hsl.l <= 100);
        }
    }
}
