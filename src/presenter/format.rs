//! 颜色值的文本输出格式（复制到剪贴板时使用）。

use crate::error::PaletteError;
use crate::palette::PaletteEntry;

/// 复制颜色值时的输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Hex,
    Rgb,
    Hsl,
}

impl ColorFormat {
    /// 从外部字符串解析格式。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::presenter::ColorFormat;
    ///
    /// assert_eq!(ColorFormat::from_str("HSL")?, ColorFormat::Hsl);
    /// # Ok::<(), palette_extractor::PaletteError>(())
    /// ```
    pub fn from_str(format: &str) -> Result<Self, PaletteError> {
        match format.trim().to_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "rgb" => Ok(Self::Rgb),
            "hsl" => Ok(Self::Hsl),
            other => Err(PaletteError::InvalidParameter(format!(
                "未知颜色格式：{}（可选：hex / rgb / hsl）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Rgb => "rgb",
            Self::Hsl => "hsl",
        }
    }

    pub fn format_entry(self, entry: &PaletteEntry) -> String {
        match self {
            Self::Hex => entry.hex.clone(),
            Self::Rgb => entry.rgb.to_css(),
            Self::Hsl => entry.hsl.to_css(),
        }
    }
}

/// 整个调色板按指定格式逐行拼接。
pub fn copy_text(palette: &[PaletteEntry], format: ColorFormat) -> String {
    palette
        .iter()
        .map(|entry| format.format_entry(entry))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Hsl, Rgb};

    fn entry(r: u8, g: u8, b: u8, count: u32) -> PaletteEntry {
        let rgb = Rgb::new(r, g, b);
        PaletteEntry {
            hex: rgb.to_hex(),
            rgb,
            hsl: rgb.to_hsl(),
            count,
        }
    }

    #[test]
    fn formats_single_entry() {
        let red = entry(240, 0, 0, 3);
        assert_eq!(ColorFormat::Hex.format_entry(&red), "#f00000");
        assert_eq!(ColorFormat::Rgb.format_entry(&red), "rgb(240, 0, 0)");
        assert_eq!(ColorFormat::Hsl.format_entry(&red), "hsl(0, 100%, 47%)");
    }

    #[test]
    fn joins_palette_with_newlines() {
        let palette = vec![entry(240, 0, 0, 3), entry(0, 128, 255, 1)];
        assert_eq!(copy_text(&palette, ColorFormat::Hex), "#f00000\n#0080ff");
        assert_eq!(copy_text(&[], ColorFormat::Rgb), "");
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(ColorFormat::from_str(" rgb ").unwrap(), ColorFormat::Rgb);
        assert!(ColorFormat::from_str("cmyk").is_err());
        assert_eq!(
            Hsl { h: 1, s: 2, l: 3 }.to_css(),
            "hsl(1, 2%, 3%)"
        );
    }
}
