//! # 导出模块
//!
//! 将调色板导出为带缩进的 JSON 数组，每项形如：
//!
//! ```json
//! {
//!   "hex": "#f00000",
//!   "rgb": "rgb(240, 0, 0)",
//!   "hsl": "hsl(0, 100%, 47%)",
//!   "frequency": 1
//! }
//! ```

use std::path::Path;

use serde::Serialize;

use crate::error::PaletteError;
use crate::palette::PaletteEntry;

/// 导出文件中的单条颜色记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteExport {
    pub hex: String,
    pub rgb: String,
    pub hsl: String,
    pub frequency: u32,
}

impl From<&PaletteEntry> for PaletteExport {
    fn from(entry: &PaletteEntry) -> Self {
        Self {
            hex: entry.hex.clone(),
            rgb: entry.rgb.to_css(),
            hsl: entry.hsl.to_css(),
            frequency: entry.count,
        }
    }
}

pub fn export_json(palette: &[PaletteEntry]) -> Result<String, PaletteError> {
    let records: Vec<PaletteExport> = palette.iter().map(PaletteExport::from).collect();
    serde_json::to_string_pretty(&records)
        .map_err(|e| PaletteError::Export(format!("序列化调色板失败: {}", e)))
}

/// 写出 JSON 文件，已存在时覆盖。
pub fn write_export(palette: &[PaletteEntry], path: impl AsRef<Path>) -> Result<(), PaletteError> {
    let content = export_json(palette)?;
    std::fs::write(path.as_ref(), content)?;
    log::info!("💾 调色板已导出 - {} 种颜色 -> {}", palette.len(), path.as_ref().display());
    Ok(())
}
