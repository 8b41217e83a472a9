//! # 调色板提取 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            调用方（网页工具 UI / 结果展示层）             │
//! └───────┬──────────────────────────────────────▲───────────┘
//!         │ ImageSource + palette_size           │ Palette
//! ┌───────▼──────────────────────────────────────┼───────────┐
//! │  ┌─ palette ─────── PaletteExtractor                      │
//! │  │   ├─ loader      URL / Base64 / 文件 / 字节             │
//! │  │   ├─ decoder     ImageDecoder（image crate）            │
//! │  │   ├─ sampler     ≤200px 工作分辨率                      │
//! │  │   ├─ quantize    alpha 过滤 + 量化 + 计数排序           │
//! │  │   └─ convert     hex / hsl                              │
//! │  │                                                         │
//! │  ├─ presenter ───── JSON 导出 / 剪贴板文本                 │
//! │  └─ error ───────── PaletteError（统一错误类型）           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `PaletteError` |
//! | [`palette`] | 从图片提取按频次排序的调色板 |
//! | [`presenter`] | 调色板的文本格式、JSON 导出与剪贴板写入 |

pub mod error;
pub mod palette;
pub mod presenter;

pub use error::PaletteError;
pub use palette::{ImageDecodeError, ImageSource, Palette, PaletteConfig, PaletteEntry, PaletteExtractor};
