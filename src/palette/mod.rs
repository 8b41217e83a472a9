//! # 取色模块（palette）
//!
//! ## 设计思路
//!
//! 将“图片来源识别 → 加载校验 → 解码 → 降采样 → 量化排序 → 颜色转换”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条流水线，持有配置与解码器
//! - `loader`：负责 URL/Base64/文件/字节加载与安全校验
//! - `decoder`：`ImageDecoder` 抽象与基于 `image` 的默认实现
//! - `sampler`：工作分辨率计算与降采样
//! - `quantize`：颜色量化、桶计数与排序
//! - `convert`：RGB → HEX / HSL
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（UI / 展示层）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + URL/体积安全校验）
//!    ├─ decoder.rs（解码 + 像素上限）
//!    ├─ sampler.rs（≤200px 工作分辨率）
//!    ├─ quantize.rs（alpha 过滤 + 步长 16 量化 + 计数排序）
//!    └─ convert.rs（hex / hsl）
//!    ↓
//! Palette 或 ImageDecodeError
//! ```
//!
//! 只有解码类失败会中止流程；量化、排序、转换都是纯计算。

mod config;
pub mod convert;
mod decoder;
mod error;
mod handler;
mod loader;
pub mod quantize;
pub mod sampler;
mod source;

pub use config::{PaletteConfig, PalettePreset};
pub use convert::{Hsl, Rgb, parse_hex, rgb_to_hex, rgb_to_hsl};
pub use decoder::{ImageDecoder, RasterDecoder};
pub use error::ImageDecodeError;
pub use handler::{Palette, PaletteEntry, PaletteExtractor, PipelineStage};
pub use quantize::{ColorCount, QuantizedColor, count_colors, quantize_channel, rank};
pub use sampler::{downsample, working_dimensions};
pub use source::{ImageSource, PixelBuffer};
