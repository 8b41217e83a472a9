//! # 展示层辅助模块（presenter）
//!
//! 取色结果交给 UI 之后的三种去向：
//!
//! - `format`：hex / rgb / hsl 文本格式，整板复制时逐行拼接
//! - `export`：导出为带缩进的 JSON 文件
//! - `clipboard_writer`：写入系统剪贴板（阻塞线程 + 有限重试）

mod clipboard_writer;
mod export;
mod format;

pub use clipboard_writer::{ClipboardRetryPolicy, ClipboardWriter};
pub use export::{PaletteExport, export_json, write_export};
pub use format::{ColorFormat, copy_text};
