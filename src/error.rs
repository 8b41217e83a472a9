//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 核心取色只会以 `ImageDecodeError` 失败；展示层（导出、剪贴板）与配置校验
//! 另有各自的失败方式。`PaletteError` 把它们收拢为一个对外类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageDecodeError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，方便 UI 层直接透传。

use serde::Serialize;

use crate::palette::ImageDecodeError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    /// 图片加载 / 解码 / 降采样失败
    #[error("{0}")]
    ImageDecode(#[from] ImageDecodeError),

    /// 配置或调用参数不合法
    #[error("参数错误: {0}")]
    InvalidParameter(String),

    /// 剪贴板写入失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 调色板导出失败
    #[error("导出失败: {0}")]
    Export(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for PaletteError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
