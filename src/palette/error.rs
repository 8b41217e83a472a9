//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 取色链路中“加载 → 解码 → 降采样”阶段的所有失败统一归入 `ImageDecodeError`。
//! 调用方只需知道“这张图用不了”，具体分支仍可按变体匹配。
//! 量化、排序、颜色转换阶段没有错误路径，不在此列。

/// 图片解码（采样阶段）统一错误类型。
///
/// 任一变体出现都意味着本次取色中止，不会返回部分调色板。
#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 提取器配置无法读取（配置锁已中毒），与图片本身无关。
    #[error("配置不可用：{0}")]
    ConfigUnavailable(String),
}

impl ImageDecodeError {
    /// 稳定错误码，供前端做分支提示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::InvalidFormat(_) => "invalid_format",
            Self::FileSystem(_) => "file_system",
            Self::Timeout(_) => "timeout",
            Self::ResourceLimit(_) => "resource_limit",
            Self::ConfigUnavailable(_) => "config_unavailable",
        }
    }

    /// 出错阶段：`config`（读取配置）、`load`（取字节）或 `decode`（解码/降采样）。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable(_) => "config",
            Self::Network(_) | Self::FileSystem(_) | Self::Timeout(_) => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
        }
    }
}

impl From<ImageDecodeError> for String {
    fn from(error: ImageDecodeError) -> Self {
        error.to_string()
    }
}
