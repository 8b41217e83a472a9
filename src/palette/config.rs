//! # 配置模块
//!
//! ## 设计思路
//!
//! 将取色链路中所有“可调策略”集中到 `PaletteConfig`：加载限制、解码上限、
//! 工作分辨率、量化步长、透明度阈值以及剪贴板重试参数。
//! 调色板尺寸档位（5 / 8 / 12 / 16）作为高层语义，由 `PalettePreset` 表达。
//!
//! ## 实现思路
//!
//! - `Default` 给出与网页版取色工具一致的参数（200px 工作边长、步长 16、alpha 128）。
//! - `validate` 在配置写入前拒绝会让算法失去意义的取值。
//! - `PalettePreset` 负责档位字符串解析与反向输出。

use image::imageops::FilterType;

use crate::error::PaletteError;

/// 取色配置。
#[derive(Debug, Clone)]
pub struct PaletteConfig {
    /// 工作分辨率单边上限（像素），只缩小不放大。
    pub max_working_dimension: u32,
    /// alpha 低于该值的像素视为透明，直接跳过。
    pub alpha_threshold: u8,
    /// 量化步长，每个通道取整到该值的倍数。
    pub quantize_step: u8,
    /// 调用方未指定时使用的调色板尺寸（`extract_palette_default`）。
    pub default_palette_size: usize,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 下载/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 网络下载超时时间（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时时间（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 是否对域名执行 DNS 解析后再做内网 IP 拦截。
    pub resolve_dns_for_url_safety: bool,
    /// 写入剪贴板失败时最大尝试次数。
    pub clipboard_retries: u32,
    /// 重试间隔（毫秒）。
    pub clipboard_retry_delay: u64,
    /// 单次写入流程允许的总重试预算（毫秒）。
    pub clipboard_retry_max_total_ms: u64,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            max_working_dimension: 200,
            alpha_threshold: 128,
            quantize_step: 16,
            default_palette_size: PalettePreset::Standard.size(),
            resize_filter: FilterType::Triangle,
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: false,
            resolve_dns_for_url_safety: true,
            clipboard_retries: 3,
            clipboard_retry_delay: 100,
            clipboard_retry_max_total_ms: 1_800,
        }
    }
}

impl PaletteConfig {
    /// 校验配置取值。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::palette::PaletteConfig;
    ///
    /// let mut config = PaletteConfig::default();
    /// config.quantize_step = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), PaletteError> {
        if self.max_working_dimension == 0 {
            return Err(PaletteError::InvalidParameter(
                "max_working_dimension 不能为 0".to_string(),
            ));
        }
        if self.quantize_step == 0 {
            return Err(PaletteError::InvalidParameter("quantize_step 不能为 0".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(PaletteError::InvalidParameter("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(PaletteError::InvalidParameter("解码上限不能为 0".to_string()));
        }
        if !(1..=300).contains(&self.download_timeout) {
            return Err(PaletteError::InvalidParameter(
                "download_timeout 必须在 1~300 秒之间".to_string(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(PaletteError::InvalidParameter(
                "connect_timeout 必须在 1~120 秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms)
            || !(500..=120_000).contains(&self.stream_chunk_timeout_ms)
        {
            return Err(PaletteError::InvalidParameter(
                "流式读取超时必须在 500~120000 毫秒之间".to_string(),
            ));
        }

        Ok(())
    }
}

/// 调色板尺寸档位（网页工具下拉框中的四个选项）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalettePreset {
    Compact,
    Standard,
    Rich,
    Full,
}

impl PalettePreset {
    /// 从外部字符串解析档位，同时接受数字写法。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::palette::PalettePreset;
    ///
    /// let p = PalettePreset::from_str("rich")?;
    /// assert_eq!(p.size(), 12);
    /// assert_eq!(PalettePreset::from_str("16")?, PalettePreset::Full);
    /// # Ok::<(), palette_extractor::PaletteError>(())
    /// ```
    pub fn from_str(preset: &str) -> Result<Self, PaletteError> {
        match preset.trim().to_lowercase().as_str() {
            "compact" | "5" => Ok(Self::Compact),
            "standard" | "8" => Ok(Self::Standard),
            "rich" | "12" => Ok(Self::Rich),
            "full" | "16" => Ok(Self::Full),
            other => Err(PaletteError::InvalidParameter(format!(
                "未知调色板档位：{}（可选：compact / standard / rich / full）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Rich => "rich",
            Self::Full => "full",
        }
    }

    /// 档位对应的颜色数量。
    pub fn size(self) -> usize {
        match self {
            Self::Compact => 5,
            Self::Standard => 8,
            Self::Rich => 12,
            Self::Full => 16,
        }
    }
}
