//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `PaletteExtractor` 只负责流程编排与配置管理，处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节（唯一的异步等待点）
//! 3. 解码并降采样到工作分辨率
//! 4. 量化 + 频次排序
//! 5. 颜色空间转换，产出调色板
//!
//! 状态流转：`Idle → Sampling → Ranking → Converting → Complete`，
//! 只有 `Sampling` 阶段可能进入 `Failed`。失败不重试，也不返回部分结果。
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<PaletteConfig>>` 支持运行时调整。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 每次调用自行分配像素缓冲与计数表，调用之间不共享可变状态。
//! - 记录 `load/decode/rank/convert/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;

use super::{
    ImageDecodeError, ImageDecoder, ImageSource, PaletteConfig, PalettePreset, PixelBuffer,
    QuantizedColor, RasterDecoder, Rgb, convert, quantize, sampler,
};
use crate::error::PaletteError;

/// 调色板中的一种颜色。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub hex: String,
    pub rgb: Rgb,
    pub hsl: convert::Hsl,
    /// 落入该颜色桶的像素数（≥ 1）。
    pub count: u32,
}

impl PaletteEntry {
    fn from_bucket(color: QuantizedColor, count: u32) -> Self {
        let rgb = Rgb::new(color.r, color.g, color.b);
        Self {
            hex: convert::rgb_to_hex(rgb),
            rgb,
            hsl: convert::rgb_to_hsl(rgb),
            count,
        }
    }
}

/// 按计数降序排列的调色板。
pub type Palette = Vec<PaletteEntry>;

/// 取色流水线阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Sampling,
    Ranking,
    Converting,
    Complete,
    Failed,
}

/// 调色板提取器。
pub struct PaletteExtractor {
    pub(super) config: Arc<RwLock<PaletteConfig>>,
    decoder: Arc<dyn ImageDecoder>,
}

impl PaletteExtractor {
    /// 使用默认的 `RasterDecoder` 创建提取器。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::palette::{PaletteConfig, PaletteExtractor};
    ///
    /// let extractor = PaletteExtractor::new(PaletteConfig::default())?;
    /// # Ok::<(), palette_extractor::PaletteError>(())
    /// ```
    pub fn new(config: PaletteConfig) -> Result<Self, PaletteError> {
        let decoder = Arc::new(RasterDecoder::from_config(&config));
        Self::with_decoder(config, decoder)
    }

    /// 注入自定义解码器（测试或非 `image` crate 的解码后端）。
    pub fn with_decoder(
        config: PaletteConfig,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, PaletteError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            decoder,
        })
    }

    /// 获取配置快照。
    pub fn config(&self) -> Result<PaletteConfig, PaletteError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| PaletteError::InvalidParameter("配置读取锁已中毒".to_string()))
    }

    /// 替换配置，非法取值直接拒绝。
    ///
    /// 解码上限由注入的解码器自行持有，这里只影响加载、采样与量化参数。
    pub fn set_config(&self, new_config: PaletteConfig) -> Result<(), PaletteError> {
        new_config.validate()?;

        let mut config = self
            .config
            .write()
            .map_err(|_| PaletteError::InvalidParameter("配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 已更新取色配置（max_dim={}, step={}, alpha={}, filter={:?}）",
            new_config.max_working_dimension,
            new_config.quantize_step,
            new_config.alpha_threshold,
            new_config.resize_filter
        );
        *config = new_config;

        Ok(())
    }

    fn config_snapshot(&self) -> Result<PaletteConfig, ImageDecodeError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageDecodeError::ConfigUnavailable("配置读取锁已中毒".to_string()))
    }

    /// 处理主入口：从任意来源加载图片并提取调色板。
    ///
    /// `palette_size` 为 0 时返回空调色板。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use palette_extractor::palette::{ImageSource, PaletteConfig, PaletteExtractor};
    ///
    /// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    /// let extractor = PaletteExtractor::new(PaletteConfig::default())?;
    /// let palette = extractor
    ///     .extract_palette(ImageSource::FilePath("/tmp/photo.png".into()), 8)
    ///     .await?;
    /// for entry in &palette {
    ///     println!("{} x{}", entry.hex, entry.count);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn extract_palette(
        &self,
        source: ImageSource,
        palette_size: usize,
    ) -> Result<Palette, ImageDecodeError> {
        self.extract_palette_with_hooks(source, palette_size, |_| {})
            .await
    }

    /// 使用配置中的 `default_palette_size` 提取调色板。
    ///
    /// 尺寸与其他参数来自同一份配置快照。
    pub async fn extract_palette_default(
        &self,
        source: ImageSource,
    ) -> Result<Palette, ImageDecodeError> {
        self.run_request(source, None, &|_: PipelineStage| {}).await
    }

    /// 按档位（5 / 8 / 12 / 16）提取调色板。
    pub async fn extract_palette_with_preset(
        &self,
        source: ImageSource,
        preset: PalettePreset,
    ) -> Result<Palette, ImageDecodeError> {
        self.extract_palette(source, preset.size()).await
    }

    /// 与 [`extract_palette`](Self::extract_palette) 相同，额外把每次阶段切换通知给 `on_stage`。
    pub async fn extract_palette_with_hooks<S>(
        &self,
        source: ImageSource,
        palette_size: usize,
        on_stage: S,
    ) -> Result<Palette, ImageDecodeError>
    where
        S: Fn(PipelineStage) + Send + Sync,
    {
        self.run_request(source, Some(palette_size), &on_stage).await
    }

    /// `palette_size` 为 `None` 时取快照里的 `default_palette_size`。
    async fn run_request<S>(
        &self,
        source: ImageSource,
        palette_size: Option<usize>,
        on_stage: &S,
    ) -> Result<Palette, ImageDecodeError>
    where
        S: Fn(PipelineStage) + Send + Sync,
    {
        on_stage(PipelineStage::Idle);
        let total_start = Instant::now();

        on_stage(PipelineStage::Sampling);
        let config = match self.config_snapshot() {
            Ok(config) => config,
            Err(err) => {
                log::warn!("❌ 取色失败（{}）：{}", err.stage(), err);
                on_stage(PipelineStage::Failed);
                return Err(err);
            }
        };
        let palette_size = palette_size.unwrap_or(config.default_palette_size);

        let load_start = Instant::now();
        let loaded = match source {
            ImageSource::Url(url) => self.load_from_url(&url, &config).await,
            ImageSource::Base64(data) => self.load_from_base64(&data, &config),
            ImageSource::FilePath(path) => self.load_from_file(&path, &config),
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, &config),
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let working = match loaded.and_then(|raw| {
            log::debug!("📦 已加载图片字节 - 来源: {} 大小: {}", raw.source_hint, raw.bytes.len());
            self.decode_and_sample(&raw.bytes, &config)
        }) {
            Ok(working) => working,
            Err(err) => {
                log::warn!("❌ 取色失败（{}）：{}", err.stage(), err);
                on_stage(PipelineStage::Failed);
                return Err(err);
            }
        };
        let decode_elapsed = decode_start.elapsed();

        let palette = Self::run_core(&working, palette_size, &config, on_stage);

        log::info!(
            "✅ 取色完成 - 颜色数: {} load={}ms decode={}ms total={}ms",
            palette.len(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(palette)
    }

    /// 同步版本：对已在内存中的图片字节取色。
    ///
    /// 与 `ImageSource::Bytes` 走同样的体积与签名校验。
    pub fn extract_from_bytes(
        &self,
        bytes: &[u8],
        palette_size: usize,
    ) -> Result<Palette, ImageDecodeError> {
        let config = self.config_snapshot()?;
        Self::check_in_memory_bytes(bytes, &config)?;
        let working = self.decode_and_sample(bytes, &config)?;
        Ok(Self::run_core(&working, palette_size, &config, &|_: PipelineStage| {}))
    }

    /// 对已解码的像素缓冲取色（会先降采样到工作分辨率）。
    pub fn extract_from_pixels(
        &self,
        buffer: &PixelBuffer,
        palette_size: usize,
    ) -> Result<Palette, ImageDecodeError> {
        let config = self.config_snapshot()?;
        if buffer.width() == 0 || buffer.height() == 0 {
            return Ok(Palette::new());
        }

        let working = sampler::downsample(
            buffer.clone(),
            config.max_working_dimension,
            config.resize_filter,
        )?;
        Ok(Self::run_core(&working, palette_size, &config, &|_: PipelineStage| {}))
    }

    fn decode_and_sample(
        &self,
        bytes: &[u8],
        config: &PaletteConfig,
    ) -> Result<PixelBuffer, ImageDecodeError> {
        let decoded = self.decoder.decode(bytes)?;
        let (raw_width, raw_height) = (decoded.width(), decoded.height());

        let working =
            sampler::downsample(decoded, config.max_working_dimension, config.resize_filter)?;

        log::info!(
            "🖼️ 图片采样完成 - 原始尺寸: {}x{} 工作尺寸: {}x{}",
            raw_width,
            raw_height,
            working.width(),
            working.height()
        );

        Ok(working)
    }

    /// 量化 → 排序 → 转换。纯计算，无失败路径。
    fn run_core<S>(
        working: &PixelBuffer,
        palette_size: usize,
        config: &PaletteConfig,
        on_stage: &S,
    ) -> Palette
    where
        S: Fn(PipelineStage),
    {
        on_stage(PipelineStage::Ranking);
        let rank_start = Instant::now();
        let counts = quantize::count_colors(working, config.quantize_step, config.alpha_threshold);
        let ranked = quantize::rank(&counts, palette_size);
        let rank_elapsed = rank_start.elapsed();

        on_stage(PipelineStage::Converting);
        let convert_start = Instant::now();
        let palette: Palette = ranked
            .into_iter()
            .map(|(color, count)| PaletteEntry::from_bucket(color, count))
            .collect();

        log::debug!(
            "🎨 量化 {} 个桶 / {} 像素，取前 {} 个 - rank={}ms convert={}ms",
            counts.len(),
            counts.total(),
            palette.len(),
            rank_elapsed.as_millis(),
            convert_start.elapsed().as_millis()
        );

        on_stage(PipelineStage::Complete);
        palette
    }
}
