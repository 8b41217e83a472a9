//! # 解码模块
//!
//! ## 设计思路
//!
//! 通过 `ImageDecoder` trait 把“字节 → RGBA 像素”与后续取色算法隔离：
//! 量化 / 排序 / 颜色转换只依赖 `PixelBuffer`，测试时可注入任意解码实现。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码并转换 RGBA
//! 4. 校验字节长度一致性（由 `PixelBuffer::from_rgba` 保证）

use image::GenericImageView;
use std::io::Cursor;

use super::{ImageDecodeError, PaletteConfig, PixelBuffer};

/// 图片解码能力：`bytes -> {width, height, pixels} | Error`。
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImageDecodeError>;
}

/// 基于 `image` crate 的默认解码器（PNG / JPEG / GIF / WebP / BMP 等）。
#[derive(Debug, Clone)]
pub struct RasterDecoder {
    max_decoded_pixels: u64,
    max_decoded_bytes: u64,
}

impl RasterDecoder {
    pub fn new(max_decoded_pixels: u64, max_decoded_bytes: u64) -> Self {
        Self {
            max_decoded_pixels,
            max_decoded_bytes,
        }
    }

    pub fn from_config(config: &PaletteConfig) -> Self {
        Self::new(config.max_decoded_pixels, config.max_decoded_bytes)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageDecodeError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageDecodeError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        if reader.format().is_none() {
            return Err(ImageDecodeError::InvalidFormat("不支持的图片格式".to_string()));
        }

        reader
            .into_dimensions()
            .map_err(|e| ImageDecodeError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_limits(&self, width: u32, height: u32) -> Result<(), ImageDecodeError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageDecodeError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(ImageDecodeError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            )));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| ImageDecodeError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.max_decoded_bytes {
            return Err(ImageDecodeError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, ImageDecodeError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(bytes)?;
        self.validate_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ImageDecodeError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_limits(width, height)?;

        log::debug!("🖼️ 图片解码成功 - 尺寸: {}x{}", width, height);

        PixelBuffer::from_rgba(width, height, decoded.to_rgba8().into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 7, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn decodes_png_into_rgba_buffer() {
        let buffer = RasterDecoder::default()
            .decode(&create_png_bytes(3, 2))
            .expect("decode failed");

        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert_eq!(buffer.as_bytes().len(), 3 * 2 * 4);
        assert_eq!(buffer.pixels().nth(1), Some([1, 0, 7, 255]));
    }

    #[test]
    fn rejects_truncated_png() {
        let mut bytes = create_png_bytes(16, 16);
        bytes.truncate(bytes.len() / 2);

        let result = RasterDecoder::default().decode(&bytes);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        let result = RasterDecoder::default().decode(b"definitely not an image");

        assert!(matches!(result, Err(ImageDecodeError::InvalidFormat(_))));
    }

    #[test]
    fn enforces_pixel_limit_from_header() {
        let decoder = RasterDecoder::new(10, u64::MAX);

        let result = decoder.decode(&create_png_bytes(4, 4));

        assert!(matches!(result, Err(ImageDecodeError::ResourceLimit(_))));
    }
}
