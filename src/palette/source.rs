//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PixelBuffer` 表示解码后的 RGBA 像素，单次取色独占，用完即弃

use super::ImageDecodeError;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(String),
    /// 已在内存中的图片字节（例如拖拽上传）。
    Bytes(Vec<u8>),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码后的 RGBA 像素数据（行优先，原点在左上角）。
///
/// 唯一构造入口 [`PixelBuffer::from_rgba`] 保证 `data.len() == width * height * 4`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// 由原始 RGBA 字节构造像素缓冲。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::palette::PixelBuffer;
    ///
    /// let buffer = PixelBuffer::from_rgba(1, 1, vec![255, 0, 0, 255])?;
    /// assert_eq!(buffer.pixels().count(), 1);
    /// # Ok::<(), palette_extractor::palette::ImageDecodeError>(())
    /// ```
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageDecodeError> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageDecodeError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if data.len() != expected_len {
            return Err(ImageDecodeError::Decode(format!(
                "像素数据长度异常：{} 字节（期望 {} 字节）",
                data.len(),
                expected_len
            )));
        }

        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// 按行优先顺序遍历每个像素的 `[r, g, b, a]`。
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// alpha 不低于阈值的像素数量。
    pub fn opaque_pixel_count(&self, alpha_threshold: u8) -> usize {
        self.pixels().filter(|px| px[3] >= alpha_threshold).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_length_mismatch() {
        let result = PixelBuffer::from_rgba(2, 2, vec![0; 15]);
        assert!(matches!(result, Err(ImageDecodeError::Decode(_))));
    }

    #[test]
    fn pixels_iterate_row_major() {
        let buffer = PixelBuffer::from_rgba(
            2,
            1,
            vec![1, 2, 3, 255, 4, 5, 6, 0],
        )
        .expect("buffer");
        let pixels: Vec<[u8; 4]> = buffer.pixels().collect();
        assert_eq!(pixels, vec![[1, 2, 3, 255], [4, 5, 6, 0]]);
        assert_eq!(buffer.opaque_pixel_count(128), 1);
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buffer = PixelBuffer::from_rgba(0, 0, Vec::new()).expect("buffer");
        assert_eq!(buffer.pixels().count(), 0);
    }
}
