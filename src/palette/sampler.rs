//! # 采样模块
//!
//! ## 设计思路
//!
//! 取色只关心颜色分布，不需要原图分辨率。解码后的像素先缩到工作分辨率
//! （单边不超过 `max_working_dimension`，只缩小不放大），再交给量化器。
//!
//! ## 实现思路
//!
//! - `working_dimensions`：`scale = min(max / w, max / h, 1)`，宽高分别四舍五入。
//! - 优先使用 `fast_image_resize` 卷积缩放；失败时回退 `image::imageops::resize`。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba};

use super::{ImageDecodeError, PixelBuffer};

/// 计算工作分辨率。
///
/// # 示例
/// ```rust
/// use palette_extractor::palette::working_dimensions;
///
/// assert_eq!(working_dimensions(400, 100, 200), (200, 50));
/// assert_eq!(working_dimensions(50, 20, 200), (50, 20));
/// ```
pub fn working_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let max = max_dimension as f64;
    let scale = (max / width as f64).min(max / height as f64).min(1.0);

    let target_width = ((width as f64 * scale).round() as u32).max(1);
    let target_height = ((height as f64 * scale).round() as u32).max(1);

    (target_width, target_height)
}

/// 将像素缓冲缩放到工作分辨率；已在范围内时原样返回。
pub fn downsample(
    buffer: PixelBuffer,
    max_dimension: u32,
    filter: FilterType,
) -> Result<PixelBuffer, ImageDecodeError> {
    let (width, height) = (buffer.width(), buffer.height());
    if width == 0 || height == 0 {
        return Err(ImageDecodeError::Decode("图片尺寸为 0".to_string()));
    }

    let (target_width, target_height) = working_dimensions(width, height, max_dimension);
    if (target_width, target_height) == (width, height) {
        return Ok(buffer);
    }

    log::debug!(
        "🧩 降采样：{}x{} -> {}x{}（filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        filter
    );

    let pixels = buffer.into_raw();
    let resized = match resize_with_fast_image_resize(
        &pixels,
        (width, height),
        (target_width, target_height),
        filter,
    ) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::imageops::resize：{}", err);
            resize_with_image(pixels, (width, height), (target_width, target_height), filter)?
        }
    };

    PixelBuffer::from_rgba(target_width, target_height, resized)
}

/// 借用源像素，失败时调用方仍持有原缓冲用于回退。
fn resize_with_fast_image_resize(
    pixels: &[u8],
    (src_width, src_height): (u32, u32),
    (dst_width, dst_height): (u32, u32),
    filter: FilterType,
) -> Result<Vec<u8>, ImageDecodeError> {
    let src_image = fr::images::ImageRef::new(src_width, src_height, pixels, fr::PixelType::U8x4)
        .map_err(|e| ImageDecodeError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(dst_width, dst_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageDecodeError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    Ok(dst_image.into_vec())
}

fn resize_with_image(
    pixels: Vec<u8>,
    (src_width, src_height): (u32, u32),
    (dst_width, dst_height): (u32, u32),
    filter: FilterType,
) -> Result<Vec<u8>, ImageDecodeError> {
    let src = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(src_width, src_height, pixels)
        .ok_or_else(|| ImageDecodeError::Decode("源像素缓冲长度异常".to_string()))?;

    Ok(image::imageops::resize(&src, dst_width, dst_height, filter).into_raw())
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
