//! # 量化与频次排序
//!
//! 每个不透明像素的 RGB 三通道分别取整到步长的倍数，落入同一桶的颜色计数合并，
//! 最后按计数降序取前 N 个桶。
//!
//! 取整规则与网页版 `Math.round` 一致（正数半数向上）；倍数上限为 `255 / step`，
//! 因此步长 16 时最大桶值是 240，不会越过 `u8` 范围。

use std::collections::HashMap;

use super::PixelBuffer;

/// 量化后的颜色桶。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// 单通道量化。
///
/// # 示例
/// ```rust
/// use palette_extractor::palette::quantize_channel;
///
/// assert_eq!(quantize_channel(8, 16), 16);
/// assert_eq!(quantize_channel(7, 16), 0);
/// assert_eq!(quantize_channel(255, 16), 240);
/// ```
pub fn quantize_channel(channel: u8, step: u8) -> u8 {
    let step = u32::from(step.max(1));
    let channel = u32::from(channel);
    // round(c / step) 的整数写法：半数远离零。
    let multiplier = ((2 * channel + step) / (2 * step)).min(255 / step);
    (multiplier * step) as u8
}

impl QuantizedColor {
    pub fn from_rgb(r: u8, g: u8, b: u8, step: u8) -> Self {
        Self {
            r: quantize_channel(r, step),
            g: quantize_channel(g, step),
            b: quantize_channel(b, step),
        }
    }
}

/// 颜色桶计数表，遍历顺序即桶首次出现的顺序。
#[derive(Debug, Clone, Default)]
pub struct ColorCount {
    index: HashMap<QuantizedColor, usize>,
    entries: Vec<(QuantizedColor, u32)>,
}

impl ColorCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为桶计数加一。
    pub fn record(&mut self, color: QuantizedColor) {
        match self.index.get(&color) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(color, self.entries.len());
                self.entries.push((color, 1));
            }
        }
    }

    pub fn get(&self, color: &QuantizedColor) -> Option<u32> {
        self.index.get(color).map(|&slot| self.entries[slot].1)
    }

    /// 不同桶的数量。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有桶计数之和，即参与统计的像素数。
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| u64::from(*count)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuantizedColor, u32)> + '_ {
        self.entries.iter().copied()
    }
}

/// 单次线性遍历像素，统计各颜色桶出现次数。alpha 低于阈值的像素不计入。
pub fn count_colors(buffer: &PixelBuffer, step: u8, alpha_threshold: u8) -> ColorCount {
    let mut counts = ColorCount::new();

    for [r, g, b, a] in buffer.pixels() {
        if a < alpha_threshold {
            continue;
        }
        counts.record(QuantizedColor::from_rgb(r, g, b, step));
    }

    counts
}

/// 按计数降序取前 `palette_size` 个桶；计数相同按首次出现顺序。
pub fn rank(counts: &ColorCount, palette_size: usize) -> Vec<(QuantizedColor, u32)> {
    if palette_size == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(QuantizedColor, u32)> = counts.iter().collect();
    // sort_by 是稳定排序，相同计数保留插入顺序。
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(palette_size);
    ranked
}
