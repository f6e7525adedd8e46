//! 像素灰度分类统计.
//!
//! 统计直接作用于 **原始存储值** (未做 rescale), 与既有测量流程保持一致.
//! 以区域内像素的 1%, 5%, 95%, 99% 百分位为界, 把像素分为
//! 黑 / 近黑 / 灰 / 近白 / 白 五类.

use crate::{RawSlice, Region};
use ordered_float::OrderedFloat;

/// 线性插值百分位数, 输入必须已升序排序.
///
/// 秩为 `p / 100 * (n - 1)`, 落在两个样本之间时线性插值.
///
/// # Panics
///
/// 输入为空时 panic.
pub fn percentile(sorted: &[f32], p: f64) -> f64 {
    assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 >= n {
        return sorted[n - 1] as f64;
    }
    sorted[lo] as f64 + frac * (sorted[lo + 1] as f64 - sorted[lo] as f64)
}

/// 单区域的五分类像素统计.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelClassMetrics {
    /// 黑: 不超过 1% 百分位.
    pub black: usize,

    /// 近黑: 超过 1% 但不超过 5% 百分位.
    pub almost_black: usize,

    /// 灰: 超过 5% 百分位且严格小于 95% 百分位.
    pub gray: usize,

    /// 近白: 不小于 95% 但严格小于 99% 百分位.
    pub almost_white: usize,

    /// 白: 不小于 99% 百分位.
    pub white: usize,

    /// 区域像素总数.
    pub total: usize,
}

macro_rules! impl_proportion {
    ($(#[$doc:meta] $name:ident => $field:ident),+ $(,)?) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(&self) -> f64 {
                self.$field as f64 / self.total as f64
            }
        )+
    };
}

impl PixelClassMetrics {
    /// 对一组像素值做五分类统计.
    ///
    /// 分类按 "先到先得" 的链式判定进行, 各分界的开闭方向与既有
    /// 测量流程一致, 且保证五类计数之和恰为像素总数.
    pub fn from_values(values: &[f32]) -> Option<PixelClassMetrics> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by_key(|&v| OrderedFloat(v));
        let p1 = percentile(&sorted, 1.0);
        let p5 = percentile(&sorted, 5.0);
        let p95 = percentile(&sorted, 95.0);
        let p99 = percentile(&sorted, 99.0);

        let mut m = PixelClassMetrics {
            black: 0,
            almost_black: 0,
            gray: 0,
            almost_white: 0,
            white: 0,
            total: values.len(),
        };
        for &v in values {
            let v = v as f64;
            if v <= p1 {
                m.black += 1;
            } else if v <= p5 {
                m.almost_black += 1;
            } else if v < p95 {
                m.gray += 1;
            } else if v < p99 {
                m.almost_white += 1;
            } else {
                m.white += 1;
            }
        }
        Some(m)
    }

    impl_proportion! {
        /// 黑像素占比.
        black_ratio => black,
        /// 近黑像素占比.
        almost_black_ratio => almost_black,
        /// 灰像素占比.
        gray_ratio => gray,
        /// 近白像素占比.
        almost_white_ratio => almost_white,
        /// 白像素占比.
        white_ratio => white,
    }
}

/// 对切片上的一个区域做五分类统计, 基于原始存储值.
///
/// 区域与切片无交集时返回 `None`.
pub fn region_metrics(slice: &RawSlice, region: &Region) -> Option<PixelClassMetrics> {
    let (h, w) = slice.dim();
    let raw = slice.raw();
    let r1 = ((region.y_max() as usize) + 1).min(h);
    let c1 = ((region.x_max() as usize) + 1).min(w);
    let (r0, c0) = (region.y as usize, region.x as usize);
    if r0 >= r1 || c0 >= c1 {
        return None;
    }
    let values: Vec<f32> = (r0..r1)
        .flat_map(|r| (c0..c1).map(move |c| raw[[r, c]]))
        .collect();
    PixelClassMetrics::from_values(&values)
}

/// 单张切片的统计记录: 左右两个骨区各一份五分类统计.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceMetricsRecord {
    /// 切片文件名.
    pub file_name: String,

    /// 从文件名解析出的切片编号.
    pub slice_number: u32,

    /// 左右两个骨区的统计, 按区域横坐标升序.
    pub per_region: [PixelClassMetrics; 2],
}

impl SliceMetricsRecord {
    /// 左区 (横坐标较小) 的灰像素数. 推荐引擎的主信号.
    #[inline]
    pub fn left_gray(&self) -> usize {
        self.per_region[0].gray
    }
}
