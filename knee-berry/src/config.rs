//! 管线配置.
//!
//! 所有策略阈值集中在这里, 构造时立即校验 (fail fast),
//! 不让非法配置流入管线内部.

use crate::consts;

/// 配置构造错误.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 二值化阈值非有限数.
    BadCutoff,

    /// 区域最小边长为 0.
    ZeroRegionSide,

    /// 超像素参数非法 (块数为 0 或紧致度非正).
    BadSlic,

    /// 间隙步长为 0.
    ZeroGapStride,

    /// 数值区间上下界颠倒.
    ReversedBand,

    /// 峰间距为 0.
    ZeroDistance,

    /// CT 窗口参数越界.
    WindowOutOfRange,
}

/// 区域检测配置.
#[derive(Debug, Clone, Copy)]
pub struct DetectConfig {
    /// 二值化阈值. 作用于高斯平滑后的 HU 图像.
    pub binary_cutoff: f64,

    /// 候选区域最小边长 (宽高都必须严格大于该值).
    pub min_region_side: u32,

    /// 超像素分割目标块数 (仅影响边界叠加图副产品).
    pub slic_segments: u32,

    /// 超像素分割紧致度.
    pub slic_compactness: f64,
}

impl DetectConfig {
    /// 构造并校验.
    pub fn new(
        binary_cutoff: f64,
        min_region_side: u32,
        slic_segments: u32,
        slic_compactness: f64,
    ) -> Result<Self, ConfigError> {
        if !binary_cutoff.is_finite() {
            return Err(ConfigError::BadCutoff);
        }
        if min_region_side == 0 {
            return Err(ConfigError::ZeroRegionSide);
        }
        if slic_segments == 0 || !(slic_compactness > 0.0) {
            return Err(ConfigError::BadSlic);
        }
        Ok(Self {
            binary_cutoff,
            min_region_side,
            slic_segments,
            slic_compactness,
        })
    }

    /// 主流程配置: 二值化阈值 125.
    #[inline]
    pub const fn primary() -> Self {
        Self {
            binary_cutoff: consts::BINARY_CUTOFF_PRIMARY,
            min_region_side: consts::MIN_REGION_SIDE,
            slic_segments: consts::SLIC_SEGMENTS,
            slic_compactness: consts::SLIC_COMPACTNESS,
        }
    }

    /// 备选流程配置: 二值化阈值 160.
    ///
    /// 与 [`DetectConfig::primary`] 的差别仅在于阈值取值;
    /// 两个取值并存于既有测量流程, 由调用方决定采用哪一个.
    #[inline]
    pub const fn alternate() -> Self {
        Self {
            binary_cutoff: consts::BINARY_CUTOFF_ALTERNATE,
            ..Self::primary()
        }
    }
}

impl Default for DetectConfig {
    #[inline]
    fn default() -> Self {
        Self::primary()
    }
}

/// 局部极值搜索参数.
///
/// 语义对齐常见信号处理库的 find-peaks 约定:
/// `height` 是峰值本身的允许区间, `threshold` 是与相邻样本垂直落差的允许区间,
/// `distance` 是峰之间的最小水平间距 (按峰高从高到低保留).
#[derive(Debug, Clone, Copy)]
pub struct PeakParams {
    /// 峰值允许区间 (闭区间).
    pub height: (f64, f64),

    /// 峰间最小水平间距.
    pub distance: usize,

    /// 与相邻样本垂直落差的允许区间 (闭区间).
    pub threshold: (f64, f64),
}

impl PeakParams {
    fn check(&self) -> Result<(), ConfigError> {
        if self.height.0 > self.height.1 || self.threshold.0 > self.threshold.1 {
            return Err(ConfigError::ReversedBand);
        }
        if self.distance == 0 {
            return Err(ConfigError::ZeroDistance);
        }
        Ok(())
    }
}

/// 切片推荐配置.
#[derive(Debug, Clone, Copy)]
pub struct RecommendConfig {
    /// 切片编号跳变达到该步长即视为一个结构性间隙.
    pub gap_stride: u32,

    /// 峰检测参数.
    pub peak: PeakParams,

    /// 谷检测参数. 谷以有界峰搜索的形式编码, 此处原样保留.
    pub trough: PeakParams,

    /// 平台段取值区间 (闭区间).
    pub plateau_band: (f64, f64),

    /// 平台段最小长度 (严格大于该值才保留).
    pub plateau_min_len: usize,

    /// 平台段线性拟合的斜率绝对值上界.
    pub slope_limit: f64,

    /// 平台段拟合直线均值的允许区间 (闭区间).
    pub mean_band: (f64, f64),
}

impl RecommendConfig {
    /// 构造并校验.
    pub fn new(
        gap_stride: u32,
        peak: PeakParams,
        trough: PeakParams,
        plateau_band: (f64, f64),
        plateau_min_len: usize,
        slope_limit: f64,
        mean_band: (f64, f64),
    ) -> Result<Self, ConfigError> {
        if gap_stride == 0 {
            return Err(ConfigError::ZeroGapStride);
        }
        peak.check()?;
        trough.check()?;
        if plateau_band.0 > plateau_band.1 || mean_band.0 > mean_band.1 {
            return Err(ConfigError::ReversedBand);
        }
        Ok(Self {
            gap_stride,
            peak,
            trough,
            plateau_band,
            plateau_min_len,
            slope_limit,
            mean_band,
        })
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            gap_stride: consts::GAP_STRIDE,
            peak: PeakParams {
                height: (consts::PEAK_MIN_HEIGHT, f64::INFINITY),
                distance: consts::PEAK_MIN_DISTANCE,
                threshold: (consts::PEAK_MIN_THRESHOLD, f64::INFINITY),
            },
            trough: PeakParams {
                height: (0.0, consts::TROUGH_MAX_HEIGHT),
                distance: consts::PEAK_MIN_DISTANCE,
                threshold: (consts::TROUGH_THRESHOLD_LOW, consts::TROUGH_THRESHOLD_HIGH),
            },
            plateau_band: consts::PLATEAU_BAND,
            plateau_min_len: consts::PLATEAU_MIN_LEN,
            slope_limit: consts::PLATEAU_SLOPE_LIMIT,
            mean_band: consts::PLATEAU_MEAN_BAND,
        }
    }
}
