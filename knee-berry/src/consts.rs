//! 通用策略常量.
//!
//! 这些阈值都是经验值, 按原测量流程原样保留, 并通过
//! [`crate::config`] 暴露为可配置项.

/// 候选区域的最小边长 (严格大于该值才保留).
pub const MIN_REGION_SIDE: u32 = 70;

/// 轮廓检测二值化阈值 (主流程取值).
pub const BINARY_CUTOFF_PRIMARY: f64 = 125.0;

/// 轮廓检测二值化阈值 (备选流程取值).
///
/// 两个取值在既有测量流程中并存, 哪个权威尚无定论, 因此都保留.
pub const BINARY_CUTOFF_ALTERNATE: f64 = 160.0;

/// 超像素分割目标块数.
pub const SLIC_SEGMENTS: u32 = 100;

/// 超像素分割紧致度.
pub const SLIC_COMPACTNESS: f64 = 10.0;

/// 像素分类所用的百分位点: 1%, 5%, 95%, 99%.
pub const CLASS_PERCENTILES: [f64; 4] = [1.0, 5.0, 95.0, 99.0];

/// 切片编号跳变达到该步长即视为一个结构性间隙.
pub const GAP_STRIDE: u32 = 100;

/// 峰检测: 最小峰高.
pub const PEAK_MIN_HEIGHT: f64 = 20_000.0;

/// 峰检测: 峰间最小水平间距.
pub const PEAK_MIN_DISTANCE: usize = 10;

/// 峰检测: 与相邻样本的最小垂直落差.
pub const PEAK_MIN_THRESHOLD: f64 = 500.0;

/// 谷检测 (编码为有界峰搜索): 峰高上界.
pub const TROUGH_MAX_HEIGHT: f64 = 20_000.0;

/// 谷检测: 垂直落差下界.
pub const TROUGH_THRESHOLD_LOW: f64 = -10_000.0;

/// 谷检测: 垂直落差上界.
pub const TROUGH_THRESHOLD_HIGH: f64 = 10_000.0;

/// 平台段取值区间.
pub const PLATEAU_BAND: (f64, f64) = (7_000.0, 13_000.0);

/// 平台段最小长度 (严格大于该值才保留).
pub const PLATEAU_MIN_LEN: usize = 5;

/// 平台段线性拟合的斜率绝对值上界.
pub const PLATEAU_SLOPE_LIMIT: f64 = 250.0;

/// 平台段拟合直线均值的允许区间.
pub const PLATEAU_MEAN_BAND: (f64, f64) = (9_000.0, 12_000.0);

/// 顶端锚点的目标角度 (度).
pub const TOP_ANCHOR_DEGREES: f64 = 30.0;

/// 第一个地标的目标角比例 (目标角的 60%).
pub const LANDMARK_FIRST_RATIO: f64 = 0.6;

/// 最后一个地标的目标角比例 (目标角的 90%).
pub const LANDMARK_LAST_RATIO: f64 = 0.9;

/// Cobb 轴垂线的半长 (像素).
pub const AXIS_HALF_LEN: f64 = 50.0;

/// 膝关节骨窗: 窗位.
pub const BONE_WINDOW_LEVEL: f32 = 300.0;

/// 膝关节骨窗: 窗宽.
pub const BONE_WINDOW_WIDTH: f32 = 1500.0;
