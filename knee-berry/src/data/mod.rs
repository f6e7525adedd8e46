//! 切片与区域基础数据结构.

use crate::PixPoint;
use ndarray::Array2;
use std::path::Path;

mod window;

pub use window::{windowed_display, CtWindow, DisplayImage};

/// 数据层错误.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// 切片像素矩阵为空.
    EmptySlice,

    /// 文件名不符合 `-<三位数字>.<后缀>` 的命名模式.
    BadFileName(String),
}

/// DICOM rescale 线性变换参数 (`HU = slope * raw + intercept`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rescale {
    /// 斜率. 常见取值为 1.
    pub slope: f64,

    /// 截距. 常见取值为 -1024.
    pub intercept: f64,
}

impl Rescale {
    /// 把单个存储值变换为 HU 值.
    #[inline]
    pub fn apply(&self, raw: f32) -> f32 {
        (self.slope * raw as f64 + self.intercept) as f32
    }
}

/// 单张轴向切片的原始存储值矩阵, 以及可选的 rescale 参数.
///
/// 注意: `data` 保存的是 **未变换** 的存储值. 灰度分类统计直接作用于
/// 存储值, 区域检测则作用于 [`RawSlice::to_hounsfield`] 的结果.
#[derive(Debug, Clone)]
pub struct RawSlice {
    data: Array2<f32>,
    rescale: Option<Rescale>,
}

impl RawSlice {
    /// 构建切片. 像素矩阵为空时返回 [`DataError::EmptySlice`].
    pub fn new(data: Array2<f32>, rescale: Option<Rescale>) -> Result<Self, DataError> {
        if data.is_empty() {
            return Err(DataError::EmptySlice);
        }
        Ok(Self { data, rescale })
    }

    /// 原始存储值矩阵.
    #[inline]
    pub fn raw(&self) -> &Array2<f32> {
        &self.data
    }

    /// rescale 参数.
    #[inline]
    pub fn rescale(&self) -> Option<Rescale> {
        self.rescale
    }

    /// 切片形状 (高, 宽).
    #[inline]
    pub fn dim(&self) -> crate::Idx2d {
        self.data.dim()
    }

    /// 应用 rescale 变换得到 HU 矩阵.
    ///
    /// 缺少 rescale 参数时视作恒等变换 (部分设备不写该字段).
    pub fn to_hounsfield(&self) -> Array2<f32> {
        match self.rescale {
            Some(r) => self.data.mapv(|v| r.apply(v)),
            None => self.data.clone(),
        }
    }
}

/// 轴对齐包围盒 (像素坐标, 含边界).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// 左上角横坐标.
    pub x: u32,

    /// 左上角纵坐标.
    pub y: u32,

    /// 宽度.
    pub width: u32,

    /// 高度.
    pub height: u32,
}

impl Region {
    /// 构建包围盒. 宽或高为 0 时返回 `None`.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Option<Region> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// 右边界横坐标 (含).
    #[inline]
    pub fn x_max(&self) -> u32 {
        self.x + self.width - 1
    }

    /// 下边界纵坐标 (含).
    #[inline]
    pub fn y_max(&self) -> u32 {
        self.y + self.height - 1
    }

    /// 面积 (像素数).
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 点是否落在包围盒内 (含边界).
    #[inline]
    pub fn contains(&self, (px, py): PixPoint) -> bool {
        (self.x..=self.x_max()).contains(&px) && (self.y..=self.y_max()).contains(&py)
    }
}

/// 区域检出数不等于 2 时的拒绝信息.
///
/// 膝关节轴向切片上应恰好检出股骨与胫骨两个骨区, 其它任何数量都说明
/// 该切片不适合做 Cobb 测量, 由调用方换一张切片重试.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionReject {
    /// 实际检出的区域数.
    pub found: usize,
}

/// 从切片文件名解析切片编号.
///
/// 文件名约定以 `-<三位数字>.<后缀>` 结尾 (如 `IM-0001-0234.dcm` 的
/// 编号为 234): 取第一个 `.` 之前的主干, 再取主干的最后 3 个字符.
pub fn parse_slice_number<P: AsRef<Path>>(path: P) -> Result<u32, DataError> {
    let name = path
        .as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DataError::BadFileName(path.as_ref().display().to_string()))?;
    let stem = name.split('.').next().unwrap_or(name);
    let bad = || DataError::BadFileName(name.to_owned());
    if stem.len() < 3 || !stem.is_char_boundary(stem.len() - 3) {
        return Err(bad());
    }
    stem[stem.len() - 3..].parse::<u32>().map_err(|_| bad())
}
