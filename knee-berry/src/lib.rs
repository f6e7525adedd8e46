#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供膝关节 DICOM 断层序列的结构化信息和 Cobb 角测量基础算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 主要针对膝关节横断面序列 (文件名以 `-<三位数字>.<后缀>` 结尾),
//!   没有对其它组织方式的数据做直接适配 (但若新数据遵循相同命名模式, 也可以工作).
//! 2. 检出区域数不为 2、推荐失败等情况属于 **预期结果**, 以 `Result`
//!   显式返回; 在非期望情况下 (如索引越界), 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### 最小二乘圆拟合与角度计算 ✅
//!
//! Cobb 测量的代数几何基础.
//!
//! 实现位于 `knee-berry/src/geom.rs`.
//!
//! ### CT window 视图与展示图像 ✅
//!
//! 提供一个独立的 CT 窗口对象, 并把 HU 切片归一化为 3 通道 8-bit 展示图.
//!
//! 实现位于 `knee-berry/src/data/window.rs`.
//!
//! ### 候选区域检测 ✅
//!
//! 高斯平滑、拉普拉斯锐化、二值化、Sobel 梯度与外轮廓提取,
//! 输出左右排序的候选包围盒与边缘点云.
//!
//! 实现位于 `knee-berry/src/detect`.
//!
//! ### 像素灰度分类统计 ✅
//!
//! 基于 1/5/95/99 百分位的五分类像素统计.
//!
//! 实现位于 `knee-berry/src/metrics.rs`.
//!
//! ### 切片推荐引擎 ✅
//!
//! 对逐切片灰度信号做峰谷检测、平台段搜索与线性拟合过滤,
//! 给出代表性切片推荐.
//!
//! 实现位于 `knee-berry/src/recommend`.
//!
//! ### 交互精修会话 ✅
//!
//! 分割线、锚点与地标选取, 拖拽后原子性重算双圆与 Cobb 轴.
//!
//! 实现位于 `knee-berry/src/refine`.
//!
//! ### 批处理与缓存 ✅
//!
//! 按序并行处理整个序列 (`rayon` feature), 结果可序列化缓存.
//!
//! 实现位于 `knee-berry/src/{stack.rs, cache.rs}`.

/// 二维栅格索引 (高, 宽), 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 平面点 / 向量 `(x, y)`, 高精度.
pub type Pt2d = (f64, f64);

/// 整数像素坐标 `(x, y)`. 注意与 [`Idx2d`] 的 (高, 宽) 次序不同.
pub type PixPoint = (u32, u32);

pub mod consts;

pub mod config;

pub mod geom;

/// 切片与区域基础数据结构.
mod data;

pub use data::{
    parse_slice_number, windowed_display, CtWindow, DataError, DisplayImage, Region, RegionReject,
    Rescale, RawSlice,
};

pub mod detect;

pub mod metrics;

pub mod recommend;

pub mod refine;

mod stack;

pub use stack::{process_stack, SkipReason, SliceOutcome, StackOutcome};

#[cfg(feature = "serde")]
pub mod cache;

pub mod dataset;

pub mod prelude;
