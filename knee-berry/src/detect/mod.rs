//! 候选骨区检测.
//!
//! 流程: HU 图高斯平滑 -> 拉普拉斯锐化 (叠加底图) -> 二值化 ->
//! Sobel 梯度 -> 连通域外轮廓 -> 包围盒尺寸过滤.
//! 平滑与二值化都作用在 **物理 HU 值** 上, 阈值是物理量;
//! CT 窗展示图与超像素叠加图只是展示副产品. 候选区域按横坐标升序返回.

mod contour;
mod filter;
mod slic;

pub use contour::{boundary_of, bounding_rect, components};
pub use filter::{
    gaussian_blur3, laplacian, resize_nearest, sharpen, sobel_magnitude, threshold_binary,
};
pub use slic::{mark_boundaries, slic};

use crate::config::DetectConfig;
use crate::{CtWindow, DisplayImage, PixPoint, RawSlice, Region, RegionReject};

/// 单张切片的检测产物.
#[derive(Debug, Clone)]
pub struct Detection {
    /// 通过尺寸过滤的候选区域, 按左上角横坐标升序.
    pub regions: Vec<Region>,

    /// CT 窗展示图.
    pub display: DisplayImage,

    /// 锐化底图上的超像素边界叠加图.
    pub overlay: DisplayImage,

    /// 全部外轮廓像素 (含被尺寸过滤掉的小区域的轮廓).
    pub edge_points: Vec<PixPoint>,
}

impl Detection {
    /// 取落在指定区域内的轮廓像素.
    pub fn edge_points_in(&self, region: &Region) -> Vec<PixPoint> {
        self.edge_points
            .iter()
            .copied()
            .filter(|&p| region.contains(p))
            .collect()
    }

    /// 要求恰好检出两个骨区 (股骨与胫骨), 按横坐标次序返回.
    ///
    /// 其它任何数量都以 [`RegionReject`] 拒绝, 由调用方换切片重试.
    pub fn knee_pair(&self) -> Result<[Region; 2], RegionReject> {
        match self.regions[..] {
            [a, b] => Ok([a, b]),
            _ => Err(RegionReject {
                found: self.regions.len(),
            }),
        }
    }
}

/// 对单张切片执行完整的候选区域检测.
pub fn detect_regions(slice: &RawSlice, window: &CtWindow, cfg: &DetectConfig) -> Detection {
    let hu = slice.to_hounsfield();
    let gray = window.display_gray(&hu);
    let display = DisplayImage::from_gray(&gray);

    let labels = slic(&gray, cfg.slic_segments, cfg.slic_compactness);

    // 平滑, 锐化与二值化都在 HU 域进行, 阈值才是物理量.
    let blurred = gaussian_blur3(&hu);
    let lap = laplacian(&blurred);
    let sharp = sharpen(&blurred, &lap);
    let overlay = mark_boundaries(&DisplayImage::from_gray(&sharp), &labels);

    let binary = threshold_binary(&blurred, cfg.binary_cutoff);
    let edges = resize_nearest(&sobel_magnitude(&binary), gray.dim());

    let mut regions = Vec::new();
    let mut edge_points = Vec::new();
    for comp in components(&edges) {
        for (r, c) in boundary_of(&comp, &edges) {
            edge_points.push((c as u32, r as u32));
        }
        let rect = bounding_rect(&comp);
        if rect.width > cfg.min_region_side && rect.height > cfg.min_region_side {
            regions.push(rect);
        }
    }
    regions.sort_by_key(|r| r.x);

    Detection {
        regions,
        display,
        overlay,
        edge_points,
    }
}
