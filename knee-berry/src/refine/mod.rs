//! 交互精修会话.
//!
//! 会话状态机: 选区 -> 画分割线 -> 放置地标 -> 拟合双圆 (可拖拽).
//! 每次拖拽原子性地重算双圆、圆心连线与 Cobb 轴垂线,
//! 并给出相对初始垂线的角度差. 所有几何都在裁剪后的局部坐标系内进行.

mod landmarks;

pub use landmarks::{
    deficit_within, excess_within, find_anchors, select_landmarks, Landmark, LandmarkSet, Side,
};

use crate::consts;
use crate::detect::Detection;
use crate::geom::{self, Circle, FitError};
use crate::{Pt2d, Region};

/// 会话推进失败的预期原因.
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// 选区索引越界.
    RegionOutOfRange(usize),

    /// 分割线两端点重合.
    DegenerateDivider,

    /// 尚未画分割线.
    DividerNotDrawn,

    /// 尚未放置地标.
    LandmarksNotPlaced,

    /// 尚未完成初始拟合.
    CirclesNotFitted,

    /// 一侧点数不足 3 个, 无法拟合.
    TooFewSidePoints(Side, usize),

    /// 一侧选不出完整的 5 个地标 (点云几何退化).
    NoLandmark(Side),

    /// 两圆圆心重合, 无法定义轴线.
    CoincidentCenters,

    /// 圆拟合失败.
    Fit(FitError),
}

impl From<FitError> for StepError {
    fn from(e: FitError) -> Self {
        StepError::Fit(e)
    }
}

/// 用户画出的分割线: 两个端点加一个独立点下的中心点.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    /// 端点 1.
    pub p1: Pt2d,

    /// 端点 2.
    pub p2: Pt2d,

    /// 角度量取的中心 (第三次点击, 不是线段中点).
    pub center: Pt2d,
}

/// 有向线段.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    /// 起点.
    pub a: Pt2d,

    /// 终点.
    pub b: Pt2d,
}

impl Axis {
    #[inline]
    fn direction(&self) -> Pt2d {
        geom::sub(self.a, self.b)
    }
}

/// 选区外扩后的裁剪框 (原图坐标, 半开区间).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropFrame {
    /// 左边界.
    pub x_min: u32,

    /// 上边界.
    pub y_min: u32,

    /// 右边界 (不含).
    pub x_max: u32,

    /// 下边界 (不含).
    pub y_max: u32,
}

impl CropFrame {
    /// 围绕选区外扩半宽 / 半高的留白, 并收敛到图像范围内.
    pub fn around(region: &Region, (img_h, img_w): crate::Idx2d) -> CropFrame {
        let x_pad = region.width / 2;
        let y_pad = region.height / 2;
        CropFrame {
            x_min: region.x.saturating_sub(x_pad),
            y_min: region.y.saturating_sub(y_pad),
            x_max: (region.x + region.width + x_pad).min(img_w as u32),
            // 底边收敛沿用水平方向的留白量, 与既有测量流程一致.
            y_max: (region.y + region.height + x_pad).min(img_h as u32),
        }
    }

    /// 裁剪框宽度.
    #[inline]
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    /// 裁剪框高度.
    #[inline]
    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }
}

/// 一次完整重算的产物.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CobbReport {
    /// 内侧圆.
    pub medial_circle: Circle,

    /// 外侧圆.
    pub lateral_circle: Circle,

    /// 两圆圆心连线.
    pub center_line: Axis,

    /// 过分割线中心的定长垂线 (Cobb 轴).
    pub perpendicular: Axis,

    /// 当前垂线与初始垂线的夹角 (度). 初始拟合时为 0.
    pub angular_diff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RegionChosen,
    DividerDrawn,
    LandmarksPlaced,
    CirclesFitted,
}

/// 精修会话. 持有当前点位与拟合状态, 同一切片不允许并发会话.
#[derive(Debug, Clone)]
pub struct RefineSession {
    crop: CropFrame,
    points: Vec<Pt2d>,
    stage: Stage,
    divider: Option<Divider>,
    medial_pts: Vec<Pt2d>,
    lateral_pts: Vec<Pt2d>,
    medial_lm: Option<LandmarkSet>,
    lateral_lm: Option<LandmarkSet>,
    original_perp: Option<Axis>,
}

impl RefineSession {
    /// 选定检出区域, 开启会话.
    ///
    /// 轮廓点按 **未外扩** 的选区过滤 (上界含 `x + width`),
    /// 再平移到裁剪坐标系.
    pub fn begin(det: &Detection, choice: usize) -> Result<RefineSession, StepError> {
        let region = det
            .regions
            .get(choice)
            .copied()
            .ok_or(StepError::RegionOutOfRange(choice))?;
        let crop = CropFrame::around(&region, det.display.dim());

        let points = det
            .edge_points
            .iter()
            .copied()
            .filter(|&(px, py)| {
                region.x <= px
                    && px <= region.x + region.width
                    && region.y <= py
                    && py <= region.y + region.height
            })
            .map(|(px, py)| ((px - crop.x_min) as f64, (py - crop.y_min) as f64))
            .collect();

        Ok(RefineSession {
            crop,
            points,
            stage: Stage::RegionChosen,
            divider: None,
            medial_pts: Vec::new(),
            lateral_pts: Vec::new(),
            medial_lm: None,
            lateral_lm: None,
            original_perp: None,
        })
    }

    /// 裁剪框.
    #[inline]
    pub fn crop(&self) -> CropFrame {
        self.crop
    }

    /// 局部坐标系下的轮廓点.
    #[inline]
    pub fn local_points(&self) -> &[Pt2d] {
        &self.points
    }

    /// 当前分割线.
    #[inline]
    pub fn divider(&self) -> Option<Divider> {
        self.divider
    }

    /// 一侧的地标集.
    pub fn landmark_set(&self, side: Side) -> Option<&LandmarkSet> {
        match side {
            Side::Medial => self.medial_lm.as_ref(),
            Side::Lateral => self.lateral_lm.as_ref(),
        }
    }

    /// 画 (或重画) 分割线. 重画会废弃其后的全部状态.
    pub fn draw_divider(&mut self, p1: Pt2d, p2: Pt2d, center: Pt2d) -> Result<(), StepError> {
        if p1 == p2 {
            return Err(StepError::DegenerateDivider);
        }
        self.divider = Some(Divider { p1, p2, center });
        self.medial_pts.clear();
        self.lateral_pts.clear();
        self.medial_lm = None;
        self.lateral_lm = None;
        self.original_perp = None;
        self.stage = Stage::DividerDrawn;
        Ok(())
    }

    /// 按分割线切分点云并选出两侧各 5 个地标.
    pub fn place_landmarks(&mut self) -> Result<(), StepError> {
        if self.stage != Stage::DividerDrawn {
            return Err(StepError::DividerNotDrawn);
        }
        let d = self.divider.ok_or(StepError::DividerNotDrawn)?;

        let (medial, lateral): (Vec<Pt2d>, Vec<Pt2d>) = self
            .points
            .iter()
            .copied()
            .partition(|&pt| geom::cross_side(d.p1, d.p2, pt) > 0.0);
        if medial.len() < 3 {
            return Err(StepError::TooFewSidePoints(Side::Medial, medial.len()));
        }
        if lateral.len() < 3 {
            return Err(StepError::TooFewSidePoints(Side::Lateral, lateral.len()));
        }

        self.medial_lm = Some(
            select_landmarks(&medial, Side::Medial, d.p1, d.p2, d.center)
                .ok_or(StepError::NoLandmark(Side::Medial))?,
        );
        self.lateral_lm = Some(
            select_landmarks(&lateral, Side::Lateral, d.p1, d.p2, d.center)
                .ok_or(StepError::NoLandmark(Side::Lateral))?,
        );
        self.medial_pts = medial;
        self.lateral_pts = lateral;
        self.stage = Stage::LandmarksPlaced;
        Ok(())
    }

    /// 初始拟合: 两侧各自用 **全部** 侧点集拟合圆, 并固定初始垂线.
    pub fn fit_circles(&mut self) -> Result<CobbReport, StepError> {
        if self.stage != Stage::LandmarksPlaced {
            return Err(StepError::LandmarksNotPlaced);
        }
        let d = self.divider.ok_or(StepError::DividerNotDrawn)?;

        let medial = geom::least_squares_circle(&self.medial_pts)?;
        let lateral = geom::least_squares_circle(&self.lateral_pts)?;
        let report = assemble_report(medial, lateral, d.center, None)?;

        self.original_perp = Some(report.perpendicular);
        self.stage = Stage::CirclesFitted;
        Ok(report)
    }

    /// 拖拽一个地标, 原子性地重算双圆与轴线.
    ///
    /// 拖拽后的双圆只由两侧各 5 个地标拟合 (不再使用全量侧点集),
    /// 角度差相对 [`RefineSession::fit_circles`] 固定的初始垂线量取.
    pub fn drag(
        &mut self,
        side: Side,
        landmark: Landmark,
        delta: Pt2d,
    ) -> Result<CobbReport, StepError> {
        if self.stage != Stage::CirclesFitted {
            return Err(StepError::CirclesNotFitted);
        }
        let d = self.divider.ok_or(StepError::DividerNotDrawn)?;

        {
            let set = match side {
                Side::Medial => self.medial_lm.as_mut(),
                Side::Lateral => self.lateral_lm.as_mut(),
            }
            .ok_or(StepError::LandmarksNotPlaced)?;
            let pt = &mut set.points[landmark.index()];
            *pt = (pt.0 + delta.0, pt.1 + delta.1);
        }

        let medial_lm = self.medial_lm.as_ref().ok_or(StepError::LandmarksNotPlaced)?;
        let lateral_lm = self.lateral_lm.as_ref().ok_or(StepError::LandmarksNotPlaced)?;
        let medial = medial_lm.fit_circle()?;
        let lateral = lateral_lm.fit_circle()?;
        assemble_report(medial, lateral, d.center, self.original_perp.as_ref())
    }
}

/// 由双圆组装完整报告: 圆心连线、过中心的定长垂线与角度差.
fn assemble_report(
    medial: Circle,
    lateral: Circle,
    center: Pt2d,
    original_perp: Option<&Axis>,
) -> Result<CobbReport, StepError> {
    let d = geom::sub(medial.center(), lateral.center());
    if geom::norm(d) == 0.0 {
        return Err(StepError::CoincidentCenters);
    }
    let n = geom::normalize(geom::perp(d));
    let half = consts::AXIS_HALF_LEN;
    let perpendicular = Axis {
        a: (center.0 - half * n.0, center.1 - half * n.1),
        b: (center.0 + half * n.0, center.1 + half * n.1),
    };
    let angular_diff = match original_perp {
        Some(og) => geom::angle_between(og.direction(), perpendicular.direction()),
        None => 0.0,
    };
    Ok(CobbReport {
        medial_circle: medial,
        lateral_circle: lateral,
        center_line: Axis {
            a: (lateral.cx, lateral.cy),
            b: (medial.cx, medial.cy),
        },
        perpendicular,
        angular_diff,
    })
}
