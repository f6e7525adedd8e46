//! 地标点选取.
//!
//! 在分割线两侧的轮廓点云里, 各选出 5 个地标:
//! 底锚点 (沿分割线投影最远), 顶锚点 (相对分割线约 30 度),
//! 以及从顶锚点经中心量起的中角 / 60% / 90% 目标角位置各一点.

use crate::consts;
use crate::geom::{self, Circle, FitError};
use crate::Pt2d;

/// 分割线的一侧.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// 叉积为正的一侧 (内侧).
    Medial,

    /// 叉积非正的一侧 (外侧).
    Lateral,
}

/// 一侧的 5 个地标点, 次序固定.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet {
    /// [底锚点, 顶锚点, 中角点, 60% 点, 90% 点].
    pub points: [Pt2d; 5],
}

/// 地标在 [`LandmarkSet`] 中的位置.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    /// 底锚点.
    Bottom,
    /// 顶锚点.
    Top,
    /// 中角点.
    Mid,
    /// 60% 目标角点.
    First,
    /// 90% 目标角点.
    Last,
}

impl Landmark {
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Landmark::Bottom => 0,
            Landmark::Top => 1,
            Landmark::Mid => 2,
            Landmark::First => 3,
            Landmark::Last => 4,
        }
    }
}

impl LandmarkSet {
    /// 由 5 个地标拟合圆.
    pub fn fit_circle(&self) -> Result<Circle, FitError> {
        geom::least_squares_circle(&self.points)
    }
}

/// 目标角减实际角的非负差值. 实际角超过目标时不构成候选.
///
/// 内侧点位选取使用该方向.
#[inline]
pub fn deficit_within(target: f64, theta: f64) -> Option<f64> {
    let d = target - theta;
    (d >= 0.0).then_some(d)
}

/// 实际角减目标角的非负差值. 实际角不足目标时不构成候选.
///
/// 外侧点位选取使用该方向.
#[inline]
pub fn excess_within(target: f64, theta: f64) -> Option<f64> {
    let d = theta - target;
    (d >= 0.0).then_some(d)
}

/// 顶 / 底锚点.
///
/// 底锚点取沿分割线方向投影绝对值最大的点 (且投影必须为正);
/// 顶锚点取 "中心指向该点" 的向量与分割线方向夹角最接近 30 度的点.
pub fn find_anchors(points: &[Pt2d], p1: Pt2d, p2: Pt2d, center: Pt2d) -> Option<(Pt2d, Pt2d)> {
    let dir = geom::sub(p2, p1);
    let unit = geom::normalize(dir);

    let mut best_top: Option<(f64, Pt2d)> = None;
    let mut best_bot: Option<(f64, Pt2d)> = None;

    for &pt in points {
        let to_center = geom::sub(center, pt);
        if geom::norm(to_center) > 0.0 {
            let theta = geom::angle_between(to_center, dir);
            let score = (theta - consts::TOP_ANCHOR_DEGREES).abs();
            if best_top.map_or(true, |(s, _)| score < s) {
                best_top = Some((score, pt));
            }
        }

        let proj = geom::dot(geom::sub(pt, p1), unit).abs();
        if best_bot.map_or(proj > 0.0, |(s, _)| proj > s) {
            best_bot = Some((proj, pt));
        }
    }
    Some((best_bot?.1, best_top?.1))
}

/// 在一侧点云中选出全部 5 个地标.
///
/// 任一点位无候选时返回 `None` (点云过小或几何退化).
pub fn select_landmarks(
    points: &[Pt2d],
    side: Side,
    p1: Pt2d,
    p2: Pt2d,
    center: Pt2d,
) -> Option<LandmarkSet> {
    let (bot, top) = find_anchors(points, p1, p2, center)?;

    let vec_top = geom::sub(top, center);
    let vec_bot = geom::sub(bot, center);
    if geom::norm(vec_top) == 0.0 || geom::norm(vec_bot) == 0.0 {
        return None;
    }
    let goal = geom::angle_between(vec_top, vec_bot);
    let goal_mid = (goal / 2.0).floor();
    let goal_first = goal * consts::LANDMARK_FIRST_RATIO;
    let goal_last = goal * consts::LANDMARK_LAST_RATIO;

    let mut best_mid: Option<(f64, Pt2d)> = None;
    let mut best_first: Option<(f64, Pt2d)> = None;
    let mut best_last: Option<(f64, Pt2d)> = None;

    for &pt in points {
        let v = geom::sub(pt, center);
        if geom::norm(v) == 0.0 {
            continue;
        }
        let theta = geom::angle_between(v, vec_top);

        let mid_score = (theta - goal_mid).abs();
        if best_mid.map_or(true, |(s, _)| mid_score < s) {
            best_mid = Some((mid_score, pt));
        }

        match side {
            Side::Medial => {
                if let Some(d) = deficit_within(goal_first, theta) {
                    if best_first.map_or(true, |(s, _)| d < s) {
                        best_first = Some((d, pt));
                    }
                }
                if let Some(d) = deficit_within(goal_last, theta) {
                    if best_last.map_or(true, |(s, _)| d < s) {
                        best_last = Some((d, pt));
                    }
                }
            }
            Side::Lateral => {
                if let Some(d) = excess_within(goal_first, theta) {
                    if best_first.map_or(true, |(s, _)| d < s) {
                        best_first = Some((d, pt));
                    }
                    // 注意: 90% 点位的筛选门限基于 60% 目标角,
                    // 记录值却基于 90% 目标角. 既有测量流程如此.
                    if best_last.map_or(true, |(s, _)| d < s) {
                        best_last = Some((theta - goal_last, pt));
                    }
                }
            }
        }
    }

    Some(LandmarkSet {
        points: [bot, top, best_mid?.1, best_first?.1, best_last?.1],
    })
}
