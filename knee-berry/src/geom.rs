//! 纯几何计算: 最小二乘圆拟合与角度计算.

use crate::Pt2d;
use ndarray::{Array1, Array2};
use ndarray_linalg::Inverse;

/// 拟合或角度计算的运行时错误.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// 拟合点不足.
    ///
    /// 第一个参数代表目前已有的点, 第二个参数代表实际拟合需要的最少点数.
    TooFewPoints(u32, u32),

    /// 点集退化 (共线或重合), 法方程矩阵不可逆.
    Singular,
}

/// 拟合结果类型.
pub type FitResult<T> = Result<T, FitError>;

/// 平面圆 `(圆心, 半径)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle {
    /// 圆心横坐标.
    pub cx: f64,

    /// 圆心纵坐标.
    pub cy: f64,

    /// 半径. 构造保证非负.
    pub radius: f64,
}

impl Circle {
    /// 圆心.
    #[inline]
    pub fn center(&self) -> Pt2d {
        (self.cx, self.cy)
    }
}

/// 圆拟合最少需要的点数.
pub const MIN_FIT_POINTS: u32 = 3;

/// 以代数最小二乘法拟合圆 `x² + y² + Bx + Cy + D = 0`.
///
/// 构造设计矩阵 `[x²+y², x, y]` 与全 1 目标向量, 解法方程
/// `(JᵀJ)⁻¹ Jᵀk` 得系数 `(A, B, C)`, 再换算圆心与半径.
/// 半径若因数值符号为负会被取反 (仅符号修正, 非几何修正).
///
/// 至少需要 3 个点; 实际用于轴向拟合时建议不少于 30 个点以保证数值稳定.
/// 点集共线或重合时返回 [`FitError::Singular`].
pub fn least_squares_circle(points: &[Pt2d]) -> FitResult<Circle> {
    if (points.len() as u32) < MIN_FIT_POINTS {
        return Err(FitError::TooFewPoints(points.len() as u32, MIN_FIT_POINTS));
    }

    let j = Array2::from_shape_fn((points.len(), 3), |(i, col)| {
        let (x, y) = points[i];
        match col {
            0 => x * x + y * y,
            1 => x,
            _ => y,
        }
    });
    let k = Array1::<f64>::ones(points.len());

    let jt = j.t();
    let jtj = jt.dot(&j);
    let inv = jtj.inv().map_err(|_| FitError::Singular)?;
    let abc = inv.dot(&jt.dot(&k));

    let (a, b, c) = (abc[0], abc[1], abc[2]);
    if a == 0.0 || !a.is_finite() {
        return Err(FitError::Singular);
    }

    let cx = -b / (2.0 * a);
    let cy = -c / (2.0 * a);
    let mut radius = (4.0 * a + b * b + c * c).sqrt() / (2.0 * a);
    if radius < 0.0 {
        radius = -radius;
    }
    if !radius.is_finite() {
        return Err(FitError::Singular);
    }

    Ok(Circle { cx, cy, radius })
}

/// 两向量夹角 (度). 余弦值先收敛到 `[-1, 1]` 再取反余弦,
/// 避免浮点越界导致 NaN.
///
/// 任一向量为零向量时返回 0.
pub fn angle_between(v1: Pt2d, v2: Pt2d) -> f64 {
    let (m1, m2) = (norm(v1), norm(v2));
    if m1 == 0.0 || m2 == 0.0 {
        return 0.0;
    }
    let cos_theta = (dot(v1, v2) / (m1 * m2)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

/// 向量差 `a - b`.
#[inline]
pub fn sub(a: Pt2d, b: Pt2d) -> Pt2d {
    (a.0 - b.0, a.1 - b.1)
}

/// 点积.
#[inline]
pub fn dot(a: Pt2d, b: Pt2d) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

/// 向量模长.
#[inline]
pub fn norm(v: Pt2d) -> f64 {
    dot(v, v).sqrt()
}

/// 单位化. 零向量原样返回.
#[inline]
pub fn normalize(v: Pt2d) -> Pt2d {
    let m = norm(v);
    if m == 0.0 {
        v
    } else {
        (v.0 / m, v.1 / m)
    }
}

/// 逆时针旋转 90 度的垂直向量 `(-y, x)`.
#[inline]
pub fn perp(v: Pt2d) -> Pt2d {
    (-v.1, v.0)
}

/// 二维叉积 `(p2 - p1) × (p - p1)`.
///
/// 符号决定 `p` 在有向直线 `p1 -> p2` 的哪一侧.
#[inline]
pub fn cross_side(p1: Pt2d, p2: Pt2d, p: Pt2d) -> f64 {
    (p2.0 - p1.0) * (p.1 - p1.1) - (p2.1 - p1.1) * (p.0 - p1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn circle_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<Pt2d> {
        (0..n)
            .map(|i| {
                let t = TAU * i as f64 / n as f64;
                (cx + r * t.cos(), cy + r * t.sin())
            })
            .collect()
    }

    #[test]
    fn test_circle_fit_exact() {
        for &(cx, cy, r, n) in &[
            (0.0, 0.0, 1.0, 3),
            (10.0, -4.0, 7.5, 8),
            (123.4, 56.7, 31.0, 30),
            (-2.0, 3.0, 0.5, 100),
        ] {
            let c = least_squares_circle(&circle_points(cx, cy, r, n)).unwrap();
            assert!(float_eq(c.cx, cx), "cx: {} vs {}", c.cx, cx);
            assert!(float_eq(c.cy, cy), "cy: {} vs {}", c.cy, cy);
            assert!(float_eq(c.radius, r), "r: {} vs {}", c.radius, r);
        }
    }

    #[test]
    fn test_circle_fit_radius_non_negative() {
        // 噪声点集也不允许出现负半径.
        let pts: Vec<Pt2d> = (0..40)
            .map(|i| {
                let t = TAU * i as f64 / 40.0;
                let wobble = 1.0 + 0.2 * ((i % 7) as f64 - 3.0) / 3.0;
                (5.0 + 20.0 * wobble * t.cos(), -3.0 + 20.0 * wobble * t.sin())
            })
            .collect();
        let c = least_squares_circle(&pts).unwrap();
        assert!(c.radius >= 0.0);
    }

    #[test]
    fn test_circle_fit_preconditions() {
        assert_eq!(
            least_squares_circle(&[(0.0, 0.0), (1.0, 1.0)]),
            Err(FitError::TooFewPoints(2, 3)),
        );

        // 共线点集: 法方程奇异.
        let collinear: Vec<Pt2d> = (0..10).map(|i| (i as f64, 2.0 * i as f64)).collect();
        assert_eq!(least_squares_circle(&collinear), Err(FitError::Singular));
    }

    #[test]
    fn test_angle_between_generic() {
        assert!(float_eq(angle_between((1.0, 0.0), (0.0, 1.0)), 90.0));
        assert!(float_eq(angle_between((1.0, 0.0), (1.0, 0.0)), 0.0));
        assert!(float_eq(angle_between((1.0, 0.0), (-1.0, 0.0)), 180.0));
        assert!(float_eq(angle_between((2.0, 0.0), (3.0, 3.0)), 45.0));
    }

    #[test]
    fn test_angle_between_clamp() {
        // 平行向量因浮点误差可能使余弦略超 1, 不允许产生 NaN.
        let v = (0.1 + 0.2, 0.3);
        let w = (0.3, 0.1 + 0.2);
        assert!(angle_between(v, w).is_finite());
        assert!(float_eq(angle_between((0.0, 0.0), (1.0, 0.0)), 0.0));
    }

    #[test]
    fn test_vector_helpers() {
        assert_eq!(sub((3.0, 4.0), (1.0, 1.0)), (2.0, 3.0));
        assert_eq!(perp((1.0, 0.0)), (0.0, 1.0));
        assert!(float_eq(norm((3.0, 4.0)), 5.0));
        let u = normalize((10.0, 0.0));
        assert!(float_eq(u.0, 1.0) && float_eq(u.1, 0.0));

        // 在有向直线上方为正, 下方为负.
        assert!(cross_side((0.0, 0.0), (1.0, 0.0), (0.5, 1.0)) > 0.0);
        assert!(cross_side((0.0, 0.0), (1.0, 0.0), (0.5, -1.0)) < 0.0);
    }
}
