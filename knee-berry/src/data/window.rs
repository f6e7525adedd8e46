//! CT 窗口与展示图像.

use crate::config::ConfigError;
use crate::consts;
use ndarray::{Array2, Array3};
use std::path::Path;

/// CT 窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 构建 CT 窗.
    ///
    /// `level` 和 `width` 必须在合理范围内, 否则返回
    /// [`ConfigError::WindowOutOfRange`].
    pub fn new(level: f32, width: f32) -> Result<CtWindow, ConfigError> {
        if (-1e5..=1e5).contains(&level) && 0.0 < width && width <= 1e5 {
            Ok(Self { level, width })
        } else {
            Err(ConfigError::WindowOutOfRange)
        }
    }

    /// 构建一个便于展示膝关节骨结构的 CT 窗口. 该窗口的窗位为
    /// 300, 窗宽为 1500.
    #[inline]
    pub const fn from_bone_visual() -> CtWindow {
        Self {
            level: consts::BONE_WINDOW_LEVEL,
            width: consts::BONE_WINDOW_WIDTH,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前 CT 窗设置下, `ct` HU 值对应的归一化分布点 (0.0 <= value <= 1.0).
    ///
    /// 公式为 `(ct - level + width / 2) / width`, 越界处截断.
    /// 如果 `ct` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_unit(&self, ct: f32) -> Option<f32> {
        if !ct.is_finite() {
            return None;
        }
        Some(((ct - self.level + 0.5 * self.width) / self.width).clamp(0.0, 1.0))
    }

    /// 把整张 HU 切片归一化到 `[0, 1]`. 非有限输入按 0 处理.
    pub fn normalize(&self, hu: &Array2<f32>) -> Array2<f32> {
        hu.mapv(|v| self.eval_unit(v).unwrap_or(0.0))
    }

    /// 把整张 HU 切片映射为 8-bit 灰度展示矩阵.
    ///
    /// 先做窗口归一化, 再按矩阵实际最小/最大值线性拉伸到 0..=255,
    /// 保证展示图充满整个灰度动态范围. 全图同值时输出全 0.
    pub fn display_gray(&self, hu: &Array2<f32>) -> Array2<u8> {
        let unit = self.normalize(hu);
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for &v in unit.iter() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if !(hi > lo) {
            return Array2::zeros(unit.dim());
        }
        unit.mapv(|v| ((v - lo) / (hi - lo) * 255.0) as u8)
    }
}

/// 3 通道 8-bit 展示图像, 维度次序为 (高, 宽, 通道).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    data: Array3<u8>,
}

impl DisplayImage {
    /// 由灰度矩阵复制出 3 通道展示图.
    pub fn from_gray(gray: &Array2<u8>) -> DisplayImage {
        let (h, w) = gray.dim();
        let data = Array3::from_shape_fn((h, w, 3), |(r, c, _)| gray[[r, c]]);
        Self { data }
    }

    /// 直接接管一个 (高, 宽, 3) 的像素立方体.
    ///
    /// # Panics
    ///
    /// 通道数不为 3 时 panic.
    pub fn from_rgb(data: Array3<u8>) -> DisplayImage {
        assert_eq!(data.dim().2, 3, "展示图必须是 3 通道");
        Self { data }
    }

    /// 像素立方体视图.
    #[inline]
    pub fn rgb(&self) -> &Array3<u8> {
        &self.data
    }

    /// 可变像素立方体视图.
    #[inline]
    pub fn rgb_mut(&mut self) -> &mut Array3<u8> {
        &mut self.data
    }

    /// 图像尺寸 (高, 宽).
    #[inline]
    pub fn dim(&self) -> crate::Idx2d {
        let (h, w, _) = self.data.dim();
        (h, w)
    }

    /// 取通道 0 作为灰度矩阵.
    pub fn gray(&self) -> Array2<u8> {
        let (h, w) = self.dim();
        Array2::from_shape_fn((h, w), |(r, c)| self.data[[r, c, 0]])
    }

    /// 保存为常见图像格式 (由扩展名决定).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let (h, w) = self.dim();
        let mut img = image::RgbImage::new(w as u32, h as u32);
        for (r, row) in self.data.outer_iter().enumerate() {
            for (c, px) in row.outer_iter().enumerate() {
                img.put_pixel(c as u32, r as u32, image::Rgb([px[0], px[1], px[2]]));
            }
        }
        img.save(path)
    }
}

/// 把 HU 切片按给定窗口渲染为 3 通道展示图像.
pub fn windowed_display(hu: &Array2<f32>, window: &CtWindow) -> DisplayImage {
    DisplayImage::from_gray(&window.display_gray(hu))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_ct_window_invalid_input() {
        assert!(CtWindow::new(0.0, -1.0).is_err());
        assert!(CtWindow::new(0.0, 0.0).is_err());
        assert!(CtWindow::new(2e5, 100.0).is_err());
        assert!(CtWindow::new(300.0, 1500.0).is_ok());
    }

    #[test]
    fn test_ct_window_unit_eval() {
        // [-450, 1050]
        let ct = CtWindow::from_bone_visual();
        assert_eq!(ct.eval_unit(f32::NAN), None);
        assert!(float_eq(ct.eval_unit(-450.0).unwrap(), 0.0));
        assert!(float_eq(ct.eval_unit(-10_000.0).unwrap(), 0.0));
        assert!(float_eq(ct.eval_unit(1050.0).unwrap(), 1.0));
        assert!(float_eq(ct.eval_unit(10_000.0).unwrap(), 1.0));
        assert!(float_eq(ct.eval_unit(300.0).unwrap(), 0.5));

        // 窗内严格单调.
        let a = ct.eval_unit(0.0).unwrap();
        let b = ct.eval_unit(100.0).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_display_gray_full_range() {
        let ct = CtWindow::new(80.0, 40.0).unwrap();
        let hu = array![[60.0f32, 70.0], [80.0, 100.0]];
        let g = ct.display_gray(&hu);
        // 实际最小/最大值拉伸后必然覆盖 0 与 255.
        assert_eq!(g.iter().copied().min(), Some(0));
        assert_eq!(g.iter().copied().max(), Some(255));

        // 全图同值: 全 0.
        let flat = Array2::<f32>::from_elem((3, 3), 42.0);
        assert!(ct.display_gray(&flat).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_display_image_round_trip() {
        let gray = array![[0u8, 128], [255, 7]];
        let img = DisplayImage::from_gray(&gray);
        assert_eq!(img.dim(), (2, 2));
        assert_eq!(img.gray(), gray);
        assert_eq!(img.rgb()[[1, 0, 2]], 255);
    }
}
