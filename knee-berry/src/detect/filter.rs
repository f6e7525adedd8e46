//! 卷积类图像算子.
//!
//! 所有算子都以 reflect-101 方式处理边界 (镜像时不重复边缘像素),
//! 与常见图像处理库的默认行为一致.

use ndarray::Array2;

/// reflect-101 边界索引映射.
///
/// 长度为 1 的维度没有可反射的邻居, 一律收敛到 0.
#[inline]
fn mirror(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let mut i = idx;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - 2 - i;
    }
    i as usize
}

#[inline]
fn at(img: &Array2<f32>, r: isize, c: isize) -> f32 {
    let (h, w) = img.dim();
    img[[mirror(r, h), mirror(c, w)]]
}

/// 3x3 高斯平滑, 可分离核 `[1, 2, 1] / 4`.
pub fn gaussian_blur3(img: &Array2<f32>) -> Array2<f32> {
    let (h, w) = img.dim();

    // 水平遍.
    let mut tmp = Array2::<f32>::zeros((h, w));
    for r in 0..h as isize {
        for c in 0..w as isize {
            let v = at(img, r, c - 1) + 2.0 * at(img, r, c) + at(img, r, c + 1);
            tmp[[r as usize, c as usize]] = v / 4.0;
        }
    }

    // 垂直遍.
    let mut out = Array2::<f32>::zeros((h, w));
    for r in 0..h as isize {
        for c in 0..w as isize {
            let v = at(&tmp, r - 1, c) + 2.0 * at(&tmp, r, c) + at(&tmp, r + 1, c);
            out[[r as usize, c as usize]] = v / 4.0;
        }
    }
    out
}

/// 拉普拉斯算子, 十字核 `[[0, 1, 0], [1, -4, 1], [0, 1, 0]]`.
pub fn laplacian(img: &Array2<f32>) -> Array2<f32> {
    let (h, w) = img.dim();
    let mut out = Array2::<f32>::zeros((h, w));
    for r in 0..h as isize {
        for c in 0..w as isize {
            let v = at(img, r - 1, c) + at(img, r + 1, c) + at(img, r, c - 1)
                + at(img, r, c + 1)
                - 4.0 * at(img, r, c);
            out[[r as usize, c as usize]] = v;
        }
    }
    out
}

/// 锐化: 平滑图与其拉普拉斯响应相加, 截断到 `[0, 255]`.
///
/// 仅作为叠加展示图的底图, 不参与二值化.
pub fn sharpen(blurred: &Array2<f32>, lap: &Array2<f32>) -> Array2<u8> {
    let mut out = Array2::<u8>::zeros(blurred.dim());
    ndarray::Zip::from(&mut out)
        .and(blurred)
        .and(lap)
        .for_each(|o, &b, &l| {
            *o = (b + l).clamp(0.0, 255.0) as u8;
        });
    out
}

/// 二值化: 严格大于阈值者置 255, 其余置 0.
pub fn threshold_binary(img: &Array2<f32>, cutoff: f64) -> Array2<u8> {
    img.mapv(|v| if (v as f64) > cutoff { 255u8 } else { 0 })
}

/// Sobel 梯度幅值, 3x3 核, 结果饱和截断到 8-bit.
///
/// 二值输入 (0 / 255) 的非零梯度幅值不会小于 255, 饱和截断不会把
/// 真实边缘像素映射为 0.
pub fn sobel_magnitude(img: &Array2<u8>) -> Array2<u8> {
    let f = img.mapv(|v| v as f32);
    let (h, w) = f.dim();
    let mut out = Array2::<u8>::zeros((h, w));
    for r in 0..h as isize {
        for c in 0..w as isize {
            let gx = at(&f, r - 1, c + 1) + 2.0 * at(&f, r, c + 1) + at(&f, r + 1, c + 1)
                - at(&f, r - 1, c - 1)
                - 2.0 * at(&f, r, c - 1)
                - at(&f, r + 1, c - 1);
            let gy = at(&f, r + 1, c - 1) + 2.0 * at(&f, r + 1, c) + at(&f, r + 1, c + 1)
                - at(&f, r - 1, c - 1)
                - 2.0 * at(&f, r - 1, c)
                - at(&f, r - 1, c + 1);
            out[[r as usize, c as usize]] = (gx * gx + gy * gy).sqrt().min(255.0) as u8;
        }
    }
    out
}

/// 最近邻缩放到目标尺寸 (高, 宽).
pub fn resize_nearest(img: &Array2<u8>, (th, tw): crate::Idx2d) -> Array2<u8> {
    let (h, w) = img.dim();
    if (h, w) == (th, tw) {
        return img.clone();
    }
    Array2::from_shape_fn((th, tw), |(r, c)| {
        let sr = (r * h / th).min(h - 1);
        let sc = (c * w / tw).min(w - 1);
        img[[sr, sc]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mirror_reflect_101() {
        assert_eq!(mirror(-1, 5), 1);
        assert_eq!(mirror(0, 5), 0);
        assert_eq!(mirror(4, 5), 4);
        assert_eq!(mirror(5, 5), 3);

        // 单像素维度: 越界索引收敛到 0 而不是回绕.
        assert_eq!(mirror(-1, 1), 0);
        assert_eq!(mirror(0, 1), 0);
        assert_eq!(mirror(1, 1), 0);
    }

    #[test]
    fn test_filters_on_one_row_image() {
        let img = Array2::from_shape_fn((1, 8), |(_, c)| if c < 4 { 0.0f32 } else { 1000.0 });
        let blurred = gaussian_blur3(&img);
        assert_eq!(blurred.dim(), (1, 8));
        // 垂直遍在单行上退化为恒等.
        assert_eq!(blurred[[0, 0]], 0.0);
        assert_eq!(blurred[[0, 7]], 1000.0);
        assert!(laplacian(&blurred).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_gaussian_blur_constant_invariant() {
        // 常值图像是高斯平滑的不动点.
        let img = Array2::<f32>::from_elem((6, 7), 42.0);
        let out = gaussian_blur3(&img);
        assert!(out.iter().all(|&v| (v - 42.0).abs() < 1e-4));
    }

    #[test]
    fn test_gaussian_blur_impulse() {
        let mut img = Array2::<f32>::zeros((5, 5));
        img[[2, 2]] = 16.0;
        let out = gaussian_blur3(&img);
        assert_eq!(out[[2, 2]], 4.0);
        assert_eq!(out[[2, 1]], 2.0);
        assert_eq!(out[[1, 1]], 1.0);
        assert_eq!(out[[0, 0]], 0.0);
    }

    #[test]
    fn test_laplacian_flat_zero() {
        let img = Array2::<f32>::from_elem((4, 4), 9.0);
        assert!(laplacian(&img).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_threshold_strict() {
        let img = array![[124.0f32, 125.0], [125.1, 200.0]];
        let bin = threshold_binary(&img, 125.0);
        assert_eq!(bin, array![[0u8, 0], [255, 255]]);
    }

    #[test]
    fn test_sobel_on_step_edge() {
        // 垂直阶跃: 边缘两侧产生非零梯度, 远处为零.
        let img = Array2::from_shape_fn((5, 6), |(_, c)| if c < 3 { 0u8 } else { 255 });
        let g = sobel_magnitude(&img);
        assert!(g[[2, 2]] > 0);
        assert!(g[[2, 3]] > 0);
        assert_eq!(g[[2, 0]], 0);
        assert_eq!(g[[2, 5]], 0);
    }

    #[test]
    fn test_resize_nearest() {
        let img = array![[1u8, 2], [3, 4]];
        assert_eq!(resize_nearest(&img, (2, 2)), img);
        let up = resize_nearest(&img, (4, 4));
        assert_eq!(up[[0, 0]], 1);
        assert_eq!(up[[0, 3]], 2);
        assert_eq!(up[[3, 0]], 3);
        assert_eq!(up[[3, 3]], 4);
    }
}
