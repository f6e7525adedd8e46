//! 灰度 SLIC 超像素分割与边界叠加.
//!
//! 叠加图只是检测流程的展示副产品, 不参与任何判定.

use crate::DisplayImage;
use itertools::izip;
use ndarray::Array2;

const SLIC_ITERATIONS: usize = 10;

#[derive(Clone, Copy)]
struct Cluster {
    intensity: f64,
    r: f64,
    c: f64,
}

/// 灰度图 SLIC 超像素分割.
///
/// 经典 SLIC 的灰度特化: 以 `sqrt(N / k)` 为网格间距播种,
/// 在每个聚类中心附近 2S 窗口内按 "灰度差 + 紧致度加权空间距"
/// 迭代分配, 共 10 轮. 返回与输入同形状的标签矩阵.
pub fn slic(gray: &Array2<u8>, segments: u32, compactness: f64) -> Array2<u32> {
    let (h, w) = gray.dim();
    let n = (h * w) as f64;
    let step = (n / segments as f64).sqrt().max(1.0);

    // 网格播种.
    let mut clusters = Vec::new();
    let mut r = step / 2.0;
    while (r as usize) < h {
        let mut c = step / 2.0;
        while (c as usize) < w {
            clusters.push(Cluster {
                intensity: gray[[r as usize, c as usize]] as f64,
                r,
                c,
            });
            c += step;
        }
        r += step;
    }
    if clusters.is_empty() {
        return Array2::zeros((h, w));
    }

    let mut labels = Array2::<u32>::zeros((h, w));
    let mut dists = Array2::<f64>::from_elem((h, w), f64::INFINITY);
    let window = (2.0 * step).ceil() as isize;

    for _ in 0..SLIC_ITERATIONS {
        dists.fill(f64::INFINITY);
        for (k, cl) in clusters.iter().enumerate() {
            let (cr, cc) = (cl.r as isize, cl.c as isize);
            let r0 = (cr - window).max(0) as usize;
            let r1 = ((cr + window) as usize + 1).min(h);
            let c0 = (cc - window).max(0) as usize;
            let c1 = ((cc + window) as usize + 1).min(w);
            for pr in r0..r1 {
                for pc in c0..c1 {
                    let di = gray[[pr, pc]] as f64 - cl.intensity;
                    let ds = ((pr as f64 - cl.r).powi(2) + (pc as f64 - cl.c).powi(2)).sqrt();
                    let d = (di * di + (ds / step).powi(2) * compactness * compactness).sqrt();
                    if d < dists[[pr, pc]] {
                        dists[[pr, pc]] = d;
                        labels[[pr, pc]] = k as u32;
                    }
                }
            }
        }

        // 重估聚类中心.
        let mut acc = vec![(0.0f64, 0.0f64, 0.0f64, 0usize); clusters.len()];
        for ((pr, pc), &k) in labels.indexed_iter() {
            let a = &mut acc[k as usize];
            a.0 += gray[[pr, pc]] as f64;
            a.1 += pr as f64;
            a.2 += pc as f64;
            a.3 += 1;
        }
        for (cl, &(si, sr, sc, cnt)) in izip!(clusters.iter_mut(), acc.iter()) {
            if cnt > 0 {
                cl.intensity = si / cnt as f64;
                cl.r = sr / cnt as f64;
                cl.c = sc / cnt as f64;
            }
        }
    }
    labels
}

/// 在展示图上以黄色描出超像素边界.
pub fn mark_boundaries(base: &DisplayImage, labels: &Array2<u32>) -> DisplayImage {
    let mut out = base.clone();
    let (h, w) = labels.dim();
    for r in 0..h {
        for c in 0..w {
            let here = labels[[r, c]];
            let edge = (c + 1 < w && labels[[r, c + 1]] != here)
                || (r + 1 < h && labels[[r + 1, c]] != here);
            if edge {
                let px = out.rgb_mut();
                px[[r, c, 0]] = 255;
                px[[r, c, 1]] = 255;
                px[[r, c, 2]] = 0;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slic_label_shape_and_range() {
        let gray = Array2::from_shape_fn((40, 60), |(r, c)| ((r * 4 + c) % 256) as u8);
        let labels = slic(&gray, 12, 10.0);
        assert_eq!(labels.dim(), (40, 60));
        let max = labels.iter().copied().max().unwrap();
        assert!(max >= 1, "应当产生多个超像素");
    }

    #[test]
    fn test_slic_two_tone_split() {
        // 左右两块灰度差异巨大, 中缝附近必然出现标签分界.
        let gray = Array2::from_shape_fn((30, 30), |(_, c)| if c < 15 { 10u8 } else { 240 });
        let labels = slic(&gray, 4, 10.0);
        let any_split = (0..30).any(|r| labels[[r, 14]] != labels[[r, 15]]);
        assert!(any_split);
    }

    #[test]
    fn test_mark_boundaries_paints_yellow() {
        let gray = Array2::<u8>::zeros((4, 4));
        let base = DisplayImage::from_gray(&gray);
        let labels = Array2::from_shape_fn((4, 4), |(_, c)| if c < 2 { 0u32 } else { 1 });
        let marked = mark_boundaries(&base, &labels);
        assert_eq!(marked.rgb()[[0, 1, 0]], 255);
        assert_eq!(marked.rgb()[[0, 1, 1]], 255);
        assert_eq!(marked.rgb()[[0, 1, 2]], 0);
        assert_eq!(marked.rgb()[[0, 3, 0]], 0);
    }
}
