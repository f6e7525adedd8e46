//! 连通域与外轮廓提取.

use crate::{Idx2d, Region};
use ndarray::Array2;
use std::collections::VecDeque;

const NEIGHBOURS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const NEIGHBOURS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// 对非零掩膜做 8 连通域划分, 返回每个连通域的像素集合.
///
/// 返回次序按各连通域的首个被访问像素的行优先次序排列.
pub fn components(mask: &Array2<u8>) -> Vec<Vec<Idx2d>> {
    let (h, w) = mask.dim();
    let mut visited = Array2::<bool>::from_elem((h, w), false);
    let mut out = Vec::new();

    for sr in 0..h {
        for sc in 0..w {
            if mask[[sr, sc]] == 0 || visited[[sr, sc]] {
                continue;
            }
            let mut comp = Vec::new();
            let mut queue = VecDeque::new();
            visited[[sr, sc]] = true;
            queue.push_back((sr, sc));
            while let Some((r, c)) = queue.pop_front() {
                comp.push((r, c));
                for &(dr, dc) in NEIGHBOURS_8.iter() {
                    let (nr, nc) = (r as isize + dr, c as isize + dc);
                    if nr < 0 || nc < 0 || nr >= h as isize || nc >= w as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if mask[[nr, nc]] != 0 && !visited[[nr, nc]] {
                        visited[[nr, nc]] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }
            out.push(comp);
        }
    }
    out
}

/// 取连通域的外边界像素: 存在背景 (或越界) 4 邻居的前景像素.
pub fn boundary_of(comp: &[Idx2d], mask: &Array2<u8>) -> Vec<Idx2d> {
    let (h, w) = mask.dim();
    comp.iter()
        .copied()
        .filter(|&(r, c)| {
            NEIGHBOURS_4.iter().any(|&(dr, dc)| {
                let (nr, nc) = (r as isize + dr, c as isize + dc);
                nr < 0
                    || nc < 0
                    || nr >= h as isize
                    || nc >= w as isize
                    || mask[[nr as usize, nc as usize]] == 0
            })
        })
        .collect()
}

/// 连通域的轴对齐包围盒.
///
/// # Panics
///
/// 连通域为空时 panic (连通域划分保证非空).
pub fn bounding_rect(comp: &[Idx2d]) -> Region {
    debug_assert!(!comp.is_empty());
    let (mut rmin, mut rmax, mut cmin, mut cmax) = (usize::MAX, 0usize, usize::MAX, 0usize);
    for &(r, c) in comp {
        rmin = rmin.min(r);
        rmax = rmax.max(r);
        cmin = cmin.min(c);
        cmax = cmax.max(c);
    }
    Region {
        x: cmin as u32,
        y: rmin as u32,
        width: (cmax - cmin + 1) as u32,
        height: (rmax - rmin + 1) as u32,
    }
}
