//! 一维信号的局部极大值搜索.
//!
//! 语义对齐常见信号处理库的 find-peaks 约定: 平台峰取中点,
//! 依次应用峰高区间、相邻落差区间与最小峰间距过滤.

use crate::config::PeakParams;

/// 找出所有局部极大值 (平台峰取平台中点), 不做任何过滤.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let mut i = 1;
    while i < n - 1 {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                // 平台峰: [i, ahead - 1] 的中点.
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// 最小峰间距过滤: 按峰高从高到低保留, 清除已保留峰两侧
/// 水平距离严格小于 `distance` 的其余峰.
fn select_by_distance(peaks: &[usize], signal: &[f64], distance: usize) -> Vec<bool> {
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        signal[peaks[a]]
            .partial_cmp(&signal[peaks[b]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 {
            k -= 1;
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    keep
}

/// 带过滤的局部极大值搜索.
///
/// 过滤次序: 峰高区间 -> 相邻落差区间 -> 最小峰间距.
/// 返回的峰索引按升序排列.
pub fn find_peaks(signal: &[f64], params: &PeakParams) -> Vec<usize> {
    let mut peaks: Vec<usize> = local_maxima(signal)
        .into_iter()
        .filter(|&p| {
            let v = signal[p];
            params.height.0 <= v && v <= params.height.1
        })
        .filter(|&p| {
            let left = signal[p] - signal[p - 1];
            let right = signal[p] - signal[p + 1];
            left.min(right) >= params.threshold.0 && left.max(right) <= params.threshold.1
        })
        .collect();

    let keep = select_by_distance(&peaks, signal, params.distance);
    let mut i = 0;
    peaks.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
    peaks
}
