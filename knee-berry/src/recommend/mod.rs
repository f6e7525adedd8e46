//! 代表性切片推荐引擎.
//!
//! 输入为整个序列逐切片的灰像素统计 (见 [`crate::metrics`]),
//! 输出一张最能代表膝关节间隙形态的切片:
//!
//! 1. 以切片编号的结构性间隙切出候选区间;
//! 2. 在候选区间内搜索灰像素信号的平台段;
//! 3. 对平台段做线性拟合过滤 (近水平且均值落在经验区间);
//! 4. 取合格索引的中点作为推荐.
//!
//! 峰谷检测结果仅作为诊断信息一并返回, 不影响推荐本身.

mod peaks;

pub use peaks::find_peaks;

use crate::config::RecommendConfig;
use crate::metrics::SliceMetricsRecord;

/// 推荐失败的预期原因.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoRecommendation {
    /// 切片编号序列中没有任何结构性间隙.
    NoGap,

    /// 间隙不足两个, 无法切出候选区间.
    InsufficientGaps,

    /// 候选区间内没有通过线性拟合过滤的平台段.
    NoQualifyingPlateau,
}

/// 推荐结果.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// 推荐切片在记录序列中的索引.
    pub record_index: usize,

    /// 推荐切片的文件名.
    pub file_name: String,

    /// 查看器索引: 切片编号减 1 (查看器从 0 起计数).
    pub viewer_index: u32,

    /// 诊断: 两路灰像素信号最后一个峰的记录索引 (取较靠后者).
    pub last_peak_index: Option<usize>,

    /// 诊断: 位于最后一个峰之后的谷索引 (两路信号合并去重).
    /// 峰不存在时保留全部谷.
    pub troughs_after_peak: Vec<usize>,
}

/// 普通最小二乘直线拟合, 返回 (斜率, 截距).
///
/// 输入退化 (点数不足 2 或横坐标全同) 时返回 `None`.
fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len() as f64;
    if xs.len() < 2 {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mean_x) * (x - mean_x)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// 找出切片编号的结构性间隙: 编号相对前一编号 (首项相对 0)
/// 跳变至少 `stride` 的记录索引.
fn number_gaps(records: &[SliceMetricsRecord], stride: u32) -> Vec<usize> {
    let mut gaps = Vec::new();
    let mut prev = 0u32;
    for (i, rec) in records.iter().enumerate() {
        if prev + stride <= rec.slice_number {
            gaps.push(i);
        }
        prev = rec.slice_number;
    }
    gaps
}

/// 在候选区间内找出信号落在给定区间的连续段, 仅保留长度
/// 严格大于 `min_len` 者. 返回每段的索引范围 (半开).
fn plateau_runs(
    signal: &[f64],
    range: std::ops::Range<usize>,
    band: (f64, f64),
    min_len: usize,
) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for i in range.clone() {
        let inside = band.0 <= signal[i] && signal[i] <= band.1;
        match (inside, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s > min_len {
                    runs.push(s..i);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if range.end - s > min_len {
            runs.push(s..range.end);
        }
    }
    runs
}

/// 对整个序列的统计记录给出推荐切片.
///
/// 记录必须按文件名升序排列 (即切片编号升序).
pub fn recommend(
    records: &[SliceMetricsRecord],
    cfg: &RecommendConfig,
) -> Result<Recommendation, NoRecommendation> {
    let gaps = number_gaps(records, cfg.gap_stride);
    if gaps.is_empty() {
        return Err(NoRecommendation::NoGap);
    }
    if gaps.len() < 2 {
        return Err(NoRecommendation::InsufficientGaps);
    }
    let segment = gaps[0]..gaps[1];

    let left: Vec<f64> = records.iter().map(|r| r.per_region[0].gray as f64).collect();
    let right: Vec<f64> = records.iter().map(|r| r.per_region[1].gray as f64).collect();

    // 诊断信号: 两路信号最后的峰, 以及其后的谷 (合并去重).
    let last_peak_index = [&left, &right]
        .iter()
        .filter_map(|s| find_peaks(s, &cfg.peak).last().copied())
        .max();
    let mut troughs_after_peak: Vec<usize> = [&left, &right]
        .iter()
        .flat_map(|s| find_peaks(s, &cfg.trough))
        .filter(|&t| last_peak_index.map_or(true, |last| t > last))
        .collect();
    troughs_after_peak.sort_unstable();
    troughs_after_peak.dedup();

    // 平台段搜索与线性拟合过滤, 两路信号各自独立进行.
    // 任一路没有合格索引则整体失败.
    let mut lo = usize::MAX;
    let mut hi = 0usize;
    for signal in [&left, &right] {
        let mut qualified: Vec<usize> = Vec::new();
        for run in plateau_runs(signal, segment.clone(), cfg.plateau_band, cfg.plateau_min_len) {
            let xs: Vec<f64> = run.clone().map(|i| i as f64).collect();
            let ys: Vec<f64> = run.clone().map(|i| signal[i]).collect();
            let Some((slope, _)) = linear_fit(&xs, &ys) else {
                continue;
            };
            let mean = ys.iter().sum::<f64>() / ys.len() as f64;
            if slope.abs() < cfg.slope_limit && cfg.mean_band.0 <= mean && mean <= cfg.mean_band.1 {
                qualified.extend(run);
            }
        }
        let (Some(&s_lo), Some(&s_hi)) = (qualified.iter().min(), qualified.iter().max()) else {
            return Err(NoRecommendation::NoQualifyingPlateau);
        };
        lo = lo.min(s_lo);
        hi = hi.max(s_hi);
    }

    // 两路合格索引最小值与最大值的整数中点 (恰好半数时向下取整).
    let record_index = (lo + hi) / 2;
    let rec = &records[record_index];

    log::info!(
        "推荐切片: {} (编号 {}, 查看器索引 {})",
        rec.file_name,
        rec.slice_number,
        rec.slice_number.saturating_sub(1)
    );

    Ok(Recommendation {
        record_index,
        file_name: rec.file_name.clone(),
        viewer_index: rec.slice_number.saturating_sub(1),
        last_peak_index,
        troughs_after_peak,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PixelClassMetrics;

    fn record(slice_number: u32, left_gray: usize, right_gray: usize) -> SliceMetricsRecord {
        let m = |gray| PixelClassMetrics {
            black: 0,
            almost_black: 0,
            gray,
            almost_white: 0,
            white: 0,
            total: gray,
        };
        SliceMetricsRecord {
            file_name: format!("IM-0001-0{:03}.dcm", slice_number),
            slice_number,
            per_region: [m(left_gray), m(right_gray)],
        }
    }

    #[test]
    fn test_number_gaps() {
        // 首项相对 0 跳变: 编号 >= 100 的首条记录即为间隙.
        let recs: Vec<_> = [100u32, 101, 102, 250, 360]
            .iter()
            .map(|&n| record(n, 0, 0))
            .collect();
        assert_eq!(number_gaps(&recs, 100), vec![0, 3, 4]);

        let dense: Vec<_> = (1..=50).map(|n| record(n, 0, 0)).collect();
        assert!(number_gaps(&dense, 100).is_empty());
    }

    #[test]
    fn test_recommend_failures() {
        let dense: Vec<_> = (1..=50).map(|n| record(n, 0, 0)).collect();
        assert_eq!(
            recommend(&dense, &RecommendConfig::default()),
            Err(NoRecommendation::NoGap)
        );

        let one_gap: Vec<_> = (100..=150).map(|n| record(n, 0, 0)).collect();
        assert_eq!(
            recommend(&one_gap, &RecommendConfig::default()),
            Err(NoRecommendation::InsufficientGaps)
        );

        // 两个间隙但信号全程在平台区间之外.
        let mut flat: Vec<_> = (100..=140).map(|n| record(n, 2000, 0)).collect();
        flat.push(record(300, 2000, 0));
        assert_eq!(
            recommend(&flat, &RecommendConfig::default()),
            Err(NoRecommendation::NoQualifyingPlateau)
        );
    }

    #[test]
    fn test_recommend_plateau_midpoint() {
        // 编号 100..=140 后跳到 300: 间隙在索引 0 与 41.
        let mut recs: Vec<_> = (100..=140)
            .map(|n| {
                let i = (n - 100) as usize;
                let gray = if (10..25).contains(&i) { 10_000 } else { 2000 };
                record(n, gray, gray)
            })
            .collect();
        recs.push(record(300, 2000, 2000));

        let r = recommend(&recs, &RecommendConfig::default()).unwrap();
        // 合格索引 10..=24, 中点 17.
        assert_eq!(r.record_index, 17);
        assert_eq!(r.file_name, "IM-0001-0117.dcm");
        assert_eq!(r.viewer_index, 116);
        // 没有确认的峰时全部谷都保留: 平台本身就是一个有界峰.
        assert_eq!(r.last_peak_index, None);
        assert_eq!(r.troughs_after_peak, vec![17]);
    }

    #[test]
    fn test_recommend_full_sequence_scenario() {
        // 编号 100..=240 后跳到 400: 两个结构性间隙.
        // 编号 150 处有 25000 的尖峰, 编号 200..=220 平台在 10000.
        let mut recs: Vec<_> = (100..=240)
            .map(|n| {
                let gray = if n == 150 {
                    25_000
                } else if (200..=220).contains(&n) {
                    10_000
                } else {
                    2000
                };
                record(n, gray, gray)
            })
            .collect();
        recs.push(record(400, 2000, 2000));

        let r = recommend(&recs, &RecommendConfig::default()).unwrap();
        // 合格索引 100..=120, 中点 110 对应编号 210.
        assert_eq!(r.record_index, 110);
        assert_eq!(r.file_name, "IM-0001-0210.dcm");
        assert_eq!(r.viewer_index, 209);
        assert_eq!(r.last_peak_index, Some(50));
        assert_eq!(r.troughs_after_peak, vec![110]);
    }

    #[test]
    fn test_recommend_rejects_sloped_plateau() {
        // 平台区间内但斜率超限 (每步 +400).
        let mut recs: Vec<_> = (100..=140)
            .map(|n| {
                let i = (n - 100) as usize;
                let gray = if (10..25).contains(&i) {
                    7000 + (i - 10) * 400
                } else {
                    2000
                };
                record(n, gray, gray)
            })
            .collect();
        recs.push(record(300, 2000, 2000));
        assert_eq!(
            recommend(&recs, &RecommendConfig::default()),
            Err(NoRecommendation::NoQualifyingPlateau)
        );
    }

    #[test]
    fn test_recommend_requires_both_series() {
        // 左路有合格平台, 右路没有: 整体失败.
        let mut recs: Vec<_> = (100..=140)
            .map(|n| {
                let i = (n - 100) as usize;
                let gray = if (10..25).contains(&i) { 10_000 } else { 2000 };
                record(n, gray, 2000)
            })
            .collect();
        recs.push(record(300, 2000, 2000));
        assert_eq!(
            recommend(&recs, &RecommendConfig::default()),
            Err(NoRecommendation::NoQualifyingPlateau)
        );
    }

    #[test]
    fn test_recommend_reports_diagnostics() {
        // 在平台前造一个高峰 (40000, 落差远超阈值).
        let mut recs: Vec<_> = (100..=140)
            .map(|n| {
                let i = (n - 100) as usize;
                let gray = if i == 5 {
                    40_000
                } else if (10..25).contains(&i) {
                    10_000
                } else {
                    2000
                };
                record(n, gray, gray)
            })
            .collect();
        recs.push(record(300, 2000, 2000));

        let r = recommend(&recs, &RecommendConfig::default()).unwrap();
        assert_eq!(r.last_peak_index, Some(5));
        // 平台段构成峰之后的谷 (有界峰), 位于最后的峰之后, 被保留.
        assert_eq!(r.troughs_after_peak, vec![17]);
    }
}
