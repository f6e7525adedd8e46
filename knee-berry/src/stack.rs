//! 整序列批处理.
//!
//! 逐切片执行检测与统计 (开启 `rayon` feature 时并行),
//! 结果按输入次序合并. 区域数不为 2 的切片按预期跳过并留档,
//! 不会中断整个批次.

use crate::config::DetectConfig;
use crate::detect::detect_regions;
use crate::metrics::{region_metrics, SliceMetricsRecord};
use crate::recommend::{self, NoRecommendation, Recommendation};
use crate::{parse_slice_number, CtWindow, DisplayImage, RawSlice, Region};

/// 切片被跳过的原因.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// 检出区域数不为 2.
    RegionCount(usize),

    /// 文件名无法解析出切片编号.
    BadFileName,

    /// 区域与切片无交集, 统计为空.
    EmptyRegion,
}

/// 单张切片的批处理产物.
///
/// 无论是否产出统计记录, 检出区域与展示图都会保留 (供缓存与展示).
#[derive(Debug, Clone)]
pub struct SliceOutcome {
    /// 切片文件名.
    pub file_name: String,

    /// 检出区域 (按横坐标升序).
    pub regions: Vec<Region>,

    /// CT 窗展示图.
    pub display: DisplayImage,

    /// 统计记录, 或跳过原因.
    pub record: Result<SliceMetricsRecord, SkipReason>,
}

/// 整个序列的批处理产物, 次序与输入一致.
#[derive(Debug, Clone)]
pub struct StackOutcome {
    /// 逐切片产物.
    pub slices: Vec<SliceOutcome>,
}

impl StackOutcome {
    /// 按序收集全部统计记录 (跳过的切片在序列中缺位).
    pub fn records(&self) -> Vec<SliceMetricsRecord> {
        self.slices
            .iter()
            .filter_map(|s| s.record.as_ref().ok().cloned())
            .collect()
    }

    /// 按序收集全部跳过档案.
    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.slices
            .iter()
            .filter_map(|s| match &s.record {
                Err(reason) => Some((s.file_name.as_str(), reason)),
                Ok(_) => None,
            })
            .collect()
    }

    /// 基于本批次统计给出推荐切片.
    pub fn recommend(
        &self,
        cfg: &crate::config::RecommendConfig,
    ) -> Result<Recommendation, NoRecommendation> {
        recommend::recommend(&self.records(), cfg)
    }
}

fn process_one(
    file_name: &str,
    slice: &RawSlice,
    window: &CtWindow,
    cfg: &DetectConfig,
) -> SliceOutcome {
    let det = detect_regions(slice, window, cfg);

    let record = match det.knee_pair() {
        Ok(pair) => match parse_slice_number(file_name) {
            Ok(slice_number) => {
                let stats = [
                    region_metrics(slice, &pair[0]),
                    region_metrics(slice, &pair[1]),
                ];
                match stats {
                    [Some(a), Some(b)] => Ok(SliceMetricsRecord {
                        file_name: file_name.to_owned(),
                        slice_number,
                        per_region: [a, b],
                    }),
                    _ => Err(SkipReason::EmptyRegion),
                }
            }
            Err(_) => Err(SkipReason::BadFileName),
        },
        Err(reject) => Err(SkipReason::RegionCount(reject.found)),
    };

    if let Err(reason) = &record {
        log::debug!("跳过切片 {}: {:?}", file_name, reason);
    }

    SliceOutcome {
        file_name: file_name.to_owned(),
        regions: det.regions,
        display: det.display,
        record,
    }
}

/// 按序批处理整个序列.
///
/// 开启 `rayon` feature 时逐切片并行, 输出次序仍与输入一致.
pub fn process_stack(
    slices: &[(String, RawSlice)],
    window: &CtWindow,
    cfg: &DetectConfig,
) -> StackOutcome {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            use rayon::prelude::*;
            let outcomes = slices
                .par_iter()
                .map(|(name, slice)| process_one(name, slice, window, cfg))
                .collect();
        } else {
            let outcomes = slices
                .iter()
                .map(|(name, slice)| process_one(name, slice, window, cfg))
                .collect();
        }
    }
    StackOutcome { slices: outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn bright_rects(dim: crate::Idx2d, rects: &[(u32, u32, u32)]) -> RawSlice {
        let mut raw = Array2::<f32>::zeros(dim);
        for &(x, y, side) in rects {
            for r in y..y + side {
                for c in x..x + side {
                    raw[[r as usize, c as usize]] = 1000.0;
                }
            }
        }
        RawSlice::new(raw, None).unwrap()
    }

    #[test]
    fn test_process_stack_keeps_order_and_skips() {
        let dim = (220, 300);
        let two = |n: u32| {
            (
                format!("IM-0001-0{:03}.dcm", n),
                bright_rects(dim, &[(20, 40, 80), (180, 60, 80)]),
            )
        };
        let one = (
            "IM-0001-0102.dcm".to_owned(),
            bright_rects(dim, &[(20, 40, 80)]),
        );
        let slices = vec![two(101), one, two(103)];

        let out = process_stack(&slices, &CtWindow::from_bone_visual(), &DetectConfig::primary());
        assert_eq!(out.slices.len(), 3);

        let records = out.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slice_number, 101);
        assert_eq!(records[1].slice_number, 103);

        let skipped = out.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, "IM-0001-0102.dcm");
        assert_eq!(*skipped[0].1, SkipReason::RegionCount(1));

        // 被跳过的切片仍保留检测产物.
        assert_eq!(out.slices[1].regions.len(), 1);
    }

    #[test]
    fn test_process_stack_bad_file_name() {
        let dim = (220, 300);
        let slices = vec![(
            "nonsense.dcm".to_owned(),
            bright_rects(dim, &[(20, 40, 80), (180, 60, 80)]),
        )];
        let out = process_stack(&slices, &CtWindow::from_bone_visual(), &DetectConfig::primary());
        assert_eq!(out.slices[0].record, Err(SkipReason::BadFileName));
    }
}
