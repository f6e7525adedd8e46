//! 批处理结果缓存.
//!
//! 缓存单元是批处理的全部可复现产物: 逐切片的检出区域、展示图
//! (zlib 压缩) 与统计记录, 外加推荐索引. 加载失败以显式的
//! [`CacheError`] 返回, 由调用方决定是否退回全量重算.

use crate::metrics::SliceMetricsRecord;
use crate::stack::{SkipReason, SliceOutcome, StackOutcome};
use crate::{DisplayImage, Region};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// 缓存读写错误.
#[derive(Debug)]
pub enum CacheError {
    /// 底层 IO 失败.
    Io(std::io::Error),

    /// 字节流无法还原 (截断, 损坏或版本不符).
    Corrupt,
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::Io(e)
    }
}

/// zlib 压缩的展示图.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactDisplay {
    height: u32,
    width: u32,
    zdata: Vec<u8>,
}

impl CompactDisplay {
    /// 压缩展示图像素.
    pub fn compress(img: &DisplayImage) -> Result<CompactDisplay, CacheError> {
        let (h, w) = img.dim();
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        let bytes: Vec<u8> = img.rgb().iter().copied().collect();
        enc.write_all(&bytes)?;
        Ok(CompactDisplay {
            height: h as u32,
            width: w as u32,
            zdata: enc.finish()?,
        })
    }

    /// 解压还原展示图.
    pub fn decompress(&self) -> Result<DisplayImage, CacheError> {
        let mut bytes = Vec::new();
        ZlibDecoder::new(&self.zdata[..])
            .read_to_end(&mut bytes)
            .map_err(|_| CacheError::Corrupt)?;
        let shape = (self.height as usize, self.width as usize, 3);
        let data = Array3::from_shape_vec(shape, bytes).map_err(|_| CacheError::Corrupt)?;
        Ok(DisplayImage::from_rgb(data))
    }
}

/// 单张切片的缓存条目.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceCacheEntry {
    /// 切片文件名.
    pub file_name: String,

    /// 检出区域.
    pub regions: Vec<Region>,

    /// 压缩展示图.
    pub display: CompactDisplay,

    /// 统计记录或跳过原因.
    pub record: Result<SliceMetricsRecord, SkipReason>,
}

/// 整个序列的缓存.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackCache {
    /// 逐切片条目, 次序与批处理输出一致.
    pub slices: Vec<SliceCacheEntry>,

    /// 推荐的查看器索引 (若推荐成功).
    pub recommendation_index: Option<u32>,
}

impl StackCache {
    /// 由批处理产物构建缓存.
    pub fn from_outcome(
        outcome: &StackOutcome,
        recommendation_index: Option<u32>,
    ) -> Result<StackCache, CacheError> {
        let slices = outcome
            .slices
            .iter()
            .map(|s| {
                Ok(SliceCacheEntry {
                    file_name: s.file_name.clone(),
                    regions: s.regions.clone(),
                    display: CompactDisplay::compress(&s.display)?,
                    record: s.record.clone(),
                })
            })
            .collect::<Result<_, CacheError>>()?;
        Ok(StackCache {
            slices,
            recommendation_index,
        })
    }

    /// 从缓存还原批处理产物 (展示图解压).
    pub fn restore(&self) -> Result<StackOutcome, CacheError> {
        let slices = self
            .slices
            .iter()
            .map(|e| {
                Ok(SliceOutcome {
                    file_name: e.file_name.clone(),
                    regions: e.regions.clone(),
                    display: e.display.decompress()?,
                    record: e.record.clone(),
                })
            })
            .collect::<Result<_, CacheError>>()?;
        Ok(StackOutcome { slices })
    }

    /// 编码为字节流.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|_| CacheError::Corrupt)
    }

    /// 从字节流解码.
    pub fn from_bytes(bytes: &[u8]) -> Result<StackCache, CacheError> {
        bincode::deserialize(bytes).map_err(|_| CacheError::Corrupt)
    }

    /// 写入文件.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CacheError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// 从文件加载.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<StackCache, CacheError> {
        StackCache::from_bytes(&std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PixelClassMetrics;
    use ndarray::Array2;

    fn sample_outcome() -> StackOutcome {
        let gray = Array2::from_shape_fn((8, 8), |(r, c)| (r * 8 + c) as u8);
        let m = PixelClassMetrics {
            black: 1,
            almost_black: 3,
            gray: 56,
            almost_white: 3,
            white: 1,
            total: 64,
        };
        StackOutcome {
            slices: vec![
                SliceOutcome {
                    file_name: "IM-0001-0101.dcm".into(),
                    regions: vec![
                        Region::new(0, 0, 80, 80).unwrap(),
                        Region::new(100, 0, 80, 80).unwrap(),
                    ],
                    display: DisplayImage::from_gray(&gray),
                    record: Ok(SliceMetricsRecord {
                        file_name: "IM-0001-0101.dcm".into(),
                        slice_number: 101,
                        per_region: [m, m],
                    }),
                },
                SliceOutcome {
                    file_name: "IM-0001-0102.dcm".into(),
                    regions: vec![],
                    display: DisplayImage::from_gray(&gray),
                    record: Err(SkipReason::RegionCount(0)),
                },
            ],
        }
    }

    #[test]
    fn test_cache_byte_round_trip() {
        let outcome = sample_outcome();
        let cache = StackCache::from_outcome(&outcome, Some(116)).unwrap();
        let bytes = cache.to_bytes().unwrap();

        let back = StackCache::from_bytes(&bytes).unwrap();
        assert_eq!(back.recommendation_index, Some(116));
        assert_eq!(back.slices.len(), 2);

        let restored = back.restore().unwrap();
        assert_eq!(restored.slices[0].file_name, outcome.slices[0].file_name);
        assert_eq!(restored.slices[0].regions, outcome.slices[0].regions);
        assert_eq!(restored.slices[0].display, outcome.slices[0].display);
        assert_eq!(restored.slices[1].record, outcome.slices[1].record);
    }

    #[test]
    fn test_cache_corrupt_bytes() {
        assert!(matches!(
            StackCache::from_bytes(&[0xde, 0xad, 0xbe, 0xef]),
            Err(CacheError::Corrupt)
        ));

        let cache = StackCache::from_outcome(&sample_outcome(), None).unwrap();
        let mut bytes = cache.to_bytes().unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(StackCache::from_bytes(&bytes).is_err());
    }
}
