//! DICOM 序列加载.
//!
//! 以惰性迭代器逐文件加载目录下的 `.dcm` 切片, 文件名升序.
//! 像素按 **原始存储值** 读出 (modality LUT 取恒等变换),
//! rescale 参数单独保留, HU 变换推迟到检测阶段按需进行.

use crate::{DataError, RawSlice, Rescale};
use dicom::object::open_file;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use ndarray::{s, Array2, Array4};
use std::path::{Path, PathBuf};

/// 序列加载错误.
#[derive(Debug)]
pub enum LoadError {
    /// 目录遍历或文件读取失败.
    Io(std::io::Error),

    /// DICOM 对象解析失败.
    Read(dicom::object::ReadError),

    /// 像素数据解码失败.
    Pixel(dicom_pixeldata::Error),

    /// 像素矩阵尺寸与元数据不符.
    Shape,

    /// 数据层拒绝 (如空切片).
    Data(DataError),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<dicom::object::ReadError> for LoadError {
    fn from(e: dicom::object::ReadError) -> Self {
        LoadError::Read(e)
    }
}

impl From<dicom_pixeldata::Error> for LoadError {
    fn from(e: dicom_pixeldata::Error) -> Self {
        LoadError::Pixel(e)
    }
}

impl From<DataError> for LoadError {
    fn from(e: DataError) -> Self {
        LoadError::Data(e)
    }
}

/// 取 (帧, 行, 列, 采样) 像素体的首帧首采样平面.
///
/// 多采样数据 (如 RGB) 按通道交错存放, 必须按轴切片而不能截断
/// 扁平化字节流, 否则会混入其它通道.
fn first_plane(array: &Array4<f32>, rows: usize, cols: usize) -> Result<Array2<f32>, LoadError> {
    let (frames, r, c, samples) = array.dim();
    if frames == 0 || samples == 0 || r != rows || c != cols {
        return Err(LoadError::Shape);
    }
    Ok(array.slice(s![0, .., .., 0]).to_owned())
}

/// 加载单个 DICOM 文件为切片 (首帧, 首采样通道).
pub fn load_slice<P: AsRef<Path>>(path: P) -> Result<RawSlice, LoadError> {
    let obj = open_file(path)?;
    let decoded = obj.decode_pixel_data()?;

    let rescale = decoded.rescale()?.first().map(|r| Rescale {
        slope: r.slope,
        intercept: r.intercept,
    });

    // modality LUT 取 `None`: 像素按原始存储值读出, HU 变换推迟进行.
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let array = decoded.to_ndarray_with_options::<f32>(&options)?;
    let data = first_plane(&array, decoded.rows() as usize, decoded.columns() as usize)?;

    Ok(RawSlice::new(data, rescale)?)
}

/// 目录下 `.dcm` 切片的惰性加载迭代器, 文件名升序.
pub struct StackLoader {
    files: std::vec::IntoIter<PathBuf>,
}

impl StackLoader {
    /// 扫描目录并按文件名排序. 不做实际加载.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<StackLoader, LoadError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();
        files.sort();
        Ok(StackLoader {
            files: files.into_iter(),
        })
    }

    /// 剩余文件数.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl Iterator for StackLoader {
    type Item = Result<(String, RawSlice), LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(load_slice(&path).map(|slice| (name, slice)))
    }
}

/// 一次性加载整个目录, 全部成功才返回.
pub fn load_stack<P: AsRef<Path>>(dir: P) -> Result<Vec<(String, RawSlice)>, LoadError> {
    StackLoader::new(dir)?.collect()
}

/// 拼接 `$HOME/dataset/<parts...>`.
pub fn home_dataset_dir_with<I, P>(parts: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut dir = dirs::home_dir()?.join("dataset");
    for p in parts {
        dir.push(p);
    }
    Some(dir)
}

/// 默认序列目录: `$HOME/dataset/knee`.
pub fn default_stack_dir() -> Option<PathBuf> {
    home_dataset_dir_with(["knee"])
}
