//! 对 `knee-berry::dataset` 的更一层封装. 提供更直接的序列加载器.

use knee_berry::dataset::{self, StackLoader};
use std::env;
use std::path::{Path, PathBuf};

/// 获取膝关节 DICOM 序列基本路径.
///
/// 1. 若环境变量 `$KNEE_STACK_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/knee`.
pub fn stack_dir_from_env_or_home() -> PathBuf {
    if let Ok(d) = env::var("KNEE_STACK_DIR") {
        PathBuf::from(d)
    } else {
        dataset::home_dataset_dir_with(["knee"]).unwrap()
    }
}

/// 获取序列加载器.
pub fn stack_loader<P: AsRef<Path>>(path: P) -> StackLoader {
    StackLoader::new(path).expect("序列目录不可读")
}

/// 从 `$KNEE_STACK_DIR` 或者 `$HOME/dataset/knee` 下获取序列加载器.
#[inline]
pub fn stack_loader_from_env_or_home() -> StackLoader {
    stack_loader(stack_dir_from_env_or_home())
}
