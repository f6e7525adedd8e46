//! 程序运行函数.

use crate::result::AnalysisResult;
use knee_berry::config::{DetectConfig, RecommendConfig};
use knee_berry::process_stack;
use utils::loader;

/// 实际运行.
pub fn run() -> AnalysisResult {
    let stack_dir = loader::stack_dir_from_env_or_home();
    assert!(stack_dir.is_dir());

    println!("Loading DICOM stack from {:?} ...", stack_dir);
    let mut slices = Vec::new();
    for item in loader::stack_loader(&stack_dir) {
        match item {
            Ok(pair) => slices.push(pair),
            Err(e) => log::warn!("切片加载失败, 跳过: {:?}", e),
        }
    }
    assert!(!slices.is_empty(), "Loading dataset config error");

    println!("Processing {} slices on {} cores...", slices.len(), utils::cpus());
    let outcome = process_stack(&slices, &utils::knee_window(), &DetectConfig::primary());
    let recommendation = outcome.recommend(&RecommendConfig::default());

    AnalysisResult::new(outcome, recommendation)
}
