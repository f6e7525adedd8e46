//! 分析最终结果.

use knee_berry::recommend::{NoRecommendation, Recommendation};
use knee_berry::StackOutcome;
use std::io::{self, Write};

/// 将批处理与推荐结果写进 `w` 中.
fn describe_into<W: Write>(
    outcome: &StackOutcome,
    rec: &Result<Recommendation, NoRecommendation>,
    w: &mut W,
) -> io::Result<()> {
    const S4: &str = "    ";

    let measured = outcome.records().len();
    let skipped = outcome.skipped();

    writeln!(w, "Stack summary:")?;
    writeln!(w, "{S4}Slices processed: {}", outcome.slices.len())?;
    writeln!(w, "{S4}With metrics: {measured}")?;
    writeln!(w, "{S4}Skipped: {}", skipped.len())?;
    for (name, reason) in skipped.iter() {
        writeln!(w, "{S4}{S4}{name}: {reason:?}")?;
    }

    match rec {
        Ok(r) => {
            writeln!(w, "Recommended slice: {}", r.file_name)?;
            writeln!(w, "{S4}Viewer index: {}", r.viewer_index)?;
            writeln!(
                w,
                "{S4}Last signal peak at record: {}",
                r.last_peak_index
                    .map_or_else(|| "/".to_string(), |i| i.to_string())
            )?;
            write!(w, "{S4}Troughs after peak: {:?}", r.troughs_after_peak)?;
        }
        Err(why) => {
            write!(w, "No recommendation: {why:?}")?;
        }
    }
    Ok(())
}

/// 批处理分析最终结果.
pub struct AnalysisResult {
    outcome: StackOutcome,
    recommendation: Result<Recommendation, NoRecommendation>,
}

impl AnalysisResult {
    pub fn new(
        outcome: StackOutcome,
        recommendation: Result<Recommendation, NoRecommendation>,
    ) -> Self {
        Self {
            outcome,
            recommendation,
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        describe_into(&self.outcome, &self.recommendation, &mut buf).unwrap();
        println!("{}", std::str::from_utf8(&buf).unwrap());

        utils::sep();
    }
}
