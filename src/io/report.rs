//! Human-readable and JSON rendering of classification results

use crate::analysis::aggregation::LabelShare;
use crate::analysis::evaluation::{Evaluation, EvaluationSummary};
use crate::analysis::pipeline::ClassificationPass;
use crate::io::error::{Result, computation_error};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// Percentage summary of one classification pass
pub fn format_pass(path: &Path, pass: &ClassificationPass) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "Percentage Classification Results: {}", path.display());
    let _ = writeln!(out);
    for share in pass.report.shares() {
        let _ = writeln!(out, "    {}: {:.2}%", share.label, share.fraction * 100.0);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "    Tiles counted: {} of {}",
        pass.report.counted(),
        pass.tiles
    );
    let _ = writeln!(
        out,
        "    Time it takes to classify: {:.5} seconds",
        pass.elapsed.as_secs_f64()
    );
    out
}

#[derive(Serialize)]
struct PassRecord<'a> {
    path: &'a Path,
    shares: &'a [LabelShare],
    counted: usize,
    ignored: usize,
    tiles: usize,
    elapsed_seconds: f64,
}

/// One-line JSON record of a classification pass
///
/// # Errors
///
/// Returns a computation error if the record cannot be serialized
pub fn pass_to_json(path: &Path, pass: &ClassificationPass) -> Result<String> {
    let record = PassRecord {
        path,
        shares: pass.report.shares(),
        counted: pass.counts.counted(),
        ignored: pass.counts.ignored(),
        tiles: pass.tiles,
        elapsed_seconds: pass.elapsed.as_secs_f64(),
    };
    serde_json::to_string(&record).map_err(|e| computation_error("serialize report", &e))
}

/// Per-label confidences, predicted and true type of one sample
pub fn format_evaluation(evaluation: &Evaluation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", evaluation.sample.path.display());
    for (label, score) in evaluation.prediction.scores() {
        let _ = writeln!(out, "    {label}: {score:.4}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "    Predicted Type: {}", evaluation.predicted);
    let _ = writeln!(out, "    True type: {}", evaluation.sample.label);
    let _ = writeln!(out);
    let _ = writeln!(out, "    Correct: {}", evaluation.is_correct());
    out
}

/// Overall and per-label accuracy
pub fn format_summary(summary: &EvaluationSummary) -> String {
    let mut out = String::new();
    match summary.accuracy() {
        Some(accuracy) => {
            let _ = writeln!(
                out,
                "Accuracy: {}/{} ({:.2}%)",
                summary.correct(),
                summary.total(),
                accuracy * 100.0
            );
        }
        None => {
            let _ = writeln!(out, "Accuracy: no samples evaluated");
        }
    }
    for label in summary.labels() {
        let (correct, total) = summary.label_counts(label);
        let _ = writeln!(out, "    {label}: {correct}/{total}");
    }
    out
}
