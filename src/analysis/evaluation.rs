//! Whole-image predictions checked against explicit ground truth

use crate::dataset::samples::LabeledSample;
use crate::io::image::load_rgb;
use crate::io::error::Result;
use crate::model::{Classifier, Prediction, SoilLabel};
use indicatif::ProgressBar;
use std::collections::BTreeMap;

/// Prediction for one labeled sample
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The evaluated sample and its true label
    pub sample: LabeledSample,
    /// Per-label confidences
    pub prediction: Prediction,
    /// Highest-confidence label
    pub predicted: SoilLabel,
}

impl Evaluation {
    /// Whether the prediction matches the ground truth
    pub fn is_correct(&self) -> bool {
        self.predicted == self.sample.label
    }
}

/// Classify the whole image of `sample` and compare with its label
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or the classifier fails
pub fn evaluate<C>(classifier: &C, sample: &LabeledSample) -> Result<Evaluation>
where
    C: Classifier + ?Sized,
{
    let image = load_rgb(&sample.path)?;
    let prediction = classifier.predict(&image)?;
    let predicted = prediction.top()?;

    tracing::debug!(
        path = %sample.path.display(),
        truth = %sample.label,
        predicted = %predicted,
        "Evaluated sample"
    );

    Ok(Evaluation {
        sample: sample.clone(),
        prediction,
        predicted,
    })
}

/// Correct/total counts per true label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    per_label: BTreeMap<SoilLabel, (usize, usize)>,
}

impl EvaluationSummary {
    /// Fold one evaluation into the summary
    pub fn record(&mut self, evaluation: &Evaluation) {
        let entry = self
            .per_label
            .entry(evaluation.sample.label)
            .or_insert((0, 0));
        entry.1 += 1;
        if evaluation.is_correct() {
            entry.0 += 1;
        }
    }

    /// Number of evaluated samples
    pub fn total(&self) -> usize {
        self.per_label.values().map(|&(_, total)| total).sum()
    }

    /// Number of correctly predicted samples
    pub fn correct(&self) -> usize {
        self.per_label.values().map(|&(correct, _)| correct).sum()
    }

    /// Fraction of correct predictions, `None` when nothing was evaluated
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct() as f64 / total as f64)
    }

    /// `(correct, total)` for samples whose true label is `label`
    pub fn label_counts(&self, label: SoilLabel) -> (usize, usize) {
        self.per_label.get(&label).copied().unwrap_or((0, 0))
    }

    /// True labels seen, in label order
    pub fn labels(&self) -> impl Iterator<Item = SoilLabel> + '_ {
        self.per_label.keys().copied()
    }
}

/// Evaluate every sample in order, stopping at the first failure
///
/// # Errors
///
/// Propagates the first load or classification failure
pub fn evaluate_all<C>(
    classifier: &C,
    samples: &[LabeledSample],
    progress: Option<&ProgressBar>,
) -> Result<(Vec<Evaluation>, EvaluationSummary)>
where
    C: Classifier + ?Sized,
{
    if let Some(bar) = progress {
        bar.set_length(samples.len() as u64);
    }

    let mut summary = EvaluationSummary::default();
    let mut evaluations = Vec::with_capacity(samples.len());
    for sample in samples {
        let evaluation = evaluate(classifier, sample)?;
        summary.record(&evaluation);
        evaluations.push(evaluation);
        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    Ok((evaluations, summary))
}
