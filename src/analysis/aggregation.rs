//! Per-label tile tallies and their conversion to proportions
//!
//! Only the labels in [`REPORTED_LABELS`] are counted. Any other label is
//! tallied as ignored and excluded from both numerator and denominator.
//! Tallies merge by addition, so partial counts from worker threads can
//! be combined in any order.

use crate::io::configuration::REPORTED_LABELS;
use crate::io::error::{Result, computation_error};
use crate::model::SoilLabel;
use serde::Serialize;

/// Running count of classified tiles per reported label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounts {
    counts: [usize; REPORTED_LABELS.len()],
    ignored: usize,
}

impl TileCounts {
    /// Empty tally
    pub const fn new() -> Self {
        Self {
            counts: [0; REPORTED_LABELS.len()],
            ignored: 0,
        }
    }

    /// Tally one tile; returns `false` if the label is not reported and was ignored
    pub fn record(&mut self, label: SoilLabel) -> bool {
        let slot = REPORTED_LABELS
            .iter()
            .position(|&reported| reported == label)
            .and_then(|index| self.counts.get_mut(index));
        if let Some(count) = slot {
            *count += 1;
            true
        } else {
            self.ignored += 1;
            false
        }
    }

    /// Combine two partial tallies
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (count, extra) in self.counts.iter_mut().zip(other.counts) {
            *count += extra;
        }
        self.ignored += other.ignored;
        self
    }

    /// Tiles tallied under `label`; zero for labels that are not reported
    pub fn count(&self, label: SoilLabel) -> usize {
        REPORTED_LABELS
            .iter()
            .zip(self.counts)
            .find(|&(&reported, _)| reported == label)
            .map_or(0, |(_, count)| count)
    }

    /// Tiles that count towards the proportions
    pub fn counted(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Tiles whose label fell outside the reported set
    pub const fn ignored(&self) -> usize {
        self.ignored
    }

    /// Convert the tally into fractions of the counted tiles
    ///
    /// # Errors
    ///
    /// Returns a computation error if no tile was counted
    pub fn proportions(&self) -> Result<ProportionReport> {
        let counted = self.counted();
        if counted == 0 {
            return Err(computation_error(
                "proportions",
                &format!(
                    "no tiles were counted ({} ignored); cannot divide by zero",
                    self.ignored
                ),
            ));
        }

        let shares = REPORTED_LABELS
            .iter()
            .zip(self.counts)
            .map(|(&label, count)| LabelShare {
                label,
                count,
                fraction: count as f64 / counted as f64,
            })
            .collect();

        Ok(ProportionReport { shares, counted })
    }
}

impl Extend<SoilLabel> for TileCounts {
    fn extend<T: IntoIterator<Item = SoilLabel>>(&mut self, iter: T) {
        for label in iter {
            self.record(label);
        }
    }
}

impl FromIterator<SoilLabel> for TileCounts {
    fn from_iter<T: IntoIterator<Item = SoilLabel>>(iter: T) -> Self {
        let mut counts = Self::new();
        counts.extend(iter);
        counts
    }
}

/// One label's share of the counted tiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelShare {
    /// Soil type
    pub label: SoilLabel,
    /// Tiles classified as this type
    pub count: usize,
    /// `count` divided by the number of counted tiles
    pub fraction: f64,
}

/// Fractions of each reported soil type over one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionReport {
    shares: Vec<LabelShare>,
    counted: usize,
}

impl ProportionReport {
    /// Shares in report order
    pub fn shares(&self) -> &[LabelShare] {
        &self.shares
    }

    /// Fraction for `label`, if it is a reported label
    pub fn fraction(&self, label: SoilLabel) -> Option<f64> {
        self.shares
            .iter()
            .find(|share| share.label == label)
            .map(|share| share.fraction)
    }

    /// Denominator of every fraction
    pub const fn counted(&self) -> usize {
        self.counted
    }

    /// Sum of all fractions; one up to rounding
    pub fn total(&self) -> f64 {
        self.shares.iter().map(|share| share.fraction).sum()
    }

    /// Label with the largest share; ties resolve to report order
    pub fn dominant(&self) -> Option<SoilLabel> {
        self.shares
            .iter()
            .fold(None, |best: Option<&LabelShare>, share| match best {
                Some(current) if current.count >= share.count => Some(current),
                _ => Some(share),
            })
            .map(|share| share.label)
    }
}
