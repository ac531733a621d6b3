/**
This module computes the precision, recall and F-score of a single confusion matrix. A
metric whose denominator is zero is not an error and not a zero: it is reported as the
explicit `Metric::NotApplicable` marker, which propagates into the F-score. A feature that
never occurs in a reference document simply has no defined recall.
*/
use crate::matrix::ConfusionMatrix;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single metric value: either a finite ratio in `[0, 1]` or the explicit not-applicable
/// marker. Never NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Value(f64),
    NotApplicable,
}

impl Metric {
    /// Divides, yielding `NotApplicable` when the denominator is zero.
    pub(crate) fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::NotApplicable
        } else {
            Self::Value(numerator / denominator)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Formats the metric with two decimals, as used by the LaTeX table.
    pub(crate) fn fixed(&self) -> String {
        match self {
            Self::Value(v) => format!("{:.2}", v),
            Self::NotApplicable => String::from("N/A"),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Precision, recall and F-score of one feature (or of the `all` aggregate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrfScores {
    pub precision: Metric,
    pub recall: Metric,
    pub fscore: Metric,
}

impl PrfScores {
    /// `precision = tp / (tp + fp)`, `recall = tp / (tp + fn)`,
    /// `fscore = 2pr / (p + r)`. The F-score is not applicable whenever precision or recall
    /// is, or when both are zero.
    pub fn from_matrix(cm: &ConfusionMatrix) -> Self {
        let tp = cm.true_positives() as f64;
        let fp = cm.false_positives() as f64;
        let fn_ = cm.false_negatives() as f64;
        let precision = Metric::ratio(tp, tp + fp);
        let recall = Metric::ratio(tp, tp + fn_);
        let fscore = match (precision, recall) {
            (Metric::Value(p), Metric::Value(r)) => Metric::ratio(2.0 * p * r, p + r),
            _ => Metric::NotApplicable,
        };
        Self {
            precision,
            recall,
            fscore,
        }
    }
}

impl Display for PrfScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.precision, self.recall, self.fscore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FeatureOutcome;
    use rstest::rstest;

    fn matrix(tp: u64, fp: u64, fn_: u64, tn: u64) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::zeros();
        for _ in 0..tp {
            cm.record(FeatureOutcome::TruePositive);
        }
        for _ in 0..fp {
            cm.record(FeatureOutcome::FalsePositive);
        }
        for _ in 0..fn_ {
            cm.record(FeatureOutcome::FalseNegative);
        }
        for _ in 0..tn {
            cm.record(FeatureOutcome::TrueNegative);
        }
        cm
    }

    #[test]
    fn test_perfect_restoration() {
        let scores = PrfScores::from_matrix(&matrix(3, 0, 0, 10));
        assert_eq!(scores.precision, Metric::Value(1.0));
        assert_eq!(scores.recall, Metric::Value(1.0));
        assert_eq!(scores.fscore, Metric::Value(1.0));
    }

    #[test]
    fn test_one_third_precision() {
        let scores = PrfScores::from_matrix(&matrix(1, 2, 0, 18));
        let precision = scores.precision.value().unwrap();
        assert!((precision - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(scores.recall, Metric::Value(1.0));
        assert_eq!(scores.fscore, Metric::Value(0.5));
    }

    #[rstest]
    // Feature absent from the reference and the hypothesis: nothing is defined.
    #[case(matrix(0, 0, 0, 5))]
    // Feature hallucinated by the hypothesis only: recall stays undefined.
    #[case(matrix(0, 3, 0, 5))]
    fn test_zero_denominators_are_not_applicable(#[case] cm: ConfusionMatrix) {
        let scores = PrfScores::from_matrix(&cm);
        assert!(!scores.recall.is_applicable());
        assert!(!scores.fscore.is_applicable());
    }

    #[test]
    fn test_fscore_na_when_precision_and_recall_are_zero() {
        // tp = 0 with both fp and fn present: precision and recall are defined zeros, but
        // their sum is zero, so the F-score has no defined value.
        let scores = PrfScores::from_matrix(&matrix(0, 2, 3, 5));
        assert_eq!(scores.precision, Metric::Value(0.0));
        assert_eq!(scores.recall, Metric::Value(0.0));
        assert_eq!(scores.fscore, Metric::NotApplicable);
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::Value(1.0).to_string(), "1");
        assert_eq!(Metric::Value(0.5).to_string(), "0.5");
        assert_eq!(Metric::NotApplicable.to_string(), "N/A");
        assert_eq!(Metric::NotApplicable.fixed(), "N/A");
        assert_eq!(Metric::Value(2.0 / 3.0).fixed(), "0.67");
    }
}
