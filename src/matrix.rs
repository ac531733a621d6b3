/**
This module builds the per-feature binary confusion matrices out of two aligned feature
splits. Matrices are 2x2 with the reference on the rows and the hypothesis on the columns,
positive before negative on both axes:

```text
tp fn
fp tn
```

The `all` matrix is the element-wise sum of the per-feature matrices, NOT a classification
of "any feature differs": a position where several features diverge at once counts once per
feature, since the aggregate represents total feature-error volume.
*/
use crate::align::{Feature, FeatureSet, FeatureSplit};
use enum_iterator::Sequence;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Classification of one feature at one aligned position, from its presence on the
/// reference and hypothesis sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence)]
pub enum FeatureOutcome {
    TruePositive,
    FalsePositive,
    FalseNegative,
    TrueNegative,
}

impl FeatureOutcome {
    pub fn classify(in_ref: bool, in_hyp: bool) -> Self {
        match (in_ref, in_hyp) {
            (true, true) => Self::TruePositive,
            (false, true) => Self::FalsePositive,
            (true, false) => Self::FalseNegative,
            (false, false) => Self::TrueNegative,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::FalsePositive | Self::FalseNegative)
    }
}

impl Display for FeatureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::TruePositive => "tp",
            Self::FalsePositive => "fp",
            Self::FalseNegative => "fn",
            Self::TrueNegative => "tn",
        };
        write!(f, "{}", label)
    }
}

/// A 2x2 binary confusion matrix with {reference: positive/negative} rows and {hypothesis:
/// positive/negative} columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix(Array2<u64>);

impl ConfusionMatrix {
    pub(crate) fn zeros() -> Self {
        Self(Array2::zeros((2, 2)))
    }

    pub(crate) fn record(&mut self, outcome: FeatureOutcome) {
        let cell = match outcome {
            FeatureOutcome::TruePositive => [0, 0],
            FeatureOutcome::FalseNegative => [0, 1],
            FeatureOutcome::FalsePositive => [1, 0],
            FeatureOutcome::TrueNegative => [1, 1],
        };
        self.0[cell] += 1;
    }

    /// Element-wise sum, used both for the `all` aggregate and for corpus-level matrices.
    pub(crate) fn absorb(&mut self, other: &ConfusionMatrix) {
        self.0 += &other.0;
    }

    pub fn true_positives(&self) -> u64 {
        self.0[[0, 0]]
    }

    pub fn false_negatives(&self) -> u64 {
        self.0[[0, 1]]
    }

    pub fn false_positives(&self) -> u64 {
        self.0[[1, 0]]
    }

    pub fn true_negatives(&self) -> u64 {
        self.0[[1, 1]]
    }

    pub fn cells(&self) -> &Array2<u64> {
        &self.0
    }
}

/// The ConfusionMatrix struct acts as a small table when displayed.
impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<20}{:>10}{:>10}", "", "Hyp+", "Hyp-")?;
        writeln!(
            f,
            "{:<20}{:>10}{:>10}",
            "Reference positive",
            self.true_positives(),
            self.false_negatives()
        )?;
        write!(
            f,
            "{:<20}{:>10}{:>10}",
            "Reference negative",
            self.false_positives(),
            self.true_negatives()
        )
    }
}

/// The confusion matrices of one document (or of a whole corpus): one matrix per configured
/// feature, in feature-set order, plus the summed `all` aggregate held as its own field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMatrices {
    by_feature: Vec<(Feature, ConfusionMatrix)>,
    all: ConfusionMatrix,
}

impl FeatureMatrices {
    pub(crate) fn zeros(features: &FeatureSet) -> Self {
        Self {
            by_feature: features.iter().map(|f| (f, ConfusionMatrix::zeros())).collect(),
            all: ConfusionMatrix::zeros(),
        }
    }

    pub fn get(&self, feature: Feature) -> Option<&ConfusionMatrix> {
        self.by_feature
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, cm)| cm)
    }

    /// The element-wise sum of the per-feature matrices.
    pub fn all(&self) -> &ConfusionMatrix {
        &self.all
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, &ConfusionMatrix)> {
        self.by_feature.iter().map(|(f, cm)| (*f, cm))
    }

    /// Element-wise sum of another document's matrices into this one, feature by feature.
    pub(crate) fn absorb(&mut self, other: &FeatureMatrices) {
        for ((_, cm), (_, other_cm)) in self.by_feature.iter_mut().zip(other.by_feature.iter()) {
            cm.absorb(other_cm);
        }
        self.all.absorb(&other.all);
    }
}

/// Builds the confusion matrices of one document from its two feature splits. The splits
/// must already have passed the content check, so the feature lists are index aligned.
pub(crate) fn build_matrices(
    reference: &FeatureSplit,
    hypothesis: &FeatureSplit,
    features: &FeatureSet,
) -> FeatureMatrices {
    let mut matrices = FeatureMatrices::zeros(features);
    for (i, feature) in features.iter().enumerate() {
        let cm = &mut matrices.by_feature[i].1;
        for (ref_features, hyp_features) in
            reference.features().iter().zip(hypothesis.features().iter())
        {
            let outcome = FeatureOutcome::classify(
                ref_features.contains(&feature),
                hyp_features.contains(&feature),
            );
            cm.record(outcome);
        }
    }
    let mut all = ConfusionMatrix::zeros();
    for (_, cm) in matrices.by_feature.iter() {
        all.absorb(cm);
    }
    matrices.all = all;
    matrices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::split_features;
    use enum_iterator::all;
    use rstest::rstest;

    #[rstest]
    #[case(true, true, FeatureOutcome::TruePositive)]
    #[case(false, true, FeatureOutcome::FalsePositive)]
    #[case(true, false, FeatureOutcome::FalseNegative)]
    #[case(false, false, FeatureOutcome::TrueNegative)]
    fn test_classify(#[case] in_ref: bool, #[case] in_hyp: bool, #[case] expected: FeatureOutcome) {
        assert_eq!(FeatureOutcome::classify(in_ref, in_hyp), expected);
    }

    #[test]
    fn test_only_fp_and_fn_are_errors() {
        let errors: Vec<_> = all::<FeatureOutcome>().filter(FeatureOutcome::is_error).collect();
        assert_eq!(
            errors,
            vec![FeatureOutcome::FalsePositive, FeatureOutcome::FalseNegative]
        );
    }

    #[test]
    fn test_record_cell_layout() {
        let mut cm = ConfusionMatrix::zeros();
        cm.record(FeatureOutcome::TruePositive);
        cm.record(FeatureOutcome::FalseNegative);
        cm.record(FeatureOutcome::FalseNegative);
        cm.record(FeatureOutcome::FalsePositive);
        cm.record(FeatureOutcome::TrueNegative);
        assert_eq!(cm.true_positives(), 1);
        assert_eq!(cm.false_negatives(), 2);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.cells()[[0, 1]], 2);
    }

    fn capitalization_scenario() -> FeatureMatrices {
        let features = FeatureSet::new(true, "., ");
        let reference = split_features("This is another sentence.", &features).unwrap();
        let hypothesis = split_features("This IS another sentence.", &features).unwrap();
        build_matrices(&reference, &hypothesis, &features)
    }

    #[test]
    fn test_build_matrices_capitalization() {
        // 21 content characters once the markers are stripped; "T" restored correctly,
        // "I" and "S" upper cased where the reference is lower.
        let matrices = capitalization_scenario();
        let cm = matrices.get(Feature::Caps).unwrap();
        assert_eq!(cm.true_positives(), 1);
        assert_eq!(cm.false_positives(), 2);
        assert_eq!(cm.false_negatives(), 0);
        assert_eq!(cm.true_negatives(), 18);
    }

    #[test]
    fn test_all_matrix_is_elementwise_sum() {
        let features = FeatureSet::new(true, ". ");
        let reference = split_features("It is.", &features).unwrap();
        let hypothesis = split_features("it is", &features).unwrap();
        let matrices = build_matrices(&reference, &hypothesis, &features);
        let mut expected = ConfusionMatrix::zeros();
        for (_, cm) in matrices.iter() {
            expected.absorb(cm);
        }
        assert_eq!(matrices.all(), &expected);
        // Three features over four positions: the aggregate covers 12 classifications.
        let total: u64 = expected.cells().iter().sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_absorb_sums_documents() {
        let first = capitalization_scenario();
        let second = capitalization_scenario();
        let features = FeatureSet::new(true, "., ");
        let mut total = FeatureMatrices::zeros(&features);
        total.absorb(&first);
        total.absorb(&second);
        let cm = total.get(Feature::Caps).unwrap();
        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.false_positives(), 4);
        assert_eq!(cm.true_negatives(), 36);
        assert_eq!(total.all().false_positives(), 4);
    }

    #[test]
    fn test_matrix_display_is_a_table() {
        let matrices = capitalization_scenario();
        let rendered = matrices.get(Feature::Caps).unwrap().to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Hyp+"));
        assert!(lines[1].starts_with("Reference positive"));
        assert!(lines[1].ends_with("0"));
        assert!(lines[2].starts_with("Reference negative"));
    }
}
