/**
This module contains the character alignment engine of the crate. It splits a document into
content characters and the features attached to them, and verifies that a reference and a
hypothesis document agree on their underlying content once the features are stripped.

Documents are segmented into grapheme clusters, not code points, so a base letter followed by
a combining mark counts as a single content character.
*/
use ahash::AHashSet;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;
use unicode_segmentation::UnicodeSegmentation;

mod features;
mod interleaved;

// Re-exporting
pub use features::{Feature, FeatureChars, FeatureSet};
pub use interleaved::{AlignedPosition, StreamMismatchError};

pub(crate) use features::cluster_is_one_of;
pub(crate) use interleaved::InterleavedAligner;

/// Splits a string into its grapheme clusters.
pub(crate) fn grapheme_clusters(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}

/// Whether a grapheme cluster reads as upper cased: it has at least one cased char and no
/// lower cased char.
pub(crate) fn is_upper_cluster(cluster: &str) -> bool {
    let mut cased = false;
    for c in cluster.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Error raised when the first grapheme cluster of a document is itself a configured feature
/// character. The splitter cannot tell a leading marker apart from a content character, so
/// this surfaces immediately instead of producing silently shifted alignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingFeatureCharError {
    pub(crate) cluster: String,
}

impl Display for LeadingFeatureCharError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The first character in the document ({:?}) is a feature character",
            self.cluster
        )
    }
}
impl Error for LeadingFeatureCharError {}

/// Error raised when the reference and hypothesis documents disagree on their content
/// characters after feature stripping. It carries the characters found on one side but not
/// the other, so the offending document can be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedContentError {
    pub doc_idx: usize,
    pub differing: BTreeSet<String>,
}

impl Display for MismatchedContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Different characters found between reference and hypothesis strings in document \
             index {}: {:?}. Skipping this document",
            self.doc_idx, self.differing
        )
    }
}
impl Error for MismatchedContentError {}

/// A document split into content characters and their attached features. The three inner
/// sequences are index aligned: position `i` holds the lower cased content character, the
/// content character as written, and the features present on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSplit {
    content: Vec<String>,
    raw: Vec<String>,
    features: Vec<Vec<Feature>>,
}

impl FeatureSplit {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The lower cased content characters, in order.
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// The content characters as they were written, in order.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// The features attached to the content character at position `i`.
    pub fn features_at(&self, i: usize) -> &[Feature] {
        &self.features[i]
    }

    pub fn features(&self) -> &[Vec<Feature>] {
        &self.features
    }

    /// Rejoins a range of positions back into text: each content character as written,
    /// followed by its marker characters. `Feature::Caps` is an attribute of the character
    /// itself and contributes nothing. The range is clamped to the document bounds.
    pub fn rejoin(&self, start: usize, end: usize) -> String {
        let start = start.min(self.len());
        let end = end.min(self.len());
        (start..end)
            .map(|i| {
                let markers: String = self.features[i]
                    .iter()
                    .filter_map(|f| match f {
                        Feature::Char(c) => Some(*c),
                        Feature::Caps => None,
                    })
                    .collect();
                format!("{}{}", self.raw[i], markers)
            })
            .join("")
    }
}

/// Walks the raw reference and hypothesis streams in lock step, yielding one
/// `AlignedPosition` per content character. Errors on the first content mismatch and stops
/// when either stream runs out. `ignore` drains asymmetrically: ignorable characters from
/// the hypothesis are recorded on the next position, ignorable characters from the
/// reference are discarded.
pub fn align_streams<'a>(
    reference: &'a str,
    hypothesis: &'a str,
    features: &'a FeatureSet,
    ignore: &'a [Feature],
) -> impl Iterator<Item = Result<AlignedPosition, StreamMismatchError>> + 'a {
    InterleavedAligner::new(reference, hypothesis, features, ignore)
}

/// Splits a document into `(content, features)` pairs. The next cluster is always consumed
/// as a content character, then every immediately following cluster that is a configured
/// marker is attached to it, so stacked trailing punctuation (`."`) lands on one position.
/// Fails if the very first cluster is a configured marker.
pub fn split_features(
    doc: &str,
    features: &FeatureSet,
) -> Result<FeatureSplit, LeadingFeatureCharError> {
    let clusters = grapheme_clusters(doc);
    if let Some(first) = clusters.first() {
        if features.contains_cluster(first) {
            return Err(LeadingFeatureCharError {
                cluster: (*first).to_owned(),
            });
        }
    }
    let mut content = Vec::new();
    let mut raw = Vec::new();
    let mut feature_lists = Vec::new();
    let mut cursor = 0;
    while cursor < clusters.len() {
        let next_char = clusters[cursor];
        cursor += 1;
        let mut present = Vec::new();
        if features.has_caps() && is_upper_cluster(next_char) {
            present.push(Feature::Caps);
        }
        while cursor < clusters.len() && features.contains_cluster(clusters[cursor]) {
            // The cluster is a marker, so it is a single char.
            let marker = clusters[cursor].chars().next().unwrap();
            present.push(Feature::Char(marker));
            cursor += 1;
        }
        content.push(next_char.to_lowercase());
        raw.push(next_char.to_owned());
        feature_lists.push(present);
    }
    Ok(FeatureSplit {
        content,
        raw,
        features: feature_lists,
    })
}

/// Document-level alignment check: the two splits must agree on their content character
/// sequences. On disagreement, reports the symmetric difference of the character sets.
pub(crate) fn check_content(
    reference: &FeatureSplit,
    hypothesis: &FeatureSplit,
    doc_idx: usize,
) -> Result<(), MismatchedContentError> {
    if reference.content == hypothesis.content {
        return Ok(());
    }
    let ref_set: AHashSet<&str> = reference.content.iter().map(String::as_str).collect();
    let hyp_set: AHashSet<&str> = hypothesis.content.iter().map(String::as_str).collect();
    let differing: BTreeSet<String> = ref_set
        .symmetric_difference(&hyp_set)
        .map(|s| (*s).to_owned())
        .collect();
    Err(MismatchedContentError { doc_idx, differing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn test_split_simple_sentence() {
        let features = FeatureSet::new(true, "., ");
        let split = split_features("This is a sentence.", &features).unwrap();
        let expected_content = vec![
            "t", "h", "i", "s", "i", "s", "a", "s", "e", "n", "t", "e", "n", "c", "e",
        ];
        assert_eq!(split.content(), &expected_content);
        assert_eq!(split.features_at(0), &[Feature::Caps]);
        assert_eq!(split.features_at(3), &[Feature::Char(' ')]);
        assert_eq!(
            split.features_at(14),
            &[Feature::Char('.')],
            "final period attaches to the last content character"
        );
    }

    #[test]
    fn test_split_stacks_trailing_markers() {
        let features = FeatureSet::new(false, ".,");
        let split = split_features("end.,.", &features).unwrap();
        assert_eq!(split.len(), 3);
        assert_eq!(
            split.features_at(2),
            &[
                Feature::Char('.'),
                Feature::Char(','),
                Feature::Char('.')
            ]
        );
    }

    #[test]
    fn test_split_caps_on_upper_content() {
        let features = FeatureSet::new(true, " ");
        let split = split_features("It IS", &features).unwrap();
        assert_eq!(
            split.features(),
            &[
                vec![Feature::Caps],
                vec![Feature::Char(' ')],
                vec![Feature::Caps],
                vec![Feature::Caps],
            ]
        );
        assert_eq!(split.raw(), &["I", "t", "I", "S"]);
        assert_eq!(split.content(), &["i", "t", "i", "s"]);
    }

    #[test]
    fn test_split_without_caps_feature_ignores_case() {
        let features = FeatureSet::new(false, " ");
        let split = split_features("It IS", &features).unwrap();
        assert!(split.features().iter().all(|fs| !fs.contains(&Feature::Caps)));
        // Content is still lower cased so the comparison stays case-insensitive.
        assert_eq!(split.content(), &["i", "t", "i", "s"]);
    }

    #[test]
    fn test_split_leading_feature_char_errors() {
        let features = FeatureSet::new(true, "., ");
        let err = split_features(" leading space", &features).unwrap_err();
        assert_eq!(
            err,
            LeadingFeatureCharError {
                cluster: String::from(" ")
            }
        );
    }

    #[test]
    fn test_split_empty_document() {
        let features = FeatureSet::new(true, "., ");
        let split = split_features("", &features).unwrap();
        assert!(split.is_empty());
    }

    #[test]
    fn test_split_combining_mark_is_one_cluster() {
        let features = FeatureSet::new(true, ". ");
        // "Cafe" with a combining acute accent on the e, followed by a period.
        let split = split_features("Cafe\u{0301}.", &features).unwrap();
        assert_eq!(split.len(), 4);
        assert_eq!(split.content()[3], "e\u{0301}");
        assert_eq!(split.features_at(3), &[Feature::Char('.')]);
    }

    #[test]
    fn test_is_upper_cluster() {
        assert!(is_upper_cluster("A"));
        assert!(is_upper_cluster("E\u{0301}"));
        assert!(!is_upper_cluster("a"));
        assert!(!is_upper_cluster("3"));
        assert!(!is_upper_cluster("."));
    }

    #[test]
    fn test_check_content_reports_symmetric_difference() {
        let features = FeatureSet::new(true, " ");
        let reference = split_features("abc", &features).unwrap();
        let hypothesis = split_features("abd", &features).unwrap();
        let err = check_content(&reference, &hypothesis, 7).unwrap_err();
        assert_eq!(err.doc_idx, 7);
        let expected: BTreeSet<String> =
            BTreeSet::from_iter([String::from("c"), String::from("d")]);
        assert_eq!(err.differing, expected);
    }

    #[test]
    fn test_check_content_is_case_insensitive() {
        let features = FeatureSet::new(true, " ");
        let reference = split_features("This IS", &features).unwrap();
        let hypothesis = split_features("this is", &features).unwrap();
        assert!(check_content(&reference, &hypothesis, 0).is_ok());
    }

    #[test]
    fn test_propertie_rejoin_round_trip() {
        fn rejoin_reconstructs_the_document(doc: String) -> TestResult {
            let features = FeatureSet::new(true, "., ");
            let split = match split_features(&doc, &features) {
                Ok(s) => s,
                Err(_) => return TestResult::discard(),
            };
            let rejoined = split.rejoin(0, split.len());
            if rejoined == doc {
                TestResult::passed()
            } else {
                TestResult::failed()
            }
        }
        let mut qc = QuickCheck::new().tests(2000);
        qc.quickcheck(rejoin_reconstructs_the_document as fn(String) -> TestResult)
    }
}
