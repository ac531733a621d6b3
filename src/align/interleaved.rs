/**
Interleaved alignment of the raw reference and hypothesis character streams. Unlike the
document-level splitter, this walker keeps the original casing and the original marker
characters, because the text renderer re-emits them. It also honours a per-render ignore
list that consumes characters asymmetrically: ignorable characters drained from the
hypothesis stream are recorded (they are still rendered, unmarked), while ignorable
characters drained from the reference stream are discarded outright.
*/
use crate::align::features::{cluster_is_one_of, Feature, FeatureSet};
use crate::align::{grapheme_clusters, is_upper_cluster};
use itertools::Itertools;
use std::error::Error;
use std::fmt::Display;

/// Error raised when the two streams disagree on a content character mid-walk. There is no
/// meaningful partial rendering, so this aborts the whole display request. The contexts
/// carry the offending character plus the next few characters of each stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMismatchError {
    pub ref_context: String,
    pub hyp_context: String,
}

impl Display for StreamMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Different characters found between reference and hypothesis strings \
             (Reference: {:?}; Hypothesis: {:?})",
            self.ref_context, self.hyp_context
        )
    }
}
impl Error for StreamMismatchError {}

/// One aligned position of the interleaved walk: the content character from each side as
/// written, the features present on each side, and the ignorable characters drained from the
/// hypothesis stream right before this position was compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPosition {
    pub ref_char: String,
    pub hyp_char: String,
    pub ref_features: Vec<Feature>,
    pub hyp_features: Vec<Feature>,
    pub ignored: Vec<char>,
}

impl AlignedPosition {
    pub fn in_ref(&self, feature: Feature) -> bool {
        self.ref_features.contains(&feature)
    }

    pub fn in_hyp(&self, feature: Feature) -> bool {
        self.hyp_features.contains(&feature)
    }

    pub fn ignored_char(&self, c: char) -> bool {
        self.ignored.contains(&c)
    }
}

/// Walks the two raw character streams in lock step, one content character at a time. Each
/// stream is an immutable cluster sequence with its own monotonically advancing cursor.
/// Iteration ends when either stream is exhausted, or with an error on the first content
/// mismatch.
pub(crate) struct InterleavedAligner<'a> {
    ref_chars: Vec<&'a str>,
    hyp_chars: Vec<&'a str>,
    ref_cursor: usize,
    hyp_cursor: usize,
    features: &'a FeatureSet,
    ignore: &'a [Feature],
    failed: bool,
}

impl<'a> InterleavedAligner<'a> {
    pub(crate) fn new(
        reference: &'a str,
        hypothesis: &'a str,
        features: &'a FeatureSet,
        ignore: &'a [Feature],
    ) -> Self {
        Self {
            ref_chars: grapheme_clusters(reference),
            hyp_chars: grapheme_clusters(hypothesis),
            ref_cursor: 0,
            hyp_cursor: 0,
            features,
            ignore,
            failed: false,
        }
    }

    /// Drains leading ignorable characters from both streams. Hypothesis-side drains are
    /// recorded, reference-side drains are not.
    fn drain_ignored(&mut self) -> Vec<char> {
        let mut ignored = Vec::new();
        while self.hyp_cursor < self.hyp_chars.len()
            && cluster_is_one_of(self.ignore, self.hyp_chars[self.hyp_cursor])
        {
            // An ignorable cluster is a single char.
            ignored.push(self.hyp_chars[self.hyp_cursor].chars().next().unwrap());
            self.hyp_cursor += 1;
        }
        while self.ref_cursor < self.ref_chars.len()
            && cluster_is_one_of(self.ignore, self.ref_chars[self.ref_cursor])
        {
            self.ref_cursor += 1;
        }
        ignored
    }

    /// Greedily collects the features present after a content character: the capitalization
    /// of the character itself, then every immediately following configured marker.
    fn drain_features(clusters: &[&str], cursor: &mut usize, content: &str, features: &FeatureSet) -> Vec<Feature> {
        let mut present = Vec::new();
        if features.has_caps() && is_upper_cluster(content) {
            present.push(Feature::Caps);
        }
        while *cursor < clusters.len() && features.contains_cluster(clusters[*cursor]) {
            let marker = clusters[*cursor].chars().next().unwrap();
            present.push(Feature::Char(marker));
            *cursor += 1;
        }
        present
    }

    fn context(clusters: &[&str], popped: &str, cursor: usize) -> String {
        let tail = clusters[cursor..clusters.len().min(cursor + 10)].iter().join("");
        format!("{}{}", popped, tail)
    }
}

impl<'a> Iterator for InterleavedAligner<'a> {
    type Item = Result<AlignedPosition, StreamMismatchError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed
            || self.ref_cursor >= self.ref_chars.len()
            || self.hyp_cursor >= self.hyp_chars.len()
        {
            return None;
        }
        let ref_char = self.ref_chars[self.ref_cursor];
        self.ref_cursor += 1;
        let hyp_char = self.hyp_chars[self.hyp_cursor];
        self.hyp_cursor += 1;
        let ignored = self.drain_ignored();
        if ref_char.to_lowercase() != hyp_char.to_lowercase() {
            self.failed = true;
            return Some(Err(StreamMismatchError {
                ref_context: Self::context(&self.ref_chars, ref_char, self.ref_cursor),
                hyp_context: Self::context(&self.hyp_chars, hyp_char, self.hyp_cursor),
            }));
        }
        let ref_features =
            Self::drain_features(&self.ref_chars, &mut self.ref_cursor, ref_char, self.features);
        let hyp_features =
            Self::drain_features(&self.hyp_chars, &mut self.hyp_cursor, hyp_char, self.features);
        Some(Ok(AlignedPosition {
            ref_char: ref_char.to_owned(),
            hyp_char: hyp_char.to_owned(),
            ref_features,
            hyp_features,
            ignored,
        }))
    }
}
