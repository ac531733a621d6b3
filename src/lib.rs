/*!
This library evaluates feature restoration models: models that re-insert stripped textual
features, such as capitalization, spacing and punctuation, into raw text. It compares a
reference corpus against a hypothesis corpus at the character level and reports precision,
recall and F-score per feature, word error rates, and highlighted diff-style renderings of
the restored text.

# Features
A feature is either:
* the capitalization of a content character, or
* a single marker character (such as `' '`, `'.'` or `','`) attached to the content
    character immediately preceding it.

Multiple marker characters stack on one content character, so a hypothesis ending in `".."`
where the reference ends in `"."` counts a single restored period, not an error. Documents
are walked at the grapheme-cluster level, so a base letter plus a combining mark is one
content character.

# Terminology
* The *reference* is the fully featured ground-truth text.
* The *hypothesis* is the model output being assessed, which may be missing features or
    have invented ones.
* A corpus is an ordered list of documents; reference and hypothesis corpora pair up by
    index and must have the same length.
* A *content character* is a character that remains once the features are stripped.
    Reference and hypothesis must agree on their content characters: a document where they
    do not is reported and skipped, never silently miscounted.

# Example
```rust
use rufre::{evaluate, EvalConfigBuilder};

let reference = vec!["This is a sentence."];
let hypothesis = vec!["This is a sentence."];
let config = EvalConfigBuilder::default().feature_chars("., ").build();

let reporter = evaluate(reference, hypothesis, config).unwrap();
let expected_report = "Feature, Precision, Recall, F-score
Capitalization, 1, 1, 1
Periods ('.'), 1, 1, 1
Commas (','), N/A, N/A, N/A
Spaces (' '), 1, 1, 1
All features, 1, 1, 1\n";

assert_eq!(expected_report, reporter.to_string());
```
*/

use std::error::Error;
use std::fmt::Display;

mod align;
mod config;
mod display;
mod evaluator;
mod matrix;
mod metrics;
mod reporter;
mod wer;

// The public api starts here
pub use align::{
    align_streams, split_features, AlignedPosition, Feature, FeatureChars, FeatureSet,
    FeatureSplit, LeadingFeatureCharError, MismatchedContentError, StreamMismatchError,
};

pub use config::{DefaultEvalConfig, EvalConfig, EvalConfigBuilder};

pub use display::{FeatureErrorRecord, RowLayoutError, TextDisplayOptions};

pub use evaluator::{
    CorpusLengthError, DocIndexError, Evaluator, IntoDocuments, Scope, SnapshotError,
};

pub use matrix::{ConfusionMatrix, FeatureMatrices, FeatureOutcome};

pub use metrics::{Metric, PrfScores};

pub use reporter::{FeatureMetrics, OutputTarget, Reporter};

pub use wer::WerRecord;

/// Enum error encompassing every type of failure that can happen while evaluating a corpus.
#[derive(Debug)]
pub enum EvalError {
    /// A document starts with a configured feature character.
    LeadingFeatureChar(LeadingFeatureCharError),
    /// Reference and hypothesis disagree on their content characters (document-level mode).
    MismatchedContent(MismatchedContentError),
    /// Reference and hypothesis disagree on a content character mid-render.
    StreamMismatch(StreamMismatchError),
    /// Reference and hypothesis corpora have different lengths.
    InconsistentLength(CorpusLengthError),
    /// An empty corpus was given.
    EmptyInput(String),
    /// A document index outside of the corpus.
    DocIndex(DocIndexError),
    /// Exactly one of the two row layout options was given.
    RowLayout(RowLayoutError),
    /// A snapshot could not be written or read back.
    Snapshot(SnapshotError),
}

impl Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeadingFeatureChar(err) => Display::fmt(err, f),
            Self::MismatchedContent(err) => Display::fmt(err, f),
            Self::StreamMismatch(err) => Display::fmt(err, f),
            Self::InconsistentLength(err) => Display::fmt(err, f),
            Self::EmptyInput(which) => write!(f, "Received an empty input {}", which),
            Self::DocIndex(err) => Display::fmt(err, f),
            Self::RowLayout(err) => Display::fmt(err, f),
            Self::Snapshot(err) => Display::fmt(err, f),
        }
    }
}
impl Error for EvalError {}

impl From<LeadingFeatureCharError> for EvalError {
    fn from(value: LeadingFeatureCharError) -> Self {
        Self::LeadingFeatureChar(value)
    }
}
impl From<MismatchedContentError> for EvalError {
    fn from(value: MismatchedContentError) -> Self {
        Self::MismatchedContent(value)
    }
}
impl From<StreamMismatchError> for EvalError {
    fn from(value: StreamMismatchError) -> Self {
        Self::StreamMismatch(value)
    }
}
impl From<CorpusLengthError> for EvalError {
    fn from(value: CorpusLengthError) -> Self {
        Self::InconsistentLength(value)
    }
}
impl From<DocIndexError> for EvalError {
    fn from(value: DocIndexError) -> Self {
        Self::DocIndex(value)
    }
}
impl From<RowLayoutError> for EvalError {
    fn from(value: RowLayoutError) -> Self {
        Self::RowLayout(value)
    }
}
impl From<SnapshotError> for EvalError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Main entrypoint of the Rufre library. This function builds an `Evaluator` over the two
/// corpora and returns the corpus-level report: the precision, recall and F-score of every
/// configured feature, plus the aggregate over all of them. Documents whose content
/// characters do not match are reported through the log and excluded. Keep an `Evaluator`
/// around instead when you also need per-document results, word error rates or highlighted
/// renderings.
///
/// * `reference`: The ground-truth corpus.
/// * `hypothesis`: The restored corpus to assess.
/// * `config`: Parameters used to compute the metrics of each feature.
pub fn evaluate<R, H, C>(
    reference: R,
    hypothesis: H,
    config: EvalConfig<C>,
) -> Result<Reporter, EvalError>
where
    R: IntoDocuments,
    H: IntoDocuments,
    C: FeatureChars,
{
    let mut evaluator = Evaluator::new(reference, hypothesis, config)?;
    evaluator.corpus_scores()
}
