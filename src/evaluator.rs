/**
This module contains the `Evaluator`, the owner of a corpus of (reference, hypothesis)
document pairs. It computes confusion matrices, metrics and word error rates on demand and
memoizes them: one map from document index to result per kind of computation, plus a
separate field for the corpus-level aggregate. A document whose content characters do not
match between reference and hypothesis is recorded as `None`, reported through the log, and
excluded from the corpus aggregates; it never aborts the rest of the batch.
*/
use crate::align::{check_content, split_features, Feature, FeatureChars, FeatureSet};
use crate::config::EvalConfig;
use crate::display::{self, FeatureErrorRecord, TextDisplayOptions};
use crate::matrix::{build_matrices, FeatureMatrices};
use crate::reporter::{self, OutputTarget, Reporter};
use crate::wer::WerRecord;
use crate::EvalError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// This trait mimics the `Into` trait from the std lib for corpora. A corpus can be given
/// as a single document or as a list of documents; a single string becomes a one-document
/// corpus.
pub trait IntoDocuments {
    fn into_documents(self) -> Vec<String>;
}

impl IntoDocuments for String {
    fn into_documents(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoDocuments for &str {
    fn into_documents(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl IntoDocuments for Vec<String> {
    fn into_documents(self) -> Vec<String> {
        self
    }
}

impl IntoDocuments for Vec<&str> {
    fn into_documents(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl IntoDocuments for &[String] {
    fn into_documents(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoDocuments for &[&str] {
    fn into_documents(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_owned()).collect()
    }
}

/// What a table or report request covers: one document or the whole corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Document(usize),
    Corpus,
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Error type to represent when the reference and hypothesis corpora are not of the same
/// length.
pub struct CorpusLengthError(pub(crate) usize, pub(crate) usize);

impl Display for CorpusLengthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hypothesis and reference lists must have equal length. `reference` is length {}, \
             `hypothesis` is length {}",
            self.0, self.1
        )
    }
}
impl Error for CorpusLengthError {}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Error type for a document index outside of the corpus.
pub struct DocIndexError {
    pub index: usize,
    pub len: usize,
}

impl Display for DocIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "No document with index {} in a corpus of {} document(s)",
            self.index, self.len
        )
    }
}
impl Error for DocIndexError {}

#[derive(Debug)]
/// Error type for a snapshot that could not be written or read back.
pub enum SnapshotError {
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Snapshot IO failure: {}", err),
            Self::Serde(err) => write!(f, "Snapshot encoding failure: {}", err),
        }
    }
}
impl Error for SnapshotError {}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Owner of the evaluation corpus and of every memoized result. Documents and the feature
/// set are fixed at construction; results are computed on first request and cached by
/// document index, with the corpus aggregates held in their own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluator {
    reference: Vec<String>,
    hypothesis: Vec<String>,
    features: FeatureSet,
    matrices: AHashMap<usize, Option<FeatureMatrices>>,
    corpus_matrices: Option<FeatureMatrices>,
    wer_records: AHashMap<usize, WerRecord>,
    corpus_wer: Option<WerRecord>,
}

impl Evaluator {
    /// Builds an evaluator from a reference corpus, a hypothesis corpus and a configuration.
    /// The corpora must have the same number of documents and may not be empty.
    pub fn new<R, H, C>(
        reference: R,
        hypothesis: H,
        config: EvalConfig<C>,
    ) -> Result<Self, EvalError>
    where
        R: IntoDocuments,
        H: IntoDocuments,
        C: FeatureChars,
    {
        let reference = reference.into_documents();
        let hypothesis = hypothesis.into_documents();
        if reference.is_empty() {
            return Err(EvalError::EmptyInput(String::from("reference")));
        }
        if hypothesis.is_empty() {
            return Err(EvalError::EmptyInput(String::from("hypothesis")));
        }
        if reference.len() != hypothesis.len() {
            return Err(EvalError::InconsistentLength(CorpusLengthError(
                reference.len(),
                hypothesis.len(),
            )));
        }
        let (capitalization, feature_chars, eager_matrices, eager_wer) = config.into();
        let mut evaluator = Self {
            reference,
            hypothesis,
            features: FeatureSet::new(capitalization, feature_chars),
            matrices: AHashMap::new(),
            corpus_matrices: None,
            wer_records: AHashMap::new(),
            corpus_wer: None,
        };
        if eager_matrices {
            evaluator.corpus_matrices()?;
        }
        if eager_wer {
            evaluator.corpus_wer()?;
        }
        Ok(evaluator)
    }

    pub fn num_documents(&self) -> usize {
        self.reference.len()
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn check_doc_idx(&self, doc_idx: usize) -> Result<(), DocIndexError> {
        if doc_idx >= self.reference.len() {
            Err(DocIndexError {
                index: doc_idx,
                len: self.reference.len(),
            })
        } else {
            Ok(())
        }
    }

    // === CONFUSION MATRICES ===

    /// The confusion matrices of one document. `Ok(None)` is the recorded skip of a document
    /// whose content characters do not match.
    pub fn matrices(&mut self, doc_idx: usize) -> Result<Option<&FeatureMatrices>, EvalError> {
        self.check_doc_idx(doc_idx)?;
        if !self.matrices.contains_key(&doc_idx) {
            let computed = self.compute_matrices(doc_idx)?;
            self.matrices.insert(doc_idx, computed);
        }
        Ok(self.matrices.get(&doc_idx).and_then(Option::as_ref))
    }

    fn compute_matrices(&self, doc_idx: usize) -> Result<Option<FeatureMatrices>, EvalError> {
        let reference = self.reference[doc_idx].trim();
        let hypothesis = self.hypothesis[doc_idx].trim();
        let ref_split = split_features(reference, &self.features)?;
        let hyp_split = split_features(hypothesis, &self.features)?;
        match check_content(&ref_split, &hyp_split, doc_idx) {
            Ok(()) => Ok(Some(build_matrices(&ref_split, &hyp_split, &self.features))),
            Err(mismatch) => {
                log::warn!("{}", mismatch);
                Ok(None)
            }
        }
    }

    /// The corpus-level confusion matrices: the element-wise sum over every document whose
    /// content matched. Never recomputed by re-scanning text.
    pub fn corpus_matrices(&mut self) -> Result<&FeatureMatrices, EvalError> {
        if self.corpus_matrices.is_none() {
            let mut total = FeatureMatrices::zeros(&self.features);
            let mut skipped = 0usize;
            for doc_idx in 0..self.reference.len() {
                match self.matrices(doc_idx)? {
                    Some(matrices) => total.absorb(matrices),
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                log::warn!(
                    "{} document(s) with mismatched content excluded from the corpus aggregate",
                    skipped
                );
            }
            self.corpus_matrices = Some(total);
        }
        Ok(self
            .corpus_matrices
            .as_ref()
            .expect("corpus matrices were just computed"))
    }

    // === PRECISION, RECALL, AND F-SCORE ===

    pub fn scores(&mut self, doc_idx: usize) -> Result<Option<Reporter>, EvalError> {
        Ok(self.matrices(doc_idx)?.map(Reporter::from_matrices))
    }

    pub fn corpus_scores(&mut self) -> Result<Reporter, EvalError> {
        Ok(Reporter::from_matrices(self.corpus_matrices()?))
    }

    pub fn prf_table(
        &mut self,
        scope: Scope,
        target: OutputTarget,
    ) -> Result<Option<String>, EvalError> {
        match scope {
            Scope::Document(doc_idx) => Ok(self.scores(doc_idx)?.map(|r| r.render(target))),
            Scope::Corpus => Ok(Some(self.corpus_scores()?.render(target))),
        }
    }

    pub fn cm_tables(
        &mut self,
        scope: Scope,
        features_to_show: Option<&[Feature]>,
    ) -> Result<Option<String>, EvalError> {
        match scope {
            Scope::Document(doc_idx) => Ok(self
                .matrices(doc_idx)?
                .map(|m| reporter::cm_tables(m, features_to_show))),
            Scope::Corpus => {
                let matrices = self.corpus_matrices()?;
                Ok(Some(reporter::cm_tables(matrices, features_to_show)))
            }
        }
    }

    // === WORD ERROR RATE ===

    pub fn wer(&mut self, doc_idx: usize) -> Result<&WerRecord, EvalError> {
        self.check_doc_idx(doc_idx)?;
        if !self.wer_records.contains_key(&doc_idx) {
            let record = WerRecord::new(
                self.reference[doc_idx].trim(),
                self.hypothesis[doc_idx].trim(),
            );
            self.wer_records.insert(doc_idx, record);
        }
        Ok(self
            .wer_records
            .get(&doc_idx)
            .expect("record was just inserted"))
    }

    /// The corpus-level word error rate: total edits over total reference length.
    pub fn corpus_wer(&mut self) -> Result<&WerRecord, EvalError> {
        if self.corpus_wer.is_none() {
            for doc_idx in 0..self.reference.len() {
                self.wer(doc_idx)?;
            }
            let total = WerRecord::combine(self.wer_records.values());
            self.corpus_wer = Some(total);
        }
        Ok(self
            .corpus_wer
            .as_ref()
            .expect("corpus record was just computed"))
    }

    pub fn wer_table(&mut self, scope: Scope, target: OutputTarget) -> Result<String, EvalError> {
        match scope {
            Scope::Document(doc_idx) => Ok(self.wer(doc_idx)?.render(target)),
            Scope::Corpus => Ok(self.corpus_wer()?.render(target)),
        }
    }

    // === TEXT DISPLAY ===

    /// Renders one hypothesis document with its restoration errors highlighted.
    pub fn text_display(
        &self,
        doc_idx: usize,
        opts: &TextDisplayOptions,
    ) -> Result<String, EvalError> {
        self.check_doc_idx(doc_idx)?;
        display::text_display(
            self.reference[doc_idx].trim(),
            self.hypothesis[doc_idx].trim(),
            &self.features,
            opts,
        )
    }

    /// Lists the errors of a single feature in one document, with some context either side.
    pub fn feature_errors(
        &self,
        doc_idx: usize,
        feature: Feature,
        chars_either_side: usize,
    ) -> Result<Vec<FeatureErrorRecord>, EvalError> {
        self.check_doc_idx(doc_idx)?;
        display::feature_errors(
            self.reference[doc_idx].trim(),
            self.hypothesis[doc_idx].trim(),
            &self.features,
            feature,
            chars_either_side,
            doc_idx,
        )
    }

    // === PERSISTENCE ===

    /// Serializes the full evaluator state, caches included. Snapshots are only expected to
    /// be read back by the same version that wrote them.
    pub fn to_snapshot<W: Write>(&self, writer: W) -> Result<(), EvalError> {
        serde_json::to_writer(writer, self).map_err(SnapshotError::from)?;
        Ok(())
    }

    pub fn from_snapshot<R: Read>(reader: R) -> Result<Self, EvalError> {
        let evaluator = serde_json::from_reader(reader).map_err(SnapshotError::from)?;
        Ok(evaluator)
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<(), EvalError> {
        let file = File::create(path).map_err(SnapshotError::from)?;
        self.to_snapshot(BufWriter::new(file))
    }

    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self, EvalError> {
        let file = File::open(path).map_err(SnapshotError::from)?;
        Self::from_snapshot(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfigBuilder;
    use crate::metrics::Metric;

    fn three_sentence_evaluator() -> Evaluator {
        let reference = vec![
            "This is a sentence.",
            "This is another sentence.",
            "This is Sentence 3",
        ];
        let hypothesis = vec![
            "This is a sentence...",
            "This IS another sentence.",
            "Thisis Senten ce 3",
        ];
        let config = EvalConfigBuilder::default().feature_chars("., ").build();
        Evaluator::new(reference, hypothesis, config).unwrap()
    }

    #[test]
    fn test_single_string_becomes_one_document() {
        let config = EvalConfigBuilder::default().build();
        let mut evaluator =
            Evaluator::new("This is a sentence.", "this is a sentence.", config).unwrap();
        assert_eq!(evaluator.num_documents(), 1);
        assert!(evaluator.matrices(0).unwrap().is_some());
    }

    #[test]
    fn test_unequal_corpora_fail_at_construction() {
        let config = EvalConfigBuilder::default().build();
        let result = Evaluator::new(vec!["a", "b"], vec!["a"], config);
        assert!(matches!(
            result,
            Err(EvalError::InconsistentLength(CorpusLengthError(2, 1)))
        ));
    }

    #[test]
    fn test_empty_corpus_fails_at_construction() {
        let config = EvalConfigBuilder::default().build();
        let result = Evaluator::new(Vec::<String>::new(), Vec::<String>::new(), config);
        assert!(
            matches!(result, Err(EvalError::EmptyInput(ref which)) if which == "reference")
        );
    }

    #[test]
    fn test_doc_index_out_of_range() {
        let mut evaluator = three_sentence_evaluator();
        let result = evaluator.matrices(3);
        assert!(matches!(
            result,
            Err(EvalError::DocIndex(DocIndexError { index: 3, len: 3 }))
        ));
    }

    #[test]
    fn test_extra_periods_absorbed_by_stacking() {
        let mut evaluator = three_sentence_evaluator();
        let reporter = evaluator.scores(0).unwrap().unwrap();
        let periods = reporter.get(Feature::Char('.')).unwrap();
        assert_eq!(periods.precision, Metric::Value(1.0));
        assert_eq!(periods.recall, Metric::Value(1.0));
        assert_eq!(periods.fscore, Metric::Value(1.0));
    }

    #[test]
    fn test_feature_absent_from_reference_is_not_applicable() {
        let mut evaluator = three_sentence_evaluator();
        let reporter = evaluator.scores(0).unwrap().unwrap();
        let commas = reporter.get(Feature::Char(',')).unwrap();
        assert_eq!(commas.precision, Metric::NotApplicable);
        assert_eq!(commas.recall, Metric::NotApplicable);
        assert_eq!(commas.fscore, Metric::NotApplicable);
    }

    #[test]
    fn test_corpus_matrices_are_the_sum_of_documents() {
        let mut evaluator = three_sentence_evaluator();
        let mut expected = FeatureMatrices::zeros(evaluator.features());
        for doc_idx in 0..evaluator.num_documents() {
            let matrices = evaluator.matrices(doc_idx).unwrap().unwrap().clone();
            expected.absorb(&matrices);
        }
        assert_eq!(evaluator.corpus_matrices().unwrap(), &expected);
    }

    #[test]
    fn test_mismatched_document_is_skipped_not_fatal() {
        let reference = vec!["This is a sentence.", "A dropped letter here"];
        let hypothesis = vec!["This is a sentence.", "A droppd letter here"];
        let config = EvalConfigBuilder::default().build();
        let mut evaluator = Evaluator::new(reference, hypothesis, config).unwrap();
        assert!(evaluator.matrices(1).unwrap().is_none());
        assert!(evaluator.scores(1).unwrap().is_none());
        // The corpus aggregate only carries the document that aligned.
        let good = evaluator.matrices(0).unwrap().unwrap().clone();
        let corpus = evaluator.corpus_matrices().unwrap();
        assert_eq!(corpus, &good);
    }

    #[test]
    fn test_leading_feature_char_propagates() {
        let config = EvalConfigBuilder::default().build();
        let mut evaluator = Evaluator::new(vec![" padded"], vec![" padded"], config).unwrap();
        // The documents are trimmed before splitting, so build one that keeps its marker.
        evaluator.reference[0] = String::from(".leading");
        evaluator.hypothesis[0] = String::from(".leading");
        let result = evaluator.matrices(0);
        assert!(matches!(result, Err(EvalError::LeadingFeatureChar(_))));
    }

    #[test]
    fn test_wer_caching_and_corpus_totals() {
        let mut evaluator = three_sentence_evaluator();
        let first = *evaluator.wer(2).unwrap();
        assert_eq!(first.len_ref, 4);
        assert_eq!(first.num_edits, 3);
        let again = *evaluator.wer(2).unwrap();
        assert_eq!(first, again);
        let corpus = *evaluator.corpus_wer().unwrap();
        // 4 + 4 + 4 reference words; one substitution in each of the first two documents
        // ("sentence..." and "IS" both differ word-wise) and three edits in the third.
        assert_eq!(corpus.len_ref, 12);
        assert_eq!(corpus.num_edits, 5);
    }

    #[test]
    fn test_eager_flags_fill_the_caches() {
        let reference = vec!["This is a sentence."];
        let hypothesis = vec!["this is a sentence."];
        let config = EvalConfigBuilder::default()
            .eager_matrices(true)
            .eager_wer(true)
            .build();
        let evaluator = Evaluator::new(reference, hypothesis, config).unwrap();
        assert!(evaluator.corpus_matrices.is_some());
        assert!(evaluator.corpus_wer.is_some());
        assert_eq!(evaluator.matrices.len(), 1);
        assert_eq!(evaluator.wer_records.len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut evaluator = three_sentence_evaluator();
        evaluator.corpus_scores().unwrap();
        evaluator.corpus_wer().unwrap();
        let mut blob = Vec::new();
        evaluator.to_snapshot(&mut blob).unwrap();
        let restored = Evaluator::from_snapshot(blob.as_slice()).unwrap();
        assert_eq!(evaluator, restored);
    }

    #[test]
    fn test_tables_by_scope() {
        let mut evaluator = three_sentence_evaluator();
        let prf = evaluator
            .prf_table(Scope::Corpus, OutputTarget::Plain)
            .unwrap()
            .unwrap();
        assert!(prf.starts_with("Feature, Precision, Recall, F-score"));
        let cm = evaluator
            .cm_tables(Scope::Document(0), Some(&[Feature::Char('.')]))
            .unwrap()
            .unwrap();
        assert!(cm.contains("Periods ('.')"));
        let wer = evaluator
            .wer_table(Scope::Document(2), OutputTarget::Plain)
            .unwrap();
        assert!(wer.contains("Word error rate"));
    }
}
