/**
This module renders a hypothesis document with its restoration errors highlighted, and
lists the errors of a single feature with some context around each one.

The rendered text is always the hypothesis side, so the display shows what the model
actually produced. False positives and false negatives are wrapped in target-specific
markup, true positives and ignored characters pass through unmarked, and true negatives
produce no output at all.
*/
use crate::align::{
    check_content, split_features, Feature, FeatureSet, InterleavedAligner,
};
use crate::matrix::FeatureOutcome;
use crate::reporter::OutputTarget;
use crate::EvalError;
use itertools::Itertools;
use std::error::Error;
use std::fmt::Display;

const HTML_STYLE: &str = "<style>
.fp{
    background-color: green
}
.fn{
    background-color: purple
}
pre {
  white-space: pre-wrap;
}
</style>";

const ANSI_FP: &str = "\u{1b}[42m";
const ANSI_FN: &str = "\u{1b}[45m";
const ANSI_RESET: &str = "\u{1b}[0m";

/// Error raised when exactly one of `chars_per_row` and `num_rows` is given. Defaulting the
/// other would silently change the layout, so this surfaces instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayoutError;

impl Display for RowLayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Either none or both of chars_per_row and num_rows must be specified"
        )
    }
}
impl Error for RowLayoutError {}

/// Options of a text display request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDisplayOptions {
    /// First annotated cell to display. Defaults to the beginning.
    pub start_char: Option<usize>,
    /// Number of annotated cells per row. Requires `num_rows`.
    pub chars_per_row: Option<usize>,
    /// Number of rows to display. Requires `chars_per_row`.
    pub num_rows: Option<usize>,
    /// Features whose divergences are not highlighted. Ignored marker characters are still
    /// rendered, as plain text.
    pub ignore: Vec<Feature>,
    pub target: OutputTarget,
}

impl Default for TextDisplayOptions {
    fn default() -> Self {
        Self {
            start_char: None,
            chars_per_row: None,
            num_rows: None,
            ignore: Vec::new(),
            target: OutputTarget::Plain,
        }
    }
}

fn mark(target: OutputTarget, outcome: FeatureOutcome, inner: &str) -> String {
    match target {
        OutputTarget::Plain => {
            let colour = match outcome {
                FeatureOutcome::FalsePositive => ANSI_FP,
                _ => ANSI_FN,
            };
            format!("{}{}{}", colour, inner, ANSI_RESET)
        }
        OutputTarget::Html => format!("<span class=\"{}\">{}</span>", outcome, inner),
        OutputTarget::Latex => format!("\\{}{{{}}}", outcome, inner),
    }
}

/// Marker characters are boxed in LaTeX so the highlight has a visible extent.
fn boxed(target: OutputTarget, c: char) -> String {
    match target {
        OutputTarget::Latex => format!("\\mbox{{{}}}", c),
        _ => c.to_string(),
    }
}

/// Renders the annotated hypothesis document. Fails on the first content mismatch between
/// the two streams; there is no partial rendering.
pub(crate) fn text_display(
    reference: &str,
    hypothesis: &str,
    features: &FeatureSet,
    opts: &TextDisplayOptions,
) -> Result<String, EvalError> {
    let ignore_caps = opts.ignore.contains(&Feature::Caps);
    let mut entries = Vec::new();
    for position in InterleavedAligner::new(reference, hypothesis, features, &opts.ignore) {
        let position = position?;
        if features.has_caps() {
            let outcome =
                FeatureOutcome::classify(position.in_ref(Feature::Caps), position.in_hyp(Feature::Caps));
            if !outcome.is_error() || ignore_caps {
                entries.push(position.hyp_char.clone());
            } else {
                entries.push(mark(opts.target, outcome, &position.hyp_char));
            }
        } else {
            entries.push(position.hyp_char.clone());
        }
        for c in features.feature_chars() {
            let feature = Feature::Char(c);
            let outcome = FeatureOutcome::classify(position.in_ref(feature), position.in_hyp(feature));
            if outcome.is_error() {
                entries.push(mark(opts.target, outcome, &boxed(opts.target, c)));
            } else if outcome == FeatureOutcome::TruePositive || position.ignored_char(c) {
                entries.push(c.to_string());
            }
        }
    }
    let start = opts.start_char.unwrap_or(0).min(entries.len());
    let entries = &entries[start..];
    match (opts.chars_per_row, opts.num_rows) {
        (None, None) => Ok(assemble(entries, opts.target)),
        (Some(chars_per_row), Some(num_rows)) => {
            Ok(assemble_rows(entries, chars_per_row, num_rows, opts.target))
        }
        _ => Err(EvalError::from(RowLayoutError)),
    }
}

fn assemble(entries: &[String], target: OutputTarget) -> String {
    let joined = entries.iter().join("");
    match target {
        OutputTarget::Plain => joined,
        OutputTarget::Html => format!("{}<pre>{}</pre>", HTML_STYLE, joined),
        OutputTarget::Latex => format!("\\texttt{{{}}}\\\\", joined),
    }
}

fn assemble_rows(
    entries: &[String],
    chars_per_row: usize,
    num_rows: usize,
    target: OutputTarget,
) -> String {
    let rows = entries.chunks(chars_per_row.max(1)).take(num_rows);
    match target {
        OutputTarget::Plain => rows.map(|r| r.iter().join("")).join("\n"),
        OutputTarget::Html => {
            let body = rows.map(|r| r.iter().join("")).join("<br>");
            format!("{}<pre>{}</pre>", HTML_STYLE, body)
        }
        OutputTarget::Latex => rows
            .map(|r| format!("\\texttt{{{}}}\\\\", escape_spaces_row(r).iter().join("")))
            .join("\n"),
    }
}

/// LaTeX rows need their spaces protected: a space at either end of a row would be eaten by
/// the line break, the others just need to keep their width inside `\texttt`.
fn escape_spaces_row(row: &[String]) -> Vec<String> {
    let last = row.len().saturating_sub(1);
    row.iter()
        .enumerate()
        .map(|(i, entry)| {
            if entry == " " {
                if i == 0 || i == last {
                    String::from("\\Verb+{\\ }+")
                } else {
                    String::from("{\\ }")
                }
            } else {
                entry.clone()
            }
        })
        .collect()
}

/// One restoration error of a single feature, with the surrounding text rejoined from both
/// documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureErrorRecord {
    /// `FalsePositive` or `FalseNegative`.
    pub kind: FeatureOutcome,
    pub reference: String,
    pub hypothesis: String,
}

impl Display for FeatureErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: reference {:?}, hypothesis {:?}",
            self.kind, self.reference, self.hypothesis
        )
    }
}

/// Lists every false positive and false negative of `feature` in one document, with
/// `chars_either_side` content characters of context around each.
pub(crate) fn feature_errors(
    reference: &str,
    hypothesis: &str,
    features: &FeatureSet,
    feature: Feature,
    chars_either_side: usize,
    doc_idx: usize,
) -> Result<Vec<FeatureErrorRecord>, EvalError> {
    let ref_split = split_features(reference, features)?;
    let hyp_split = split_features(hypothesis, features)?;
    check_content(&ref_split, &hyp_split, doc_idx)?;
    let mut errors = Vec::new();
    for i in 0..ref_split.len() {
        let outcome = FeatureOutcome::classify(
            ref_split.features_at(i).contains(&feature),
            hyp_split.features_at(i).contains(&feature),
        );
        if outcome.is_error() {
            let start = i.saturating_sub(chars_either_side);
            let end = i + chars_either_side;
            errors.push(FeatureErrorRecord {
                kind: outcome,
                reference: ref_split.rejoin(start, end),
                hypothesis: hyp_split.rejoin(start, end),
            });
        }
    }
    Ok(errors)
}
