/**
This module gives a few tools to prettyprint the evaluation results: the per-feature
precision/recall/F-score report and the confusion matrix tables.
*/
use crate::align::Feature;
use crate::matrix::FeatureMatrices;
use crate::metrics::PrfScores;
use enum_iterator::Sequence;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Where rendered output is headed. The target only changes the markup syntax, never what
/// gets classified or reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum OutputTarget {
    /// Terminal output. Highlights use ANSI background colours.
    Plain,
    /// HTML with `fp`/`fn` span classes.
    Html,
    /// LaTeX with `\fp{}`/`\fn{}` macros.
    Latex,
}

/// Human readable name of a feature, as used in table headers.
pub(crate) fn display_name(feature: Feature, target: OutputTarget) -> String {
    match (feature, target) {
        (Feature::Caps, OutputTarget::Latex) => String::from("'CAPS'"),
        (Feature::Caps, _) => String::from("Capitalization"),
        (Feature::Char(' '), OutputTarget::Latex) => String::from("Spaces ('{\\ }')"),
        (Feature::Char(' '), _) => String::from("Spaces (' ')"),
        (Feature::Char(','), _) => String::from("Commas (',')"),
        (Feature::Char('.'), _) => String::from("Periods ('.')"),
        (Feature::Char(c), _) => format!("'{}'", c),
    }
}

const ALL_FEATURES_NAME: &str = "All features";
const ALL_FEATURES_NAME_LATEX: &str = "All";

/// The metrics of a single feature. Acts as the line of a dataframe when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetrics {
    pub feature: Feature,
    pub scores: PrfScores,
}

impl Display for FeatureMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}",
            display_name(self.feature, OutputTarget::Plain),
            self.scores
        )
    }
}

/// The reporter holds the precision, recall and F-score of every configured feature, plus
/// the scores of the summed `all` matrix as a separate field. It can be prettyprinted as if
/// the results were collected into a dataframe, or rendered for HTML or LaTeX.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reporter {
    pub(crate) per_feature: Vec<FeatureMetrics>,
    pub(crate) overall: PrfScores,
}

impl Reporter {
    pub(crate) fn from_matrices(matrices: &FeatureMatrices) -> Self {
        let per_feature = matrices
            .iter()
            .map(|(feature, cm)| FeatureMetrics {
                feature,
                scores: PrfScores::from_matrix(cm),
            })
            .collect();
        Self {
            per_feature,
            overall: PrfScores::from_matrix(matrices.all()),
        }
    }

    /// The scores of a single feature, if it was configured.
    pub fn get(&self, feature: Feature) -> Option<&PrfScores> {
        self.per_feature
            .iter()
            .find(|m| m.feature == feature)
            .map(|m| &m.scores)
    }

    /// The scores of the summed `all` matrix.
    pub fn overall(&self) -> &PrfScores {
        &self.overall
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureMetrics> {
        self.per_feature.iter()
    }

    pub fn render(&self, target: OutputTarget) -> String {
        match target {
            OutputTarget::Plain => self.to_string(),
            OutputTarget::Html => self.render_html(),
            OutputTarget::Latex => self.render_latex(),
        }
    }

    fn render_latex(&self) -> String {
        let mut out = String::from("\\hline\n& \\head{Precision} & \\head{Recall} & \\head{F-score}\n\\hline\n");
        for metrics in self.per_feature.iter() {
            out.push_str(&format!(
                "{} & {} & {} & {}\n",
                display_name(metrics.feature, OutputTarget::Latex),
                metrics.scores.precision.fixed(),
                metrics.scores.recall.fixed(),
                metrics.scores.fscore.fixed(),
            ));
        }
        out.push_str(&format!(
            "{} & {} & {} & {}\n",
            ALL_FEATURES_NAME_LATEX,
            self.overall.precision.fixed(),
            self.overall.recall.fixed(),
            self.overall.fscore.fixed(),
        ));
        out
    }

    fn render_html(&self) -> String {
        let header = "<tr><th>Feature</th><th>Precision</th><th>Recall</th><th>F-score</th></tr>";
        let rows = self
            .per_feature
            .iter()
            .map(|m| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    display_name(m.feature, OutputTarget::Html),
                    m.scores.precision,
                    m.scores.recall,
                    m.scores.fscore
                )
            })
            .join("");
        format!(
            "<table>{}{}<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></table>",
            header,
            rows,
            ALL_FEATURES_NAME,
            self.overall.precision,
            self.overall.recall,
            self.overall.fscore
        )
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Feature, Precision, Recall, F-score")?;
        for metrics in self.per_feature.iter() {
            writeln!(f, "{}", metrics)?;
        }
        writeln!(f, "{}, {}", ALL_FEATURES_NAME, self.overall)
    }
}

/// Renders the confusion matrix tables, one per feature plus the `all` aggregate, in the
/// manner they would print from a dataframe. `features_to_show` restricts the output to the
/// listed features.
pub(crate) fn cm_tables(matrices: &FeatureMatrices, features_to_show: Option<&[Feature]>) -> String {
    let mut out = String::new();
    for (feature, cm) in matrices.iter() {
        if let Some(wanted) = features_to_show {
            if !wanted.contains(&feature) {
                continue;
            }
        }
        let name = display_name(feature, OutputTarget::Plain);
        out.push_str(&name);
        out.push('\n');
        out.push_str(&"=".repeat(name.len()));
        out.push_str("\n\n");
        out.push_str(&cm.to_string());
        out.push_str("\n\n");
    }
    if features_to_show.is_none() {
        out.push_str(ALL_FEATURES_NAME);
        out.push('\n');
        out.push_str(&"=".repeat(ALL_FEATURES_NAME.len()));
        out.push_str("\n\n");
        out.push_str(&matrices.all().to_string());
        out.push_str("\n\n");
    }
    out
}
