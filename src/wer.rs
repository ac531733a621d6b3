/**
Word error rate. The reference and hypothesis are split on whitespace and the minimum
word-level edit count (substitutions + deletions + insertions) is computed with a two-row
Levenshtein recurrence. The rate is `edits / reference_word_count * 100`; an empty reference
makes it not applicable rather than a division by zero.
*/
use crate::metrics::Metric;
use crate::reporter::OutputTarget;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Word error rate record of one document, or of a whole corpus once summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WerRecord {
    /// Number of words in the reference.
    pub len_ref: usize,
    /// Minimum number of word-level edits to turn the hypothesis into the reference.
    pub num_edits: usize,
    /// `num_edits / len_ref * 100`.
    pub wer: Metric,
}

impl WerRecord {
    pub(crate) fn new(ref_doc: &str, hyp_doc: &str) -> Self {
        let ref_words: Vec<&str> = ref_doc.split_whitespace().collect();
        let hyp_words: Vec<&str> = hyp_doc.split_whitespace().collect();
        let num_edits = levenshtein_words(&ref_words, &hyp_words);
        let len_ref = ref_words.len();
        Self {
            len_ref,
            num_edits,
            wer: wer(num_edits, len_ref),
        }
    }

    /// Corpus record: total edits over total reference length, never an average of rates.
    pub(crate) fn combine<'a, I: IntoIterator<Item = &'a WerRecord>>(records: I) -> Self {
        let (mut len_ref, mut num_edits) = (0, 0);
        for record in records {
            len_ref += record.len_ref;
            num_edits += record.num_edits;
        }
        Self {
            len_ref,
            num_edits,
            wer: wer(num_edits, len_ref),
        }
    }

    pub fn render(&self, target: OutputTarget) -> String {
        match target {
            OutputTarget::Latex => match self.wer {
                Metric::Value(v) => format!("\\textbf{{WER:}} {:.2}\\%\\\\", v),
                Metric::NotApplicable => String::from("\\textbf{WER:} N/A\\\\"),
            },
            _ => self.to_string(),
        }
    }
}

/// The WerRecord struct acts as a three-row table when displayed.
impl Display for WerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<30}{}",
            "Length of reference (words)",
            group_thousands(self.len_ref)
        )?;
        writeln!(
            f,
            "{:<30}{}",
            "Minimum edit distance (S+D+I)",
            group_thousands(self.num_edits)
        )?;
        let rate = match self.wer {
            Metric::Value(v) => format!("{:.2}%", v),
            Metric::NotApplicable => String::from("N/A"),
        };
        write!(f, "{:<30}{}", "Word error rate (%)", rate)
    }
}

fn wer(num_edits: usize, len_ref: usize) -> Metric {
    Metric::ratio(num_edits as f64 * 100.0, len_ref as f64)
}

/// Word-level Levenshtein distance with two rolling rows.
fn levenshtein_words(reference: &[&str], hypothesis: &[&str]) -> usize {
    if reference.is_empty() {
        return hypothesis.len();
    }
    if hypothesis.is_empty() {
        return reference.len();
    }
    let n = hypothesis.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];
    for (i, ref_word) in reference.iter().enumerate() {
        curr[0] = i + 1;
        for (j, hyp_word) in hypothesis.iter().enumerate() {
            let cost = usize::from(ref_word != hyp_word);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
