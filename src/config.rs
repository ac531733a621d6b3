/*
 * This module contains some quality of life structs and alias. Most importantly, it contains
 * the `EvalConfig` struct, which can be passed to the `Evaluator` constructor or the
 * `evaluate` function to simplify their arguments.
*/
use crate::align::FeatureChars;
use either::Either as LeftOrRight;
use std::fmt::{Debug, Display};

/// Reasonable default configuration for an evaluation run: capitalization plus periods,
/// commas and spaces, everything computed lazily.
pub type DefaultEvalConfig = EvalConfig<Vec<char>>;

/// Config struct used to simplify the inputs of parameters to the main entrypoints of the
/// crate.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EvalConfig<Chars>
where
    Chars: FeatureChars,
{
    /// Whether the capitalization of content characters is assessed as a feature.
    pub(crate) capitalization: bool,
    /// The characters treated as features (e.g. `"., "` for periods, commas and spaces).
    pub(crate) feature_chars: Chars,
    /// Compute the confusion matrices of every document at construction.
    pub(crate) eager_matrices: bool,
    /// Compute the word error rate of every document at construction.
    pub(crate) eager_wer: bool,
}

impl DefaultEvalConfig {
    pub fn new() -> Self {
        Self {
            capitalization: true,
            feature_chars: vec!['.', ',', ' '],
            eager_matrices: false,
            eager_wer: false,
        }
    }
}

impl Default for DefaultEvalConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<Chars: FeatureChars> From<EvalConfig<Chars>> for (bool, Vec<char>, bool, bool) {
    fn from(value: EvalConfig<Chars>) -> Self {
        (
            value.capitalization,
            value.feature_chars.into_chars(),
            value.eager_matrices,
            value.eager_wer,
        )
    }
}

impl<Chars: FeatureChars + Debug> Display for EvalConfig<Chars> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!(
            "Assessing capitalization: {}\n Feature characters: {:?}\n Eagerly computing confusion matrices: {}\n Eagerly computing word error rates: {}",
            self.capitalization, self.feature_chars, self.eager_matrices, self.eager_wer
        );
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize an `EvalConfig` structure.
pub struct EvalConfigBuilder<Chars>
where
    Chars: FeatureChars,
{
    capitalization: bool,
    feature_chars: LeftOrRight<Chars, Vec<char>>,
    eager_matrices: bool,
    eager_wer: bool,
}

impl Default for EvalConfigBuilder<Vec<char>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Chars> EvalConfigBuilder<Chars>
where
    Chars: FeatureChars,
{
    pub fn new() -> Self {
        Self {
            capitalization: true,
            feature_chars: LeftOrRight::Right(vec!['.', ',', ' ']),
            eager_matrices: false,
            eager_wer: false,
        }
    }
    pub fn capitalization(mut self, capitalization: bool) -> Self {
        self.capitalization = capitalization;
        self
    }
    /// Sets the marker characters. The argument can be any `FeatureChars` source, so the
    /// builder is rebound to its type.
    pub fn feature_chars<C: FeatureChars>(self, feature_chars: C) -> EvalConfigBuilder<C> {
        EvalConfigBuilder {
            capitalization: self.capitalization,
            feature_chars: LeftOrRight::Left(feature_chars),
            eager_matrices: self.eager_matrices,
            eager_wer: self.eager_wer,
        }
    }
    pub fn eager_matrices(mut self, eager: bool) -> Self {
        self.eager_matrices = eager;
        self
    }
    pub fn eager_wer(mut self, eager: bool) -> Self {
        self.eager_wer = eager;
        self
    }
    pub fn build(self) -> EvalConfig<Vec<char>> {
        EvalConfig {
            capitalization: self.capitalization,
            feature_chars: self.feature_chars.either(FeatureChars::into_chars, |v| v),
            eager_matrices: self.eager_matrices,
            eager_wer: self.eager_wer,
        }
    }
}
