/**
This module defines the features a restoration model can be evaluated on and the set of
features configured for an evaluation run.
*/
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A restorable feature. A feature is either the capitalization of a content character or a
/// single marker character (such as `' '`, `'.'` or `','`) trailing a content character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// The content character is upper cased.
    Caps,
    /// A marker character immediately following a content character.
    Char(char),
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Caps => write!(f, "CAPS"),
            Self::Char(c) => write!(f, "{}", c),
        }
    }
}

/// This trait mimics the `Into` trait from the std lib for the characters configured as
/// feature markers. It allows the caller to supply them as a string (`"., "`), an owned
/// string or an explicit list of chars.
pub trait FeatureChars {
    fn into_chars(self) -> Vec<char>;
}

impl FeatureChars for &str {
    fn into_chars(self) -> Vec<char> {
        self.chars().collect()
    }
}

impl FeatureChars for String {
    fn into_chars(self) -> Vec<char> {
        self.chars().collect()
    }
}

impl FeatureChars for Vec<char> {
    fn into_chars(self) -> Vec<char> {
        self
    }
}

impl FeatureChars for &[char] {
    fn into_chars(self) -> Vec<char> {
        self.to_vec()
    }
}

/// The ordered, de-duplicated collection of features configured for an evaluation run. When
/// capitalization is assessed, `Feature::Caps` always comes first, like the marker characters
/// in the order they were given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// Builds the feature set from the capitalization flag and the configured marker
    /// characters. Duplicated marker characters are kept once, in first-seen order.
    pub fn new<C: FeatureChars>(capitalization: bool, feature_chars: C) -> Self {
        let mut features = Vec::new();
        if capitalization {
            features.push(Feature::Caps);
        }
        for c in feature_chars.into_chars() {
            let feature = Feature::Char(c);
            if !features.contains(&feature) {
                features.push(feature);
            }
        }
        Self { features }
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Is the given grapheme cluster one of the configured marker characters? Multi-codepoint
    /// clusters never are, since markers are single chars.
    pub(crate) fn contains_cluster(&self, cluster: &str) -> bool {
        cluster_is_one_of(&self.features, cluster)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    /// The configured marker characters, in order, excluding `Feature::Caps`.
    pub fn feature_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.features.iter().filter_map(|f| match f {
            Feature::Char(c) => Some(*c),
            Feature::Caps => None,
        })
    }

    pub fn has_caps(&self) -> bool {
        self.features.contains(&Feature::Caps)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Shared test used for both the configured feature set and the per-render ignore list.
pub(crate) fn cluster_is_one_of(features: &[Feature], cluster: &str) -> bool {
    match cluster.chars().exactly_one() {
        Ok(c) => features.contains(&Feature::Char(c)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_feature_set_order_and_dedup() {
        let set = FeatureSet::new(true, "., .");
        let expected = vec![
            Feature::Caps,
            Feature::Char('.'),
            Feature::Char(','),
            Feature::Char(' '),
        ];
        let actual: Vec<_> = set.iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_feature_chars_excludes_caps() {
        let set = FeatureSet::new(true, "., ");
        let chars: Vec<_> = set.feature_chars().collect();
        assert_eq!(chars, vec!['.', ',', ' ']);
    }

    #[rstest]
    #[case(true, "", 1)]
    #[case(false, "", 0)]
    #[case(false, ". ", 2)]
    #[case(true, ". ", 3)]
    fn test_feature_set_len(
        #[case] capitalization: bool,
        #[case] chars: &str,
        #[case] expected: usize,
    ) {
        let set = FeatureSet::new(capitalization, chars);
        assert_eq!(set.len(), expected);
        assert_eq!(set.is_empty(), expected == 0);
    }

    #[test]
    fn test_into_chars_sources_agree() {
        let from_str = FeatureSet::new(false, "., ");
        let from_string = FeatureSet::new(false, String::from("., "));
        let from_vec = FeatureSet::new(false, vec!['.', ',', ' ']);
        let from_slice = FeatureSet::new(false, ['.', ',', ' '].as_slice());
        assert_eq!(from_str, from_string);
        assert_eq!(from_str, from_vec);
        assert_eq!(from_str, from_slice);
    }

    #[test]
    fn test_cluster_tests() {
        let set = FeatureSet::new(true, ". ");
        assert!(set.contains_cluster("."));
        assert!(set.contains_cluster(" "));
        assert!(!set.contains_cluster("a"));
        // A multi-codepoint cluster is never a marker, even when its base char is one.
        assert!(!set.contains_cluster(".\u{0301}"));
        assert!(!set.contains_cluster(""));
    }

    #[test]
    fn test_feature_display() {
        assert_eq!(Feature::Caps.to_string(), "CAPS");
        assert_eq!(Feature::Char('.').to_string(), ".");
    }
}
