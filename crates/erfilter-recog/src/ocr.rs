//! Character recognizer interface
//!
//! The sequence solver does not recognize characters itself. It calls a
//! [`Recognizer`] once per line member, on the member's crop of its own
//! channel, and uses the recognizer's label indices to look up transition
//! weights.

use crate::group::TextLine;
use erfilter_core::GrayImage;
use erfilter_region::Region;

/// Result of recognizing one character crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recognition {
    /// Recognized character
    pub label: char,
    /// Confidence in `[0, 1)`
    pub confidence: f64,
}

impl Recognition {
    /// Recognition of `label` with the given confidence
    pub fn new(label: char, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Single-character recognizer.
///
/// `recognize` is called from several threads at once, one call per line
/// member, hence the `Sync` bound.
pub trait Recognizer: Sync {
    /// Recognize the character in `crop`, written along a baseline at
    /// `angle` degrees.
    fn recognize(&self, crop: &GrayImage, angle: f64) -> Recognition;

    /// Row/column of `label` in the transition table
    fn label_index(&self, label: char) -> Option<usize>;

    /// Inspect or correct an assembled line. Does nothing by default.
    fn verify(&self, _line: &mut TextLine, _pool: &[Region]) {}
}

/// Ordered label set mapping characters to table indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    labels: Vec<char>,
}

impl Alphabet {
    /// Alphabet over the characters of `labels`, in order
    pub fn new(labels: &str) -> Self {
        Self {
            labels: labels.chars().collect(),
        }
    }

    /// Digits, upper-case then lower-case ASCII letters
    pub fn alphanumeric() -> Self {
        Self::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz")
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of `label`, `None` if it is not part of the alphabet
    pub fn index(&self, label: char) -> Option<usize> {
        self.labels.iter().position(|&c| c == label)
    }

    /// Label at `index`
    pub fn label(&self, index: usize) -> Option<char> {
        self.labels.get(index).copied()
    }
}
