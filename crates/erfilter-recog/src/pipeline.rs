//! End-to-end text detection driver
//!
//! [`ErFilter`] holds the options of every stage and chains them:
//!
//! ```text
//! channel --extract_tree--> tree --non_maximum_suppression--> pool
//!     --classify--> strong / weak --track--> candidates
//!     --SpatialGrouper--> lines              (detection only)
//!     --TripletGrouper + SequenceSolver--> words
//! ```

use crate::classify::{ClassifyOptions, RegionScorer, classify};
use crate::error::RecogResult;
use crate::graph::{SequenceOptions, SequenceSolver};
use crate::group::{GroupingOptions, SpatialGrouper, TextLine, TripletGrouper, TripletOptions};
use crate::ocr::Recognizer;
use crate::table::TransitionTable;
use crate::track::{TrackOptions, track};
use erfilter_core::{GrayImage, RgbImage};
use erfilter_region::{
    ErTreeOptions, Region, RegionResult, SelectOptions, extract_tree, non_maximum_suppression,
};
use tracing::debug;

/// Options of every detection stage
#[derive(Debug, Clone, Default)]
pub struct ErFilter {
    pub tree: ErTreeOptions,
    pub select: SelectOptions,
    pub classify: ClassifyOptions,
    pub track: TrackOptions,
    pub grouping: GroupingOptions,
    pub triplet: TripletOptions,
    pub sequence: SequenceOptions,
}

impl ErFilter {
    /// Create a filter with default options for every stage
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the component-tree options
    pub fn with_tree(mut self, tree: ErTreeOptions) -> Self {
        self.tree = tree;
        self
    }

    /// Set the selection options
    pub fn with_select(mut self, select: SelectOptions) -> Self {
        self.select = select;
        self
    }

    /// Set the classification options
    pub fn with_classify(mut self, classify: ClassifyOptions) -> Self {
        self.classify = classify;
        self
    }

    /// Set the tracking options
    pub fn with_track(mut self, track: TrackOptions) -> Self {
        self.track = track;
        self
    }

    /// Set the spatial grouping options
    pub fn with_grouping(mut self, grouping: GroupingOptions) -> Self {
        self.grouping = grouping;
        self
    }

    /// Set the triplet grouping options
    pub fn with_triplet(mut self, triplet: TripletOptions) -> Self {
        self.triplet = triplet;
        self
    }

    /// Set the sequence solving options
    pub fn with_sequence(mut self, sequence: SequenceOptions) -> Self {
        self.sequence = sequence;
        self
    }

    /// Validate the options of every stage
    pub fn validate(&self) -> RecogResult<()> {
        self.tree.validate()?;
        self.select.validate()?;
        self.classify.validate()?;
        self.track.validate()?;
        self.grouping.validate()?;
        self.triplet.validate()?;
        self.sequence.validate()
    }

    /// Extract and select the stable regions of one channel.
    ///
    /// The returned regions are detached from the tree, with `center` set
    /// and `channel` tagged.
    pub fn detect(&self, image: &GrayImage, channel: usize) -> RegionResult<Vec<Region>> {
        let mut tree = extract_tree(image, &self.tree)?;
        let ids = non_maximum_suppression(&mut tree, &self.select, image.width(), image.height())?;
        let pool = tree.collect(&ids, channel);
        debug!(
            channel,
            tree = tree.len(),
            selected = pool.len(),
            "channel detected"
        );
        Ok(pool)
    }

    /// Detect, classify and track candidates across `channels`.
    ///
    /// Every channel must be registered with `color`.
    pub fn candidates(
        &self,
        channels: &[GrayImage],
        color: &RgbImage,
        scorer: &impl RegionScorer,
    ) -> RecogResult<Vec<Region>> {
        let mut strong = Vec::with_capacity(channels.len());
        let mut weak = Vec::with_capacity(channels.len());

        for (index, channel) in channels.iter().enumerate() {
            color.check_registered(channel)?;
            let pool = self.detect(channel, index)?;
            let split = classify(pool, channel, scorer, &self.classify)?;
            strong.push(split.strong);
            weak.push(split.weak);
        }

        track(strong, weak, channels, color, &self.track)
    }

    /// Group candidates into text lines without recognition
    pub fn group_lines(&self, pool: &mut Vec<Region>) -> RecogResult<Vec<TextLine>> {
        SpatialGrouper::new(self.grouping.clone()).group(pool)
    }

    /// Group candidates into lines and resolve each into a word.
    ///
    /// Lines with nothing to emit are dropped; the rest carry their word and
    /// their final member list.
    pub fn resolve_lines<R: Recognizer>(
        &self,
        pool: &mut Vec<Region>,
        channels: &[GrayImage],
        table: &TransitionTable,
        recognizer: &R,
    ) -> RecogResult<Vec<TextLine>> {
        let lines = TripletGrouper::new(self.triplet.clone()).group(pool)?;
        let solver = SequenceSolver::new(table, self.sequence.clone());

        let mut resolved = Vec::with_capacity(lines.len());
        for mut line in lines {
            if solver
                .resolve(&mut line, pool, channels, recognizer)?
                .is_some()
            {
                resolved.push(line);
            }
        }

        debug!(lines = resolved.len(), "lines resolved");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erfilter_core::Box;

    #[test]
    fn test_default_validates() {
        assert!(ErFilter::new().validate().is_ok());
        let bad = ErFilter::new().with_tree(ErTreeOptions::new().with_thresh_step(0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_detect_tags_channel() {
        let mut image = GrayImage::filled(200, 200, 220).unwrap();
        image.fill_box(&Box::new_unchecked(48, 48, 24, 44), 70);
        image.fill_box(&Box::new_unchecked(49, 49, 22, 42), 40);
        image.fill_box(&Box::new_unchecked(50, 50, 20, 40), 10);

        let filter = ErFilter::new().with_tree(ErTreeOptions::unfiltered());
        let pool = filter.detect(&image, 2).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].channel, 2);
        assert_eq!(pool[0].center, pool[0].bound.center());
        assert_eq!(pool[0].parent, None);
    }
}
