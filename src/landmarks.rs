//! Hand landmark types and fingertip distance extraction

use crate::constants::landmarks::{INDEX_TIP, THUMB_TIP};
use clap::ValueEnum;

/// A landmark position in frame pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Landmarks of one detected hand as `(index, point)` pairs.
///
/// Points are normalised to `[0, 1]` relative to the frame, the way
/// detectors report them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandLandmarks {
    pub points: Vec<(usize, Point2D)>,
}

impl HandLandmarks {
    pub fn new(points: Vec<(usize, Point2D)>) -> Self {
        Self { points }
    }

    /// Look up a landmark by index
    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.points
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, p)| *p)
    }
}

/// The two fingertips that control the volume
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FingerPair {
    /// Index finger tip
    pub tip_a: Point2D,
    /// Thumb tip
    pub tip_b: Point2D,
}

impl FingerPair {
    pub fn distance(&self) -> f32 {
        self.tip_a.distance_to(&self.tip_b)
    }
}

/// What to do with frames in which no hand is detected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LostHandPolicy {
    /// Keep using the last known fingertip positions
    #[default]
    Sticky,
    /// Produce no sample for the frame
    Skip,
}

/// Picks the fingertips out of each frame's landmarks
pub struct DistanceExtractor {
    policy: LostHandPolicy,
    frame_width: f32,
    frame_height: f32,
    last: FingerPair,
}

impl DistanceExtractor {
    pub fn new(policy: LostHandPolicy, frame_width: u32, frame_height: u32) -> Self {
        Self {
            policy,
            frame_width: frame_width as f32,
            frame_height: frame_height as f32,
            last: FingerPair::default(),
        }
    }

    /// Extract the fingertip pair for this frame.
    ///
    /// Returns `None` only under [`LostHandPolicy::Skip`] when no hand is
    /// present. A hand missing one of the tips keeps that tip's previous
    /// position.
    pub fn extract(&mut self, hands: Option<&[HandLandmarks]>) -> Option<FingerPair> {
        let Some(hand) = hands.and_then(|h| h.first()) else {
            return match self.policy {
                LostHandPolicy::Sticky => Some(self.last),
                LostHandPolicy::Skip => None,
            };
        };

        let mut pair = self.last;
        if let Some(p) = hand.get(INDEX_TIP) {
            pair.tip_a = self.to_pixels(p);
        }
        if let Some(p) = hand.get(THUMB_TIP) {
            pair.tip_b = self.to_pixels(p);
        }
        self.last = pair;
        Some(pair)
    }

    fn to_pixels(&self, p: Point2D) -> Point2D {
        // Whole pixels, like the detector overlay reports them
        Point2D::new(
            (p.x * self.frame_width).trunc(),
            (p.y * self.frame_height).trunc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(tip_a: (f32, f32), tip_b: (f32, f32)) -> HandLandmarks {
        HandLandmarks::new(vec![
            (0, Point2D::new(0.5, 0.9)),
            (THUMB_TIP, Point2D::new(tip_b.0, tip_b.1)),
            (INDEX_TIP, Point2D::new(tip_a.0, tip_a.1)),
        ])
    }

    #[test]
    fn test_extracts_tips_in_pixels() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Sticky, 100, 100);
        let hands = vec![hand((0.3, 0.0), (0.0, 0.4))];

        let pair = extractor.extract(Some(hands.as_slice())).unwrap();

        assert_eq!(pair.tip_a, Point2D::new(30.0, 0.0));
        assert_eq!(pair.tip_b, Point2D::new(0.0, 40.0));
        assert!((pair.distance() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_first_hand_wins() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Sticky, 100, 100);
        let hands = vec![hand((0.1, 0.1), (0.1, 0.1)), hand((0.9, 0.9), (0.0, 0.0))];

        let pair = extractor.extract(Some(hands.as_slice())).unwrap();

        assert_eq!(pair.distance(), 0.0);
    }

    #[test]
    fn test_sticky_reuses_last_pair() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Sticky, 100, 100);
        let hands = vec![hand((0.3, 0.0), (0.0, 0.4))];
        let seen = extractor.extract(Some(hands.as_slice())).unwrap();

        assert_eq!(extractor.extract(None), Some(seen));
        assert_eq!(extractor.extract(Some(&[][..])), Some(seen));
    }

    #[test]
    fn test_sticky_before_any_hand_is_zero() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Sticky, 100, 100);
        assert_eq!(extractor.extract(None), Some(FingerPair::default()));
    }

    #[test]
    fn test_skip_reports_no_sample() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Skip, 100, 100);
        assert_eq!(extractor.extract(None), None);

        let hands = vec![hand((0.3, 0.0), (0.0, 0.4))];
        assert!(extractor.extract(Some(hands.as_slice())).is_some());
        assert_eq!(extractor.extract(None), None);
    }

    #[test]
    fn test_missing_tip_keeps_previous_position() {
        let mut extractor = DistanceExtractor::new(LostHandPolicy::Sticky, 100, 100);
        extractor.extract(Some(&[hand((0.3, 0.0), (0.0, 0.4))][..]));

        let thumb_only = HandLandmarks::new(vec![(THUMB_TIP, Point2D::new(0.0, 0.0))]);
        let pair = extractor.extract(Some(&[thumb_only][..])).unwrap();

        assert_eq!(pair.tip_a, Point2D::new(30.0, 0.0));
        assert_eq!(pair.tip_b, Point2D::new(0.0, 0.0));
    }
}
