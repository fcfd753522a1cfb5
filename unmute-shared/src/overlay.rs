//! Renderer-independent description of the hand overlay: keypoint dots and
//! the 20 skeleton segments, colored by handedness.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{HandObservation, Handedness, Position};

/// Skeleton segments as keypoint index pairs: wrist to each finger base,
/// then along the finger to its tip
#[rustfmt::skip]
pub const HAND_CONNECTIONS: [(usize, usize); 20] = [
    (0, 1), (1, 2), (2, 3), (3, 4), // Thumb
    (0, 5), (5, 6), (6, 7), (7, 8), // Index finger
    (0, 9), (9, 10), (10, 11), (11, 12), // Middle finger
    (0, 13), (13, 14), (14, 15), (15, 16), // Ring finger
    (0, 17), (17, 18), (18, 19), (19, 20), // Pinky
];

pub const KEYPOINT_RADIUS: f32 = 5.0;
pub const LINE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#10b981`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const RIGHT_HAND_COLOR: Rgb = Rgb::new(0x10, 0xb9, 0x81);
pub const LEFT_HAND_COLOR: Rgb = Rgb::new(0x3b, 0x82, 0xf6);
pub const OUTLINE_COLOR: Rgb = Rgb::new(0xff, 0xff, 0xff);

pub fn hand_color(handedness: Handedness) -> Rgb {
    match handedness {
        Handedness::Right => RIGHT_HAND_COLOR,
        Handedness::Left => LEFT_HAND_COLOR,
    }
}

/// Everything a back-end needs to draw one hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandOverlay {
    pub color: Rgb,
    pub points: Vec<Position>,
    pub segments: Vec<(Position, Position)>,
}

impl HandOverlay {
    pub fn from_hand(hand: &HandObservation) -> Self {
        let points: Vec<Position> = hand.keypoints.iter().map(|k| k.position()).collect();
        let segments = HAND_CONNECTIONS
            .iter()
            .map(|&(start, end)| (points[start], points[end]))
            .collect();

        Self {
            color: hand_color(hand.handedness),
            points,
            segments,
        }
    }
}
