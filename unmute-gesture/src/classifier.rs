//! Rule-based fingerspelling classifier.
//!
//! A fingertip counts as extended when it sits more than a fixed margin above
//! the wrist. This only holds for an upright hand facing the camera: flat,
//! rotated or occluded hands produce unreliable flags.

use unmute_shared::{HandObservation, Handedness, Letter};

/// Default vertical margin (in captured-frame pixels) between wrist and tip
pub const DEFAULT_EXTENSION_MARGIN: f32 = 50.0;

/// Per-finger "extended" flags for one hand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerExtension {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerExtension {
    /// Flags in thumb, index, middle, ring, pinky order
    pub fn from_flags(flags: [bool; 5]) -> Self {
        let [thumb, index, middle, ring, pinky] = flags;
        Self {
            thumb,
            index,
            middle,
            ring,
            pinky,
        }
    }

    pub fn from_hand(hand: &HandObservation, margin: f32) -> Self {
        let limit = hand.wrist().y - margin;
        Self::from_flags(hand.fingertips().map(|tip| tip.y < limit))
    }

    pub fn flags(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn count(&self) -> usize {
        self.flags().iter().filter(|&&f| f).count()
    }
}

type Predicate = fn(&HandObservation, &FingerExtension) -> bool;

/// One (predicate, letter) pair of the ordered rule table
pub struct GestureRule {
    pub letter: Letter,
    pub description: &'static str,
    predicate: Predicate,
}

impl GestureRule {
    pub const fn new(letter: Letter, description: &'static str, predicate: Predicate) -> Self {
        Self {
            letter,
            description,
            predicate,
        }
    }

    pub fn matches(&self, hand: &HandObservation, extension: &FingerExtension) -> bool {
        (self.predicate)(hand, extension)
    }
}

impl core::fmt::Debug for GestureRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GestureRule")
            .field("letter", &self.letter)
            .field("description", &self.description)
            .finish()
    }
}

fn only(extension: &FingerExtension, pattern: [bool; 5]) -> bool {
    extension.flags() == pattern
}

fn thumb_only(_: &HandObservation, e: &FingerExtension) -> bool {
    only(e, [true, false, false, false, false])
}

fn all_extended(_: &HandObservation, e: &FingerExtension) -> bool {
    e.count() == 5
}

// Ignores the extension flags, so it shadows L, V and Y for right hands.
fn right_thumb_left_of_index(hand: &HandObservation, _: &FingerExtension) -> bool {
    hand.handedness == Handedness::Right && hand.thumb_tip().x < hand.index_tip().x
}

fn thumb_and_index(_: &HandObservation, e: &FingerExtension) -> bool {
    only(e, [true, true, false, false, false])
}

fn index_and_middle(_: &HandObservation, e: &FingerExtension) -> bool {
    only(e, [false, true, true, false, false])
}

fn thumb_and_pinky(_: &HandObservation, e: &FingerExtension) -> bool {
    only(e, [true, false, false, false, true])
}

/// Rules in evaluation order; the first match wins.
pub static ASL_RULES: [GestureRule; 6] = [
    GestureRule::new(Letter::A, "thumb extended, fingers curled", thumb_only),
    GestureRule::new(Letter::B, "all fingers extended", all_extended),
    GestureRule::new(
        Letter::C,
        "right hand, thumb tip left of index tip",
        right_thumb_left_of_index,
    ),
    GestureRule::new(Letter::L, "thumb and index extended", thumb_and_index),
    GestureRule::new(Letter::V, "index and middle extended", index_and_middle),
    GestureRule::new(Letter::Y, "thumb and pinky extended", thumb_and_pinky),
];

/// Maps one hand observation to an optional letter
#[derive(Debug, Clone, Copy)]
pub struct GestureClassifier {
    extension_margin: f32,
    rules: &'static [GestureRule],
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self {
            extension_margin: DEFAULT_EXTENSION_MARGIN,
            rules: &ASL_RULES,
        }
    }

    pub fn with_extension_margin(mut self, margin: f32) -> Self {
        self.extension_margin = margin;
        self
    }

    pub fn with_rules(mut self, rules: &'static [GestureRule]) -> Self {
        self.rules = rules;
        self
    }

    pub fn extension_margin(&self) -> f32 {
        self.extension_margin
    }

    pub fn rules(&self) -> &'static [GestureRule] {
        self.rules
    }

    pub fn extension(&self, hand: &HandObservation) -> FingerExtension {
        FingerExtension::from_hand(hand, self.extension_margin)
    }

    pub fn classify(&self, hand: &HandObservation) -> Option<Letter> {
        let extension = self.extension(hand);
        let letter = self
            .rules
            .iter()
            .find(|rule| rule.matches(hand, &extension))
            .map(|rule| rule.letter);

        log::trace!("extension {:?} -> {:?}", extension.flags(), letter);
        letter
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}
