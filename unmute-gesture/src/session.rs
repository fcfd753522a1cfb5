use unmute_shared::{
    validate_threshold, HandObservation, Handedness, Letter, TranslationEvent,
    TranslatorSettings, ValidationError, DEFAULT_CONFIDENCE_THRESHOLD,
};

use crate::classifier::GestureClassifier;
use crate::history::TranslationHistory;

/// What one processed frame produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    NoHand,
    /// A hand was seen but no rule matched
    Unrecognized { handedness: Handedness },
    /// A rule matched but the hand's confidence is under the threshold
    BelowThreshold { letter: Letter, confidence: f32 },
    Recognized {
        event: TranslationEvent,
        /// Whether the event grew the history
        appended: bool,
    },
}

impl FrameOutcome {
    pub fn event(&self) -> Option<&TranslationEvent> {
        match self {
            FrameOutcome::Recognized { event, .. } => Some(event),
            _ => None,
        }
    }
}

/// Translation state updated once per frame: confidence threshold, the
/// current letter, the detected-hand badge and the bounded history.
#[derive(Debug, Clone)]
pub struct RecognitionSession {
    classifier: GestureClassifier,
    threshold: f32,
    current: Option<TranslationEvent>,
    detected_hand: Option<Handedness>,
    history: TranslationHistory,
}

impl RecognitionSession {
    pub fn new() -> Self {
        Self {
            classifier: GestureClassifier::new(),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            current: None,
            detected_hand: None,
            history: TranslationHistory::new(),
        }
    }

    pub fn from_settings(settings: &TranslatorSettings) -> Result<Self, ValidationError> {
        let mut session = Self::new().with_classifier(
            GestureClassifier::new().with_extension_margin(settings.extension_margin),
        );
        session.set_threshold(settings.confidence_threshold)?;
        Ok(session)
    }

    pub fn with_classifier(mut self, classifier: GestureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Takes effect from the next observed frame
    pub fn set_threshold(&mut self, threshold: f32) -> Result<(), ValidationError> {
        self.threshold = validate_threshold(threshold)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&TranslationEvent> {
        self.current.as_ref()
    }

    pub fn detected_hand(&self) -> Option<Handedness> {
        self.detected_hand
    }

    pub fn history(&self) -> &TranslationHistory {
        &self.history
    }

    /// Apply one frame's first detected hand (if any).
    ///
    /// No hand clears the current letter and the hand badge but leaves the
    /// history alone. A hand without an accepted letter keeps the previous
    /// current letter on display.
    pub fn observe(&mut self, hand: Option<&HandObservation>, timestamp_ms: u64) -> FrameOutcome {
        let Some(hand) = hand else {
            self.detected_hand = None;
            self.current = None;
            return FrameOutcome::NoHand;
        };

        self.detected_hand = Some(hand.handedness);

        let Some(letter) = self.classifier.classify(hand) else {
            return FrameOutcome::Unrecognized {
                handedness: hand.handedness,
            };
        };

        // NaN never clears the threshold
        if !(hand.confidence >= self.threshold) {
            return FrameOutcome::BelowThreshold {
                letter,
                confidence: hand.confidence,
            };
        }

        let event = TranslationEvent::new(letter, hand.confidence, timestamp_ms);
        self.current = Some(event);
        let appended = self.history.push(event);
        if appended {
            log::debug!("history += {} ({:.2})", letter, hand.confidence);
        }

        FrameOutcome::Recognized { event, appended }
    }

    /// Drop the current letter and hand badge, keeping the history
    pub fn clear_current(&mut self) {
        self.current = None;
        self.detected_hand = None;
    }
}

impl Default for RecognitionSession {
    fn default() -> Self {
        Self::new()
    }
}
