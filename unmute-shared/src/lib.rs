#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

pub mod overlay;

/// Number of keypoints reported per hand by the MediaPipe Hands model
pub const KEYPOINT_COUNT: usize = 21;

/// Hand landmark indices (MediaPipe hand landmark model convention)
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;

    /// Thumb, index, middle, ring, pinky
    pub const FINGERTIPS: [usize; 5] = [
        THUMB_TIP,
        INDEX_FINGER_TIP,
        MIDDLE_FINGER_TIP,
        RING_FINGER_TIP,
        PINKY_TIP,
    ];
}

/// Keypoint position in captured-frame pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One tracked anatomical point on a hand, in captured-frame pixels
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

/// One frame's detected hand: 21 keypoints, handedness and overall score.
///
/// The keypoint count is part of the type, so a deserialized observation
/// always has exactly [`KEYPOINT_COUNT`] points. A hand reported without a
/// score gets confidence 0.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandObservation {
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
    pub handedness: Handedness,
    #[serde(rename = "score", default)]
    pub confidence: f32,
}

impl HandObservation {
    pub fn new(
        keypoints: Vec<Keypoint>,
        handedness: Handedness,
        confidence: f32,
    ) -> Result<Self, ValidationError> {
        let keypoints = <[Keypoint; KEYPOINT_COUNT]>::try_from(keypoints)
            .map_err(|points| ValidationError::WrongKeypointCount(points.len()))?;

        Ok(Self {
            keypoints,
            handedness,
            confidence,
        })
    }

    pub fn wrist(&self) -> &Keypoint {
        &self.keypoints[landmarks::WRIST]
    }

    pub fn thumb_tip(&self) -> &Keypoint {
        &self.keypoints[landmarks::THUMB_TIP]
    }

    pub fn index_tip(&self) -> &Keypoint {
        &self.keypoints[landmarks::INDEX_FINGER_TIP]
    }

    /// Thumb, index, middle, ring and pinky tips, in that order
    pub fn fingertips(&self) -> [&Keypoint; 5] {
        landmarks::FINGERTIPS.map(|idx| &self.keypoints[idx])
    }
}

/// A fingerspelled letter of the ASL manual alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
}

impl Letter {
    pub const ALL: [Letter; 26] = [
        Letter::A,
        Letter::B,
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::H,
        Letter::I,
        Letter::J,
        Letter::K,
        Letter::L,
        Letter::M,
        Letter::N,
        Letter::O,
        Letter::P,
        Letter::Q,
        Letter::R,
        Letter::S,
        Letter::T,
        Letter::U,
        Letter::V,
        Letter::W,
        Letter::X,
        Letter::Y,
        Letter::Z,
    ];

    pub fn as_char(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Accepts upper or lower case ASCII letters
    pub fn from_char(c: char) -> Option<Letter> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(Self::ALL[(upper as u8 - b'A') as usize])
        } else {
            None
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<Letter> for char {
    fn from(letter: Letter) -> char {
        letter.as_char()
    }
}

impl TryFrom<char> for Letter {
    type Error = ValidationError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Letter::from_char(c).ok_or(ValidationError::InvalidLetter(c))
    }
}

/// An accepted letter classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TranslationEvent {
    pub letter: Letter,
    pub confidence: f32,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

impl TranslationEvent {
    pub fn new(letter: Letter, confidence: f32, timestamp_ms: u64) -> Self {
        Self {
            letter,
            confidence,
            timestamp_ms,
        }
    }
}

pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.1;
pub const MAX_CONFIDENCE_THRESHOLD: f32 = 1.0;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Check that a confidence threshold lies in [0.1, 1.0]
pub fn validate_threshold(threshold: f32) -> Result<f32, ValidationError> {
    if (MIN_CONFIDENCE_THRESHOLD..=MAX_CONFIDENCE_THRESHOLD).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ValidationError::ThresholdOutOfRange(threshold))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    WrongKeypointCount(usize),
    InvalidLetter(char),
    ThresholdOutOfRange(f32),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::WrongKeypointCount(count) => write!(
                f,
                "hand observation needs {} keypoints, got {}",
                KEYPOINT_COUNT, count
            ),
            ValidationError::InvalidLetter(c) => write!(f, "'{}' is not a letter A-Z", c),
            ValidationError::ThresholdOutOfRange(t) => write!(
                f,
                "confidence threshold {} is outside [{}, {}]",
                t, MIN_CONFIDENCE_THRESHOLD, MAX_CONFIDENCE_THRESHOLD
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// Camera stream request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub facing_mode: FacingMode,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Lite,
    Full,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Lite => "lite",
            ModelType::Full => "full",
        }
    }
}

/// Hand-pose model configuration passed to the landmark source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub model_type: ModelType,
    pub max_hands: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model_type: ModelType::Full,
            max_hands: 2,
        }
    }
}

/// Translator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorSettings {
    pub confidence_threshold: f32,
    pub show_landmarks: bool,
    /// Pixels a fingertip must sit above the wrist to count as extended
    pub extension_margin: f32,
    pub frame_interval_ms: u64,
    pub camera: CameraSettings,
    pub detector: DetectorSettings,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            show_landmarks: true,
            extension_margin: 50.0,
            frame_interval_ms: 16,
            camera: CameraSettings::default(),
            detector: DetectorSettings::default(),
        }
    }
}

impl TranslatorSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_threshold(self.confidence_threshold).map(|_| ())
    }

    #[cfg(feature = "std")]
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Response body of the inference service's detect endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

/// Response body of the inference service's health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Parse one line of a hand recording: a JSON array of hands
#[cfg(feature = "std")]
pub fn parse_hands_line(line: &str) -> serde_json::Result<Vec<HandObservation>> {
    serde_json::from_str(line)
}
