//! Translator controller: owns the camera stream, the hand-pose model and
//! the recognition state, and drives the capture → detect → classify loop.
//!
//! ```text
//!   Idle --start_camera--> CameraOnly --start_detection--> Detecting
//!    ^                      |   ^                             |
//!    +-----stop_camera------+   +-------stop_detection--------+
//!    +-----------------------stop_camera----------------------+
//! ```

use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use unmute_gesture::{FrameOutcome, RecognitionSession, TranslationHistory};
use unmute_shared::{HandObservation, Handedness, TranslationEvent, TranslatorSettings};

use crate::camera::{Camera, Frame, FrameStream};
use crate::landmarks::LandmarkSource;

pub const MODEL_INIT_ERROR: &str =
    "Failed to initialize hand detection model. Please refresh and try again.";
pub const CAMERA_ERROR: &str =
    "Unable to access camera. Please ensure camera permissions are granted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorState {
    Idle,
    CameraOnly,
    Detecting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslatorError {
    NoCameraStream,
    ModelUnavailable,
    CameraUnavailable(String),
    InvalidThreshold(f32),
}

impl fmt::Display for TranslatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslatorError::NoCameraStream => {
                f.write_str("detection needs an active camera stream")
            }
            TranslatorError::ModelUnavailable => {
                f.write_str("hand detection model failed to initialize")
            }
            TranslatorError::CameraUnavailable(cause) => {
                write!(f, "camera unavailable: {}", cause)
            }
            TranslatorError::InvalidThreshold(t) => {
                write!(f, "confidence threshold {} is outside [0.1, 1.0]", t)
            }
        }
    }
}

impl std::error::Error for TranslatorError {}

/// Cooperative cancellation flag for [`Translator::run`].
///
/// Checked before every frame and again after inference returns. Once
/// stopped it stays stopped until [`StopSignal::reset`] or the next
/// [`Translator::start_detection`].
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of one processed frame, handed to the run loop's observer
#[derive(Debug)]
pub struct FrameReport {
    pub frame: Frame,
    /// First detected hand, if any
    pub hand: Option<HandObservation>,
    pub outcome: FrameOutcome,
}

pub struct Translator<C: Camera, L: LandmarkSource> {
    camera: C,
    stream: Option<C::Stream>,
    model: Option<L>,
    settings: TranslatorSettings,
    session: RecognitionSession,
    state: TranslatorState,
    stop: StopSignal,
    last_error: Option<String>,
}

impl<C: Camera, L: LandmarkSource> Translator<C, L> {
    /// `model` is the outcome of loading the hand-pose model. A failed load
    /// leaves the translator unable to detect for its whole lifetime.
    pub fn new(camera: C, model: Result<L>, settings: TranslatorSettings) -> Result<Self> {
        let session = RecognitionSession::from_settings(&settings)?;

        let (model, last_error) = match model {
            Ok(model) => (Some(model), None),
            Err(e) => {
                log::error!("Model initialization error: {:#}", e);
                (None, Some(MODEL_INIT_ERROR.to_string()))
            }
        };

        Ok(Self {
            camera,
            stream: None,
            model,
            settings,
            session,
            state: TranslatorState::Idle,
            stop: StopSignal::new(),
            last_error,
        })
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> TranslatorState {
        self.state
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_camera_active(&self) -> bool {
        self.stream.is_some()
    }

    /// User-facing error message, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current(&self) -> Option<&TranslationEvent> {
        self.session.current()
    }

    pub fn history(&self) -> &TranslationHistory {
        self.session.history()
    }

    pub fn detected_hand(&self) -> Option<Handedness> {
        self.session.detected_hand()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.session.threshold()
    }

    pub fn set_confidence_threshold(&mut self, threshold: f32) -> Result<()> {
        self.session
            .set_threshold(threshold)
            .map_err(|_| TranslatorError::InvalidThreshold(threshold))?;
        self.settings.confidence_threshold = threshold;
        Ok(())
    }

    pub fn show_landmarks(&self) -> bool {
        self.settings.show_landmarks
    }

    pub fn set_show_landmarks(&mut self, show: bool) {
        self.settings.show_landmarks = show;
    }

    /// Idle → CameraOnly. A camera failure is reported and can be retried.
    pub fn start_camera(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        match self.camera.open(&self.settings.camera) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = TranslatorState::CameraOnly;
                self.last_error = if self.model.is_some() {
                    None
                } else {
                    Some(MODEL_INIT_ERROR.to_string())
                };
                log::info!("Camera started");
                Ok(())
            }
            Err(e) => {
                log::error!("Camera access error: {:#}", e);
                self.last_error = Some(CAMERA_ERROR.to_string());
                Err(TranslatorError::CameraUnavailable(format!("{:#}", e)).into())
            }
        }
    }

    /// CameraOnly/Detecting → Idle, releasing the stream
    pub fn stop_camera(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.state = TranslatorState::Idle;
            log::info!("Camera stopped");
        }
    }

    /// CameraOnly → Detecting. Clears a stop request left by an earlier run.
    pub fn start_detection(&mut self) -> Result<()> {
        if self.stream.is_none() {
            return Err(TranslatorError::NoCameraStream.into());
        }
        if self.model.is_none() {
            return Err(TranslatorError::ModelUnavailable.into());
        }

        if self.state != TranslatorState::Detecting {
            // A stop from the previous run must not end this one
            self.stop.reset();
            self.state = TranslatorState::Detecting;
            log::info!("Detection started");
        }
        Ok(())
    }

    /// Detecting → CameraOnly
    pub fn stop_detection(&mut self) {
        if self.state == TranslatorState::Detecting {
            self.state = TranslatorState::CameraOnly;
            log::info!("Detection stopped");
        }
    }

    /// Starts the camera if it is off, otherwise flips detection on or off
    pub fn toggle_detection(&mut self) -> Result<()> {
        match self.state {
            TranslatorState::Idle => self.start_camera(),
            TranslatorState::CameraOnly => self.start_detection(),
            TranslatorState::Detecting => {
                self.stop_detection();
                Ok(())
            }
        }
    }

    /// Process one frame while detecting.
    ///
    /// Capture and inference failures are logged and yield `None` without
    /// touching the recognition state. A result that comes back after the
    /// stop signal fired is discarded.
    pub fn step(&mut self) -> Option<FrameReport> {
        if self.state != TranslatorState::Detecting {
            return None;
        }
        let (Some(stream), Some(model)) = (self.stream.as_mut(), self.model.as_mut()) else {
            return None;
        };

        let frame = match stream.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::warn!("Empty frame received");
                return None;
            }
            Err(e) => {
                log::warn!("Frame capture error: {:#}", e);
                return None;
            }
        };

        let hands = match model.detect(&frame) {
            Ok(hands) => hands,
            Err(e) => {
                log::warn!("Detection error: {:#}", e);
                return None;
            }
        };

        if self.stop.is_stopped() {
            log::debug!("Discarding frame finished after stop");
            return None;
        }

        let hand = hands.into_iter().next();
        let outcome = self.session.observe(hand.as_ref(), frame.captured_at_ms);
        log::debug!("Frame outcome: {:?}", outcome);

        Some(FrameReport {
            frame,
            hand,
            outcome,
        })
    }

    /// Run the frame loop until detection stops, the stop signal fires, or
    /// `max_frames` iterations have run. Iterations are paced to the
    /// configured frame interval. Returns the number of iterations.
    ///
    /// If the stop signal ended the loop the translator falls back to
    /// CameraOnly; the stream stays open until [`Translator::stop_camera`]
    /// or drop.
    pub fn run<F>(&mut self, max_frames: Option<u64>, mut on_frame: F) -> Result<u64>
    where
        F: FnMut(&Self, &FrameReport) -> Result<()>,
    {
        let interval = Duration::from_millis(self.settings.frame_interval_ms);
        let mut iterations = 0u64;

        while self.state == TranslatorState::Detecting && !self.stop.is_stopped() {
            if max_frames.is_some_and(|max| iterations >= max) {
                break;
            }

            let started = Instant::now();
            iterations += 1;
            if let Some(report) = self.step() {
                on_frame(&*self, &report)?;
            }

            let elapsed = started.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }

        if self.stop.is_stopped() {
            self.stop_detection();
        }
        Ok(iterations)
    }

    /// One-line summary of the current letter, history and detected hand
    pub fn status_line(&self) -> String {
        let current = match self.current() {
            Some(event) => format!("{} ({:.0}%)", event.letter, event.confidence * 100.0),
            None => "-".to_string(),
        };
        let history: Vec<String> = self.history().letters().map(|l| l.to_string()).collect();
        let hand = match self.detected_hand() {
            Some(handedness) => format!("{} hand", handedness),
            None => "no hand".to_string(),
        };

        format!(
            "current: {} | history: [{}] | {}",
            current,
            history.join(" "),
            hand
        )
    }
}
