//! Native client for the Unmute ASL translator
//! Captures camera frames, asks a hand-pose model for landmarks and turns
//! them into fingerspelled letters

pub mod camera;
pub mod landmarks;
#[cfg(feature = "opencv-backend")]
pub mod overlay;
pub mod translator;

pub use camera::{BlankCamera, Camera, Frame, FrameStream};
pub use landmarks::{HttpLandmarkSource, LandmarkSource, ReplayLandmarkSource};
pub use translator::{StopSignal, Translator, TranslatorError, TranslatorState};
