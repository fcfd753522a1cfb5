#![cfg_attr(not(feature = "std"), no_std)]

//! Fingerspelling recognition for the Unmute ASL translator
//! Maps MediaPipe hand keypoints to letters with a small ordered rule table
//! and keeps a de-duplicated history of accepted letters

extern crate alloc;

pub mod alphabet;
pub mod classifier;
pub mod history;
pub mod session;

pub use classifier::{FingerExtension, GestureClassifier, GestureRule, ASL_RULES};
pub use history::{TranslationHistory, HISTORY_CAPACITY};
pub use session::{FrameOutcome, RecognitionSession};
