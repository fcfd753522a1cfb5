#![allow(dead_code)]

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use unmute_client::{Camera, Frame, FrameStream, LandmarkSource, StopSignal};
use unmute_shared::{landmarks, CameraSettings, HandObservation, Handedness, Keypoint, KEYPOINT_COUNT};

pub const THUMB: [bool; 5] = [true, false, false, false, false];
pub const ALL: [bool; 5] = [true; 5];
pub const PEACE: [bool; 5] = [false, true, true, false, false];

/// Hand with the wrist at (320, 400); extended tips 120px above the wrist,
/// curled tips 20px above it, fanned out left to right from thumb to pinky
pub fn hand(flags: [bool; 5], handedness: Handedness, confidence: f32) -> HandObservation {
    let mut keypoints: Vec<Keypoint> = (0..KEYPOINT_COUNT)
        .map(|_| Keypoint::new(320.0, 390.0))
        .collect();
    keypoints[landmarks::WRIST] = Keypoint::new(320.0, 400.0);

    for (finger, (&idx, &extended)) in landmarks::FINGERTIPS.iter().zip(flags.iter()).enumerate() {
        let y = if extended { 280.0 } else { 380.0 };
        keypoints[idx] = Keypoint::new(240.0 + finger as f32 * 40.0, y);
    }

    HandObservation::new(keypoints, handedness, confidence).unwrap()
}

/// Counts open streams so tests can check the device gets released
#[derive(Clone, Default)]
pub struct CountingCamera {
    pub open_streams: Arc<AtomicUsize>,
    pub failures_left: Arc<AtomicUsize>,
}

impl CountingCamera {
    pub fn failing(times: usize) -> Self {
        let camera = Self::default();
        camera.failures_left.store(times, Ordering::SeqCst);
        camera
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

pub struct CountingStream {
    open_streams: Arc<AtomicUsize>,
    frame_no: u64,
}

impl Camera for CountingCamera {
    type Stream = CountingStream;

    fn open(&mut self, _settings: &CameraSettings) -> Result<CountingStream> {
        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("NotAllowedError: permission denied");
        }
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(CountingStream {
            open_streams: self.open_streams.clone(),
            frame_no: 0,
        })
    }
}

impl FrameStream for CountingStream {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.frame_no += 1;
        Ok(Some(Frame::blank(4, 3).with_timestamp(self.frame_no * 16)))
    }
}

impl Drop for CountingStream {
    fn drop(&mut self) {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Landmark source answering from a script, one entry per frame. Running
/// past the end yields empty frames.
#[derive(Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<Vec<HandObservation>>>,
    /// Fire this signal while answering the n-th call (1-based)
    stop_during: Option<(usize, StopSignal)>,
    pub calls: usize,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<Vec<HandObservation>>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn hands(frames: impl IntoIterator<Item = Option<HandObservation>>) -> Self {
        Self::new(frames.into_iter().map(|hand| Ok(hand.into_iter().collect())))
    }

    pub fn stop_during_call(mut self, call: usize, stop: StopSignal) -> Self {
        self.stop_during = Some((call, stop));
        self
    }
}

impl LandmarkSource for ScriptedSource {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<HandObservation>> {
        self.calls += 1;
        if let Some((call, stop)) = &self.stop_during {
            if *call == self.calls {
                stop.stop();
            }
        }
        self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
