use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use unmute_shared::{parse_hands_line, DetectResponse, DetectorSettings, HandObservation, HealthResponse};

use crate::camera::Frame;

/// Hand-pose model: turns one frame into zero or more detected hands.
/// Callers only rely on the first hand.
pub trait LandmarkSource {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<HandObservation>>;
}

impl<T: LandmarkSource + ?Sized> LandmarkSource for Box<T> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<HandObservation>> {
        (**self).detect(frame)
    }
}

/// Hand-pose inference service reached over HTTP
pub struct HttpLandmarkSource {
    base_url: String,
    detector: DetectorSettings,
    http_client: reqwest::blocking::Client,
}

impl HttpLandmarkSource {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Check that the service is up and its model is loaded
    pub fn connect(base_url: impl Into<String>, detector: DetectorSettings) -> Result<Self> {
        Self::connect_with_timeout(base_url, detector, Self::DEFAULT_TIMEOUT)
    }

    pub fn connect_with_timeout(
        base_url: impl Into<String>,
        detector: DetectorSettings,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        let url = format!("{}/health", base_url);
        log::info!("Checking hand-pose service at {}...", url);
        let health: HealthResponse = http_client
            .get(&url)
            .send()
            .with_context(|| format!("hand-pose service unreachable at {}", url))?
            .error_for_status()?
            .json()
            .context("malformed health response")?;

        if health.status != "ok" {
            anyhow::bail!("hand-pose service reports status '{}'", health.status);
        }
        log::info!(
            "Hand-pose service ready (model: {})",
            health.model.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            base_url,
            detector,
            http_client,
        })
    }
}

impl LandmarkSource for HttpLandmarkSource {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<HandObservation>> {
        let url = format!("{}/detect", self.base_url);
        let response: DetectResponse = self
            .http_client
            .post(&url)
            .query(&[
                ("width", frame.width.to_string()),
                ("height", frame.height.to_string()),
                ("max_hands", self.detector.max_hands.to_string()),
                ("model_type", self.detector.model_type.as_str().to_string()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(frame.data.clone())
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response.hands)
    }
}

/// Replays a JSON-lines recording, one JSON array of hands per frame.
/// Once the recording is exhausted every frame comes back empty.
#[derive(Debug)]
pub struct ReplayLandmarkSource {
    path: Option<PathBuf>,
    frames: VecDeque<Vec<HandObservation>>,
}

impl ReplayLandmarkSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;

        let mut frames = VecDeque::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let hands = parse_hands_line(line).with_context(|| {
                format!("{}:{}: invalid hand recording line", path.display(), line_no + 1)
            })?;
            frames.push_back(hands);
        }

        log::info!("Loaded {} recorded frames from {}", frames.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            frames,
        })
    }

    pub fn from_frames(frames: impl IntoIterator<Item = Vec<HandObservation>>) -> Self {
        Self {
            path: None,
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<HandObservation>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
