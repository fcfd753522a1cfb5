use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};
use unmute_shared::{CameraSettings, FacingMode};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// One captured video frame, BGR with 3 bytes per pixel
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub captured_at_ms: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
            captured_at_ms: now_ms(),
        }
    }

    /// Black frame of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0; width as usize * height as usize * 3])
    }

    pub fn with_timestamp(mut self, captured_at_ms: u64) -> Self {
        self.captured_at_ms = captured_at_ms;
        self
    }
}

/// A live, exclusively owned video stream. Dropping it releases the device.
pub trait FrameStream {
    /// `Ok(None)` means the device delivered an empty frame
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// A video device that can be opened into a [`FrameStream`]
pub trait Camera {
    type Stream: FrameStream;

    fn open(&mut self, settings: &CameraSettings) -> Result<Self::Stream>;
}

/// Camera producing black frames; pairs with landmark sources that ignore
/// pixel data, such as a replayed recording
#[derive(Debug, Default, Clone)]
pub struct BlankCamera;

#[derive(Debug)]
pub struct BlankStream {
    width: u32,
    height: u32,
    facing_mode: FacingMode,
}

impl BlankStream {
    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }
}

impl Camera for BlankCamera {
    type Stream = BlankStream;

    fn open(&mut self, settings: &CameraSettings) -> Result<BlankStream> {
        log::info!(
            "Opening blank {}x{} stream ({} camera)",
            settings.width,
            settings.height,
            settings.facing_mode.as_str()
        );
        Ok(BlankStream {
            width: settings.width,
            height: settings.height,
            facing_mode: settings.facing_mode,
        })
    }
}

impl FrameStream for BlankStream {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        Ok(Some(Frame::blank(self.width, self.height)))
    }
}

#[cfg(feature = "opencv-backend")]
pub use opencv_backend::{frame_to_mat, OpenCvCamera, OpenCvStream};

#[cfg(feature = "opencv-backend")]
mod opencv_backend {
    use super::{Camera, Frame, FrameStream};
    use anyhow::Result;
    use opencv::{
        core::{Mat, Scalar, CV_8UC3},
        prelude::*,
        videoio::{self, VideoCapture, VideoCaptureAPIs},
    };
    use unmute_shared::{CameraSettings, FacingMode};

    /// Local camera device opened through OpenCV
    pub struct OpenCvCamera {
        device_id: i32,
    }

    impl OpenCvCamera {
        pub fn new(device_id: i32) -> Self {
            Self { device_id }
        }
    }

    impl Camera for OpenCvCamera {
        type Stream = OpenCvStream;

        fn open(&mut self, settings: &CameraSettings) -> Result<OpenCvStream> {
            log::info!("Opening local camera device {}...", self.device_id);
            // Local devices are chosen by id, not by which way they face
            if settings.facing_mode != FacingMode::User {
                log::warn!(
                    "Facing mode '{}' ignored; using device {}",
                    settings.facing_mode.as_str(),
                    self.device_id
                );
            }
            let mut capture = VideoCapture::new(self.device_id, VideoCaptureAPIs::CAP_ANY as i32)?;

            if !capture.is_opened()? {
                anyhow::bail!("Failed to open camera device {}", self.device_id);
            }

            // Requested size is a hint; the device may pick the nearest mode
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, settings.width as f64)?;
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, settings.height as f64)?;

            log::info!("Successfully opened local camera");
            Ok(OpenCvStream {
                capture,
                mat: Mat::default(),
            })
        }
    }

    pub struct OpenCvStream {
        capture: VideoCapture,
        mat: Mat,
    }

    impl FrameStream for OpenCvStream {
        fn read_frame(&mut self) -> Result<Option<Frame>> {
            self.capture.read(&mut self.mat)?;
            if self.mat.empty() {
                return Ok(None);
            }

            let data = self.mat.data_bytes()?.to_vec();
            Ok(Some(Frame::new(
                self.mat.cols() as u32,
                self.mat.rows() as u32,
                data,
            )))
        }
    }

    impl Drop for OpenCvStream {
        fn drop(&mut self) {
            if let Err(e) = self.capture.release() {
                log::warn!("Failed to release camera: {}", e);
            } else {
                log::info!("Camera released");
            }
        }
    }

    /// Copy a frame into a BGR `Mat` for drawing and display
    pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(
            frame.height as i32,
            frame.width as i32,
            CV_8UC3,
            Scalar::all(0.0),
        )?;
        let bytes = mat.data_bytes_mut()?;
        if bytes.len() != frame.data.len() {
            anyhow::bail!(
                "frame holds {} bytes, expected {} for {}x{} BGR",
                frame.data.len(),
                bytes.len(),
                frame.width,
                frame.height
            );
        }
        bytes.copy_from_slice(&frame.data);
        Ok(mat)
    }
}
