use std::path::Path;

use log::{debug, info};
use opencv as cv;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::Source;
use crate::image::*;

/// Video file or camera device read through OpenCV's videoio.
pub struct CaptureSource {
    capture: VideoCapture,
    frame: cv::core::Mat,
    description: String,
}

impl CaptureSource {
    // a backend error while opening counts as "did not open", like a missing device
    fn from_capture(capture: cv::Result<VideoCapture>, description: String) -> anyhow::Result<Option<Self>> {
        let capture = match capture {
            Ok(capture) => capture,
            Err(err) => {
                debug!("Could not open {}: {}", description, err);
                return Ok(None);
            }
        };
        if !capture.is_opened()? {
            debug!("Could not open {}", description);
            return Ok(None);
        }
        info!("Opened {}", description);
        Ok(Some(CaptureSource {
            capture,
            frame: cv::core::Mat::default(),
            description,
        }))
    }

    /// `None` if the file cannot be opened or decoded.
    pub fn open_file(path: &Path) -> anyhow::Result<Option<Self>> {
        let path_str = path.to_string_lossy();
        let capture = VideoCapture::from_file(&path_str, videoio::CAP_ANY);
        Self::from_capture(capture, format!("video file {}", path_str))
    }

    /// `None` if there is no camera with this index.
    pub fn open_camera(index: i32) -> anyhow::Result<Option<Self>> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY);
        Self::from_capture(capture, format!("camera {}", index))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Source for CaptureSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<ImageBuffer>> {
        if !self.capture.read(&mut self.frame)? || self.frame.size()?.width == 0 {
            info!("End of stream from {}", self.description);
            return Ok(None);
        }
        Ok(Some(cv_adapter::image_from_cvmat(&self.frame)?))
    }

    fn frame_size(&self) -> Option<Size> {
        let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH).ok()? as i32;
        let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT).ok()? as i32;
        (width > 0 && height > 0).then(|| (width, height).into())
    }
}
