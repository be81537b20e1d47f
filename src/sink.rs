use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::image::{convert, ImageBuffer};

// Where composited frames go. `poll_key` doubles as the loop's pacing wait.
pub trait Sink {
    fn show(&mut self, frame: &ImageBuffer) -> anyhow::Result<()>;

    /// Waits up to `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> anyhow::Result<Option<char>>;

    /// True once the sink wants no more frames.
    fn is_done(&self) -> bool {
        false
    }
}

/// Sink without a window: sleeps instead of polling the keyboard, and can
/// save every frame it is shown as a numbered PNG.
pub struct HeadlessSink {
    dump_dir: Option<PathBuf>,
    max_frames: Option<u64>,
    shown: u64,
}

impl HeadlessSink {
    pub fn new(dump_dir: Option<PathBuf>, max_frames: Option<u64>) -> anyhow::Result<Self> {
        if let Some(dir) = &dump_dir {
            std::fs::create_dir_all(dir)?;
            info!("Saving frames to {}", dir.display());
        }
        Ok(HeadlessSink {
            dump_dir,
            max_frames,
            shown: 0,
        })
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl Sink for HeadlessSink {
    fn show(&mut self, frame: &ImageBuffer) -> anyhow::Result<()> {
        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!("frame_{:06}.png", self.shown));
            convert::to_rgb_image(frame).save(&path)?;
            debug!("Saved {}", path.display());
        }
        self.shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> anyhow::Result<Option<char>> {
        std::thread::sleep(timeout);
        Ok(None)
    }

    fn is_done(&self) -> bool {
        self.max_frames.map_or(false, |max| self.shown >= max)
    }
}

#[cfg(feature = "opencv")]
pub use highgui::HighguiSink;

#[cfg(feature = "opencv")]
mod highgui {
    use std::time::Duration;

    use log::info;
    use opencv as cv;

    use super::Sink;
    use crate::image::{cv_adapter, ImageBuffer};

    /// A resizable OpenCV window.
    pub struct HighguiSink {
        window_name: String,
    }

    impl HighguiSink {
        pub fn new(window_name: &str) -> anyhow::Result<Self> {
            cv::highgui::named_window(window_name, cv::highgui::WINDOW_NORMAL)?;
            info!("Created window {:?}", window_name);
            Ok(HighguiSink {
                window_name: window_name.to_string(),
            })
        }
    }

    impl Drop for HighguiSink {
        fn drop(&mut self) {
            if let Err(err) = cv::highgui::destroy_window(&self.window_name) {
                log::warn!("Failed to close window {:?}: {}", self.window_name, err);
            }
        }
    }

    impl Sink for HighguiSink {
        fn show(&mut self, frame: &ImageBuffer) -> anyhow::Result<()> {
            let mat = cv_adapter::cvmat_from_image(frame)?;
            cv::highgui::imshow(&self.window_name, &mat)?;
            Ok(())
        }

        fn poll_key(&mut self, timeout: Duration) -> anyhow::Result<Option<char>> {
            let millis = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
            // lowest byte only, like the classic `waitKey() & 0xFF`
            let key = cv::highgui::wait_key(millis)?;
            if key < 0 {
                return Ok(None);
            }
            Ok(Some(((key & 0xff) as u8) as char))
        }
    }
}
