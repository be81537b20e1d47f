use crate::image::{ImageBuffer, Size};

// Source that produces BGR24 (or Mono8) frames, one per call.
// The API is "pull": the app asks for the next frame when it is ready for it.
pub trait Source {
    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> anyhow::Result<Option<ImageBuffer>>;

    /// Native frame size, if known before the first read.
    fn frame_size(&self) -> Option<Size> {
        None
    }
}

#[cfg(feature = "opencv")]
mod capture;
mod rawimg;
mod sequence;

#[cfg(feature = "opencv")]
pub use capture::CaptureSource;
pub use rawimg::RawimgSource;
pub use sequence::{SequenceSource, SyntheticSource};
