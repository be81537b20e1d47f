use std::io::{ErrorKind, Read};

use log::info;

use super::Source;
use crate::image::*;

// 16K UHD bgr24 is about 400 MiB
const MAX_FRAME_BYTES: usize = 1 << 30;

/// Reads headerless, tightly packed BGR24 frames of a fixed size, e.g. the
/// output of `ffmpeg -f rawvideo -pix_fmt bgr24 -`.
pub struct RawimgSource<R> {
    reader: R,
    size: Size,
    frames_read: u64,
}

impl<R: Read> RawimgSource<R> {
    pub fn new(reader: R, size: Size) -> anyhow::Result<Self> {
        if size.width <= 0 || size.height <= 0 {
            anyhow::bail!("Invalid raw frame size {}", size);
        }
        let frame_bytes = (size.width as usize)
            .checked_mul(ImageFormat::Bgr24.channels())
            .and_then(|row| row.checked_mul(size.height as usize));
        match frame_bytes {
            Some(n) if n <= MAX_FRAME_BYTES => {}
            _ => anyhow::bail!("Raw frame size {} too large, limit is {} bytes per frame", size, MAX_FRAME_BYTES),
        }
        Ok(RawimgSource {
            reader,
            size,
            frames_read: 0,
        })
    }

    // fills `buf` completely, returns false on EOF before the first byte
    fn read_full(&mut self, buf: &mut [u8]) -> anyhow::Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => anyhow::bail!(
                    "Truncated raw frame {}: got {} of {} bytes",
                    self.frames_read,
                    filled,
                    buf.len()
                ),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Source for RawimgSource<R> {
    fn read_frame(&mut self) -> anyhow::Result<Option<ImageBuffer>> {
        let mut frame = ImageBuffer::new(ImageFormat::Bgr24, self.size.width, self.size.height, None);
        assert!(frame.is_continuous());
        if !self.read_full(frame.mut_data())? {
            info!("Raw input ended after {} frames", self.frames_read);
            return Ok(None);
        }
        self.frames_read += 1;
        Ok(Some(frame))
    }

    fn frame_size(&self) -> Option<Size> {
        Some(self.size)
    }
}
