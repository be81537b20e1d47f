use std::collections::VecDeque;

use super::Source;
use crate::image::*;

/// Replays frames held in memory, then reports end of stream.
pub struct SequenceSource {
    frames: VecDeque<ImageBuffer>,
}

impl SequenceSource {
    pub fn new(frames: impl IntoIterator<Item = ImageBuffer>) -> Self {
        SequenceSource {
            frames: frames.into_iter().collect(),
        }
    }
}

impl Source for SequenceSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<ImageBuffer>> {
        Ok(self.frames.pop_front())
    }

    fn frame_size(&self) -> Option<Size> {
        self.frames.front().map(|f| f.size())
    }
}

/// `count` frames of a gradient with a bright bar sweeping left to right.
/// Each frame is rendered when it is read.
pub struct SyntheticSource {
    size: Size,
    next: usize,
    count: usize,
}

impl SyntheticSource {
    pub fn new(size: Size, count: usize) -> Self {
        assert!(size.width > 0 && size.height > 0, "invalid synthetic frame size {}", size);
        SyntheticSource { size, next: 0, count }
    }

    fn render(&self, n: usize) -> ImageBuffer {
        let Size { width, height } = self.size;
        let mut frame = ImageBuffer::new(ImageFormat::Bgr24, width, height, None);
        let bar_width = (width / 8).max(1);
        let bar_x = ((n % width as usize) * 4 % width as usize) as i32;
        for y in 0..height {
            let shade = (y * 255 / height) as u8;
            for (x, px) in frame.mut_row(y).chunks_exact_mut(3).enumerate() {
                let x = x as i32;
                if x >= bar_x && x < bar_x + bar_width {
                    px.copy_from_slice(&[255, 255, 255]);
                } else {
                    px.copy_from_slice(&[shade, (x * 255 / width) as u8, 96]);
                }
            }
        }
        frame
    }
}

impl Source for SyntheticSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<ImageBuffer>> {
        if self.next >= self.count {
            return Ok(None);
        }
        let frame = self.render(self.next);
        self.next += 1;
        Ok(Some(frame))
    }

    fn frame_size(&self) -> Option<Size> {
        (self.next < self.count).then_some(self.size)
    }
}
