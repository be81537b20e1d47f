use log::debug;

use crate::image::*;
use crate::imgproc::arith;

/// Every sample halved, rounding down.
pub fn halve<T: ConstImage + ?Sized>(gray: &T) -> ImageBuffer {
    arith::halve(gray)
}

/// Absolute difference against `previous`, or an all-zero frame when there
/// is none yet. Returns the difference and the frame to retain for next time.
pub fn difference_and_update(gray: ImageBuffer, previous: Option<ImageBuffer>) -> (ImageBuffer, ImageBuffer) {
    let diff = match &previous {
        None => ImageBuffer::zeros_like(&gray),
        Some(previous) => arith::abs_diff(&gray, previous),
    };
    (diff, gray)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
}

pub struct Transformed {
    pub half: ImageBuffer,
    pub diff: ImageBuffer,
}

/// Owns the previous grayscale frame between ticks.
#[derive(Default)]
pub struct TransformEngine {
    previous: Option<ImageBuffer>,
}

impl TransformEngine {
    pub fn new() -> Self {
        TransformEngine { previous: None }
    }

    pub fn state(&self) -> EngineState {
        match self.previous {
            None => EngineState::Uninitialized,
            Some(_) => EngineState::Initialized,
        }
    }

    pub fn previous(&self) -> Option<&ImageBuffer> {
        self.previous.as_ref()
    }

    pub fn difference_and_update(&mut self, gray: ImageBuffer) -> ImageBuffer {
        if let Some(previous) = &self.previous {
            assert_eq!(
                previous.size(),
                gray.size(),
                "frame size changed mid-stream"
            );
        } else {
            debug!("First frame {}, emitting blank difference", gray.size());
        }
        let (diff, retained) = difference_and_update(gray, self.previous.take());
        self.previous = Some(retained);
        diff
    }

    pub fn process(&mut self, gray: ImageBuffer) -> Transformed {
        let half = halve(&gray);
        let diff = self.difference_and_update(gray);
        Transformed { half, diff }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: &[u8]) -> ImageBuffer {
        ImageBuffer::from_vec(ImageFormat::Mono8, samples.len() as i32, 1, samples.to_vec())
    }

    fn gray_bgr(w: i32, h: i32, seed: u32) -> ImageBuffer {
        // deterministic pseudo-random gray frame broadcast to 3 channels
        let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
        let mut img = ImageBuffer::new(ImageFormat::Bgr24, w, h, None);
        for y in 0..h {
            for px in img.mut_row(y).chunks_exact_mut(3) {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                px.fill((state >> 24) as u8);
            }
        }
        img
    }

    #[test]
    fn test_halve_every_sample() {
        let f = gray_bgr(16, 9, 1);
        let half = halve(&f);
        assert_eq!(half.size(), f.size());
        assert_eq!(half.format(), f.format());
        for (h, v) in half.samples().iter().zip(f.samples()) {
            assert_eq!(*h, v / 2);
        }
    }

    #[test]
    fn test_halve_twice_is_quarter() {
        let f = gray_bgr(16, 9, 2);
        let quarter = halve(&halve(&f));
        for (q, v) in quarter.samples().iter().zip(f.samples()) {
            assert_eq!(*q, v / 4);
        }
    }

    #[test]
    fn test_halve_boundaries() {
        assert_eq!(halve(&mono(&[0, 255])).samples(), vec![0, 127]);
    }

    #[test]
    fn test_first_difference_is_blank() {
        let f = gray_bgr(5, 4, 3);
        let mut engine = TransformEngine::new();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.previous().is_none());

        let diff = engine.difference_and_update(f.clone());
        assert_eq!(diff.size(), f.size());
        assert_eq!(diff.format(), f.format());
        assert!(diff.samples().iter().all(|&v| v == 0));
        assert_eq!(engine.state(), EngineState::Initialized);
        assert_eq!(engine.previous(), Some(&f));
    }

    #[test]
    fn test_difference_against_previous() {
        let f1 = gray_bgr(7, 3, 4);
        let f2 = gray_bgr(7, 3, 5);
        let (diff, retained) = difference_and_update(f2.clone(), Some(f1.clone()));
        for ((d, a), b) in diff.samples().iter().zip(f2.samples()).zip(f1.samples()) {
            assert_eq!(*d, a.abs_diff(b));
        }
        assert_eq!(retained, f2);
    }

    #[test]
    fn test_engine_sequence_matches_direct_difference() {
        let f1 = gray_bgr(6, 6, 6);
        let f2 = gray_bgr(6, 6, 7);
        let mut engine = TransformEngine::new();
        engine.difference_and_update(f1.clone());
        let diff = engine.difference_and_update(f2.clone());
        assert_eq!(diff, arith::abs_diff(&f2, &f1));
        assert_eq!(engine.previous(), Some(&f2));
    }

    #[test]
    fn test_single_pixel_scenario() {
        let mut engine = TransformEngine::new();
        let mut halves = Vec::new();
        let mut diffs = Vec::new();
        for v in [100, 40, 40] {
            let out = engine.process(mono(&[v]));
            halves.push(out.half.samples());
            diffs.push(out.diff.samples());
        }
        assert_eq!(diffs, vec![vec![0], vec![60], vec![0]]);
        assert_eq!(halves, vec![vec![50], vec![20], vec![20]]);
    }

    #[test]
    fn test_extreme_difference() {
        let mut engine = TransformEngine::new();
        engine.difference_and_update(mono(&[0]));
        assert_eq!(engine.difference_and_update(mono(&[255])).samples(), vec![255]);
    }

    #[test]
    #[should_panic(expected = "frame size changed mid-stream")]
    fn test_size_change_panics() {
        let mut engine = TransformEngine::new();
        engine.difference_and_update(mono(&[1, 2]));
        engine.difference_and_update(mono(&[1]));
    }
}
