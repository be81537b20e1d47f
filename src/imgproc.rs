pub mod arith;
pub mod composite;
pub mod resize;

use crate::image::{convert, ConstImage, ImageBuffer};

/// The frame after downsampling, in color and as three-channel grayscale.
pub struct Preprocessed {
    pub color: ImageBuffer,
    pub gray: ImageBuffer,
}

#[derive(Clone, Copy, Debug)]
pub struct PreprocessOptions {
    pub scale_percent: u32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        PreprocessOptions { scale_percent: 50 }
    }
}

pub fn preprocess<T: ConstImage + ?Sized>(frame: &T, options: &PreprocessOptions) -> Preprocessed {
    let color = if options.scale_percent == 100 {
        convert::to_bgr(frame)
    } else {
        let size = resize::scaled_size(frame.size(), options.scale_percent);
        convert::to_bgr(&resize::resize_area(frame, size))
    };
    let gray = convert::gray_to_bgr(&convert::bgr_to_gray(&color));
    Preprocessed { color, gray }
}
