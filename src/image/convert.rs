use super::*;

use ::image as imagex; // external, for IO

// BT.601 luma weights in 14-bit fixed point, same rounding as OpenCV's COLOR_BGR2GRAY
const GRAY_SHIFT: u32 = 14;
const B2Y: u32 = 1868;
const G2Y: u32 = 9617;
const R2Y: u32 = 4899;

#[inline]
fn luma(b: u8, g: u8, r: u8) -> u8 {
    ((b as u32 * B2Y + g as u32 * G2Y + r as u32 * R2Y + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
}

pub fn bgr_to_gray<T: ConstImage + ?Sized>(image: &T) -> ImageBuffer {
    assert_eq!(image.format(), ImageFormat::Bgr24);
    let mut gray = ImageBuffer::new(ImageFormat::Mono8, image.width(), image.height(), None);
    for y in 0..image.height() {
        let src = image.row(y);
        for (dst, bgr) in gray.mut_row(y).iter_mut().zip(src.chunks_exact(3)) {
            *dst = luma(bgr[0], bgr[1], bgr[2]);
        }
    }
    gray
}

/// Broadcasts a single-channel image to three equal channels.
pub fn gray_to_bgr<T: ConstImage + ?Sized>(image: &T) -> ImageBuffer {
    assert_eq!(image.format(), ImageFormat::Mono8);
    let mut bgr = ImageBuffer::new(ImageFormat::Bgr24, image.width(), image.height(), None);
    for y in 0..image.height() {
        let src = image.row(y);
        for (dst, &v) in bgr.mut_row(y).chunks_exact_mut(3).zip(src.iter()) {
            dst.fill(v);
        }
    }
    bgr
}

pub fn to_bgr<T: ConstImage + ?Sized>(image: &T) -> ImageBuffer {
    match image.format() {
        ImageFormat::Bgr24 => {
            let mut out = ImageBuffer::zeros_like(image);
            out.copy_from(image);
            out
        }
        ImageFormat::Mono8 => gray_to_bgr(image),
    }
}

pub fn from_rgb_image(img: &imagex::RgbImage) -> ImageBuffer {
    let mut out = ImageBuffer::new(ImageFormat::Bgr24, img.width() as i32, img.height() as i32, None);
    for y in 0..out.height() {
        let row = out.mut_row(y);
        for (x, dst) in row.chunks_exact_mut(3).enumerate() {
            let imagex::Rgb([r, g, b]) = *img.get_pixel(x as u32, y as u32);
            dst.copy_from_slice(&[b, g, r]);
        }
    }
    out
}

pub fn to_rgb_image<T: ConstImage + ?Sized>(image: &T) -> imagex::RgbImage {
    let bgr = to_bgr(image);
    let mut out = imagex::RgbImage::new(bgr.width() as u32, bgr.height() as u32);
    for y in 0..bgr.height() {
        for (x, src) in bgr.row(y).chunks_exact(3).enumerate() {
            out.put_pixel(x as u32, y as u32, imagex::Rgb([src[2], src[1], src[0]]));
        }
    }
    out
}
