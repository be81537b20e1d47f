use crate::image::*;

/// Size after scaling by `percent`, truncated, never below one pixel.
pub fn scaled_size(size: Size, percent: u32) -> Size {
    let scale = |v: i32| ((v as i64 * percent as i64) / 100).max(1) as i32;
    (scale(size.width), scale(size.height)).into()
}

// (source index, weight) pairs covering the footprint of each output index
fn area_weights(src_len: i32, dst_len: i32) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = ((d + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as i32;
            let last = (end.ceil() as i32).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let w = end.min((s + 1) as f64) - start.max(s as f64);
                    (w > 1e-9).then(|| (s as usize, w / (end - start)))
                })
                .collect()
        })
        .collect()
}

/// Area-average resampling, meant for shrinking (every source pixel
/// contributes to the output pixel whose footprint covers it).
pub fn resize_area<T: ConstImage + ?Sized>(src: &T, size: Size) -> ImageBuffer {
    assert!(size.width > 0 && size.height > 0, "invalid target size {:?}", size);
    let channels = src.format().channels();
    let mut dst = ImageBuffer::new(src.format(), size.width, size.height, None);
    let x_weights = area_weights(src.width(), size.width);
    let y_weights = area_weights(src.height(), size.height);

    let mut acc = vec![0f64; size.width as usize * channels];
    for (dy, ys) in y_weights.iter().enumerate() {
        acc.fill(0.0);
        for &(sy, wy) in ys {
            let src_row = src.row(sy as i32);
            for (dx, xs) in x_weights.iter().enumerate() {
                let out = &mut acc[dx * channels..(dx + 1) * channels];
                for &(sx, wx) in xs {
                    let px = &src_row[sx * channels..(sx + 1) * channels];
                    for (o, &v) in out.iter_mut().zip(px) {
                        *o += v as f64 * wx * wy;
                    }
                }
            }
        }
        for (d, &v) in dst.mut_row(dy as i32).iter_mut().zip(acc.iter()) {
            *d = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    dst
}
