// Per-sample point arithmetic. Both operands and the destination share one
// format and size; rows are walked separately so padded pitches are fine.

use crate::image::*;

pub fn halve_into<S, D>(src: &S, dst: &mut D)
where
    S: ConstImage + ?Sized,
    D: Image + ?Sized,
{
    assert_eq!(src.size(), dst.size());
    assert_eq!(src.format(), dst.format());
    for y in 0..src.height() {
        for (d, &s) in dst.mut_row(y).iter_mut().zip(src.row(y)) {
            *d = s >> 1;
        }
    }
}

pub fn halve<S: ConstImage + ?Sized>(src: &S) -> ImageBuffer {
    let mut dst = ImageBuffer::zeros_like(src);
    halve_into(src, &mut dst);
    dst
}

pub fn abs_diff_into<A, B, D>(a: &A, b: &B, dst: &mut D)
where
    A: ConstImage + ?Sized,
    B: ConstImage + ?Sized,
    D: Image + ?Sized,
{
    assert_eq!(a.size(), b.size());
    assert_eq!(a.format(), b.format());
    assert_eq!(a.size(), dst.size());
    assert_eq!(a.format(), dst.format());
    for y in 0..a.height() {
        let row_a = a.row(y);
        let row_b = b.row(y);
        for ((d, &pa), &pb) in dst.mut_row(y).iter_mut().zip(row_a).zip(row_b) {
            *d = pa.abs_diff(pb);
        }
    }
}

pub fn abs_diff<A, B>(a: &A, b: &B) -> ImageBuffer
where
    A: ConstImage + ?Sized,
    B: ConstImage + ?Sized,
{
    let mut dst = ImageBuffer::zeros_like(a);
    abs_diff_into(a, b, &mut dst);
    dst
}
