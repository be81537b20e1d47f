use opencv as cv;
use opencv::prelude::*;

use super::*;

fn cv_type(format: ImageFormat) -> i32 {
    match format {
        ImageFormat::Mono8 => cv::core::CV_8UC1,
        ImageFormat::Bgr24 => cv::core::CV_8UC3,
    }
}

fn image_format(m: &cv::core::Mat) -> anyhow::Result<ImageFormat> {
    let typ = m.typ();
    if typ == cv::core::CV_8UC1 {
        Ok(ImageFormat::Mono8)
    } else if typ == cv::core::CV_8UC3 {
        Ok(ImageFormat::Bgr24)
    } else {
        anyhow::bail!("unsupported mat type {}", typ)
    }
}

pub fn cvmat_image_view(m: &cv::core::Mat) -> anyhow::Result<ConstImageView> {
    let format = image_format(m)?;
    assert!(m.is_continuous());
    let data = m.data_bytes()?;
    Ok(ConstImageView::new(format, data, m.cols(), m.rows(), None))
}

/// Copies a captured mat into an owned frame.
pub fn image_from_cvmat(m: &cv::core::Mat) -> anyhow::Result<ImageBuffer> {
    let continuous;
    let m = if m.is_continuous() {
        m
    } else {
        continuous = m.try_clone()?;
        &continuous
    };
    let view = cvmat_image_view(m)?;
    let mut img = ImageBuffer::zeros_like(&view);
    img.copy_from(&view);
    Ok(img)
}

pub fn cvmat_from_image<T: ConstImage + ?Sized>(img: &T) -> anyhow::Result<cv::core::Mat> {
    // the borrowed mat never outlives this call, the clone owns its data
    let borrowed = unsafe {
        cv::core::Mat::new_rows_cols_with_data(
            img.height(),
            img.width(),
            cv_type(img.format()),
            img.data().as_ptr() as *mut libc::c_void,
            img.pitch() as usize,
        )?
    };
    Ok(borrowed.try_clone()?)
}
