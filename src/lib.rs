pub mod app;
pub mod image;
pub mod imgproc;
pub mod sink;
pub mod source;
pub mod transform;
