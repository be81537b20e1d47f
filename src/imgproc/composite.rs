use log::debug;

use crate::image::*;

pub struct Tile<'a> {
    pub label: &'a str,
    pub image: ImageBuffer,
}

impl<'a> Tile<'a> {
    pub fn new(label: &'a str, image: ImageBuffer) -> Self {
        Tile { label, image }
    }
}

/// Draws a text label onto a tile before it is placed in the grid.
pub trait Labeler {
    fn label(&mut self, image: &mut ImageBuffer, text: &str) -> anyhow::Result<()>;
}

pub struct NoLabels;

impl Labeler for NoLabels {
    fn label(&mut self, _: &mut ImageBuffer, text: &str) -> anyhow::Result<()> {
        debug!("Skipping label {:?}, no font renderer", text);
        Ok(())
    }
}

/// Tiles equally sized images row-major, `columns` per row, into one BGR frame.
/// Grayscale tiles are broadcast to three channels first.
pub fn grid(tiles: Vec<Tile>, columns: usize, labeler: &mut dyn Labeler) -> anyhow::Result<ImageBuffer> {
    assert!(columns > 0, "grid needs at least one column");
    let tile_size = match tiles.first() {
        Some(tile) => tile.image.size(),
        None => anyhow::bail!("cannot composite an empty tile list"),
    };
    let rows = (tiles.len() + columns - 1) / columns;
    let mut output = ImageBuffer::new(
        ImageFormat::Bgr24,
        tile_size.width * columns as i32,
        tile_size.height * rows as i32,
        None,
    );

    for (i, tile) in tiles.into_iter().enumerate() {
        if tile.image.size() != tile_size {
            anyhow::bail!(
                "tile {:?} has size {}, expected {}",
                tile.label,
                tile.image.size(),
                tile_size
            );
        }
        let mut image = match tile.image.format() {
            ImageFormat::Bgr24 => tile.image,
            ImageFormat::Mono8 => convert::gray_to_bgr(&tile.image),
        };
        labeler.label(&mut image, tile.label)?;

        let top_left: Point = (
            (i % columns) as i32 * tile_size.width,
            (i / columns) as i32 * tile_size.height,
        )
            .into();
        output.mut_subimg(top_left, tile_size).copy_from(&image);
    }
    Ok(output)
}

#[cfg(feature = "opencv")]
pub use hershey::HersheyLabeler;

#[cfg(feature = "opencv")]
mod hershey {
    use opencv as cv;

    use super::Labeler;
    use crate::image::{cv_adapter, ConstImage, Image, ImageBuffer};

    /// Labels tiles with OpenCV's Hershey font, anchored near the bottom left corner.
    pub struct HersheyLabeler {
        pub font_face: i32,
        pub font_scale: f64,
        pub color: cv::core::Scalar,
        pub thickness: i32,
    }

    impl Default for HersheyLabeler {
        fn default() -> Self {
            HersheyLabeler {
                font_face: cv::imgproc::FONT_HERSHEY_COMPLEX,
                font_scale: 2.0,
                color: cv::core::Scalar::new(123.0, 49.0, 126.0, 0.0),
                thickness: 3,
            }
        }
    }

    impl Labeler for HersheyLabeler {
        fn label(&mut self, image: &mut ImageBuffer, text: &str) -> anyhow::Result<()> {
            let mut mat = cv_adapter::cvmat_from_image(&*image)?;
            cv::imgproc::put_text(
                &mut mat,
                text,
                cv::core::Point::new(10, image.height() - 15),
                self.font_face,
                self.font_scale,
                self.color,
                self.thickness,
                cv::imgproc::LINE_8,
                false,
            )?;
            let labelled = cv_adapter::image_from_cvmat(&mat)?;
            image.copy_from(&labelled);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingLabeler(Vec<String>);

    impl Labeler for RecordingLabeler {
        fn label(&mut self, image: &mut ImageBuffer, text: &str) -> anyhow::Result<()> {
            self.0.push(text.to_string());
            // mark the top left sample so placement is visible in the output
            image.mut_row(0)[0] = 255;
            Ok(())
        }
    }

    fn solid(format: ImageFormat, value: u8) -> ImageBuffer {
        let mut img = ImageBuffer::new(format, 2, 2, None);
        img.fill(value);
        img
    }

    #[test]
    fn test_two_by_two_grid() {
        let tiles = vec![
            Tile::new("a", solid(ImageFormat::Bgr24, 10)),
            Tile::new("b", solid(ImageFormat::Mono8, 20)),
            Tile::new("c", solid(ImageFormat::Mono8, 30)),
            Tile::new("d", solid(ImageFormat::Bgr24, 40)),
        ];
        let mut labeler = RecordingLabeler(Vec::new());
        let out = grid(tiles, 2, &mut labeler).unwrap();

        assert_eq!(labeler.0, vec!["a", "b", "c", "d"]);
        assert_eq!(out.format(), ImageFormat::Bgr24);
        assert_eq!(out.size(), (4, 4).into());
        assert_eq!(out.pixel(1, 1), &[10, 10, 10]);
        assert_eq!(out.pixel(3, 0), &[20, 20, 20]);
        assert_eq!(out.pixel(0, 3), &[30, 30, 30]);
        assert_eq!(out.pixel(3, 3), &[40, 40, 40]);
        // labeler ran on each tile before placement
        assert_eq!(out.pixel(2, 2), &[255, 40, 40]);
        assert_eq!(out.pixel(0, 2), &[255, 30, 30]);
    }

    #[test]
    fn test_partial_last_row() {
        let tiles = vec![
            Tile::new("a", solid(ImageFormat::Mono8, 1)),
            Tile::new("b", solid(ImageFormat::Mono8, 2)),
            Tile::new("c", solid(ImageFormat::Mono8, 3)),
        ];
        let out = grid(tiles, 2, &mut NoLabels).unwrap();
        assert_eq!(out.size(), (4, 4).into());
        assert_eq!(out.pixel(2, 2), &[0, 0, 0]);
    }

    #[test]
    fn test_mismatched_tile_is_rejected() {
        let tiles = vec![
            Tile::new("a", solid(ImageFormat::Mono8, 1)),
            Tile::new("b", ImageBuffer::new(ImageFormat::Mono8, 3, 2, None)),
        ];
        assert!(grid(tiles, 2, &mut NoLabels).is_err());
        assert!(grid(Vec::new(), 2, &mut NoLabels).is_err());
    }
}
