use std::path::Path;

use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::DynamicImage;
use ndarray::{Array4, ArrayView4};

use crate::error::ImageProcessingError;

pub const IMG_HEIGHT: u32 = 224;
pub const IMG_WIDTH: u32 = 224;
pub const CHANNELS: usize = 3;

/// Normalized NHWC input of shape (1, 224, 224, 3), values in [0, 1].
#[derive(Debug, Clone)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        let dims = self.0.dim();
        [dims.0, dims.1, dims.2, dims.3]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Same values laid out channel-first, (1, 3, 224, 224).
    pub fn to_nchw(&self) -> Array4<f32> {
        self.0.view().permuted_axes([0, 3, 1, 2]).as_standard_layout().to_owned()
    }
}

/// Decodes the file at `path` and turns it into a model input tensor.
///
/// The format is sniffed from the file contents, so uploads saved without an
/// extension decode the same way as files picked from disk.
pub fn preprocess_image(path: impl AsRef<Path>) -> Result<ImageTensor, ImageProcessingError> {
    let img = ImageReader::open(path.as_ref())?
        .with_guessed_format()?
        .decode()?;
    preprocess_dynamic(&img)
}

pub fn preprocess_dynamic(img: &DynamicImage) -> Result<ImageTensor, ImageProcessingError> {
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, IMG_WIDTH, IMG_HEIGHT, FilterType::Triangle);

    let values: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();

    let tensor = Array4::from_shape_vec(
        (1, IMG_HEIGHT as usize, IMG_WIDTH as usize, CHANNELS),
        values,
    )?;
    Ok(ImageTensor(tensor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

    fn assert_valid(tensor: &ImageTensor) {
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(512, 512, Luma([255])));
        let tensor = preprocess_dynamic(&img).unwrap();
        assert_valid(&tensor);
        assert!(tensor.view().iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn rgba_and_odd_sizes_are_resized() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(37, 1001));
        assert_valid(&preprocess_dynamic(&img).unwrap());

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 128, 255])));
        let tensor = preprocess_dynamic(&img).unwrap();
        assert_valid(&tensor);
        let px = tensor.view();
        assert!(px[[0, 100, 100, 0]].abs() < 1e-6);
        assert!((px[[0, 100, 100, 1]] - 128.0 / 255.0).abs() < 1e-6);
        assert!((px[[0, 100, 100, 2]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn nchw_moves_channels_forward() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])));
        let nchw = preprocess_dynamic(&img).unwrap().to_nchw();
        assert_eq!(nchw.dim(), (1, 3, 224, 224));
        assert!((nchw[[0, 0, 5, 7]] - 1.0).abs() < 1e-6);
        assert!(nchw[[0, 1, 5, 7]].abs() < 1e-6);
    }

    #[test]
    fn extensionless_png_is_sniffed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload");
        RgbImage::from_pixel(300, 200, Rgb([10, 20, 30]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        assert_valid(&preprocess_image(&path).unwrap());
    }

    #[test]
    fn garbage_file_reports_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"definitely not pixels").unwrap();
        let err = preprocess_image(&path).unwrap_err();
        assert!(err.to_string().starts_with("Error processing image: "));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = preprocess_image("/nonexistent/scan.png").unwrap_err();
        assert!(matches!(err, ImageProcessingError::Io(_)));
    }
}
