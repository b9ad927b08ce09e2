#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use medscan::{Classifier, ImageTensor, PredictionError};

pub const BOUNDARY: &str = "medscan-test-boundary";

/// Returns a canned probability vector and counts how often it was asked.
pub struct StubClassifier {
    output: Result<Vec<f32>, String>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn returning(probabilities: &[f32]) -> Arc<Self> {
        Arc::new(Self {
            output: Ok(probabilities.to_vec()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            output: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(input.shape(), [1, 224, 224, 3]);
        self.output.clone().map_err(PredictionError::Runtime)
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        filename: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File { filename, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn grayscale_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([90])));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("encode test png");
    cursor.into_inner()
}

pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
