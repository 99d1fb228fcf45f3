//! Sample photos and style prompts for API tests

#![allow(dead_code)]

use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A style from the catalogue with the prompt the UI sends for it.
#[derive(Debug, Clone)]
pub struct StyleFixture {
    pub style_id: &'static str,
    pub prompt: &'static str,
    pub gender: &'static str,
}

pub const STYLE_FIXTURES: &[StyleFixture] = &[
    StyleFixture {
        style_id: "curtain-bangs",
        prompt: "soft curtain bangs framing the face, shoulder-length layers",
        gender: "female",
    },
    StyleFixture {
        style_id: "textured-crop",
        prompt: "short textured crop with a low skin fade",
        gender: "male",
    },
    StyleFixture {
        style_id: "buzz-cut",
        prompt: "even number two buzz cut",
        gender: "neutral",
    },
];

/// A small JPEG "portrait" encoded in memory.
pub fn portrait_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

pub fn portrait_data_uri() -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(portrait_jpeg())
    )
}
