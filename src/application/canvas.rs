use anyhow::Result;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;

/// 解码后的画布内容
pub struct DrawingContent {
    pub width: u32,
    pub height: u32,
    pub bytes: Bytes,
}

pub struct CanvasService;

impl CanvasService {
    /// 生成一张透明的方形空白画布
    pub fn blank_canvas(size: u32) -> Result<Bytes> {
        let canvas = DynamicImage::ImageRgba8(RgbaImage::new(size, size));
        let mut output = Cursor::new(Vec::new());
        canvas.write_to(&mut output, ImageFormat::Png)?;
        Ok(Bytes::from(output.into_inner()))
    }

    /// 确保内容为 PNG 编码, 其他图片格式会被重新编码
    pub fn ensure_png(data: &[u8]) -> Result<Bytes> {
        if image::guess_format(data)? == ImageFormat::Png {
            return Ok(Bytes::copy_from_slice(data));
        }
        let img = image::load_from_memory(data)?;
        let mut output = Cursor::new(Vec::new());
        img.write_to(&mut output, ImageFormat::Png)?;
        Ok(Bytes::from(output.into_inner()))
    }

    /// 解码并返回带尺寸的画布内容
    pub fn content_from_bytes(data: Bytes) -> Result<DrawingContent> {
        let img = image::load_from_memory(&data)?;
        let (width, height) = img.dimensions();
        Ok(DrawingContent {
            width,
            height,
            bytes: data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_canvas_is_square_transparent_png() {
        let bytes = CanvasService::blank_canvas(16).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.to_rgba8().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn ensure_png_passes_png_through_unchanged() {
        let original = CanvasService::blank_canvas(8).unwrap();
        let ensured = CanvasService::ensure_png(&original).unwrap();
        assert_eq!(original, ensured);
    }

    #[test]
    fn ensure_png_reencodes_other_formats() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let ensured = CanvasService::ensure_png(jpeg.get_ref()).unwrap();
        assert_eq!(image::guess_format(&ensured).unwrap(), ImageFormat::Png);
        let reloaded = image::load_from_memory(&ensured).unwrap();
        assert_eq!(reloaded.dimensions(), (8, 8));
    }

    #[test]
    fn ensure_png_rejects_non_image_bytes() {
        assert!(CanvasService::ensure_png(b"not an image").is_err());
    }

    #[test]
    fn content_from_bytes_reports_dimensions() {
        let bytes = CanvasService::blank_canvas(12).unwrap();
        let content = CanvasService::content_from_bytes(bytes.clone()).unwrap();
        assert_eq!((content.width, content.height), (12, 12));
        assert_eq!(content.bytes, bytes);
    }
}
