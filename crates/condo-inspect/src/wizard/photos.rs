use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// Raw file selected by the inspector.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            bytes,
        }
    }
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// Turn image bytes into a `data:` URL. Anything that does not decode as a
/// supported image yields `None`.
pub fn encode_data_url(bytes: &[u8]) -> Option<String> {
    let format = image::guess_format(bytes).ok()?;
    let mime = mime_for(format)?;
    image::load_from_memory_with_format(bytes, format).ok()?;
    Some(format!(
        "data:{mime};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    ))
}

/// Decode off the async executor. Malformed files are dropped silently.
pub async fn decode_photo(upload: PhotoUpload) -> Option<String> {
    let PhotoUpload { name, bytes } = upload;
    let size = bytes.len();
    let encoded = tokio::task::spawn_blocking(move || encode_data_url(&bytes))
        .await
        .ok()
        .flatten();

    if encoded.is_none() {
        debug!(
            name = name.as_deref().unwrap_or("unnamed"),
            size,
            "photo skipped: not a readable image"
        );
    }
    encoded
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(buffer)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn png_becomes_data_url() {
        let url = encode_data_url(&png_bytes(4, 4)).expect("valid png");
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(encode_data_url(b"definitely not an image").is_none());
        let truncated_png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert!(encode_data_url(&truncated_png).is_none());
    }

    #[tokio::test]
    async fn decode_runs_off_thread() {
        let decoded = decode_photo(PhotoUpload::new("hall.png", png_bytes(2, 3))).await;
        assert!(decoded.is_some());
        assert!(decode_photo(PhotoUpload::new("notes.txt", b"hello".to_vec()))
            .await
            .is_none());
    }
}
