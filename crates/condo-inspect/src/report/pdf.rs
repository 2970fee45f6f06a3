//! PDF assembly: one JPEG image XObject drawn across as many A4 portrait
//! pages as its height requires.

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const MM_TO_PT: f64 = 72.0 / 25.4;
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
const JPEG_QUALITY: u8 = 90;
const IMAGE_NAME: &str = "Im0";

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("bitmap could not be decoded: {0}")]
    Decode(image::ImageError),
    #[error("bitmap has no area")]
    EmptyBitmap,
    #[error("bitmap could not be re-encoded: {0}")]
    Encode(image::ImageError),
    #[error("document could not be written: {0}")]
    Write(String),
}

/// Page layout for a bitmap scaled to the fixed page width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub image_height_mm: f64,
    pub page_count: usize,
}

impl PageGeometry {
    pub fn for_bitmap(width_px: u32, height_px: u32) -> Option<Self> {
        if width_px == 0 || height_px == 0 {
            return None;
        }
        let image_height_mm = f64::from(height_px) * PAGE_WIDTH_MM / f64::from(width_px);
        let page_count = ((image_height_mm / PAGE_HEIGHT_MM) - 1e-9).ceil().max(1.0) as usize;
        Some(Self {
            page_width_mm: PAGE_WIDTH_MM,
            page_height_mm: PAGE_HEIGHT_MM,
            image_height_mm,
            page_count,
        })
    }
}

/// Embedded document plus the layout it was built with.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub bytes: Vec<u8>,
    pub geometry: PageGeometry,
}

pub fn bitmap_to_pdf(bitmap: &[u8]) -> Result<PdfDocument, PdfError> {
    let decoded = image::load_from_memory(bitmap).map_err(PdfError::Decode)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    let geometry = PageGeometry::for_bitmap(width, height).ok_or(PdfError::EmptyBitmap)?;

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
        .map_err(PdfError::Encode)?;

    let bytes = assemble(jpeg, width, height, &geometry)?;
    Ok(PdfDocument { bytes, geometry })
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

// One shared image XObject; every page draws it shifted up by one page height.
fn assemble(
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, PdfError> {
    let page_width = geometry.page_width_mm * MM_TO_PT;
    let page_height = geometry.page_height_mm * MM_TO_PT;
    let image_height = geometry.image_height_mm * MM_TO_PT;

    let mut document = Document::with_version("1.4");
    let pages_id = document.new_object_id();
    let image_id = document.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let mut kids = Vec::with_capacity(geometry.page_count);
    for index in 0..geometry.page_count {
        let offset_y = page_height - image_height + index as f64 * page_height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(page_width),
                        Object::Integer(0),
                        Object::Integer(0),
                        real(image_height),
                        Object::Integer(0),
                        real(offset_y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|err| PdfError::Write(err.to_string()))?;
        let content_id = document.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(page_width),
                real(page_height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { IMAGE_NAME => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => geometry.page_count as i64,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|err| PdfError::Write(err.to_string()))?;
    Ok(bytes)
}
