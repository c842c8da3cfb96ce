use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let bitmap = decode_image(&buf).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (1, 1));
    assert_eq!(
        bitmap.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn garbage_bytes_are_an_error() {
    assert!(decode_image(b"definitely not an image").is_err());
}

#[test]
fn bitmaps_get_distinct_ids() {
    let a = Bitmap::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let b = Bitmap::solid(2, 2, [255, 0, 0, 255]).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.rgba8_premul.len(), 16);
}

#[test]
fn length_mismatch_is_an_asset_error() {
    let err = Bitmap::from_premul_rgba8(2, 2, vec![0; 3]).unwrap_err();
    assert!(err.to_string().starts_with("asset error:"));
}
