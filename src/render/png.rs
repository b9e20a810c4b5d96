use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::{
        error::{BubblecastError, BubblecastResult},
        fs::ensure_parent_dir,
    },
    render::FrameRGBA,
};

pub(crate) fn unpremultiply_px(px: [u8; 4]) -> [u8; 4] {
    let a = px[3] as u16;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8,
        ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8,
        ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8,
        px[3],
    ]
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = unpremultiply_px([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

/// Write `frame` as a straight-alpha RGBA PNG, replacing any existing file.
pub fn save_png(frame: &FrameRGBA, path: &Path) -> BubblecastResult<()> {
    let mut straight = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_in_place(&mut straight);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, straight)
        .ok_or_else(|| BubblecastError::validation("frame buffer does not match width*height*4"))?;

    ensure_parent_dir(path)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpremultiply_restores_straight_channels() {
        assert_eq!(unpremultiply_px([0, 0, 0, 0]), [0, 0, 0, 0]);
        assert_eq!(unpremultiply_px([1, 2, 3, 255]), [1, 2, 3, 255]);
        assert_eq!(unpremultiply_px([64, 0, 0, 128]), [128, 0, 0, 128]);
    }

    #[test]
    fn save_png_writes_straight_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("1.png");
        let frame = FrameRGBA {
            width: 2,
            height: 1,
            data: vec![64, 0, 0, 128, 0, 0, 0, 0],
            premultiplied: true,
        };
        save_png(&frame, &path).unwrap();

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (2, 1));
        assert_eq!(back.get_pixel(0, 0).0, [128, 0, 0, 128]);
        assert_eq!(back.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn save_png_rejects_short_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let frame = FrameRGBA {
            width: 4,
            height: 4,
            data: vec![0; 8],
            premultiplied: false,
        };
        assert!(save_png(&frame, &dir.path().join("x.png")).is_err());
    }
}
