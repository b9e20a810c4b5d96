//! Bubble rasterization (CPU, `vello_cpu` + `parley`).

pub mod bubble;
pub mod png;
pub(crate) mod text;

/// A rendered RGBA8 frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = pixel_offset(self.width, x, y);
        let px = [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ];
        Some(if self.premultiplied {
            png::unpremultiply_px(px)
        } else {
            px
        })
    }
}

/// Byte offset of `(x, y)` in a tightly packed RGBA8 buffer. Computed in `usize`; `u32`
/// overflows near the 16-bit canvas limit.
fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}
