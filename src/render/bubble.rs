use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vello_cpu::kurbo::{Affine, Rect, Stroke};

use crate::{
    cast::{BubbleStyle, Cast, Rgba},
    foundation::{
        error::{BubblecastError, BubblecastResult},
        fs::{ensure_dir, prune_numbered_above},
    },
    render::{FrameRGBA, png::save_png, text::TextLayoutEngine},
    script::{Script, ScriptLine},
};

/// Options for the bubble rendering stage.
#[derive(Clone, Debug)]
pub struct BubbleOpts {
    pub out_dir: PathBuf,
    pub font: PathBuf,
    pub font_size: f32,
    pub width: u32,
    pub height: u32,
}

/// Rasterizes one chat bubble per utterance on a transparent canvas.
pub struct BubbleRenderer {
    width: u16,
    height: u16,
    font_size: f32,
    text: TextLayoutEngine,
    ctx: Option<vello_cpu::RenderContext>,
}

impl BubbleRenderer {
    pub fn new(
        font_bytes: Vec<u8>,
        font_size: f32,
        width: u32,
        height: u32,
    ) -> BubblecastResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| BubblecastError::validation("canvas width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| BubblecastError::validation("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(BubblecastError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            font_size,
            text: TextLayoutEngine::with_font(font_bytes)?,
            ctx: None,
        })
    }

    /// Load the font file once and build a renderer around it.
    pub fn from_font_file(
        path: &Path,
        font_size: f32,
        width: u32,
        height: u32,
    ) -> BubblecastResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            BubblecastError::resource(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::new(bytes, font_size, width, height).map_err(|e| match e {
            BubblecastError::Resource(msg) => {
                BubblecastError::resource(format!("font '{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn font_family(&self) -> &str {
        self.text.family_name()
    }

    pub fn render(&mut self, text: &str, style: &BubbleStyle) -> BubblecastResult<FrameRGBA> {
        let geometry = style.geometry(u32::from(self.width), u32::from(self.height));
        let layout = self
            .text
            .layout_line(text, self.font_size, style.text_color.into())?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();

        ctx.set_transform(Affine::IDENTITY);
        ctx.set_paint(color(style.fill));
        ctx.fill_rect(&geometry.rect);

        if style.outline_width > 0.0 {
            // Keep the stroke inside the bubble bounds.
            let half = style.outline_width / 2.0;
            let inner = Rect::new(
                geometry.rect.x0 + half,
                geometry.rect.y0 + half,
                geometry.rect.x1 - half,
                geometry.rect.y1 - half,
            );
            ctx.set_stroke(Stroke::new(style.outline_width));
            ctx.set_paint(color(style.outline));
            ctx.stroke_rect(&inner);
        }

        ctx.set_transform(Affine::translate((
            geometry.text_origin.x,
            geometry.text_origin.y,
        )));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(self.text.font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn color([r, g, b, a]: Rgba) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

/// Path of the bubble image for a script line.
pub fn bubble_path(dir: &Path, line: &ScriptLine) -> PathBuf {
    dir.join(format!("{}.png", line.index))
}

/// Render `<out_dir>/<index>.png` for every script line, overwriting existing files.
///
/// Images numbered past the last line are removed.
#[tracing::instrument(skip_all, fields(lines = script.len(), out_dir = %opts.out_dir.display()))]
pub fn render_bubbles(
    script: &Script,
    cast: &Cast,
    opts: &BubbleOpts,
) -> BubblecastResult<Vec<PathBuf>> {
    let mut renderer =
        BubbleRenderer::from_font_file(&opts.font, opts.font_size, opts.width, opts.height)?;
    ensure_dir(&opts.out_dir)?;

    let mut written = Vec::with_capacity(script.len());
    for line in script {
        let profile = cast.profile_of(&line.speaker);
        let frame = renderer.render(&line.text, &profile.bubble)?;
        let path = bubble_path(&opts.out_dir, line);
        save_png(&frame, &path)?;
        debug!(
            index = line.index,
            speaker = %line.speaker,
            side = ?profile.bubble.side,
            "rendered bubble"
        );
        written.push(path);
    }

    let pruned = prune_numbered_above(&opts.out_dir, "png", written.len())?;
    info!(
        count = written.len(),
        pruned,
        font = renderer.font_family(),
        "rendered chat bubbles"
    );
    Ok(written)
}
