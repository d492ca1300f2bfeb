//! Drawing surface abstraction
//!
//! A small immediate-mode 2D API modelled on the canvas 2D context. The
//! browser build implements it over `CanvasRenderingContext2d`; tests and
//! the native build use `RecordingSurface`.

use glam::Vec2;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::hex(0xffffff);
    pub const BLACK: Rgba = Rgba::hex(0x000000);

    /// Opaque color from packed 0xRRGGBB
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a: 255,
        }
    }

    /// Same color with alpha in 0..=1
    pub fn alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// CSS `rgba()` string
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f32 / 255.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// 2D drawing target
pub trait Surface {
    /// Drawing area in pixels
    fn size(&self) -> Vec2;

    /// Push transform/alpha/glow state
    fn save(&mut self);
    /// Pop to the last `save`
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    /// Global alpha for subsequent draws
    fn set_alpha(&mut self, alpha: f32);
    /// Shadow glow for subsequent draws (0 blur disables)
    fn set_glow(&mut self, color: Rgba, blur: f32);

    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba);
    fn stroke_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, width: f32);
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);
    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Rgba, align: TextAlign);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Translate(Vec2),
    SetAlpha(f32),
    SetGlow { color: Rgba, blur: f32 },
    Clear(Rgba),
    FillRect { pos: Vec2, size: Vec2, color: Rgba },
    StrokeRect { pos: Vec2, size: Vec2, color: Rgba, width: f32 },
    FillCircle { center: Vec2, radius: f32, color: Rgba },
    StrokeCircle { center: Vec2, radius: f32, color: Rgba, width: f32 },
    FillPolygon { points: Vec<Vec2>, color: Rgba },
    Line { from: Vec2, to: Vec2, color: Rgba, width: f32 },
    Text { text: String, pos: Vec2, size: f32, color: Rgba, align: TextAlign },
}

/// Surface that records every call (tests, native headless runs)
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub size: Vec2,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// All translation offsets applied
    pub fn translations(&self) -> Vec<Vec2> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Translate(offset) => Some(*offset),
                _ => None,
            })
            .collect()
    }

    /// All text drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }

    fn set_glow(&mut self, color: Rgba, blur: f32) {
        self.commands.push(DrawCommand::SetGlow { color, blur });
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { pos, size, color });
    }

    fn stroke_rect(&mut self, pos: Vec2, size: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            pos,
            size,
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            width,
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Rgba, align: TextAlign) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            size,
            color,
            align,
        });
    }
}
