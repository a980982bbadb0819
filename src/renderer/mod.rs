//! 2D rendering
//!
//! The scene is drawn through a small [`Surface`] trait in fixed logical
//! coordinates (the tuned surface size). Backends map that onto a real target:
//! a Canvas2D context on the web, a command list in tests and headless runs.

pub mod recording;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;

use crate::sim::geometry::{Circle, Rect};

pub use recording::{DrawCmd, RecordingSurface};
pub use scene::{FrameView, player_tilt, render_frame};

/// Images the scene uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sprite {
    Background,
    Obstacle,
    /// One tile of the scrolling ground strip
    Ground,
    Player,
}

impl Sprite {
    pub const ALL: [Sprite; 4] = [
        Sprite::Background,
        Sprite::Obstacle,
        Sprite::Ground,
        Sprite::Player,
    ];

    /// Image path relative to the page
    pub fn path(&self) -> &'static str {
        match self {
            Sprite::Background => "images/background.png",
            Sprite::Obstacle => "images/pipe.png",
            Sprite::Ground => "images/meander.png",
            Sprite::Player => "images/el-vis.png",
        }
    }

    /// Source image size in pixels
    pub fn native_size(&self) -> Vec2 {
        match self {
            Sprite::Background => Vec2::new(768.0, 1024.0),
            Sprite::Obstacle => Vec2::new(120.0, 1024.0),
            Sprite::Ground => Vec2::new(193.0, 108.0),
            Sprite::Player => Vec2::new(158.0, 56.0),
        }
    }
}

/// RGBA color, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const LIME: Color = Color::rgb(0.0, 1.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba(...)` string
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    /// Big decorative numbers
    Display,
    /// Lists and hints
    Plain,
}

/// How a line of text is drawn; `pos` is the baseline anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub face: FontFace,
}

impl TextStyle {
    pub fn display(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            face: FontFace::Display,
        }
    }

    pub fn plain(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            face: FontFace::Plain,
        }
    }

    /// CSS font shorthand
    pub fn css_font(&self) -> String {
        match self.face {
            FontFace::Display => format!("{}px \"Papyrus\", \"Times New Roman\", serif", self.size),
            FontFace::Plain => format!("{}px Arial", self.size),
        }
    }
}

/// Drawing target in logical surface units. Text is horizontally centered on
/// its anchor.
pub trait Surface {
    /// Logical size drawn into
    fn size(&self) -> Vec2;
    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect);
    /// Draw `sprite` centered on `pivot`, rotated clockwise by `angle` radians
    fn draw_sprite_rotated(&mut self, sprite: Sprite, size: Vec2, pivot: Vec2, angle: f32);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color);
    fn stroke_circle(&mut self, circle: Circle, color: Color);
    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle);
}

/// Largest scale at which `logical` fits inside `viewport`
pub fn letterbox_scale(viewport: Vec2, logical: Vec2) -> f32 {
    let scale = (viewport / logical).min_element();
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}
