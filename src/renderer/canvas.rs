//! Canvas2D surface (WASM only)
//!
//! The scene is drawn in fixed logical units. The canvas backing store is sized
//! to the largest rectangle with the logical aspect ratio that fits the
//! viewport, and a scale transform maps logical units onto it.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Color, Sprite, Surface, TextStyle, letterbox_scale};
use crate::sim::geometry::{Circle, Rect};

/// Clones draw to the same canvas and share the current scale, so the host can
/// keep one to refit on resize.
#[derive(Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<Sprite, HtmlImageElement>,
    logical: Vec2,
    scale: Rc<Cell<f32>>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, logical: Vec2) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let mut images = HashMap::new();
        for sprite in Sprite::ALL {
            let img = HtmlImageElement::new()?;
            img.set_src(sprite.path());
            images.insert(sprite, img);
        }

        let surface = Self {
            canvas,
            ctx,
            images,
            logical,
            scale: Rc::new(Cell::new(1.0)),
        };
        surface.fit_to_viewport();
        Ok(surface)
    }

    pub fn image(&self, sprite: Sprite) -> Option<&HtmlImageElement> {
        self.images.get(&sprite)
    }

    /// Resize the backing store to the viewport, keeping the aspect ratio
    pub fn fit_to_viewport(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let viewport = match window.visual_viewport() {
            Some(vv) => Vec2::new(vv.width() as f32, vv.height() as f32),
            None => Vec2::new(
                window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
                window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
            ),
        };

        let scale = letterbox_scale(viewport, self.logical);
        self.scale.set(scale);
        let backing = self.logical * scale;
        self.canvas.set_width(backing.x.round() as u32);
        self.canvas.set_height(backing.y.round() as u32);
        // Resizing resets context state
        self.ctx.set_image_smoothing_enabled(false);
        log::info!(
            "Canvas fitted to {}x{} (scale {:.3})",
            backing.x.round(),
            backing.y.round(),
            scale
        );
    }

    fn apply_scale(&self) {
        let s = self.scale.get() as f64;
        let _ = self.ctx.set_transform(s, 0.0, 0.0, s, 0.0, 0.0);
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.logical
    }

    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect) {
        if sprite == Sprite::Background {
            self.apply_scale();
        }
        if let Some(img) = self.images.get(&sprite) {
            let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                img,
                rect.min.x as f64,
                rect.min.y as f64,
                rect.width() as f64,
                rect.height() as f64,
            );
        }
    }

    fn draw_sprite_rotated(&mut self, sprite: Sprite, size: Vec2, pivot: Vec2, angle: f32) {
        let Some(img) = self.images.get(&sprite) else {
            return;
        };
        self.ctx.save();
        let _ = self.ctx.translate(pivot.x as f64, pivot.y as f64);
        let _ = self.ctx.rotate(angle as f64);
        let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img,
            -size.x as f64 / 2.0,
            -size.y as f64 / 2.0,
            size.x as f64,
            size.y as f64,
        );
        self.ctx.restore();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.width() as f64,
            rect.height() as f64,
        );
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(2.0);
        self.ctx.stroke_rect(
            rect.min.x as f64,
            rect.min.y as f64,
            rect.width() as f64,
            rect.height() as f64,
        );
    }

    fn stroke_circle(&mut self, circle: Circle, color: Color) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            circle.center.x as f64,
            circle.center.y as f64,
            circle.radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(2.0);
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle) {
        self.ctx.set_font(&style.css_font());
        self.ctx.set_fill_style_str(&style.color.to_css());
        self.ctx.set_text_align("center");
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }
}
