//! Surface that records draw calls instead of drawing
//!
//! Used by tests and the headless binary. Only the most recent frame is kept;
//! a frame starts whenever the background is drawn.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::{Color, Sprite, Surface, TextStyle};
use crate::sim::geometry::{Circle, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Sprite {
        sprite: Sprite,
        rect: Rect,
    },
    RotatedSprite {
        sprite: Sprite,
        size: Vec2,
        pivot: Vec2,
        angle: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
    },
    StrokeCircle {
        circle: Circle,
        color: Color,
    },
    Text {
        text: String,
        pos: Vec2,
        style: TextStyle,
    },
}

impl DrawCmd {
    pub fn text(&self) -> Option<&str> {
        match self {
            DrawCmd::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    last_frame: Vec<DrawCmd>,
    frames: u32,
}

/// Clones share the same recording
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    inner: Rc<RefCell<Recording>>,
}

impl RecordingSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            inner: Rc::default(),
        }
    }

    /// Commands of the most recent frame
    pub fn commands(&self) -> Vec<DrawCmd> {
        self.inner.borrow().last_frame.clone()
    }

    pub fn frames_drawn(&self) -> u32 {
        self.inner.borrow().frames
    }

    /// Every text drawn in the most recent frame
    pub fn texts(&self) -> Vec<String> {
        self.inner
            .borrow()
            .last_frame
            .iter()
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }

    fn push(&mut self, cmd: DrawCmd) {
        let mut inner = self.inner.borrow_mut();
        if matches!(
            cmd,
            DrawCmd::Sprite {
                sprite: Sprite::Background,
                ..
            }
        ) {
            inner.last_frame.clear();
            inner.frames += 1;
        }
        inner.last_frame.push(cmd);
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn draw_sprite(&mut self, sprite: Sprite, rect: Rect) {
        self.push(DrawCmd::Sprite { sprite, rect });
    }

    fn draw_sprite_rotated(&mut self, sprite: Sprite, size: Vec2, pivot: Vec2, angle: f32) {
        self.push(DrawCmd::RotatedSprite {
            sprite,
            size,
            pivot,
            angle,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCmd::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCmd::StrokeRect { rect, color });
    }

    fn stroke_circle(&mut self, circle: Circle, color: Color) {
        self.push(DrawCmd::StrokeCircle { circle, color });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle) {
        self.push(DrawCmd::Text {
            text: text.to_string(),
            pos,
            style,
        });
    }
}
