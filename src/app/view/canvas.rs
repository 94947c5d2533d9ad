// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/canvas.rs
//
// Drawing surface abstraction: the canvas the overlay paints on and a
// recording implementation hosts can replay.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::geometry::{Point, Rect};
use crate::error::ConfigError;

/// Packed ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Self(0xFF00_0000 | value)),
            8 => Ok(Self(value)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Outline used for clipping and stroking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect(Rect),
    /// Ellipse inscribed in the rectangle.
    Oval(Rect),
}

impl Shape {
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(rect) | Self::Oval(rect) => *rect,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        match self {
            Self::Rect(rect) => rect.contains(point),
            Self::Oval(rect) => {
                let rx = rect.width() / 2.0;
                let ry = rect.height() / 2.0;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let center = rect.center();
                let dx = (point.x - center.x) / rx;
                let dy = (point.y - center.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub from: Point,
    pub to: Point,
}

impl Line {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

/// Immediate-mode drawing target.
///
/// Mirrors the subset of a platform canvas the crop overlay needs. Clip
/// operations intersect with the current clip until the matching `restore`.
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    /// Exclude the interior of `shape` from the clip.
    fn clip_out(&mut self, shape: &Shape);
    /// Restrict the clip to the interior of `shape`.
    fn clip_in(&mut self, shape: &Shape);
    /// Fill the whole clip with `color`.
    fn fill(&mut self, color: Color);
    fn draw_lines(&mut self, lines: &[Line], stroke: Stroke);
    fn stroke(&mut self, shape: &Shape, stroke: Stroke);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    ClipOut(Shape),
    ClipIn(Shape),
    Fill(Color),
    Lines(Vec<Line>, Stroke),
    Stroke(Shape, Stroke),
}

/// Canvas that records commands for later replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Replay the recorded commands onto another canvas.
    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for command in &self.commands {
            match command {
                DrawCommand::Save => canvas.save(),
                DrawCommand::Restore => canvas.restore(),
                DrawCommand::ClipOut(shape) => canvas.clip_out(shape),
                DrawCommand::ClipIn(shape) => canvas.clip_in(shape),
                DrawCommand::Fill(color) => canvas.fill(*color),
                DrawCommand::Lines(lines, stroke) => canvas.draw_lines(lines, *stroke),
                DrawCommand::Stroke(shape, stroke) => canvas.stroke(shape, *stroke),
            }
        }
    }
}

impl Canvas for DisplayList {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn clip_out(&mut self, shape: &Shape) {
        self.commands.push(DrawCommand::ClipOut(*shape));
    }

    fn clip_in(&mut self, shape: &Shape) {
        self.commands.push(DrawCommand::ClipIn(*shape));
    }

    fn fill(&mut self, color: Color) {
        self.commands.push(DrawCommand::Fill(color));
    }

    fn draw_lines(&mut self, lines: &[Line], stroke: Stroke) {
        self.commands.push(DrawCommand::Lines(lines.to_vec(), stroke));
    }

    fn stroke(&mut self, shape: &Shape, stroke: Stroke) {
        self.commands.push(DrawCommand::Stroke(*shape, stroke));
    }
}

/// A drawable bound into the host's view hierarchy.
pub trait Surface {
    /// The host laid the surface out at a new size.
    fn on_bounds_changed(&mut self, width: f32, height: f32);
    /// The host asks for a frame.
    fn on_paint(&mut self, canvas: &mut dyn Canvas);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parsing() {
        assert_eq!("#CC000000".parse::<Color>(), Ok(Color(0xCC00_0000)));
        assert_eq!("#336699".parse::<Color>(), Ok(Color(0xFF33_6699)));
        assert!("336699".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());

        let color = Color::from_argb(0x80, 1, 2, 3);
        assert_eq!((color.alpha(), color.red(), color.green(), color.blue()), (0x80, 1, 2, 3));
        assert_eq!(color.to_string(), "#80010203");
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::WHITE).unwrap();
        assert_eq!(json, "\"#FFFFFFFF\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::WHITE);
    }

    #[test]
    fn oval_contains_only_its_ellipse() {
        let oval = Shape::Oval(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(oval.contains(Point::new(50.0, 25.0)));
        assert!(oval.contains(Point::new(0.0, 25.0)));
        assert!(!oval.contains(Point::new(2.0, 2.0)));
        assert!(Shape::Rect(oval.bounds()).contains(Point::new(2.0, 2.0)));
    }

    #[test]
    fn display_list_replays_in_order() {
        let mut recorded = DisplayList::new();
        recorded.save();
        recorded.fill(Color::WHITE);
        recorded.restore();

        let mut copy = DisplayList::new();
        recorded.replay(&mut copy);
        assert_eq!(copy, recorded);
        assert_eq!(copy.commands().len(), 3);
    }
}
