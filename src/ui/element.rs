//! # UI Element Wire Records
//!
//! Encoders for the operator-client display records carried by inter-robot
//! frames: graphics, character strings and deletions.
//!
//! A graphic record is 15 bytes: a 3-byte element name followed by three
//! little-endian u32 configuration words with these bit fields:
//!
//! ```text
//! word0: operation[0..3) | shape[3..6) | layer[6..10) | color[10..14)
//!        | start_angle[14..23) | end_angle[23..32)
//! word1: line_width[0..10) | start_x[10..21) | start_y[21..32)
//! word2: radius[0..10) | end_x[10..21) | end_y[21..32)
//! ```
//!
//! Field packing is explicit; native struct layout is never written to the
//! wire.

use crate::error::{RefereeLinkError, Result};

/// Graphic record size on the wire
pub const GRAPHIC_WIRE_SIZE: usize = 15;

/// String record size on the wire (graphic record + content bytes)
pub const STRING_WIRE_SIZE: usize = GRAPHIC_WIRE_SIZE + STRING_MAX_LEN;

/// Delete record size on the wire
pub const DELETE_WIRE_SIZE: usize = 2;

/// Fixed string content capacity; shorter text is zero-padded
pub const STRING_MAX_LEN: usize = 30;

/// Drawing operation for a graphic or string record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicOp {
    /// Create a new on-screen element
    Add = 1,

    /// Replace an element previously drawn with the same name
    Rewrite = 2,

    /// Remove one element by name
    Delete = 3,
}

/// Shape selector for a graphic record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Line = 0,
    Rectangle = 1,
    Circle = 2,
    Ellipse = 3,
    Arc = 4,
    Float = 5,
    Int = 6,
    Char = 7,
}

/// Pen color for a graphic record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Own team color (red or blue, chosen by the client)
    TeamMain = 0,
    Yellow = 1,
    Green = 2,
    Orange = 3,
    Purple = 4,
    Pink = 5,
    Cyan = 6,
    Black = 7,
    White = 8,
}

/// One drawable graphic element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicElement {
    pub name: [u8; 3],
    pub op: GraphicOp,
    pub shape: Shape,
    pub layer: u8,
    pub color: Color,
    pub start_angle: u16,
    pub end_angle: u16,
    pub line_width: u16,
    pub start_x: u16,
    pub start_y: u16,
    pub radius: u16,
    pub end_x: u16,
    pub end_y: u16,
}

impl GraphicElement {
    /// A straight line from (x0, y0) to (x1, y1)
    pub fn line(
        name: &str,
        op: GraphicOp,
        layer: u8,
        color: Color,
        line_width: u16,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Self {
        Self {
            name: name_bytes(name),
            op,
            shape: Shape::Line,
            layer,
            color,
            start_angle: 0,
            end_angle: 0,
            line_width,
            start_x: x0,
            start_y: y0,
            radius: 0,
            end_x: x1,
            end_y: y1,
        }
    }

    /// An axis-aligned rectangle with corners (x0, y0) and (x1, y1)
    pub fn rectangle(
        name: &str,
        op: GraphicOp,
        layer: u8,
        color: Color,
        line_width: u16,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Self {
        Self {
            shape: Shape::Rectangle,
            ..Self::line(name, op, layer, color, line_width, x0, y0, x1, y1)
        }
    }

    /// A circular arc centered on (cx, cy), angles in degrees clockwise from
    /// twelve o'clock
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        name: &str,
        op: GraphicOp,
        layer: u8,
        color: Color,
        start_angle: u16,
        end_angle: u16,
        line_width: u16,
        cx: u16,
        cy: u16,
        rx: u16,
        ry: u16,
    ) -> Self {
        Self {
            name: name_bytes(name),
            op,
            shape: Shape::Arc,
            layer,
            color,
            start_angle: start_angle.min(360),
            end_angle: end_angle.min(360),
            line_width,
            start_x: cx,
            start_y: cy,
            radius: 0,
            end_x: rx,
            end_y: ry,
        }
    }

    /// A circle centered on (cx, cy)
    pub fn circle(
        name: &str,
        op: GraphicOp,
        layer: u8,
        color: Color,
        line_width: u16,
        cx: u16,
        cy: u16,
        radius: u16,
    ) -> Self {
        Self {
            name: name_bytes(name),
            op,
            shape: Shape::Circle,
            layer,
            color,
            start_angle: 0,
            end_angle: 0,
            line_width,
            start_x: cx,
            start_y: cy,
            radius,
            end_x: 0,
            end_y: 0,
        }
    }

    /// Encode into the 15-byte wire record
    pub fn encode(&self) -> [u8; GRAPHIC_WIRE_SIZE] {
        let mut record = [0u8; GRAPHIC_WIRE_SIZE];
        record[..3].copy_from_slice(&self.name);

        let word0 = (self.op as u32 & 0x7)
            | ((self.shape as u32 & 0x7) << 3)
            | ((self.layer as u32 & 0xF) << 6)
            | ((self.color as u32 & 0xF) << 10)
            | ((self.start_angle as u32 & 0x1FF) << 14)
            | ((self.end_angle as u32 & 0x1FF) << 23);
        let word1 = (self.line_width as u32 & 0x3FF)
            | ((self.start_x as u32 & 0x7FF) << 10)
            | ((self.start_y as u32 & 0x7FF) << 21);
        let word2 = (self.radius as u32 & 0x3FF)
            | ((self.end_x as u32 & 0x7FF) << 10)
            | ((self.end_y as u32 & 0x7FF) << 21);

        record[3..7].copy_from_slice(&word0.to_le_bytes());
        record[7..11].copy_from_slice(&word1.to_le_bytes());
        record[11..15].copy_from_slice(&word2.to_le_bytes());
        record
    }
}

/// One drawable character string
///
/// The wire record has a fixed content capacity; construction rejects text
/// longer than [`STRING_MAX_LEN`] bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringElement {
    pub name: [u8; 3],
    pub op: GraphicOp,
    pub layer: u8,
    pub color: Color,
    pub font_size: u16,
    pub line_width: u16,
    pub x: u16,
    pub y: u16,
    text: [u8; STRING_MAX_LEN],
    text_len: u8,
}

impl StringElement {
    /// Build a string element at (x, y)
    ///
    /// # Errors
    ///
    /// Returns an error if `text` exceeds [`STRING_MAX_LEN`] bytes.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        op: GraphicOp,
        layer: u8,
        color: Color,
        font_size: u16,
        line_width: u16,
        x: u16,
        y: u16,
        text: &str,
    ) -> Result<Self> {
        if text.len() > STRING_MAX_LEN {
            return Err(RefereeLinkError::Protocol(format!(
                "string content {} bytes exceeds maximum {}",
                text.len(),
                STRING_MAX_LEN
            )));
        }

        let mut content = [0u8; STRING_MAX_LEN];
        content[..text.len()].copy_from_slice(text.as_bytes());

        Ok(Self {
            name: name_bytes(name),
            op,
            layer,
            color,
            font_size,
            line_width,
            x,
            y,
            text: content,
            text_len: text.len() as u8,
        })
    }

    pub fn text(&self) -> &[u8] {
        &self.text[..self.text_len as usize]
    }

    /// Encode into the 45-byte wire record
    ///
    /// The leading graphic record uses shape `Char` with the font size in the
    /// start-angle field and the content length in the end-angle field.
    pub fn encode(&self) -> [u8; STRING_WIRE_SIZE] {
        let graphic = GraphicElement {
            name: self.name,
            op: self.op,
            shape: Shape::Char,
            layer: self.layer,
            color: self.color,
            start_angle: self.font_size,
            end_angle: self.text_len as u16,
            line_width: self.line_width,
            start_x: self.x,
            start_y: self.y,
            radius: 0,
            end_x: 0,
            end_y: 0,
        };

        let mut record = [0u8; STRING_WIRE_SIZE];
        record[..GRAPHIC_WIRE_SIZE].copy_from_slice(&graphic.encode());
        record[GRAPHIC_WIRE_SIZE..].copy_from_slice(&self.text);
        record
    }
}

/// Deletion scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteKind {
    /// Remove every element on one layer
    Layer = 1,

    /// Clear the whole display
    All = 2,
}

/// One pending deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOp {
    pub kind: DeleteKind,
    pub layer: u8,
}

impl DeleteOp {
    /// Delete every element on `layer`
    pub fn layer(layer: u8) -> Self {
        Self {
            kind: DeleteKind::Layer,
            layer,
        }
    }

    /// Clear the whole display
    pub fn all() -> Self {
        Self {
            kind: DeleteKind::All,
            layer: 0,
        }
    }

    /// Encode into the 2-byte wire record
    pub fn encode(&self) -> [u8; DELETE_WIRE_SIZE] {
        [self.kind as u8, self.layer]
    }
}

fn name_bytes(name: &str) -> [u8; 3] {
    let mut bytes = [0u8; 3];
    let take = name.len().min(3);
    bytes[..take].copy_from_slice(&name.as_bytes()[..take]);
    bytes
}
