//! Watermark placement.
//!
//! A position is one of:
//!
//! - a gravity (`"center"`, `"north"`, `"south east"`, `"top-left"`, ...),
//!   anchoring the watermark to a side or corner of the thumbnail;
//! - a pair of pixel offsets (`"10 20"`), where a negative offset is measured
//!   from the right or bottom edge (`"-10 -10"` is 10px in from the
//!   bottom-right corner);
//! - `"tile"`, repeating the watermark across the whole thumbnail.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::Geometry;

/// Anchor of a watermark on the thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    /// Top-left corner.
    NorthWest,
    /// Top edge, centered horizontally.
    North,
    /// Top-right corner.
    NorthEast,
    /// Left edge, centered vertically.
    West,
    /// Centered on both axes.
    #[default]
    Center,
    /// Right edge, centered vertically.
    East,
    /// Bottom-left corner.
    SouthWest,
    /// Bottom edge, centered horizontally.
    South,
    /// Bottom-right corner.
    SouthEast,
}

impl Gravity {
    fn name(self) -> &'static str {
        match self {
            Self::NorthWest => "north west",
            Self::North => "north",
            Self::NorthEast => "north east",
            Self::West => "west",
            Self::Center => "center",
            Self::East => "east",
            Self::SouthWest => "south west",
            Self::South => "south",
            Self::SouthEast => "south east",
        }
    }

    /// Top-left offset of a `mark` anchored on `target`.
    ///
    /// Offsets are negative when the mark is larger than the target.
    #[must_use]
    pub fn offset(self, target: Geometry, mark: Geometry) -> (i64, i64) {
        let w1 = i64::from(target.width);
        let h1 = i64::from(target.height);
        let w2 = i64::from(mark.width);
        let h2 = i64::from(mark.height);

        match self {
            Self::Center => ((w1 - w2) / 2, (h1 - h2) / 2),
            Self::North => ((w1 - w2) / 2, 0),
            Self::South => ((w1 - w2) / 2, h1 - h2),
            Self::East => (w1 - w2, (h1 - h2) / 2),
            Self::West => (0, (h1 - h2) / 2),
            Self::NorthEast => (w1 - w2, 0),
            Self::NorthWest => (0, 0),
            Self::SouthEast => (w1 - w2, h1 - h2),
            Self::SouthWest => (0, h1 - h2),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Vertical {
    North,
    South,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Horizontal {
    West,
    East,
}

impl FromStr for Gravity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPosition(s.to_string());
        let normalized = s.to_ascii_lowercase().replace(['-', '_'], " ");

        let mut vertical = None;
        let mut horizontal = None;
        let mut center = false;

        for word in normalized.split_whitespace() {
            let (v, h) = match word {
                "center" | "centre" | "middle" => {
                    center = true;
                    continue;
                }
                "north" | "top" => (Some(Vertical::North), None),
                "south" | "bottom" => (Some(Vertical::South), None),
                "west" | "left" => (None, Some(Horizontal::West)),
                "east" | "right" => (None, Some(Horizontal::East)),
                "northwest" => (Some(Vertical::North), Some(Horizontal::West)),
                "northeast" => (Some(Vertical::North), Some(Horizontal::East)),
                "southwest" => (Some(Vertical::South), Some(Horizontal::West)),
                "southeast" => (Some(Vertical::South), Some(Horizontal::East)),
                _ => return Err(invalid()),
            };
            if (v.is_some() && vertical.is_some()) || (h.is_some() && horizontal.is_some()) {
                return Err(invalid());
            }
            vertical = vertical.or(v);
            horizontal = horizontal.or(h);
        }

        let gravity = match (vertical, horizontal) {
            (None, None) if center => Self::Center,
            (None, None) => return Err(invalid()),
            (Some(Vertical::North), None) => Self::North,
            (Some(Vertical::South), None) => Self::South,
            (None, Some(Horizontal::West)) => Self::West,
            (None, Some(Horizontal::East)) => Self::East,
            (Some(Vertical::North), Some(Horizontal::West)) => Self::NorthWest,
            (Some(Vertical::North), Some(Horizontal::East)) => Self::NorthEast,
            (Some(Vertical::South), Some(Horizontal::West)) => Self::SouthWest,
            (Some(Vertical::South), Some(Horizontal::East)) => Self::SouthEast,
        };
        Ok(gravity)
    }
}

/// Where a watermark is placed on a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Anchored to a side, corner or the center.
    Gravity(Gravity),
    /// Pixel offsets; negative values count from the right/bottom edge.
    Offset {
        /// Horizontal offset.
        x: i64,
        /// Vertical offset.
        y: i64,
    },
    /// Repeated across the whole thumbnail.
    Tile,
}

impl Default for Position {
    fn default() -> Self {
        Self::Gravity(Gravity::default())
    }
}

impl Position {
    /// Top-left corners of every copy of `mark` placed on `target`.
    ///
    /// Tiled placements are produced lazily, row by row.
    #[must_use]
    pub fn placements(&self, target: Geometry, mark: Geometry) -> Placements {
        let state = match *self {
            Self::Gravity(gravity) => State::Single(Some(gravity.offset(target, mark))),
            Self::Offset { x, y } => State::Single(Some((
                from_far_edge(x, target.width, mark.width),
                from_far_edge(y, target.height, mark.height),
            ))),
            Self::Tile if target.is_empty() || mark.is_empty() => State::Single(None),
            Self::Tile => State::Tile {
                target,
                mark,
                x: 0,
                y: 0,
            },
        };
        Placements { state }
    }
}

/// Negative offsets count from the right or bottom edge.
fn from_far_edge(offset: i64, target: u32, mark: u32) -> i64 {
    if offset < 0 {
        (i64::from(target) - i64::from(mark)).saturating_add(offset)
    } else {
        offset
    }
}

/// Iterator over watermark placements, see [`Position::placements`].
#[derive(Debug, Clone)]
pub struct Placements {
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    Single(Option<(i64, i64)>),
    Tile {
        target: Geometry,
        mark: Geometry,
        x: u32,
        y: u32,
    },
}

impl Iterator for Placements {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            State::Single(point) => point.take(),
            State::Tile { target, mark, x, y } => {
                if *y >= target.height {
                    return None;
                }
                let point = (i64::from(*x), i64::from(*y));
                *x = x.saturating_add(mark.width);
                if *x >= target.width {
                    *x = 0;
                    *y = y.saturating_add(mark.height);
                }
                Some(point)
            }
        }
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("tile") {
            return Ok(Self::Tile);
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if let [x, y] = words.as_slice() {
            if let (Ok(x), Ok(y)) = (x.parse::<i32>(), y.parse::<i32>()) {
                return Ok(Self::Offset {
                    x: i64::from(x),
                    y: i64::from(y),
                });
            }
        }

        Gravity::from_str(trimmed).map(Self::Gravity)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gravity(gravity) => f.write_str(gravity.name()),
            Self::Offset { x, y } => write!(f, "{x} {y}"),
            Self::Tile => f.write_str("tile"),
        }
    }
}
