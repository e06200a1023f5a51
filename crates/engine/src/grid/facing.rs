use super::position::Position;
use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::ops::Neg;

/// One of the four directions a block can point.
///
/// The raw encoding (`Up = 2`, `Down = -2`, `Right = 1`, `Left = -1`) makes
/// negation the opposite direction; any other raw value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::Up, Facing::Right, Facing::Down, Facing::Left];

    pub const fn raw(self) -> i8 {
        match self {
            Facing::Up => 2,
            Facing::Down => -2,
            Facing::Right => 1,
            Facing::Left => -1,
        }
    }

    pub const fn opposite(self) -> Facing {
        match self {
            Facing::Up => Facing::Down,
            Facing::Down => Facing::Up,
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Quarter turn counter-clockwise.
    pub const fn rotate_left(self) -> Facing {
        match self {
            Facing::Up => Facing::Left,
            Facing::Left => Facing::Down,
            Facing::Down => Facing::Right,
            Facing::Right => Facing::Up,
        }
    }

    /// Quarter turn clockwise.
    pub const fn rotate_right(self) -> Facing {
        match self {
            Facing::Up => Facing::Right,
            Facing::Right => Facing::Down,
            Facing::Down => Facing::Left,
            Facing::Left => Facing::Up,
        }
    }

    /// Reflection across a vertical axis: left and right swap.
    pub const fn mirrored(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
            other => other,
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Facing::Left | Facing::Right)
    }

    /// Unit displacement one cell in this direction.
    pub const fn vector(self) -> Position {
        match self {
            Facing::Up => Position::new(0, 1),
            Facing::Down => Position::new(0, -1),
            Facing::Left => Position::new(-1, 0),
            Facing::Right => Position::new(1, 0),
        }
    }

    /// Direction of a displacement, taken along its dominant axis.
    /// Ties (including the zero vector) resolve to `Up`.
    pub const fn from_vector(v: Position) -> Facing {
        let (ax, ay) = (v.x.abs(), v.y.abs());
        if ax > ay {
            if v.x > 0 { Facing::Right } else { Facing::Left }
        } else if ay > ax {
            if v.y > 0 { Facing::Up } else { Facing::Down }
        } else {
            Facing::Up
        }
    }
}

impl Neg for Facing {
    type Output = Facing;

    fn neg(self) -> Facing {
        self.opposite()
    }
}

impl TryFrom<i8> for Facing {
    type Error = GridError;

    fn try_from(raw: i8) -> Result<Self, Self::Error> {
        match raw {
            2 => Ok(Facing::Up),
            -2 => Ok(Facing::Down),
            1 => Ok(Facing::Right),
            -1 => Ok(Facing::Left),
            other => Err(GridError::InvalidFacing(other)),
        }
    }
}

impl From<Facing> for i8 {
    fn from(facing: Facing) -> i8 {
        facing.raw()
    }
}
