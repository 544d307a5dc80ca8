use rand::{seq::SliceRandom, Rng};
use std::fmt;
use std::str::FromStr;

pub const SIDE: usize = 3;
pub const CELLS: usize = SIDE * SIDE;
pub const BLANK: u8 = 0;

pub const CELL_NAMES: [&str; CELLS] = [
    "Northwest",
    "North",
    "Northeast",
    "West",
    "Center",
    "East",
    "Southwest",
    "South",
    "Southeast",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Right,
    Left,
    Up,
    Down,
}

impl Move {
    // Successor generation order. BFS tie-breaking between equal-length paths depends on it.
    pub const ALL: [Move; 4] = [Move::Right, Move::Left, Move::Up, Move::Down];

    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Move::Right => (0, 1),
            Move::Left => (0, -1),
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Move::Right => "right",
            Move::Left => "left",
            Move::Up => "up",
            Move::Down => "down",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("empty puzzle state")]
    Empty,
    #[error("expected 9 cells, got {0}")]
    WrongLength(usize),
    #[error("tile {value} at position {index} is out of range (0..=8, 0 is the blank)")]
    OutOfRange { index: usize, value: u8 },
    #[error("tile {value} appears more than once")]
    Duplicate { value: u8 },
    #[error("cannot read {0:?} as a tile")]
    InvalidToken(String),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    tiles: [u8; CELLS],
    blank: usize,
}

impl State {
    pub fn new(tiles: [u8; CELLS]) -> Result<Self, StateError> {
        let mut seen = [false; CELLS];
        let mut blank = 0;
        for (index, &value) in tiles.iter().enumerate() {
            if value as usize >= CELLS {
                return Err(StateError::OutOfRange { index, value });
            }
            if std::mem::replace(&mut seen[value as usize], true) {
                return Err(StateError::Duplicate { value });
            }
            if value == BLANK {
                blank = index;
            }
        }

        Ok(Self { tiles, blank })
    }

    pub fn from_slice(cells: &[u8]) -> Result<Self, StateError> {
        if cells.is_empty() {
            return Err(StateError::Empty);
        }
        let tiles: [u8; CELLS] = cells
            .try_into()
            .map_err(|_| StateError::WrongLength(cells.len()))?;
        Self::new(tiles)
    }

    pub fn solved() -> Self {
        Self {
            tiles: [1, 2, 3, 4, 5, 6, 7, 8, BLANK],
            blank: CELLS - 1,
        }
    }

    pub fn tiles(&self) -> &[u8; CELLS] {
        &self.tiles
    }

    pub fn blank_pos(&self) -> usize {
        self.blank
    }

    pub fn apply_move(&mut self, movement: Move) -> bool {
        let (dx, dy) = movement.as_offset();

        let row = (self.blank / SIDE) as isize + dx;
        let col = (self.blank % SIDE) as isize + dy;

        if row >= 0 && row < SIDE as isize && col >= 0 && col < SIDE as isize {
            let target = row as usize * SIDE + col as usize;
            self.tiles.swap(self.blank, target);
            self.blank = target;
            true
        } else {
            false
        }
    }

    pub fn try_move(&self, movement: Move) -> Option<Self> {
        let mut next = *self;
        if next.apply_move(movement) {
            Some(next)
        } else {
            None
        }
    }

    pub fn successors(&self) -> Vec<State> {
        Move::ALL
            .iter()
            .filter_map(|&movement| self.try_move(movement))
            .collect()
    }

    pub fn move_towards(&self, other: &State) -> Option<Move> {
        Move::ALL
            .into_iter()
            .find(|&movement| self.try_move(movement).as_ref() == Some(other))
    }

    pub fn is_adjacent(&self, other: &State) -> bool {
        self.move_towards(other).is_some()
    }

    pub fn inversions(&self) -> usize {
        Self::count_inversions(&self.tiles)
    }

    // Blank moves on an odd-width board never change inversion parity, so two states are
    // connected exactly when their parities agree.
    pub fn can_reach(&self, goal: &State) -> bool {
        self.inversions() % 2 == goal.inversions() % 2
    }

    pub fn shuffled_towards<R: Rng + ?Sized>(goal: &State, rng: &mut R) -> Self {
        let mut tiles = goal.tiles;

        loop {
            tiles.shuffle(rng);
            if Self::count_inversions(&tiles) % 2 == goal.inversions() % 2 {
                break;
            }
        }

        let blank = tiles.iter().position(|&t| t == BLANK).unwrap_or(goal.blank);
        Self { tiles, blank }
    }

    fn count_inversions(tiles: &[u8]) -> usize {
        tiles
            .iter()
            .enumerate()
            .filter(|&(_, &val)| val != BLANK)
            .map(|(i, &val)| {
                tiles[i + 1..]
                    .iter()
                    .filter(|&&next| next != BLANK && next < val)
                    .count()
            })
            .sum()
    }
}

impl FromStr for State {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(parse_cell)
            .collect::<Result<Vec<u8>, _>>()?;
        Self::from_slice(&cells)
    }
}

pub fn parse_cell(token: &str) -> Result<u8, StateError> {
    let token = token.trim();
    if token == "_" || token.eq_ignore_ascii_case("blank") {
        return Ok(BLANK);
    }
    token
        .parse::<u8>()
        .map_err(|_| StateError::InvalidToken(token.to_string()))
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(SIDE) {
            for &val in row {
                if val == BLANK {
                    write!(f, "   ")?;
                } else {
                    write!(f, "{:2} ", val)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, &val) in self.tiles.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", if i % SIDE == 0 { " | " } else { " " })?;
            }
            if val == BLANK {
                write!(f, "_")?;
            } else {
                write!(f, "{}", val)?;
            }
        }
        write!(f, "]")
    }
}
