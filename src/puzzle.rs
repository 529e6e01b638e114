//! Puzzle model and the Game-ID text format.
//!
//! A Game-ID is `WxH:<data>` where `<data>` scans the internal
//! (2W+1) x (2H+1) grid in row-major order: 'M' is a white dot, 'B' a
//! black dot, and 'a'..'z' skip 1..26 empty cells. The encoder always
//! flushes the trailing empty run; the decoder also accepts data that
//! stops after the last dot (legacy writers omit the tail).

use crate::board::Board;
use crate::serializer::{Choice, Combinator, Dict, Seq, Spaces};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dot {
    pub x: i32,
    pub y: i32,
    pub black: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Puzzle {
    pub w: i32,
    pub h: i32,
    pub dots: Vec<Dot>,
}

impl Puzzle {
    pub fn new(w: i32, h: i32, dots: Vec<Dot>) -> Puzzle {
        Puzzle { w, h, dots }
    }

    /// Freeze a generated board into a puzzle. Dots are indexed in
    /// row-major order of the internal grid, independent of the order in
    /// which the generator placed them.
    pub fn from_board(board: &Board) -> Puzzle {
        let mut dots = vec![];
        for y in 0..board.size_y() {
            for x in 0..board.size_x() {
                if let Some(id) = board.cell(x, y).dot {
                    dots.push(Dot {
                        x,
                        y,
                        black: board.dots()[id].black,
                    });
                }
            }
        }
        Puzzle {
            w: board.width(),
            h: board.height(),
            dots,
        }
    }

    pub fn size_x(&self) -> i32 {
        2 * self.w + 1
    }

    pub fn size_y(&self) -> i32 {
        2 * self.h + 1
    }

    pub fn dot_index_at(&self, x: i32, y: i32) -> Option<usize> {
        self.dots.iter().position(|d| d.x == x && d.y == y)
    }
}

/// Cell alphabet: `Some(black)` for a dot, `None` for anything else.
fn cell_combinator() -> impl Combinator<Option<bool>> {
    Choice::new(vec![
        Box::new(Dict::new(Some(false), 'M')),
        Box::new(Dict::new(Some(true), 'B')),
        Box::new(Spaces::new(None, 'a')),
    ])
}

pub fn puzzle_to_game_id(puzzle: &Puzzle) -> Option<String> {
    let sx = puzzle.size_x();
    let sy = puzzle.size_y();
    if puzzle.w < 1 || puzzle.h < 1 {
        return None;
    }

    let mut cells: Vec<Option<bool>> = vec![None; (sx * sy) as usize];
    for dot in &puzzle.dots {
        if !(0 <= dot.x && dot.x < sx && 0 <= dot.y && dot.y < sy) {
            return None;
        }
        let i = (dot.y * sx + dot.x) as usize;
        if cells[i].is_some() {
            return None;
        }
        cells[i] = Some(dot.black);
    }

    let combinator = Seq::new(cell_combinator(), cells.len());
    let (_, body) = combinator.serialize(&cells)?;

    String::from_utf8(body)
        .ok()
        .map(|body| format!("{}x{}:{}", puzzle.w, puzzle.h, body))
}

pub fn game_id_to_puzzle(id: &str) -> Option<Puzzle> {
    let colon = id.find(':')?;
    let dims = &id[..colon];
    let xpos = dims.find('x')?;
    let w = dims[..xpos].parse::<i32>().ok()?;
    let h = dims[xpos + 1..].parse::<i32>().ok()?;
    if w < 1 || h < 1 {
        return None;
    }

    let sx = 2 * w + 1;
    let sy = 2 * h + 1;
    let total = (sx * sy) as usize;
    let body = id[colon + 1..].as_bytes();

    let combinator = cell_combinator();
    let mut cells: Vec<Option<bool>> = vec![];
    let mut ofs = 0;
    while cells.len() < total && ofs < body.len() {
        let (n_read, part) = combinator.deserialize(&body[ofs..])?;
        ofs += n_read;
        cells.extend(part);
    }
    if ofs < body.len() {
        // Data left over once the grid is full.
        return None;
    }
    // A final run letter may overshoot the grid end; a short body leaves
    // the tail empty.
    cells.truncate(total);

    let mut dots = vec![];
    for (i, cell) in cells.iter().enumerate() {
        if let Some(black) = *cell {
            dots.push(Dot {
                x: i as i32 % sx,
                y: i as i32 / sx,
                black,
            });
        }
    }

    Some(Puzzle { w, h, dots })
}
