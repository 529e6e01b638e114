//! ASCII rendering of the internal grid: dots as ● (black) or ○ (white),
//! vertices as '+', region borders as '-' and '|'.

use crate::board::Board;
use crate::geometry::CellKind;
use crate::puzzle::Puzzle;
use crate::solver::Solution;

pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    for y in 0..board.size_y() {
        for x in 0..board.size_x() {
            let cell = board.cell(x, y);
            if let Some(id) = cell.dot {
                out.push(if board.dots()[id].black { '●' } else { '○' });
            } else {
                out.push(match cell.kind {
                    CellKind::Vertex => '+',
                    CellKind::EdgeVert => {
                        if cell.edge_set {
                            '|'
                        } else {
                            ' '
                        }
                    }
                    CellKind::EdgeHorz => {
                        if cell.edge_set {
                            '-'
                        } else {
                            ' '
                        }
                    }
                    CellKind::Tile => ' ',
                });
            }
        }
        out.push('\n');
    }
    out
}

/// Render a solved state. Borders are drawn on every edge whose flanking
/// tiles belong to different regions or where only one side exists.
pub fn render_solution(puzzle: &Puzzle, solution: &Solution) -> String {
    let w = puzzle.w;
    let h = puzzle.h;
    let sx = puzzle.size_x();
    let sy = puzzle.size_y();
    let at = |tx: i32, ty: i32| solution.grid[(ty * w + tx) as usize];

    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("Puzzle Grid ({}x{}):\n", w, h));
    for _ in 0..sx + 2 {
        out.push('=');
    }
    out.push('\n');

    for y in 0..sy {
        for x in 0..sx {
            if let Some(d) = puzzle.dot_index_at(x, y) {
                out.push(if puzzle.dots[d].black { '●' } else { '○' });
            } else if x % 2 == 0 && y % 2 == 0 {
                out.push('+');
            } else if x % 2 == 0 {
                let tx_left = (x - 2) / 2;
                let tx_right = x / 2;
                let ty = (y - 1) / 2;
                let id_left = if tx_left >= 0 { at(tx_left, ty) } else { -2 };
                let id_right = if tx_right < w { at(tx_right, ty) } else { -2 };
                out.push(if id_left != id_right { '|' } else { ' ' });
            } else if y % 2 == 0 {
                let ty_up = (y - 2) / 2;
                let ty_down = y / 2;
                let tx = (x - 1) / 2;
                let id_up = if ty_up >= 0 { at(tx, ty_up) } else { -2 };
                let id_down = if ty_down < h { at(tx, ty_down) } else { -2 };
                out.push(if id_up != id_down { '-' } else { ' ' });
            } else {
                out.push(' ');
            }
        }
        out.push('\n');
    }

    for _ in 0..sx + 2 {
        out.push('=');
    }
    out.push_str(&format!("\nTotal dots: {}\n", puzzle.dots.len()));
    out
}
