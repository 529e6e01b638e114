//! Pure functions over the internal coordinate system.
//!
//! A puzzle of user size W x H lives on an internal grid of size
//! (2W+1) x (2H+1). Cells with both coordinates odd are tiles, both even
//! are vertices, and the rest are edges between tiles. Tile (tx, ty) in
//! tile space has internal center (2*tx+1, 2*ty+1).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Tile,
    EdgeHorz,
    EdgeVert,
    Vertex,
}

impl CellKind {
    pub fn is_edge(self) -> bool {
        self == CellKind::EdgeHorz || self == CellKind::EdgeVert
    }
}

pub fn classify(x: i32, y: i32) -> CellKind {
    match (x % 2 != 0, y % 2 != 0) {
        (true, true) => CellKind::Tile,
        (false, false) => CellKind::Vertex,
        (true, false) => CellKind::EdgeHorz,
        (false, true) => CellKind::EdgeVert,
    }
}

/// Mirror an internal cell about a dot. The result may be out of bounds.
pub fn symmetric_cell(dot: (i32, i32), cell: (i32, i32)) -> (i32, i32) {
    (2 * dot.0 - cell.0, 2 * dot.1 - cell.1)
}

/// Mirror a tile (tile-space coordinates) about a dot (internal
/// coordinates). The result may be out of bounds.
pub fn symmetric_tile(dot: (i32, i32), tile: (i32, i32)) -> (i32, i32) {
    let cx = 2 * tile.0 + 1;
    let cy = 2 * tile.1 + 1;
    let (rx, ry) = symmetric_cell(dot, (cx, cy));
    ((rx - 1) / 2, (ry - 1) / 2)
}

/// A tile touches a dot iff the dot lies on the tile's center, one of its
/// edges, or one of its corners.
pub fn touches_dot(dot: (i32, i32), tile: (i32, i32)) -> bool {
    let cx = 2 * tile.0 + 1;
    let cy = 2 * tile.1 + 1;
    (cx - dot.0).abs() <= 1 && (cy - dot.1).abs() <= 1
}

/// Half-extents of the neighborhood a dot of the given cell kind must keep
/// clear of other dots, associated tiles and interior edges.
pub fn feasible_extent(kind: CellKind) -> (i32, i32) {
    match kind {
        CellKind::Tile => (1, 1),
        CellKind::EdgeHorz => (1, 2),
        CellKind::EdgeVert => (2, 1),
        CellKind::Vertex => (2, 2),
    }
}
