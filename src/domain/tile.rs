/// A single falling tile.
///
/// Tiles carry no position of their own: the vertical position is derived
/// from the tile's index in the run's FIFO and the current scroll offset
/// (see `Rules::tile_top`). That keeps the whole field moving with a
/// single integer update per tick.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub column: usize,
    pub resolved: bool,
}

impl Tile {
    pub fn new(column: usize) -> Self {
        Tile { column, resolved: false }
    }

    /// Mark the tile as hit. Returns false if it was already resolved,
    /// so a tile can only ever score once.
    pub fn resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }

    /// Is this an unresolved tile in the given column?
    #[inline]
    pub fn is_open_in(&self, column: usize) -> bool {
        !self.resolved && self.column == column
    }
}
