// Grid model: board geometry, boundary policy and the fixed neighbor order
//
// Every strategy expands neighbors through `Grid` so traversal order and
// boundary handling stay identical across DFS, UCS, A*, the local-search
// heuristics and minimax.

use std::collections::HashSet;

use crate::error::EngineError;
use crate::types::{BoundaryPolicy, Coord, Direction, GridDimensions, ReversalPolicy};

/// Cells treated as occupied by every search component
pub type ObstacleSet = HashSet<Coord>;

/// Default expansion order: left, right, up, down
pub const DEFAULT_EXPANSION_ORDER: [Direction; 4] =
    [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

/// Movement model consumed by every strategy
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dims: GridDimensions,
    boundary: BoundaryPolicy,
    reversal: ReversalPolicy,
    order: [Direction; 4],
}

impl Grid {
    pub fn new(dims: GridDimensions, boundary: BoundaryPolicy) -> Result<Self, EngineError> {
        if dims.width <= 0 || dims.height <= 0 {
            return Err(EngineError::InvalidDimensions {
                width: dims.width,
                height: dims.height,
            });
        }

        Ok(Grid {
            dims,
            boundary,
            reversal: ReversalPolicy::Allow,
            order: DEFAULT_EXPANSION_ORDER,
        })
    }

    /// Clamped grid of the given size
    pub fn clamped(width: i32, height: i32) -> Result<Self, EngineError> {
        Self::new(GridDimensions::new(width, height), BoundaryPolicy::Clamped)
    }

    /// Toroidal grid of the given size
    pub fn wrapping(width: i32, height: i32) -> Result<Self, EngineError> {
        Self::new(GridDimensions::new(width, height), BoundaryPolicy::Wrapping)
    }

    pub fn with_reversal(mut self, reversal: ReversalPolicy) -> Self {
        self.reversal = reversal;
        self
    }

    /// Replaces the neighbor expansion order. Rejects anything that is not a
    /// permutation of all four directions.
    pub fn with_expansion_order(mut self, order: [Direction; 4]) -> Result<Self, EngineError> {
        if Direction::all().iter().any(|dir| !order.contains(dir)) {
            return Err(EngineError::InvalidExpansionOrder { order });
        }
        self.order = order;
        Ok(self)
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub fn width(&self) -> i32 {
        self.dims.width
    }

    pub fn height(&self) -> i32 {
        self.dims.height
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    pub fn reversal(&self) -> ReversalPolicy {
        self.reversal
    }

    pub fn expansion_order(&self) -> [Direction; 4] {
        self.order
    }

    pub fn cell_count(&self) -> usize {
        self.dims.cell_count()
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.x >= 0 && pos.x < self.dims.width && pos.y >= 0 && pos.y < self.dims.height
    }

    /// Applies the configured boundary policy. `None` means the position is illegal.
    pub fn apply_boundary(&self, pos: Coord) -> Option<Coord> {
        match self.boundary {
            BoundaryPolicy::Clamped => self.in_bounds(pos).then_some(pos),
            BoundaryPolicy::Wrapping => Some(Coord {
                x: pos.x.rem_euclid(self.dims.width),
                y: pos.y.rem_euclid(self.dims.height),
            }),
        }
    }

    /// Neighbor of `pos` in `direction` after the boundary policy
    pub fn step(&self, pos: Coord, direction: Direction) -> Option<Coord> {
        self.apply_boundary(pos.offset(direction))
    }

    /// Legal neighbors of `pos` in expansion order
    pub fn neighbors(&self, pos: Coord) -> impl Iterator<Item = (Direction, Coord)> + '_ {
        self.order
            .into_iter()
            .filter_map(move |dir| self.step(pos, dir).map(|next| (dir, next)))
    }

    /// Whether `direction` may be offered given the current heading
    pub fn permits(&self, heading: Option<Direction>, direction: Direction) -> bool {
        match (self.reversal, heading) {
            (ReversalPolicy::Forbid, Some(current)) => direction != current.opposite(),
            _ => true,
        }
    }

    /// Recovers the current heading from head and neck. `None` for single-cell bodies.
    pub fn infer_heading(&self, body: &[Coord]) -> Option<Direction> {
        let (head, neck) = match body {
            [head, neck, ..] => (*head, *neck),
            _ => return None,
        };

        Direction::all()
            .into_iter()
            .find(|&dir| self.step(neck, dir) == Some(head))
    }

    /// Caller-side move: new head in front, tail dropped unless growing.
    /// Returns `None` when the head would leave a clamped grid.
    pub fn advance(&self, body: &[Coord], direction: Direction, grow: bool) -> Option<Vec<Coord>> {
        let head = *body.first()?;
        let new_head = self.step(head, direction)?;

        let keep = if grow { body.len() } else { body.len() - 1 };
        let mut next = Vec::with_capacity(keep + 1);
        next.push(new_head);
        next.extend_from_slice(&body[..keep]);
        Some(next)
    }

    /// Rejects coordinates outside the grid
    pub fn check(&self, pos: Coord) -> Result<(), EngineError> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(EngineError::OutOfBounds {
                coord: pos,
                width: self.dims.width,
                height: self.dims.height,
            })
        }
    }

    /// Rejects empty bodies and bodies with segments outside the grid
    pub fn check_body(&self, body: &[Coord]) -> Result<(), EngineError> {
        if body.is_empty() {
            return Err(EngineError::EmptyBody);
        }
        body.iter().try_for_each(|&segment| self.check(segment))
    }

    /// Whether `pos` sits on the outermost ring of cells
    pub fn on_edge_x(&self, pos: Coord) -> bool {
        pos.x == 0 || pos.x == self.dims.width - 1
    }

    pub fn on_edge_y(&self, pos: Coord) -> bool {
        pos.y == 0 || pos.y == self.dims.height - 1
    }
}

pub fn is_occupied(pos: Coord, obstacles: &ObstacleSet) -> bool {
    obstacles.contains(&pos)
}

pub fn manhattan(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub fn euclidean(a: Coord, b: Coord) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Obstacle set for an agent: its own body minus the head, plus every opponent body
pub fn build_obstacles(own_body: &[Coord], opponents: &[&[Coord]]) -> ObstacleSet {
    own_body
        .iter()
        .skip(1)
        .chain(opponents.iter().flat_map(|body| body.iter()))
        .copied()
        .collect()
}

/// Writes `new_head` followed by `body` minus its tail into `out`
pub fn shift_body_into(body: &[Coord], new_head: Coord, out: &mut Vec<Coord>) {
    out.clear();
    out.push(new_head);
    out.extend_from_slice(&body[..body.len().saturating_sub(1)]);
}

/// Reusable occupancy bitmap for counting free cells without clearing between calls.
///
/// Each count bumps a generation stamp instead of zeroing the buffer, so repeated
/// evaluations within one search cost O(body length) rather than O(width x height).
#[derive(Debug, Clone)]
pub struct OccupancyScratch {
    stamps: Vec<u32>,
    generation: u32,
    width: i32,
}

impl OccupancyScratch {
    pub fn new(grid: &Grid) -> Self {
        OccupancyScratch {
            stamps: vec![0; grid.cell_count()],
            generation: 0,
            width: grid.width(),
        }
    }

    /// Number of grid cells not covered by any of `bodies`
    pub fn count_free(&mut self, grid: &Grid, bodies: &[&[Coord]]) -> usize {
        if self.stamps.len() != grid.cell_count() || self.width != grid.width() {
            *self = Self::new(grid);
        }

        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamps.iter_mut().for_each(|s| *s = 0);
            self.generation = 1;
        }

        let mut covered = 0;
        for &cell in bodies.iter().flat_map(|body| body.iter()) {
            if !grid.in_bounds(cell) {
                continue;
            }
            let idx = (cell.y * self.width + cell.x) as usize;
            if self.stamps[idx] != self.generation {
                self.stamps[idx] = self.generation;
                covered += 1;
            }
        }

        grid.cell_count() - covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_boundary_rejects_outside() {
        let grid = Grid::clamped(10, 10).unwrap();
        assert_eq!(grid.apply_boundary(Coord::new(-1, 3)), None);
        assert_eq!(grid.apply_boundary(Coord::new(3, 10)), None);
        assert_eq!(grid.apply_boundary(Coord::new(9, 9)), Some(Coord::new(9, 9)));
    }

    #[test]
    fn test_wrapping_boundary_is_toroidal() {
        let grid = Grid::wrapping(10, 8).unwrap();
        assert_eq!(grid.apply_boundary(Coord::new(-1, 3)), Some(Coord::new(9, 3)));
        assert_eq!(grid.apply_boundary(Coord::new(3, 8)), Some(Coord::new(3, 0)));
        assert_eq!(grid.step(Coord::new(0, 0), Direction::Up), Some(Coord::new(0, 7)));
    }

    #[test]
    fn test_zero_sized_grid_is_rejected() {
        assert_eq!(
            Grid::clamped(0, 5),
            Err(EngineError::InvalidDimensions { width: 0, height: 5 })
        );
    }

    #[test]
    fn test_neighbors_follow_expansion_order() {
        let grid = Grid::clamped(5, 5).unwrap();
        let dirs: Vec<Direction> = grid.neighbors(Coord::new(2, 2)).map(|(d, _)| d).collect();
        assert_eq!(dirs, DEFAULT_EXPANSION_ORDER.to_vec());

        // Corner drops the two illegal neighbors but keeps relative order
        let corner: Vec<Direction> = grid.neighbors(Coord::new(0, 0)).map(|(d, _)| d).collect();
        assert_eq!(corner, vec![Direction::Right, Direction::Down]);
    }

    #[test]
    fn test_expansion_order_must_be_a_permutation() {
        let grid = Grid::clamped(5, 5).unwrap();
        let order = [Direction::Up; 4];
        assert_eq!(
            grid.clone().with_expansion_order(order),
            Err(EngineError::InvalidExpansionOrder { order })
        );

        let custom = [Direction::Down, Direction::Up, Direction::Right, Direction::Left];
        let grid = grid.with_expansion_order(custom).unwrap();
        let dirs: Vec<Direction> = grid.neighbors(Coord::new(2, 2)).map(|(d, _)| d).collect();
        assert_eq!(dirs, custom.to_vec());
    }

    #[test]
    fn test_distances() {
        assert_eq!(manhattan(Coord::new(1, 1), Coord::new(4, 5)), 7);
        assert!((euclidean(Coord::new(1, 1), Coord::new(4, 5)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_infer_heading_handles_wrap() {
        let grid = Grid::wrapping(6, 6).unwrap();
        let body = [Coord::new(0, 2), Coord::new(5, 2)];
        assert_eq!(grid.infer_heading(&body), Some(Direction::Right));
        assert_eq!(grid.infer_heading(&body[..1]), None);
    }

    #[test]
    fn test_forbid_reversal() {
        let grid = Grid::clamped(6, 6).unwrap().with_reversal(ReversalPolicy::Forbid);
        assert!(!grid.permits(Some(Direction::Right), Direction::Left));
        assert!(grid.permits(Some(Direction::Right), Direction::Up));
        assert!(grid.permits(None, Direction::Left));
    }

    #[test]
    fn test_advance_moves_and_grows() {
        let grid = Grid::clamped(6, 6).unwrap();
        let body = vec![Coord::new(2, 2), Coord::new(1, 2)];

        let moved = grid.advance(&body, Direction::Up, false).unwrap();
        assert_eq!(moved, vec![Coord::new(2, 1), Coord::new(2, 2)]);

        let grown = grid.advance(&body, Direction::Up, true).unwrap();
        assert_eq!(grown, vec![Coord::new(2, 1), Coord::new(2, 2), Coord::new(1, 2)]);

        assert!(grid.advance(&[Coord::new(0, 0)], Direction::Left, false).is_none());
    }

    #[test]
    fn test_build_obstacles_skips_own_head() {
        let own = [Coord::new(1, 1), Coord::new(1, 2)];
        let other = [Coord::new(4, 4)];
        let obstacles = build_obstacles(&own, &[&other]);
        assert!(!is_occupied(Coord::new(1, 1), &obstacles));
        assert!(is_occupied(Coord::new(1, 2), &obstacles));
        assert!(is_occupied(Coord::new(4, 4), &obstacles));
    }

    #[test]
    fn test_count_free_matches_full_scan() {
        let grid = Grid::clamped(7, 5).unwrap();
        let mut scratch = OccupancyScratch::new(&grid);
        let a = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1)];
        let b = [Coord::new(1, 1), Coord::new(6, 4), Coord::new(-1, 2)];

        let expected = (0..grid.width())
            .flat_map(|x| (0..grid.height()).map(move |y| Coord::new(x, y)))
            .filter(|c| !a.contains(c) && !b.contains(c))
            .count();

        assert_eq!(scratch.count_free(&grid, &[&a, &b]), expected);
        // Reuse must not leak marks from the previous call
        assert_eq!(scratch.count_free(&grid, &[&a]), grid.cell_count() - 3);
    }
}
