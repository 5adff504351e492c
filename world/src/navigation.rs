//! Walkable grid used to answer route-length queries.

use glam::{Vec2, Vec3};
use pathfinding::prelude::astar;
use serde::Deserialize;
use wizard_defence_core::PathQuery;

const ORTHOGONAL_COST: u32 = 100;
const DIAGONAL_COST: u32 = 141;
/// Sampling step along segments, as a fraction of the cell size.
const SAMPLE_FRACTION: f32 = 0.25;

/// Layout of the navigation grid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavGridConfig {
    /// World-space `x`/`y` of the grid's lower corner.
    pub origin: [f32; 2],
    /// Side length of a square cell in world units.
    pub cell_size: f32,
    /// Number of cell columns along `x`.
    pub columns: u32,
    /// Number of cell rows along `y`.
    pub rows: u32,
    /// Cells that cannot be walked through, as `[column, row]`.
    pub blocked: Vec<[u32; 2]>,
}

impl Default for NavGridConfig {
    fn default() -> Self {
        Self {
            origin: [-4_000.0, -4_000.0],
            cell_size: 100.0,
            columns: 80,
            rows: 80,
            blocked: Vec::new(),
        }
    }
}

/// Dense walkability grid over the horizontal plane.
///
/// Heights are ignored: every query is answered on the `x`/`y` plane. Routes
/// move between 8-connected cell centres and never cut a blocked corner.
#[derive(Clone, Debug)]
pub struct NavGrid {
    origin: Vec2,
    cell_size: f32,
    columns: u32,
    rows: u32,
    blocked: Vec<bool>,
}

impl NavGrid {
    /// Builds a grid from its configuration. Out-of-range blocked cells are ignored.
    #[must_use]
    pub fn new(config: &NavGridConfig) -> Self {
        let cell_count = usize::try_from(u64::from(config.columns) * u64::from(config.rows))
            .unwrap_or(0);
        let mut grid = Self {
            origin: Vec2::from(config.origin),
            cell_size: config.cell_size.max(f32::EPSILON),
            columns: config.columns,
            rows: config.rows,
            blocked: vec![false; cell_count],
        };
        for &[column, row] in &config.blocked {
            grid.set_blocked(column, row, true);
        }
        grid
    }

    /// Marks a cell as blocked or walkable.
    pub fn set_blocked(&mut self, column: u32, row: u32, blocked: bool) {
        if let Some(index) = self.index(column, row) {
            self.blocked[index] = blocked;
        }
    }

    /// Reports whether the cell is inside the grid and walkable.
    #[must_use]
    pub fn is_walkable(&self, column: u32, row: u32) -> bool {
        self.index(column, row)
            .is_some_and(|index| !self.blocked[index])
    }

    /// Cell containing the point, if the point lies inside the grid.
    #[must_use]
    pub fn cell_of(&self, point: Vec3) -> Option<(u32, u32)> {
        let local = (point.truncate() - self.origin) / self.cell_size;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let column = local.x.floor() as u32;
        let row = local.y.floor() as u32;
        (column < self.columns && row < self.rows).then_some((column, row))
    }

    /// Centre of a cell on the ground plane.
    #[must_use]
    pub fn center_of(&self, column: u32, row: u32) -> Vec2 {
        self.origin + (Vec2::new(column as f32, row as f32) + Vec2::splat(0.5)) * self.cell_size
    }

    /// Reports whether the point lies on a blocked cell.
    ///
    /// Ground outside the grid is open.
    #[must_use]
    pub fn is_blocked_at(&self, point: Vec3) -> bool {
        self.cell_of(point)
            .is_some_and(|(column, row)| !self.is_walkable(column, row))
    }

    /// Plans a route between two points as ground-plane waypoints.
    ///
    /// The cell route found by A* is shortened wherever a straight corridor is
    /// clear, so open ground yields a single waypoint. The last waypoint is
    /// always `to`. Returns `None` when either end is off the grid or no
    /// walkable route joins them.
    #[must_use]
    pub fn find_route(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec2>> {
        let start = self.cell_of(from)?;
        let goal = self.cell_of(to)?;
        if !self.is_walkable(start.0, start.1) || !self.is_walkable(goal.0, goal.1) {
            return None;
        }

        if start == goal {
            return Some(vec![to.truncate()]);
        }

        let (cells, _cost) = astar(
            &start,
            |&(column, row)| self.successors(column, row),
            |&(column, row)| octile_distance((column, row), goal),
            |&cell| cell == goal,
        )?;

        let mut waypoints: Vec<Vec2> = cells
            .iter()
            .skip(1)
            .map(|&(column, row)| self.center_of(column, row))
            .collect();
        waypoints.push(to.truncate());
        Some(self.shorten(from.truncate(), &waypoints))
    }

    /// Furthest point along the segment that can be reached without entering
    /// a blocked cell.
    ///
    /// A walker already standing on a blocked cell is free to leave it.
    #[must_use]
    pub fn walkable_extent(&self, from: Vec2, to: Vec2) -> Vec2 {
        if self.is_blocked_at(from.extend(0.0)) {
            return to;
        }

        let mut reached = from;
        for point in self.samples(from, to) {
            if self.is_blocked_at(point.extend(0.0)) {
                return reached;
            }
            reached = point;
        }
        to
    }

    /// Reports whether a corridor a half cell wide runs between the points
    /// without touching a blocked cell.
    fn corridor_clear(&self, from: Vec2, to: Vec2) -> bool {
        let Some(direction) = (to - from).try_normalize() else {
            return true;
        };
        let side = direction.perp() * self.cell_size * SAMPLE_FRACTION;
        std::iter::once(from)
            .chain(self.samples(from, to))
            .all(|point| {
                [point, point + side, point - side]
                    .into_iter()
                    .all(|sample| !self.is_blocked_at(sample.extend(0.0)))
            })
    }

    fn shorten(&self, from: Vec2, waypoints: &[Vec2]) -> Vec<Vec2> {
        let mut shortened = Vec::with_capacity(waypoints.len());
        let mut anchor = from;
        let mut next = 0;
        while next < waypoints.len() {
            let furthest = (next + 1..waypoints.len())
                .rev()
                .find(|&index| self.corridor_clear(anchor, waypoints[index]))
                .unwrap_or(next);
            anchor = waypoints[furthest];
            shortened.push(anchor);
            next = furthest + 1;
        }
        shortened
    }

    fn samples(&self, from: Vec2, to: Vec2) -> impl Iterator<Item = Vec2> {
        let step = self.cell_size * SAMPLE_FRACTION;
        let count = (from.distance(to) / step).ceil();
        let count = if count.is_finite() && count >= 1.0 {
            count.min(1_000_000.0) as u32
        } else {
            1
        };
        (1..=count).map(move |index| from.lerp(to, index as f32 / count as f32))
    }

    /// Finds a route between two points and reports its length in world units.
    #[must_use]
    pub fn find_path(&self, from: Vec3, to: Vec3) -> PathQuery {
        let Some(waypoints) = self.find_route(from, to) else {
            return PathQuery::UNREACHABLE;
        };

        let mut length = 0.0;
        let mut previous = from.truncate();
        for waypoint in waypoints {
            length += previous.distance(waypoint);
            previous = waypoint;
        }
        PathQuery::reachable(length)
    }

    fn successors(&self, column: u32, row: u32) -> Vec<((u32, u32), u32)> {
        let mut next = Vec::with_capacity(8);
        for (dx, dy) in [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ] {
            let Some(neighbour) = self.offset(column, row, dx, dy) else {
                continue;
            };
            if !self.is_walkable(neighbour.0, neighbour.1) {
                continue;
            }

            if dx != 0 && dy != 0 {
                let side_a = self.offset(column, row, dx, 0);
                let side_b = self.offset(column, row, 0, dy);
                let clear = [side_a, side_b]
                    .into_iter()
                    .all(|side| side.is_some_and(|(c, r)| self.is_walkable(c, r)));
                if !clear {
                    continue;
                }
                next.push((neighbour, DIAGONAL_COST));
            } else {
                next.push((neighbour, ORTHOGONAL_COST));
            }
        }
        next
    }

    fn offset(&self, column: u32, row: u32, dx: i32, dy: i32) -> Option<(u32, u32)> {
        let column = column.checked_add_signed(dx)?;
        let row = row.checked_add_signed(dy)?;
        (column < self.columns && row < self.rows).then_some((column, row))
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn octile_distance(from: (u32, u32), to: (u32, u32)) -> u32 {
    let dx = from.0.abs_diff(to.0);
    let dy = from.1.abs_diff(to.1);
    let (long, short) = if dx > dy { (dx, dy) } else { (dy, dx) };
    ORTHOGONAL_COST * (long - short) + DIAGONAL_COST * short
}
