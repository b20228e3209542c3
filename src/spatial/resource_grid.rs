//! Dense typed-resource store with O(1) occupancy bookkeeping
//!
//! Each cell holds at most one resource. The number of resources and the
//! set of empty cells are maintained incrementally, so both are O(1) to
//! read. The empty set is an index-addressed vector (swap-remove on fill),
//! which keeps its order a pure function of the operation history.

use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::{Good, Position};
use crate::spatial::grid::Grid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    resource: Option<Good>,
    /// Insertion sequence number of the current resource
    placed_at: u64,
    /// Position of this cell inside `empty` while the cell is empty
    empty_index: Option<usize>,
}

/// A resource on the grid, as returned by iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedResource {
    pub position: Position,
    pub kind: Good,
}

#[derive(Debug, Clone)]
pub struct ResourceGrid {
    cells: Grid<Slot>,
    empty: Vec<Position>,
    count: usize,
    next_seq: u64,
}

impl ResourceGrid {
    /// Empty grid of the given size
    pub fn new(width: i32, height: i32) -> Self {
        let mut cells: Grid<Slot> = Grid::new(width, height);
        let mut empty = Vec::with_capacity(cells.len());
        for idx in 0..cells.len() {
            let pos = cells.position_of(idx);
            if let Ok(slot) = cells.get_mut(pos.x, pos.y) {
                slot.empty_index = Some(empty.len());
            }
            empty.push(pos);
        }
        Self {
            cells,
            empty,
            count: 0,
            next_seq: 0,
        }
    }

    /// Grid pre-populated with `(x, y, kind)` entries
    pub fn with_resources(
        width: i32,
        height: i32,
        resources: impl IntoIterator<Item = (i32, i32, Good)>,
    ) -> Result<Self> {
        let mut grid = Self::new(width, height);
        for (x, y, kind) in resources {
            grid.add_resource(x, y, kind)?;
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.cells.width()
    }

    pub fn height(&self) -> i32 {
        self.cells.height()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.cells.contains(x, y)
    }

    /// Place a resource, replacing whatever was there
    pub fn add_resource(&mut self, x: i32, y: i32, kind: Good) -> Result<()> {
        let seq = self.next_seq;
        let slot = *self.cells.get(x, y)?;
        if slot.resource.is_none() {
            self.remove_from_empty(slot.empty_index);
            self.count += 1;
        }
        self.cells.set(
            x,
            y,
            Slot {
                resource: Some(kind),
                placed_at: seq,
                empty_index: None,
            },
        )?;
        self.next_seq += 1;
        Ok(())
    }

    pub fn has_resource(&self, x: i32, y: i32) -> Result<bool> {
        Ok(self.cells.get(x, y)?.resource.is_some())
    }

    pub fn resource_at(&self, x: i32, y: i32) -> Result<Option<Good>> {
        Ok(self.cells.get(x, y)?.resource)
    }

    /// Remove and return the resource at a cell, if any
    pub fn take_resource_kind(&mut self, x: i32, y: i32) -> Result<Option<Good>> {
        let slot = self.cells.get_mut(x, y)?;
        let Some(kind) = slot.resource.take() else {
            return Ok(None);
        };
        slot.placed_at = 0;
        slot.empty_index = Some(self.empty.len());
        self.empty.push(Position::new(x, y));
        self.count -= 1;
        Ok(Some(kind))
    }

    /// Number of occupied cells
    pub fn resource_count(&self) -> usize {
        self.count
    }

    /// Every currently empty cell
    pub fn empty_cells(&self) -> &[Position] {
        &self.empty
    }

    /// Resources in ascending `(x, y)` order
    pub fn iter_sorted(&self) -> impl Iterator<Item = PlacedResource> + '_ {
        let (w, h) = (self.width(), self.height());
        (0..w).flat_map(move |x| {
            (0..h).filter_map(move |y| {
                self.cells.get(x, y).ok().and_then(|slot| {
                    slot.resource.map(|kind| PlacedResource {
                        position: Position::new(x, y),
                        kind,
                    })
                })
            })
        })
    }

    /// Resources in the order they were placed
    pub fn iter_insertion(&self) -> Vec<PlacedResource> {
        let mut placed: Vec<(u64, PlacedResource)> = (0..self.cells.len())
            .filter_map(|idx| {
                let pos = self.cells.position_of(idx);
                let slot = self.cells.get(pos.x, pos.y).ok()?;
                slot.resource.map(|kind| {
                    (
                        slot.placed_at,
                        PlacedResource {
                            position: pos,
                            kind,
                        },
                    )
                })
            })
            .collect();
        placed.sort_by_key(|(seq, _)| *seq);
        placed.into_iter().map(|(_, r)| r).collect()
    }

    /// Resources within Manhattan `radius` of `center`, ascending `(x, y)`
    pub fn resources_within(&self, center: Position, radius: i32) -> Vec<PlacedResource> {
        self.cells
            .cells_within(center, radius)
            .filter_map(|pos| {
                let slot = self.cells.get(pos.x, pos.y).ok()?;
                slot.resource.map(|kind| PlacedResource {
                    position: pos,
                    kind,
                })
            })
            .collect()
    }

    fn remove_from_empty(&mut self, index: Option<usize>) {
        let Some(i) = index else {
            return;
        };
        self.empty.swap_remove(i);
        if let Some(&moved) = self.empty.get(i) {
            if let Ok(slot) = self.cells.get_mut(moved.x, moved.y) {
                slot.empty_index = Some(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SimError;

    fn assert_consistent(grid: &ResourceGrid) {
        assert_eq!(
            grid.resource_count() + grid.empty_cells().len(),
            grid.total_cells()
        );
        for pos in grid.empty_cells() {
            assert!(!grid.has_resource(pos.x, pos.y).unwrap());
        }
        assert_eq!(grid.iter_sorted().count(), grid.resource_count());
    }

    #[test]
    fn test_new_grid_all_empty() {
        let grid = ResourceGrid::new(4, 3);
        assert_eq!(grid.resource_count(), 0);
        assert_eq!(grid.empty_cells().len(), 12);
        assert_consistent(&grid);
    }

    #[test]
    fn test_add_and_take() {
        let mut grid = ResourceGrid::new(5, 5);
        grid.add_resource(2, 3, Good::A).unwrap();
        assert!(grid.has_resource(2, 3).unwrap());
        assert_eq!(grid.resource_count(), 1);
        assert_consistent(&grid);

        assert_eq!(grid.take_resource_kind(2, 3).unwrap(), Some(Good::A));
        assert_eq!(grid.take_resource_kind(2, 3).unwrap(), None);
        assert_eq!(grid.resource_count(), 0);
        assert_consistent(&grid);
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let mut grid = ResourceGrid::new(3, 3);
        grid.add_resource(1, 1, Good::A).unwrap();
        grid.add_resource(1, 1, Good::B).unwrap();
        assert_eq!(grid.resource_count(), 1);
        assert_eq!(grid.resource_at(1, 1).unwrap(), Some(Good::B));
        assert_consistent(&grid);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = ResourceGrid::new(3, 3);
        assert!(matches!(
            grid.add_resource(3, 0, Good::A),
            Err(SimError::OutOfBounds { .. })
        ));
        assert!(grid.has_resource(-1, 0).is_err());
        assert!(grid.take_resource_kind(0, 3).is_err());
        assert_consistent(&grid);
    }

    #[test]
    fn test_sorted_and_insertion_order() {
        let mut grid = ResourceGrid::new(4, 4);
        grid.add_resource(3, 0, Good::B).unwrap();
        grid.add_resource(0, 2, Good::A).unwrap();
        grid.add_resource(0, 1, Good::A).unwrap();

        let sorted: Vec<_> = grid.iter_sorted().map(|r| r.position).collect();
        assert_eq!(
            sorted,
            vec![Position::new(0, 1), Position::new(0, 2), Position::new(3, 0)]
        );

        let inserted: Vec<_> = grid.iter_insertion().iter().map(|r| r.position).collect();
        assert_eq!(
            inserted,
            vec![Position::new(3, 0), Position::new(0, 2), Position::new(0, 1)]
        );
    }

    #[test]
    fn test_resources_within_radius() {
        let grid = ResourceGrid::with_resources(
            7,
            7,
            [(3, 3, Good::A), (5, 5, Good::B), (0, 0, Good::A)],
        )
        .unwrap();
        let near: Vec<_> = grid
            .resources_within(Position::new(0, 3), 3)
            .iter()
            .map(|r| r.position)
            .collect();
        assert_eq!(near, vec![Position::new(0, 0), Position::new(3, 3)]);
    }

    #[test]
    fn test_churn_stays_consistent() {
        let mut grid = ResourceGrid::new(6, 6);
        for i in 0..36 {
            grid.add_resource(i % 6, i / 6, Good::A).unwrap();
        }
        assert!(grid.empty_cells().is_empty());
        for i in (0..36).step_by(3) {
            grid.take_resource_kind(i % 6, i / 6).unwrap();
        }
        assert_eq!(grid.resource_count(), 24);
        assert_consistent(&grid);
        for pos in grid.empty_cells().to_vec() {
            grid.add_resource(pos.x, pos.y, Good::B).unwrap();
        }
        assert_eq!(grid.resource_count(), 36);
        assert_consistent(&grid);
    }
}
