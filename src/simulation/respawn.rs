//! Deficit-driven resource respawn
//!
//! Each call tops the grid up toward `floor(density * cells)`, refilling a
//! fraction of the deficit and never more than `max_per_tick`. Never
//! overshoots: with no deficit nothing is spawned.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::RespawnConfig;
use crate::core::error::Result;
use crate::core::types::Good;
use crate::spatial::resource_grid::ResourceGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespawnScheduler {
    pub target_density: f64,
    pub max_per_tick: usize,
    pub rate: f64,
}

impl RespawnScheduler {
    pub fn new(target_density: f64, max_per_tick: usize, rate: f64) -> Self {
        Self {
            target_density,
            max_per_tick,
            rate,
        }
    }

    pub fn target_count(&self, grid: &ResourceGrid) -> usize {
        (self.target_density * grid.total_cells() as f64).floor() as usize
    }

    /// How many resources the next call would spawn on this grid
    pub fn planned(&self, grid: &ResourceGrid) -> usize {
        let target = self.target_count(grid);
        let current = grid.resource_count();
        if current >= target {
            return 0;
        }
        let deficit = target - current;
        let by_rate = (deficit as f64 * self.rate).ceil() as usize;
        by_rate.min(self.max_per_tick).min(deficit)
    }

    /// Spawn resources on randomly chosen empty cells. Returns the number
    /// spawned.
    pub fn respawn<R: Rng + ?Sized>(&self, grid: &mut ResourceGrid, rng: &mut R) -> Result<usize> {
        let count = self.planned(grid);
        if count == 0 {
            return Ok(0);
        }

        let mut cells = grid.empty_cells().to_vec();
        cells.shuffle(rng);
        for pos in cells.iter().take(count) {
            let kind = if rng.gen_bool(0.5) { Good::A } else { Good::B };
            grid.add_resource(pos.x, pos.y, kind)?;
        }

        debug_assert!(grid.resource_count() <= self.target_count(grid));
        Ok(count.min(cells.len()))
    }
}

impl From<&RespawnConfig> for RespawnScheduler {
    fn from(config: &RespawnConfig) -> Self {
        Self::new(config.target_density, config.max_per_tick, config.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_no_spawn_without_deficit() {
        let mut grid = ResourceGrid::new(10, 10);
        for x in 0..10 {
            grid.add_resource(x, 0, Good::A).unwrap();
        }
        let scheduler = RespawnScheduler::new(0.1, 8, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(scheduler.respawn(&mut grid, &mut rng).unwrap(), 0);
        assert_eq!(grid.resource_count(), 10);
    }

    #[test]
    fn test_spawn_is_rate_and_cap_limited() {
        let grid = ResourceGrid::new(10, 10);
        // target 50, deficit 50, rate 0.1 -> 5
        assert_eq!(RespawnScheduler::new(0.5, 100, 0.1).planned(&grid), 5);
        // capped by max_per_tick
        assert_eq!(RespawnScheduler::new(0.5, 3, 0.9).planned(&grid), 3);
        // rate 1.0 fills the whole deficit
        assert_eq!(RespawnScheduler::new(0.05, 100, 1.0).planned(&grid), 5);
    }

    #[test]
    fn test_never_exceeds_target() {
        let mut grid = ResourceGrid::new(10, 6);
        let scheduler = RespawnScheduler::new(0.2, 8, 0.6);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..40 {
            scheduler.respawn(&mut grid, &mut rng).unwrap();
            assert!(grid.resource_count() <= 12);
        }
        assert_eq!(grid.resource_count(), 12);
    }

    #[test]
    fn test_respawn_is_deterministic() {
        let scheduler = RespawnScheduler::new(0.3, 10, 0.5);
        let run = |seed| {
            let mut grid = ResourceGrid::new(8, 8);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..5 {
                scheduler.respawn(&mut grid, &mut rng).unwrap();
            }
            grid.iter_sorted().collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_zero_density_spawns_nothing() {
        let mut grid = ResourceGrid::new(5, 5);
        let scheduler = RespawnScheduler::new(0.0, 8, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(scheduler.respawn(&mut grid, &mut rng).unwrap(), 0);
    }
}
