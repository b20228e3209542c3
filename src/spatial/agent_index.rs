//! Cell -> agents index for proximity queries
//!
//! A cache over agent positions. The agent's own `position` is
//! authoritative; the owner calls `update` after every movement phase.

use ahash::AHashMap;

use crate::core::types::{AgentId, Position};
use crate::entity::agent::Agent;

/// Neighbor found by a radius query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub id: AgentId,
    pub position: Position,
    pub distance: i32,
}

#[derive(Debug, Clone, Default)]
pub struct AgentIndex {
    cells: AHashMap<Position, Vec<AgentId>>,
    last_seen: AHashMap<AgentId, Position>,
}

impl AgentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index built from scratch
    pub fn from_agents(agents: &[Agent]) -> Self {
        let mut index = Self::new();
        index.rebuild(agents);
        index
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.last_seen.clear();
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    fn insert(&mut self, id: AgentId, pos: Position) {
        self.cells.entry(pos).or_default().push(id);
        self.last_seen.insert(id, pos);
    }

    fn remove(&mut self, id: AgentId, pos: Position) {
        if let Some(bucket) = self.cells.get_mut(&pos) {
            bucket.retain(|&e| e != id);
            if bucket.is_empty() {
                self.cells.remove(&pos);
            }
        }
    }

    /// Clear and reinsert every agent at its current position
    pub fn rebuild(&mut self, agents: &[Agent]) {
        self.clear();
        for agent in agents {
            self.insert(agent.id(), agent.position);
        }
    }

    /// Move agents whose position changed since they were last indexed.
    /// Pass only the agents that may have moved; the cost is proportional
    /// to what is passed. Returns the number of agents that moved.
    pub fn update<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) -> usize {
        let mut moved = 0;
        for agent in agents {
            match self.last_seen.get(&agent.id()).copied() {
                Some(prev) if prev == agent.position => {}
                Some(prev) => {
                    self.remove(agent.id(), prev);
                    self.insert(agent.id(), agent.position);
                    moved += 1;
                }
                None => {
                    self.insert(agent.id(), agent.position);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Agents indexed at exactly this cell, ascending id
    pub fn agents_at(&self, pos: Position) -> Vec<AgentId> {
        let mut ids = self.cells.get(&pos).cloned().unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    pub fn last_position(&self, id: AgentId) -> Option<Position> {
        self.last_seen.get(&id).copied()
    }

    /// Agents within Manhattan `radius` of `(x, y)`, excluding that cell,
    /// sorted by `(distance, id)`
    ///
    /// Walks the diamond while it has fewer cells than there are occupied
    /// buckets, otherwise scans the buckets. Cost never exceeds
    /// O(min(radius², occupied cells)).
    pub fn neighbors_within(&self, x: i32, y: i32, radius: i32) -> Vec<Neighbor> {
        let radius = radius.max(0);
        let center = Position::new(x, y);
        let r = i64::from(radius);
        let diamond_cells = 2 * r * (r + 1) + 1;

        let mut found = Vec::new();
        if diamond_cells <= self.cells.len() as i64 {
            for dy in -radius..=radius {
                let budget = radius - dy.abs();
                for dx in -budget..=budget {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let pos = Position::new(x + dx, y + dy);
                    if let Some(bucket) = self.cells.get(&pos) {
                        push_bucket(&mut found, bucket, pos, dx.abs() + dy.abs());
                    }
                }
            }
        } else {
            for (&pos, bucket) in &self.cells {
                let distance = manhattan_i64(pos, center);
                if distance > 0 && distance <= r {
                    push_bucket(&mut found, bucket, pos, distance as i32);
                }
            }
        }
        found.sort_by_key(|n| (n.distance, n.id));
        found
    }
}

fn push_bucket(found: &mut Vec<Neighbor>, bucket: &[AgentId], position: Position, distance: i32) {
    found.extend(bucket.iter().map(|&id| Neighbor {
        id,
        position,
        distance,
    }));
}

/// Manhattan distance without i32 overflow for far-apart cells
fn manhattan_i64(a: Position, b: Position) -> i64 {
    (i64::from(a.x) - i64::from(b.x)).abs() + (i64::from(a.y) - i64::from(b.y)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::utility::UtilityFunction;

    fn agent(id: u32, x: i32, y: i32) -> Agent {
        Agent::new(AgentId(id), Position::new(x, y), UtilityFunction::default())
    }

    #[test]
    fn test_rebuild_and_agents_at() {
        let agents = vec![agent(2, 1, 1), agent(0, 1, 1), agent(1, 3, 3)];
        let index = AgentIndex::from_agents(&agents);
        assert_eq!(index.len(), 3);
        assert_eq!(index.agents_at(Position::new(1, 1)), vec![AgentId(0), AgentId(2)]);
        assert!(index.agents_at(Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_neighbors_sorted_by_distance_then_id() {
        let agents = vec![
            agent(5, 6, 5),
            agent(3, 5, 6),
            agent(1, 5, 7),
            agent(4, 5, 5), // querying cell itself, excluded
            agent(9, 9, 9), // too far
        ];
        let index = AgentIndex::from_agents(&agents);
        let found: Vec<_> = index.neighbors_within(5, 5, 2).iter().map(|n| n.id).collect();
        assert_eq!(found, vec![AgentId(3), AgentId(5), AgentId(1)]);
    }

    #[test]
    fn test_update_moves_only_changed_agents() {
        let mut agents = vec![agent(0, 0, 0), agent(1, 2, 2)];
        let mut index = AgentIndex::from_agents(&agents);

        agents[1].position = Position::new(2, 3);
        assert_eq!(index.update(&agents), 1);
        assert_eq!(index.last_position(AgentId(1)), Some(Position::new(2, 3)));
        assert!(index.agents_at(Position::new(2, 2)).is_empty());
        assert_eq!(index.agents_at(Position::new(2, 3)), vec![AgentId(1)]);

        // Nothing moved
        assert_eq!(index.update(&agents), 0);
    }

    #[test]
    fn test_update_matches_rebuild() {
        let mut agents: Vec<_> = (0..6).map(|i| agent(i, i as i32, 0)).collect();
        let mut index = AgentIndex::from_agents(&agents);
        for a in agents.iter_mut().step_by(2) {
            a.position = Position::new(a.position.x, a.position.y + 1);
        }
        index.update(&agents);
        let rebuilt = AgentIndex::from_agents(&agents);
        for a in &agents {
            assert_eq!(index.agents_at(a.position), rebuilt.agents_at(a.position));
        }
        assert_eq!(
            index.neighbors_within(2, 0, 3),
            rebuilt.neighbors_within(2, 0, 3)
        );
    }

    #[test]
    fn test_huge_radius_matches_bounded_radius() {
        let agents = vec![agent(0, 2, 2), agent(1, 0, 0), agent(2, 4, 4), agent(3, 2, 2)];
        let index = AgentIndex::from_agents(&agents);
        let bounded = index.neighbors_within(2, 2, 10);
        let ids: Vec<_> = bounded.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![AgentId(1), AgentId(2)]);
        assert_eq!(index.neighbors_within(2, 2, i32::MAX), bounded);
        assert_eq!(index.neighbors_within(2, 2, 1_000_000), bounded);
    }

    #[test]
    fn test_diamond_and_bucket_scans_agree() {
        // 50 occupied cells: radius <= 4 walks the diamond, 5+ scans buckets
        let agents: Vec<_> = (0..50).map(|i| agent(i, (i % 10) as i32, (i / 10) as i32)).collect();
        let index = AgentIndex::from_agents(&agents);
        let center = Position::new(5, 2);
        for radius in [0, 1, 3, 4, 5, 8, 20] {
            let mut expected: Vec<_> = agents
                .iter()
                .map(|a| (a.position.manhattan(&center), a.id()))
                .filter(|&(d, _)| d > 0 && d <= radius)
                .collect();
            expected.sort();
            let found: Vec<_> = index
                .neighbors_within(center.x, center.y, radius)
                .iter()
                .map(|n| (n.distance, n.id))
                .collect();
            assert_eq!(found, expected, "radius {radius}");
        }
    }
}
