use std::collections::VecDeque;

use geometry::Tile;

/// Bounded recency list of tiles that were visible in an earlier frame,
/// oldest at the front. Capacities are a few hundred tiles, so linear
/// lookups are fine.
#[derive(Debug, Clone)]
pub struct TileLru {
    capacity: usize,
    order: VecDeque<Tile>,
}

impl TileLru {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.order.contains(tile)
    }

    /// Moves `tile` to the most recent position and returns whatever no
    /// longer fits, oldest first. With zero capacity that is `tile` itself.
    pub fn insert(&mut self, tile: Tile) -> Vec<Tile> {
        if self.capacity == 0 {
            return vec![tile];
        }
        self.remove(&tile);
        self.order.push_back(tile);
        self.evict_overflow()
    }

    pub fn remove(&mut self, tile: &Tile) -> bool {
        let Some(pos) = self.order.iter().position(|t| t == tile) else {
            return false;
        };
        self.order.remove(pos);
        true
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Vec<Tile> {
        self.capacity = capacity;
        self.evict_overflow()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    fn evict_overflow(&mut self) -> Vec<Tile> {
        let excess = self.order.len().saturating_sub(self.capacity);
        self.order.drain(..excess).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TileLru;
    use geometry::{GeometryId, Tile};
    use pretty_assertions::assert_eq;

    fn tiles(n: u32) -> Vec<Tile> {
        let g = GeometryId::next();
        (0..n).map(|x| Tile::grid(g, 0, x, 0)).collect()
    }

    #[test]
    fn evicts_least_recent_first() {
        let t = tiles(3);
        let mut lru = TileLru::new(2);
        assert!(lru.insert(t[0]).is_empty());
        assert!(lru.insert(t[1]).is_empty());
        // Refreshing t0 makes t1 the oldest.
        assert!(lru.insert(t[0]).is_empty());
        assert_eq!(lru.insert(t[2]), vec![t[1]]);
        assert_eq!(lru.iter().copied().collect::<Vec<_>>(), vec![t[0], t[2]]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let t = tiles(1);
        let mut lru = TileLru::new(0);
        assert_eq!(lru.insert(t[0]), vec![t[0]]);
        assert!(lru.is_empty());
    }

    #[test]
    fn shrinking_capacity_evicts() {
        let t = tiles(3);
        let mut lru = TileLru::new(3);
        for tile in &t {
            lru.insert(*tile);
        }
        assert_eq!(lru.set_capacity(1), vec![t[0], t[1]]);
        assert!(lru.contains(&t[2]));
        assert!(lru.remove(&t[2]));
        assert!(!lru.remove(&t[2]));
    }
}
