//! Vector index abstraction.
//!
//! Identifier `i` of a stored vector is also its catalog position.

use yojana_core::AppResult;

/// One search hit. Lower distance means more similar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Catalog position; may be negative or out of range for a corrupt index
    pub id: i64,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(id: i64, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// Trait for nearest-neighbor backends.
///
/// Implementations are read-only after loading and safe to share across
/// concurrent queries.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored and query vector must have.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `count` neighbors of `query`, ascending by distance.
    async fn search(&self, query: &[f32], count: usize) -> AppResult<Vec<Neighbor>>;
}

/// Order hits ascending by distance, ties by identifier.
///
/// NaN distances sort after every finite distance.
pub fn sort_neighbors(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(|a, b| {
        a.distance
            .is_nan()
            .cmp(&b.distance.is_nan())
            .then(a.distance.total_cmp(&b.distance))
            .then(a.id.cmp(&b.id))
    });
}
