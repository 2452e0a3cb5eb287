use rand::Rng;

use crate::element::Element;
use crate::error::{LshError, Result};
use crate::table::BucketTable;

/// Several independent hash tables queried together for higher recall.
///
/// Each table carries its own independently seeded hash family of the same
/// `(bits, dim)` shape. A near pair that collides in one table with
/// probability `p` is found by at least one of `L` tables with probability
/// `1 - (1 - p)^L`.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MultiTableIndex<E: Element> {
    tables: Vec<BucketTable<E>>,
}

impl<E: Element> MultiTableIndex<E> {
    pub fn new<R: Rng + ?Sized>(
        num_tables: usize,
        bits: usize,
        dim: usize,
        num_buckets: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if num_tables == 0 {
            return Err(LshError::InvalidParameter(
                "num_tables must be greater than 0".into(),
            ));
        }
        let tables = (0..num_tables)
            .map(|_| BucketTable::new(bits, dim, num_buckets, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tables })
    }

    /// Insert `id` into every table, in table order.
    ///
    /// Tables are updated one at a time, so an interrupted insert leaves a
    /// strict prefix of tables updated: recall degrades, results never go
    /// wrong.
    pub fn insert(&mut self, id: usize, vector: &[E]) -> Result<()> {
        for table in &mut self.tables {
            table.insert(id, vector)?;
        }
        Ok(())
    }

    /// Union of every table's exact-bucket hits, deduplicated by id with
    /// first-seen (earliest table) order preserved.
    pub fn query(&self, vector: &[E]) -> Result<Vec<usize>> {
        let mut seen = hashbrown::HashSet::new();
        let mut candidates = Vec::new();
        for table in &self.tables {
            for id in table.query(vector)? {
                if seen.insert(id) {
                    candidates.push(id);
                }
            }
        }
        Ok(candidates)
    }

    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Ids stored per table (every table holds each inserted id once).
    pub fn len(&self) -> usize {
        self.tables[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables[0].is_empty()
    }

    pub(crate) fn tables(&self) -> &[BucketTable<E>] {
        &self.tables
    }
}
