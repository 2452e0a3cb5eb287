use hashbrown::HashMap;
use rand::Rng;

use crate::element::Element;
use crate::error::Result;
use crate::hash::HashFamily;
use crate::signature::Signature;

/// A single hash table mapping signatures to bucket id sequences.
///
/// Buckets preserve insertion order and keep duplicates; the table promises
/// bucket membership only, never a similarity ranking within a bucket.
/// `insert` needs `&mut self` — callers wanting shared mutation wrap the
/// table (or the engine owning it) in a lock.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BucketTable<E: Element> {
    hasher: HashFamily<E>,
    // Serialized as a pair list: JSON rejects non-string map keys.
    #[cfg_attr(feature = "persistence", serde(with = "bucket_pairs"))]
    buckets: HashMap<Signature, Vec<usize>>,
    items: usize,
}

#[cfg(feature = "persistence")]
mod bucket_pairs {
    use hashbrown::HashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::signature::Signature;

    pub fn serialize<S: Serializer>(
        map: &HashMap<Signature, Vec<usize>>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&Signature, &Vec<usize>)> = map.iter().collect();
        pairs.serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<HashMap<Signature, Vec<usize>>, D::Error> {
        let pairs: Vec<(Signature, Vec<usize>)> = Vec::deserialize(de)?;
        Ok(pairs.into_iter().collect())
    }
}

impl<E: Element> BucketTable<E> {
    /// Build a table with its own SimpleLSH hash family.
    ///
    /// `num_buckets` is a capacity hint for the bucket map; it never limits
    /// how many distinct signatures the table can hold (up to `2^bits`).
    pub fn new<R: Rng + ?Sized>(
        bits: usize,
        dim: usize,
        num_buckets: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let hasher = HashFamily::simple_lsh(bits, dim, rng)?;
        Ok(Self::with_family(hasher, num_buckets))
    }

    /// Build a table around an existing hash family.
    pub fn with_family(hasher: HashFamily<E>, num_buckets: usize) -> Self {
        Self {
            hasher,
            buckets: HashMap::with_capacity(num_buckets),
            items: 0,
        }
    }

    /// Hash `vector` and append `id` to its bucket.
    ///
    /// Inserting the same id twice duplicates it; the table does not dedup.
    pub fn insert(&mut self, id: usize, vector: &[E]) -> Result<()> {
        let sig = self.hasher.signature(vector)?;
        self.buckets.entry(sig).or_default().push(id);
        self.items += 1;
        Ok(())
    }

    /// Ids sharing the query's exact bucket, in insertion order.
    pub fn query(&self, vector: &[E]) -> Result<Vec<usize>> {
        let sig = self.hasher.signature(vector)?;
        Ok(self.bucket(&sig).map(<[usize]>::to_vec).unwrap_or_default())
    }

    /// The signature this table's family assigns to `vector`.
    pub fn signature(&self, vector: &[E]) -> Result<Signature> {
        self.hasher.signature(vector)
    }

    /// Bucket contents for a signature, if that bucket exists.
    pub fn bucket(&self, sig: &Signature) -> Option<&[usize]> {
        self.buckets.get(sig).map(Vec::as_slice)
    }

    /// Number of ids stored (duplicates counted).
    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Number of distinct non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Largest bucket size, 0 when empty.
    pub fn max_bucket_size(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn table(bits: usize, dim: usize, seed: u64) -> BucketTable<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        BucketTable::new(bits, dim, 16, &mut rng).unwrap()
    }

    #[test]
    fn test_insert_then_query_self() {
        let mut t = table(8, 4, 42);
        let v = [0.5, 0.1, -0.3, 0.2];
        t.insert(7, &v).unwrap();
        assert_eq!(t.query(&v).unwrap(), vec![7]);
    }

    #[test]
    fn test_duplicate_ids_preserved_in_order() {
        let mut t = table(8, 4, 42);
        let v = [0.5, 0.1, -0.3, 0.2];
        t.insert(1, &v).unwrap();
        t.insert(2, &v).unwrap();
        t.insert(1, &v).unwrap();
        assert_eq!(t.query(&v).unwrap(), vec![1, 2, 1]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_empty_bucket_query() {
        let t = table(8, 4, 42);
        assert!(t.query(&[1.0, 0.0, 0.0, 0.0]).unwrap().is_empty());
        assert!(t.is_empty());
    }

    #[test]
    fn test_failed_insert_leaves_table_untouched() {
        let mut t = table(8, 4, 42);
        assert!(t.insert(0, &[1.0, 0.0]).is_err());
        assert_eq!(t.len(), 0);
        assert_eq!(t.bucket_count(), 0);
    }

    #[test]
    fn test_capacity_hint_does_not_limit_buckets() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut t: BucketTable<f32> = BucketTable::new(10, 4, 1, &mut rng).unwrap();
        // Spray well-separated directions; far more than 1 bucket must appear.
        let dirs = [
            [1.0, 0.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, -1.0, 0.0],
        ];
        for (i, d) in dirs.iter().enumerate() {
            t.insert(i, d).unwrap();
        }
        assert!(t.bucket_count() > 1);
    }
}
