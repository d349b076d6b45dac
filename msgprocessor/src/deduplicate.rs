use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::error::BoxError;

/// Deduplicate reduces the documents of one namespace. It never sees documents of other
/// namespaces and is called once per namespace and batch. It may drop, merge or reorder documents.
pub trait Deduplicate<D>: Send + Sync {
    fn deduplicate(&self, documents: Vec<D>) -> Result<Vec<D>, BoxError>;
}

impl<D, F> Deduplicate<D> for F
where
    F: Fn(Vec<D>) -> Result<Vec<D>, BoxError> + Send + Sync,
{
    fn deduplicate(&self, documents: Vec<D>) -> Result<Vec<D>, BoxError> {
        self(documents)
    }
}

/// Default strategy, returns the documents untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<D> Deduplicate<D> for Identity {
    fn deduplicate(&self, documents: Vec<D>) -> Result<Vec<D>, BoxError> {
        Ok(documents)
    }
}

/// LastWriteWins keeps a single document per key. A later document replaces an earlier one with
/// the same key but takes over its position, so the output is ordered by first appearance of each
/// key.
#[derive(Clone)]
pub struct LastWriteWins<F, K> {
    key_fn: F,
    _key: PhantomData<fn() -> K>,
}

impl<F, K> LastWriteWins<F, K> {
    pub fn new(key_fn: F) -> Self {
        Self {
            key_fn,
            _key: PhantomData,
        }
    }
}

impl<D, K, F> Deduplicate<D> for LastWriteWins<F, K>
where
    F: Fn(&D) -> K + Send + Sync,
    K: Eq + Hash,
{
    fn deduplicate(&self, documents: Vec<D>) -> Result<Vec<D>, BoxError> {
        let mut positions: HashMap<K, usize> = HashMap::with_capacity(documents.len());
        let mut deduplicated: Vec<D> = Vec::with_capacity(documents.len());

        for document in documents {
            match positions.entry((self.key_fn)(&document)) {
                Entry::Occupied(entry) => {
                    if let Some(slot) = deduplicated.get_mut(*entry.get()) {
                        *slot = document;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(deduplicated.len());
                    deduplicated.push(document);
                }
            }
        }

        Ok(deduplicated)
    }
}
