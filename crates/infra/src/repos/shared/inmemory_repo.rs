use super::repo::StorageError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Useful functions for creating inmemory repositories.
///
/// A collection is a map from id to entity behind a single lock. Every
/// function holds the lock for its full duration, writers exclusively and
/// readers shared, so the operations are atomic with respect to each other.
pub type Collection<T> = RwLock<HashMap<String, T>>;

fn poisoned() -> StorageError {
    StorageError::Backend(anyhow::anyhow!("The inmemory collection lock is poisoned"))
}

fn read<T>(collection: &Collection<T>) -> Result<RwLockReadGuard<'_, HashMap<String, T>>, StorageError> {
    collection.read().map_err(|_| poisoned())
}

fn write<T>(
    collection: &Collection<T>,
) -> Result<RwLockWriteGuard<'_, HashMap<String, T>>, StorageError> {
    collection.write().map_err(|_| poisoned())
}

pub fn insert<T: Clone>(id: &str, val: &T, collection: &Collection<T>) -> Result<(), StorageError> {
    let mut collection = write(collection)?;
    match collection.entry(id.to_string()) {
        Entry::Occupied(_) => Err(StorageError::Conflict(id.to_string())),
        Entry::Vacant(entry) => {
            entry.insert(val.clone());
            Ok(())
        }
    }
}

pub fn save<T: Clone>(id: &str, val: &T, collection: &Collection<T>) -> Result<(), StorageError> {
    let mut collection = write(collection)?;
    match collection.get_mut(id) {
        Some(stored) => {
            *stored = val.clone();
            Ok(())
        }
        None => Err(StorageError::NotFound(id.to_string())),
    }
}

pub fn find<T: Clone>(id: &str, collection: &Collection<T>) -> Result<T, StorageError> {
    let collection = read(collection)?;
    collection
        .get(id)
        .cloned()
        .ok_or_else(|| StorageError::NotFound(id.to_string()))
}

pub fn find_by<T: Clone, F: Fn(&T) -> bool>(
    collection: &Collection<T>,
    compare: F,
) -> Result<Vec<T>, StorageError> {
    let collection = read(collection)?;
    Ok(collection
        .values()
        .filter(|item| compare(item))
        .cloned()
        .collect())
}

pub fn delete<T>(id: &str, collection: &Collection<T>) -> Result<T, StorageError> {
    let mut collection = write(collection)?;
    collection
        .remove(id)
        .ok_or_else(|| StorageError::NotFound(id.to_string()))
}
