use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::error::TrieError;

use super::TrieDB;

/// InMemory implementation for the TrieDB trait, with get, put and put_batch operations.
///
/// Cloning shares the underlying map, so a clone of a committed [`InMemoryTrieDB`] can be
/// reopened against an earlier root while the original keeps accumulating newer nodes.
#[derive(Clone)]
pub struct InMemoryTrieDB {
    inner: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryTrieDB {
    pub fn new(map: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>) -> Self {
        Self { inner: map }
    }

    pub fn new_empty() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

impl TrieDB for InMemoryTrieDB {
    fn get(&self, key: Vec<u8>) -> Result<Option<Vec<u8>>, TrieError> {
        Ok(self.inner.lock().unwrap().get(&key).cloned())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), TrieError> {
        self.inner.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn put_batch(&self, key_values: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), TrieError> {
        let mut inner = self.inner.lock().unwrap();
        for (key, value) in key_values {
            inner.insert(key, value);
        }
        Ok(())
    }
}
