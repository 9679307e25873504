use std::collections::HashMap;

use crate::{db::TrieDB, error::TrieError, node::Node, node_hash::NodeHash};

/// Holds the trie's nodes as they're mutated in memory, backed by a [`TrieDB`] that
/// persists committed nodes. No node is ever overwritten in the backing store: once
/// committed, a node stays reachable from whichever root referenced it.
pub struct TrieState {
    db: Box<dyn TrieDB>,
    cache: HashMap<NodeHash, Node>,
}

impl TrieState {
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        Self {
            db,
            cache: HashMap::new(),
        }
    }

    /// Retrieves a node based on its hash, checking the in-memory cache first.
    pub fn get_node(&self, hash: NodeHash) -> Result<Option<Node>, TrieError> {
        if let Some(node) = self.cache.get(&hash) {
            return Ok(Some(node.clone()));
        }
        if let NodeHash::Inline(ref encoded) = hash {
            if !encoded.is_empty() {
                return Ok(Some(Node::decode_raw(encoded)?));
            }
        }
        self.db
            .get(hash.into())?
            .map(|rlp| Node::decode_raw(&rlp))
            .transpose()
    }

    /// Stashes a node in the cache under its hash, without writing it to the backing store.
    pub fn insert_node(&mut self, node: Node, hash: NodeHash) {
        self.cache.insert(hash, node);
    }

    /// Commits the cached subtree reachable from `root` to the backing store and clears
    /// the cache.
    pub fn commit(&mut self, root: &NodeHash) -> Result<(), TrieError> {
        let mut batch = Vec::new();
        self.commit_node(root, &mut batch)?;
        self.db.put_batch(batch)?;
        self.cache.clear();
        Ok(())
    }

    fn commit_node(
        &mut self,
        node_hash: &NodeHash,
        batch: &mut Vec<(Vec<u8>, Vec<u8>)>,
    ) -> Result<(), TrieError> {
        let Some(node) = self.cache.remove(node_hash) else {
            // Already committed in a previous `commit()` call.
            return Ok(());
        };
        match &node {
            Node::Branch(n) => {
                for child in n.choices.iter() {
                    if child.is_valid() {
                        self.commit_node(child, batch)?;
                    }
                }
            }
            Node::Extension(n) => self.commit_node(&n.child, batch)?,
            Node::Leaf(_) => {}
        }
        if !matches!(node_hash, NodeHash::Inline(_)) {
            batch.push((node_hash.clone().into(), node.encode_raw()));
        }
        Ok(())
    }
}
