pub mod db;
mod error;
mod nibbles;
mod node;
mod node_hash;
mod state;
use ethereum_types::H256;
use nibbles::Nibbles;
use node::Node;
use node_hash::NodeHash;
use sha3::{Digest, Keccak256};
use std::collections::HashSet;
use swaplock_rlp::constants::RLP_NULL;

pub use self::db::{in_memory::InMemoryTrieDB, TrieDB};

pub use self::error::TrieError;
use self::{node::LeafNode, state::TrieState};

use lazy_static::lazy_static;

lazy_static! {
    // Hash value for an empty trie, equal to keccak(RLP_NULL)
    pub static ref EMPTY_TRIE_HASH: H256 = H256::from_slice(
        Keccak256::new()
            .chain_update([RLP_NULL])
            .finalize()
            .as_slice(),
    );
}

/// RLP-encoded trie path
pub type PathRLP = Vec<u8>;
/// RLP-encoded trie value
pub type ValueRLP = Vec<u8>;
/// RLP-encoded trie node
pub type NodeRLP = Vec<u8>;

/// Ethereum-compatible Merkle Patricia Trie, built fresh over an in-memory or
/// caller-supplied backing store rather than kept resident across swaps.
pub struct Trie {
    /// Hash of the current node
    root: Option<NodeHash>,
    /// Contains the trie's nodes
    pub(crate) state: TrieState,
}

impl Trie {
    /// Creates a new Trie from a clean DB
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        Self {
            state: TrieState::new(db),
            root: None,
        }
    }

    /// Creates a trie from an already-initialized DB and sets root as the root node of the trie
    pub fn open(db: Box<dyn TrieDB>, root: H256) -> Self {
        let root = (root != *EMPTY_TRIE_HASH).then_some(root.into());
        Self {
            state: TrieState::new(db),
            root,
        }
    }

    /// Retrieve an RLP-encoded value from the trie given its RLP-encoded path.
    pub fn get(&self, path: &PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        if let Some(root) = &self.root {
            let root_node = self
                .state
                .get_node(root.clone())?
                .ok_or(TrieError::InconsistentTree)?;
            root_node.get(&self.state, Nibbles::from_bytes(path))
        } else {
            Ok(None)
        }
    }

    /// Insert an RLP-encoded value into the trie.
    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        let root = self.root.take();
        if let Some(root_node) = root
            .map(|root| self.state.get_node(root))
            .transpose()?
            .flatten()
        {
            // If the trie is not empty, call the root node's insertion logic
            let root_node =
                root_node.insert(&mut self.state, Nibbles::from_bytes(&path), value.clone())?;
            self.root = Some(root_node.insert_self(&mut self.state)?)
        } else {
            // If the trie is empty, just add a leaf.
            let new_leaf = Node::from(LeafNode::new(Nibbles::from_bytes(&path), value));
            self.root = Some(new_leaf.insert_self(&mut self.state)?)
        }
        Ok(())
    }

    /// Remove a value from the trie given its RLP-encoded path.
    /// Returns the value if it was succesfully removed or None if it wasn't part of the trie
    pub fn remove(&mut self, path: PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        let root = self.root.take();
        if let Some(root) = root {
            let root_node = self
                .state
                .get_node(root)?
                .ok_or(TrieError::InconsistentTree)?;
            let (root_node, old_value) =
                root_node.remove(&mut self.state, Nibbles::from_bytes(&path))?;
            self.root = root_node
                .map(|root| root.insert_self(&mut self.state))
                .transpose()?;
            Ok(old_value)
        } else {
            Ok(None)
        }
    }

    /// Return the hash of the trie's root node.
    /// Returns keccak(RLP_NULL) if the trie is empty
    /// Also commits changes to the DB
    pub fn hash(&mut self) -> Result<H256, TrieError> {
        if let Some(ref root) = self.root {
            self.state.commit(root)?;
        }
        Ok(self
            .root
            .as_ref()
            .map(|root| root.clone().finalize())
            .unwrap_or(*EMPTY_TRIE_HASH))
    }

    /// Return the hash of the trie's root node.
    /// Returns keccak(RLP_NULL) if the trie is empty
    pub fn hash_no_commit(&self) -> H256 {
        self.root
            .as_ref()
            .map(|root| root.clone().finalize())
            .unwrap_or(*EMPTY_TRIE_HASH)
    }

    /// Obtain a merkle proof for the given path.
    /// The proof will contain all the encoded nodes traversed until reaching the node where the path is stored (including this last node).
    /// The proof will still be constructed even if the path is not stored in the trie, proving its absence.
    pub fn get_proof(&self, path: &PathRLP) -> Result<Vec<NodeRLP>, TrieError> {
        // Will store all the encoded nodes traversed until reaching the node containing the path
        let mut node_path = Vec::new();
        let Some(root) = &self.root else {
            return Ok(node_path);
        };
        // If the root is inlined, add it to the node_path
        if let NodeHash::Inline(node) = root {
            node_path.push(node.to_vec());
        }
        if let Some(root_node) = self.state.get_node(root.clone())? {
            root_node.get_path(&self.state, Nibbles::from_bytes(path), &mut node_path)?;
        }
        Ok(node_path)
    }

    /// Obtains all encoded nodes traversed until reaching the node where every path is stored.
    /// The list doesn't include the root node, this is returned separately.
    /// Will still be constructed even if some path is not stored in the trie.
    pub fn get_proofs(
        &self,
        paths: &[PathRLP],
    ) -> Result<(Option<NodeRLP>, Vec<NodeRLP>), TrieError> {
        let Some(root_node) = self
            .root
            .as_ref()
            .map(|root| self.state.get_node(root.clone()))
            .transpose()?
            .flatten()
        else {
            return Ok((None, Vec::new()));
        };

        let mut node_path = Vec::new();
        for path in paths {
            let mut nodes = self.get_proof(path)?;
            nodes.swap_remove(0);
            node_path.extend(nodes); // skip root node
        }

        // dedup
        // TODO: really inefficient, by making the traversing smarter we can avoid having
        // duplicates
        let node_path: HashSet<_> = node_path.drain(..).collect();
        let node_path = Vec::from_iter(node_path);
        Ok((Some(root_node.encode_raw()), node_path))
    }

    /// Creates a cached Trie (with [NullTrieDB]) from a list of encoded nodes.
    /// Generally used in conjuction with [Trie::get_proofs].
    pub fn from_nodes(
        root_node: Option<&NodeRLP>,
        other_nodes: &[NodeRLP],
    ) -> Result<Self, TrieError> {
        let mut trie = Trie::stateless();

        if let Some(root_node) = root_node {
            let root_node = Node::decode_raw(root_node)?;
            trie.root = Some(root_node.insert_self(&mut trie.state)?);
        }

        for node in other_nodes.iter().map(|node| Node::decode_raw(node)) {
            node?.insert_self(&mut trie.state)?;
        }

        Ok(trie)
    }

    /// Builds an in-memory trie from the given elements and returns its hash
    pub fn compute_hash_from_unsorted_iter(
        iter: impl Iterator<Item = (PathRLP, ValueRLP)>,
    ) -> H256 {
        let mut trie = Trie::stateless();
        for (path, value) in iter {
            // Unwraping here won't panic as our in_memory trie DB won't fail
            trie.insert(path, value).unwrap();
        }
        trie.root
            .as_ref()
            .map(|root| root.clone().finalize())
            .unwrap_or(*EMPTY_TRIE_HASH)
    }

    /// Creates a new stateless trie. This trie won't be able to store any nodes so all data will be lost after calculating the hash
    /// Only use it for proof verification or computing a hash from an iterator
    pub(crate) fn stateless() -> Trie {
        // We will only be using the trie's cache so we don't need a working DB
        struct NullTrieDB;

        impl TrieDB for NullTrieDB {
            fn get(&self, _key: Vec<u8>) -> Result<Option<Vec<u8>>, TrieError> {
                Ok(None)
            }

            fn put(&self, _key: Vec<u8>, _value: Vec<u8>) -> Result<(), TrieError> {
                Ok(())
            }

            fn put_batch(&self, _key_values: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), TrieError> {
                Ok(())
            }
        }

        Trie::new(Box::new(NullTrieDB))
    }

    /// Obtain the encoded node given its path.
    /// Allows usage of full paths (byte slice of 32 bytes) or compact-encoded nibble slices (with length lower than 32)
    pub fn get_node(&self, partial_path: &PathRLP) -> Result<Vec<u8>, TrieError> {
        // Convert compact-encoded nibbles into a byte slice if necessary
        let partial_path = match partial_path.len() {
            // Compact-encoded nibbles
            n if n < 32 => Nibbles::decode_compact(partial_path),
            // Full path (No conversion needed)
            32 => Nibbles::from_bytes(partial_path),
            // We won't handle paths with length over 32
            _ => return Ok(vec![]),
        };

        // Fetch node
        let Some(root_node) = self
            .root
            .as_ref()
            .map(|root| self.state.get_node(root.clone()))
            .transpose()?
            .flatten()
        else {
            return Ok(vec![]);
        };
        self.get_node_inner(root_node, partial_path)
    }

    fn get_node_inner(&self, node: Node, mut partial_path: Nibbles) -> Result<Vec<u8>, TrieError> {
        // If we reached the end of the partial path, return the current node
        if partial_path.is_empty() {
            return Ok(node.encode_raw());
        }
        match node {
            Node::Branch(branch_node) => match partial_path.next_choice() {
                Some(idx) => {
                    let child_hash = &branch_node.choices[idx];
                    if child_hash.is_valid() {
                        let child_node = self
                            .state
                            .get_node(child_hash.clone())?
                            .ok_or(TrieError::InconsistentTree)?;
                        self.get_node_inner(child_node, partial_path)
                    } else {
                        Ok(vec![])
                    }
                }
                _ => Ok(vec![]),
            },
            Node::Extension(extension_node) => {
                if partial_path.skip_prefix(&extension_node.prefix)
                    && extension_node.child.is_valid()
                {
                    let child_node = self
                        .state
                        .get_node(extension_node.child.clone())?
                        .ok_or(TrieError::InconsistentTree)?;
                    self.get_node_inner(child_node, partial_path)
                } else {
                    Ok(vec![])
                }
            }
            Node::Leaf(_) => Ok(vec![]),
        }
    }

    #[cfg(test)]
    /// Creates a new Trie based on a temporary InMemory DB
    fn new_temp() -> Self {
        use std::collections::HashMap;
        use std::sync::Arc;
        use std::sync::Mutex;

        let hmap: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();
        let map = Arc::new(Mutex::new(hmap));
        let db = InMemoryTrieDB::new(map);
        Trie::new(Box::new(db))
    }
}
