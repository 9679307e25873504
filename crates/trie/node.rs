mod branch;
mod extension;
mod leaf;

pub use branch::BranchNode;
pub use extension::ExtensionNode;
pub use leaf::LeafNode;

use swaplock_rlp::decode::{decode_rlp_item, get_item_with_prefix};

use crate::{
    error::TrieError,
    nibbles::Nibbles,
    node_hash::NodeHash,
    state::TrieState,
    {NodeRLP, ValueRLP},
};

/// A trie node, in one of its three possible shapes.
#[derive(Debug, Clone)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl From<BranchNode> for Node {
    fn from(node: BranchNode) -> Self {
        Node::Branch(Box::new(node))
    }
}

impl From<ExtensionNode> for Node {
    fn from(node: ExtensionNode) -> Self {
        Node::Extension(node)
    }
}

impl From<LeafNode> for Node {
    fn from(node: LeafNode) -> Self {
        Node::Leaf(node)
    }
}

impl Node {
    /// Retrieves a value from the subtrie rooted at this node, given its path.
    pub fn get(&self, state: &TrieState, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match self {
            Node::Branch(n) => n.get(state, path),
            Node::Extension(n) => n.get(state, path),
            Node::Leaf(n) => n.get(path),
        }
    }

    /// Inserts a value into the subtrie rooted at this node, returning the new root node.
    pub fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match self {
            Node::Branch(n) => n.insert(state, path, value),
            Node::Extension(n) => n.insert(state, path, value),
            Node::Leaf(n) => n.insert(state, path, value),
        }
    }

    /// Removes a value from the subtrie rooted at this node, returning the (possibly absent)
    /// new root node and the removed value, if any.
    pub fn remove(
        self,
        state: &mut TrieState,
        path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        match self {
            Node::Branch(n) => n.remove(state, path),
            Node::Extension(n) => n.remove(state, path),
            Node::Leaf(n) => n.remove(path),
        }
    }

    /// Collects the encoded nodes traversed on the way to `path` (inclusive) into `node_path`.
    pub fn get_path(
        &self,
        state: &TrieState,
        path: Nibbles,
        node_path: &mut Vec<NodeRLP>,
    ) -> Result<(), TrieError> {
        match self {
            Node::Branch(n) => n.get_path(state, path, node_path),
            Node::Extension(n) => n.get_path(state, path, node_path),
            Node::Leaf(n) => n.get_path(node_path),
        }
    }

    /// Commits this node to `state` (without recursing into children) and returns its
    /// [`NodeHash`], computed from its own RLP encoding.
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        let hash = NodeHash::from_encoded_raw(self.encode_raw());
        state.insert_node(self, hash.clone());
        Ok(hash)
    }

    /// RLP-encodes this node on its own (not its children, which are referenced by hash).
    pub fn encode_raw(&self) -> Vec<u8> {
        match self {
            Node::Branch(n) => n.encode_raw(),
            Node::Extension(n) => n.encode_raw(),
            Node::Leaf(n) => n.encode_raw(),
        }
    }

    /// Decodes a node from its own RLP encoding (the inverse of [`Node::encode_raw`]).
    pub fn decode_raw(rlp: &[u8]) -> Result<Node, TrieError> {
        let (is_list, payload, _) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(TrieError::Verify(
                "expected a list encoding for a trie node".to_string(),
            ));
        }
        let mut items = Vec::new();
        let mut rest = payload;
        while !rest.is_empty() {
            let (item, next) = get_item_with_prefix(rest)?;
            items.push(item);
            rest = next;
        }
        match items.len() {
            17 => BranchNode::decode_raw(&items).map(Node::from),
            2 => {
                if ExtensionNode::is_extension_encoding(items[0])? {
                    ExtensionNode::decode_raw(&items).map(Node::from)
                } else {
                    LeafNode::decode_raw(&items).map(Node::from)
                }
            }
            _ => Err(TrieError::Verify(format!(
                "invalid trie node encoding: {} items",
                items.len()
            ))),
        }
    }
}
