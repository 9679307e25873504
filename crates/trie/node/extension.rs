use swaplock_rlp::{decode::RLPDecode, structs::Encoder};

use crate::{
    error::TrieError,
    nibbles::Nibbles,
    node::{LeafNode, Node},
    node_hash::NodeHash,
    state::TrieState,
    {NodeRLP, ValueRLP},
};

/// An extension node holds a shared nibble prefix leading to a single child, which is
/// always a branch (leaves and other extensions are never the direct child of one).
#[derive(Debug, Clone)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: NodeHash,
}

impl ExtensionNode {
    pub fn new(prefix: Nibbles, child: NodeHash) -> Self {
        Self { prefix, child }
    }

    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        if !path.skip_prefix(&self.prefix) {
            return Ok(None);
        }
        let child_node = state
            .get_node(self.child.clone())?
            .ok_or(TrieError::InconsistentTree)?;
        child_node.get(state, path)
    }

    pub fn insert(
        self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        if path.skip_prefix(&self.prefix) {
            let child_node = state
                .get_node(self.child)?
                .ok_or(TrieError::InconsistentTree)?;
            let new_child = child_node.insert(state, path, value)?;
            let new_child_hash = new_child.insert_self(state)?;
            return Ok(Node::from(ExtensionNode::new(self.prefix, new_child_hash)));
        }

        // The new path diverges partway through the extension's prefix: split it into
        // a (possibly shorter) extension above a branch that holds both subtrees.
        let match_len = path.count_prefix(&self.prefix);
        let mut choices: [NodeHash; 16] = Default::default();
        let mut branch_value = ValueRLP::new();

        // Existing subtree: keep the extension's remaining prefix (if any) above the
        // original child, otherwise hang the child directly off the branch.
        // `match_len < self.prefix.len()` always holds here (a full prefix match would
        // have taken the `skip_prefix` branch above), so this remainder is never empty.
        let old_remaining = self.prefix.offset(match_len);
        let choice_index = old_remaining
            .clone()
            .next_choice()
            .expect("extension prefix remainder is never empty on divergence");
        let remaining_prefix = old_remaining.offset(1);
        choices[choice_index] = if remaining_prefix.is_empty() {
            self.child
        } else {
            Node::from(ExtensionNode::new(remaining_prefix, self.child)).insert_self(state)?
        };

        // New value's subtree.
        let new_remaining = path.offset(match_len);
        match new_remaining.clone().next_choice() {
            Some(choice_index) => {
                let new_leaf = Node::from(LeafNode::new(new_remaining.offset(1), value));
                choices[choice_index] = new_leaf.insert_self(state)?;
            }
            None => branch_value = value,
        }

        let branch = Node::from(super::BranchNode::new_with_value(choices, branch_value));

        if match_len == 0 {
            return Ok(branch);
        }

        let branch_hash = branch.insert_self(state)?;
        Ok(Node::from(ExtensionNode::new(
            self.prefix.slice(0, match_len),
            branch_hash,
        )))
    }

    pub fn remove(
        self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        if !path.skip_prefix(&self.prefix) {
            return Ok((Some(Node::from(self)), None));
        }
        let child_node = state
            .get_node(self.child)?
            .ok_or(TrieError::InconsistentTree)?;
        let (new_child, removed) = child_node.remove(state, path)?;
        let Some(new_child) = new_child else {
            return Ok((None, removed));
        };
        let merged = match new_child {
            // Collapse two extensions (or an extension and a leaf) into one to keep
            // the invariant that extensions aren't chained.
            Node::Extension(child_ext) => {
                let mut prefix = self.prefix;
                prefix.extend(&child_ext.prefix);
                Node::from(ExtensionNode::new(prefix, child_ext.child))
            }
            Node::Leaf(mut child_leaf) => {
                child_leaf.path = {
                    let mut prefix = self.prefix;
                    prefix.extend(&child_leaf.path);
                    prefix
                };
                Node::from(child_leaf)
            }
            branch @ Node::Branch(_) => {
                let new_child_hash = branch.insert_self(state)?;
                Node::from(ExtensionNode::new(self.prefix, new_child_hash))
            }
        };
        Ok((Some(merged), removed))
    }

    pub fn get_path(
        &self,
        state: &TrieState,
        mut path: Nibbles,
        node_path: &mut Vec<NodeRLP>,
    ) -> Result<(), TrieError> {
        node_path.push(self.encode_raw());
        if !path.skip_prefix(&self.prefix) {
            return Ok(());
        }
        if let Some(child_node) = state.get_node(self.child.clone())? {
            child_node.get_path(state, path, node_path)?;
        }
        Ok(())
    }

    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&self.prefix.encode_compact())
            .encode_field(&self.child)
            .finish();
        buf
    }

    pub fn decode_raw(items: &[&[u8]]) -> Result<Self, TrieError> {
        let prefix: Vec<u8> = RLPDecode::decode(items[0])?;
        let child: Vec<u8> = RLPDecode::decode(items[1])?;
        Ok(Self {
            prefix: Nibbles::decode_compact(&prefix),
            child: NodeHash::from(child),
        })
    }

    /// True if `encoded_path` (the compact-encoded first item of a 2-item node) carries
    /// the extension flag rather than the leaf flag.
    pub fn is_extension_encoding(encoded_path: &[u8]) -> Result<bool, TrieError> {
        let path: Vec<u8> = RLPDecode::decode(encoded_path)?;
        Ok(path.first().map_or(true, |b| b & 0x20 == 0))
    }
}
