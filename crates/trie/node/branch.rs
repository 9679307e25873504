use swaplock_rlp::{decode::RLPDecode, structs::Encoder};

use crate::{
    error::TrieError,
    nibbles::Nibbles,
    node::{ExtensionNode, LeafNode, Node},
    node_hash::NodeHash,
    state::TrieState,
    {NodeRLP, ValueRLP},
};

/// A branch node has one child slot per nibble value (0-15) plus an optional value
/// stored at this node itself, for paths that terminate here.
#[derive(Debug, Clone)]
pub struct BranchNode {
    pub choices: [NodeHash; 16],
    pub value: ValueRLP,
}

impl BranchNode {
    pub fn new(choices: [NodeHash; 16]) -> Self {
        Self {
            choices,
            value: ValueRLP::new(),
        }
    }

    pub fn new_with_value(choices: [NodeHash; 16], value: ValueRLP) -> Self {
        Self { choices, value }
    }

    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match path.next_choice() {
            Some(index) => {
                let child = &self.choices[index];
                if !child.is_valid() {
                    return Ok(None);
                }
                let child_node = state
                    .get_node(child.clone())?
                    .ok_or(TrieError::InconsistentTree)?;
                child_node.get(state, path)
            }
            None => Ok((!self.value.is_empty()).then(|| self.value.clone())),
        }
    }

    pub fn insert(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match path.next_choice() {
            Some(index) => {
                let child = std::mem::take(&mut self.choices[index]);
                let new_child = if child.is_valid() {
                    let child_node = state
                        .get_node(child)?
                        .ok_or(TrieError::InconsistentTree)?;
                    child_node.insert(state, path, value)?
                } else {
                    Node::from(LeafNode::new(path, value))
                };
                self.choices[index] = new_child.insert_self(state)?;
            }
            None => self.value = value,
        }
        Ok(Node::from(self))
    }

    pub fn remove(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        let removed = match path.next_choice() {
            Some(index) => {
                let child = self.choices[index].clone();
                if !child.is_valid() {
                    None
                } else {
                    let child_node = state
                        .get_node(child)?
                        .ok_or(TrieError::InconsistentTree)?;
                    let (new_child, removed) = child_node.remove(state, path)?;
                    self.choices[index] = match new_child {
                        Some(node) => node.insert_self(state)?,
                        None => NodeHash::default(),
                    };
                    removed
                }
            }
            None => {
                let removed = (!self.value.is_empty()).then(|| std::mem::take(&mut self.value));
                removed
            }
        };

        Ok((self.simplify(state)?, removed))
    }

    /// After a removal a branch may be left with at most one remaining child and no
    /// value (or no children and a value): collapse it into a leaf or extension so the
    /// trie never carries degenerate branches.
    fn simplify(self, state: &mut TrieState) -> Result<Option<Node>, TrieError> {
        let children: Vec<(usize, NodeHash)> = self
            .choices
            .iter()
            .enumerate()
            .filter(|(_, hash)| hash.is_valid())
            .map(|(i, hash)| (i, hash.clone()))
            .collect();

        if !self.value.is_empty() && children.is_empty() {
            return Ok(Some(Node::from(LeafNode::new(
                Nibbles::from_hex(vec![16]),
                self.value,
            ))));
        }

        if self.value.is_empty() && children.len() == 1 {
            let (index, hash) = children[0].clone();
            let child_node = state.get_node(hash.clone())?.ok_or(TrieError::InconsistentTree)?;
            let merged = match child_node {
                Node::Leaf(mut leaf) => {
                    let mut path = Nibbles::from_hex(vec![index as u8]);
                    path.extend(&leaf.path);
                    leaf.path = path;
                    Node::from(leaf)
                }
                Node::Extension(ext) => {
                    let mut prefix = Nibbles::from_hex(vec![index as u8]);
                    prefix.extend(&ext.prefix);
                    Node::from(ExtensionNode::new(prefix, ext.child))
                }
                Node::Branch(_) => {
                    Node::from(ExtensionNode::new(Nibbles::from_hex(vec![index as u8]), hash))
                }
            };
            return Ok(Some(merged));
        }

        if self.value.is_empty() && children.is_empty() {
            return Ok(None);
        }

        Ok(Some(Node::from(self)))
    }

    pub fn get_path(
        &self,
        state: &TrieState,
        mut path: Nibbles,
        node_path: &mut Vec<NodeRLP>,
    ) -> Result<(), TrieError> {
        node_path.push(self.encode_raw());
        if let Some(index) = path.next_choice() {
            let child = &self.choices[index];
            if child.is_valid() {
                if let Some(child_node) = state.get_node(child.clone())? {
                    child_node.get_path(state, path, node_path)?;
                }
            }
        }
        Ok(())
    }

    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        for choice in self.choices.iter() {
            encoder = encoder.encode_field(choice);
        }
        encoder.encode_field(&self.value).finish();
        buf
    }

    pub fn decode_raw(items: &[&[u8]]) -> Result<Self, TrieError> {
        let mut choices: [NodeHash; 16] = Default::default();
        for (i, choice) in choices.iter_mut().enumerate() {
            let raw: Vec<u8> = RLPDecode::decode(items[i])?;
            *choice = NodeHash::from(raw);
        }
        let value: ValueRLP = RLPDecode::decode(items[16])?;
        Ok(Self { choices, value })
    }
}
