use swaplock_rlp::{decode::RLPDecode, structs::Encoder};

use crate::{
    error::TrieError,
    nibbles::Nibbles,
    node::{BranchNode, ExtensionNode, Node},
    node_hash::NodeHash,
    state::TrieState,
    {NodeRLP, ValueRLP},
};

/// A leaf node holds the remaining path nibbles and the value stored at that path.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub path: Nibbles,
    pub value: ValueRLP,
}

impl LeafNode {
    pub fn new(path: Nibbles, value: ValueRLP) -> Self {
        Self { path, value }
    }

    pub fn get(&self, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        Ok((path == self.path).then(|| self.value.clone()))
    }

    pub fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        // Replacing the value stored at this exact path.
        if path == self.path {
            return Ok(Node::from(LeafNode::new(path, value)));
        }

        // The two paths diverge: split into a branch (possibly under an extension).
        let match_len = path.count_prefix(&self.path);
        let mut choices: [NodeHash; 16] = Default::default();
        let mut branch_value = ValueRLP::new();

        place(
            &mut choices,
            &mut branch_value,
            state,
            path.offset(match_len),
            value,
        )?;
        place(
            &mut choices,
            &mut branch_value,
            state,
            self.path.offset(match_len),
            self.value,
        )?;

        let branch = Node::from(BranchNode::new_with_value(choices, branch_value));

        if match_len == 0 {
            return Ok(branch);
        }

        let branch_hash = branch.insert_self(state)?;
        Ok(Node::from(ExtensionNode::new(
            path.slice(0, match_len),
            branch_hash,
        )))
    }

    pub fn remove(self, path: Nibbles) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        if path == self.path {
            Ok((None, Some(self.value)))
        } else {
            Ok((Some(Node::from(self)), None))
        }
    }

    pub fn get_path(&self, node_path: &mut Vec<NodeRLP>) -> Result<(), TrieError> {
        node_path.push(self.encode_raw());
        Ok(())
    }

    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&self.path.encode_compact())
            .encode_field(&self.value)
            .finish();
        buf
    }

    pub fn decode_raw(items: &[&[u8]]) -> Result<Self, TrieError> {
        let path: Vec<u8> = RLPDecode::decode(items[0])?;
        let value: ValueRLP = RLPDecode::decode(items[1])?;
        Ok(Self {
            path: Nibbles::decode_compact(&path),
            value,
        })
    }
}

/// Places a (path-remainder, value) pair produced by splitting two leaves: if the
/// remainder is only the path terminator, the value lands on the branch itself,
/// otherwise it becomes a fresh leaf hung off the matching choice slot.
fn place(
    choices: &mut [NodeHash; 16],
    branch_value: &mut ValueRLP,
    state: &mut TrieState,
    mut remaining: Nibbles,
    value: ValueRLP,
) -> Result<(), TrieError> {
    match remaining.next_choice() {
        Some(choice_index) => {
            let new_leaf = Node::from(LeafNode::new(remaining, value));
            choices[choice_index] = new_leaf.insert_self(state)?;
        }
        None => *branch_value = value,
    }
    Ok(())
}
