//! バイト単位のトライ
//!
//! 表層形のUTF-8バイト列から、エントリポインタリストのオフセットを引きます。
//! 1文字ずつ段階的に辿れることが必要なため、各ステップの結果を
//! [`TraverseStatus`]で返すカーソルを提供します。

use std::collections::BTreeMap;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{MorphError, Result};

const NO_VALUE: u32 = u32::MAX;

/// トライのステップ結果
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum TraverseStatus {
    /// 接頭辞が一致し、このノードにエントリが存在する
    Ok,
    /// 接頭辞が一致しない。これ以上延長できない
    NoNode,
    /// 接頭辞は一致したが、このノードにエントリは存在しない
    NoLeaf,
}

#[derive(Clone, Copy, Debug, Default, Archive, Serialize, Deserialize)]
struct TrieNode {
    first_child: u32,
    num_children: u32,
    value: u32,
}

/// 子をラベル順に連続配置したトライ
#[derive(Clone, Debug, Default, Archive, Serialize, Deserialize)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    labels: Vec<u8>,
}

impl Trie {
    /// レコードからトライを構築します。
    ///
    /// # 引数
    ///
    /// * `records` - キーと値の組。キーは重複してはいけません。
    ///
    /// # エラー
    ///
    /// キーが重複している場合、または値が`u32::MAX`の場合にエラーを返します。
    pub fn from_records<K>(records: &[(K, u32)]) -> Result<Self>
    where
        K: AsRef<[u8]>,
    {
        // Temporary pointer-based tree; children ordered by label.
        let mut tmp: Vec<(BTreeMap<u8, usize>, u32)> = vec![(BTreeMap::new(), NO_VALUE)];
        for (key, value) in records {
            if *value == NO_VALUE {
                return Err(MorphError::invalid_parameter("records", "value is reserved"));
            }
            let mut cur = 0;
            for &b in key.as_ref() {
                let next = tmp.len();
                cur = *tmp[cur].0.entry(b).or_insert(next);
                if cur == next {
                    tmp.push((BTreeMap::new(), NO_VALUE));
                }
            }
            if tmp[cur].1 != NO_VALUE {
                return Err(MorphError::invalid_parameter(
                    "records",
                    format!("duplicate key: {:?}", String::from_utf8_lossy(key.as_ref())),
                ));
            }
            tmp[cur].1 = *value;
        }

        let mut nodes = Vec::with_capacity(tmp.len());
        let mut labels = Vec::with_capacity(tmp.len());
        let mut queue = std::collections::VecDeque::new();
        nodes.push(TrieNode::default());
        labels.push(0);
        queue.push_back((0usize, 0usize));
        while let Some((old, new)) = queue.pop_front() {
            let (children, value) = &tmp[old];
            let first_child = u32::try_from(nodes.len())?;
            for (&label, &child) in children {
                queue.push_back((child, nodes.len()));
                nodes.push(TrieNode::default());
                labels.push(label);
            }
            nodes[new] = TrieNode {
                first_child,
                num_children: u32::try_from(children.len())?,
                value: *value,
            };
        }
        Ok(Self { nodes, labels })
    }

    /// ルートから始まるカーソルを返します。
    #[inline(always)]
    pub fn traversal(&self) -> TrieTraversal<'_> {
        TrieTraversal {
            trie: self,
            node: Some(0),
        }
    }

    /// キーに完全一致する値を返します。
    pub fn exact_match(&self, key: &[u8]) -> Option<u32> {
        let mut trav = self.traversal();
        match trav.step(key) {
            TraverseStatus::Ok => trav.value(),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 全ノードの子の範囲が配列の内側にあることを検証します。
    ///
    /// # エラー
    ///
    /// ルートがない場合、ラベルとノードの数が一致しない場合、または
    /// 子の範囲が配列の外を指す場合に[`MorphError::InvalidFormat`]を返します。
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(MorphError::invalid_format("trie", "trie has no root"));
        }
        if self.labels.len() != self.nodes.len() {
            return Err(MorphError::invalid_format(
                "trie",
                format!(
                    "{} labels for {} nodes",
                    self.labels.len(),
                    self.nodes.len()
                ),
            ));
        }
        for (i, n) in self.nodes.iter().enumerate() {
            let end = u64::from(n.first_child) + u64::from(n.num_children);
            if end > self.nodes.len() as u64 {
                return Err(MorphError::invalid_format(
                    "trie",
                    format!(
                        "children {}..{end} of node {i} exceed {} nodes",
                        n.first_child,
                        self.nodes.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn child(&self, node: usize, label: u8) -> Option<usize> {
        let n = &self.nodes[node];
        let start = n.first_child as usize;
        let end = start + n.num_children as usize;
        self.labels[start..end]
            .binary_search(&label)
            .ok()
            .map(|i| start + i)
    }
}

/// トライのカーソル
///
/// 一度[`TraverseStatus::NoNode`]を返したカーソルは、以降も常に
/// [`TraverseStatus::NoNode`]を返します。
#[derive(Clone, Copy, Debug)]
pub struct TrieTraversal<'a> {
    trie: &'a Trie,
    node: Option<usize>,
}

impl TrieTraversal<'_> {
    /// バイト列の分だけ辿ります。
    pub fn step(&mut self, bytes: &[u8]) -> TraverseStatus {
        let Some(mut node) = self.node else {
            return TraverseStatus::NoNode;
        };
        for &b in bytes {
            match self.trie.child(node, b) {
                Some(next) => node = next,
                None => {
                    self.node = None;
                    return TraverseStatus::NoNode;
                }
            }
        }
        self.node = Some(node);
        if self.trie.nodes[node].value == NO_VALUE {
            TraverseStatus::NoLeaf
        } else {
            TraverseStatus::Ok
        }
    }

    /// 現在のノードの値を返します。
    #[inline(always)]
    pub fn value(&self) -> Option<u32> {
        self.node
            .map(|n| self.trie.nodes[n].value)
            .filter(|&v| v != NO_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_statuses() {
        let trie = Trie::from_records(&[("ab", 1), ("abc", 2), ("b", 3)]).unwrap();
        let mut trav = trie.traversal();
        assert_eq!(trav.step(b"a"), TraverseStatus::NoLeaf);
        assert_eq!(trav.value(), None);
        assert_eq!(trav.step(b"b"), TraverseStatus::Ok);
        assert_eq!(trav.value(), Some(1));
        assert_eq!(trav.step(b"c"), TraverseStatus::Ok);
        assert_eq!(trav.value(), Some(2));
        assert_eq!(trav.step(b"d"), TraverseStatus::NoNode);
        assert_eq!(trav.step(b""), TraverseStatus::NoNode);
        assert_eq!(trav.step(b"c"), TraverseStatus::NoNode);
    }

    #[test]
    fn test_multibyte() {
        let trie = Trie::from_records(&[("東京", 7), ("東", 3)]).unwrap();
        let mut trav = trie.traversal();
        assert_eq!(trav.step("東".as_bytes()), TraverseStatus::Ok);
        assert_eq!(trav.step("京".as_bytes()), TraverseStatus::Ok);
        assert_eq!(trav.value(), Some(7));
        assert_eq!(trie.exact_match("京".as_bytes()), None);
    }

    #[test]
    fn test_duplicate_key() {
        assert!(Trie::from_records(&[("a", 1), ("a", 2)]).is_err());
    }

    fn out_of_range_trie() -> Trie {
        Trie {
            nodes: vec![TrieNode {
                first_child: 7,
                num_children: 2,
                value: NO_VALUE,
            }],
            labels: vec![0],
        }
    }

    #[test]
    fn test_validate() {
        let trie = Trie::from_records(&[("ab", 1), ("b", 3)]).unwrap();
        trie.validate().unwrap();

        assert!(matches!(
            out_of_range_trie().validate(),
            Err(MorphError::InvalidFormat(_))
        ));
        assert!(matches!(
            Trie::default().validate(),
            Err(MorphError::InvalidFormat(_))
        ));
        let mismatched = Trie {
            labels: vec![],
            ..Trie::from_records(&[("a", 1)]).unwrap()
        };
        assert!(mismatched.validate().is_err());
    }

    #[test]
    fn test_read_rejects_out_of_range_children() {
        use crate::Dictionary;
        use crate::test_utils::{SMALL_LEXICON, build_dictionary};

        let mut dict = build_dictionary(SMALL_LEXICON);
        dict.trie = out_of_range_trie();
        let mut bytes = vec![];
        dict.write(&mut bytes).unwrap();
        assert!(matches!(
            Dictionary::read(bytes.as_slice()),
            Err(MorphError::InvalidFormat(_))
        ));
    }
}
