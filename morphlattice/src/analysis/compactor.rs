//! ノードの圧縮
//!
//! 同じ境界から始まり、素性射影が同一になるノード群を1つのエイリアスノードに
//! まとめます。スコアはまったく同じになるため、ラティスには代表だけを残し、
//! 出力時に[`NodeWalker`](super::walker::NodeWalker)で元のエントリに展開します。

use hashbrown::HashMap;
use xxhash_rust::xxh64::xxh64;

use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::lattice_builder::LatticeNodeSeed;
use crate::dictionary::entries::{DicEntryBuffer, DictionaryEntries, EntryPtr};
use crate::errors::{MorphError, Result};
use crate::utils::Sliceable;

const COMPACTION_SEED: u64 = 0x4c61_7474_6963_6521;

/// 素性射影が同一のノードをまとめる圧縮器
#[derive(Default)]
pub struct LatticeCompactor {
    fields: Vec<usize>,
    features: Sliceable<i32>,
    hashes: Vec<u64>,
    groups: HashMap<u64, Vec<usize>>,
    order: Vec<u64>,
    members: Vec<EntryPtr>,
    num_deleted: usize,
}

impl LatticeCompactor {
    /// 比較に使う素性列を指定して初期化します。
    pub fn initialize(&mut self, fields: &[usize]) {
        self.fields.clear();
        self.fields.extend_from_slice(fields);
        self.num_deleted = 0;
    }

    /// 比較に使う素性列
    #[inline(always)]
    pub fn used_features(&self) -> &[usize] {
        &self.fields
    }

    /// これまでに削除されたノード数
    #[inline(always)]
    pub fn num_deleted(&self) -> usize {
        self.num_deleted
    }

    /// 各ノードの素性行を読み込み、射影のハッシュ値を計算します。
    pub fn compute_hashes(
        &mut self,
        seeds: &[LatticeNodeSeed],
        entries: &DictionaryEntries<'_>,
        xtra: &ExtraNodesContext,
    ) -> Result<()> {
        let num_features = entries.num_features();
        self.features.reset(num_features, seeds.len(), 0);
        self.hashes.clear();
        let mut buffer = DicEntryBuffer::default();
        let mut bytes = Vec::with_capacity((self.fields.len() + 1) * 4);
        for (i, seed) in seeds.iter().enumerate() {
            if seed.is_erased() {
                self.hashes.push(0);
                continue;
            }
            let row = self.features.row_mut(i);
            if seed.entry_ptr.is_special() {
                let feats = xtra.features(seed.entry_ptr).ok_or_else(|| {
                    MorphError::invalid_state(
                        "unknown extra node",
                        format!("{:?}", seed.entry_ptr),
                    )
                })?;
                row.copy_from_slice(feats);
            } else {
                entries.fill_buffer(seed.entry_ptr, &mut buffer)?;
                row.copy_from_slice(buffer.features());
            }
            bytes.clear();
            bytes.extend_from_slice(&(seed.end as u32).to_le_bytes());
            for &f in &self.fields {
                bytes.extend_from_slice(&row[f].to_le_bytes());
            }
            self.hashes.push(xxh64(&bytes, COMPACTION_SEED));
        }
        Ok(())
    }

    fn same_projection(&self, seeds: &[LatticeNodeSeed], a: usize, b: usize) -> bool {
        let (ra, rb) = (self.features.row(a), self.features.row(b));
        seeds[a].end == seeds[b].end && self.fields.iter().all(|&f| ra[f] == rb[f])
    }

    /// ハッシュ値が同じノード群をエイリアスノードにまとめます。
    ///
    /// 各群の先頭のシードがエイリアスノードを指すように書き換えられ、
    /// 残りのシードは削除済み（`start == end`）になります。
    ///
    /// # 戻り値
    ///
    /// 1つでもまとめた場合は`true`
    pub fn compact(
        &mut self,
        seeds: &mut [LatticeNodeSeed],
        xtra: &mut ExtraNodesContext,
    ) -> bool {
        for group in self.groups.values_mut() {
            group.clear();
        }
        self.order.clear();
        for (i, seed) in seeds.iter().enumerate() {
            if seed.is_erased() {
                continue;
            }
            let h = self.hashes[i];
            let group = self.groups.entry(h).or_default();
            if group.is_empty() {
                self.order.push(h);
            }
            group.push(i);
        }

        let mut changed = false;
        for oi in 0..self.order.len() {
            let Some(group) = self.groups.get_mut(&self.order[oi]) else {
                continue;
            };
            let group = std::mem::take(group);
            if group.len() > 1 {
                changed |= self.fold_group(seeds, xtra, &group);
            }
            if let Some(g) = self.groups.get_mut(&self.order[oi]) {
                *g = group;
            }
        }
        changed
    }

    fn fold_group(
        &mut self,
        seeds: &mut [LatticeNodeSeed],
        xtra: &mut ExtraNodesContext,
        group: &[usize],
    ) -> bool {
        let mut changed = false;
        let mut remaining: Vec<usize> = group.to_vec();
        // Hash collisions are split into exact-match subgroups.
        while let Some(&head) = remaining.first() {
            let (same, rest): (Vec<usize>, Vec<usize>) = remaining
                .iter()
                .partition(|&&i| self.same_projection(seeds, head, i));
            if same.len() > 1 {
                self.members.clear();
                self.members.extend(same.iter().map(|&i| seeds[i].entry_ptr));
                let span = seeds[head].start..seeds[head].end;
                let alias = xtra.make_alias(self.features.row(head), &self.members, span);
                seeds[head].entry_ptr = alias;
                for &i in &same[1..] {
                    seeds[i].end = seeds[i].start;
                }
                self.num_deleted += same.len() - 1;
                changed = true;
            }
            remaining = rest;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::storage::IntStorageWriter;
    use crate::dictionary::trie::Trie;

    #[test]
    fn test_compact_unknown_nodes() {
        let empty = IntStorageWriter::new().build();
        let trie = Trie::default();
        let entries = DictionaryEntries::new(&trie, empty.reader(), empty.reader(), 2, 0);
        let mut xtra = ExtraNodesContext::new(2, 0);
        let a = xtra.make_unk(EntryPtr::default(), &[1, -10], 0..2, -10);
        let b = xtra.make_unk(EntryPtr::default(), &[1, -11], 0..2, -11);
        let c = xtra.make_unk(EntryPtr::default(), &[2, -12], 0..2, -12);
        let d = xtra.make_unk(EntryPtr::default(), &[1, -13], 0..1, -13);
        let mut seeds = vec![
            LatticeNodeSeed::new(a, 0, 2),
            LatticeNodeSeed::new(b, 0, 2),
            LatticeNodeSeed::new(c, 0, 2),
            LatticeNodeSeed::new(d, 0, 1),
        ];

        let mut compactor = LatticeCompactor::default();
        compactor.initialize(&[0]);
        compactor.compute_hashes(&seeds, &entries, &xtra).unwrap();
        assert!(compactor.compact(&mut seeds, &mut xtra));
        assert_eq!(compactor.num_deleted(), 1);

        let alias = seeds[0].entry_ptr;
        assert_eq!(xtra.alias_members(alias), &[a, b]);
        assert!(seeds[1].is_erased());
        assert_eq!(seeds[2].entry_ptr, c);
        assert_eq!(seeds[3].entry_ptr, d);
    }
}
