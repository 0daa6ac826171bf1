//! ラティスの構築
//!
//! 辞書引きと未知語生成で集めたノードの種（シード）を開始位置順に並べ、
//! BOSから到達可能かつEOSへ到達可能な境界だけを残してラティスを実体化します。

use crate::analysis::compactor::LatticeCompactor;
use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::lattice::{BOS_EOS_FEATURE, Lattice, LatticeNode, NodeRef};
use crate::dictionary::entries::{DicEntryBuffer, DictionaryEntries, EntryPtr};
use crate::errors::{MorphError, Result};

/// ノードの種
///
/// 削除されたシードは`start == end`になります。
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct LatticeNodeSeed {
    pub entry_ptr: EntryPtr,
    pub start: usize,
    pub end: usize,
}

impl LatticeNodeSeed {
    #[inline(always)]
    pub const fn new(entry_ptr: EntryPtr, start: usize, end: usize) -> Self {
        Self {
            entry_ptr,
            start,
            end,
        }
    }

    #[inline(always)]
    pub const fn is_erased(&self) -> bool {
        self.start == self.end
    }
}

/// 文字位置ごとのシードの情報
#[derive(Clone, Copy, Default, Debug)]
pub struct BoundaryInfo {
    /// 文字位置
    pub number: usize,
    /// この位置から始まるシードの数
    pub start_count: usize,
    /// この位置で終わるシードの数
    pub end_count: usize,
    /// 整列済みシード列の中で、この位置から始まる最初のシードの位置
    pub first_node_offset: usize,
}

/// ラティスの構築器
#[derive(Default)]
pub struct LatticeBuilder {
    seeds: Vec<LatticeNodeSeed>,
    boundaries: Vec<BoundaryInfo>,
    connectible: Vec<bool>,
    max_boundaries: usize,
    buffer_features: Vec<i32>,
}

impl LatticeBuilder {
    /// 入力文字数`max_codepoints`の解析のために初期化します。
    pub fn reset(&mut self, max_codepoints: usize) {
        self.seeds.clear();
        self.boundaries.clear();
        self.connectible.clear();
        self.max_boundaries = max_codepoints;
    }

    #[inline(always)]
    pub fn append_seed(&mut self, entry_ptr: EntryPtr, start: usize, end: usize) {
        self.seeds.push(LatticeNodeSeed::new(entry_ptr, start, end));
    }

    #[inline(always)]
    pub fn seeds(&self) -> &[LatticeNodeSeed] {
        &self.seeds
    }

    /// シードを`(start, end, entry_ptr)`の順に並べます。
    pub fn sort_seeds(&mut self) {
        self.seeds
            .sort_unstable_by_key(|s| (s.start, s.end, s.entry_ptr));
    }

    /// 境界ごとの情報を計算し、BOSとEOSの両方に繋がる境界を記録します。
    ///
    /// シードは[`sort_seeds`](Self::sort_seeds)で整列済みでなければなりません。
    ///
    /// # 戻り値
    ///
    /// BOSからEOSまでのパスが存在する場合は`true`
    pub fn check_connectability(&mut self) -> bool {
        let len = self.max_boundaries;
        self.boundaries.clear();
        self.boundaries.extend((0..=len).map(|number| BoundaryInfo {
            number,
            ..Default::default()
        }));
        let usable = |s: &LatticeNodeSeed| s.start < s.end && s.end <= len;
        for (i, seed) in self.seeds.iter().enumerate() {
            if !usable(seed) {
                continue;
            }
            let info = &mut self.boundaries[seed.start];
            if info.start_count == 0 {
                info.first_node_offset = i;
            }
            info.start_count += 1;
            self.boundaries[seed.end].end_count += 1;
        }

        let mut forward = vec![false; len + 1];
        forward[0] = true;
        for seed in &self.seeds {
            if usable(seed) && forward[seed.start] {
                forward[seed.end] = true;
            }
        }
        let mut backward = vec![false; len + 1];
        backward[len] = true;
        for seed in self.seeds.iter().rev() {
            if usable(seed) && backward[seed.end] {
                backward[seed.start] = true;
            }
        }

        self.connectible.clear();
        self.connectible
            .extend(forward.iter().zip(&backward).map(|(&f, &b)| f && b));
        self.connectible[len]
    }

    /// 構築の前提条件を検証します。
    ///
    /// # エラー
    ///
    /// シードが入力の範囲外にある場合、またはBOSからEOSまでのパスが存在しない場合に
    /// [`MorphError::InvalidState`]を返します。
    pub fn prepare(&self) -> Result<()> {
        if self.connectible.len() != self.max_boundaries + 1 {
            return Err(MorphError::invalid_state(
                "lattice is not prepared",
                "check_connectability was not called",
            ));
        }
        if let Some(seed) = self
            .seeds
            .iter()
            .find(|s| s.start > s.end || s.end > self.max_boundaries)
        {
            return Err(MorphError::invalid_state(
                "invalid seed",
                format!("{seed:?} for input of {} codepoints", self.max_boundaries),
            ));
        }
        if !self.connectible[self.max_boundaries] {
            return Err(MorphError::invalid_state(
                "could not build lattice",
                "no path connects BOS and EOS",
            ));
        }
        Ok(())
    }

    /// 文字位置`boundary`の情報を返します。
    #[inline(always)]
    pub fn info_at(&self, boundary: usize) -> &BoundaryInfo {
        &self.boundaries[boundary]
    }

    /// 文字位置`boundary`がBOSとEOSの両方に繋がっているかどうか
    #[inline(always)]
    pub fn is_accessible(&self, boundary: usize) -> bool {
        self.connectible[boundary]
    }

    /// 到達不能な文字位置の数
    pub fn num_inaccessible(&self) -> usize {
        self.connectible.iter().filter(|&&c| !c).count()
    }

    /// 文字位置`boundary`から始まるシードを圧縮します。
    pub fn compact_boundary(
        &mut self,
        boundary: usize,
        compactor: &mut LatticeCompactor,
        entries: &DictionaryEntries<'_>,
        xtra: &mut ExtraNodesContext,
    ) -> Result<bool> {
        let info = self.boundaries[boundary];
        if info.start_count < 2 {
            return Ok(false);
        }
        let range = info.first_node_offset..info.first_node_offset + info.start_count;
        let seeds = &mut self.seeds[range];
        compactor.compute_hashes(seeds, entries, xtra)?;
        Ok(compactor.compact(seeds, xtra))
    }

    /// BOS境界を作成します。
    pub fn make_bos(&self, lattice: &mut Lattice) -> Result<()> {
        let num_features = lattice.num_features();
        let (idx, bnd) = lattice.make_boundary();
        if idx != 0 {
            return Err(MorphError::invalid_state(
                "BOS must be the first boundary",
                format!("got boundary {idx}"),
            ));
        }
        let bos = LatticeNode {
            ptr: EntryPtr::BOS_EOS,
            start: 0,
            end: 0,
        };
        bnd.push_node(bos, &vec![BOS_EOS_FEATURE; num_features]);
        Ok(())
    }

    /// EOS境界を作成します。
    pub fn make_eos(&self, lattice: &mut Lattice) -> Result<()> {
        let num_features = lattice.num_features();
        let len = self.max_boundaries;
        let (idx, bnd) = lattice.make_boundary();
        if idx != len + 1 {
            return Err(MorphError::invalid_state(
                "EOS must be the last boundary",
                format!("got boundary {idx}, expected {}", len + 1),
            ));
        }
        let eos = LatticeNode {
            ptr: EntryPtr::BOS_EOS,
            start: len,
            end: len,
        };
        bnd.push_node(eos, &vec![BOS_EOS_FEATURE; num_features]);
        Ok(())
    }

    /// 文字位置`boundary`の境界を実体化します。
    ///
    /// 到達不能な位置の境界はノードを持ちません。
    /// 到達可能な位置では、終了位置も到達可能なシードだけがノードになります。
    pub fn construct_single_boundary(
        &mut self,
        lattice: &mut Lattice,
        boundary: usize,
        entries: &DictionaryEntries<'_>,
        xtra: &ExtraNodesContext,
    ) -> Result<()> {
        let info = self.boundaries[boundary];
        let (idx, bnd) = lattice.make_boundary();
        if idx != boundary + 1 {
            return Err(MorphError::invalid_state(
                "boundaries must be constructed in order",
                format!("got boundary {idx}, expected {}", boundary + 1),
            ));
        }
        if !self.connectible[boundary] {
            return Ok(());
        }
        let mut buffer = DicEntryBuffer::default();
        let range = info.first_node_offset..info.first_node_offset + info.start_count;
        for seed in &self.seeds[range] {
            if seed.is_erased() || !self.connectible[seed.end] {
                continue;
            }
            debug_assert_eq!(seed.start, boundary);
            let features = if seed.entry_ptr.is_special() {
                xtra.features(seed.entry_ptr).ok_or_else(|| {
                    MorphError::invalid_state("unknown extra node", format!("{:?}", seed.entry_ptr))
                })?
            } else {
                entries.fill_buffer(seed.entry_ptr, &mut buffer)?;
                self.buffer_features.clear();
                self.buffer_features.extend_from_slice(buffer.features());
                &self.buffer_features[..]
            };
            let node = LatticeNode {
                ptr: seed.entry_ptr,
                start: seed.start,
                end: seed.end,
            };
            bnd.push_node(node, features);
        }
        Ok(())
    }

    /// 各境界に、そこで終わるノードを登録します。
    ///
    /// 文字位置`e`で終わるノードは境界`e + 1`の左接続になります。
    /// BOSは境界1の左接続です。
    pub fn fill_ends(&self, lattice: &mut Lattice) -> Result<()> {
        let num_boundaries = lattice.created_boundary_count();
        if num_boundaries != self.max_boundaries + 2 {
            return Err(MorphError::invalid_state(
                "lattice is incomplete",
                format!(
                    "{num_boundaries} boundaries for input of {} codepoints",
                    self.max_boundaries
                ),
            ));
        }
        lattice.boundary_mut(1).push_end(NodeRef {
            boundary: 0,
            node: 0,
        });
        for b in 1..num_boundaries - 1 {
            for n in 0..lattice.boundary(b).num_nodes() {
                let end = lattice.boundary(b).node(n).end;
                let target = end + 1;
                if target <= b || target >= num_boundaries {
                    return Err(MorphError::invalid_state(
                        "node ends outside of the lattice",
                        format!("boundary {b}, node {n}, end {end}"),
                    ));
                }
                lattice.boundary_mut(target).push_end(NodeRef {
                    boundary: b as u32,
                    node: n as u32,
                });
            }
        }
        Ok(())
    }

    /// 使用中のメモリ量の概算（バイト）
    pub fn used_memory(&self) -> usize {
        self.seeds.len() * std::mem::size_of::<LatticeNodeSeed>()
            + self.boundaries.len() * std::mem::size_of::<BoundaryInfo>()
            + self.connectible.len() / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(v: i32) -> EntryPtr {
        EntryPtr::from_raw(v)
    }

    #[test]
    fn test_sort_and_boundary_info() {
        let mut b = LatticeBuilder::default();
        b.reset(3);
        b.append_seed(ptr(5), 1, 3);
        b.append_seed(ptr(1), 0, 1);
        b.append_seed(ptr(2), 1, 2);
        b.append_seed(ptr(3), 2, 3);
        b.sort_seeds();
        assert_eq!(b.seeds()[0], LatticeNodeSeed::new(ptr(1), 0, 1));
        assert_eq!(b.seeds()[1], LatticeNodeSeed::new(ptr(2), 1, 2));
        assert!(b.check_connectability());
        b.prepare().unwrap();

        let info = b.info_at(1);
        assert_eq!(info.start_count, 2);
        assert_eq!(info.first_node_offset, 1);
        assert_eq!(b.info_at(3).end_count, 2);
        assert!((0..=3).all(|p| b.is_accessible(p)));
    }

    #[test]
    fn test_unreachable_boundary() {
        let mut b = LatticeBuilder::default();
        b.reset(3);
        b.append_seed(ptr(1), 0, 2);
        b.append_seed(ptr(2), 2, 3);
        // Starts at 1, which nothing reaches.
        b.append_seed(ptr(3), 1, 3);
        b.sort_seeds();
        assert!(b.check_connectability());
        assert!(!b.is_accessible(1));
        assert_eq!(b.num_inaccessible(), 1);
    }

    #[test]
    fn test_disconnected_is_error() {
        let mut b = LatticeBuilder::default();
        b.reset(2);
        b.append_seed(ptr(1), 0, 1);
        b.sort_seeds();
        assert!(!b.check_connectability());
        assert!(b.prepare().unwrap_err().is_invalid_state());
    }
}
