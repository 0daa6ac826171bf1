//! ラティス構造の実装モジュール。
//!
//! ラティスは境界の列です。境界0はBOS、境界`n + 1`はEOSで、
//! 文字位置`p`から始まるノードは境界`p + 1`に置かれます。
//! 各ノードはビームとして上位K個の部分パスを保持し、
//! 部分パスは`(境界, スロット)`の組で前のビーム要素を参照します。

use crate::dictionary::entries::EntryPtr;
use crate::utils::{ConstSliceable, Sliceable};

/// BOS/EOSノードの素性値
pub const BOS_EOS_FEATURE: i32 = i32::MIN;

/// ラティス内のノードへの参照
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct NodeRef {
    pub boundary: u32,
    pub node: u32,
}

/// ビーム要素への参照
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct BeamRef {
    pub boundary: u32,
    /// `ノード番号 * ビーム幅 + 順位`
    pub slot: u32,
}

/// ノードの1つの出現（部分パス）
///
/// `left`は境界の左接続リスト内の位置、`right`は境界内のノード番号、
/// `beam`は左ノードのビーム内の順位です。
/// 比較は`previous`を除いた4つ組で行います。
#[derive(Clone, Copy, Debug)]
pub struct ConnectionPtr {
    pub boundary: u32,
    pub left: u32,
    pub right: u32,
    pub beam: u32,
    pub previous: Option<BeamRef>,
}

impl PartialEq for ConnectionPtr {
    fn eq(&self, other: &Self) -> bool {
        self.boundary == other.boundary
            && self.left == other.left
            && self.right == other.right
            && self.beam == other.beam
    }
}

impl Eq for ConnectionPtr {}

/// ビーム要素
#[derive(Clone, Copy, Debug)]
pub struct ConnectionBeamElement {
    pub ptr: ConnectionPtr,
    pub total_score: f32,
}

impl ConnectionBeamElement {
    /// ビームの空きを埋める要素
    pub const fn fake() -> Self {
        Self {
            ptr: ConnectionPtr {
                boundary: u32::MAX,
                left: u32::MAX,
                right: u32::MAX,
                beam: u32::MAX,
                previous: None,
            },
            total_score: f32::NEG_INFINITY,
        }
    }

    #[inline(always)]
    pub fn is_fake(&self) -> bool {
        self.total_score == f32::NEG_INFINITY
    }
}

/// ラティス内のノード
#[derive(Clone, Copy, Debug)]
pub struct LatticeNode {
    pub ptr: EntryPtr,
    /// 開始文字位置
    pub start: usize,
    /// 終了文字位置（この位置は含まない）
    pub end: usize,
}

/// ラティスの1境界
#[derive(Default)]
pub struct LatticeBoundary {
    nodes: Vec<LatticeNode>,
    features: Sliceable<i32>,
    ends: Vec<NodeRef>,
    /// `[ノード][左接続][スコアラー]`
    scores: Vec<f32>,
    beams: Vec<ConnectionBeamElement>,
}

impl LatticeBoundary {
    fn reset(&mut self, num_features: usize) {
        self.nodes.clear();
        self.features.reset(num_features, 0, 0);
        self.ends.clear();
        self.scores.clear();
        self.beams.clear();
    }

    /// ノードを追加し、その番号を返します。
    pub fn push_node(&mut self, node: LatticeNode, features: &[i32]) -> usize {
        self.features.push_row(features);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    #[inline(always)]
    pub fn node(&self, idx: usize) -> &LatticeNode {
        &self.nodes[idx]
    }

    #[inline(always)]
    pub fn node_features(&self, idx: usize) -> &[i32] {
        self.features.row(idx)
    }

    #[inline(always)]
    pub fn features(&self) -> ConstSliceable<'_, i32> {
        self.features.as_const()
    }

    /// この境界に終わるノード（左接続の候補）
    #[inline(always)]
    pub fn ends(&self) -> &[NodeRef] {
        &self.ends
    }

    pub(crate) fn push_end(&mut self, node: NodeRef) {
        self.ends.push(node);
    }

    pub(crate) fn reset_scores(&mut self, num_scorers: usize) {
        self.scores.clear();
        self.scores
            .resize(self.nodes.len() * self.ends.len() * num_scorers, 0.0);
    }

    /// 全スコアの可変参照。並びは`[ノード][左接続][スコアラー]`です。
    #[inline(always)]
    pub fn scores_mut(&mut self) -> &mut [f32] {
        &mut self.scores
    }

    #[inline(always)]
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub(crate) fn reset_beams(&mut self, beam_size: usize) {
        self.beams.clear();
        self.beams
            .resize(self.nodes.len() * beam_size, ConnectionBeamElement::fake());
    }

    #[inline(always)]
    pub fn beams(&self) -> &[ConnectionBeamElement] {
        &self.beams
    }

    #[inline(always)]
    pub(crate) fn beams_mut(&mut self) -> &mut [ConnectionBeamElement] {
        &mut self.beams
    }
}

/// ラティス
#[derive(Default)]
pub struct Lattice {
    boundaries: Vec<LatticeBoundary>,
    created: usize,
    beam_size: usize,
    num_scorers: usize,
    num_features: usize,
}

impl Lattice {
    /// ラティスをリセットします。
    ///
    /// 確保済みの境界は解放されずに再利用されます。
    pub fn reset(&mut self, beam_size: usize, num_scorers: usize, num_features: usize) {
        self.created = 0;
        self.beam_size = beam_size;
        self.num_scorers = num_scorers;
        self.num_features = num_features;
    }

    /// 次の境界を作成します。
    pub fn make_boundary(&mut self) -> (usize, &mut LatticeBoundary) {
        let idx = self.created;
        if idx == self.boundaries.len() {
            self.boundaries.push(LatticeBoundary::default());
        }
        self.created += 1;
        let bnd = &mut self.boundaries[idx];
        bnd.reset(self.num_features);
        (idx, bnd)
    }

    /// 作成済みの境界の数
    #[inline(always)]
    pub fn created_boundary_count(&self) -> usize {
        self.created
    }

    #[inline(always)]
    pub fn boundary(&self, idx: usize) -> &LatticeBoundary {
        debug_assert!(idx < self.created);
        &self.boundaries[idx]
    }

    #[inline(always)]
    pub fn boundary_mut(&mut self, idx: usize) -> &mut LatticeBoundary {
        debug_assert!(idx < self.created);
        &mut self.boundaries[idx]
    }

    /// 2つの境界を同時に参照します。`left < right`でなければなりません。
    pub(crate) fn boundary_pair_mut(
        &mut self,
        left: usize,
        right: usize,
    ) -> (&LatticeBoundary, &mut LatticeBoundary) {
        debug_assert!(left < right);
        let (l, r) = self.boundaries.split_at_mut(right);
        (&l[left], &mut r[0])
    }

    #[inline(always)]
    pub fn beam_size(&self) -> usize {
        self.beam_size
    }

    #[inline(always)]
    pub fn num_scorers(&self) -> usize {
        self.num_scorers
    }

    pub(crate) fn set_num_scorers(&mut self, num_scorers: usize) {
        self.num_scorers = num_scorers;
    }

    #[inline(always)]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn node(&self, r: NodeRef) -> &LatticeNode {
        self.boundary(r.boundary as usize).node(r.node as usize)
    }

    pub fn node_features(&self, r: NodeRef) -> &[i32] {
        self.boundary(r.boundary as usize)
            .node_features(r.node as usize)
    }

    /// ビーム要素を返します。
    pub fn beam_at(&self, r: BeamRef) -> Option<&ConnectionBeamElement> {
        let b = r.boundary as usize;
        if b >= self.created {
            return None;
        }
        self.boundaries[b].beams.get(r.slot as usize)
    }

    /// ノードのビームを返します。
    pub fn node_beam(&self, r: NodeRef) -> &[ConnectionBeamElement] {
        let start = r.node as usize * self.beam_size;
        &self.boundary(r.boundary as usize).beams[start..start + self.beam_size]
    }

    /// 全境界のノード数の合計
    pub fn total_nodes(&self) -> usize {
        self.boundaries[..self.created]
            .iter()
            .map(|b| b.num_nodes())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ptr_eq_ignores_previous() {
        let a = ConnectionPtr {
            boundary: 2,
            left: 0,
            right: 1,
            beam: 0,
            previous: None,
        };
        let b = ConnectionPtr {
            previous: Some(BeamRef {
                boundary: 1,
                slot: 3,
            }),
            ..a
        };
        assert_eq!(a, b);
        assert_ne!(a, ConnectionPtr { beam: 1, ..a });
    }

    #[test]
    fn test_boundaries_are_reused() {
        let mut lattice = Lattice::default();
        lattice.reset(2, 1, 1);
        let (idx, bnd) = lattice.make_boundary();
        assert_eq!(idx, 0);
        bnd.push_node(
            LatticeNode {
                ptr: EntryPtr::BOS_EOS,
                start: 0,
                end: 0,
            },
            &[BOS_EOS_FEATURE],
        );
        assert_eq!(lattice.total_nodes(), 1);

        lattice.reset(2, 1, 1);
        assert_eq!(lattice.created_boundary_count(), 0);
        let (_, bnd) = lattice.make_boundary();
        assert_eq!(bnd.num_nodes(), 0);
    }
}
