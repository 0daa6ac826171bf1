//! 解析結果のパス
//!
//! [`AnalysisPath`]はEOSから最良パスを逆向きに辿り、境界ごとにパス上のビーム要素と、
//! 同じ境界でそれと同点の要素をまとめた平坦な配列です。
//! 境界のまとまり（チャンク）はEOS側からBOS側へ、境界番号が厳密に減少する順に並びます。
//! BOSとEOSの境界は含みません。

use crate::analysis::lattice::{ConnectionPtr, Lattice};
use crate::errors::{MorphError, Result};

/// 最良パスとその同点要素
#[derive(Default, Debug)]
pub struct AnalysisPath {
    elems: Vec<ConnectionPtr>,
    scores: Vec<f32>,
    prevs: Vec<Option<ConnectionPtr>>,
    /// チャンク`i`は`elems[offsets[i]..offsets[i + 1]]`
    offsets: Vec<usize>,
    chunk: Option<usize>,
    node: usize,
}

impl AnalysisPath {
    /// ビームが埋まったラティスからパスを抽出します。
    ///
    /// 以前の内容は破棄されますが、確保済みの領域は再利用されます。
    ///
    /// # エラー
    ///
    /// EOSのビームが空の場合、またはビームの参照が壊れている場合に
    /// [`MorphError::InvalidState`]を返します。
    pub fn fill_in(&mut self, lattice: &Lattice) -> Result<()> {
        self.elems.clear();
        self.scores.clear();
        self.prevs.clear();
        self.offsets.clear();
        self.offsets.push(0);
        self.reset();

        let num_boundaries = lattice.created_boundary_count();
        if num_boundaries < 2 {
            return Err(MorphError::invalid_state(
                "cannot extract a path",
                "lattice has no EOS",
            ));
        }
        let eos = lattice.boundary(num_boundaries - 1);
        let Some(mut current) = eos.beams().first().copied().filter(|e| !e.is_fake()) else {
            return Err(MorphError::invalid_state(
                "cannot extract a path",
                "EOS beam is empty",
            ));
        };

        while let Some(prev) = current.ptr.previous {
            if prev.boundary == 0 {
                break;
            }
            if prev.boundary >= current.ptr.boundary {
                return Err(MorphError::invalid_state(
                    "broken beam reference",
                    format!("{prev:?} from boundary {}", current.ptr.boundary),
                ));
            }
            let elem = *lattice.beam_at(prev).ok_or_else(|| {
                MorphError::invalid_state("broken beam reference", format!("{prev:?}"))
            })?;
            if elem.is_fake() {
                return Err(MorphError::invalid_state(
                    "broken beam reference",
                    format!("{prev:?} points to an empty slot"),
                ));
            }

            self.push_elem(lattice, elem.ptr, elem.total_score)?;
            let beams = lattice.boundary(prev.boundary as usize).beams();
            for (slot, other) in beams.iter().enumerate() {
                if slot != prev.slot as usize
                    && !other.is_fake()
                    && other.total_score == elem.total_score
                {
                    self.push_elem(lattice, other.ptr, other.total_score)?;
                }
            }
            self.offsets.push(self.elems.len());
            current = elem;
        }
        Ok(())
    }

    fn push_elem(&mut self, lattice: &Lattice, ptr: ConnectionPtr, score: f32) -> Result<()> {
        let prev = match ptr.previous {
            Some(r) => Some(
                lattice
                    .beam_at(r)
                    .ok_or_else(|| {
                        MorphError::invalid_state("broken beam reference", format!("{r:?}"))
                    })?
                    .ptr,
            ),
            None => None,
        };
        self.elems.push(ptr);
        self.scores.push(score);
        self.prevs.push(prev);
        Ok(())
    }

    /// カーソルを先頭の前に戻します。
    pub fn reset(&mut self) {
        self.chunk = None;
        self.node = 0;
    }

    /// 全要素数
    #[inline(always)]
    pub fn total_nodes(&self) -> usize {
        self.elems.len()
    }

    /// 境界の数
    #[inline(always)]
    pub fn num_boundaries(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// `idx`番目の境界の要素。先頭がパス上の要素です。
    pub fn chunk(&self, idx: usize) -> &[ConnectionPtr] {
        &self.elems[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// `idx`番目の境界のパス上の要素と、その累積スコア
    pub fn path_element(&self, idx: usize) -> (ConnectionPtr, f32) {
        let i = self.offsets[idx];
        (self.elems[i], self.scores[i])
    }

    /// 次の（BOS側の）境界に進みます。
    ///
    /// 最後の境界を過ぎる場合は`false`を返し、カーソルは動きません。
    pub fn next_boundary(&mut self) -> bool {
        let next = self.chunk.map_or(0, |c| c + 1);
        if next >= self.num_boundaries() {
            return false;
        }
        self.chunk = Some(next);
        self.node = 0;
        true
    }

    /// 現在の境界の次の要素を`out`に書き込みます。
    pub fn next_node(&mut self, out: &mut ConnectionPtr) -> bool {
        match self.next_node_ptr() {
            Some(ptr) => {
                *out = *ptr;
                true
            }
            None => false,
        }
    }

    /// 現在の境界の次の要素を返します。
    pub fn next_node_ptr(&mut self) -> Option<&ConnectionPtr> {
        let c = self.chunk?;
        let idx = self.offsets[c] + self.node;
        if idx >= self.offsets[c + 1] {
            return None;
        }
        self.node += 1;
        Some(&self.elems[idx])
    }

    /// 現在の境界で残っている要素数
    pub fn remaining_nodes_in_chunk(&self) -> usize {
        match self.chunk {
            Some(c) => self.offsets[c + 1] - self.offsets[c] - self.node,
            None => 0,
        }
    }

    /// 現在の境界番号。[`next_boundary`](Self::next_boundary)の前は`None`です。
    pub fn current_boundary(&self) -> Option<usize> {
        self.chunk
            .map(|c| self.elems[self.offsets[c]].boundary as usize)
    }

    /// 現在の境界が最後（最もBOS側）かどうか
    pub fn is_last_boundary(&self) -> bool {
        self.chunk.is_some_and(|c| c + 1 == self.num_boundaries())
    }

    /// 境界`boundary`まで進みます。
    ///
    /// その境界がパスに含まれない場合は、その手前の境界にカーソルを戻して`false`を返します。
    pub fn move_to_boundary(&mut self, boundary: usize) -> bool {
        if self.current_boundary().is_some_and(|b| b < boundary) {
            return false;
        }
        loop {
            match self.current_boundary() {
                Some(b) if b == boundary => return true,
                Some(b) if b < boundary => {
                    self.chunk = self.chunk.and_then(|c| c.checked_sub(1));
                    self.node = 0;
                    return false;
                }
                _ => {
                    if !self.next_boundary() {
                        return false;
                    }
                }
            }
        }
    }

    /// `step1`が、直前の要素`step0`から繋がってパスに含まれるかどうか
    pub fn contains(&self, step0: &ConnectionPtr, step1: &ConnectionPtr) -> bool {
        self.elems
            .iter()
            .zip(&self.prevs)
            .any(|(e, p)| e == step1 && p.as_ref() == Some(step0))
    }
}
