//! 素性の計算と線形スコアラー
//!
//! 辺（左ノード, 右ノード）ごとに、右ノードのユニグラム素性と両ノードのバイグラム素性を
//! ハッシュして重みバッファのインデックスにします。

use xxhash_rust::xxh64::xxh64;

use crate::analysis::score_api::FeatureScorer;
use crate::errors::{MorphError, Result};
use crate::utils::ConstSliceable;

const UNIGRAM_SEED: u64 = 0x756e_6967;
const BIGRAM_SEED: u64 = 0x6269_6772;

/// 素性インデックスの計算器
#[derive(Clone, Debug)]
pub struct FeatureComputer {
    fields: Vec<usize>,
    bytes: Vec<u8>,
}

impl FeatureComputer {
    /// 素性に使う列を指定して作成します。
    pub fn new(fields: Vec<usize>) -> Self {
        Self {
            fields,
            bytes: Vec::with_capacity(16),
        }
    }

    #[inline(always)]
    pub fn fields(&self) -> &[usize] {
        &self.fields
    }

    /// 1辺あたりの素性数
    #[inline(always)]
    pub fn row_size(&self) -> usize {
        self.fields.len() * 2
    }

    fn hash(&mut self, seed: u64, field: usize, values: &[i32]) -> u64 {
        self.bytes.clear();
        self.bytes.extend_from_slice(&(field as u32).to_le_bytes());
        for v in values {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
        xxh64(&self.bytes, seed)
    }

    /// 辺の素性インデックスを`out`に書き込みます。
    ///
    /// # 引数
    ///
    /// * `left` - 左ノードの素性行
    /// * `right` - 右ノードの素性行
    /// * `mask` - 重みバッファの長さ - 1
    /// * `out` - 長さ[`row_size`](Self::row_size)の出力先
    pub fn edge_row(&mut self, left: &[i32], right: &[i32], mask: u32, out: &mut [u32]) {
        let n = self.fields.len();
        debug_assert_eq!(out.len(), n * 2);
        for i in 0..n {
            let f = self.fields[i];
            out[i] = self.hash(UNIGRAM_SEED, f, &[right[f]]) as u32 & mask;
            out[n + i] = self.hash(BIGRAM_SEED, f, &[left[f], right[f]]) as u32 & mask;
        }
    }
}

/// 重みバッファを引く線形スコアラー
#[derive(Clone, Debug)]
pub struct HashedFeatureScorer {
    weights: Vec<f32>,
}

impl HashedFeatureScorer {
    /// 重みからスコアラーを作成します。
    ///
    /// # エラー
    ///
    /// 重みの数が2の冪でない場合に[`MorphError`]を返します。
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if !weights.len().is_power_of_two() {
            return Err(MorphError::invalid_parameter(
                "weights",
                format!("length must be a power of two, got {}", weights.len()),
            ));
        }
        Ok(Self { weights })
    }

    /// 素性インデックスに掛けるマスク
    #[inline(always)]
    pub fn mask(&self) -> u32 {
        (self.weights.len() - 1) as u32
    }

    #[inline(always)]
    fn row_score(&self, row: &[u32]) -> f32 {
        row.iter().map(|&i| self.weights[i as usize]).sum()
    }
}

impl FeatureScorer for HashedFeatureScorer {
    fn compute(&self, result: &mut [f32], features: ConstSliceable<'_, u32>) {
        for (i, r) in result.iter_mut().enumerate().take(features.num_rows()) {
            *r = self.row_score(features.row(i));
        }
    }

    fn add(&self, source: &[f32], result: &mut [f32], features: ConstSliceable<'_, u32>) {
        for (i, r) in result.iter_mut().enumerate().take(features.num_rows()) {
            *r = source[i] + self.row_score(features.row(i));
        }
    }

    fn weights(&self) -> &[f32] {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_power_of_two() {
        assert!(HashedFeatureScorer::new(vec![0.0; 6]).is_err());
        assert_eq!(HashedFeatureScorer::new(vec![0.0; 8]).unwrap().mask(), 7);
    }

    #[test]
    fn test_compute_and_add() {
        let scorer = HashedFeatureScorer::new(vec![1.0, 2.0, 4.0, 8.0]).unwrap();
        let rows = [0u32, 1, 2, 3];
        let view = ConstSliceable::new(&rows, 2);
        let mut result = [0.0; 2];
        scorer.compute(&mut result, view);
        assert_eq!(result, [3.0, 12.0]);
        let source = [0.5, 0.5];
        scorer.add(&source, &mut result, view);
        assert_eq!(result, [3.5, 12.5]);
    }

    #[test]
    fn test_edge_row_masked() {
        let mut fc = FeatureComputer::new(vec![0, 1]);
        let mut out = vec![0; fc.row_size()];
        fc.edge_row(&[1, 2], &[3, 4], 15, &mut out);
        assert!(out.iter().all(|&i| i < 16));
        let mut again = vec![0; fc.row_size()];
        fc.edge_row(&[9, 9], &[3, 4], 15, &mut again);
        assert_eq!(out[..2], again[..2]);
    }
}
