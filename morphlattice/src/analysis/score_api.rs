//! スコア計算のインターフェース
//!
//! 主スコアラーは素性インデックスの行から線形スコアを計算する[`FeatureScorer`]です。
//! 補助スコアラーは[`ScorerFactory`]で解析ごとに生成され、ラティス全体に
//! スコアを書き込みます。各スコアは[`ScorerDef::score_weights`]で重み付けして合算されます。

use std::sync::Arc;

use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::lattice::Lattice;
use crate::errors::{MorphError, Result};
use crate::utils::ConstSliceable;

/// 素性インデックスの行から線形スコアを計算するスコアラー
pub trait FeatureScorer: Send + Sync {
    /// 各行のスコアを`result`に書き込みます。
    fn compute(&self, result: &mut [f32], features: ConstSliceable<'_, u32>);

    /// 各行のスコアに`source`を足したものを`result`に書き込みます。
    fn add(&self, source: &[f32], result: &mut [f32], features: ConstSliceable<'_, u32>);

    /// 重みのバッファ
    fn weights(&self) -> &[f32];
}

/// ラティス全体にスコアを書き込む補助スコアラー
pub trait ScoreComputer {
    /// `scorer_idx`番目のスコアを全境界に書き込みます。
    fn score_lattice(
        &mut self,
        lattice: &mut Lattice,
        xtra: &ExtraNodesContext,
        scorer_idx: usize,
    ) -> Result<()>;
}

/// 補助スコアラーのファクトリ
pub trait ScorerFactory: Send + Sync {
    /// 解析用のインスタンスを作成します。
    fn make_instance(&self) -> Result<Box<dyn ScoreComputer>>;
}

/// スコアラーの組み合わせ
#[derive(Clone)]
pub struct ScorerDef {
    /// 主スコアラー
    pub feature: Arc<dyn FeatureScorer>,
    /// 補助スコアラー
    pub others: Vec<Arc<dyn ScorerFactory>>,
    /// 各スコアラーの重み。先頭が主スコアラー
    pub score_weights: Vec<f32>,
}

impl ScorerDef {
    /// 主スコアラーだけの組み合わせを作成します。重みは1です。
    pub fn new(feature: Arc<dyn FeatureScorer>) -> Self {
        Self {
            feature,
            others: vec![],
            score_weights: vec![1.0],
        }
    }

    /// 補助スコアラーを追加します。
    pub fn with_other(mut self, factory: Arc<dyn ScorerFactory>, weight: f32) -> Self {
        self.others.push(factory);
        self.score_weights.push(weight);
        self
    }

    #[inline(always)]
    pub fn num_scorers(&self) -> usize {
        1 + self.others.len()
    }

    /// 重みの数がスコアラーの数と一致することを確認します。
    pub fn validate(&self) -> Result<()> {
        if self.score_weights.len() != self.num_scorers() {
            return Err(MorphError::invalid_parameter(
                "score_weights",
                format!(
                    "{} weights for {} scorers",
                    self.score_weights.len(),
                    self.num_scorers()
                ),
            ));
        }
        Ok(())
    }
}
