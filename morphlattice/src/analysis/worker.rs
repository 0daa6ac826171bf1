//! 解析処理のためのルーチンを提供するモジュール。
//!
//! ワーカーはラティス、構築器、追加ノードなどの内部データ構造を保持し、
//! 再利用することで不要なメモリアロケーションを避けます。
use crate::analysis::analysis_result::AnalysisPath;
use crate::analysis::compactor::LatticeCompactor;
use crate::analysis::decoder::BeamDecoder;
use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::features::FeatureComputer;
use crate::analysis::lattice::{Lattice, NodeRef};
use crate::analysis::lattice_builder::LatticeBuilder;
use crate::analysis::score_api::ScorerDef;
use crate::analysis::{LatticeStats, Tokenizer};
use crate::errors::{MorphError, Result};
use crate::sentence::Sentence;
use crate::token::{Token, TokenIter};

/// 最良パス上のノード
#[derive(Clone, Copy, Debug)]
pub(crate) struct TopNode {
    pub(crate) node: NodeRef,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) score: f32,
}

/// 解析処理のためのルーチンを提供する構造体。
///
/// 解析に使用する内部データ構造を保持し、それらを再利用することで
/// 不要なメモリ再割り当てを回避します。1つのワーカーは1スレッドで使用します。
///
/// # 例
///
/// ```ignore
/// let mut worker = tokenizer.new_worker();
/// worker.reset_sentence("日本語の文章");
/// worker.analyze(&def)?;
/// for token in worker.token_iter() {
///     println!("{}", token.surface());
/// }
/// ```
pub struct Worker {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) sent: Sentence,
    builder: LatticeBuilder,
    pub(crate) xtra: ExtraNodesContext,
    pub(crate) lattice: Lattice,
    compactor: LatticeCompactor,
    decoder: BeamDecoder,
    computer: FeatureComputer,
    path: AnalysisPath,
    pub(crate) top_nodes: Vec<TopNode>,
    stats: Option<LatticeStats>,
    top_score: Option<f32>,
}

impl Worker {
    pub(crate) fn new(tokenizer: Tokenizer) -> Self {
        let computer = FeatureComputer::new(tokenizer.feature_field_positions().to_vec());
        Self {
            tokenizer,
            sent: Sentence::new(),
            builder: LatticeBuilder::default(),
            xtra: ExtraNodesContext::default(),
            lattice: Lattice::default(),
            compactor: LatticeCompactor::default(),
            decoder: BeamDecoder::default(),
            computer,
            path: AnalysisPath::default(),
            top_nodes: vec![],
            stats: None,
            top_score: None,
        }
    }

    /// 解析する入力文をリセットします。
    ///
    /// 新しい文を設定し、以前の解析結果をクリアします。
    pub fn reset_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.sent.clear();
        self.top_nodes.clear();
        self.stats = None;
        self.top_score = None;
        let input = input.as_ref();
        if !input.is_empty() {
            self.sent.set_sentence(input);
            self.sent.compile(self.tokenizer.classifier());
        }
    }

    /// 設定された入力文のラティスを構築します。
    ///
    /// # エラー
    ///
    /// 入力が最大文字数を超える場合は[`MorphError::InvalidParameter`]、
    /// ラティスを構築できない場合は[`MorphError::InvalidState`]を返します。
    /// 失敗した場合でも、次の入力の解析には影響しません。
    pub fn build_lattice(&mut self) -> Result<LatticeStats> {
        self.stats = None;
        self.top_score = None;
        self.top_nodes.clear();
        let stats = self.tokenizer.build_lattice(
            &self.sent,
            &mut self.builder,
            &mut self.xtra,
            &mut self.compactor,
            &mut self.lattice,
        )?;
        self.stats = Some(stats);
        Ok(stats)
    }

    /// 入力文を解析し、最良パスを内部に保存します。
    ///
    /// ラティスが未構築の場合は先に構築します。
    /// 解析結果は[`token_iter`](Self::token_iter)や[`token`](Self::token)で参照できます。
    ///
    /// # エラー
    ///
    /// ラティスの構築、スコア計算、パスの抽出のいずれかに失敗した場合に
    /// [`MorphError`]を返します。
    pub fn analyze(&mut self, def: &ScorerDef) -> Result<()> {
        if self.stats.is_none() {
            self.build_lattice()?;
        }
        self.top_nodes.clear();
        self.top_score = None;
        self.decoder
            .decode(&mut self.lattice, &self.xtra, def, &mut self.computer)?;
        self.path.fill_in(&self.lattice)?;

        for idx in (0..self.path.num_boundaries()).rev() {
            let (ptr, score) = self.path.path_element(idx);
            let node = NodeRef {
                boundary: ptr.boundary,
                node: ptr.right,
            };
            let n = self.lattice.node(node);
            self.top_nodes.push(TopNode {
                node,
                start: n.start,
                end: n.end,
                score,
            });
        }
        if let Some(last) = self.top_nodes.last()
            && last.end != self.sent.len_char()
        {
            return Err(MorphError::invalid_state(
                "path does not cover the input",
                format!("ends at {} of {}", last.end, self.sent.len_char()),
            ));
        }
        let eos = self.lattice.created_boundary_count() - 1;
        self.top_score = self
            .lattice
            .boundary(eos)
            .beams()
            .first()
            .map(|e| e.total_score);
        Ok(())
    }

    /// 最良パスのビーム要素。EOS側から順に並びます。
    #[inline(always)]
    pub fn path(&self) -> &AnalysisPath {
        &self.path
    }

    /// 最良パスのカーソルを操作するための可変参照
    #[inline(always)]
    pub fn path_mut(&mut self) -> &mut AnalysisPath {
        &mut self.path
    }

    /// 最後に構築したラティス
    #[inline(always)]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// 最後に使用したラティスの構築器
    #[inline(always)]
    pub fn builder(&self) -> &LatticeBuilder {
        &self.builder
    }

    /// 最後に構築した解析の追加ノード
    #[inline(always)]
    pub fn extra_nodes(&self) -> &ExtraNodesContext {
        &self.xtra
    }

    /// 最後のラティス構築の統計
    #[inline(always)]
    pub fn stats(&self) -> Option<LatticeStats> {
        self.stats
    }

    /// EOSまでを含む最良パスの合計スコア
    #[inline(always)]
    pub fn top1_score(&self) -> Option<f32> {
        self.top_score
    }

    /// 最良パスのトークンを返します。
    pub fn top1(&self) -> Vec<Token<'_>> {
        self.token_iter().collect()
    }

    /// 解析結果のトークン数を取得します。
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.top_nodes.len()
    }

    /// `i`番目のトークンを取得します。
    #[inline(always)]
    pub fn token<'w>(&'w self, i: usize) -> Token<'w> {
        Token::new(self, i)
    }

    /// 解析結果のイテレータを作成します。
    #[inline(always)]
    pub fn token_iter<'w>(&'w self) -> TokenIter<'w> {
        TokenIter::new(self)
    }
}
