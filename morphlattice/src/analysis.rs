//! ビームサーチに基づく解析器
//!
//! 入力文から辞書引きと未知語生成でノードの種を集め、BOSとEOSの両方に繋がる境界だけを
//! ラティスとして実体化し、スコアラーでビームを埋めて最良パスを取り出します。
//!
//! # 主要な構造体
//!
//! - [`Tokenizer`]: 辞書と解析設定を保持する共有可能な構造体
//! - [`Worker`]: 1スレッド分の解析状態を保持し、実際の解析を行う構造体
//!
//! # 例
//!
//! ```
//! use std::sync::Arc;
//!
//! use morphlattice::{DictionaryBuilder, FieldSpec, HashedFeatureScorer, ScorerDef, Tokenizer};
//!
//! let mut builder = DictionaryBuilder::new(vec![
//!     FieldSpec::feature("surface").surface(),
//!     FieldSpec::feature("pos"),
//! ])?;
//! builder.read_csv("東京,名詞\n都,接尾辞\n東京都,名詞\n")?;
//! let tokenizer = Tokenizer::new(builder.build()?);
//!
//! let def = ScorerDef::new(Arc::new(HashedFeatureScorer::new(vec![0.0; 16])?));
//! let mut worker = tokenizer.new_worker();
//! worker.reset_sentence("東京都");
//! worker.analyze(&def)?;
//! assert!(worker.num_tokens() >= 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod analysis_result;
pub mod compactor;
pub mod decoder;
pub mod extra_nodes;
pub mod features;
pub mod lattice;
pub mod lattice_builder;
pub mod score_api;
pub mod unk_nodes;
pub mod walker;
pub mod worker;

use std::sync::Arc;

use crate::Dictionary;
use crate::analysis::compactor::LatticeCompactor;
use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::lattice::Lattice;
use crate::analysis::lattice_builder::LatticeBuilder;
use crate::analysis::unk_nodes::{UnkMaker, UnkNodesContext};
use crate::analysis::worker::Worker;
use crate::dictionary::character::{CharClassifier, CharProperty};
use crate::dictionary::fields::FieldRole;
use crate::dictionary::trie::TraverseStatus;
use crate::errors::{MorphError, Result};
use crate::sentence::Sentence;

/// ビーム幅の既定値
pub const DEFAULT_BEAM_SIZE: usize = 5;

/// 入力の最大文字数の既定値
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 4096;

/// 1回のラティス構築の統計
#[derive(Clone, Copy, Default, Debug)]
pub struct LatticeStats {
    /// 辞書引きで得たシードの数
    pub dic_seeds: usize,
    /// 未知語生成で得たシードの数
    pub unk_seeds: usize,
    /// 到達不能な文字位置の数
    pub inaccessible: usize,
    /// 圧縮で削除されたノードの数
    pub compacted: usize,
    /// ラティス全体のノード数（BOS/EOSを含む）
    pub nodes: usize,
}

/// 形態素解析を行う解析器
///
/// 辞書と解析設定を保持します。辞書は[`Arc`]で共有されるため、複製は安価です。
/// 解析は[`Tokenizer::new_worker`]で作成した[`Worker`]で行います。
///
/// # 設定
///
/// - `beam_size`: 各ノードが保持する部分パスの数（既定値5）
/// - `compact_nodes`: 素性射影が同一のノードをまとめるかどうか（既定値`true`）
/// - `max_input_length`: 入力の最大文字数（既定値4096）
/// - `feature_fields`: スコア計算と圧縮に使う素性列（既定値は全ての素性列）
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    classifier: Arc<dyn CharClassifier>,
    unk_makers: Vec<UnkMaker>,
    beam_size: usize,
    compact_nodes: bool,
    max_input_length: usize,
    feature_fields: Vec<usize>,
    num_placeholders: usize,
}

impl Tokenizer {
    /// 新しい解析器を作成します。
    ///
    /// 辞書の所有権は解析器に移動します。複数の解析器間で辞書を共有する場合は
    /// [`Tokenizer::from_shared_dictionary`]を使用してください。
    pub fn new(dict: Dictionary) -> Self {
        Self::from_shared_dictionary(Arc::new(dict))
    }

    /// 共有された辞書から新しい解析器を作成します。
    pub fn from_shared_dictionary(dict: Arc<Dictionary>) -> Self {
        let feature_fields = (0..dict.fields().num_features()).collect();
        Self {
            dict,
            classifier: Arc::new(CharProperty::default()),
            unk_makers: vec![],
            beam_size: DEFAULT_BEAM_SIZE,
            compact_nodes: true,
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            feature_fields,
            num_placeholders: 0,
        }
    }

    /// 文字種の分類器を設定します。
    pub fn char_classifier(mut self, classifier: Arc<dyn CharClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// ビーム幅を設定します。
    ///
    /// # エラー
    ///
    /// `beam_size`が0の場合に[`MorphError`]を返します。
    pub fn beam_size(mut self, beam_size: usize) -> Result<Self> {
        if beam_size == 0 {
            return Err(MorphError::invalid_parameter(
                "beam_size",
                "beam_size must be positive",
            ));
        }
        self.beam_size = beam_size;
        Ok(self)
    }

    /// ノードの圧縮を有効または無効にします。
    pub const fn compact_nodes(mut self, yes: bool) -> Self {
        self.compact_nodes = yes;
        self
    }

    /// 入力の最大文字数を設定します。
    pub const fn max_input_length(mut self, max_input_length: usize) -> Self {
        self.max_input_length = max_input_length;
        self
    }

    /// 未知語の生成器を追加します。生成器は追加された順に実行されます。
    pub fn add_unk_maker(mut self, maker: UnkMaker) -> Self {
        if let Some(idx) = maker.config().target_placeholder() {
            self.num_placeholders = self.num_placeholders.max(idx + 1);
        }
        self.unk_makers.push(maker);
        self
    }

    /// スコア計算と圧縮に使う素性列を名前で指定します。
    ///
    /// # エラー
    ///
    /// 名前が素性列でない場合、または列が指定されない場合に[`MorphError`]を返します。
    pub fn feature_fields(mut self, names: &[&str]) -> Result<Self> {
        if names.is_empty() {
            return Err(MorphError::invalid_parameter(
                "names",
                "at least one feature field is required",
            ));
        }
        let mut fields = Vec::with_capacity(names.len());
        for &name in names {
            match self.dict.fields().field_by_name(name) {
                Some(f) if f.role() == FieldRole::Feature => {
                    fields.push(f.position());
                }
                _ => {
                    return Err(MorphError::invalid_parameter(
                        "names",
                        format!("{name} is not a feature field"),
                    ));
                }
            }
        }
        self.feature_fields = fields;
        Ok(self)
    }

    /// 解析に使用する辞書を返します。
    #[inline(always)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    pub(crate) fn feature_field_positions(&self) -> &[usize] {
        &self.feature_fields
    }

    pub(crate) fn classifier(&self) -> &dyn CharClassifier {
        self.classifier.as_ref()
    }

    /// 入力文のラティスを構築します。
    ///
    /// # エラー
    ///
    /// 入力が長すぎる場合は[`MorphError::InvalidParameter`]、
    /// BOSからEOSまでのパスが存在しない場合や辞書の復号に失敗した場合は
    /// [`MorphError::InvalidState`]を返します。
    pub(crate) fn build_lattice(
        &self,
        sent: &Sentence,
        builder: &mut LatticeBuilder,
        xtra: &mut ExtraNodesContext,
        compactor: &mut LatticeCompactor,
        lattice: &mut Lattice,
    ) -> Result<LatticeStats> {
        let len = sent.len_char();
        if len > self.max_input_length {
            return Err(MorphError::invalid_parameter(
                "input",
                format!(
                    "input of {len} codepoints exceeds the limit of {}",
                    self.max_input_length
                ),
            ));
        }
        let entries = self.dict.entries();
        let num_features = entries.num_features();
        let mut stats = LatticeStats::default();

        builder.reset(len);
        xtra.reset(num_features, self.num_placeholders);

        for start in 0..len {
            let mut trav = entries.traversal();
            for end in start..len {
                match trav.step(sent.char_bytes(end)) {
                    TraverseStatus::NoNode => break,
                    TraverseStatus::NoLeaf => {}
                    TraverseStatus::Ok => {
                        if let Some(list) = trav.entries() {
                            for ptr in list {
                                builder.append_seed(ptr, start, end + 1);
                                stats.dic_seeds += 1;
                            }
                        }
                    }
                }
            }
        }

        {
            let mut ctx = UnkNodesContext::new(xtra, entries);
            for maker in &self.unk_makers {
                stats.unk_seeds += maker.spawn_nodes(sent, &mut ctx, builder);
            }
        }

        builder.sort_seeds();
        builder.check_connectability();
        builder.prepare()?;
        stats.inaccessible = builder.num_inaccessible();

        lattice.reset(self.beam_size, 1, num_features);
        builder.make_bos(lattice)?;
        if self.compact_nodes {
            compactor.initialize(&self.feature_fields);
        }
        for pos in 0..len {
            if self.compact_nodes && builder.is_accessible(pos) {
                builder.compact_boundary(pos, compactor, &entries, xtra)?;
            }
            builder.construct_single_boundary(lattice, pos, &entries, xtra)?;
        }
        builder.make_eos(lattice)?;
        builder.fill_ends(lattice)?;

        if self.compact_nodes {
            stats.compacted = compactor.num_deleted();
        }
        stats.nodes = lattice.total_nodes();
        log::debug!(
            "lattice for {len} codepoints: {} dictionary seeds, {} unknown seeds, \
             {} inaccessible positions, {} compacted, {} nodes",
            stats.dic_seeds,
            stats.unk_seeds,
            stats.inaccessible,
            stats.compacted,
            stats.nodes,
        );
        Ok(stats)
    }
}
