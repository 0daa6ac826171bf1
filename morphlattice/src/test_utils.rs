//! テスト用ユーティリティ
//!
//! シナリオテストで共有する辞書とスコアラーを提供します。

use std::sync::Arc;

use crate::analysis::features::HashedFeatureScorer;
use crate::analysis::score_api::ScorerDef;
use crate::dictionary::{Dictionary, DictionaryBuilder, EntryPtr, FieldSpec};

/// 1文字と2文字の語からなる辞書
pub(crate) const SMALL_LEXICON: &str = "\
a,A,1
b,B,2
c,C,3
ba,N,4
ab,N,5
ca,N,6
UNK,unk,0
";

/// 表層形と品詞の素性列、読みのデータ列を持つ辞書を構築します。
#[track_caller]
pub(crate) fn build_dictionary(lexicon_csv: &str) -> Dictionary {
    let mut builder = DictionaryBuilder::new(vec![
        FieldSpec::feature("surface").surface(),
        FieldSpec::feature("pos"),
        FieldSpec::data("reading"),
    ])
    .unwrap();
    builder.read_csv(lexicon_csv).unwrap();
    builder.build().unwrap()
}

/// 表層形、品詞、細分類の素性列と、読みのデータ列を持つ辞書を構築します。
#[track_caller]
pub(crate) fn build_dictionary_with_subpos(lexicon_csv: &str) -> Dictionary {
    let mut builder = DictionaryBuilder::new(vec![
        FieldSpec::feature("surface").surface(),
        FieldSpec::feature("pos"),
        FieldSpec::feature("subpos"),
        FieldSpec::data("reading"),
    ])
    .unwrap();
    builder.read_csv(lexicon_csv).unwrap();
    builder.build().unwrap()
}

/// 表層形に一致する全エントリのポインタ
#[track_caller]
pub(crate) fn lookup_all(dict: &Dictionary, surface: &str) -> Vec<EntryPtr> {
    dict.lookup(surface).unwrap().collect()
}

/// 全ての重みが0の主スコアラー
pub(crate) fn zero_scorer() -> ScorerDef {
    ScorerDef::new(Arc::new(HashedFeatureScorer::new(vec![0.0; 256]).unwrap()))
}
