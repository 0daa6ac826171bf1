//! # morphlattice
//!
//! morphlatticeは、ビームサーチに基づく日本語形態素解析のラティス構築・デコードエンジンです。
//!
//! ## 概要
//!
//! 入力文の各位置から辞書を引き、辞書が覆わない文字列には文字種に基づいて未知語ノードを作り、
//! BOSとEOSの両方に繋がる境界だけをラティスとして実体化します。
//! 各ノードは上位K個の部分パス（ビーム）を保持し、最良パスが解析結果になります。
//!
//! ## 主な機能
//!
//! - **ラティス構築**: 到達不能な境界の除外と、素性射影が同一のノードの圧縮
//! - **ビームサーチ**: 線形スコアラーと補助スコアラーの重み付き和による採点
//! - **辞書**: CSVからの構築と、rkyvによるバイナリ形式での保存・読み込み
//! - **出力展開**: 圧縮されたノードやエイリアスレコードを元の辞書行に展開
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use morphlattice::{
//!     DictionaryBuilder, FieldSpec, HashedFeatureScorer, ScorerDef, Tokenizer,
//! };
//!
//! let mut builder = DictionaryBuilder::new(vec![
//!     FieldSpec::feature("surface").surface(),
//!     FieldSpec::feature("pos"),
//!     FieldSpec::data("reading"),
//! ])?;
//! builder.read_csv("京都,名詞,キョウト\n東京都,名詞,トウキョウト\n")?;
//! let tokenizer = Tokenizer::new(builder.build()?);
//!
//! let scorer = HashedFeatureScorer::new(vec![0.0; 64])?;
//! let def = ScorerDef::new(Arc::new(scorer));
//!
//! let mut worker = tokenizer.new_worker();
//! worker.reset_sentence("京都東京都");
//! worker.analyze(&def)?;
//! assert_eq!(worker.num_tokens(), 2);
//!
//! let t0 = worker.token(0);
//! assert_eq!(t0.surface(), "京都");
//! assert_eq!(t0.range_char(), 0..2);
//! assert_eq!(t0.range_byte(), 0..6);
//! assert_eq!(t0.feature_str("pos"), Some("名詞"));
//!
//! let t1 = worker.token(1);
//! assert_eq!(t1.surface(), "東京都");
//! assert_eq!(t1.range_char(), 2..5);
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// ラティスの構築とデコード
pub mod analysis;

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 入力文の内部表現
mod sentence;

/// トークン型の定義
pub mod token;

/// 内部ユーティリティ関数
pub mod utils;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use analysis::features::HashedFeatureScorer;
pub use analysis::score_api::ScorerDef;
pub use analysis::unk_nodes::{UnkMaker, UnkNodeConfig};
pub use analysis::worker::Worker;
pub use analysis::Tokenizer;
pub use dictionary::{Dictionary, DictionaryBuilder, FieldSpec};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
