//! morphlatticeのシナリオテスト群
//!
//! 辞書、ラティス構築、未知語生成、圧縮、デコード、パス抽出を
//! 組み合わせた動作を検証します。

mod compaction;
mod dictionary;
mod lattice;
mod path;
mod unknown;
