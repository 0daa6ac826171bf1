//! トークンの結果コンテナ
//!
//! このモジュールは、解析結果として得られるトークンを表現する型を提供します。
//! トークンはラティス上のノードへの参照を保持し、表層形、素性、位置情報などへの
//! アクセスを提供します。

use std::ops::Range;

use crate::analysis::extra_nodes::ExtraNodeKind;
use crate::analysis::walker::NodeWalker;
use crate::analysis::worker::{TopNode, Worker};
use crate::dictionary::entries::EntryPtr;
use crate::dictionary::fields::FieldRole;
use crate::errors::Result;

/// 解析結果のトークン
///
/// このトークンは[`Worker`]への軽量な参照であり、実際のデータは
/// Workerが保持しています。トークンはWorkerが生存している間のみ有効です。
pub struct Token<'w> {
    worker: &'w Worker,
    index: usize,
}

impl<'w> Token<'w> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker, index: usize) -> Self {
        Self { worker, index }
    }

    #[inline(always)]
    fn top(&self) -> &'w TopNode {
        &self.worker.top_nodes[self.index]
    }

    /// トークンの文字単位の位置範囲を取得します。
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        let top = self.top();
        top.start..top.end
    }

    /// トークンのバイト単位の位置範囲を取得します。
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        let sent = &self.worker.sent;
        let top = self.top();
        sent.byte_position(top.start)..sent.byte_position(top.end)
    }

    /// トークンの表層形（元のテキスト中の文字列）を取得します。
    #[inline(always)]
    pub fn surface(&self) -> &'w str {
        &self.worker.sent.raw()[self.range_byte()]
    }

    /// ラティス上のノードの素性値を取得します。
    ///
    /// 圧縮されたノードの場合は、代表ノードの素性値です。
    #[inline(always)]
    pub fn features(&self) -> &'w [i32] {
        self.worker.lattice.node_features(self.top().node)
    }

    /// 素性列`name`の値を文字列として取得します。
    ///
    /// 未知語ノードの表層形の列のように、値が辞書の文字列でない場合は、
    /// 表層形の列に限って入力中の表層形を返します。
    /// データ列の値は[`walker`](Self::walker)で参照してください。
    pub fn feature_str(&self, name: &str) -> Option<&'w str> {
        let field = self
            .worker
            .tokenizer
            .dictionary()
            .fields()
            .field_by_name(name)
            .filter(|f| f.role() == FieldRole::Feature)?;
        let value = *self.features().get(field.position())?;
        if field.is_surface() && value < 0 {
            return Some(self.surface());
        }
        field.string_of(value)
    }

    /// トークンのエントリポインタを取得します。
    #[inline(always)]
    pub fn entry_ptr(&self) -> EntryPtr {
        self.worker.lattice.node(self.top().node).ptr
    }

    /// 文頭からこのトークンまでの累積スコアを取得します。
    #[inline(always)]
    pub fn score(&self) -> f32 {
        self.top().score
    }

    /// トークンが未知語ノードかどうか
    ///
    /// 圧縮で作られたエイリアスノードは、全ての要素が未知語ノードの場合に未知語とみなします。
    pub fn is_unknown(&self) -> bool {
        let xtra = &self.worker.xtra;
        let ptr = self.entry_ptr();
        let is_unk = |p: EntryPtr| {
            xtra.node(p)
                .is_some_and(|n| n.kind() == ExtraNodeKind::Unknown)
        };
        match xtra.node(ptr).map(|n| n.kind()) {
            Some(ExtraNodeKind::Unknown) => true,
            Some(ExtraNodeKind::Alias) => {
                let members = xtra.alias_members(ptr);
                !members.is_empty() && members.iter().all(|&m| is_unk(m))
            }
            None => false,
        }
    }

    /// トークンが表す辞書行を列挙する展開器を作成します。
    ///
    /// # エラー
    ///
    /// ノードが壊れている場合に[`MorphError`](crate::errors::MorphError)を返します。
    pub fn walker(&self) -> Result<NodeWalker<'w>> {
        let entries = self.worker.tokenizer.dictionary().entries();
        let mut walker = NodeWalker::new(entries, &self.worker.xtra);
        walker.init(self.entry_ptr())?;
        Ok(walker)
    }

    /// このトークンビューを所有型の[`TokenBuf`]に変換します。
    ///
    /// スレッド間でトークン情報を送信したり、長期保存する際に有用です。
    pub fn to_buf(&self) -> TokenBuf {
        TokenBuf {
            surface: self.surface().to_string(),
            features: self.features().to_vec(),
            range_char: self.range_char(),
            range_byte: self.range_byte(),
            entry_ptr: self.entry_ptr(),
            score: self.score(),
            is_unknown: self.is_unknown(),
        }
    }
}

impl std::fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("surface", &self.surface())
            .field("range_char", &self.range_char())
            .field("range_byte", &self.range_byte())
            .field("features", &self.features())
            .field("entry_ptr", &self.entry_ptr())
            .field("score", &self.score())
            .finish()
    }
}

/// トークンの所有型
#[derive(Clone, Debug, PartialEq)]
pub struct TokenBuf {
    /// トークンの表層形
    pub surface: String,

    /// トークンの素性値
    pub features: Vec<i32>,

    /// トークンの文字単位の位置範囲
    pub range_char: Range<usize>,

    /// トークンのバイト単位の位置範囲
    pub range_byte: Range<usize>,

    /// トークンのエントリポインタ
    pub entry_ptr: EntryPtr,

    /// 文頭からの累積スコア
    pub score: f32,

    /// 未知語ノードかどうか
    pub is_unknown: bool,
}

impl From<Token<'_>> for TokenBuf {
    fn from(token: Token<'_>) -> Self {
        token.to_buf()
    }
}

/// トークンのイテレータ
pub struct TokenIter<'w> {
    worker: &'w Worker,
    front: usize,
    back: usize,
}

impl<'w> TokenIter<'w> {
    #[inline(always)]
    pub(crate) fn new(worker: &'w Worker) -> Self {
        let num_tokens = worker.num_tokens();
        Self {
            worker,
            front: 0,
            back: num_tokens,
        }
    }
}

impl<'w> Iterator for TokenIter<'w> {
    type Item = Token<'w>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let t = self.worker.token(self.front);
            self.front += 1;
            Some(t)
        } else {
            None
        }
    }
}

impl<'w> DoubleEndedIterator for TokenIter<'w> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            let t = self.worker.token(self.back);
            Some(t)
        } else {
            None
        }
    }
}
