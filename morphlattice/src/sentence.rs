//! 入力テキストの内部表現を提供するモジュール
//!
//! 入力文字列を文字単位に分割し、文字位置からバイト位置への対応と
//! 各文字の文字種集合を保持します。

use crate::dictionary::character::{CharClass, CharClassSet, CharClassifier};

/// 入力テキストの内部表現を保持する構造体
///
/// # フィールド
///
/// * `input` - 元の入力文字列
/// * `chars` - 入力文字列を文字単位に分割した配列
/// * `c2b` - 文字位置からバイト位置へのマッピング配列
/// * `classes` - 各文字の文字種集合
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    input: String,
    chars: Vec<char>,
    c2b: Vec<usize>,
    classes: Vec<CharClassSet>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内部状態をクリアします
    #[inline(always)]
    pub fn clear(&mut self) {
        self.input.clear();
        self.chars.clear();
        self.c2b.clear();
        self.classes.clear();
    }

    /// 入力文字列を設定します
    ///
    /// 既存の内部状態をクリアした後、新しい入力文字列を設定します。
    /// 文字の分類は[`compile`](Self::compile)で行われます。
    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.clear();
        self.input.push_str(input.as_ref());
    }

    /// 文字配列、バイト位置、文字種を計算します
    ///
    /// # 引数
    ///
    /// * `classifier` - 文字種の分類サービス
    pub fn compile(&mut self, classifier: &dyn CharClassifier) {
        for (bi, ch) in self.input.char_indices() {
            self.chars.push(ch);
            self.c2b.push(bi);
            self.classes.push(classifier.classify(ch));
        }
        self.c2b.push(self.input.len());
    }

    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.input
    }

    #[inline(always)]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.chars.len()
    }

    /// 文字位置`pos`のバイト位置を返します
    #[inline(always)]
    pub fn byte_position(&self, pos: usize) -> usize {
        self.c2b[pos]
    }

    /// `pos`番目の文字のUTF-8バイト列
    #[inline(always)]
    pub fn char_bytes(&self, pos: usize) -> &[u8] {
        &self.input.as_bytes()[self.c2b[pos]..self.c2b[pos + 1]]
    }

    /// 文字位置`start..end`の部分文字列
    #[inline(always)]
    pub fn surface(&self, start: usize, end: usize) -> &str {
        &self.input[self.c2b[start]..self.c2b[end]]
    }

    #[inline(always)]
    pub fn classes(&self, pos: usize) -> CharClassSet {
        self.classes[pos]
    }

    /// `pos`番目の文字が文字種`cls`に属するかどうか
    #[inline(always)]
    pub fn has_class(&self, pos: usize, cls: CharClass) -> bool {
        self.classes[pos].has_class(cls)
    }
}
