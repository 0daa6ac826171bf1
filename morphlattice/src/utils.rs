//! ユーティリティ関数と型を提供するモジュール
//!
//! このモジュールには、CSV行の解析と、行単位でスライス可能な配列が含まれています。

use csv_core::ReadFieldResult;

use crate::errors::{MorphError, Result};

/// CSV形式の行を解析してフィールドのベクターに分割する
///
/// ダブルクォートで囲まれたフィールドや、フィールド内のカンマも正しく処理します。
///
/// # 例
///
/// ```
/// # use morphlattice::utils::parse_csv_row;
/// let fields = parse_csv_row("名詞,トスカーナ").unwrap();
/// assert_eq!(fields, vec!["名詞", "トスカーナ"]);
///
/// let fields_with_quote = parse_csv_row("名詞,\"1,2-ジクロロエタン\"").unwrap();
/// assert_eq!(fields_with_quote, vec!["名詞", "1,2-ジクロロエタン"]);
/// ```
///
/// # エラー
///
/// フィールドが大きすぎる場合、またはUTF-8として不正な場合にエラーを返します。
pub fn parse_csv_row(row: &str) -> Result<Vec<String>> {
    let mut features = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::End => true,
            ReadFieldResult::OutputFull => {
                return Err(MorphError::invalid_format("csv", "Field too large"));
            }
        };
        features.push(std::str::from_utf8(&output[..nout])?.to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    Ok(features)
}

/// 行単位でアクセスできる所有型の二次元配列
///
/// ラティスの素性値や素性インデックスを、行の長さが固定された
/// 連続領域として保持します。`reset`は確保済みの領域を再利用します。
#[derive(Debug, Clone, Default)]
pub struct Sliceable<T> {
    data: Vec<T>,
    row_size: usize,
}

impl<T: Copy> Sliceable<T> {
    /// `num_rows`行の領域を`value`で埋めて再初期化します。
    pub fn reset(&mut self, row_size: usize, num_rows: usize, value: T) {
        self.data.clear();
        self.data.resize(row_size * num_rows, value);
        self.row_size = row_size;
    }

    /// 行を末尾に追加し、その行番号を返します。
    pub fn push_row(&mut self, row: &[T]) -> usize {
        debug_assert_eq!(row.len(), self.row_size);
        let idx = self.num_rows();
        self.data.extend_from_slice(row);
        idx
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.row_size..(i + 1) * self.row_size]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.data[i * self.row_size..(i + 1) * self.row_size]
    }

    #[inline(always)]
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    #[inline(always)]
    pub fn num_rows(&self) -> usize {
        if self.row_size == 0 {
            0
        } else {
            self.data.len() / self.row_size
        }
    }

    /// 読み取り専用のビューを返します。
    #[inline(always)]
    pub fn as_const(&self) -> ConstSliceable<'_, T> {
        ConstSliceable::new(&self.data, self.row_size)
    }
}

/// 行単位でアクセスできる借用型の二次元配列ビュー
#[derive(Debug, Clone, Copy)]
pub struct ConstSliceable<'a, T> {
    data: &'a [T],
    row_size: usize,
}

impl<'a, T> ConstSliceable<'a, T> {
    /// 新しいビューを作成します。
    ///
    /// `data`の長さは`row_size`の倍数でなければなりません。
    #[inline(always)]
    pub fn new(data: &'a [T], row_size: usize) -> Self {
        debug_assert!(row_size == 0 || data.len() % row_size == 0);
        Self { data, row_size }
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &'a [T] {
        &self.data[i * self.row_size..(i + 1) * self.row_size]
    }

    #[inline(always)]
    pub fn num_rows(&self) -> usize {
        if self.row_size == 0 {
            0
        } else {
            self.data.len() / self.row_size
        }
    }

    #[inline(always)]
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    #[inline(always)]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// `start..end`行目の部分ビューを返します。
    pub fn rows(&self, start: usize, end: usize) -> ConstSliceable<'a, T> {
        debug_assert!(start <= end);
        Self::new(
            &self.data[start * self.row_size..end * self.row_size],
            self.row_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_row() {
        assert_eq!(
            &["名詞", "トスカーナ"],
            parse_csv_row("名詞,トスカーナ").unwrap().as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_with_quote() {
        assert_eq!(
            &["名詞", "1,2-ジクロロエタン"],
            parse_csv_row("名詞,\"1,2-ジクロロエタン\"").unwrap().as_slice()
        );
    }

    #[test]
    fn test_sliceable_rows() {
        let mut s = Sliceable::default();
        s.reset(3, 0, 0i32);
        s.push_row(&[1, 2, 3]);
        s.push_row(&[4, 5, 6]);
        assert_eq!(s.num_rows(), 2);
        s.row_mut(1)[0] = 7;
        let view = s.as_const();
        assert_eq!(view.row(0), &[1, 2, 3]);
        assert_eq!(view.row(1), &[7, 5, 6]);
        assert_eq!(view.rows(1, 2).data(), &[7, 5, 6]);
    }
}
