//! 辞書エントリの読み出し
//!
//! エントリは[`IntStorage`](super::storage::IntStorage)に次の2形式で格納されています。
//!
//! - 通常エントリ: 素性値`num_features`個、続いてデータ値`num_data`個
//! - エイリアスエントリ: 素性値`num_features`個、行数`n`、続いてデータ値`num_data * n`個
//!
//! エイリアスエントリは、素性が同一でデータだけが異なる複数の行を1つのレコードにまとめたものです。

use std::fmt;

use crate::dictionary::storage::{IntListTraversal, IntStorageReader};
use crate::dictionary::trie::{TraverseStatus, TrieTraversal};
use crate::errors::{MorphError, Result};

/// 1エントリが持てる素性値・データ値の最大数
pub const MAX_DIC_FIELDS: usize = 32;

const ALIAS_FLAG: i32 = 0x4000_0000;

/// エントリへのポインタ
///
/// 非負の値は辞書内のバイトオフセットで、ビット30はエイリアスレコードを示します。
/// 負の値は解析ごとに生成される追加ノード（未知語ノード、エイリアスノード）を指し、
/// そのインデックスは値のビット反転です。
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct EntryPtr(i32);

impl EntryPtr {
    /// BOS/EOSノードに使われるポインタ
    pub const BOS_EOS: Self = Self(i32::MIN);

    #[inline(always)]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// 辞書オフセットからポインタを作成します。
    pub fn dic(offset: usize, alias: bool) -> Result<Self> {
        let raw = i32::try_from(offset)?;
        if raw & ALIAS_FLAG != 0 {
            return Err(MorphError::invalid_parameter(
                "offset",
                format!("entry offset {offset} exceeds the addressable range"),
            ));
        }
        Ok(Self(if alias { raw | ALIAS_FLAG } else { raw }))
    }

    /// 追加ノードのインデックスからポインタを作成します。
    #[inline(always)]
    pub const fn special(index: u32) -> Self {
        Self(!(index as i32))
    }

    #[inline(always)]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline(always)]
    pub const fn is_special(self) -> bool {
        self.0 < 0
    }

    #[inline(always)]
    pub const fn is_alias(self) -> bool {
        !self.is_special() && self.0 & ALIAS_FLAG != 0
    }

    /// 辞書内のバイトオフセット
    #[inline(always)]
    pub const fn dic_offset(self) -> usize {
        (self.0 & !ALIAS_FLAG) as usize
    }

    /// 追加ノードのインデックス
    #[inline(always)]
    pub const fn extra_index(self) -> usize {
        (!self.0) as usize
    }
}

impl fmt::Debug for EntryPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::BOS_EOS {
            write!(f, "EntryPtr(BOS/EOS)")
        } else if self.is_special() {
            write!(f, "EntryPtr(extra:{})", self.extra_index())
        } else if self.is_alias() {
            write!(f, "EntryPtr(alias:{})", self.dic_offset())
        } else {
            write!(f, "EntryPtr({})", self.0)
        }
    }
}

/// データ行の読み出し元
#[derive(Clone, Copy, Debug)]
enum RowSource<'a> {
    /// 通常エントリ。データはすでにバッファにある
    Plain { remaining: usize },
    /// エイリアスエントリ。残りの行を1行ずつ読む
    Alias { reader: IntListTraversal<'a> },
}

/// 1エントリの素性値と現在のデータ行を保持するバッファ
#[derive(Clone, Debug)]
pub struct DicEntryBuffer<'a> {
    features: [i32; MAX_DIC_FIELDS],
    data: [i32; MAX_DIC_FIELDS],
    num_features: usize,
    num_data: usize,
    source: RowSource<'a>,
}

impl Default for DicEntryBuffer<'_> {
    fn default() -> Self {
        Self {
            features: [0; MAX_DIC_FIELDS],
            data: [0; MAX_DIC_FIELDS],
            num_features: 0,
            num_data: 0,
            source: RowSource::Plain { remaining: 0 },
        }
    }
}

impl<'a> DicEntryBuffer<'a> {
    #[inline(always)]
    pub fn features(&self) -> &[i32] {
        &self.features[..self.num_features]
    }

    /// 現在のデータ行
    #[inline(always)]
    pub fn data(&self) -> &[i32] {
        &self.data[..self.num_data]
    }

    /// 次のデータ行に進みます。
    ///
    /// バッファには読み込み時点で最初の行が入っています。
    /// 通常エントリは1行しか持たないため、常に`false`を返します。
    /// 行が残っていない場合や、データが途切れている場合も`false`を返します。
    pub fn next_data(&mut self) -> bool {
        match &mut self.source {
            RowSource::Plain { remaining } => {
                if *remaining == 0 {
                    return false;
                }
                *remaining -= 1;
                true
            }
            RowSource::Alias { reader } => {
                if self.num_data == 0 || reader.remaining() < self.num_data {
                    return false;
                }
                reader.fill(&mut self.data, self.num_data) == self.num_data
            }
        }
    }

    /// 現在の行の後に残っている行数
    pub fn remaining_rows(&self) -> usize {
        match &self.source {
            RowSource::Plain { remaining } => *remaining,
            RowSource::Alias { reader } => {
                if self.num_data == 0 {
                    0
                } else {
                    reader.remaining() / self.num_data
                }
            }
        }
    }

    fn fill_from_storage(
        &mut self,
        ptr: EntryPtr,
        storage: IntStorageReader<'a>,
        num_features: usize,
        num_data: usize,
    ) -> bool {
        self.num_features = num_features;
        self.num_data = num_data;
        let offset = ptr.dic_offset();
        if ptr.is_alias() {
            let mut head = storage.raw_with_limit(offset, num_features + 1);
            if head.fill(&mut self.features, num_features) < num_features {
                return false;
            }
            let mut count = 0;
            if !head.read_one(&mut count) || count < 1 {
                return false;
            }
            let start = offset + head.num_read_bytes();
            let mut reader = storage.raw_with_limit(start, num_data * count as usize);
            if reader.fill(&mut self.data, num_data) < num_data {
                return false;
            }
            self.source = RowSource::Alias { reader };
        } else {
            let mut trav = storage.raw_with_limit(offset, num_features + num_data);
            if trav.fill(&mut self.features, num_features) < num_features {
                return false;
            }
            if trav.fill(&mut self.data, num_data) < num_data {
                return false;
            }
            self.source = RowSource::Plain { remaining: 0 };
        }
        true
    }
}

/// 辞書エントリへの読み出し専用アクセス
#[derive(Clone, Copy, Debug)]
pub struct DictionaryEntries<'a> {
    trie: &'a crate::dictionary::trie::Trie,
    entries: IntStorageReader<'a>,
    entry_ptrs: IntStorageReader<'a>,
    num_features: usize,
    num_data: usize,
}

impl<'a> DictionaryEntries<'a> {
    pub(crate) fn new(
        trie: &'a crate::dictionary::trie::Trie,
        entries: IntStorageReader<'a>,
        entry_ptrs: IntStorageReader<'a>,
        num_features: usize,
        num_data: usize,
    ) -> Self {
        Self {
            trie,
            entries,
            entry_ptrs,
            num_features,
            num_data,
        }
    }

    #[inline(always)]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline(always)]
    pub fn num_data(&self) -> usize {
        self.num_data
    }

    /// 表層形を1文字ずつ辿るカーソルを返します。
    #[inline(always)]
    pub fn traversal(&self) -> IndexTraversal<'a> {
        IndexTraversal {
            trie: self.trie.traversal(),
            entries: *self,
        }
    }

    /// トライの値が指すエントリポインタリストを返します。
    pub fn entry_list(&self, list_offset: u32) -> IndexedEntries<'a> {
        IndexedEntries {
            entries: *self,
            list: self.entry_ptrs.list_at(list_offset as usize),
            current: EntryPtr::default(),
        }
    }

    /// エントリを読み出してバッファに格納します。
    ///
    /// # エラー
    ///
    /// 追加ノードのポインタが渡された場合、またはエントリを復号できない場合、
    /// [`MorphError::InvalidState`]を返します。
    pub fn fill_buffer(&self, ptr: EntryPtr, buffer: &mut DicEntryBuffer<'a>) -> Result<()> {
        if ptr.is_special() {
            return Err(MorphError::invalid_state(
                "cannot read a dictionary entry",
                format!("{ptr:?} is not a dictionary pointer"),
            ));
        }
        if self.num_features > MAX_DIC_FIELDS || self.num_data > MAX_DIC_FIELDS {
            return Err(MorphError::invalid_state(
                "cannot read a dictionary entry",
                "too many fields",
            ));
        }
        if buffer.fill_from_storage(ptr, self.entries, self.num_features, self.num_data) {
            Ok(())
        } else {
            Err(MorphError::invalid_state(
                "failed to decode a dictionary entry",
                format!("{ptr:?}"),
            ))
        }
    }

    /// エントリの素性値を`out`にコピーします。
    pub fn features_into(&self, ptr: EntryPtr, out: &mut Vec<i32>) -> Result<()> {
        let mut buffer = DicEntryBuffer::default();
        self.fill_buffer(ptr, &mut buffer)?;
        out.clear();
        out.extend_from_slice(buffer.features());
        Ok(())
    }
}

/// 1つの表層形に対応するエントリポインタのリスト
#[derive(Clone, Copy, Debug)]
pub struct IndexedEntries<'a> {
    entries: DictionaryEntries<'a>,
    list: IntListTraversal<'a>,
    current: EntryPtr,
}

impl<'a> IndexedEntries<'a> {
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.list.size()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.list.remaining()
    }

    /// 次のポインタを読み出します。
    pub fn read_one_ptr(&mut self) -> bool {
        let mut raw = 0;
        if !self.list.read_one_cumulative(&mut raw) {
            return false;
        }
        self.current = EntryPtr::from_raw(raw);
        true
    }

    #[inline(always)]
    pub fn current_ptr(&self) -> EntryPtr {
        self.current
    }

    /// 現在のポインタが指すエントリを読み出します。
    pub fn fill_entry_data(&self, buffer: &mut DicEntryBuffer<'a>) -> Result<()> {
        debug_assert!(self.list.did_read());
        self.entries.fill_buffer(self.current, buffer)
    }
}

impl Iterator for IndexedEntries<'_> {
    type Item = EntryPtr;

    fn next(&mut self) -> Option<EntryPtr> {
        self.read_one_ptr().then_some(self.current)
    }
}

/// 辞書インデックスのカーソル
#[derive(Clone, Copy, Debug)]
pub struct IndexTraversal<'a> {
    trie: TrieTraversal<'a>,
    entries: DictionaryEntries<'a>,
}

impl<'a> IndexTraversal<'a> {
    /// 1文字分のバイト列を辿ります。
    #[inline(always)]
    pub fn step(&mut self, bytes: &[u8]) -> TraverseStatus {
        self.trie.step(bytes)
    }

    /// 現在のノードのエントリリストを返します。
    ///
    /// 直前の[`step`](Self::step)が[`TraverseStatus::Ok`]を返した場合のみ`Some`です。
    pub fn entries(&self) -> Option<IndexedEntries<'a>> {
        self.trie.value().map(|v| self.entries.entry_list(v))
    }
}
