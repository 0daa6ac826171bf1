//! 未知語ノードの生成
//!
//! 辞書が覆わない文字列に対して、文字種に基づいて未知語ノードのシードを生成します。
//! 未知語ノードの素性は辞書内のテンプレートエントリから作られ、
//! 表層形に置き換える列には表層形のハッシュ値（常に負）が入ります。

use xxhash_rust::xxh64::xxh64;

use crate::analysis::extra_nodes::ExtraNodesContext;
use crate::analysis::lattice_builder::LatticeBuilder;
use crate::dictionary::character::CharClass;
use crate::dictionary::entries::{DicEntryBuffer, DictionaryEntries, EntryPtr, IndexedEntries};
use crate::dictionary::trie::TraverseStatus;
use crate::errors::{MorphError, Result};
use crate::sentence::Sentence;

const UNK_STRING_SEED: u64 = 0xa762_10bf;

/// 未知語の表層形のハッシュ値を計算します。
///
/// 最上位ビットが立っているため、値は常に負で、辞書の文字列IDと衝突しません。
#[inline]
pub fn hash_unk_string(surface: &[u8]) -> i32 {
    let trimmed = xxh64(surface, UNK_STRING_SEED) as u32;
    (trimmed | 0x8000_0000) as i32
}

/// 未知語ノードのテンプレート
#[derive(Clone, Debug)]
pub struct UnkNodeConfig {
    template: EntryPtr,
    base: Vec<i32>,
    replace_with_surface: Vec<usize>,
    pattern_fields: Vec<usize>,
    target_placeholder: Option<usize>,
}

impl UnkNodeConfig {
    /// 素性行からテンプレートを作成します。
    pub fn new(template: EntryPtr, base: Vec<i32>) -> Self {
        let mut config = Self {
            template,
            base,
            replace_with_surface: vec![],
            pattern_fields: vec![],
            target_placeholder: None,
        };
        config.fill_pattern_fields();
        config
    }

    /// 辞書エントリを読み出してテンプレートを作成します。
    ///
    /// # エラー
    ///
    /// エントリを復号できない場合に[`MorphError`]を返します。
    pub fn from_entry(entries: &DictionaryEntries<'_>, template: EntryPtr) -> Result<Self> {
        let mut buffer = DicEntryBuffer::default();
        if let Err(e) = entries.fill_buffer(template, &mut buffer) {
            log::warn!("failed to read the unknown node template {template:?}: {e}");
            return Err(e);
        }
        Ok(Self::new(template, buffer.features().to_vec()))
    }

    /// 表層形のハッシュ値で置き換える素性列を指定します。
    ///
    /// # エラー
    ///
    /// 列番号が素性行の範囲外の場合に[`MorphError`]を返します。
    pub fn replace_with_surface<I>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        self.replace_with_surface = fields.into_iter().collect();
        if let Some(&f) = self.replace_with_surface.iter().find(|&&f| f >= self.base.len()) {
            return Err(MorphError::invalid_parameter(
                "fields",
                format!("feature index {f} is out of range"),
            ));
        }
        self.fill_pattern_fields();
        Ok(self)
    }

    /// 辞書の接頭辞でないことを記録するプレースホルダを指定します。
    pub fn placeholder(mut self, idx: usize) -> Self {
        self.target_placeholder = Some(idx);
        self
    }

    /// 表層形で置き換える列以外のすべてを比較対象の列にします。
    pub fn fill_pattern_fields(&mut self) {
        self.pattern_fields.clear();
        self.pattern_fields.extend(
            (0..self.base.len()).filter(|i| !self.replace_with_surface.contains(i)),
        );
    }

    #[inline(always)]
    pub fn template(&self) -> EntryPtr {
        self.template
    }

    #[inline(always)]
    pub fn base(&self) -> &[i32] {
        &self.base
    }

    #[inline(always)]
    pub fn pattern_fields(&self) -> &[usize] {
        &self.pattern_fields
    }

    #[inline(always)]
    pub fn target_placeholder(&self) -> Option<usize> {
        self.target_placeholder
    }

    /// 表層形で置き換える列にハッシュ値を書き込みます。
    pub fn fill_elems(&self, row: &mut [i32], hash: i32) {
        for &f in &self.replace_with_surface {
            row[f] = hash;
        }
    }

    /// エントリリストの中に、比較対象の列がテンプレートと一致するものがあるかどうか
    pub fn dic_pattern_matches(&self, mut list: IndexedEntries<'_>) -> bool {
        let mut buffer = DicEntryBuffer::default();
        while list.read_one_ptr() {
            if let Err(e) = list.fill_entry_data(&mut buffer) {
                log::warn!(
                    "failed to read dictionary entry {:?}: {e}",
                    list.current_ptr()
                );
                return true;
            }
            let features = buffer.features();
            if self
                .pattern_fields
                .iter()
                .all(|&i| features.get(i) == self.base.get(i))
            {
                return true;
            }
        }
        false
    }
}

/// 未知語ノードを作成する解析ごとのコンテキスト
pub struct UnkNodesContext<'a, 'd> {
    xtra: &'a mut ExtraNodesContext,
    entries: DictionaryEntries<'d>,
    row: Vec<i32>,
}

impl<'a, 'd> UnkNodesContext<'a, 'd> {
    pub fn new(xtra: &'a mut ExtraNodesContext, entries: DictionaryEntries<'d>) -> Self {
        Self {
            xtra,
            entries,
            row: vec![],
        }
    }

    /// テンプレートから未知語ノードを作成します。
    pub fn make_ptr(
        &mut self,
        sent: &Sentence,
        start: usize,
        end: usize,
        conf: &UnkNodeConfig,
        not_prefix: bool,
    ) -> EntryPtr {
        let hash = hash_unk_string(sent.surface(start, end).as_bytes());
        self.row.clear();
        self.row.extend_from_slice(&conf.base);
        conf.fill_elems(&mut self.row, hash);
        let ptr = self.xtra.make_unk(conf.template, &self.row, start..end, hash);
        if let Some(idx) = conf.target_placeholder {
            self.xtra.put_placeholder(ptr, idx, i32::from(not_prefix));
        }
        ptr
    }

    /// 既存の辞書エントリを元に未知語ノードを作成します。
    ///
    /// エントリを読み出せない場合は警告を出し、素性が0の行を使います。
    pub fn make_ptr_from_entry(
        &mut self,
        sent: &Sentence,
        start: usize,
        end: usize,
        conf: &UnkNodeConfig,
        eptr: EntryPtr,
        placeholder_value: i32,
    ) -> EntryPtr {
        let mut buffer = DicEntryBuffer::default();
        self.row.clear();
        match self.entries.fill_buffer(eptr, &mut buffer) {
            Ok(()) => self.row.extend_from_slice(buffer.features()),
            Err(e) => {
                log::warn!("failed to read data from dictionary, ptr={eptr:?}: {e}");
                self.row.resize(self.xtra.num_features(), 0);
            }
        }
        let hash = hash_unk_string(sent.surface(start, end).as_bytes());
        conf.fill_elems(&mut self.row, hash);
        let ptr = self.xtra.make_unk(eptr, &self.row, start..end, hash);
        if let Some(idx) = conf.target_placeholder {
            self.xtra.put_placeholder(ptr, idx, placeholder_value);
        }
        ptr
    }

    #[inline(always)]
    pub fn entries(&self) -> &DictionaryEntries<'d> {
        &self.entries
    }
}

/// 未知語の生成方法
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum UnkMakerKind {
    /// 1文字ずつ未知語を作る
    Single,
    /// 同じ文字種の連続から未知語を作る
    Chunking,
}

/// 未知語ノードの生成器
#[derive(Clone, Debug)]
pub struct UnkMaker {
    kind: UnkMakerKind,
    class: CharClass,
    config: UnkNodeConfig,
}

impl UnkMaker {
    /// 1文字の未知語を生成する生成器を作成します。
    pub fn single(class: CharClass, config: UnkNodeConfig) -> Self {
        Self {
            kind: UnkMakerKind::Single,
            class,
            config,
        }
    }

    /// 文字種の連続から未知語を生成する生成器を作成します。
    pub fn chunking(class: CharClass, config: UnkNodeConfig) -> Self {
        Self {
            kind: UnkMakerKind::Chunking,
            class,
            config,
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> UnkMakerKind {
        self.kind
    }

    #[inline(always)]
    pub fn config(&self) -> &UnkNodeConfig {
        &self.config
    }

    /// シードを生成して構築器に追加し、生成した数を返します。
    pub fn spawn_nodes(
        &self,
        sent: &Sentence,
        ctx: &mut UnkNodesContext<'_, '_>,
        builder: &mut LatticeBuilder,
    ) -> usize {
        let count = match self.kind {
            UnkMakerKind::Single => self.spawn_single(sent, ctx, builder),
            UnkMakerKind::Chunking => self.spawn_chunking(sent, ctx, builder),
        };
        log::trace!("{:?} unk maker for {:?}: {count} seeds", self.kind, self.class);
        count
    }

    fn spawn_chunking(
        &self,
        sent: &Sentence,
        ctx: &mut UnkNodesContext<'_, '_>,
        builder: &mut LatticeBuilder,
    ) -> usize {
        let len = sent.len_char();
        let mut count = 0;
        for i in 0..len {
            if !sent.has_class(i, self.class) {
                continue;
            }
            let mut trav = ctx.entries().traversal();
            for j in i..len {
                if !sent.has_class(j, self.class) {
                    break;
                }
                match trav.step(sent.char_bytes(j)) {
                    TraverseStatus::NoNode => {
                        // Every remaining position of the run yields a span.
                        for k in j..len {
                            if !sent.has_class(k, self.class) {
                                break;
                            }
                            let ptr = ctx.make_ptr(sent, i, k + 1, &self.config, true);
                            builder.append_seed(ptr, i, k + 1);
                            count += 1;
                        }
                        break;
                    }
                    TraverseStatus::NoLeaf => {
                        let ptr = ctx.make_ptr(sent, i, j + 1, &self.config, false);
                        builder.append_seed(ptr, i, j + 1);
                        count += 1;
                    }
                    TraverseStatus::Ok => {}
                }
            }
        }
        count
    }

    fn spawn_single(
        &self,
        sent: &Sentence,
        ctx: &mut UnkNodesContext<'_, '_>,
        builder: &mut LatticeBuilder,
    ) -> usize {
        let mut count = 0;
        for i in 0..sent.len_char() {
            if !sent.has_class(i, self.class) {
                continue;
            }
            let mut trav = ctx.entries().traversal();
            let not_prefix = match trav.step(sent.char_bytes(i)) {
                TraverseStatus::Ok => continue,
                TraverseStatus::NoNode => true,
                TraverseStatus::NoLeaf => false,
            };
            let ptr = ctx.make_ptr(sent, i, i + 1, &self.config, not_prefix);
            builder.append_seed(ptr, i, i + 1);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_negative() {
        for s in ["", "a", "未知語", "ｶﾀｶﾅ"] {
            assert!(hash_unk_string(s.as_bytes()) < 0);
        }
        assert_eq!(hash_unk_string(b"abc"), hash_unk_string(b"abc"));
        assert_ne!(hash_unk_string(b"abc"), hash_unk_string(b"abd"));
    }

    #[test]
    fn test_pattern_fields() {
        let conf = UnkNodeConfig::new(EntryPtr::default(), vec![1, 2, 3])
            .replace_with_surface([0])
            .unwrap();
        assert_eq!(conf.pattern_fields(), &[1, 2]);
        let mut row = conf.base().to_vec();
        conf.fill_elems(&mut row, -7);
        assert_eq!(row, vec![-7, 2, 3]);
        assert!(
            UnkNodeConfig::new(EntryPtr::default(), vec![1])
                .replace_with_surface([3])
                .is_err()
        );
    }
}
