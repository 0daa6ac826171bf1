//! ノードが表す辞書行の列挙
//!
//! ラティスのノードは複数の辞書行を代表していることがあります。
//!
//! - 辞書のエイリアスレコードは、素性が同じデータ行を複数持ちます。
//! - 圧縮で作られたエイリアスノードは、元のノードを全てまとめています。
//!
//! [`NodeWalker`]はこれらを展開し、1行ずつ素性とデータを返します。

use crate::analysis::extra_nodes::{ExtraNodeKind, ExtraNodesContext};
use crate::dictionary::entries::{DicEntryBuffer, DictionaryEntries, EntryPtr};
use crate::errors::{MorphError, Result};

/// ノードの展開器
pub struct NodeWalker<'a> {
    entries: DictionaryEntries<'a>,
    xtra: &'a ExtraNodesContext,
    members: Vec<EntryPtr>,
    next_member: usize,
    current: EntryPtr,
    buffer: DicEntryBuffer<'a>,
    in_entry: bool,
    unk_features: Vec<i32>,
    unk_data: Vec<i32>,
    is_unk: bool,
}

impl<'a> NodeWalker<'a> {
    pub fn new(entries: DictionaryEntries<'a>, xtra: &'a ExtraNodesContext) -> Self {
        Self {
            entries,
            xtra,
            members: vec![],
            next_member: 0,
            current: EntryPtr::default(),
            buffer: DicEntryBuffer::default(),
            in_entry: false,
            unk_features: vec![],
            unk_data: vec![0; entries.num_data()],
            is_unk: false,
        }
    }

    /// `ptr`が指すノードの展開を始めます。
    ///
    /// # エラー
    ///
    /// 存在しない追加ノードやBOS/EOSが渡された場合に[`MorphError::InvalidState`]を返します。
    pub fn init(&mut self, ptr: EntryPtr) -> Result<()> {
        self.members.clear();
        self.next_member = 0;
        self.in_entry = false;
        self.is_unk = false;
        if !ptr.is_special() {
            self.members.push(ptr);
            return Ok(());
        }
        let node = self.xtra.node(ptr).ok_or_else(|| {
            MorphError::invalid_state("cannot expand a node", format!("{ptr:?} is not known"))
        })?;
        match node.kind() {
            ExtraNodeKind::Unknown => self.members.push(ptr),
            ExtraNodeKind::Alias => self.members.extend_from_slice(self.xtra.alias_members(ptr)),
        }
        Ok(())
    }

    /// 次の行に進みます。
    ///
    /// # 戻り値
    ///
    /// 行が残っていれば`true`
    ///
    /// # エラー
    ///
    /// 辞書エントリを復号できない場合に[`MorphError::InvalidState`]を返します。
    pub fn next(&mut self) -> Result<bool> {
        if self.in_entry {
            if self.buffer.next_data() {
                return Ok(true);
            }
            self.in_entry = false;
        }
        let Some(&member) = self.members.get(self.next_member) else {
            return Ok(false);
        };
        self.next_member += 1;
        self.current = member;
        if member.is_special() {
            let features = self.xtra.features(member).ok_or_else(|| {
                MorphError::invalid_state("cannot expand a node", format!("{member:?} is not known"))
            })?;
            self.unk_features.clear();
            self.unk_features.extend_from_slice(features);
            self.is_unk = true;
        } else {
            self.entries.fill_buffer(member, &mut self.buffer)?;
            self.is_unk = false;
            self.in_entry = true;
        }
        Ok(true)
    }

    /// 現在の行の素性値
    pub fn features(&self) -> &[i32] {
        if self.is_unk {
            &self.unk_features
        } else {
            self.buffer.features()
        }
    }

    /// 現在の行のデータ値。未知語ノードでは全て0です。
    pub fn data(&self) -> &[i32] {
        if self.is_unk {
            &self.unk_data
        } else {
            self.buffer.data()
        }
    }

    /// 現在の行の元となったエントリ
    #[inline(always)]
    pub fn current_ptr(&self) -> EntryPtr {
        self.current
    }
}
