//! 辞書
//!
//! 辞書は列定義、表層形のトライ、エントリ本体、表層形ごとのエントリポインタリストから
//! 構成されます。構築後は不変で、[`Arc`](std::sync::Arc)を通して複数のワーカー間で共有されます。
pub mod builder;
pub mod character;
pub mod entries;
pub mod fields;
pub mod storage;
pub mod trie;

use std::io::{Read, Write};

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{MorphError, Result};

pub use crate::dictionary::builder::{DictionaryBuilder, FieldSpec};
pub use crate::dictionary::character::{CharClass, CharClassSet, CharClassifier, CharProperty};
pub use crate::dictionary::entries::{
    DicEntryBuffer, DictionaryEntries, EntryPtr, IndexTraversal, IndexedEntries, MAX_DIC_FIELDS,
};
pub use crate::dictionary::fields::{FieldInfo, FieldRole, FieldsHolder};
pub use crate::dictionary::trie::TraverseStatus;

use crate::dictionary::storage::IntStorage;
use crate::dictionary::trie::Trie;

/// 辞書ファイルを識別するマジックバイト
pub const MODEL_MAGIC: &[u8] = b"MorphLatticeDic 0.1\n";
const MODEL_MAGIC_PREFIX: &[u8] = b"MorphLatticeDic ";

const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MODEL_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;

/// 解析に使用する辞書
#[derive(Archive, Serialize, Deserialize)]
pub struct Dictionary {
    pub(crate) fields: FieldsHolder,
    pub(crate) trie: Trie,
    pub(crate) entries: IntStorage,
    pub(crate) entry_ptrs: IntStorage,
}

impl Dictionary {
    /// 列定義を返します。
    #[inline(always)]
    pub fn fields(&self) -> &FieldsHolder {
        &self.fields
    }

    /// エントリへのアクセスを返します。
    #[inline(always)]
    pub fn entries(&self) -> DictionaryEntries<'_> {
        DictionaryEntries::new(
            &self.trie,
            self.entries.reader(),
            self.entry_ptrs.reader(),
            self.fields.num_features(),
            self.fields.num_data(),
        )
    }

    /// 表層形に完全一致するエントリのリストを返します。
    pub fn lookup(&self, surface: &str) -> Option<IndexedEntries<'_>> {
        let entries = self.entries();
        self.trie
            .exact_match(surface.as_bytes())
            .map(|v| entries.entry_list(v))
    }

    /// 辞書をバイナリ形式で書き出します。
    ///
    /// # 引数
    ///
    /// * `wtr` - 書き込み先
    ///
    /// # エラー
    ///
    /// 書き込みまたはシリアライズに失敗した場合に[`MorphError`]を返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        let padding_bytes = vec![0xFF; PADDING_LEN];
        wtr.write_all(&padding_bytes)?;

        let bytes = rkyv::to_bytes::<Error>(self).map_err(|e| {
            MorphError::invalid_state("rkyv serialization failed", e.to_string())
        })?;
        wtr.write_all(&bytes)?;
        Ok(())
    }

    /// [`write`](Self::write)で書き出された辞書を読み込みます。
    ///
    /// # 引数
    ///
    /// * `rdr` - 読み込み元
    ///
    /// # エラー
    ///
    /// マジックバイトが一致しない場合や、データの検証に失敗した場合に
    /// [`MorphError`]を返します。トライの構造が壊れている場合は
    /// [`MorphError::InvalidFormat`]、異なるバージョンの辞書には
    /// [`MorphError::NotImplemented`]を返します。
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0; MODEL_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if magic[..] != *MODEL_MAGIC {
            if magic.starts_with(MODEL_MAGIC_PREFIX) {
                return Err(MorphError::not_implemented(format!(
                    "unsupported dictionary format {:?}",
                    String::from_utf8_lossy(&magic).trim_end()
                )));
            }
            return Err(MorphError::invalid_parameter(
                "rdr",
                "The magic number of the input dictionary mismatches.",
            ));
        }

        let mut padding_buf = vec![0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;

        let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let dict = rkyv::from_bytes::<Self, Error>(&aligned_bytes).map_err(|e| {
            MorphError::invalid_state(
                "rkyv validation failed. The dictionary file may be corrupted or incompatible.",
                e.to_string(),
            )
        })?;
        dict.trie.validate()?;
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bad_magic() {
        let data = b"NotADictionary\n\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";
        assert!(Dictionary::read(&data[..]).is_err());
    }

    #[test]
    fn test_read_other_version() {
        let mut data = b"MorphLatticeDic 9.9\n".to_vec();
        data.resize(64, 0);
        assert!(matches!(
            Dictionary::read(data.as_slice()),
            Err(MorphError::NotImplemented(_))
        ));
    }
}
