//! 辞書構築のためのビルダー
//!
//! CSV形式の辞書ソースと列定義から、メモリ上の[`Dictionary`]を構築します。
//! 表層形と素性列がすべて同じ行は、1つのエイリアスレコードにまとめられます。

use hashbrown::HashMap;

use crate::dictionary::Dictionary;
use crate::dictionary::entries::{EntryPtr, MAX_DIC_FIELDS};
use crate::dictionary::fields::{FieldInfo, FieldRole, FieldsHolder};
use crate::dictionary::storage::IntStorageWriter;
use crate::dictionary::trie::Trie;
use crate::errors::{MorphError, Result};
use crate::utils::parse_csv_row;

/// 辞書ソースの1列の定義
#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: String,
    role: FieldRole,
    surface: bool,
}

impl FieldSpec {
    /// 素性列を定義します。
    pub fn feature<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            role: FieldRole::Feature,
            surface: false,
        }
    }

    /// データ列を定義します。
    pub fn data<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            role: FieldRole::Data,
            surface: false,
        }
    }

    /// この列を表層形の列にします。
    pub fn surface(mut self) -> Self {
        self.surface = true;
        self
    }
}

#[derive(Default)]
struct StringInterner {
    ids: HashMap<String, i32>,
    strings: Vec<String>,
}

impl StringInterner {
    fn intern(&mut self, s: &str) -> Result<i32> {
        if let Some(&id) = self.ids.get(s) {
            return Ok(id);
        }
        let id = i32::try_from(self.strings.len())?;
        self.ids.insert(s.to_string(), id);
        self.strings.push(s.to_string());
        Ok(id)
    }
}

struct EntryGroup {
    features: Vec<i32>,
    rows: Vec<Vec<i32>>,
}

/// CSVから[`Dictionary`]を構築するビルダー
///
/// # 例
///
/// ```
/// use morphlattice::dictionary::{DictionaryBuilder, FieldSpec};
///
/// let mut builder = DictionaryBuilder::new(vec![
///     FieldSpec::feature("surface").surface(),
///     FieldSpec::feature("pos"),
///     FieldSpec::data("reading"),
/// ])?;
/// builder.read_csv("東京,名詞,トウキョウ\n京都,名詞,キョウト")?;
/// let dict = builder.build()?;
/// assert!(dict.lookup("東京").is_some());
/// # Ok::<(), morphlattice::errors::MorphError>(())
/// ```
pub struct DictionaryBuilder {
    specs: Vec<FieldSpec>,
    interners: Vec<StringInterner>,
    /// 列番号から素性行またはデータ行内の位置への対応
    positions: Vec<usize>,
    surface_col: usize,
    num_features: usize,
    num_data: usize,
    groups: Vec<EntryGroup>,
    group_index: HashMap<Vec<i32>, usize>,
}

impl DictionaryBuilder {
    /// 列定義からビルダーを作成します。
    ///
    /// # エラー
    ///
    /// 表層形の列がちょうど1つの素性列でない場合、
    /// または列が多すぎる場合に[`MorphError`]を返します。
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self> {
        let mut surfaces = specs.iter().enumerate().filter(|(_, s)| s.surface);
        let surface_col = match (surfaces.next(), surfaces.next()) {
            (Some((i, spec)), None) if spec.role == FieldRole::Feature => i,
            _ => {
                return Err(MorphError::invalid_parameter(
                    "specs",
                    "exactly one feature column must be marked as the surface",
                ));
            }
        };
        let mut num_features = 0;
        let mut num_data = 0;
        let mut positions = Vec::with_capacity(specs.len());
        for spec in &specs {
            let counter = match spec.role {
                FieldRole::Feature => &mut num_features,
                FieldRole::Data => &mut num_data,
            };
            positions.push(*counter);
            *counter += 1;
        }
        if num_features > MAX_DIC_FIELDS || num_data > MAX_DIC_FIELDS {
            return Err(MorphError::invalid_parameter(
                "specs",
                format!("at most {MAX_DIC_FIELDS} feature and data columns are supported"),
            ));
        }
        let interners = specs.iter().map(|_| StringInterner::default()).collect();
        Ok(Self {
            specs,
            interners,
            positions,
            surface_col,
            num_features,
            num_data,
            groups: vec![],
            group_index: HashMap::new(),
        })
    }

    /// 1行分の列を追加します。
    pub fn add_row<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        if columns.len() != self.specs.len() {
            return Err(MorphError::invalid_format(
                "row",
                format!(
                    "expected {} columns, found {}",
                    self.specs.len(),
                    columns.len()
                ),
            ));
        }
        if columns[self.surface_col].as_ref().is_empty() {
            return Err(MorphError::invalid_format("row", "surface must not be empty"));
        }
        let mut features = vec![0; self.num_features];
        let mut data = vec![0; self.num_data];
        for (col, value) in columns.iter().enumerate() {
            let id = self.interners[col].intern(value.as_ref())?;
            match self.specs[col].role {
                FieldRole::Feature => features[self.positions[col]] = id,
                FieldRole::Data => data[self.positions[col]] = id,
            }
        }
        match self.group_index.get(&features) {
            Some(&idx) => {
                // Without data columns all rows of a group are identical.
                if self.num_data != 0 {
                    self.groups[idx].rows.push(data);
                }
            }
            None => {
                self.group_index.insert(features.clone(), self.groups.len());
                self.groups.push(EntryGroup {
                    features,
                    rows: vec![data],
                });
            }
        }
        Ok(())
    }

    /// CSVテキストを読み込みます。空行は無視されます。
    ///
    /// # エラー
    ///
    /// 行の形式が不正な場合、行番号付きの[`MorphError`]を返します。
    pub fn read_csv(&mut self, text: &str) -> Result<()> {
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let columns = parse_csv_row(line)?;
            self.add_row(&columns).map_err(|e| {
                MorphError::invalid_format("csv", format!("line {}: {e}", lineno + 1))
            })?;
        }
        Ok(())
    }

    /// 辞書を構築します。
    pub fn build(self) -> Result<Dictionary> {
        let surface_pos = self.positions[self.surface_col];
        let mut entries = IntStorageWriter::new();
        let mut by_surface: HashMap<i32, Vec<EntryPtr>> = HashMap::new();
        for group in &self.groups {
            let offset = entries.put_all(&group.features);
            let ptr = if group.rows.len() == 1 {
                entries.put_all(&group.rows[0]);
                EntryPtr::dic(offset, false)?
            } else {
                entries.put(i32::try_from(group.rows.len())?);
                for row in &group.rows {
                    entries.put_all(row);
                }
                EntryPtr::dic(offset, true)?
            };
            by_surface
                .entry(group.features[surface_pos])
                .or_default()
                .push(ptr);
        }

        let surface_strings = &self.interners[self.surface_col].strings;
        let mut entry_ptrs = IntStorageWriter::new();
        let mut records = Vec::with_capacity(by_surface.len());
        let mut surfaces: Vec<_> = by_surface.into_iter().collect();
        surfaces.sort_unstable_by_key(|(id, _)| *id);
        for (id, mut ptrs) in surfaces {
            ptrs.sort_unstable();
            let raws: Vec<i32> = ptrs.iter().map(|p| p.raw()).collect();
            let offset = u32::try_from(entry_ptrs.put_cumulative_list(&raws))?;
            records.push((surface_strings[id as usize].as_bytes(), offset));
        }
        let trie = Trie::from_records(&records)?;
        let num_surfaces = records.len();

        let mut fields = Vec::with_capacity(self.specs.len());
        for ((spec, interner), &position) in self
            .specs
            .into_iter()
            .zip(self.interners)
            .zip(&self.positions)
        {
            let mut info = FieldInfo::new(spec.name, spec.role, spec.surface, position);
            info.set_strings(interner.strings);
            fields.push(info);
        }

        log::debug!(
            "built dictionary: {} entries, {} surfaces, {} trie nodes",
            self.groups.len(),
            num_surfaces,
            trie.num_nodes()
        );

        Ok(Dictionary {
            fields: FieldsHolder::new(fields),
            trie,
            entries: entries.build(),
            entry_ptrs: entry_ptrs.build(),
        })
    }
}
