//! 辞書の列定義
//!
//! 各列は素性列またはデータ列のいずれかです。素性列の値はエントリの素性値として
//! ラティスのノードに載り、データ列の値は出力時にだけ参照されます。
//! 列の値はすべて列ごとの文字列表へのインデックスとして格納されます。

use rkyv::{Archive, Deserialize, Serialize};

/// 列の役割
#[derive(Clone, Copy, Eq, PartialEq, Debug, Archive, Serialize, Deserialize)]
pub enum FieldRole {
    /// 素性列
    Feature,
    /// データ列
    Data,
}

/// 辞書の1列の情報
#[derive(Clone, Debug, Archive, Serialize, Deserialize)]
pub struct FieldInfo {
    name: String,
    role: FieldRole,
    surface: bool,
    /// 素性行またはデータ行の中での位置
    position: u32,
    strings: Vec<String>,
}

impl FieldInfo {
    pub(crate) fn new(name: String, role: FieldRole, surface: bool, position: usize) -> Self {
        Self {
            name,
            role,
            surface,
            position: position as u32,
            strings: vec![],
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn role(&self) -> FieldRole {
        self.role
    }

    /// この列が表層形を保持するかどうか
    #[inline(always)]
    pub fn is_surface(&self) -> bool {
        self.surface
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position as usize
    }

    /// 値に対応する文字列を返します。
    ///
    /// 未知語ノードの表層形ハッシュのような負の値には`None`を返します。
    pub fn string_of(&self, value: i32) -> Option<&str> {
        let idx = usize::try_from(value).ok()?;
        self.strings.get(idx).map(String::as_str)
    }

    pub(crate) fn set_strings(&mut self, strings: Vec<String>) {
        self.strings = strings;
    }

    pub fn num_strings(&self) -> usize {
        self.strings.len()
    }
}

/// 辞書の全列の情報
#[derive(Clone, Debug, Default, Archive, Serialize, Deserialize)]
pub struct FieldsHolder {
    fields: Vec<FieldInfo>,
}

impl FieldsHolder {
    pub(crate) fn new(fields: Vec<FieldInfo>) -> Self {
        Self { fields }
    }

    #[inline(always)]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 素性行の`position`番目に対応する列を返します。
    pub fn feature_field(&self, position: usize) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Feature && f.position() == position)
    }

    /// データ行の`position`番目に対応する列を返します。
    pub fn data_field(&self, position: usize) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Data && f.position() == position)
    }

    /// 表層形の列
    pub fn surface_field(&self) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.surface)
    }

    pub fn num_features(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Feature)
            .count()
    }

    pub fn num_data(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Data)
            .count()
    }

    /// 列名と値から文字列を引きます。
    pub fn string_of(&self, field: &str, value: i32) -> Option<&str> {
        self.field_by_name(field)?.string_of(value)
    }
}
