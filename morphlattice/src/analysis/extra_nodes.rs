//! 解析ごとに生成される追加ノード
//!
//! 未知語ノードとエイリアスノードは辞書に存在しないため、解析ごとの領域に
//! 素性行を持ちます。これらは負の[`EntryPtr`]で参照されます。

use std::ops::Range;

use crate::dictionary::entries::EntryPtr;

/// 追加ノードの種類
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ExtraNodeKind {
    /// 未知語ノード
    Unknown,
    /// 同じ素性射影を持つノード群を代表するエイリアスノード
    Alias,
}

/// 追加ノード
#[derive(Clone, Debug)]
pub struct ExtraNode {
    kind: ExtraNodeKind,
    ptr: EntryPtr,
    /// 未知語ノードの場合は元となったテンプレートエントリ
    template: EntryPtr,
    content_hash: i32,
    span: Range<usize>,
    members: Range<usize>,
}

impl ExtraNode {
    #[inline(always)]
    pub fn kind(&self) -> ExtraNodeKind {
        self.kind
    }

    #[inline(always)]
    pub fn ptr(&self) -> EntryPtr {
        self.ptr
    }

    #[inline(always)]
    pub fn template(&self) -> EntryPtr {
        self.template
    }

    /// 表層形のハッシュ値。未知語ノードでは常に負です。
    #[inline(always)]
    pub fn content_hash(&self) -> i32 {
        self.content_hash
    }

    /// 入力中の文字位置の範囲
    #[inline(always)]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// 追加ノードの領域
///
/// 解析のたびに[`reset`](Self::reset)され、確保済みの領域は再利用されます。
#[derive(Default)]
pub struct ExtraNodesContext {
    num_features: usize,
    num_placeholders: usize,
    nodes: Vec<ExtraNode>,
    features: Vec<i32>,
    placeholders: Vec<i32>,
    members: Vec<EntryPtr>,
}

impl ExtraNodesContext {
    pub fn new(num_features: usize, num_placeholders: usize) -> Self {
        let mut ctx = Self::default();
        ctx.reset(num_features, num_placeholders);
        ctx
    }

    pub fn reset(&mut self, num_features: usize, num_placeholders: usize) {
        self.num_features = num_features;
        self.num_placeholders = num_placeholders;
        self.nodes.clear();
        self.features.clear();
        self.placeholders.clear();
        self.members.clear();
    }

    #[inline(always)]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn push_node(&mut self, mut node: ExtraNode, features: &[i32]) -> EntryPtr {
        debug_assert_eq!(features.len(), self.num_features);
        let ptr = EntryPtr::special(self.nodes.len() as u32);
        node.ptr = ptr;
        self.nodes.push(node);
        self.features.extend_from_slice(features);
        self.placeholders
            .extend(std::iter::repeat_n(0, self.num_placeholders));
        ptr
    }

    /// 未知語ノードを作成します。
    pub fn make_unk(
        &mut self,
        template: EntryPtr,
        features: &[i32],
        span: Range<usize>,
        content_hash: i32,
    ) -> EntryPtr {
        debug_assert!(content_hash < 0);
        let node = ExtraNode {
            kind: ExtraNodeKind::Unknown,
            ptr: EntryPtr::default(),
            template,
            content_hash,
            span,
            members: 0..0,
        };
        self.push_node(node, features)
    }

    /// エイリアスノードを作成します。
    ///
    /// # 引数
    ///
    /// * `features` - 代表の素性行
    /// * `members` - まとめられた元のエントリ
    /// * `span` - 元のノードの文字位置の範囲
    pub fn make_alias(
        &mut self,
        features: &[i32],
        members: &[EntryPtr],
        span: Range<usize>,
    ) -> EntryPtr {
        let start = self.members.len();
        self.members.extend_from_slice(members);
        let node = ExtraNode {
            kind: ExtraNodeKind::Alias,
            ptr: EntryPtr::default(),
            template: EntryPtr::default(),
            content_hash: 0,
            span,
            members: start..self.members.len(),
        };
        self.push_node(node, features)
    }

    /// ポインタが指す追加ノードを返します。
    pub fn node(&self, ptr: EntryPtr) -> Option<&ExtraNode> {
        if !ptr.is_special() {
            return None;
        }
        self.nodes.get(ptr.extra_index())
    }

    /// 追加ノードの素性行を返します。
    pub fn features(&self, ptr: EntryPtr) -> Option<&[i32]> {
        self.node(ptr)?;
        let start = ptr.extra_index() * self.num_features;
        Some(&self.features[start..start + self.num_features])
    }

    /// エイリアスノードがまとめたエントリを返します。
    pub fn alias_members(&self, ptr: EntryPtr) -> &[EntryPtr] {
        match self.node(ptr) {
            Some(node) => &self.members[node.members.clone()],
            None => &[],
        }
    }

    /// プレースホルダ値を設定します。
    pub fn put_placeholder(&mut self, ptr: EntryPtr, idx: usize, value: i32) {
        debug_assert!(idx < self.num_placeholders);
        if self.node(ptr).is_some() && idx < self.num_placeholders {
            self.placeholders[ptr.extra_index() * self.num_placeholders + idx] = value;
        }
    }

    pub fn placeholder(&self, ptr: EntryPtr, idx: usize) -> Option<i32> {
        self.node(ptr)?;
        if idx >= self.num_placeholders {
            return None;
        }
        Some(self.placeholders[ptr.extra_index() * self.num_placeholders + idx])
    }
}
