//! 文字種の定義
//!
//! 解析エンジンは文字種を「位置ごとの真偽値の述語」としてのみ扱います。
//! ここでは閉じた文字種の集合と、Unicodeの範囲に基づく既定の分類表を提供します。

use std::fmt;

/// 文字種
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[repr(u8)]
pub enum CharClass {
    Space = 0,
    Ideographic,
    Hiragana,
    Katakana,
    FullwidthLatin,
    Latin,
    Digit,
    FullwidthDigit,
    Symbol,
    Other,
}

impl CharClass {
    /// 全文字種
    pub const ALL: [CharClass; 10] = [
        CharClass::Space,
        CharClass::Ideographic,
        CharClass::Hiragana,
        CharClass::Katakana,
        CharClass::FullwidthLatin,
        CharClass::Latin,
        CharClass::Digit,
        CharClass::FullwidthDigit,
        CharClass::Symbol,
        CharClass::Other,
    ];

    #[inline(always)]
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// 名前から文字種を取得します。
    pub fn from_name(name: &str) -> Option<Self> {
        let cls = match name {
            "SPACE" => Self::Space,
            "KANJI" | "IDEOGRAPHIC" => Self::Ideographic,
            "HIRAGANA" => Self::Hiragana,
            "KATAKANA" => Self::Katakana,
            "FULLWIDTH_LATIN" => Self::FullwidthLatin,
            "LATIN" | "ALPHA" => Self::Latin,
            "DIGIT" | "NUMERIC" => Self::Digit,
            "FULLWIDTH_DIGIT" => Self::FullwidthDigit,
            "SYMBOL" => Self::Symbol,
            "OTHER" | "DEFAULT" => Self::Other,
            _ => return None,
        };
        Some(cls)
    }
}

/// 文字種の集合
///
/// 1文字が複数の文字種に属することがあります（例: 長音記号「ー」はカタカナかつ記号）。
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct CharClassSet(u32);

impl CharClassSet {
    /// 空の集合
    pub const EMPTY: Self = Self(0);

    #[inline(always)]
    pub const fn with(self, cls: CharClass) -> Self {
        Self(self.0 | cls.bit())
    }

    #[inline(always)]
    pub const fn has_class(self, cls: CharClass) -> bool {
        self.0 & cls.bit() != 0
    }

    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl From<CharClass> for CharClassSet {
    fn from(cls: CharClass) -> Self {
        Self(cls.bit())
    }
}

impl fmt::Debug for CharClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(CharClass::ALL.iter().filter(|c| self.has_class(**c)))
            .finish()
    }
}

/// 文字種の分類を行うサービス
///
/// 分類表は外部で定義されるため、解析器はこのトレイトを通してのみ文字種を参照します。
pub trait CharClassifier: Send + Sync {
    /// 文字`c`の文字種集合を返します。
    fn classify(&self, c: char) -> CharClassSet;
}

/// Unicodeの範囲に基づく既定の文字種分類表
#[derive(Clone, Debug)]
pub struct CharProperty {
    ranges: Vec<(char, char, CharClassSet)>,
}

impl Default for CharProperty {
    fn default() -> Self {
        use CharClass::*;
        let ranges = vec![
            ('\u{0009}', '\u{000d}', Space.into()),
            ('\u{0020}', '\u{0020}', Space.into()),
            ('\u{3000}', '\u{3000}', Space.into()),
            ('0', '9', Digit.into()),
            ('A', 'Z', Latin.into()),
            ('a', 'z', Latin.into()),
            ('\u{0021}', '\u{002f}', Symbol.into()),
            ('\u{003a}', '\u{0040}', Symbol.into()),
            ('\u{005b}', '\u{0060}', Symbol.into()),
            ('\u{007b}', '\u{007e}', Symbol.into()),
            ('\u{3001}', '\u{303f}', Symbol.into()),
            ('\u{3041}', '\u{309f}', Hiragana.into()),
            ('\u{30a1}', '\u{30fa}', Katakana.into()),
            ('\u{30fc}', '\u{30fc}', CharClassSet::from(Katakana).with(Symbol)),
            ('\u{31f0}', '\u{31ff}', Katakana.into()),
            ('\u{ff66}', '\u{ff9f}', Katakana.into()),
            ('\u{3400}', '\u{4dbf}', Ideographic.into()),
            ('\u{4e00}', '\u{9fff}', Ideographic.into()),
            ('\u{f900}', '\u{faff}', Ideographic.into()),
            ('\u{ff10}', '\u{ff19}', FullwidthDigit.into()),
            ('\u{ff21}', '\u{ff3a}', FullwidthLatin.into()),
            ('\u{ff41}', '\u{ff5a}', FullwidthLatin.into()),
        ];
        Self { ranges }
    }
}

impl CharProperty {
    /// 範囲のリストから分類表を作成します。
    ///
    /// 範囲が重なる場合、文字種集合は合併されます。
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, char, CharClassSet)>,
    {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }
}

impl CharClassifier for CharProperty {
    fn classify(&self, c: char) -> CharClassSet {
        let mut set = CharClassSet::EMPTY;
        for &(lo, hi, cls) in &self.ranges {
            if lo <= c && c <= hi {
                set = CharClassSet(set.0 | cls.0);
            }
        }
        if set == CharClassSet::EMPTY {
            set = CharClass::Other.into();
        }
        set
    }
}
