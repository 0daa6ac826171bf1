//! 可変長整数ストレージ
//!
//! 辞書エントリの素性値やエントリポインタのリストを、
//! ジグザグ符号化したLEB128形式のバイト列として保持します。
//! 読み出しは境界チェック付きで、途中で途切れたデータは読み出し失敗として扱います。

use rkyv::{Archive, Deserialize, Serialize};

/// 1つの整数が占める最大バイト数
const MAX_VARINT_BYTES: usize = 5;

#[inline(always)]
const fn zigzag_encode(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

#[inline(always)]
const fn zigzag_decode(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

/// 符号化済みの整数列
#[derive(Default, Clone, Debug, Archive, Serialize, Deserialize)]
pub struct IntStorage {
    data: Vec<u8>,
}

impl IntStorage {
    /// 読み出し用のビューを返します。
    #[inline(always)]
    pub fn reader(&self) -> IntStorageReader<'_> {
        IntStorageReader { data: &self.data }
    }

    #[inline(always)]
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }
}

/// [`IntStorage`]を構築するライター
#[derive(Default)]
pub struct IntStorageWriter {
    data: Vec<u8>,
}

impl IntStorageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次に書き込まれる値のバイトオフセット
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// 整数を1つ書き込みます。
    pub fn put(&mut self, value: i32) {
        let mut v = zigzag_encode(value);
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.data.push(byte);
                break;
            }
            self.data.push(byte | 0x80);
        }
    }

    /// 整数列を長さなしで書き込み、先頭のオフセットを返します。
    pub fn put_all(&mut self, values: &[i32]) -> usize {
        let offset = self.position();
        for &v in values {
            self.put(v);
        }
        offset
    }

    /// 長さを先頭に付けた差分符号化リストを書き込み、先頭のオフセットを返します。
    ///
    /// 読み出しには[`IntListTraversal::read_one_cumulative`]を使います。
    pub fn put_cumulative_list(&mut self, values: &[i32]) -> usize {
        let offset = self.position();
        self.put(values.len() as i32);
        let mut last = 0i32;
        for &v in values {
            self.put(v.wrapping_sub(last));
            last = v;
        }
        offset
    }

    pub fn build(self) -> IntStorage {
        IntStorage { data: self.data }
    }
}

/// [`IntStorage`]の読み出し用ビュー
#[derive(Clone, Copy, Debug)]
pub struct IntStorageReader<'a> {
    data: &'a [u8],
}

impl<'a> IntStorageReader<'a> {
    /// `offset`から最大`count`個の整数を読み出すトラバーサを返します。
    ///
    /// `offset`がストレージの外を指す場合、何も読み出せないトラバーサを返します。
    pub fn raw_with_limit(&self, offset: usize, count: usize) -> IntListTraversal<'a> {
        let data = self.data.get(offset..).unwrap_or(&[]);
        IntListTraversal::new(data, count)
    }

    /// `offset`にある長さ付きリストのトラバーサを返します。
    pub fn list_at(&self, offset: usize) -> IntListTraversal<'a> {
        let mut header = self.raw_with_limit(offset, 1);
        let mut len = 0;
        if !header.read_one(&mut len) || len < 0 {
            return IntListTraversal::new(&[], 0);
        }
        let start = offset + header.num_read_bytes();
        self.raw_with_limit(start, len as usize)
    }
}

/// 整数列の前方向カーソル
///
/// コピー可能で、複数の利用者が独立に読み進めることができます。
#[derive(Clone, Copy, Debug, Default)]
pub struct IntListTraversal<'a> {
    data: &'a [u8],
    pos: usize,
    size: usize,
    remaining: usize,
    last: i32,
    did_read: bool,
}

impl<'a> IntListTraversal<'a> {
    fn new(data: &'a [u8], size: usize) -> Self {
        Self {
            data,
            pos: 0,
            size,
            remaining: size,
            last: 0,
            did_read: false,
        }
    }

    fn decode(&mut self) -> Option<i32> {
        let mut result = 0u32;
        let mut shift = 0;
        for i in 0..MAX_VARINT_BYTES {
            let byte = *self.data.get(self.pos + i)?;
            result |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                self.pos += i + 1;
                return Some(zigzag_decode(result));
            }
            shift += 7;
        }
        None
    }

    /// 整数を1つ読み出します。残りがない場合やデータが途切れている場合は`false`を返します。
    pub fn read_one(&mut self, result: &mut i32) -> bool {
        if self.remaining == 0 {
            return false;
        }
        match self.decode() {
            Some(v) => {
                *result = v;
                self.remaining -= 1;
                self.did_read = true;
                true
            }
            None => {
                self.remaining = 0;
                false
            }
        }
    }

    /// 差分符号化された値を1つ読み出し、累積値を`result`に格納します。
    pub fn read_one_cumulative(&mut self, result: &mut i32) -> bool {
        let mut delta = 0;
        if !self.read_one(&mut delta) {
            return false;
        }
        self.last = self.last.wrapping_add(delta);
        *result = self.last;
        true
    }

    /// 最大`count`個の整数を`out`に読み出し、読み出せた個数を返します。
    pub fn fill(&mut self, out: &mut [i32], count: usize) -> usize {
        let count = count.min(out.len());
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            if !self.read_one(slot) {
                return i;
            }
        }
        count
    }

    /// これまでに読み出したバイト数
    #[inline(always)]
    pub fn num_read_bytes(&self) -> usize {
        self.pos
    }

    /// リスト全体の要素数
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// 未読の要素数
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    #[inline(always)]
    pub fn did_read(&self) -> bool {
        self.did_read
    }

    /// 要素数0のリストにします。
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
