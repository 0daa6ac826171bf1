//! エラー型の定義
//!
//! このモジュールは、morphlatticeで使用されるすべてのエラー型を定義します。
//! ラティス構築中のエラーは入力単位で扱われ、呼び出し側はその入力の解析を中断します。

use std::error::Error;
use std::fmt;

/// morphlattice専用のResult型
///
/// エラー型としてデフォルトで[`MorphError`]を使用します。
pub type Result<T, E = MorphError> = std::result::Result<T, E>;

/// morphlatticeのエラー型
#[derive(Debug, thiserror::Error)]
pub enum MorphError {
    /// 無効な状態エラー
    ///
    /// エンジン内部の不変条件が破られた場合に発生します。
    /// 現在の入力に対しては回復不能です。
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 無効なパラメータエラー
    ///
    /// 入力データが不正な場合に発生します。
    #[error(transparent)]
    InvalidParameter(InvalidParameterError),

    /// 無効なフォーマットエラー
    ///
    /// 辞書ソースや辞書バイナリの形式が不正な場合に発生します。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 未実装エラー
    ///
    /// サポートされていない辞書形式のバージョンなど、未対応の入力に対して発生します。
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// 整数変換エラー
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// UTF-8エンコーディングエラー
    #[error(transparent)]
    Utf8(std::str::Utf8Error),

    /// I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    #[error(transparent)]
    Rkyv(#[from] rkyv::rancor::Error),
}

impl MorphError {
    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// 無効なパラメータエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - パラメータの名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_parameter<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidParameter(InvalidParameterError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 未実装エラーを生成します
    pub(crate) fn not_implemented<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::NotImplemented(msg.into())
    }

    /// このエラーが[`MorphError::InvalidState`]かどうかを返します。
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

/// パラメータが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidParameterError {
    /// パラメータの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidParameterError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidParameterError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

impl From<std::num::TryFromIntError> for MorphError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::str::Utf8Error> for MorphError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::Utf8(error)
    }
}
