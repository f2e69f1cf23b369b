//! Sub-allocator for pre-sized storage buffers.
//!
//! `subbuf`は、サイズが固定された線形アドレス空間(e.g., GPUのストレージバッファ)を、
//! 可変長の部分領域に切り分けて利用するためのcrate.
//!
//! # 特徴
//!
//! - 空き領域("hole")群を、サイズ順とオフセット順の二つのインデックスで管理する
//! - アライメント指定付きの割当をサポート
//! - 解放時には、隣接する空き領域が即座に結合される
//! - 整数インデックスでアクセス可能な、O(1)で再利用可能なオブジェクトプール([SlotStore])も提供
//!
//! # モジュールの依存関係
//!
//! ```text
//! region => allocator
//!        => backing
//! slot
//! ```
//!
//! - [region]モジュール:
//!   - 主に[ManagedRegion]構造体を提供
//!   - アロケータと、実際のバイト列を保持する[BackingStore]実装を組み合わせる
//! - [allocator]モジュール:
//!   - 主に[IntervalAllocator]構造体を提供
//!   - 領域の計算処理のみを担当し、実際のデータの読み書きを行うことは無い
//! - [backing]モジュール:
//!   - [BackingStore]トレイトと、そのメモリ/ファイル実装を提供
//! - [slot]モジュール:
//!   - [SlotStore]および、それを利用した連結リストである[IndexedList]を提供
//!
//! [region]: ./region/index.html
//! [ManagedRegion]: ./region/struct.ManagedRegion.html
//! [allocator]: ./allocator/index.html
//! [IntervalAllocator]: ./allocator/struct.IntervalAllocator.html
//! [backing]: ./backing/index.html
//! [BackingStore]: ./backing/trait.BackingStore.html
//! [slot]: ./slot/index.html
//! [SlotStore]: ./slot/struct.SlotStore.html
//! [IndexedList]: ./slot/struct.IndexedList.html
#![warn(missing_docs)]
extern crate byteorder;
extern crate prometrics;
#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempdir;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate slog;

pub use crate::error::{Error, ErrorKind};

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e: ::std::io::Error| track!(crate::Error::from(e)))
    };
}

pub mod allocator;
pub mod backing;
pub mod metrics;
pub mod region;
pub mod slot;

mod error;

/// crate固有の`Result`型.
pub type Result<T> = std::result::Result<T, Error>;
