//! 割り当てた部分領域の実データを保持するバッキングストア.
//!
//! [`IntervalAllocator`]は領域の計算のみを担当するので、
//! 実際のバイト列は、このモジュールが提供する[`BackingStore`]実装が保持する.
//!
//! [`IntervalAllocator`]: ../allocator/struct.IntervalAllocator.html
//! [`BackingStore`]: ./trait.BackingStore.html
use crate::{ErrorKind, Result};

pub use self::file::FileBacking;
pub use self::memory::MemoryBacking;

mod file;
mod memory;

/// 固定長のバイト列を保持するバッキングストアを表現するためのトレイト.
///
/// GPUバッファやファイル等、サイズが事前に決まっている記憶領域を抽象化したもの.
pub trait BackingStore {
    /// `offset`の位置に`bytes`を書き込む.
    ///
    /// # Errors
    ///
    /// 書き込み範囲が容量を超えている場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;

    /// `offset`の位置から`buf`の長さ分のバイト列を読み込む.
    ///
    /// # Errors
    ///
    /// 読み込み範囲が容量を超えている場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// 容量(バイト単位)を返す.
    fn capacity(&self) -> u64;

    /// 書き込んだ内容を、下位の記憶領域に同期する.
    ///
    /// 内部的にバッファ管理等を行っておらず、常に内容が同期されている場合には、
    /// このメソッド内で特に何かを行う必要はない。
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// `[offset, offset + len)`が容量内に収まっているかを検査する.
    fn check_range(&self, offset: u64, len: usize) -> Result<()> {
        let end = track_assert_some!(offset.checked_add(len as u64), ErrorKind::InvalidInput);
        track_assert!(
            end <= self.capacity(),
            ErrorKind::InvalidInput,
            "offset={}, len={}, capacity={}",
            offset,
            len,
            self.capacity()
        );
        Ok(())
    }
}
impl<'a, T: BackingStore> BackingStore for &'a mut T {
    fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        (**self).write(offset, bytes)
    }
    fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read(offset, buf)
    }
    fn capacity(&self) -> u64 {
        (**self).capacity()
    }
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
