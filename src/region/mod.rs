//! アロケータとバッキングストアを組み合わせた領域.
//!
//! [`IntervalAllocator`]が決定した位置に対して、実際のデータを
//! [`BackingStore`]に書き込むための薄い層を提供する.
//!
//! [`IntervalAllocator`]: ../allocator/struct.IntervalAllocator.html
//! [`BackingStore`]: ../backing/trait.BackingStore.html
use byteorder::{ByteOrder, LittleEndian};
use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};

use crate::allocator::IntervalAllocator;
use crate::backing::BackingStore;
use crate::metrics::RegionMetrics;
use crate::{ErrorKind, Result};

pub use self::builder::RegionBuilder;

mod builder;

/// 部分領域の割当と、そこへのデータの書き込みを行うための構造体.
///
/// 割当済みの部分領域の記録は保持しないので、
/// 解放時には割当時と同じ`(offset, size)`を利用者が指定する必要がある.
#[derive(Debug)]
pub struct ManagedRegion<B> {
    allocator: IntervalAllocator,
    backing: B,
    default_alignment: u64,
    logger: Logger,
    metrics: RegionMetrics,
}
impl<B> ManagedRegion<B>
where
    B: BackingStore,
{
    /// 新しい`ManagedRegion`インスタンスを生成する.
    ///
    /// ロガーやメトリクス等を設定したい場合には[`RegionBuilder`]を使用すること.
    ///
    /// # Errors
    ///
    /// `backing`の容量が`allocator`の容量よりも小さい場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    ///
    /// [`RegionBuilder`]: ./struct.RegionBuilder.html
    pub fn new(allocator: IntervalAllocator, backing: B) -> Result<Self> {
        let metrics = RegionMetrics::new(&MetricBuilder::new(), allocator.metrics().clone());
        let logger = Logger::root(Discard, o!());
        track!(Self::with_parts(allocator, backing, 1, logger, metrics))
    }

    pub(crate) fn with_parts(
        allocator: IntervalAllocator,
        backing: B,
        default_alignment: u64,
        logger: Logger,
        metrics: RegionMetrics,
    ) -> Result<Self> {
        track_assert!(
            allocator.capacity() <= backing.capacity(),
            ErrorKind::InvalidInput,
            "allocator_capacity={}, backing_capacity={}",
            allocator.capacity(),
            backing.capacity()
        );
        track_assert!(
            default_alignment.is_power_of_two(),
            ErrorKind::InvalidInput,
            "default_alignment={}",
            default_alignment
        );
        info!(logger, "Managed region created";
              "capacity" => allocator.capacity(),
              "backing_capacity" => backing.capacity(),
              "default_alignment" => default_alignment);
        Ok(ManagedRegion {
            allocator,
            backing,
            default_alignment,
            logger,
            metrics,
        })
    }

    /// 管理対象の領域のサイズを返す.
    pub fn capacity(&self) -> u64 {
        self.allocator.capacity()
    }

    /// `*_default`系のメソッドで使用されるアライメントを返す.
    pub fn default_alignment(&self) -> u64 {
        self.default_alignment
    }

    /// `size`バイトの部分領域の割当のみを行う.
    ///
    /// バッキングストアへの書き込みは行われないので、領域の内容は不定となる.
    ///
    /// # Errors
    ///
    /// [`IntervalAllocator::allocate`]と同様.
    ///
    /// [`IntervalAllocator::allocate`]: ../allocator/struct.IntervalAllocator.html#method.allocate
    pub fn allocate(&mut self, size: u64, alignment: u64) -> Result<u64> {
        match self.allocator.allocate(size, alignment) {
            Ok(offset) => {
                debug!(self.logger, "Allocated";
                       "offset" => offset, "size" => size, "alignment" => alignment);
                Ok(offset)
            }
            Err(e) => {
                if *e.kind() == ErrorKind::OutOfSpace {
                    warn!(self.logger, "No available space";
                          "size" => size,
                          "alignment" => alignment,
                          "free_bytes" => self.allocator.free_bytes());
                }
                Err(track!(e))
            }
        }
    }

    /// `size`バイトの部分領域を割り当て、ゼロで埋める.
    ///
    /// 成功した場合には、割り当てた部分領域の開始位置が返される.
    pub fn reserve(&mut self, size: u64, alignment: u64) -> Result<u64> {
        let offset = track!(self.allocate(size, alignment))?;
        let zeros = vec![0; size as usize];
        track!(self.write_or_release(offset, &zeros))?;
        Ok(offset)
    }

    /// `data`を格納するための部分領域を割り当て、そこに`data`を書き込む.
    ///
    /// 成功した場合には、書き込み先の開始位置が返される.
    ///
    /// # Errors
    ///
    /// `data`が空の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    ///
    /// 書き込みに失敗した場合には、割り当てた部分領域は解放された上でエラーが返される.
    pub fn push(&mut self, data: &[u8], alignment: u64) -> Result<u64> {
        let offset = track!(self.allocate(data.len() as u64, alignment))?;
        track!(self.write_or_release(offset, data))?;
        Ok(offset)
    }

    /// `f32`の列をリトルエンディアンで書き込む.
    ///
    /// 頂点データ等の転送を意図したもの.
    pub fn push_f32s(&mut self, values: &[f32], alignment: u64) -> Result<u64> {
        let mut bytes = vec![0; values.len() * 4];
        LittleEndian::write_f32_into(values, &mut bytes);
        track!(self.push(&bytes, alignment))
    }

    /// `u32`の列をリトルエンディアンで書き込む.
    ///
    /// インデックスデータ等の転送を意図したもの.
    pub fn push_u32s(&mut self, values: &[u32], alignment: u64) -> Result<u64> {
        let mut bytes = vec![0; values.len() * 4];
        LittleEndian::write_u32_into(values, &mut bytes);
        track!(self.push(&bytes, alignment))
    }

    /// デフォルトのアライメントで`reserve`を行う.
    pub fn reserve_default(&mut self, size: u64) -> Result<u64> {
        let alignment = self.default_alignment;
        track!(self.reserve(size, alignment))
    }

    /// デフォルトのアライメントで`push`を行う.
    pub fn push_default(&mut self, data: &[u8]) -> Result<u64> {
        let alignment = self.default_alignment;
        track!(self.push(data, alignment))
    }

    /// 割当済みの部分領域`[offset, offset + size)`を解放する.
    ///
    /// バッキングストアの内容は変更されない.
    ///
    /// # パニック
    ///
    /// 未割当の領域が指定された場合には、現在の実行スレッドがパニックする.
    /// 詳細は[`IntervalAllocator::deallocate`]を参照のこと.
    ///
    /// [`IntervalAllocator::deallocate`]: ../allocator/struct.IntervalAllocator.html#method.deallocate
    pub fn free(&mut self, offset: u64, size: u64) {
        self.allocator.deallocate(offset, size);
        debug!(self.logger, "Freed"; "offset" => offset, "size" => size);
    }

    /// `[offset, offset + size)`に格納されているデータを取得する.
    ///
    /// 指定された領域が割当済みかどうかの判定は、このメソッド内では行われない.
    ///
    /// # Errors
    ///
    /// 読み込み範囲がバッキングストアの容量を超えている場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn read(&mut self, offset: u64, size: u64) -> Result<Vec<u8>> {
        // バッファを確保する前に範囲を検査する
        let end = track_assert_some!(offset.checked_add(size), ErrorKind::InvalidInput);
        track_assert!(
            end <= self.backing.capacity(),
            ErrorKind::InvalidInput,
            "offset={}, size={}, capacity={}",
            offset,
            size,
            self.backing.capacity()
        );
        let mut buf = vec![0; size as usize];
        track!(self.backing.read(offset, &mut buf))?;
        Ok(buf)
    }

    /// バッキングストアの内容を同期する.
    pub fn flush(&mut self) -> Result<()> {
        track!(self.backing.flush())
    }

    /// アロケータへの参照を返す.
    pub fn allocator(&self) -> &IntervalAllocator {
        &self.allocator
    }

    /// バッキングストアへの参照を返す.
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// バッキングストアへの可変参照を返す.
    ///
    /// アロケータを経由しない書き込みを行う場合には、
    /// 割当済みの部分領域の範囲を逸脱しないように利用者が注意する必要がある.
    pub fn backing_mut(&mut self) -> &mut B {
        &mut self.backing
    }

    /// バッキングストアを取り出す.
    pub fn into_backing(self) -> B {
        self.backing
    }

    /// 領域のメトリクスを返す.
    pub fn metrics(&self) -> &RegionMetrics {
        &self.metrics
    }

    fn write_or_release(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        if let Err(e) = self.backing.write(offset, bytes) {
            self.metrics.write_failures.increment();
            self.allocator.deallocate(offset, bytes.len() as u64);
            warn!(self.logger, "Write failed; the range was released";
                  "offset" => offset, "size" => bytes.len(), "error" => %e);
            return Err(track!(e));
        }
        self.metrics.written_bytes.add_u64(bytes.len() as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::backing::MemoryBacking;

    #[test]
    fn managed_region_works() -> TestResult {
        let allocator = track!(IntervalAllocator::new(64))?;
        let mut region = track!(ManagedRegion::new(allocator, MemoryBacking::new(64)))?;

        // push
        let foo = track!(region.push(b"foo", 1))?;
        let bar = track!(region.push(b"bar", 4))?;
        assert_eq!(foo, 0);
        assert_eq!(bar, 4);

        // read
        assert_eq!(track!(region.read(foo, 3))?, b"foo");
        assert_eq!(track!(region.read(bar, 3))?, b"bar");

        // free
        region.free(foo, 3);
        assert_eq!(region.allocator().free_bytes(), 61);
        let baz = track!(region.push(b"ba", 1))?;
        assert_eq!(baz, 0);

        assert_eq!(region.metrics().written_bytes(), 8);
        assert_eq!(region.metrics().usage_bytes(), 5);
        assert_eq!(&region.backing().as_bytes()[..7], b"bao\0bar");
        Ok(())
    }

    #[test]
    fn reserve_zero_fills() -> TestResult {
        let mut backing = MemoryBacking::new(32);
        track!(backing.write(0, &[0xFF; 32]))?;

        let allocator = track!(IntervalAllocator::new(32))?;
        let mut region = track!(ManagedRegion::new(allocator, backing))?;
        let offset = track!(region.reserve(8, 8))?;
        assert_eq!(offset, 0);
        assert_eq!(track!(region.read(0, 9))?, [0, 0, 0, 0, 0, 0, 0, 0, 0xFF]);
        Ok(())
    }

    #[test]
    fn typed_push_works() -> TestResult {
        let allocator = track!(IntervalAllocator::new(64))?;
        let mut region = track!(ManagedRegion::new(allocator, MemoryBacking::new(64)))?;

        let pad = track!(region.push(&[1], 1))?;
        let vertices = track!(region.push_f32s(&[1.0, -2.5], 16))?;
        let indices = track!(region.push_u32s(&[1, 0x0102_0304], 4))?;
        assert_eq!(pad, 0);
        assert_eq!(vertices, 16);
        assert_eq!(indices, 4);

        let bytes = track!(region.read(vertices, 8))?;
        assert_eq!(LittleEndian::read_f32(&bytes[..4]), 1.0);
        assert_eq!(LittleEndian::read_f32(&bytes[4..]), -2.5);
        assert_eq!(
            track!(region.read(indices, 8))?,
            [1, 0, 0, 0, 4, 3, 2, 1]
        );
        Ok(())
    }

    #[test]
    fn out_of_space() -> TestResult {
        let allocator = track!(IntervalAllocator::new(8))?;
        let mut region = track!(ManagedRegion::new(allocator, MemoryBacking::new(8)))?;
        track!(region.push(b"12345", 1))?;

        let e = region.push(b"6789", 1).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::OutOfSpace));
        let e = region.push(b"", 1).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        assert_eq!(region.metrics().allocator().nospace_failures(), 1);
        assert_eq!(region.metrics().written_bytes(), 5);
        Ok(())
    }

    #[test]
    fn failed_write_releases_range() -> TestResult {
        let allocator = track!(IntervalAllocator::new(16))?;
        let backing = FlakyBacking {
            inner: MemoryBacking::new(16),
            fail_writes: true,
        };
        let mut region = track!(ManagedRegion::new(allocator, backing))?;

        let e = region.push(b"foo", 1).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::Other));
        assert_eq!(region.allocator().free_bytes(), 16);
        assert_eq!(region.allocator().hole_count(), 1);
        assert_eq!(region.metrics().write_failures(), 1);

        region.backing_mut().fail_writes = false;
        assert_eq!(track!(region.push(b"foo", 1))?, 0);
        assert_eq!(region.into_backing().inner.as_bytes()[..3], b"foo"[..]);
        Ok(())
    }

    #[test]
    fn read_out_of_range() -> TestResult {
        let allocator = track!(IntervalAllocator::new(64))?;
        let mut region = track!(ManagedRegion::new(allocator, MemoryBacking::new(64)))?;
        track!(region.push(b"foo", 1))?;

        let e = region.read(0, u64::max_value()).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        let e = region.read(60, 8).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        let e = region.read(u64::max_value(), 1).err();
        assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));

        assert_eq!(track!(region.read(56, 8))?, [0; 8]);
        Ok(())
    }

    #[test]
    fn borrowed_backing_works() -> TestResult {
        let mut backing = MemoryBacking::new(16);
        {
            let allocator = track!(IntervalAllocator::new(16))?;
            let mut region = track!(ManagedRegion::new(allocator, &mut backing))?;
            assert_eq!(track!(region.push(b"foo", 1))?, 0);
            assert_eq!(track!(region.push_default(b"bar"))?, 3);
            track!(region.flush())?;
        }
        assert_eq!(&backing.as_bytes()[..6], b"foobar");
        Ok(())
    }

    #[test]
    fn backing_too_small() -> TestResult {
        let allocator = track!(IntervalAllocator::new(64))?;
        let result = ManagedRegion::new(allocator, MemoryBacking::new(32));
        assert_eq!(result.err().map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
        Ok(())
    }

    #[derive(Debug)]
    struct FlakyBacking {
        inner: MemoryBacking,
        fail_writes: bool,
    }
    impl BackingStore for FlakyBacking {
        fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
            if self.fail_writes {
                track_panic!(ErrorKind::Other, "write failure injected");
            }
            track!(self.inner.write(offset, bytes))
        }
        fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
            track!(self.inner.read(offset, buf))
        }
        fn capacity(&self) -> u64 {
            self.inner.capacity()
        }
    }
}
