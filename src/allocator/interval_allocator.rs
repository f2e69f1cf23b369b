//! Interval Allocator.

use prometrics::metrics::MetricBuilder;
use std::collections::BTreeSet;
use std::collections::Bound::{Excluded, Included, Unbounded};

use super::hole::{Hole, OffsetBasedHole, SizeBasedHole};
use crate::metrics::AllocatorMetrics;
use crate::{ErrorKind, Result};

/// 固定長の線形領域`[0, capacity)`用のアロケータ.
///
/// 指定された容量を有する領域から、利用者が要求したサイズの部分領域の割当を担当する.
///
/// この実装自体は、完全にメモリ上のデータ構造であり、
/// 割り当てた領域の中身を読み書きすることは無い.
///
/// # 割当戦略
///
/// 空き領域("hole")は、サイズ順とオフセット順の二つのインデックスで管理されている.
///
/// 新規割当要求が発行された際には、サイズ順のインデックスを、
/// 要求サイズ以上の最小の空き領域から昇順に走査し、
/// アライメントのためのパディングを加えても要求を満たせる最初の空き領域が選択される.
///
/// そのため、純粋な"BestFit"とは異なり、パディングを吸収できない小さな空き領域よりも、
/// 後続の大きな空き領域が選ばれることがある.
///
/// 選択された空き領域のうち、パディング部分と、割当後の余剰分は、再び空き領域として戻される.
///
/// 解放された領域は、前後に隣接する空き領域と即座に結合される.
#[derive(Debug)]
pub struct IntervalAllocator {
    size_to_hole: BTreeSet<SizeBasedHole>,
    offset_to_hole: BTreeSet<OffsetBasedHole>,
    free_bytes: u64,
    metrics: AllocatorMetrics,
}
impl IntervalAllocator {
    /// `capacity`バイトの領域を管理するアロケータを構築する.
    ///
    /// # Errors
    ///
    /// `capacity`が`0`の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    ///
    /// # Examples
    ///
    /// ```
    /// use subbuf::allocator::IntervalAllocator;
    ///
    /// let mut allocator = IntervalAllocator::new(100).unwrap();
    /// assert_eq!(allocator.allocate(10, 1).ok(), Some(0));
    /// assert_eq!(allocator.allocate(20, 1).ok(), Some(10));
    /// ```
    pub fn new(capacity: u64) -> Result<Self> {
        let metrics = AllocatorMetrics::new(&MetricBuilder::new(), capacity);
        track!(Self::with_metrics(metrics))
    }

    /// アロケータを構築する.
    ///
    /// アロケータが管理する領域のサイズ（キャパシティ）の情報は、`metrics`から取得される.
    pub fn with_metrics(metrics: AllocatorMetrics) -> Result<Self> {
        let capacity = metrics.capacity;
        track_assert!(capacity > 0, ErrorKind::InvalidInput);

        let mut allocator = IntervalAllocator {
            size_to_hole: BTreeSet::new(),
            offset_to_hole: BTreeSet::new(),
            free_bytes: capacity,
            metrics,
        };
        allocator.add_hole(Hole::new(0, capacity));
        Ok(allocator)
    }

    /// 管理対象の領域のサイズを返す.
    pub fn capacity(&self) -> u64 {
        self.metrics.capacity
    }

    /// 空き領域の合計サイズを返す.
    pub fn free_bytes(&self) -> u64 {
        self.free_bytes
    }

    /// 空き領域の数を返す.
    pub fn hole_count(&self) -> usize {
        self.offset_to_hole.len()
    }

    /// 最大の空き領域を返す.
    ///
    /// アライメントが`1`であれば、これが一度に割当可能な最大サイズとなる.
    pub fn largest_hole(&self) -> Option<Hole> {
        self.size_to_hole.iter().next_back().map(|h| h.0)
    }

    /// 空き領域群を開始位置の昇順に返す.
    pub fn holes(&self) -> impl Iterator<Item = Hole> + '_ {
        self.offset_to_hole.iter().map(|h| h.0)
    }

    /// `size`バイトの部分領域の割当を行う.
    ///
    /// 成功した場合には、割り当てた部分領域の開始位置が返される.
    /// 開始位置は必ず`alignment`の倍数となる.
    ///
    /// # Errors
    ///
    /// 以下の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される:
    ///
    /// - `size`が`0`
    /// - `alignment`が2の冪ではない
    ///
    /// 十分な空き領域が存在しない場合には、種類が`ErrorKind::OutOfSpace`のエラーが返される.
    ///
    /// いずれの場合も、アロケータの状態は変更されない.
    pub fn allocate(&mut self, size: u64, alignment: u64) -> Result<u64> {
        track_assert!(size > 0, ErrorKind::InvalidInput);
        track_assert!(
            alignment.is_power_of_two(),
            ErrorKind::InvalidInput,
            "alignment={}",
            alignment
        );

        let key = SizeBasedHole(Hole::new(0, size));
        let found = self
            .size_to_hole
            // `SizeBasedHole`の全順序を用いて、サイズが`size`以上の空き領域のみを走査する
            .range((Included(&key), Unbounded))
            .find_map(|h| h.0.fit(size, alignment).map(|padding| (h.0, padding)));
        let (hole, padding) = match found {
            Some(found) => found,
            None => {
                self.metrics.nospace_failures.increment();
                track_panic!(
                    ErrorKind::OutOfSpace,
                    "size={}, alignment={}, free_bytes={}",
                    size,
                    alignment,
                    self.free_bytes
                );
            }
        };

        self.delete_hole(hole);
        if padding > 0 {
            self.add_hole(Hole::new(hole.offset, padding));
        }
        let rest = hole.size - padding - size;
        if rest > 0 {
            self.add_hole(Hole::new(hole.offset + padding + size, rest));
        }
        self.free_bytes -= size;
        self.metrics.count_allocation(size);
        Ok(hole.offset + padding)
    }

    /// 割当済みの部分領域`[offset, offset + size)`の解放を行う.
    ///
    /// 前後に隣接する空き領域が存在する場合には、それらと結合される.
    ///
    /// # 事前条件
    ///
    /// - `[offset, offset + size)`は「以前に割当済み」かつ「未解放」の部分領域である
    ///
    /// # Panics
    ///
    /// 以下の場合には、現在のスレッドがパニックする:
    ///
    /// - `size`が`0`
    /// - 領域の終端が`capacity`を超えている
    /// - 領域が既存の空き領域と重なっている (e.g., 二重解放)
    ///
    /// なお、割当時とは異なるサイズが指定された場合でも、
    /// 空き領域と重ならない限りは検出されない.
    pub fn deallocate(&mut self, offset: u64, size: u64) {
        assert!(size > 0, "Zero sized range: offset={}", offset);
        assert!(
            offset
                .checked_add(size)
                .map_or(false, |end| end <= self.capacity()),
            "Out of range: offset={}, size={}, capacity={}",
            offset,
            size,
            self.capacity()
        );
        assert!(
            self.is_allocated_range(offset, size),
            "Overlaps a hole: offset={}, size={}",
            offset,
            size
        );

        self.metrics.count_release(size);
        self.free_bytes += size;
        let hole = self.merge_holes_if_possible(Hole::new(offset, size));
        self.add_hole(hole);
    }

    /// アロケータ用のメトリクスを返す.
    pub fn metrics(&self) -> &AllocatorMetrics {
        &self.metrics
    }

    // 二つのインデックスの更新は、必ずこのメソッドと`delete_hole`を経由して行う.
    fn add_hole(&mut self, hole: Hole) {
        assert!(self.size_to_hole.insert(SizeBasedHole(hole)));
        assert!(self.offset_to_hole.insert(OffsetBasedHole(hole)));
        self.metrics.inserted_holes.increment();
    }

    fn delete_hole(&mut self, hole: Hole) {
        assert!(self.size_to_hole.remove(&SizeBasedHole(hole)));
        assert!(self.offset_to_hole.remove(&OffsetBasedHole(hole)));
        self.metrics.removed_holes.increment();
    }

    // `hole`と隣接する領域がインデックス内に存在する場合には、それらをまとめてしまう.
    fn merge_holes_if_possible(&mut self, mut hole: Hole) -> Hole {
        // `hole`の直前に位置する空き領域`prev`を探す。
        // `prev`の終端が`hole`の始端と一致するなら、 prev hole の並びでmerge可能である。
        let key = OffsetBasedHole(Hole::new(hole.offset, 0));
        if let Some(prev) = self
            .offset_to_hole
            .range((Unbounded, Excluded(&key)))
            .next_back()
            .map(|h| h.0)
        {
            if prev.end() == hole.offset {
                hole = Hole::new(prev.offset, prev.size + hole.size);
                self.delete_hole(prev);
            }
        }

        // 「`hole`の終端」に一致する始端を持つ空き領域`next`を探す。
        // 注意: BTreeSetのgetでは、EqではなくOrd traitが用いられる。
        // 従って始端が一致する場合に限りOrdering::Equalとなる。
        let key = OffsetBasedHole(Hole::new(hole.end(), 0));
        if let Some(next) = self.offset_to_hole.get(&key).map(|h| h.0) {
            hole.size += next.size;
            self.delete_hole(next);
        }

        hole
    }

    // 空き領域のいずれとも重なっていない場合に限り、割当済みの領域であると判断する。
    fn is_allocated_range(&self, offset: u64, size: u64) -> bool {
        let key = OffsetBasedHole(Hole::new(offset, 0));
        if let Some(prev) = self
            .offset_to_hole
            .range((Unbounded, Included(&key)))
            .next_back()
        {
            if prev.0.end() > offset {
                return false;
            }
        }
        if let Some(next) = self.offset_to_hole.range((Excluded(&key), Unbounded)).next() {
            if next.0.offset < offset + size {
                return false;
            }
        }
        true
    }
}
