//! [Prometheus][prometheus]用のメトリクス.
//!
//! [prometheus]: https://prometheus.io/
use prometrics::metrics::{Counter, Gauge, MetricBuilder};

/// [`IntervalAllocator`]のメトリクス.
///
/// [`IntervalAllocator`]: ../allocator/struct.IntervalAllocator.html
#[derive(Debug, Clone)]
pub struct AllocatorMetrics {
    pub(crate) capacity_bytes: Gauge,
    pub(crate) inserted_holes: Counter,
    pub(crate) removed_holes: Counter,
    pub(crate) allocated_ranges: Counter,
    pub(crate) allocated_bytes: Counter,
    pub(crate) released_ranges: Counter,
    pub(crate) released_bytes: Counter,
    pub(crate) nospace_failures: Counter,
    pub(crate) capacity: u64,
}
impl AllocatorMetrics {
    /// アロケータが管理する領域の容量.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_capacity_bytes <GAUGE>
    /// ```
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes.value() as u64
    }

    /// 空き領域インデックスに挿入された要素の数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_inserted_holes_total <COUNTER>
    /// ```
    pub fn inserted_holes(&self) -> u64 {
        self.inserted_holes.value() as u64
    }

    /// 空き領域インデックスから削除された要素の数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_removed_holes_total <COUNTER>
    /// ```
    pub fn removed_holes(&self) -> u64 {
        self.removed_holes.value() as u64
    }

    /// 現在の空き領域の数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_inserted_holes_total - subbuf_allocator_removed_holes_total
    /// ```
    pub fn hole_count(&self) -> usize {
        // NOTE: 以下の順番で値を取得しないとアンダーフローする可能性がある
        let dec = self.removed_holes();
        let inc = self.inserted_holes();
        (inc - dec) as usize
    }

    /// 部分領域の割当回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_allocated_ranges_total <COUNTER>
    /// ```
    pub fn allocated_ranges(&self) -> u64 {
        self.allocated_ranges.value() as u64
    }

    /// これまでに割り当てた部分領域のバイト数.
    ///
    /// アライメントのために読み飛ばされたバイト数は含まない.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_allocated_bytes_total <COUNTER>
    /// ```
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.value() as u64
    }

    /// 部分領域の解放回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_released_ranges_total <COUNTER>
    /// ```
    pub fn released_ranges(&self) -> u64 {
        self.released_ranges.value() as u64
    }

    /// これまでに解放された部分領域のバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_released_bytes_total <COUNTER>
    /// ```
    pub fn released_bytes(&self) -> u64 {
        self.released_bytes.value() as u64
    }

    /// 空き領域不足による割当失敗回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_nospace_failures_total <COUNTER>
    /// ```
    pub fn nospace_failures(&self) -> u64 {
        self.nospace_failures.value() as u64
    }

    /// 現在割当中のバイト数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_allocator_allocated_bytes_total - subbuf_allocator_released_bytes_total
    /// ```
    pub fn usage_bytes(&self) -> u64 {
        // NOTE: 以下の順番で値を取得しないとアンダーフローする可能性がある
        let dec = self.released_bytes();
        let inc = self.allocated_bytes();
        inc - dec
    }

    /// 新しい`AllocatorMetrics`インスタンスを生成する.
    ///
    /// `capacity`は、アロケータが管理する領域のバイト数.
    pub fn new(builder: &MetricBuilder, capacity: u64) -> Self {
        let mut builder = builder.clone();
        builder.namespace("subbuf").subsystem("allocator");
        AllocatorMetrics {
            capacity_bytes: builder
                .gauge("capacity_bytes")
                .help("Capacity of the managed range")
                .initial_value(capacity as f64)
                .finish()
                .expect("Never fails"),
            inserted_holes: builder
                .counter("inserted_holes_total")
                .help("Number of holes inserted into the hole indexes")
                .finish()
                .expect("Never fails"),
            removed_holes: builder
                .counter("removed_holes_total")
                .help("Number of holes removed from the hole indexes")
                .finish()
                .expect("Never fails"),
            allocated_ranges: builder
                .counter("allocated_ranges_total")
                .help("Number of allocated ranges")
                .finish()
                .expect("Never fails"),
            allocated_bytes: builder
                .counter("allocated_bytes_total")
                .help("Number of allocated bytes")
                .finish()
                .expect("Never fails"),
            released_ranges: builder
                .counter("released_ranges_total")
                .help("Number of released ranges")
                .finish()
                .expect("Never fails"),
            released_bytes: builder
                .counter("released_bytes_total")
                .help("Number of released bytes")
                .finish()
                .expect("Never fails"),
            nospace_failures: builder
                .counter("nospace_failures_total")
                .help("Number of allocation failures caused by no available space")
                .finish()
                .expect("Never fails"),
            capacity,
        }
    }

    pub(crate) fn count_allocation(&self, size: u64) {
        self.allocated_ranges.increment();
        self.allocated_bytes.add_u64(size);
    }

    pub(crate) fn count_release(&self, size: u64) {
        self.released_ranges.increment();
        self.released_bytes.add_u64(size);
    }
}

/// [`ManagedRegion`]のメトリクス.
///
/// [`ManagedRegion`]: ../region/struct.ManagedRegion.html
#[derive(Debug, Clone)]
pub struct RegionMetrics {
    pub(crate) written_bytes: Counter,
    pub(crate) write_failures: Counter,
    allocator: AllocatorMetrics,
}
impl RegionMetrics {
    /// バッキングストアに書き込まれたバイト数の合計.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_region_written_bytes_total <COUNTER>
    /// ```
    pub fn written_bytes(&self) -> u64 {
        self.written_bytes.value() as u64
    }

    /// バッキングストアへの書き込みに失敗した回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// subbuf_region_write_failures_total <COUNTER>
    /// ```
    pub fn write_failures(&self) -> u64 {
        self.write_failures.value() as u64
    }

    /// 領域の使用量を返す.
    pub fn usage_bytes(&self) -> u64 {
        self.allocator.usage_bytes()
    }

    /// アロケータのメトリクスを返す.
    pub fn allocator(&self) -> &AllocatorMetrics {
        &self.allocator
    }

    pub(crate) fn new(builder: &MetricBuilder, allocator: AllocatorMetrics) -> Self {
        let mut builder = builder.clone();
        builder.namespace("subbuf").subsystem("region");
        RegionMetrics {
            written_bytes: builder
                .counter("written_bytes_total")
                .help("Number of bytes written to the backing store")
                .finish()
                .expect("Never fails"),
            write_failures: builder
                .counter("write_failures_total")
                .help("Number of failed writes to the backing store")
                .finish()
                .expect("Never fails"),
            allocator,
        }
    }
}
