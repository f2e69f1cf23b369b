use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};

use super::ManagedRegion;
use crate::allocator::IntervalAllocator;
use crate::backing::BackingStore;
use crate::metrics::{AllocatorMetrics, RegionMetrics};
use crate::Result;

/// `ManagedRegion`のビルダ.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    metrics: MetricBuilder,
    logger: Logger,
    default_alignment: u64,
}
impl RegionBuilder {
    /// デフォルト設定で`RegionBuilder`インスタンスを生成する.
    pub fn new() -> Self {
        RegionBuilder {
            metrics: MetricBuilder::new(),
            logger: Logger::root(Discard, o!()),
            default_alignment: 1,
        }
    }

    /// メトリクス用の共通設定を登録する.
    ///
    /// デフォルト値は`MetricBuilder::new()`.
    pub fn metrics(&mut self, metrics: MetricBuilder) -> &mut Self {
        self.metrics = metrics;
        self
    }

    /// 領域で使用されるロガーを登録する.
    ///
    /// デフォルトでは、ログは全て破棄される.
    pub fn logger(&mut self, logger: Logger) -> &mut Self {
        self.logger = logger;
        self
    }

    /// `ManagedRegion::push_default`等で使用されるアライメントを設定する.
    ///
    /// 2の冪である必要があり、そうではない場合には、
    /// 領域の構築時にエラーが返される.
    ///
    /// デフォルト値は`1`.
    pub fn default_alignment(&mut self, alignment: u64) -> &mut Self {
        self.default_alignment = alignment;
        self
    }

    /// バッキングストアの容量全体を管理対象とする`ManagedRegion`を生成する.
    pub fn create<B>(&self, backing: B) -> Result<ManagedRegion<B>>
    where
        B: BackingStore,
    {
        let capacity = backing.capacity();
        track!(self.create_with_capacity(backing, capacity))
    }

    /// バッキングストアの先頭`capacity`バイトを管理対象とする`ManagedRegion`を生成する.
    ///
    /// # Errors
    ///
    /// 以下の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される:
    ///
    /// - `capacity`が`0`
    /// - `capacity`がバッキングストアの容量を超えている
    /// - デフォルトのアライメントが2の冪ではない
    pub fn create_with_capacity<B>(&self, backing: B, capacity: u64) -> Result<ManagedRegion<B>>
    where
        B: BackingStore,
    {
        let allocator_metrics = AllocatorMetrics::new(&self.metrics, capacity);
        let allocator = track!(IntervalAllocator::with_metrics(allocator_metrics))?;
        let metrics = RegionMetrics::new(&self.metrics, allocator.metrics().clone());
        track!(ManagedRegion::with_parts(
            allocator,
            backing,
            self.default_alignment,
            self.logger.clone(),
            metrics,
        ))
    }
}
impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
