//! 線形領域用のアロケータ.
//!
//! アロケータは、固定長の連続した領域`[0, capacity)`を（仮想的に）受け取り、
//! 利用者の要求に対して、その中から必要なサイズの部分領域を割り当てる責務を負っている.
//!
//! アロケータが担当するのは、領域の計算処理のみで、実際のデータの読み書き等を、この中で行うことは無い.
pub use self::hole::Hole;
pub use self::interval_allocator::IntervalAllocator;

mod hole;
mod interval_allocator;
