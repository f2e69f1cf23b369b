//! スロットベースのオブジェクトプール.
//!
//! 値を安定した整数インデックスで管理し、削除されたスロットを
//! フリーリスト経由でO(1)で再利用するための構成要素群を提供する.
pub use self::list::{IndexedList, Iter};
pub use self::store::SlotStore;

mod list;
mod store;
