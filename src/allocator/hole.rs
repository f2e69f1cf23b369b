//! Hole

use std::cmp;

/// 空き(割当可能)領域を表現するための構造体.
///
/// `[offset, offset + size)`の範囲が空いていることを示す.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hole {
    /// 空き領域の開始位置（バイト単位）
    pub offset: u64,

    /// 空き領域の長さ（バイト単位）
    pub size: u64,
}
impl Hole {
    /// 新しい`Hole`インスタンスを生成する.
    pub fn new(offset: u64, size: u64) -> Self {
        Hole { offset, size }
    }

    /// 空き領域の終端位置を返す.
    ///
    /// **注意**: 終端位置自体は空き領域に含まれない.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// `offset`を`alignment`の倍数に揃えるために読み飛ばす必要があるバイト数を返す.
    ///
    /// `alignment`は2の冪である必要がある.
    pub fn padding(&self, alignment: u64) -> u64 {
        (alignment - self.offset % alignment) % alignment
    }

    /// `alignment`に揃えた上で`size`分の割当が可能な場合には、そのパディングを返す.
    pub fn fit(&self, size: u64, alignment: u64) -> Option<u64> {
        let padding = self.padding(alignment);
        match padding.checked_add(size) {
            Some(required) if required <= self.size => Some(padding),
            _ => None,
        }
    }
}

/// 比較が"空き領域のサイズ順"で行われる`Hole`.
///
/// サイズが等しい場合には、開始位置が小さい方が先となる.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBasedHole(pub Hole);
impl PartialOrd for SizeBasedHole {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SizeBasedHole {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match self.0.size.cmp(&other.0.size) {
            cmp::Ordering::Equal => self.0.offset.cmp(&other.0.offset),
            not_equal => not_equal,
        }
    }
}

/// 比較が"開始位置が小さい順"で行われる`Hole`.
///
/// 空き領域同士は重ならないので、開始位置だけで一意に順序が決まる.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetBasedHole(pub Hole);
impl PartialOrd for OffsetBasedHole {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OffsetBasedHole {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0.offset.cmp(&other.0.offset)
    }
}
