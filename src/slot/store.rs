use std::mem;
use std::ops::{Index, IndexMut};

/// 空きスロットのリンクの終端を示す値.
///
/// インデックス`0`は番兵であり、データが格納されることはない.
pub(crate) const NIL: usize = 0;

#[derive(Debug, Clone)]
enum Slot<T> {
    Occupied(T),
    Free { next: usize },
}

/// 整数インデックスでアクセス可能な値の格納庫.
///
/// 挿入・削除は共にO(1)で行われ、削除されたスロットは、
/// スロット群自体に埋め込まれたフリーリストを介して、次の挿入時に再利用される.
///
/// 返されるインデックスは、その値が削除されるまで変化しない.
/// また`0`が返されることは無い.
///
/// # Examples
///
/// ```
/// use subbuf::slot::SlotStore;
///
/// let mut store = SlotStore::new();
/// let a = store.insert("a");
/// let b = store.insert("b");
/// assert_eq!(store[a], "a");
///
/// assert_eq!(store.erase(b), "b");
/// let c = store.insert("c");
/// assert_eq!(b, c);
/// ```
#[derive(Debug, Clone)]
pub struct SlotStore<T> {
    slots: Vec<Slot<T>>,
    free_head: usize,
    len: usize,
}
impl<T> SlotStore<T> {
    /// 新しい`SlotStore`インスタンスを生成する.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// 事前に`capacity`個分の領域を確保した`SlotStore`インスタンスを生成する.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(Slot::Free { next: NIL });
        SlotStore {
            slots,
            free_head: NIL,
            len: 0,
        }
    }

    /// `value`を格納し、そのインデックスを返す.
    ///
    /// 空きスロットが存在する場合には、直近に削除されたものが再利用される.
    pub fn insert(&mut self, value: T) -> usize {
        self.len += 1;
        if self.free_head == NIL {
            self.slots.push(Slot::Occupied(value));
            return self.slots.len() - 1;
        }

        let index = self.free_head;
        match mem::replace(&mut self.slots[index], Slot::Occupied(value)) {
            Slot::Free { next } => self.free_head = next,
            Slot::Occupied(_) => unreachable!("Occupied slot in the free list: {}", index),
        }
        index
    }

    /// `index`に格納されている値を削除して返す.
    ///
    /// 削除されたスロットはフリーリストの先頭に繋がれる.
    ///
    /// # Panics
    ///
    /// `index`に有効な値が格納されていない場合には、現在のスレッドがパニックする.
    pub fn erase(&mut self, index: usize) -> T {
        assert!(self.contains(index), "No such slot: {}", index);
        let next = self.free_head;
        self.free_head = index;
        self.len -= 1;
        match mem::replace(&mut self.slots[index], Slot::Free { next }) {
            Slot::Occupied(value) => value,
            Slot::Free { .. } => unreachable!(),
        }
    }

    /// `index`に有効な値が格納されているかどうかを判定する.
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// `index`に格納されている値への参照を返す.
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// `index`に格納されている値への可変参照を返す.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// 格納されている値の数を返す.
    pub fn len(&self) -> usize {
        self.len
    }

    /// 値が一つも格納されていない場合には`true`を返す.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 番兵を除いた、確保済みのスロットの数を返す.
    ///
    /// これは、これまでに同時に格納されていた値の数の最大値に等しい.
    pub fn slot_count(&self) -> usize {
        self.slots.len() - 1
    }

    /// 全ての値を削除する.
    ///
    /// 確保済みの領域は解放されないが、インデックスは`1`から振り直される.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.free_head = NIL;
        self.len = 0;
    }

    /// 格納されている値を、インデックスの昇順に走査するイテレータを返す.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i, value)),
                Slot::Free { .. } => None,
            })
    }

    #[cfg(test)]
    fn free_list(&self) -> Vec<usize> {
        let mut list = Vec::new();
        let mut index = self.free_head;
        while index != NIL {
            list.push(index);
            index = match self.slots[index] {
                Slot::Free { next } => next,
                Slot::Occupied(_) => panic!("Occupied slot in the free list: {}", index),
            };
        }
        list
    }
}
impl<T> Default for SlotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Index<usize> for SlotStore<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("No such slot: {}", index),
        }
    }
}
impl<T> IndexMut<usize> for SlotStore<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("No such slot: {}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        let mut store = SlotStore::new();
        assert!(store.is_empty());

        let a = store.insert("a");
        let b = store.insert("b");
        let c = store.insert("c");
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(store.len(), 3);
        assert_eq!(store[b], "b");

        store[c] = "cc";
        assert_eq!(store.get(c), Some(&"cc"));

        assert_eq!(store.erase(b), "b");
        assert!(!store.contains(b));
        assert_eq!(store.get(b), None);
        assert_eq!(store.len(), 2);

        // 直近に削除されたスロットが再利用される
        let d = store.insert("d");
        assert_eq!(d, b);
        assert_eq!(store[d], "d");
        assert_eq!(store.slot_count(), 3);
    }

    #[test]
    fn free_list_is_lifo() {
        let mut store = SlotStore::new();
        let indices = (0..5).map(|i| store.insert(i)).collect::<Vec<_>>();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);

        store.erase(2);
        store.erase(4);
        store.erase(1);
        assert_eq!(store.free_list(), vec![1, 4, 2]);

        assert_eq!(store.insert(10), 1);
        assert_eq!(store.insert(11), 4);
        assert_eq!(store.insert(12), 2);
        assert!(store.free_list().is_empty());
        assert_eq!(store.insert(13), 6);

        assert_eq!(
            store.iter().map(|(i, v)| (i, *v)).collect::<Vec<_>>(),
            vec![(1, 10), (2, 12), (3, 2), (4, 11), (5, 4), (6, 13)]
        );
    }

    #[test]
    fn sentinel_is_never_valid() {
        let mut store = SlotStore::new();
        store.insert(1);
        assert!(!store.contains(0));
        assert_eq!(store.get_mut(0), None);
        assert_eq!(store.get(100), None);
    }

    #[test]
    fn clear_works() {
        let mut store = SlotStore::with_capacity(4);
        store.insert("a");
        store.insert("b");
        store.erase(1);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.slot_count(), 0);
        assert_eq!(store.insert("c"), 1);
    }

    #[test]
    fn erase_drops_value() {
        use std::rc::Rc;

        let value = Rc::new(());
        let mut store = SlotStore::new();
        let i = store.insert(Rc::clone(&value));
        assert_eq!(Rc::strong_count(&value), 2);
        drop(store.erase(i));
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    #[should_panic]
    fn erase_sentinel_panics() {
        let mut store = SlotStore::new();
        store.insert(1);
        store.erase(0);
    }

    #[test]
    #[should_panic]
    fn double_erase_panics() {
        let mut store = SlotStore::new();
        let i = store.insert(1);
        store.erase(i);
        store.erase(i);
    }

    #[test]
    #[should_panic]
    fn index_erased_slot_panics() {
        let mut store = SlotStore::new();
        let i = store.insert(1);
        store.erase(i);
        assert_eq!(store[i], 1);
    }
}
