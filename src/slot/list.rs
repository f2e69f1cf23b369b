use std::ops::{Index, IndexMut};

use super::store::{SlotStore, NIL};

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: usize,
    next: usize,
}

/// 各ノードを[`SlotStore`]に格納する双方向連結リスト.
///
/// ノードは`SlotStore`のインデックスで識別されるので、
/// 他の要素の挿入・削除によってインデックスが無効になることはない.
/// 任意の位置への挿入および削除はO(1)で行われる.
///
/// [`SlotStore`]: ./struct.SlotStore.html
///
/// # Examples
///
/// ```
/// use subbuf::slot::IndexedList;
///
/// let mut list = IndexedList::new();
/// let a = list.push_back("a");
/// let c = list.push_back("c");
/// list.insert_after(a, "b");
/// assert_eq!(list.iter().map(|(_, v)| *v).collect::<Vec<_>>(), ["a", "b", "c"]);
///
/// list.remove(c);
/// assert_eq!(list.back(), list.next(a));
/// ```
#[derive(Debug, Clone)]
pub struct IndexedList<T> {
    nodes: SlotStore<Node<T>>,
    front: usize,
    back: usize,
}
impl<T> IndexedList<T> {
    /// 空の`IndexedList`インスタンスを生成する.
    pub fn new() -> Self {
        IndexedList {
            nodes: SlotStore::new(),
            front: NIL,
            back: NIL,
        }
    }

    /// 要素数を返す.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 要素が一つも存在しない場合には`true`を返す.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 先頭要素のインデックスを返す.
    pub fn front(&self) -> Option<usize> {
        Self::link(self.front)
    }

    /// 末尾要素のインデックスを返す.
    pub fn back(&self) -> Option<usize> {
        Self::link(self.back)
    }

    /// `index`の次の要素のインデックスを返す.
    pub fn next(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| Self::link(n.next))
    }

    /// `index`の前の要素のインデックスを返す.
    pub fn prev(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| Self::link(n.prev))
    }

    /// `index`の要素への参照を返す.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.nodes.get(index).map(|n| &n.value)
    }

    /// `index`の要素への可変参照を返す.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.nodes.get_mut(index).map(|n| &mut n.value)
    }

    /// `index`の要素が存在するかどうかを判定する.
    pub fn contains(&self, index: usize) -> bool {
        self.nodes.contains(index)
    }

    /// 末尾に要素を追加し、そのインデックスを返す.
    pub fn push_back(&mut self, value: T) -> usize {
        let back = self.back;
        self.link_between(back, NIL, value)
    }

    /// 先頭に要素を追加し、そのインデックスを返す.
    pub fn push_front(&mut self, value: T) -> usize {
        let front = self.front;
        self.link_between(NIL, front, value)
    }

    /// `index`の要素の直後に要素を挿入し、そのインデックスを返す.
    ///
    /// # Panics
    ///
    /// `index`の要素が存在しない場合には、現在のスレッドがパニックする.
    pub fn insert_after(&mut self, index: usize, value: T) -> usize {
        let next = self.nodes[index].next;
        self.link_between(index, next, value)
    }

    /// `index`の要素の直前に要素を挿入し、そのインデックスを返す.
    ///
    /// # Panics
    ///
    /// `index`の要素が存在しない場合には、現在のスレッドがパニックする.
    pub fn insert_before(&mut self, index: usize, value: T) -> usize {
        let prev = self.nodes[index].prev;
        self.link_between(prev, index, value)
    }

    /// `index`の要素をリストから取り除いて返す.
    ///
    /// # Panics
    ///
    /// `index`の要素が存在しない場合には、現在のスレッドがパニックする.
    pub fn remove(&mut self, index: usize) -> T {
        let node = self.nodes.erase(index);
        self.set_next(node.prev, node.next);
        self.set_prev(node.next, node.prev);
        node.value
    }

    /// 先頭の要素を取り除いて返す.
    pub fn pop_front(&mut self) -> Option<T> {
        self.front().map(|i| self.remove(i))
    }

    /// 末尾の要素を取り除いて返す.
    pub fn pop_back(&mut self) -> Option<T> {
        self.back().map(|i| self.remove(i))
    }

    /// 先頭から順に`(インデックス, 要素)`を走査するイテレータを返す.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            list: self,
            cursor: self.front,
        }
    }

    fn link(index: usize) -> Option<usize> {
        if index == NIL {
            None
        } else {
            Some(index)
        }
    }

    fn link_between(&mut self, prev: usize, next: usize, value: T) -> usize {
        let index = self.nodes.insert(Node { value, prev, next });
        self.set_next(prev, index);
        self.set_prev(next, index);
        index
    }

    // `index`が`NIL`の場合にはリストの先頭を更新する
    fn set_next(&mut self, index: usize, next: usize) {
        if index == NIL {
            self.front = next;
        } else {
            self.nodes[index].next = next;
        }
    }

    // `index`が`NIL`の場合にはリストの末尾を更新する
    fn set_prev(&mut self, index: usize, prev: usize) {
        if index == NIL {
            self.back = prev;
        } else {
            self.nodes[index].prev = prev;
        }
    }
}
impl<T> Default for IndexedList<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> Index<usize> for IndexedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.nodes[index].value
    }
}
impl<T> IndexMut<usize> for IndexedList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.nodes[index].value
    }
}

/// [`IndexedList`]の要素を先頭から走査するイテレータ.
///
/// [`IndexedList`]: ./struct.IndexedList.html
#[derive(Debug)]
pub struct Iter<'a, T: 'a> {
    list: &'a IndexedList<T>,
    cursor: usize,
}
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let index = self.cursor;
        let node = &self.list.nodes[index];
        self.cursor = node.next;
        Some((index, &node.value))
    }
}
