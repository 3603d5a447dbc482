//! LRU List Module
//!
//! Recency-ordered list backing LRU eviction.

// == Node ==
#[derive(Debug)]
struct Node<T> {
    item: T,
    /// Neighbour towards the most recently used end
    prev: Option<usize>,
    /// Neighbour towards the least recently used end
    next: Option<usize>,
}

// == LRU List ==
/// Doubly linked list stored in a slot vector.
///
/// Every item lives in a stable slot index for as long as it is in the list,
/// so callers can keep the index in a side table and touch, remove or evict
/// in O(1). Freed slots are reused before the vector grows.
///
/// - Head = Most recently used
/// - Tail = Least recently used
#[derive(Debug)]
pub struct LruList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LruList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Adds an item as most recently used and returns its slot index.
    pub fn push_front(&mut self, item: T) -> usize {
        let old_head = self.head;
        let node = Node {
            item,
            prev: None,
            next: old_head,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match old_head.and_then(|head| self.node_mut(head)) {
            Some(head) => head.prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
        idx
    }

    // == Touch ==
    /// Marks the item in `idx` as most recently used.
    ///
    /// Returns false if the slot is empty.
    pub fn move_to_front(&mut self, idx: usize) -> bool {
        if self.head == Some(idx) {
            return true;
        }
        if !self.unlink(idx) {
            return false;
        }

        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head.and_then(|head| self.node_mut(head)) {
            Some(head) => head.prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        true
    }

    // == Remove ==
    /// Removes and returns the item in `idx`, freeing the slot.
    pub fn remove(&mut self, idx: usize) -> Option<T> {
        if !self.unlink(idx) {
            return None;
        }
        let node = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.item)
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used item.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx)?.as_ref().map(|node| &node.item)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.node_mut(idx).map(|node| &mut node.item)
    }

    /// Number of slots ever allocated, occupied or not.
    ///
    /// Slot indices below this bound are the range a cursor-driven scan
    /// has to visit.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    /// Detaches the node in `idx` from its neighbours, keeping it in its slot.
    fn unlink(&mut self, idx: usize) -> bool {
        let (prev, next) = match self.slots.get(idx).and_then(Option::as_ref) {
            Some(node) => (node.prev, node.next),
            None => return false,
        };

        match prev.and_then(|p| self.node_mut(p)) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.node_mut(n)) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
        true
    }
}

// == Iterator ==
pub struct Iter<'a, T> {
    list: &'a LruList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.slots.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.item)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(list: &LruList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_lru_new() {
        let lru: LruList<&str> = LruList::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert!(order(&lru).is_empty());
    }

    #[test]
    fn test_lru_push_front_orders_by_recency() {
        let mut lru = LruList::new();

        lru.push_front("key1");
        lru.push_front("key2");
        lru.push_front("key3");

        assert_eq!(lru.len(), 3);
        assert_eq!(order(&lru), vec!["key3", "key2", "key1"]);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruList::new();

        let key1 = lru.push_front("key1");
        lru.push_front("key2");
        lru.push_front("key3");

        assert!(lru.move_to_front(key1));

        assert_eq!(lru.len(), 3);
        assert_eq!(order(&lru), vec!["key1", "key3", "key2"]);
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruList::new();

        lru.push_front("key1");
        lru.push_front("key2");
        lru.push_front("key3");

        assert_eq!(lru.pop_back(), Some("key1"));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.pop_back(), Some("key2"));
        assert_eq!(lru.pop_back(), Some("key3"));
        assert_eq!(lru.pop_back(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_remove_middle() {
        let mut lru = LruList::new();

        lru.push_front("key1");
        let key2 = lru.push_front("key2");
        lru.push_front("key3");

        assert_eq!(lru.remove(key2), Some("key2"));
        assert_eq!(lru.remove(key2), None);

        assert_eq!(lru.len(), 2);
        assert_eq!(order(&lru), vec!["key3", "key1"]);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruList::new();

        let a = lru.push_front("a");
        let b = lru.push_front("b");
        let c = lru.push_front("c");

        lru.move_to_front(a);
        lru.move_to_front(c);
        lru.move_to_front(b);

        // front=[b, c, a]=back
        assert_eq!(lru.pop_back(), Some("a"));
        assert_eq!(lru.pop_back(), Some("c"));
        assert_eq!(lru.pop_back(), Some("b"));
    }

    #[test]
    fn test_lru_touch_head_and_tail() {
        let mut lru = LruList::new();

        let only = lru.push_front("only");
        assert!(lru.move_to_front(only));
        assert_eq!(order(&lru), vec!["only"]);

        let next = lru.push_front("next");
        assert!(lru.move_to_front(only));
        assert_eq!(order(&lru), vec!["only", "next"]);
        assert!(lru.move_to_front(next));
        assert_eq!(order(&lru), vec!["next", "only"]);
    }

    #[test]
    fn test_lru_touch_empty_slot() {
        let mut lru: LruList<&str> = LruList::new();
        assert!(!lru.move_to_front(3));

        let idx = lru.push_front("gone");
        lru.remove(idx);
        assert!(!lru.move_to_front(idx));
    }

    #[test]
    fn test_lru_reuses_freed_slots() {
        let mut lru = LruList::new();

        let first = lru.push_front("first");
        lru.push_front("second");
        lru.remove(first);

        let third = lru.push_front("third");

        assert_eq!(third, first);
        assert_eq!(lru.slot_count(), 2);
        assert_eq!(lru.get(third), Some(&"third"));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruList::new();
        lru.push_front("a");
        lru.push_front("b");

        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.slot_count(), 0);
        assert_eq!(lru.pop_back(), None);
    }
}
