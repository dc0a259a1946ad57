//! The registry's tracker list.
//!
//! Every live guard is linked into one doubly linked list so that
//! [`finalize_all`](crate::Registry::finalize_all) can walk every
//! outstanding allocation in insertion order. The list is index-linked
//! over a bounded node arena: nodes refer to each other by index, and a
//! guard stores the stable index of its node instead of a pointer, so
//! there is no dangling-reference risk when a node is unlinked.
//!
//! Append is O(1) via a cached tail index; unlink is O(1) given the
//! node's own neighbour links. Vacated nodes go onto a LIFO free list
//! and are reused before the arena grows.

/// One entry in the tracker list.
#[derive(Clone, Copy, Debug)]
struct TrackerNode {
    /// Guard slot this node tracks.
    guard_slot: u32,
    prev: Option<u32>,
    next: Option<u32>,
    /// Set while the node is part of the list. Guards against double
    /// unlink.
    linked: bool,
}

/// Bounded doubly linked list of guard slots with O(1) append and unlink.
pub(crate) struct TrackerList {
    /// Node arena. Grows up to `max_nodes`, never shrinks.
    nodes: Vec<TrackerNode>,
    /// Vacated node indices, reused LIFO.
    free: Vec<u32>,
    head: Option<u32>,
    /// Cached tail for O(1) append.
    tail: Option<u32>,
    max_nodes: u32,
    len: usize,
}

impl TrackerList {
    /// Create an empty list bounded to `max_nodes` entries.
    pub(crate) fn new(max_nodes: u32) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            max_nodes,
            len: 0,
        }
    }

    /// Link a new node for `guard_slot` at the tail.
    ///
    /// Returns the node index, or `None` if the node arena is exhausted.
    pub(crate) fn append(&mut self, guard_slot: u32) -> Option<u32> {
        let node = TrackerNode {
            guard_slot,
            prev: self.tail,
            next: None,
            linked: true,
        };
        let index = if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = node;
            index
        } else {
            if self.nodes.len() >= self.max_nodes as usize {
                return None;
            }
            let index = self.nodes.len() as u32;
            self.nodes.push(node);
            index
        };

        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        Some(index)
    }

    /// Unlink the node at `index` and return it to the free list.
    ///
    /// Handles the three structural cases: the node is the head, the
    /// cached tail, or interior. Unlinking an already-unlinked node is a
    /// no-op.
    pub(crate) fn unlink(&mut self, index: u32) {
        let Some(node) = self.nodes.get(index as usize).copied() else {
            return;
        };
        if !node.linked {
            return;
        }

        match node.prev {
            Some(prev) => self.nodes[prev as usize].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next as usize].prev = node.prev,
            None => self.tail = node.prev,
        }

        let slot = &mut self.nodes[index as usize];
        slot.linked = false;
        slot.prev = None;
        slot.next = None;
        self.free.push(index);
        self.len -= 1;
    }

    /// Guard slots in insertion order.
    pub(crate) fn iter_slots(&self) -> TrackerIter<'_> {
        TrackerIter {
            list: self,
            cursor: self.head,
        }
    }

    /// Number of linked nodes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no linked nodes.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Iterator over linked guard slots, head to tail.
pub(crate) struct TrackerIter<'a> {
    list: &'a TrackerList,
    cursor: Option<u32>,
}

impl Iterator for TrackerIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let index = self.cursor?;
        let node = &self.list.nodes[index as usize];
        self.cursor = node.next;
        Some(node.guard_slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &TrackerList) -> Vec<u32> {
        list.iter_slots().collect()
    }

    #[test]
    fn append_links_in_insertion_order() {
        let mut list = TrackerList::new(8);
        list.append(10).unwrap();
        list.append(20).unwrap();
        list.append(30).unwrap();
        assert_eq!(collect(&list), vec![10, 20, 30]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn append_fails_when_arena_exhausted() {
        let mut list = TrackerList::new(2);
        assert!(list.append(0).is_some());
        assert!(list.append(1).is_some());
        assert!(list.append(2).is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn unlink_head() {
        let mut list = TrackerList::new(8);
        let a = list.append(10).unwrap();
        list.append(20).unwrap();
        list.append(30).unwrap();
        list.unlink(a);
        assert_eq!(collect(&list), vec![20, 30]);
    }

    #[test]
    fn unlink_tail_updates_cached_tail() {
        let mut list = TrackerList::new(8);
        list.append(10).unwrap();
        list.append(20).unwrap();
        let c = list.append(30).unwrap();
        list.unlink(c);
        assert_eq!(collect(&list), vec![10, 20]);
        // Appending after a tail unlink must land at the new tail.
        list.append(40).unwrap();
        assert_eq!(collect(&list), vec![10, 20, 40]);
    }

    #[test]
    fn unlink_interior() {
        let mut list = TrackerList::new(8);
        list.append(10).unwrap();
        let b = list.append(20).unwrap();
        list.append(30).unwrap();
        list.unlink(b);
        assert_eq!(collect(&list), vec![10, 30]);
    }

    #[test]
    fn unlink_sole_node_empties_list() {
        let mut list = TrackerList::new(8);
        let a = list.append(10).unwrap();
        list.unlink(a);
        assert!(list.is_empty());
        assert_eq!(collect(&list), Vec::<u32>::new());
    }

    #[test]
    fn double_unlink_is_a_no_op() {
        let mut list = TrackerList::new(8);
        let a = list.append(10).unwrap();
        list.append(20).unwrap();
        list.unlink(a);
        list.unlink(a);
        assert_eq!(collect(&list), vec![20]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn vacated_nodes_are_reused() {
        let mut list = TrackerList::new(2);
        let a = list.append(10).unwrap();
        list.append(20).unwrap();
        list.unlink(a);
        // Arena is full, but the vacated node keeps append working.
        let c = list.append(30).unwrap();
        assert_eq!(c, a);
        assert_eq!(collect(&list), vec![20, 30]);
    }

    #[test]
    fn unlink_out_of_range_is_a_no_op() {
        let mut list = TrackerList::new(2);
        list.append(10).unwrap();
        list.unlink(99);
        assert_eq!(collect(&list), vec![10]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn list_matches_reference_model(
                ops in proptest::collection::vec((any::<bool>(), 0u32..16), 1..100),
            ) {
                let mut list = TrackerList::new(64);
                let mut model: Vec<(u32, u32)> = Vec::new(); // (node, slot)
                for (i, (is_append, pick)) in ops.into_iter().enumerate() {
                    if is_append || model.is_empty() {
                        if let Some(node) = list.append(i as u32) {
                            model.push((node, i as u32));
                        }
                    } else {
                        let victim = pick as usize % model.len();
                        let (node, _) = model.remove(victim);
                        list.unlink(node);
                    }
                    let expected: Vec<u32> = model.iter().map(|&(_, s)| s).collect();
                    prop_assert_eq!(collect(&list), expected);
                    prop_assert_eq!(list.len(), model.len());
                }
            }
        }
    }
}
