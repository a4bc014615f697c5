use std::{fmt, mem};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use rand::rngs::StdRng;

use crate::{
    arena::{Arena, NodeId},
    error::{Error, Result},
    level::prelude::*,
};

type Link = Option<NodeId>;

pub struct Node<K, V> {
    key: K,
    value: V,
    /// `forward[i]` is the next node on level `i`, for `i` in `0..=level`.
    forward: Box<[Link]>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, level: usize) -> Self {
        Self {
            key,
            value,
            forward: vec![None; level + 1].into_boxed_slice(),
        }
    }

    fn get_next(&self, level: usize) -> Link {
        self.forward[level]
    }

    fn set_next(&mut self, level: usize, next: Link) {
        self.forward[level] = next;
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Highest level this node is linked on.
    pub fn level(&self) -> usize {
        self.forward.len() - 1
    }
}

/// A walk position: either the header or a real node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Head,
    Node(NodeId),
}

struct Core<K, V, G> {
    head: Box<[Link]>,
    nodes: Arena<Node<K, V>>,
    level: usize,
    levels: G,
}

impl<K: Ord, V, G> Core<K, V, G> {
    fn new(max_level: usize, levels: G) -> Self {
        Self {
            head: vec![None; max_level + 1].into_boxed_slice(),
            nodes: Arena::new(),
            level: 0,
            levels,
        }
    }

    fn max_level(&self) -> usize {
        self.head.len() - 1
    }

    fn next(&self, pos: Position, level: usize) -> Link {
        match pos {
            Position::Head => self.head[level],
            Position::Node(id) => self.nodes[id].get_next(level),
        }
    }

    fn set_next(&mut self, pos: Position, level: usize, next: Link) {
        match pos {
            Position::Head => self.head[level] = next,
            Position::Node(id) => self.nodes[id].set_next(level, next),
        }
    }

    /// Walks from the top level down, moving right while the next key is
    /// smaller than `key`. `visit` sees the last position of every level.
    /// Returns the level-0 successor of the final position.
    fn walk_down(&self, key: &K, mut visit: impl FnMut(usize, Position)) -> Link {
        let mut cur = Position::Head;
        for level in (0..=self.level).rev() {
            while let Some(next) = self.next(cur, level) {
                if self.nodes[next].key < *key {
                    cur = Position::Node(next);
                } else {
                    break;
                }
            }
            visit(level, cur);
        }
        self.next(cur, 0)
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        self.walk_down(key, |_, _| {})
            .filter(|&id| self.nodes[id].key == *key)
    }

    fn find_prev_nodes(&self, key: &K) -> (Vec<Position>, Link) {
        let mut update = vec![Position::Head; self.max_level() + 1];
        let next = self.walk_down(key, |level, pos| update[level] = pos);
        (update, next)
    }

    fn remove(&mut self, key: &K) -> Result<V> {
        let (update, next) = self.find_prev_nodes(key);
        let target = match next {
            Some(id) if self.nodes[id].key == *key => id,
            _ => return Err(Error::NotFound),
        };

        for (level, &prev) in update.iter().enumerate().take(self.level + 1) {
            if self.next(prev, level) != Some(target) {
                break;
            }
            let next = self.nodes[target].get_next(level);
            self.set_next(prev, level, next);
        }

        while self.level > 0 && self.head[self.level].is_none() {
            self.level -= 1;
        }

        let node = self
            .nodes
            .remove(target)
            .unwrap_or_else(|| panic!("dangling node id in level 0 chain"));
        Ok(node.value)
    }

    fn update(&mut self, key: &K, value: V) -> Result<V> {
        let id = self.find(key).ok_or(Error::NotFound)?;
        Ok(mem::replace(&mut self.nodes[id].value, value))
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.head.fill(None);
        self.level = 0;
    }
}

impl<K, V, G> Core<K, V, G>
where
    K: Ord,
    G: LevelGenerator,
{
    fn insert(&mut self, key: K, value: V) -> Result<()> {
        let (mut update, next) = self.find_prev_nodes(&key);
        if let Some(id) = next {
            if self.nodes[id].key == key {
                return Err(Error::DuplicateKey);
            }
        }

        let max_level = self.max_level();
        let height = self.levels.random_level(max_level).clamp(1, max_level);
        if height > self.level {
            for prev in update.iter_mut().take(height + 1).skip(self.level + 1) {
                *prev = Position::Head;
            }
            self.level = height;
        }

        let id = self.nodes.alloc(Node::new(key, value, height));
        for (level, &prev) in update.iter().enumerate().take(height + 1) {
            let next = self.next(prev, level);
            self.nodes[id].set_next(level, next);
            self.set_next(prev, level, Some(id));
        }
        Ok(())
    }
}

impl<K, V, G> Core<K, V, G> {
    fn level_iter(&self, level: usize) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            next: self.head.get(level).copied().flatten(),
            level,
        }
    }
}

/// An ordered map backed by a skip list.
///
/// Nodes live in an arena owned by the list, links are arena ids. Every
/// mutation holds the write lock for the whole walk-and-splice; lookups and
/// traversals hold the read lock.
pub struct SkipList<K, V, G = RandomLevel<StdRng>> {
    max_level: usize,
    core: RwLock<Core<K, V, G>>,
}

impl<K: Ord, V> SkipList<K, V> {
    pub fn new(max_level: usize) -> Self {
        Self::with_generator(max_level, RandomLevel::default())
    }

    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        Self::with_generator(max_level, RandomLevel::from_seed(seed))
    }
}

impl<K, V, G> SkipList<K, V, G>
where
    K: Ord,
    G: LevelGenerator,
{
    pub fn with_generator(max_level: usize, levels: G) -> Self {
        assert!(max_level > 0, "max_level must be greater than 0.");
        Self {
            max_level,
            core: RwLock::new(Core::new(max_level, levels)),
        }
    }

    /// Inserts `key`, failing with [`Error::DuplicateKey`] if it is already
    /// present. A failed insert leaves the list untouched.
    pub fn insert(&self, key: K, value: V) -> Result<()> {
        self.core.write().insert(key, value)
    }
}

impl<K: Ord, V, G> SkipList<K, V, G> {
    /// Removes `key` and returns its value.
    pub fn remove(&self, key: &K) -> Result<V> {
        self.core.write().remove(key)
    }

    /// Replaces the value of an existing key, returning the previous one.
    pub fn update(&self, key: &K, value: V) -> Result<V> {
        self.core.write().update(key, value)
    }

    /// The returned guard keeps the list read-locked; drop it before
    /// mutating from the same thread.
    pub fn get(&self, key: &K) -> Option<MappedRwLockReadGuard<'_, V>> {
        RwLockReadGuard::try_map(self.core.read(), |core| {
            core.find(key).map(|id| &core.nodes[id].value)
        })
        .ok()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.core.read().find(key).is_some()
    }

    pub fn clear(&self) {
        self.core.write().clear();
    }
}

impl<K, V, G> SkipList<K, V, G> {
    pub fn len(&self) -> usize {
        self.core.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest level with at least one node, 0 when empty.
    pub fn level(&self) -> usize {
        self.core.read().level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Read-locks the list for traversal.
    pub fn read(&self) -> ReadView<'_, K, V, G> {
        ReadView {
            core: self.core.read(),
        }
    }
}

pub struct ReadView<'a, K, V, G> {
    core: RwLockReadGuard<'a, Core<K, V, G>>,
}

impl<K, V, G> ReadView<'_, K, V, G> {
    /// All entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.core.level_iter(0)
    }

    /// Entries linked on `level`, in ascending key order. Empty above the
    /// current level.
    pub fn level_iter(&self, level: usize) -> Iter<'_, K, V> {
        self.core.level_iter(level)
    }

    pub fn len(&self) -> usize {
        self.core.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.nodes.is_empty()
    }

    pub fn level(&self) -> usize {
        self.core.level
    }
}

impl<K: Ord, V, G> ReadView<'_, K, V, G> {
    pub fn get(&self, key: &K) -> Option<&V> {
        self.core.find(key).map(|id| &self.core.nodes[id].value)
    }

    pub fn node(&self, key: &K) -> Option<&Node<K, V>> {
        self.core.find(key).map(|id| &self.core.nodes[id])
    }
}

pub struct Iter<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    next: Link,
    level: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.next?];
        self.next = node.get_next(self.level);
        Some((&node.key, &node.value))
    }
}

impl<K, V, G> fmt::Display for SkipList<K, V, G>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.read();
        for level in 0..=view.level() {
            write!(f, "Level {level}: ")?;
            for (key, value) in view.level_iter(level) {
                write!(f, "({key}, {value})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use itertools::Itertools;
    use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

    use super::SkipList;
    use crate::{error::Error, level::LevelGenerator};

    /// Hands out a fixed sequence of levels, then 1 forever.
    struct Scripted(VecDeque<usize>);

    impl Scripted {
        fn new(levels: &[usize]) -> Self {
            Self(levels.iter().copied().collect())
        }
    }

    impl LevelGenerator for Scripted {
        fn random_level(&mut self, _max_level: usize) -> usize {
            self.0.pop_front().unwrap_or(1)
        }
    }

    fn keys_at<G>(list: &SkipList<i32, String, G>, level: usize) -> Vec<i32> {
        list.read().level_iter(level).map(|(k, _)| *k).collect_vec()
    }

    fn snapshot<G>(list: &SkipList<i32, String, G>) -> Vec<Vec<(i32, String)>> {
        let view = list.read();
        (0..=list.max_level())
            .map(|level| {
                view.level_iter(level)
                    .map(|(k, v)| (*k, v.clone()))
                    .collect_vec()
            })
            .collect_vec()
    }

    fn assert_invariants<G>(list: &SkipList<i32, String, G>) {
        let view = list.read();
        for level in 0..=list.max_level() {
            let keys = view.level_iter(level).map(|(k, _)| *k).collect_vec();
            assert!(
                keys.iter().tuple_windows().all(|(a, b)| a < b),
                "level {level} not ascending: {keys:?}"
            );
            if level > view.level() {
                assert!(keys.is_empty(), "level {level} above current level");
            }
            if level > 0 {
                let lower = view.level_iter(level - 1).map(|(k, _)| *k).collect_vec();
                assert!(
                    keys.iter().all(|k| lower.binary_search(k).is_ok()),
                    "level {level} not nested in level {}",
                    level - 1
                );
            }
        }
        let top = view
            .iter()
            .filter_map(|(k, _)| view.node(k))
            .map(|node| node.level())
            .max()
            .unwrap_or(0);
        assert_eq!(view.level(), top);
    }

    #[test]
    fn test_empty_list() {
        let list: SkipList<i32, String> = SkipList::new(6);
        assert!(list.is_empty());
        assert_eq!(list.level(), 0);
        assert!(list.get(&1).is_none());
        assert_eq!(list.remove(&1), Err(Error::NotFound));
        assert_eq!(list.to_string(), "Level 0: \n");
    }

    #[test]
    #[should_panic]
    fn test_zero_max_level() {
        let _list: SkipList<i32, i32> = SkipList::new(0);
    }

    #[test]
    fn test_search_scenario() {
        let list = SkipList::with_seed(6, 1);
        let data = [
            (1, "a"),
            (3, "c"),
            (7, "g"),
            (8, "h"),
            (9, "i"),
            (10, "j"),
            (16, "p"),
            (17, "q"),
            (25, "y"),
            (26, "z"),
        ];
        for (k, v) in data {
            list.insert(k, v.to_string()).unwrap();
        }
        assert_eq!(list.len(), 10);

        assert_eq!(list.get(&9).as_deref().map(String::as_str), Some("i"));
        assert!(list.get(&18).is_none());

        assert_eq!(list.remove(&3).unwrap(), "c");
        assert_eq!(list.remove(&7).unwrap(), "g");
        assert_eq!(list.len(), 8);
        assert!(list.get(&3).is_none());
        assert!(list.get(&7).is_none());
        assert_eq!(keys_at(&list, 0), vec![1, 8, 9, 10, 16, 17, 25, 26]);
        assert_invariants(&list);
    }

    #[test]
    fn test_insert_some() {
        const TEST_COUNT: i32 = 10_000;

        let list = SkipList::with_seed(16, 7);
        for i in 0..TEST_COUNT {
            list.insert(i, i + 1).unwrap();
        }
        assert_eq!(list.len(), TEST_COUNT as usize);

        let view = list.read();
        let mut count = 0;
        for (i, (k, v)) in view.iter().enumerate() {
            assert_eq!(*k, i as i32);
            assert_eq!(*v, i as i32 + 1);
            count += 1;
        }
        assert_eq!(count, TEST_COUNT);
        drop(view);

        for i in 0..TEST_COUNT {
            assert_eq!(*list.get(&i).unwrap(), i + 1);
        }
    }

    #[test]
    fn test_shuffled_insert_keeps_order() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut keys = (0..2_000).collect_vec();
        keys.shuffle(&mut rng);

        let list = SkipList::with_seed(12, 3);
        for k in keys.iter() {
            list.insert(*k, format!("v{k}")).unwrap();
        }
        assert_invariants(&list);

        let view = list.read();
        let all = view.iter().map(|(k, v)| (*k, v.clone())).collect_vec();
        let expected = (0..2_000).map(|k| (k, format!("v{k}"))).collect_vec();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_duplicate_key() {
        let list = SkipList::with_seed(6, 11);
        list.insert(5, "five".to_string()).unwrap();
        list.insert(6, "six".to_string()).unwrap();
        let before = snapshot(&list);

        assert_eq!(list.insert(5, "again".to_string()), Err(Error::DuplicateKey));
        assert_eq!(list.len(), 2);
        assert_eq!(snapshot(&list), before);
        assert_eq!(*list.get(&5).unwrap(), "five");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let list = SkipList::with_seed(6, 5);
        for k in [2, 4, 6, 8] {
            list.insert(k, k.to_string()).unwrap();
        }
        let before = snapshot(&list);
        let level = list.level();

        assert_eq!(list.remove(&5), Err(Error::NotFound));
        assert_eq!(list.remove(&100), Err(Error::NotFound));
        assert_eq!(list.remove(&-1), Err(Error::NotFound));
        assert_eq!(snapshot(&list), before);
        assert_eq!(list.level(), level);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_scripted_structure() {
        let list = SkipList::with_generator(4, Scripted::new(&[3, 1, 2]));
        list.insert(10, "a".to_string()).unwrap();
        list.insert(20, "b".to_string()).unwrap();
        list.insert(30, "c".to_string()).unwrap();

        assert_eq!(list.level(), 3);
        assert_eq!(keys_at(&list, 0), vec![10, 20, 30]);
        assert_eq!(keys_at(&list, 1), vec![10, 20, 30]);
        assert_eq!(keys_at(&list, 2), vec![10, 30]);
        assert_eq!(keys_at(&list, 3), vec![10]);
        assert!(keys_at(&list, 4).is_empty());
        assert!(keys_at(&list, 9).is_empty());
        assert_eq!(
            list.to_string(),
            "Level 0: (10, a)(20, b)(30, c)\n\
             Level 1: (10, a)(20, b)(30, c)\n\
             Level 2: (10, a)(30, c)\n\
             Level 3: (10, a)\n"
        );

        // height relaxes as the tallest nodes go away
        assert_eq!(list.remove(&10).unwrap(), "a");
        assert_eq!(list.level(), 2);
        assert_eq!(keys_at(&list, 2), vec![30]);

        assert_eq!(list.remove(&30).unwrap(), "c");
        assert_eq!(list.level(), 1);

        assert_eq!(list.remove(&20).unwrap(), "b");
        assert_eq!(list.level(), 0);
        assert!(list.is_empty());
        assert_invariants(&list);
    }

    #[test]
    fn test_generator_clamped() {
        let list = SkipList::with_generator(3, Scripted::new(&[0, 17]));
        list.insert(1, "x".to_string()).unwrap();
        list.insert(2, "y".to_string()).unwrap();

        let view = list.read();
        assert_eq!(view.node(&1).unwrap().level(), 1);
        assert_eq!(view.node(&2).unwrap().level(), 3);
        assert_eq!(view.level(), 3);
    }

    #[test]
    fn test_delete_then_search() {
        let list = SkipList::with_seed(8, 21);
        for k in 0..200 {
            list.insert(k, k.to_string()).unwrap();
        }

        for k in (0..200).step_by(3) {
            let len = list.len();
            assert_eq!(list.remove(&k).unwrap(), k.to_string());
            assert!(list.get(&k).is_none());
            assert_eq!(list.len(), len - 1);
        }
        assert_invariants(&list);

        for k in 0..200 {
            assert_eq!(list.contains_key(&k), k % 3 != 0);
        }

        let view = list.read();
        assert_eq!(view.len(), 133);
        assert_eq!(view.get(&1).map(String::as_str), Some("1"));
        assert!(view.get(&0).is_none());
        assert!(view.get(&198).is_none());
        assert!((0..200).filter(|k| view.get(k).is_some()).all(|k| k % 3 != 0));
    }

    #[test]
    fn test_remove_all_relaxes_height() {
        let list = SkipList::with_seed(10, 8);
        let mut keys = (0..500).collect_vec();
        for k in keys.iter() {
            list.insert(*k, String::new()).unwrap();
        }
        keys.shuffle(&mut StdRng::seed_from_u64(8));

        for k in keys.iter() {
            list.remove(k).unwrap();
            assert_invariants(&list);
        }
        assert!(list.is_empty());
        assert_eq!(list.level(), 0);
    }

    #[test]
    fn test_update_value() {
        let list = SkipList::with_seed(6, 2);
        list.insert(1, "old".to_string()).unwrap();

        assert_eq!(list.update(&1, "new".to_string()).unwrap(), "old");
        assert_eq!(*list.get(&1).unwrap(), "new");
        assert_eq!(list.len(), 1);

        assert_eq!(list.update(&2, "none".to_string()), Err(Error::NotFound));
        assert!(list.get(&2).is_none());
    }

    #[test]
    fn test_reuse_after_remove() {
        let list = SkipList::with_seed(6, 4);
        for k in 0..50 {
            list.insert(k, k.to_string()).unwrap();
        }
        for k in 0..50 {
            list.remove(&k).unwrap();
        }
        for k in (0..50).rev() {
            list.insert(k, format!("again{k}")).unwrap();
        }
        assert_eq!(list.len(), 50);
        assert_eq!(*list.get(&25).unwrap(), "again25");
        assert_invariants(&list);
    }

    #[test]
    fn test_clear() {
        let list = SkipList::with_seed(6, 6);
        for k in 0..100 {
            list.insert(k, k.to_string()).unwrap();
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.level(), 0);
        assert!(list.read().iter().next().is_none());

        list.insert(3, "three".to_string()).unwrap();
        assert_eq!(keys_at(&list, 0), vec![3]);
    }

    #[test]
    fn test_iter_restartable() {
        let list = SkipList::with_seed(6, 10);
        for k in [5, 1, 3] {
            list.insert(k, k.to_string()).unwrap();
        }
        let view = list.read();
        let first = view.iter().collect_vec();
        let second = view.iter().collect_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_object_drop() {
        static DROP_COUNTER: AtomicUsize = AtomicUsize::new(0);

        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
        struct DropItem {
            key: usize,
        }

        impl DropItem {
            fn new(key: usize) -> Self {
                DROP_COUNTER.fetch_add(1, Ordering::SeqCst);
                Self { key }
            }
        }

        impl Drop for DropItem {
            fn drop(&mut self) {
                DROP_COUNTER.fetch_sub(1, Ordering::SeqCst);
            }
        }

        let list = SkipList::with_seed(8, 0);
        for key in 1..=5 {
            list.insert(DropItem::new(key), ()).unwrap();
        }
        assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 5);

        // the rejected duplicate is dropped right away
        assert_eq!(list.insert(DropItem::new(3), ()), Err(Error::DuplicateKey));
        assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 5);

        list.remove(&DropItem::new(2)).unwrap();
        assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 4);

        drop(list);
        assert_eq!(DROP_COUNTER.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insert_concurrent() {
        const THREADS: i32 = 4;
        const TEST_COUNT: i32 = 2_000;

        let list = SkipList::with_seed(12, 13);

        crossbeam::scope(|s| {
            for i in 0..THREADS {
                let list = &list;
                s.spawn(move |_| {
                    let offset = i * TEST_COUNT;
                    for j in 0..TEST_COUNT {
                        list.insert(j + offset, (j + offset).to_string()).unwrap();
                    }
                    for j in 0..TEST_COUNT {
                        assert_eq!(*list.get(&(j + offset)).unwrap(), (j + offset).to_string());
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(list.len(), (THREADS * TEST_COUNT) as usize);
        assert_invariants(&list);
    }

    #[test]
    fn test_readers_during_writes() {
        const TEST_COUNT: i32 = 3_000;

        let list = SkipList::with_seed(12, 17);

        crossbeam::scope(|s| {
            let list = &list;
            s.spawn(move |_| {
                for k in 0..TEST_COUNT {
                    list.insert(k, k.to_string()).unwrap();
                    if k % 2 == 1 {
                        list.remove(&(k - 1)).unwrap();
                    }
                }
            });

            for _ in 0..2 {
                s.spawn(move |_| {
                    for _ in 0..50 {
                        let view = list.read();
                        let keys = view.iter().map(|(k, _)| *k).collect_vec();
                        assert!(keys.iter().tuple_windows().all(|(a, b)| a < b));
                        assert_eq!(keys.len(), view.len());
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(list.len(), (TEST_COUNT / 2) as usize);
        assert_invariants(&list);
    }
}
