//! Filtered, sorted live view over a mutable item set

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

type Filter<C, T> = Box<dyn Fn(&C, T) -> bool + Send>;
type SortKey<C, T, K> = Box<dyn Fn(&C, T) -> K + Send>;

#[derive(Debug, Clone, Copy)]
struct Member<K> {
    key: K,
    passes: bool,
}

/// Items of a backing set that pass a filter, kept ordered by a sort key
///
/// The filter and the sort key are read from a context `C` owned elsewhere
/// (the collection observes items, it does not own their state). When an
/// item's filter input or sort input changes, the owner calls
/// [`on_filter_changed`](Self::on_filter_changed) or
/// [`on_sort_key_changed`](Self::on_sort_key_changed); only that item is
/// re-evaluated, in O(log n).
///
/// Ties on the sort key fall back to the item's own ordering.
pub struct FilterSortCollection<T, C: ?Sized, K> {
    filter: Filter<C, T>,
    sort_key: SortKey<C, T, K>,
    members: HashMap<T, Member<K>>,
    visible: BTreeSet<(K, T)>,
}

impl<T, C, K> FilterSortCollection<T, C, K>
where
    T: Copy + Eq + Hash + Ord,
    C: ?Sized,
    K: Copy + Ord,
{
    /// Create an empty collection
    pub fn new(
        filter: impl Fn(&C, T) -> bool + Send + 'static,
        sort_key: impl Fn(&C, T) -> K + Send + 'static,
    ) -> Self {
        Self {
            filter: Box::new(filter),
            sort_key: Box::new(sort_key),
            members: HashMap::new(),
            visible: BTreeSet::new(),
        }
    }

    /// Record membership; the item is visible at once if it passes the filter
    ///
    /// Returns false (and changes nothing) if the item is already a member.
    pub fn add(&mut self, context: &C, item: T) -> bool {
        if self.members.contains_key(&item) {
            return false;
        }

        let member = self.evaluate(context, item);
        if member.passes {
            self.visible.insert((member.key, item));
        }
        self.members.insert(item, member);
        true
    }

    /// Drop membership; returns false for non-members
    pub fn remove(&mut self, item: T) -> bool {
        match self.members.remove(&item) {
            Some(member) => {
                if member.passes {
                    self.visible.remove(&(member.key, item));
                }
                true
            }
            None => false,
        }
    }

    /// Whether the item is in the backing set
    pub fn contains(&self, item: T) -> bool {
        self.members.contains_key(&item)
    }

    /// Whether the item currently passes the filter
    pub fn is_visible(&self, item: T) -> bool {
        self.members.get(&item).is_some_and(|member| member.passes)
    }

    /// Re-test the filter for one item
    ///
    /// Returns whether the item's visibility flipped.
    pub fn on_filter_changed(&mut self, context: &C, item: T) -> bool {
        let Some(member) = self.members.get_mut(&item) else {
            return false;
        };

        let passes = (self.filter)(context, item);
        if passes == member.passes {
            return false;
        }

        member.passes = passes;
        if passes {
            self.visible.insert((member.key, item));
        } else {
            self.visible.remove(&(member.key, item));
        }
        true
    }

    /// Recompute one item's sort key and move it to its new position
    pub fn on_sort_key_changed(&mut self, context: &C, item: T) -> bool {
        let Some(member) = self.members.get_mut(&item) else {
            return false;
        };

        let key = (self.sort_key)(context, item);
        if key == member.key {
            return false;
        }

        if member.passes {
            self.visible.remove(&(member.key, item));
            self.visible.insert((key, item));
        }
        member.key = key;
        true
    }

    /// Re-filter and re-sort every member after bulk external changes
    pub fn rebuild_cache(&mut self, context: &C) {
        self.visible.clear();

        let items: Vec<T> = self.members.keys().copied().collect();
        for item in items {
            let member = self.evaluate(context, item);
            if member.passes {
                self.visible.insert((member.key, item));
            }
            self.members.insert(item, member);
        }
    }

    /// Visible items in sort order
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.visible.iter().map(|(_, item)| *item)
    }

    /// Copy of the visible items in sort order
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Run `action` over a snapshot of the visible items
    ///
    /// The action may mutate the collection. The snapshot is taken before
    /// the first call: filter and order changes made along the way apply
    /// from the next iteration, and items removed along the way are
    /// skipped.
    pub fn for_each_filtered(&mut self, mut action: impl FnMut(&mut Self, T)) {
        for item in self.snapshot() {
            if self.contains(item) {
                action(self, item);
            }
        }
    }

    /// Number of members, visible or not
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the backing set is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members passing the filter
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Remove every member
    pub fn clear(&mut self) {
        self.members.clear();
        self.visible.clear();
    }

    fn evaluate(&self, context: &C, item: T) -> Member<K> {
        Member {
            key: (self.sort_key)(context, item),
            passes: (self.filter)(context, item),
        }
    }
}

impl<T, C: ?Sized, K> fmt::Debug for FilterSortCollection<T, C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSortCollection")
            .field("members", &self.members.len())
            .field("visible", &self.visible.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// item -> (enabled, order)
    type State = HashMap<u32, (bool, i32)>;

    fn collection() -> FilterSortCollection<u32, State, i32> {
        FilterSortCollection::new(
            |state: &State, item| state.get(&item).is_some_and(|(enabled, _)| *enabled),
            |state: &State, item| state.get(&item).map_or(0, |(_, order)| *order),
        )
    }

    fn expected(state: &State, members: &[u32]) -> Vec<u32> {
        let mut passing: Vec<u32> = members.iter().copied().filter(|item| state[item].0).collect();
        passing.sort_by_key(|item| (state[item].1, *item));
        passing
    }

    #[test]
    fn test_add_respects_filter_and_order() {
        let state: State = [(1, (true, 3)), (2, (true, 1)), (3, (false, 0)), (4, (true, 2))].into();
        let mut items = collection();
        for item in [1, 2, 3, 4] {
            assert!(items.add(&state, item));
        }

        assert_eq!(items.snapshot(), vec![2, 4, 1]);
        assert_eq!(items.len(), 4);
        assert_eq!(items.visible_len(), 3);
        assert!(items.contains(3));
        assert!(!items.is_visible(3));
    }

    #[test]
    fn test_duplicate_add_and_missing_remove_are_noops() {
        let mut state: State = [(1, (true, 0))].into();
        let mut items = collection();

        assert!(items.add(&state, 1));
        state.insert(1, (true, 9));
        assert!(!items.add(&state, 1));
        assert!(!items.remove(5));
        assert_eq!(items.snapshot(), vec![1]);

        assert!(items.remove(1));
        assert!(!items.remove(1));
        assert!(items.is_empty());
    }

    #[test]
    fn test_filter_toggle_moves_item_in_and_out() {
        let mut state: State = [(1, (true, 0)), (2, (true, 1))].into();
        let mut items = collection();
        items.add(&state, 1);
        items.add(&state, 2);

        state.insert(1, (false, 0));
        assert!(items.on_filter_changed(&state, 1));
        assert!(!items.on_filter_changed(&state, 1));
        assert_eq!(items.snapshot(), vec![2]);

        state.insert(1, (true, 0));
        assert!(items.on_filter_changed(&state, 1));
        assert_eq!(items.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_sort_key_change_repositions_without_readd() {
        let mut state: State = [(1, (true, 3)), (2, (true, 1)), (3, (true, 2))].into();
        let mut items = collection();
        for item in [1, 2, 3] {
            items.add(&state, item);
        }
        assert_eq!(items.snapshot(), vec![2, 3, 1]);

        state.insert(1, (true, 0));
        assert!(items.on_sort_key_changed(&state, 1));
        assert_eq!(items.snapshot(), vec![1, 2, 3]);

        // Key change on a hidden item is remembered for when it returns
        state.insert(2, (false, 10));
        items.on_filter_changed(&state, 2);
        items.on_sort_key_changed(&state, 2);
        state.insert(2, (true, 10));
        items.on_filter_changed(&state, 2);
        assert_eq!(items.snapshot(), vec![1, 3, 2]);
    }

    #[test]
    fn test_rebuild_cache_after_bulk_changes() {
        let mut state: State = (0..10).map(|item| (item, (true, item as i32))).collect();
        let mut items = collection();
        for item in 0..10 {
            items.add(&state, item);
        }

        for (item, entry) in state.iter_mut() {
            *entry = (item % 2 == 0, -(*item as i32));
        }
        items.rebuild_cache(&state);

        assert_eq!(items.snapshot(), vec![8, 6, 4, 2, 0]);
    }

    #[test]
    fn test_for_each_filtered_iterates_snapshot() {
        let mut state: State = [(1, (true, 0)), (2, (true, 1)), (3, (true, 2))].into();
        let mut items = collection();
        for item in [1, 2, 3] {
            items.add(&state, item);
        }

        let mut visited = Vec::new();
        items.for_each_filtered(|items, item| {
            visited.push(item);
            if item == 1 {
                // Hide 2 and drop 3 mid-iteration
                state.insert(2, (false, 1));
                items.on_filter_changed(&state, 2);
                items.remove(3);
            }
        });

        assert_eq!(visited, vec![1, 2]);
        assert_eq!(items.snapshot(), vec![1]);
    }

    #[test]
    fn test_random_operations_stay_consistent() {
        let mut seed = 7u64;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        let mut state: State = (0..32).map(|item| (item, (true, 0))).collect();
        let mut items = collection();
        let mut members: Vec<u32> = Vec::new();

        for _ in 0..2000 {
            let item = next(32) as u32;
            match next(4) {
                0 => {
                    if items.add(&state, item) {
                        members.push(item);
                    }
                }
                1 => {
                    if items.remove(item) {
                        members.retain(|other| *other != item);
                    }
                }
                2 => {
                    let entry = state.get_mut(&item).unwrap();
                    entry.0 = !entry.0;
                    items.on_filter_changed(&state, item);
                }
                _ => {
                    state.get_mut(&item).unwrap().1 = next(8) as i32 - 4;
                    items.on_sort_key_changed(&state, item);
                }
            }

            assert_eq!(items.snapshot(), expected(&state, &members));
        }
    }
}
