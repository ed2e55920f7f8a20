//! Lazy, typed pipeline builder.
//!
//! `Pipeline` wraps an iterator and exposes the stage vocabulary
//! (map, filter, sort, distinct, skip, limit) plus the terminal operations.
//! Nothing runs until a terminal pulls values through the chain; sorting
//! materializes its input on the first pull.
//!
//! ```
//! use streams_rs::{Customer, pipeline};
//!
//! let customers = vec![
//!     Customer::new(1, "Kofi", "Boateng", "kofi@example.com", "Male", 51),
//!     Customer::new(2, "Esi", "Owusu", "esi@example.com", "Female", 15),
//!     Customer::new(3, "Yaw", "Asante", "yaw@example.com", "Male", 51),
//! ];
//!
//! let ages: Vec<u32> = pipeline::from_slice(&customers)
//!     .sorted_by(|a, b| a.age().cmp(&b.age()))
//!     .map(|c| c.age())
//!     .distinct()
//!     .collect();
//!
//! assert_eq!(ages, vec![15, 51]);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;

/// A lazy chain of stages over an iterator source.
pub struct Pipeline<I: Iterator> {
    iter: I,
}

/// Build a pipeline that clones elements out of a borrowed slice.
///
/// The slice itself is never modified.
pub fn from_slice<T: Clone>(items: &[T]) -> Pipeline<std::iter::Cloned<std::slice::Iter<'_, T>>> {
    Pipeline::new(items.iter().cloned())
}

impl<I: Iterator> Pipeline<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }

    /// Apply `f` to each element in source order.
    pub fn map<B, F>(self, f: F) -> Pipeline<std::iter::Map<I, F>>
    where
        F: FnMut(I::Item) -> B,
    {
        Pipeline::new(self.iter.map(f))
    }

    /// Keep only elements for which `predicate` holds.
    pub fn filter<P>(self, predicate: P) -> Pipeline<std::iter::Filter<I, P>>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Pipeline::new(self.iter.filter(predicate))
    }

    /// Stable sort with an explicit comparator.
    pub fn sorted_by<F>(self, compare: F) -> Pipeline<Sorted<I, F>>
    where
        F: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        Pipeline::new(Sorted::new(self.iter, compare))
    }

    /// Stable sort by natural order.
    #[allow(clippy::type_complexity)]
    pub fn sorted(self) -> Pipeline<Sorted<I, fn(&I::Item, &I::Item) -> Ordering>>
    where
        I::Item: Ord,
    {
        self.sorted_by(<I::Item as Ord>::cmp as fn(&I::Item, &I::Item) -> Ordering)
    }

    /// Drop repeated values; the first occurrence wins.
    pub fn distinct(self) -> Pipeline<Distinct<I>>
    where
        I::Item: Eq + Hash + Clone,
    {
        Pipeline::new(Distinct::new(self.iter))
    }

    pub fn skip(self, n: usize) -> Pipeline<std::iter::Skip<I>> {
        Pipeline::new(self.iter.skip(n))
    }

    pub fn limit(self, n: usize) -> Pipeline<std::iter::Take<I>> {
        Pipeline::new(self.iter.take(n))
    }

    /// Observe each element as it passes without changing it.
    pub fn peek<F>(self, f: F) -> Pipeline<std::iter::Inspect<I, F>>
    where
        F: FnMut(&I::Item),
    {
        Pipeline::new(self.iter.inspect(f))
    }

    // Terminal operations

    pub fn collect<B: FromIterator<I::Item>>(self) -> B {
        self.iter.collect()
    }

    pub fn find_first(mut self) -> Option<I::Item> {
        self.iter.next()
    }

    /// Return any surviving element.
    ///
    /// Evaluation is sequential, so this is always the first match. Callers
    /// must not rely on that: ordering is relaxed for this operation.
    pub fn find_any(self) -> Option<I::Item> {
        self.find_first()
    }

    pub fn count(self) -> usize {
        self.iter.count()
    }

    pub fn for_each<F: FnMut(I::Item)>(self, f: F) {
        self.iter.for_each(f)
    }
}

impl<I: Iterator> IntoIterator for Pipeline<I> {
    type Item = I::Item;
    type IntoIter = I;

    fn into_iter(self) -> I {
        self.iter
    }
}

/// Iterator adapter that sorts its whole input on the first pull.
pub struct Sorted<I: Iterator, F> {
    pending: Option<(I, F)>,
    sorted: std::vec::IntoIter<I::Item>,
}

impl<I: Iterator, F> Sorted<I, F>
where
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    pub fn new(iter: I, compare: F) -> Self {
        Self {
            pending: Some((iter, compare)),
            sorted: Vec::new().into_iter(),
        }
    }
}

impl<I: Iterator, F> Iterator for Sorted<I, F>
where
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some((iter, mut compare)) = self.pending.take() {
            let mut items: Vec<I::Item> = iter.collect();
            items.sort_by(&mut compare);
            self.sorted = items.into_iter();
        }
        self.sorted.next()
    }
}

/// Iterator adapter that drops values already seen.
pub struct Distinct<I: Iterator> {
    iter: I,
    seen: HashSet<I::Item>,
}

impl<I: Iterator> Distinct<I>
where
    I::Item: Eq + Hash + Clone,
{
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            seen: HashSet::new(),
        }
    }
}

impl<I: Iterator> Iterator for Distinct<I>
where
    I::Item: Eq + Hash + Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let seen = &mut self.seen;
        self.iter.find(|item| seen.insert(item.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Customer;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    fn customers() -> Vec<Customer> {
        [15, 22, 51, 51, 8]
            .iter()
            .enumerate()
            .map(|(i, &age)| {
                Customer::new(
                    i as u32 + 1,
                    &format!("First{i}"),
                    &format!("Last{i}"),
                    &format!("user{i}@example.com"),
                    if i % 2 == 0 { "Female" } else { "Male" },
                    age,
                )
            })
            .collect()
    }

    #[test]
    fn test_sort_map_distinct_collect() {
        let data = customers();
        let ages: Vec<u32> = from_slice(&data)
            .sorted_by(|a, b| a.age().cmp(&b.age()))
            .map(|c| c.age())
            .distinct()
            .collect();
        assert_eq!(ages, vec![8, 15, 22, 51]);
    }

    #[test]
    fn test_filter_count() {
        let data = customers();
        assert_eq!(from_slice(&data).filter(|c| c.age() > 50).count(), 2);
    }

    #[test]
    fn test_map_emails() {
        let data = customers();
        let emails: Vec<String> = from_slice(&data).map(|c| c.email().to_string()).collect();
        assert_eq!(emails.len(), 5);
        assert_eq!(emails[0], "user0@example.com");
    }

    #[test]
    fn test_skip_limit_window() {
        let names: Vec<i32> = Pipeline::new(1..=10).skip(5).limit(3).collect();
        assert_eq!(names, vec![6, 7, 8]);
    }

    #[test]
    fn test_skip_past_end_is_empty() {
        let out: Vec<i32> = Pipeline::new(vec![1, 2, 3].into_iter()).skip(10).collect();
        assert!(out.is_empty());
    }

    #[test]
    fn test_limit_past_end_keeps_remaining() {
        let out: Vec<i32> = Pipeline::new(vec![1, 2, 3].into_iter()).skip(1).limit(10).collect();
        assert_eq!(out, vec![2, 3]);
    }

    #[test]
    fn test_find_first() {
        let data = customers();
        let first = from_slice(&data).filter(|c| c.age() < 20).find_first();
        assert_eq!(first.map(|c| c.age()), Some(15));
        assert!(from_slice(&data).filter(|c| c.age() > 100).find_first().is_none());
    }

    #[test]
    fn test_find_any_sequential_is_first() {
        let data = customers();
        let any = from_slice(&data).filter(|c| c.age() < 18).find_any();
        assert_eq!(any.map(|c| c.age()), Some(15));
    }

    #[test]
    fn test_collect_into_btreeset() {
        let data = customers();
        let ages: BTreeSet<u32> = from_slice(&data)
            .sorted_by(|a, b| a.age().cmp(&b.age()))
            .map(|c| c.age())
            .collect();
        assert_eq!(ages.into_iter().collect::<Vec<_>>(), vec![8, 15, 22, 51]);
    }

    #[test]
    fn test_map_is_lazy_until_terminal() {
        let calls = Cell::new(0);
        let pipeline = Pipeline::new(0..).map(|n| {
            calls.set(calls.get() + 1);
            n * 2
        });
        assert_eq!(calls.get(), 0);
        // Infinite source: limit bounds the work done.
        let out: Vec<i32> = pipeline.limit(3).collect();
        assert_eq!(out, vec![0, 2, 4]);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_find_first_short_circuits() {
        let calls = Cell::new(0);
        let found = Pipeline::new(1..=100)
            .peek(|_| calls.set(calls.get() + 1))
            .filter(|n| n % 7 == 0)
            .find_first();
        assert_eq!(found, Some(7));
        assert_eq!(calls.get(), 7);
    }

    #[test]
    fn test_sorted_is_stable() {
        let pairs = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let out: Vec<(i32, char)> = Pipeline::new(pairs.into_iter())
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect();
        assert_eq!(out, vec![(0, 'b'), (0, 'd'), (1, 'a'), (1, 'c')]);
    }

    #[test]
    fn test_sorted_natural() {
        let out: Vec<i32> = Pipeline::new(vec![3, 1, 2].into_iter()).sorted().collect();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        let out: Vec<i32> = Pipeline::new(vec![3, 1, 3, 2, 1].into_iter())
            .distinct()
            .collect();
        assert_eq!(out, vec![3, 1, 2]);
    }

    #[test]
    fn test_source_is_not_mutated() {
        let data = customers();
        let before = data.clone();
        let _: Vec<Customer> = from_slice(&data)
            .sorted_by(|a, b| b.age().cmp(&a.age()))
            .collect();
        assert_eq!(data, before);
    }

    #[test]
    fn test_for_each_and_into_iter() {
        let mut total = 0;
        Pipeline::new(1..=4).for_each(|n| total += n);
        assert_eq!(total, 10);

        let doubled: Vec<i32> = Pipeline::new(1..=3).map(|n| n * 2).into_iter().collect();
        assert_eq!(doubled, vec![2, 4, 6]);
    }
}
