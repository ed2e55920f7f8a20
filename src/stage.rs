//! Declarative stage descriptors and the pipeline evaluator.
//!
//! A [`StagePipeline`] binds an ordered list of [`Stage`]s to a borrowed
//! source slice. Stages are plain descriptors; nothing is applied until a
//! terminal operation (`collect`, `find_first`, `find_any`, `count`) runs.
//! Every terminal re-derives its values from the source, so a pipeline can
//! be consumed any number of times and the source is never modified.
//!
//! Stage order determines semantics: `SORT` before `DISTINCT` is not the
//! same pipeline as `DISTINCT` before `SORT`.
//!
//! ```
//! use streams_rs::{Comparator, StagePipeline};
//!
//! let ages = [15, 22, 51, 51, 8];
//! let out = StagePipeline::new(&ages)
//!     .sort_by(Comparator::natural())
//!     .distinct()
//!     .to_list()
//!     .unwrap();
//! assert_eq!(out, vec![8, 15, 22, 51]);
//! ```

use crate::error::{Result, StreamError};
use crate::function::{Comparator, Function, Predicate, UnaryOperator};
use crate::pipeline::Distinct;
use crate::record::{Customer, Item};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

/// A value that can flow through a [`StagePipeline`].
///
/// `natural_cmp` returns `None` when two values have no natural order
/// relative to each other. Types whose values never have one set
/// `HAS_NATURAL_ORDER` to `false`, so sorting them without a comparator
/// fails even on empty input.
pub trait Element: Clone + Eq + Hash {
    const HAS_NATURAL_ORDER: bool = true;

    fn natural_cmp(&self, other: &Self) -> Option<Ordering>;
}

macro_rules! ord_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                fn natural_cmp(&self, other: &Self) -> Option<Ordering> {
                    Some(self.cmp(other))
                }
            }
        )*
    };
}

ord_element!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, char, bool, String,
);

impl Element for &str {
    fn natural_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Element for Customer {
    const HAS_NATURAL_ORDER: bool = false;

    fn natural_cmp(&self, _other: &Self) -> Option<Ordering> {
        None
    }
}

impl Element for Item {
    fn natural_cmp(&self, other: &Self) -> Option<Ordering> {
        Item::natural_cmp(self, other)
    }
}

/// One step of a declarative pipeline.
pub enum Stage<'a, T> {
    /// Apply a function to each element.
    Transform(UnaryOperator<'a, T>),
    /// Keep elements satisfying the predicate.
    Filter(Predicate<'a, T>),
    /// Stable sort. `None` means natural order.
    Sort(Option<Comparator<'a, T>>),
    /// Drop repeated values, first occurrence wins.
    Distinct,
    /// Drop the first `n` elements.
    Skip(usize),
    /// Keep at most `n` elements.
    Limit(usize),
}

impl<'a, T: 'a> Stage<'a, T> {
    pub fn transform(f: impl Fn(T) -> T + 'a) -> Self {
        Stage::Transform(Function::new(f))
    }

    pub fn filter(p: impl Fn(&T) -> bool + 'a) -> Self {
        Stage::Filter(Predicate::new(p))
    }

    pub fn sort_by(comparator: Comparator<'a, T>) -> Self {
        Stage::Sort(Some(comparator))
    }

    /// Sort by natural order.
    pub fn sorted() -> Self {
        Stage::Sort(None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Transform(_) => "TRANSFORM",
            Stage::Filter(_) => "FILTER",
            Stage::Sort(_) => "SORT",
            Stage::Distinct => "DISTINCT",
            Stage::Skip(_) => "SKIP",
            Stage::Limit(_) => "LIMIT",
        }
    }
}

/// Container shape requested from [`StagePipeline::collect`].
pub enum ContainerKind<'a, T> {
    /// Ordered list in pipeline order.
    List,
    /// Hash set; duplicates merged, no order.
    Set,
    /// Sorted set; values equal under the comparator are merged (first
    /// inserted wins) and ordering follows the comparator. `None` means
    /// natural order.
    SortedSet(Option<Comparator<'a, T>>),
}

/// Materialized result of [`StagePipeline::collect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected<T: Eq + Hash> {
    List(Vec<T>),
    Set(HashSet<T>),
    SortedSet(Vec<T>),
}

impl<T: Eq + Hash> Collected<T> {
    pub fn len(&self) -> usize {
        match self {
            Collected::List(v) | Collected::SortedSet(v) => v.len(),
            Collected::Set(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a Vec. Set contents come out in unspecified order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collected::List(v) | Collected::SortedSet(v) => v,
            Collected::Set(s) => s.into_iter().collect(),
        }
    }
}

/// An ordered list of stages bound to a source slice.
pub struct StagePipeline<'s, 'a, T> {
    source: &'s [T],
    stages: Vec<Stage<'a, T>>,
}

impl<'s, 'a, T: Element + 'a> StagePipeline<'s, 'a, T> {
    pub fn new(source: &'s [T]) -> Self {
        Self {
            source,
            stages: Vec::new(),
        }
    }

    /// Bind an already-built stage list to a source.
    pub fn with_stages(source: &'s [T], stages: Vec<Stage<'a, T>>) -> Self {
        Self { source, stages }
    }

    pub fn stage(mut self, stage: Stage<'a, T>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn transform(self, f: impl Fn(T) -> T + 'a) -> Self {
        self.stage(Stage::transform(f))
    }

    pub fn filter(self, p: impl Fn(&T) -> bool + 'a) -> Self {
        self.stage(Stage::filter(p))
    }

    pub fn filter_with(self, predicate: Predicate<'a, T>) -> Self {
        self.stage(Stage::Filter(predicate))
    }

    pub fn sort_by(self, comparator: Comparator<'a, T>) -> Self {
        self.stage(Stage::sort_by(comparator))
    }

    pub fn sorted(self) -> Self {
        self.stage(Stage::sorted())
    }

    pub fn distinct(self) -> Self {
        self.stage(Stage::Distinct)
    }

    pub fn skip(self, n: usize) -> Self {
        self.stage(Stage::Skip(n))
    }

    pub fn limit(self, n: usize) -> Self {
        self.stage(Stage::Limit(n))
    }

    pub fn stages(&self) -> &[Stage<'a, T>] {
        &self.stages
    }

    // Terminal operations

    /// Materialize the results into the requested container.
    pub fn collect(&self, kind: ContainerKind<'a, T>) -> Result<Collected<T>> {
        let values = self.evaluate()?;
        let collected = match kind {
            ContainerKind::List => Collected::List(values.collect()),
            ContainerKind::Set => Collected::Set(values.collect()),
            ContainerKind::SortedSet(comparator) => {
                let index = self.stages.len();
                Collected::SortedSet(sorted_set(index, values.collect(), comparator.as_ref())?)
            }
        };
        debug!(kind = collected_name(&collected), len = collected.len(), "collected");
        Ok(collected)
    }

    /// Shorthand for collecting into an ordered list.
    pub fn to_list(&self) -> Result<Vec<T>> {
        Ok(self.evaluate()?.collect())
    }

    pub fn find_first(&self) -> Result<Option<T>> {
        Ok(self.evaluate()?.next())
    }

    /// Return any surviving element.
    ///
    /// Evaluation is sequential, so this is the first match. Ordering is
    /// relaxed for this operation only; callers must not depend on which
    /// element is returned.
    pub fn find_any(&self) -> Result<Option<T>> {
        self.find_first()
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.evaluate()?.count())
    }

    /// Chain the stages over a fresh pass of the source.
    ///
    /// Streaming stages are wrapped lazily. A sort pulls its whole upstream
    /// when it is reached, which is where a missing comparator is detected,
    /// so a failing pipeline never yields partial output.
    fn evaluate(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        let mut values: Box<dyn Iterator<Item = T> + '_> = Box::new(self.source.iter().cloned());

        for (index, stage) in self.stages.iter().enumerate() {
            debug!(index, stage = stage.name(), "chaining stage");
            values = match stage {
                Stage::Transform(f) => Box::new(values.map(move |v| f.apply(v))),
                Stage::Filter(p) => Box::new(values.filter(move |v| p.test(v))),
                Stage::Sort(comparator) => {
                    let sorted = sort(index, values.collect(), comparator.as_ref())?;
                    Box::new(sorted.into_iter())
                }
                Stage::Distinct => Box::new(Distinct::new(values)),
                Stage::Skip(n) => Box::new(values.skip(*n)),
                Stage::Limit(n) => Box::new(values.take(*n)),
            };
        }

        Ok(values)
    }
}

fn collected_name<T: Eq + Hash>(collected: &Collected<T>) -> &'static str {
    match collected {
        Collected::List(_) => "list",
        Collected::Set(_) => "set",
        Collected::SortedSet(_) => "sorted_set",
    }
}

/// Fail unless every value is naturally comparable with the first.
fn ensure_natural_order<T: Element>(index: usize, stage: &str, values: &[T]) -> Result<()> {
    let comparable = match values.first() {
        _ if !T::HAS_NATURAL_ORDER => false,
        Some(first) => values.iter().all(|v| first.natural_cmp(v).is_some()),
        None => true,
    };
    if comparable {
        Ok(())
    } else {
        Err(StreamError::InvalidComparator {
            index,
            stage: stage.to_string(),
        })
    }
}

fn sort<T: Element>(
    index: usize,
    mut values: Vec<T>,
    comparator: Option<&Comparator<'_, T>>,
) -> Result<Vec<T>> {
    match comparator {
        Some(cmp) => values.sort_by(|a, b| cmp.compare(a, b)),
        None => {
            ensure_natural_order(index, "SORT", &values)?;
            values.sort_by(|a, b| a.natural_cmp(b).unwrap_or(Ordering::Equal));
        }
    }
    Ok(values)
}

/// Insert values one at a time, skipping any that compare equal to a value
/// already present.
fn sorted_set<T: Element>(
    index: usize,
    values: Vec<T>,
    comparator: Option<&Comparator<'_, T>>,
) -> Result<Vec<T>> {
    if comparator.is_none() {
        ensure_natural_order(index, "COLLECT", &values)?;
    }
    let compare = |a: &T, b: &T| match comparator {
        Some(cmp) => cmp.compare(a, b),
        None => a.natural_cmp(b).unwrap_or(Ordering::Equal),
    };

    let mut set: Vec<T> = Vec::with_capacity(values.len());
    for value in values {
        if let Err(pos) = set.binary_search_by(|probe| compare(probe, &value)) {
            set.insert(pos, value);
        }
    }
    Ok(set)
}
