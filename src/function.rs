//! Function roles and their combinators.
//!
//! Each role is a thin wrapper over a boxed closure with a single call
//! method:
//!
//! | Role             | Shape            | Call       |
//! |------------------|------------------|------------|
//! | `Function`       | `A -> B`         | `apply`    |
//! | `UnaryOperator`  | `T -> T`         | `apply`    |
//! | `BinaryOperator` | `(T, T) -> T`    | `apply`    |
//! | `Predicate`      | `&T -> bool`     | `test`     |
//! | `Consumer`       | `&T -> ()`       | `accept`   |
//! | `Supplier`       | `() -> T`        | `get`      |
//! | `Comparator`     | `(&T, &T) -> Ordering` | `compare` |
//!
//! ## Composition order
//!
//! `f.compose(g)` applies `g` first, then `f`. `f.and_then(g)` applies `f`
//! first, then `g`:
//!
//! ```
//! use streams_rs::Function;
//!
//! let double = Function::new(|n: i32| n * 2);
//! let add_three = Function::new(|n: i32| n + 3);
//! assert_eq!(double.compose(add_three).apply(4), 14);
//!
//! let double = Function::new(|n: i32| n * 2);
//! let add_three = Function::new(|n: i32| n + 3);
//! assert_eq!(double.and_then(add_three).apply(4), 11);
//! ```

use std::cmp::Ordering;

/// A boolean-valued test over a borrowed value.
pub struct Predicate<'a, T: ?Sized> {
    test: Box<dyn Fn(&T) -> bool + 'a>,
}

impl<'a, T: ?Sized + 'a> Predicate<'a, T> {
    pub fn new(test: impl Fn(&T) -> bool + 'a) -> Self {
        Self {
            test: Box::new(test),
        }
    }

    pub fn test(&self, value: &T) -> bool {
        (self.test)(value)
    }

    /// Logical AND. `other` is only evaluated when `self` holds.
    pub fn and(self, other: Predicate<'a, T>) -> Self {
        Predicate::new(move |v| self.test(v) && other.test(v))
    }

    /// Logical OR. `other` is only evaluated when `self` fails.
    pub fn or(self, other: Predicate<'a, T>) -> Self {
        Predicate::new(move |v| self.test(v) || other.test(v))
    }

    pub fn negate(self) -> Self {
        Predicate::new(move |v| !self.test(v))
    }

    /// Static form of [`Predicate::negate`].
    pub fn not(predicate: Predicate<'a, T>) -> Self {
        predicate.negate()
    }
}

impl<'a, T: PartialEq + 'a> Predicate<'a, T> {
    /// Holds for values equal to `target`.
    pub fn is_equal(target: T) -> Self {
        Predicate::new(move |v| *v == target)
    }
}

/// A transformation from `A` to `B`.
pub struct Function<'a, A, B> {
    apply: Box<dyn Fn(A) -> B + 'a>,
}

/// A function whose input and output types coincide.
pub type UnaryOperator<'a, T> = Function<'a, T, T>;

impl<'a, A: 'a, B: 'a> Function<'a, A, B> {
    pub fn new(apply: impl Fn(A) -> B + 'a) -> Self {
        Self {
            apply: Box::new(apply),
        }
    }

    pub fn apply(&self, input: A) -> B {
        (self.apply)(input)
    }

    /// Returns a function that applies `before` to its input, then `self`.
    pub fn compose<Z: 'a>(self, before: Function<'a, Z, A>) -> Function<'a, Z, B> {
        Function::new(move |z| self.apply(before.apply(z)))
    }

    /// Returns a function that applies `self` to its input, then `after`.
    pub fn and_then<C: 'a>(self, after: Function<'a, B, C>) -> Function<'a, A, C> {
        Function::new(move |a| after.apply(self.apply(a)))
    }
}

impl<'a, T: 'a> Function<'a, T, T> {
    pub fn identity() -> Self {
        Function::new(|t| t)
    }
}

/// Combines two values of the same type into one.
pub struct BinaryOperator<'a, T> {
    apply: Box<dyn Fn(T, T) -> T + 'a>,
}

impl<'a, T: 'a> BinaryOperator<'a, T> {
    pub fn new(apply: impl Fn(T, T) -> T + 'a) -> Self {
        Self {
            apply: Box::new(apply),
        }
    }

    pub fn apply(&self, left: T, right: T) -> T {
        (self.apply)(left, right)
    }

    /// Returns the lesser of two values; ties keep the left one.
    pub fn min_by(comparator: Comparator<'a, T>) -> Self {
        BinaryOperator::new(move |a, b| {
            if comparator.compare(&a, &b) != Ordering::Greater {
                a
            } else {
                b
            }
        })
    }

    /// Returns the greater of two values; ties keep the left one.
    pub fn max_by(comparator: Comparator<'a, T>) -> Self {
        BinaryOperator::new(move |a, b| {
            if comparator.compare(&a, &b) != Ordering::Less {
                a
            } else {
                b
            }
        })
    }
}

/// A side-effecting operation on a borrowed value.
pub struct Consumer<'a, T: ?Sized> {
    accept: Box<dyn FnMut(&T) + 'a>,
}

impl<'a, T: ?Sized + 'a> Consumer<'a, T> {
    pub fn new(accept: impl FnMut(&T) + 'a) -> Self {
        Self {
            accept: Box::new(accept),
        }
    }

    pub fn accept(&mut self, value: &T) {
        (self.accept)(value)
    }

    /// Runs `self`, then `after`, on each accepted value.
    pub fn and_then(mut self, mut after: Consumer<'a, T>) -> Self {
        Consumer::new(move |v| {
            self.accept(v);
            after.accept(v);
        })
    }
}

/// Produces a value on demand.
pub struct Supplier<'a, T> {
    get: Box<dyn Fn() -> T + 'a>,
}

impl<'a, T: 'a> Supplier<'a, T> {
    pub fn new(get: impl Fn() -> T + 'a) -> Self {
        Self { get: Box::new(get) }
    }

    pub fn get(&self) -> T {
        (self.get)()
    }
}

/// A total ordering over borrowed values.
pub struct Comparator<'a, T: ?Sized> {
    compare: Box<dyn Fn(&T, &T) -> Ordering + 'a>,
}

impl<'a, T: ?Sized + 'a> Comparator<'a, T> {
    pub fn new(compare: impl Fn(&T, &T) -> Ordering + 'a) -> Self {
        Self {
            compare: Box::new(compare),
        }
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// Orders by a key extracted from each value.
    pub fn comparing<K: Ord>(key: impl Fn(&T) -> K + 'a) -> Self {
        Comparator::new(move |a, b| key(a).cmp(&key(b)))
    }

    /// Orders by a key extracted from each value, using `key_order` on keys.
    pub fn comparing_with<K: 'a>(
        key: impl Fn(&T) -> K + 'a,
        key_order: Comparator<'a, K>,
    ) -> Self {
        Comparator::new(move |a, b| key_order.compare(&key(a), &key(b)))
    }

    pub fn reversed(self) -> Self {
        Comparator::new(move |a, b| self.compare(a, b).reverse())
    }

    /// Breaks ties of `self` with `next`.
    pub fn then_comparing(self, next: Comparator<'a, T>) -> Self {
        Comparator::new(move |a, b| self.compare(a, b).then_with(|| next.compare(a, b)))
    }
}

impl<'a, T: Ord + ?Sized + 'a> Comparator<'a, T> {
    pub fn natural() -> Self {
        Comparator::new(|a: &T, b: &T| a.cmp(b))
    }
}
