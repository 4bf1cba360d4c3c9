use std::cell::RefCell;
use std::ops::RangeBounds;
use std::rc::Rc;

use crate::model::Arity;
use crate::store::{attach, link, Link, MapLink, MapStore, MapTail, Store};

/// The attach-point a chainable handle holds: either a plain store node, or
/// the typed output side of a map node.
enum Tail<T> {
    Node(Link<T>),
    Mapped(Rc<RefCell<dyn MapTail<T>>>),
}

/// A chainable, readable handle over a single-valued chain position.
///
/// Declarations return `Scalar<String>`; the chaining methods grow the store
/// chain and move the handle to the new tail. Read the bound value through
/// [`Scalar::value`] once `parse` has returned.
pub struct Scalar<T> {
    tail: Tail<T>,
}

impl<T> std::fmt::Debug for Scalar<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scalar").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Scalar<T> {
    pub(crate) fn head(node: Link<T>) -> Self {
        Self {
            tail: Tail::Node(node),
        }
    }

    /// The value bound during parsing, if any.
    pub fn value(&self) -> Option<T> {
        match &self.tail {
            Tail::Node(node) => node.borrow().scalar_value(),
            Tail::Mapped(node) => node.borrow().value(),
        }
    }

    /// Transform every incoming value through `transform` before storing.
    pub fn map<U: Clone + 'static>(self, transform: impl Fn(T) -> U + 'static) -> Scalar<U> {
        let map_node = Rc::new(RefCell::new(MapStore::new(transform)));
        let input_side: Rc<RefCell<dyn MapLink<T>>> = Rc::clone(&map_node) as _;
        self.extend(Store::Map(input_side));

        let output_side: Rc<RefCell<dyn MapTail<U>>> = map_node;
        Scalar {
            tail: Tail::Mapped(output_side),
        }
    }

    /// Fall back to `fallback()` if no value arrives by the end of the parse.
    pub fn default(self, fallback: impl Fn() -> T + 'static) -> Scalar<T> {
        let node = self.extend(Store::Default {
            value: None,
            fallback: Box::new(fallback),
            next: None,
        });

        Scalar {
            tail: Tail::Node(node),
        }
    }

    /// Fail the parse if no value arrives.
    pub fn require(self) -> Required<T> {
        Required {
            node: self.extend(Store::Required { value: None }),
        }
    }

    /// Accumulate every value in order, enforcing `arity` at the end of the
    /// parse. Any range works: `..` for unbounded, `1..=2` for one-or-two.
    pub fn collect(self, arity: impl RangeBounds<usize>) -> Collection<T> {
        Collection {
            node: self.extend(Store::Collect {
                values: Vec::default(),
                arity: Arity::new(arity),
            }),
        }
    }

    /// Count occurrences instead of retaining values.
    pub fn count(self) -> Counter<T> {
        Counter {
            node: self.extend(Store::Count { count: 0 }),
        }
    }

    fn extend(self, store: Store<T>) -> Link<T> {
        let node = link(store);

        match self.tail {
            Tail::Node(tail) => attach(&tail, Rc::clone(&node)),
            Tail::Mapped(tail) => tail.borrow_mut().attach(Rc::clone(&node)),
        }

        node
    }
}

/// Handle over a declared no-value flag.
pub struct Flag {
    node: Link<bool>,
}

impl Flag {
    pub(crate) fn head(node: Link<bool>) -> Self {
        Self { node }
    }

    /// Whether the flag appeared at least once.
    pub fn is_set(&self) -> bool {
        self.node.borrow().presence()
    }

    /// Count occurrences instead (ex: `-vv --verbose` counts 3).
    pub fn count(self) -> Counter<bool> {
        let node = link(Store::Count { count: 0 });
        attach(&self.node, Rc::clone(&node));

        Counter { node }
    }
}

/// Read-only handle over a required value.
pub struct Required<T> {
    node: Link<T>,
}

impl<T: Clone> Required<T> {
    /// `Some` after a successful parse; `None` before parsing, or after a
    /// parse that failed.
    pub fn value(&self) -> Option<T> {
        self.node.borrow().scalar_value()
    }
}

/// Read-only handle over collected values.
pub struct Collection<T> {
    node: Link<T>,
}

impl<T: Clone> Collection<T> {
    /// The values accumulated during parsing, in order.
    pub fn values(&self) -> Vec<T> {
        self.node.borrow().collected()
    }
}

/// Read-only handle over an occurrence count.
pub struct Counter<T> {
    node: Link<T>,
}

impl<T: Clone> Counter<T> {
    /// How many times a value arrived during parsing.
    pub fn value(&self) -> usize {
        self.node.borrow().occurrences()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_head() -> (Link<String>, Scalar<String>) {
        let node = link(Store::Single {
            value: None,
            enforce_single: true,
            next: None,
        });
        (Rc::clone(&node), Scalar::head(node))
    }

    #[test]
    fn scalar_reads_head() {
        let (head, scalar) = single_head();

        head.borrow_mut().on_pre_parse();
        head.borrow_mut().store_value("ringo".to_string()).unwrap();

        assert_eq!(scalar.value(), Some("ringo".to_string()));
    }

    #[test]
    fn scalar_map_transforms() {
        let (head, scalar) = single_head();
        let age = scalar.map(|value| value.parse::<u32>().unwrap());

        head.borrow_mut().on_pre_parse();
        head.borrow_mut().store_value("10".to_string()).unwrap();

        assert_eq!(age.value(), Some(10));
    }

    #[test]
    fn scalar_map_then_collect() {
        let (head, scalar) = single_head();
        let values = scalar.map(|value| value.parse::<u32>().unwrap()).collect(..);

        head.borrow_mut().on_pre_parse();
        head.borrow_mut().store_value("1".to_string()).unwrap();
        head.borrow_mut().store_value("2".to_string()).unwrap();

        assert_eq!(values.values(), vec![1, 2]);
    }

    #[test]
    fn scalar_default_backfills() {
        let (head, scalar) = single_head();
        let value = scalar.default(|| "ZZZ".to_string());

        head.borrow_mut().on_pre_parse();
        head.borrow_mut().on_post_parse().unwrap();

        assert_eq!(value.value(), Some("ZZZ".to_string()));
    }

    #[test]
    fn scalar_require_reads_after_write() {
        let (head, scalar) = single_head();
        let required = scalar.require();

        head.borrow_mut().on_pre_parse();
        assert_eq!(required.value(), None);

        head.borrow_mut().store_value("x".to_string()).unwrap();
        head.borrow_mut().on_post_parse().unwrap();

        assert_eq!(required.value(), Some("x".to_string()));
    }

    #[test]
    fn flag_counts_occurrences() {
        let node = link(Store::Presence {
            seen: false,
            next: None,
        });
        let head = Rc::clone(&node);
        let counter = Flag::head(node).count();

        head.borrow_mut().on_pre_parse();
        for _ in 0..3 {
            head.borrow_mut().store_value(true).unwrap();
        }

        assert_eq!(counter.value(), 3);
    }
}
