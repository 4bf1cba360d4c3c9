use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::model::Arity;

/// Errors surfaced by a store chain, without parameter context.
///
/// The driver attaches the owning `ArgumentDefinition` when it converts these
/// into the public `ParseError`.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum StoreError {
    #[error("Only a single value is expected.")]
    DuplicateValue,

    #[error("A value is required.")]
    MissingRequired,

    #[error("Received {count} values, outside the arity {arity}.")]
    OutOfRange { arity: Arity, count: usize },
}

pub(crate) type Link<T> = Rc<RefCell<Store<T>>>;

/// One node in a store chain.
///
/// The enum closes the set of accumulation policies; `Map` erases its output
/// type behind [`MapLink`] so a chain can change value type mid-stream. Links
/// are built once at declaration time; after that the only mutation is value
/// accumulation.
pub(crate) enum Store<T> {
    /// Holds at most one value; rejects a second write unless an aggregate
    /// sits somewhere downstream (cached in `enforce_single` during pre-parse).
    Single {
        value: Option<T>,
        enforce_single: bool,
        next: Option<Link<T>>,
    },
    /// Flag presence; any write sets it, the payload is forwarded but ignored.
    Presence { seen: bool, next: Option<Link<T>> },
    /// Supplies a fallback from the producer if never written by parse end.
    Default {
        value: Option<T>,
        fallback: Box<dyn Fn() -> T>,
        next: Option<Link<T>>,
    },
    /// Fails post-parse validation if never written.
    Required { value: Option<T> },
    /// Transforms every incoming value; the output type is erased here.
    Map(Rc<RefCell<dyn MapLink<T>>>),
    /// Ordered accumulation within an inclusive arity range.
    Collect { values: Vec<T>, arity: Arity },
    /// Occurrence counting; accepts unbounded writes.
    Count { count: usize },
}

impl<T: Clone + 'static> Store<T> {
    /// Apply this node's policy to `value`, forwarding to the tail on success.
    pub(crate) fn store_value(&mut self, value: T) -> Result<(), StoreError> {
        match self {
            Store::Single {
                value: held,
                enforce_single,
                next,
            } => {
                if held.is_some() && *enforce_single {
                    return Err(StoreError::DuplicateValue);
                }

                held.replace(value.clone());
                forward(next, value)
            }
            Store::Presence { seen, next } => {
                *seen = true;
                forward(next, value)
            }
            Store::Default {
                value: held, next, ..
            } => {
                held.replace(value.clone());
                forward(next, value)
            }
            Store::Required { value: held } => {
                held.replace(value);
                Ok(())
            }
            Store::Map(inner) => inner.borrow_mut().store_value(value),
            Store::Collect { values, .. } => {
                values.push(value);
                Ok(())
            }
            Store::Count { count } => {
                *count += 1;
                Ok(())
            }
        }
    }

    /// The chain-wide backpressure signal: can this chain take another value
    /// right now? Decorated nodes defer to their tail; leaves accept while no
    /// value is held.
    pub(crate) fn will_accept_value(&self) -> bool {
        match self {
            Store::Single { value, next, .. } | Store::Default { value, next, .. } => match next {
                Some(link) => link.borrow().will_accept_value(),
                None => value.is_none(),
            },
            Store::Presence { next, .. } => match next {
                Some(link) => link.borrow().will_accept_value(),
                None => false,
            },
            Store::Required { value } => value.is_none(),
            Store::Map(inner) => inner.borrow().will_accept_value(),
            Store::Collect { values, arity } => arity.is_open(values.len()),
            Store::Count { .. } => true,
        }
    }

    /// Whether this node, or any node downstream of it, aggregates values.
    pub(crate) fn has_aggregate(&self) -> bool {
        match self {
            Store::Collect { .. } | Store::Count { .. } => true,
            Store::Single { next, .. }
            | Store::Presence { next, .. }
            | Store::Default { next, .. } => next
                .as_ref()
                .map_or(false, |link| link.borrow().has_aggregate()),
            Store::Required { .. } => false,
            Store::Map(inner) => inner.borrow().has_aggregate(),
        }
    }

    pub(crate) fn on_pre_parse(&mut self) {
        match self {
            Store::Single {
                enforce_single,
                next,
                ..
            } => {
                // The aggregate walk happens here, not at construction, because
                // the chain may be extended after the head is registered.
                *enforce_single = !next
                    .as_ref()
                    .map_or(false, |link| link.borrow().has_aggregate());

                if let Some(link) = next {
                    link.borrow_mut().on_pre_parse();
                }
            }
            Store::Presence { next, .. } | Store::Default { next, .. } => {
                if let Some(link) = next {
                    link.borrow_mut().on_pre_parse();
                }
            }
            Store::Map(inner) => inner.borrow_mut().on_pre_parse(),
            Store::Required { .. } | Store::Collect { .. } | Store::Count { .. } => {}
        }
    }

    /// Post-parse validation and defaulting. Decorators recurse and apply
    /// their own rule on the way, except `Default`, which backfills before
    /// delegating so a synthesized fallback reaches a downstream aggregate.
    pub(crate) fn on_post_parse(&mut self) -> Result<(), StoreError> {
        match self {
            Store::Single { next, .. } | Store::Presence { next, .. } => match next {
                Some(link) => link.borrow_mut().on_post_parse(),
                None => Ok(()),
            },
            Store::Default {
                value,
                fallback,
                next,
            } => {
                if value.is_none() {
                    let fallback_value = fallback();
                    value.replace(fallback_value.clone());
                    forward(next, fallback_value)?;
                }

                match next {
                    Some(link) => link.borrow_mut().on_post_parse(),
                    None => Ok(()),
                }
            }
            Store::Required { value } => {
                if value.is_none() {
                    Err(StoreError::MissingRequired)
                } else {
                    Ok(())
                }
            }
            Store::Map(inner) => inner.borrow_mut().on_post_parse(),
            Store::Collect { values, arity } => {
                if arity.contains(values.len()) {
                    Ok(())
                } else {
                    Err(StoreError::OutOfRange {
                        arity: *arity,
                        count: values.len(),
                    })
                }
            }
            Store::Count { .. } => Ok(()),
        }
    }
}

impl<T: Clone> Store<T> {
    pub(crate) fn scalar_value(&self) -> Option<T> {
        match self {
            Store::Single { value, .. }
            | Store::Default { value, .. }
            | Store::Required { value } => value.clone(),
            _ => unreachable!("internal error - not a scalar store"),
        }
    }

    pub(crate) fn presence(&self) -> bool {
        match self {
            Store::Presence { seen, .. } => *seen,
            _ => unreachable!("internal error - not a presence store"),
        }
    }

    pub(crate) fn collected(&self) -> Vec<T> {
        match self {
            Store::Collect { values, .. } => values.clone(),
            _ => unreachable!("internal error - not a collecting store"),
        }
    }

    pub(crate) fn occurrences(&self) -> usize {
        match self {
            Store::Count { count } => *count,
            _ => unreachable!("internal error - not a counting store"),
        }
    }
}

pub(crate) fn link<T>(store: Store<T>) -> Link<T> {
    Rc::new(RefCell::new(store))
}

/// Extend a chain by hanging `next` off a chainable tail node.
pub(crate) fn attach<T>(tail: &Link<T>, next: Link<T>) {
    match &mut *tail.borrow_mut() {
        Store::Single { next: slot, .. }
        | Store::Presence { next: slot, .. }
        | Store::Default { next: slot, .. } => {
            if slot.replace(next).is_some() {
                unreachable!("internal error - the chain is already extended");
            }
        }
        _ => unreachable!("internal error - store variant does not chain"),
    }
}

fn forward<T: Clone + 'static>(next: &Option<Link<T>>, value: T) -> Result<(), StoreError> {
    match next {
        Some(link) => link.borrow_mut().store_value(value),
        None => Ok(()),
    }
}

/// Input-facing view of a map node, held by the upstream chain.
pub(crate) trait MapLink<In> {
    fn store_value(&mut self, value: In) -> Result<(), StoreError>;
    fn will_accept_value(&self) -> bool;
    fn has_aggregate(&self) -> bool;
    fn on_pre_parse(&mut self);
    fn on_post_parse(&mut self) -> Result<(), StoreError>;
}

/// Output-facing view of a map node, held by the handle that reads it or
/// extends the chain past it.
pub(crate) trait MapTail<Out> {
    fn value(&self) -> Option<Out>;
    fn attach(&mut self, next: Link<Out>);
}

/// The one store whose input and output types differ. Both erased views are
/// implemented on this struct; each side of the chain sees only its own type.
pub(crate) struct MapStore<In, Out> {
    transform: Box<dyn Fn(In) -> Out>,
    value: Option<Out>,
    next: Option<Link<Out>>,
}

impl<In, Out> MapStore<In, Out> {
    pub(crate) fn new(transform: impl Fn(In) -> Out + 'static) -> Self {
        Self {
            transform: Box::new(transform),
            value: None,
            next: None,
        }
    }
}

impl<In: 'static, Out: Clone + 'static> MapLink<In> for MapStore<In, Out> {
    fn store_value(&mut self, value: In) -> Result<(), StoreError> {
        let transformed = (self.transform)(value);
        self.value.replace(transformed.clone());
        forward(&self.next, transformed)
    }

    fn will_accept_value(&self) -> bool {
        match &self.next {
            Some(link) => link.borrow().will_accept_value(),
            None => self.value.is_none(),
        }
    }

    fn has_aggregate(&self) -> bool {
        self.next
            .as_ref()
            .map_or(false, |link| link.borrow().has_aggregate())
    }

    fn on_pre_parse(&mut self) {
        if let Some(link) = &self.next {
            link.borrow_mut().on_pre_parse();
        }
    }

    fn on_post_parse(&mut self) -> Result<(), StoreError> {
        match &self.next {
            Some(link) => link.borrow_mut().on_post_parse(),
            None => Ok(()),
        }
    }
}

impl<In, Out: Clone> MapTail<Out> for MapStore<In, Out> {
    fn value(&self) -> Option<Out> {
        self.value.clone()
    }

    fn attach(&mut self, next: Link<Out>) {
        if self.next.replace(next).is_some() {
            unreachable!("internal error - the chain is already extended");
        }
    }
}
