//! Core, non-public data structures for the IoC container.

use crate::container::Container;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

thread_local! {
  // The set of services currently being resolved on this thread. A key that is
  // already present means a factory re-entered its own resolution.
  static RESOLVING_STACK: RefCell<HashSet<InjectionKey>> = RefCell::new(HashSet::new());
}

/// An RAII guard to detect and prevent circular dependencies.
///
/// When created, it adds a service key to the thread-local resolution stack.
/// If the key is already present we have a circular dependency, and it panics.
/// When the guard is dropped, it removes the key from the stack.
pub(crate) struct ResolutionGuard {
  key: InjectionKey,
}

impl ResolutionGuard {
  pub(crate) fn new(key: InjectionKey) -> Self {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if !stack.insert(key) {
        panic!(
          "Circular dependency detected while resolving service: {:?}",
          key
        );
      }
    });
    Self { key }
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

/// Identifies a service by the `TypeId` of its type.
///
/// The type name is carried for diagnostics only; equality and hashing use the
/// `TypeId`, so two types sharing a short name never collide.
#[derive(Clone, Copy)]
pub(crate) struct InjectionKey {
  pub(crate) type_id: TypeId,
  pub(crate) type_name: &'static str,
}

impl InjectionKey {
  pub(crate) fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
    }
  }
}

impl PartialEq for InjectionKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for InjectionKey {}

impl Hash for InjectionKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for InjectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.type_name)
  }
}

pub(crate) type BoxedService = Box<dyn Any + Send + Sync>;
pub(crate) type ServiceFactory = Box<dyn Fn(&Container) -> BoxedService + Send + Sync>;

/// A lazily initialized singleton slot.
///
/// The boxed value is always an `Arc<T>` for the registered service type, so
/// resolution hands out clones of one shared allocation.
pub(crate) struct Provider {
  cell: once_cell::sync::OnceCell<BoxedService>,
  factory: ServiceFactory,
}

impl Provider {
  pub(crate) fn lazy(factory: ServiceFactory) -> Self {
    Self {
      cell: once_cell::sync::OnceCell::new(),
      factory,
    }
  }

  pub(crate) fn ready(instance: BoxedService) -> Self {
    Self {
      cell: once_cell::sync::OnceCell::with_value(instance),
      factory: Box::new(|_: &Container| panic!("Pre-initialized singleton factory should not be called")),
    }
  }

  /// Returns the singleton, running the factory at most once across all threads.
  pub(crate) fn get_or_init(&self, container: &Container) -> &BoxedService {
    self.cell.get_or_init(|| (self.factory)(container))
  }

  pub(crate) fn is_initialized(&self) -> bool {
    self.cell.get().is_some()
  }
}
