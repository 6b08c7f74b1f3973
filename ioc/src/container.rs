//! The main `Container` struct and its associated methods.

use crate::core::{BoxedService, InjectionKey, Provider, ResolutionGuard};
use crate::error::{RegistrationError, ResolveError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

/// The Inversion of Control (IoC) container.
///
/// Holds one singleton registration per service type. It is thread-safe:
/// services can be registered and resolved concurrently through `&self`.
///
/// Each registration is keyed by the service's `TypeId`. Singletons are
/// created lazily on first resolution (exactly once, even when several
/// threads race to resolve) and are dropped together with the container.
#[derive(Default)]
pub struct Container {
  providers: DashMap<InjectionKey, Arc<Provider>>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn insert(&self, key: InjectionKey, provider: Provider) {
    trace!(service = key.type_name, "registering service");
    self.providers.insert(key, Arc::new(provider));
  }

  fn try_insert(&self, key: InjectionKey, provider: Provider) -> Result<(), RegistrationError> {
    match self.providers.entry(key) {
      Entry::Occupied(_) => Err(RegistrationError::Duplicate {
        service: key.type_name,
      }),
      Entry::Vacant(slot) => {
        trace!(service = key.type_name, "registering service");
        slot.insert(Arc::new(provider));
        Ok(())
      }
    }
  }

  fn owned_factory<T: Any + Send + Sync>(
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) -> Provider {
    Provider::lazy(Box::new(move |container: &Container| -> BoxedService {
      Box::new(Arc::new(factory(container)))
    }))
  }

  fn shared_factory<T: ?Sized + Any + Send + Sync>(
    factory: impl Fn(&Container) -> Arc<T> + Send + Sync + 'static,
  ) -> Provider {
    Provider::lazy(Box::new(move |container: &Container| -> BoxedService {
      Box::new(factory(container))
    }))
  }

  // --- PUBLIC API ---

  // --- Instance Registration ---

  /// Registers an already constructed value, replacing any previous registration.
  pub fn add_instance<T: Any + Send + Sync>(&self, instance: T) {
    self.insert(
      InjectionKey::of::<T>(),
      Provider::ready(Box::new(Arc::new(instance))),
    );
  }

  // --- Singleton Registration ---

  /// Registers a lazily constructed singleton, replacing any previous registration.
  ///
  /// The factory receives the container so it can resolve its own dependencies.
  pub fn add_singleton<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    self.insert(InjectionKey::of::<T>(), Self::owned_factory(factory));
  }

  /// Registers a singleton whose factory already produces the shared `Arc`.
  ///
  /// Use this when the instance is owned elsewhere too, or when `T` is a
  /// trait object.
  pub fn add_shared_singleton<T: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> Arc<T> + Send + Sync + 'static,
  ) {
    self.insert(InjectionKey::of::<T>(), Self::shared_factory(factory));
  }

  /// Registers a singleton, failing if `T` is already registered.
  ///
  /// The presence check and the insertion are a single atomic step; on error
  /// the container is left untouched.
  pub fn try_add_singleton<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) -> Result<(), RegistrationError> {
    self.try_insert(InjectionKey::of::<T>(), Self::owned_factory(factory))
  }

  /// Shared-`Arc` counterpart of [`Container::try_add_singleton`].
  pub fn try_add_shared_singleton<T: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> Arc<T> + Send + Sync + 'static,
  ) -> Result<(), RegistrationError> {
    self.try_insert(InjectionKey::of::<T>(), Self::shared_factory(factory))
  }

  /// Registers a singleton only if `T` is not registered yet.
  ///
  /// Returns `true` if this call added the registration. An existing
  /// registration is never overwritten.
  pub fn add_singleton_if_absent<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) -> bool {
    self
      .try_insert(InjectionKey::of::<T>(), Self::owned_factory(factory))
      .is_ok()
  }

  // --- Introspection ---

  /// Returns `true` if a service of type `T` is registered.
  pub fn contains<T: ?Sized + Any>(&self) -> bool {
    self.providers.contains_key(&InjectionKey::of::<T>())
  }

  /// Returns `true` if `T` is registered and its singleton has been created.
  pub fn is_resolved<T: ?Sized + Any>(&self) -> bool {
    self
      .providers
      .get(&InjectionKey::of::<T>())
      .map(|provider| provider.is_initialized())
      .unwrap_or(false)
  }

  /// The number of registered services.
  pub fn len(&self) -> usize {
    self.providers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.providers.is_empty()
  }

  /// Type names of every registered service, sorted. Intended for diagnostics.
  pub fn service_names(&self) -> Vec<&'static str> {
    let mut names: Vec<_> = self.providers.iter().map(|entry| entry.key().type_name).collect();
    names.sort_unstable();
    names
  }

  // --- Resolution ---

  /// Resolves a service from the container.
  ///
  /// Returns `None` if `T` is not registered. Panics if resolving `T`
  /// re-enters its own resolution on this thread (a circular dependency).
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    let key = InjectionKey::of::<T>();

    // The guard must exist before the singleton cell is touched: re-entering
    // `get_or_init` on the same cell would deadlock instead of panicking.
    let _guard = ResolutionGuard::new(key);

    // Clone the provider out so no map shard stays locked while a factory
    // runs and resolves its own dependencies.
    let provider = self.providers.get(&key).map(|entry| Arc::clone(entry.value()))?;

    let resolved = provider
      .get_or_init(self)
      .downcast_ref::<Arc<T>>()
      .cloned();
    resolved
  }

  /// Resolves a service, reporting a missing registration as an error.
  pub fn get_required<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
    self.get::<T>().ok_or(ResolveError::Missing {
      service: std::any::type_name::<T>(),
    })
  }
}

impl std::fmt::Debug for Container {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Container")
      .field("services", &self.service_names())
      .finish()
  }
}
