//! Public macros for ergonomic service resolution.

/// Resolves a required service from a container.
///
/// This is the usual way for factories and bootstrap code to pull
/// dependencies. It panics if the requested service is not registered; use
/// [`Container::get`](crate::Container::get) or
/// [`Container::get_required`](crate::Container::get_required) for the
/// non-panicking forms.
///
/// # Panics
///
/// Panics if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use conduit_ioc::{resolve, Container};
///
/// let container = Container::new();
/// container.add_singleton(|_| String::from("hello"));
///
/// let message = resolve!(container, String);
/// assert_eq!(*message, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  ($container:expr, $type:ty) => {
    $container.get::<$type>().unwrap_or_else(|| {
      panic!(
        "Failed to resolve required service: {}",
        std::any::type_name::<$type>()
      )
    })
  };
}
