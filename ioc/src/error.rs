//! Error types reported by the container.

use std::any::type_name;
use thiserror::Error;

/// Returned when a registration would replace an existing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
  #[error("service of type {service} is already registered in this container")]
  Duplicate { service: &'static str },
}

impl RegistrationError {
  /// Builds a [`RegistrationError::Duplicate`] naming `T`.
  pub fn duplicate<T: ?Sized>() -> Self {
    RegistrationError::Duplicate {
      service: type_name::<T>(),
    }
  }
}

/// Returned by [`Container::get_required`](crate::Container::get_required).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("no service of type {service} is registered")]
  Missing { service: &'static str },
}
