//! # Conduit IoC
//!
//! A thread-safe, type-keyed singleton container.
//!
//! Services are registered against their concrete type (or a trait object via
//! the shared-`Arc` registration methods) and resolved as `Arc<T>`. Singleton
//! factories run lazily, at most once, and receive the container so they can
//! resolve their own dependencies.
//!
//! ## Core Concepts
//!
//! - **Container**: owns every registration. There is no global instance; create
//!   one per application (or per test) and pass it where it is needed.
//! - **Fallible registration**: `try_add_*` rejects a second registration of the
//!   same type with [`RegistrationError::Duplicate`] and leaves the container
//!   unchanged, while `add_*` overwrites.
//! - **Resolution**: `get` returns an `Option`, `get_required` a `Result`, and
//!   the [`resolve!`] macro panics on a missing dependency.
//!
//! ## Quick Start
//!
//! ```
//! use conduit_ioc::{resolve, Container};
//! use std::sync::Arc;
//!
//! struct Config {
//!   url: String,
//! }
//!
//! struct Client {
//!   config: Arc<Config>,
//! }
//!
//! let container = Container::new();
//! container.add_instance(Config { url: "mem://orders".into() });
//! container
//!   .try_add_singleton(|c| Client { config: resolve!(c, Config) })
//!   .unwrap();
//!
//! // A second registration of the same service is rejected.
//! assert!(container.try_add_singleton(|c| Client { config: resolve!(c, Config) }).is_err());
//!
//! let client = resolve!(container, Client);
//! assert_eq!(client.config.url, "mem://orders");
//! ```

mod container;
mod core;
mod error;
mod macros;

pub use container::Container;
pub use error::{RegistrationError, ResolveError};
