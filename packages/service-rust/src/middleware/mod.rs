//! Built-in middleware layers for handler slots.
//!
//! - [`timeout`]: Per-dispatch deadline enforcement
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`trace`]: Dispatch timing and outcome via `tracing` spans
//!
//! Each layer is a `tower::Layer` over a [`RouteService`](crate::route::RouteService)
//! stack; erase one with [`boxed_layer`](crate::route::boxed_layer) to place
//! it in a slot's layer sequence at registration time.

pub mod load_shed;
pub mod timeout;
pub mod trace;

pub use load_shed::LoadShedLayer;
pub use timeout::TimeoutLayer;
pub use trace::TraceLayer;
