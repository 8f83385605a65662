//! The world the agent acts on.
//!
//! An [`Environment`] executes dispatched actions, plays spoken commentary,
//! and produces the perceptions the runner feeds to the current state.
//! Failures while executing an action come back as perceptions, never as
//! errors.
//!
//! - [`local`]: [`LocalEnvironment`](local::LocalEnvironment), backed by a
//!   directory on disk.

pub mod local;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::perception::{Dispatch, Perception};

/// Boxed future returned by [`Environment`] methods.
pub type EnvFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait Environment: Send + Sync {
    /// Execute an action. Its outcome arrives later as a perception.
    fn dispatch<'a>(&'a self, dispatch: Dispatch) -> EnvFuture<'a, ()>;

    /// Play spoken chunks as they arrive, until the producer closes.
    fn speak<'a>(&'a self, chunks: mpsc::Receiver<String>) -> EnvFuture<'a, ()>;

    /// The next perception, or `None` once the session is over.
    fn next_perception<'a>(&'a self) -> EnvFuture<'a, Option<Perception>>;
}
