//! `dx-animator`: the client side of the movement engine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`mirror`]   | `LocalMirror` of the session's replicated rows                |
//! | [`animator`] | `Animator<R>` frame loop, queue messages, `FrameStats`        |
//! | [`builder`]  | `AnimatorBuilder`, `AnimatorQueues`                           |
//! | [`observer`] | `AnimatorObserver` trait, `NoopObserver`                      |
//! | [`session`]  | `ClientSession` selection / incident mode, `ClickAction`      |
//! | [`client`]   | `Client<S, C, R>`: feed drain, operator actions, `run` loop   |
//! | [`tasks`]    | route and finalizer background tasks                          |
//! | [`error`]    | `AnimatorError`, `AnimatorResult`                             |
//!
//! # Client loop
//!
//! ```text
//! every frame_interval_ms:
//!   ① drain    apply queued change-feed events to the mirror
//!                (lagged feed → full resync from the store)
//!   ② tick     Animator::tick, synchronous, never awaits
//!                ├─ route misses   → route queue     → route_task
//!                └─ arrivals       → finalize queue  → finalizer_task
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let resolver = Arc::new(RouteResolver::new(StraightLineRouter, config.default_anchor));
//! let (animator, queues) = AnimatorBuilder::new(Arc::clone(&resolver), session)
//!     .config(config)
//!     .build()?;
//! spawn_client_tasks(resolver, Arc::clone(&dispatcher), queues);
//! let mut client = Client::new(dispatcher, animator);
//! client.run(&mut NoopObserver, shutdown_rx).await?;
//! ```

pub mod animator;
pub mod builder;
pub mod client;
pub mod error;
pub mod mirror;
pub mod observer;
pub mod session;
pub mod tasks;


pub use animator::{Animator, FINALIZE_RETRY_MS, FinalizeProposal, FrameStats, RouteRequest};
pub use builder::{AnimatorBuilder, AnimatorQueues};
pub use client::Client;
pub use error::{AnimatorError, AnimatorResult};
pub use mirror::{LocalMirror, MirrorChange};
pub use observer::{AnimatorObserver, NoopObserver};
pub use session::{ClickAction, ClientSession};
pub use tasks::{FINALIZE_ATTEMPTS, FINALIZE_BACKOFF, finalizer_task, route_task, spawn_client_tasks};
