//! Fluent builder for constructing an [`Animator`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;

use dx_core::{SessionId, SyncConfig};
use dx_spatial::{RouteResolver, Router};

use crate::mirror::LocalMirror;
use crate::{AnimatorResult, Animator, FinalizeProposal, RouteRequest};

/// Receiving ends of the two queues an [`Animator`] feeds.
///
/// Hand them to [`route_task`][crate::route_task] and
/// [`finalizer_task`][crate::finalizer_task], or drain them by hand in tests.
pub struct AnimatorQueues {
    pub routes:        mpsc::Receiver<RouteRequest>,
    pub finalizations: mpsc::Receiver<FinalizeProposal>,
}

/// Fluent builder for [`Animator<R>`].
///
/// | Method         | Default                 |
/// |----------------|-------------------------|
/// | `.config(c)`   | `SyncConfig::default()` |
///
/// Each client owns its resolver: the animator prunes the resolver's cache
/// down to the routes its own mirror still needs.
///
/// # Example
///
/// ```rust,ignore
/// let resolver = Arc::new(RouteResolver::new(router, config.default_anchor));
/// let (mut animator, queues) = AnimatorBuilder::new(resolver, session)
///     .config(config)
///     .build()?;
/// animator.tick(clock.now(), &mut NoopObserver);
/// ```
pub struct AnimatorBuilder<R: Router> {
    resolver: Arc<RouteResolver<R>>,
    session:  SessionId,
    config:   Option<SyncConfig>,
}

impl<R: Router> AnimatorBuilder<R> {
    pub fn new(resolver: Arc<RouteResolver<R>>, session: SessionId) -> Self {
        Self { resolver, session, config: None }
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the configuration, size both queues, and return the animator
    /// with the queue receivers.
    pub fn build(self) -> AnimatorResult<(Animator<R>, AnimatorQueues)> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let (route_tx, routes) = mpsc::channel(config.route_queue_capacity);
        let (finalize_tx, finalizations) = mpsc::channel(config.finalize_queue_capacity);

        let animator = Animator {
            mirror:    LocalMirror::new(self.session),
            resolver:  self.resolver,
            markers:   HashMap::new(),
            requested: HashSet::new(),
            arrived:   HashMap::new(),
            proposed:  HashMap::new(),
            route_tx,
            finalize_tx,
            config,
        };
        Ok((animator, AnimatorQueues { routes, finalizations }))
    }
}
