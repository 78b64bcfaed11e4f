//! Background tasks that do the awaiting for a client's frame loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use dx_core::Clock;
use dx_mobility::{Dispatcher, MovementStore};
use dx_spatial::{RouteResolver, Router};

use crate::{AnimatorQueues, FinalizeProposal, RouteRequest};

/// Attempts per finalization proposal before giving up on a failing store.
pub const FINALIZE_ATTEMPTS: u32 = 3;

/// Pause between finalization attempts.
pub const FINALIZE_BACKOFF: Duration = Duration::from_millis(250);

/// Resolve queued route keys.  Each request runs on its own task so a slow
/// provider never holds up routes for other resources.  Returns when the
/// animator is dropped.
pub async fn route_task<R: Router + 'static>(
    resolver:     Arc<RouteResolver<R>>,
    mut requests: mpsc::Receiver<RouteRequest>,
) {
    while let Some(request) = requests.recv().await {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move {
            let route = resolver.resolve(&request.key, Some(request.origin)).await;
            debug!(
                resource = %request.key.resource,
                epoch    = %request.key.epoch,
                fallback = route.fallback,
                "route ready"
            );
        });
    }
    debug!("route queue closed");
}

/// Apply queued finalization proposals through the store.
///
/// A `Stale` outcome is final.  A store error is retried up to
/// [`FINALIZE_ATTEMPTS`] times; another client's proposal for the same epoch
/// usually lands anyway.
pub async fn finalizer_task<S, C>(
    dispatcher:    Arc<Dispatcher<S, C>>,
    mut proposals: mpsc::Receiver<FinalizeProposal>,
) where
    S: MovementStore + 'static,
    C: Clock + 'static,
{
    while let Some(proposal) = proposals.recv().await {
        for attempt in 1..=FINALIZE_ATTEMPTS {
            match dispatcher.finalize(&proposal.resource, proposal.epoch).await {
                Ok(_) => break,
                Err(error) if attempt < FINALIZE_ATTEMPTS => {
                    debug!(resource = %proposal.resource, epoch = %proposal.epoch, attempt, %error, "finalize failed, retrying");
                    tokio::time::sleep(FINALIZE_BACKOFF).await;
                }
                Err(error) => {
                    warn!(
                        resource = %proposal.resource,
                        epoch    = %proposal.epoch,
                        %error,
                        "finalize failed, giving up"
                    );
                }
            }
        }
    }
    debug!("finalize queue closed");
}

/// Spawn both background tasks for one client.
pub fn spawn_client_tasks<S, C, R>(
    resolver:   Arc<RouteResolver<R>>,
    dispatcher: Arc<Dispatcher<S, C>>,
    queues:     AnimatorQueues,
) -> (JoinHandle<()>, JoinHandle<()>)
where
    S: MovementStore + 'static,
    C: Clock + 'static,
    R: Router + 'static,
{
    let routes = tokio::spawn(route_task(resolver, queues.routes));
    let finals = tokio::spawn(finalizer_task(dispatcher, queues.finalizations));
    (routes, finals)
}
