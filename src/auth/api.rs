use std::sync::Arc;

use crate::query::{use_subscription, QueryCache, QueryHandle};
use crate::subscription::{Emitter, ResourceKey, SubscriptionBridge, SubscriptionResult};
use crate::util::{PartialObserver, Unsubscribe};

const AUTH_USER_HOOK: &str = "use_auth_user";

/// Capability over the SDK's auth-state listener for one app.
///
/// `on_auth_state_changed` must report the current state once on registration (`None` when
/// signed out) and again after every sign-in or sign-out.
pub trait AuthStateSource<U>: Send + Sync {
    fn app_name(&self) -> String;

    fn on_auth_state_changed(&self, observer: PartialObserver<Option<U>>) -> Unsubscribe;
}

/// Tracks the signed-in user of an app.
///
/// All hooks for the same app share one auth-state listener. The first state resolves
/// [`QueryHandle::resolve`]; later sign-ins and sign-outs land in the cache under `query_key`.
pub fn use_auth_user<U, C, S>(
    cache: Arc<C>,
    bridge: &SubscriptionBridge<Option<U>>,
    query_key: ResourceKey,
    source: Arc<S>,
) -> SubscriptionResult<QueryHandle<Option<U>>>
where
    U: Clone + Send + Sync + 'static,
    C: QueryCache<Option<U>> + 'static,
    S: AuthStateSource<U> + 'static,
{
    let subscription_key = ResourceKey::from_key(&(AUTH_USER_HOOK, source.app_name()))?;

    Ok(use_subscription(
        cache,
        bridge,
        query_key,
        subscription_key,
        move |emitter: Emitter<Option<U>>| {
            let errors = emitter.clone();
            let observer = PartialObserver::new()
                .with_next(move |user: &Option<U>| emitter.emit(user.clone()))
                .with_error(move |err| errors.fail(err.clone()));
            source.on_auth_state_changed(observer)
        },
    ))
}
