//! Login start
//!
//! Mints a fresh state per request, records the desktop pairing token if
//! one was supplied, and returns the provider authorization URL.

use std::sync::Arc;

use oidc_client::{AuthorizeParams, generate_state};
use state_store::CorrelationStore;
use tracing::debug;
use url::Url;

use crate::callback::LoginBranch;
use crate::metrics;

pub struct Initiator {
    authorize: AuthorizeParams,
    store: Arc<CorrelationStore>,
}

impl Initiator {
    pub fn new(authorize: AuthorizeParams, store: Arc<CorrelationStore>) -> Self {
        Self { authorize, store }
    }

    /// Begin a login. A blank `pairing_token` is treated as absent, so no
    /// correlation is recorded and completion takes the standard branch.
    pub async fn start(&self, pairing_token: Option<&str>) -> Url {
        let state = generate_state();

        let branch = match pairing_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                self.store.insert(state.clone(), token).await;
                LoginBranch::Desktop {
                    pairing_token: token.to_owned(),
                }
            }
            None => LoginBranch::Standard,
        };

        debug!(branch = branch.label(), "login started");
        metrics::record_login_started(branch.label());
        self.authorize.authorization_url(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn initiator() -> (Initiator, Arc<CorrelationStore>) {
        let store = Arc::new(CorrelationStore::default());
        let authorize = AuthorizeParams::new(
            "https://idp.example.com/auth".parse().unwrap(),
            "bridge",
            "https://app.example.com/auth/complete".parse().unwrap(),
            &[],
        );
        (Initiator::new(authorize, store.clone()), store)
    }

    fn state_of(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn standard_start_records_nothing() {
        let (initiator, store) = initiator();
        let url = initiator.start(None).await;
        assert!(url.as_str().starts_with("https://idp.example.com/auth?"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn blank_pairing_token_counts_as_absent() {
        let (initiator, store) = initiator();
        initiator.start(Some("   ")).await;
        initiator.start(Some("")).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn desktop_start_correlates_state() {
        let (initiator, store) = initiator();
        let url = initiator.start(Some("dev-abc")).await;
        let state = state_of(&url);
        assert_eq!(store.take(&state).await.as_deref(), Some("dev-abc"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_starts_never_share_state() {
        let (initiator, store) = initiator();
        let initiator = Arc::new(initiator);
        let handles: Vec<_> = (0..200)
            .map(|i| {
                let initiator = initiator.clone();
                tokio::spawn(async move {
                    let token = format!("tok-{i}");
                    state_of(&initiator.start(Some(&token)).await)
                })
            })
            .collect();

        let mut states = HashSet::new();
        for handle in handles {
            states.insert(handle.await.unwrap());
        }
        assert_eq!(states.len(), 200);
        assert_eq!(store.len().await, 200);
    }
}
