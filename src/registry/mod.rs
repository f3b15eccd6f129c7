use std::future::Future;

use tracing::warn;

pub(crate) use client::RegistryClient;
pub(crate) use error::ClientError;
pub(crate) use reference::{check_repository, check_tag};

mod auth;
mod client;
mod error;
mod reference;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub repository: String,
    pub name: String,
    /// `None` when the registry has no manifest for this tag.
    pub content_digest: Option<String>,
    pub media_type: Option<String>,
    pub size: Option<u64>,
}

/// The registry operations the browser needs.
pub trait RegistryApi: Send + Sync + 'static {
    fn repositories(&self) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send;

    fn find_repository(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Repository, ClientError>> + Send;

    fn find_tag(
        &self,
        repository: &str,
        name: &str,
    ) -> impl Future<Output = Result<Tag, ClientError>> + Send;

    /// Deletes the manifest behind `tag`. `Ok(false)` means the registry did
    /// not delete anything without reporting an error.
    fn delete_tag(&self, tag: &Tag) -> impl Future<Output = Result<bool, ClientError>> + Send;

    /// Refreshes credentials after the registry answered with 401.
    fn reauthenticate(&self) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Runs `operation`, re-authenticating and running it again each time the
/// registry answers 401, at most `retries` times. The final 401 is returned
/// to the caller.
pub async fn with_reauth<R, T, F, Fut>(
    registry: &R,
    retries: u32,
    mut operation: F,
) -> Result<T, ClientError>
where
    R: RegistryApi,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Err(ClientError::Unauthorized) if attempt < retries => {
                attempt += 1;
                warn!(attempt, retries, "Registry rejected credentials, reauthenticating");
                registry.reauthenticate().await?;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use test_log::test;

    use crate::tests::FakeRegistry;

    use super::*;

    #[test(tokio::test)]
    async fn retries_after_reauthenticating() {
        let registry = FakeRegistry::new()
            .with_tag("foo", "latest", Some("sha256:aaaa"))
            .fail_find("latest", ClientError::Unauthorized);

        let tag = with_reauth(&registry, 1, || registry.find_tag("foo", "latest"))
            .await
            .unwrap();

        assert_eq!(tag.content_digest.as_deref(), Some("sha256:aaaa"));
        assert_eq!(registry.reauthentications.load(Ordering::SeqCst), 1);
    }

    #[test(tokio::test)]
    async fn gives_up_when_budget_is_spent() {
        let registry = FakeRegistry::new()
            .with_tag("foo", "latest", Some("sha256:aaaa"))
            .fail_find("latest", ClientError::Unauthorized)
            .fail_find("latest", ClientError::Unauthorized)
            .fail_find("latest", ClientError::Unauthorized);

        let result = with_reauth(&registry, 2, || registry.find_tag("foo", "latest")).await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(registry.reauthentications.load(Ordering::SeqCst), 2);
    }

    #[test(tokio::test)]
    async fn zero_budget_never_reauthenticates() {
        let registry = FakeRegistry::new()
            .with_tag("foo", "latest", Some("sha256:aaaa"))
            .fail_find("latest", ClientError::Unauthorized);

        let result = with_reauth(&registry, 0, || registry.find_tag("foo", "latest")).await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert_eq!(registry.reauthentications.load(Ordering::SeqCst), 0);
    }

    #[test(tokio::test)]
    async fn other_errors_are_not_retried() {
        let registry = FakeRegistry::new()
            .with_tag("foo", "latest", Some("sha256:aaaa"))
            .fail_find("latest", ClientError::MethodNotAllowed);

        let result = with_reauth(&registry, 1, || registry.find_tag("foo", "latest")).await;

        assert!(matches!(result, Err(ClientError::MethodNotAllowed)));
        assert_eq!(registry.reauthentications.load(Ordering::SeqCst), 0);
    }
}
