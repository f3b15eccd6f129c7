//! Single and bulk tag deletion.
//!
//! Every tag goes through the same steps: resolve it, delete it, classify the
//! result. A 401 from the registry triggers a re-authentication and a fresh
//! attempt, bounded by the configured retry budget. A 405 means the registry
//! has deletion turned off.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    flash::Flash,
    metrics::{DeletionMetrics, Outcome},
    registry::{ClientError, RegistryApi, with_reauth},
};

pub(crate) const FEATURE_DISABLED: &str = "Tag deletion feature is not enabled.\nPlease set `ENABLE_DELETE_IMAGES=true` to enable it.";

#[derive(Debug, Error)]
pub(crate) enum DeletionError {
    #[error("{}", FEATURE_DISABLED)]
    FeatureDisabled,
    #[error("the registry rejected the configured credentials")]
    AuthRequired,
    #[error(transparent)]
    Client(ClientError),
}

impl From<ClientError> for DeletionError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => Self::AuthRequired,
            err => Self::Client(err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    Deleted(String),
    DeleteFailed(String),
    /// The registry does not allow deletion at all.
    Blocked(String),
}

impl DeleteOutcome {
    /// The flash for outcomes that redirect back to the repository.
    pub fn flash(&self) -> Option<Flash> {
        match self {
            Self::Deleted(name) => Some(Flash::notice(format!(
                "The tag {name} has been deleted."
            ))),
            Self::DeleteFailed(name) => Some(Flash::error(format!(
                "The tag {name} could not be deleted."
            ))),
            Self::Blocked(_) => None,
        }
    }
}

/// Names listed per clause are cut off past this length so the message still
/// fits in a cookie.
const LISTED_NAMES_LEN: usize = 400;

fn list_names(names: &[String]) -> String {
    let mut listed = String::new();
    let mut shown = 0;

    for name in names {
        if shown > 0 && listed.len() + name.len() > LISTED_NAMES_LEN {
            break;
        }
        if shown > 0 {
            listed.push_str(", ");
        }
        listed.push_str(name);
        shown += 1;
    }

    match names.len() - shown {
        0 => listed,
        hidden => format!("{listed} and {hidden} more"),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct BulkSummary {
    pub deleted: usize,
    pub failed: Vec<String>,
    pub not_found: Vec<String>,
}

impl BulkSummary {
    pub fn flash(&self) -> Flash {
        let mut messages = vec![];

        if self.deleted > 0 {
            messages.push(format!("Successfully deleted {} tag(s).", self.deleted));
        }

        if !self.failed.is_empty() {
            messages.push(format!(
                "Failed to delete {} tag(s): {}.",
                self.failed.len(),
                list_names(&self.failed)
            ));
        }

        if !self.not_found.is_empty() {
            messages.push(format!(
                "{} tag(s) not found: {}.",
                self.not_found.len(),
                list_names(&self.not_found)
            ));
        }

        match messages.is_empty() {
            true => Flash::error("No tags were deleted."),
            false => Flash::notice(messages.join(" ")),
        }
    }
}

enum BulkEntry {
    Deleted,
    Failed,
    NotFound,
}

pub(crate) struct TagDeleter<'a, R> {
    registry: &'a R,
    enabled: bool,
    auth_retries: u32,
    metrics: &'a DeletionMetrics,
}

impl<'a, R: RegistryApi> TagDeleter<'a, R> {
    pub fn new(
        registry: &'a R,
        enabled: bool,
        auth_retries: u32,
        metrics: &'a DeletionMetrics,
    ) -> Self {
        Self {
            registry,
            enabled,
            auth_retries,
            metrics,
        }
    }

    fn ensure_enabled(&self) -> Result<(), DeletionError> {
        match self.enabled {
            true => Ok(()),
            false => Err(DeletionError::FeatureDisabled),
        }
    }

    pub async fn delete(
        &self,
        repository: &str,
        name: &str,
    ) -> Result<DeleteOutcome, DeletionError> {
        self.ensure_enabled()?;

        let registry = self.registry;
        let result = with_reauth(registry, self.auth_retries, move || async move {
            let tag = registry.find_tag(repository, name).await?;
            registry.delete_tag(&tag).await
        })
        .await;

        let outcome = match result {
            Ok(true) => DeleteOutcome::Deleted(name.to_string()),
            Ok(false) => DeleteOutcome::DeleteFailed(name.to_string()),
            Err(ClientError::MethodNotAllowed) => DeleteOutcome::Blocked(name.to_string()),
            Err(err) => return Err(err.into()),
        };

        self.metrics.record(match &outcome {
            DeleteOutcome::Deleted(_) => Outcome::Deleted,
            DeleteOutcome::DeleteFailed(_) => Outcome::Failed,
            DeleteOutcome::Blocked(_) => Outcome::Blocked,
        });

        info!(repository, tag = name, ?outcome, "Tag deletion finished");

        Ok(outcome)
    }

    /// Deletes each tag in order. An error other than 401 or 405 aborts the
    /// remaining tags.
    pub async fn delete_all(
        &self,
        repository: &str,
        names: &[String],
    ) -> Result<BulkSummary, DeletionError> {
        self.ensure_enabled()?;

        let registry = self.registry;
        let mut summary = BulkSummary::default();

        for name in names {
            let name = name.as_str();
            let result = with_reauth(registry, self.auth_retries, move || async move {
                let tag = registry.find_tag(repository, name).await?;

                if tag.content_digest.is_none() {
                    return Ok(BulkEntry::NotFound);
                }

                Ok::<_, ClientError>(match registry.delete_tag(&tag).await? {
                    true => BulkEntry::Deleted,
                    false => BulkEntry::Failed,
                })
            })
            .await;

            match result {
                Ok(BulkEntry::Deleted) => {
                    self.metrics.record(Outcome::Deleted);
                    summary.deleted += 1;
                }
                Ok(BulkEntry::Failed) => {
                    self.metrics.record(Outcome::Failed);
                    summary.failed.push(name.to_string());
                }
                Ok(BulkEntry::NotFound) => {
                    self.metrics.record(Outcome::NotFound);
                    summary.not_found.push(name.to_string());
                }
                Err(ClientError::MethodNotAllowed) => {
                    self.metrics.record(Outcome::Blocked);
                    summary.failed.push(name.to_string());
                }
                Err(err) => {
                    warn!(repository, tag = name, error = %err, "Aborting bulk deletion");
                    return Err(err.into());
                }
            }
        }

        info!(
            repository,
            deleted = summary.deleted,
            failed = summary.failed.len(),
            not_found = summary.not_found.len(),
            "Bulk tag deletion finished"
        );

        Ok(summary)
    }
}
