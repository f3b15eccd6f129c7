use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::{CookieJar, Form, Query};
use serde::Deserialize;

use crate::{
    error::BrowserError,
    registry::{RegistryApi, check_repository, check_tag, with_reauth},
    state::BrowserState,
    views::html::{self, escape},
};

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    repository: String,
    tag: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryRequest {
    repository: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkDestroyRequest {
    #[serde(default, alias = "tag_names[]")]
    tag_names: Vec<String>,
}

pub(crate) async fn show<R: RegistryApi>(
    Path(TagRequest { repository, tag }): Path<TagRequest>,
    State(state): State<Arc<BrowserState<R>>>,
) -> Result<Html<String>, BrowserError> {
    check_repository(&repository)?;
    check_tag(&tag)?;

    let registry = &state.registry;
    let found = with_reauth(registry, state.config.auth_retries, || {
        registry.find_tag(&repository, &tag)
    })
    .await?;

    let Some(digest) = found.content_digest.as_deref() else {
        return Err(BrowserError::NotFound {
            what: format!("Tag {repository}:{tag}"),
        });
    };

    let mut body = format!(
        "<h1>{}:{}</h1>\n<dl>\n<dt>Digest</dt><dd><code>{}</code></dd>\n",
        escape(&repository),
        escape(&tag),
        escape(digest)
    );

    if let Some(media_type) = &found.media_type {
        body.push_str(&format!(
            "<dt>Media type</dt><dd>{}</dd>\n",
            escape(media_type)
        ));
    }

    if let Some(size) = found.size {
        body.push_str(&format!("<dt>Size</dt><dd>{size} bytes</dd>\n"));
    }

    body.push_str(&format!(
        "<dt>Pull</dt><dd><code>docker pull {}</code></dd>\n</dl>\n",
        escape(&format!("{}/{repository}:{tag}", state.pull_host()))
    ));

    if state.config.delete_enabled {
        body.push_str(&format!(
            "<form method=\"post\" action=\"{}/delete\">\n<button type=\"submit\">Delete tag</button>\n</form>\n",
            escape(&html::tag_path(&repository, &tag))
        ));
    }

    Ok(Html(html::page(
        &format!("{repository}:{tag}"),
        None,
        &body,
    )))
}

fn blocked(repository: &str, tag: &str) -> Response {
    let body = format!(
        "<h1>Deletion blocked</h1>\n<p>The tag {} could not be deleted because the registry does not allow deletion.</p>\n<p>Enable deletion on the registry (for the reference registry set <code>REGISTRY_STORAGE_DELETE_ENABLED=true</code>) and try again.</p>\n<p><a href=\"{}\">Back to {}</a></p>\n",
        escape(tag),
        escape(&html::repository_path(repository)),
        escape(repository),
    );

    (
        StatusCode::METHOD_NOT_ALLOWED,
        Html(html::page("Deletion blocked", None, &body)),
    )
        .into_response()
}

pub(crate) async fn destroy<R: RegistryApi>(
    Path(TagRequest { repository, tag }): Path<TagRequest>,
    State(state): State<Arc<BrowserState<R>>>,
    jar: CookieJar,
) -> Result<Response, BrowserError> {
    check_repository(&repository)?;
    check_tag(&tag)?;

    let outcome = state.deleter().delete(&repository, &tag).await?;

    Ok(match outcome.flash() {
        Some(flash) => flash.redirect(jar, &html::repository_path(&repository)),
        None => blocked(&repository, &tag),
    })
}

async fn bulk_destroy<R: RegistryApi>(
    state: &BrowserState<R>,
    repository: &str,
    tag_names: &[String],
    jar: CookieJar,
) -> Result<Response, BrowserError> {
    check_repository(repository)?;
    for name in tag_names {
        check_tag(name)?;
    }

    let summary = state.deleter().delete_all(repository, tag_names).await?;

    Ok(summary
        .flash()
        .redirect(jar, &html::repository_path(repository)))
}

pub(crate) async fn bulk_destroy_query<R: RegistryApi>(
    Path(RepositoryRequest { repository }): Path<RepositoryRequest>,
    State(state): State<Arc<BrowserState<R>>>,
    jar: CookieJar,
    Query(BulkDestroyRequest { tag_names }): Query<BulkDestroyRequest>,
) -> Result<Response, BrowserError> {
    bulk_destroy(&state, &repository, &tag_names, jar).await
}

pub(crate) async fn bulk_destroy_form<R: RegistryApi>(
    Path(RepositoryRequest { repository }): Path<RepositoryRequest>,
    State(state): State<Arc<BrowserState<R>>>,
    jar: CookieJar,
    Form(BulkDestroyRequest { tag_names }): Form<BulkDestroyRequest>,
) -> Result<Response, BrowserError> {
    bulk_destroy(&state, &repository, &tag_names, jar).await
}
