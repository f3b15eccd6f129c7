use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    error::BrowserError,
    flash::Flash,
    registry::{RegistryApi, check_repository, with_reauth},
    state::BrowserState,
    views::html::{self, escape},
};

#[derive(Debug, Deserialize)]
pub struct RepositoryRequest {
    repository: String,
}

pub(crate) async fn index<R: RegistryApi>(
    State(state): State<Arc<BrowserState<R>>>,
) -> Result<Html<String>, BrowserError> {
    let registry = &state.registry;
    let mut names = with_reauth(registry, state.config.auth_retries, || {
        registry.repositories()
    })
    .await?;
    names.sort();

    let mut body = String::from("<h1>Repositories</h1>\n");

    if names.is_empty() {
        body.push_str("<p>The registry has no repositories.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for name in &names {
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(&html::repository_path(name)),
                escape(name)
            ));
        }
        body.push_str("</ul>\n");
    }

    Ok(Html(html::page("Repositories", None, &body)))
}

pub(crate) async fn show<R: RegistryApi>(
    Path(RepositoryRequest { repository }): Path<RepositoryRequest>,
    State(state): State<Arc<BrowserState<R>>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), BrowserError> {
    check_repository(&repository)?;

    let registry = &state.registry;
    let found = with_reauth(registry, state.config.auth_retries, || {
        registry.find_repository(&repository)
    })
    .await;

    let mut found = match found {
        Ok(found) => found,
        Err(err) if err.is_not_found() => {
            return Err(BrowserError::NotFound {
                what: format!("Repository {repository}"),
            });
        }
        Err(err) => return Err(err.into()),
    };
    found.tags.sort();

    let (jar, flash) = Flash::take(jar);

    let mut body = format!("<h1>{}</h1>\n", escape(&found.name));

    if found.tags.is_empty() {
        body.push_str("<p>This repository has no tags.</p>\n");
    } else if state.config.delete_enabled {
        body.push_str(&format!(
            "<form method=\"post\" action=\"{}/tags\">\n<ul>\n",
            escape(&html::repository_path(&found.name))
        ));
        for tag in &found.tags {
            body.push_str(&format!(
                "<li><input type=\"checkbox\" name=\"tag_names\" value=\"{name}\"> <a href=\"{href}\">{name}</a></li>\n",
                name = escape(tag),
                href = escape(&html::tag_path(&found.name, tag)),
            ));
        }
        body.push_str("</ul>\n<button type=\"submit\">Delete selected tags</button>\n</form>\n");
    } else {
        body.push_str("<ul>\n");
        for tag in &found.tags {
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(&html::tag_path(&found.name, tag)),
                escape(tag)
            ));
        }
        body.push_str("</ul>\n");
    }

    Ok((
        jar,
        Html(html::page(&found.name, flash.as_ref(), &body)),
    ))
}
