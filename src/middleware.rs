use std::task::{Context, Poll};

use axum::http::{Method, Request, Response, Uri};
use once_cell::sync::Lazy;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use tower::Service;
use tracing::warn;

// /repo/library/app/tags/latest -> /repo/library%2Fapp/tags/latest
//
// The shortest repository that leaves a routable suffix for the method wins,
// so a repository may itself end in `tags`.
static VIEW_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/repo/)(.+?)(/tags/[^/]+)?$").expect("View path regex is valid")
});

static FORM_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/repo/)(.+?)(/tags(?:/[^/]+/delete)?)?$").expect("Form path regex is valid")
});

static DELETE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/repo/)(.+?)(/tags(?:/[^/]+)?)?$").expect("Delete path regex is valid")
});

static BULK_DELETE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/repo/)(.+?)(/tags)?$").expect("Bulk delete path regex is valid")
});

fn rewrite_path(method: &Method, path: &str, query: Option<&str>) -> String {
    let pattern: &Regex = match *method {
        Method::POST => &FORM_PATH,
        Method::DELETE if query.is_some_and(|query| query.contains("tag_names")) => {
            &BULK_DELETE_PATH
        }
        Method::DELETE => &DELETE_PATH,
        _ => &VIEW_PATH,
    };

    pattern
        .replace(path, |caps: &Captures| {
            let prefix = &caps[1];
            let encoded = utf8_percent_encode(&caps[2], NON_ALPHANUMERIC).to_string();
            let suffix = caps.get(3).map_or("", |m| m.as_str());

            format!("{prefix}{encoded}{suffix}")
        })
        .into_owned()
}

/// Percent-encodes repository names so that names containing `/` fit in a
/// single path segment before routing.
#[derive(Clone)]
pub(crate) struct RewriteUriLayer;

impl<S> tower::Layer<S> for RewriteUriLayer {
    type Service = RewriteUriService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteUriService { inner }
    }
}

#[derive(Clone)]
pub(crate) struct RewriteUriService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RewriteUriService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let path = rewrite_path(req.method(), req.uri().path(), req.uri().query());

        let rewritten = match req.uri().query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };

        match rewritten.parse::<Uri>() {
            Ok(uri) => *req.uri_mut() = uri,
            Err(err) => warn!(uri = %req.uri(), error = %err, "Unable to rewrite request URI"),
        }

        self.inner.call(req)
    }
}
