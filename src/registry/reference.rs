use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::error::ClientError;

const REPOSITORY_MAX_LEN: usize = 255;

// Path components joined by `/`, as accepted by the distribution API.
static REPOSITORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*$")
        .expect("Repository regex is valid")
});

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("Tag regex is valid"));

static DIGEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[.+_-][a-z0-9]+)*:[A-Za-z0-9=_-]+$").expect("Digest regex is valid")
});

fn invalid(kind: &'static str, name: &str) -> ClientError {
    ClientError::InvalidName {
        kind,
        name: name.to_string(),
    }
}

/// Names reaching the registry are interpolated into URL paths, so anything
/// outside the registry's grammar is rejected before a request is built.
pub fn check_repository(name: &str) -> Result<(), ClientError> {
    match name.len() <= REPOSITORY_MAX_LEN && REPOSITORY.is_match(name) {
        true => Ok(()),
        false => Err(invalid("repository", name)),
    }
}

pub fn check_tag(name: &str) -> Result<(), ClientError> {
    match TAG.is_match(name) {
        true => Ok(()),
        false => Err(invalid("tag", name)),
    }
}

pub fn check_digest(digest: &str) -> Result<(), ClientError> {
    match DIGEST.is_match(digest) {
        true => Ok(()),
        false => Err(invalid("digest", digest)),
    }
}
