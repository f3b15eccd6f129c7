use figment::{
    Error, Metadata, Profile, Provider, Source,
    value::{Dict, Map, Tag, Value},
};
use std::path::{Path, PathBuf};

/// Wraps a provider so that any `<key>_file` string value also yields `<key>`
/// holding the trimmed contents of that file. Relative paths resolve against
/// the directory of the wrapped config file, or the working directory for
/// providers that are not file backed.
pub struct FileValueProvider<P> {
    inner: P,
}

impl<P> FileValueProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Provider> Provider for FileValueProvider<P> {
    fn metadata(&self) -> Metadata {
        self.inner.metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let base_path = match &self.inner.metadata().source {
            Some(Source::File(path)) => path.parent().map(Path::to_path_buf),
            _ => None,
        }
        .unwrap_or_else(|| PathBuf::from("."));

        self.inner
            .data()?
            .into_iter()
            .map(|(profile, dict)| Ok((profile, resolve_dict(&base_path, dict)?)))
            .collect()
    }

    fn profile(&self) -> Option<Profile> {
        self.inner.profile()
    }
}

fn read_value(base_path: &Path, path: &str) -> Result<Value, Error> {
    let path = Path::new(path);
    let path = match path.is_absolute() {
        true => path.to_path_buf(),
        false => base_path.join(path),
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| Error::from(format!("Failed to read '{}': {e}", path.display())))?;

    Ok(Value::String(Tag::Default, contents.trim_end().to_string()))
}

fn resolve_dict(base_path: &Path, dict: Dict) -> Result<Dict, Error> {
    let mut resolved = Dict::new();

    for (key, value) in dict {
        let value = resolve_value(base_path, value)?;

        if let (Some(target), Value::String(_, path)) = (key.strip_suffix("_file"), &value) {
            resolved.insert(target.to_string(), read_value(base_path, path)?);
        }

        resolved.insert(key, value);
    }

    Ok(resolved)
}

fn resolve_value(base_path: &Path, value: Value) -> Result<Value, Error> {
    match value {
        Value::Dict(tag, dict) => Ok(Value::Dict(tag, resolve_dict(base_path, dict)?)),
        Value::Array(tag, values) => Ok(Value::Array(
            tag,
            values
                .into_iter()
                .map(|v| resolve_value(base_path, v))
                .collect::<Result<_, _>>()?,
        )),
        other => Ok(other),
    }
}
