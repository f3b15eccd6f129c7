use crate::flash::{Flash, FlashKind};

pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Wraps `body` in the shared page layout. `body` must already be escaped.
pub(crate) fn page(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let flash = match flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Notice => "notice",
                FlashKind::Error => "error",
            };
            let message = escape(&flash.message).replace('\n', "<br>");
            format!("<div class=\"flash {class}\">{message}</div>\n")
        }
        None => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<nav><a href=\"/\">Repositories</a></nav>\n{flash}{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Names are checked against the registry grammar before they reach a page,
/// so they need no encoding.
pub(crate) fn repository_path(repository: &str) -> String {
    format!("/repo/{repository}")
}

pub(crate) fn tag_path(repository: &str, tag: &str) -> String {
    format!("/repo/{repository}/tags/{tag}")
}
