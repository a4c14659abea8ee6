use regex::{Captures, Regex};
use tracing::debug;

use crate::downloader::UrlMapping;

#[derive(Debug, Clone)]
pub struct RewrittenDocument {
    pub html: String,
    /// Number of attribute values replaced.
    pub replacements: usize,
}

/// Point every reference to a stored asset at its local copy.
///
/// `src=<url>` for scripts and `href=<url>` for stylesheets, in any quote
/// style, become `src="./js/<file>"` / `href="./css/<file>"`. URLs without
/// a local asset and all surrounding text are left untouched.
pub fn rewrite_references(html: &str, mapping: &UrlMapping) -> Result<RewrittenDocument, regex::Error> {
    let mut updated = html.to_string();
    let mut replacements = 0;

    for record in mapping.records() {
        let Some(asset) = &record.asset else {
            continue;
        };

        let attribute = record.kind.attribute();
        let pattern = reference_pattern(attribute, &record.url)?;
        let count = pattern.find_iter(&updated).count();
        if count == 0 {
            continue;
        }

        updated = pattern
            .replace_all(&updated, |caps: &Captures| {
                let end = caps.name("end").map_or("", |m| m.as_str());
                format!("{}=\"{}\"{}", attribute, asset.reference, end)
            })
            .into_owned();

        debug!(url = %record.url, local = %asset.reference, count, "rewrote reference");
        replacements += count;
    }

    Ok(RewrittenDocument {
        html: updated,
        replacements,
    })
}

fn reference_pattern(attribute: &str, url: &str) -> Result<Regex, regex::Error> {
    // Quoted values must close with the same quote right after the URL; bare
    // values must end at whitespace or `>`. `a.js` never matches inside `a.js.map`.
    let url = regex::escape(url);
    Regex::new(&format!(
        r#"(?i)\b{attribute}\s*=\s*(?:"{url}"|'{url}'|{url}(?P<end>[\s>]|$))"#
    ))
}
