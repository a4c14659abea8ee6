use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

const SCRIPT_PATTERN: &str = r#"(?i)<script[^>]*\ssrc\s*=\s*["']?([^"'>\s]+)["']?[^>]*>"#;
const LINK_REL_FIRST_PATTERN: &str =
    r#"(?i)<link[^>]*\srel\s*=\s*["']?stylesheet["']?[^>]*\shref\s*=\s*["']?([^"'>\s]+)["']?[^>]*>"#;
const LINK_HREF_FIRST_PATTERN: &str =
    r#"(?i)<link[^>]*\shref\s*=\s*["']?([^"'>\s]+)["']?[^>]*\srel\s*=\s*["']?stylesheet["']?[^>]*>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
}

impl ResourceKind {
    /// Subdirectory of the asset root holding this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceKind::Script => "js",
            ResourceKind::Stylesheet => "css",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResourceKind::Script => ".js",
            ResourceKind::Stylesheet => ".css",
        }
    }

    /// Prefix of synthesized file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ResourceKind::Script => "script",
            ResourceKind::Stylesheet => "style",
        }
    }

    /// Attribute carrying the reference in markup.
    pub fn attribute(self) -> &'static str {
        match self {
            ResourceKind::Script => "src",
            ResourceKind::Stylesheet => "href",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Script => f.write_str("script"),
            ResourceKind::Stylesheet => f.write_str("stylesheet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    pub url: String,
    pub kind: ResourceKind,
}

/// Every external reference found in a document, in document order.
/// Repeated URLs appear once per occurrence.
#[derive(Debug, Clone, Default)]
pub struct ExtractedResources {
    pub scripts: Vec<ResourceReference>,
    pub stylesheets: Vec<ResourceReference>,
}

impl ExtractedResources {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.stylesheets.is_empty()
    }

    /// Distinct references of `kind`, first occurrence first.
    pub fn unique(&self, kind: ResourceKind) -> Vec<&ResourceReference> {
        let refs = match kind {
            ResourceKind::Script => &self.scripts,
            ResourceKind::Stylesheet => &self.stylesheets,
        };
        let mut seen = HashSet::new();
        refs.iter().filter(|r| seen.insert(r.url.as_str())).collect()
    }
}

#[derive(Debug, Clone)]
pub struct HtmlParser {
    script: Regex,
    link_rel_first: Regex,
    link_href_first: Regex,
    include_stylesheets: bool,
}

impl HtmlParser {
    pub fn new(include_stylesheets: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            script: Regex::new(SCRIPT_PATTERN)?,
            link_rel_first: Regex::new(LINK_REL_FIRST_PATTERN)?,
            link_href_first: Regex::new(LINK_HREF_FIRST_PATTERN)?,
            include_stylesheets,
        })
    }

    pub fn extract_resources(&self, html_content: &str) -> ExtractedResources {
        let scripts = capture_urls(&self.script, html_content)
            .into_iter()
            .filter(|(_, url)| is_external_url(url))
            .map(|(_, url)| ResourceReference {
                url,
                kind: ResourceKind::Script,
            })
            .collect();

        let stylesheets = if self.include_stylesheets {
            self.extract_stylesheets(html_content)
        } else {
            Vec::new()
        };

        ExtractedResources {
            scripts,
            stylesheets,
        }
    }

    fn extract_stylesheets(&self, html_content: &str) -> Vec<ResourceReference> {
        // Both attribute orders, merged back into document order
        let mut found = capture_urls(&self.link_rel_first, html_content);
        found.extend(capture_urls(&self.link_href_first, html_content));
        found.sort_by_key(|(start, _)| *start);

        found
            .into_iter()
            .filter(|(_, url)| is_external_url(url))
            .map(|(_, url)| ResourceReference {
                url,
                kind: ResourceKind::Stylesheet,
            })
            .collect()
    }
}

/// True for absolute `http://` or `https://` URLs only.
pub fn is_external_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn capture_urls(regex: &Regex, html_content: &str) -> Vec<(usize, String)> {
    regex
        .captures_iter(html_content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let url = cap.get(1)?;
            Some((whole.start(), url.as_str().to_string()))
        })
        .collect()
}
