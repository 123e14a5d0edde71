//! Deep-links from calendar event bodies back to CRM records.
//!
//! A deep-link has the shape `<app-url>/<domain-id>/<module>/<record-id>/link`,
//! the domain segment being optional.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub module_name: String,
    pub record_id: String,
}

/// Formats the markup appended to an event body to link it to a CRM record.
pub trait LinkGenerator: Send + Sync {
    fn generate(&self, module_name: &str, record_id: &str, domain: Option<&str>) -> String;
}

/// Turns a raw provider body into the description shown in the CRM.
pub trait LinkCleaner: Send + Sync {
    fn clean(&self, raw_body: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct DeepLinkPattern {
    regex: Regex,
}

impl DeepLinkPattern {
    pub fn new(app_url: &str) -> Self {
        let source = link_pattern_source(app_url);
        Self {
            regex: Regex::new(&source).expect("escaped app url forms a valid link regex"),
        }
    }

    /// First deep-link found in `text`, if any.
    pub fn extract(&self, text: &str) -> Option<DeepLink> {
        let caps = self.regex.captures(text)?;
        Some(DeepLink {
            module_name: caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string(),
            record_id: caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string(),
        })
    }
}

fn link_pattern_source(app_url: &str) -> String {
    format!(
        "{}/[0-9]*/?([a-z]+)/([0-9]+)/link",
        regex::escape(app_url.trim_end_matches('/'))
    )
}

/// The CRM's own link format, used both to generate and to strip deep-links.
#[derive(Debug, Clone)]
pub struct CrmLinks {
    app_url: String,
    anchor: Regex,
    bare: Regex,
}

impl CrmLinks {
    pub fn new(app_url: &str) -> Self {
        let source = link_pattern_source(app_url);
        let anchor = format!(
            r#"(?is)(?:<br\s*/?>\s*)*<a\s[^>]*href=["']{}["'][^>]*>.*?</a>"#,
            source
        );

        Self {
            app_url: app_url.trim_end_matches('/').to_string(),
            anchor: Regex::new(&anchor).expect("escaped app url forms a valid anchor regex"),
            bare: Regex::new(&source).expect("escaped app url forms a valid link regex"),
        }
    }

    pub fn url_for(&self, module_name: &str, record_id: &str, domain: Option<&str>) -> String {
        match domain.filter(|d| !d.is_empty()) {
            Some(domain) => format!("{}/{}/{}/{}/link", self.app_url, domain, module_name, record_id),
            None => format!("{}/{}/{}/link", self.app_url, module_name, record_id),
        }
    }
}

impl LinkGenerator for CrmLinks {
    fn generate(&self, module_name: &str, record_id: &str, domain: Option<&str>) -> String {
        let url = self.url_for(module_name, record_id, domain);
        format!(r#"<br><br><a href="{url}">{url}</a>"#)
    }
}

impl LinkCleaner for CrmLinks {
    fn clean(&self, raw_body: &str) -> String {
        let without_anchor = self.anchor.replace_all(raw_body, "");
        let without_url = self.bare.replace_all(&without_anchor, "");
        without_url.trim_end().to_string()
    }
}
