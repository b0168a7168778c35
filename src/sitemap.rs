use reqwest::Client;
use roxmltree::Document;

use crate::FetchError;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Fetches `sitemap_url` and returns every page URL it lists,
/// in document order. The client's timeout applies.
pub async fn fetch(client: &Client, sitemap_url: &str) -> Result<Vec<String>, FetchError> {
    let response = client.get(sitemap_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    parse(&response.text().await?)
}

/// Extracts the `<loc>` text of each `<url>` element.
/// A `<url>` without `<loc>` is skipped; duplicates are kept.
pub fn parse(xml: &str) -> Result<Vec<String>, FetchError> {
    let document = Document::parse(xml)?;
    let urls = document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name((SITEMAP_NS, "url")))
        .filter_map(|node| {
            node.children()
                .find(|child| child.has_tag_name((SITEMAP_NS, "loc")))
                .and_then(|loc| loc.text())
                .map(|text| text.trim().to_owned())
        })
        .filter(|url| !url.is_empty())
        .collect();
    Ok(urls)
}
