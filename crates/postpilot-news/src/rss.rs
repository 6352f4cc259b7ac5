//! RSS 2.0 item parser.
//!
//! Hand-rolled over quick-xml events rather than a full feed model: the
//! collect stage only needs title, link, description, author, publication
//! date, and categories per `<item>`.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::NewsError;
use crate::types::FetchedArticle;

/// Parse an RSS feed XML body into [`FetchedArticle`]s.
///
/// Items without a `<link>` are dropped; everything else is optional and
/// carried through as-is (HTML is stripped from descriptions).
///
/// # Errors
///
/// Returns [`NewsError::Xml`] if the XML is malformed.
#[allow(clippy::too_many_lines)]
pub fn parse_rss_feed(xml: &str, source_name: &str) -> Result<Vec<FetchedArticle>, NewsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut current_title = String::new();
    let mut current_link = String::new();
    let mut current_description = String::new();
    let mut current_author = String::new();
    let mut current_pub_date = String::new();
    let mut current_categories: Vec<String> = Vec::new();
    let mut in_item = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                match name.as_str() {
                    "item" => {
                        in_item = true;
                        current_title.clear();
                        current_link.clear();
                        current_description.clear();
                        current_author.clear();
                        current_pub_date.clear();
                        current_categories.clear();
                    }
                    _ => {
                        current_tag = name;
                    }
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if !current_link.is_empty() {
                        articles.push(FetchedArticle {
                            title: current_title.trim().to_string(),
                            url: current_link.clone(),
                            summary: non_empty(current_description.trim()),
                            author: non_empty(current_author.trim()),
                            published_at: parse_feed_date(&current_pub_date),
                            categories: current_categories.clone(),
                            source: source_name.to_string(),
                        });
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    store_field(
                        &current_tag,
                        text,
                        &mut current_title,
                        &mut current_link,
                        &mut current_description,
                        &mut current_author,
                        &mut current_pub_date,
                        &mut current_categories,
                    );
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    store_field(
                        &current_tag,
                        text,
                        &mut current_title,
                        &mut current_link,
                        &mut current_description,
                        &mut current_author,
                        &mut current_pub_date,
                        &mut current_categories,
                    );
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(NewsError::Xml(e)),
            _ => {}
        }
    }

    Ok(articles)
}

#[allow(clippy::too_many_arguments)]
fn store_field(
    tag: &str,
    text: String,
    title: &mut String,
    link: &mut String,
    description: &mut String,
    author: &mut String,
    pub_date: &mut String,
    categories: &mut Vec<String>,
) {
    match tag {
        "title" => *title = text,
        "link" => *link = text,
        "description" => *description = strip_html(&text),
        // TechCrunch and most WordPress feeds carry the byline in dc:creator.
        "author" | "dc:creator" => *author = text,
        "pubDate" => *pub_date = text,
        "category" => {
            let category = text.trim().to_string();
            if !category.is_empty() {
                categories.push(category);
            }
        }
        _ => {}
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Parse the common feed date formats: RFC 2822 first (`pubDate`), then
/// RFC 3339 as a fallback. Unparseable dates become `None`.
fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            tracing::warn!(date = trimmed, error = %e, "unparseable feed date");
            e
        })
        .ok()
}

/// Strip HTML tags from a string, returning plain text.
pub(crate) fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.trim().to_string()
}
