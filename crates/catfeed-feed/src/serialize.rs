//! Feed rendering.
//!
//! XML pages are RSS 2.0 fragments: the first page opens the document and
//! carries the channel metadata, the last page closes it, and pages in between
//! only hold `<item>` elements. Concatenating the pages of one feed in offset
//! order yields a single well-formed document. JSON pages are self-contained
//! arrays.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;

use crate::error::FeedError;
use crate::projector::FeedItem;

/// Namespace of the `g:` product elements.
pub const GOOGLE_NS: &str = "http://base.google.com/ns/1.0";

/// XML pages are fragments, so they are served as plain text.
pub const XML_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Xml,
    Json,
}

impl Format {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Xml => XML_CONTENT_TYPE,
            Format::Json => JSON_CONTENT_TYPE,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xml => write!(f, "xml"),
            Format::Json => write!(f, "json"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown feed format '{other}' (expected xml or json)")),
        }
    }
}

/// Channel metadata written by the first XML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Renders one page of rows.
///
/// An empty page renders as an empty body for XML (no header even on the
/// first page) and as `[]` for JSON.
///
/// # Errors
///
/// Returns [`FeedError::Render`] or [`FeedError::Json`] if rendering fails.
pub fn serialize(
    items: &[FeedItem],
    is_first: bool,
    is_last: bool,
    format: Format,
    channel: &ChannelMeta,
) -> Result<String, FeedError> {
    match format {
        Format::Xml => render_xml(items, is_first, is_last, channel, Utc::now()),
        Format::Json => render_json(items),
    }
}

/// Renders a JSON array of rows with nested variants.
///
/// # Errors
///
/// Returns [`FeedError::Json`] if a row cannot be serialized.
pub fn render_json(items: &[FeedItem]) -> Result<String, FeedError> {
    Ok(serde_json::to_string(items)?)
}

/// Renders an RSS fragment. `built_at` becomes the channel's `lastBuildDate`.
///
/// # Errors
///
/// Returns [`FeedError::Render`] if the writer fails.
pub fn render_xml(
    items: &[FeedItem],
    is_first: bool,
    is_last: bool,
    channel: &ChannelMeta,
    built_at: DateTime<Utc>,
) -> Result<String, FeedError> {
    if items.is_empty() {
        return Ok(String::new());
    }

    let mut writer = Writer::new(Vec::new());

    if is_first {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        newline(&mut writer);
        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:g", GOOGLE_NS));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;
        newline(&mut writer);
        text_element(&mut writer, "title", &channel.title)?;
        text_element(&mut writer, "link", &channel.link)?;
        text_element(&mut writer, "description", &channel.description)?;
        text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;
        newline(&mut writer);
    }

    for item in items {
        write_item(&mut writer, item, None)?;
        for variant in &item.variants {
            write_item(&mut writer, variant, Some(&item.id))?;
        }
    }

    if is_last {
        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;
        newline(&mut writer);
    }

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_item(
    writer: &mut Writer<Vec<u8>>,
    item: &FeedItem,
    group_id: Option<&str>,
) -> Result<(), FeedError> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid))?;
    writer.write_event(Event::Text(BytesText::new(&item.id)))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    if let Some(title) = &item.title {
        text_element(writer, "title", title)?;
    }
    if let Some(link) = &item.link {
        text_element(writer, "link", link)?;
    }
    text_element(writer, "g:id", &item.id)?;
    if let Some(group_id) = group_id {
        text_element(writer, "g:item_group_id", group_id)?;
    }
    if let Some(price) = item.price {
        text_element(writer, "g:price", &price.to_string())?;
    }
    if let Some(sale_price) = item.sale_price {
        text_element(writer, "g:sale_price", &sale_price.to_string())?;
    }
    if let Some(regular_price) = item.regular_price {
        text_element(writer, "g:regular_price", &regular_price.to_string())?;
    }
    for path in &item.categories {
        text_element(writer, "category", path)?;
    }
    for name in &item.variation_attributes {
        text_element(writer, "g:variation_attribute", name)?;
    }
    for (name, value) in &item.fields {
        let element = sanitize_element_name(name);
        for text in value.to_texts() {
            text_element(writer, &element, &text)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    newline(writer);
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), FeedError> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn newline(writer: &mut Writer<Vec<u8>>) {
    writer.get_mut().push(b'\n');
}

/// Turns a custom field name into a valid, namespace-free XML element name.
///
/// Characters outside `[A-Za-z0-9_.-]` become `_`; a name that does not start
/// with a letter or `_` is prefixed with `_`.
#[must_use]
pub fn sanitize_element_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
#[path = "serialize_test.rs"]
mod tests;
