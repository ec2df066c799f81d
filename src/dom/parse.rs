//! Building documents from HTML markup
//!
//! Markup goes through html5ever (via `scraper`) so the tree matches what a
//! browser would build, including whitespace-only text nodes. Only the
//! `<body>` subtree is carried over; comments and doctypes are dropped.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Node};

use super::document::Document;
use super::Capabilities;

impl Document {
    /// Parse a full HTML page
    pub fn parse_html(html: &str) -> Self {
        Self::parse_html_with(html, Capabilities::default())
    }

    pub fn parse_html_with(html: &str, capabilities: Capabilities) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new().with_capabilities(capabilities);

        let Some(body) = parsed
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
        else {
            return doc;
        };

        let mut mapped = HashMap::new();
        mapped.insert(body.id(), doc.body());

        for node in body.descendants().skip(1) {
            let Some(parent) = node.parent().and_then(|p| mapped.get(&p.id()).copied()) else {
                continue;
            };

            let created = match node.value() {
                Node::Element(el) => {
                    let id = doc.create_element(el.name());
                    for (name, value) in el.attrs() {
                        // Attribute writes on a detached node cannot fail
                        let _ = doc.set_attribute(id, name, value);
                    }
                    id
                }
                Node::Text(text) => doc.create_text(&**text),
                _ => continue,
            };

            if doc.append_child(parent, created).is_ok() {
                mapped.insert(node.id(), created);
            }
        }

        doc
    }
}
