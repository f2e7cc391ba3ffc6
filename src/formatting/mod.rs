//! Content assembly for alert notifications.
//!
//! A [`Formatter`] runs an ordered plan of [`Section`]s against a
//! [`NotificationContext`](crate::context::NotificationContext). Every section
//! returns a [`Fragment`] holding matching plain-text and HTML renderings,
//! which the formatter appends to its [`ContentBuffer`].

pub mod formatter;
pub mod registry;
pub mod sections;
pub mod variants;

use std::path::PathBuf;

pub use formatter::{Formatter, FormatterSettings};
pub use registry::FormatterRegistry;
pub use sections::{PlannedSection, Section, SectionFn, SectionInput, StyleHint};
pub use variants::FormatterVariant;

/// Matching plain-text and HTML renderings of one piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub html: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: html.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }

    /// Appends `other` to both channels.
    pub fn push(&mut self, other: Fragment) {
        self.text.push_str(&other.text);
        self.html.push_str(&other.html);
    }

    /// Appends a text line and its HTML counterpart.
    pub fn line(&mut self, text: impl AsRef<str>, html: impl AsRef<str>) {
        self.text.push_str(text.as_ref());
        self.text.push('\n');
        self.html.push_str(html.as_ref());
        self.html.push_str("<br>\n");
    }

    /// Appends an empty line to both channels.
    pub fn blank(&mut self) {
        self.line("", "");
    }

    /// Wraps the HTML channel in a container carrying `style`. The text
    /// channel is left untouched, and an empty fragment stays empty.
    pub fn styled(self, style: &str) -> Self {
        if self.html.is_empty() {
            return self;
        }
        Self {
            text: self.text,
            html: format!(
                "<div style=\"{}\">\n{}</div>\n",
                html_escape(style),
                self.html
            ),
        }
    }
}

/// The accumulated body of one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBuffer {
    pub text: String,
    pub html: String,
    pub attachments: Vec<PathBuf>,
}

impl ContentBuffer {
    pub fn add_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn add_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn add(&mut self, fragment: Fragment) {
        self.text.push_str(&fragment.text);
        self.html.push_str(&fragment.html);
    }

    pub fn attach(&mut self, path: PathBuf) {
        self.attachments.push(path);
    }
}

/// Escapes a value for inclusion in HTML text or a quoted attribute.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
