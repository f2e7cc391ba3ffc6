//! The per-notification content assembler.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use super::{
    html_escape, ContentBuffer, FormatterVariant, Fragment, PlannedSection, SectionInput, StyleHint,
};
use crate::context::NotificationContext;
use crate::core::{MessageType, NotificationType, StateType};
use crate::error::Result;
use crate::notification::Message;

/// Presentation settings shared by every section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterSettings {
    /// Base URL of the monitoring web UI, used for contact and
    /// acknowledgement links.
    pub monitoring_url: Option<String>,
    /// CSS applied to sections rendered with the success hint.
    pub success_style: String,
    /// Parent directory for scratch directories. Defaults to the system
    /// temporary directory.
    pub scratch_root: Option<PathBuf>,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            monitoring_url: None,
            success_style: "color: #008000;".to_string(),
            scratch_root: None,
        }
    }
}

impl FormatterSettings {
    /// The monitoring UI base URL without a trailing slash, if configured.
    pub fn monitoring_base(&self) -> Option<&str> {
        self.monitoring_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    fn css_for(&self, hint: StyleHint) -> &str {
        match hint {
            StyleHint::Success => &self.success_style,
        }
    }
}

/// Assembles the subject and body of a single notification.
///
/// A formatter lives for exactly one notification. Its scratch directory,
/// if one was created, is removed when the formatter is dropped.
pub struct Formatter<'a> {
    variant: &'a FormatterVariant,
    context: &'a NotificationContext,
    settings: &'a FormatterSettings,
    state_type: StateType,
    content: ContentBuffer,
    scratch: Option<TempDir>,
}

impl<'a> Formatter<'a> {
    pub fn new(
        variant: &'a FormatterVariant,
        context: &'a NotificationContext,
        settings: &'a FormatterSettings,
    ) -> Self {
        Self {
            variant,
            context,
            settings,
            state_type: context.state_type,
            content: ContentBuffer::default(),
            scratch: None,
        }
    }

    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    pub fn message_type(&self) -> MessageType {
        self.variant.message_type
    }

    pub fn variant(&self) -> &FormatterVariant {
        self.variant
    }

    pub fn content(&self) -> &ContentBuffer {
        &self.content
    }

    pub fn add_text(&mut self, text: &str) {
        self.content.add_text(text);
    }

    pub fn add_html(&mut self, html: &str) {
        self.content.add_html(html);
    }

    pub fn attach(&mut self, path: PathBuf) {
        self.content.attach(path);
    }

    /// Renders one planned section through the variant's section table and
    /// appends the result.
    pub fn run_section(&mut self, planned: PlannedSection) {
        let input = SectionInput {
            context: self.context,
            settings: self.settings,
        };
        let mut fragment = (self.variant.section_fn(planned.section))(&input);
        if let Some(hint) = planned.style {
            fragment = fragment.styled(self.settings.css_for(hint));
        }
        self.content.add(fragment);
    }

    /// Builds the body for `notification_type`.
    ///
    /// The type is validated before any section runs, so an unknown value
    /// leaves the content untouched.
    #[instrument(skip(self), fields(formatter = self.variant.name))]
    pub fn generate_content(&mut self, notification_type: &str) -> Result<NotificationType> {
        let kind: NotificationType = notification_type.parse()?;
        let plan = (self.variant.plan)(kind, self.variant.message_type);
        debug!(
            sections = ?plan.iter().map(|p| p.section.name()).collect::<Vec<_>>(),
            "Generating content"
        );
        for planned in plan {
            self.run_section(planned);
        }
        Ok(kind)
    }

    /// The subject line in text and HTML form.
    pub fn subject(&self, kind: NotificationType) -> Fragment {
        let ctx = self.context;
        let text = match self.variant.message_type {
            MessageType::Email => format!(
                "** {} {} {} is {} **",
                kind,
                self.state_type.label(),
                ctx.target(),
                ctx.state
            ),
            MessageType::Pager => format!("{}: {} is {}", kind, ctx.target(), ctx.state),
        };
        let html = format!("<h3>{}</h3>\n", html_escape(&text));
        Fragment { text, html }
    }

    /// The scratch directory for downloaded attachments, created on first use.
    pub fn scratch_dir(&mut self) -> io::Result<&Path> {
        let dir = match self.scratch.take() {
            Some(dir) => dir,
            None => {
                let mut builder = tempfile::Builder::new();
                builder.prefix("nagnotify-");
                let dir = match &self.settings.scratch_root {
                    Some(root) => builder.tempdir_in(root)?,
                    None => builder.tempdir()?,
                };
                debug!(path = %dir.path().display(), "Created scratch directory");
                dir
            }
        };
        Ok(self.scratch.insert(dir).path())
    }

    /// Removes the scratch directory if this formatter created one. Calling
    /// it again, or after the directory vanished, is a no-op.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.scratch.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
                }
            }
        }
    }

    /// Packages the assembled content into a [`Message`]. Pager variants
    /// carry the plain-text body only.
    pub fn build_message(
        &self,
        kind: NotificationType,
        from: &str,
        recipients: Vec<String>,
        dry_run: bool,
    ) -> Message {
        let subject = self.subject(kind);
        let (html, attachments) = match self.variant.message_type {
            MessageType::Email => (
                Some(format!(
                    "<html>\n<body>\n{}{}</body>\n</html>\n",
                    subject.html, self.content.html
                )),
                self.content.attachments.clone(),
            ),
            MessageType::Pager => (None, Vec::new()),
        };
        Message {
            recipients,
            from: from.to_string(),
            subject: subject.text,
            text: self.content.text.clone(),
            html,
            attachments,
            dry_run,
        }
    }
}

impl Drop for Formatter<'_> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
