//! Formatter variants: a named message type plus its section plan and
//! per-section overrides.

use std::collections::HashMap;

use super::sections::{PlannedSection, Section, SectionFn, SectionInput, StyleHint};
use super::{html_escape, Fragment};
use crate::core::{MessageType, NotificationType};

/// Builds the ordered section list for a notification.
pub type PlanFn = fn(NotificationType, MessageType) -> Vec<PlannedSection>;

/// A selectable formatter.
///
/// The plan decides which sections run and in what order; the override table
/// replaces individual section renderers for this variant only.
#[derive(Clone)]
pub struct FormatterVariant {
    pub name: &'static str,
    pub description: &'static str,
    pub message_type: MessageType,
    pub plan: PlanFn,
    pub attach_graphs: bool,
    overrides: HashMap<Section, SectionFn>,
}

impl std::fmt::Debug for FormatterVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut overridden: Vec<_> = self.overrides.keys().map(Section::name).collect();
        overridden.sort_unstable();
        f.debug_struct("FormatterVariant")
            .field("name", &self.name)
            .field("message_type", &self.message_type)
            .field("attach_graphs", &self.attach_graphs)
            .field("overrides", &overridden)
            .finish()
    }
}

impl FormatterVariant {
    pub fn new(name: &'static str, message_type: MessageType) -> Self {
        Self {
            name,
            description: "",
            message_type,
            plan: default_plan,
            attach_graphs: false,
            overrides: HashMap::new(),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn with_plan(mut self, plan: PlanFn) -> Self {
        self.plan = plan;
        self
    }

    pub fn override_section(mut self, section: Section, render: SectionFn) -> Self {
        self.overrides.insert(section, render);
        self
    }

    pub fn with_graphs(mut self) -> Self {
        self.attach_graphs = true;
        self
    }

    /// The renderer this variant uses for `section`.
    pub fn section_fn(&self, section: Section) -> SectionFn {
        self.overrides
            .get(&section)
            .copied()
            .unwrap_or_else(|| section.default_fn())
    }
}

/// The section plan every built-in variant starts from.
pub fn default_plan(kind: NotificationType, message_type: MessageType) -> Vec<PlannedSection> {
    use Section::*;

    const FULL: [Section; 7] = [
        HostInfo,
        StateInfo,
        AdditionalInfo,
        ActionUrl,
        StateDetail,
        RecipientsLink,
        NotificationInfo,
    ];

    match kind {
        NotificationType::Problem | NotificationType::FlappingStart => {
            if message_type == MessageType::Pager {
                vec![PlannedSection::plain(AdditionalInfo)]
            } else {
                FULL.iter()
                    .copied()
                    .chain(std::iter::once(AckUrl))
                    .map(PlannedSection::plain)
                    .collect()
            }
        }
        NotificationType::Recovery | NotificationType::FlappingStop => FULL
            .iter()
            .map(|&section| PlannedSection::styled(section, StyleHint::Success))
            .collect(),
        NotificationType::Acknowledgement => {
            vec![PlannedSection::plain(HostInfo), PlannedSection::plain(AckInfo)]
        }
    }
}

/// Pagers get the plugin output without the long output.
fn pager_additional_info(input: &SectionInput<'_>) -> Fragment {
    let output = input.context.output.as_str();
    if output.is_empty() {
        return Fragment::default();
    }
    Fragment::new(format!("{output}\n"), html_escape(output))
}

/// Multi-part HTML mail with text fallback.
pub fn email() -> FormatterVariant {
    FormatterVariant::new("email", MessageType::Email)
        .describe("HTML and plain-text mail with the full alert details")
}

/// Short plain-text messages for pagers and SMS gateways.
pub fn pager() -> FormatterVariant {
    FormatterVariant::new("pager", MessageType::Pager)
        .describe("terse plain-text message for pagers")
        .override_section(Section::AdditionalInfo, pager_additional_info)
}

/// The email variant with metric graphs of the host attached.
pub fn graph_email() -> FormatterVariant {
    FormatterVariant::new("graph_email", MessageType::Email)
        .describe("HTML mail with host metric graphs attached")
        .with_graphs()
}
