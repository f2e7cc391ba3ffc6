//! The content sections a formatter can run, and their default renderings.

use itertools::Itertools;
use tracing::debug;
use url::Url;

use super::{html_escape, Fragment, FormatterSettings};
use crate::context::NotificationContext;
use crate::core::StateType;

/// Everything a section may read.
#[derive(Debug, Clone, Copy)]
pub struct SectionInput<'a> {
    pub context: &'a NotificationContext,
    pub settings: &'a FormatterSettings,
}

/// A section renderer. Sections are pure: the same input always yields the
/// same fragment.
pub type SectionFn = fn(&SectionInput<'_>) -> Fragment;

/// The closed set of content sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    HostInfo,
    StateInfo,
    AdditionalInfo,
    ActionUrl,
    StateDetail,
    RecipientsLink,
    NotificationInfo,
    AckUrl,
    AckInfo,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::HostInfo => "host_info",
            Section::StateInfo => "state_info",
            Section::AdditionalInfo => "additional_info",
            Section::ActionUrl => "action_url",
            Section::StateDetail => "state_detail",
            Section::RecipientsLink => "recipients_link",
            Section::NotificationInfo => "notification_info",
            Section::AckUrl => "ack_url",
            Section::AckInfo => "ack_info",
        }
    }

    /// The renderer used when a variant does not override this section.
    pub fn default_fn(&self) -> SectionFn {
        match self {
            Section::HostInfo => host_info,
            Section::StateInfo => state_info,
            Section::AdditionalInfo => additional_info,
            Section::ActionUrl => action_url,
            Section::StateDetail => state_detail,
            Section::RecipientsLink => recipients_link,
            Section::NotificationInfo => notification_info,
            Section::AckUrl => ack_url,
            Section::AckInfo => ack_info,
        }
    }
}

/// Presentational hints a plan can attach to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleHint {
    Success,
}

/// One step of a formatter's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSection {
    pub section: Section,
    pub style: Option<StyleHint>,
}

impl PlannedSection {
    pub fn plain(section: Section) -> Self {
        Self {
            section,
            style: None,
        }
    }

    pub fn styled(section: Section, style: StyleHint) -> Self {
        Self {
            section,
            style: Some(style),
        }
    }
}

fn bold_line(fragment: &mut Fragment, label: &str, value: &str) {
    fragment.line(
        format!("{label}: {value}"),
        format!("<b>{}:</b> {}", label, html_escape(value)),
    );
}

fn link_line(fragment: &mut Fragment, label: &str, url: &str) {
    let url_html = html_escape(url);
    fragment.line(
        format!("{label}: {url}"),
        format!("<b>{label}:</b> <a href=\"{url_html}\">{url_html}</a>"),
    );
}

/// `Host: <name> [(<address>)]`, then the service line or a bare line break.
pub fn host_info(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();

    if !ctx.hostname.is_empty() {
        let address = if ctx.host_address.is_empty() {
            String::new()
        } else {
            format!("({})", ctx.host_address)
        };
        fragment.line(
            format!("Host: {} {}", ctx.hostname, address),
            format!(
                "<b>Host:</b> {} {}",
                html_escape(&ctx.hostname),
                html_escape(&address)
            ),
        );
    }

    if ctx.has_service() {
        bold_line(&mut fragment, "Service", &ctx.service_desc);
    }
    fragment.blank();
    fragment
}

/// `State: <state>[ for <duration>][ (attempt a/m)]`.
pub fn state_info(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    if ctx.state.is_empty() {
        return fragment;
    }

    let mut value = ctx.state.clone();
    if !ctx.duration.is_empty() {
        value.push_str(&format!(" for {}", ctx.duration));
    }
    if !ctx.attempt.is_empty() && !ctx.max_attempts.is_empty() {
        value.push_str(&format!(" (attempt {}/{})", ctx.attempt, ctx.max_attempts));
    }
    bold_line(&mut fragment, "State", &value);
    fragment.blank();
    fragment
}

/// Plugin output followed by the long output, if any.
pub fn additional_info(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let lines: Vec<&str> = [ctx.output.as_str(), ctx.long_output.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if lines.is_empty() {
        return Fragment::default();
    }

    let mut fragment = Fragment::default();
    for line in &lines {
        fragment.text.push_str(line);
        fragment.text.push('\n');
    }
    fragment.text.push('\n');
    fragment.html = format!("<pre>{}</pre>\n", html_escape(&lines.join("\n")));
    fragment
}

pub fn action_url(input: &SectionInput<'_>) -> Fragment {
    let mut fragment = Fragment::default();
    if !input.context.action_url.is_empty() {
        link_line(&mut fragment, "Action URL", &input.context.action_url);
        fragment.blank();
    }
    fragment
}

/// Service notes and notes URL. Host alerts carry no state detail.
pub fn state_detail(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    if ctx.state_type != StateType::Service {
        return fragment;
    }

    if !ctx.notes.is_empty() {
        bold_line(&mut fragment, "Notes", &ctx.notes);
    }
    if !ctx.notes_url.is_empty() {
        link_line(&mut fragment, "Notes URL", &ctx.notes_url);
    }
    if !fragment.is_empty() {
        fragment.blank();
    }
    fragment
}

/// The notified contacts; in HTML each one links to its definition in the
/// monitoring UI when a base URL is configured.
pub fn recipients_link(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    if ctx.recipients.is_empty() {
        return fragment;
    }

    let text = ctx.recipients.join(", ");
    let html = match input.settings.monitoring_base() {
        Some(base) => ctx
            .recipients
            .iter()
            .map(|name| {
                let name = html_escape(name);
                format!("<a href=\"{base}/cgi-bin/config.cgi?type=contacts#{name}\">{name}</a>")
            })
            .join(", "),
        None => html_escape(&text),
    };
    fragment.line(
        format!("Notified: {text}"),
        format!("<b>Notified:</b> {html}"),
    );
    fragment.blank();
    fragment
}

/// `Notification #<n>[ at <timestamp>]`.
pub fn notification_info(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    if ctx.notification_number.is_empty() && ctx.timestamp.is_empty() {
        return fragment;
    }

    let mut text = String::from("Notification");
    if !ctx.notification_number.is_empty() {
        text.push_str(&format!(" #{}", ctx.notification_number));
    }
    if !ctx.timestamp.is_empty() {
        text.push_str(&format!(" at {}", ctx.timestamp));
    }
    let html = format!("<small>{}</small>", html_escape(&text));
    fragment.line(text, html);
    fragment.blank();
    fragment
}

/// A link that acknowledges the problem through the monitoring UI's command
/// CGI. Needs both a configured base URL and a host name.
pub fn ack_url(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    let Some(base) = input.settings.monitoring_base() else {
        return fragment;
    };
    if ctx.hostname.is_empty() {
        return fragment;
    }

    let mut url = match Url::parse(&format!("{base}/cgi-bin/cmd.cgi")) {
        Ok(url) => url,
        Err(e) => {
            debug!(base = %base, error = %e, "Skipping acknowledgement link");
            return fragment;
        }
    };
    {
        let mut query = url.query_pairs_mut();
        if ctx.has_service() {
            query
                .append_pair("cmd_typ", "34")
                .append_pair("host", &ctx.hostname)
                .append_pair("service", &ctx.service_desc);
        } else {
            query
                .append_pair("cmd_typ", "33")
                .append_pair("host", &ctx.hostname);
        }
    }

    let url_html = html_escape(url.as_str());
    fragment.line(
        format!("Acknowledge: {url}"),
        format!("<a href=\"{url_html}\">Acknowledge this problem</a>"),
    );
    fragment.blank();
    fragment
}

/// `Acknowledged by <author>: <comment>`.
pub fn ack_info(input: &SectionInput<'_>) -> Fragment {
    let ctx = input.context;
    let mut fragment = Fragment::default();
    if ctx.ack_author.is_empty() && ctx.ack_comment.is_empty() {
        return fragment;
    }

    let mut text = String::from("Acknowledged");
    let mut html = String::from("<b>Acknowledged</b>");
    if !ctx.ack_author.is_empty() {
        text.push_str(&format!(" by {}", ctx.ack_author));
        html.push_str(&format!(" by {}", html_escape(&ctx.ack_author)));
    }
    if !ctx.ack_comment.is_empty() {
        text.push_str(&format!(": {}", ctx.ack_comment));
        html.push_str(&format!(": <i>{}</i>", html_escape(&ctx.ack_comment)));
    }
    fragment.line(text, html);
    fragment.blank();
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{MapSource, NotificationContext};

    fn render(section: Section, source: MapSource, settings: &FormatterSettings) -> Fragment {
        let context = NotificationContext::from_source(&source);
        let input = SectionInput {
            context: &context,
            settings,
        };
        (section.default_fn())(&input)
    }

    fn host_source() -> MapSource {
        MapSource::new()
            .with("HOSTNAME", "web01")
            .with("HOSTSTATE", "DOWN")
    }

    fn service_source() -> MapSource {
        MapSource::new()
            .with("HOSTNAME", "web01")
            .with("SERVICEDESC", "http")
            .with("SERVICESTATE", "CRITICAL")
    }

    #[test]
    fn test_host_info_without_service() {
        let fragment = render(Section::HostInfo, host_source(), &FormatterSettings::default());
        assert_eq!(fragment.text, "Host: web01 \n\n");
        assert_eq!(fragment.html, "<b>Host:</b> web01 <br>\n<br>\n");
    }

    #[test]
    fn test_host_info_with_service_and_address() {
        let source = service_source().with("HOSTADDRESS", "10.0.0.5");
        let fragment = render(Section::HostInfo, source, &FormatterSettings::default());
        assert_eq!(fragment.text, "Host: web01 (10.0.0.5)\nService: http\n\n");
    }

    #[test]
    fn test_host_info_with_empty_service_description() {
        let source = MapSource::new()
            .with("HOSTNAME", "web01")
            .with("SERVICESTATE", "WARNING");
        let fragment = render(Section::HostInfo, source, &FormatterSettings::default());
        assert_eq!(fragment.text, "Host: web01 \n\n");
    }

    #[test]
    fn test_state_info_includes_duration_and_attempts() {
        let source = service_source()
            .with("SERVICEDURATION", "0d 0h 5m 2s")
            .with("SERVICEATTEMPT", "3")
            .with("MAXSERVICEATTEMPTS", "3");
        let fragment = render(Section::StateInfo, source, &FormatterSettings::default());
        assert_eq!(
            fragment.text,
            "State: CRITICAL for 0d 0h 5m 2s (attempt 3/3)\n\n"
        );
    }

    #[test]
    fn test_state_info_skips_missing_attempt_count() {
        let source = service_source().with("SERVICEATTEMPT", "2");
        let fragment = render(Section::StateInfo, source, &FormatterSettings::default());
        assert_eq!(fragment.text, "State: CRITICAL\n\n");
    }

    #[test]
    fn test_additional_info_unescapes_long_output() {
        let source = service_source()
            .with("SERVICEOUTPUT", "HTTP CRITICAL - 503 <Service Unavailable>")
            .with("LONGSERVICEOUTPUT", "backend a: down\\nbackend b: down");
        let fragment = render(Section::AdditionalInfo, source, &FormatterSettings::default());
        assert_eq!(
            fragment.text,
            "HTTP CRITICAL - 503 <Service Unavailable>\nbackend a: down\nbackend b: down\n\n"
        );
        assert_eq!(
            fragment.html,
            "<pre>HTTP CRITICAL - 503 &lt;Service Unavailable&gt;\nbackend a: down\nbackend b: down</pre>\n"
        );
    }

    #[test]
    fn test_empty_fields_emit_nothing() {
        let settings = FormatterSettings::default();
        for section in [
            Section::StateInfo,
            Section::AdditionalInfo,
            Section::ActionUrl,
            Section::StateDetail,
            Section::RecipientsLink,
            Section::NotificationInfo,
            Section::AckUrl,
            Section::AckInfo,
        ] {
            assert!(
                render(section, MapSource::new(), &settings).is_empty(),
                "{} should be empty",
                section.name()
            );
        }
    }

    #[test]
    fn test_state_detail_is_service_only() {
        let settings = FormatterSettings::default();
        let host = host_source().with("HOSTNOTES", "rack 4");
        assert!(render(Section::StateDetail, host, &settings).is_empty());

        let service = service_source()
            .with("SERVICENOTES", "see runbook")
            .with("SERVICENOTESURL", "https://wiki.example.com/http");
        let fragment = render(Section::StateDetail, service, &settings);
        assert_eq!(
            fragment.text,
            "Notes: see runbook\nNotes URL: https://wiki.example.com/http\n\n"
        );
    }

    #[test]
    fn test_recipients_link_with_monitoring_url() {
        let settings = FormatterSettings {
            monitoring_url: Some("https://nagios.example.com/nagios/".to_string()),
            ..Default::default()
        };
        let source = host_source().with("NOTIFICATIONRECIPIENTS", "alice,bob");
        let fragment = render(Section::RecipientsLink, source, &settings);
        assert_eq!(fragment.text, "Notified: alice, bob\n\n");
        assert!(fragment.html.contains(
            "<a href=\"https://nagios.example.com/nagios/cgi-bin/config.cgi?type=contacts#alice\">alice</a>, "
        ));
    }

    #[test]
    fn test_ack_url_for_service() {
        let settings = FormatterSettings {
            monitoring_url: Some("https://nagios.example.com/nagios".to_string()),
            ..Default::default()
        };
        let source = service_source().with("SERVICEDESC", "disk /var");
        let fragment = render(Section::AckUrl, source, &settings);
        assert_eq!(
            fragment.text,
            "Acknowledge: https://nagios.example.com/nagios/cgi-bin/cmd.cgi?cmd_typ=34&host=web01&service=disk+%2Fvar\n\n"
        );
        assert!(fragment.html.contains("cmd_typ=34&amp;host=web01"));
    }

    #[test]
    fn test_ack_url_for_host() {
        let settings = FormatterSettings {
            monitoring_url: Some("https://nagios.example.com/nagios".to_string()),
            ..Default::default()
        };
        let fragment = render(Section::AckUrl, host_source(), &settings);
        assert_eq!(
            fragment.text,
            "Acknowledge: https://nagios.example.com/nagios/cgi-bin/cmd.cgi?cmd_typ=33&host=web01\n\n"
        );
    }

    #[test]
    fn test_ack_info() {
        let source = host_source()
            .with("HOSTACKAUTHOR", "alice")
            .with("HOSTACKCOMMENT", "rebooting");
        let fragment = render(Section::AckInfo, source, &FormatterSettings::default());
        assert_eq!(fragment.text, "Acknowledged by alice: rebooting\n\n");
        assert_eq!(
            fragment.html,
            "<b>Acknowledged</b> by alice: <i>rebooting</i><br>\n<br>\n"
        );
    }

    #[test]
    fn test_notification_info() {
        let source = host_source()
            .with("HOSTNOTIFICATIONNUMBER", "2")
            .with("LONGDATETIME", "Fri Oct 16 12:00:00 UTC 2026");
        let fragment = render(Section::NotificationInfo, source, &FormatterSettings::default());
        assert_eq!(
            fragment.text,
            "Notification #2 at Fri Oct 16 12:00:00 UTC 2026\n\n"
        );
    }

    #[test]
    fn test_sections_are_repeatable() {
        let settings = FormatterSettings::default();
        let context = NotificationContext::from_source(&host_source());
        let input = SectionInput {
            context: &context,
            settings: &settings,
        };
        assert_eq!(host_info(&input), host_info(&input));
    }
}
