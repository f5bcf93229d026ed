// src/services/report.rs

//! Report trigger rule and mail body rendering.

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::models::{ChangeReport, Event, ReportConfig, format_date};
use crate::services::notify::Message;

const DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
</head>
<body style="font-family: Arial, sans-serif; margin: 20px; padding: 20px; background-color: #f9f9f9;">
    <h1 style="text-align: center; color: #333;">{heading}</h1>
    <table align="center" width="100%" style="max-width: 600px; background-color: #ffffff; padding: 20px; border-radius: 5px; box-shadow: 0 0 10px rgba(0,0,0,0.1);">
        <tr>
            <td>
                {sections}
            </td>
        </tr>
    </table>
</body>
</html>"#;

const SECTION_TEMPLATE: &str = r#"
<h2 style="text-align: center; color: #333;">{title}</h2>

<ul style="color: #666;">
    {items}
</ul>
"#;

const ITEM_TEMPLATE: &str = "<li><b>{date}</b><br />{description}<br /><br /></li>";

/// Decides whether to notify and renders the report.
#[derive(Debug, Clone)]
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Notify on additions, or unconditionally on the summary day.
    ///
    /// Deletions alone never trigger a report.
    pub fn should_notify(&self, report: &ChangeReport, today: NaiveDate) -> bool {
        report.added_count > 0 || today.weekday() == self.config.summary_day
    }

    /// Mail subject for a report sent on `today`.
    pub fn subject(&self, today: NaiveDate) -> Result<String> {
        Ok(format!(
            "{} - {}",
            self.config.subject_prefix,
            format_date(today, &self.config.date_format)?
        ))
    }

    /// Render the HTML body.
    ///
    /// The changed section appears only when events were added; the upcoming
    /// section is always present.
    pub fn render(&self, report: &ChangeReport) -> Result<String> {
        let mut sections = String::new();
        if report.added_count > 0 {
            sections.push_str(&self.section(&self.config.changed_title, &report.added_events)?);
        }
        let upcoming_title = self
            .config
            .upcoming_title
            .replace("{days}", &self.config.upcoming_days.to_string());
        sections.push_str(&self.section(&upcoming_title, &report.upcoming_events)?);

        Ok(DOCUMENT_TEMPLATE
            .replace("{heading}", &escape_html(&self.config.heading))
            .replace("{sections}", &sections))
    }

    /// Assemble the outgoing message.
    pub fn message(
        &self,
        report: &ChangeReport,
        today: NaiveDate,
        recipients: &[String],
    ) -> Result<Message> {
        Ok(Message {
            subject: self.subject(today)?,
            html_body: self.render(report)?,
            recipients: recipients.to_vec(),
        })
    }

    fn section(&self, title: &str, events: &[Event]) -> Result<String> {
        let items = events
            .iter()
            .map(|event| {
                Event::new(event.date, escape_html(&event.description))
                    .format(ITEM_TEMPLATE, &self.config.date_format)
            })
            .collect::<Result<String>>()?;

        Ok(SECTION_TEMPLATE
            .replace("{title}", &escape_html(title))
            .replace("{items}", &items))
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-03-14 is a Friday, 2025-03-12 a Wednesday.
    const FRIDAY: (i32, u32, u32) = (2025, 3, 14);
    const WEDNESDAY: (i32, u32, u32) = (2025, 3, 12);

    fn on((y, m, d): (i32, u32, u32)) -> NaiveDate {
        date(y, m, d)
    }

    fn report_with(added: Vec<Event>, deleted: Vec<Event>, upcoming: Vec<Event>) -> ChangeReport {
        ChangeReport {
            added_count: added.len(),
            added_events: added,
            deleted_count: deleted.len(),
            deleted_events: deleted,
            upcoming_events: upcoming,
        }
    }

    #[test]
    fn test_additions_trigger() {
        let report = report_with(vec![Event::new(date(2025, 3, 20), "Neu")], vec![], vec![]);
        assert!(Reporter::default().should_notify(&report, on(WEDNESDAY)));
    }

    #[test]
    fn test_deletions_alone_do_not_trigger() {
        let report = report_with(
            vec![],
            vec![Event::new(date(2025, 3, 20), "Weg"), Event::new(date(2025, 3, 21), "Auch weg")],
            vec![],
        );
        assert!(!Reporter::default().should_notify(&report, on(WEDNESDAY)));
    }

    #[test]
    fn test_summary_day_overrides() {
        let report = report_with(
            vec![],
            vec![Event::new(date(2025, 3, 20), "Weg"), Event::new(date(2025, 3, 21), "Auch weg")],
            vec![Event::new(date(2025, 3, 28), "Bald")],
        );
        let reporter = Reporter::default();
        assert!(reporter.should_notify(&report, on(FRIDAY)));

        let body = reporter.render(&report).unwrap();
        assert!(!body.contains("Geänderte Kalendereinträge"));
        assert!(body.contains("Einträge für die nächste 60 Tage"));
        assert!(!body.contains("Weg"));
        assert!(body.contains("28.03.2025"));
    }

    #[test]
    fn test_configured_summary_day() {
        let config = ReportConfig {
            summary_day: chrono::Weekday::Wed,
            ..ReportConfig::default()
        };
        let report = ChangeReport::default();
        let reporter = Reporter::new(&config);
        assert!(reporter.should_notify(&report, on(WEDNESDAY)));
        assert!(!reporter.should_notify(&report, on(FRIDAY)));
    }

    #[test]
    fn test_render_sections_in_order() {
        let report = report_with(
            vec![
                Event::new(date(2025, 4, 2), "Zweiter Eintrag"),
                Event::new(date(2025, 3, 20), "Erster Eintrag"),
            ],
            vec![],
            vec![
                Event::new(date(2025, 3, 20), "Erster Eintrag"),
                Event::new(date(2025, 4, 2), "Zweiter Eintrag"),
            ],
        );

        let body = Reporter::default().render(&report).unwrap();
        let changed = body.find("Geänderte Kalendereinträge").unwrap();
        let upcoming = body.find("Einträge für die nächste 60 Tage").unwrap();
        assert!(changed < upcoming);

        // Added events keep extraction order inside their section.
        let changed_section = &body[changed..upcoming];
        assert!(changed_section.find("02.04.2025").unwrap() < changed_section.find("20.03.2025").unwrap());

        assert!(body.contains("<li><b>20.03.2025</b><br />Erster Eintrag<br /><br /></li>"));
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<title>ALS Kalender Update</title>"));
    }

    #[test]
    fn test_render_escapes_text() {
        let report = report_with(vec![], vec![], vec![Event::new(date(2025, 3, 20), "Q&A <Aula>")]);
        let body = Reporter::default().render(&report).unwrap();
        assert!(body.contains("Q&amp;A &lt;Aula&gt;"));
    }

    #[test]
    fn test_message() {
        let reporter = Reporter::default();
        let recipients = vec!["eltern@example.org".to_string()];
        let message = reporter
            .message(&ChangeReport::default(), on(FRIDAY), &recipients)
            .unwrap();

        assert_eq!(message.subject, "ALS Kalender Update - 14.03.2025");
        assert_eq!(message.recipients, recipients);
        assert!(message.html_body.contains("</html>"));
    }

    #[test]
    fn test_upcoming_title_uses_window_length() {
        let config = ReportConfig {
            upcoming_days: 14,
            ..ReportConfig::default()
        };
        let body = Reporter::new(&config).render(&ChangeReport::default()).unwrap();
        assert!(body.contains("Einträge für die nächste 14 Tage"));
        assert!(!body.contains("{days}"));
    }

    #[test]
    fn test_bad_date_format_is_error() {
        let config = ReportConfig {
            date_format: "%d.%m.%Q".into(),
            ..ReportConfig::default()
        };
        let reporter = Reporter::new(&config);
        let report = report_with(vec![], vec![], vec![Event::new(date(2025, 3, 20), "Bald")]);

        assert!(reporter.subject(on(FRIDAY)).is_err());
        assert!(reporter.render(&report).is_err());
    }
}
