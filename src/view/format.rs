//! Default English formatting routines.

use super::context::Formatter;
use chrono::{DateTime, Utc};

/// English plurals and the board's omission wording.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishFormatter;

fn pluralize(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

impl Formatter for EnglishFormatter {
    fn relative_time(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(time);
        let minutes = elapsed.num_minutes();
        if minutes < 1 {
            // Future timestamps come from clock skew; treat them as fresh.
            return "just now".to_string();
        }

        let hours = elapsed.num_hours();
        let days = elapsed.num_days();
        let (count, singular, plural) = if minutes < 60 {
            (minutes, "minute", "minutes")
        } else if hours < 24 {
            (hours, "hour", "hours")
        } else if days < 30 {
            (days, "day", "days")
        } else if days < 365 {
            (days / 30, "month", "months")
        } else {
            (days / 365, "year", "years")
        };
        format!("{} ago", pluralize(count, singular, plural))
    }

    fn omission_message(&self, omit: u32, image_omit: u32, see_all: Option<&str>) -> String {
        let mut html = pluralize(i64::from(omit), "reply", "replies");
        if image_omit > 0 {
            html.push_str(" and ");
            html.push_str(&pluralize(i64::from(image_omit), "image", "images"));
        }
        html.push_str(" omitted");
        if let Some(url) = see_all {
            html.push_str(&format!(
                r#" <span class="act"><a href="{}" class="history">See all</a></span>"#,
                v_htmlescape::escape(url)
            ));
        }
        html
    }
}
