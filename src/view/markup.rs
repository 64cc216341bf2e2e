//! Default markup generator.

use super::context::MarkupGenerator;
use crate::model::{Links, PostId, ThreadAttributes};
use chrono::SecondsFormat;
use v_htmlescape::escape;

/// Plain HTML rendering of a thread's opening post.
///
/// ```text
/// <section id="p1"><header>..<time datetime="..">..</time>..</header>
/// <figure><img src=".."></figure><blockquote>..</blockquote></section>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMarkup;

impl MarkupGenerator for HtmlMarkup {
    fn thread(&self, attrs: &ThreadAttributes) -> String {
        let mut html = format!(r#"<section id="{}""#, attrs.id.element_id());
        if attrs.locked {
            html.push_str(r#" class="locked""#);
        }
        html.push_str("><header>");
        if let Some(subject) = &attrs.subject {
            html.push_str(&format!("<h3>{}</h3>", escape(subject)));
        }
        if let Some(time) = attrs.time {
            html.push_str(&format!(
                r#"<time datetime="{}">{}</time>"#,
                time.to_rfc3339_opts(SecondsFormat::Secs, true),
                time.format("%d %b %Y %H:%M")
            ));
        }
        html.push_str(&format!(
            r#"<a class="quote">No.{}</a></header>"#,
            attrs.id
        ));
        if let Some(image) = &attrs.image {
            html.push_str(&format!(
                r#"<figure><img src="src-{}"></figure>"#,
                escape(image)
            ));
        }
        html.push_str(&format!(
            "<blockquote>{}</blockquote></section>",
            render_body(&attrs.body, &attrs.links)
        ));
        html
    }

    fn reply_box(&self) -> String {
        r#"<aside class="act posting"><a>Reply</a></aside>"#.to_string()
    }
}

/// Escape the body, turning `>>N` into a link when `N` is in `links`.
fn render_body(body: &str, links: &Links) -> String {
    body.split(' ')
        .map(|word| {
            let target = word
                .strip_prefix(">>")
                .and_then(|num| num.parse::<u64>().ok())
                .and_then(|num| PostId::new(num).ok())
                .and_then(|num| links.get(&num).map(|thread| (num, *thread)));
            match target {
                Some((num, thread)) => {
                    format!(r##"<a class="history" data-thread="{thread}">&gt;&gt;{num}</a>"##)
                }
                None => escape(word).to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
