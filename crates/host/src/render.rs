//! Text and HTML renderings of a [`TaskView`]

use std::fmt::Write;

use crate::composer::{Field, Section, SolutionOutput, TaskView, VotesView};
use crate::templates::OutputKind;

/// Plain-text rendering for the terminal
pub fn render_text(view: &TaskView) -> String {
    let mut out = String::new();
    out.push_str("Task Information\n");
    out.push_str(view.task_id.as_deref().unwrap_or("-"));
    out.push('\n');

    if let Some(viewer) = &view.viewer {
        let _ = writeln!(out, "\nConnected: {}", viewer.account.value);
        if let Some(balance) = &viewer.balance {
            text_section(&mut out, "Balance", balance);
        }
    }
    if let Some(output) = &view.solution_output {
        let _ = writeln!(out, "\n[Output: {}]", output.template);
        for file in &output.files {
            let kind = match file.kind {
                OutputKind::Image => "image",
                OutputKind::Video => "video",
            };
            let _ = writeln!(out, "  {kind}  {}", file.url);
        }
    }

    text_section(&mut out, "Task", &view.task);
    text_section(&mut out, "Solution", &view.solution);
    text_section(&mut out, "Contestation", &view.contestation);

    out.push_str("\n[Votes]\n");
    match &view.votes {
        VotesView::Loading => out.push_str("  Loading...\n"),
        VotesView::Failed { message } => {
            let _ = writeln!(out, "  Error! {message}");
        }
        VotesView::Empty { notice } => {
            let _ = writeln!(out, "  {notice}");
        }
        VotesView::Tally { summary, entries, .. } => {
            let _ = writeln!(out, "  {summary}");
            for entry in entries {
                let _ = writeln!(out, "  {} - {}  {}", entry.glyph, entry.address, entry.timestamp);
            }
        }
    }

    text_section(&mut out, "Model", &view.model);

    if !view.events.is_empty() {
        out.push_str("\n[Events]\n");
        for event in &view.events {
            let block = event.block.map(|b| format!(" at block {b}")).unwrap_or_default();
            let _ = writeln!(out, "  {} by {}{block}", event.event, event.validator);
        }
    }
    out
}

fn text_section(out: &mut String, title: &str, section: &Section) {
    let _ = writeln!(out, "\n[{title}]");
    match section {
        Section::Loading => out.push_str("  Loading...\n"),
        Section::Failed { message } => {
            let _ = writeln!(out, "  Error! {message}");
        }
        Section::NotFound { notice } => {
            let _ = writeln!(out, "  {notice}");
        }
        Section::Found { fields } => {
            let width = fields.iter().map(|f| f.label.len()).max().unwrap_or_default();
            for field in fields {
                let _ = writeln!(out, "  {:<width$}  {}", field.label, field.value);
            }
        }
    }
}

/// Standalone HTML page; every value is escaped
pub fn render_html(view: &TaskView) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>Task Information</h1>\n<h2>{}</h2>\n",
        escape(view.task_id.as_deref().unwrap_or("-"))
    );

    if let Some(viewer) = &view.viewer {
        let _ = writeln!(body, "<p class=\"viewer\">Connected: {}</p>", html_value(&viewer.account));
        if let Some(balance) = &viewer.balance {
            html_section(&mut body, "Balance", balance);
        }
    }
    if let Some(output) = &view.solution_output {
        html_output(&mut body, output);
    }

    html_section(&mut body, "Task", &view.task);
    html_section(&mut body, "Solution", &view.solution);
    html_section(&mut body, "Contestation", &view.contestation);
    html_votes(&mut body, &view.votes);
    html_section(&mut body, "Model", &view.model);

    if !view.events.is_empty() {
        body.push_str("<ul class=\"events\">\n");
        for event in &view.events {
            let _ = writeln!(
                body,
                "<li>{} by {}</li>",
                escape(event.event),
                escape(&event.validator)
            );
        }
        body.push_str("</ul>\n");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Task</title></head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn html_section(out: &mut String, title: &str, section: &Section) {
    let _ = writeln!(out, "<table>\n<thead><tr><th colspan=\"2\">{}</th></tr></thead>", escape(title));
    match section {
        Section::Loading => out.push_str("<tbody><tr><td colspan=\"2\">Loading...</td></tr></tbody>\n"),
        Section::Failed { message } => {
            let _ = writeln!(
                out,
                "<tbody><tr><td colspan=\"2\">Error! {}</td></tr></tbody>",
                escape(message)
            );
        }
        Section::NotFound { notice } => {
            let _ = writeln!(out, "<tbody><tr><td colspan=\"2\">{}</td></tr></tbody>", escape(notice));
        }
        Section::Found { fields } => {
            out.push_str("<tbody>\n");
            for field in fields {
                let _ = writeln!(
                    out,
                    "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                    escape(field.label),
                    html_value(field)
                );
            }
            out.push_str("</tbody>\n");
        }
    }
    out.push_str("</table>\n");
}

fn html_output(out: &mut String, output: &SolutionOutput) {
    let _ = writeln!(out, "<div class=\"output\" data-template=\"{}\">", escape(output.template));
    for file in &output.files {
        let url = escape(&file.url);
        let _ = match file.kind {
            OutputKind::Image => writeln!(out, "<img src=\"{url}\" alt=\"Solution output\">"),
            OutputKind::Video => writeln!(out, "<video src=\"{url}\" controls loop></video>"),
        };
    }
    out.push_str("</div>\n");
}

fn html_votes(out: &mut String, votes: &VotesView) {
    out.push_str("<table>\n<thead><tr><th>Votes</th></tr></thead>\n<tbody><tr><td>");
    match votes {
        VotesView::Loading => out.push_str("Loading..."),
        VotesView::Failed { message } => {
            let _ = write!(out, "Error! {}", escape(message));
        }
        VotesView::Empty { notice } => out.push_str(&escape(notice)),
        VotesView::Tally { summary, entries, .. } => {
            out.push_str(&escape(summary));
            for entry in entries {
                let _ = write!(
                    out,
                    "<div><a href=\"{}\">{} - {}<br><small>{}</small></a></div>",
                    escape(&entry.link),
                    entry.glyph,
                    escape(&entry.address),
                    escape(&entry.timestamp)
                );
            }
        }
    }
    out.push_str("</td></tr></tbody>\n</table>\n");
}

fn html_value(field: &Field) -> String {
    match &field.link {
        // only absolute links leave the site
        Some(link) if link.starts_with("http") => {
            format!("<a target=\"_blank\" href=\"{}\">{}</a>", escape(link), escape(&field.value))
        }
        Some(link) => format!("<a href=\"{}\">{}</a>", escape(link), escape(&field.value)),
        None => escape(&field.value),
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{EventNotice, OutputFile, VoteEntry};

    fn view() -> TaskView {
        TaskView {
            task_id: Some(format!("0x{}", "0a".repeat(32))),
            viewer: None,
            solution_output: Some(SolutionOutput {
                template: "Zeroscopev2",
                cid: "QmOut".to_string(),
                files: vec![OutputFile {
                    kind: OutputKind::Video,
                    url: "https://ipfs.io/ipfs/QmOut/out-1.mp4".to_string(),
                }],
            }),
            task: Section::Found {
                fields: vec![
                    Field { label: "fee", value: "1.0".to_string(), link: None },
                    Field {
                        label: "owner",
                        value: "0x11".to_string(),
                        link: Some("https://nova.arbiscan.io/address/0x11".to_string()),
                    },
                ],
            },
            solution: Section::NotFound { notice: "No solution found." },
            contestation: Section::Loading,
            model: Section::Failed { message: "rpc error -32000: <execution reverted>".to_string() },
            votes: VotesView::Tally {
                yea: 1,
                nay: 0,
                summary: "1 yea, 0 nay".to_string(),
                entries: vec![VoteEntry {
                    glyph: "👍",
                    address: "0xaa".to_string(),
                    timestamp: "1700000200".to_string(),
                    link: "/validator/0xaa".to_string(),
                }],
            },
            events: vec![EventNotice {
                event: "SolutionSubmitted",
                validator: "0x22".to_string(),
                block: Some(51),
            }],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&view());
        assert!(text.starts_with("Task Information\n0x0a0a"));
        assert!(text.contains("  fee    1.0\n"));
        assert!(text.contains("[Solution]\n  No solution found.\n"));
        assert!(text.contains("[Contestation]\n  Loading...\n"));
        assert!(text.contains("  Error! rpc error -32000: <execution reverted>\n"));
        assert!(text.contains("  1 yea, 0 nay\n  👍 - 0xaa  1700000200\n"));
        assert!(text.contains("SolutionSubmitted by 0x22 at block 51"));
        assert!(text.contains("[Output: Zeroscopev2]\n  video  https://ipfs.io/ipfs/QmOut/out-1.mp4\n"));
    }

    #[test]
    fn test_render_html_escapes_values() {
        let html = render_html(&view());
        assert!(html.contains("Error! rpc error -32000: &lt;execution reverted&gt;"));
        assert!(!html.contains("<execution reverted>"));
        assert!(html.contains(
            "<a target=\"_blank\" href=\"https://nova.arbiscan.io/address/0x11\">0x11</a>"
        ));
        assert!(html.contains("<a href=\"/validator/0xaa\">👍 - 0xaa<br><small>1700000200</small></a>"));
    }

    #[test]
    fn test_render_html_output_by_kind() {
        let html = render_html(&view());
        assert!(html.contains("<video src=\"https://ipfs.io/ipfs/QmOut/out-1.mp4\" controls loop></video>"));

        let mut image = view();
        if let Some(output) = image.solution_output.as_mut() {
            output.template = "Kandinsky2";
            output.files[0] = OutputFile {
                kind: OutputKind::Image,
                url: "https://ipfs.io/ipfs/QmOut/out-1.png".to_string(),
            };
        }
        let html = render_html(&image);
        assert!(html.contains("<img src=\"https://ipfs.io/ipfs/QmOut/out-1.png\" alt=\"Solution output\">"));
        assert!(!html.contains("<video"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
