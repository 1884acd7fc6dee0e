//! Human-readable page output.

use colored::Colorize;
use gordon_protocol::{Metadata, Page, PageRef};
use std::fmt::Write;

/// Formats a page for the terminal.
pub fn page(page: &Page) -> String {
    let mut out = String::new();

    let status = if page.is_error() {
        page.status.to_string().red().bold()
    } else {
        page.status.to_string().green().bold()
    };
    let _ = writeln!(out, "{} [{}]", page.title.bold(), status);
    let _ = writeln!(out, "{}", meta(&page.meta).dimmed());

    if !page.preamble.is_empty() {
        let _ = writeln!(out, "\n{}", page.preamble);
    }

    for section in &page.sections {
        let _ = writeln!(out, "\n{}", format!("## {}", section.title).cyan().bold());
        if !section.body.is_empty() {
            let _ = writeln!(out, "{}", section.body);
        }
    }

    if !page.links.is_empty() {
        let _ = writeln!(out, "\n{}", "Links".bold());
        for (i, link) in page.links.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {}", i, page_ref(link));
        }
    }

    if !page.relationships.is_empty() {
        let _ = writeln!(out, "\n{}", "Relationships".bold());
        for rel in &page.relationships {
            let _ = writeln!(
                out,
                "  {} {} {}",
                page_ref(&rel.subject),
                rel.predicate.to_string().yellow(),
                page_ref(&rel.object)
            );
        }
    }

    if !page.tags.is_empty() {
        let _ = writeln!(out, "\n{} {}", "Tags:".bold(), page.tags.join(", "));
    }

    if !page.labels.is_empty() {
        let _ = writeln!(out, "\n{}", "Labels".bold());
        for (key, value) in &page.labels {
            let _ = writeln!(out, "  {} = {}", key.cyan(), value);
        }
    }

    if !page.history.is_empty() {
        let _ = writeln!(out, "\n{}", "History".bold());
        for entry in &page.history {
            let _ = writeln!(out, "  {}", meta(entry));
        }
    }

    out
}

fn meta(meta: &Metadata) -> String {
    format!(
        "{} by {} at {}",
        meta.id,
        if meta.author.is_empty() {
            "unknown"
        } else {
            meta.author.as_str()
        },
        meta.published.to_rfc3339()
    )
}

fn page_ref(r: &PageRef) -> String {
    let mut s = String::new();
    if !r.server.is_empty() {
        let _ = write!(s, "//{}/", r.server);
    }
    let _ = write!(s, "{}", r.page);
    if !r.section.is_empty() {
        let _ = write!(s, "#{}", r.section);
    }
    s
}
