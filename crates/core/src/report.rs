use crate::models::Document;
use chrono::Local;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

const SLUG_MAX_CHARS: usize = 30;

/// Turn a query into a filesystem-safe slug for the report filename.
fn query_slug(query: &str) -> String {
    let pattern = Regex::new(r"[^A-Za-z0-9]+").expect("static pattern");
    let slug = pattern
        .replace_all(query.trim(), "_")
        .trim_matches('_')
        .to_lowercase();
    slug.chars().take(SLUG_MAX_CHARS).collect()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn document_section(document: &Document) -> String {
    let is_pdf = document.doc_type().contains("PDF");
    let pdf_badge = if is_pdf {
        " <span class=\"badge pdf\">PDF</span>"
    } else {
        ""
    };
    let score_badge = document
        .relevance_score()
        .map(|score| format!(" <span class=\"badge score\">relevance {score:.3}</span>"))
        .unwrap_or_default();

    let date = document
        .metadata
        .get("date")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("-");

    let content = escape_html(&document.content);
    let content_block = if is_pdf {
        format!("<pre>{content}</pre>")
    } else {
        format!("<p>{}</p>", content.replace('\n', "<br>"))
    };

    format!(
        "<div class=\"document\">\n\
         <h2>{title}{pdf_badge}{score_badge}</h2>\n\
         <div class=\"meta\">Source: <a href=\"{source}\">{source}</a> | \
         Type: {doc_type} | Date: {date}</div>\n\
         <div class=\"content\">{content_block}</div>\n\
         </div>\n",
        title = escape_html(document.title()),
        source = escape_html(document.source()),
        doc_type = escape_html(document.doc_type()),
    )
}

/// Write a standalone HTML report of a search and return its path.
pub fn generate_html_report(
    dir: &Path,
    query: &str,
    documents: &[Document],
    response: &str,
) -> Result<PathBuf, std::io::Error> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("bpk_report_{}_{timestamp}.html", query_slug(query));
    let path = dir.join(filename);

    let mut sections = String::new();
    for document in documents {
        sections.push_str(&document_section(document));
    }

    let html = format!(
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Legal Document Search Report</title>\n\
         <style>\n\
         body {{ font-family: Georgia, serif; max-width: 900px; margin: 2em auto; color: #222; }}\n\
         h1 {{ border-bottom: 2px solid #1a4a7a; padding-bottom: 0.3em; }}\n\
         .query-info {{ background: #f0f4f8; padding: 1em; border-radius: 4px; }}\n\
         .response {{ background: #fffbe6; padding: 1em; border-left: 4px solid #c9a227; margin: 1.5em 0; white-space: pre-wrap; }}\n\
         .document {{ border: 1px solid #ddd; border-radius: 4px; padding: 1em; margin: 1em 0; }}\n\
         .meta {{ color: #666; font-size: 0.9em; margin-bottom: 0.8em; }}\n\
         .badge {{ font-size: 0.7em; padding: 0.2em 0.5em; border-radius: 3px; vertical-align: middle; }}\n\
         .badge.pdf {{ background: #b33; color: #fff; }}\n\
         .badge.score {{ background: #1a4a7a; color: #fff; }}\n\
         pre {{ white-space: pre-wrap; background: #f7f7f7; padding: 0.8em; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>Legal Document Search Report</h1>\n\
         <div class=\"query-info\"><strong>Query:</strong> {query}<br>\
         <strong>Generated:</strong> {generated}<br>\
         <strong>Documents found:</strong> {count}</div>\n\
         <div class=\"response\">{response}</div>\n\
         {sections}\
         </body>\n</html>\n",
        query = escape_html(query),
        generated = Local::now().format("%Y-%m-%d %H:%M:%S"),
        count = documents.len(),
        response = escape_html(response),
    );

    std::fs::write(&path, html)?;
    info!(path = %path.display(), "html report written");
    Ok(path)
}
