//! Refresh local markdown copies of documentation pages.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use scraper::{Html, Selector};

use crate::error::DocsError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Tried in order; the first match is converted, else `<body>`.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    r#"[role="main"]"#,
    ".content",
    "article",
    ".documentation",
    "body",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocPage {
    pub name: &'static str,
    pub url: &'static str,
    pub file_name: &'static str,
}

pub const PAGES: &[DocPage] = &[
    DocPage {
        name: "hooks",
        url: "https://docs.anthropic.com/en/docs/claude-code/hooks",
        file_name: "cc_hooks_docs.md",
    },
    DocPage {
        name: "subagents",
        url: "https://docs.anthropic.com/en/docs/claude-code/subagents",
        file_name: "anthropic_docs_subagents.md",
    },
    DocPage {
        name: "slash-commands",
        url: "https://docs.anthropic.com/en/docs/claude-code/slash-commands",
        file_name: "anthropic_custom_slash_commands.md",
    },
    DocPage {
        name: "output-styles",
        url: "https://docs.anthropic.com/en/docs/claude-code/output-styles",
        file_name: "anthropic_output_styles.md",
    },
    DocPage {
        name: "quick-start",
        url: "https://docs.anthropic.com/en/docs/claude-code/quickstart",
        file_name: "anthropic_quick_start.md",
    },
    DocPage {
        name: "memory",
        url: "https://docs.anthropic.com/en/docs/claude-code/memory",
        file_name: "anthropic_memory_docs.md",
    },
    DocPage {
        name: "settings",
        url: "https://docs.anthropic.com/en/docs/claude-code/settings",
        file_name: "anthropic_settings_docs.md",
    },
];

pub fn find_page(name: &str) -> Result<&'static DocPage, DocsError> {
    PAGES
        .iter()
        .find(|page| page.name == name)
        .ok_or_else(|| DocsError::UnknownPage {
            page: name.to_string(),
            available: PAGES
                .iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Lines for `update-docs --list`.
pub fn page_listing() -> String {
    let mut out = String::from("Available documentation pages:");
    for page in PAGES {
        out.push_str(&format!("\n  {:15} -> {}", page.name, page.url));
    }
    out
}

/// Outer HTML of the main content element.
pub fn extract_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next().map(|el| el.html())
    })
}

/// Markdown document with a provenance header.
pub fn render_markdown(page: &DocPage, content_html: &str) -> Result<String, DocsError> {
    let body = htmd::convert(content_html)?;
    Ok(format!(
        "# {}\n\n> Updated from Anthropic's official documentation\n> Source: {}\n> Last updated: {}\n\n{}",
        title(page.name),
        page.url,
        Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
        body
    ))
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, DocsError> {
    let failed = |e: reqwest::Error| DocsError::FetchFailed {
        url: url.to_string(),
        message: e.to_string(),
    };
    client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(failed)?
        .text()
        .await
        .map_err(failed)
}

/// Write `content` to `<docs_dir>/<file_name>`, renaming any existing file
/// to `<stem>.backup-<YYYYmmdd-HHMMSS>.md` first. Returns the backup path.
pub fn write_page(
    docs_dir: &Path,
    page: &DocPage,
    content: &str,
) -> Result<Option<PathBuf>, DocsError> {
    fs::create_dir_all(docs_dir)?;
    let target = docs_dir.join(page.file_name);

    let backup = if target.exists() {
        let stem = Path::new(page.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup = docs_dir.join(format!(
            "{stem}.backup-{}.md",
            Local::now().format("%Y%m%d-%H%M%S")
        ));
        fs::rename(&target, &backup)?;
        Some(backup)
    } else {
        None
    };

    fs::write(&target, content)?;
    Ok(backup)
}

async fn update_page(
    client: &reqwest::Client,
    docs_dir: &Path,
    page: &DocPage,
) -> Result<(), DocsError> {
    println!("Fetching {}...", page.url);
    let html = fetch(client, page.url).await?;
    let content = extract_content(&html).ok_or_else(|| DocsError::NoContent {
        url: page.url.to_string(),
    })?;
    let markdown = render_markdown(page, &content)?;

    if let Some(backup) = write_page(docs_dir, page, &markdown)? {
        println!("Backed up existing file to {}", backup.display());
    }
    println!("\u{2713} Updated {}", docs_dir.join(page.file_name).display());
    Ok(())
}

/// Refresh each page, printing progress. Returns the number that succeeded.
pub async fn update_pages(pages: &[&DocPage], docs_dir: &Path) -> usize {
    let client = reqwest::Client::new();
    let mut succeeded = 0;
    for page in pages {
        println!("\n--- Updating {} ---", page.name);
        match update_page(&client, docs_dir, page).await {
            Ok(()) => succeeded += 1,
            Err(e) => {
                tracing::debug!(page = page.name, "Docs update failed: {e}");
                println!("Failed to update {}: {e}", page.name);
            }
        }
    }
    println!("\n--- Summary ---");
    println!("Successfully updated: {succeeded}/{} pages", pages.len());
    succeeded
}

/// `slash-commands` -> `Slash Commands`.
fn title(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_first_matching_container() {
        let html = r#"<html><body><nav>menu</nav>
            <article><p>article text</p></article>
            <main><h1>Hooks</h1><p>main text</p></main>
        </body></html>"#;
        let content = extract_content(html).unwrap();
        assert!(content.starts_with("<main>"));
        assert!(!content.contains("menu"));
    }

    #[test]
    fn falls_back_to_body() {
        let content = extract_content("<html><body><p>only body</p></body></html>").unwrap();
        assert!(content.starts_with("<body>"));
        assert!(content.contains("only body"));
    }

    #[test]
    fn markdown_has_provenance_header() {
        let page = find_page("slash-commands").unwrap();
        let markdown = render_markdown(page, "<main><h2>Usage</h2><p>Run it.</p></main>").unwrap();
        assert!(markdown.starts_with("# Slash Commands\n\n> Updated from"));
        assert!(markdown.contains("> Source: https://docs.anthropic.com/en/docs/claude-code/slash-commands\n"));
        assert!(markdown.contains("## Usage"));
        assert!(markdown.contains("Run it."));
    }

    #[test]
    fn existing_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let page = find_page("hooks").unwrap();
        fs::write(dir.path().join("cc_hooks_docs.md"), "old").unwrap();

        let backup = write_page(dir.path(), page, "new").unwrap().unwrap();
        let backup_name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(backup_name.starts_with("cc_hooks_docs.backup-"));
        assert!(backup_name.ends_with(".md"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old");
        assert_eq!(
            fs::read_to_string(dir.path().join("cc_hooks_docs.md")).unwrap(),
            "new"
        );

        assert_eq!(write_page(dir.path(), find_page("memory").unwrap(), "x").unwrap(), None);
    }

    #[test]
    fn unknown_page_lists_choices() {
        let err = find_page("nope").unwrap_err();
        assert!(err.to_string().contains("hooks, subagents"));
        assert_eq!(page_listing().lines().count(), PAGES.len() + 1);
    }
}
