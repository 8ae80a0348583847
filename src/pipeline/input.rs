//! Input resolution: validate the proposal HTML and build its `file://` URL.
//!
//! Chromium must load the page from its real location so that relative
//! image and logo paths resolve. We canonicalise the path, check it is
//! readable and looks like markup, and keep the source text around because
//! the portfolio table is located in it before the browser starts.

use crate::error::ProposalPdfError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// A validated HTML input.
#[derive(Debug, Clone)]
pub struct ResolvedHtml {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// `file://` URL of `path`.
    pub url: String,
    /// Full document text.
    pub source: String,
}

/// Resolve and read the HTML document at `path`.
pub async fn resolve_html(path: &Path) -> Result<ResolvedHtml, ProposalPdfError> {
    let source = match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ProposalPdfError::HtmlNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(ProposalPdfError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(ProposalPdfError::HtmlNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    if !looks_like_html(&source) {
        return Err(ProposalPdfError::NotHtml {
            path: path.to_path_buf(),
            head: source.trim_start().chars().take(16).collect(),
        });
    }

    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|_| ProposalPdfError::HtmlNotFound {
            path: path.to_path_buf(),
        })?;
    let url = file_url(&canonical)?.to_string();
    debug!("Resolved HTML: {}", url);

    Ok(ResolvedHtml {
        path: canonical,
        url,
        source,
    })
}

/// Markup starts with `<` once any byte-order mark and whitespace are skipped.
pub fn looks_like_html(source: &str) -> bool {
    source
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with('<')
}

/// `file://` URL of an absolute path.
pub fn file_url(path: &Path) -> Result<Url, ProposalPdfError> {
    Url::from_file_path(path).map_err(|()| {
        ProposalPdfError::Internal(format!(
            "cannot express '{}' as a file:// URL",
            path.display()
        ))
    })
}
