//! arXiv source discovery and download.
//!
//! Papers typically carry their arXiv identifier in the margin of the first
//! page. When present, the LaTeX source can be fetched from
//! `arxiv.org/src/`; a best-effort bonus feature, fully independent of the
//! ToC pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use tocify_core::backend::{BackendError, TextSource};

mod archive;

/// User-Agent sent with every arXiv request.
const USER_AGENT: &str = concat!("tocify/", env!("CARGO_PKG_VERSION"));

/// Pages searched for an arXiv identifier.
const ID_SEARCH_PAGES: usize = 3;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ArxivError {
    #[error("no arXiv identifier found in document")]
    IdNotFound,
    #[error("source for {0} is not available (author did not upload source files)")]
    SourceUnavailable(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("archive error: {0}")]
    Archive(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a successful fetch produced.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub arxiv_id: String,
    /// Directory the source was extracted into.
    pub dir: PathBuf,
    /// Extracted `.tex` files, for display.
    pub tex_files: Vec<PathBuf>,
}

/// Look for an arXiv identifier in the first pages of the document.
///
/// Recognizes both the new `YYMM.NNNNN` and the old `category/YYMMNNN`
/// format, with or without a version suffix; the suffix is stripped since
/// source URLs resolve the latest version.
pub fn extract_arxiv_id(doc: &dyn TextSource) -> Result<Option<String>, BackendError> {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        vec![
            Regex::new(r"(?i)arXiv[:\s]+(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap(),
            Regex::new(r"(?i)arxiv\.org/(?:abs|pdf)/(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap(),
            Regex::new(r"(?i)arXiv[:\s]+([a-z\-]+/\d{7}(?:v\d+)?)").unwrap(),
            Regex::new(r"(?i)arxiv\.org/(?:abs|pdf)/([a-z\-]+/\d{7}(?:v\d+)?)").unwrap(),
        ]
    });
    static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"v\d+$").unwrap());

    let mut text = String::new();
    for i in 0..ID_SEARCH_PAGES.min(doc.page_count()) {
        text.push_str(doc.page_text(i)?);
        text.push('\n');
    }

    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&text) {
            let id = VERSION_SUFFIX.replace(&caps[1], "").into_owned();
            return Ok(Some(id));
        }
    }
    Ok(None)
}

fn source_url(arxiv_id: &str) -> String {
    format!("https://arxiv.org/src/{}", arxiv_id)
}

/// Probe whether arXiv has source files for the given identifier.
pub fn is_source_available(arxiv_id: &str) -> bool {
    let Ok(client) = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(PROBE_TIMEOUT)
        .build()
    else {
        return false;
    };

    match client.head(source_url(arxiv_id)).send() {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::debug!(error = %e, "availability probe failed");
            false
        }
    }
}

/// Download and extract the source bundle for `arxiv_id` into
/// `{out_dir}/arxiv-{id}`.
///
/// arXiv serves tarballs, zips, or occasionally a bare TeX file; container
/// detection goes by Content-Type first and falls back to trying tar.gz,
/// then saving the payload as a single `source.tex`.
pub fn download_source(arxiv_id: &str, out_dir: &Path) -> Result<PathBuf, ArxivError> {
    let url = source_url(arxiv_id);
    tracing::debug!(%url, "downloading arXiv source");

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let response = client.get(&url).send()?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ArxivError::SourceUnavailable(arxiv_id.to_string()));
    }
    let response = response.error_for_status()?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let data = response.bytes()?;

    let extract_dir = out_dir.join(format!("arxiv-{}", arxiv_id.replace('/', "-")));
    std::fs::create_dir_all(&extract_dir)?;

    if content_type.contains("gzip") || content_type.contains("tar") {
        archive::extract_tar_gz(&data, &extract_dir).map_err(ArxivError::Archive)?;
        tracing::debug!(dir = %extract_dir.display(), "extracted tar archive");
    } else if content_type.contains("zip") {
        archive::extract_zip(&data, &extract_dir).map_err(ArxivError::Archive)?;
        tracing::debug!(dir = %extract_dir.display(), "extracted zip archive");
    } else {
        // Unhelpful Content-Type: tar.gz is by far the most common, so try
        // it before falling back to a single-file payload.
        match archive::extract_tar_gz(&data, &extract_dir) {
            Ok(_) => tracing::debug!(dir = %extract_dir.display(), "extracted archive"),
            Err(_) => {
                let single = extract_dir.join("source.tex");
                std::fs::write(&single, &data)?;
                tracing::debug!(file = %single.display(), "saved single-file source");
            }
        }
    }

    Ok(extract_dir)
}

/// Full fetch flow: find the identifier, probe availability, download and
/// extract, list TeX files.
pub fn fetch_source(doc: &dyn TextSource, out_dir: &Path) -> Result<FetchReport, ArxivError> {
    let arxiv_id = extract_arxiv_id(doc)?.ok_or(ArxivError::IdNotFound)?;
    tracing::info!(%arxiv_id, "found arXiv identifier");

    if !is_source_available(&arxiv_id) {
        return Err(ArxivError::SourceUnavailable(arxiv_id));
    }

    let dir = download_source(&arxiv_id, out_dir)?;
    let mut tex_files = Vec::new();
    collect_tex_files(&dir, &mut tex_files)?;
    tex_files.sort();

    Ok(FetchReport {
        arxiv_id,
        dir,
        tex_files,
    })
}

fn collect_tex_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_tex_files(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("tex"))
        {
            out.push(path);
        }
    }
    Ok(())
}
