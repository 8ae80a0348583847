//! # pdfium-auto
//!
//! Find, download and bind the [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library for `pdfium-render`.
//!
//! proposal-pdf only needs PDFium for its screenshot stage, so the library is
//! fetched lazily the first time that stage runs instead of being a build or
//! install requirement.
//!
//! ## Resolution order
//!
//! 1. `PDFIUM_LIB_PATH`, when it names an existing file.
//! 2. The per-version cache directory (see [`pdfium_cache_dir`]).
//! 3. Download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium_silent().expect("PDFium unavailable");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH` — use an existing library; never download.
//! - `PROPOSAL_PDF_PDFIUM_CACHE` — cache root instead of the OS cache dir.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// pdfium-binaries release tag (`chromium/<N>`) this crate downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASES: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

const ENV_LIB_PATH: &str = "PDFIUM_LIB_PATH";
const ENV_CACHE_ROOT: &str = "PROPOSAL_PDF_PDFIUM_CACHE";

/// Progress sink for the download: `(bytes_so_far, content_length)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No PDFium build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of {url} failed: {detail}")]
    Download { url: String, detail: String },

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Release assets ───────────────────────────────────────────────────────────

/// Where the library lives inside one release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Asset {
    archive: &'static str,
    member: &'static str,
    file_name: &'static str,
}

const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

fn asset_for(os: &str, arch: &str) -> Option<Asset> {
    let (archive, (member, file_name)) = match (os, arch) {
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", SO),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", SO),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", DYLIB),
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", DYLIB),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", DLL),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", DLL),
        ("windows", "x86") => ("pdfium-win-x86.tgz", DLL),
        _ => return None,
    };
    Some(Asset {
        archive,
        member,
        file_name,
    })
}

fn current_asset() -> Result<Asset, PdfiumAutoError> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    asset_for(os, arch).ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    })
}

fn download_url(asset: &Asset) -> String {
    format!("{RELEASES}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive)
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// Per-version cache directory, e.g. `~/.cache/proposal-pdf/pdfium-7690/`
/// on Linux or `~/Library/Caches/proposal-pdf/pdfium-7690/` on macOS.
pub fn pdfium_cache_dir() -> PathBuf {
    let root = match std::env::var_os(ENV_CACHE_ROOT) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("proposal-pdf"),
    };
    root.join(format!("pdfium-{PDFIUM_VERSION}"))
}

fn env_library() -> Option<PathBuf> {
    std::env::var_os(ENV_LIB_PATH)
        .map(PathBuf::from)
        .filter(|p| p.is_file())
}

fn cached_library() -> Option<PathBuf> {
    let asset = current_asset().ok()?;
    Some(pdfium_cache_dir().join(asset.file_name)).filter(|p| p.is_file())
}

/// `true` when binding would not need the network.
pub fn is_pdfium_cached() -> bool {
    env_library().or_else(cached_library).is_some()
}

static RESOLVED: OnceLock<PathBuf> = OnceLock::new();

/// Path to a usable PDFium library, downloading it on first use.
///
/// Safe to call from several threads; later calls in the same process return
/// the first resolved path without touching the disk.
pub fn ensure_pdfium_library(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED.get() {
        return Ok(path.clone());
    }
    let path = match env_library().or_else(cached_library) {
        Some(path) => path,
        None => download_into_cache(on_progress)?,
    };
    Ok(RESOLVED.get_or_init(|| path).clone())
}

/// Resolve (downloading if needed) and bind, with no progress output.
pub fn bind_pdfium_silent() -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_pdfium_library(None)?;
    bind_pdfium_from_path(&path)
}

/// Bind the library at `path`, bypassing resolution.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Download ─────────────────────────────────────────────────────────────────

fn download_into_cache(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    let asset = current_asset()?;
    let dir = pdfium_cache_dir();
    std::fs::create_dir_all(&dir).map_err(|source| PdfiumAutoError::CacheDir {
        path: dir.clone(),
        source,
    })?;

    let url = download_url(&asset);
    let archive = fetch(&url, on_progress)?;

    // Unpack beside the final name so a half-written file is never picked up.
    let target = dir.join(asset.file_name);
    let partial = dir.join(format!("{}.part", asset.file_name));
    unpack_member(&archive, asset.member, &partial)?;
    std::fs::rename(&partial, &target).map_err(|source| PdfiumAutoError::CacheDir {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

fn fetch(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let failed = |detail: String| PdfiumAutoError::Download {
        url: url.to_string(),
        detail,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| failed(e.to_string()))?;
    let mut response = client.get(url).send().map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(failed(e.to_string())),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Write the archive entry named `member` of a `.tgz` to `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));

    for entry in tar.entries().map_err(extract)? {
        let mut entry = entry.map_err(extract)?;
        let is_member = entry.path().map_err(extract)?.as_ref() == Path::new(member);
        if is_member {
            entry.unpack(dest).map_err(extract)?;
            return Ok(());
        }
    }
    Err(PdfiumAutoError::Extract(format!("'{member}' not found in archive")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_have_assets() {
        let linux = asset_for("linux", "x86_64").unwrap();
        assert_eq!(linux.archive, "pdfium-linux-x64.tgz");
        assert_eq!(linux.file_name, "libpdfium.so");
        assert_eq!(asset_for("macos", "aarch64").unwrap().member, "lib/libpdfium.dylib");
        assert_eq!(asset_for("windows", "x86").unwrap().file_name, "pdfium.dll");
        assert!(asset_for("freebsd", "x86_64").is_none());
    }

    #[test]
    fn url_points_at_pinned_release() {
        let url = download_url(&asset_for("linux", "aarch64").unwrap());
        assert_eq!(
            url,
            format!("{RELEASES}/chromium%2F{PDFIUM_VERSION}/pdfium-linux-arm64.tgz")
        );
    }

    #[test]
    fn cache_dir_is_versioned() {
        let dir = pdfium_cache_dir();
        assert!(dir.ends_with(format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn unpacks_named_member_only() {
        let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
            Vec::new(),
            flate2::Compression::fast(),
        ));
        for (name, body) in [("include/fpdfview.h", &b"header"[..]), ("lib/libpdfium.so", &b"ELF"[..])] {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body).unwrap();
        }
        let archive = builder.into_inner().unwrap().finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("libpdfium.so");
        unpack_member(&archive, "lib/libpdfium.so", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"ELF");

        let err = unpack_member(&archive, "bin/pdfium.dll", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
