//! Embedded static assets, the resource guard, and versioned asset URLs.
//!
//! The guard is an ordered list of `+pattern` (accept) and `-pattern`
//! (reject) rules. The last rule matching a path decides; a path matched by
//! no rule is rejected. Patterns without a `/` match the file name in any
//! directory; patterns with one match the whole path, where `*` stays
//! within a segment and `**` spans segments.
//!
//! Asset URLs carry a content version in the file name
//! (`branch-picker-ver-1a2b3c4d.css`) so they can be cached forever.

use rust_embed::Embed;

use crate::error::{AppError, Result};

/// Embedded static files
#[derive(Embed)]
#[folder = "assets"]
pub struct Assets;

const VERSION_MARKER: &str = "-ver-";
const VERSION_LEN: usize = 8;

pub const DEFAULT_AVATAR: &str = "img/empty-avatar.jpg";

const DEFAULT_RULES: &[&str] = &[
    "-*", "+*.js", "+*.css", "+*.png", "+*.jpg", "+*.jpeg", "+*.gif", "+*.ico", "+*.cur",
    "+*.html", "+*.txt", "+*.bmp", "+*.svg",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuardRule {
    accept: bool,
    pattern: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceGuard {
    rules: Vec<GuardRule>,
}

impl ResourceGuard {
    /// A guard rejecting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock web-asset rules.
    pub fn with_defaults() -> Self {
        let mut guard = Self::new();
        for rule in DEFAULT_RULES {
            // Stock rules are well formed.
            let _ = guard.add_pattern(rule);
        }
        guard
    }

    pub fn add_pattern(&mut self, rule: &str) -> Result<()> {
        let (accept, pattern) = match rule.split_at_checked(1) {
            Some(("+", pattern)) => (true, pattern),
            Some(("-", pattern)) => (false, pattern),
            _ => {
                return Err(AppError::InvalidPath(format!(
                    "guard pattern must start with + or -: {}",
                    rule
                )));
            }
        };
        if pattern.is_empty() {
            return Err(AppError::InvalidPath(format!("empty guard pattern: {}", rule)));
        }
        self.rules.push(GuardRule {
            accept,
            pattern: pattern.to_string(),
        });
        Ok(())
    }

    pub fn accept(&self, path: &str) -> bool {
        if path.is_empty()
            || path.starts_with('/')
            || path.contains('\\')
            || path.split('/').any(|segment| segment == ".." || segment.is_empty())
        {
            return false;
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.rules
            .iter()
            .rev()
            .find(|rule| {
                if rule.pattern.contains('/') {
                    wildcard_match(rule.pattern.as_bytes(), path.as_bytes())
                } else {
                    wildcard_match(rule.pattern.as_bytes(), file_name.as_bytes())
                }
            })
            .is_some_and(|rule| rule.accept)
    }
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) if rest.first() == Some(&b'*') => {
            let rest = &rest[1..];
            // `**/` may also stand for no directory at all.
            if let Some(after_slash) = rest.strip_prefix(b"/") {
                if wildcard_match(after_slash, text) {
                    return true;
                }
            }
            (0..=text.len()).any(|i| wildcard_match(rest, &text[i..]))
        }
        Some((b'*', rest)) => {
            let segment_end = text.iter().position(|&c| c == b'/').unwrap_or(text.len());
            (0..=segment_end).any(|i| wildcard_match(rest, &text[i..]))
        }
        Some((b'?', rest)) => match text.split_first() {
            Some((&c, text_rest)) if c != b'/' => wildcard_match(rest, text_rest),
            _ => false,
        },
        Some((&c, rest)) => match text.split_first() {
            Some((&t, text_rest)) if t == c => wildcard_match(rest, text_rest),
            _ => false,
        },
    }
}

/// URL of an embedded asset with its content version in the file name.
pub fn asset_url(path: &str) -> String {
    match Assets::get(path) {
        Some(file) => {
            let version = version_of(&file.metadata.sha256_hash());
            format!("/assets/{}", versioned_name(path, &version))
        }
        None => format!("/assets/{}", path),
    }
}

fn version_of(hash: &[u8; 32]) -> String {
    hash.iter()
        .take(VERSION_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// `css/app.css` + `1a2b3c4d` → `css/app-ver-1a2b3c4d.css`
pub fn versioned_name(path: &str, version: &str) -> String {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            format!("{}{}{}.{}", stem, VERSION_MARKER, version, ext)
        }
        _ => format!("{}{}{}", file, VERSION_MARKER, version),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, file),
        None => file,
    }
}

/// Remove a version tag from a requested file name. Returns the plain path
/// and whether a tag was present.
pub fn strip_version(path: &str) -> (String, bool) {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };

    let Some(marker) = file.rfind(VERSION_MARKER) else {
        return (path.to_string(), false);
    };
    let tag_start = marker + VERSION_MARKER.len();
    let tag_end = tag_start + VERSION_LEN;
    match file.get(tag_start..tag_end) {
        Some(tag) if tag.bytes().all(|b| b.is_ascii_hexdigit()) => {}
        _ => return (path.to_string(), false),
    }
    let suffix = &file[tag_end..];
    if !(suffix.is_empty() || suffix.starts_with('.')) {
        return (path.to_string(), false);
    }

    let plain = format!("{}{}", &file[..marker], suffix);
    match dir {
        Some(dir) => (format!("{}/{}", dir, plain), true),
        None => (plain, true),
    }
}

/// Bytes of an embedded asset.
pub fn load(path: &str) -> Result<Vec<u8>> {
    Assets::get(path)
        .map(|file| file.data.into_owned())
        .ok_or_else(|| AppError::NotFound {
            kind: "Asset",
            id: path.to_string(),
        })
}
