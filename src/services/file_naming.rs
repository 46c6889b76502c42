//! 文件命名 - 业务能力层
//!
//! 由响应头或 URL 确定性地推导文件名

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

/// 文件名查询参数，按优先级排列
const NAME_KEYS: &[&str] = &["filename", "file", "name", "documentName", "id"];

/// 稳定 ID 查询参数，按优先级排列
const ID_KEYS: &[&str] = &["id", "documentId", "docId", "mailingId", "uuid"];

const STEM_PREFIX: &str = "flatex_";

/// 主名最大字节数，给冲突后缀留出余量（文件系统上限通常为 255 字节）
const MAX_STEM_LEN: usize = 200;
const MAX_EXT_LEN: usize = 16;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"))
}

fn disposition_filename() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\*?=(?:UTF-8''|")?([^";]+)"#).expect("valid regex")
    })
}

/// 只保留 `[A-Za-z0-9._-]`，保证有主名和扩展名，并限制长度
pub fn sanitize_filename(name: &str) -> String {
    let replaced = unsafe_chars().replace_all(name.trim(), "_");
    let safe = replaced.trim_matches(['.', '_']);
    if safe.is_empty() {
        return "document.pdf".to_string();
    }

    let (stem, ext) = match safe.rfind('.') {
        Some(i) if i > 0 => (&safe[..i], &safe[i..]),
        _ => (safe, ""),
    };
    let stem = stem.trim_end_matches(['.', '_']);
    let stem = if stem.is_empty() { "document" } else { stem };
    let ext = if ext.is_empty() { ".pdf" } else { ext };
    // 清理后只剩 ASCII，按字节截断是安全的
    let stem = &stem[..stem.len().min(MAX_STEM_LEN)];
    let ext = &ext[..ext.len().min(MAX_EXT_LEN)];
    format!("{}{}", stem, ext)
}

fn with_pdf_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// 从 Content-Disposition 中取文件名
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = disposition_filename().captures(header)?.get(1)?.as_str();
    let candidate = decode(raw);
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    Some(sanitize_filename(&with_pdf_extension(candidate)))
}

/// 只根据 URL 推导文件名（下载前即可确定，用于跳过已存在文件）
pub fn filename_from_url(url: &str, fallback_stem: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        for key in NAME_KEYS {
            let value = parsed
                .query_pairs()
                .find(|(k, v)| k == *key && !v.trim().is_empty())
                .map(|(_, v)| v.trim().to_string());
            if let Some(candidate) = value {
                return sanitize_filename(&with_pdf_extension(&candidate));
            }
        }

        let tail = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(decode)
            .unwrap_or_default();
        if !tail.trim().is_empty() {
            return sanitize_filename(&with_pdf_extension(&tail));
        }
    }

    sanitize_filename(&format!("{}.pdf", fallback_stem))
}

/// 下载后的文件名：优先响应头，其次 URL
pub fn filename_for_response(
    content_disposition: Option<&str>,
    url: &str,
    fallback_stem: &str,
) -> String {
    content_disposition
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| filename_from_url(url, fallback_stem))
}

/// 稳定的文件主名：优先文档 ID 参数，否则取 URL 的哈希
pub fn build_stable_stem(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        for key in ID_KEYS {
            let value = parsed
                .query_pairs()
                .find(|(k, v)| k == *key && !v.trim().is_empty())
                .map(|(_, v)| v.into_owned());
            if let Some(id) = value {
                let safe = sanitize_filename(&id);
                let safe = match safe.len().checked_sub(4) {
                    Some(cut) if safe[cut..].eq_ignore_ascii_case(".pdf") => &safe[..cut],
                    _ => safe.as_str(),
                };
                return format!("{}{}", STEM_PREFIX, safe);
            }
        }
    }

    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", STEM_PREFIX, hex)
}

/// 在目录中找到不冲突的路径：`a.pdf`、`a_2.pdf`、`a_3.pdf` ...
pub fn unique_target(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    if !target.exists() {
        return target;
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut i = 2;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, i, ext));
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}
