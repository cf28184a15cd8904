//! Local file bulletin source, for offline runs and replaying saved pages.

use std::path::PathBuf;

use async_trait::async_trait;
use encoding_rs::{Encoding, WINDOWS_1254};

use crate::error::{AppError, Result};
use crate::source::{BulletinSource, extract_bulletin_text};

/// Reads the bulletin from a saved page or plain-text dump.
pub struct FileBulletinSource {
    path: PathBuf,
}

impl FileBulletinSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BulletinSource for FileBulletinSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::fetch(self.name(), e))?;
        Ok(extract_bulletin_text(&decode_page(&bytes)))
    }
}

/// Decode a saved page: UTF-8 when valid, otherwise the charset the page
/// declares, falling back to windows-1254 as served by KOERI.
fn decode_page(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let encoding = declared_charset(bytes).unwrap_or(WINDOWS_1254);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!("Saved page is not valid {}; some characters were replaced", encoding.name());
    }
    text.into_owned()
}

/// Charset label from a `<meta>` declaration near the top of the page.
fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    Encoding::for_label(label.as_bytes())
}
