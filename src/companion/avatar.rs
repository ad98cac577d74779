//! 伙伴のアバター画像

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

/// アップロードを受け付ける最大サイズ
const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_AVATAR_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 200">
<circle cx="100" cy="100" r="80" fill="none" stroke="rgba(0,255,255,0.1)" stroke-width="1"/>
<circle cx="100" cy="100" r="60" fill="none" stroke="rgba(0,255,255,0.2)" stroke-width="1"/>
<defs><radialGradient id="core" cx="0.4" cy="0.4" r="0.6">
<stop offset="0%" stop-color="rgba(110,231,244,1)"/><stop offset="100%" stop-color="rgba(56,189,248,1)"/>
</radialGradient></defs>
<circle cx="100" cy="100" r="30" fill="url(#core)"/>
<circle cx="100" cy="100" r="90" fill="none" stroke="rgba(0,255,255,0.5)" stroke-width="2" stroke-dasharray="10 15"/>
</svg>"#;

/// 既定アバター（SVG）の data URL
pub fn default_avatar() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(DEFAULT_AVATAR_SVG)
    )
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// data URL の MIME タイプとおおよそのデコード後バイト数
pub fn describe(data_url: &str) -> (Option<&str>, usize) {
    let Some(rest) = data_url.strip_prefix("data:") else {
        return (None, 0);
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        return (None, 0);
    };
    let mime = meta.split(';').next().filter(|m| !m.is_empty());
    let padding = payload.bytes().rev().take_while(|&b| b == b'=').count();
    (mime, (payload.len() / 4 * 3).saturating_sub(padding))
}

/// 画像ファイルを読み込んで data URL にする。
pub fn data_url_from_file(path: &Path) -> Result<String> {
    let Some(mime) = mime_for(path) else {
        bail!("unsupported image type: {}", path.display());
    };

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image: {}", path.display()))?;
    if bytes.is_empty() {
        bail!("image file is empty: {}", path.display());
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        bail!(
            "image is too large ({} bytes, limit {MAX_AVATAR_BYTES})",
            bytes.len()
        );
    }

    debug!(path = %path.display(), mime, bytes = bytes.len(), "Encoding avatar image");
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(&bytes)))
}
