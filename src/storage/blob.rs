use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// zstd 圧縮レベル（画像の data URL はテキストなので中程度で十分縮む）
const COMPRESSION_LEVEL: i32 = 3;

/// 大きな設定値（アバター画像・壁紙の data URL）を保存するコンテンツアドレッサブルストア。
/// 値は SHA-256 でアドレスされ、zstd 圧縮して `<base>/<先頭2文字>/<残り>` に置かれる。
pub struct BlobStore {
    base_dir: PathBuf,
}

impl BlobStore {
    /// ベースディレクトリを作成して BlobStore を初期化する。
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("failed to create blob directory: {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    /// 値を書き込み、そのハッシュを返す。同一内容が既にあれば書き込まない。
    pub fn put(&self, content: &str) -> Result<String> {
        let hash = Self::digest(content);
        let path = self.path_for(&hash);

        if path.exists() {
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create blob shard directory: {}", parent.display())
            })?;
        }

        let compressed = zstd::encode_all(content.as_bytes(), COMPRESSION_LEVEL)
            .context("failed to compress blob")?;
        fs::write(&path, compressed)
            .with_context(|| format!("failed to write blob: {}", path.display()))?;

        Ok(hash)
    }

    /// ハッシュに対応する値を読み出して展開する。
    pub fn get(&self, hash: &str) -> Result<String> {
        let path = self.path_for(hash);
        let compressed =
            fs::read(&path).with_context(|| format!("failed to read blob: {}", path.display()))?;

        let mut decoder =
            zstd::Decoder::new(compressed.as_slice()).context("failed to open zstd stream")?;
        let mut content = String::new();
        decoder
            .read_to_string(&mut content)
            .context("failed to decompress blob")?;

        Ok(content)
    }

    /// ハッシュに対応する blob を削除する。既に無ければ何もしない。
    pub fn remove(&self, hash: &str) -> Result<()> {
        let path = self.path_for(hash);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to remove blob: {}", path.display()))
            }
        }
    }

    fn digest(content: &str) -> String {
        format!("{:x}", Sha256::digest(content.as_bytes()))
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        // ハッシュが短すぎる（壊れた参照）場合はシャードせずにそのまま置く
        match hash.get(..2).zip(hash.get(2..)) {
            Some((shard, rest)) if !rest.is_empty() => self.base_dir.join(shard).join(rest),
            _ => self.base_dir.join(hash),
        }
    }
}
