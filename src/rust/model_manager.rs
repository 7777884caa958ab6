use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::BuiltinModel;

/// The synset file has 1000 lines of roughly 20 bytes each.
const MIN_LABELS_BYTES: u64 = 8 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Downloaded {file_type} file is {size} bytes, expected at least {min}")]
    Truncated { file_type: String, size: u64, min: u64 },
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Keeps the CNN model files and their label files in a local cache directory.
///
/// A download is checked against the pinned digest when the model has one, and
/// against a minimum size otherwise. Every stored file gets a `<file>.sha256`
/// sidecar holding its digest, so later corruption is detected and the file
/// fetched again.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("BREEDCHECK_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("breedcheck").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("breedcheck").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("breedcheck").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        self.models_dir.join(model.name()).join("model.onnx")
    }

    pub fn get_labels_path(&self, model: BuiltinModel) -> PathBuf {
        self.models_dir.join(model.name()).join("synset.txt")
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        let labels_path = self.get_labels_path(model);
        log::debug!("Checking if model {} is downloaded:", model);
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("  Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        model_path.exists() && labels_path.exists()
    }

    /// Downloads the model and its labels, skipping files that are already present
    /// and intact. On failure both files are removed again.
    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(model);
        let labels_path = self.get_labels_path(model);

        let model_file = Expected {
            file_type: "model",
            hash: info.model_hash.as_deref(),
            min_bytes: info.min_model_bytes,
        };
        let labels_file = Expected {
            file_type: "labels",
            hash: info.labels_hash.as_deref(),
            min_bytes: MIN_LABELS_BYTES,
        };

        let result = match self.fetch_if_needed(&info.model_url, &model_path, &model_file).await {
            Ok(()) => self.fetch_if_needed(&info.labels_url, &labels_path, &labels_file).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                log::info!("Model {} and labels ready to use", info.name);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to set up model {}: {}", info.name, e);
                let _ = self.remove_download(model);
                Err(e)
            }
        }
    }

    async fn fetch_if_needed(&self, url: &str, path: &Path, expected: &Expected<'_>) -> Result<(), ModelError> {
        let file_type = expected.file_type;
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, expected.hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        }
        self.download_and_verify_file(url, path, expected).await
    }

    /// Checks a file against its pinned digest, or the digest recorded in its
    /// sidecar when nothing is pinned. A missing file, or a missing sidecar for an
    /// unpinned file, counts as unverified.
    pub(crate) fn verify_file(&self, path: &Path, pinned: Option<&str>) -> Result<bool, ModelError> {
        if !path.exists() {
            return Ok(false);
        }

        let expected = match pinned {
            Some(hash) => hash.to_string(),
            None => {
                let digest_path = digest_path(path);
                if !digest_path.exists() {
                    return Ok(false);
                }
                fs::read_to_string(&digest_path)?.trim().to_string()
            }
        };
        let actual = sha256_hex(&fs::read(path)?);
        log::debug!("Verifying {:?}: expected {}, got {}", path, expected, actual);
        Ok(actual == expected)
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        let model_ok = self.verify_file(&self.get_model_path(model), info.model_hash.as_deref())?;
        let labels_ok = self.verify_file(&self.get_labels_path(model), info.labels_hash.as_deref())?;

        log::info!("Verification results for {}:", model);
        log::info!("  Model hash verification: {}", model_ok);
        log::info!("  Labels hash verification: {}", labels_ok);

        Ok(model_ok && labels_ok)
    }

    async fn download_and_verify_file(&self, url: &str, path: &Path, expected: &Expected<'_>) -> Result<(), ModelError> {
        let file_type = expected.file_type;
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let expected = expected.check(&bytes)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        let actual = sha256_hex(&fs::read(path)?);
        if actual != expected {
            log::error!("{} hash mismatch after write: expected {}, got {}", file_type, expected, actual);
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected,
                actual,
            });
        }
        fs::write(digest_path(path), &expected)?;

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        for path in [self.get_model_path(model), self.get_labels_path(model)] {
            for file in [digest_path(&path), path] {
                if file.exists() {
                    fs::remove_file(&file)?;
                }
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if !self.is_model_downloaded(model) {
            log::info!("Model {} not found, downloading...", model);
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Model {} verification failed, re-downloading...", model);
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::info!("Model {} verification successful", model);
        }

        if !self.verify_model(model)? {
            return Err(ModelError::VerificationFailed);
        }
        Ok(())
    }

    /// Returns the model's file paths, failing if they have not been downloaded.
    pub fn require_model(&self, model: BuiltinModel) -> Result<(PathBuf, PathBuf), ModelError> {
        if !self.is_model_downloaded(model) {
            return Err(ModelError::NotDownloaded(model.to_string()));
        }
        Ok((self.get_model_path(model), self.get_labels_path(model)))
    }

    #[cfg(test)]
    pub(crate) fn record_digest(&self, path: &Path) -> Result<(), ModelError> {
        fs::write(digest_path(path), sha256_hex(&fs::read(path)?))?;
        Ok(())
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("models_dir", &self.models_dir)
            .finish()
    }
}

/// What a freshly downloaded file has to satisfy before it is written to the cache.
struct Expected<'a> {
    file_type: &'a str,
    hash: Option<&'a str>,
    min_bytes: u64,
}

impl Expected<'_> {
    /// Returns the digest of `bytes` once they pass the pinned digest, or the size
    /// floor when no digest is pinned.
    fn check(&self, bytes: &[u8]) -> Result<String, ModelError> {
        let actual = sha256_hex(bytes);
        match self.hash {
            Some(hash) if hash != actual => {
                log::error!("{} hash mismatch: expected {}, got {}", self.file_type, hash, actual);
                Err(ModelError::HashMismatch {
                    file_type: self.file_type.to_string(),
                    expected: hash.to_string(),
                    actual,
                })
            }
            Some(_) => Ok(actual),
            None if (bytes.len() as u64) < self.min_bytes => Err(ModelError::Truncated {
                file_type: self.file_type.to_string(),
                size: bytes.len() as u64,
                min: self.min_bytes,
            }),
            None => Ok(actual),
        }
    }
}

fn digest_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".sha256");
    path.with_file_name(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_download(manager: &ModelManager, model: BuiltinModel) {
        let model_path = manager.get_model_path(model);
        fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        fs::write(&model_path, b"onnx bytes").unwrap();
        fs::write(manager.get_labels_path(model), "n02085936 Maltese dog\n").unwrap();
    }

    #[test]
    fn test_paths_are_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        assert!(manager.get_model_path(BuiltinModel::Vgg).ends_with("vgg/model.onnx"));
        assert!(manager.get_labels_path(BuiltinModel::AlexNet).ends_with("alexnet/synset.txt"));
        assert!(!manager.is_model_downloaded(BuiltinModel::ResNet));
        assert!(matches!(
            manager.require_model(BuiltinModel::ResNet),
            Err(ModelError::NotDownloaded(_))
        ));
    }

    #[test]
    fn test_verification_uses_sidecar_digest() -> Result<(), ModelError> {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path())?;
        let model = BuiltinModel::ResNet;
        fake_download(&manager, model);

        assert!(manager.is_model_downloaded(model));
        // No digests recorded yet
        assert!(!manager.verify_model(model)?);

        manager.record_digest(&manager.get_model_path(model))?;
        manager.record_digest(&manager.get_labels_path(model))?;
        assert!(manager.verify_model(model)?);

        // Corrupt file and verify
        fs::write(manager.get_model_path(model), "corrupted data")?;
        assert!(!manager.verify_model(model)?);
        Ok(())
    }

    #[test]
    fn test_pinned_digest_overrides_sidecar() -> Result<(), ModelError> {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path())?;
        let path = dir.path().join("model.onnx");
        fs::write(&path, b"onnx bytes")?;

        let good = sha256_hex(b"onnx bytes");
        assert!(manager.verify_file(&path, Some(&good))?);

        // A sidecar written from a bad first download does not help against a pin
        manager.record_digest(&path)?;
        assert!(!manager.verify_file(&path, Some(&sha256_hex(b"other bytes")))?);
        assert!(manager.verify_file(&path, None)?);
        Ok(())
    }

    #[test]
    fn test_download_checked_against_pin() {
        let pinned = sha256_hex(b"real weights");
        let expected = Expected {
            file_type: "model",
            hash: Some(&pinned),
            min_bytes: 0,
        };
        assert_eq!(expected.check(b"real weights").unwrap(), pinned);
        assert!(matches!(
            expected.check(b"<html>rate limited</html>"),
            Err(ModelError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_unpinned_download_must_reach_size_floor() {
        let expected = Expected {
            file_type: "model",
            hash: None,
            min_bytes: 1024,
        };
        let pointer = b"version https://git-lfs.github.com/spec/v1\noid sha256:abc\nsize 46830571\n";
        assert!(matches!(
            expected.check(pointer),
            Err(ModelError::Truncated { min: 1024, .. })
        ));
        assert_eq!(expected.check(&[0u8; 2048]).unwrap(), sha256_hex(&[0u8; 2048]));
    }

    #[test]
    fn test_remove_download() -> Result<(), ModelError> {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path())?;
        let model = BuiltinModel::Vgg;
        fake_download(&manager, model);
        manager.record_digest(&manager.get_model_path(model))?;

        manager.remove_download(model)?;
        assert!(!manager.is_model_downloaded(model));
        assert!(!digest_path(&manager.get_model_path(model)).exists());
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var("BREEDCHECK_CACHE", "/tmp/test-breedcheck-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-breedcheck-cache/models"));
        env::remove_var("BREEDCHECK_CACHE");

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("breedcheck"));
    }

    #[tokio::test]
    #[ignore = "downloads the ResNet model from the ONNX model zoo"]
    async fn test_model_download() -> Result<(), ModelError> {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path())?;
        let model = BuiltinModel::ResNet;

        manager.ensure_model_downloaded(model).await?;
        assert!(manager.is_model_downloaded(model));
        assert!(manager.verify_model(model)?);
        Ok(())
    }
}
