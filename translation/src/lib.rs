//! Key/value text-translation cache.
//!
//! Language files live as `{lang}.txt` under a configured directory, one
//! `key:value` pair per line. Each file is loaded once and cached in
//! memory; a missing key is answered with the `[key]` placeholder, which
//! is also appended back to the file so translators can spot the gap.

pub mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use error::{Result, TranslationError};

type LanguageMap = HashMap<String, String>;

pub struct Translator {
    dir: PathBuf,
    cache: RwLock<HashMap<String, LanguageMap>>,
}

impl Translator {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn language_file(&self, language: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", language))
    }

    /// Parse `key:value` lines. Keys are lowercased so lookups are
    /// case-insensitive; malformed lines are skipped.
    fn parse(contents: &str) -> LanguageMap {
        let mut map = LanguageMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                map.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }
        map
    }

    /// Load the language file into the cache if it is not already there.
    async fn ensure_loaded(&self, language: &str) -> Result<()> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(language) {
                return Ok(());
            }
        }

        let path = self.language_file(language);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TranslationError::LanguageNotFound(language.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let map = Self::parse(&contents);
        info!("Loaded {} translations for language '{}'", map.len(), language);

        let mut cache = self.cache.write().await;
        cache.entry(language.to_string()).or_insert(map);
        Ok(())
    }

    /// Translate `key` into `language`. A missing key comes back as
    /// `[key]` and the placeholder is recorded in the language file.
    pub async fn translate(&self, language: &str, key: &str) -> Result<String> {
        if key.trim().is_empty() {
            return Err(TranslationError::EmptyKey);
        }

        self.ensure_loaded(language).await?;

        let lookup = key.to_lowercase();
        {
            let cache = self.cache.read().await;
            if let Some(value) = cache.get(language).and_then(|m| m.get(&lookup)) {
                debug!("Translated '{}' for '{}'", key, language);
                return Ok(value.clone());
            }
        }

        let placeholder = format!("[{}]", key);
        warn!(
            "Key '{}' missing for language '{}', recording placeholder",
            key, language
        );
        self.write_key(language, key, &placeholder).await?;
        Ok(placeholder)
    }

    /// Append a key/value pair to the language file and the cache.
    pub async fn write_key(&self, language: &str, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(TranslationError::EmptyKey);
        }

        let path = self.language_file(language);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{}:{}\n", key.to_lowercase(), value).as_bytes())
            .await?;
        // write_all only fills tokio's buffer; the line is not on disk
        // until the flush completes.
        file.flush().await?;

        let mut cache = self.cache.write().await;
        cache
            .entry(language.to_string())
            .or_default()
            .insert(key.to_lowercase(), value.to_string());
        Ok(())
    }
}
