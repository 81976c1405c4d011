use crate::PrefResult;
use crate::store::{FAVORITES_KEY, PrefStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteFile {
    pub path: PathBuf,

    pub name: String,

    pub is_directory: bool,

    pub added_at: DateTime<Utc>,
}

impl FavoriteFile {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            is_directory,
            added_at: Utc::now(),
        }
    }
}

impl PrefStore {
    /// Insertion order.
    pub async fn favorites(&self) -> PrefResult<Vec<FavoriteFile>> {
        self.read_blob(FAVORITES_KEY).await
    }

    /// Returns `false` when the path was already a favorite.
    pub async fn add_favorite(&self, file: FavoriteFile) -> PrefResult<bool> {
        let mut favorites = self.favorites().await?;

        if favorites.iter().any(|f| f.path == file.path) {
            return Ok(false);
        }

        favorites.push(file);
        self.write_blob(FAVORITES_KEY, &favorites).await?;
        Ok(true)
    }

    pub async fn remove_favorite(&self, path: &Path) -> PrefResult<()> {
        let mut favorites = self.favorites().await?;
        favorites.retain(|f| f.path != path);
        self.write_blob(FAVORITES_KEY, &favorites).await
    }

    pub async fn is_favorite(&self, path: &Path) -> PrefResult<bool> {
        Ok(self.favorites().await?.iter().any(|f| f.path == path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_favorite_ignores_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let store = PrefStore::new(temp_dir.path());

        assert!(store.add_favorite(FavoriteFile::new("/docs", "docs", true)).await.unwrap());
        assert!(!store.add_favorite(FavoriteFile::new("/docs", "docs", true)).await.unwrap());

        let favorites = store.favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(favorites[0].is_directory);
    }

    #[tokio::test]
    async fn test_remove_and_query() {
        let temp_dir = TempDir::new().unwrap();
        let store = PrefStore::new(temp_dir.path());

        store.add_favorite(FavoriteFile::new("/a.pdf", "a.pdf", false)).await.unwrap();
        store.add_favorite(FavoriteFile::new("/b.pdf", "b.pdf", false)).await.unwrap();
        assert!(store.is_favorite(Path::new("/a.pdf")).await.unwrap());

        store.remove_favorite(Path::new("/a.pdf")).await.unwrap();
        assert!(!store.is_favorite(Path::new("/a.pdf")).await.unwrap());
        assert!(store.is_favorite(Path::new("/b.pdf")).await.unwrap());
    }

    #[test]
    fn test_favorite_wire_format_uses_camel_case() {
        let fav = FavoriteFile::new("/x", "x", true);
        let json = serde_json::to_value(&fav).unwrap();
        assert!(json.get("isDirectory").is_some());
        assert!(json.get("addedAt").is_some());
    }
}
