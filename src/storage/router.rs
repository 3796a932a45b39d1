use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};

use crate::config::expand_home;
use crate::errors::AppResult;
use crate::models::ServiceType;
use crate::storage::assets;

const DEFAULT_SERVICE_ROOT: &str = "/code/data";

/// Physical storage root for each service type
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRoots {
    pub tts: PathBuf,
    pub face2face: PathBuf,
    pub default: PathBuf,
}

impl ServiceRoots {
    pub fn from_data_root(data_root: &Path) -> Self {
        Self {
            tts: data_root.join("voice").join("data"),
            face2face: data_root.join("face2face"),
            default: expand_home(DEFAULT_SERVICE_ROOT),
        }
    }
}

/// Maps a logical service name to a physical storage root
#[derive(Debug, Clone)]
pub struct PathRouter {
    roots: ServiceRoots,
}

impl PathRouter {
    pub fn new(roots: ServiceRoots) -> Self {
        Self { roots }
    }

    pub fn base_path(&self, service: ServiceType) -> &Path {
        match service {
            ServiceType::Tts => &self.roots.tts,
            ServiceType::Face2Face => &self.roots.face2face,
            ServiceType::Default => &self.roots.default,
        }
    }

    /// Join `relative_target` onto the service root.
    ///
    /// Root and prefix components of the target are dropped so an absolute
    /// target still lands under the service root. `..` is normalized, not
    /// rejected.
    pub fn resolve(&self, service: ServiceType, relative_target: &str) -> PathBuf {
        let mut resolved = self.base_path(service).to_path_buf();
        for component in Path::new(relative_target).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir => resolved.push(".."),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            }
        }
        resolved.clean()
    }

    /// Resolve a target directory and make sure it exists
    pub async fn resolve_dir(&self, service: ServiceType, relative_target: &str) -> AppResult<PathBuf> {
        let dir = self.resolve(service, relative_target);
        self.ensure_dir(&dir).await?;
        Ok(dir)
    }

    pub async fn ensure_dir(&self, path: &Path) -> AppResult<()> {
        assets::ensure_dir(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> PathRouter {
        PathRouter::new(ServiceRoots {
            tts: PathBuf::from("/srv/voice/data"),
            face2face: PathBuf::from("/srv/face2face"),
            default: PathBuf::from("/code/data"),
        })
    }

    #[test]
    fn test_resolve_known_services() {
        let router = router();
        assert_eq!(
            router.resolve(ServiceType::Tts, "origin_audio"),
            PathBuf::from("/srv/voice/data/origin_audio")
        );
        assert_eq!(
            router.resolve(ServiceType::Face2Face, "models/2025"),
            PathBuf::from("/srv/face2face/models/2025")
        );
    }

    #[test]
    fn test_unknown_service_resolves_to_default() {
        let router = router();
        for raw in ["", "video", "TTS", "face-2-face"] {
            assert_eq!(
                router.resolve(ServiceType::parse(raw), "products"),
                PathBuf::from("/code/data/products")
            );
        }
    }

    #[test]
    fn test_absolute_target_stays_under_root() {
        let router = router();
        assert_eq!(
            router.resolve(ServiceType::Tts, "/origin_audio/./x"),
            PathBuf::from("/srv/voice/data/origin_audio/x")
        );
        assert_eq!(router.resolve(ServiceType::Tts, ""), PathBuf::from("/srv/voice/data"));
    }

    #[tokio::test]
    async fn test_resolve_dir_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let router = PathRouter::new(ServiceRoots {
            tts: temp_dir.path().join("tts"),
            face2face: temp_dir.path().join("f2f"),
            default: temp_dir.path().join("default"),
        });

        let first = router.resolve_dir(ServiceType::Tts, "a/b/c").await.unwrap();
        let second = router.resolve_dir(ServiceType::Tts, "a/b/c").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }
}
