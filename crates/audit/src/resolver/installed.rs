//! node_modules/ 설치 트리 해석
//!
//! `node_modules/` 바로 아래 디렉토리를 한 단계만 나열합니다. `@`로 시작하는 scope
//! 디렉토리는 한 단계 더 내려갑니다. 각 패키지 디렉토리의 `package.json`에서
//! `name`과 `version`을 읽으며, integrity는 없습니다.
//!
//! manifest가 없거나 읽을 수 없는 항목은 조용히 건너뜁니다 (`.bin` 등 포함).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use lockwarden_core::error::ResolutionError;
use lockwarden_core::types::{PackageRef, ResolutionMethod};

use super::{DependencySource, read_bounded};

/// 설치 디렉토리명
pub const NODE_MODULES_DIR: &str = "node_modules";

/// `node_modules/` 소스
pub struct InstalledTreeSource;

#[derive(Deserialize)]
struct InstalledManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl DependencySource for InstalledTreeSource {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::InstalledTree
    }

    fn is_present(&self, project_root: &Path) -> bool {
        project_root.join(NODE_MODULES_DIR).is_dir()
    }

    fn resolve(
        &self,
        project_root: &Path,
        max_file_size: u64,
    ) -> Result<Vec<PackageRef>, ResolutionError> {
        let node_modules = project_root.join(NODE_MODULES_DIR);
        let mut packages = Vec::new();

        for entry in sorted_subdirs(&node_modules)? {
            let is_scope = entry
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('@'));

            if is_scope {
                let scoped = match sorted_subdirs(&entry) {
                    Ok(dirs) => dirs,
                    Err(e) => {
                        debug!(path = %entry.display(), error = %e, "unreadable scope directory, skipping");
                        continue;
                    }
                };
                packages.extend(
                    scoped
                        .iter()
                        .filter_map(|dir| read_installed(dir, max_file_size)),
                );
            } else if let Some(package) = read_installed(&entry, max_file_size) {
                packages.push(package);
            }
        }

        Ok(packages)
    }
}

/// 디렉토리의 하위 디렉토리를 이름순으로 반환합니다.
fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, ResolutionError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ResolutionError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// 설치된 패키지 디렉토리 하나의 manifest를 읽습니다.
fn read_installed(dir: &Path, max_file_size: u64) -> Option<PackageRef> {
    let manifest_path = dir.join("package.json");
    if !manifest_path.is_file() {
        return None;
    }

    let content = match read_bounded(&manifest_path, max_file_size) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %manifest_path.display(), error = %e, "skipping installed package");
            return None;
        }
    };

    let manifest: InstalledManifest = match serde_json::from_str(&content) {
        Ok(manifest) => manifest,
        Err(e) => {
            debug!(path = %manifest_path.display(), error = %e, "skipping installed package");
            return None;
        }
    };

    let package = PackageRef::new(manifest.name?, manifest.version?, None);
    if package.is_none() {
        debug!(path = %manifest_path.display(), "installed manifest missing name or version");
    }
    package
}
