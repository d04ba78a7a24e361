//! package-lock.json 해석
//!
//! 두 가지 형식을 지원합니다.
//!
//! ```json
//! {
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "my-app", "version": "1.0.0" },
//!     "node_modules/lodash": { "version": "4.17.21", "integrity": "sha512-..." }
//!   }
//! }
//! ```
//!
//! `packages`가 없으면 v1 형식의 `dependencies` (이름 -> `{version, integrity}`)를 사용합니다.
//! `packages`가 있으면 비어 있어도 `dependencies`보다 우선합니다.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use lockwarden_core::error::ResolutionError;
use lockwarden_core::types::{PackageRef, ResolutionMethod};

use super::{DependencySource, read_bounded};

/// lockfile 파일명
pub const LOCKFILE_NAME: &str = "package-lock.json";

const NODE_MODULES_PREFIX: &str = "node_modules/";

/// `package-lock.json` 소스
pub struct LockfileSource;

/// package-lock.json 구조 (파싱용)
#[derive(Deserialize)]
struct LockfileDocument {
    #[serde(default)]
    packages: Option<BTreeMap<String, LockEntry>>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, LockEntry>>,
}

/// lockfile 내 개별 항목 (파싱용)
#[derive(Deserialize)]
struct LockEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    integrity: Option<String>,
}

impl DependencySource for LockfileSource {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::Lockfile
    }

    fn is_present(&self, project_root: &Path) -> bool {
        project_root.join(LOCKFILE_NAME).is_file()
    }

    fn resolve(
        &self,
        project_root: &Path,
        max_file_size: u64,
    ) -> Result<Vec<PackageRef>, ResolutionError> {
        let path = project_root.join(LOCKFILE_NAME);
        let content = read_bounded(&path, max_file_size)?;
        parse_lockfile(&content, &path.display().to_string())
    }
}

/// lockfile 내용을 파싱하여 패키지 목록을 반환합니다.
///
/// # Arguments
///
/// - `content`: lockfile 내용 (UTF-8 문자열)
/// - `source_path`: 원본 파일 경로 (에러 메시지용)
pub fn parse_lockfile(content: &str, source_path: &str) -> Result<Vec<PackageRef>, ResolutionError> {
    let document: LockfileDocument =
        serde_json::from_str(content).map_err(|e| ResolutionError::Parse {
            path: source_path.to_owned(),
            reason: e.to_string(),
        })?;

    let packages = if let Some(entries) = document.packages {
        entries
            .into_iter()
            // 루트 패키지는 키가 빈 문자열
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, entry)| {
                let name = extract_package_name(&key);
                PackageRef::new(name, entry.version?, entry.integrity)
            })
            .collect()
    } else {
        document
            .dependencies
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, entry)| PackageRef::new(name, entry.version?, entry.integrity))
            .collect()
    };

    Ok(packages)
}

/// "node_modules/@scope/name" 또는 "a/node_modules/name" 에서 패키지명 추출
fn extract_package_name(key: &str) -> &str {
    match key.rfind(NODE_MODULES_PREFIX) {
        Some(pos) => &key[pos + NODE_MODULES_PREFIX.len()..],
        None => key,
    }
}
