//! package.json manifest 해석
//!
//! `dependencies`와 `devDependencies`를 합칩니다. 같은 이름이 두 곳에 있으면
//! `dependencies` 쪽 범위를 사용합니다. 범위 문자열에서 `^`와 `~`를 모두 제거한 뒤,
//! 비어 있거나 `/`, `:`, `*`를 포함하는 값(git URL, 태그, 와일드카드 등)은 건너뜁니다.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use lockwarden_core::error::ResolutionError;
use lockwarden_core::types::{PackageRef, ResolutionMethod};

use super::{DependencySource, read_bounded};

/// manifest 파일명
pub const MANIFEST_NAME: &str = "package.json";

/// `package.json` 소스
pub struct ManifestSource;

#[derive(Deserialize)]
struct ManifestDocument {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, Value>>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Option<BTreeMap<String, Value>>,
}

impl DependencySource for ManifestSource {
    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::Manifest
    }

    fn is_present(&self, project_root: &Path) -> bool {
        project_root.join(MANIFEST_NAME).is_file()
    }

    fn resolve(
        &self,
        project_root: &Path,
        max_file_size: u64,
    ) -> Result<Vec<PackageRef>, ResolutionError> {
        let path = project_root.join(MANIFEST_NAME);
        let content = read_bounded(&path, max_file_size)?;
        parse_manifest(&content, &path.display().to_string())
    }
}

/// manifest 내용을 파싱하여 이름순 패키지 목록을 반환합니다.
pub fn parse_manifest(content: &str, source_path: &str) -> Result<Vec<PackageRef>, ResolutionError> {
    let document: ManifestDocument =
        serde_json::from_str(content).map_err(|e| ResolutionError::Parse {
            path: source_path.to_owned(),
            reason: e.to_string(),
        })?;

    // devDependencies를 먼저 넣고 dependencies로 덮어씁니다
    let mut merged: BTreeMap<String, Value> = document.dev_dependencies.unwrap_or_default();
    merged.extend(document.dependencies.unwrap_or_default());

    Ok(merged
        .into_iter()
        .filter_map(|(name, range)| {
            let version = clean_range(range.as_str()?)?;
            PackageRef::new(name, version, None)
        })
        .collect())
}

/// 범위 문자열을 구체적인 버전 토큰으로 정리합니다.
fn clean_range(range: &str) -> Option<String> {
    let cleaned: String = range.chars().filter(|c| *c != '^' && *c != '~').collect();
    if cleaned.is_empty() || cleaned.contains(['/', ':', '*']) {
        return None;
    }
    Some(cleaned)
}
