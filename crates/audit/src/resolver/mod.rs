//! 의존성 해석 -- lockfile, 설치 트리, manifest
//!
//! [`Resolver`]는 프로젝트 디렉토리마다 정확히 하나의 [`DependencySource`]를 골라
//! 정규화된 [`PackageRef`] 목록을 만듭니다.
//!
//! # 우선순위
//!
//! 1. `package-lock.json` -- [`LockfileSource`]
//! 2. `node_modules/` -- [`InstalledTreeSource`]
//! 3. `package.json` -- [`ManifestSource`]
//!
//! 먼저 존재하는 소스 하나만 사용합니다. 해당 소스의 파싱이 실패해도 다음 소스로
//! 넘어가지 않고, 빈 패키지 목록과 함께 에러를 [`Resolution`]에 담아 반환합니다.

pub mod installed;
pub mod lockfile;
pub mod manifest;

use std::io::Read;
use std::path::Path;

use tracing::debug;

use lockwarden_core::error::ResolutionError;
use lockwarden_core::types::{PackageRef, ResolutionMethod};

pub use installed::InstalledTreeSource;
pub use lockfile::{LockfileSource, parse_lockfile};
pub use manifest::{ManifestSource, parse_manifest};

/// 의존성 소스 trait
///
/// 각 구현은 프로젝트 루트 아래의 특정 파일/디렉토리 하나를 담당합니다.
pub trait DependencySource: Send + Sync {
    /// 이 소스가 생성하는 해석 방법
    fn method(&self) -> ResolutionMethod;

    /// 프로젝트 루트에 이 소스가 존재하는지 확인합니다.
    fn is_present(&self, project_root: &Path) -> bool;

    /// 패키지 목록을 해석합니다.
    ///
    /// `max_file_size`보다 큰 파일은 [`ResolutionError::FileTooBig`]으로 거부합니다.
    fn resolve(
        &self,
        project_root: &Path,
        max_file_size: u64,
    ) -> Result<Vec<PackageRef>, ResolutionError>;
}

/// 해석 결과
#[derive(Debug, Default)]
pub struct Resolution {
    /// 해석된 패키지 목록 (에러 시 빈 목록)
    pub packages: Vec<PackageRef>,
    /// 사용된 소스 (소스가 없으면 `None`)
    pub method: Option<ResolutionMethod>,
    /// 사용된 소스의 해석 실패
    pub error: Option<ResolutionError>,
}

/// 우선순위 체인 기반 해석기
pub struct Resolver {
    sources: Vec<Box<dyn DependencySource>>,
    max_file_size: u64,
}

impl Resolver {
    /// 기본 우선순위(lockfile > 설치 트리 > manifest)로 해석기를 생성합니다.
    pub fn new(max_file_size: u64) -> Self {
        Self::with_sources(
            vec![
                Box::new(LockfileSource),
                Box::new(InstalledTreeSource),
                Box::new(ManifestSource),
            ],
            max_file_size,
        )
    }

    /// 지정한 소스 순서로 해석기를 생성합니다.
    pub fn with_sources(sources: Vec<Box<dyn DependencySource>>, max_file_size: u64) -> Self {
        Self {
            sources,
            max_file_size,
        }
    }

    /// 프로젝트 루트를 해석합니다 (동기 I/O).
    ///
    /// `tokio::task::spawn_blocking` 내에서 호출되어야 합니다.
    pub fn resolve(&self, project_root: &Path) -> Resolution {
        let Some(source) = self.sources.iter().find(|s| s.is_present(project_root)) else {
            debug!(path = %project_root.display(), "no dependency source found");
            return Resolution::default();
        };

        let method = source.method();
        match source.resolve(project_root, self.max_file_size) {
            Ok(packages) => {
                debug!(
                    path = %project_root.display(),
                    method = %method,
                    packages = packages.len(),
                    "dependencies resolved"
                );
                Resolution {
                    packages,
                    method: Some(method),
                    error: None,
                }
            }
            Err(e) => Resolution {
                packages: Vec::new(),
                method: Some(method),
                error: Some(e),
            },
        }
    }
}

/// 크기 제한을 적용하여 파일을 읽습니다.
pub(crate) fn read_bounded(path: &Path, max_file_size: u64) -> Result<String, ResolutionError> {
    let io_err = |source| ResolutionError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = std::fs::File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    if size > max_file_size {
        return Err(ResolutionError::FileTooBig {
            path: path.display().to_string(),
            size,
            max: max_file_size,
        });
    }

    // 메타데이터 확인 후 파일이 커졌을 경우를 대비해 읽기 자체도 제한합니다
    let mut content = String::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_string(&mut content)
        .map_err(io_err)?;
    let read = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if read > max_file_size {
        return Err(ResolutionError::FileTooBig {
            path: path.display().to_string(),
            size: read,
            max: max_file_size,
        });
    }

    Ok(content)
}
