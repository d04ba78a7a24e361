//! 프로젝트 탐색
//!
//! [`discover_projects`]는 스캔 루트 아래에서 `package.json`을 직접 포함하는 모든
//! 디렉토리를 찾는 지연 반복자를 반환합니다.
//!
//! - `node_modules/` 내부도 탐색합니다. 중첩된 manifest는 별도의 프로젝트 루트입니다.
//! - 심볼릭 링크 디렉토리를 따라가되, 정규 경로를 기록하여 같은 디렉토리에 두 번 들어가지 않습니다.
//! - 디렉토리 항목은 이름순으로 방문하므로 결과 순서가 결정적입니다.
//!
//! 동기 I/O를 수행하므로 async 컨텍스트에서는 `spawn_blocking` 안에서 사용해야 합니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

/// 프로젝트 루트를 나타내는 manifest 파일명
pub const MANIFEST_FILE: &str = "package.json";

/// `root` 아래의 프로젝트 루트를 탐색하는 반복자를 생성합니다.
///
/// `root` 자신은 깊이 0이며, `max_depth`보다 깊은 디렉토리는 방문하지 않습니다.
/// 다시 호출하면 처음부터 다시 탐색합니다.
pub fn discover_projects(root: impl AsRef<Path>, max_depth: usize) -> ProjectWalker {
    ProjectWalker {
        stack: vec![(root.as_ref().to_path_buf(), 0)],
        visited: HashSet::new(),
        max_depth,
    }
}

/// 깊이 우선, 이름순 프로젝트 탐색 반복자
#[derive(Debug)]
pub struct ProjectWalker {
    stack: Vec<(PathBuf, usize)>,
    visited: HashSet<PathBuf>,
    max_depth: usize,
}

impl ProjectWalker {
    fn push_children(&mut self, dir: &Path, depth: usize) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "unreadable directory, skipping");
                return;
            }
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    debug!(path = %dir.display(), error = %e, "failed to read directory entry");
                    None
                }
            })
            // is_dir()은 심볼릭 링크를 따라갑니다
            .filter(|path| path.is_dir())
            .collect();

        children.sort();

        // 스택이므로 역순으로 넣어야 이름순으로 꺼냅니다
        for child in children.into_iter().rev() {
            self.stack.push((child, depth + 1));
        }
    }
}

impl Iterator for ProjectWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((dir, depth)) = self.stack.pop() {
            let canonical = match std::fs::canonicalize(&dir) {
                Ok(path) => path,
                Err(e) => {
                    debug!(path = %dir.display(), error = %e, "failed to resolve directory, skipping");
                    continue;
                }
            };

            if !self.visited.insert(canonical) {
                debug!(path = %dir.display(), "directory already visited, skipping");
                continue;
            }

            if depth < self.max_depth {
                self.push_children(&dir, depth);
            }

            if dir.join(MANIFEST_FILE).is_file() {
                return Some(dir);
            }
        }

        None
    }
}
