//! 타이포스쿼팅 평가기
//!
//! 널리 쓰이는 패키지 이름(seed)과의 Levenshtein 거리가 1 또는 2인 이름을 보고합니다.
//! 네트워크를 사용하지 않습니다.

use std::collections::BTreeSet;

use lockwarden_core::types::{Finding, FindingCategory, PackageRef};

/// 보고 대상 최대 편집 거리
pub const MAX_DISTANCE: usize = 2;

/// 기본 seed 목록
const BUILTIN_SEEDS: [&str; 50] = [
    "react",
    "react-dom",
    "lodash",
    "express",
    "chalk",
    "commander",
    "debug",
    "tslib",
    "requests",
    "moment",
    "axios",
    "prop-types",
    "uuid",
    "classnames",
    "bluebird",
    "yargs",
    "async",
    "fs-extra",
    "mkdirp",
    "webpack",
    "body-parser",
    "glob",
    "inquirer",
    "jquery",
    "underscore",
    "dotenv",
    "colors",
    "minimist",
    "rxjs",
    "zone.js",
    "core-js",
    "babel-core",
    "babel-loader",
    "babel-runtime",
    "vue",
    "next",
    "eslint",
    "jest",
    "mocha",
    "aws-sdk",
    "socket.io",
    "mongoose",
    "redis",
    "superagent",
    "morgan",
    "winston",
    "pm2",
    "nodemon",
    "rimraf",
    "semver",
];

/// 비교 기준 패키지 이름 목록 (불변)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedList {
    seeds: BTreeSet<String>,
}

impl SeedList {
    /// 기본 50개 이름으로 목록을 생성합니다.
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_SEEDS)
    }

    /// 지정한 이름으로 목록을 생성합니다. 빈 이름은 무시합니다.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seeds: names
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty())
                .collect(),
        }
    }

    /// 기본 목록에 이름을 추가한 새 목록을 반환합니다.
    pub fn with_extra<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seeds.extend(
            names
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.trim().is_empty()),
        );
        self
    }

    /// 이름이 목록에 있는지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.seeds.contains(name)
    }

    /// seed 개수
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.seeds.iter().map(String::as_str)
    }
}

impl Default for SeedList {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 편집 거리 기반 타이포스쿼팅 평가기
#[derive(Debug, Clone)]
pub struct TyposquatEvaluator {
    seeds: SeedList,
}

impl TyposquatEvaluator {
    /// 평가기를 생성합니다.
    ///
    /// 비교할 seed가 없으면 `None`을 반환하며, orchestrator는 이를 "발견 사항 없음"으로 취급합니다.
    pub fn try_new(seeds: SeedList) -> Option<Self> {
        if seeds.is_empty() {
            return None;
        }
        Some(Self { seeds })
    }

    /// 사용 중인 seed 목록
    pub fn seeds(&self) -> &SeedList {
        &self.seeds
    }

    /// seed 목록에 없는 각 이름을 모든 seed와 비교합니다.
    ///
    /// 거리 1..=2인 seed마다 발견 사항 하나를 만듭니다.
    pub fn evaluate(&self, refs: &[PackageRef]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for package in refs {
            let name = package.name();
            if self.seeds.contains(name) {
                continue;
            }

            for seed in self.seeds.iter() {
                let distance = levenshtein::levenshtein(name, seed);
                if (1..=MAX_DISTANCE).contains(&distance) {
                    findings.push(Finding::new(
                        FindingCategory::Typosquat,
                        package.subject(),
                        format!("Package '{name}' is very similar to '{seed}' (Distance: {distance})"),
                    ));
                }
            }
        }

        findings
    }
}
