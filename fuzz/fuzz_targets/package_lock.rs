#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwarden_audit::resolver::parse_lockfile;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(packages) = parse_lockfile(content, "fuzz/package-lock.json") {
            // 해석된 레코드는 항상 이름과 버전을 가짐
            for package in &packages {
                assert!(!package.name().is_empty());
                assert!(!package.version().is_empty());
            }
        }
    }
});
