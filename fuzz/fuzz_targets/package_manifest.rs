#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwarden_audit::resolver::parse_manifest;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(packages) = parse_manifest(content, "fuzz/package.json") {
            for package in &packages {
                let version = package.version();
                assert!(!version.starts_with('^') && !version.starts_with('~'));
                assert!(!version.contains(['/', ':', '*']));
            }
        }
    }
});
