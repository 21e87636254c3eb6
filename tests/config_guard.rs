// SPDX-License-Identifier: MIT

use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if config or sample job files contain 64-hex private keys.
#[test]
fn no_committed_hex_keys_in_configs() {
    let re = Regex::new(r"0x?[a-fA-F0-9]{64}").unwrap();
    let mut candidates: Vec<String> = ["config.toml", "config.prod.toml", "config.dev.toml"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Ok(entries) = fs::read_dir("demos") {
        for entry in entries.flatten() {
            if entry.path().extension().is_some_and(|e| e == "json") {
                candidates.push(entry.path().to_string_lossy().into_owned());
            }
        }
    }

    for file in candidates {
        if !Path::new(&file).exists() {
            continue;
        }
        let body = fs::read_to_string(&file).expect("read candidate");
        for (idx, line) in body.lines().enumerate() {
            if re.is_match(line) {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}
