// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::HashMap;

/// Parse a comma-separated `key<delim>value` list into a map.
///
/// Entries with an empty key are skipped, as are entries without the
/// delimiter; both are treated as a no-op rather than an error so that a
/// sloppy deployment property cannot take the process down. An entry with
/// an empty value is kept and marks a valueless flag.
pub fn parse_option_string_to_map(opts: &str, delim: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();

    if opts.is_empty() {
        return result;
    }

    for entry in opts.split(',') {
        let (key, value) = match entry.split_once(delim) {
            Some(kv) => kv,
            None => continue,
        };

        if key.is_empty() {
            continue;
        }

        result.insert(key.to_string(), value.to_string());
    }

    result
}

/// Split a comma-separated key list, dropping empty segments.
pub fn split_csv(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|k| !k.is_empty())
        .map(|k| k.to_string())
        .collect()
}
