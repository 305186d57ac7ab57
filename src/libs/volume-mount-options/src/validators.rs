// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Stock per-key validators used by the SMB broker mask.

use crate::error::Error;

const VALID_SMB_VERSIONS: &[&str] = &["1.0", "2.0", "2.1", "3.0", "3.1.1"];

/// Reject `version` values outside the SMB protocol versions the kernel
/// client supports. Other keys pass through untouched.
pub fn validate_version(key: &str, value: &str) -> Result<(), Error> {
    if key != "version" {
        return Ok(());
    }

    if VALID_SMB_VERSIONS.contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// `mfsymlinks` is a bare flag; the only value a caller may spell out
/// for it is `"true"`.
pub fn validate_mfsymlinks(key: &str, value: &str) -> Result<(), Error> {
    if key != "mfsymlinks" {
        return Ok(());
    }

    if value == "true" {
        Ok(())
    } else {
        Err(Error::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0")]
    #[case("2.0")]
    #[case("2.1")]
    #[case("3.0")]
    #[case("3.1.1")]
    fn test_valid_versions(#[case] version: &str) {
        assert!(validate_version("version", version).is_ok());
    }

    #[rstest]
    #[case("0.5")]
    #[case("3.1")]
    #[case("smb3")]
    #[case("")]
    fn test_invalid_versions(#[case] version: &str) {
        let err = validate_version("version", version).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("{} is not a valid value for version", version)
        );
    }

    #[test]
    fn test_version_validator_ignores_other_keys() {
        assert!(validate_version("uid", "not-a-version").is_ok());
    }

    #[test]
    fn test_mfsymlinks_accepts_only_true() {
        assert!(validate_mfsymlinks("mfsymlinks", "true").is_ok());
        assert!(validate_mfsymlinks("mfsymlinks", "false").is_err());
        assert!(validate_mfsymlinks("mfsymlinks", "1").is_err());
        assert!(validate_mfsymlinks("vers", "false").is_ok());
    }
}
