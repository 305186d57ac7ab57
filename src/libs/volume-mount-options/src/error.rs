// Copyright (c) 2026 The SMB volume services authors
//
// SPDX-License-Identifier: Apache-2.0
//

use thiserror::Error;

/// Validation failures raised while resolving user-supplied mount options
/// against a [`crate::MountOptsMask`].
///
/// Key lists are always sorted so that error messages are deterministic
/// regardless of the iteration order of the incoming option map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more option keys fall outside the allowed set.
    #[error("Not allowed options: {}", keys.join(", "))]
    NotAllowed { keys: Vec<String> },

    /// One or more mandatory options have no resolved value.
    #[error("Missing mandatory options: {}", keys.join(", "))]
    MissingMandatory { keys: Vec<String> },

    /// An allowed option carries a value rejected by a user validator.
    #[error("{value} is not a valid value for {key}")]
    InvalidOption { key: String, value: String },
}

impl Error {
    pub(crate) fn not_allowed(mut keys: Vec<String>) -> Self {
        keys.sort();
        keys.dedup();
        Error::NotAllowed { keys }
    }

    pub(crate) fn missing_mandatory(mut keys: Vec<String>) -> Self {
        keys.sort();
        keys.dedup();
        Error::MissingMandatory { keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allowed_message_is_sorted() {
        let err = Error::not_allowed(vec!["zeta".into(), "alpha".into(), "alpha".into()]);
        assert_eq!(err.to_string(), "Not allowed options: alpha, zeta");
    }

    #[test]
    fn test_missing_mandatory_message_is_sorted() {
        let err = Error::missing_mandatory(vec!["username".into(), "password".into()]);
        assert_eq!(
            err.to_string(),
            "Missing mandatory options: password, username"
        );
    }
}
