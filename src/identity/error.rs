// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider errors.

use thiserror::Error;

/// Failure to turn a credential into a principal.
///
/// `Rejected` means the provider answered and said no (expired, revoked,
/// bad signature). Everything else means we could not get an answer.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("credential rejected: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
    #[error("identity provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed identity response: {0}")]
    Decode(String),
    #[error("no usable verification key: {0}")]
    Key(String),
}

impl IdentityError {
    /// Short machine-readable code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            IdentityError::Rejected(_) => "credential_rejected",
            IdentityError::Unreachable(_) => "provider_unreachable",
            IdentityError::Status(_) => "provider_status",
            IdentityError::Decode(_) => "malformed_response",
            IdentityError::Key(_) => "no_matching_key",
        }
    }

    /// Whether a refresh token is worth trying after this error.
    pub fn is_rejection(&self) -> bool {
        matches!(self, IdentityError::Rejected(_))
    }
}

impl From<jsonwebtoken::errors::Error> for IdentityError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let reason = match e.kind() {
            ErrorKind::ExpiredSignature => "token expired",
            ErrorKind::InvalidSignature => "invalid signature",
            ErrorKind::InvalidIssuer => "invalid issuer",
            ErrorKind::InvalidAudience => "invalid audience",
            ErrorKind::ImmatureSignature => "token not yet valid",
            _ => "malformed token",
        };
        IdentityError::Rejected(reason.to_string())
    }
}
