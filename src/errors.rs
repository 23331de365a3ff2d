// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error types for the AliDNS solver

use thiserror::Error;

/// Coarse classification of a [`DnsError`], for callers that need to branch
/// on the failure rather than print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials, region or other settings are unusable.
    Config,
    /// No zone in the account matches the requested domain.
    ZoneNotFound,
    /// A remote call failed and no more specific kind applies.
    ProviderCommunication,
    /// Adding the TXT record failed.
    RecordCreate,
    /// Deleting a TXT record failed.
    RecordDelete,
    /// Listing the zone's records failed.
    RecordLookup,
}

/// AliDNS solver errors
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("alidns: invalid configuration: {0}")]
    Config(String),

    #[error("alidns: zone {0} not found in AliDNS")]
    ZoneNotFound(String),

    #[error("alidns: error getting hosted zones: {0}")]
    ZoneLookup(#[source] Box<DnsError>),

    #[error("alidns: error adding domain record: {0}")]
    RecordCreate(#[source] Box<DnsError>),

    #[error("alidns: error finding txt records: {0}")]
    RecordLookup(#[source] Box<DnsError>),

    #[error("alidns: error deleting domain record: {0}")]
    RecordDelete(#[source] Box<DnsError>),

    #[error("API error {code} (request {request_id}): {message}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("Invalid request parameters: {0}")]
    InvalidParameters(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl DnsError {
    /// Returns the kind of failure this error represents.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DnsError::Config(_) | DnsError::InvalidParameters(_) => ErrorKind::Config,
            DnsError::ZoneNotFound(_) => ErrorKind::ZoneNotFound,
            DnsError::RecordCreate(_) => ErrorKind::RecordCreate,
            DnsError::RecordLookup(_) => ErrorKind::RecordLookup,
            DnsError::RecordDelete(_) => ErrorKind::RecordDelete,
            DnsError::ZoneLookup(_)
            | DnsError::Api { .. }
            | DnsError::UnexpectedResponse(_)
            | DnsError::Serialization(_)
            | DnsError::Request(_) => ErrorKind::ProviderCommunication,
        }
    }

    pub(crate) fn zone_lookup(err: DnsError) -> Self {
        match err {
            DnsError::ZoneNotFound(_) => err,
            other => DnsError::ZoneLookup(Box::new(other)),
        }
    }

    pub(crate) fn record_lookup(err: DnsError) -> Self {
        match err {
            DnsError::ZoneNotFound(_) => err,
            other => DnsError::RecordLookup(Box::new(other)),
        }
    }
}

// Raised by `extract_params!` when a required builder field is unset.
impl From<String> for DnsError {
    fn from(message: String) -> Self {
        DnsError::InvalidParameters(message)
    }
}
