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

//! Provider capability used by the solver, and the request builder shared by
//! its implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DnsError;

/// A domain registered in the provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned identifier, stringified
    pub id: String,
    /// Domain name without a trailing dot
    pub name: String,
}

/// One page of the account's domain listing.
#[derive(Debug, Clone, Default)]
pub struct ZonePage {
    pub zones: Vec<Zone>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_count: u64,
}

impl ZonePage {
    /// True once this page reaches the provider-reported total.
    pub fn is_last(&self) -> bool {
        self.page_number.saturating_mul(self.page_size) >= self.total_count
    }
}

/// A resource record within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub record_type: String,
    /// Name relative to the zone (the "RR")
    pub rr: String,
    pub value: String,
}

/// Narrow view of the DNS management API needed to solve DNS-01 challenges.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Fetches one page (1-based) of the account's domains.
    async fn list_zones(&self, page_number: u64) -> Result<ZonePage, DnsError>;

    /// Lists the records of `zone_name`. Only the first page is returned.
    async fn list_records(&self, zone_name: &str) -> Result<Vec<Record>, DnsError>;

    /// Creates a record and returns its id.
    async fn add_record(&self, request: &RecordOperationBuilder) -> Result<String, DnsError>;

    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError>;
}

/// Builder for record operation parameters.
///
/// Fields stay unset until a setter is called; each provider action decides
/// which of them it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOperationBuilder {
    pub domain_name: Option<String>,
    pub rr: Option<String>,
    pub record_type: Option<String>,
    pub value: Option<String>,
    pub ttl: Option<u32>,
    pub record_id: Option<String>,
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
}

impl RecordOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_name(mut self, domain_name: &str) -> Self {
        self.domain_name = Some(domain_name.to_string());
        self
    }

    pub fn rr(mut self, rr: &str) -> Self {
        self.rr = Some(rr.to_string());
        self
    }

    pub fn record_type(mut self, record_type: &str) -> Self {
        self.record_type = Some(record_type.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn record_id(mut self, record_id: &str) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }

    pub fn page_number(mut self, page_number: u64) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }
}
