//! ACME DNS-01 challenge solver for Alibaba Cloud DNS (AliDNS)
//!
//! Supported features:
//! - Locating the account zone that hosts a challenge name
//! - Creating the challenge TXT record (`present`)
//! - Removing the TXT records holding a given token (`clean_up`)
//! - ACS3-HMAC-SHA256 signed requests against the AliDNS RPC API
//!
//! Waiting for propagation and retrying belong to the ACME client driving
//! the solver.
//!
//! # Example
//! ```ignore
//! use alidns_acme::AliDnsSolver;
//!
//! let solver = AliDnsSolver::new("cn-hangzhou", "your_access_key_id", "your_access_key_secret")?;
//!
//! solver.present("example.com.", "_acme-challenge.example.com.", "token").await?;
//! // ... the CA validates the challenge ...
//! solver.clean_up("example.com.", "_acme-challenge.example.com.", "token").await?;
//! ```

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

pub mod client;
pub mod config;
pub mod errors;
pub(crate) mod providers;
pub mod solver;
pub mod utils;

pub use client::{DnsApi, Record, RecordOperationBuilder, Zone, ZonePage};
pub use config::{AliDnsBuilder, AliDnsConfig};
pub use errors::{DnsError, ErrorKind};
pub use providers::AliDnsClient;
pub use solver::AliDnsSolver;
