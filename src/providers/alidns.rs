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

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use dns_sdk_macros::extract_params;
use hex::encode as hex_encode;
use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HOST, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::{DnsApi, Record, RecordOperationBuilder, Zone, ZonePage};
use crate::config::AliDnsConfig;
use crate::errors::DnsError;
use crate::utils::request::{DefaultDnsClient, DnsHttpClient};

type HmacSha256 = Hmac<Sha256>;

/// Largest page `DescribeDomains` serves.
const DOMAIN_PAGE_SIZE: u64 = 100;

/// Page size for `DescribeDomainRecords`. Only this one page is read.
const RECORD_PAGE_SIZE: u64 = 500;

/// Helper for signing AliDNS RPC requests (ACS3-HMAC-SHA256).
#[derive(Clone)]
pub(crate) struct Authorization {
    /// API endpoint host
    host: String,
    version: String,
    action: String,
    /// Request parameters, sorted by name
    query: BTreeMap<String, String>,
    /// ISO 8601 UTC timestamp
    date: String,
    nonce: String,
    algorithm: String,
}

impl Authorization {
    /// Creates a signing context for `host` stamped with the current time.
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            version: "2015-01-09".to_string(),
            action: String::new(),
            query: BTreeMap::new(),
            date: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            algorithm: "ACS3-HMAC-SHA256".to_string(),
        }
    }

    fn action(mut self, action: &str) -> Self {
        self.action = action.to_string();
        self
    }

    fn query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Signs a message using HMAC-SHA256.
    fn sign(key: &[u8], msg: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(msg.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn sha256_hex(input: &str) -> String {
        hex_encode(Sha256::digest(input.as_bytes()))
    }

    /// RFC 3986 encoding; only unreserved characters pass through.
    fn percent_encode(input: &str) -> String {
        urlencoding::encode(input).into_owned()
    }

    pub(crate) fn canonical_query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", Self::percent_encode(k), Self::percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Headers covered by the signature, lowercase and sorted.
    fn signed_header_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("host", self.host.clone()),
            ("x-acs-action", self.action.clone()),
            ("x-acs-content-sha256", Self::sha256_hex("")),
            ("x-acs-date", self.date.clone()),
            ("x-acs-signature-nonce", self.nonce.clone()),
            ("x-acs-version", self.version.clone()),
        ]
    }

    fn signed_headers(&self) -> String {
        self.signed_header_pairs()
            .iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>()
            .join(";")
    }

    fn generate_canonical_request(&self) -> String {
        let http_method = "POST";
        let canonical_uri = "/";
        let canonical_query_string = self.canonical_query_string();
        let canonical_headers: String = self
            .signed_header_pairs()
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = self.signed_headers();
        let hashed_payload = Self::sha256_hex("");
        format!(
            "{http_method}\n{canonical_uri}\n{canonical_query_string}\n{canonical_headers}\n{signed_headers}\n{hashed_payload}"
        )
    }

    fn generate_string_to_sign(&self, canonical_request: &str) -> String {
        format!("{}\n{}", self.algorithm, Self::sha256_hex(canonical_request))
    }

    fn calculate_signature(&self, secret_key: &str) -> String {
        let canonical_request = self.generate_canonical_request();
        let string_to_sign = self.generate_string_to_sign(&canonical_request);
        hex_encode(Self::sign(secret_key.as_bytes(), &string_to_sign))
    }

    fn generate_authorization_header(&self, access_key_id: &str, secret_key: &str) -> String {
        format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            self.algorithm,
            access_key_id,
            self.signed_headers(),
            self.calculate_signature(secret_key)
        )
    }

    /// Builds signed HTTP request headers.
    pub(crate) fn build_request_headers(
        &self,
        access_key_id: &str,
        secret_key: &str,
    ) -> Result<HeaderMap, DnsError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            DnsError::InvalidParameters(format!("invalid header value: {}", e))
        };

        let mut headers = HeaderMap::new();
        let authorization = self.generate_authorization_header(access_key_id, secret_key);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization).map_err(invalid)?);
        for (name, value) in self.signed_header_pairs() {
            let name = if name == "host" {
                HOST
            } else {
                HeaderName::from_static(name)
            };
            headers.insert(name, HeaderValue::from_str(&value).map_err(invalid)?);
        }
        Ok(headers)
    }
}

/// AliDNS client speaking the `2015-01-09` RPC API.
pub struct AliDnsClient<T: DnsHttpClient = DefaultDnsClient> {
    /// HTTP client for making requests
    http_client: T,
    /// API endpoint, without a trailing slash
    api: String,
    host: String,
    access_key_id: String,
    access_key_secret: String,
    /// TTL for records created without one
    ttl: u32,
}

impl AliDnsClient<DefaultDnsClient> {
    /// Creates a client for `region_id` with an access key pair.
    ///
    /// Nothing is sent to the provider until the first call.
    pub fn new(region_id: &str, access_key_id: &str, access_key_secret: &str) -> Result<Self, DnsError> {
        Self::from_config(&AliDnsConfig::new(region_id, access_key_id, access_key_secret))
    }

    pub fn from_config(config: &AliDnsConfig) -> Result<Self, DnsError> {
        config.validate()?;
        let http_client = DefaultDnsClient::with_timeout(config.timeout)?;
        Ok(Self::with_http_client(config, http_client))
    }
}

impl<T: DnsHttpClient> AliDnsClient<T> {
    /// Creates a client sending requests through `http_client`.
    pub fn with_http_client(config: &AliDnsConfig, http_client: T) -> Self {
        let api = config.endpoint();
        let host = api
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(api.as_str())
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            http_client,
            api,
            host,
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
            ttl: config.ttl,
        }
    }

    /// Signs and sends one RPC action.
    async fn call(&self, action: &str, query: BTreeMap<String, String>) -> Result<Value, DnsError> {
        let auth = Authorization::new(&self.host).action(action).query(query);
        let headers = auth.build_request_headers(&self.access_key_id, &self.access_key_secret)?;
        let url = format!("{}/?{}", self.api, auth.canonical_query_string());

        debug!(action, "calling AliDNS API");

        self.http_client
            .request(Method::POST, url, headers, None)
            .await
    }
}

/// Flattens serialized request parameters into query pairs.
fn to_query<P: Serialize>(params: &P) -> Result<BTreeMap<String, String>, DnsError> {
    let value = serde_json::to_value(params)?;
    let Value::Object(map) = value else {
        return Err(DnsError::InvalidParameters(
            "request parameters must serialize to an object".into(),
        ));
    };
    Ok(map
        .into_iter()
        .map(|(k, v)| (k, value_to_string(Some(v))))
        .collect())
}

/// Renders an id-like JSON value; AliDNS ids arrive as strings or numbers.
fn value_to_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[derive(Deserialize)]
struct DescribeDomainsResponse {
    #[serde(rename = "TotalCount", default)]
    total_count: u64,
    #[serde(rename = "PageNumber", default)]
    page_number: u64,
    #[serde(rename = "PageSize", default)]
    page_size: u64,
    #[serde(rename = "Domains", default)]
    domains: Domains,
}

#[derive(Deserialize, Default)]
struct Domains {
    #[serde(rename = "Domain", default)]
    domain: Vec<Domain>,
}

#[derive(Deserialize)]
struct Domain {
    #[serde(rename = "DomainId", default)]
    domain_id: Option<Value>,
    #[serde(rename = "DomainName", default)]
    domain_name: String,
}

#[derive(Deserialize)]
struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords", default)]
    domain_records: DomainRecords,
}

#[derive(Deserialize, Default)]
struct DomainRecords {
    #[serde(rename = "Record", default)]
    record: Vec<DomainRecord>,
}

#[derive(Deserialize)]
struct DomainRecord {
    #[serde(rename = "RecordId", default)]
    record_id: Option<Value>,
    #[serde(rename = "RR", default)]
    rr: String,
    #[serde(rename = "Type", default)]
    record_type: String,
    #[serde(rename = "Value", default)]
    value: String,
}

#[derive(Deserialize)]
struct RecordIdResponse {
    #[serde(rename = "RecordId", default)]
    record_id: Option<Value>,
}

#[async_trait]
impl<T: DnsHttpClient> DnsApi for AliDnsClient<T> {
    /// Retrieves one page of the account's domains.
    async fn list_zones(&self, page_number: u64) -> Result<ZonePage, DnsError> {
        let builder = RecordOperationBuilder::new().page_number(page_number);
        let params = extract_params!(builder, DescribeDomains, {
            optional page_number: u64 = 1 => "PageNumber",
            optional page_size: u64 = DOMAIN_PAGE_SIZE => "PageSize"
        });

        let resp = self.call("DescribeDomains", to_query(&params)?).await?;
        let parsed: DescribeDomainsResponse = serde_json::from_value(resp)?;

        Ok(ZonePage {
            zones: parsed
                .domains
                .domain
                .into_iter()
                .map(|d| Zone {
                    id: value_to_string(d.domain_id),
                    name: d.domain_name,
                })
                .collect(),
            page_number: parsed.page_number,
            page_size: parsed.page_size,
            total_count: parsed.total_count,
        })
    }

    /// Retrieves the first page of records for a domain.
    async fn list_records(&self, zone_name: &str) -> Result<Vec<Record>, DnsError> {
        let builder = RecordOperationBuilder::new().domain_name(zone_name);
        let params = extract_params!(builder, DescribeDomainRecords, {
            required domain_name: String => "DomainName"
            optional page_size: u64 = RECORD_PAGE_SIZE => "PageSize"
        });

        let resp = self.call("DescribeDomainRecords", to_query(&params)?).await?;
        let parsed: DescribeDomainRecordsResponse = serde_json::from_value(resp)?;

        Ok(parsed
            .domain_records
            .record
            .into_iter()
            .map(|r| Record {
                id: value_to_string(r.record_id),
                record_type: r.record_type,
                rr: r.rr,
                value: r.value,
            })
            .collect())
    }

    /// Creates a new DNS record.
    async fn add_record(&self, request: &RecordOperationBuilder) -> Result<String, DnsError> {
        let params = extract_params!(request, AddDomainRecord, {
            required domain_name: String => "DomainName",
            required rr: String => "RR",
            required record_type: String => "Type",
            required value: String => "Value"
            optional ttl: u32 = self.ttl => "TTL"
        });

        let resp = self.call("AddDomainRecord", to_query(&params)?).await?;
        let parsed: RecordIdResponse = serde_json::from_value(resp)?;

        Ok(value_to_string(parsed.record_id))
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError> {
        let builder = RecordOperationBuilder::new().record_id(record_id);
        let params = extract_params!(builder, DeleteDomainRecord, {
            required record_id: String => "RecordId"
        });

        self.call("DeleteDomainRecord", to_query(&params)?).await?;
        Ok(())
    }
}
