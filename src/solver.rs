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

//! DNS-01 challenge solver on top of a [`DnsApi`].

use tracing::{debug, info, warn};

use crate::client::{DnsApi, Record, RecordOperationBuilder, Zone};
use crate::config::AliDnsConfig;
use crate::errors::DnsError;
use crate::providers::AliDnsClient;
use crate::utils::domain::{extract_record_name, un_fqdn};

/// Presents and cleans up DNS-01 challenge TXT records.
///
/// Holds nothing but the API handle; every call re-reads the account's zones
/// and records from the provider.
pub struct AliDnsSolver<A: DnsApi = AliDnsClient> {
    api: A,
}

impl AliDnsSolver<AliDnsClient> {
    /// Creates a solver for `region_id` with an access key pair.
    pub fn new(region_id: &str, access_key_id: &str, access_key_secret: &str) -> Result<Self, DnsError> {
        Ok(Self::with_api(AliDnsClient::new(
            region_id,
            access_key_id,
            access_key_secret,
        )?))
    }

    pub fn from_config(config: &AliDnsConfig) -> Result<Self, DnsError> {
        Ok(Self::with_api(AliDnsClient::from_config(config)?))
    }
}

impl<A: DnsApi> AliDnsSolver<A> {
    pub fn with_api(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Creates the TXT record `key` for `resolved_fqdn` in `resolved_zone`.
    pub async fn present(&self, resolved_zone: &str, resolved_fqdn: &str, key: &str) -> Result<(), DnsError> {
        let zone = self
            .resolve_zone(resolved_zone)
            .await
            .map_err(DnsError::zone_lookup)?;

        let rr = extract_record_name(resolved_fqdn, &zone.name);
        let request = RecordOperationBuilder::new()
            .domain_name(&zone.name)
            .rr(&rr)
            .record_type("TXT")
            .value(key);

        let record_id = self
            .api
            .add_record(&request)
            .await
            .map_err(|e| DnsError::RecordCreate(Box::new(e)))?;

        info!(zone = %zone.name, rr = %rr, record_id = %record_id, "created TXT record");
        Ok(())
    }

    /// Deletes every record for `resolved_fqdn` whose value is `del_key`.
    ///
    /// Deletion stops at the first failure; records deleted before it stay
    /// deleted. Finding nothing to delete is not an error.
    pub async fn clean_up(&self, resolved_zone: &str, resolved_fqdn: &str, del_key: &str) -> Result<(), DnsError> {
        let records = self
            .find_txt_records(resolved_zone, resolved_fqdn)
            .await
            .map_err(DnsError::record_lookup)?;

        // The zone may have been removed since the lookup above.
        self.resolve_zone(resolved_zone)
            .await
            .map_err(DnsError::zone_lookup)?;

        for record in records.iter().filter(|r| r.value == del_key) {
            if let Err(e) = self.api.delete_record(&record.id).await {
                warn!(record_id = %record.id, error = %e, "failed to delete TXT record");
                return Err(DnsError::RecordDelete(Box::new(e)));
            }
            info!(rr = %record.rr, record_id = %record.id, "deleted TXT record");
        }
        Ok(())
    }

    /// Finds the account zone named `resolved_zone`.
    ///
    /// Walks every page of the domain listing; when several entries carry the
    /// name, the last one wins.
    pub async fn resolve_zone(&self, resolved_zone: &str) -> Result<Zone, DnsError> {
        let mut zones = Vec::new();
        let mut page_number = 1;

        loop {
            let page = self.api.list_zones(page_number).await?;
            debug!(
                page_number,
                total_count = page.total_count,
                "fetched domain page"
            );
            let is_last = page.is_last();
            zones.extend(page.zones);
            if is_last {
                break;
            }
            page_number += 1;
        }

        let wanted = un_fqdn(resolved_zone);
        let mut hosted_zone = None;
        for zone in zones {
            if zone.name == wanted {
                hosted_zone = Some(zone);
            }
        }

        hosted_zone.ok_or_else(|| DnsError::ZoneNotFound(resolved_zone.to_string()))
    }

    /// Lists the zone's records whose relative name matches `resolved_fqdn`.
    async fn find_txt_records(&self, resolved_zone: &str, resolved_fqdn: &str) -> Result<Vec<Record>, DnsError> {
        let zone = self.resolve_zone(resolved_zone).await?;
        let records = self.api.list_records(&zone.name).await?;

        let rr = extract_record_name(resolved_fqdn, &zone.name);
        Ok(records.into_iter().filter(|r| r.rr == rr).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ZonePage;
    use crate::errors::ErrorKind;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ListZones(u64),
        ListRecords(String),
        AddRecord(RecordOperationBuilder),
        DeleteRecord(String),
    }

    /// In-memory provider recording every call made against it.
    #[derive(Default)]
    struct FakeDns {
        zones: Vec<Zone>,
        page_size: u64,
        /// Reported total; defaults to the number of zones
        total_count: Option<u64>,
        records: Vec<Record>,
        fail_list_zones: bool,
        fail_list_records: bool,
        fail_add: bool,
        fail_delete_ids: HashSet<String>,
        /// Zones disappear after this many `list_zones` calls
        zones_vanish_after: Option<usize>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeDns {
        fn with_zones(names: &[&str]) -> Self {
            Self {
                zones: names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| zone(&format!("id-{}", i), name))
                    .collect(),
                page_size: 20,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| pred(*c)).count()
        }

        fn failure() -> DnsError {
            DnsError::Api {
                code: "InternalError".to_string(),
                message: "The request processing has failed due to some unknown error.".to_string(),
                request_id: "req-fake".to_string(),
            }
        }
    }

    #[async_trait]
    impl DnsApi for FakeDns {
        async fn list_zones(&self, page_number: u64) -> Result<ZonePage, DnsError> {
            self.record(Call::ListZones(page_number));
            if self.fail_list_zones {
                return Err(Self::failure());
            }
            let calls = self.count(|c| matches!(c, Call::ListZones(_)));
            let zones: &[Zone] = match self.zones_vanish_after {
                Some(limit) if calls > limit => &[],
                _ => &self.zones,
            };

            let start = ((page_number - 1) * self.page_size) as usize;
            let end = (start + self.page_size as usize).min(zones.len());
            Ok(ZonePage {
                zones: zones.get(start..end).unwrap_or_default().to_vec(),
                page_number,
                page_size: self.page_size,
                total_count: self.total_count.unwrap_or(zones.len() as u64),
            })
        }

        async fn list_records(&self, zone_name: &str) -> Result<Vec<Record>, DnsError> {
            self.record(Call::ListRecords(zone_name.to_string()));
            if self.fail_list_records {
                return Err(Self::failure());
            }
            Ok(self.records.clone())
        }

        async fn add_record(&self, request: &RecordOperationBuilder) -> Result<String, DnsError> {
            self.record(Call::AddRecord(request.clone()));
            if self.fail_add {
                return Err(Self::failure());
            }
            Ok("new-record".to_string())
        }

        async fn delete_record(&self, record_id: &str) -> Result<(), DnsError> {
            self.record(Call::DeleteRecord(record_id.to_string()));
            if self.fail_delete_ids.contains(record_id) {
                return Err(Self::failure());
            }
            Ok(())
        }
    }

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn txt(id: &str, rr: &str, value: &str) -> Record {
        Record {
            id: id.to_string(),
            record_type: "TXT".to_string(),
            rr: rr.to_string(),
            value: value.to_string(),
        }
    }

    fn deletes(fake: &FakeDns) -> Vec<String> {
        fake.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteRecord(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    // ==================== resolve_zone ====================

    #[tokio::test]
    async fn test_resolve_zone_strips_trailing_dot() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.org", "example.com"]));

        let zone = solver.resolve_zone("example.com.").await.unwrap();
        assert_eq!(zone.id, "id-1");
        assert_eq!(zone.name, "example.com");
    }

    #[tokio::test]
    async fn test_resolve_zone_not_found() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.org", "sub.example.com"]));

        let err = solver.resolve_zone("example.com.").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ZoneNotFound);
        assert!(err.to_string().contains("example.com."));
    }

    #[tokio::test]
    async fn test_resolve_zone_last_match_wins() {
        let mut fake = FakeDns::with_zones(&[]);
        fake.zones = vec![
            zone("first", "example.com"),
            zone("other", "example.org"),
            zone("second", "example.com"),
        ];
        let solver = AliDnsSolver::with_api(fake);

        let zone = solver.resolve_zone("example.com.").await.unwrap();
        assert_eq!(zone.id, "second");
    }

    #[tokio::test]
    async fn test_resolve_zone_pagination_stops_at_total() {
        let names: Vec<String> = (0..1200).map(|i| format!("zone{}.example", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut fake = FakeDns::with_zones(&refs);
        fake.page_size = 500;
        let solver = AliDnsSolver::with_api(fake);

        let zone = solver.resolve_zone("zone1199.example.").await.unwrap();
        assert_eq!(zone.id, "id-1199");
        assert_eq!(
            solver.api().calls(),
            vec![Call::ListZones(1), Call::ListZones(2), Call::ListZones(3)]
        );
    }

    #[tokio::test]
    async fn test_resolve_zone_trusts_reported_total() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.page_size = 500;
        fake.total_count = Some(1200);
        let solver = AliDnsSolver::with_api(fake);

        solver.resolve_zone("example.com.").await.unwrap();
        assert_eq!(solver.api().count(|c| matches!(c, Call::ListZones(_))), 3);
    }

    #[tokio::test]
    async fn test_resolve_zone_listing_failure() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.fail_list_zones = true;
        let solver = AliDnsSolver::with_api(fake);

        let err = solver.resolve_zone("example.com.").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderCommunication);
    }

    // ==================== present ====================

    #[tokio::test]
    async fn test_present_adds_one_txt_record() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.com"]));

        solver
            .present("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap();

        let adds: Vec<RecordOperationBuilder> = solver
            .api()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddRecord(req) => Some(req),
                _ => None,
            })
            .collect();
        assert_eq!(
            adds,
            vec![RecordOperationBuilder::new()
                .domain_name("example.com")
                .rr("_acme-challenge")
                .record_type("TXT")
                .value("token")]
        );
    }

    #[tokio::test]
    async fn test_present_nested_name() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.com"]));

        solver
            .present("example.com.", "_acme-challenge.www.example.com.", "token")
            .await
            .unwrap();

        let calls = solver.api().calls();
        let Some(Call::AddRecord(req)) = calls.last() else {
            panic!("Expected an add call, got {:?}", calls);
        };
        assert_eq!(req.rr.as_deref(), Some("_acme-challenge.www"));
    }

    #[tokio::test]
    async fn test_present_failure_issues_no_further_calls() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.fail_add = true;
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .present("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RecordCreate);
        assert!(err.to_string().starts_with("alidns: error adding domain record"));
        assert!(matches!(solver.api().calls().last(), Some(Call::AddRecord(_))));
        assert_eq!(solver.api().count(|c| matches!(c, Call::AddRecord(_))), 1);
    }

    #[tokio::test]
    async fn test_present_zone_not_found() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.org"]));

        let err = solver
            .present("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ZoneNotFound);
        assert_eq!(solver.api().count(|c| matches!(c, Call::AddRecord(_))), 0);
    }

    #[tokio::test]
    async fn test_present_listing_failure_is_prefixed() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.fail_list_zones = true;
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .present("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::ZoneLookup(_)));
        assert!(err.to_string().starts_with("alidns: error getting hosted zones"));
    }

    // ==================== clean_up ====================

    #[tokio::test]
    async fn test_clean_up_no_matching_name() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![txt("1", "www", "token"), txt("2", "_acme-challenge.www", "token")];
        let solver = AliDnsSolver::with_api(fake);

        solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap();

        assert!(deletes(solver.api()).is_empty());
    }

    #[tokio::test]
    async fn test_clean_up_no_matching_value() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![
            txt("1", "_acme-challenge", "other-token"),
            txt("2", "_acme-challenge", "token-suffix"),
        ];
        let solver = AliDnsSolver::with_api(fake);

        solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap();

        assert!(deletes(solver.api()).is_empty());
    }

    #[tokio::test]
    async fn test_clean_up_deletes_every_match() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![
            txt("1", "_acme-challenge", "token"),
            txt("2", "_acme-challenge", "other-token"),
            txt("3", "_acme-challenge", "token"),
            txt("4", "www", "token"),
        ];
        let solver = AliDnsSolver::with_api(fake);

        solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap();

        assert_eq!(deletes(solver.api()), vec!["1".to_string(), "3".to_string()]);
        assert_eq!(
            solver.api().count(|c| matches!(c, Call::ListRecords(name) if name == "example.com")),
            1
        );
    }

    #[tokio::test]
    async fn test_clean_up_stops_at_first_failed_delete() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![
            txt("1", "_acme-challenge", "token"),
            txt("2", "_acme-challenge", "token"),
        ];
        fake.fail_delete_ids = HashSet::from(["1".to_string()]);
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RecordDelete);
        assert!(err.to_string().starts_with("alidns: error deleting domain record"));
        assert_eq!(deletes(solver.api()), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_up_keeps_earlier_deletes_on_failure() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![
            txt("1", "_acme-challenge", "token"),
            txt("2", "_acme-challenge", "token"),
            txt("3", "_acme-challenge", "token"),
        ];
        fake.fail_delete_ids = HashSet::from(["2".to_string()]);
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RecordDelete);
        assert_eq!(deletes(solver.api()), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_up_record_lookup_failure() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.fail_list_records = true;
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RecordLookup);
        assert!(err.to_string().starts_with("alidns: error finding txt records"));
        assert!(deletes(solver.api()).is_empty());
    }

    #[tokio::test]
    async fn test_clean_up_resolves_zone_twice() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![txt("1", "_acme-challenge", "token")];
        let solver = AliDnsSolver::with_api(fake);

        solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap();

        assert_eq!(
            solver.api().calls(),
            vec![
                Call::ListZones(1),
                Call::ListRecords("example.com".to_string()),
                Call::ListZones(1),
                Call::DeleteRecord("1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clean_up_zone_vanishes_before_delete() {
        let mut fake = FakeDns::with_zones(&["example.com"]);
        fake.records = vec![txt("1", "_acme-challenge", "token")];
        fake.zones_vanish_after = Some(1);
        let solver = AliDnsSolver::with_api(fake);

        let err = solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ZoneNotFound);
        assert!(deletes(solver.api()).is_empty());
    }

    #[tokio::test]
    async fn test_clean_up_zone_not_found() {
        let solver = AliDnsSolver::with_api(FakeDns::with_zones(&["example.org"]));

        let err = solver
            .clean_up("example.com.", "_acme-challenge.example.com.", "token")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ZoneNotFound);
        assert_eq!(solver.api().count(|c| matches!(c, Call::ListRecords(_))), 0);
    }

    // ==================== construction ====================

    #[test]
    fn test_new_makes_no_network_call() {
        assert!(AliDnsSolver::new("cn-hangzhou", "LTAI-test", "secret").is_ok());
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        let err = AliDnsSolver::new("cn-hangzhou", "", "secret").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
