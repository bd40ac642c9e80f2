//! Grouping of certificate records by owning domain.

use crate::record::CertRecord;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Group records by the domain derived from their service name.
///
/// Order within a domain's list is input order. Iteration across domains is
/// sorted, so a single run is deterministic; callers must not rely on any
/// particular cross-domain order for correctness.
///
/// Records whose service name has no domain component cannot be routed to an
/// admin role and are dropped with a warning.
pub fn group_by_domain(records: Vec<CertRecord>) -> BTreeMap<String, Vec<CertRecord>> {
    let mut groups: BTreeMap<String, Vec<CertRecord>> = BTreeMap::new();
    for record in records {
        let domain = match record.domain() {
            Some(domain) => domain.to_string(),
            None => {
                warn!(service = %record.service, "service name has no domain component, skipping record");
                continue;
            }
        };
        info!(domain = %domain, host_name = ?record.host_name, "processing unrefreshed certificate");
        groups.entry(domain).or_default().push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service: &str, instance_id: &str) -> CertRecord {
        CertRecord {
            service: service.to_string(),
            provider: "aws".to_string(),
            instance_id: instance_id.to_string(),
            issue_time: None,
            expiry_time: None,
            host_name: None,
        }
    }

    #[test]
    fn records_grouped_under_derived_domain() {
        let groups = group_by_domain(vec![
            record("sports.api", "i-1"),
            record("weather.ui", "i-2"),
            record("sports.db", "i-3"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["sports"].len(), 2);
        assert_eq!(groups["weather"].len(), 1);
    }

    #[test]
    fn every_record_matches_its_group_key() {
        let groups = group_by_domain(vec![
            record("sports.api", "i-1"),
            record("sports.prod.api", "i-2"),
            record("weather.ui", "i-3"),
        ]);

        for (domain, records) in &groups {
            for rec in records {
                assert_eq!(rec.domain(), Some(domain.as_str()));
            }
        }
    }

    #[test]
    fn input_order_kept_within_a_domain() {
        let groups = group_by_domain(vec![
            record("sports.api", "i-1"),
            record("weather.ui", "i-9"),
            record("sports.db", "i-2"),
            record("sports.cache", "i-3"),
        ]);

        let ids: Vec<&str> = groups["sports"]
            .iter()
            .map(|r| r.instance_id.as_str())
            .collect();
        assert_eq!(ids, vec!["i-1", "i-2", "i-3"]);
    }

    #[test]
    fn record_without_domain_is_dropped() {
        let groups = group_by_domain(vec![record("api", "i-1"), record("sports.api", "i-2")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["sports"].len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(group_by_domain(Vec::new()).is_empty());
    }
}
