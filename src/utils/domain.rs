/// Strips a single trailing root-zone separator from `name`.
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Computes the record name relative to `domain` for a challenge FQDN.
///
/// `"_acme-challenge.example.com."` within `"example.com"` becomes
/// `"_acme-challenge"`. When `"." + domain` does not occur in the normalized
/// FQDN the normalized FQDN is returned whole.
pub fn extract_record_name(fqdn: &str, domain: &str) -> String {
    let name = un_fqdn(fqdn);
    match name.find(&format!(".{}", domain)) {
        Some(idx) => name[..idx].to_string(),
        None => name.to_string(),
    }
}
