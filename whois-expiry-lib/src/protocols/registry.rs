//! TLD to WHOIS server mappings.
//!
//! The WHOIS client needs to know which server answers for a TLD. Common TLDs
//! are mapped here; anything else is sent to IANA, whose `refer:` line the
//! WHOIS strategy follows to the authoritative server.

use crate::error::ExpiryCheckError;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// IANA WHOIS server, used for TLDs missing from the built-in map.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Server for IP address queries. The client refuses a server table without one.
const IP_WHOIS_SERVER: &str = "whois.arin.net";

lazy_static::lazy_static! {
    static ref WHOIS_SERVERS: HashMap<&'static str, &'static str> = get_whois_server_map();
}

/// Get the built-in WHOIS server mappings.
///
/// # Returns
///
/// A HashMap mapping TLD strings (like "com", "org") to WHOIS server hostnames.
pub fn get_whois_server_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Popular gTLDs
        ("com", "whois.verisign-grs.com"),
        ("net", "whois.verisign-grs.com"),
        ("org", "whois.publicinterestregistry.org"),
        ("info", "whois.nic.info"),
        ("biz", "whois.nic.biz"),
        ("edu", "whois.educause.edu"),
        ("gov", "whois.dotgov.gov"),
        // Google TLDs
        ("app", "whois.nic.google"),
        ("dev", "whois.nic.google"),
        ("page", "whois.nic.google"),
        // CentralNic / Radix managed gTLDs
        ("xyz", "whois.nic.xyz"),
        ("tech", "whois.nic.tech"),
        ("online", "whois.nic.online"),
        ("site", "whois.nic.site"),
        // Popular ccTLDs used generically
        ("io", "whois.nic.io"),
        ("ai", "whois.nic.ai"),
        ("co", "whois.nic.co"),
        ("me", "whois.nic.me"),
        ("tv", "whois.nic.tv"),
        ("cc", "ccwhois.verisign-grs.com"),
        // Country code TLDs
        ("us", "whois.nic.us"),
        ("uk", "whois.nic.uk"),
        ("de", "whois.denic.de"),
        ("fr", "whois.nic.fr"),
        ("nl", "whois.domain-registry.nl"),
        ("eu", "whois.eu"),
        ("ca", "whois.cira.ca"),
        ("au", "whois.auda.org.au"),
        ("jp", "whois.jprs.jp"),
        ("ru", "whois.tcinet.ru"),
        ("cn", "whois.cnnic.cn"),
        ("in", "whois.registry.in"),
        ("br", "whois.registro.br"),
        ("it", "whois.nic.it"),
        ("es", "whois.nic.es"),
        ("ch", "whois.nic.ch"),
        ("se", "whois.iis.se"),
        ("pl", "whois.dns.pl"),
    ])
}

/// WHOIS server for a TLD, falling back to IANA.
pub fn get_whois_server(tld: &str) -> &'static str {
    WHOIS_SERVERS
        .get(tld.to_lowercase().as_str())
        .copied()
        .unwrap_or(IANA_WHOIS_SERVER)
}

/// Extract the TLD from a domain name.
///
/// Only the last label is returned, so `example.co.uk` yields `uk`.
pub fn extract_tld(domain: &str) -> Result<String, ExpiryCheckError> {
    let trimmed = domain.trim().trim_end_matches('.');

    match trimmed.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() && !tld.is_empty() => Ok(tld.to_lowercase()),
        _ => Err(ExpiryCheckError::whois(
            domain,
            "Domain must contain at least one dot",
        )),
    }
}

/// Build the server table the WHOIS client is loaded from.
///
/// The table uses the node-whois `servers.json` layout: TLD keys mapping to
/// hostnames, plus a `_` entry holding the IP lookup server. The TLD of
/// `domain` is always present, pointing at IANA when it is not a known TLD.
pub fn whois_servers_json(domain: &str) -> Result<String, ExpiryCheckError> {
    let tld = extract_tld(domain)?;

    let mut table = Map::new();
    table.insert("_".to_string(), json!({ "ip": { "host": IP_WHOIS_SERVER } }));
    for (tld, server) in WHOIS_SERVERS.iter() {
        table.insert((*tld).to_string(), Value::from(*server));
    }
    table
        .entry(tld.clone())
        .or_insert_with(|| Value::from(get_whois_server(&tld)));

    serde_json::to_string(&Value::Object(table))
        .map_err(|e| ExpiryCheckError::internal(format!("Failed to build WHOIS server table: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com").unwrap(), "com");
        assert_eq!(extract_tld("test.co.uk").unwrap(), "uk");
        assert_eq!(extract_tld("Example.ORG.").unwrap(), "org");
        assert!(extract_tld("localhost").is_err());
        assert!(extract_tld(".com").is_err());
        assert!(extract_tld("example.").is_err());
    }

    #[test]
    fn test_known_and_unknown_servers() {
        assert_eq!(get_whois_server("com"), "whois.verisign-grs.com");
        assert_eq!(get_whois_server("COM"), "whois.verisign-grs.com");
        assert_eq!(get_whois_server("museum"), IANA_WHOIS_SERVER);
    }

    #[test]
    fn test_all_servers_are_hostnames() {
        for (tld, server) in get_whois_server_map() {
            assert!(!tld.contains('.'), "TLD '{}' should be a single label", tld);
            assert!(server.contains('.'), "Server for '{}' is not a hostname", tld);
            assert!(!server.contains("://"), "Server for '{}' must not be a URL", tld);
        }
    }

    #[test]
    fn test_servers_json_layout() {
        let json: Value = serde_json::from_str(&whois_servers_json("example.museum").unwrap()).unwrap();

        assert_eq!(json["_"]["ip"]["host"], IP_WHOIS_SERVER);
        assert_eq!(json["com"], "whois.verisign-grs.com");
        assert_eq!(json["museum"], IANA_WHOIS_SERVER);
    }

    #[test]
    fn test_servers_json_rejects_bare_names() {
        assert!(whois_servers_json("localhost").is_err());
    }
}
