// whois-expiry-lib/tests/whois_server.rs

//! WHOIS strategy against local port 43 stand-ins: plain answers,
//! IANA and registrar referrals, and servers that never answer.

use chrono::NaiveDate;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};
use whois_expiry_lib::{
    ExpiryCheckError, ExpiryChecker, ExpiryLookup, ExpiryValue, LookupOutcome, LookupSource,
    WhoisLookup,
};

/// Answer every connection with `response`; returns `127.0.0.1:<port>`.
fn serve(response: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = response.to_string();

    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let mut query = String::new();
            let _ = BufReader::new(&stream).read_line(&mut query);
            let _ = stream.write_all(response.as_bytes());
        }
    });

    addr.to_string()
}

/// Accept connections and never answer.
fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let mut held: Vec<TcpStream> = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    addr.to_string()
}

/// An address nothing listens on.
fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

fn lookup_via(server: &str) -> WhoisLookup {
    WhoisLookup::with_timeout(Duration::from_secs(5)).with_servers([("museum", server)])
}

fn midnight(y: i32, m: u32, d: u32) -> ExpiryValue {
    ExpiryValue::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

#[tokio::test]
async fn test_registry_answer_with_expiry() {
    let registry = serve(
        "Domain Name: EXAMPLE.MUSEUM\r\nCreation Date: 2001-03-04T00:00:00Z\r\nRegistry Expiry Date: 2030-01-01T00:00:00Z\r\n",
    );

    let outcome = lookup_via(&registry).lookup("example.museum").await;
    assert_eq!(outcome, LookupOutcome::Found(midnight(2030, 1, 1)));
}

#[tokio::test]
async fn test_registry_answer_without_expiry() {
    let registry = serve("No match for \"EXAMPLE.MUSEUM\".\r\n");
    let lookup = lookup_via(&registry);

    let response = lookup.query("example.museum").await.unwrap();
    assert!(response.contains("No match"));
    assert_eq!(lookup.lookup("example.museum").await, LookupOutcome::Absent);
}

#[tokio::test]
async fn test_iana_referral_is_followed() {
    let registry = serve("Domain Name: EXAMPLE.MUSEUM\nRegistry Expiry Date: 2030-01-01T00:00:00Z\n");
    let iana = serve(&format!(
        "% IANA WHOIS server\n\ndomain:       MUSEUM\n\nrefer:        {}\n\nwhois:        {}\n",
        registry, registry
    ));

    let lookup = lookup_via(&iana);
    let response = lookup.query("example.museum").await.unwrap();

    assert!(!response.contains("IANA"));
    assert_eq!(
        lookup.lookup("example.museum").await,
        LookupOutcome::Found(midnight(2030, 1, 1))
    );
}

#[tokio::test]
async fn test_unreachable_registry_after_iana_fails() {
    let iana = serve(&format!("% IANA WHOIS server\nrefer: {}\n", closed_port()));

    let err = lookup_via(&iana).query("example.museum").await.unwrap_err();
    assert!(matches!(err, ExpiryCheckError::WhoisError { .. }));
}

#[tokio::test]
async fn test_refused_registrar_keeps_registry_answer() {
    let registry = serve(&format!(
        "Domain Name: EXAMPLE.MUSEUM\nRegistrar WHOIS Server: {}\nRegistry Expiry Date: 2030-01-01T00:00:00Z\n",
        closed_port()
    ));

    assert_eq!(
        lookup_via(&registry).lookup("example.museum").await,
        LookupOutcome::Found(midnight(2030, 1, 1))
    );
}

#[tokio::test]
async fn test_registrar_answer_is_appended() {
    let registrar =
        serve("Domain Name: example.museum\r\nRegistrar Registration Expiration Date: 2031-05-06T00:00:00Z\r\n");
    let registry = serve(&format!(
        "Domain Name: EXAMPLE.MUSEUM\r\nRegistrar WHOIS Server: {}\r\nUpdated Date: 2024-01-01T00:00:00Z\r\n",
        registrar
    ));

    let lookup = lookup_via(&registry);
    let response = lookup.query("example.museum").await.unwrap();
    assert!(response.contains("Updated Date"));
    assert!(response.contains("Registrar Registration Expiration Date"));

    assert_eq!(
        lookup.lookup("example.museum").await,
        LookupOutcome::Found(midnight(2031, 5, 6))
    );
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let lookup = WhoisLookup::with_timeout(Duration::from_millis(300))
        .with_servers([("museum", serve_silently())]);

    let started = Instant::now();
    let err = lookup.query("example.museum").await.unwrap_err();

    assert!(matches!(err, ExpiryCheckError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(lookup.lookup("example.museum").await, LookupOutcome::Absent);
}

#[tokio::test]
async fn test_checker_reports_whois_source() {
    let registry = serve("Registry Expiry Date: 2030-01-01T00:00:00Z\n");
    let checker = ExpiryChecker::with_strategies(vec![Box::new(lookup_via(&registry))]);

    let today = NaiveDate::from_ymd_opt(2029, 12, 22).unwrap();
    let report = checker.check_domain_on("example.museum", today).await.unwrap();

    assert_eq!(report.source, LookupSource::Whois);
    assert_eq!(
        report.expiration_date,
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    );
    assert_eq!(report.days_left, 10);
}
