#![allow(clippy::unwrap_used)]
// End-to-end orchestration through fake SSH sessions and a wiremock agent.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use glassline_api::{RestClient, ScrapeClient, SessionOptions, TransportConfig};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glassline_core::{
    BasicValidator, CoreError, Execute, ExecutionResult, Messages, Orchestrator, Outcome,
    Platform, Query, QueryType, Registry, RestTransport, ScrapeTransport, Status,
    TemplateCommandBuilder, Transport, TransportClass, status_code,
};

use common::{
    CountingTransport, FakeConnector, TUNNEL_PORT, bastion, credentials, device, registry,
};

const IOS_COMMUNITY: &str = "BGP table version is 9, local router ID is 192.0.2.1\n\
For address family: IPv4 Unicast\n\
*>  198.51.100.0/24  192.0.2.9  0 65000 i\n\
\n\
For address family: IPv6 Unicast\n\
*>  2001:db8:100::/48  2001:db8::9  0 65000 i\n\
\n\
For address family: VPNv4 Unicast\n\
*>  10.0.0.0/8  192.0.2.9\n";

fn scrape(connector: FakeConnector) -> Arc<dyn Transport> {
    let client = ScrapeClient::with_connector(connector, 2, SessionOptions::default());
    Arc::new(ScrapeTransport::new(client, Messages::default().general))
}

fn rest() -> Arc<dyn Transport> {
    let client = RestClient::new(&TransportConfig::default()).unwrap();
    Arc::new(RestTransport::new(client, Messages::default().general))
}

fn orchestrator(
    registry: Arc<Registry>,
    scrape: Arc<dyn Transport>,
    rest: Arc<dyn Transport>,
) -> Orchestrator {
    Orchestrator::new(
        registry,
        Arc::new(BasicValidator::default()),
        Arc::new(TemplateCommandBuilder::default()),
        scrape,
        rest,
        Messages::default(),
    )
}

// ── Scrape ──────────────────────────────────────────────────────────

#[tokio::test]
async fn community_lookup_on_ios_is_split_by_family() {
    let connector = FakeConnector::replying(IOS_COMMUNITY);
    let log = Arc::clone(&connector.log);
    let reg = registry(vec![device("nyc1", Platform::CiscoIos, "192.0.2.1", 22)]);
    let orch = orchestrator(reg, scrape(connector), rest());

    let result = orch
        .execute(&Query::new("nyc1", QueryType::BgpCommunity, "65000:1"))
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Succeeded);
    assert_eq!(result.status_code, status_code::VALID);
    assert_eq!(
        result.output,
        "For address family: IPv4 Unicast\n\
*>  198.51.100.0/24  192.0.2.9  0 65000 i\n\n\
For address family: IPv6 Unicast\n\
*>  2001:db8:100::/48  2001:db8::9  0 65000 i"
    );
    assert_eq!(
        *log.commands.lock().unwrap(),
        ["show bgp all community 65000:1 | exclude pathid:|Epoch"]
    );
    assert_eq!(log.tunnels.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn proxied_device_uses_tunnel_with_proxy_credential() {
    let connector = FakeConnector::replying("Success rate is 100 percent (5/5)");
    let log = Arc::clone(&connector.log);
    let mut dev = device("lax1", Platform::CiscoXr, "203.0.113.5", 22);
    dev.proxy = Some("bastion".into());
    let orch = orchestrator(registry(vec![dev]), scrape(connector), rest());

    let result = orch
        .execute(&Query::new("lax1", QueryType::Ping, "198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(result.status(), Status::Success);
    assert_eq!(log.tunnels.load(Ordering::SeqCst), 1);
    assert_eq!(*log.tunnel_users.lock().unwrap(), ["jump"]);
    assert_eq!(
        *log.sessions.lock().unwrap(),
        [("127.0.0.1".to_string(), TUNNEL_PORT, "lg".to_string())]
    );
}

#[tokio::test]
async fn empty_scrape_output_is_a_generic_failure() {
    let reg = registry(vec![device("nyc1", Platform::Juniper, "192.0.2.1", 22)]);
    let orch = orchestrator(reg, scrape(FakeConnector::replying(" \n\t")), rest());

    let result = orch
        .execute(&Query::new("nyc1", QueryType::BgpRoute, "198.51.100.0/24"))
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.status_code, status_code::INVALID);
    assert_eq!(result.output, Messages::default().general);
}

// ── REST ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rest_agent_reply_is_returned_unchanged() {
    let server = MockServer::start().await;
    let body = "65000:1 prefixes: 198.51.100.0/24, 2001:db8:100::/48";
    Mock::given(method("POST"))
        .and(path("/frr"))
        .and(header("X-API-Key", "device-secret"))
        .and(body_json(serde_json::json!({
            "query_type": "bgp_community",
            "afi": "dual",
            "target": "65000:1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let port = server.address().port();
    let reg = registry(vec![device("fra1", Platform::Frr, "127.0.0.1", port)]);
    let counting = CountingTransport::new(TransportClass::Scrape, ExecutionResult::succeeded("x"));
    let orch = orchestrator(reg, counting.clone(), rest());

    let result = orch
        .execute(&Query::new("fra1", QueryType::BgpCommunity, "65000:1"))
        .await
        .unwrap();

    assert_eq!(result, ExecutionResult::succeeded(body));
    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn rest_error_status_is_passed_through_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let port = server.address().port();
    let reg = registry(vec![device("ams1", Platform::Bird, "127.0.0.1", port)]);
    let orch = orchestrator(reg, scrape(FakeConnector::replying("unused")), rest());

    let result = orch
        .execute(&Query::new("ams1", QueryType::BgpRoute, "198.51.100.0/24"))
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.status_code, 401);
    assert_eq!(result.output, "invalid key");
}

#[tokio::test]
async fn rest_transport_fault_is_a_generic_failure() {
    // Nothing listens on the discard port.
    let reg = registry(vec![device("ams1", Platform::Bird, "127.0.0.1", 9)]);
    let orch = orchestrator(reg, scrape(FakeConnector::replying("unused")), rest());

    let result = orch
        .execute(&Query::new("ams1", QueryType::Ping, "198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::failed(Messages::default().general, status_code::INVALID)
    );
}

#[tokio::test]
async fn rest_timeout_is_a_generic_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = RestClient::new(&TransportConfig {
        timeout: Duration::from_millis(100),
        ..TransportConfig::default()
    })
    .unwrap();
    let rest: Arc<dyn Transport> =
        Arc::new(RestTransport::new(client, Messages::default().general));

    let port = server.address().port();
    let reg = registry(vec![device("ams1", Platform::Bird, "127.0.0.1", port)]);
    let orch = orchestrator(reg, scrape(FakeConnector::replying("unused")), rest);

    let result = orch
        .execute(&Query::new("ams1", QueryType::Ping, "198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::failed(Messages::default().general, status_code::INVALID)
    );
}

// ── Rejections and preconditions ────────────────────────────────────

#[tokio::test]
async fn rejection_touches_no_transport() {
    let reg = registry(vec![device("nyc1", Platform::CiscoIos, "192.0.2.1", 22)]);
    let scrape = CountingTransport::new(TransportClass::Scrape, ExecutionResult::succeeded("x"));
    let rest = CountingTransport::new(TransportClass::Rest, ExecutionResult::succeeded("x"));
    let orch = orchestrator(reg, scrape.clone(), rest.clone());

    let result = orch
        .execute(&Query::new("nyc1", QueryType::Ping, "127.0.0.1"))
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.status_code, status_code::NOT_ALLOWED);
    assert_eq!(result.output, "127.0.0.1 is not allowed.");
    assert_eq!(scrape.calls() + rest.calls(), 0);
}

#[tokio::test]
async fn exactly_one_transport_is_called() {
    let reg = registry(vec![device("nyc1", Platform::Arista, "192.0.2.1", 22)]);
    let scrape = CountingTransport::new(TransportClass::Scrape, ExecutionResult::succeeded("ok"));
    let rest = CountingTransport::new(TransportClass::Rest, ExecutionResult::succeeded("ok"));
    let orch = orchestrator(reg, scrape.clone(), rest.clone());

    orch.execute(&Query::new("nyc1", QueryType::Traceroute, "198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(scrape.calls(), 1);
    assert_eq!(rest.calls(), 0);
}

#[tokio::test]
async fn failed_output_is_not_normalized() {
    let reg = registry(vec![device("nyc1", Platform::CiscoIos, "192.0.2.1", 22)]);
    let failure = ExecutionResult::failed(IOS_COMMUNITY, status_code::INVALID);
    let scrape = CountingTransport::new(TransportClass::Scrape, failure.clone());
    let orch = orchestrator(reg, scrape, rest());

    let result = orch
        .execute(&Query::new("nyc1", QueryType::BgpCommunity, "65000:1"))
        .await
        .unwrap();

    assert_eq!(result, failure);
}

#[tokio::test]
async fn unknown_location_is_an_error() {
    let reg = Arc::new(Registry::new([], credentials(), [bastion()]).unwrap());
    let orch = orchestrator(reg, scrape(FakeConnector::replying("x")), rest());

    let err = orch
        .execute(&Query::new("mars1", QueryType::Ping, "198.51.100.1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::UnknownLocation { ref location } if location == "mars1"));
}
