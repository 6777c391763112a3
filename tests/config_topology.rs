//! Loading topology files and applying them to a broker.

use std::path::{Path, PathBuf};

use exchange_router::config::{load_config, parse_config, ConfigError, ValidationError};
use exchange_router::routing::{Envelope, HeaderValue};
use exchange_router::{apply_topology, Broker};

mod common;

use common::{headers, names};

fn sample_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/topology.toml")
}

#[test]
fn test_sample_topology_routes() {
    let config = load_config(&sample_path()).unwrap();
    let broker = Broker::from_settings(&config.broker);
    let report = apply_topology(&broker, &config, None).unwrap();
    assert_eq!(report.exchanges_declared, 3);
    assert_eq!(report.queues_declared, 3);
    assert_eq!(report.bindings_added, 4);

    let dests = broker.publish("orders", &Envelope::new("order.eu.paid")).unwrap();
    assert_eq!(names(&dests), vec!["audit", "billing"]);

    let dests = broker.publish("logs", &Envelope::new("")).unwrap();
    assert_eq!(names(&dests), vec!["audit"]);

    let by_version = Envelope::new("").with_headers(headers(&[("version", HeaderValue::Int(2))]));
    let dests = broker.publish("documents", &by_version).unwrap();
    assert_eq!(names(&dests), vec!["pdf-render"]);

    let wrong_type = Envelope::new("").with_headers(headers(&[("version", "2".into())]));
    assert!(broker.publish("documents", &wrong_type).unwrap().is_empty());

    let urgent = Envelope::new("").with_headers(headers(&[("urgent", HeaderValue::Bool(false))]));
    assert_eq!(names(&broker.publish("documents", &urgent).unwrap()), vec!["pdf-render"]);
}

#[test]
fn test_reload_moves_bindings() {
    let initial = load_config(&sample_path()).unwrap();
    let broker = Broker::from_settings(&initial.broker);
    apply_topology(&broker, &initial, None).unwrap();

    let mut next = initial.clone();
    next.bindings.retain(|b| b.exchange != "logs");
    next.bindings[1].routing_key = "order.#.refunded".into();

    let report = apply_topology(&broker, &next, Some(&initial)).unwrap();
    assert_eq!(report.bindings_removed, 2);
    assert_eq!(report.bindings_added, 1);

    assert!(broker.publish("logs", &Envelope::new("")).unwrap().is_empty());
    let dests = broker.publish("orders", &Envelope::new("order.eu.paid")).unwrap();
    assert_eq!(names(&dests), vec!["audit"]);
    let dests = broker
        .publish("orders", &Envelope::new("order.eu.x.refunded"))
        .unwrap();
    assert_eq!(names(&dests), vec!["audit", "billing"]);
}

#[test]
fn test_invalid_topology_reports_every_problem() {
    let err = parse_config(
        r#"
        [[exchanges]]
        name = "amq.topic"
        kind = "direct"

        [[queues]]
        name = "q"

        [[bindings]]
        exchange = "nowhere"
        queue = "q"

        [[bindings]]
        exchange = "amq.fanout"
        queue = "ghost"

        [[bindings]]
        exchange = "amq.topic"
        queue = "q"
        routing_key = "a.b*"
        "#,
    )
    .unwrap_err();

    let ConfigError::Validation(errors) = err else {
        panic!("expected validation errors, got {err}");
    };
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::StandardExchangeConflict { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::UnknownExchange { index: 0, .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::UnknownQueue { index: 1, .. })));
}
