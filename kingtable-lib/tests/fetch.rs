//! Fetch orchestration: staleness, response shapes, rendering and display rows.

mod common;

use common::RecordingHooks;
use common::ScriptedTransport;
use common::envelope;
use common::people;
use common::people_json;
use kingtable_lib::FetchOutcome;
use kingtable_lib::KingTable;
use kingtable_lib::Origin;
use kingtable_lib::RenderOutcome;
use kingtable_lib::SearchTrigger;
use kingtable_lib::config::TableOptions;
use kingtable_lib::error::ConfigError;
use kingtable_lib::error::Error;
use kingtable_lib::error::ProtocolError;
use kingtable_lib::error::TransportError;
use kingtable_lib::event::TableEvent;
use serde_json::Map;
use serde_json::json;
use tokio::sync::broadcast;

fn remote(options: TableOptions, transport: &std::sync::Arc<ScriptedTransport>) -> KingTable {
    KingTable::builder(options.with_url("http://localhost/rows"))
        .transport(transport.clone())
        .build()
        .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<TableEvent>) -> Vec<TableEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_older_response_arriving_last_is_discarded() {
    let transport = ScriptedTransport::new();
    let reply_a = transport.defer();
    let reply_b = transport.defer();
    let table = remote(TableOptions::default().with_results_per_page(10), &transport);

    let fetch_a = tokio::spawn({
        let table = table.clone();
        async move { table.fetch_rows(None).await }
    });
    transport.wait_for_requests(1).await;
    let fetch_b = tokio::spawn({
        let table = table.clone();
        async move { table.fetch_rows(None).await }
    });
    transport.wait_for_requests(2).await;

    reply_b.send(Ok(envelope(10, 20))).unwrap();
    let b = fetch_b.await.unwrap().unwrap();
    assert!(!b.is_stale());

    reply_a.send(Ok(envelope(10, 999))).unwrap();
    let a = fetch_a.await.unwrap().unwrap();
    assert!(a.is_stale());

    let pagination = table.pagination();
    assert_eq!(pagination.total_rows_count, 20);
    assert_eq!(pagination.total_page_count, 2);
}

#[tokio::test]
async fn test_stale_failure_is_silent() {
    let transport = ScriptedTransport::new();
    let reply_a = transport.defer();
    transport.reply(Ok(envelope(5, 5)));
    let hooks = RecordingHooks::default();
    let table = KingTable::builder(TableOptions::default().with_url("http://localhost/rows"))
        .transport(transport.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();
    let mut rx = table.subscribe();

    let fetch_a = tokio::spawn({
        let table = table.clone();
        async move { table.fetch_rows(None).await }
    });
    transport.wait_for_requests(1).await;
    assert!(!table.fetch_rows(None).await.unwrap().is_stale());

    reply_a
        .send(Err(TransportError::http(503, "unavailable")))
        .unwrap();
    assert!(fetch_a.await.unwrap().unwrap().is_stale());

    assert!(!hooks.calls().iter().any(|c| c.starts_with("fetch_error")));
    assert!(!drain(&mut rx).iter().any(|e| matches!(e, TableEvent::Error(_))));
}

#[tokio::test]
async fn test_bare_array_switches_to_fixed_mode() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(people_json(12)));
    let table = remote(TableOptions::default(), &transport);
    assert!(!table.is_fixed());

    let loaded = table.fetch_rows(None).await.unwrap().loaded().unwrap();
    assert_eq!(loaded.origin, Origin::Fetched);
    assert_eq!(loaded.data().len(), 12);
    assert!(table.is_fixed());
    assert_eq!(table.pagination().total_rows_count, 12);

    // Search now runs client side, with no further request.
    assert_eq!(table.search("London"), SearchTrigger::Applied);
    let visible = table.rows_to_display(None).await.unwrap().loaded().unwrap();
    assert_eq!(visible.origin, Origin::Synchronous);
    assert_eq!(visible.data().len(), 6);
    assert_eq!(table.pagination().total_rows_count, 6);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_envelope_updates_totals_only() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(envelope(10, 50)));
    transport.reply(Ok(envelope(10, 50)));
    let table = remote(TableOptions::default().with_results_per_page(10), &transport);

    let loaded = table.fetch_rows(None).await.unwrap().loaded().unwrap();
    assert_eq!(loaded.data().len(), 10);

    let pagination = table.pagination();
    assert_eq!(pagination.total_rows_count, 50);
    assert_eq!(pagination.total_page_count, 5);
    assert_eq!(pagination.page, 1);
    assert!(!table.is_fixed());
    assert!(table.last_fetch_pattern().is_none());

    // The anchor epoch is sent with every request.
    table.fetch_rows(None).await.unwrap();
    let (url, first) = transport.request(0);
    let (_, second) = transport.request(1);
    assert_eq!(url, "http://localhost/rows");
    assert_eq!(first["timestamp"], second["timestamp"]);
    assert_eq!(first["page"], json!(1));
    assert_eq!(first["size"], json!(10));
    assert_eq!(first["fixed"], json!(false));
    assert_eq!(first["search"], json!(""));
}

#[tokio::test]
async fn test_envelope_search_is_cached_but_local_search_wins() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(json!({"subset": people_json(3), "total": 3, "search": "paris"})));
    let table = remote(TableOptions::default(), &transport);
    table.set_search_filter("london");

    table.fetch_rows(None).await.unwrap();
    assert_eq!(table.last_fetch_pattern().unwrap().source(), "paris");
    assert_eq!(table.search_value(), "london");
}

#[tokio::test]
async fn test_extra_post_data_is_merged() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(envelope(0, 0)));
    let table = remote(
        TableOptions::default().with_post_data("tenant", "acme"),
        &transport,
    );

    let mut extra = Map::new();
    extra.insert("include".into(), json!(["address"]));
    table.fetch_rows(Some(extra)).await.unwrap();

    let (_, body) = transport.request(0);
    assert_eq!(body["tenant"], json!("acme"));
    assert_eq!(body["include"], json!(["address"]));
}

#[tokio::test]
async fn test_protocol_error_leaves_state_untouched() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(json!({"subset": people_json(3), "total": "many"})));
    transport.reply(Ok(json!({"rows": []})));
    let table = remote(TableOptions::default(), &transport);
    let before = table.pagination();

    let err = table.fetch_rows(None).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::MissingTotal)));
    assert!(err.is_protocol());

    let err = table.fetch_rows(None).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::NotACatalog)));

    assert_eq!(table.pagination(), before);
    assert!(table.data().is_none());
    assert!(!table.columns_initialized());
}

#[tokio::test]
async fn test_transport_failure_fires_hook_and_event() {
    let transport = ScriptedTransport::new();
    transport.reply(Err(TransportError::http(500, "boom")));
    let hooks = RecordingHooks::default();
    let table = KingTable::builder(TableOptions::default().with_url("http://localhost/rows"))
        .transport(transport.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();
    let mut rx = table.subscribe();

    let err = table.fetch_rows(None).await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Http { status: 500, .. })));
    assert!(err.is_retryable());

    assert_eq!(
        hooks.calls(),
        vec!["initialize", "fetch_start", "fetch_end", "fetch_error:http"]
    );
    assert_eq!(
        drain(&mut rx),
        vec![
            TableEvent::FetchStart,
            TableEvent::FetchEnd,
            TableEvent::Error("http".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_missing_url_is_a_config_error() {
    let table = KingTable::builder(TableOptions::default()).build().unwrap();
    let err = table.fetch_rows(None).await.unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::MissingUrl)));
}

#[tokio::test]
async fn test_fixed_table_answers_synchronously() {
    let transport = ScriptedTransport::new();
    let table = KingTable::builder(TableOptions::default().with_url("http://localhost/rows"))
        .transport(transport.clone())
        .data(people(4))
        .build()
        .unwrap();

    let loaded = table.fetch_rows(None).await.unwrap().loaded().unwrap();
    assert!(loaded.is_synchronous());
    assert_eq!(loaded.data().len(), 4);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_render_parks_until_rows_arrive() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(envelope(0, 0)));
    transport.reply(Ok(envelope(5, 5)));
    let hooks = RecordingHooks::default();
    let table = KingTable::builder(TableOptions::default().with_url("http://localhost/rows"))
        .transport(transport.clone())
        .hooks(hooks.clone())
        .build()
        .unwrap();
    let mut rx = table.subscribe();

    assert_eq!(table.render().await.unwrap(), RenderOutcome::Pending);
    assert!(drain(&mut rx).contains(&TableEvent::MissingData));
    assert!(table.columns().is_empty());

    table.fetch_rows(None).await.unwrap();
    assert!(drain(&mut rx).contains(&TableEvent::RenderReady));
    assert_eq!(table.columns().len(), 3);
    assert!(hooks.calls().contains(&"after_render".to_string()));
}

#[tokio::test]
async fn test_render_builds_sorted_columns() {
    let table = KingTable::builder(TableOptions::default())
        .data(people(2))
        .build()
        .unwrap();

    let outcome = table.render().await.unwrap();
    assert!(matches!(outcome, RenderOutcome::Ready(ref loaded) if loaded.is_synchronous()));

    let columns = table.columns();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["city", "id", "name"]);
    assert!(columns[1].hidden);
}

#[tokio::test]
async fn test_page_reset_when_totals_shrink() {
    let transport = ScriptedTransport::new();
    transport.reply(Ok(envelope(10, 20)));
    let table = remote(
        TableOptions::default().with_page(3).with_results_per_page(10),
        &transport,
    );
    assert_eq!(table.pagination().page, 3);
    let mut rx = table.subscribe();

    table.fetch_rows(None).await.unwrap();
    assert_eq!(table.pagination().page, 1);
    let events = drain(&mut rx);
    assert!(events.contains(&TableEvent::PageChange(1)));
    assert!(events.contains(&TableEvent::ResultsCountChange(20)));
}

#[tokio::test]
async fn test_rows_to_display_slices_local_pages() {
    let table = KingTable::builder(TableOptions::default().with_results_per_page(30))
        .data(people(95))
        .build()
        .unwrap();
    assert_eq!(table.pagination().total_page_count, 4);
    assert!(table.go_to_page(4));

    let rows = table.rows_to_display(None).await.unwrap().loaded().unwrap().into_inner();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["id"], json!(91));
    assert_eq!(rows[0]["rowCount"], json!(91));
    assert_eq!(rows[4]["id"], json!(95));
}

#[tokio::test]
async fn test_rows_to_display_sorts_fixed_collections() {
    let table = KingTable::builder(TableOptions::default().with_results_per_page(10))
        .data(people(25))
        .build()
        .unwrap();
    table.sort_by("name").unwrap();
    table.sort_by("name").unwrap();

    let rows = table.rows_to_display(None).await.unwrap().loaded().unwrap().into_inner();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["name"], json!("Person 025"));
    assert_eq!(rows[0]["rowCount"], json!(1));
}

#[tokio::test]
async fn test_rows_to_display_without_pagination() {
    let table = KingTable::builder(
        TableOptions::default()
            .with_results_per_page(10)
            .pagination_enabled(false),
    )
    .data(people(25))
    .build()
    .unwrap();

    let outcome = table.rows_to_display(None).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Loaded(ref l) if l.data().len() == 25));
}
