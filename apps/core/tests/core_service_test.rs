use std::sync::{Arc, Mutex};
use std::time::Duration;

use quickhop_core::activation::{ActivationDispatcher, TabControl, WindowControl};
use quickhop_core::cache::{InventoryCache, ManualClock};
use quickhop_core::config::Config;
use quickhop_core::contract::{
    ActivateRequest, CloseTabRequest, CoreRequest, CoreResponse, SearchRequest,
};
use quickhop_core::core_service::{CoreService, ServiceError};
use quickhop_core::discovery::{FailingProvider, ProviderError, StaticProvider};
use quickhop_core::model::{Item, ItemKind, OwnerInfo, TabRecord, WindowRecord};

#[derive(Default)]
struct RecordingControl {
    windows: Vec<Item>,
    activated_windows: Mutex<Vec<String>>,
    activated_tabs: Mutex<Vec<String>>,
    closed_tabs: Mutex<Vec<String>>,
}

impl WindowControl for RecordingControl {
    fn list_windows(&self) -> Vec<Item> {
        self.windows.clone()
    }

    fn activate_window(&self, id: &str) -> bool {
        self.activated_windows.lock().unwrap().push(id.to_string());
        true
    }
}

impl TabControl for RecordingControl {
    fn activate_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.activated_tabs.lock().unwrap().push(native_id.to_string());
        Ok(())
    }

    fn close_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.closed_tabs.lock().unwrap().push(native_id.to_string());
        Ok(())
    }
}

fn window(id: &str, title: &str, owner: &str) -> Item {
    Item::from_window(WindowRecord {
        id: id.to_string(),
        title: title.to_string(),
        visible: true,
        owner: OwnerInfo {
            name: owner.to_string(),
            pid: 100,
        },
        ..Default::default()
    })
}

fn tab(id: &str, title: &str, url: &str) -> Item {
    Item::from_tab(TabRecord {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        favicon_url: None,
    })
}

struct Harness {
    service: CoreService,
    control: Arc<RecordingControl>,
    windows: Arc<StaticProvider>,
    clock: Arc<ManualClock>,
}

fn harness(config: Config) -> Harness {
    let window_items = vec![
        window("0x1", "Inbox - Mail", "Mail"),
        window("0x2", "Inbox - Google Chrome", "Google Chrome"),
        window("0x3", "quickhop - Terminal", "Terminal"),
    ];
    let windows = Arc::new(StaticProvider::from_items("windows", window_items.clone()));
    let tabs = Arc::new(StaticProvider::from_items(
        "tabs",
        vec![
            tab("7", "Mail - Gmail", "https://mail.google.com"),
            tab("8", "Rust docs", "https://doc.rust-lang.org"),
        ],
    ));
    let clock = Arc::new(ManualClock::new(10_000));
    let cache = InventoryCache::with_clock(
        windows.clone(),
        tabs,
        clock.clone(),
        config.staleness(),
        config.provider_timeout(),
    );
    let control = Arc::new(RecordingControl {
        windows: window_items,
        ..Default::default()
    });
    let dispatcher =
        ActivationDispatcher::new(control.clone(), control.clone(), &config.browser_name);
    let service = CoreService::with_parts(config, cache, dispatcher).unwrap();

    Harness {
        service,
        control,
        windows,
        clock,
    }
}

#[test]
fn search_returns_ranked_items_across_kinds() {
    let h = harness(Config::default());

    let results = h.service.search("mail");
    let ids: Vec<&str> = results.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["0x1", "tab-7"]);
}

#[test]
fn blank_query_skips_the_cache() {
    let h = harness(Config::default());

    assert!(h.service.search("  ").is_empty());
    assert_eq!(h.windows.calls(), 0);
}

#[test]
fn repeated_searches_reuse_the_snapshot() {
    let h = harness(Config::default());

    h.service.search("mail");
    h.service.search("inbox");
    h.clock.advance(Duration::from_millis(1_000));
    h.service.search("rust");
    assert_eq!(h.windows.calls(), 1);

    h.clock.advance(Duration::from_millis(5_000));
    h.service.search("rust");
    assert_eq!(h.windows.calls(), 2);
}

#[test]
fn limits_apply_from_request_then_config() {
    let h = harness(Config {
        max_results: 1,
        ..Default::default()
    });

    assert_eq!(h.service.search("inbox").len(), 1);
    assert_eq!(h.service.search_with_limit("inbox", Some(0)).len(), 2);
    assert_eq!(h.service.search_with_limit("inbox", Some(2)).len(), 2);
}

#[test]
fn list_all_returns_windows_then_tabs() {
    let h = harness(Config::default());

    let kinds: Vec<ItemKind> = h.service.list_all().iter().map(|item| item.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ItemKind::Window,
            ItemKind::Window,
            ItemKind::Window,
            ItemKind::Tab,
            ItemKind::Tab
        ]
    );
}

#[test]
fn activating_a_tab_raises_the_browser_window() {
    let h = harness(Config::default());

    assert!(h.service.activate(ItemKind::Tab, "tab-8"));
    assert_eq!(*h.control.activated_windows.lock().unwrap(), vec!["0x2"]);
    assert_eq!(*h.control.activated_tabs.lock().unwrap(), vec!["8"]);
}

#[test]
fn closing_a_tab_refreshes_inventory() {
    let h = harness(Config::default());
    h.service.search("rust");
    assert_eq!(h.windows.calls(), 1);

    assert!(h.service.close_tab("tab-8"));
    assert_eq!(*h.control.closed_tabs.lock().unwrap(), vec!["8"]);
    assert_eq!(h.windows.calls(), 2);
}

#[test]
fn force_refresh_reports_timestamp() {
    let h = harness(Config::default());
    h.clock.set(42_000);

    let outcome = h.service.force_refresh();
    assert!(outcome.success);
    assert_eq!(outcome.timestamp_ms, 42_000);
    assert_eq!(outcome.error, None);
    assert_eq!(h.service.cache().current().captured_at_ms, Some(42_000));
}

#[test]
fn handle_command_routes_each_request() {
    let h = harness(Config::default());

    let search = h
        .service
        .handle_command(CoreRequest::Search(SearchRequest {
            query: "terminal".into(),
            limit: None,
        }))
        .unwrap();
    match search {
        CoreResponse::Search(response) => {
            assert_eq!(response.results.len(), 1);
            assert_eq!(response.results[0].id, "0x3");
            assert_eq!(response.results[0].subtitle, "Terminal - PID: 100");
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let activate = h
        .service
        .handle_command(CoreRequest::Activate(ActivateRequest {
            kind: ItemKind::Window,
            id: " 0x3 ".into(),
        }))
        .unwrap();
    assert!(matches!(activate, CoreResponse::Activate(r) if r.activated));
    assert_eq!(*h.control.activated_windows.lock().unwrap(), vec!["0x3"]);

    let list = h.service.handle_command(CoreRequest::ListAll).unwrap();
    assert!(matches!(list, CoreResponse::ListAll(r) if r.results.len() == 5));

    let refresh = h.service.handle_command(CoreRequest::Refresh).unwrap();
    assert!(matches!(refresh, CoreResponse::Refresh(r) if r.success));
}

#[test]
fn empty_ids_are_invalid_requests() {
    let h = harness(Config::default());

    let activate = h.service.handle_command(CoreRequest::Activate(ActivateRequest {
        kind: ItemKind::Tab,
        id: "   ".into(),
    }));
    assert!(matches!(activate, Err(ServiceError::InvalidRequest(_))));

    let close = h
        .service
        .handle_command(CoreRequest::CloseTab(CloseTabRequest { id: String::new() }));
    assert!(matches!(close, Err(ServiceError::InvalidRequest(_))));
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = Config {
        staleness_ms: 0,
        ..Default::default()
    };
    let cache = InventoryCache::new(
        Arc::new(FailingProvider::new("windows", "none")),
        Arc::new(FailingProvider::new("tabs", "none")),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let control = Arc::new(RecordingControl::default());
    let dispatcher = ActivationDispatcher::new(control.clone(), control, "chrome");

    assert!(matches!(
        CoreService::with_parts(cfg.clone(), cache, dispatcher),
        Err(ServiceError::Config(_))
    ));
    assert!(matches!(CoreService::new(cfg), Err(ServiceError::Config(_))));
}
