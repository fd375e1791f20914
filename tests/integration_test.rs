/// Integration tests for flathub-search
/// These run the search pipeline against the in-memory mocks, plus the binary
/// for the paths that never touch the network.
///
/// Run with: `cargo test --test integration_test`
use flathub_search_lib::commands::search::run_search;
use flathub_search_lib::config::Preferences;
use flathub_search_lib::icon_cache::IconCache;
use flathub_search_lib::mocks::{
    MockCatalogHttp, MockIconFetcher, MockIconLookup, MockPackageManager,
};
use flathub_search_lib::models::{ItemAction, ResultLimit};
use flathub_search_lib::worker_pool::WorkerPool;
use flathub_search_lib::{Collaborators, Services};
use serde_json::json;
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn catalog_of(n: usize) -> serde_json::Value {
    let apps: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "flatpakAppId": format!("org.example.App{}", i),
                "name": format!("App {}", i),
                "iconDesktopUrl": format!("https://dl.flathub.org/icons/app{}.png", i)
            })
        })
        .collect();
    serde_json::Value::Array(apps)
}

fn services(
    pool: &WorkerPool,
    cache: &std::path::Path,
    http: &MockCatalogHttp,
    fetcher: &MockIconFetcher,
) -> Services {
    let prefs = Preferences {
        icon_cache_dir: Some(cache.to_path_buf()),
        ..Preferences::default()
    };
    let deps = Collaborators {
        catalog: Arc::new(http.clone()),
        icon_fetcher: Arc::new(fetcher.clone()),
        packages: Arc::new(MockPackageManager::new()),
        icons: Arc::new(MockIconLookup::new()),
    };
    Services::new(&prefs, pool.handle(), deps)
}

#[test]
fn test_result_count_never_exceeds_limit() {
    let pool = WorkerPool::new(4).expect("pool");
    let cache = tempfile::tempdir().unwrap();
    let http = MockCatalogHttp::new();
    http.mock_json(catalog_of(30));
    let s = services(&pool, cache.path(), &http, &MockIconFetcher::new());

    for (text, expected) in [("3", 3), ("6", 6), ("1", 2), ("100", 20), ("abc", 6)] {
        let items = pool.block_on(run_search(
            &s.catalog,
            &s.pipeline,
            &s.presenter,
            "app",
            ResultLimit::parse(text),
        ));
        assert_eq!(items.len(), expected, "limit {:?}", text);
    }
    pool.shutdown();
}

#[test]
fn test_cached_icons_show_up_on_next_search() {
    let pool = WorkerPool::new(4).expect("pool");
    let cache = tempfile::tempdir().unwrap();
    let http = MockCatalogHttp::new();
    http.mock_json(catalog_of(1));
    let fetcher = MockIconFetcher::new();
    let url = "https://dl.flathub.org/icons/app0.png";
    fetcher.mock_response(url, vec![0x89, b'P', b'N', b'G']);
    // Slower than the join deadline: the first search falls back.
    fetcher.mock_delay(url, Duration::from_millis(300));
    let s = services(&pool, cache.path(), &http, &fetcher);

    let first = pool.block_on(run_search(
        &s.catalog,
        &s.pipeline,
        &s.presenter,
        "app",
        ResultLimit::default(),
    ));
    assert_eq!(first[0].icon, "images/icon.png");

    std::thread::sleep(Duration::from_millis(600));
    let second = pool.block_on(run_search(
        &s.catalog,
        &s.pipeline,
        &s.presenter,
        "app",
        ResultLimit::default(),
    ));
    let expected = IconCache::new(cache.path(), Arc::new(fetcher.clone())).path_for(url);
    assert_eq!(second[0].icon, expected.to_string_lossy());
    assert_eq!(fetcher.call_count(url), 1);
    pool.shutdown();
}

#[test]
fn test_slow_icons_cost_one_deadline() {
    let pool = WorkerPool::new(6).expect("pool");
    let cache = tempfile::tempdir().unwrap();
    let http = MockCatalogHttp::new();
    http.mock_json(catalog_of(6));
    let fetcher = MockIconFetcher::new();
    for i in 0..6 {
        let url = format!("https://dl.flathub.org/icons/app{}.png", i);
        fetcher.mock_response(&url, vec![1, 2, 3]);
        fetcher.mock_delay(&url, Duration::from_secs(2));
    }
    let s = services(&pool, cache.path(), &http, &fetcher);

    let start = Instant::now();
    let items = pool.block_on(run_search(
        &s.catalog,
        &s.pipeline,
        &s.presenter,
        "app",
        ResultLimit::default(),
    ));
    assert_eq!(items.len(), 6);
    assert!(items.iter().all(|i| i.icon == "images/icon.png"));
    assert!(start.elapsed() < Duration::from_millis(1000));
    pool.shutdown();
}

#[test]
fn test_malformed_records_are_skipped() {
    let pool = WorkerPool::new(2).expect("pool");
    let cache = tempfile::tempdir().unwrap();
    let http = MockCatalogHttp::new();
    http.mock_json(json!([
        {"flatpakAppId": "org.gimp.GIMP", "name": "GIMP", "iconDesktopUrl": "https://x/gimp.png"},
        {"flatpakAppId": "org.broken.App", "name": "Broken"},
        {"flatpakAppId": "org.inkscape.Inkscape", "name": "Inkscape", "iconDesktopUrl": "https://x/ink.png"}
    ]));
    let s = services(&pool, cache.path(), &http, &MockIconFetcher::new());

    let items = pool.block_on(run_search(
        &s.catalog,
        &s.pipeline,
        &s.presenter,
        "draw",
        ResultLimit::default(),
    ));
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["GIMP", "Inkscape"]);
    assert!(matches!(items[0].on_enter, ItemAction::RenderResultList(_)));
    pool.shutdown();
}

#[test]
fn test_binary_prints_hint_for_short_query() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_flathub-search"))
        .arg("--config")
        .arg(dir.path().join("missing.json"))
        .args(["search", "f"])
        .output()
        .expect("Should run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("Should print one JSON line");
    assert_eq!(value["event"], 0);
    assert_eq!(
        value["items"][0]["name"],
        "Enter at least 2 characters to search"
    );
}

#[test]
fn test_binary_rejects_unknown_subcommand() {
    let output = Command::new(env!("CARGO_BIN_EXE_flathub-search"))
        .arg("frobnicate")
        .output()
        .expect("Should run binary");
    assert!(!output.status.success());
}
