use std::rc::Rc;

use cachegate::cleaner::{steps, StepOutcome};
use cachegate::common::config::ClearerConfig;
use cachegate::env::{CookieJar, PageLocation, Rect};
use cachegate::env::AppCacheStatus;
use cachegate::memory::{
    Cookie, Element, ManualClock, MemoryAppCache, MemoryCacheStorage, MemoryCapabilities,
    MemoryPage, MemoryWorkers,
};

const STAMP: i64 = 1_700_000_000_000;

fn page_at(host: &str, path: &str) -> MemoryPage {
    MemoryPage::new(PageLocation::new(host, path)).with_clock(Rc::new(ManualClock::new(STAMP)))
}

fn attr(page: &MemoryPage, index: usize, name: &str) -> Option<String> {
    page.document.elements()[index].attributes.get(name).cloned()
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cookies_expired_at_every_reachable_scope() {
    let page = page_at("a.b.example.com", "/app/index.html");
    page.cookies.insert(Cookie::host("host_only", "1", "a.b.example.com"));
    page.cookies.insert(Cookie::domain("parent", "1", ".b.example.com"));
    page.cookies.insert(Cookie::domain("apex", "1", "example.com"));
    page.cookies.insert(Cookie::domain("self_domain", "1", "a.b.example.com"));
    page.cookies.insert(Cookie::host("scoped", "1", "a.b.example.com").at_path("/app"));
    assert_eq!(page.cookies.read_all().unwrap().split("; ").count(), 5);

    let outcome = steps::purge_cookies(&page.env()).await;

    assert_eq!(outcome, StepOutcome::done(5));
    assert_eq!(page.cookies.read_all().unwrap(), "");
    assert!(page.cookies.all().is_empty());
}

#[tokio::test]
async fn test_http_only_and_foreign_cookies_survive() {
    let page = page_at("www.example.com", "/");
    page.cookies.insert(Cookie::host("session", "s", "www.example.com").http_only());
    page.cookies.insert(Cookie::domain("tracker", "t", "ads.other.org"));
    page.cookies.insert(Cookie::host("theme", "dark", "www.example.com"));

    steps::purge_cookies(&page.env()).await;

    let left: Vec<String> = page.cookies.all().into_iter().map(|c| c.name).collect();
    assert_eq!(left, vec!["session", "tracker"]);
    assert_eq!(page.cookies.read_all().unwrap(), "");
}

#[tokio::test]
async fn test_ip_host_cookies_cleared_without_domain_walk() {
    let page = page_at("127.0.0.1", "/");
    page.cookies.insert(Cookie::host("dev", "1", "127.0.0.1"));

    assert_eq!(steps::purge_cookies(&page.env()).await, StepOutcome::done(1));
    assert_eq!(page.cookies.read_all().unwrap(), "");
}

#[tokio::test]
async fn test_nameless_cookie_is_expired() {
    let page = page_at("www.example.com", "/");
    page.cookies.insert(Cookie::host("", "flag", "www.example.com"));
    page.cookies.insert(Cookie::host("sid", "1", "www.example.com"));
    assert_eq!(page.cookies.read_all().unwrap(), "flag; sid=1");

    let outcome = steps::purge_cookies(&page.env()).await;

    assert_eq!(outcome, StepOutcome::done(2));
    assert_eq!(page.cookies.read_all().unwrap(), "");
    assert!(page.cookies.all().is_empty());
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_durable_sweep_keeps_marker() {
    let page = page_at("example.com", "/");
    page.durable.insert("marker", "V1");
    page.durable.insert("a", "1");
    page.durable.insert("b", "2");

    let outcome = steps::sweep_durable(&page.env(), "marker").await;

    assert_eq!(outcome, StepOutcome::done(2));
    assert_eq!(page.durable.len(), 1);
    assert_eq!(page.durable.value("marker").as_deref(), Some("V1"));
}

#[tokio::test]
async fn test_durable_sweep_reports_failure() {
    let page = page_at("example.com", "/");
    page.durable.insert("a", "1");
    page.durable.fail("remove");

    let outcome = steps::sweep_durable(&page.env(), "marker").await;
    assert!(outcome.is_failure());
}

// ─── Workers and caches ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_worker_failure_does_not_block_others() {
    let caps = MemoryCapabilities {
        workers: Some(MemoryWorkers::new(["/", "/a/", "/b/"])),
        ..Default::default()
    };
    let page = MemoryPage::with_capabilities(PageLocation::new("example.com", "/"), caps);
    page.capabilities.workers.as_ref().unwrap().fail_scope("/a/");

    let outcome = steps::unregister_workers(&page.env()).await;

    match outcome {
        StepOutcome::Failed { reason } => assert!(reason.contains("1 of 3")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(page.capabilities.workers.as_ref().unwrap().scopes(), vec!["/a/"]);
}

#[tokio::test]
async fn test_cache_storage_purged() {
    let caps = MemoryCapabilities {
        cache_storage: Some(MemoryCacheStorage::new(["v1", "v2", "images"])),
        ..Default::default()
    };
    let page = MemoryPage::with_capabilities(PageLocation::new("example.com", "/"), caps);

    assert_eq!(steps::purge_cache_storage(&page.env()).await, StepOutcome::done(3));
    assert!(page.capabilities.cache_storage.as_ref().unwrap().names().is_empty());
}

#[tokio::test]
async fn test_unsupported_capabilities() {
    let page = page_at("example.com", "/");
    let env = page.env();
    assert_eq!(steps::retire_app_cache(&env).await, StepOutcome::Unsupported);
    assert_eq!(steps::unregister_workers(&env).await, StepOutcome::Unsupported);
    assert_eq!(steps::purge_cache_storage(&env).await, StepOutcome::Unsupported);
}

#[tokio::test]
async fn test_app_cache_without_manifest_is_left_alone() {
    for status in [AppCacheStatus::Uncached, AppCacheStatus::Obsolete] {
        let caps = MemoryCapabilities {
            app_cache: Some(MemoryAppCache::new(status)),
            ..Default::default()
        };
        let page = MemoryPage::with_capabilities(PageLocation::new("example.com", "/"), caps);
        let app_cache = page.capabilities.app_cache.as_ref().unwrap();
        // update() would fail if it were reached
        app_cache.fail_update();

        assert_eq!(steps::retire_app_cache(&page.env()).await, StepOutcome::done(0));
        assert_eq!(app_cache.current_status(), status);
    }
}

// ─── Cache busting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stylesheet_replaced_after_load() {
    let page = page_at("example.com", "/");
    page.document.append(Element::stylesheet("/app.css?v=3"));

    let outcome = steps::bust_assets(&page.env(), &ClearerConfig::new("V1")).await;

    assert_eq!(outcome, StepOutcome::done(1));
    assert_eq!(page.document.elements().len(), 1);
    assert_eq!(
        attr(&page, 0, "href").as_deref(),
        Some(format!("/app.css?v=3&_cb={}", STAMP).as_str())
    );
}

#[tokio::test]
async fn test_broken_stylesheet_keeps_original() {
    let page = page_at("example.com", "/");
    page.document.append(Element::stylesheet("/gone.css"));
    page.document.break_url("/gone.css");

    let outcome = steps::bust_assets(&page.env(), &ClearerConfig::new("V1")).await;

    assert!(outcome.is_failure());
    assert_eq!(page.document.elements().len(), 1);
    assert_eq!(attr(&page, 0, "href").as_deref(), Some("/gone.css"));
}

#[tokio::test]
async fn test_scripts_skip_self_and_opted_out() {
    let page = page_at("example.com", "/");
    page.document.append(Element::script("/js/cachegate.min.js"));
    page.document
        .append(Element::script("/js/vendor.js").attr("data-no-cache-bust", ""));
    page.document.append(Element::script("/js/app.js"));
    page.document.append(Element::new("script"));

    let outcome = steps::bust_assets(&page.env(), &ClearerConfig::new("V1")).await;

    assert_eq!(outcome, StepOutcome::done(1));
    assert_eq!(attr(&page, 0, "src").as_deref(), Some("/js/cachegate.min.js"));
    assert_eq!(attr(&page, 1, "src").as_deref(), Some("/js/vendor.js"));
    assert_eq!(
        attr(&page, 2, "src"),
        Some(format!("/js/app.js?_cb={}", STAMP))
    );
}

#[tokio::test]
async fn test_only_visible_images_busted() {
    let page = page_at("example.com", "/");
    let on_screen = Rect { top: 10.0, left: 10.0, width: 100.0, height: 100.0 };
    let below_fold = Rect { top: 5000.0, left: 10.0, width: 100.0, height: 100.0 };
    page.document.append(Element::image("/hero.jpg", on_screen));
    page.document.append(Element::image("/footer.jpg", below_fold));
    page.document
        .append(Element::image("data:image/gif;base64,R0lGOD", on_screen));

    let outcome = steps::bust_assets(&page.env(), &ClearerConfig::new("V1")).await;

    assert_eq!(outcome, StepOutcome::done(1));
    assert_eq!(attr(&page, 0, "src"), Some(format!("/hero.jpg?_cb={}", STAMP)));
    assert_eq!(attr(&page, 1, "src").as_deref(), Some("/footer.jpg"));
    assert_eq!(
        attr(&page, 2, "src").as_deref(),
        Some("data:image/gif;base64,R0lGOD")
    );
}

#[tokio::test]
async fn test_failed_rewrite_leaves_no_copies() {
    let page = page_at("example.com", "/");
    page.document.append(Element::stylesheet("/app.css"));
    page.document.append(Element::script("/js/app.js"));
    page.document.fail("setAttribute");

    let outcome = steps::bust_assets(&page.env(), &ClearerConfig::new("V1")).await;

    match outcome {
        StepOutcome::Failed { reason } => assert!(reason.contains("2 of 2")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(page.document.elements().len(), 2);
    assert_eq!(attr(&page, 0, "href").as_deref(), Some("/app.css"));
    assert_eq!(attr(&page, 1, "src").as_deref(), Some("/js/app.js"));
}
