// Tests for crawl execution

use pathscout_core::crawl::{CrawlOptions, execute_crawl};
use pathscout_scanner::ScanOptions;
use std::future::pending;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn values(state: &pathscout_scanner::CrawlState, label: &str) -> Vec<String> {
    state
        .get(label)
        .unwrap_or_else(|| panic!("no entry for {}", label))
        .iter()
        .map(|m| m.value.clone())
        .collect()
}

// ============================================================================
// Completed Crawls
// ============================================================================

#[tokio::test]
async fn test_files_and_urls_are_both_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("local.js");
    std::fs::write(&file, r#"axios.get("/local/users")"#).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/remote.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/javascript")
                .set_body_bytes(br#"$.post("/remote/login")"#.as_slice()),
        )
        .mount(&server)
        .await;

    let url = format!("{}/remote.js", server.uri());
    let options = CrawlOptions {
        files: vec![file.clone()],
        urls: vec![url.clone()],
        ..CrawlOptions::default()
    };

    let state = execute_crawl(options, pending()).await.unwrap();

    assert!(!state.is_interrupted());
    assert_eq!(values(&state, &file.display().to_string()), vec![r#""/local/users""#]);
    assert_eq!(values(&state, &url), vec![r#""/remote/login""#]);
}

#[tokio::test]
async fn test_directory_input_with_recursion() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("js")).unwrap();
    std::fs::write(dir.path().join("js").join("deep.js"), "x = '/deep/path';").unwrap();
    std::fs::write(dir.path().join("top.js"), "y = '/top/path';").unwrap();

    let flat = CrawlOptions {
        files: vec![dir.path().to_path_buf()],
        ..CrawlOptions::default()
    };
    let state = execute_crawl(flat, pending()).await.unwrap();
    assert_eq!(state.entries().len(), 1);

    let recursive = CrawlOptions {
        files: vec![dir.path().to_path_buf()],
        recurse: true,
        ..CrawlOptions::default()
    };
    let state = execute_crawl(recursive, pending()).await.unwrap();
    assert_eq!(state.entries().len(), 2);
    assert_eq!(state.match_count(), 2);
}

#[tokio::test]
async fn test_scan_options_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("commented.js");
    std::fs::write(&file, "// fetch(\"/old/api\")\nfetch(\"/new/api\");").unwrap();

    let options = CrawlOptions {
        files: vec![file.clone()],
        scan: ScanOptions {
            color_context: false,
            scan_comments: false,
        },
        ..CrawlOptions::default()
    };
    let state = execute_crawl(options, pending()).await.unwrap();

    assert_eq!(values(&state, &file.display().to_string()), vec![r#""/new/api""#]);
}

#[tokio::test]
async fn test_progress_spinner_does_not_change_results() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.js");
    std::fs::write(&file, "go('/x/y');").unwrap();

    let options = CrawlOptions {
        files: vec![file],
        show_progress_bars: true,
        ..CrawlOptions::default()
    };
    let state = execute_crawl(options, pending()).await.unwrap();

    assert_eq!(state.match_count(), 1);
}

// ============================================================================
// Interruption
// ============================================================================

#[tokio::test]
async fn test_interrupt_keeps_completed_work() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("done.js");
    std::fs::write(&file, "go('/already/done');").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hang.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/javascript")
                .set_body_bytes(b"go('/never/seen')".as_slice())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/hang.js", server.uri());
    let options = CrawlOptions {
        files: vec![file.clone()],
        urls: vec![url.clone()],
        timeout_secs: 30,
        ..CrawlOptions::default()
    };

    let shutdown = tokio::time::sleep(Duration::from_millis(200));
    let state = execute_crawl(options, shutdown).await.unwrap();

    assert!(state.is_interrupted());
    assert_eq!(values(&state, &file.display().to_string()), vec!["'/already/done'"]);
    assert!(state.get(&url).is_none());
}

#[tokio::test]
async fn test_interrupt_during_file_batch() {
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..2_000)
        .map(|n| format!("fetch(\"/api/v{}/x\");\n", n))
        .collect();
    let total = 60;
    for n in 0..total {
        std::fs::write(dir.path().join(format!("bundle{:02}.js", n)), &body).unwrap();
    }

    let options = CrawlOptions {
        files: vec![dir.path().to_path_buf()],
        ..CrawlOptions::default()
    };
    let shutdown = tokio::time::sleep(Duration::from_millis(20));
    let state = execute_crawl(options, shutdown).await.unwrap();

    assert!(state.is_interrupted());
    assert!(state.entries().len() < total, "all {} files were scanned", total);
    assert!(state.entries().iter().all(|entry| entry.matches.len() == 2_000));
}
