use sitegraph::commands::command_argument_builder;
use sitegraph::handlers::*;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[test]
fn test_parse_seed_with_scheme() {
    let result = parse_seed("https://example.com");
    assert_eq!(result, Some("https://example.com/".to_string()));
}

#[test]
fn test_parse_seed_without_scheme() {
    assert_eq!(parse_seed("example.com"), Some("http://example.com/".to_string()));
    assert_eq!(
        parse_seed("localhost:3000/docs"),
        Some("http://localhost:3000/docs".to_string())
    );
}

#[test]
fn test_parse_seed_invalid() {
    assert_eq!(parse_seed("not a valid url!!!"), None);
    assert_eq!(parse_seed("   "), None);
}

#[test]
fn test_resolve_output_path_plain() {
    let path = resolve_output_path("out/site_map.json").unwrap();
    assert_eq!(path, std::path::PathBuf::from("out/site_map.json"));
}

#[test]
fn test_resolve_output_path_expands_tilde() {
    let path = resolve_output_path("~/sitemap.json").unwrap();
    assert!(!path.to_string_lossy().starts_with('~'));
    assert!(path.ends_with("sitemap.json"));
}

#[test]
fn test_crawl_arguments_defaults() {
    let matches = command_argument_builder()
        .try_get_matches_from(["sitegraph", "crawl", "-u", "http://quotes.test"])
        .unwrap();
    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "crawl");

    let options = crawl_options_from_args(sub, false).unwrap();
    assert_eq!(options.seed, "http://quotes.test/");
    assert_eq!(options.workers, 10);
    assert_eq!(options.queue_capacity, 1000);
    assert_eq!(options.timeout_secs, 10);
    assert_eq!(options.pool_idle_per_host, 30);
    assert!(options.show_progress);
    assert_eq!(sub.get_one::<String>("output").unwrap(), "sitemap.json");
}

#[test]
fn test_crawl_arguments_overrides() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "sitegraph",
            "-q",
            "crawl",
            "--url",
            "https://quotes.test/start",
            "-t",
            "100",
            "--timeout",
            "3",
            "--queue-capacity",
            "50",
            "--pool-idle",
            "5",
        ])
        .unwrap();
    let quiet = matches.get_flag("quiet");
    let (_, sub) = matches.subcommand().unwrap();

    let options = crawl_options_from_args(sub, quiet).unwrap();
    assert_eq!(options.workers, 100);
    assert_eq!(options.timeout_secs, 3);
    assert_eq!(options.queue_capacity, 50);
    assert_eq!(options.pool_idle_per_host, 5);
    assert!(!options.show_progress);
}

#[test]
fn test_crawl_arguments_reject_zero_workers() {
    let matches = command_argument_builder()
        .try_get_matches_from(["sitegraph", "crawl", "-u", "http://quotes.test", "-t", "0"])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    let err = crawl_options_from_args(sub, false).unwrap_err();
    assert!(err.to_string().contains("--threads"));
}

#[test]
fn test_crawl_requires_url() {
    let result = command_argument_builder().try_get_matches_from(["sitegraph", "crawl"]);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_handle_crawl_writes_sitemap() -> Result<(), Box<dyn std::error::Error>> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/next">Next</a><a href="https://elsewhere.test/">Out</a>"#, "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("end"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new()?;
    let output = dir.path().join("site_map.json");
    let output_arg = output.to_string_lossy().to_string();
    let seed = mock_server.uri();

    let matches = command_argument_builder().try_get_matches_from([
        "sitegraph",
        "crawl",
        "-u",
        seed.as_str(),
        "-t",
        "4",
        "-o",
        output_arg.as_str(),
        "--no-progress",
    ])?;
    let (_, sub) = matches.subcommand().unwrap();

    handle_crawl(sub, true).await?;

    let sitemap: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(sitemap.len(), 1);
    assert_eq!(
        sitemap[&format!("{}/", seed)],
        vec![format!("{}/next", seed), "https://elsewhere.test/".to_string()]
    );

    Ok(())
}
