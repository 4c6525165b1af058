//! End-to-end crawl scenarios over a mock HTTP server.

use tempfile::TempDir;
use weblands_config::Config;
use weblands_crawler::{CrawlOptions, Engine};
use weblands_store::Store;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An article long enough for the readability stage, carrying exactly the
/// given extra markup inside the main content.
fn article(title: &str, lang: &str, body: &str) -> String {
    format!(
        "<html lang=\"{lang}\"><head><title>{title}</title></head><body>\
         <article><h1>{title}</h1>{body}</article></body></html>"
    )
}

fn filler() -> &'static str {
    "Les animaux domestiques occupent une place grandissante dans les foyers \
     et la presse spécialisée leur consacre de longues enquêtes documentées, \
     riches en témoignages et en données vérifiables."
}

struct Fixture {
    engine: Engine,
    _data_dir: TempDir,
}

fn engine_with(archive_endpoint: &str) -> Fixture {
    let data_dir = TempDir::new().expect("tempdir");
    let config = Config {
        data_location: data_dir.path().to_path_buf(),
        ..Config::default()
    };
    let store = Store::open_in_memory().expect("store");
    let engine = Engine::with_store(config, store)
        .expect("engine")
        .with_archive_endpoint(archive_endpoint.to_string());
    Fixture {
        engine,
        _data_dir: data_dir,
    }
}

/// Unreachable archival endpoint: the ladder's last stage stays silent.
const NO_ARCHIVE: &str = "http://127.0.0.1:1/wayback/available";

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn basic_approve_and_link() {
    let server = MockServer::start().await;
    let body = format!(
        "<p>{filler} Le chat dort, le chat jouait et le chat mange, pendant que \
         le chien aboie et que le chien surveille la maison. Voir aussi \
         <a href=\"https://b.test/page\">la suite du dossier consacré aux animaux</a>.</p>\
         <p><img src=\"/img/photo.jpg\" alt=\"photo\"> {filler}</p>",
        filler = filler()
    );
    mount_html(&server, "/", article("Chat et chien", "fr", &body)).await;

    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine
        .create_land("animaux", "corpus animalier", &["fr".into()])
        .expect("land");
    engine
        .add_terms("animaux", &["chat".into(), "chien".into()])
        .expect("terms");
    let seed = format!("{}/", server.uri());
    assert_eq!(engine.add_urls("animaux", &[seed.clone()]).expect("urls"), 1);

    let stats = engine
        .crawl("animaux", CrawlOptions { limit: 1, ..CrawlOptions::default() })
        .await
        .expect("crawl");
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);

    let expression = engine
        .store()
        .expression_by_url(land.id, &seed)
        .expect("query")
        .expect("expression");
    assert_eq!(expression.http_status.as_deref(), Some("200"));
    assert!(expression.fetched_at.is_some());
    assert!(expression.readable.is_some());
    assert!(expression.relevance.unwrap_or(0) > 0);
    assert!(expression.approved_at.is_some());
    assert_eq!(expression.title.as_deref(), Some("Chat et chien"));

    // One child expression at depth 1 plus the edge to it.
    let child = engine
        .store()
        .expression_by_url(land.id, "https://b.test/page")
        .expect("query")
        .expect("child");
    assert_eq!(child.depth, 1);
    assert!(child.fetched_at.is_none());
    let links = engine.store().links_from(expression.id).expect("links");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_id, child.id);

    // The in-content image was recorded as media.
    let media = engine
        .store()
        .media_for_expression(expression.id)
        .expect("media");
    assert!(media.iter().any(|item| item.url.ends_with("/img/photo.jpg")));
}

#[tokio::test]
async fn depth_cap_stops_spawning() {
    let server = MockServer::start().await;
    let body = format!(
        "<p>{} Le chat observe <a href=\"https://b.test/too-deep\">un lien sortant \
         qui ne doit produire aucun enfant</a>.</p>",
        filler()
    );
    mount_html(&server, "/deep", article("Chat", "fr", &body)).await;

    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &["fr".into()]).expect("land");
    engine.add_terms("l", &["chat".into()]).expect("terms");

    // Seed the expression directly at the depth cap.
    let url = format!("{}/deep", server.uri());
    let domain = engine.store().get_or_create_domain("server.test").expect("domain");
    engine
        .store()
        .get_or_create_expression(land.id, domain.id, &url, 3)
        .expect("expression");

    engine
        .crawl("l", CrawlOptions::default())
        .await
        .expect("crawl");

    let expression = engine
        .store()
        .expression_by_url(land.id, &url)
        .expect("query")
        .expect("expression");
    assert!(expression.is_approved());
    // Approved at depth 3: fetched, scored, but no spawning.
    assert!(engine
        .store()
        .expression_by_url(land.id, "https://b.test/too-deep")
        .expect("query")
        .is_none());
    assert!(engine.store().links_from(expression.id).expect("links").is_empty());
}

#[tokio::test]
async fn fragment_stripping_dedupes_seeds() {
    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &[]).expect("land");

    let added = engine
        .add_urls(
            "l",
            &["https://a.test/x#section".into(), "https://a.test/x".into()],
        )
        .expect("urls");
    assert_eq!(added, 1);
    assert!(engine
        .store()
        .expression_by_url(land.id, "https://a.test/x")
        .expect("query")
        .is_some());
}

#[tokio::test]
async fn transport_failure_is_recorded_and_counted() {
    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &[]).expect("land");
    // Connection refused: nothing listens on port 1.
    engine
        .add_urls("l", &["http://127.0.0.1:1/".into()])
        .expect("urls");

    let stats = engine
        .crawl("l", CrawlOptions::default())
        .await
        .expect("crawl");
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 1);

    let expression = engine
        .store()
        .expression_by_url(land.id, "http://127.0.0.1:1/")
        .expect("query")
        .expect("expression");
    assert_eq!(expression.http_status.as_deref(), Some("000"));
    assert!(expression.fetched_at.is_some());
    assert!(expression.readable.is_none());
    assert_eq!(expression.relevance.unwrap_or(0), 0);
    assert!(expression.approved_at.is_none());
}

#[tokio::test]
async fn archival_fallback_preserves_direct_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let snapshot_url = format!("{}/snapshot", server.uri());
    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"archived_snapshots":{{"closest":{{"available":true,
                "url":"{snapshot_url}","status":"200"}}}}}}"#
        )))
        .mount(&server)
        .await;
    let body = format!(
        "<p>{} Le chat du voisin et le chien du facteur reviennent dans chaque \
         paragraphe de cette page archivée.</p>",
        filler()
    );
    mount_html(&server, "/snapshot", article("Archives", "fr", &body)).await;

    let fixture = engine_with(&format!("{}/wayback/available", server.uri()));
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &["fr".into()]).expect("land");
    engine
        .add_terms("l", &["chat".into(), "chien".into()])
        .expect("terms");
    let url = format!("{}/gone", server.uri());
    engine.add_urls("l", &[url.clone()]).expect("urls");

    engine
        .crawl("l", CrawlOptions { limit: 1, ..CrawlOptions::default() })
        .await
        .expect("crawl");

    let expression = engine
        .store()
        .expression_by_url(land.id, &url)
        .expect("query")
        .expect("expression");
    // Direct status survives archival recovery.
    assert_eq!(expression.http_status.as_deref(), Some("404"));
    assert!(expression.readable.is_some());
    assert!(expression.relevance.unwrap_or(0) > 0);
    assert!(expression.approved_at.is_some());
}

#[tokio::test]
async fn language_gate_blocks_foreign_pages() {
    let server = MockServer::start().await;
    let body = format!(
        "<p>{} Le chat revient ici, le chat encore, et le chien aussi, avec \
         <a href=\"https://b.test/ignored\">un lien qui ne doit pas être suivi</a>.</p>",
        filler()
    );
    mount_html(&server, "/en", article("Chat et chien", "en", &body)).await;

    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &["fr".into()]).expect("land");
    engine
        .add_terms("l", &["chat".into(), "chien".into()])
        .expect("terms");
    let url = format!("{}/en", server.uri());
    engine.add_urls("l", &[url.clone()]).expect("urls");

    engine
        .crawl("l", CrawlOptions::default())
        .await
        .expect("crawl");

    let expression = engine
        .store()
        .expression_by_url(land.id, &url)
        .expect("query")
        .expect("expression");
    assert_eq!(expression.lang.as_deref(), Some("en"));
    assert_eq!(expression.relevance, Some(0));
    assert!(expression.approved_at.is_none());
    assert!(engine.store().links_from(expression.id).expect("links").is_empty());
    assert!(engine
        .store()
        .expression_by_url(land.id, "https://b.test/ignored")
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn consolidation_is_idempotent() {
    let server = MockServer::start().await;
    let body = format!(
        "<p>{} Le chat et le chien, toujours eux, accompagnés de \
         <a href=\"https://b.test/annexe\">l'annexe du dossier</a> et d'une \
         illustration <img src=\"/img/fig.png\" alt=\"figure\">.</p>",
        filler()
    );
    mount_html(&server, "/", article("Chat et chien", "fr", &body)).await;

    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &["fr".into()]).expect("land");
    engine
        .add_terms("l", &["chat".into(), "chien".into()])
        .expect("terms");
    let seed = format!("{}/", server.uri());
    engine.add_urls("l", &[seed.clone()]).expect("urls");
    engine
        .crawl("l", CrawlOptions { limit: 1, ..CrawlOptions::default() })
        .await
        .expect("crawl");

    let expression = engine
        .store()
        .expression_by_url(land.id, &seed)
        .expect("query")
        .expect("expression");

    engine.consolidate("l", 0, None).await.expect("first");
    let links_first = engine.store().links_from(expression.id).expect("links");
    let media_first: Vec<String> = engine
        .store()
        .media_for_expression(expression.id)
        .expect("media")
        .into_iter()
        .map(|media| media.url)
        .collect();

    engine.consolidate("l", 0, None).await.expect("second");
    let links_second = engine.store().links_from(expression.id).expect("links");
    let media_second: Vec<String> = engine
        .store()
        .media_for_expression(expression.id)
        .expect("media")
        .into_iter()
        .map(|media| media.url)
        .collect();

    assert_eq!(links_first, links_second);
    assert_eq!(media_first, media_second);
    // Consolidation never alters depths.
    let after = engine
        .store()
        .expression_by_id(expression.id)
        .expect("expression");
    assert_eq!(after.depth, expression.depth);
}

#[tokio::test]
async fn relevance_formula_weighs_title_ten_to_one() {
    let fixture = engine_with(NO_ARCHIVE);
    let engine = &fixture.engine;
    let land = engine.create_land("l", "", &["fr".into()]).expect("land");
    let domain = engine.store().get_or_create_domain("a.test").expect("domain");
    let mut expression = engine
        .store()
        .get_or_create_expression(land.id, domain.id, "https://a.test/", 0)
        .expect("expression");
    expression.title = Some("chat et chien".into());
    expression.readable = Some("chat chat chat chien chien".into());
    expression.fetched_at = Some(chrono::Utc::now());
    engine.store().save_expression(&expression).expect("save");

    // add_terms triggers the recompute over stored readable text.
    engine
        .add_terms("l", &["chat".into(), "chien".into()])
        .expect("terms");

    let scored = engine
        .store()
        .expression_by_id(expression.id)
        .expect("expression");
    // 10·(1+1) in the title plus 1·(3+2) in the body.
    assert_eq!(scored.relevance, Some(25));
    assert!(scored.approved_at.is_some());
}
