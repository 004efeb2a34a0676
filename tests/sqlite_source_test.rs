mod helpers;

use chrono::Utc;
use sqlx::SqlitePool;
use switchboard::adapters::sqlite::{create_test_pool, SqliteAgentSource};
use switchboard::domain::errors::RegistryError;
use switchboard::domain::models::{AgentConfigFile, AgentKind};
use switchboard::domain::ports::DatabaseAgentSource;

use helpers::configs::config_yaml;

async fn test_source() -> (SqlitePool, SqliteAgentSource) {
    let pool = create_test_pool().await.expect("failed to create pool");
    let source = SqliteAgentSource::new(pool.clone());
    source.init_schema().await.expect("failed to create schema");
    (pool, source)
}

fn parse(yaml: &str) -> AgentConfigFile {
    AgentConfigFile::from_yaml(yaml).expect("fixture config should be valid")
}

#[tokio::test]
async fn test_init_schema_is_idempotent() {
    let (_pool, source) = test_source().await;
    source.init_schema().await.unwrap();
    source.init_schema().await.unwrap();
}

#[tokio::test]
async fn test_upsert_and_get() {
    let (_pool, source) = test_source().await;

    let config = parse(&config_yaml(
        "travel",
        &["flight-finder"],
        &[("flight", "flight-finder", 10)],
    ));
    source.upsert_config("org-a", &config).await.unwrap();

    let fetched = source
        .get_agent_by_name("org-a", "travel-agents")
        .await
        .unwrap()
        .expect("config should exist");

    assert_eq!(fetched.metadata.name, "travel-agents");
    assert_eq!(fetched.metadata.domain, "travel");
    assert_eq!(fetched.api_version, "switchboard.dev/v1");
    assert_eq!(fetched.spec.agents.len(), 1);
    assert_eq!(fetched.spec.agents[0].kind, AgentKind::LlmCall);
    assert_eq!(fetched.spec.routing.len(), 1);
    assert_eq!(fetched.spec.routing[0].priority, 10);
}

#[tokio::test]
async fn test_upsert_replaces_existing_row() {
    let (_pool, source) = test_source().await;

    source
        .upsert_config("org-a", &parse(&config_yaml("travel", &["old-agent"], &[])))
        .await
        .unwrap();
    source
        .upsert_config(
            "org-a",
            &parse(&config_yaml("travel", &["new-agent", "extra-agent"], &[])),
        )
        .await
        .unwrap();

    let all = source.list_active_agents("org-a").await.unwrap();
    assert_eq!(all.len(), 1, "same org and name must stay a single row");
    assert_eq!(all[0].spec.agents.len(), 2);
    assert_eq!(all[0].spec.agents[0].name, "new-agent");
}

#[tokio::test]
async fn test_upsert_rejects_invalid_config() {
    let (_pool, source) = test_source().await;

    let mut config = parse(&config_yaml("travel", &["flight-finder"], &[]));
    config.spec.agents.clear();

    let err = source.upsert_config("org-a", &config).await.unwrap_err();
    assert!(matches!(err, RegistryError::Validation(_)));

    // Nothing was written.
    assert!(source.list_active_agents("org-a").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_is_scoped_and_ordered_by_name() {
    let (_pool, source) = test_source().await;

    source
        .upsert_config("org-a", &parse(&config_yaml("zulu", &["z-agent"], &[])))
        .await
        .unwrap();
    source
        .upsert_config("org-a", &parse(&config_yaml("alpha", &["a-agent"], &[])))
        .await
        .unwrap();
    source
        .upsert_config("org-b", &parse(&config_yaml("other", &["o-agent"], &[])))
        .await
        .unwrap();

    let listed = source.list_active_agents("org-a").await.unwrap();
    let names: Vec<&str> = listed.iter().map(|c| c.metadata.name.as_str()).collect();
    assert_eq!(names, vec!["alpha-agents", "zulu-agents"]);
}

#[tokio::test]
async fn test_deactivated_rows_are_invisible() {
    let (_pool, source) = test_source().await;

    source
        .upsert_config("org-a", &parse(&config_yaml("travel", &["flight-finder"], &[])))
        .await
        .unwrap();
    source.deactivate("org-a", "travel-agents").await.unwrap();

    assert!(source.list_active_agents("org-a").await.unwrap().is_empty());
    assert!(source
        .get_agent_by_name("org-a", "travel-agents")
        .await
        .unwrap()
        .is_none());

    // Re-upserting the same name reactivates the row.
    source
        .upsert_config("org-a", &parse(&config_yaml("travel", &["flight-finder"], &[])))
        .await
        .unwrap();
    assert_eq!(source.list_active_agents("org-a").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deactivate_unknown_name_is_noop() {
    let (_pool, source) = test_source().await;
    source.deactivate("org-a", "no-such-config").await.unwrap();
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let (_pool, source) = test_source().await;
    let fetched = source.get_agent_by_name("org-a", "missing").await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_undecodable_row_skipped_in_list_but_error_in_get() {
    let (pool, source) = test_source().await;

    source
        .upsert_config("org-a", &parse(&config_yaml("travel", &["flight-finder"], &[])))
        .await
        .unwrap();

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO agent_configs
             (org_id, name, domain, description, api_version, spec,
              is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind("org-a")
    .bind("corrupt")
    .bind("corrupt")
    .bind("")
    .bind("switchboard.dev/v1")
    .bind("{ not json")
    .bind(&now)
    .bind(&now)
    .execute(&pool)
    .await
    .unwrap();

    // The batch read drops the bad row and keeps going.
    let listed = source.list_active_agents("org-a").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].metadata.domain, "travel");

    // A targeted read of the bad row surfaces the decode failure.
    let err = source.get_agent_by_name("org-a", "corrupt").await.unwrap_err();
    assert!(matches!(err, RegistryError::Database(_)));
}
