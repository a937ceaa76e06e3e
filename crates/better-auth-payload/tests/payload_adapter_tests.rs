//! Payload adapter integration tests.
//!
//! Covers: schema reconciliation against renamed collections, the full
//! user/session lifecycle through `MemoryPayload`, relationship unwrapping,
//! typed model deserialization and plugin options feeding `init`.

use std::sync::Arc;

use better_auth_core::db::adapter::{Adapter, FindManyQuery, SortBy, WhereClause};
use better_auth_core::{AuthLogger, AuthSchema, BetterAuthError, LogLevel, MemoryLogHandler, Session, User};
use better_auth_payload::*;
use serde_json::{json, Value};

// ── Fixtures ────────────────────────────────────────────────────

/// The collection Payload would build for `model`, with some fields renamed.
fn collection_for(
    schema: &AuthSchema,
    model: &str,
    slug: &str,
    renames: &[(&str, &str)],
) -> CollectionConfig {
    let table = schema.get(model).expect("model in schema");
    let mut keys: Vec<&String> = table.fields.keys().collect();
    keys.sort();

    let mut collection = CollectionConfig::new(slug).with_model_key(model);
    for key in keys {
        let name = renames
            .iter()
            .find(|(k, _)| *k == key.as_str())
            .map(|(_, name)| *name)
            .unwrap_or(key.as_str());
        let field = match &table.fields[key].references {
            Some(reference) => CollectionField::relationship(name, &reference.model),
            None => CollectionField::new(name, "text"),
        };
        collection = collection.field(field.with_field_key(key));
    }
    collection
}

fn renamed_collections() -> Vec<CollectionConfig> {
    let schema = AuthSchema::core_schema();
    vec![
        collection_for(&schema, "user", "members", &[("email", "mail")]),
        collection_for(&schema, "session", "auth-sessions", &[("userId", "owner")]),
        collection_for(&schema, "account", "accounts", &[("userId", "user")]),
        collection_for(&schema, "verification", "verifications", &[]),
    ]
}

fn capture(level: LogLevel) -> (AuthLogger, Arc<MemoryLogHandler>) {
    let handler = Arc::new(MemoryLogHandler::new());
    (AuthLogger::with_handler(level, handler.clone()), handler)
}

fn init(payload: &MemoryPayload, collections: &[CollectionConfig]) -> PayloadAdapter {
    PayloadAdapter::init(
        AuthSchema::core_schema(),
        collections,
        Arc::new(payload.clone()),
        PayloadAdapterConfig {
            logger: AuthLogger::silent(),
            ..Default::default()
        },
    )
}

async fn create_user(adapter: &PayloadAdapter, email: &str) -> User {
    let created = adapter
        .create(
            "user",
            json!({ "name": "Ada", "email": email, "emailVerified": false }),
            None,
        )
        .await
        .unwrap();
    serde_json::from_value(created).unwrap()
}

async fn create_session(adapter: &PayloadAdapter, user_id: &str, token: &str, expires: &str) -> Value {
    adapter
        .create(
            "session",
            json!({ "userId": user_id, "token": token, "expiresAt": expires }),
            None,
        )
        .await
        .unwrap()
}

// ── Initialization ──────────────────────────────────────────────

#[test]
fn init_reconciles_renamed_collections() {
    let (logger, handler) = capture(LogLevel::Warn);
    let collections = renamed_collections();
    let adapter = PayloadAdapter::init(
        AuthSchema::core_schema(),
        &collections,
        Arc::new(MemoryPayload::from_collections(&collections)),
        PayloadAdapterConfig {
            logger,
            ..Default::default()
        },
    );

    let schema = adapter.schema();
    assert_eq!(schema.get("user").unwrap().model_name, "members");
    assert_eq!(schema.get("session").unwrap().model_name, "auth-sessions");
    assert_eq!(schema.field("user", "email").unwrap().field_name.as_deref(), Some("mail"));

    let owner = schema.field("session", "userId").unwrap();
    assert_eq!(owner.field_name.as_deref(), Some("owner"));
    assert_eq!(owner.references.as_ref().unwrap().model, "members");
    let account_user = schema.field("account", "userId").unwrap();
    assert_eq!(account_user.references.as_ref().unwrap().model, "members");

    assert!(handler.records().is_empty(), "unexpected logs: {:?}", handler.records());
}

#[test]
fn init_logs_missing_collections_and_keeps_defaults() {
    let (logger, handler) = capture(LogLevel::Error);
    let schema = AuthSchema::core_schema();
    let collections = vec![collection_for(&schema, "user", "members", &[])];
    let adapter = PayloadAdapter::init(
        schema,
        &collections,
        Arc::new(MemoryPayload::new()),
        PayloadAdapterConfig {
            logger,
            ..Default::default()
        },
    );

    assert_eq!(adapter.schema().get("session").unwrap().model_name, "session");
    let errors = handler.at_level(LogLevel::Error);
    for model in ["account", "session", "verification"] {
        assert!(
            errors.iter().any(|r| r.message.contains(&format!("model '{model}'"))),
            "no error for {model}"
        );
    }
}

#[test]
fn init_logs_tables_when_asked() {
    let (logger, handler) = capture(LogLevel::Info);
    let collections = renamed_collections();
    PayloadAdapter::init(
        AuthSchema::core_schema(),
        &collections,
        Arc::new(MemoryPayload::new()),
        PayloadAdapterConfig {
            log_tables: true,
            logger,
            ..Default::default()
        },
    );
    let info = handler.at_level(LogLevel::Info);
    assert!(info
        .iter()
        .any(|r| r.message == "Model 'user' -> collection 'members'"));
}

// ── Lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn user_is_stored_under_collection_names() {
    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let adapter = init(&payload, &collections);

    let user = create_user(&adapter, "ada@example.com").await;
    assert_eq!(user.email, "ada@example.com");
    assert!(!user.email_verified);

    let stored = payload.snapshot().await;
    let doc = &stored["members"][0];
    assert_eq!(doc["mail"], json!("ada@example.com"));
    assert!(doc.get("email").is_none());

    let found = adapter
        .find_one("user", &[WhereClause::eq("email", "ada@example.com")])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["id"], json!(user.id));
}

#[tokio::test]
async fn sessions_follow_their_user() {
    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let adapter = init(&payload, &collections);

    let user = create_user(&adapter, "ada@example.com").await;
    let other = create_user(&adapter, "bob@example.com").await;
    create_session(&adapter, &user.id, "t1", "2030-01-01T00:00:00.000Z").await;
    create_session(&adapter, &user.id, "t2", "2031-01-01T00:00:00.000Z").await;
    create_session(&adapter, &other.id, "t3", "2030-06-01T00:00:00.000Z").await;

    let stored = payload.snapshot().await;
    assert_eq!(stored["auth-sessions"][0]["owner"], json!(user.id));

    let sessions = adapter
        .find_many(
            "session",
            FindManyQuery {
                where_clauses: vec![WhereClause::eq("userId", user.id.as_str())],
                sort_by: Some(SortBy::desc("expiresAt")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let sessions: Vec<Session> = sessions
        .into_iter()
        .map(|s| serde_json::from_value(s).unwrap())
        .collect();
    let tokens: Vec<&str> = sessions.iter().map(|s| s.token.as_str()).collect();
    assert_eq!(tokens, vec!["t2", "t1"]);
    assert!(sessions.iter().all(|s| s.user_id == user.id));

    let updated = adapter
        .update(
            "session",
            &[WhereClause::eq("token", "t1")],
            json!({ "expiresAt": "2032-01-01T00:00:00.000Z" }),
        )
        .await
        .unwrap()
        .unwrap();
    let updated: Session = serde_json::from_value(updated).unwrap();
    assert_eq!(updated.expires_at.to_rfc3339(), "2032-01-01T00:00:00+00:00");

    let removed = adapter
        .delete_many("session", &[WhereClause::eq("userId", user.id.as_str())])
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(adapter.count("session", &[]).await.unwrap(), 1);
}

#[tokio::test]
async fn populated_relationships_are_reduced_to_ids() {
    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let adapter = init(&payload, &collections);

    payload
        .insert_raw(
            "auth-sessions",
            json!({
                "id": "s1",
                "token": "t1",
                "expiresAt": "2030-01-01 00:00:00",
                "owner": { "id": "u1", "mail": "ada@example.com" },
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            }),
        )
        .await;

    let found = adapter
        .find_one("session", &[WhereClause::eq("id", "s1")])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["userId"], json!("u1"));
    assert_eq!(found["owner"], json!("u1"));
    assert_eq!(found["expiresAt"], json!("2030-01-01T00:00:00.000Z"));

    let session: Session = serde_json::from_value(found).unwrap();
    assert_eq!(session.user_id, "u1");
}

#[tokio::test]
async fn where_with_populated_operand_uses_its_id() {
    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let adapter = init(&payload, &collections);

    let user = create_user(&adapter, "ada@example.com").await;
    create_session(&adapter, &user.id, "t1", "2030-01-01T00:00:00.000Z").await;

    let populated = serde_json::to_value(&user).unwrap();
    let count = adapter
        .count("session", &[WhereClause::eq("userId", populated)])
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unknown_collection_is_a_database_error() {
    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let adapter = init(&payload, &collections);

    let err = adapter
        .create("rateLimit", json!({ "key": "k", "count": 1 }), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BetterAuthError::Database(_)));
    assert!(err.to_string().contains("rateLimit"));
}

// ── Options ─────────────────────────────────────────────────────

#[tokio::test]
async fn options_drive_initialization() {
    let options = PayloadAuthOptions::from_fragments(
        &OptionFragments::new()
            .set("users.slug", "members")
            .set("sessions.slug", "auth-sessions")
            .set("debug.enableDebugLogs", true)
            .set("betterAuthOptions.emailAndPassword.enabled", true),
    )
    .unwrap();
    assert_eq!(options.better_auth_options["emailAndPassword"]["enabled"], json!(true));

    let schema = options.apply_slug_overrides(AuthSchema::core_schema());
    assert_eq!(schema.get("user").unwrap().model_name, "members");

    let collections = renamed_collections();
    let payload = MemoryPayload::from_collections(&collections);
    let mut config = options.adapter_config();
    config.logger = AuthLogger::silent();
    assert!(config.debug_logs);

    let adapter = PayloadAdapter::init(schema, &collections, Arc::new(payload.clone()), config);
    let user = create_user(&adapter, "ada@example.com").await;
    assert_eq!(payload.collection_len("members").await, 1);
    assert!(adapter
        .find_one("user", &[WhereClause::eq("id", user.id.as_str())])
        .await
        .unwrap()
        .is_some());
}
