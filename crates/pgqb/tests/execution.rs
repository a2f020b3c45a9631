mod common;

use common::{ScriptedExecutor, row};
use pgqb::{BuildError, CasedExecutor, QbConfig, QueryOutput, Value, table};
use serde_json::json;

#[tokio::test]
async fn plain_select_resolves_to_rows() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "id": 1 })), row(json!({ "id": 2 }))]);

    let out = table("users").exec(&db).await.unwrap();

    assert_eq!(
        out,
        QueryOutput::Rows(vec![row(json!({ "id": 1 })), row(json!({ "id": 2 }))])
    );
}

#[tokio::test]
async fn first_resolves_to_one_row() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "id": 1 }))]);

    let out = table("users")
        .filter(json!({ "email": "a@b.c" }))
        .first()
        .exec(&db)
        .await
        .unwrap();

    assert_eq!(out, QueryOutput::Row(Some(row(json!({ "id": 1 })))));
    assert_eq!(
        db.calls()[0].sql,
        r#"SELECT * FROM users WHERE "email" = $1 LIMIT 1"#
    );
}

#[tokio::test]
async fn first_on_empty_result_is_none() {
    let db = ScriptedExecutor::new();

    let out = table("users").first().exec(&db).await.unwrap();

    assert_eq!(out, QueryOutput::Row(None));
}

#[tokio::test]
async fn count_resolves_to_scalar() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "count": 3 }))]);

    let count = table("users")
        .filter(json!({ "active": true }))
        .count("id")
        .fetch_value(&db)
        .await
        .unwrap();

    assert_eq!(count, Some(json!(3)));
}

#[tokio::test]
async fn first_value_reads_cased_column() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "created_at": "2024-01-01" }))]);

    let out = table("users").first_value("createdAt").exec(&db).await.unwrap();

    assert_eq!(out, QueryOutput::Value(Some(json!("2024-01-01"))));
    assert_eq!(db.calls()[0].sql, r#"SELECT "created_at" FROM users LIMIT 1"#);
}

#[tokio::test]
async fn insert_resolves_to_returned_row() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "id": 9, "email": "a@b.c" }))]);

    let inserted = table("users")
        .insert(json!({ "email": "a@b.c" }))
        .on_conflict("email", json!({ "update": { "email": "a@b.c" } }))
        .exec(&db)
        .await
        .unwrap();

    assert_eq!(
        inserted,
        QueryOutput::Row(Some(row(json!({ "id": 9, "email": "a@b.c" }))))
    );
    let calls = db.calls();
    assert_eq!(
        calls[0].params,
        vec![Value::Text("a@b.c".into()), Value::Text("a@b.c".into())]
    );
}

#[tokio::test]
async fn build_errors_never_reach_the_executor() {
    let db = ScriptedExecutor::new();

    let err = table("users")
        .filter(json!({ "$gt": { "deletedAt": null } }))
        .exec(&db)
        .await
        .unwrap_err();

    assert!(err.is_build_error());
    assert!(matches!(
        err.as_build_error(),
        Some(BuildError::UnsupportedNullComparer(_))
    ));
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn cased_executor_recases_row_keys() {
    let config = QbConfig::default().shared();
    let db = CasedExecutor::new(
        ScriptedExecutor::new().respond(vec![row(json!({ "user_id": 1, "created_at": "x" }))]),
        &config,
    );

    let rows = config.table("posts").fetch_all(&db).await.unwrap();

    assert_eq!(rows, vec![row(json!({ "userId": 1, "createdAt": "x" }))]);
}

#[tokio::test]
async fn cased_executor_keeps_value_lookup_working() {
    let config = QbConfig::default().shared();
    let db = CasedExecutor::new(
        ScriptedExecutor::new().respond(vec![row(json!({ "created_at": "x" }))]),
        &config,
    );

    let value = config
        .table("posts")
        .first_value("createdAt")
        .fetch_value(&db)
        .await
        .unwrap();

    assert_eq!(value, Some(json!("x")));
}

#[tokio::test]
async fn fetch_page_without_pagination_reports_all_rows() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "id": 1 })), row(json!({ "id": 2 }))]);

    let page = table("users").fetch_page(&db).await.unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(db.calls().len(), 1);
}

#[tokio::test]
async fn fetch_value_ignores_window_total() {
    let db = ScriptedExecutor::new().respond(vec![row(json!({ "email": "a@b.c", "total": 9 }))]);

    let value = table("users")
        .select("email")
        .paginated(pgqb::Pagination::new(0, 1))
        .fetch_value(&db)
        .await
        .unwrap();

    assert_eq!(value, Some(json!("a@b.c")));
    assert_eq!(db.calls().len(), 1);
}
