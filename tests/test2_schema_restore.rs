use resilient_sql::prelude::*;
use resilient_sql::test_utils::{ScriptEvent, ScriptedBackend, test_options};

fn invalid() -> SessionDbError {
    SessionDbError::InvalidConnection("server has gone away".into())
}

fn no_database() -> SessionDbError {
    SessionDbError::Server {
        code: ER_NO_DB_ERROR,
        state: "3D000".into(),
        message: "No database selected".into(),
    }
}

fn session_with(
    backend: &ScriptedBackend,
    wait_timeout: u64,
    default_schema: &str,
) -> Result<Session<ScriptedBackend>, SessionDbError> {
    let mut opts = test_options();
    opts.wait_timeout = wait_timeout;
    opts.default_schema = default_schema.to_string();
    Session::new(backend.clone(), opts, 42)
}

#[tokio::test]
async fn reconnect_restores_the_bound_schema_not_the_default() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "audit_default")?;
    session.use_schema("orders").await?;
    assert_eq!(session.bound_schema(), "orders");

    backend.fail_next_statement(invalid());
    session.row_query("SELECT * FROM t").await?;

    assert_eq!(backend.opened_schemas(), vec!["audit_default", "orders"]);
    let uses: Vec<String> = backend
        .statements()
        .into_iter()
        .filter(|s| s.starts_with("USE"))
        .collect();
    assert_eq!(uses, vec!["USE `orders`", "USE `orders`"]);
    Ok(())
}

#[tokio::test]
async fn reconnect_falls_back_to_the_configured_default() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "audit_default")?;
    assert_eq!(session.effective_schema(), "audit_default");

    backend.fail_next_statement(invalid());
    session.row_query("SELECT 1").await?;

    assert_eq!(backend.statement_count("USE `audit_default`"), 1);
    assert_eq!(backend.ping_count(), 0);
    Ok(())
}

#[tokio::test]
async fn reconnect_without_any_schema_only_pings() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "")?;

    backend.fail_next_statement(invalid());
    session.row_query("SELECT 1").await?;

    assert_eq!(backend.ping_count(), 1);
    assert!(backend.statements().iter().all(|s| !s.starts_with("USE")));
    Ok(())
}

#[tokio::test]
async fn reselect_server_error_ends_the_reconnect() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "")?;
    session.use_schema("orders").await?;

    let unknown = SessionDbError::Server {
        code: 1049,
        state: "42000".into(),
        message: "Unknown database 'orders'".into(),
    };
    backend.fail_next_statement(invalid());
    backend.fail_next_reselect(unknown.clone());
    let err = session.exec("UPDATE t SET a = 1", true).await.unwrap_err();

    assert_eq!(err, SessionDbError::ReconnectFailed(Box::new(unknown)));
    assert_eq!(backend.statement_count("UPDATE t SET a = 1"), 1);
    assert_eq!(
        session.diagnostics().errors().collect::<Vec<_>>(),
        vec![invalid().to_string(), "Unknown database 'orders'".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn reselect_on_a_dead_connection_rebuilds_again() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "")?;
    session.use_schema("orders").await?;

    backend.fail_next_statement(invalid());
    backend.fail_next_reselect(invalid());
    session.row_query("SELECT 1").await?;

    // initial open plus two rebuilds
    assert_eq!(backend.open_count(), 3);
    assert_eq!(backend.live_connections(), 1);
    assert_eq!(backend.statement_count("SELECT 1"), 2);
    Ok(())
}

#[tokio::test]
async fn reselect_keeps_failing_until_the_bound() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "")?;
    session.use_schema("orders").await?;

    backend.fail_next_statement(invalid());
    backend.fail_next_reselect(invalid());
    backend.fail_next_reselect(invalid());
    let err = session.row_query("SELECT 1").await.unwrap_err();

    assert_eq!(err, SessionDbError::ReconnectFailed(Box::new(invalid())));
    assert_eq!(backend.open_count(), 3);
    assert_eq!(backend.statement_count("SELECT 1"), 1);
    assert_eq!(backend.live_connections(), 1);
    Ok(())
}

#[tokio::test]
async fn idle_schema_loss_reconnects_and_retries_exec() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 600, "")?;
    session.use_schema("orders").await?;

    backend.fail_next_statement(no_database());
    session.exec("INSERT INTO t VALUES (1)", false).await?;

    assert_eq!(backend.statement_count("INSERT INTO t VALUES (1)"), 2);
    assert_eq!(backend.opened_schemas(), vec!["", "orders"]);
    assert_eq!(
        session.diagnostics().warnings().collect::<Vec<_>>(),
        vec![SCHEMA_LOST_WARNING]
    );
    assert_eq!(session.diagnostics().errors().count(), 0);
    Ok(())
}

#[tokio::test]
async fn schema_loss_needs_a_long_wait_timeout() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 599, "")?;
    session.use_schema("orders").await?;

    backend.fail_next_statement(no_database());
    let err = session.exec("INSERT INTO t VALUES (1)", true).await.unwrap_err();

    assert_eq!(err, no_database());
    assert_eq!(backend.statement_count("INSERT INTO t VALUES (1)"), 1);
    assert_eq!(backend.open_count(), 1);
    Ok(())
}

#[tokio::test]
async fn schema_loss_needs_a_bound_schema() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 28_800, "audit_default")?;

    backend.fail_next_statement(no_database());
    let err = session.exec("INSERT INTO t VALUES (1)", true).await.unwrap_err();

    assert_eq!(err, no_database());
    assert_eq!(backend.statement_count("INSERT INTO t VALUES (1)"), 1);
    Ok(())
}

#[tokio::test]
async fn other_codes_never_take_the_schema_loss_branch() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 28_800, "")?;
    session.use_schema("orders").await?;

    let lock_wait = SessionDbError::Server {
        code: 1205,
        state: "HY000".into(),
        message: "Lock wait timeout exceeded; try restarting transaction".into(),
    };
    backend.fail_next_statement(lock_wait.clone());
    let err = session.exec("UPDATE t SET a = 1", true).await.unwrap_err();

    assert_eq!(err, lock_wait);
    assert_eq!(backend.statement_count("UPDATE t SET a = 1"), 1);
    assert_eq!(backend.open_count(), 1);
    Ok(())
}

#[tokio::test]
async fn schema_loss_is_only_handled_on_the_exec_path() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 28_800, "")?;
    session.use_schema("orders").await?;

    backend.fail_next_statement(no_database());
    let err = session.ddl_exec("CREATE TABLE t (id INT)", true).await.unwrap_err();
    assert_eq!(err, no_database());
    assert_eq!(backend.statement_count("CREATE TABLE t (id INT)"), 1);

    backend.fail_next_statement(no_database());
    let err = session.row_query("SELECT * FROM t").await.unwrap_err();
    assert_eq!(err, no_database());
    assert_eq!(backend.statement_count("SELECT * FROM t"), 1);

    assert!(session.diagnostics().is_empty());
    Ok(())
}

#[tokio::test]
async fn use_schema_switches_an_open_ddl_connection() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "")?;
    session.ddl_exec("CREATE TABLE t0 (id INT)", true).await?;

    session.use_schema("orders").await?;
    session.ddl_exec("ALTER TABLE t0 ADD c INT", true).await?;

    // conn 1 is the DDL handle, conn 2 the primary
    let uses: Vec<u32> = backend
        .events()
        .iter()
        .filter_map(|e| match e {
            ScriptEvent::Statement { conn, sql } if sql == "USE `orders`" => Some(*conn),
            _ => None,
        })
        .collect();
    assert_eq!(uses, vec![2, 1]);
    assert_eq!(backend.open_count(), 2);
    Ok(())
}

#[tokio::test]
async fn ddl_connection_opened_later_uses_the_bound_schema() -> Result<(), SessionDbError> {
    let backend = ScriptedBackend::new();
    let mut session = session_with(&backend, 0, "audit_default")?;
    session.use_schema("orders").await?;

    session.ddl_exec("CREATE TABLE t0 (id INT)", true).await?;

    assert_eq!(backend.opened_schemas(), vec!["audit_default", "orders"]);
    assert_eq!(backend.statement_count("USE `orders`"), 1);
    Ok(())
}
