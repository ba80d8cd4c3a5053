use plantdb::powerplant::{TABLE_NAME, table_columns};
use plantdb::{
    ConnectionState, DbError, MemoryStore, RowValues, StoreConnection, TableGateway, TableLookup,
    Value,
};

fn reading() -> RowValues {
    [("AT", 8.34), ("V", 40.77), ("AP", 1010.84), ("RH", 90.01), ("PE", 480.48)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::Float(v)))
        .collect()
}

#[tokio::test]
async fn test_connection_is_lazy_and_reused() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());

    assert!(!gateway.is_connected());
    assert_eq!(store.connections_opened(), 0);

    gateway.ensure_connection().await.unwrap();
    gateway.ensure_connection().await.unwrap();
    gateway.table_exists(TABLE_NAME).await.unwrap();

    assert!(gateway.is_connected());
    assert_eq!(store.connections_opened(), 1);
}

#[tokio::test]
async fn test_close_then_reopen() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());

    gateway.ensure_connection().await.unwrap();
    gateway.close().await.unwrap();
    assert!(!gateway.is_connected());

    // closing twice is harmless
    gateway.close().await.unwrap();

    gateway.table_exists(TABLE_NAME).await.unwrap();
    assert_eq!(store.connections_opened(), 2);
}

#[tokio::test]
async fn test_commit_without_connection_is_noop() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());

    gateway.commit().await.unwrap();
    assert!(!gateway.is_connected());
    assert_eq!(store.connections_opened(), 0);
}

#[tokio::test]
async fn test_unreachable_store_fails_without_retry() {
    let store = MemoryStore::unreachable();
    let mut gateway = TableGateway::new(store.clone());

    assert!(matches!(
        gateway.count_rows(TABLE_NAME).await,
        Err(DbError::ConnectionFailed(_))
    ));
    assert!(matches!(
        gateway.ensure_connection().await,
        Err(DbError::ConnectionFailed(_))
    ));
    assert!(!gateway.is_connected());
    assert_eq!(store.connections_opened(), 0);
}

#[tokio::test]
async fn test_inserts_are_committed_per_call() {
    let store = MemoryStore::new();
    let mut writer = TableGateway::new(store.clone());
    let mut reader = TableGateway::new(store.clone());

    writer.create_table(TABLE_NAME, &table_columns()).await.unwrap();
    writer.insert_row(TABLE_NAME, &reading()).await.unwrap();

    assert_eq!(
        reader.count_rows(TABLE_NAME).await.unwrap(),
        TableLookup::Found(1)
    );
}

#[tokio::test]
async fn test_rollback_discards_uncommitted_writes() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());
    gateway.create_table(TABLE_NAME, &table_columns()).await.unwrap();

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (name, value) in [("at", 1.0), ("v", 2.0), ("ap", 3.0), ("rh", 4.0), ("pe", 5.0)] {
        columns.push(plantdb::Identifier::new(name).unwrap());
        values.push(Value::Float(value));
    }
    let table = plantdb::Identifier::new(TABLE_NAME).unwrap();

    let conn = gateway.ensure_connection().await.unwrap();
    conn.insert(&table, &columns, &values).await.unwrap();
    assert!(conn.is_in_transaction());

    gateway.rollback().await.unwrap();

    let conn = gateway.ensure_connection().await.unwrap();
    assert_eq!(conn.state(), ConnectionState::Idle);
    assert_eq!(
        gateway.count_rows(TABLE_NAME).await.unwrap(),
        TableLookup::Found(0)
    );
}

#[tokio::test]
async fn test_rollback_opens_connection_when_needed() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());

    gateway.rollback().await.unwrap();
    assert!(gateway.is_connected());
    assert_eq!(store.connections_opened(), 1);
}

#[tokio::test]
async fn test_close_discards_uncommitted_writes() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());
    gateway.create_table(TABLE_NAME, &table_columns()).await.unwrap();

    let table = plantdb::Identifier::new(TABLE_NAME).unwrap();
    let columns: Vec<_> = ["at", "v", "ap", "rh", "pe"]
        .iter()
        .map(|c| plantdb::Identifier::new(c).unwrap())
        .collect();
    let values = vec![Value::Float(0.0); 5];

    gateway
        .ensure_connection()
        .await
        .unwrap()
        .insert(&table, &columns, &values)
        .await
        .unwrap();
    gateway.close().await.unwrap();

    assert_eq!(
        gateway.count_rows(TABLE_NAME).await.unwrap(),
        TableLookup::Found(0)
    );
}

#[tokio::test]
async fn test_failed_statement_blocks_gateway_until_rollback() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());
    gateway.create_table(TABLE_NAME, &table_columns()).await.unwrap();

    assert!(matches!(
        gateway.delete_table("never_created").await,
        Err(DbError::TableNotFound(_))
    ));
    assert!(matches!(
        gateway.count_rows(TABLE_NAME).await,
        Err(DbError::TransactionAborted)
    ));
    assert!(matches!(
        gateway.insert_row(TABLE_NAME, &reading()).await,
        Err(DbError::TransactionAborted)
    ));

    gateway.rollback().await.unwrap();
    assert_eq!(
        gateway.count_rows(TABLE_NAME).await.unwrap(),
        TableLookup::Found(0)
    );
}

#[tokio::test]
async fn test_close_recovers_from_aborted_transaction() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());

    assert!(gateway.delete_table("never_created").await.is_err());
    gateway.close().await.unwrap();

    assert!(!gateway.table_exists(TABLE_NAME).await.unwrap());
    assert_eq!(store.connections_opened(), 2);
}
