/// Seeding the power plant table from a CSV export
use plantdb::powerplant::{self, PowerPlantReading, SeedReport, TABLE_NAME};
use plantdb::{DbError, MemoryStore, TableGateway, TableLookup};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const SAMPLE: &str = "AT,V,AP,RH,PE
14.96,41.76,1024.07,73.17,463.26
25.18,62.96,1020.04,59.08,444.37
5.11,39.4,1012.16,92.14,488.56
";

fn sample_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    file
}

#[test]
fn test_read_csv() {
    let file = sample_csv();
    let readings = powerplant::read_csv(file.path()).unwrap();

    assert_eq!(readings.len(), 3);
    assert_eq!(
        readings[0],
        PowerPlantReading {
            AT: 14.96,
            V: 41.76,
            AP: 1024.07,
            RH: 73.17,
            PE: 463.26,
        }
    );
}

#[test]
fn test_read_csv_rejects_malformed_rows() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"AT,V,AP,RH,PE\n1.0,2.0,not-a-number,4.0,5.0\n")
        .unwrap();

    assert!(matches!(
        powerplant::read_csv(file.path()),
        Err(DbError::Seed(_))
    ));
}

/// Serve one HTTP response and return the URL to request.
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{}/powerplant.csv", addr)
}

#[tokio::test]
async fn test_fetch_csv() {
    let url = serve_once("200 OK", SAMPLE).await;

    let readings = powerplant::fetch_csv(&url).await.unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[2].PE, 488.56);
}

#[tokio::test]
async fn test_fetch_csv_rejects_error_status() {
    let url = serve_once("404 Not Found", "missing").await;

    assert!(matches!(
        powerplant::fetch_csv(&url).await,
        Err(DbError::Seed(_))
    ));
}

#[tokio::test]
async fn test_initialize_loads_empty_table_once() {
    let store = MemoryStore::new();
    let mut gateway = TableGateway::new(store.clone());
    let readings = powerplant::read_csv(sample_csv().path()).unwrap();

    let first = powerplant::initialize(&mut gateway, &readings).await.unwrap();
    assert_eq!(
        first,
        SeedReport {
            table_created: true,
            rows_inserted: 3,
            skipped: false,
        }
    );
    assert!(!gateway.is_connected());

    let second = powerplant::initialize(&mut gateway, &readings).await.unwrap();
    assert_eq!(
        second,
        SeedReport {
            table_created: false,
            rows_inserted: 0,
            skipped: true,
        }
    );
    assert!(!gateway.is_connected());

    assert_eq!(
        gateway.count_rows(TABLE_NAME).await.unwrap(),
        TableLookup::Found(3)
    );
    let rows = gateway.retrieve_row(TABLE_NAME, 3).await.unwrap().unwrap_or_default();
    assert_eq!(rows.value(3, "pe"), Some(&plantdb::Value::Float(488.56)));
}

#[tokio::test]
async fn test_initialize_without_readings_creates_table() {
    let mut gateway = TableGateway::new(MemoryStore::new());

    let report = powerplant::initialize(&mut gateway, &[]).await.unwrap();
    assert!(report.table_created);
    assert_eq!(report.rows_inserted, 0);
    assert!(gateway.table_exists(TABLE_NAME).await.unwrap());
}

#[tokio::test]
async fn test_initialize_reports_unreachable_store() {
    let mut gateway = TableGateway::new(MemoryStore::unreachable());

    assert!(matches!(
        powerplant::initialize(&mut gateway, &[]).await,
        Err(DbError::ConnectionFailed(_))
    ));
    assert!(!gateway.is_connected());
}
