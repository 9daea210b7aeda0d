//! Mock Pluggy API server for testing
//!
//! Simulates the subset of the Pluggy API the aggregation client uses:
//! - POST /auth returns { apiKey }
//! - GET /connectors returns { results: [...] }
//! - GET /items/{id} returns the item
//! - GET /accounts?itemId= returns { total, results: [...] }
//! - GET /transactions?accountId=&pageSize=[&from=&to=] returns { total, results: [...] }
//! - GET /transactions/{id} returns one transaction

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

pub const MOCK_API_KEY: &str = "mock_api_key";
pub const MOCK_ITEM_ID: &str = "0553c99a-9462-4200-bb69-d28aa70f79d8";

/// Configuration for mock data generation
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Connector names returned by /connectors, in order
    pub connectors: Vec<String>,
    /// Number of accounts returned for the known item
    pub num_accounts: usize,
    /// Number of transactions per account
    pub num_transactions_per_account: usize,
    /// Omit the bankData object from accounts
    pub omit_bank_data: bool,
    /// Whether /auth rejects the credentials
    pub fail_auth: bool,
    /// Whether /auth answers 200 without an apiKey
    pub auth_without_key: bool,
    /// Whether /items answers HTTP 500
    pub fail_items: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            connectors: vec!["Nubank".to_string(), "Other".to_string()],
            num_accounts: 2,
            num_transactions_per_account: 5,
            omit_bank_data: false,
            fail_auth: false,
            auth_without_key: false,
            fail_items: false,
        }
    }
}

/// Requests seen by the server, as "METHOD path?query"
#[derive(Debug, Default)]
pub struct RequestLog {
    lines: Mutex<Vec<String>>,
    auth_calls: AtomicUsize,
}

impl RequestLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

/// Mock Pluggy server for testing
pub struct MockPluggyServer {
    port: u16,
    running: Arc<AtomicBool>,
    log: Arc<RequestLog>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockPluggyServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let log = Arc::new(RequestLog::default());
        let log_clone = log.clone();

        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = log_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &log);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            log,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockPluggyServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Request {
    method: String,
    path: String,
    query: String,
    api_key: Option<String>,
}

/// Read the request line, headers and (discarded) body
fn read_request(stream: &mut TcpStream) -> Option<Request> {
    stream.set_nonblocking(false).ok()?;
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut api_key = None;
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name == "x-api-key" {
                api_key = Some(value.to_string());
            } else if name == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
        }
    }

    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).ok()?;
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target, String::new()),
    };

    Some(Request {
        method,
        path,
        query,
        api_key,
    })
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, log: &RequestLog) {
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"message": "Invalid request"}"#);
        return;
    };

    let line = if request.query.is_empty() {
        format!("{} {}", request.method, request.path)
    } else {
        format!("{} {}?{}", request.method, request.path, request.query)
    };
    if let Ok(mut lines) = log.lines.lock() {
        lines.push(line);
    }

    if request.method == "POST" && request.path == "/auth" {
        log.auth_calls.fetch_add(1, Ordering::SeqCst);
        if config.fail_auth {
            send_response(
                &mut stream,
                401,
                "Unauthorized",
                r#"{"message": "Invalid credentials"}"#,
            );
        } else if config.auth_without_key {
            send_response(&mut stream, 200, "OK", "{}");
        } else {
            let body = json!({ "apiKey": MOCK_API_KEY }).to_string();
            send_response(&mut stream, 200, "OK", &body);
        }
        return;
    }

    if request.api_key.as_deref() != Some(MOCK_API_KEY) {
        send_response(
            &mut stream,
            403,
            "Forbidden",
            r#"{"message": "Missing or invalid API key"}"#,
        );
        return;
    }

    if request.method != "GET" {
        send_response(
            &mut stream,
            405,
            "Method Not Allowed",
            r#"{"message": "Method not allowed"}"#,
        );
        return;
    }

    let path = request.path.as_str();
    if path == "/connectors" {
        let results: Vec<_> = config
            .connectors
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({ "id": 200 + i, "name": name, "health": { "status": "ONLINE" } })
            })
            .collect();
        let body = json!({ "total": results.len(), "results": results }).to_string();
        send_response(&mut stream, 200, "OK", &body);
    } else if let Some(item_id) = path.strip_prefix("/items/") {
        if config.fail_items {
            send_response(&mut stream, 500, "Internal Server Error", r#"{"message": "boom"}"#);
        } else if item_id == MOCK_ITEM_ID {
            let body = json!({
                "id": item_id,
                "products": ["ACCOUNTS", "TRANSACTIONS"],
                "status": "UPDATED",
                "executionStatus": "SUCCESS",
                "createdAt": "2024-01-05T10:00:00.000Z"
            })
            .to_string();
            send_response(&mut stream, 200, "OK", &body);
        } else {
            send_response(&mut stream, 404, "Not Found", r#"{"message": "Item not found"}"#);
        }
    } else if path == "/accounts" {
        let item_id = query_param(&request.query, "itemId").unwrap_or("");
        let accounts = if item_id == MOCK_ITEM_ID {
            generate_mock_accounts(config.num_accounts, config.omit_bank_data)
        } else {
            Vec::new()
        };
        let body = json!({ "total": accounts.len(), "results": accounts }).to_string();
        send_response(&mut stream, 200, "OK", &body);
    } else if path == "/transactions" {
        let account_id = query_param(&request.query, "accountId").unwrap_or("");
        let page_size: usize = query_param(&request.query, "pageSize")
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);
        let txs = generate_mock_transactions(
            account_id,
            config.num_transactions_per_account.min(page_size),
        );
        let body = json!({ "total": txs.len(), "results": txs }).to_string();
        send_response(&mut stream, 200, "OK", &body);
    } else if let Some(tx_id) = path.strip_prefix("/transactions/") {
        let body = json!({
            "id": tx_id,
            "type": "CREDIT",
            "amount": 100.0,
            "currencyCode": "BRL",
            "description": "Pix recebido",
            "date": "2024-02-01T00:00:00.000Z",
            "accountId": "acc-1"
        })
        .to_string();
        send_response(&mut stream, 200, "OK", &body);
    } else {
        send_response(&mut stream, 404, "Not Found", r#"{"message": "Endpoint not found"}"#);
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn generate_mock_accounts(count: usize, omit_bank_data: bool) -> Vec<serde_json::Value> {
    (0..count)
        .map(|i| {
            let mut account = json!({
                "id": format!("acc-{}", i + 1),
                "type": if i % 2 == 0 { "BANK" } else { "CREDIT" },
                "name": format!("Conta {}", i + 1),
                "balance": 1000.0 + (i as f64 * 250.5),
                "currencyCode": "BRL",
                "owner": "Maria Silva"
            });
            if !omit_bank_data {
                account["bankData"] = json!({
                    "transferNumber": format!("0001/{}", 10000 + i),
                    "closingBalance": 900.0,
                    "automaticallyInvestedBalance": 50.0,
                    "overdraftContractedLimit": 1000.0,
                    "overdraftUsedLimit": 0.0,
                    "unarrangedOverdraftAmount": 0.0
                });
            }
            account
        })
        .collect()
}

fn generate_mock_transactions(account_id: &str, count: usize) -> Vec<serde_json::Value> {
    let merchants = [
        ("Padaria", -12.50),
        ("Mercado", -230.10),
        ("Salário", 5000.00),
        ("Uber", -23.90),
        ("Pix recebido", 150.00),
    ];

    (0..count)
        .map(|i| {
            let (description, amount) = merchants[i % merchants.len()];
            json!({
                "id": format!("tx_{}_{}", account_id, i + 1),
                "type": if amount < 0.0 { "DEBIT" } else { "CREDIT" },
                "amount": amount,
                "currencyCode": "BRL",
                "description": description,
                "date": format!("2024-01-{:02}T00:00:00.000Z", (i % 28) + 1),
                "accountId": account_id
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::NaiveDate;

    use crate::adapters::pluggy::PluggyClient;
    use crate::config::ClientCredentials;
    use crate::domain::result::Error;
    use crate::domain::Credential;
    use crate::ports::{AggregatorApi, TransactionQuery};

    fn client(server: &MockPluggyServer) -> PluggyClient {
        PluggyClient::new_with_base_url(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    fn creds() -> ClientCredentials {
        ClientCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    fn credential() -> Credential {
        Credential::new(MOCK_API_KEY, chrono::Utc::now(), chrono::Duration::hours(2))
    }

    #[test]
    fn test_token_exchange() {
        let server = MockPluggyServer::start(MockConfig::default()).unwrap();
        let token = client(&server).exchange_token(&creds()).unwrap();
        assert_eq!(token, MOCK_API_KEY);
        assert_eq!(server.log().auth_calls(), 1);
    }

    #[test]
    fn test_token_exchange_rejected_is_auth_error() {
        let server = MockPluggyServer::start(MockConfig {
            fail_auth: true,
            ..Default::default()
        })
        .unwrap();
        let err = client(&server).exchange_token(&creds()).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn test_token_exchange_without_key_is_auth_error() {
        let server = MockPluggyServer::start(MockConfig {
            auth_without_key: true,
            ..Default::default()
        })
        .unwrap();
        let err = client(&server).exchange_token(&creds()).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("apiKey"));
    }

    #[test]
    fn test_list_institutions_preserves_order() {
        let server = MockPluggyServer::start(MockConfig {
            connectors: vec!["Inter".to_string(), "Nubank".to_string(), "Neon".to_string()],
            ..Default::default()
        })
        .unwrap();
        let institutions = client(&server).list_institutions(&credential()).unwrap();
        let names: Vec<_> = institutions.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Inter", "Nubank", "Neon"]);
        assert_eq!(institutions[0].health_status, "ONLINE");
    }

    #[test]
    fn test_wrong_api_key_is_upstream_error() {
        let server = MockPluggyServer::start(MockConfig::default()).unwrap();
        let stale = Credential::new("stale", chrono::Utc::now(), chrono::Duration::hours(2));
        let err = client(&server).list_institutions(&stale).unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[test]
    fn test_get_connection() {
        let server = MockPluggyServer::start(MockConfig::default()).unwrap();
        let conn = client(&server)
            .get_connection(&credential(), MOCK_ITEM_ID)
            .unwrap();
        assert_eq!(conn.status, "UPDATED");
        assert_eq!(conn.execution_status, "SUCCESS");
        assert!(conn.supports("TRANSACTIONS"));
    }

    #[test]
    fn test_get_connection_server_error() {
        let server = MockPluggyServer::start(MockConfig {
            fail_items: true,
            ..Default::default()
        })
        .unwrap();
        let err = client(&server)
            .get_connection(&credential(), MOCK_ITEM_ID)
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_list_accounts_without_bank_data() {
        let server = MockPluggyServer::start(MockConfig {
            num_accounts: 3,
            omit_bank_data: true,
            ..Default::default()
        })
        .unwrap();
        let page = client(&server)
            .list_accounts(&credential(), MOCK_ITEM_ID)
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.accounts.len(), 3);
        assert!(page.accounts.iter().all(|a| a.detail.is_zero()));
        assert_eq!(page.warnings.len(), 3);
        assert!(server
            .log()
            .lines()
            .iter()
            .any(|l| l == &format!("GET /accounts?itemId={}", MOCK_ITEM_ID)));
    }

    #[test]
    fn test_list_transactions_sends_range_and_page_size() {
        let server = MockPluggyServer::start(MockConfig::default()).unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let page = client(&server)
            .list_transactions(&credential(), &TransactionQuery::range("acc-1", from, to, 500))
            .unwrap();

        assert_eq!(page.transactions.len(), 5);
        assert!(page.transactions.iter().all(|t| t.account_id == "acc-1"));
        assert!(server.log().lines().iter().any(|l| l
            == "GET /transactions?accountId=acc-1&pageSize=500&from=2024-01-01&to=2024-01-31"));
    }

    #[test]
    fn test_get_single_transaction() {
        let server = MockPluggyServer::start(MockConfig::default()).unwrap();
        let tx = client(&server)
            .get_transaction(&credential(), "tx-42")
            .unwrap();
        assert_eq!(tx.id, "tx-42");
        assert_eq!(tx.description.as_deref(), Some("Pix recebido"));
    }
}
