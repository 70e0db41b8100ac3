//! Google Sheets export through the Sheets v4 REST API.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::models::config::SheetsConfig;
use crate::models::InvoiceRecord;

use super::xlsx::{line_item_rows, summary_rows, Cell, SHEET_NAMES};

/// Client for creating invoice spreadsheets.
///
/// Built explicitly from configuration and handed to the exporter.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
    spreadsheet_url: Option<String>,
}

impl SheetsClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// A client for the configured account, or `None` without a token.
    pub fn from_config(config: &SheetsConfig) -> Option<Self> {
        config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|token| Self::new(config.api_base.clone(), token))
    }

    /// Create a spreadsheet for the record and return its URL.
    pub async fn export(&self, record: &InvoiceRecord, stem: &str) -> Result<String, ExportError> {
        let title = spreadsheet_title(stem);
        info!("Creating spreadsheet {}", title);

        let created: CreatedSpreadsheet = self
            .post(&format!("{}/spreadsheets", self.api_base), &create_request(&title))
            .await?
            .json()
            .await?;

        debug!("Created spreadsheet {}", created.spreadsheet_id);

        let values_url = format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            self.api_base, created.spreadsheet_id
        );
        self.post(&values_url, &values_request(record)).await?;

        Ok(created.spreadsheet_url.unwrap_or_else(|| {
            format!("https://docs.google.com/spreadsheets/d/{}", created.spreadsheet_id)
        }))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, ExportError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::SheetsApi { status, message });
        }

        Ok(response)
    }
}

/// `Invoice-<stem>-<timestamp>`.
pub fn spreadsheet_title(stem: &str) -> String {
    format!("Invoice-{}-{}", stem, Utc::now().format("%Y-%m-%dT%H:%M:%SZ"))
}

/// Body of the spreadsheet creation call.
pub fn create_request(title: &str) -> Value {
    let sheets: Vec<Value> = SHEET_NAMES
        .iter()
        .map(|name| json!({"properties": {"title": name}}))
        .collect();

    json!({
        "properties": {"title": title},
        "sheets": sheets,
    })
}

/// Body of the values call filling both sheets.
pub fn values_request(record: &InvoiceRecord) -> Value {
    let ranges = [
        (SHEET_NAMES[0], line_item_rows(record)),
        (SHEET_NAMES[1], summary_rows(record)),
    ];

    let data: Vec<Value> = ranges
        .into_iter()
        .map(|(sheet, rows)| {
            json!({
                "range": format!("{}!A1", sheet),
                "majorDimension": "ROWS",
                "values": rows_to_values(&rows),
            })
        })
        .collect();

    json!({
        "valueInputOption": "RAW",
        "data": data,
    })
}

fn rows_to_values(rows: &[Vec<Cell>]) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Text(s) => json!(s),
                    Cell::Number(n) => json!(n),
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Request seen by the stub API: path, authorization header and body.
    type Call = (String, Option<String>, Value);

    #[derive(Clone, Default)]
    struct StubApi {
        calls: Arc<Mutex<Vec<Call>>>,
        reject: bool,
    }

    async fn stub_handler(
        State(stub): State<StubApi>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        stub.calls.lock().push((uri.path().to_string(), auth, body));

        if stub.reject {
            (StatusCode::FORBIDDEN, Json(json!({"error": "denied"})))
        } else if uri.path().ends_with("/spreadsheets") {
            (
                StatusCode::OK,
                Json(json!({"spreadsheetId": "sheet-1", "spreadsheetUrl": "https://docs.example/sheet-1"})),
            )
        } else {
            (StatusCode::OK, Json(json!({"totalUpdatedCells": 16})))
        }
    }

    /// Serve the stub on an ephemeral port and return its API base.
    async fn serve_stub(stub: StubApi) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(stub_handler).with_state(stub);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v4", addr)
    }

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-1001".to_string(),
            date: "2025-09-18".to_string(),
            vendor: "ACME Corp".to_string(),
            line_items: vec![LineItem::new("Widget", 1.0, 50.0, 50.0)],
            subtotal: 50.0,
            tax: 5.0,
            total: 55.0,
        }
    }

    #[test]
    fn test_client_requires_token() {
        assert!(SheetsClient::from_config(&SheetsConfig::default()).is_none());

        let config = SheetsConfig {
            access_token: Some(String::new()),
            ..SheetsConfig::default()
        };
        assert!(SheetsClient::from_config(&config).is_none());

        let config = SheetsConfig {
            access_token: Some("token".to_string()),
            api_base: "http://localhost:9/v4/".to_string(),
        };
        let client = SheetsClient::from_config(&config).unwrap();
        assert_eq!(client.api_base, "http://localhost:9/v4");
    }

    #[test]
    fn test_title_format() {
        let title = spreadsheet_title("INV-1001");
        assert!(title.starts_with("Invoice-INV-1001-"));
        assert!(title.ends_with('Z'));
    }

    #[test]
    fn test_create_request() {
        let body = create_request("Invoice-X");
        assert_eq!(body["properties"]["title"], "Invoice-X");
        assert_eq!(body["sheets"][0]["properties"]["title"], "LineItems");
        assert_eq!(body["sheets"][1]["properties"]["title"], "Summary");
    }

    #[test]
    fn test_values_request() {
        let body = values_request(&record());

        assert_eq!(body["data"][0]["range"], "LineItems!A1");
        assert_eq!(
            body["data"][0]["values"],
            json!([["description", "quantity", "unit_price", "total"], ["Widget", 1.0, 50.0, 50.0]])
        );
        assert_eq!(body["data"][1]["range"], "Summary!A1");
        assert_eq!(body["data"][1]["values"][0], json!(["Invoice Number", "INV-1001"]));
        assert_eq!(body["data"][1]["values"][5], json!(["Total", 55.0]));
    }

    #[tokio::test]
    async fn test_export_creates_and_fills_spreadsheet() {
        let stub = StubApi::default();
        let client = SheetsClient::new(serve_stub(stub.clone()).await, "token-1");

        let url = client.export(&record(), "INV-1001").await.unwrap();
        assert_eq!(url, "https://docs.example/sheet-1");

        let calls = stub.calls.lock().clone();
        assert_eq!(calls.len(), 2);

        let (path, auth, body) = &calls[0];
        assert_eq!(path, "/v4/spreadsheets");
        assert_eq!(auth.as_deref(), Some("Bearer token-1"));
        assert!(body["properties"]["title"].as_str().unwrap().starts_with("Invoice-INV-1001-"));

        let (path, _, body) = &calls[1];
        assert_eq!(path, "/v4/spreadsheets/sheet-1/values:batchUpdate");
        assert_eq!(body, &values_request(&record()));
    }

    #[tokio::test]
    async fn test_export_reports_api_error() {
        let stub = StubApi {
            reject: true,
            ..StubApi::default()
        };
        let client = SheetsClient::new(serve_stub(stub.clone()).await, "bad-token");

        let err = client.export(&record(), "INV-1001").await.unwrap_err();
        assert!(matches!(err, ExportError::SheetsApi { status: 403, .. }));
        assert_eq!(stub.calls.lock().len(), 1);
    }
}
