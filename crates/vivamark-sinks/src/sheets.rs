//! Remote spreadsheet sink.
//!
//! Talks to a Google Sheets-style values API: rows are appended to and
//! read from a fixed three-column range, authenticated with a service
//! token. Row semantics are identical to the local CSV backend.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vivamark_core::model::{AnswerRecord, Selection};
use vivamark_core::traits::ResultSink;

use crate::error::SinkError;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const RANGE: &str = "Sheet1!A:C";
const HEADER: [&str; 3] = ["candidateId", "questionId", "selectedOption"];

/// Remote spreadsheet result sink.
pub struct SheetSink {
    token: String,
    sheet_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl SheetSink {
    pub fn new(token: &str, sheet_id: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            token: token.to_string(),
            sheet_id: sheet_id.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    fn classify_status(status: u16, body: String, sheet_id: &str) -> SinkError {
        match status {
            401 | 403 => SinkError::AuthenticationFailed(body),
            404 => SinkError::SpreadsheetNotFound(sheet_id.to_string()),
            _ => {
                let message = serde_json::from_str::<SheetsApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                SinkError::ApiError { status, message }
            }
        }
    }

    async fn check_response(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SinkError> {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(SinkError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body, &self.sheet_id));
        }
        Ok(response)
    }

    fn map_transport(e: reqwest::Error) -> SinkError {
        if e.is_timeout() {
            SinkError::Timeout(DEFAULT_TIMEOUT_SECS)
        } else {
            SinkError::NetworkError(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct AppendRequest {
    values: Vec<[String; 3]>,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct SheetsApiError {
    error: SheetsApiErrorBody,
}

#[derive(Deserialize)]
struct SheetsApiErrorBody {
    message: String,
}

fn to_cells(row: &AnswerRecord) -> [String; 3] {
    [
        row.candidate_id.clone(),
        row.question_id.clone(),
        row.selected_option.to_string(),
    ]
}

fn from_cells(cells: &[String]) -> anyhow::Result<AnswerRecord> {
    if cells.len() < 3 {
        anyhow::bail!("row has {} cells, expected 3", cells.len());
    }
    Ok(AnswerRecord {
        candidate_id: cells[0].clone(),
        question_id: cells[1].clone(),
        // Selection parsing is total
        selected_option: Selection::from_str(&cells[2]).unwrap(),
    })
}

#[async_trait]
impl ResultSink for SheetSink {
    fn name(&self) -> &str {
        "sheets"
    }

    #[instrument(skip(self, rows), fields(sheet = %self.sheet_id, rows = rows.len()))]
    async fn append(&self, rows: &[AnswerRecord]) -> anyhow::Result<()> {
        let body = AppendRequest {
            values: rows.iter().map(to_cells).collect(),
        };

        let response = self
            .client
            .post(format!(
                "{}/v4/spreadsheets/{}/values/{RANGE}:append",
                self.base_url, self.sheet_id
            ))
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport)?;

        self.check_response(response).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(sheet = %self.sheet_id))]
    async fn read_all(&self) -> anyhow::Result<Vec<AnswerRecord>> {
        let response = self
            .client
            .get(format!(
                "{}/v4/spreadsheets/{}/values/{RANGE}",
                self.base_url, self.sheet_id
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let response = self.check_response(response).await?;
        let parsed: ValuesResponse = response
            .json()
            .await
            .map_err(|e| SinkError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let mut rows = Vec::new();
        for cells in &parsed.values {
            // A leading header row is part of the sheet, not the history.
            if cells.iter().map(String::as_str).eq(HEADER) {
                continue;
            }
            rows.push(from_cells(cells)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(candidate: &str, question: &str, selection: Selection) -> AnswerRecord {
        AnswerRecord {
            candidate_id: candidate.into(),
            question_id: question.into(),
            selected_option: selection,
        }
    }

    #[tokio::test]
    async fn append_posts_wire_formatted_rows() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:C:append"))
            .and(bearer_token("test-token"))
            .and(body_partial_json(serde_json::json!({
                "values": [
                    ["E001", "A1", "option c"],
                    ["E001", "A2", "not answered"]
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "updates": {"updatedRows": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = SheetSink::new("test-token", "sheet-1", Some(server.uri()));
        sink.append(&[
            row("E001", "A1", Selection::answered("C")),
            row("E001", "A2", Selection::NotAnswered),
        ])
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn read_all_skips_the_header_row() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:C"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    ["candidateId", "questionId", "selectedOption"],
                    ["E001", "A1", "option c"],
                    ["E001", "A2", "not answered"]
                ]
            })))
            .mount(&server)
            .await;

        let sink = SheetSink::new("test-token", "sheet-1", Some(server.uri()));
        let rows = sink.read_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].selected_option, Selection::answered("C"));
        assert_eq!(rows[1].selected_option, Selection::NotAnswered);
    }

    #[tokio::test]
    async fn authentication_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let sink = SheetSink::new("bad-token", "sheet-1", Some(server.uri()));
        let err = sink
            .append(&[row("E001", "A1", Selection::answered("A"))])
            .await
            .unwrap_err();
        let sink_err = err.downcast::<SinkError>().unwrap();
        assert!(sink_err.is_permanent());
    }

    #[tokio::test]
    async fn rate_limiting_carries_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let sink = SheetSink::new("test-token", "sheet-1", Some(server.uri()));
        let err = sink
            .append(&[row("E001", "A1", Selection::answered("A"))])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("retry after 7000ms"));
    }

    #[tokio::test]
    async fn missing_spreadsheet_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let sink = SheetSink::new("test-token", "sheet-9", Some(server.uri()));
        let err = sink.read_all().await.unwrap_err();
        assert!(err.to_string().contains("spreadsheet not found: sheet-9"));
    }

    #[tokio::test]
    async fn short_rows_are_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [["E001", "A1"]]
            })))
            .mount(&server)
            .await;

        let sink = SheetSink::new("test-token", "sheet-1", Some(server.uri()));
        assert!(sink.read_all().await.is_err());
    }
}
