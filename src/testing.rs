//! 测试用的脚本化归档会话

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::infrastructure::{ArchiveSession, CommandReply, ContextProbe, DocumentResponse};
use crate::models::{ArchiveRow, FilterState};
use crate::services::request_builder::{RowRequest, SELECTED_ROW_FIELD};

pub const PAGE_URL: &str =
    "https://konto.flatex.at/banking-flatex.at/documentArchiveListFormAction.do";

/// 会话上发生的调用，按顺序记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Probe,
    ListRows,
    ReadFilter,
    Submit(usize),
    Fetch(String),
    WarmUp(String),
}

pub fn finished_reply(url: &str) -> CommandReply {
    let script = format!(r#"DocumentViewer.finished("{}", "Dokument")"#, url);
    let body = serde_json::json!({
        "commands": [{ "command": "execute", "script": script }]
    });
    CommandReply {
        status: 200,
        body: body.to_string(),
    }
}

pub fn display_reply(url: &str) -> CommandReply {
    let script = format!(r#"DocumentViewer.display("{}", 800, 600)"#, url);
    let body = serde_json::json!({
        "commands": [{ "command": "execute", "script": script }]
    });
    CommandReply {
        status: 200,
        body: body.to_string(),
    }
}

pub fn pdf_response(filename: Option<&str>) -> DocumentResponse {
    DocumentResponse {
        status: 200,
        content_type: Some("application/pdf".to_string()),
        content_disposition: filename.map(|f| format!(r#"attachment; filename="{}""#, f)),
        body: b"%PDF-test".to_vec(),
    }
}

pub fn status_response(status: u16) -> DocumentResponse {
    DocumentResponse {
        status,
        content_type: Some("text/plain".to_string()),
        content_disposition: None,
        body: b"busy".to_vec(),
    }
}

/// 默认每行返回 `finished("/downloadData/<idx>/doc_<idx>.pdf")`，文档请求返回 PDF
pub struct FakeSession {
    probe: ContextProbe,
    rows: Vec<ArchiveRow>,
    filter: Mutex<FilterState>,
    replies: Mutex<HashMap<usize, VecDeque<CommandReply>>>,
    documents: Mutex<HashMap<String, VecDeque<DocumentResponse>>>,
    warm_up_fails: bool,
    events: Mutex<Vec<Event>>,
    submitted: Mutex<Vec<RowRequest>>,
}

impl FakeSession {
    pub fn new(row_count: usize) -> Self {
        let rows = (1..=row_count)
            .map(|i| ArchiveRow::new(i, format!("Dokument {}", i)))
            .collect();
        let mut filter = FilterState::new();
        filter.set("dateRangeComponent.startDate.text", "01.01.2021");
        filter.set("storeSettings.checked", "off");

        Self {
            probe: ContextProbe {
                state_present: true,
                page_url: PAGE_URL.to_string(),
                token_id: "tok".to_string(),
                window_id: "win".to_string(),
            },
            rows,
            filter: Mutex::new(filter),
            replies: Mutex::new(HashMap::new()),
            documents: Mutex::new(HashMap::new()),
            warm_up_fails: false,
            events: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_probe(mut self, probe: ContextProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_failing_warm_up(mut self) -> Self {
        self.warm_up_fails = true;
        self
    }

    pub fn set_filter(&self, name: &str, value: &str) {
        self.filter.lock().unwrap().set(name, value);
    }

    /// 为某个请求索引（从 0 开始）排队响应
    pub fn queue_reply(&self, request_index: usize, reply: CommandReply) {
        self.replies
            .lock()
            .unwrap()
            .entry(request_index)
            .or_default()
            .push_back(reply);
    }

    pub fn queue_document(&self, url: &str, response: DocumentResponse) {
        self.documents
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<RowRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// 已提交请求的行索引（从 0 开始），按提交顺序
    pub fn submitted_indices(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Submit(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Fetch(_)))
            .count()
    }

    pub fn warm_up_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::WarmUp(_)))
            .count()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ArchiveSession for FakeSession {
    async fn probe_context(&self) -> Result<ContextProbe> {
        self.record(Event::Probe);
        Ok(self.probe.clone())
    }

    async fn list_rows(&self) -> Result<Vec<ArchiveRow>> {
        self.record(Event::ListRows);
        Ok(self.rows.clone())
    }

    async fn read_filter_state(&self) -> Result<FilterState> {
        self.record(Event::ReadFilter);
        Ok(self.filter.lock().unwrap().clone())
    }

    async fn submit_row(&self, request: &RowRequest) -> Result<CommandReply> {
        let index: usize = request
            .field(SELECTED_ROW_FIELD)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::Script("missing row index".to_string()))?;
        self.record(Event::Submit(index));
        self.submitted.lock().unwrap().push(request.clone());

        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&index)
            .and_then(|q| q.pop_front());
        Ok(queued.unwrap_or_else(|| {
            finished_reply(&format!("/downloadData/{}/doc_{}.pdf", index, index))
        }))
    }

    async fn fetch_document(&self, url: &str) -> Result<DocumentResponse> {
        self.record(Event::Fetch(url.to_string()));
        let queued = self
            .documents
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front());
        Ok(queued.unwrap_or_else(|| pdf_response(None)))
    }

    async fn warm_up(&self, url: &str) -> Result<()> {
        self.record(Event::WarmUp(url.to_string()));
        if self.warm_up_fails {
            return Err(AppError::Script("iframe-timeout".to_string()));
        }
        Ok(())
    }
}
