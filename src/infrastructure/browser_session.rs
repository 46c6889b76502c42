//! 浏览器归档会话
//!
//! 通过 JsExecutor 在页面内读取状态、提交请求、加载预热 iframe；
//! 文档下载用 reqwest，并带上浏览器当前的 Cookie。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT,
};
use serde_json::{json, Value as JsonValue};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::session::{ArchiveSession, CommandReply, ContextProbe, DocumentResponse};
use crate::models::filter::default_date_range_today;
use crate::models::{ArchiveRow, FilterSource, FilterState, FILTER_FIELDS, ROW_SELECTOR};
use crate::services::request_builder::RowRequest;

/// 预热 iframe 加载超时（毫秒）
const WARM_UP_LOAD_TIMEOUT_MS: u64 = 30_000;

/// 基于真实浏览器页面的归档会话
pub struct BrowserSession {
    executor: JsExecutor,
    http: reqwest::Client,
    warmup_settle: Duration,
    user_agent: OnceCell<String>,
}

impl BrowserSession {
    pub fn new(executor: JsExecutor, config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            executor,
            http,
            warmup_settle: config.warmup_settle,
            user_agent: OnceCell::new(),
        })
    }

    async fn user_agent(&self) -> Result<&str> {
        let ua = self
            .user_agent
            .get_or_try_init(|| async {
                self.executor
                    .eval_as::<String>("navigator.userAgent")
                    .await
            })
            .await?;
        Ok(ua.as_str())
    }

    /// 当前页面中适用于目标主机的 Cookie
    async fn cookie_header(&self, host: &str) -> Result<Option<String>> {
        let cookies = self
            .executor
            .page()
            .get_cookies()
            .await
            .map_err(|e| AppError::Script(format!("读取 Cookie 失败: {}", e)))?;

        Ok(cookie_header_for(
            host,
            cookies
                .iter()
                .map(|c| (c.name.as_str(), c.value.as_str(), c.domain.as_str())),
        ))
    }

    async fn page_url(&self) -> Result<String> {
        self.executor.eval_as::<String>("location.href").await
    }
}

#[async_trait]
impl ArchiveSession for BrowserSession {
    async fn probe_context(&self) -> Result<ContextProbe> {
        self.executor.eval_as(PROBE_CONTEXT_JS).await
    }

    async fn list_rows(&self) -> Result<Vec<ArchiveRow>> {
        let js = format!(
            r#"
            ((selector) => Array.from(document.querySelectorAll(selector)).map((tr, i) => ({{
                position: i + 1,
                text: (tr.innerText || tr.textContent || '').replace(/\s+/g, ' ').trim()
            }})))({})
            "#,
            serde_json::to_string(ROW_SELECTOR)?
        );
        self.executor.eval_as(js).await
    }

    async fn read_filter_state(&self) -> Result<FilterState> {
        let (start, end) = default_date_range_today();
        let js = format!(
            r#"
            ((fields) => fields.map((f) => {{
                if (f.source === 'const') return [f.name, f.fallback];
                const el = f.selector ? document.querySelector(f.selector) : null;
                if (!el) return [f.name, f.fallback];
                if (f.source === 'value') {{
                    return [f.name, ('value' in el && el.value) ? String(el.value) : f.fallback];
                }}
                const v = el.dataset ? el.dataset.valueSelecteditemindex : undefined;
                return [f.name, String(v ?? f.fallback)];
            }}))({})
            "#,
            filter_field_descriptors(&start, &end)
        );
        self.executor.eval_as(js).await
    }

    async fn submit_row(&self, request: &RowRequest) -> Result<CommandReply> {
        let payload = json!({
            "url": request.url,
            "headers": request.headers,
            "body": request.encoded_body(),
        });
        let js = format!(
            r#"
            (async (req) => {{
                const headers = Object.assign(
                    {{ 'content-type': 'application/x-www-form-urlencoded; charset=UTF-8' }},
                    Object.fromEntries(req.headers)
                );
                const res = await fetch(req.url, {{
                    method: 'POST',
                    credentials: 'include',
                    headers,
                    body: req.body
                }});
                return {{ status: res.status, body: await res.text() }};
            }})({})
            "#,
            payload
        );
        self.executor.eval_as(js).await
    }

    async fn fetch_document(&self, url: &str) -> Result<DocumentResponse> {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let cookies = self.cookie_header(&host).await?;
        let user_agent = self.user_agent().await?.to_string();
        let referer = self.page_url().await?;

        let mut request = self
            .http
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(REFERER, referer);
        if let Some(cookies) = cookies {
            request = request.header(COOKIE, cookies);
        }

        let transport = |e: reqwest::Error| AppError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = request.send().await.map_err(transport)?;

        let status = response.status().as_u16();
        let (content_type, content_disposition) = {
            let headers = response.headers();
            (
                header_value(headers, CONTENT_TYPE),
                header_value(headers, CONTENT_DISPOSITION),
            )
        };
        let body = response.bytes().await.map_err(transport)?.to_vec();
        debug!("GET {} → {} ({} 字节)", url, status, body.len());

        Ok(DocumentResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }

    async fn warm_up(&self, url: &str) -> Result<()> {
        debug!("预热: {}", url);
        let js = format!(
            r#"
            (async (url, loadTimeoutMs, settleMs) => {{
                const frame = document.createElement('iframe');
                frame.style.visibility = 'hidden';
                frame.style.opacity = '0';
                frame.style.width = '0';
                frame.style.height = '0';

                await new Promise((resolve, reject) => {{
                    const t = window.setTimeout(() => reject(new Error('iframe-timeout')), loadTimeoutMs);
                    frame.addEventListener('load', () => {{
                        window.clearTimeout(t);
                        resolve(null);
                    }}, {{ once: true }});
                    frame.src = url;
                    document.body.appendChild(frame);
                }});

                await new Promise((resolve) => setTimeout(resolve, settleMs));
                frame.remove();
                return true;
            }})({}, {}, {})
            "#,
            serde_json::to_string(url)?,
            WARM_UP_LOAD_TIMEOUT_MS,
            self.warmup_settle.as_millis()
        );
        self.executor.eval(js).await?;
        Ok(())
    }
}

const PROBE_CONTEXT_JS: &str = r#"
(() => {
    let statePresent = false;
    let tokenId = '';
    let windowId = '';
    try {
        const core = window.webcore;
        statePresent = !!core;
        tokenId = core?.getTokenId?.() || '';
        windowId = core?.getWindowManagement?.().getCurrentWindowId?.() || '';
    } catch (_) {
        // 读取失败时保留空值
    }
    return {
        statePresent,
        pageUrl: location.href,
        tokenId: String(tokenId),
        windowId: String(windowId)
    };
})()
"#;

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 传给页面脚本的筛选字段描述
fn filter_field_descriptors(default_start: &str, default_end: &str) -> JsonValue {
    let fields: Vec<JsonValue> = FILTER_FIELDS
        .iter()
        .map(|field| {
            let (source, fallback) = match field.source {
                FilterSource::Value if field.name.contains("startDate") => ("value", default_start),
                FilterSource::Value => ("value", default_end),
                FilterSource::SelectedIndex => ("index", "0"),
                FilterSource::Constant(value) => ("const", value),
            };
            json!({
                "name": field.name,
                "selector": field.selector,
                "source": source,
                "fallback": fallback,
            })
        })
        .collect();
    JsonValue::Array(fields)
}

/// 拼接适用于主机的 Cookie 头
///
/// 域名以 `.` 开头或为父域时匹配子域名。
fn cookie_header_for<'a>(
    host: &str,
    cookies: impl Iterator<Item = (&'a str, &'a str, &'a str)>,
) -> Option<String> {
    let host = host.to_ascii_lowercase();
    let pairs: Vec<String> = cookies
        .filter(|(_, _, domain)| {
            let domain = domain.trim_start_matches('.').to_ascii_lowercase();
            !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
        })
        .map(|(name, value, _)| format!("{}={}", name, value))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
