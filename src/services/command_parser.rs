//! 响应命令解析 - 业务能力层
//!
//! 服务器用伪函数调用文本传递状态，例如：
//!
//! ```text
//! DocumentViewer.finished("/banking-flatex.at/downloadData/123/file.pdf", "Abrechnung")
//! DocumentViewer.display("/banking-flatex.at/documentViewer.do?x=1", 800, 600)
//! ```
//!
//! 解析器容忍空白和引号差异，但不会猜测：格式不完整一律报错。

use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::{AppError, Result};

/// 解析后的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 终态：PDF 地址可用
    Finished(String),
    /// 中间态：需要继续处理或跳转
    Display(String),
    /// 无法识别
    Unrecognized,
}

const FINISHED: &str = "finished";
const DISPLAY: &str = "display";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    commands: Vec<JsonValue>,
}

/// 解析行请求的响应体
///
/// 响应可能是 `{"commands":[{"command":"execute","script":"..."}]}` 形式的 JSON，
/// 也可能直接是脚本文本。
pub fn parse_reply(body: &str) -> Result<Command> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        let envelope: Envelope = serde_json::from_str(trimmed)
            .map_err(|e| AppError::Parse(format!("响应 JSON 无效: {}", e)))?;
        let script = envelope
            .commands
            .iter()
            .find(|cmd| cmd.get("command").and_then(|c| c.as_str()) == Some("execute"))
            .and_then(|cmd| cmd.get("script"))
            .and_then(|s| s.as_str())
            .ok_or_else(|| AppError::Parse("缺少 execute 命令".to_string()))?;
        return parse_command(script);
    }
    parse_command(trimmed)
}

/// 解析脚本文本，无法识别时返回 `AppError::Parse`
pub fn parse_command(script: &str) -> Result<Command> {
    match classify(script)? {
        Command::Unrecognized => Err(AppError::Parse(
            "没有找到 finished(...) 或 display(...) 调用".to_string(),
        )),
        command => Ok(command),
    }
}

/// 对脚本分类
///
/// 找到调用但格式错误时返回错误；完全没有调用时返回 `Unrecognized`。
/// `finished` 优先于 `display`。
pub fn classify(script: &str) -> Result<Command> {
    if let Some(arg) = find_call(script, FINISHED)? {
        return Ok(Command::Finished(arg));
    }
    if let Some(arg) = find_call(script, DISPLAY)? {
        return Ok(Command::Display(arg));
    }
    Ok(Command::Unrecognized)
}

/// 把命令中的地址还原为绝对 URL
///
/// 处理 JS 转义的 `\/` 和 `\u0026`，相对地址以归档页面为基准。
pub fn resolve_command_url(raw: &str, base_url: &str) -> Result<String> {
    let unescaped = raw.replace("\\/", "/").replace("\\u0026", "&");
    let base = Url::parse(base_url)
        .map_err(|e| AppError::Parse(format!("页面地址无效 ({}): {}", base_url, e)))?;
    let joined = base
        .join(&unescaped)
        .map_err(|e| AppError::Parse(format!("命令地址无效 ({}): {}", unescaped, e)))?;
    Ok(joined.to_string())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// 查找第一个 `name(` 调用并返回首个参数
///
/// 字符串字面量内部的文本不算调用。
fn find_call(script: &str, name: &str) -> Result<Option<String>> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;

    for (start, c) in script.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            prev = Some(c);
            continue;
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
        } else if !prev.map(is_ident_char).unwrap_or(false) && script[start..].starts_with(name) {
            let after_name = start + name.len();
            let rest = &script[after_name..];
            let trimmed = rest.trim_start();
            if trimmed.starts_with('(') {
                let args_offset = after_name + (rest.len() - trimmed.len()) + 1;
                return parse_call_args(&script[args_offset..], name).map(Some);
            }
        }
        prev = Some(c);
    }
    Ok(None)
}

/// 解析调用参数：第一个参数必须是非空字符串字面量，且调用必须闭合
fn parse_call_args(args: &str, name: &str) -> Result<String> {
    let args = args.trim_start();
    let mut chars = args.char_indices();

    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        Some((_, ')')) => return Err(AppError::Parse(format!("{}() 参数为空", name))),
        Some(_) => {
            return Err(AppError::Parse(format!(
                "{}(...) 的第一个参数不是字符串",
                name
            )))
        }
        None => return Err(AppError::Parse(format!("{}( 缺少右括号", name))),
    };

    let mut literal_end = None;
    let mut escaped = false;
    for (i, c) in chars.by_ref() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            literal_end = Some(i);
            break;
        }
    }
    let literal_end =
        literal_end.ok_or_else(|| AppError::Parse(format!("{}(...) 字符串未闭合", name)))?;

    let literal = &args[1..literal_end];
    if literal.trim().is_empty() {
        return Err(AppError::Parse(format!("{}(...) 参数为空", name)));
    }

    let tail = &args[literal_end + quote.len_utf8()..];
    match tail.trim_start().chars().next() {
        Some(')') => Ok(literal.to_string()),
        Some(',') if closes_call(tail) => Ok(literal.to_string()),
        Some(',') | None => Err(AppError::Parse(format!("{}(...) 缺少右括号", name))),
        Some(other) => Err(AppError::Parse(format!(
            "{}(...) 参数后出现意外字符 '{}'",
            name, other
        ))),
    }
}

/// 剩余参数中是否有与调用配对的右括号（跳过字符串和嵌套括号）
fn closes_call(tail: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in tail.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            ')' if depth == 0 => return true,
            ')' => depth -= 1,
            _ => {}
        }
    }
    false
}
