// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! 将 TCP 流中读取的原始字节解析为 `Request`。分发器只依赖其中几项信息：
//! 1. 请求方法（决定动作名后缀）。
//! 2. 完整 URL（响应缓存的键）与去掉查询串后的路由路径。
//! 3. `X-Requested-With` 等标头和 `json` 查询参数（内容协商）。
//! 4. Cookie（会话）与 `Accept-Encoding`（传输层压缩）。

use crate::{exception::Exception, param::*};
use log::error;
use url::form_urlencoded;

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpRequestMethod,
    /// 请求目标，包含查询字符串
    url: String,
    version: HttpVersion,
    /// 按出现顺序保存的标头，名称保留原始大小写
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    accept_encoding: Vec<HttpEncoding>,
    body: String,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string.trim_end_matches('\0'),
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let (head, body) = match request_string.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body),
            None => (request_string, ""),
        };
        let mut request_lines = head.split(CRLF);

        // 请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line = request_lines.next().unwrap_or_default();
        let first_line_parts: Vec<&str> = first_line.split(' ').collect();
        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, first_line);
            return Err(Exception::MalformedRequest);
        }

        let method = match HttpRequestMethod::parse(first_line_parts[0]) {
            Some(m) => m,
            None => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" | "HTTP/1.0" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能含有未编码的空格，尝试用 join 恢复
        let url = first_line_parts[1..first_line_parts.len() - 1].join(" ");

        let mut headers = vec![];
        for line in request_lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let mut request = Self {
            method,
            query: parse_query(&url),
            url,
            version,
            headers,
            accept_encoding: vec![],
            body: body.to_string(),
        };
        request.accept_encoding = parse_accept_encoding(request.header("accept-encoding"));
        Ok(request)
    }

    /// 不经过字节解析直接构造请求，供测试与嵌入式调用使用
    pub fn builder(method: HttpRequestMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            version: HttpVersion::V1_1,
            headers: vec![],
            query: parse_query(url),
            accept_encoding: vec![],
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        if name.eq_ignore_ascii_case("accept-encoding") {
            self.accept_encoding = parse_accept_encoding(Some(value));
        }
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

fn parse_query(url: &str) -> Vec<(String, String)> {
    match url.split_once('?') {
        Some((_, query)) => parse_urlencoded(query),
        None => vec![],
    }
}

/// 按 `application/x-www-form-urlencoded` 规则解码，`+` 与 `%XX` 都会被还原
fn parse_urlencoded(input: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// 只要包含关键词即视为支持
fn parse_accept_encoding(value: Option<&str>) -> Vec<HttpEncoding> {
    let mut accept_encoding = vec![];
    if let Some(val) = value {
        let val = val.to_lowercase();
        if val.contains("gzip") {
            accept_encoding.push(HttpEncoding::Gzip);
        }
        if val.contains("deflate") {
            accept_encoding.push(HttpEncoding::Deflate);
        }
        if val.contains("br") {
            accept_encoding.push(HttpEncoding::Br);
        }
    }
    accept_encoding
}

impl Request {
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 请求目标（含查询参数），也是响应缓存的键
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 去掉查询参数后的路径
    pub fn path(&self) -> &str {
        match self.url.split_once('?') {
            Some((path, _)) => path,
            None => &self.url,
        }
    }

    /// 按名称获取标头（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 重复的查询参数以最后一次出现为准
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or_default()
    }

    pub fn accept_encoding(&self) -> &[HttpEncoding] {
        &self.accept_encoding
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 解析 `application/x-www-form-urlencoded` 请求体中的字段
    pub fn form(&self, name: &str) -> Option<String> {
        parse_urlencoded(&self.body)
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}
