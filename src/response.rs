// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use crate::param::*;

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};

use std::io::{self, Write};

/// 小于该长度的响应体不值得压缩
const MIN_COMPRESS_SIZE: usize = 256;

/// 分发过程中逐步填充、最后由传输层写出的响应。
#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_encoding: Option<HttpEncoding>,
    date: DateTime<Utc>,
    server_name: String,
    location: Option<String>,
    set_cookie: Vec<String>,
    content: Bytes,
    ended: bool,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_encoding: None,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            location: None,
            set_cookie: vec![],
            content: Bytes::new(),
            ended: false,
        }
    }

    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&reason) => reason.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明代码编写出现了错误。", code);
                "Unknown".to_string()
            }
        };
        self
    }

    pub fn set_content_type(&mut self, content_type: &str) -> &mut Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) -> &mut Self {
        self.set_cookie
            .push(format!("{}={}; Path=/; HttpOnly", name, value));
        self
    }

    /// 写入响应体并结束响应。每个请求只应调用一次，重复调用以最后一次为准。
    pub fn end(&mut self, body: impl Into<Bytes>) -> &mut Self {
        if self.ended {
            warn!("响应已经结束，重复写入将覆盖之前的内容");
        }
        self.content = body.into();
        self.ended = true;
        self.date = Utc::now();
        self
    }

    pub fn redirect(&mut self, to: &str) -> &mut Self {
        self.set_code(302);
        self.location = Some(to.to_string());
        self.end(Bytes::new())
    }

    pub fn not_found(&mut self) -> &mut Self {
        self.set_code(404);
        self.end("Not Found")
    }

    /// 传输层在分发失败时使用的错误页
    pub fn error_page(code: u16) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        let html = format!(
            "<html><head><title>{code}</title></head><body><h1>{code}</h1><p>{}</p></body></html>",
            response.information
        );
        response.set_content_type(DEFAULT_CONTENT_TYPE);
        response.end(html);
        response
    }

    /// 按客户端支持的编码压缩响应体，压缩失败时保留原始内容
    pub fn encode(&mut self, accept_encoding: &[HttpEncoding], id: u128) -> &mut Self {
        if self.content.len() < MIN_COMPRESS_SIZE || self.content_encoding.is_some() {
            return self;
        }
        let encoding = decide_encoding(accept_encoding);
        if encoding.is_none() {
            return self;
        }
        match compress(self.content.to_vec(), encoding) {
            Ok(c) => {
                debug!("[ID{}]使用{:?}编码，{} -> {} bytes", id, encoding, self.content.len(), c.len());
                self.content = Bytes::from(c);
                self.content_encoding = encoding;
            }
            Err(e) => {
                error!("[ID{}]压缩响应失败: {}，返回未压缩内容", id, e);
            }
        }
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version, self.status_code, self.information, CRLF
        );
        if let Some(t) = &self.content_type {
            header.push_str(&["Content-Type: ", t, CRLF].concat());
        }
        if let Some(e) = self.content_encoding {
            header.push_str(&format!("Content-Encoding: {}{}", e, CRLF));
        }
        if let Some(l) = &self.location {
            header.push_str(&["Location: ", l, CRLF].concat());
        }
        for cookie in &self.set_cookie {
            header.push_str(&["Set-Cookie: ", cookie, CRLF].concat());
        }
        header.push_str(&format!("Content-Length: {}{}", self.content.len(), CRLF));
        header.push_str(&["Date: ", &format_date(&self.date), CRLF].concat());
        header.push_str(&["Server: ", &self.server_name, CRLF].concat());
        header.push_str(CRLF);
        [header.as_bytes(), &self.content[..]].concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.content
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.content).unwrap_or_default()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_redirect(&self) -> bool {
        self.status_code == 302
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    }
}

/// 优先级：br > gzip > deflate
fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Br) {
        Some(HttpEncoding::Br)
    } else if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else {
        None
    }
}
