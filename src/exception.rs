// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 定义请求解析、控制器分发与视图渲染过程中可能出现的异常。
//!
//! ## 传播策略
//! - **解析阶段**（控制器/动作查找）的失败不会成为 `Exception`，分发器会就地转换为 404。
//! - **渲染阶段**（模板缺失、模板语法错误、动作放弃完成）的失败会原样返回给传输层，
//!   由传输层自己的错误路径输出 500。

use std::fmt;

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了服务器不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求行缺少必要的组成部分。
    MalformedRequest,
    /// 配置文件无法读取或格式非法。
    ConfigError(String),
    /// 控制器既没有请求的动作，也没有 `__missing_action`。属于调用方的配置缺陷。
    MissingActionHandler { controller: String, action: String },
    /// 模板文件不存在或无法读取。
    TemplateNotFound(String),
    /// 模板编译或渲染失败。
    TemplateError(String),
    /// 结果数据无法序列化为 JSON。
    SerializeError(String),
    /// 延迟完成的动作在调用完成句柄之前将其丢弃。
    ActionAbandoned,
    /// 动作在配置的超时时间内没有完成。
    ActionTimedOut,
}

use Exception::*;

impl Exception {
    /// 传输层应为该异常返回的状态码
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | UnSupportedRequestMethod | UnsupportedHttpVersion
            | MalformedRequest => 400,
            ActionTimedOut => 504,
            _ => 500,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            MalformedRequest => write!(f, "Malformed request line"),
            ConfigError(msg) => write!(f, "Invalid configuration: {}", msg),
            MissingActionHandler { controller, action } => write!(
                f,
                "Controller '{}' has neither action '{}' nor __missing_action",
                controller, action
            ),
            TemplateNotFound(path) => write!(f, "Template not found: {}", path),
            TemplateError(msg) => write!(f, "Template error: {}", msg),
            SerializeError(msg) => write!(f, "JSON serialization failed: {}", msg),
            ActionAbandoned => write!(f, "Action dropped its completion handle"),
            ActionTimedOut => write!(f, "Action did not complete in time"),
        }
    }
}

impl std::error::Error for Exception {}
