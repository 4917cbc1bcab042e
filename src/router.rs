// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由解析模块
//!
//! 把原始 URL 转换为 `RequestDescriptor`（控制器名、动作名、位置参数）。
//!
//! ## 解析规则
//! 1. 去掉查询字符串。
//! 2. 路径命中路由表时替换为映射值；否则在回退尝试中为路径加上
//!    `__missing_controller` 指定的前缀。
//! 3. 按 `/` 切分：第 1 段为控制器（缺省 `pages`），第 2 段为动作（缺省 `index`），
//!    其余为位置参数。

use std::collections::HashMap;

use crate::param::HttpRequestMethod;

/// 路由表中表示“找不到控制器时的回退前缀”的特殊键
pub const MISSING_CONTROLLER: &str = "__missing_controller";

pub const DEFAULT_CONTROLLER: &str = "pages";
pub const DEFAULT_ACTION: &str = "index";

/// 每个请求解析一次的结构化描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub controller: String,
    pub action: String,
    pub params: Vec<String>,
}

impl RequestDescriptor {
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').collect();
        let segment = |i: usize, default: &str| match segments.get(i) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => default.to_string(),
        };
        Self {
            controller: segment(1, DEFAULT_CONTROLLER),
            action: segment(2, DEFAULT_ACTION),
            params: segments.iter().skip(3).map(|s| s.to_string()).collect(),
        }
    }

    /// 非 GET 请求的动作名追加 `_<method>` 后缀，例如 `create_post`
    pub fn apply_method(&mut self, method: HttpRequestMethod) {
        if method != HttpRequestMethod::Get {
            self.action = format!("{}_{}", self.action, method.suffix());
        }
    }

    /// 改为调用 `__missing_action`，原动作名写入 `params[0]`
    pub fn fall_back_to(&mut self, handler: &str) {
        let original = std::mem::replace(&mut self.action, handler.to_string());
        match self.params.first_mut() {
            Some(first) => *first = original,
            None => self.params.push(original),
        }
    }
}

/// 进程启动时加载、之后只读的路由别名表
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    pub fn new(routes: HashMap<String, String>) -> Self {
        Self { routes }
    }

    pub fn missing_controller(&self) -> Option<&str> {
        self.routes.get(MISSING_CONTROLLER).map(String::as_str)
    }

    pub fn resolve(&self, url: &str, fallback: bool) -> RequestDescriptor {
        let path = match url.split_once('?') {
            Some((path, _)) => path,
            None => url,
        };
        let rewritten = match self.routes.get(path) {
            Some(target) => target.clone(),
            None => match self.missing_controller() {
                Some(prefix) if fallback => format!("{}{}", prefix, path),
                _ => path.to_string(),
            },
        };
        RequestDescriptor::parse(&rewritten)
    }
}
