// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 动作结果
//!
//! 动作返回的是带标签的结果，而不是在数据映射里塞入保留字段：
//! - `Json`：强制以 JSON 输出。
//! - `Text`：直接输出预先格式化好的文本。
//! - `Template`：交给视图渲染（同时仍受内容协商影响）。
//! - `Pending`：动作稍后通过 [`Completion`](crate::context::Completion) 句柄完成。
//!
//! 是否写入响应缓存由 `persist` 标志单独表示。

use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

/// 动作交给视图或 JSON 序列化的数据映射
pub type Data = Map<String, Value>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Json(Data),
    Text(String),
    Template(Data),
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    outcome: Outcome,
    persist: bool,
}

impl ActionResult {
    pub fn json(data: impl Into<Value>) -> Self {
        Outcome::Json(into_data(data.into())).into()
    }

    pub fn text(body: impl Into<String>) -> Self {
        Outcome::Text(body.into()).into()
    }

    pub fn template(data: impl Into<Value>) -> Self {
        Outcome::Template(into_data(data.into())).into()
    }

    pub fn pending() -> Self {
        Outcome::Pending.into()
    }

    /// 标记该结果可写入响应缓存
    pub fn persisted(mut self) -> Self {
        self.persist = true;
        self
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Pending
    }

    pub fn is_persisted(&self) -> bool {
        self.persist
    }

    pub fn into_parts(self) -> (Outcome, bool) {
        (self.outcome, self.persist)
    }
}

impl From<Outcome> for ActionResult {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            persist: false,
        }
    }
}

impl From<Data> for ActionResult {
    fn from(data: Data) -> Self {
        Outcome::Template(data).into()
    }
}

/// 非对象的值放在 `data` 键下
pub fn into_data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        Value::Null => Data::new(),
        other => {
            let mut map = Data::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}
