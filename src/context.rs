// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 分发上下文
//!
//! 每个请求独享一个 `DispatchContext`，动作通过它读取请求、解析结果与认证状态，
//! 并借助辅助方法生成 JSON/文本/可缓存的结果，或者带 flash 消息重定向。

use log::debug;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::action::ActionResult;
use crate::request::Request;
use crate::response::Response;
use crate::router::RequestDescriptor;
use crate::session::{lock_session, SharedSession};

pub struct DispatchContext {
    id: u128,
    request: Request,
    response: Response,
    descriptor: RequestDescriptor,
    is_auth: bool,
    session: Option<SharedSession>,
    completion: Option<oneshot::Receiver<ActionResult>>,
}

/// 延迟完成句柄。`complete` 消耗句柄本身，因此每个请求最多完成一次。
#[derive(Debug)]
pub struct Completion {
    id: u128,
    tx: oneshot::Sender<ActionResult>,
}

impl Completion {
    pub fn complete(self, result: impl Into<ActionResult>) {
        if self.tx.send(result.into()).is_err() {
            debug!("[ID{}]请求已结束，忽略迟到的完成结果", self.id);
        }
    }
}

impl DispatchContext {
    pub fn new(
        id: u128,
        request: Request,
        descriptor: RequestDescriptor,
        is_auth: bool,
        session: Option<SharedSession>,
    ) -> Self {
        Self {
            id,
            request,
            response: Response::new(),
            descriptor,
            is_auth,
            session,
            completion: None,
        }
    }

    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }

    pub(crate) fn set_descriptor(&mut self, descriptor: RequestDescriptor) {
        self.descriptor = descriptor;
    }

    pub fn controller_name(&self) -> &str {
        &self.descriptor.controller
    }

    pub fn action_name(&self) -> &str {
        &self.descriptor.action
    }

    pub fn params(&self) -> &[String] {
        &self.descriptor.params
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.descriptor.params.get(index).map(String::as_str)
    }

    pub fn is_auth(&self) -> bool {
        self.is_auth
    }

    pub fn session(&self) -> Option<&SharedSession> {
        self.session.as_ref()
    }

    pub fn as_json(&self, data: impl Into<Value>) -> ActionResult {
        ActionResult::json(data)
    }

    pub fn as_text(&self, body: impl Into<String>) -> ActionResult {
        ActionResult::text(body)
    }

    pub fn view(&self, data: impl Into<Value>) -> ActionResult {
        ActionResult::template(data)
    }

    pub fn persist_cache(&self, result: ActionResult) -> ActionResult {
        result.persisted()
    }

    /// 切换到延迟完成：动作返回 `ActionResult::pending()`，
    /// 之后在任意任务中调用 `Completion::complete`。
    pub fn defer(&mut self) -> Completion {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(rx);
        Completion { id: self.id, tx }
    }

    pub(crate) fn take_completion(&mut self) -> Option<oneshot::Receiver<ActionResult>> {
        self.completion.take()
    }

    /// 把消息存入会话 flash 槽位并 302 重定向到 `to`
    pub fn flash(&mut self, message: &str, to: &str) {
        match &self.session {
            Some(session) => lock_session(session).set_flash(message),
            None => debug!("[ID{}]请求没有会话，flash消息被丢弃", self.id),
        }
        let target = if self.request.query("json") == Some("1") {
            format!("{}?json=1", to)
        } else {
            to.to_string()
        };
        self.response.redirect(&target);
    }

    pub fn redirect(&mut self, to: &str) {
        self.response.redirect(to);
    }

    pub fn error404(&mut self) {
        self.response.not_found();
    }

    /// 读取并清除待显示的 flash 消息
    pub(crate) fn take_flash(&mut self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|session| lock_session(session).take_flash())
    }

    /// `json` 查询参数为真值，或者 `X-Requested-With: XMLHttpRequest`
    pub fn wants_json(&self) -> bool {
        let json_query = self.request.query("json").map_or(false, |v| !v.is_empty());
        let xhr = self
            .request
            .header("x-requested-with")
            .map_or(false, |v| v.eq_ignore_ascii_case("xmlhttprequest"));
        json_query || xhr
    }
}
