// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器
//!
//! 控制器是一组具名动作，外加两个保留钩子：
//! - `__before`：动作之前执行，设置 302 即可短路整个请求（登录守卫等）。
//! - `__missing_action`：请求的动作不存在时的回退处理。
//!
//! 控制器由 [`ControllerLoader`] 按名称加载。默认的 [`Registry`] 按命名约定
//! （默认 `{}_controller`）把控制器名映射为制品名，再查找注册过的工厂函数。

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::action::{ActionResult, BoxFuture};
use crate::context::DispatchContext;

pub const BEFORE_HOOK: &str = "__before";
pub const MISSING_ACTION: &str = "__missing_action";

lazy_static! {
    static ref CONTROLLER_NAME: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// 控制器能力接口，用显式的存在性查询代替按属性名探测
pub trait Controller: Send + Sync {
    fn list_actions(&self) -> Vec<&str>;

    /// 动作不存在时返回 `None`
    fn invoke<'a>(
        &'a self,
        action: &str,
        ctx: &'a mut DispatchContext,
    ) -> Option<BoxFuture<'a, ActionResult>>;

    fn has_action(&self, action: &str) -> bool {
        self.list_actions().contains(&action)
    }

    fn has_before_hook(&self) -> bool {
        self.has_action(BEFORE_HOOK)
    }

    fn has_missing_action_handler(&self) -> bool {
        self.has_action(MISSING_ACTION)
    }
}

type Action =
    Box<dyn for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ActionResult> + Send + Sync>;

/// 由闭包组成的控制器
///
/// ```ignore
/// let blog = ActionController::new()
///     .action("show", |ctx| Box::pin(async move {
///         let id = ctx.param(0).unwrap_or_default().to_string();
///         ctx.view(json!({ "id": id }))
///     }));
/// ```
#[derive(Default)]
pub struct ActionController {
    actions: HashMap<String, Action>,
}

impl ActionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action<F>(mut self, name: &str, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(name.to_string(), Box::new(f));
        self
    }

    pub fn before<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.action(BEFORE_HOOK, f)
    }

    pub fn missing_action<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut DispatchContext) -> BoxFuture<'a, ActionResult>
            + Send
            + Sync
            + 'static,
    {
        self.action(MISSING_ACTION, f)
    }
}

impl Controller for ActionController {
    fn list_actions(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    fn invoke<'a>(
        &'a self,
        action: &str,
        ctx: &'a mut DispatchContext,
    ) -> Option<BoxFuture<'a, ActionResult>> {
        self.actions.get(action).map(|f| f(ctx))
    }

    fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }
}

/// 按控制器名定位并构造控制器
#[cfg_attr(test, mockall::automock)]
pub trait ControllerLoader: Send + Sync {
    fn load(&self, name: &str) -> Option<Arc<dyn Controller>>;
}

type Factory = Box<dyn Fn() -> Arc<dyn Controller> + Send + Sync>;

/// 以命名约定为键的控制器注册表
pub struct Registry {
    naming: String,
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// `naming` 中的 `{}` 会被替换为控制器名，例如 `{}_controller`
    pub fn new(naming: &str) -> Self {
        Self {
            naming: naming.to_string(),
            factories: HashMap::new(),
        }
    }

    pub fn artifact_name(&self, controller: &str) -> String {
        self.naming.replace("{}", controller)
    }

    /// 以制品名注册，例如 `blog_controller`
    pub fn register<F>(&mut self, artifact: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Controller> + Send + Sync + 'static,
    {
        self.factories.insert(artifact.to_string(), Box::new(factory));
        self
    }

    /// 以控制器名注册，制品名由命名约定推出
    pub fn register_controller<F>(&mut self, controller: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Controller> + Send + Sync + 'static,
    {
        let artifact = self.artifact_name(controller);
        self.register(&artifact, factory)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new("{}_controller")
    }
}

impl ControllerLoader for Registry {
    fn load(&self, name: &str) -> Option<Arc<dyn Controller>> {
        if !CONTROLLER_NAME.is_match(name) {
            debug!("非法的控制器名：{}", name);
            return None;
        }
        let artifact = self.artifact_name(name);
        match self.factories.get(&artifact) {
            Some(factory) => {
                debug!("加载控制器{}（{}）", name, artifact);
                Some(factory())
            }
            None => {
                debug!("找不到控制器制品：{}", artifact);
                None
            }
        }
    }
}
