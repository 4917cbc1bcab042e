// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 动作分发器
//!
//! 单个请求的生命周期：
//!
//! ```text
//! START → CONTEXT_BUILT → CONTROLLER_RESOLVED (或 404，终止)
//!       → BEFORE_HOOK_RUN (302 时终止) → ACTION_SELECTED → RENDERED (终止)
//! ```
//!
//! 解析阶段的失败在本地转换为 404；渲染阶段的失败以 `Exception` 返回给传输层。

use bytes::Bytes;
use log::{debug, info, warn};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::action::{ActionResult, Data, Outcome};
use crate::cache::{CacheService, Lookup};
use crate::config::Config;
use crate::context::DispatchContext;
use crate::controller::{Controller, ControllerLoader, BEFORE_HOOK, MISSING_ACTION};
use crate::exception::Exception;
use crate::param::{DEFAULT_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::request::Request;
use crate::response::Response;
use crate::router::RouteTable;
use crate::session::{Authenticator, SharedSession};

/// 启动时读取一次的分发参数
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub cache: bool,
    pub views_path: PathBuf,
    pub template_ext: String,
    pub action_timeout: Option<Duration>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            cache: false,
            views_path: PathBuf::from("app/views"),
            template_ext: "html".to_string(),
            action_timeout: None,
        }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            cache: config.cache_enabled(),
            views_path: config.views_path(),
            template_ext: config.template_ext().to_string(),
            action_timeout: config.action_timeout(),
        }
    }
}

/// 内容协商的结果
#[derive(Debug, PartialEq)]
enum Negotiated {
    Json(Data),
    Text(String),
    Template(Data),
}

pub struct Dispatcher {
    options: DispatchOptions,
    routes: RouteTable,
    loader: Box<dyn ControllerLoader>,
    authenticator: Option<Box<dyn Authenticator>>,
    caches: CacheService,
}

impl Dispatcher {
    pub fn new(
        options: DispatchOptions,
        routes: RouteTable,
        loader: impl ControllerLoader + 'static,
    ) -> Self {
        Self {
            options,
            routes,
            loader: Box::new(loader),
            authenticator: None,
            caches: CacheService::new(),
        }
    }

    pub fn from_config(config: &Config, loader: impl ControllerLoader + 'static) -> Self {
        Self::new(
            DispatchOptions::from(config),
            RouteTable::new(config.routes().clone()),
            loader,
        )
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Box::new(authenticator));
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn caches(&self) -> &CacheService {
        &self.caches
    }

    /// 处理一个请求并返回最终响应。
    ///
    /// 控制器或动作找不到时返回 404 响应；模板错误、动作放弃完成等渲染阶段的错误返回 `Err`。
    pub async fn dispatch(
        &self,
        id: u128,
        request: Request,
        session: Option<SharedSession>,
    ) -> Result<Response, Exception> {
        let is_auth = self
            .authenticator
            .as_ref()
            .map_or(false, |a| a.is_authenticated(&request, session.as_ref()));
        let mut descriptor = self.routes.resolve(request.url(), false);
        descriptor.apply_method(request.method());
        debug!("[ID{}]解析请求：{:?}", id, descriptor);
        let mut ctx = DispatchContext::new(id, request, descriptor, is_auth, session);

        let controller = match self.find_controller(&mut ctx) {
            Some(c) => c,
            None => {
                warn!("[ID{}]找不到控制器：{}，返回404", id, ctx.controller_name());
                ctx.error404();
                return Ok(ctx.into_response());
            }
        };

        if controller.has_before_hook() {
            if let Some(hook) = controller.invoke(BEFORE_HOOK, &mut ctx) {
                hook.await;
            }
            if ctx.response().is_redirect() {
                debug!("[ID{}]__before钩子已重定向，停止分发", id);
                return Ok(ctx.into_response());
            }
        }

        if !controller.has_action(ctx.action_name()) {
            if !controller.has_missing_action_handler() {
                return Err(Exception::MissingActionHandler {
                    controller: ctx.controller_name().to_string(),
                    action: ctx.action_name().to_string(),
                });
            }
            info!(
                "[ID{}]控制器{}没有动作{}，改用{}",
                id,
                ctx.controller_name(),
                ctx.action_name(),
                MISSING_ACTION
            );
            ctx.descriptor_mut().fall_back_to(MISSING_ACTION);
        }

        self.render(controller.as_ref(), &mut ctx).await?;
        Ok(ctx.into_response())
    }

    /// 查找控制器；制品不存在且配置了 `__missing_controller` 时按回退前缀重新解析，至多重试一次
    fn find_controller(&self, ctx: &mut DispatchContext) -> Option<Arc<dyn Controller>> {
        let mut retried = false;
        loop {
            let lookup = self.caches.controllers.get_or_load(
                ctx.controller_name(),
                ctx.action_name(),
                self.loader.as_ref(),
            );
            match lookup {
                Lookup::Found(controller) => return Some(controller),
                Lookup::Rejected => return None,
                Lookup::Missing if retried || self.routes.missing_controller().is_none() => {
                    return None
                }
                Lookup::Missing => {
                    retried = true;
                    let mut descriptor = self.routes.resolve(ctx.request().url(), true);
                    descriptor.apply_method(ctx.request().method());
                    debug!("[ID{}]控制器回退为：{:?}", ctx.id(), descriptor);
                    ctx.set_descriptor(descriptor);
                }
            }
        }
    }

    /// 单个动作的渲染流程：响应缓存 → 调用动作 → 等待延迟完成 → 内容协商 → 写出
    async fn render(
        &self,
        controller: &dyn Controller,
        ctx: &mut DispatchContext,
    ) -> Result<(), Exception> {
        let cache_key = ctx.request().url().to_string();
        if self.options.cache {
            if let Some(hit) = self.caches.responses.find(&cache_key) {
                debug!("[ID{}]响应缓存命中：{}", ctx.id(), cache_key);
                let response = ctx.response_mut();
                response.set_content_type(hit.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE));
                response.end(hit.body);
                return Ok(());
            }
        }

        let name = ctx.controller_name().to_string();
        let action = ctx.action_name().to_string();
        let mut result = match controller.invoke(&action, ctx) {
            Some(future) => self.with_timeout(future).await?,
            None => {
                return Err(Exception::MissingActionHandler {
                    controller: name,
                    action,
                })
            }
        };

        if ctx.response().is_ended() {
            debug!("[ID{}]动作已自行写出响应，跳过渲染", ctx.id());
            return Ok(());
        }

        if result.is_pending() {
            let completion = ctx.take_completion().ok_or(Exception::ActionAbandoned)?;
            result = self
                .with_timeout(completion)
                .await?
                .map_err(|_| Exception::ActionAbandoned)?;
            if result.is_pending() {
                return Err(Exception::ActionAbandoned);
            }
        }

        self.complete(ctx, result, &cache_key)
    }

    async fn with_timeout<F: Future>(&self, future: F) -> Result<F::Output, Exception> {
        match self.options.action_timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| Exception::ActionTimedOut),
            None => Ok(future.await),
        }
    }

    /// 同步与延迟两种约定的汇合点，每个请求只执行一次
    fn complete(
        &self,
        ctx: &mut DispatchContext,
        result: ActionResult,
        cache_key: &str,
    ) -> Result<(), Exception> {
        let flash = ctx.take_flash();
        let (outcome, persist) = result.into_parts();
        let negotiated = negotiate(outcome, ctx.wants_json());

        let (body, content_type) = match negotiated {
            Negotiated::Json(data) => {
                let data = merge_locals(data, flash, ctx.is_auth());
                let body = serde_json::to_string(&data)
                    .map_err(|e| Exception::SerializeError(e.to_string()))?;
                (body, JSON_CONTENT_TYPE)
            }
            Negotiated::Text(text) => (text, DEFAULT_CONTENT_TYPE),
            Negotiated::Template(data) => {
                let data = merge_locals(data, flash, ctx.is_auth());
                let path = self.template_path(ctx.controller_name(), ctx.action_name());
                debug!("[ID{}]渲染模板：{}", ctx.id(), path.display());
                let body = self.caches.views.render(&path, &data, self.options.cache)?;
                (body, DEFAULT_CONTENT_TYPE)
            }
        };

        let body = Bytes::from(body);
        let response = ctx.response_mut();
        response.set_code(200).set_content_type(content_type);
        response.end(body.clone());

        if self.options.cache && persist {
            debug!("[ID{}]写入响应缓存：{}", ctx.id(), cache_key);
            self.caches
                .responses
                .push(cache_key, body, Some(content_type.to_string()));
        }
        Ok(())
    }

    pub fn template_path(&self, controller: &str, action: &str) -> PathBuf {
        self.options
            .views_path
            .join(controller)
            .join(format!("{}.{}", action, self.options.template_ext))
    }
}

/// 优先级：显式 JSON 或客户端要求 JSON → 预格式化文本 → 模板
fn negotiate(outcome: Outcome, wants_json: bool) -> Negotiated {
    match outcome {
        Outcome::Json(data) => Negotiated::Json(data),
        Outcome::Template(data) if wants_json => Negotiated::Json(data),
        Outcome::Text(text) if wants_json => {
            let mut data = Data::new();
            data.insert("text".to_string(), Value::String(text));
            Negotiated::Json(data)
        }
        Outcome::Text(text) => Negotiated::Text(text),
        Outcome::Template(data) => Negotiated::Template(data),
        Outcome::Pending => Negotiated::Json(Data::new()),
    }
}

fn merge_locals(mut data: Data, flash: Option<String>, is_auth: bool) -> Data {
    data.insert(
        "flash".to_string(),
        flash.map_or(Value::Null, Value::String),
    );
    data.insert("isAuth".to_string(), Value::Bool(is_auth));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ActionController, MockControllerLoader, Registry};
    use crate::param::HttpRequestMethod;
    use crate::session::Session;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn get(url: &str) -> Request {
        Request::builder(HttpRequestMethod::Get, url)
    }

    fn options(dir: &TempDir, cache: bool) -> DispatchOptions {
        DispatchOptions {
            cache,
            views_path: dir.path().to_path_buf(),
            ..DispatchOptions::default()
        }
    }

    fn view(dir: &TempDir, controller: &str, action: &str, source: &str) {
        let path = dir.path().join(controller);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(format!("{}.html", action)), source).unwrap();
    }

    fn single(name: &'static str, controller: ActionController) -> Registry {
        let controller: Arc<dyn Controller> = Arc::new(controller);
        let mut registry = Registry::default();
        registry.register_controller(name, move || Arc::clone(&controller));
        registry
    }

    #[test]
    fn test_negotiate_precedence() {
        let mut data = Data::new();
        data.insert("a".to_string(), json!(1));

        assert_eq!(
            negotiate(Outcome::Json(data.clone()), false),
            Negotiated::Json(data.clone())
        );
        assert_eq!(
            negotiate(Outcome::Template(data.clone()), true),
            Negotiated::Json(data.clone())
        );
        assert_eq!(
            negotiate(Outcome::Template(data.clone()), false),
            Negotiated::Template(data)
        );
        assert_eq!(
            negotiate(Outcome::Text("t".to_string()), false),
            Negotiated::Text("t".to_string())
        );
        match negotiate(Outcome::Text("t".to_string()), true) {
            Negotiated::Json(d) => assert_eq!(d.get("text"), Some(&json!("t"))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_result() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("show", |ctx| {
            Box::pin(async move { ctx.as_json(json!({"title": "x"})) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let response = dispatcher.dispatch(1, get("/blog/show"), None).await.unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: Value = serde_json::from_str(response.body_str()).unwrap();
        assert_eq!(body, json!({"title": "x", "flash": null, "isAuth": false}));
        assert!(!response.body_str().contains("__json"));
    }

    #[tokio::test]
    async fn test_template_result_with_params() {
        let dir = TempDir::new().unwrap();
        view(&dir, "blog", "show", "post {{ id }} auth={% if isAuth %}yes{% else %}no{% endif %}");
        let blog = ActionController::new().action("show", |ctx| {
            Box::pin(async move {
                let id = ctx.param(0).unwrap_or_default().to_string();
                ctx.view(json!({ "id": id }))
            })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let response = dispatcher.dispatch(1, get("/blog/show/42"), None).await.unwrap();
        assert_eq!(response.body_str(), "post 42 auth=no");
        assert_eq!(response.content_type(), Some(DEFAULT_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_unknown_controller_is_404() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(options(&dir, false), RouteTable::default(), Registry::default());

        let response = dispatcher.dispatch(1, get("/nothing/here"), None).await.unwrap();
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body_str(), "Not Found");
    }

    #[tokio::test]
    async fn test_controller_without_action_or_fallback_is_404() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("show", |ctx| {
            Box::pin(async move { ctx.as_text("x") })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let response = dispatcher.dispatch(1, get("/blog/edit"), None).await.unwrap();
        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn test_cached_controller_without_action_is_error() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("show", |ctx| {
            Box::pin(async move { ctx.as_text("x") })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        dispatcher.dispatch(1, get("/blog/show"), None).await.unwrap();
        let result = dispatcher.dispatch(2, get("/blog/edit"), None).await;
        assert!(matches!(result, Err(Exception::MissingActionHandler { .. })));
    }

    #[tokio::test]
    async fn test_post_appends_method_suffix() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("create_post", |ctx| {
            Box::pin(async move { ctx.as_text(ctx.action_name().to_string()) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let request = Request::builder(HttpRequestMethod::Post, "/blog/create");
        let response = dispatcher.dispatch(1, request, None).await.unwrap();
        assert_eq!(response.body_str(), "create_post");

        // GET 不会命中 create_post
        let result = dispatcher.dispatch(2, get("/blog/create"), None).await;
        assert!(matches!(result, Err(Exception::MissingActionHandler { .. })));
    }

    #[tokio::test]
    async fn test_missing_action_receives_original_name() {
        let dir = TempDir::new().unwrap();
        let pages = ActionController::new().missing_action(|ctx| {
            Box::pin(async move {
                let text = format!("{}:{}", ctx.action_name(), ctx.param(0).unwrap_or_default());
                ctx.as_text(text)
            })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("pages", pages));

        let response = dispatcher.dispatch(1, get("/pages/about"), None).await.unwrap();
        assert_eq!(response.body_str(), "__missing_action:about");
    }

    #[tokio::test]
    async fn test_before_hook_redirect_short_circuits() {
        let dir = TempDir::new().unwrap();
        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invoked);
        let admin = ActionController::new()
            .before(|ctx| {
                Box::pin(async move {
                    if !ctx.is_auth() {
                        ctx.redirect("/login");
                    }
                    ActionResult::pending()
                })
            })
            .action("index", move |ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { ctx.as_text("secret") })
            });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("admin", admin));

        let response = dispatcher.dispatch(1, get("/admin"), None).await.unwrap();
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.location(), Some("/login"));
        assert!(response.body().is_empty());
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deferred_completion() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("latest", |ctx| {
            Box::pin(async move {
                let done = ctx.defer();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    done.complete(ActionResult::json(json!({"latest": 3})));
                });
                ActionResult::pending()
            })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let response = dispatcher.dispatch(1, get("/blog/latest"), None).await.unwrap();
        let body: Value = serde_json::from_str(response.body_str()).unwrap();
        assert_eq!(body["latest"], json!(3));
    }

    #[tokio::test]
    async fn test_pending_without_defer_is_abandoned() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new()
            .action("latest", |_ctx| Box::pin(async move { ActionResult::pending() }));
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let result = dispatcher.dispatch(1, get("/blog/latest"), None).await;
        assert_eq!(result.unwrap_err(), Exception::ActionAbandoned);
    }

    #[tokio::test]
    async fn test_dropped_completion_is_abandoned() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("latest", |ctx| {
            Box::pin(async move {
                let done = ctx.defer();
                drop(done);
                ActionResult::pending()
            })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        let result = dispatcher.dispatch(1, get("/blog/latest"), None).await;
        assert_eq!(result.unwrap_err(), Exception::ActionAbandoned);
    }

    #[tokio::test]
    async fn test_action_timeout() {
        let dir = TempDir::new().unwrap();
        let blog = ActionController::new().action("slow", |ctx| {
            Box::pin(async move {
                let _held = ctx.defer();
                tokio::time::sleep(Duration::from_secs(5)).await;
                ActionResult::pending()
            })
        });
        let mut opts = options(&dir, false);
        opts.action_timeout = Some(Duration::from_millis(20));
        let dispatcher = Dispatcher::new(opts, RouteTable::default(), single("blog", blog));

        let result = dispatcher.dispatch(1, get("/blog/slow"), None).await;
        assert_eq!(result.unwrap_err(), Exception::ActionTimedOut);
    }

    #[tokio::test]
    async fn test_response_cache_skips_action() {
        let dir = TempDir::new().unwrap();
        view(&dir, "blog", "feed", "feed {{ n }}");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let blog = ActionController::new().action("feed", move |ctx| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { ctx.persist_cache(ctx.view(json!({ "n": n }))) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, true), RouteTable::default(), single("blog", blog));

        let first = dispatcher.dispatch(1, get("/blog/feed"), None).await.unwrap();
        let second = dispatcher.dispatch(2, get("/blog/feed"), None).await.unwrap();
        assert_eq!(first.body_str(), "feed 0");
        assert_eq!(second.body_str(), "feed 0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 查询串不同即为不同的键
        let third = dispatcher.dispatch(3, get("/blog/feed?page=2"), None).await.unwrap();
        assert_eq!(third.body_str(), "feed 1");
    }

    #[tokio::test]
    async fn test_response_cache_disabled_in_development() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let blog = ActionController::new().action("feed", move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { ctx.persist_cache(ctx.as_text("feed")) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("blog", blog));

        dispatcher.dispatch(1, get("/blog/feed"), None).await.unwrap();
        dispatcher.dispatch(2, get("/blog/feed"), None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(dispatcher.caches().responses.is_empty());
    }

    #[tokio::test]
    async fn test_flash_consumed_once() {
        let dir = TempDir::new().unwrap();
        let pages = ActionController::new().action("index", |ctx| {
            Box::pin(async move { ctx.as_json(json!({})) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("pages", pages));
        let session: SharedSession = Arc::new(Mutex::new(Session::default()));
        session.lock().unwrap().set_flash("welcome");

        let first = dispatcher
            .dispatch(1, get("/"), Some(Arc::clone(&session)))
            .await
            .unwrap();
        let second = dispatcher
            .dispatch(2, get("/"), Some(Arc::clone(&session)))
            .await
            .unwrap();
        let first: Value = serde_json::from_str(first.body_str()).unwrap();
        let second: Value = serde_json::from_str(second.body_str()).unwrap();
        assert_eq!(first["flash"], json!("welcome"));
        assert_eq!(second["flash"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_controller_fallback_retries_once() {
        let dir = TempDir::new().unwrap();
        let pages = ActionController::new().action("contact", |ctx| {
            Box::pin(async move { ctx.as_text(ctx.controller_name().to_string()) })
        });
        let mut routes = HashMap::new();
        routes.insert("__missing_controller".to_string(), "/pages".to_string());

        let mut loader = MockControllerLoader::new();
        loader
            .expect_load()
            .with(eq("contact"))
            .times(1)
            .returning(|_| None);
        let controller: Arc<dyn Controller> = Arc::new(pages);
        loader
            .expect_load()
            .times(1)
            .with(eq("pages"))
            .returning(move |_| Some(Arc::clone(&controller)));

        let dispatcher = Dispatcher::new(options(&dir, false), RouteTable::new(routes), loader);
        let response = dispatcher.dispatch(1, get("/contact"), None).await.unwrap();
        assert_eq!(response.body_str(), "pages");
    }

    #[tokio::test]
    async fn test_missing_controller_fallback_is_bounded() {
        let dir = TempDir::new().unwrap();
        let mut routes = HashMap::new();
        routes.insert("__missing_controller".to_string(), "/ghost".to_string());

        let mut loader = MockControllerLoader::new();
        loader.expect_load().times(2).returning(|_| None);

        let dispatcher = Dispatcher::new(options(&dir, false), RouteTable::new(routes), loader);
        let response = dispatcher.dispatch(1, get("/contact"), None).await.unwrap();
        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn test_template_error_propagates() {
        let dir = TempDir::new().unwrap();
        let pages = ActionController::new().action("index", |ctx| {
            Box::pin(async move { ctx.view(json!({})) })
        });
        let dispatcher =
            Dispatcher::new(options(&dir, false), RouteTable::default(), single("pages", pages));

        let result = dispatcher.dispatch(1, get("/"), None).await;
        assert!(matches!(result, Err(Exception::TemplateNotFound(_))));
    }

    #[test]
    fn test_template_path() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(options(&dir, false), RouteTable::default(), Registry::default());
        assert_eq!(
            dispatcher.template_path("blog", "show"),
            dir.path().join("blog").join("show.html")
        );
    }
}
