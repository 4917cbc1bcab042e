// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_json::json;
use webdispatch::session::lock_session;
use webdispatch::{ActionController, ActionResult};

pub fn controller() -> ActionController {
    ActionController::new()
        .action("new", |ctx| Box::pin(async move { ctx.view(json!({})) }))
        .action("create_post", |ctx| {
            Box::pin(async move {
                let user = ctx.request().form("user").unwrap_or_default();
                if user.is_empty() {
                    ctx.flash("请输入用户名", "/session/new");
                    return ActionResult::pending();
                }
                if let Some(session) = ctx.session() {
                    lock_session(session).sign_in(&user);
                }
                ctx.flash("登录成功", "/admin");
                ActionResult::pending()
            })
        })
        .action("destroy_post", |ctx| {
            Box::pin(async move {
                if let Some(session) = ctx.session() {
                    lock_session(session).sign_out();
                }
                ctx.flash("已退出登录", "/");
                ActionResult::pending()
            })
        })
}
