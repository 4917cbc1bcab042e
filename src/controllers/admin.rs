// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_json::json;
use webdispatch::session::lock_session;
use webdispatch::{ActionController, ActionResult};

pub fn controller() -> ActionController {
    ActionController::new()
        // 未登录时重定向到登录页，动作不会执行
        .before(|ctx| {
            Box::pin(async move {
                if !ctx.is_auth() {
                    ctx.flash("请先登录", "/session/new");
                }
                ActionResult::pending()
            })
        })
        .action("index", |ctx| {
            Box::pin(async move {
                let user = ctx
                    .session()
                    .and_then(|s| lock_session(s).user().map(str::to_string))
                    .unwrap_or_default();
                ctx.view(json!({ "user": user }))
            })
        })
}
