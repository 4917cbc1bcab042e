// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_json::json;
use webdispatch::ActionController;

pub fn controller() -> ActionController {
    ActionController::new()
        .action("index", |ctx| {
            Box::pin(async move { ctx.view(json!({ "title": "首页" })) })
        })
        // 没有对应动作的页面统一由 pages/__missing_action 模板渲染
        .missing_action(|ctx| {
            Box::pin(async move {
                let page = ctx.param(0).unwrap_or_default().to_string();
                ctx.view(json!({ "page": page }))
            })
        })
}
