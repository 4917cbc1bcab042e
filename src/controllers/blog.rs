// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 内存中的文章列表，演示模板、JSON、flash 重定向和延迟完成

use serde_derive::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webdispatch::{ActionController, ActionResult};

#[derive(Debug, Clone, Serialize)]
struct Post {
    id: usize,
    title: String,
}

type Posts = Arc<Mutex<Vec<Post>>>;

fn snapshot(posts: &Posts) -> Vec<Post> {
    match posts.lock() {
        Ok(posts) => posts.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn controller() -> ActionController {
    let posts: Posts = Arc::new(Mutex::new(vec![Post {
        id: 1,
        title: "Hello".to_string(),
    }]));
    let (index, show, create, latest) = (
        Arc::clone(&posts),
        Arc::clone(&posts),
        Arc::clone(&posts),
        Arc::clone(&posts),
    );

    ActionController::new()
        .action("index", move |ctx| {
            let posts = snapshot(&index);
            Box::pin(async move { ctx.view(json!({ "posts": posts })) })
        })
        .action("show", move |ctx| {
            let posts = snapshot(&show);
            Box::pin(async move {
                let id = ctx.param(0).and_then(|p| p.parse::<usize>().ok());
                match posts.into_iter().find(|p| Some(p.id) == id) {
                    Some(post) => ctx.persist_cache(ctx.view(json!({ "post": post }))),
                    None => {
                        ctx.error404();
                        ActionResult::pending()
                    }
                }
            })
        })
        .action("create_post", move |ctx| {
            let posts = Arc::clone(&create);
            Box::pin(async move {
                let title = ctx.request().form("title").unwrap_or_default();
                if title.trim().is_empty() {
                    ctx.flash("标题不能为空", "/blog");
                    return ActionResult::pending();
                }
                if let Ok(mut posts) = posts.lock() {
                    let id = posts.len() + 1;
                    posts.push(Post { id, title });
                }
                ctx.flash("文章已发布", "/blog");
                ActionResult::pending()
            })
        })
        // 在另一个任务中完成，模拟异步数据源
        .action("latest", move |ctx| {
            let posts = Arc::clone(&latest);
            Box::pin(async move {
                let done = ctx.defer();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let latest = snapshot(&posts).pop();
                    done.complete(ActionResult::json(json!({ "post": latest })));
                });
                ActionResult::pending()
            })
        })
}
