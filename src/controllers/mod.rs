// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 应用自带的控制器，按命名约定注册到 [`Registry`]

mod admin;
mod blog;
mod pages;
mod session;

use std::sync::Arc;

use webdispatch::Registry;

pub fn registry(naming: &str) -> Registry {
    let mut registry = Registry::new(naming);
    registry
        .register_controller("pages", || Arc::new(pages::controller()))
        .register_controller("blog", || Arc::new(blog::controller()))
        .register_controller("session", || Arc::new(session::controller()))
        .register_controller("admin", || Arc::new(admin::controller()));
    registry
}
