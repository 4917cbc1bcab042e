// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 缓存
//!
//! 控制器缓存、视图缓存和响应缓存都归属于一个分发器实例，只追加、不过期。
//! 每个缓存各用一把互斥锁；控制器加载在持锁期间完成，因此同一名称至多加载一次。

use bytes::Bytes;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::controller::{Controller, ControllerLoader, MISSING_ACTION};
use crate::view::ViewCache;

/// 取得互斥锁；锁被污染时记录警告并继续使用其中的数据
pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(lock) => lock,
        Err(poisoned) => {
            warn!("{}锁被污染，恢复并继续", name);
            poisoned.into_inner()
        }
    }
}

/// 控制器查找结果
pub enum Lookup {
    Found(Arc<dyn Controller>),
    /// 控制器制品不存在
    Missing,
    /// 制品存在，但既没有请求的动作也没有 `__missing_action`
    Rejected,
}

#[derive(Default)]
pub struct ControllerCache {
    controllers: Mutex<HashMap<String, Arc<dyn Controller>>>,
}

impl ControllerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中缓存时直接返回，不访问加载器
    pub fn get_or_load(&self, name: &str, action: &str, loader: &dyn ControllerLoader) -> Lookup {
        let mut controllers = lock(&self.controllers, "控制器缓存");
        if let Some(controller) = controllers.get(name) {
            debug!("控制器缓存命中：{}", name);
            return Lookup::Found(Arc::clone(controller));
        }
        let controller = match loader.load(name) {
            Some(c) => c,
            None => return Lookup::Missing,
        };
        if !controller.has_action(action) && !controller.has_action(MISSING_ACTION) {
            debug!("控制器{}既没有动作{}也没有{}", name, action, MISSING_ACTION);
            return Lookup::Rejected;
        }
        controllers.insert(name.to_string(), Arc::clone(&controller));
        Lookup::Found(controller)
    }

    pub fn contains(&self, name: &str) -> bool {
        lock(&self.controllers, "控制器缓存").contains_key(name)
    }

    pub fn len(&self) -> usize {
        lock(&self.controllers, "控制器缓存").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// 以完整请求 URL（含查询串）为键的渲染结果缓存
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, body: Bytes, content_type: Option<String>) {
        lock(&self.entries, "响应缓存").insert(url.to_string(), CachedResponse { body, content_type });
    }

    pub fn find(&self, url: &str) -> Option<CachedResponse> {
        lock(&self.entries, "响应缓存").get(url).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries, "响应缓存").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 分发器实例持有的全部缓存
#[derive(Default)]
pub struct CacheService {
    pub controllers: ControllerCache,
    pub views: ViewCache,
    pub responses: ResponseCache,
}

impl CacheService {
    pub fn new() -> Self {
        Self::default()
    }
}
