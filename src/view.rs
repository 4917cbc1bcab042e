// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 视图缓存与渲染
//!
//! 模板由 minijinja 编译。开发模式下保留模板原有的空白并开启调试信息，
//! 每次请求都重新读取、编译；生产模式下裁剪块标签周围的空白，并按绝对路径缓存编译结果。
//!
//! 读取或编译失败直接返回给调用方，本模块不做恢复。

use log::debug;
use minijinja::Environment;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::cache::lock;
use crate::exception::Exception;

/// 已编译、可重复调用的模板
pub struct CompiledView {
    env: Environment<'static>,
    name: String,
}

impl CompiledView {
    pub fn compile(path: &Path, production: bool) -> Result<Self, Exception> {
        let source = fs::read_to_string(path)
            .map_err(|e| Exception::TemplateNotFound(format!("{}: {}", path.display(), e)))?;
        let name = path.to_string_lossy().into_owned();

        let mut env = Environment::new();
        env.set_debug(!production);
        env.set_trim_blocks(production);
        env.set_lstrip_blocks(production);
        env.add_template_owned(name.clone(), source)
            .map_err(|e| Exception::TemplateError(e.to_string()))?;
        Ok(Self { env, name })
    }

    pub fn render<S: Serialize>(&self, data: S) -> Result<String, Exception> {
        let template = self
            .env
            .get_template(&self.name)
            .map_err(|e| Exception::TemplateError(e.to_string()))?;
        template
            .render(data)
            .map_err(|e| Exception::TemplateError(e.to_string()))
    }
}

#[derive(Default)]
pub struct ViewCache {
    views: Mutex<HashMap<PathBuf, Arc<CompiledView>>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得（必要时编译）模板并渲染。`cache` 为假时每次都重新编译且不写入缓存。
    pub fn render<S: Serialize>(
        &self,
        path: &Path,
        data: S,
        cache: bool,
    ) -> Result<String, Exception> {
        let view = self.compiled(path, cache)?;
        view.render(data)
    }

    fn compiled(&self, path: &Path, cache: bool) -> Result<Arc<CompiledView>, Exception> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !cache {
            return Ok(Arc::new(timed_compile(&key, false)?));
        }
        let mut views = lock(&self.views, "视图缓存");
        if let Some(view) = views.get(&key) {
            return Ok(Arc::clone(view));
        }
        let view = Arc::new(timed_compile(&key, true)?);
        views.insert(key, Arc::clone(&view));
        Ok(view)
    }

    pub fn len(&self) -> usize {
        lock(&self.views, "视图缓存").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn timed_compile(path: &Path, production: bool) -> Result<CompiledView, Exception> {
    let start = Instant::now();
    let view = CompiledView::compile(path, production)?;
    debug!(
        "编译模板{}，用时{}ms",
        path.display(),
        start.elapsed().as_millis()
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_template(dir: &TempDir, name: &str, source: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_render_template() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "show.html", "<h1>{{ title }}</h1>");

        let views = ViewCache::new();
        let html = views.render(&path, json!({"title": "x"}), false).unwrap();
        assert_eq!(html, "<h1>x</h1>");
    }

    #[test]
    fn test_html_is_escaped() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "show.html", "{{ title }}");

        let html = ViewCache::new()
            .render(&path, json!({"title": "<b>"}), false)
            .unwrap();
        assert_eq!(html, "&lt;b&gt;");
    }

    #[test]
    fn test_cached_view_survives_file_change() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "index.html", "v1");

        let views = ViewCache::new();
        assert_eq!(views.render(&path, json!({}), true).unwrap(), "v1");
        fs::write(&path, "v2").unwrap();
        assert_eq!(views.render(&path, json!({}), true).unwrap(), "v1");
        assert_eq!(views.len(), 1);
    }

    #[test]
    fn test_uncached_view_recompiles() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "index.html", "v1");

        let views = ViewCache::new();
        assert_eq!(views.render(&path, json!({}), false).unwrap(), "v1");
        fs::write(&path, "v2").unwrap();
        assert_eq!(views.render(&path, json!({}), false).unwrap(), "v2");
        assert!(views.is_empty());
    }

    #[test]
    fn test_missing_template() {
        let views = ViewCache::new();
        let result = views.render(Path::new("/no/such/view.html"), json!({}), true);
        assert!(matches!(result, Err(Exception::TemplateNotFound(_))));
    }

    #[test]
    fn test_syntax_error() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "bad.html", "{% if %}");
        let result = ViewCache::new().render(&path, json!({}), true);
        assert!(matches!(result, Err(Exception::TemplateError(_))));
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "index.html", "ok");
        let views = Arc::new(ViewCache::new());
        views.render(&path, json!({}), true).unwrap();

        let holder = Arc::clone(&views);
        let _ = std::thread::spawn(move || {
            let _guard = holder.views.lock().unwrap();
            panic!("poison the view cache lock");
        })
        .join();

        assert!(views.views.is_poisoned());
        assert_eq!(views.len(), 1);
        assert_eq!(views.render(&path, json!({}), true).unwrap(), "ok");
    }

    #[test]
    fn test_production_trims_blocks() {
        let dir = TempDir::new().unwrap();
        let source = "{% if show %}\nyes\n{% endif %}\n";
        let path = write_template(&dir, "trim.html", source);

        let prod = CompiledView::compile(&path, true).unwrap();
        let dev = CompiledView::compile(&path, false).unwrap();
        assert_eq!(prod.render(json!({"show": true})).unwrap(), "yes\n");
        assert_eq!(dev.render(json!({"show": true})).unwrap(), "\nyes\n");
    }
}
