// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 会话
//!
//! 分发器只读写会话中的 flash 槽位；认证结果通过 [`Authenticator`] 以布尔值给出。
//! `SessionStore` 是演示服务器使用的进程内存储，按 `sid` Cookie 区分会话。

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::lock;
use crate::request::Request;

#[derive(Debug, Default, Clone)]
pub struct Session {
    flash: Option<String>,
    user: Option<String>,
}

impl Session {
    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn set_flash(&mut self, message: &str) {
        self.flash = Some(message.to_string());
    }

    /// 读取并清除 flash 消息
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn sign_in(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    /// 既没有待显示的 flash 也没有登录用户
    pub fn is_empty(&self) -> bool {
        self.flash.is_none() && self.user.is_none()
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// 锁被污染时恢复并继续
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, Session> {
    lock(session, "会话")
}

/// 认证检查，只产出一个布尔值
pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self, request: &Request, session: Option<&SharedSession>) -> bool;
}

/// 会话中存在已登录用户即视为已认证
pub struct SessionAuthenticator;

impl Authenticator for SessionAuthenticator {
    fn is_authenticated(&self, _request: &Request, session: Option<&SharedSession>) -> bool {
        session.map_or(false, |s| lock_session(s).user().is_some())
    }
}

/// 进程内会话存储。
///
/// 只有写入过 flash 或登录用户的会话才会被保存并分配 ID；
/// 请求结束时变为空的会话会被移除，没有 Cookie 的请求不会占用存储。
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 Cookie 中的 ID 取出会话；ID 缺失或未知时返回一个尚未保存的空会话
    pub fn load(&self, sid: Option<&str>) -> SharedSession {
        let sessions = lock(&self.sessions, "会话存储");
        match sid.and_then(|sid| sessions.get(sid)) {
            Some(session) => Arc::clone(session),
            None => Arc::new(Mutex::new(Session::default())),
        }
    }

    /// 请求结束后调用。返回新分配的会话 ID（需要写入 Cookie），其余情况返回 `None`。
    pub fn save(&self, sid: Option<&str>, session: &SharedSession) -> Option<String> {
        let empty = lock_session(session).is_empty();
        let mut sessions = lock(&self.sessions, "会话存储");
        if let Some(sid) = sid {
            if let Some(stored) = sessions.get(sid) {
                if Arc::ptr_eq(stored, session) {
                    if empty {
                        debug!("移除空会话：{}", sid);
                        sessions.remove(sid);
                    }
                    return None;
                }
            }
        }
        if empty {
            return None;
        }
        let sid = new_session_id();
        debug!("新建会话：{}", sid);
        sessions.insert(sid.clone(), Arc::clone(session));
        Some(sid)
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions, "会话存储").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 128 位随机数，来自线程本地的密码学安全随机源
fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
