// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器/动作分发服务
//!
//! 基于 Tokio 运行时的多线程 HTTP 服务端：
//! - 每个连接读取一个请求，交给 [`Dispatcher`] 解析路由、调用控制器动作并渲染结果
//! - 以 `sid` Cookie 关联内存会话，供 flash 消息和登录状态使用
//! - 分发失败时返回对应状态码的错误页

mod controllers;

use log::{debug, error, info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
    time::Instant,
};

use webdispatch::param::SESSION_COOKIE;
use webdispatch::{Config, Dispatcher, Request, Response, SessionAuthenticator, SessionStore};

const CONFIG_FILE: &str = "config/development.toml";
const LOG_CONFIG_FILE: &str = "config/log4rs.yaml";

fn main() {
    init_logger();

    let mut config = match Config::from_toml(CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            warn!("无法载入配置文件{}：{}，使用默认配置", CONFIG_FILE, e);
            Config::new()
        }
    };
    config.apply_env();
    info!("配置文件已载入，运行模式：{}", config.mode());

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    runtime.block_on(serve(config));
}

/// 优先读取 YAML 日志配置，失败时退回到控制台输出
fn init_logger() {
    if let Err(e) = log4rs::init_file(LOG_CONFIG_FILE, Default::default()) {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
            )))
            .build();
        let fallback = LogConfig::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info));
        match fallback {
            Ok(c) => {
                if log4rs::init_config(c).is_ok() {
                    warn!("无法读取{}：{}，使用默认控制台日志", LOG_CONFIG_FILE, e);
                }
            }
            Err(errors) => eprintln!("日志初始化失败：{:?}", errors),
        }
    }
}

async fn serve(config: Config) {
    let dispatcher = Dispatcher::from_config(&config, controllers::registry(config.controller_file()))
        .with_authenticator(SessionAuthenticator);
    info!(
        "视图目录：{}，缓存：{}",
        dispatcher.options().views_path.display(),
        dispatcher.options().cache
    );
    let dispatcher = Arc::new(dispatcher);
    let sessions = Arc::new(SessionStore::new());

    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, port);
    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("服务端在{}上监听Socket连接", socket);

    let max_request_size = config.max_request_size();
    let mut id: u128 = 0;
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let dispatcher = Arc::clone(&dispatcher);
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move {
            handle_connection(&mut stream, id, &dispatcher, &sessions, max_request_size).await;
        });
        id += 1;
    }
}

/// 读取、分发并写回一个请求
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    dispatcher: &Dispatcher,
    sessions: &SessionStore,
    max_request_size: usize,
) {
    let mut buffer = vec![0; max_request_size];
    match stream.read(&mut buffer).await {
        Ok(0) => return,
        Ok(n) => buffer.truncate(n),
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    }
    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(request) => request,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}", id, e);
            let response = Response::error_page(e.status_code());
            let _ = stream.write_all(&response.as_bytes()).await;
            return;
        }
    };

    let sid = request.cookie(SESSION_COOKIE).map(str::to_string);
    let session = sessions.load(sid.as_deref());
    let path = request.path().to_string();
    let method = request.method();
    let version = request.version().to_string();
    let user_agent = request.user_agent().to_string();
    let accept_encoding = request.accept_encoding().to_vec();

    let mut response = match dispatcher.dispatch(id, request, Some(Arc::clone(&session))).await {
        Ok(response) => response,
        Err(e) => {
            error!("[ID{}]分发请求{}失败：{}", id, path, e);
            Response::error_page(e.status_code())
        }
    };
    if let Some(new_sid) = sessions.save(sid.as_deref(), &session) {
        response.set_cookie(SESSION_COOKIE, &new_sid);
    }
    response.encode(&accept_encoding, id);

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        version,
        path,
        method,
        response.status_code(),
        response.information(),
        user_agent,
    );

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
