pub mod action;
pub mod cache;
pub mod config;
pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod exception;
pub mod param;
pub mod request;
pub mod response;
pub mod router;
pub mod session;
pub mod view;

pub use action::{ActionResult, BoxFuture, Data, Outcome};
pub use cache::{CacheService, ControllerCache, ResponseCache};
pub use config::Config;
pub use context::{Completion, DispatchContext};
pub use controller::{ActionController, Controller, ControllerLoader, Registry};
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use exception::Exception;
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::Response;
pub use router::{RequestDescriptor, RouteTable};
pub use session::{Authenticator, Session, SessionAuthenticator, SessionStore, SharedSession};
pub use view::ViewCache;
