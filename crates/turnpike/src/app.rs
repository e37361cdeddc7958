//! The application: a frozen route table plus the dispatch loop.
//!
//! [`App::handle`] is the single entry point. It resolves the path, checks
//! the method, wraps the handler in the resource hooks, normalizes the
//! payload, and emits a [`Reply`]. Every failure along the way is an
//! [`HttpError`], rendered into a complete reply at the end; handlers never
//! see half-written error state.

use turnpike_core::error::{HttpError, HttpResult};
use turnpike_core::handler::Payload;
use turnpike_core::method::Method;
use turnpike_core::request::{BodyLimits, Request};
use turnpike_core::response::Response;
use turnpike_core::status::Status;
use turnpike_router::{Resource, RouteTable, RouteTree, RouterError};

/// A finished response, ready for the host server to write out.
#[derive(Debug, Clone)]
pub struct Reply {
    status: Status,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The status line text, e.g. `"404 Not Found"`.
    #[must_use]
    pub fn status_line(&self) -> String {
        self.status.to_string()
    }

    /// All headers in emission order, `Set-Cookie` lines included.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The first header with this exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text.
    #[must_use]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// An immutable, share-everywhere dispatcher.
#[derive(Debug)]
pub struct App {
    table: RouteTable,
    auto_redirect: bool,
    limits: BodyLimits,
}

impl App {
    /// Start declaring routes.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Dispatch one request to a handler and emit the reply.
    pub fn handle(&self, mut req: Request) -> Reply {
        tracing::debug!(method = %req.method(), path = %req.path(), "dispatching");
        req.set_limits(self.limits.clone());
        let mut resp = Response::new();
        match self.dispatch(&mut req, &mut resp) {
            Ok(payload) => emit(req.method(), resp, payload),
            Err(err) => emit_error(req.method(), &err),
        }
    }

    fn dispatch(&self, req: &mut Request, resp: &mut Response) -> HttpResult<Payload> {
        let Some((target, params)) = self.table.lookup(req.path()) else {
            tracing::debug!(path = %req.path(), "no route matched");
            return Err(self.not_found(req));
        };
        let Some(handler) = target.handler(req.method()) else {
            let allow = target.allowed_methods();
            tracing::debug!(path = %req.path(), method = %req.method(), "method not allowed");
            return Err(HttpError::MethodNotAllowed { allow });
        };

        match target.hooks() {
            Some(hooks) => {
                let result = hooks
                    .before(req, resp)
                    .and_then(|()| handler(req, resp, &params));
                // The post-hook observes the outcome but cannot swallow it.
                hooks.after(req, resp, result.as_ref().err());
                result
            }
            None => handler(req, resp, &params),
        }
    }

    /// Miss handling: when enabled, a GET/HEAD for a path whose
    /// slash-toggled twin is routable becomes a 301 to the twin, query
    /// string preserved. Everything else is a plain 404.
    fn not_found(&self, req: &Request) -> HttpError {
        if self.auto_redirect && matches!(req.method(), Method::Get | Method::Head) {
            let toggled = toggle_trailing_slash(req.path());
            if self.table.lookup(&toggled).is_some() {
                let location = if req.query_string().is_empty() {
                    toggled
                } else {
                    format!("{toggled}?{}", req.query_string())
                };
                tracing::debug!(path = %req.path(), location = %location, "redirecting");
                return HttpError::MovedPermanently(location);
            }
        }
        HttpError::NotFound
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => format!("{path}/"),
    }
}

/// Normalize the payload into bytes and freeze the response.
fn emit(method: Method, mut resp: Response, payload: Payload) -> Reply {
    let body = match payload {
        Payload::Raw(text) => text.into_bytes(),
        Payload::Structured(map) => {
            resp.set_content_type("application/json");
            serde_json::Value::Object(map).to_string().into_bytes()
        }
    };
    Reply {
        status: resp.status(),
        headers: resp.header_list(),
        body: if method == Method::Head { Vec::new() } else { body },
    }
}

/// Render an error as a complete reply, discarding any half-built handler
/// state. The error's own headers override the seeded defaults.
fn emit_error(method: Method, err: &HttpError) -> Reply {
    let status = err.status();
    let content = err
        .content()
        .unwrap_or_else(|| format!("<h2>{status}</h2>"));
    let mut resp = Response::new();
    resp.set_status(status);
    for (name, value) in err.headers() {
        resp.set_header(name, value);
    }
    Reply {
        status,
        headers: resp.header_list(),
        body: if method == Method::Head {
            Vec::new()
        } else {
            content.into_bytes()
        },
    }
}

/// Collects routes and settings, then freezes them into an [`App`].
pub struct AppBuilder {
    tree: RouteTree,
    auto_redirect: bool,
    limits: BodyLimits,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: RouteTree::new(),
            auto_redirect: true,
            limits: BodyLimits::default(),
        }
    }

    /// Mount a resource at `prefix`.
    #[must_use]
    pub fn mount(mut self, prefix: impl Into<String>, resource: Resource) -> Self {
        self.tree = self.tree.resource(prefix, resource);
        self
    }

    /// Nest resources under a shared prefix.
    #[must_use]
    pub fn group(
        mut self,
        prefix: impl Into<String>,
        build: impl FnOnce(RouteTree) -> RouteTree,
    ) -> Self {
        self.tree = self.tree.group(prefix, build);
        self
    }

    /// Toggle the trailing-slash 301 on route misses (on by default).
    #[must_use]
    pub fn auto_redirect(mut self, enabled: bool) -> Self {
        self.auto_redirect = enabled;
        self
    }

    /// Body size ceilings stamped onto every request.
    #[must_use]
    pub fn body_limits(mut self, limits: BodyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Compile every template and freeze the table.
    pub fn build(self) -> Result<App, RouterError> {
        let table = RouteTable::build(self.tree)?;
        tracing::info!(routes = table.len(), "route table built");
        Ok(App {
            table,
            auto_redirect: self.auto_redirect,
            limits: self.limits,
        })
    }
}
