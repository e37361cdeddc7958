//! Route registration and the two-tier lookup table.
//!
//! Routes are declared on [`Resource`] builders, mounted into a [`RouteTree`]
//! of nested prefix groups, and frozen into a [`RouteTable`] in one build
//! step. The table keeps literal templates in a hash map and placeholder
//! templates in a registration-ordered list; lookup consults the map first
//! and falls back to scanning the list, pre-filtering each candidate by its
//! literal prefix before running the regex.
//!
//! Prefixes concatenate as plain text. `group("/api")` plus
//! `resource("/users")` yields `/api/users`; nobody inserts or strips
//! slashes on anyone's behalf.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use turnpike_core::error::HttpResult;
use turnpike_core::handler::{BoxHandler, Hooks, PathParams, Payload, boxed};
use turnpike_core::method::Method;
use turnpike_core::request::Request;
use turnpike_core::response::Response;

use crate::pattern::{Pattern, PatternError};

/// A route registration problem, reported when the table is built.
#[derive(Debug)]
pub enum RouterError {
    /// A template failed to compile.
    Pattern(PatternError),
    /// The same full template was mounted by two different resources.
    DuplicateRoute { template: String },
    /// The same method was registered twice on one template.
    DuplicateMethod { template: String, method: Method },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(err) => err.fmt(f),
            Self::DuplicateRoute { template } => {
                write!(f, "route {template:?} is registered more than once.")
            }
            Self::DuplicateMethod { template, method } => {
                write!(
                    f,
                    "method {method} is registered more than once on route {template:?}."
                )
            }
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for RouterError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}

/// A group of routes sharing a mount point and a [`Hooks`] implementation.
pub struct Resource {
    routes: Vec<(String, Method, BoxHandler)>,
    hooks: Option<Arc<dyn Hooks>>,
}

impl Default for Resource {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            hooks: None,
        }
    }

    /// Register a handler for `method` on `pattern` (appended to the mount
    /// prefix; `""` means the mount point itself).
    #[must_use]
    pub fn route<F>(mut self, pattern: impl Into<String>, method: Method, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.routes.push((pattern.into(), method, boxed(handler)));
        self
    }

    #[must_use]
    pub fn get<F>(self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, Method::Get, handler)
    }

    #[must_use]
    pub fn post<F>(self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, Method::Post, handler)
    }

    #[must_use]
    pub fn put<F>(self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, Method::Put, handler)
    }

    #[must_use]
    pub fn delete<F>(self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, Method::Delete, handler)
    }

    /// Attach lifecycle hooks to every route of this resource.
    #[must_use]
    pub fn hooks(mut self, hooks: impl Hooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }
}

enum TreeEntry {
    Group { prefix: String, tree: RouteTree },
    Resource { prefix: String, resource: Resource },
}

/// A nested arrangement of resources under concatenated prefixes.
#[derive(Default)]
pub struct RouteTree {
    entries: Vec<TreeEntry>,
}

impl RouteTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nest a sub-tree under `prefix`.
    #[must_use]
    pub fn group(mut self, prefix: impl Into<String>, build: impl FnOnce(Self) -> Self) -> Self {
        self.entries.push(TreeEntry::Group {
            prefix: prefix.into(),
            tree: build(Self::new()),
        });
        self
    }

    /// Mount a resource at `prefix`.
    #[must_use]
    pub fn resource(mut self, prefix: impl Into<String>, resource: Resource) -> Self {
        self.entries.push(TreeEntry::Resource {
            prefix: prefix.into(),
            resource,
        });
        self
    }

    fn flatten(self, prefix: &str, out: &mut Vec<(String, Resource)>) {
        for entry in self.entries {
            match entry {
                TreeEntry::Group { prefix: sub, tree } => {
                    tree.flatten(&format!("{prefix}{sub}"), out);
                }
                TreeEntry::Resource {
                    prefix: sub,
                    resource,
                } => {
                    out.push((format!("{prefix}{sub}"), resource));
                }
            }
        }
    }
}

#[derive(Default)]
struct MethodTable {
    entries: Vec<(Method, BoxHandler)>,
}

impl MethodTable {
    fn insert(&mut self, method: Method, handler: BoxHandler) -> bool {
        if self.entries.iter().any(|(known, _)| *known == method) {
            return false;
        }
        self.entries.push((method, handler));
        true
    }

    fn find(&self, method: Method) -> Option<&BoxHandler> {
        self.entries
            .iter()
            .find(|(known, _)| *known == method)
            .map(|(_, handler)| handler)
    }

    fn lookup(&self, method: Method) -> Option<&BoxHandler> {
        self.find(method).or_else(|| {
            // HEAD is answered by the GET handler; the body is dropped at
            // emission time.
            if method == Method::Head {
                self.find(Method::Get)
            } else {
                None
            }
        })
    }

    fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.entries.iter().map(|(method, _)| *method).collect();
        if methods.contains(&Method::Get) && !methods.contains(&Method::Head) {
            methods.push(Method::Head);
        }
        methods.sort_by_key(|method| method.sort_key());
        methods.dedup();
        methods
    }
}

/// Everything registered on one route template.
pub struct RouteTarget {
    methods: MethodTable,
    hooks: Option<Arc<dyn Hooks>>,
}

impl RouteTarget {
    /// The handler for `method`, with HEAD falling back to GET.
    #[must_use]
    pub fn handler(&self, method: Method) -> Option<&BoxHandler> {
        self.methods.lookup(method)
    }

    /// The methods this target answers, sorted, including the implied HEAD.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.methods.methods()
    }

    /// The resource hooks wrapped around every handler of this target.
    #[must_use]
    pub fn hooks(&self) -> Option<&Arc<dyn Hooks>> {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTarget")
            .field("methods", &self.methods.methods())
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

struct DynamicRoute {
    prefix: String,
    pattern: Pattern,
    target: RouteTarget,
}

/// The frozen route table: literal templates in a map, placeholder templates
/// in registration order.
pub struct RouteTable {
    exact: HashMap<String, RouteTarget>,
    dynamic: Vec<DynamicRoute>,
}

impl RouteTable {
    /// Freeze a route tree, compiling every template and rejecting
    /// duplicates.
    pub fn build(tree: RouteTree) -> Result<Self, RouterError> {
        let mut mounts = Vec::new();
        tree.flatten("", &mut mounts);

        let mut seen: HashSet<String> = HashSet::new();
        let mut exact = HashMap::new();
        let mut dynamic = Vec::new();

        for (mount, resource) in mounts {
            let mut order: Vec<String> = Vec::new();
            let mut tables: HashMap<String, MethodTable> = HashMap::new();
            for (sub, method, handler) in resource.routes {
                let template = format!("{mount}{sub}");
                if !tables.contains_key(&template) {
                    if !seen.insert(template.clone()) {
                        return Err(RouterError::DuplicateRoute { template });
                    }
                    order.push(template.clone());
                }
                let table = tables.entry(template.clone()).or_default();
                if !table.insert(method, handler) {
                    return Err(RouterError::DuplicateMethod { template, method });
                }
            }

            for template in order {
                let methods = tables.remove(&template).unwrap_or_default();
                let target = RouteTarget {
                    methods,
                    hooks: resource.hooks.clone(),
                };
                let pattern = Pattern::compile(&template)?;
                if let Some(prefix) = pattern.prefix() {
                    dynamic.push(DynamicRoute {
                        prefix: prefix.to_string(),
                        pattern,
                        target,
                    });
                } else {
                    exact.insert(template, target);
                }
            }
        }

        Ok(Self { exact, dynamic })
    }

    /// Resolve a path: the literal tier first, then the placeholder list in
    /// registration order. Method checking is the caller's business.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<(&RouteTarget, PathParams)> {
        if let Some(target) = self.exact.get(path) {
            return Some((target, PathParams::new()));
        }
        for route in &self.dynamic {
            if !path.starts_with(&route.prefix) {
                continue;
            }
            if let Some(params) = route.pattern.matches(path) {
                return Some((&route.target, params));
            }
        }
        None
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.dynamic.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.dynamic.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The dynamic tier scans in registration order; the literal tier is
        // an unordered map.
        let dynamic: Vec<&str> = self
            .dynamic
            .iter()
            .map(|route| route.pattern.template())
            .collect();
        f.debug_struct("RouteTable")
            .field("exact", &self.exact.len())
            .field("dynamic", &dynamic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn reply(text: &'static str) -> impl Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload>
    + Send
    + Sync
    + 'static {
        move |_req, _resp, _params| Ok(Payload::from(text))
    }

    fn call(target: &RouteTarget, method: Method, params: &PathParams) -> Payload {
        let handler = target.handler(method).unwrap();
        let mut req = Request::builder(method, "/").build();
        let mut resp = Response::new();
        handler(&mut req, &mut resp, params).unwrap()
    }

    // ==================== building & lookup ====================

    #[test]
    fn test_exact_tier_wins_over_placeholders() {
        let tree = RouteTree::new().resource(
            "/users",
            Resource::new()
                .get("/{id}", reply("dynamic"))
                .get("/all", reply("static")),
        );
        let table = RouteTable::build(tree).unwrap();

        let (target, params) = table.lookup("/users/all").unwrap();
        assert!(params.is_empty());
        assert_eq!(call(target, Method::Get, &params), Payload::from("static"));

        let (target, params) = table.lookup("/users/7").unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(call(target, Method::Get, &params), Payload::from("dynamic"));
    }

    #[test]
    fn test_placeholder_routes_match_in_registration_order() {
        let tree = RouteTree::new()
            .resource("/o/{a}", Resource::new().get("", reply("first")))
            .resource("/o/{b:int}", Resource::new().get("", reply("second")));
        let table = RouteTable::build(tree).unwrap();

        // Both patterns match "/o/7"; the earlier registration wins.
        let (target, params) = table.lookup("/o/7").unwrap();
        assert_eq!(params.get("a"), Some("7"));
        assert_eq!(call(target, Method::Get, &params), Payload::from("first"));
    }

    #[test]
    fn test_prefix_prefilter_still_finds_matches() {
        let tree = RouteTree::new().resource(
            "/api/users/{id:int}",
            Resource::new().get("", reply("user")),
        );
        let table = RouteTable::build(tree).unwrap();

        assert!(table.lookup("/api/users/42").is_some());
        assert!(table.lookup("/api/users/forty-two").is_none());
        assert!(table.lookup("/api/user").is_none());
        assert!(table.lookup("/nope/users/42").is_none());
    }

    #[test]
    fn test_no_match_returns_none() {
        let tree = RouteTree::new().resource("/only", Resource::new().get("", reply("x")));
        let table = RouteTable::build(tree).unwrap();
        assert!(table.lookup("/only/").is_none());
        assert!(table.lookup("/other").is_none());
    }

    #[test]
    fn test_debug_lists_dynamic_templates() {
        let tree = RouteTree::new()
            .resource("/ping", Resource::new().get("", reply("pong")))
            .resource("/users/{id:int}", Resource::new().get("", reply("user")))
            .resource("/files/{name}", Resource::new().get("", reply("file")));
        let table = RouteTable::build(tree).unwrap();

        assert_eq!(
            format!("{table:?}"),
            "RouteTable { exact: 1, dynamic: [\"/users/{id:int}\", \"/files/{name}\"] }"
        );
    }

    // ==================== prefix concatenation ====================

    #[test]
    fn test_groups_concatenate_prefixes() {
        let tree = RouteTree::new().group("/api", |api| {
            api.group("/v1", |v1| {
                v1.resource("/users", Resource::new().get("/{id}", reply("user")))
            })
        });
        let table = RouteTable::build(tree).unwrap();
        assert!(table.lookup("/api/v1/users/7").is_some());
        assert!(table.lookup("/v1/users/7").is_none());
    }

    #[test]
    fn test_prefixes_join_without_slash_repair() {
        let tree = RouteTree::new().group("api", |api| {
            api.resource("/users", Resource::new().get("", reply("x")))
        });
        let table = RouteTable::build(tree).unwrap();
        // "api" + "/users" is exactly "api/users"; nothing prepends a slash.
        assert!(table.lookup("api/users").is_some());
        assert!(table.lookup("/api/users").is_none());
    }

    #[test]
    fn test_empty_sub_pattern_mounts_at_prefix() {
        let tree = RouteTree::new().resource("/health", Resource::new().get("", reply("ok")));
        let table = RouteTable::build(tree).unwrap();
        assert!(table.lookup("/health").is_some());
        assert!(table.lookup("/health/").is_none());
    }

    // ==================== methods ====================

    #[test]
    fn test_method_table_and_allowed_methods() {
        let tree = RouteTree::new().resource(
            "/things",
            Resource::new()
                .post("", reply("created"))
                .get("", reply("listed")),
        );
        let table = RouteTable::build(tree).unwrap();
        let (target, params) = table.lookup("/things").unwrap();

        assert_eq!(call(target, Method::Get, &params), Payload::from("listed"));
        assert_eq!(
            call(target, Method::Post, &params),
            Payload::from("created")
        );
        assert!(target.handler(Method::Delete).is_none());
        // Sorted, with HEAD implied by GET.
        assert_eq!(
            target.allowed_methods(),
            [Method::Get, Method::Head, Method::Post]
        );
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let tree = RouteTree::new().resource("/page", Resource::new().get("", reply("body")));
        let table = RouteTable::build(tree).unwrap();
        let (target, params) = table.lookup("/page").unwrap();
        assert_eq!(call(target, Method::Head, &params), Payload::from("body"));
    }

    #[test]
    fn test_explicit_head_wins_over_fallback() {
        let tree = RouteTree::new().resource(
            "/page",
            Resource::new()
                .get("", reply("get"))
                .route("", Method::Head, reply("head")),
        );
        let table = RouteTable::build(tree).unwrap();
        let (target, params) = table.lookup("/page").unwrap();
        assert_eq!(call(target, Method::Head, &params), Payload::from("head"));
        assert_eq!(target.allowed_methods(), [Method::Get, Method::Head]);
    }

    #[test]
    fn test_methods_without_get_imply_no_head() {
        let tree = RouteTree::new().resource("/w", Resource::new().post("", reply("x")));
        let table = RouteTable::build(tree).unwrap();
        let (target, _) = table.lookup("/w").unwrap();
        assert!(target.handler(Method::Head).is_none());
        assert_eq!(target.allowed_methods(), [Method::Post]);
    }

    // ==================== duplicates & errors ====================

    #[test]
    fn test_duplicate_method_is_rejected() {
        let tree = RouteTree::new().resource(
            "/x",
            Resource::new().get("", reply("a")).get("", reply("b")),
        );
        assert!(matches!(
            RouteTable::build(tree),
            Err(RouterError::DuplicateMethod {
                method: Method::Get,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_template_across_resources_is_rejected() {
        let tree = RouteTree::new()
            .resource("/x", Resource::new().get("", reply("a")))
            .resource("/x", Resource::new().post("", reply("b")));
        assert!(
            matches!(
                RouteTable::build(tree),
                Err(RouterError::DuplicateRoute { template }) if template == "/x"
            )
        );
    }

    #[test]
    fn test_same_template_same_resource_merges_methods() {
        let tree = RouteTree::new().resource(
            "/x",
            Resource::new().get("", reply("a")).post("", reply("b")),
        );
        let table = RouteTable::build(tree).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_pattern_errors_surface_at_build() {
        let tree = RouteTree::new().resource("/u/{id:uuid}", Resource::new().get("", reply("x")));
        assert!(matches!(
            RouteTable::build(tree),
            Err(RouterError::Pattern(PatternError::UnknownType { .. }))
        ));
    }

    // ==================== hooks ====================

    #[test]
    fn test_hooks_attach_to_every_route_of_a_resource() {
        struct Counter(Mutex<usize>);
        impl Hooks for Counter {
            fn before(&self, _req: &mut Request, _resp: &mut Response) -> HttpResult<()> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let tree = RouteTree::new().resource(
            "/a",
            Resource::new()
                .get("", reply("one"))
                .get("/{id}", reply("two"))
                .hooks(Counter(Mutex::new(0))),
        );
        let table = RouteTable::build(tree).unwrap();

        let (target, _) = table.lookup("/a").unwrap();
        assert!(target.hooks().is_some());
        let (target, _) = table.lookup("/a/7").unwrap();
        assert!(target.hooks().is_some());
    }

    #[test]
    fn test_routes_without_hooks() {
        let tree = RouteTree::new().resource("/a", Resource::new().get("", reply("x")));
        let table = RouteTable::build(tree).unwrap();
        let (target, _) = table.lookup("/a").unwrap();
        assert!(target.hooks().is_none());
    }
}
