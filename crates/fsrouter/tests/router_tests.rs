//! End-to-end tests: route trees on disk → compiled table → dispatch
//!
//! Each test writes a small route tree, compiles it with the static
//! inspector and answers requests through the reference dispatcher, with
//! Rust closures standing in for the exported JavaScript handlers.

use fsrouter::dispatch::{Dispatcher, HandlerRegistry, Request, Response};
use fsrouter::inspect::{OptionKind, StaticInspector};
use fsrouter::table::{ExportPath, HandlerRef};
use fsrouter::{compile_table, Config, Method, RouteTable};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Fixture helpers
// ============================================================================

struct Fixture {
    dir: TempDir,
    registry: HandlerRegistry,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        Self {
            dir,
            registry: HandlerRegistry::new(),
        }
    }

    fn file(&mut self, relative: &str, source: &str) -> &mut Self {
        let path = self.dir.path().join("src").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
        self
    }

    fn module(&self, relative: &str) -> String {
        format!("{}/src/{}", self.dir.path().display(), relative)
    }

    fn handle<F>(&mut self, relative: &str, path: ExportPath, handler: F) -> &mut Self
    where
        F: Fn(&mut Request) -> Option<Response> + Send + Sync + 'static,
    {
        let module = self.module(relative);
        self.registry.register(HandlerRef::export(module, path), handler);
        self
    }

    fn compile_with(&self, config: Config) -> RouteTable {
        let resolved = config.resolve(self.dir.path()).unwrap();
        compile_table(&resolved, &StaticInspector::new()).unwrap()
    }

    fn compile(&self) -> RouteTable {
        self.compile_with(Config::default())
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::from_table(&self.compile(), &self.registry).unwrap()
    }
}

fn method(method: Method) -> ExportPath {
    ExportPath::Method(method)
}

fn option(kind: OptionKind, method: Method) -> ExportPath {
    ExportPath::Option(kind, method)
}

fn set_ctx(key: &'static str, value: &'static str) -> impl Fn(&mut Request) -> Option<Response> {
    move |req| {
        req.ctx.insert(key.to_string(), Value::from(value));
        None
    }
}

fn respond(status: u16, body: &'static str) -> impl Fn(&mut Request) -> Option<Response> {
    move |_| Some(Response::new(status, body))
}

fn ctx_json(keys: &'static [&'static str]) -> impl Fn(&mut Request) -> Option<Response> {
    move |req| {
        let body: serde_json::Map<String, Value> = keys
            .iter()
            .filter_map(|key| req.ctx.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Some(Response::json(&Value::Object(body)))
    }
}

fn params_body(prefix: &'static str) -> impl Fn(&mut Request) -> Option<Response> {
    move |req| {
        let params: serde_json::Map<String, Value> = req
            .params
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect();
        Some(Response::ok(format!("{}: {}", prefix, Value::Object(params))))
    }
}

// ============================================================================
// Method routes
// ============================================================================

const METHOD_ROUTES: &str = r#"
import type { RouteHandler } from 'itty-fs-router';

export const GET: RouteHandler = () => new Response('Hello from GET');
export const POST: RouteHandler = () => new Response('Hello from POST');
export const PUT: RouteHandler = () => new Response('Hello from PUT');
export const PATCH: RouteHandler = () => new Response('Hello from PATCH');
export const DELETE: RouteHandler = () => new Response('Hello from DELETE');
export const OPTIONS: RouteHandler = () => new Response('Hello from OPTIONS');
"#;

#[test]
fn test_basic_method_routes() {
    let mut fixture = Fixture::new();
    fixture.file("index.ts", METHOD_ROUTES);
    fixture
        .handle("index.ts", method(Method::Get), respond(200, "Hello from GET"))
        .handle("index.ts", method(Method::Post), respond(200, "Hello from POST"))
        .handle("index.ts", method(Method::Put), respond(200, "Hello from PUT"))
        .handle("index.ts", method(Method::Patch), respond(200, "Hello from PATCH"))
        .handle("index.ts", method(Method::Delete), respond(200, "Hello from DELETE"))
        .handle("index.ts", method(Method::Options), respond(200, "Hello from OPTIONS"));

    let dispatcher = fixture.dispatcher();
    for verb in ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
        let response = dispatcher.handle(verb, "/");
        assert_eq!(response, Response::ok(format!("Hello from {}", verb)));
    }
    assert_eq!(dispatcher.handle("HEAD", "/"), Response::not_found());
    assert_eq!(dispatcher.handle("GET", "/missing"), Response::not_found());
}

#[test]
fn test_table_layout_with_base_path() {
    let mut fixture = Fixture::new();
    fixture.file("get.ts", "export const GET = () => new Response('get');");
    fixture.file("post.ts", "export const POST = () => new Response('post');");

    let table = fixture.compile_with(Config {
        base_path: "base/path".to_string(),
        ..Config::default()
    });

    let rows: Vec<(Method, String, String)> = table
        .iter()
        .map(|entry| {
            (
                entry.method,
                entry.pattern.source().to_string(),
                entry.handlers[0].to_js(),
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            (
                Method::Post,
                "^/base/path/post/*$".to_string(),
                format!(r#"require("{}").POST"#, fixture.module("post.ts")),
            ),
            (
                Method::Get,
                "^/base/path/get/*$".to_string(),
                format!(r#"require("{}").GET"#, fixture.module("get.ts")),
            ),
            (
                Method::All,
                "^(.*)?/*$".to_string(),
                r#"() => new Response("Not found", { status: 404 })"#.to_string(),
            ),
        ]
    );
}

#[test]
fn test_empty_tree_has_universal_fallback() {
    let fixture = Fixture::new();
    let table = fixture.compile();

    assert_eq!(table.len(), 1);
    let dispatcher = fixture.dispatcher();
    assert_eq!(dispatcher.handle("GET", "/"), Response::not_found());
}

#[test]
fn test_files_without_exports_are_skipped() {
    let mut fixture = Fixture::new();
    fixture.file("utils.ts", "export const helper = () => 1;\nexport default {};");
    fixture.file("README.md", "# not a route");

    assert_eq!(fixture.compile().len(), 1);
}

// ============================================================================
// Route options
// ============================================================================

#[test]
fn test_route_not_found_option() {
    let mut fixture = Fixture::new();
    fixture.file(
        "with-not-found.ts",
        r#"
        import type { MiddlewareConfig, RouteHandler } from 'itty-fs-router';

        export const GET: RouteHandler = () => {
            return new Response('Hello world!');
        };

        export const notFound: MiddlewareConfig = {
            POST: () => new Response('Custom not found!!', { status: 404 }),
        };
        "#,
    );
    fixture
        .handle("with-not-found.ts", method(Method::Get), respond(200, "Hello world!"))
        .handle(
            "with-not-found.ts",
            option(OptionKind::NotFound, Method::Post),
            respond(404, "Custom not found!!"),
        );

    let dispatcher = fixture.dispatcher();
    assert_eq!(dispatcher.handle("GET", "/with-not-found"), Response::ok("Hello world!"));
    assert_eq!(
        dispatcher.handle("POST", "/with-not-found"),
        Response::new(404, "Custom not found!!")
    );
    assert_eq!(dispatcher.handle("PUT", "/with-not-found"), Response::not_found());
}

#[test]
fn test_route_middleware_option_runs_first() {
    let mut fixture = Fixture::new();
    fixture.file(
        "with-middleware-all.ts",
        r#"
        export const ALL: RouteHandler = (req) => {
            const middlewareCtx = req.ctx['from-middleware'];
            return new Response(`Middleware Context: '${middlewareCtx}'`);
        };

        export const middleware: Middleware = {
            ALL: (req) => {
                req.ctx['from-middleware'] = 'Context from middleware';
            },
        };
        "#,
    );
    fixture
        .handle(
            "with-middleware-all.ts",
            option(OptionKind::Middleware, Method::All),
            set_ctx("from-middleware", "Context from middleware"),
        )
        .handle("with-middleware-all.ts", method(Method::All), |req| {
            let value = req.ctx["from-middleware"].as_str().unwrap_or_default().to_string();
            Some(Response::ok(format!("Middleware Context: '{}'", value)))
        });

    let table = fixture.compile();
    assert_eq!(table.entries()[0].handlers[0].to_js(), format!(
        r#"require("{}").middleware.ALL"#,
        fixture.module("with-middleware-all.ts")
    ));

    let dispatcher = fixture.dispatcher();
    assert_eq!(
        dispatcher.handle("DELETE", "/with-middleware-all"),
        Response::ok("Middleware Context: 'Context from middleware'")
    );
}

// ============================================================================
// Middleware and notFound files
// ============================================================================

fn middleware_fixture() -> Fixture {
    let mut fixture = Fixture::new();
    fixture
        .file(
            "_middleware.ts",
            "export const ALL = (req) => { req.ctx['from-middleware-root'] = 'Context from root middleware'; };",
        )
        .file(
            "_notFound.ts",
            "export const ALL = () => new Response('Not found (root)', { status: 404 });",
        )
        .file(
            "hello.ts",
            "export const GET = (req) => new Response(JSON.stringify(req.ctx));",
        )
        .file(
            "nested/_middleware.ts",
            "export const ALL = (req) => { req.ctx['from-middleware-nested'] = 'Context from nested middleware'; };",
        )
        .file(
            "nested/_not-found.ts",
            "export const ALL = () => new Response('Not found (nested)', { status: 404 });",
        )
        .file(
            "nested/hello.ts",
            r#"
            import type { Middleware, NotFound, RouteHandler } from 'itty-fs-router';

            export const GET: RouteHandler = (req) => new Response(JSON.stringify(req.ctx));
            export const POST: RouteHandler = (req) => new Response(JSON.stringify(req.ctx));

            export const middleware: Middleware = {
                POST: (req) => {
                    req.ctx['from-middleware-route'] = 'Context from route middleware';
                },
            };

            export const notFound: NotFound = {
                ALL: () => {
                    return new Response('Not found (route)', { status: 404 });
                },
            };
            "#,
        );

    const KEYS: &[&str] = &["root", "nested", "route"];
    let ctx_body = || {
        move |req: &mut Request| {
            let body: serde_json::Map<String, Value> = KEYS
                .iter()
                .filter_map(|key| {
                    req.ctx
                        .get(&format!("from-middleware-{}", key))
                        .map(|v| (key.to_string(), v.clone()))
                })
                .collect();
            Some(Response::json(&Value::Object(body)))
        }
    };

    fixture
        .handle(
            "_middleware.ts",
            method(Method::All),
            set_ctx("from-middleware-root", "Context from root middleware"),
        )
        .handle("_notFound.ts", method(Method::All), respond(404, "Not found (root)"))
        .handle("hello.ts", method(Method::Get), ctx_body())
        .handle(
            "nested/_middleware.ts",
            method(Method::All),
            set_ctx("from-middleware-nested", "Context from nested middleware"),
        )
        .handle("nested/_not-found.ts", method(Method::All), respond(404, "Not found (nested)"))
        .handle("nested/hello.ts", method(Method::Get), ctx_body())
        .handle("nested/hello.ts", method(Method::Post), ctx_body())
        .handle(
            "nested/hello.ts",
            option(OptionKind::Middleware, Method::Post),
            set_ctx("from-middleware-route", "Context from route middleware"),
        )
        .handle(
            "nested/hello.ts",
            option(OptionKind::NotFound, Method::All),
            respond(404, "Not found (route)"),
        );
    fixture
}

#[test]
fn test_root_route_gets_root_middleware_only() {
    let dispatcher = middleware_fixture().dispatcher();
    let response = dispatcher.handle("GET", "/hello");

    assert_eq!(response.status, 200);
    assert_eq!(
        serde_json::from_str::<Value>(&response.body).unwrap(),
        json!({ "root": "Context from root middleware" })
    );
}

#[test]
fn test_nested_route_gets_root_and_nested_middleware() {
    let dispatcher = middleware_fixture().dispatcher();
    let response = dispatcher.handle("GET", "/nested/hello");

    assert_eq!(
        serde_json::from_str::<Value>(&response.body).unwrap(),
        json!({
            "root": "Context from root middleware",
            "nested": "Context from nested middleware",
        })
    );
}

#[test]
fn test_nested_route_gets_route_middleware_for_its_method() {
    let dispatcher = middleware_fixture().dispatcher();
    let response = dispatcher.handle("POST", "/nested/hello");

    assert_eq!(
        serde_json::from_str::<Value>(&response.body).unwrap(),
        json!({
            "root": "Context from root middleware",
            "nested": "Context from nested middleware",
            "route": "Context from route middleware",
        })
    );
}

#[test]
fn test_not_found_scoping() {
    let dispatcher = middleware_fixture().dispatcher();

    assert_eq!(dispatcher.handle("GET", "/invalid"), Response::new(404, "Not found (root)"));
    assert_eq!(
        dispatcher.handle("GET", "/nested/invalid"),
        Response::new(404, "Not found (nested)")
    );
    assert_eq!(
        dispatcher.handle("PUT", "/nested/hello"),
        Response::new(404, "Not found (route)")
    );
}

#[test]
fn test_scope_stops_at_segment_boundary() {
    let mut fixture = middleware_fixture();
    fixture
        .file("nestedfoo.ts", "export const GET = (req) => new Response(JSON.stringify(req.ctx));")
        .handle("nestedfoo.ts", method(Method::Get), ctx_json(&["from-middleware-nested"]));

    let response = fixture.dispatcher().handle("GET", "/nestedfoo");
    assert_eq!(response, Response::json(&json!({})));
}

#[test]
fn test_table_order_is_precedence() {
    let fixture = middleware_fixture();
    let table = fixture.compile();

    let handlers: Vec<String> = table
        .iter()
        .map(|entry| entry.handlers[0].to_js())
        .collect();
    let module = |relative: &str| format!(r#"require("{}")"#, fixture.module(relative));

    assert_eq!(
        handlers,
        vec![
            format!("{}.ALL", module("nested/_middleware.ts")),
            format!("{}.ALL", module("_middleware.ts")),
            format!("{}.middleware.POST", module("nested/hello.ts")),
            format!("{}.GET", module("nested/hello.ts")),
            format!("{}.POST", module("nested/hello.ts")),
            format!("{}.notFound.ALL", module("nested/hello.ts")),
            format!("{}.GET", module("hello.ts")),
            format!("{}.ALL", module("nested/_not-found.ts")),
            format!("{}.ALL", module("_notFound.ts")),
            r#"() => new Response("Not found", { status: 404 })"#.to_string(),
        ]
    );
}

// ============================================================================
// Parameters
// ============================================================================

fn params_fixture() -> Fixture {
    let mut fixture = Fixture::new();
    let source = "export const GET = ({ params }) => new Response(JSON.stringify(params));";
    let files = [
        ("itty-router-syntax/optional-params/:action?.ts", "optional params"),
        ("itty-router-syntax/greedy-params/:url+.ts", "greedy params"),
        ("itty-fs-syntax/file-extensions/[file].[[extension]].ts", "file extensions"),
        ("itty-fs-syntax/simple-params/[id].ts", "simple params"),
    ];
    for (relative, prefix) in files {
        fixture
            .file(relative, source)
            .handle(relative, method(Method::Get), params_body(prefix));
    }
    fixture
        .file(
            "itty-fs-syntax/query-params/index.ts",
            "export const GET = ({ query }) => new Response(JSON.stringify(query));",
        )
        .handle("itty-fs-syntax/query-params/index.ts", method(Method::Get), |req| {
            let query: serde_json::Map<String, Value> = req
                .query
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            Some(Response::ok(format!("query params: {}", Value::Object(query))))
        });
    fixture
}

#[test]
fn test_optional_params() {
    let dispatcher = params_fixture().dispatcher();

    assert_eq!(
        dispatcher.handle("GET", "/itty-router-syntax/optional-params/"),
        Response::ok("optional params: {}")
    );
    assert_eq!(
        dispatcher.handle("GET", "/itty-router-syntax/optional-params/edit"),
        Response::ok(r#"optional params: {"action":"edit"}"#)
    );
}

#[test]
fn test_greedy_params() {
    let dispatcher = params_fixture().dispatcher();

    assert_eq!(
        dispatcher.handle("GET", "/itty-router-syntax/greedy-params/"),
        Response::ok(r#"greedy params: {"url":""}"#)
    );
    assert_eq!(
        dispatcher.handle("GET", "/itty-router-syntax/greedy-params/a/b/c"),
        Response::ok(r#"greedy params: {"url":"a/b/c"}"#)
    );
}

#[test]
fn test_file_extension_params() {
    let dispatcher = params_fixture().dispatcher();

    let response = dispatcher.handle("GET", "/itty-fs-syntax/file-extensions/manifest.json");
    let body: Value = serde_json::from_str(response.body.trim_start_matches("file extensions: ")).unwrap();
    assert_eq!(body, json!({ "file": "manifest", "extension": "json" }));

    assert_eq!(
        dispatcher.handle("GET", "/itty-fs-syntax/file-extensions/manifest"),
        Response::ok(r#"file extensions: {"file":"manifest"}"#)
    );
}

#[test]
fn test_simple_params() {
    let dispatcher = params_fixture().dispatcher();

    assert_eq!(
        dispatcher.handle("GET", "/itty-fs-syntax/simple-params/42"),
        Response::ok(r#"simple params: {"id":"42"}"#)
    );
    assert_eq!(
        dispatcher.handle("GET", "/itty-fs-syntax/simple-params/"),
        Response::not_found()
    );
}

#[test]
fn test_query_params() {
    let dispatcher = params_fixture().dispatcher();
    let response = dispatcher.handle("GET", "/itty-fs-syntax/query-params?foo=bar&baz");

    let body: Value =
        serde_json::from_str(response.body.trim_start_matches("query params: ")).unwrap();
    assert_eq!(body, json!({ "foo": "bar", "baz": "" }));
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_deeper_declarations_precede_longer_names() {
    let mut fixture = Fixture::new();
    fixture
        .file("a/_middleware.ts", "export const ALL = () => {};")
        .file("a/b/_middleware.ts", "export const ALL = () => {};")
        .file("a/a-very-long-directory-name/_middleware.ts", "export const ALL = () => {};");

    let table = fixture.compile();
    let sources: Vec<&str> = table.iter().map(|entry| entry.pattern.source()).collect();

    assert_eq!(
        sources,
        vec![
            "^/a/a-very-long-directory-name(/.*)?/*$",
            "^/a/b(/.*)?/*$",
            "^/a(/.*)?/*$",
            "^(.*)?/*$",
        ]
    );
}

#[test]
fn test_compile_is_deterministic() {
    let fixture = middleware_fixture();
    let snapshot = || -> Vec<String> {
        fixture
            .compile()
            .iter()
            .map(|entry| format!("{} {} {}", entry.method, entry.pattern, entry.handlers[0]))
            .collect()
    };
    assert_eq!(snapshot(), snapshot());
}

#[test]
fn test_index_directory_is_its_own_scope() {
    let mut fixture = Fixture::new();
    fixture
        .file("index/_middleware.ts", "export const ALL = (req) => { req.ctx['from-index'] = 'index'; };")
        .file("index/index.ts", "export const GET = (req) => new Response(JSON.stringify(req.ctx));")
        .file("other/page.ts", "export const GET = (req) => new Response(JSON.stringify(req.ctx));")
        .handle("index/_middleware.ts", method(Method::All), set_ctx("from-index", "index"))
        .handle("index/index.ts", method(Method::Get), ctx_json(&["from-index"]))
        .handle("other/page.ts", method(Method::Get), ctx_json(&["from-index"]));

    let sources: Vec<String> = fixture
        .compile()
        .iter()
        .map(|entry| entry.pattern.source().to_string())
        .collect();
    assert_eq!(sources[0], "^/index(/.*)?/*$");
    assert_eq!(sources[1], "^/index/*$");

    let dispatcher = fixture.dispatcher();
    assert_eq!(
        dispatcher.handle("GET", "/index"),
        Response::json(&json!({ "from-index": "index" }))
    );
    assert_eq!(dispatcher.handle("GET", "/other/page"), Response::json(&json!({})));
    assert_eq!(dispatcher.handle("GET", "/"), Response::not_found());
}
