//! Hello Example - grouped resources, JSON payloads, forms, and uploads
//!
//! turnpike is host-agnostic: an [`App`] turns a `Request` into a `Reply`,
//! and whatever owns the socket writes the reply out. This example drives an
//! app directly, the same way a host (or a test) would.
//!
//! Run with: cargo run --example hello -p turnpike

use turnpike::prelude::*;

const NAMES: [&str; 3] = ["Alice", "Bob", "Charlie"];

/// Handler for GET /public/hello.json
fn hello_index(
    _req: &mut Request,
    _resp: &mut Response,
    _params: &PathParams,
) -> HttpResult<Payload> {
    let items: Vec<serde_json::Value> = NAMES
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    let mut body = serde_json::Map::new();
    body.insert("items".to_string(), serde_json::Value::Array(items));
    Ok(Payload::Structured(body))
}

/// Handler for GET /public/hello/{name:<\w+>}.json
fn hello_show(
    _req: &mut Request,
    resp: &mut Response,
    params: &PathParams,
) -> HttpResult<Payload> {
    let name = params.get("name").unwrap_or("");
    let mut body = serde_json::Map::new();
    if NAMES.contains(&name) {
        let message = format!("Hello, {name}!");
        body.insert("message".to_string(), serde_json::Value::from(message));
    } else {
        // Unknown names still answer with a JSON body, just under a 404.
        resp.set_status(Status::NOT_FOUND);
        body.insert(
            "error".to_string(),
            serde_json::Value::from("404 Not Found"),
        );
    }
    Ok(Payload::Structured(body))
}

/// Handler for GET /public/form
fn form_page(req: &mut Request, _resp: &mut Response, _params: &PathParams) -> HttpResult<Payload> {
    let preview = req.query().get("preview").unwrap_or("-").to_string();
    Ok(Payload::from(format!(
        concat!(
            "<p>query preview: {}</p>\n",
            "<form method=\"POST\" action=\"/public/form\"\n",
            "      enctype=\"multipart/form-data\">\n",
            "  Name:<br>\n",
            "  <input type=\"text\" name=\"name\"><br>\n",
            "  File:<br>\n",
            "  <input type=\"file\" name=\"upfile\"><br>\n",
            "  <input type=\"submit\">\n",
            "</form>\n"
        ),
        preview
    )))
}

/// Handler for POST /public/form
fn form_submit(
    req: &mut Request,
    _resp: &mut Response,
    _params: &PathParams,
) -> HttpResult<Payload> {
    let form = req.multipart()?;
    let name = form.field("name").unwrap_or("-").to_string();
    let upload = form.file("upfile").map_or_else(
        || "none".to_string(),
        |file| format!("{} ({} bytes)", file.filename(), file.len()),
    );
    Ok(Payload::from(format!(
        "<p>name: {name}</p>\n<p>upload: {upload}</p>\n<p><a href=\"/public/form\">back</a></p>\n"
    )))
}

fn main() {
    println!("turnpike Hello Example\n");

    let app = App::builder()
        .group("/public", |public| {
            public
                .resource(
                    "/hello",
                    Resource::new()
                        .get(".json", hello_index)
                        .get("/{name:<\\w+>}.json", hello_show),
                )
                .resource(
                    "/form",
                    Resource::new().get("", form_page).post("", form_submit),
                )
        })
        .build()
        .expect("route templates are valid");

    println!("1. JSON index:");
    let reply = app.handle(Request::builder(Method::Get, "/public/hello.json").build());
    println!("   GET /public/hello.json -> {} ({})", reply.status_line(), reply.text());
    assert_eq!(reply.status(), Status::OK);
    assert_eq!(reply.header("Content-Type"), Some("application/json"));

    println!("\n2. JSON show with a typed placeholder:");
    let reply = app.handle(Request::builder(Method::Get, "/public/hello/Bob.json").build());
    println!("   GET /public/hello/Bob.json -> {} ({})", reply.status_line(), reply.text());
    assert_eq!(reply.text(), "{\"message\":\"Hello, Bob!\"}");

    println!("\n3. Unknown name keeps the JSON shape under a 404:");
    let reply = app.handle(Request::builder(Method::Get, "/public/hello/Zoe.json").build());
    println!("   GET /public/hello/Zoe.json -> {} ({})", reply.status_line(), reply.text());
    assert_eq!(reply.status(), Status::NOT_FOUND);
    assert_eq!(reply.text(), "{\"error\":\"404 Not Found\"}");

    println!("\n4. Form page echoing the query string:");
    let reply = app.handle(
        Request::builder(Method::Get, "/public/form")
            .query("preview=yes")
            .build(),
    );
    println!("   GET /public/form?preview=yes -> {}", reply.status_line());
    assert!(reply.text().contains("query preview: yes"));

    println!("\n5. Multipart post echoing fields and files:");
    let body = concat!(
        "--fD84x\r\n",
        "Content-Disposition: form-data; name=\"name\"\r\n",
        "\r\n",
        "Ada\r\n",
        "--fD84x\r\n",
        "Content-Disposition: form-data; name=\"upfile\"; filename=\"notes.txt\"\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "first line\r\n",
        "--fD84x--\r\n",
    );
    let reply = app.handle(
        Request::builder(Method::Post, "/public/form")
            .content_type("multipart/form-data; boundary=fD84x")
            .body(body.as_bytes().to_vec())
            .build(),
    );
    println!("   POST /public/form -> {} ({})", reply.status_line(), reply.text());
    assert!(reply.text().contains("name: Ada"));
    assert!(reply.text().contains("upload: notes.txt (10 bytes)"));

    println!("\n6. Trailing-slash redirect and method mismatch:");
    let reply = app.handle(Request::builder(Method::Get, "/public/hello.json/").build());
    println!(
        "   GET /public/hello.json/ -> {} (Location: {})",
        reply.status_line(),
        reply.header("Location").unwrap_or("-")
    );
    assert_eq!(reply.status(), Status::MOVED_PERMANENTLY);

    let reply = app.handle(Request::builder(Method::Delete, "/public/form").build());
    println!(
        "   DELETE /public/form -> {} (Allow: {})",
        reply.status_line(),
        reply.header("Allow").unwrap_or("-")
    );
    assert_eq!(reply.status(), Status::METHOD_NOT_ALLOWED);

    println!("\nAll example checks passed!");
}
