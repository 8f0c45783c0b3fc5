//! Full-stack tests through the facade: declared callables published over
//! a wire engine and invoked end to end.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mcp_mediator::kernel::{DefaultMediator, FunctionHandler, Request, ServiceHandler};
use mcp_mediator::primitives::{ServerInfo, ToolAnnotations, ToolName};
use mcp_mediator::schema::{Constraints, ParamSpec, ParamType};
use mcp_mediator::tools::{ToolDecl, ToolMethod};
use mcp_mediator::wire::{ServerEngine, StdioServerEngine};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

fn search_method() -> ToolMethod {
    ToolMethod::new("searchDocs", |args: Vec<Value>| async move {
        let query = args[0].as_str().unwrap_or_default();
        let limit = args[1].as_i64().unwrap_or(10);
        Ok(json!(format!("{limit} results for '{query}'")))
    })
    .with_params(vec![
        ParamSpec::new("query", ParamType::string()).required(),
        ParamSpec::new("limit", ParamType::integer())
            .with_constraints(Constraints::new().with_minimum(1.0).with_default(json!(10))),
    ])
    .with_decl(ToolDecl::new().with_description("Searches the document index"))
}

fn mediator_with_search() -> DefaultMediator {
    let mediator = DefaultMediator::new(ServerInfo::new("docs-server", "0.1.0").unwrap());
    let handler = ServiceHandler::builder("docs").method(search_method()).build();
    mediator.register_handler(Arc::new(handler)).unwrap();
    mediator
}

#[tokio::test]
async fn declared_params_appear_in_published_schema() {
    let mediator = mediator_with_search();
    let engine = Arc::new(StdioServerEngine::new(
        ServerInfo::new("engine", "0.1.0").unwrap(),
    ));
    mediator
        .initialize(Arc::clone(&engine) as Arc<dyn ServerEngine>)
        .unwrap();

    let tools = engine.list_tools();
    assert_eq!(tools.len(), 1);
    let spec = &tools[0];
    assert_eq!(spec.name, "search_docs");

    let properties = spec.input_schema["properties"].as_object().unwrap();
    assert_eq!(properties.len(), 2);
    assert_eq!(properties["query"]["type"], "string");
    assert_eq!(properties["limit"]["minimum"], 1.0);

    let required = spec.input_schema["required"].as_array().unwrap();
    assert_eq!(required.len(), 1);
    assert_eq!(required[0], "query");
}

#[tokio::test]
async fn wire_call_resolves_defaults_and_replies() {
    let mediator = mediator_with_search();
    let engine = Arc::new(StdioServerEngine::new(
        ServerInfo::new("engine", "0.1.0").unwrap(),
    ));
    mediator
        .initialize(Arc::clone(&engine) as Arc<dyn ServerEngine>)
        .unwrap();

    let (client, server) = duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let serve = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.serve(server_read, server_write).await })
    };

    let (client_read, mut client_write) = tokio::io::split(client);
    let call = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": "search_docs", "arguments": { "query": "mediator" } }
    });
    client_write
        .write_all(format!("{call}\n").as_bytes())
        .await
        .unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let reply: Value =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        reply["result"]["content"][0]["text"],
        "10 results for 'mediator'"
    );
    assert_eq!(reply["result"].get("isError"), Some(&json!(false)));

    client_write.shutdown().await.unwrap();
    serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn handler_failure_is_in_band_error_on_the_wire() {
    let mediator = DefaultMediator::new(ServerInfo::new("docs-server", "0.1.0").unwrap());
    let method = ToolMethod::new("alwaysFails", |_args: Vec<Value>| async move {
        Err(mcp_mediator::tools::InvocationError::failure("index offline"))
    })
    .with_decl(ToolDecl::new().with_description("Always fails"));
    mediator
        .register_handler(Arc::new(FunctionHandler::new(method).unwrap()))
        .unwrap();

    let engine = Arc::new(StdioServerEngine::new(
        ServerInfo::new("engine", "0.1.0").unwrap(),
    ));
    mediator
        .initialize(Arc::clone(&engine) as Arc<dyn ServerEngine>)
        .unwrap();

    let (client, server) = duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let serve = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.serve(server_read, server_write).await })
    };

    let (client_read, mut client_write) = tokio::io::split(client);
    let call = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": "always_fails", "arguments": {} }
    });
    client_write
        .write_all(format!("{call}\n").as_bytes())
        .await
        .unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let reply: Value =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["result"]["isError"], true);
    let text = reply["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("index offline"));

    client_write.shutdown().await.unwrap();
    serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn idempotent_tool_publishes_hint_and_repeats_safely() {
    // An "enable" switch: flipping it twice has the effect of flipping
    // it once, which is exactly what the hint promises clients.
    let state = Arc::new(AtomicUsize::new(0));
    let changes = Arc::new(AtomicUsize::new(0));
    let method = {
        let state = Arc::clone(&state);
        let changes = Arc::clone(&changes);
        ToolMethod::new("enableIndexing", move |_args: Vec<Value>| {
            let state = Arc::clone(&state);
            let changes = Arc::clone(&changes);
            async move {
                if state.swap(1, Ordering::SeqCst) == 0 {
                    changes.fetch_add(1, Ordering::SeqCst);
                }
                Ok(json!("enabled"))
            }
        })
        .with_decl(
            ToolDecl::new()
                .with_description("Enables background indexing")
                .with_annotations(ToolAnnotations::new().idempotent(true)),
        )
    };

    let mediator = DefaultMediator::new(ServerInfo::new("docs-server", "0.1.0").unwrap());
    mediator
        .register_handler(Arc::new(FunctionHandler::new(method).unwrap()))
        .unwrap();

    let engine = Arc::new(StdioServerEngine::new(
        ServerInfo::new("engine", "0.1.0").unwrap(),
    ));
    mediator
        .initialize(Arc::clone(&engine) as Arc<dyn ServerEngine>)
        .unwrap();

    let tools = engine.list_tools();
    assert_eq!(tools.len(), 1);
    let annotations = tools[0].annotations.as_ref().expect("published hints");
    assert_eq!(annotations.idempotent_hint, Some(true));

    let call = || {
        mediator.execute(Request::new(
            ToolName::from_str("enable_indexing").unwrap(),
            serde_json::Map::new(),
        ))
    };
    let first = call().await.unwrap();
    let second = call().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn direct_execute_skips_the_wire() {
    let mediator = mediator_with_search();
    let mut arguments = serde_json::Map::new();
    arguments.insert("query".into(), json!("direct"));
    arguments.insert("limit".into(), json!(3));

    let value = mediator
        .execute(Request::new(
            ToolName::from_str("search_docs").unwrap(),
            arguments,
        ))
        .await
        .unwrap();
    assert_eq!(value, json!("3 results for 'direct'"));
}
