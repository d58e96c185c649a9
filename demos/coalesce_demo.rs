//! Ten concurrent identical requests, one transport call.
//!
//! Run with `RUST_LOG=coalesce=debug cargo run --example coalesce_demo`
//! to watch the in-flight lifecycle in the logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use coalesce::http::{Request, Response};
use coalesce::{Coalesceable, fetch_fn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let calls = Arc::new(AtomicUsize::new(0));

    let transport = {
        let calls = Arc::clone(&calls);
        fetch_fn(move |request: Request| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                // Stand-in for a slow network round trip.
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, std::convert::Infallible>(
                    Response::new(200).body(format!("hello from {}", request.url())),
                )
            }
        })
    };

    let coalesced = Arc::new(transport.coalesced());

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let coalesced = Arc::clone(&coalesced);
        tasks.push(tokio::spawn(async move {
            let request = Request::new("https://example.com/greeting").unwrap();
            coalesced.fetch(request).await.unwrap()
        }));
    }

    for task in tasks {
        let response = task.await?;
        println!("{}", response.text());
    }

    println!("transport calls: {}", calls.load(Ordering::SeqCst));
    Ok(())
}
