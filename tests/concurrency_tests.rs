#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Concurrent calls through one bridge and one dispatcher
//!
//! Every call owns its emulated request and response, so replies never cross
//! between threads and attributes set by one call are invisible to others.

mod common;

use brrtbridge::bridge::DispatchBridge;
use brrtbridge::codec::JsonCodec;
use brrtbridge::dispatcher::{DispatchError, DispatcherRegistry};
use brrtbridge::greeter::{HelloReply, HelloRequest, SAY_HELLO};
use brrtbridge::surface::{ServerRequest, ServerResponse};
use common::fixtures::{greeter_config, greeter_registry, registry_with, DISPATCHER};
use prost::Message;
use serde_json::json;
use std::io::{Read, Write};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 16;
const CALLS_PER_THREAD: usize = 25;

#[test]
fn test_concurrent_calls_receive_their_own_replies() {
    let bridge = Arc::new(DispatchBridge::new(greeter_config(), greeter_registry()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let bridge = Arc::clone(&bridge);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..CALLS_PER_THREAD {
                    let name = format!("caller-{t}-{i}");
                    let reply: HelloReply = bridge
                        .invoke(SAY_HELLO, &HelloRequest { name: name.clone() })
                        .unwrap();
                    assert_eq!(reply.message, format!("well hello {name}"));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_concurrent_json_calls() {
    let registry = greeter_registry();
    let bridge = Arc::new(DispatchBridge::with_codec(greeter_config(), registry, JsonCodec));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                let name = format!("json-{t}");
                let reply: HelloReply = bridge
                    .invoke(SAY_HELLO, &HelloRequest { name: name.clone() })
                    .unwrap();
                assert_eq!(reply.message, format!("well hello {name}"));
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_attributes_are_isolated_per_call() {
    // Sets an attribute from the body, then checks it is the only one it sees
    let isolating = |req: &mut dyn ServerRequest,
                     res: &mut dyn ServerResponse|
     -> Result<(), DispatchError> {
        let mut body = Vec::new();
        req.input_stream().read_to_end(&mut body)?;
        let request = HelloRequest::decode(body.as_slice()).map_err(|e| {
            DispatchError::BadRequest {
                reason: e.to_string(),
            }
        })?;

        let leaked = req.attribute("caller").cloned();
        req.set_attribute("caller", json!(request.name));
        thread::yield_now();
        let seen = req
            .attribute("caller")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let message = match leaked {
            Some(other) => format!("leaked {other}"),
            None => seen,
        };
        res.output_stream()
            .write_all(&HelloReply { message }.encode_to_vec())?;
        Ok(())
    };

    let registry: Arc<DispatcherRegistry> = registry_with(Arc::new(isolating));
    assert_eq!(registry.names(), vec![DISPATCHER.to_string()]);
    let bridge = Arc::new(DispatchBridge::new(greeter_config(), registry));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for i in 0..CALLS_PER_THREAD {
                    let name = format!("{t}:{i}");
                    let reply: HelloReply = bridge
                        .invoke(SAY_HELLO, &HelloRequest { name: name.clone() })
                        .unwrap();
                    assert_eq!(reply.message, name);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_bind_while_calling() {
    let registry = Arc::new(DispatcherRegistry::new());
    let bridge = Arc::new(DispatchBridge::new(greeter_config(), Arc::clone(&registry)));

    let before: Result<HelloReply, _> = bridge.invoke(SAY_HELLO, &HelloRequest::default());
    assert!(before.is_err());

    registry
        .bind(DISPATCHER, Arc::new(common::fixtures::greeter_resources()))
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                let reply: HelloReply = bridge
                    .invoke(SAY_HELLO, &HelloRequest { name: t.to_string() })
                    .unwrap();
                assert_eq!(reply.message, format!("well hello {t}"));
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}
