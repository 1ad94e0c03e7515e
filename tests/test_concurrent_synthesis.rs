use interface_proxy::{
    DispatchDelegate, DispatchRequest, ForeignObject, ForeignValue, MarshalError, Marshaler,
    ProxyFactory, TypeInfo, Value, ValueType,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
struct Token(i64);

impl ForeignObject for Token {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marshaler that counts bind-time requests and is slow to answer them
#[derive(Default)]
struct SlowMarshaler {
    requests: AtomicUsize,
}

impl Marshaler for SlowMarshaler {
    fn resolve_dispatch(&self, request: &DispatchRequest<'_>) -> Option<DispatchDelegate> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        match request.member {
            "Value" => Some(Arc::new(|target: &ForeignValue, _: &[Value]| -> Result<Value, MarshalError> {
                let token = target.as_any().downcast_ref::<Token>().ok_or("not a token")?;
                Ok(Value::I64(token.0))
            })),
            _ => None,
        }
    }
}

fn itoken(namespace: &str) -> Arc<TypeInfo> {
    TypeInfo::interface(namespace, "IToken")
        .readonly_property("Value", ValueType::I64)
        .build()
}

#[test]
fn test_concurrent_implement_synthesizes_once() {
    let marshaler = Arc::new(SlowMarshaler::default());
    let factory = Arc::new(ProxyFactory::new(Arc::clone(&marshaler)));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let factory = Arc::clone(&factory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                factory.implement(&itoken("shared")).unwrap()
            })
        })
        .collect();

    let types: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(types.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));

    let stats = factory.stats();
    assert_eq!(stats.types_synthesized, 1);
    assert_eq!(stats.synthesis_failures, 0);
    assert_eq!(stats.cache_hits, threads as u64 - 1);
    // One bind pass: a single slot for the read-only property
    assert_eq!(marshaler.requests.load(Ordering::SeqCst), 1);
    assert_eq!(factory.module().len(), 1);
}

#[test]
fn test_distinct_interfaces_in_parallel() {
    let factory = Arc::new(ProxyFactory::new(SlowMarshaler::default()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let factory = Arc::clone(&factory);
            thread::spawn(move || {
                let ns = format!("ns{}", i % 4);
                let adapter = factory.wrap(&itoken(&ns), Arc::new(Token(i))).unwrap();
                adapter.get("Value").unwrap()
            })
        })
        .collect();

    let values: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(values, (0..8).map(Value::I64).collect::<Vec<_>>());
    assert_eq!(factory.module().len(), 4);
    assert_eq!(factory.stats().types_synthesized, 4);
}

#[test]
fn test_adapters_share_type_across_threads() {
    let factory = ProxyFactory::new(SlowMarshaler::default());
    let ty = factory.implement(&itoken("shared")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ty = Arc::clone(&ty);
            thread::spawn(move || {
                let adapter = ty.construct(Arc::new(Token(i * 10))).unwrap();
                (0..100).map(|_| adapter.get("Value").unwrap()).last()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(Value::I64(i as i64 * 10)));
    }
    assert_eq!(factory.stats().dispatch_calls, 800);
}
