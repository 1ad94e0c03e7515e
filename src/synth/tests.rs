//! Tests for synthesis, binding and forwarding

use super::*;
use crate::config::ProxyConfig;
use crate::handle::{try_get_foreign_value, ForeignObject};
use crate::marshal::{DispatchDelegate, TableMarshaler};
use crate::metrics::ProxyStats;
use crate::types::{Param, Value, ValueType};
use parking_lot::Mutex;
use std::any::Any;

#[derive(Debug, Default)]
struct Widget {
    title: Mutex<String>,
    cells: Mutex<Vec<f64>>,
}

impl ForeignObject for Widget {
    fn type_name(&self) -> &str {
        "Widget"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn widget(target: &ForeignValue) -> &Widget {
    target.as_any().downcast_ref::<Widget>().unwrap()
}

fn new_widget() -> ForeignValue {
    Arc::new(Widget {
        title: Mutex::new("untitled".to_string()),
        cells: Mutex::new(vec![0.0; 4]),
    })
}

fn iwidget() -> Arc<TypeInfo> {
    TypeInfo::interface("ui", "IWidget")
        .property("Title", ValueType::String)
        .indexer("Cell", [("i", ValueType::I32)], ValueType::F64)
        .method("Resize", [("w", ValueType::I32), ("h", ValueType::I32)], ValueType::I64)
        .event("Clicked", ValueType::Foreign)
        .build()
}

fn widget_marshaler() -> TableMarshaler {
    TableMarshaler::new()
        .on_get("ui.IWidget", "Title", |t, _| Ok(widget(t).title.lock().clone().into()))
        .on_set("ui.IWidget", "Title", |t, args| {
            *widget(t).title.lock() = String::try_from(args[0].clone())?;
            Ok(Value::Null)
        })
        .on_get("ui.IWidget", "Cell", |t, args| {
            let i = i32::try_from(args[0].clone())? as usize;
            let cells = widget(t).cells.lock();
            cells.get(i).copied().map(Value::F64).ok_or_else(|| "index out of range".into())
        })
        .on_set("ui.IWidget", "Cell", |t, args| {
            let i = i32::try_from(args[0].clone())? as usize;
            let v = f64::try_from(args[1].clone())?;
            widget(t).cells.lock()[i] = v;
            Ok(Value::Null)
        })
        .on_call("ui.IWidget", "Resize", |_, args| {
            let w = i32::try_from(args[0].clone())?;
            let h = i32::try_from(args[1].clone())?;
            Ok(Value::I32(w * h))
        })
}

fn synthesizer(marshaler: TableMarshaler) -> Synthesizer {
    Synthesizer::new(Arc::new(marshaler), ProxyConfig::default())
}

fn ctx() -> EmitContext {
    EmitContext {
        coerce_numbers: true,
        stats: Arc::new(ProxyStats::new()),
    }
}

#[test]
fn test_type_name_is_derived_from_interface() {
    let synth = synthesizer(widget_marshaler());
    let ty = synth.implement(&iwidget()).unwrap();
    assert_eq!(ty.name(), "InterfaceProxies.ui.IWidgetProxy");
    assert!(synth.module().contains("InterfaceProxies.ui.IWidgetProxy"));
    assert_eq!(
        synth.module().interface_of("InterfaceProxies.ui.IWidgetProxy"),
        Some("ui.IWidget".to_string())
    );
}

#[test]
fn test_uncached_synthesis_collides() {
    let synth = synthesizer(widget_marshaler());
    synth.implement(&iwidget()).unwrap();
    let err = synth.implement(&iwidget()).unwrap_err();
    assert_eq!(
        err,
        ProxyError::DuplicateTypeName("InterfaceProxies.ui.IWidgetProxy".into())
    );
    assert_eq!(synth.module().len(), 1);
}

#[test]
fn test_construct_before_bind_fails() {
    let iface = iwidget();
    let descriptor = InterfaceDescriptor::extract(&iface).unwrap();
    let ty = Arc::new(SynthesizedType::define("T".into(), Arc::clone(&iface), descriptor));

    assert!(!ty.is_bound());
    assert_eq!(ty.construct(new_widget()).unwrap_err(), ProxyError::NotBound("T".into()));

    ty.bind(&widget_marshaler(), EventPolicy::Stub, &ctx()).unwrap();
    assert!(ty.is_bound());
    assert!(ty.construct(new_widget()).is_ok());

    // The table is set once
    assert_eq!(
        ty.bind(&widget_marshaler(), EventPolicy::Stub, &ctx()).unwrap_err(),
        ProxyError::AlreadyBound("T".into())
    );
}

#[test]
fn test_property_and_indexer_forwarding() {
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = construct_adapter(&ty, new_widget()).unwrap();

    assert_eq!(adapter.get("Title").unwrap(), Value::from("untitled"));
    adapter.set("Title", "main").unwrap();
    assert_eq!(adapter.get("Title").unwrap(), Value::from("main"));

    adapter.set_indexed("Cell", &[Value::I32(2)], 1.5).unwrap();
    assert_eq!(adapter.get_indexed("Cell", &[Value::I32(2)]).unwrap(), Value::F64(1.5));
    // Integer value widens to the declared f64
    adapter.set_indexed("Cell", &[Value::I32(3)], 4).unwrap();
    assert_eq!(adapter.get_indexed("Cell", &[Value::I32(3)]).unwrap(), Value::F64(4.0));
}

#[test]
fn test_method_result_is_converted() {
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = ty.construct(new_widget()).unwrap();
    // Delegate answers i32, the interface declares i64
    let area = adapter.call("Resize", &[Value::I32(3), Value::I32(4)]).unwrap();
    assert_eq!(area, Value::I64(12));
}

#[test]
fn test_foreign_failure_becomes_marshaling_error() {
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = ty.construct(new_widget()).unwrap();

    let err = adapter.get_indexed("Cell", &[Value::I32(9)]).unwrap_err();
    assert!(matches!(err, ProxyError::MarshalingFailed { ref member, .. } if member == "ui.IWidget.Cell.get"));

    // The adapter is still usable
    assert!(adapter.get("Title").is_ok());
}

#[test]
fn test_argument_checks() {
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = ty.construct(new_widget()).unwrap();

    let err = adapter.call("Resize", &[Value::I32(3)]).unwrap_err();
    assert_eq!(
        err,
        ProxyError::ArityMismatch {
            member: "ui.IWidget.Resize.call".into(),
            expected: 2,
            got: 1
        }
    );

    let err = adapter.call("Resize", &[Value::from("3"), Value::I32(4)]).unwrap_err();
    assert!(err.to_string().contains("argument 'w'"));
}

#[test]
fn test_events_are_stubbed() {
    let stats = Arc::new(ProxyStats::new());
    let synth = Synthesizer::with_stats(
        Arc::new(widget_marshaler()),
        ProxyConfig::default(),
        Arc::clone(&stats),
    );
    let adapter = synth.implement(&iwidget()).unwrap().construct(new_widget()).unwrap();

    let handler = Value::Foreign(new_widget());
    let err = adapter.add_handler("Clicked", handler.clone()).unwrap_err();
    assert!(matches!(err, ProxyError::UnsupportedMember { ref member, .. } if member == "Clicked.add"));
    assert!(adapter.remove_handler("Clicked", handler).is_err());
    assert_eq!(stats.snapshot().unsupported_calls, 2);
}

#[test]
fn test_reject_policy_releases_name() {
    let config = ProxyConfig::default().with_events(EventPolicy::Reject);
    let synth = Synthesizer::new(Arc::new(widget_marshaler()), config);

    let err = synth.implement(&iwidget()).unwrap_err();
    assert!(matches!(err, ProxyError::UnsupportedMember { ref member, .. } if member == "Clicked"));
    assert!(synth.module().is_empty());

    let quiet = TypeInfo::interface("ui", "IQuiet")
        .property("Title", ValueType::String)
        .build();
    assert!(synth.implement(&quiet).is_ok());
}

#[test]
fn test_declined_member_is_isolated() {
    let marshaler = TableMarshaler::new().on_get("ui.IWidget", "Title", |_, _| Ok("t".into()));
    let adapter = synthesizer(marshaler).implement(&iwidget()).unwrap().construct(new_widget()).unwrap();

    assert_eq!(adapter.get("Title").unwrap(), Value::from("t"));
    let err = adapter.call("Resize", &[Value::I32(1), Value::I32(1)]).unwrap_err();
    assert!(matches!(err, ProxyError::UnsupportedMember { .. }));
}

#[derive(Default)]
struct RecordingMarshaler {
    requests: Mutex<Vec<(String, String, DispatchKind, Vec<String>)>>,
}

impl Marshaler for RecordingMarshaler {
    fn resolve_dispatch(&self, request: &DispatchRequest<'_>) -> Option<DispatchDelegate> {
        self.requests.lock().push((
            request.interface.to_string(),
            format!("{}.{}", request.declaring_interface, request.member),
            request.kind,
            request.params.iter().map(|p| p.name.clone()).collect(),
        ));
        None
    }
}

#[test]
fn test_marshaler_sees_every_slot_once() {
    let recorder = Arc::new(RecordingMarshaler::default());
    let synth = Synthesizer::new(recorder.clone(), ProxyConfig::default());
    let ty = synth.implement(&iwidget()).unwrap();

    let requests = recorder.requests.lock().clone();
    // Event slots are stubbed without consulting the marshaler
    assert_eq!(requests.len(), ty.slot_count() - 2);
    assert!(requests.iter().all(|(iface, ..)| iface == "ui.IWidget"));

    let cell_set = requests
        .iter()
        .find(|(_, member, kind, _)| member == "ui.IWidget.Cell" && *kind == DispatchKind::Set)
        .unwrap();
    assert_eq!(cell_set.3, vec!["i".to_string(), "value".to_string()]);
}

#[test]
fn test_invoke_slot_by_key() {
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = ty.construct(new_widget()).unwrap();

    let key = SlotKey {
        declaring_interface: "ui.IWidget".into(),
        name: "Title".into(),
        kind: DispatchKind::Get,
        overload: 0,
    };
    let slot = ty.layout().slot_of(&key).unwrap();
    assert_eq!(adapter.invoke_slot(slot, &[]).unwrap(), Value::from("untitled"));
    assert!(adapter.invoke_slot(ty.slot_count(), &[]).is_err());
}

#[test]
fn test_adapter_values_cross_interfaces() {
    let iparent = TypeInfo::interface("ui", "IParent")
        .method("Child", Param::none(), ValueType::Interface("ui.IWidget".into()))
        .build();

    let factory = ProxyFactory::new(widget_marshaler());
    let child = factory.wrap(&iwidget(), new_widget()).unwrap();
    let returned = Value::Adapter(Arc::clone(&child));
    let marshaler = TableMarshaler::new().on_call("ui.IParent", "Child", move |_, _| Ok(returned.clone()));

    let parent = synthesizer(marshaler).implement(&iparent).unwrap().construct(new_widget()).unwrap();
    let value = parent.call("Child", &[]).unwrap();
    let adapter = Arc::<Adapter>::try_from(value).unwrap();
    assert!(Arc::ptr_eq(&adapter, &child));
    assert_eq!(adapter.get("Title").unwrap(), Value::from("untitled"));
}

#[test]
fn test_foreign_value_round_trip() {
    let value = new_widget();
    let ty = synthesizer(widget_marshaler()).implement(&iwidget()).unwrap();
    let adapter = ty.construct(Arc::clone(&value)).unwrap();

    let extracted = try_get_foreign_value(&adapter).unwrap();
    assert!(Arc::ptr_eq(&extracted, &value));
    assert!(try_get_foreign_value(&*adapter).is_some());
    assert!(try_get_foreign_value(&"not an adapter").is_none());
    assert!(!adapter.handle().is_weak());
}
