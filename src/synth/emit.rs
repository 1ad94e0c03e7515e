//! Forwarding-body construction
//!
//! Every slot of a synthesized type gets a body: a boxed closure that pulls
//! the foreign value out of the adapter, checks and converts the arguments
//! against the declared signature, invokes the marshaler's delegate and
//! converts the result back to the declared type. Slots the marshaler
//! declined, and event accessors, get stubs that fail at call time.

use super::adapter::Adapter;
use crate::descriptor::{MemberDescriptor, MemberKind};
use crate::errors::{ProxyError, Result};
use crate::marshal::{DispatchDelegate, DispatchKind};
use crate::metrics::ProxyStats;
use crate::types::{Param, Value, ValueType};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{trace, warn};

/// Executable body of one slot, shared by every instance of the type
pub type ForwardingBody = Box<dyn Fn(&Adapter, &[Value]) -> Result<Value> + Send + Sync>;

/// Settings every emitted body captures
#[derive(Clone)]
pub(crate) struct EmitContext {
    pub coerce_numbers: bool,
    pub stats: Arc<ProxyStats>,
}

/// Parameters a slot accepts, in the order the delegate receives them
pub(crate) fn slot_params(member: &MemberDescriptor, kind: DispatchKind) -> Vec<Param> {
    match kind {
        DispatchKind::Set => {
            let mut params = member.params.clone();
            params.push(Param::new("value", member.ty.clone()));
            params
        }
        _ => member.params.clone(),
    }
}

/// Type a slot's result is converted to
pub(crate) fn slot_return(member: &MemberDescriptor, kind: DispatchKind) -> ValueType {
    match kind {
        DispatchKind::Get | DispatchKind::Call => member.ty.clone(),
        DispatchKind::Set | DispatchKind::AddHandler | DispatchKind::RemoveHandler => ValueType::Void,
    }
}

/// Build the body for one slot of `member`
pub(crate) fn emit_slot(
    ctx: &EmitContext,
    member: &MemberDescriptor,
    kind: DispatchKind,
    delegate: Option<DispatchDelegate>,
) -> ForwardingBody {
    if member.kind == MemberKind::Event {
        return unsupported_stub(ctx, member, kind, "event accessors are not forwarded");
    }

    let Some(delegate) = delegate else {
        warn!(
            target: "synth",
            member = %member.qualified_name(),
            %kind,
            "marshaler provided no dispatch; calls will fail"
        );
        return unsupported_stub(ctx, member, kind, "the marshaler provided no dispatch for it");
    };

    let qualified = format!("{}.{}", member.qualified_name(), kind);
    let params = slot_params(member, kind);
    let returns = slot_return(member, kind);
    let coerce = ctx.coerce_numbers;
    let stats = Arc::clone(&ctx.stats);

    Box::new(move |adapter: &Adapter, args: &[Value]| {
        let result = forward(adapter, args, &qualified, &params, &returns, coerce, &delegate);
        stats.record_dispatch(result.is_ok());
        result
    })
}

fn forward(
    adapter: &Adapter,
    args: &[Value],
    qualified: &str,
    params: &[Param],
    returns: &ValueType,
    coerce: bool,
    delegate: &DispatchDelegate,
) -> Result<Value> {
    if args.len() != params.len() {
        return Err(ProxyError::ArityMismatch {
            member: qualified.to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }

    let converted = args
        .iter()
        .zip(params)
        .map(|(arg, param)| {
            param.ty.coerce(arg.clone(), coerce).map_err(|e| {
                ProxyError::marshaling(qualified, format!("argument '{}': {}", param.name, e))
            })
        })
        .collect::<Result<SmallVec<[Value; 4]>>>()?;

    let target = adapter.foreign_value()?;
    trace!(target: "dispatch", member = qualified, args = converted.len(), "forwarding");

    let raw = (delegate)(&target, converted.as_slice())
        .map_err(|e| ProxyError::marshaling(qualified, e))?;
    returns
        .coerce(raw, coerce)
        .map_err(|e| ProxyError::marshaling(qualified, format!("return value: {}", e)))
}

fn unsupported_stub(
    ctx: &EmitContext,
    member: &MemberDescriptor,
    kind: DispatchKind,
    reason: &str,
) -> ForwardingBody {
    let error = ProxyError::unsupported(
        member.declaring_interface.clone(),
        format!("{}.{}", member.name, kind),
        reason,
    );
    let stats = Arc::clone(&ctx.stats);
    Box::new(move |_: &Adapter, _: &[Value]| {
        stats.record_unsupported();
        Err(error.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(readable: bool, writable: bool, index: Vec<Param>) -> MemberDescriptor {
        MemberDescriptor {
            kind: MemberKind::Property,
            name: "Item".to_string(),
            declaring_interface: "app.IGrid".to_string(),
            params: index,
            ty: ValueType::F64,
            readable,
            writable,
            overload: 0,
        }
    }

    #[test]
    fn test_setter_params_append_value() {
        let member = property(true, true, vec![Param::new("row", ValueType::I32)]);
        let params = slot_params(&member, DispatchKind::Set);
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["row", "value"]);
        assert_eq!(params[1].ty, ValueType::F64);
    }

    #[test]
    fn test_getter_params_are_index_only() {
        let member = property(true, false, vec![Param::new("row", ValueType::I32)]);
        assert_eq!(slot_params(&member, DispatchKind::Get).len(), 1);
        assert_eq!(slot_return(&member, DispatchKind::Get), ValueType::F64);
        assert_eq!(slot_return(&member, DispatchKind::Set), ValueType::Void);
    }
}
