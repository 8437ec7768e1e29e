//! Shared fixture world for the patching integration tests.
//!
//! Models a small pre-compiled program the way a host runtime would see it:
//! a `Calculator` with plain and counted addition, a `Helper` type with leaf
//! methods backed by native closures (so tests can count real executions),
//! and a `Caller` type whose IL bodies contain the call expressions the
//! weaving tests instrument.

#![allow(dead_code)]

use std::sync::{
    atomic::AtomicI32,
    atomic::Ordering,
    Arc, Mutex,
};

use cilweave::{
    assembly::{opcodes, MethodBody},
    host::{HostRuntime, Value},
    metadata::{
        method::{Method, MethodRc, MethodSignature},
        token::Token,
        typesystem::CilFlavor,
    },
    patch::PatchCallable,
    Result,
};

/// Execution-order journal shared between fixture natives and patches.
pub type Trace = Arc<Mutex<Vec<&'static str>>>;

pub struct World {
    pub host: HostRuntime,

    // Whole-method targets
    pub add: MethodRc,
    pub add_with_counter: MethodRc,

    // Call-site targets
    pub call_helper: MethodRc,
    pub call_helpers_twice: MethodRc,
    pub call_bar_then_foo: MethodRc,
    pub compute_around_call: MethodRc,

    // Leaf methods reachable from the callers
    pub nothin: MethodRc,
    pub double: MethodRc,
    pub bar: MethodRc,
    pub foo: MethodRc,

    pub body_runs: Arc<AtomicI32>,
    pub nothin_calls: Arc<AtomicI32>,
    pub double_calls: Arc<AtomicI32>,
    pub bar_calls: Arc<AtomicI32>,
    pub foo_calls: Arc<AtomicI32>,
    pub trace: Trace,
}

impl World {
    pub fn new() -> Result<World> {
        let host = HostRuntime::new();
        let body_runs = Arc::new(AtomicI32::new(0));
        let nothin_calls = Arc::new(AtomicI32::new(0));
        let double_calls = Arc::new(AtomicI32::new(0));
        let bar_calls = Arc::new(AtomicI32::new(0));
        let foo_calls = Arc::new(AtomicI32::new(0));
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        // Helper.Nothin() => void, counted and journaled
        let nothin = Method::new(Token::method(10), "Helper", "Nothin", MethodSignature::nullary());
        {
            let calls = nothin_calls.clone();
            let journal = trace.clone();
            host.define_native(
                nothin.clone(),
                Arc::new(move |_args| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if let Ok(mut entries) = journal.lock() {
                        entries.push("nothin");
                    }
                    Ok(None)
                }),
            )?;
        }

        // Helper.Double(x) => x * 2
        let double = Method::new(
            Token::method(11),
            "Helper",
            "Double",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        {
            let calls = double_calls.clone();
            host.define_native(
                double.clone(),
                Arc::new(move |args| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    match args.first() {
                        Some(Value::I32(x)) => Ok(Some(Value::I32(x * 2))),
                        _ => Ok(Some(Value::I32(0))),
                    }
                }),
            )?;
        }

        // Helper.Bar(x) => x + 1
        let bar = Method::new(
            Token::method(12),
            "Helper",
            "Bar",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        {
            let calls = bar_calls.clone();
            host.define_native(
                bar.clone(),
                Arc::new(move |args| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    match args.first() {
                        Some(Value::I32(x)) => Ok(Some(Value::I32(x + 1))),
                        _ => Ok(Some(Value::I32(0))),
                    }
                }),
            )?;
        }

        // Helper.Foo(x) => x * 2
        let foo = Method::new(
            Token::method(13),
            "Helper",
            "Foo",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        {
            let calls = foo_calls.clone();
            host.define_native(
                foo.clone(),
                Arc::new(move |args| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    match args.first() {
                        Some(Value::I32(x)) => Ok(Some(Value::I32(x * 2))),
                        _ => Ok(Some(Value::I32(0))),
                    }
                }),
            )?;
        }

        // Counters.BodyRan() => void, marks that a counted body really executed
        let body_ran = Method::new(
            Token::method(20),
            "Counters",
            "BodyRan",
            MethodSignature::nullary(),
        );
        {
            let runs = body_runs.clone();
            host.define_native(
                body_ran.clone(),
                Arc::new(move |_args| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }),
            )?;
        }

        // Calculator.Add(a, b) => a + b
        let add = Method::new(
            Token::method(1),
            "Calculator",
            "Add",
            MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::ldarg(0));
        body.push(opcodes::ldarg(1));
        body.push(opcodes::add());
        body.push(opcodes::ret());
        host.define_method(add.clone(), body)?;

        // Calculator.AddWithCounter(a, b) => { BodyRan(); return a + b; }
        let add_with_counter = Method::new(
            Token::method(2),
            "Calculator",
            "AddWithCounter",
            MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::call(&body_ran));
        body.push(opcodes::ldarg(0));
        body.push(opcodes::ldarg(1));
        body.push(opcodes::add());
        body.push(opcodes::ret());
        host.define_method(add_with_counter.clone(), body)?;

        // Caller.CallHelper() => Helper.Double(21)
        let call_helper = Method::new(
            Token::method(3),
            "Caller",
            "CallHelper",
            MethodSignature::returning(vec![], CilFlavor::I4),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::ldc_i4(21));
        body.push(opcodes::call(&double));
        body.push(opcodes::ret());
        host.define_method(call_helper.clone(), body)?;

        // Caller.CallHelpersTwice() => { Helper.Nothin(); Helper.Nothin(); }
        let call_helpers_twice = Method::new(
            Token::method(4),
            "Caller",
            "CallHelpersTwice",
            MethodSignature::nullary(),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::call(&nothin));
        body.push(opcodes::call(&nothin));
        body.push(opcodes::ret());
        host.define_method(call_helpers_twice.clone(), body)?;

        // Caller.CallBarThenFoo(x) => Helper.Foo(Helper.Bar(x))
        let call_bar_then_foo = Method::new(
            Token::method(5),
            "Caller",
            "CallBarThenFoo",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::ldarg(0));
        body.push(opcodes::call(&bar));
        body.push(opcodes::call(&foo));
        body.push(opcodes::ret());
        host.define_method(call_bar_then_foo.clone(), body)?;

        // Caller.ComputeAroundCall(x) => { let v = x * 2; Helper.Nothin(); return v + 1; }
        // The intermediate value stays on the operand stack across the call.
        let compute_around_call = Method::new(
            Token::method(6),
            "Caller",
            "ComputeAroundCall",
            MethodSignature::returning(vec![CilFlavor::I4], CilFlavor::I4),
        );
        let mut body = MethodBody::new();
        body.push(opcodes::ldarg(0));
        body.push(opcodes::ldc_i4(2));
        body.push(opcodes::mul());
        body.push(opcodes::call(&nothin));
        body.push(opcodes::ldc_i4(1));
        body.push(opcodes::add());
        body.push(opcodes::ret());
        host.define_method(compute_around_call.clone(), body)?;

        Ok(World {
            host,
            add,
            add_with_counter,
            call_helper,
            call_helpers_twice,
            call_bar_then_foo,
            compute_around_call,
            nothin,
            double,
            bar,
            foo,
            body_runs,
            nothin_calls,
            double_calls,
            bar_calls,
            foo_calls,
            trace,
        })
    }

    /// Snapshot of the execution journal.
    pub fn journal(&self) -> Vec<&'static str> {
        self.trace.lock().map(|entries| entries.clone()).unwrap_or_default()
    }
}

/// A stack-neutral patch callable that counts its own executions.
pub fn observer(row: u32, name: &str, hits: &Arc<AtomicI32>) -> PatchCallable {
    let hits = hits.clone();
    PatchCallable::new(
        Method::new(Token::method(row), "Patches", name, MethodSignature::nullary()),
        move |_args, _slot| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        },
    )
}

/// A stack-neutral patch callable that writes `mark` into the journal.
pub fn tracer(row: u32, name: &str, trace: &Trace, mark: &'static str) -> PatchCallable {
    let trace = trace.clone();
    PatchCallable::new(
        Method::new(Token::method(row), "Patches", name, MethodSignature::nullary()),
        move |_args, _slot| {
            if let Ok(mut entries) = trace.lock() {
                entries.push(mark);
            }
            Ok(None)
        },
    )
}

/// A counter for patch-side effects.
pub fn counter() -> Arc<AtomicI32> {
    Arc::new(AtomicI32::new(0))
}
