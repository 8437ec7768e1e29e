use crate::assembly::{opcodes, MethodBody};
use crate::metadata::{
    method::{Method, MethodRc, MethodSignature},
    token::Token,
    typesystem::CilFlavor,
};
use crate::patch::PatchCallable;

// Helper function to create a (int32, int32) -> int32 method handle
pub fn create_int_binop_method(row: u32, owner: &str, name: &str) -> MethodRc {
    Method::new(
        Token::method(row),
        owner,
        name,
        MethodSignature::returning(vec![CilFlavor::I4, CilFlavor::I4], CilFlavor::I4),
    )
}

// Helper function to create a () -> void method handle
pub fn create_void_method(row: u32, owner: &str, name: &str) -> MethodRc {
    Method::new(Token::method(row), owner, name, MethodSignature::nullary())
}

// Helper function to create a stack-neutral no-op patch callable
pub fn create_callable(row: u32, name: &str) -> PatchCallable {
    PatchCallable::new(
        Method::new(Token::method(row), "Patches", name, MethodSignature::nullary()),
        |_args, _slot| Ok(None),
    )
}

// Helper function to create the canonical two-argument add body
pub fn create_add_body() -> MethodBody {
    let mut body = MethodBody::new();
    body.push(opcodes::ldarg(0));
    body.push(opcodes::ldarg(1));
    body.push(opcodes::add());
    body.push(opcodes::ret());
    body.relayout();
    body
}

// Helper function to create a body that calls each given method once
pub fn create_caller_body(callees: &[MethodRc]) -> MethodBody {
    let mut body = MethodBody::new();
    for callee in callees {
        body.push(opcodes::call(callee));
    }
    body.push(opcodes::ret());
    body.relayout();
    body
}
