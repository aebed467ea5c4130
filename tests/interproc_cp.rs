//! A constant argument at a call site reaches the callee's parameter and
//! its returned constant reaches the caller's result variable, entirely
//! through the interprocedural Call/Return edges (no intraprocedural
//! transfer ever sees the other method's statements).

use pta_core::features::interproc_cp::analyze;
use pta_core::features::lattice::Value;
use pta_core::features::points_to::{Context, Insensitive, PointerAnalysis};
use pta_core::shared::heap::{HeapModel, Obj};
use pta_core::shared::hierarchy::{ClassHierarchy, MethodDecl};
use pta_core::shared::ir::{
    AllocSiteId, InvokeExpr, InvokeKind, IrProvider, MethodIr, MethodRef, RValue, Stmt, Type, Variable,
};
use rustc_hash::FxHashMap;

const CALLER: u32 = 0;
const CALLEE: u32 = 1;

#[derive(Default)]
struct FakeHierarchy;
impl ClassHierarchy for FakeHierarchy {
    fn direct_subclasses(&self, _class: u32) -> &[u32] {
        &[]
    }
    fn direct_subinterfaces(&self, _class: u32) -> &[u32] {
        &[]
    }
    fn direct_implementors(&self, _class: u32) -> &[u32] {
        &[]
    }
    fn super_class(&self, _class: u32) -> Option<u32> {
        None
    }
    fn declared_method(&self, class: u32, subsignature: &str) -> Option<MethodDecl> {
        if class == CALLEE && subsignature == "callee(I)I" {
            Some(MethodDecl { id: CALLEE, owner: CALLEE, is_abstract: false })
        } else {
            None
        }
    }
}

struct FakeHeap;
impl HeapModel for FakeHeap {
    fn obj_for(&self, site: AllocSiteId) -> Obj {
        Obj { site, class: site }
    }
}

struct FakeIr(FxHashMap<u32, MethodIr>);
impl IrProvider for FakeIr {
    fn ir(&self, method: u32) -> &MethodIr {
        self.0.get(&method).expect("unknown method in fixture")
    }
}

#[test]
fn constant_argument_reaches_callee_param_and_return_reaches_caller() {
    // caller: v0 = 7; invoke callee(v0) -> v1; return v1
    let mut caller_vars = FxHashMap::default();
    caller_vars.insert(0, Variable { id: 0, name: "v0".into(), ty: Type::Int });
    caller_vars.insert(1, Variable { id: 1, name: "v1".into(), ty: Type::Int });
    let caller_stmts = vec![
        Stmt::Assign { lhs: 0, rhs: RValue::IntConst(7) },
        Stmt::Invoke {
            expr: InvokeExpr {
                kind: InvokeKind::Static,
                method: MethodRef { owner: CALLEE, subsignature: "callee(I)I".into() },
                recv: None,
                args: vec![0],
            },
            result: Some(1),
        },
        Stmt::Return(Some(1)),
    ];
    let caller = MethodIr::new(CALLER, vec![], None, vec![], caller_vars, caller_stmts);

    // callee: return p  (p is the sole parameter)
    let mut callee_vars = FxHashMap::default();
    callee_vars.insert(10, Variable { id: 10, name: "p".into(), ty: Type::Int });
    let callee_stmts = vec![Stmt::Return(Some(10))];
    let callee = MethodIr::new(CALLEE, vec![10], None, vec![10], callee_vars, callee_stmts);

    let mut methods = FxHashMap::default();
    methods.insert(CALLER, caller);
    methods.insert(CALLEE, callee);
    let provider = FakeIr(methods);

    let hierarchy = FakeHierarchy;
    let heap = FakeHeap;
    let selector = Insensitive;
    let pa = PointerAnalysis::new(&provider, &hierarchy, &heap, &selector);
    let pts = pa.solve(&[CALLER]);
    assert!(!pts.call_edges.is_empty(), "static dispatch must wire the call edge");

    let result = analyze(&provider, &pts, &[CALLER]);
    assert_eq!(result.in_fact(&Context::empty(), CALLEE, 0).get(10), Value::Const(7));
    assert_eq!(result.out_fact(&Context::empty(), CALLER, 2).get(1), Value::Const(7));
}
