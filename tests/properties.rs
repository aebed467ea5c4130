//! Universal invariants and round-trip properties that
//! aren't already exercised by a concrete-scenario test file.

use pta_core::features::constant_propagation::{evaluate, ConstantPropagation};
use pta_core::features::dead_code::detect_dead_code;
use pta_core::features::lattice::{meet, CPFact, Value};
use pta_core::features::points_to::{Insensitive, PointerAnalysis};
use pta_core::features::taint::{run_taint_analysis, TaintConfig};
use pta_core::shared::heap::{HeapModel, Obj};
use pta_core::shared::hierarchy::{ClassHierarchy, MethodDecl};
use pta_core::shared::ir::{AllocSiteId, BinOp, MethodIr, RValue, Stmt, Type, VarId, Variable};
use rustc_hash::FxHashMap;

fn var(id: VarId, ty: Type) -> (VarId, Variable) {
    (id, Variable { id, name: format!("v{id}"), ty })
}

fn method(stmts: Vec<Stmt>, var_types: Vec<(VarId, Type)>) -> MethodIr {
    let vars: FxHashMap<VarId, Variable> = var_types.into_iter().map(|(id, ty)| var(id, ty)).collect();
    MethodIr::new(0, vec![], None, vec![], vars, stmts)
}

#[test]
fn meet_is_commutative_and_respects_undef_nac() {
    assert_eq!(meet(Value::Const(3), Value::Undef), Value::Const(3));
    assert_eq!(meet(Value::Undef, Value::Const(3)), Value::Const(3));
    assert_eq!(meet(Value::Nac, Value::Const(3)), Value::Nac);
    assert_eq!(meet(Value::Const(3), Value::Nac), Value::Nac);
    assert_eq!(meet(Value::Const(5), Value::Const(5)), Value::Const(5));
    assert_eq!(meet(Value::Const(5), Value::Const(6)), Value::Nac);
    assert_eq!(meet(Value::Const(5), Value::Const(6)), meet(Value::Const(6), Value::Const(5)));
}

#[test]
fn evaluate_is_pure() {
    let ir = method(vec![], vec![(0, Type::Int), (1, Type::Int)]);
    let mut fact = CPFact::new();
    fact.update(0, Value::Const(4));
    fact.update(1, Value::Const(0));
    let rhs = RValue::Binary(BinOp::Div, 0, 1);
    let a = evaluate(&rhs, &fact, &ir);
    let b = evaluate(&rhs, &fact, &ir);
    assert_eq!(a, b);
    assert_eq!(a, Value::Undef);
}

#[test]
fn division_by_zero_is_undef_regardless_of_numerator() {
    let ir = method(vec![], vec![(0, Type::Int), (1, Type::Int)]);
    let mut fact = CPFact::new();
    fact.update(1, Value::Const(0));
    for numerator in [-100, -1, 0, 1, 100] {
        fact.update(0, Value::Const(numerator));
        let rhs = RValue::Binary(BinOp::Div, 0, 1);
        assert_eq!(evaluate(&rhs, &fact, &ir), Value::Undef);
    }
}

#[test]
fn intra_cp_is_idempotent() {
    let stmts = vec![
        Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
        Stmt::Assign { lhs: 1, rhs: RValue::IntConst(2) },
        Stmt::Assign { lhs: 2, rhs: RValue::Binary(BinOp::Add, 0, 1) },
    ];
    let ir = method(stmts, vec![(0, Type::Int), (1, Type::Int), (2, Type::Int)]);
    let first = ConstantPropagation::new().analyze(&ir);
    let second = ConstantPropagation::new().analyze(&ir);
    for s in ir.stmt_ids() {
        assert_eq!(first.out_fact(s).get(0), second.out_fact(s).get(0));
        assert_eq!(first.out_fact(s).get(1), second.out_fact(s).get(1));
        assert_eq!(first.out_fact(s).get(2), second.out_fact(s).get(2));
    }
}

#[test]
fn dead_code_detection_is_idempotent_once_dead_code_is_excised() {
    // v0 = 1; v1 = 2 (dead, never read); return v0
    let stmts = vec![
        Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
        Stmt::Assign { lhs: 1, rhs: RValue::IntConst(2) },
        Stmt::Return(Some(0)),
    ];
    let ir = method(stmts, vec![(0, Type::Int), (1, Type::Int)]);
    let first = detect_dead_code(&ir);
    assert!(first.dead_assignments.contains(&1));

    // Excise the dead statement (replace with a no-op) and rerun: no new
    // dead statements should appear.
    let stmts2 = vec![
        Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
        Stmt::Other,
        Stmt::Return(Some(0)),
    ];
    let ir2 = method(stmts2, vec![(0, Type::Int), (1, Type::Int)]);
    let second = detect_dead_code(&ir2);
    assert!(second.all().is_empty());
}

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
    fn declared_method(&self, _class: u32, _subsignature: &str) -> Option<MethodDecl> {
        None
    }
}

struct FakeHeap;
impl HeapModel for FakeHeap {
    fn obj_for(&self, site: AllocSiteId) -> Obj {
        Obj { site, class: site }
    }
}

struct FakeIr(FxHashMap<u32, MethodIr>);
impl pta_core::shared::ir::IrProvider for FakeIr {
    fn ir(&self, method: u32) -> &MethodIr {
        self.0.get(&method).expect("unknown method in fixture")
    }
}

#[test]
fn empty_taint_config_reports_no_flows() {
    // v0 = new C(); (no sources/sinks configured at all)
    let mut vars = FxHashMap::default();
    vars.insert(0, Variable { id: 0, name: "v0".into(), ty: Type::Reference(1) });
    let stmts = vec![Stmt::Assign { lhs: 0, rhs: RValue::New(5) }, Stmt::Return(None)];
    let caller = MethodIr::new(0, vec![], None, vec![], vars, stmts);
    let mut methods = FxHashMap::default();
    methods.insert(0, caller);
    let provider = FakeIr(methods);

    let hierarchy = FakeHierarchy;
    let heap = FakeHeap;
    let selector = Insensitive;
    let pa = PointerAnalysis::new(&provider, &hierarchy, &heap, &selector);
    let mut pts = pa.solve(&[0]);

    let flows = run_taint_analysis(&mut pts, &provider, &TaintConfig::default());
    assert!(flows.is_empty());
}
