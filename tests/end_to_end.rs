//! End-to-end scenarios A-F, translated line-for-line against the expected
//! VM text. Each case names the same letter as its source for easy
//! cross-reference.

fn translate(source: &str) -> String {
    jackc::translate_source(source).expect("well-formed scenario source should translate")
}

#[test]
fn scenario_a_minimal_function() {
    let vm = translate("class Main { function void main() { return; } }");
    assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
}

#[test]
fn scenario_b_if_else_with_counter() {
    let vm = translate("class M { function void f() { if (true) { return; } else { return; } } }");
    let expected = concat!(
        "function M.f 0\n",
        "push constant 0\n",
        "not\n",
        "not\n",
        "if-goto IF_FALSE0\n",
        "push constant 0\n",
        "return\n",
        "goto END_IF0\n",
        "label IF_FALSE0\n",
        "push constant 0\n",
        "return\n",
        "label END_IF0\n",
        "push constant 0\n",
        "return\n",
    );
    assert_eq!(vm, expected);
}

#[test]
fn scenario_c_constructor_allocates_fields() {
    let vm = translate("class P { field int x, y; constructor P new() { return this; } }");
    let expected = concat!(
        "function P.new 0\n",
        "push constant 2\n",
        "call Memory.alloc 1\n",
        "pop pointer 0\n",
        "push pointer 0\n",
        "return\n",
    );
    assert_eq!(vm, expected);
}

#[test]
fn scenario_d_method_call_on_local_variable() {
    let vm = translate(
        "class C { method void m() { return; } \
         function void g() { var C c; do c.m(); return; } }",
    );
    let expected_g = concat!(
        "function C.g 1\n",
        "push local 0\n",
        "call C.m 1\n",
        "pop temp 0\n",
        "push constant 0\n",
        "return\n",
    );
    assert!(
        vm.contains(expected_g),
        "expected g's VM text within:\n{vm}"
    );
}

#[test]
fn scenario_e_array_write() {
    let vm = translate("class A { function void f() { var Array a; let a[0] = 1; return; } }");
    let expected = concat!(
        "function A.f 1\n",
        "push local 0\n",
        "push constant 0\n",
        "add\n",
        "push constant 1\n",
        "pop temp 0\n",
        "pop pointer 1\n",
        "push temp 0\n",
        "pop that 0\n",
        "push constant 0\n",
        "return\n",
    );
    assert_eq!(vm, expected);
}

#[test]
fn scenario_f_string_constant() {
    let vm = translate(r#"class S { function void f() { do Output.printString("Hi"); return; } }"#);
    let expected_string = concat!(
        "push constant 2\n",
        "call String.new 1\n",
        "push constant 72\n",
        "call String.appendChar 2\n",
        "push constant 105\n",
        "call String.appendChar 2\n",
    );
    assert!(
        vm.contains(expected_string),
        "expected string literal encoding within:\n{vm}"
    );
}

#[test]
fn boundary_negative_int_literal_is_unary_neg() {
    let vm = translate("class N { function void f() { do g(-5); return; } }");
    assert!(vm.contains("push constant 5\nneg\n"));
}

#[test]
fn boundary_max_int_constant() {
    let vm = translate("class N { function void f() { do g(32767); return; } }");
    assert!(vm.contains("push constant 32767\n"));
}

#[test]
fn boundary_empty_string_literal() {
    let vm = translate(r#"class N { function void f() { do g(""); return; } }"#);
    assert!(vm.contains("push constant 0\ncall String.new 1\n"));
    assert!(!vm.contains("String.appendChar"));
}

#[test]
fn boundary_while_and_if_counters_are_independent_per_subroutine() {
    let vm = translate(
        "class N { \
           function void a() { while (true) { if (true) { return; } } return; } \
           function void b() { while (true) { return; } return; } \
         }",
    );
    // Each subroutine resets both counters to 0 on entry.
    assert!(vm.contains("label WHILE0"));
    assert!(vm.contains("label IF_FALSE0"));
    assert_eq!(vm.matches("label WHILE0").count(), 2);
}

#[test]
fn compiling_twice_is_deterministic() {
    let source = "class D { field int x; constructor D new() { let x = 1; return this; } }";
    assert_eq!(translate(source), translate(source));
}
