//! End-to-end resolution through the analysis host.
//!
//! Each case parses Java source, runs all three passes and checks what
//! the names in it were bound to.

use rstest::rstest;
use transmogrify::hir::{DefKind, ExternalItem, Primitive, Severity, Target, TypeRef, codes};
use transmogrify::ide::AnalysisHost;
use transmogrify::syntax::{NodeId, SyntaxKind, SyntaxTree};
use transmogrify::{DefId, FileId};

fn analyse(src: &str) -> (AnalysisHost, FileId) {
    let mut host = AnalysisHost::new();
    let file = host.set_file_content("/src/A.java", src);
    host.analyze().unwrap();
    (host, file)
}

fn def_named(host: &AnalysisHost, kind: DefKind, name: &str) -> DefId {
    host.table()
        .iter()
        .find(|d| d.kind() == kind && d.name() == name)
        .map(|d| d.id())
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

fn first_of(tree: &SyntaxTree, kind: SyntaxKind) -> NodeId {
    tree.descendants(tree.root().unwrap())
        .into_iter()
        .find(|&n| tree.kind(n) == kind)
        .unwrap()
}

#[test]
fn test_field_assignment_counts_one_reference() {
    let (host, file) = analyse("class A { int x; void m(){ x = 1; } }");
    let x = def_named(&host, DefKind::Variable, "x");
    assert_eq!(host.reference_count(x), 1);

    let refs = host.find_references(x);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].occurrence.file, file);
    assert_eq!((refs[0].occurrence.line, refs[0].occurrence.column), (1, 28));
}

#[test]
fn test_unknown_superclass_leaves_no_edge() {
    let (host, file) = analyse("class A extends B {}");
    let a = def_named(&host, DefKind::Class, "A");
    assert_eq!(host.table().def(a).class().unwrap().superclass, None);

    let diagnostics = host.diagnostics_for_file(file);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::UNRESOLVED));
}

#[test]
fn test_qualified_class_expression() {
    let (host, file) = analyse("class A { Class c = java.lang.String.class; Object s = java.lang.String.valueOf(true); }");
    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());

    let tree = host.tree(file).unwrap();
    let lit = first_of(tree, SyntaxKind::ClassLit);
    let access = tree.parent(lit).unwrap();
    assert_eq!(tree.resolved_type(access), Some(&TypeRef::external("java.lang.Class")));
}

#[rstest]
#[case("1 + 2.0", Primitive::Double)]
#[case("1 + 2", Primitive::Int)]
#[case("1L * 2", Primitive::Long)]
#[case("'a' + 1", Primitive::Int)]
#[case("1.0f - 2", Primitive::Float)]
#[case("1 << 2L", Primitive::Int)]
#[case("1 < 2", Primitive::Boolean)]
#[case("true && false", Primitive::Boolean)]
fn test_initializer_types(#[case] expr: &str, #[case] expected: Primitive) {
    let (host, file) = analyse(&format!("class A {{ void m() {{ Object v = {expr}; }} }}"));
    let tree = host.tree(file).unwrap();
    let def = first_of(tree, SyntaxKind::VariableDef);
    let init = tree.find_child(def, SyntaxKind::VariableInit).unwrap();
    let value = tree.first_child(init).unwrap();
    assert_eq!(tree.resolved_type(value), Some(&TypeRef::Primitive(expected)));
}

#[test]
fn test_string_concatenation_is_a_string() {
    let (host, file) = analyse("class A { void m() { Object v = \"a\" + 1; } }");
    let tree = host.tree(file).unwrap();
    let plus = first_of(tree, SyntaxKind::Plus);
    assert_eq!(tree.resolved_type(plus), Some(&TypeRef::string()));
}

#[rstest]
#[case("Object o = new Object();", "java.lang.Object")]
#[case("StringBuffer b = new StringBuffer(\"x\");", "java.lang.StringBuffer")]
#[case("Runnable r = new Runnable() { public void run() { } };", "java.lang.Runnable")]
fn test_creation_binds_a_constructor(#[case] stmt: &str, #[case] class: &str) {
    let (host, file) = analyse(&format!("class A {{ void m() {{ {stmt} }} }}"));
    let tree = host.tree(file).unwrap();
    let new = first_of(tree, SyntaxKind::New);
    let bound_class = match tree.binding(new) {
        Some(Target::External(ExternalItem::Constructor { class, .. })) => class.clone(),
        Some(Target::External(ExternalItem::InterfaceConstructor(class))) => class.clone(),
        other => panic!("unexpected binding {other:?}"),
    };
    assert_eq!(bound_class, class);
    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());
}

#[test]
fn test_inherited_members_from_source_superclass() {
    let (host, _) = analyse(
        "class Base { int count; void bump() { count++; } }
         class Derived extends Base { void twice() { bump(); bump(); count = 0; } }",
    );
    let bump = def_named(&host, DefKind::Method, "bump");
    let count = def_named(&host, DefKind::Variable, "count");
    assert_eq!(host.reference_count(bump), 2);
    assert_eq!(host.reference_count(count), 2);
    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());
}

#[test]
fn test_most_specific_source_overload() {
    let (host, file) = analyse(
        "class A {
           void f(Object o) { }
           void f(String s) { }
           void g() { f(\"text\"); f(new Object()); }
         }",
    );
    let tree = host.tree(file).unwrap();
    let scope = host.table().def(def_named(&host, DefKind::Class, "A")).scope().unwrap();
    let overloads: Vec<DefId> = scope.methods_named("f").collect();
    let calls: Vec<NodeId> = tree
        .descendants(tree.root().unwrap())
        .into_iter()
        .filter(|&n| tree.kind(n) == SyntaxKind::MethodCall)
        .collect();
    assert_eq!(tree.binding(calls[0]), Some(&Target::Source(overloads[1])));
    assert_eq!(tree.binding(calls[1]), Some(&Target::Source(overloads[0])));
}

#[test]
fn test_exception_handling_scopes() {
    let (host, _) = analyse(
        "import java.io.*;
         class A {
           void m() throws IOException {
             try { throw new IOException(\"x\"); }
             catch (IOException e) { e.printStackTrace(); String s = e.getMessage(); }
             finally { }
           }
         }",
    );
    let e = def_named(&host, DefKind::Variable, "e");
    assert_eq!(host.table().def(host.table().def(e).parent().unwrap()).name(), "catch");
    assert_eq!(host.reference_count(e), 2);
    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());
}

#[test]
fn test_syntax_error_is_reported_and_file_skipped() {
    let mut host = AnalysisHost::new();
    let good = host.set_file_content("/src/A.java", "class A { }");
    let bad = host.set_file_content("/src/B.java", "class B { int }");
    host.analyze().unwrap();

    assert!(host.tree(good).is_some());
    assert!(host.tree(bad).is_none());
    let diagnostics = host.diagnostics_for_file(bad);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::SYNTAX_ERROR));
}

#[test]
fn test_reanalysis_replaces_the_table() {
    let mut host = AnalysisHost::new();
    host.set_file_content("/src/A.java", "class A { int x; }");
    host.analyze().unwrap();
    let before = host.table().len();

    host.set_file_content("/src/A.java", "class A { int x; int y; }");
    assert!(host.is_dirty());
    host.analyze().unwrap();
    assert_eq!(host.table().len(), before + 1);
    assert_eq!(host.files().len(), 1);
}
