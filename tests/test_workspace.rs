//! Loading a directory of sources from disk and resolving across files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use transmogrify::hir::{DefKind, Target, TypeRef};
use transmogrify::ide::AnalysisHost;
use transmogrify::project::{LoadError, WorkspaceLoader};
use transmogrify::{DefId, FileId};

fn write(root: &Path, name: &str, text: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn load(dir: &TempDir) -> (AnalysisHost, Vec<FileId>) {
    let mut host = AnalysisHost::new();
    let files = WorkspaceLoader::new()
        .load_directory_into_host(dir.path(), &mut host)
        .unwrap();
    host.analyze().unwrap();
    (host, files)
}

fn def_named(host: &AnalysisHost, kind: DefKind, name: &str) -> DefId {
    host.table()
        .iter()
        .find(|d| d.kind() == kind && d.name() == name)
        .map(|d| d.id())
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

fn shapes() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "p/Circle.java",
        "package p;
public class Circle implements Shape {
  double r;
  public Circle(double r) { this.r = r; }
  public double area() { return 3.14 * r * r; }
}
",
    );
    write(
        dir.path(),
        "p/Shape.java",
        "package p;
public interface Shape {
  double area();
}
",
    );
    write(
        dir.path(),
        "q/Main.java",
        "package q;
import p.*;
class Main {
  static void main(String[] args) {
    Shape s = new Circle(2.0);
    double a = s.area();
  }
}
",
    );
    dir
}

#[test]
fn test_resolves_across_packages() {
    let dir = shapes();
    let (host, files) = load(&dir);
    assert_eq!(files.len(), 3);
    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());

    let shape = def_named(&host, DefKind::Class, "Shape");
    let circle = def_named(&host, DefKind::Class, "Circle");
    assert_eq!(host.table().qualified_name(circle), "p.Circle");
    assert_eq!(
        host.table().def(circle).class().unwrap().interfaces,
        vec![TypeRef::Source(shape)]
    );
    assert_eq!(host.table().def(shape).class().unwrap().implementors, vec![circle]);
}

#[test]
fn test_reference_counts_across_files() {
    let dir = shapes();
    let (host, files) = load(&dir);
    let main = files[2];

    let shape_scope = host.table().def(def_named(&host, DefKind::Class, "Shape")).scope().unwrap();
    let area = shape_scope.methods_named("area").next().unwrap();
    let refs = host.find_references(area);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].occurrence.file, main);

    let circle_scope = host.table().def(def_named(&host, DefKind::Class, "Circle")).scope().unwrap();
    let field = circle_scope.variable("r").unwrap();
    assert_eq!(host.reference_count(field), 3);
    let ctor = circle_scope.methods_named("Circle").next().unwrap();
    assert_eq!(host.reference_count(ctor), 1);
}

#[test]
fn test_goto_definition_in_another_file() {
    let dir = shapes();
    let (host, files) = load(&dir);
    let (circle_file, main) = (files[0], files[2]);

    let result = host.goto_definition(main, 5, 20).unwrap();
    let circle = def_named(&host, DefKind::Class, "Circle");
    assert_eq!(result.target, Target::Source(circle));
    assert_eq!(result.qualified_name.as_deref(), Some("p.Circle"));
    let location = result.location.unwrap();
    assert_eq!((location.file, location.line, location.column), (circle_file, 2, 14));
}

#[test]
fn test_default_package_classes_see_each_other() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/X.java", "class X { Y y; }");
    write(dir.path(), "a/Y.java", "class Y { }");
    let (host, _) = load(&dir);

    assert!(host.diagnostics().is_empty(), "{:?}", host.diagnostics());
    let x = def_named(&host, DefKind::Class, "X");
    let y = def_named(&host, DefKind::Class, "Y");
    assert_eq!(host.table().qualified_name(x), "X");
    assert_eq!(host.reference_count(y), 1);
}

#[test]
fn test_unreadable_file_is_reported_and_the_rest_loaded() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "A.java", "class A { }");
    fs::write(dir.path().join("Bad.java"), [0xff, 0xfe, 0x00]).unwrap();

    let mut host = AnalysisHost::new();
    let err = WorkspaceLoader::new()
        .load_directory_into_host(dir.path(), &mut host)
        .unwrap_err();
    let LoadError::Partial { loaded, failures } = err else {
        panic!("expected a partial load");
    };
    assert_eq!(loaded.len(), 1);
    assert_eq!(failures.len(), 1);

    host.analyze().unwrap();
    def_named(&host, DefKind::Class, "A");
}
