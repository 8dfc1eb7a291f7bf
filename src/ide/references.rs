//! Find references: every recorded use of a source definition.

use crate::hir::{DefId, Reference, SymbolTable};

/// References to `def`, sorted by (file, line, column).
pub fn find_references(table: &SymbolTable, def: DefId) -> Vec<Reference> {
    match table.get(def) {
        Some(definition) => definition.references().copied().collect(),
        None => Vec::new(),
    }
}

/// References made from code inside `scope`, in position order.
pub fn references_in_scope(table: &SymbolTable, scope: DefId) -> Vec<Reference> {
    table
        .get(scope)
        .and_then(|def| def.scope())
        .map(|scope| scope.references().copied().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::DefKind;
    use crate::ide::AnalysisHost;

    fn analysed(src: &str) -> AnalysisHost {
        let mut host = AnalysisHost::new();
        host.set_file_content("/src/A.java", src);
        host.analyze().unwrap();
        host
    }

    fn named(host: &AnalysisHost, kind: DefKind, name: &str) -> DefId {
        host.table()
            .iter()
            .find(|d| d.kind() == kind && d.name() == name)
            .map(|d| d.id())
            .unwrap()
    }

    #[test]
    fn test_references_are_in_position_order() {
        let host = analysed("class A {\n  int x;\n  void m() {\n    x = 1;\n    x++;\n  }\n  void n() { x--; }\n}\n");
        let x = named(&host, DefKind::Variable, "x");
        let refs = find_references(host.table(), x);
        let lines: Vec<u32> = refs.iter().map(|r| r.occurrence.line).collect();
        assert_eq!(lines, vec![4, 5, 7]);
        assert!(refs.iter().all(|r| r.target == x));
        assert_eq!(host.reference_count(x), 3);
    }

    #[test]
    fn test_references_recorded_on_the_enclosing_scope() {
        let host = analysed("class A {\n  int x;\n  void m() { x = 1; }\n  void n() { }\n}\n");
        let m = named(&host, DefKind::Method, "m");
        let n = named(&host, DefKind::Method, "n");
        assert_eq!(references_in_scope(host.table(), m).len(), 1);
        assert!(references_in_scope(host.table(), n).is_empty());
    }

    #[test]
    fn test_unknown_definition_has_no_references() {
        let host = analysed("class A {}");
        assert!(find_references(host.table(), DefId::new(10_000)).is_empty());
    }
}
