//! In-memory class index and the bundled JDK subset.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{ClassInfo, ClassInfoProvider};

/// A provider backed by a fixed set of [`ClassInfo`] records.
#[derive(Clone, Debug, Default)]
pub struct StaticClassProvider {
    classes: FxHashMap<String, ClassInfo>,
    packages: FxHashSet<String>,
}

impl StaticClassProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Every prefix of its package becomes a known package.
    pub fn insert(&mut self, info: ClassInfo) {
        if let Some((package, _)) = info.name.rsplit_once('.') {
            let mut prefix = String::new();
            for segment in package.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                self.packages.insert(prefix.clone());
            }
        }
        self.classes.insert(info.name.clone(), info);
    }

    pub fn with(mut self, info: ClassInfo) -> Self {
        self.insert(info);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    /// The core of `java.lang`, `java.io` and `java.util`.
    pub fn jdk() -> Self {
        let mut jdk = Self::new();
        for info in java_lang().into_iter().chain(java_io()).chain(java_util()) {
            jdk.insert(info);
        }
        jdk
    }
}

impl ClassInfoProvider for StaticClassProvider {
    fn lookup(&self, name: &str) -> Option<ClassInfo> {
        self.classes.get(name).cloned()
    }

    fn is_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }
}

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";

fn exception(name: &str, superclass: &str) -> ClassInfo {
    ClassInfo::class(name)
        .extends(superclass)
        .constructor(&[])
        .constructor(&[STRING])
}

fn java_lang() -> Vec<ClassInfo> {
    vec![
        ClassInfo::class(OBJECT)
            .constructor(&[])
            .method("equals", &[OBJECT], "boolean")
            .method("hashCode", &[], "int")
            .method("toString", &[], STRING)
            .method("getClass", &[], "java.lang.Class")
            .method("notify", &[], "void")
            .method("notifyAll", &[], "void")
            .method_throws("wait", &[], "void", &["java.lang.InterruptedException"])
            .method_throws("clone", &[], OBJECT, &["java.lang.CloneNotSupportedException"]),
        ClassInfo::class(STRING)
            .extends(OBJECT)
            .implements("java.lang.Comparable")
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&[STRING])
            .constructor(&["char[]"])
            .method("length", &[], "int")
            .method("charAt", &["int"], "char")
            .method("substring", &["int"], STRING)
            .method("substring", &["int", "int"], STRING)
            .method("indexOf", &["int"], "int")
            .method("indexOf", &[STRING], "int")
            .method("equals", &[OBJECT], "boolean")
            .method("equalsIgnoreCase", &[STRING], "boolean")
            .method("compareTo", &[STRING], "int")
            .method("compareTo", &[OBJECT], "int")
            .method("startsWith", &[STRING], "boolean")
            .method("endsWith", &[STRING], "boolean")
            .method("concat", &[STRING], STRING)
            .method("trim", &[], STRING)
            .method("toUpperCase", &[], STRING)
            .method("toLowerCase", &[], STRING)
            .method("toCharArray", &[], "char[]")
            .method("valueOf", &["int"], STRING)
            .method("valueOf", &["long"], STRING)
            .method("valueOf", &["double"], STRING)
            .method("valueOf", &["char"], STRING)
            .method("valueOf", &["boolean"], STRING)
            .method("valueOf", &[OBJECT], STRING),
        ClassInfo::class("java.lang.Class")
            .extends(OBJECT)
            .method("getName", &[], STRING)
            .method_throws("newInstance", &[], OBJECT, &["java.lang.InstantiationException"]),
        ClassInfo::interface("java.lang.Runnable").method("run", &[], "void"),
        ClassInfo::interface("java.lang.Comparable").method("compareTo", &[OBJECT], "int"),
        ClassInfo::interface("java.lang.Cloneable"),
        ClassInfo::class("java.lang.Number")
            .extends(OBJECT)
            .implements("java.io.Serializable")
            .constructor(&[])
            .method("intValue", &[], "int")
            .method("longValue", &[], "long")
            .method("floatValue", &[], "float")
            .method("doubleValue", &[], "double"),
        ClassInfo::class("java.lang.Integer")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable")
            .field("MAX_VALUE", "int")
            .field("MIN_VALUE", "int")
            .constructor(&["int"])
            .constructor(&[STRING])
            .method("intValue", &[], "int")
            .method("parseInt", &[STRING], "int")
            .method("valueOf", &[STRING], "java.lang.Integer")
            .method("toString", &[], STRING)
            .method("toString", &["int"], STRING),
        ClassInfo::class("java.lang.Long")
            .extends("java.lang.Number")
            .field("MAX_VALUE", "long")
            .field("MIN_VALUE", "long")
            .constructor(&["long"])
            .method("longValue", &[], "long")
            .method("parseLong", &[STRING], "long"),
        ClassInfo::class("java.lang.Double")
            .extends("java.lang.Number")
            .constructor(&["double"])
            .method("doubleValue", &[], "double")
            .method("parseDouble", &[STRING], "double"),
        ClassInfo::class("java.lang.Boolean")
            .extends(OBJECT)
            .field("TRUE", "java.lang.Boolean")
            .field("FALSE", "java.lang.Boolean")
            .constructor(&["boolean"])
            .method("booleanValue", &[], "boolean"),
        ClassInfo::class("java.lang.Character")
            .extends(OBJECT)
            .constructor(&["char"])
            .method("charValue", &[], "char")
            .method("isDigit", &["char"], "boolean")
            .method("isLetter", &["char"], "boolean")
            .method("isWhitespace", &["char"], "boolean"),
        ClassInfo::class("java.lang.Math")
            .extends(OBJECT)
            .field("PI", "double")
            .field("E", "double")
            .method("abs", &["int"], "int")
            .method("abs", &["long"], "long")
            .method("abs", &["float"], "float")
            .method("abs", &["double"], "double")
            .method("max", &["int", "int"], "int")
            .method("max", &["long", "long"], "long")
            .method("max", &["double", "double"], "double")
            .method("min", &["int", "int"], "int")
            .method("min", &["long", "long"], "long")
            .method("min", &["double", "double"], "double")
            .method("sqrt", &["double"], "double")
            .method("pow", &["double", "double"], "double")
            .method("random", &[], "double"),
        ClassInfo::class("java.lang.System")
            .extends(OBJECT)
            .field("out", "java.io.PrintStream")
            .field("err", "java.io.PrintStream")
            .field("in", "java.io.InputStream")
            .method("currentTimeMillis", &[], "long")
            .method("arraycopy", &[OBJECT, "int", OBJECT, "int", "int"], "void")
            .method("exit", &["int"], "void")
            .method("getProperty", &[STRING], STRING),
        ClassInfo::class("java.lang.StringBuffer")
            .extends(OBJECT)
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&["int"])
            .constructor(&[STRING])
            .method("append", &[STRING], "java.lang.StringBuffer")
            .method("append", &["char"], "java.lang.StringBuffer")
            .method("append", &["int"], "java.lang.StringBuffer")
            .method("append", &["long"], "java.lang.StringBuffer")
            .method("append", &["double"], "java.lang.StringBuffer")
            .method("append", &["boolean"], "java.lang.StringBuffer")
            .method("append", &[OBJECT], "java.lang.StringBuffer")
            .method("length", &[], "int")
            .method("toString", &[], STRING),
        ClassInfo::class("java.lang.Thread")
            .extends(OBJECT)
            .implements("java.lang.Runnable")
            .constructor(&[])
            .constructor(&["java.lang.Runnable"])
            .method("start", &[], "void")
            .method("run", &[], "void")
            .method_throws("sleep", &["long"], "void", &["java.lang.InterruptedException"]),
        ClassInfo::class("java.lang.Throwable")
            .extends(OBJECT)
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&[STRING])
            .method("getMessage", &[], STRING)
            .method("printStackTrace", &[], "void"),
        exception("java.lang.Exception", "java.lang.Throwable"),
        exception("java.lang.Error", "java.lang.Throwable"),
        exception("java.lang.RuntimeException", "java.lang.Exception"),
        exception("java.lang.InterruptedException", "java.lang.Exception"),
        exception("java.lang.CloneNotSupportedException", "java.lang.Exception"),
        exception("java.lang.InstantiationException", "java.lang.Exception"),
        exception("java.lang.IllegalArgumentException", "java.lang.RuntimeException"),
        exception("java.lang.IllegalStateException", "java.lang.RuntimeException"),
        exception("java.lang.NullPointerException", "java.lang.RuntimeException"),
        exception("java.lang.ClassCastException", "java.lang.RuntimeException"),
        exception("java.lang.IndexOutOfBoundsException", "java.lang.RuntimeException"),
        exception("java.lang.ArithmeticException", "java.lang.RuntimeException"),
        exception("java.lang.NumberFormatException", "java.lang.IllegalArgumentException"),
    ]
}

fn java_io() -> Vec<ClassInfo> {
    let mut print_stream = ClassInfo::class("java.io.PrintStream")
        .extends("java.io.OutputStream")
        .method("println", &[], "void")
        .method("flush", &[], "void");
    for ty in ["boolean", "char", "int", "long", "float", "double", "char[]", STRING, OBJECT] {
        print_stream = print_stream
            .method("print", &[ty], "void")
            .method("println", &[ty], "void");
    }
    vec![
        ClassInfo::interface("java.io.Serializable"),
        ClassInfo::class("java.io.OutputStream")
            .extends(OBJECT)
            .method_throws("write", &["int"], "void", &["java.io.IOException"])
            .method_throws("close", &[], "void", &["java.io.IOException"]),
        ClassInfo::class("java.io.InputStream")
            .extends(OBJECT)
            .method_throws("read", &[], "int", &["java.io.IOException"])
            .method_throws("close", &[], "void", &["java.io.IOException"]),
        print_stream,
        exception("java.io.IOException", "java.lang.Exception"),
        exception("java.io.FileNotFoundException", "java.io.IOException"),
    ]
}

fn java_util() -> Vec<ClassInfo> {
    let list = |name: &str| {
        ClassInfo::class(name)
            .extends(OBJECT)
            .implements("java.util.List")
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&["int"])
            .method("add", &[OBJECT], "boolean")
            .method("get", &["int"], OBJECT)
            .method("size", &[], "int")
            .method("isEmpty", &[], "boolean")
            .method("iterator", &[], "java.util.Iterator")
            .method("remove", &["int"], OBJECT)
    };
    let map = |name: &str| {
        ClassInfo::class(name)
            .extends(OBJECT)
            .implements("java.util.Map")
            .constructor(&[])
            .method("get", &[OBJECT], OBJECT)
            .method("put", &[OBJECT, OBJECT], OBJECT)
            .method("containsKey", &[OBJECT], "boolean")
            .method("size", &[], "int")
    };
    vec![
        ClassInfo::interface("java.util.Collection")
            .method("add", &[OBJECT], "boolean")
            .method("contains", &[OBJECT], "boolean")
            .method("size", &[], "int")
            .method("isEmpty", &[], "boolean")
            .method("iterator", &[], "java.util.Iterator"),
        ClassInfo::interface("java.util.List")
            .implements("java.util.Collection")
            .method("get", &["int"], OBJECT)
            .method("remove", &["int"], OBJECT),
        ClassInfo::interface("java.util.Set").implements("java.util.Collection"),
        ClassInfo::interface("java.util.Iterator")
            .method("hasNext", &[], "boolean")
            .method("next", &[], OBJECT)
            .method("remove", &[], "void"),
        ClassInfo::interface("java.util.Enumeration")
            .method("hasMoreElements", &[], "boolean")
            .method("nextElement", &[], OBJECT),
        ClassInfo::interface("java.util.Map")
            .inner("java.util.Map$Entry")
            .method("get", &[OBJECT], OBJECT)
            .method("put", &[OBJECT, OBJECT], OBJECT)
            .method("containsKey", &[OBJECT], "boolean")
            .method("keySet", &[], "java.util.Set")
            .method("size", &[], "int"),
        ClassInfo::interface("java.util.Map$Entry")
            .method("getKey", &[], OBJECT)
            .method("getValue", &[], OBJECT),
        list("java.util.ArrayList"),
        list("java.util.Vector")
            .method("addElement", &[OBJECT], "void")
            .method("elementAt", &["int"], OBJECT)
            .method("elements", &[], "java.util.Enumeration"),
        list("java.util.LinkedList"),
        map("java.util.HashMap"),
        map("java.util.Hashtable"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jdk_has_core_classes() {
        let jdk = StaticClassProvider::jdk();
        for name in ["java.lang.Object", "java.lang.String", "java.io.PrintStream", "java.util.Map$Entry"] {
            assert!(jdk.lookup(name).is_some(), "{name}");
        }
        assert!(jdk.lookup("java.lang.Missing").is_none());
    }

    #[test]
    fn test_packages_include_prefixes() {
        let jdk = StaticClassProvider::jdk();
        assert!(jdk.is_package("java"));
        assert!(jdk.is_package("java.lang"));
        assert!(jdk.is_package("java.util"));
        assert!(!jdk.is_package("java.lang.String"));
    }

    #[test]
    fn test_constructor_named_after_class() {
        let info = ClassInfo::class("a.b.C").constructor(&["int"]);
        assert_eq!(info.constructors[0].name, "C");
        assert_eq!(info.constructors[0].return_type, "a.b.C");
    }
}
