//! Allow-lists consulted by the walker.

use std::collections::BTreeSet;

use cvid_runtime::BuiltinType;

/// Modules whose contents are assumed not to change between program runs.
///
/// Matching is on the module root (the text before the first `.`).
#[rustfmt::skip]
pub const DEFAULT_STABLE_MODULES: &[&str] = &[
    // standard library
    "abc", "aifc", "antigravity", "argparse", "ast", "asynchat", "asyncio", "asyncore",
    "base64", "bdb", "binhex", "bisect", "_bootlocale", "bz2", "calendar", "cgi", "cgitb",
    "chunk", "cmd", "codecs", "codeop", "code", "collections", "_collections_abc",
    "colorsys", "_compat_pickle", "compileall", "_compression", "concurrent",
    "configparser", "contextlib", "contextvars", "copy", "copyreg", "cProfile", "crypt",
    "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib",
    "dis", "distutils", "doctest", "dummy_threading", "_dummy_thread", "email",
    "encodings", "ensurepip", "enum", "filecmp", "fileinput", "fnmatch", "formatter",
    "fractions", "ftplib", "functools", "__future__", "genericpath", "getopt", "getpass",
    "gettext", "glob", "gzip", "hashlib", "heapq", "hmac", "html", "http", "idlelib",
    "imaplib", "imghdr", "importlib", "imp", "inspect", "io", "ipaddress", "json",
    "keyword", "lib2to3", "linecache", "locale", "logging", "lzma", "mailbox", "mailcap",
    "marshal", "_markupbase", "mimetypes", "modulefinder", "msilib", "multiprocessing",
    "netrc", "nntplib", "ntpath", "nturl2path", "numbers", "opcode", "operator", "optparse",
    "os", "_osx_support", "pathlib", "pdb", "pickle", "pickletools", "pipes", "pkgutil",
    "platform", "plistlib", "poplib", "posixpath", "pprint", "profile", "pstats", "pty",
    "_py_abc", "pyclbr", "py_compile", "_pydecimal", "pydoc_data", "pydoc", "_pyio",
    "queue", "quopri", "random", "reprlib", "re", "rlcompleter", "runpy", "sched",
    "secrets", "selectors", "shelve", "shlex", "shutil", "signal", "_sitebuiltins",
    "site-packages", "site", "smtpd", "smtplib", "sndhdr", "socket", "socketserver",
    "sqlite3", "sre_compile", "sre_constants", "sre_parse", "ssl", "statistics", "stat",
    "stringprep", "string", "_strptime", "struct", "subprocess", "sunau", "symbol",
    "symtable", "sysconfig", "tabnanny", "tarfile", "telnetlib", "tempfile", "test",
    "textwrap", "this", "_threading_local", "threading", "timeit", "tkinter", "tokenize",
    "token", "traceback", "tracemalloc", "trace", "tty", "turtledemo", "turtle", "types",
    "typing", "unittest", "urllib", "uuid", "uu", "venv", "warnings", "wave", "weakref",
    "_weakrefset", "webbrowser", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp",
    "zipfile", "zipimport",
    // commonly installed third-party packages
    "pytz", "psutil", "numpy", "pandas", "scipy", "pytest", "_pytest", "typed_python",
    "object_database", "llvmlite", "requests", "redis", "websockets", "boto3", "py", "xdist",
    "pytest_jsonreport", "pytest_metadata", "flask", "flaky", "coverage", "pyasn1",
    "cryptography", "paramiko", "six", "torch",
];

/// Dunder names that still contribute to identity: they change behavior.
#[rustfmt::skip]
pub const SPECIAL_METHODS: &[&str] = &[
    "__abs__", "__add__", "__and__", "__bool__", "__bytes__", "__call__", "__contains__",
    "__del__", "__delattr__", "__eq__", "__float__", "__floordiv__", "__format__", "__ge__",
    "__getitem__", "__gt__", "__hash__", "__iadd__", "__iand__", "__ieq__", "__ifloordiv__",
    "__ige__", "__igt__", "__ile__", "__ilshift__", "__ilt__", "__imatmul__", "__imod__",
    "__imul__", "__index__", "__ine__", "__init__", "__int__", "__invert__", "__ior__",
    "__ipow__", "__irshift__", "__isub__", "__itruediv__", "__ixor__", "__le__", "__len__",
    "__lshift__", "__lt__", "__matmul__", "__mod__", "__mul__", "__ne__", "__neg__",
    "__not__", "__or__", "__pos__", "__pow__", "__radd__", "__rand__", "__repr__",
    "__rfloordiv__", "__rlshift__", "__rmatmul__", "__rmod__", "__rmul__", "__ror__",
    "__round__", "__rpow__", "__rrshift__", "__rshift__", "__rsub__", "__rtruediv__",
    "__rxor__", "__setattr__", "__setitem__", "__str__", "__sub__", "__truediv__", "__xor__",
];

/// Builtin type objects treated as leaves.
pub const SIMPLE_CONSTANT_TYPES: &[BuiltinType] = &[
    BuiltinType::Object,
    BuiltinType::Type,
    BuiltinType::Dict,
    BuiltinType::List,
    BuiltinType::Set,
    BuiltinType::Int,
    BuiltinType::Str,
    BuiltinType::Float,
    BuiltinType::Bytes,
    BuiltinType::Bool,
    BuiltinType::NoneType,
    BuiltinType::Property,
    BuiltinType::ClassMethodDescriptor,
    BuiltinType::GetSetDescriptor,
    BuiltinType::MemberDescriptor,
    BuiltinType::MethodDescriptor,
    BuiltinType::WrapperDescriptor,
    BuiltinType::MappingProxy,
    BuiltinType::MethodWrapper,
    BuiltinType::BuiltinFunction,
    BuiltinType::Function,
];

/// `true` for `__x__` names that are bookkeeping (file paths, loaders,
/// qualnames) rather than behavior.
pub fn is_special_ignorable_name(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__") && !SPECIAL_METHODS.contains(&name)
}

/// Text before the first `.`, or the whole name.
pub fn module_root(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// The set of stable module roots a walker trusts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableModules {
    roots: BTreeSet<String>,
}

impl StableModules {
    /// No stable modules at all.
    pub fn empty() -> Self {
        Self {
            roots: BTreeSet::new(),
        }
    }

    /// The built-in allow-list.
    pub fn with_defaults() -> Self {
        let mut modules = Self::empty();
        modules.extend(DEFAULT_STABLE_MODULES.iter().copied());
        modules
    }

    /// Trust another module root. Dotted names contribute their root.
    pub fn insert(&mut self, name: &str) -> bool {
        self.roots.insert(module_root(name).to_string())
    }

    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.insert(name);
        }
    }

    /// Whether `module_name`'s root is trusted.
    pub fn contains(&self, module_name: &str) -> bool {
        self.roots.contains(module_root(module_name))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }
}

impl Default for StableModules {
    fn default() -> Self {
        Self::with_defaults()
    }
}
