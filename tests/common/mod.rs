//! A small class-file assembler for integration tests.
//!
//! Produces just enough of the format for the decoder: constant pool, access
//! flags, super and interfaces, methods with `Code`, `Exceptions`,
//! `Signature`, `MethodParameters` and annotation attributes, and a
//! `BootstrapMethods` table for lambda call sites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;

pub const WEB: &str = "Lorg/springframework/web/bind/annotation/";

const METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;\
Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;\
Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";

// =============================================================================
// Annotations
// =============================================================================

#[derive(Debug, Clone)]
pub enum Element {
    Str(String),
    Bool(bool),
    Enum(String, String),
    Class(String),
    Array(Vec<Element>),
}

#[derive(Debug, Clone)]
pub struct Annotation {
    type_desc: String,
    elements: Vec<(String, Element)>,
}

impl Annotation {
    /// `type_desc` is a field descriptor, e.g. `Lorg/acme/Marker;`.
    pub fn new(type_desc: &str) -> Self {
        Self {
            type_desc: type_desc.to_string(),
            elements: Vec::new(),
        }
    }

    /// Annotation from the web binding package, e.g. `web("GetMapping")`.
    pub fn web(simple: &str) -> Self {
        Self::new(&format!("{WEB}{simple};"))
    }

    pub fn with(mut self, name: &str, value: Element) -> Self {
        self.elements.push((name.to_string(), value));
        self
    }

    pub fn with_paths(self, paths: &[&str]) -> Self {
        let values = paths.iter().map(|p| Element::Str(p.to_string())).collect();
        self.with("value", Element::Array(values))
    }
}

// =============================================================================
// Code
// =============================================================================

#[derive(Debug, Clone)]
pub enum Op {
    Aload0,
    Aload1,
    Lload1,
    Pop,
    Dup,
    Sipush(i16),
    Ldc(String),
    New(String),
    GetStatic(String, String, String),
    InvokeVirtual(String, String, String),
    InvokeSpecial(String, String, String),
    InvokeStatic(String, String, String),
    InvokeInterface(String, String, String, u8),
    /// `invokedynamic` bound through the lambda metafactory to `owner.target`
    Lambda {
        name: String,
        descriptor: String,
        sam: String,
        kind: u8,
        owner: String,
        target: String,
        target_descriptor: String,
    },
    Athrow,
    Areturn,
    Return,
}

/// `new T; dup; ldc msg; invokespecial T.<init>(String); athrow`
pub fn throw_new(internal: &str, message: Option<&str>) -> Vec<Op> {
    let mut ops = vec![Op::New(internal.into()), Op::Dup];
    let desc = match message {
        Some(m) => {
            ops.push(Op::Ldc(m.into()));
            "(Ljava/lang/String;)V"
        }
        None => "()V",
    };
    ops.push(Op::InvokeSpecial(internal.into(), "<init>".into(), desc.into()));
    ops.push(Op::Athrow);
    ops
}

// =============================================================================
// Methods
// =============================================================================

#[derive(Debug, Clone)]
pub struct MethodSpec {
    access: u16,
    name: String,
    descriptor: String,
    ops: Option<Vec<Op>>,
    exceptions: Vec<String>,
    signature: Option<String>,
    annotations: Vec<Annotation>,
    parameter_annotations: Vec<Vec<Annotation>>,
    parameter_names: Vec<String>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access: ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ops: None,
            exceptions: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
            parameter_names: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn code(mut self, ops: Vec<Op>) -> Self {
        self.ops = Some(ops);
        self
    }

    pub fn throws(mut self, internal: &str) -> Self {
        self.exceptions.push(internal.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Appends one parameter's annotations and name, in declaration order.
    pub fn param(mut self, name: &str, annotations: Vec<Annotation>) -> Self {
        self.parameter_names.push(name.to_string());
        self.parameter_annotations.push(annotations);
        self
    }
}

// =============================================================================
// Class files
// =============================================================================

#[derive(Debug, Default)]
struct Pool {
    bytes: Vec<u8>,
    next: u16,
    seen: HashMap<Vec<u8>, u16>,
}

impl Pool {
    fn add(&mut self, entry: Vec<u8>) -> u16 {
        if let Some(&idx) = self.seen.get(&entry) {
            return idx;
        }
        if self.next == 0 {
            self.next = 1;
        }
        let idx = self.next;
        self.next += 1;
        self.bytes.extend_from_slice(&entry);
        self.seen.insert(entry, idx);
        idx
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut e = vec![1];
        e.extend_from_slice(&(s.len() as u16).to_be_bytes());
        e.extend_from_slice(s.as_bytes());
        self.add(e)
    }

    fn tagged(&mut self, tag: u8, a: u16, b: Option<u16>) -> u16 {
        let mut e = vec![tag];
        e.extend_from_slice(&a.to_be_bytes());
        if let Some(b) = b {
            e.extend_from_slice(&b.to_be_bytes());
        }
        self.add(e)
    }

    fn class(&mut self, internal: &str) -> u16 {
        let name = self.utf8(internal);
        self.tagged(7, name, None)
    }

    fn string(&mut self, s: &str) -> u16 {
        let utf = self.utf8(s);
        self.tagged(8, utf, None)
    }

    fn integer(&mut self, v: i32) -> u16 {
        let mut e = vec![3];
        e.extend_from_slice(&v.to_be_bytes());
        self.add(e)
    }

    fn name_and_type(&mut self, name: &str, desc: &str) -> u16 {
        let n = self.utf8(name);
        let d = self.utf8(desc);
        self.tagged(12, n, Some(d))
    }

    fn member(&mut self, tag: u8, owner: &str, name: &str, desc: &str) -> u16 {
        let c = self.class(owner);
        let nt = self.name_and_type(name, desc);
        self.tagged(tag, c, Some(nt))
    }

    fn method_handle(&mut self, kind: u8, reference: u16) -> u16 {
        let mut e = vec![15, kind];
        e.extend_from_slice(&reference.to_be_bytes());
        self.add(e)
    }

    fn method_type(&mut self, desc: &str) -> u16 {
        let d = self.utf8(desc);
        self.tagged(16, d, None)
    }
}

pub struct ClassFile {
    access: u16,
    name: String,
    superclass: String,
    interfaces: Vec<String>,
    annotations: Vec<Annotation>,
    methods: Vec<MethodSpec>,
}

impl ClassFile {
    /// `name` is the internal form, e.g. `com/acme/UserController`.
    pub fn new(name: &str) -> Self {
        Self {
            access: ACC_PUBLIC,
            name: name.to_string(),
            superclass: "java/lang/Object".to_string(),
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(name: &str) -> Self {
        let mut class = Self::new(name);
        class.access |= ACC_INTERFACE | ACC_ABSTRACT;
        class
    }

    pub fn extends(mut self, internal: &str) -> Self {
        self.superclass = internal.to_string();
        self
    }

    pub fn implements(mut self, internal: &str) -> Self {
        self.interfaces.push(internal.to_string());
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let mut bootstrap: Vec<(u16, Vec<u16>)> = Vec::new();

        let this = pool.class(&self.name);
        let superclass = pool.class(&self.superclass);
        let interfaces: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let mut methods = Vec::new();
        for m in &self.methods {
            methods.extend(encode_method(m, &mut pool, &mut bootstrap));
        }

        let mut class_attrs: Vec<Vec<u8>> = Vec::new();
        if !self.annotations.is_empty() {
            let body = encode_annotations(&self.annotations, &mut pool);
            class_attrs.push(attribute(&mut pool, "RuntimeVisibleAnnotations", body));
        }
        if !bootstrap.is_empty() {
            let mut body = (bootstrap.len() as u16).to_be_bytes().to_vec();
            for (handle, args) in &bootstrap {
                body.extend_from_slice(&handle.to_be_bytes());
                body.extend_from_slice(&(args.len() as u16).to_be_bytes());
                for a in args {
                    body.extend_from_slice(&a.to_be_bytes());
                }
            }
            class_attrs.push(attribute(&mut pool, "BootstrapMethods", body));
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&61u16.to_be_bytes());
        out.extend_from_slice(&pool.next.to_be_bytes());
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&this.to_be_bytes());
        out.extend_from_slice(&superclass.to_be_bytes());
        out.extend_from_slice(&(interfaces.len() as u16).to_be_bytes());
        for i in interfaces {
            out.extend_from_slice(&i.to_be_bytes());
        }
        out.extend_from_slice(&0u16.to_be_bytes()); // fields
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        out.extend_from_slice(&methods);
        out.extend_from_slice(&(class_attrs.len() as u16).to_be_bytes());
        for a in class_attrs {
            out.extend_from_slice(&a);
        }
        out
    }

    /// Writes the class under `dir` as `<SimpleName>.class`.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let simple = self.name.rsplit('/').next().unwrap_or(&self.name);
        let path = dir.join(format!("{simple}.class"));
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn attribute(pool: &mut Pool, name: &str, body: Vec<u8>) -> Vec<u8> {
    let mut out = pool.utf8(name).to_be_bytes().to_vec();
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

fn encode_method(m: &MethodSpec, pool: &mut Pool, bootstrap: &mut Vec<(u16, Vec<u16>)>) -> Vec<u8> {
    let mut attrs: Vec<Vec<u8>> = Vec::new();
    if let Some(ops) = &m.ops {
        let code = encode_code(ops, pool, bootstrap);
        let mut body = Vec::new();
        body.extend_from_slice(&8u16.to_be_bytes());
        body.extend_from_slice(&8u16.to_be_bytes());
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(&code);
        body.extend_from_slice(&0u16.to_be_bytes()); // exception table
        body.extend_from_slice(&0u16.to_be_bytes()); // attributes
        attrs.push(attribute(pool, "Code", body));
    }
    if !m.exceptions.is_empty() {
        let mut body = (m.exceptions.len() as u16).to_be_bytes().to_vec();
        for e in &m.exceptions {
            body.extend_from_slice(&pool.class(e).to_be_bytes());
        }
        attrs.push(attribute(pool, "Exceptions", body));
    }
    if let Some(sig) = &m.signature {
        let body = pool.utf8(sig).to_be_bytes().to_vec();
        attrs.push(attribute(pool, "Signature", body));
    }
    if !m.annotations.is_empty() {
        let body = encode_annotations(&m.annotations, pool);
        attrs.push(attribute(pool, "RuntimeVisibleAnnotations", body));
    }
    if !m.parameter_names.is_empty() {
        let mut body = vec![m.parameter_names.len() as u8];
        for name in &m.parameter_names {
            body.extend_from_slice(&pool.utf8(name).to_be_bytes());
            body.extend_from_slice(&0u16.to_be_bytes());
        }
        attrs.push(attribute(pool, "MethodParameters", body));

        let mut body = vec![m.parameter_annotations.len() as u8];
        for annotations in &m.parameter_annotations {
            body.extend(encode_annotations(annotations, pool));
        }
        attrs.push(attribute(pool, "RuntimeVisibleParameterAnnotations", body));
    }

    let mut out = m.access.to_be_bytes().to_vec();
    out.extend_from_slice(&pool.utf8(&m.name).to_be_bytes());
    out.extend_from_slice(&pool.utf8(&m.descriptor).to_be_bytes());
    out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
    for a in attrs {
        out.extend_from_slice(&a);
    }
    out
}

fn encode_code(ops: &[Op], pool: &mut Pool, bootstrap: &mut Vec<(u16, Vec<u16>)>) -> Vec<u8> {
    let mut code = Vec::new();
    let with_index = |code: &mut Vec<u8>, opcode: u8, idx: u16| {
        code.push(opcode);
        code.extend_from_slice(&idx.to_be_bytes());
    };
    for op in ops {
        match op {
            Op::Aload0 => code.push(0x2a),
            Op::Aload1 => code.push(0x2b),
            Op::Lload1 => code.push(0x1f),
            Op::Pop => code.push(0x57),
            Op::Dup => code.push(0x59),
            Op::Sipush(v) => {
                code.push(0x11);
                code.extend_from_slice(&v.to_be_bytes());
            }
            Op::Ldc(s) => with_index(&mut code, 0x13, pool.string(s)),
            Op::New(ty) => with_index(&mut code, 0xbb, pool.class(ty)),
            Op::GetStatic(o, n, d) => with_index(&mut code, 0xb2, pool.member(9, o, n, d)),
            Op::InvokeVirtual(o, n, d) => with_index(&mut code, 0xb6, pool.member(10, o, n, d)),
            Op::InvokeSpecial(o, n, d) => with_index(&mut code, 0xb7, pool.member(10, o, n, d)),
            Op::InvokeStatic(o, n, d) => with_index(&mut code, 0xb8, pool.member(10, o, n, d)),
            Op::InvokeInterface(o, n, d, count) => {
                with_index(&mut code, 0xb9, pool.member(11, o, n, d));
                code.push(*count);
                code.push(0);
            }
            Op::Lambda {
                name,
                descriptor,
                sam,
                kind,
                owner,
                target,
                target_descriptor,
            } => {
                let factory_ref = pool.member(
                    10,
                    "java/lang/invoke/LambdaMetafactory",
                    "metafactory",
                    METAFACTORY_DESC,
                );
                let factory = pool.method_handle(6, factory_ref);
                let sam_type = pool.method_type(sam);
                let impl_ref = pool.member(10, owner, target, target_descriptor);
                let implementation = pool.method_handle(*kind, impl_ref);
                let instantiated = pool.method_type(sam);
                let bsm = bootstrap.len() as u16;
                bootstrap.push((factory, vec![sam_type, implementation, instantiated]));
                let nt = pool.name_and_type(name, descriptor);
                let indy = pool.tagged(18, bsm, Some(nt));
                with_index(&mut code, 0xba, indy);
                code.extend_from_slice(&[0, 0]);
            }
            Op::Athrow => code.push(0xbf),
            Op::Areturn => code.push(0xb0),
            Op::Return => code.push(0xb1),
        }
    }
    code
}

fn encode_annotations(annotations: &[Annotation], pool: &mut Pool) -> Vec<u8> {
    let mut out = (annotations.len() as u16).to_be_bytes().to_vec();
    for a in annotations {
        out.extend_from_slice(&pool.utf8(&a.type_desc).to_be_bytes());
        out.extend_from_slice(&(a.elements.len() as u16).to_be_bytes());
        for (name, value) in &a.elements {
            out.extend_from_slice(&pool.utf8(name).to_be_bytes());
            encode_element(value, pool, &mut out);
        }
    }
    out
}

fn encode_element(value: &Element, pool: &mut Pool, out: &mut Vec<u8>) {
    match value {
        Element::Str(s) => {
            out.push(b's');
            out.extend_from_slice(&pool.utf8(s).to_be_bytes());
        }
        Element::Bool(b) => {
            out.push(b'Z');
            out.extend_from_slice(&pool.integer(i32::from(*b)).to_be_bytes());
        }
        Element::Enum(ty, constant) => {
            out.push(b'e');
            out.extend_from_slice(&pool.utf8(ty).to_be_bytes());
            out.extend_from_slice(&pool.utf8(constant).to_be_bytes());
        }
        Element::Class(desc) => {
            out.push(b'c');
            out.extend_from_slice(&pool.utf8(desc).to_be_bytes());
        }
        Element::Array(items) => {
            out.push(b'[');
            out.extend_from_slice(&(items.len() as u16).to_be_bytes());
            for item in items {
                encode_element(item, pool, out);
            }
        }
    }
}

/// `@ResponseStatus(HttpStatus.<constant>)`
pub fn response_status(constant: &str) -> Annotation {
    Annotation::web("ResponseStatus").with(
        "value",
        Element::Enum("Lorg/springframework/http/HttpStatus;".into(), constant.into()),
    )
}

/// `@ExceptionHandler(<types>)`, types as field descriptors.
pub fn exception_handler(types: &[&str]) -> Annotation {
    let values = types.iter().map(|t| Element::Class(t.to_string())).collect();
    Annotation::web("ExceptionHandler").with("value", Element::Array(values))
}

pub fn service_annotation() -> Annotation {
    Annotation::new("Lorg/springframework/stereotype/Service;")
}
