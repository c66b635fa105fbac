//! IR → NASM lowering.
//!
//! Two passes over the optimized instruction list: `scan` walks everything
//! once to decide what storage the `.data` section needs (global variable
//! cells, interned strings, interned float constants, the `True`/`False`
//! constants), then `emit_text_section` walks it again, partitioning
//! `FunctionStart..FunctionEnd` regions from the `main` body and lowering
//! each instruction in place. Global storage per variable — scopes and
//! parameters are not distinguished — so the only state this generator
//! needs about a name is its declared type.

use crate::error::{CodegenError, Result};
use crate::types::{
    align16, is_stack_arg, param_stack_offset, stack_arg_offset, ARG_REGS, SHADOW_SPACE,
};
use indexmap::IndexMap;
use mylangc_ast::{BinOp, Type};
use mylangc_ir::Instr;
use rustc_hash::{FxHashMap, FxHashSet};

/// Lowers an optimized instruction list to a complete NASM source string.
pub fn generate(instrs: &[Instr]) -> Result<String> {
    let mut gen = NasmGenerator::new();
    gen.scan(instrs);
    gen.emit_data_section();
    gen.emit_text_section(instrs)?;
    Ok(gen.out)
}

/// An IR value resolved to what it actually is, so the lowering code
/// doesn't need to re-parse the same string at every use site.
enum Resolved {
    Int(i64),
    Bool(bool),
    FloatLabel(String),
    StrLabel(String),
    Var(String),
}

struct NasmGenerator {
    var_types: FxHashMap<String, Type>,
    vars: Vec<String>,
    seen_vars: FxHashSet<String>,
    strings: IndexMap<String, String>,
    floats: IndexMap<String, String>,
    needs_true: bool,
    needs_false: bool,
    emitted_labels: FxHashSet<String>,
    logical_counter: u32,
    out: String,
}

impl NasmGenerator {
    fn new() -> Self {
        Self {
            var_types: FxHashMap::default(),
            vars: Vec::new(),
            seen_vars: FxHashSet::default(),
            strings: IndexMap::new(),
            floats: IndexMap::new(),
            needs_true: false,
            needs_false: false,
            emitted_labels: FxHashSet::default(),
            logical_counter: 0,
            out: String::new(),
        }
    }

    // --- pass 1: scan for storage requirements ----------------------------

    fn scan(&mut self, instrs: &[Instr]) {
        self.scan_types(instrs);
        for instr in instrs {
            match instr {
                Instr::Assign { target, value, ty } => {
                    self.note_operand(target, *ty);
                    self.note_operand(value, *ty);
                }
                Instr::Print { value, ty } => self.note_operand(value, *ty),
                Instr::Return { value: Some(v) } => self.note_operand(v, None),
                Instr::Return { value: None } => {}
                Instr::Label { .. } | Instr::Goto { .. } => {}
                Instr::IfGoto { condition, .. } => self.note_operand(condition, None),
                Instr::Call { target, args, .. } => {
                    self.note_operand(target, None);
                    for a in args {
                        self.note_operand(a, None);
                    }
                }
                Instr::Binary {
                    result, left, right, ty, ..
                } => {
                    self.note_operand(result, *ty);
                    let operand_hint = matches!(ty, Some(Type::Float)).then_some(Type::Float);
                    self.note_operand(left, operand_hint);
                    self.note_operand(right, operand_hint);
                }
                Instr::Unary { result, operand, .. } => {
                    self.note_operand(result, Some(Type::Bool));
                    self.note_operand(operand, None);
                }
                Instr::FunctionStart { .. } | Instr::FunctionEnd { .. } => {}
            }
        }
    }

    fn scan_types(&mut self, instrs: &[Instr]) {
        for instr in instrs {
            match instr {
                Instr::Assign {
                    target, ty: Some(t), ..
                } => {
                    self.var_types.insert(target.clone(), *t);
                }
                Instr::Binary {
                    result, ty: Some(t), ..
                } => {
                    self.var_types.insert(result.clone(), *t);
                }
                Instr::Unary { result, .. } => {
                    self.var_types.insert(result.clone(), Type::Bool);
                }
                Instr::Call { target, .. } => {
                    self.var_types.entry(target.clone()).or_insert(Type::Int);
                }
                Instr::FunctionStart { params, .. } => {
                    for (name, ty) in params {
                        self.var_types.insert(name.clone(), *ty);
                    }
                }
                _ => {}
            }
        }
    }

    /// Classifies one operand token and, if it names a variable/temp or a
    /// literal requiring interned storage, records what the `.data` section
    /// needs to declare for it.
    fn note_operand(&mut self, token: &str, hint: Option<Type>) {
        let token = token.strip_prefix('!').unwrap_or(token);
        if token == "True" {
            self.needs_true = true;
            return;
        }
        if token == "False" {
            self.needs_false = true;
            return;
        }
        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            let content = token[1..token.len() - 1].to_string();
            let next = self.strings.len();
            self.strings
                .entry(content)
                .or_insert_with(|| format!("str_{next}"));
            return;
        }
        let treat_as_float = hint == Some(Type::Float) || (hint.is_none() && token.contains('.'));
        if treat_as_float && token.parse::<f32>().is_ok() {
            let next = self.floats.len();
            self.floats
                .entry(token.to_string())
                .or_insert_with(|| format!("float_{next}"));
            return;
        }
        if token.parse::<i64>().is_ok() {
            return;
        }
        if self.seen_vars.insert(token.to_string()) {
            self.vars.push(token.to_string());
        }
    }

    fn resolve(&self, token: &str, hint: Option<Type>) -> Resolved {
        if token == "True" {
            return Resolved::Bool(true);
        }
        if token == "False" {
            return Resolved::Bool(false);
        }
        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            let content = &token[1..token.len() - 1];
            if let Some(label) = self.strings.get(content) {
                return Resolved::StrLabel(label.clone());
            }
        }
        let treat_as_float = hint == Some(Type::Float) || (hint.is_none() && token.contains('.'));
        if treat_as_float {
            if let Some(label) = self.floats.get(token) {
                return Resolved::FloatLabel(label.clone());
            }
        }
        if let Ok(i) = token.parse::<i64>() {
            return Resolved::Int(i);
        }
        Resolved::Var(token.to_string())
    }

    // --- .data -------------------------------------------------------------

    fn emit_data_section(&mut self) {
        self.out.push_str("section .data\n");
        self.out.push_str("newline    db 10, 0\n");
        self.out.push_str("format     db \"%d\", 10, 0\n");
        self.out.push_str("format_float db \"%.6f\", 10, 0\n");
        self.out.push_str("format_str db \"%s\", 10, 0\n");
        self.out
            .push_str("div_zero_err db \"Error: division by zero\", 10, 0\n");
        if self.needs_true {
            self.out.push_str("True dq 1\n");
        }
        if self.needs_false {
            self.out.push_str("False dq 0\n");
        }
        for name in self.vars.clone() {
            match self.var_types.get(&name).copied().unwrap_or(Type::Int) {
                Type::Float => {
                    self.out.push_str("align 4\n");
                    self.out.push_str(&format!("{name} dd 0.0\n"));
                }
                _ => self.out.push_str(&format!("{name} dq 0\n")),
            }
        }
        for (content, label) in self.strings.clone() {
            self.out.push_str(&format!("{label} db \"{content}\", 0\n"));
        }
        for (text, label) in self.floats.clone() {
            self.out.push_str(&format!("{label} dd {text}\n"));
        }
        self.out.push('\n');
    }

    // --- .text ---------------------------------------------------------------

    fn emit_text_section(&mut self, instrs: &[Instr]) -> Result<()> {
        self.out.push_str("section .text\n");
        self.out.push_str("default rel\n");
        self.out.push_str("extern printf\n");
        self.out.push_str("extern ExitProcess\n");
        self.out.push_str("global main\n\n");

        let mut idx = 0;
        let mut main_body: Vec<&Instr> = Vec::new();
        while idx < instrs.len() {
            match &instrs[idx] {
                Instr::FunctionStart { name, params } => {
                    let end = find_function_end(instrs, idx, name)?;
                    self.emit_function(name, params, &instrs[idx + 1..end])?;
                    idx = end + 1;
                }
                // A stray Return outside any function region is excluded
                // from the `main` body.
                Instr::Return { .. } => idx += 1,
                other => {
                    main_body.push(other);
                    idx += 1;
                }
            }
        }

        self.out.push_str("main:\n");
        self.out.push_str("    sub rsp, 32\n");
        for instr in main_body {
            self.emit_instr(instr)?;
        }
        self.out.push_str("    xor ecx, ecx\n");
        self.out.push_str("    call ExitProcess\n");
        self.out.push_str("    add rsp, 32\n\n");

        self.emit_div_zero_stubs();
        Ok(())
    }

    fn emit_function(&mut self, name: &str, params: &[(String, Type)], body: &[Instr]) -> Result<()> {
        self.emit_label(name);
        self.out.push_str("    push rbp\n");
        self.out.push_str("    mov rbp, rsp\n");
        for (i, (pname, ty)) in params.iter().enumerate() {
            if is_stack_arg(i) {
                let offset = param_stack_offset(i);
                self.out.push_str(&format!("    mov rax, [rbp + {offset}]\n"));
                self.out.push_str(&format!("    mov [rel {pname}], rax\n"));
            } else {
                match ty {
                    Type::Float => self
                        .out
                        .push_str(&format!("    movss [rel {pname}], xmm{i}\n")),
                    _ => self
                        .out
                        .push_str(&format!("    mov [rel {pname}], {}\n", ARG_REGS[i])),
                }
            }
        }
        for instr in body {
            self.emit_instr(instr)?;
        }
        // A straight-line body ending in `return` already emitted a full
        // epilogue via `emit_return`; don't duplicate it. Bodies that end
        // with a trailing `Label` (both arms of an `if`/`else`, `match`,
        // `try`/`catch` each returning on their own) still fall through to
        // this one, which is unreachable but harmless.
        if !matches!(body.last(), Some(Instr::Return { .. })) {
            self.out.push_str("    pop rbp\n");
            self.out.push_str("    ret\n");
        }
        self.out.push('\n');
        Ok(())
    }

    fn emit_label(&mut self, label: &str) {
        if self.emitted_labels.insert(label.to_string()) {
            self.out.push_str(&format!("{label}:\n"));
        }
    }

    fn emit_instr(&mut self, instr: &Instr) -> Result<()> {
        match instr {
            Instr::Assign { target, value, ty } => self.emit_assign(target, value, *ty),
            Instr::Print { value, ty } => self.emit_print(value, *ty),
            Instr::Return { value } => self.emit_return(value.as_deref()),
            Instr::Label { label } => self.emit_label(label),
            Instr::Goto { label } => self.out.push_str(&format!("    jmp {label}\n")),
            Instr::IfGoto { condition, label } => self.emit_if_goto(condition, label),
            Instr::Call { target, name, args } => self.emit_call(target, name, args),
            Instr::Binary {
                result,
                left,
                op,
                right,
                ty,
            } => self.emit_binary(result, left, *op, right, *ty)?,
            Instr::Unary { result, operand, .. } => self.emit_unary(result, operand),
            Instr::FunctionStart { name, .. } => {
                return Err(CodegenError::Internal(format!(
                    "FunctionStart({name}) reached the flat instruction emitter"
                )))
            }
            Instr::FunctionEnd { name } => {
                return Err(CodegenError::Internal(format!(
                    "FunctionEnd({name}) reached the flat instruction emitter"
                )))
            }
        }
        Ok(())
    }

    // --- operand loading ----------------------------------------------------

    fn load_into(&mut self, resolved: Resolved, reg: &str) {
        match resolved {
            Resolved::Int(i) => self.out.push_str(&format!("    mov {reg}, {i}\n")),
            Resolved::Bool(true) => self.out.push_str(&format!("    mov {reg}, [rel True]\n")),
            Resolved::Bool(false) => self.out.push_str(&format!("    mov {reg}, [rel False]\n")),
            Resolved::Var(name) => self.out.push_str(&format!("    mov {reg}, [rel {name}]\n")),
            Resolved::FloatLabel(label) => {
                self.out.push_str(&format!("    mov {reg}, [rel {label}]\n"))
            }
            Resolved::StrLabel(label) => self.out.push_str(&format!("    lea {reg}, [rel {label}]\n")),
        }
    }

    fn load_float(&mut self, value: &str, xmm: &str) {
        match self.resolve(value, Some(Type::Float)) {
            Resolved::FloatLabel(label) => {
                self.out.push_str(&format!("    movss {xmm}, [rel {label}]\n"))
            }
            Resolved::Var(name) => self.out.push_str(&format!("    movss {xmm}, [rel {name}]\n")),
            Resolved::Int(i) => {
                self.out.push_str(&format!("    mov rax, {i}\n"));
                self.out.push_str(&format!("    cvtsi2ss {xmm}, rax\n"));
            }
            _ => self.out.push_str(&format!("    movss {xmm}, [rel {value}]\n")),
        }
    }

    // --- statements -----------------------------------------------------------

    fn emit_assign(&mut self, target: &str, value: &str, ty: Option<Type>) {
        match ty {
            Some(Type::Float) => {
                self.load_float(value, "xmm0");
                self.out.push_str(&format!("    movss [rel {target}], xmm0\n"));
            }
            Some(Type::String) => match self.resolve(value, ty) {
                Resolved::StrLabel(label) => {
                    self.out.push_str(&format!("    lea rax, [rel {label}]\n"));
                    self.out.push_str(&format!("    mov [rel {target}], rax\n"));
                }
                other => {
                    self.load_into(other, "rax");
                    self.out.push_str(&format!("    mov [rel {target}], rax\n"));
                }
            },
            _ => {
                let resolved = self.resolve(value, ty);
                self.load_into(resolved, "rax");
                self.out.push_str(&format!("    mov [rel {target}], rax\n"));
            }
        }
    }

    fn emit_print(&mut self, value: &str, ty: Option<Type>) {
        self.out.push_str("    sub rsp, 32\n");
        match ty {
            Some(Type::Float) => {
                self.load_float(value, "xmm0");
                self.out.push_str("    cvtss2sd xmm0, xmm0\n");
                self.out.push_str("    movq rdx, xmm0\n");
                self.out.push_str("    lea rcx, [rel format_float]\n");
                self.out.push_str("    mov rax, 1\n");
            }
            Some(Type::String) => {
                match self.resolve(value, ty) {
                    Resolved::StrLabel(label) => {
                        self.out.push_str(&format!("    lea rdx, [rel {label}]\n"))
                    }
                    other => self.load_into(other, "rdx"),
                }
                self.out.push_str("    lea rcx, [rel format_str]\n");
                self.out.push_str("    xor eax, eax\n");
            }
            _ => {
                let resolved = self.resolve(value, ty);
                self.load_into(resolved, "rdx");
                self.out.push_str("    lea rcx, [rel format]\n");
                self.out.push_str("    xor eax, eax\n");
            }
        }
        self.out.push_str("    call printf\n");
        self.out.push_str("    add rsp, 32\n");
    }

    fn emit_return(&mut self, value: Option<&str>) {
        if let Some(v) = value {
            let hint = self.var_types.get(v).copied();
            if hint == Some(Type::Float) {
                self.load_float(v, "xmm0");
            } else {
                let resolved = self.resolve(v, hint);
                self.load_into(resolved, "rax");
            }
        }
        self.out.push_str("    mov rsp, rbp\n");
        self.out.push_str("    pop rbp\n");
        self.out.push_str("    ret\n");
    }

    fn emit_if_goto(&mut self, condition: &str, label: &str) {
        let (negated, bare) = match condition.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, condition),
        };
        let resolved = self.resolve(bare, None);
        self.load_into(resolved, "rax");
        self.out.push_str("    cmp rax, 0\n");
        if negated {
            self.out.push_str(&format!("    je {label}\n"));
        } else {
            self.out.push_str(&format!("    jne {label}\n"));
        }
    }

    fn emit_call(&mut self, target: &str, name: &str, args: &[String]) {
        let stack_args = args.len().saturating_sub(ARG_REGS.len());
        let reserve = align16(SHADOW_SPACE + 8 * stack_args as i32);
        self.out.push_str(&format!("    sub rsp, {reserve}\n"));

        for (i, arg) in args.iter().enumerate() {
            let resolved = self.resolve(arg, None);
            if is_stack_arg(i) {
                self.load_into(resolved, "rax");
                let offset = stack_arg_offset(i);
                self.out.push_str(&format!("    mov [rsp + {offset}], rax\n"));
            } else {
                self.load_into(resolved, ARG_REGS[i]);
            }
        }
        self.out.push_str(&format!("    call {name}\n"));
        self.out.push_str(&format!("    add rsp, {reserve}\n"));
        self.out.push_str(&format!("    mov [rel {target}], rax\n"));
    }

    // --- binary / unary / logical ----------------------------------------------

    fn emit_binary(
        &mut self,
        result: &str,
        left: &str,
        op: BinOp,
        right: &str,
        ty: Option<Type>,
    ) -> Result<()> {
        if op.is_logical() {
            self.emit_logical(result, left, op, right);
            return Ok(());
        }
        match self.operand_domain(left, right, ty) {
            Type::Float => self.emit_binary_float(result, left, op, right),
            _ => self.emit_binary_int(result, left, op, right)?,
        }
        Ok(())
    }

    fn operand_domain(&self, left: &str, right: &str, ty: Option<Type>) -> Type {
        if ty == Some(Type::Float) {
            return Type::Float;
        }
        let lookup = |t: &str| self.var_types.get(t).copied();
        if lookup(left) == Some(Type::Float) || lookup(right) == Some(Type::Float) {
            return Type::Float;
        }
        let looks_float =
            |t: &str| t.contains('.') && t.parse::<f32>().is_ok();
        if looks_float(left) || looks_float(right) {
            return Type::Float;
        }
        Type::Int
    }

    fn emit_binary_int(&mut self, result: &str, left: &str, op: BinOp, right: &str) -> Result<()> {
        let l = self.resolve(left, None);
        self.load_into(l, "rax");
        let r = self.resolve(right, None);
        self.load_into(r, "rcx");

        if op.is_comparison() {
            self.out.push_str("    cmp rax, rcx\n");
            let setcc = match op {
                BinOp::Eq => "sete",
                BinOp::Ne => "setne",
                BinOp::Lt => "setl",
                BinOp::Gt => "setg",
                _ => return Err(CodegenError::UnknownOperator(format!("{op:?}"))),
            };
            self.out.push_str(&format!("    {setcc} al\n"));
            self.out.push_str("    movzx rax, al\n");
            self.out.push_str(&format!("    mov [rel {result}], rax\n"));
            return Ok(());
        }

        match op {
            BinOp::Add => self.out.push_str("    add rax, rcx\n"),
            BinOp::Sub => self.out.push_str("    sub rax, rcx\n"),
            BinOp::Mul => self.out.push_str("    imul rax, rcx\n"),
            BinOp::Div => {
                self.out.push_str("    cmp rcx, 0\n");
                self.out.push_str("    je _int_div_zero\n");
                self.out.push_str("    cqo\n");
                self.out.push_str("    idiv rcx\n");
            }
            _ => return Err(CodegenError::UnknownOperator(format!("{op:?}"))),
        }
        self.out.push_str(&format!("    mov [rel {result}], rax\n"));
        Ok(())
    }

    fn emit_binary_float(&mut self, result: &str, left: &str, op: BinOp, right: &str) {
        self.load_float(left, "xmm0");
        self.load_float(right, "xmm1");

        if op.is_comparison() {
            self.out.push_str("    comiss xmm0, xmm1\n");
            let setcc = match op {
                BinOp::Eq => "sete",
                BinOp::Ne => "setne",
                BinOp::Lt => "setb",
                BinOp::Gt => "seta",
                _ => "sete",
            };
            self.out.push_str(&format!("    {setcc} al\n"));
            self.out.push_str("    movzx rax, al\n");
            self.out.push_str(&format!("    mov [rel {result}], rax\n"));
            return;
        }

        let opcode = match op {
            BinOp::Add => "addss",
            BinOp::Sub => "subss",
            BinOp::Mul => "mulss",
            BinOp::Div => {
                self.out.push_str("    xorps xmm2, xmm2\n");
                self.out.push_str("    ucomiss xmm1, xmm2\n");
                self.out.push_str("    je _float_div_zero\n");
                "divss"
            }
            _ => "addss",
        };
        self.out.push_str(&format!("    {opcode} xmm0, xmm1\n"));
        self.out.push_str(&format!("    movss [rel {result}], xmm0\n"));
    }

    fn emit_unary(&mut self, result: &str, operand: &str) {
        let o = self.resolve(operand, None);
        self.load_into(o, "rax");
        self.out.push_str("    cmp rax, 0\n");
        self.out.push_str("    sete al\n");
        self.out.push_str("    movzx rax, al\n");
        self.out.push_str(&format!("    mov [rel {result}], rax\n"));
    }

    /// `&&`/`||` short-circuit: the right operand is only evaluated
    /// when the left one didn't already decide the answer.
    fn emit_logical(&mut self, result: &str, left: &str, op: BinOp, right: &str) {
        let n = self.logical_counter;
        self.logical_counter += 1;
        let skip_label = format!("logical_skip_{n}");
        let end_label = format!("logical_end_{n}");

        let l = self.resolve(left, None);
        self.load_into(l, "rax");
        self.out.push_str("    cmp rax, 0\n");
        let jump = if op == BinOp::And { "je" } else { "jne" };
        self.out.push_str(&format!("    {jump} {skip_label}\n"));

        let r = self.resolve(right, None);
        self.load_into(r, "rax");
        self.out.push_str("    cmp rax, 0\n");
        self.out.push_str(&format!("    {jump} {skip_label}\n"));

        if op == BinOp::And {
            self.out.push_str("    mov al, 1\n");
        } else {
            self.out.push_str("    mov al, 0\n");
        }
        self.out.push_str(&format!("    jmp {end_label}\n"));
        self.out.push_str(&format!("{skip_label}:\n"));
        if op == BinOp::And {
            self.out.push_str("    mov al, 0\n");
        } else {
            self.out.push_str("    mov al, 1\n");
        }
        self.out.push_str(&format!("{end_label}:\n"));
        self.out.push_str("    movzx rax, al\n");
        self.out.push_str(&format!("    mov [rel {result}], rax\n"));
    }

    fn emit_div_zero_stub(&mut self, label: &str) {
        self.out.push_str(&format!("{label}:\n"));
        self.out.push_str("    sub rsp, 32\n");
        self.out.push_str("    lea rcx, [rel div_zero_err]\n");
        self.out.push_str("    xor eax, eax\n");
        self.out.push_str("    call printf\n");
        self.out.push_str("    add rsp, 32\n");
        self.out.push_str("    mov ecx, 1\n");
        self.out.push_str("    call ExitProcess\n");
    }

    fn emit_div_zero_stubs(&mut self) {
        self.emit_div_zero_stub("_int_div_zero");
        self.out.push('\n');
        self.emit_div_zero_stub("_float_div_zero");
    }
}

fn find_function_end(instrs: &[Instr], start: usize, name: &str) -> Result<usize> {
    let mut i = start + 1;
    while i < instrs.len() {
        if let Instr::FunctionEnd { name: end_name } = &instrs[i] {
            if end_name == name {
                return Ok(i);
            }
        }
        i += 1;
    }
    Err(CodegenError::UnterminatedFunction(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> String {
        let mut program = mylangc_par::parse(src).expect("parse");
        mylangc_sem::analyze(&mut program).expect("analyze");
        let ir = mylangc_ir::generate(&program);
        let ir = mylangc_ir::optimize(ir);
        generate(&ir).expect("codegen")
    }

    #[test]
    fn scenario_1_emits_main_with_storage_for_x_and_a_typed_print() {
        let asm = compile("let x:int = 1; print(x);");
        assert!(asm.contains("section .data"));
        assert!(asm.contains("x dq 0"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("lea rcx, [rel format]"));
        assert!(asm.contains("call printf"));
        assert!(asm.contains("call ExitProcess"));
    }

    #[test]
    fn scenario_3_while_loop_emits_matching_labels_and_a_conditional_jump() {
        let asm = compile("let x:int=0; while(x<3){ print(x); x=x+1; }");
        assert!(asm.contains("while_start_0:"));
        assert!(asm.contains("while_end_1:"));
        assert!(asm.contains("jmp while_start_0"));
        assert!(asm.contains("cmp rax, 0"));
    }

    #[test]
    fn scenario_4_function_emits_a_callable_label_and_a_call_site() {
        let asm = compile("function sum(a:int,b:int):int{return a+b;} print(sum(1,2));");
        assert!(asm.contains("func_sum:"));
        assert!(asm.contains("push rbp"));
        assert!(asm.contains("mov rbp, rsp"));
        assert!(asm.contains("call func_sum"));
        assert!(asm.contains("mov [rel a], rcx"));
        assert!(asm.contains("mov [rel b], rdx"));
    }

    #[test]
    fn a_function_body_ending_in_return_does_not_duplicate_its_epilogue() {
        let asm = compile("function sum(a:int,b:int):int{return a+b;} print(sum(1,2));");
        let func_start = asm.find("func_sum:").expect("function label present");
        let func_body = &asm[func_start..];
        let func_end = func_body.find("main:").unwrap_or(func_body.len());
        let func_body = &func_body[..func_end];
        assert_eq!(func_body.matches("ret").count(), 1);
        assert_eq!(func_body.matches("pop rbp").count(), 1);
    }

    #[test]
    fn multi_arg_call_spills_the_fifth_and_later_arguments_to_the_stack() {
        let asm = compile(
            "function total(a:int,b:int,c:int,d:int,e:int,f:int,g:int):int{return a;} \
             print(total(1,2,3,4,5,6,7));",
        );
        assert!(asm.contains("mov [rsp + 32], rax"));
        assert!(asm.contains("mov [rsp + 40], rax"));
        assert!(asm.contains("mov [rsp + 48], rax"));
        // first four still go through registers
        assert!(asm.contains("mov rcx, 1") || asm.contains("mov rcx,"));
    }

    #[test]
    fn division_lowers_a_zero_check_against_the_shared_stub() {
        // Literal operands would be constant-folded away before codegen
        // ever sees a `Binary` instruction, so this uses variables to force
        // a real division site to survive optimization.
        let asm = compile("let a:int=10; let b:int=2; let x:int=a/b;");
        assert!(asm.contains("je _int_div_zero"));
        assert!(asm.contains("_int_div_zero:"));
        assert!(asm.contains("_float_div_zero:"));
    }

    #[test]
    fn string_literal_is_interned_and_printed_with_the_string_format() {
        let asm = compile("print(\"hello\");");
        assert!(asm.contains("str_0 db \"hello\", 0"));
        assert!(asm.contains("lea rdx, [rel str_0]"));
        assert!(asm.contains("lea rcx, [rel format_str]"));
    }

    #[test]
    fn boolean_literal_use_declares_the_shared_constant() {
        let asm = compile("let done:bool = true; print(done);");
        assert!(asm.contains("True dq 1"));
        assert!(!asm.contains("False dq 0"));
    }

    #[test]
    fn match_statement_emits_a_comparison_per_case_and_a_default_label() {
        let asm = compile(
            "let x:int = 2; \
             match x { case 1: print(1); case 2: print(2); default: print(0); }",
        );
        assert!(asm.contains("case_"), "expected a case label:\n{asm}");
        assert!(
            asm.contains("default_case_"),
            "expected a default-case label:\n{asm}"
        );
        assert!(asm.contains("end_match_"), "expected the end label:\n{asm}");
        // Each case lowers to a comparison against the scrutinee followed by
        // a conditional jump into that case's body.
        assert!(asm.contains("cmp rax, 0"));
        assert!(asm.contains("jne case_"));
    }

    #[test]
    fn try_catch_emits_the_try_catch_and_end_labels() {
        let asm = compile("try { print(1); } catch (e) { print(2); }");
        assert!(asm.contains("try_"), "expected a try label:\n{asm}");
        assert!(asm.contains("catch_"), "expected a catch label:\n{asm}");
        assert!(asm.contains("end_try_"), "expected the end-try label:\n{asm}");
        // The try body always jumps past the catch body; nothing in this
        // generator ever transfers control into it.
        assert!(asm.contains("jmp end_try_"));
    }

    #[test]
    fn labels_are_emitted_only_once() {
        let mut gen = NasmGenerator::new();
        gen.emit_label("dup");
        gen.emit_label("dup");
        assert_eq!(gen.out.matches("dup:").count(), 1);
    }

    #[test]
    fn unterminated_function_is_reported_as_an_error_not_a_panic() {
        let instrs = vec![Instr::FunctionStart {
            name: "func_f".into(),
            params: vec![],
        }];
        assert!(matches!(
            generate(&instrs),
            Err(CodegenError::UnterminatedFunction(_))
        ));
    }
}
