//! Translator (TR): recursive-descent recognizer for the source grammar,
//! fused with code generation. Each `compile_*` method consumes exactly the
//! tokens of its construct and leaves the cursor at the first token after
//! it; there is no intermediate parse tree, and emission happens inline as
//! each construct is recognized.

use std::io::Write;

use tracing::{debug, trace};

use crate::error::CompileError;
use crate::lexer::{TokenType, Tokenizer};
use crate::symbol_table::{IdentifierKind, SymbolTable};
use crate::token::{Keyword, Token};
use crate::vm_writer::{InstructionWriter, VmArithOp, VmSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Per-subroutine state that resets on every subroutine entry.
#[derive(Debug, Default)]
struct TranslatorContext {
    class_name: String,
    while_counter: u32,
    if_counter: u32,
}

pub struct Translator<W: Write> {
    tk: Tokenizer,
    st: SymbolTable,
    iw: InstructionWriter<W>,
    ctx: TranslatorContext,
}

impl<W: Write> Translator<W> {
    pub fn new(source: &str, out: W) -> Self {
        Translator {
            tk: Tokenizer::new(source),
            st: SymbolTable::new(),
            iw: InstructionWriter::new(out),
            ctx: TranslatorContext::default(),
        }
    }

    /// Runs the whole translation and returns the (flushed) output sink.
    pub fn translate(mut self) -> Result<W, CompileError> {
        self.compile_class()?;
        Ok(self.iw.into_inner()?)
    }

    // ---- token-level helpers -------------------------------------------

    fn describe_current(&self) -> String {
        match self.tk.current() {
            Some(t) => t.describe(),
            None => "end of input".to_string(),
        }
    }

    fn err_structural(&self, expected: impl Into<String>) -> CompileError {
        CompileError::structural(self.tk.current_line(), expected, self.describe_current())
    }

    fn is_symbol(&self, c: char) -> bool {
        matches!(self.tk.current(), Some(Token::Symbol(s)) if *s == c)
    }

    fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.tk.current(), Some(Token::Keyword(k)) if *k == kw)
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), CompileError> {
        if self.is_symbol(c) {
            self.tk.advance();
            Ok(())
        } else {
            Err(self.err_structural(format!("'{}'", c)))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), CompileError> {
        if self.is_keyword(kw) {
            self.tk.advance();
            Ok(())
        } else {
            Err(self.err_structural(format!("keyword '{}'", kw.as_str())))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        match self.tk.current() {
            Some(Token::Identifier(_)) => {
                let name = self.tk.identifier().to_string();
                self.tk.advance();
                Ok(name)
            }
            _ => Err(self.err_structural("an identifier")),
        }
    }

    /// `('int'|'char'|'boolean') | className`
    fn compile_type(&mut self) -> Result<String, CompileError> {
        match self.tk.current() {
            Some(Token::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                let name = self.tk.keyword().as_str().to_string();
                self.tk.advance();
                Ok(name)
            }
            Some(Token::Identifier(_)) => self.expect_identifier(),
            _ => Err(self.err_structural("a type")),
        }
    }

    fn seg_for_kind(&self, kind: IdentifierKind) -> VmSegment {
        match kind {
            IdentifierKind::Static => VmSegment::Static,
            IdentifierKind::Field => VmSegment::This,
            IdentifierKind::Argument => VmSegment::Argument,
            IdentifierKind::Local => VmSegment::Local,
            IdentifierKind::None => unreachable!("seg_for_kind called with kind None"),
        }
    }

    /// `push`es a previously-defined variable onto the stack by name.
    /// Panics if `name` was never defined; callers guarantee well-formed input.
    fn push_variable(&mut self, name: &str) -> Result<(), CompileError> {
        let kind = self.st.kind_of(name);
        assert!(kind != IdentifierKind::None, "undefined variable '{name}'");
        let seg = self.seg_for_kind(kind);
        let idx = self.st.index_of(name);
        Ok(self.iw.push(seg, idx)?)
    }

    // ---- grammar ----------------------------------------------------------

    /// `class := 'class' ID '{' classVarDec* subroutineDec* '}'`
    fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        self.ctx.class_name = self.expect_identifier()?;
        self.expect_symbol('{')?;

        while self.is_keyword(Keyword::Static) || self.is_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while self.is_keyword(Keyword::Constructor)
            || self.is_keyword(Keyword::Function)
            || self.is_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }

        self.expect_symbol('}')?;
        Ok(())
    }

    /// `classVarDec := ('static'|'field') type ID (',' ID)* ';'`
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = if self.is_keyword(Keyword::Static) {
            self.tk.advance();
            IdentifierKind::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            IdentifierKind::Field
        };

        let type_name = self.compile_type()?;
        let name = self.expect_identifier()?;
        self.st.define(&name, &type_name, kind);

        while self.is_symbol(',') {
            self.tk.advance();
            let name = self.expect_identifier()?;
            self.st.define(&name, &type_name, kind);
        }

        self.expect_symbol(';')?;
        Ok(())
    }

    /// `subroutineDec := ('constructor'|'function'|'method') (type|'void') ID
    ///                    '(' paramList ')' subroutineBody`
    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        let kind = if self.is_keyword(Keyword::Constructor) {
            self.tk.advance();
            SubroutineKind::Constructor
        } else if self.is_keyword(Keyword::Function) {
            self.tk.advance();
            SubroutineKind::Function
        } else {
            self.expect_keyword(Keyword::Method)?;
            SubroutineKind::Method
        };

        self.st.start_subroutine();
        self.ctx.while_counter = 0;
        self.ctx.if_counter = 0;

        // Return type (void or a value type). The spelling itself isn't
        // needed for codegen, but whether it's `void` gates the synthetic
        // epilogue below.
        let is_void = if self.is_keyword(Keyword::Void) {
            self.tk.advance();
            true
        } else {
            self.compile_type()?;
            false
        };

        let sub_name = self.expect_identifier()?;

        if kind == SubroutineKind::Method {
            self.st
                .define("this", &self.ctx.class_name.clone(), IdentifierKind::Argument);
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.compile_subroutine_body(kind, &sub_name, is_void)?;
        Ok(())
    }

    /// `paramList := (type ID (',' type ID)*)?`
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.is_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.compile_type()?;
            let name = self.expect_identifier()?;
            self.st.define(&name, &type_name, IdentifierKind::Argument);
            if self.is_symbol(',') {
                self.tk.advance();
                continue;
            }
            break;
        }
        Ok(())
    }

    /// `subroutineBody := '{' varDec* statements '}'`
    fn compile_subroutine_body(
        &mut self,
        kind: SubroutineKind,
        sub_name: &str,
        is_void: bool,
    ) -> Result<(), CompileError> {
        self.expect_symbol('{')?;

        let mut n_locals: u16 = 0;
        while self.is_keyword(Keyword::Var) {
            self.compile_var_dec(&mut n_locals)?;
        }

        let full_name = format!("{}.{}", self.ctx.class_name, sub_name);
        self.iw.function(&full_name, n_locals)?;
        debug!(name = %full_name, n_locals, "emitted function");

        match kind {
            SubroutineKind::Constructor => {
                let field_count = self.st.var_count(IdentifierKind::Field);
                self.iw.push(VmSegment::Constant, field_count)?;
                self.iw.call("Memory.alloc", 1)?;
                self.iw.pop(VmSegment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.iw.push(VmSegment::Argument, 0)?;
                self.iw.pop(VmSegment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        let ends_in_return = self.compile_statements()?;
        if is_void && !ends_in_return {
            // The body's last top-level statement wasn't itself a `return`
            // (e.g. it was an if/else whose every branch returns, which the
            // translator never analyzes). A void subroutine's VM function
            // must still end in `return`, so one is synthesized here.
            self.iw.push(VmSegment::Constant, 0)?;
            self.iw.ret()?;
        }
        self.expect_symbol('}')?;
        Ok(())
    }

    /// `varDec := 'var' type ID (',' ID)* ';'`
    fn compile_var_dec(&mut self, n_locals: &mut u16) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Var)?;
        let type_name = self.compile_type()?;

        let name = self.expect_identifier()?;
        self.st.define(&name, &type_name, IdentifierKind::Local);
        *n_locals += 1;

        while self.is_symbol(',') {
            self.tk.advance();
            let name = self.expect_identifier()?;
            self.st.define(&name, &type_name, IdentifierKind::Local);
            *n_locals += 1;
        }

        self.expect_symbol(';')?;
        Ok(())
    }

    /// `statements := (let|if|while|do|return)*`
    ///
    /// Returns whether the last statement compiled was a `return`, which
    /// the void-subroutine epilogue rule in [`Self::compile_subroutine_body`]
    /// needs.
    fn compile_statements(&mut self) -> Result<bool, CompileError> {
        let mut last_was_return = false;
        loop {
            if self.is_keyword(Keyword::Let) {
                self.compile_let()?;
                last_was_return = false;
            } else if self.is_keyword(Keyword::If) {
                self.compile_if()?;
                last_was_return = false;
            } else if self.is_keyword(Keyword::While) {
                self.compile_while()?;
                last_was_return = false;
            } else if self.is_keyword(Keyword::Do) {
                self.compile_do()?;
                last_was_return = false;
            } else if self.is_keyword(Keyword::Return) {
                self.compile_return()?;
                last_was_return = true;
            } else {
                break;
            }
        }
        Ok(last_was_return)
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_identifier()?;

        if self.is_symbol('[') {
            self.tk.advance();
            self.push_variable(&name)?;
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.iw.arith(VmArithOp::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            self.iw.pop(VmSegment::Temp, 0)?;
            self.iw.pop(VmSegment::Pointer, 1)?;
            self.iw.push(VmSegment::Temp, 0)?;
            self.iw.pop(VmSegment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            let kind = self.st.kind_of(&name);
            assert!(kind != IdentifierKind::None, "undefined variable '{name}'");
            let seg = self.seg_for_kind(kind);
            let idx = self.st.index_of(&name);
            self.iw.pop(seg, idx)?;
        }

        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        let suffix = self.ctx.if_counter;
        self.ctx.if_counter += 1;
        let false_label = format!("IF_FALSE{suffix}");
        let end_label = format!("END_IF{suffix}");

        self.iw.arith(VmArithOp::Not)?;
        self.iw.if_goto(&false_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        if self.is_keyword(Keyword::Else) {
            self.iw.goto(&end_label)?;
            self.iw.label(&false_label)?;
            self.tk.advance();
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
            self.iw.label(&end_label)?;
        } else {
            self.iw.label(&false_label)?;
        }

        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::While)?;

        let suffix = self.ctx.while_counter;
        self.ctx.while_counter += 1;
        let top_label = format!("WHILE{suffix}");
        let end_label = format!("END_WHILE{suffix}");

        self.iw.label(&top_label)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.iw.arith(VmArithOp::Not)?;
        self.iw.if_goto(&end_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.iw.goto(&top_label)?;
        self.iw.label(&end_label)?;
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Do)?;
        self.compile_subroutine_call()?;
        self.expect_symbol(';')?;
        self.iw.pop(VmSegment::Temp, 0)?;
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Return)?;
        if self.is_symbol(';') {
            self.iw.push(VmSegment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.iw.ret()?;
        Ok(())
    }

    /// `expression := term (op term)*`. Operators are applied strictly
    /// left-to-right with no precedence.
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        loop {
            let op = match self.tk.current() {
                Some(Token::Symbol(c @ ('+' | '-' | '*' | '/' | '&' | '|' | '<' | '>' | '='))) => {
                    *c
                }
                _ => break,
            };
            self.tk.advance();
            self.compile_term()?;
            match op {
                '+' => self.iw.arith(VmArithOp::Add)?,
                '-' => self.iw.arith(VmArithOp::Sub)?,
                '=' => self.iw.arith(VmArithOp::Eq)?,
                '<' => self.iw.arith(VmArithOp::Lt)?,
                '>' => self.iw.arith(VmArithOp::Gt)?,
                '&' => self.iw.arith(VmArithOp::And)?,
                '|' => self.iw.arith(VmArithOp::Or)?,
                '*' => self.iw.call("Math.multiply", 2)?,
                '/' => self.iw.call("Math.divide", 2)?,
                _ => unreachable!("filtered to the op set above"),
            }
        }
        Ok(())
    }

    /// `term := INT | STR | keywordConst | ID | ID '[' expression ']'
    ///        | subroutineCall | '(' expression ')' | ('-'|'~') term`
    fn compile_term(&mut self) -> Result<(), CompileError> {
        match self.tk.current() {
            Some(Token::IntConst(_)) => {
                let n = self.tk.int_val();
                self.tk.advance();
                self.iw.push(VmSegment::Constant, n)?;
            }
            Some(Token::StringConst(_)) => {
                let s = self.tk.string_val().to_string();
                self.tk.advance();
                self.iw.push(VmSegment::Constant, s.chars().count() as u16)?;
                self.iw.call("String.new", 1)?;
                for c in s.chars() {
                    self.iw.push(VmSegment::Constant, c as u16)?;
                    self.iw.call("String.appendChar", 2)?;
                }
            }
            Some(Token::Keyword(Keyword::True)) => {
                self.tk.advance();
                self.iw.push(VmSegment::Constant, 0)?;
                self.iw.arith(VmArithOp::Not)?;
            }
            Some(Token::Keyword(Keyword::False | Keyword::Null)) => {
                self.tk.advance();
                self.iw.push(VmSegment::Constant, 0)?;
            }
            Some(Token::Keyword(Keyword::This)) => {
                self.tk.advance();
                self.iw.push(VmSegment::Pointer, 0)?;
            }
            Some(Token::Symbol('(')) => {
                self.tk.advance();
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            Some(Token::Symbol('-')) => {
                self.tk.advance();
                self.compile_term()?;
                self.iw.arith(VmArithOp::Neg)?;
            }
            Some(Token::Symbol('~')) => {
                self.tk.advance();
                self.compile_term()?;
                self.iw.arith(VmArithOp::Not)?;
            }
            Some(Token::Identifier(_)) => {
                let next_is_bracket = matches!(self.tk.peek(), Some(Token::Symbol('[')));
                let next_is_call = matches!(self.tk.peek(), Some(Token::Symbol('(' | '.')));

                if next_is_bracket {
                    let name = self.expect_identifier()?;
                    self.tk.advance(); // '['
                    self.push_variable(&name)?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.iw.arith(VmArithOp::Add)?;
                    self.iw.pop(VmSegment::Pointer, 1)?;
                    self.iw.push(VmSegment::That, 0)?;
                } else if next_is_call {
                    self.compile_subroutine_call()?;
                } else {
                    let name = self.expect_identifier()?;
                    self.push_variable(&name)?;
                }
            }
            _ => return Err(self.err_structural("a term")),
        }
        Ok(())
    }

    /// Disambiguates and compiles `name(args)`, `name.sub(args)`, and
    /// `Target.sub(args)` depending on whether the leading identifier is a
    /// known variable. Assumes the cursor is on that leading identifier.
    fn compile_subroutine_call(&mut self) -> Result<(), CompileError> {
        let leading = self.expect_identifier()?;

        if self.is_symbol('(') {
            self.tk.advance();
            self.iw.push(VmSegment::Pointer, 0)?;
            let n_args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.iw
                .call(&format!("{}.{}", self.ctx.class_name, leading), n_args + 1)?;
            return Ok(());
        }

        self.expect_symbol('.')?;
        let member = self.expect_identifier()?;
        self.expect_symbol('(')?;

        let kind = self.st.kind_of(&leading);
        if kind != IdentifierKind::None {
            let seg = self.seg_for_kind(kind);
            let idx = self.st.index_of(&leading);
            let type_name = self.st.type_of(&leading).to_string();
            self.iw.push(seg, idx)?;
            let n_args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.iw.call(&format!("{}.{}", type_name, member), n_args + 1)?;
        } else {
            let n_args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.iw.call(&format!("{}.{}", leading, member), n_args)?;
        }

        Ok(())
    }

    /// `(expression (',' expression)*)?`. Returns the count actually
    /// compiled.
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        if self.is_symbol(')') {
            return Ok(0);
        }
        self.compile_expression()?;
        let mut count = 1u16;
        while self.is_symbol(',') {
            self.tk.advance();
            self.compile_expression()?;
            count += 1;
        }
        trace!(count, "compiled expression list");
        Ok(count)
    }
}
