//! Recursive-descent parser (spec §4.3): one-token lookahead, constructs the
//! AST directly into a [`Program`] arena while maintaining a live type-name
//! symbol table so `(Identifier)expr` can be disambiguated from a
//! parenthesized expression at parse time (HLSL's grammar is not
//! context-free on this point).
mod expr;
mod stmt;

use crate::ast::decl::*;
use crate::ast::ty::{parse_base_type_name, BaseType, BufferType, SamplerType, TypeDenoter};
use crate::ast::{DeclId, Program};
use crate::position::{FileId, SourceArea, SourcePosition};
use crate::report::Report;
use crate::symbol_table::SymbolTable;
use crate::token::{Keyword, PunctToken, Token, TokenKind};

/// An unexpected-token count past this threshold aborts parsing outright
/// rather than flooding the sink with cascading errors.
const MAX_RECOVERABLE_ERRORS: usize = 64;

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    pub symbols: SymbolTable,
    pub program: Program,
    pub diagnostics: Vec<Report>,
    error_count: usize,
    /// Guards `<`/`>` disambiguation inside template argument lists
    /// (`StructuredBuffer<float4>`) versus the relational operators.
    template_depth: u32,
}

impl<'t> Parser<'t> {
    pub fn new(_file: FileId, tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            symbols: SymbolTable::new(),
            program: Program::new(),
            diagnostics: Vec::new(),
            error_count: 0,
            template_depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Report::error(message).with_area(self.peek().area));
        self.error_count += 1;
    }

    fn fatal_recovery_exceeded(&self) -> bool {
        self.error_count > MAX_RECOVERABLE_ERRORS
    }

    fn expect_punct(&mut self, expected: PunctToken) -> bool {
        if self.peek().kind == TokenKind::Punct(expected) {
            self.bump();
            true
        } else {
            self.error(format!("expected '{:?}', found '{}'", expected, self.peek().spelling));
            false
        }
    }

    fn eat_punct(&mut self, p: PunctToken) -> bool {
        if self.peek().kind == TokenKind::Punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: Keyword) -> bool {
        if self.peek().kind == TokenKind::Keyword(k) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        if let TokenKind::Ident = self.peek().kind {
            Some(self.bump().spelling)
        } else {
            self.error(format!("expected identifier, found '{}'", self.peek().spelling));
            None
        }
    }

    fn area_since(&self, start: SourcePosition) -> SourceArea {
        let end = self.peek().area.start;
        if end.line == start.line {
            SourceArea::new(start, end.column.saturating_sub(start.column))
        } else {
            SourceArea::new(start, 0)
        }
    }

    pub fn parse_program(&mut self) {
        // Standard resource/buffer type-like identifiers are recognized by
        // spelling in `try_parse_type_denoter`, not via the symbol table, so
        // only user structs/typedefs need registering here as they're seen.
        while !self.at_eof() && !self.fatal_recovery_exceeded() {
            if matches!(self.peek().kind, TokenKind::Directive(_)) {
                self.bump();
                continue;
            }
            self.parse_top_level_decl();
        }
    }

    fn parse_top_level_decl(&mut self) {
        let start = self.peek().area.start;
        if self.eat_keyword(Keyword::Struct) {
            self.parse_struct_decl(start);
            return;
        }
        if self.eat_keyword(Keyword::Typedef) {
            self.parse_typedef(start);
            return;
        }
        if matches!(self.peek().kind, TokenKind::Keyword(Keyword::Cbuffer) | TokenKind::Keyword(Keyword::Tbuffer)) {
            self.parse_uniform_buffer(start);
            return;
        }
        // `[numthreads(x, y, z)]` attribute preceding a compute entry point.
        let num_threads = self.try_parse_numthreads_attribute();
        let Some(mut ty) = self.try_parse_type_specifier() else {
            self.error(format!("expected a declaration, found '{}'", self.peek().spelling));
            self.bump();
            return;
        };
        let Some(name) = self.expect_ident() else { return };
        if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
            self.parse_function_decl(start, name, ty, num_threads);
        } else {
            ty.semantic = self.try_parse_semantic();
            self.parse_variable_decl_rest(start, name, ty, true);
        }
    }

    fn try_parse_numthreads_attribute(&mut self) -> Option<(u32, u32, u32)> {
        if !self.eat_punct(PunctToken::LBracket) {
            return None;
        }
        let result = if self.peek().kind == TokenKind::Keyword(Keyword::NumThreads) {
            self.bump();
            self.expect_punct(PunctToken::LParen);
            let x = self.parse_uint_literal();
            self.expect_comma();
            let y = self.parse_uint_literal();
            self.expect_comma();
            let z = self.parse_uint_literal();
            self.expect_punct(PunctToken::RParen);
            Some((x, y, z))
        } else {
            None
        };
        self.expect_punct(PunctToken::RBracket);
        result
    }

    fn expect_comma(&mut self) -> bool {
        if let TokenKind::BinOp(crate::token::BinOpToken::Comma) = self.peek().kind {
            self.bump();
            true
        } else {
            self.error("expected ','");
            false
        }
    }

    fn parse_uint_literal(&mut self) -> u32 {
        if let TokenKind::IntLiteral = self.peek().kind {
            let spelling = self.bump().spelling;
            spelling.trim_end_matches(|c: char| c.is_alphabetic()).parse().unwrap_or(0)
        } else {
            self.error("expected an integer literal");
            0
        }
    }

    fn try_parse_semantic(&mut self) -> Option<String> {
        if self.peek().kind == TokenKind::Colon {
            self.bump();
            self.expect_ident()
        } else {
            None
        }
    }

    fn parse_struct_decl(&mut self, start: SourcePosition) {
        let Some(name) = self.expect_ident() else { return };
        let base = if self.eat_punct(PunctToken::Colon) { self.expect_ident() } else { None };
        let base_id = base.and_then(|b| self.symbols.resolve(&b)).and_then(|ids| ids.first().copied());
        self.expect_punct(PunctToken::LBrace);
        let mut members = Vec::new();
        let mut member_functions = Vec::new();
        self.symbols.open_scope();
        while !self.eat_punct(PunctToken::RBrace) && !self.at_eof() && !self.fatal_recovery_exceeded() {
            let member_start = self.peek().area.start;
            let Some(mut ty) = self.try_parse_type_specifier() else {
                self.error("expected a member declaration");
                self.bump();
                continue;
            };
            let Some(member_name) = self.expect_ident() else { continue };
            if self.peek().kind == TokenKind::Punct(PunctToken::LParen) {
                if let Some(id) = self.parse_function_decl(member_start, member_name, ty, None) {
                    member_functions.push(id);
                }
                continue;
            }
            ty.semantic = self.try_parse_semantic();
            let area = self.area_since(member_start);
            let decl = VariableDecl { name: member_name.clone(), ty, initializer: None, register: None, packoffset: None, area };
            let id = self.program.push(Decl::Variable(decl));
            self.symbols.declare(member_name, id);
            members.push(id);
            self.expect_punct(PunctToken::Semi);
        }
        self.symbols.close_scope();
        self.expect_punct(PunctToken::Semi);
        let area = self.area_since(start);
        let id = self.program.push(Decl::Structure(StructureDecl { name: name.clone(), base: base_id, members, member_functions, area }));
        self.symbols.declare(&name, id);
        self.symbols.declare_type_name(name);
    }

    fn parse_typedef(&mut self, start: SourcePosition) {
        let Some(ty) = self.try_parse_type_specifier() else {
            self.error("expected a type in typedef");
            return;
        };
        let Some(name) = self.expect_ident() else { return };
        self.expect_punct(PunctToken::Semi);
        let area = self.area_since(start);
        let id = self.program.push(Decl::TypeAlias(TypeAliasDecl { name: name.clone(), aliased: ty.denoter, area }));
        self.symbols.declare(&name, id);
        self.symbols.declare_type_name(name);
    }

    fn parse_uniform_buffer(&mut self, start: SourcePosition) {
        let kind = if self.eat_keyword(Keyword::Cbuffer) { UniformBufferKind::ConstantBuffer } else { self.bump(); UniformBufferKind::TextureBuffer };
        let Some(name) = self.expect_ident() else { return };
        let register = self.try_parse_register();
        self.expect_punct(PunctToken::LBrace);
        let mut members = Vec::new();
        self.symbols.open_scope();
        while !self.eat_punct(PunctToken::RBrace) && !self.at_eof() && !self.fatal_recovery_exceeded() {
            let member_start = self.peek().area.start;
            let Some(ty) = self.try_parse_type_specifier() else {
                self.error("expected a member declaration in buffer block");
                self.bump();
                continue;
            };
            let Some(member_name) = self.expect_ident() else { continue };
            let area = self.area_since(member_start);
            let decl = VariableDecl { name: member_name.clone(), ty, initializer: None, register: None, packoffset: None, area };
            let id = self.program.push(Decl::Variable(decl));
            self.symbols.declare(member_name, id);
            members.push(id);
            self.expect_punct(PunctToken::Semi);
        }
        self.symbols.close_scope();
        self.expect_punct(PunctToken::Semi);
        let area = self.area_since(start);
        let id = self.program.push(Decl::UniformBuffer(UniformBufferDecl { kind, name: name.clone(), members, register, area }));
        self.symbols.declare(name, id);
    }

    fn try_parse_register(&mut self) -> Option<RegisterBinding> {
        if self.peek().kind != TokenKind::Colon {
            return None;
        }
        if self.peek_at(1).kind != TokenKind::Keyword(Keyword::Register) {
            return None;
        }
        self.bump();
        self.bump();
        self.expect_punct(PunctToken::LParen);
        let slot_tok = self.expect_ident().unwrap_or_default();
        let register_class = slot_tok.chars().next().unwrap_or('b');
        let slot: u32 = slot_tok.get(1..).and_then(|s| s.parse().ok()).unwrap_or(0);
        let space = if self.expect_comma_optional() { self.expect_ident().and_then(|s| s.trim_start_matches("space").parse().ok()) } else { None };
        self.expect_punct(PunctToken::RParen);
        Some(RegisterBinding { register_class, slot, space })
    }

    fn expect_comma_optional(&mut self) -> bool {
        if let TokenKind::BinOp(crate::token::BinOpToken::Comma) = self.peek().kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_function_decl(&mut self, start: SourcePosition, name: String, return_type: TypeSpecifier, num_threads: Option<(u32, u32, u32)>) -> Option<DeclId> {
        self.expect_punct(PunctToken::LParen);
        let mut params = Vec::new();
        self.symbols.open_scope();
        if self.peek().kind != TokenKind::Punct(PunctToken::RParen) {
            loop {
                let Some(mut param_ty) = self.try_parse_type_specifier() else {
                    self.error("expected a parameter type");
                    break;
                };
                let Some(param_name) = self.expect_ident() else { break };
                param_ty.semantic = self.try_parse_semantic();
                let default_value = if matches!(self.peek().kind, TokenKind::AssignOp(crate::token::AssignOpToken::Assign)) {
                    self.bump();
                    Some(self.parse_assignment_expr())
                } else {
                    None
                };
                params.push(ParamDecl { name: param_name, ty: param_ty, default_value });
                if !self.eat_punct_comma() {
                    break;
                }
            }
        }
        self.expect_punct(PunctToken::RParen);
        let semantic = self.try_parse_semantic();
        let mut return_type = return_type;
        return_type.semantic = semantic;
        let body = if self.eat_punct(PunctToken::Semi) {
            None
        } else {
            Some(self.parse_block_stmts())
        };
        self.symbols.close_scope();
        let area = self.area_since(start);
        let decl = FunctionDecl { name: name.clone(), return_type, params, body, reachable: false, is_entry_point: false, num_threads, param_decl_ids: Vec::new(), area };
        let id = self.program.push(Decl::Function(decl));
        self.symbols.declare_function(name, id);
        Some(id)
    }

    fn eat_punct_comma(&mut self) -> bool {
        if let TokenKind::BinOp(crate::token::BinOpToken::Comma) = self.peek().kind {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Attempts to parse a full type specifier (modifiers + storage class +
    /// interpolation + direction + base/user type denoter). Returns `None`
    /// without consuming input if the current token cannot start one.
    fn try_parse_type_specifier(&mut self) -> Option<TypeSpecifier> {
        let mut modifiers = TypeModifiers::default();
        let mut storage = StorageClass::default();
        let mut interpolation = None;
        let mut direction = ParamDirection::In;
        loop {
            match self.peek().kind {
                TokenKind::Keyword(Keyword::Const) => { modifiers.is_const = true; self.bump(); }
                TokenKind::Keyword(Keyword::RowMajor) => { modifiers.row_major = true; self.bump(); }
                TokenKind::Keyword(Keyword::ColumnMajor) => { modifiers.column_major = true; self.bump(); }
                TokenKind::Keyword(Keyword::Static) => { storage.is_static = true; self.bump(); }
                TokenKind::Keyword(Keyword::Extern) => { storage.is_extern = true; self.bump(); }
                TokenKind::Keyword(Keyword::Uniform) => { storage.is_uniform = true; self.bump(); }
                TokenKind::Keyword(Keyword::In) => { direction = ParamDirection::In; self.bump(); }
                TokenKind::Keyword(Keyword::Out) => { direction = ParamDirection::Out; self.bump(); }
                TokenKind::Keyword(Keyword::InOut) => { direction = ParamDirection::InOut; self.bump(); }
                TokenKind::Ident if matches!(self.peek().spelling.as_str(), "linear" | "centroid" | "nointerpolation" | "noperspective" | "sample") => {
                    interpolation = Some(self.bump().spelling);
                }
                _ => break,
            }
        }
        let denoter = self.try_parse_type_denoter()?;
        Some(TypeSpecifier { denoter, modifiers, storage, interpolation, direction, semantic: None })
    }

    /// Parses a bare type denoter (no modifiers), the building block both
    /// `try_parse_type_specifier` and cast-disambiguation lookahead use.
    fn try_parse_type_denoter(&mut self) -> Option<TypeDenoter> {
        if self.peek().kind == TokenKind::Keyword(Keyword::Struct) {
            // Inline anonymous struct types are out of scope; treat as a
            // named forward reference instead.
            self.bump();
        }
        let TokenKind::Ident = self.peek().kind else { return None };
        let name = self.peek().spelling.clone();
        if name == "void" {
            self.bump();
            return Some(TypeDenoter::Void);
        }
        if let Some(base) = parse_base_type_name(&name) {
            self.bump();
            return Some(TypeDenoter::Base(base));
        }
        if let Some(sampler) = sampler_type_from_name(&name) {
            self.bump();
            return Some(TypeDenoter::Sampler(sampler));
        }
        if let Some(buffer) = buffer_type_from_name(&name) {
            self.bump();
            let element = if self.eat_lt() {
                self.template_depth += 1;
                let elem = self.try_parse_type_denoter().map(Box::new);
                self.template_depth -= 1;
                self.expect_gt();
                elem
            } else {
                None
            };
            return Some(TypeDenoter::Buffer { kind: buffer, element });
        }
        if self.symbols.is_type_name(&name) {
            self.bump();
            let ids = self.symbols.resolve(&name)?;
            let id = *ids.first()?;
            return Some(match self.program.get(id) {
                crate::ast::decl::Decl::Structure(_) => TypeDenoter::Structure(id),
                _ => TypeDenoter::Alias(id),
            });
        }
        None
    }

    fn eat_lt(&mut self) -> bool {
        use crate::token::BinOpToken;
        if self.peek().kind == TokenKind::BinOp(BinOpToken::Lt) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_gt(&mut self) -> bool {
        use crate::token::BinOpToken;
        match self.peek().kind {
            TokenKind::BinOp(BinOpToken::Gt) => { self.bump(); true }
            TokenKind::BinOp(BinOpToken::Shr) => {
                // `>>` closing two nested templates: split it into one `>`.
                self.bump();
                // Can't easily push a synthetic token back; callers that
                // nest templates two deep are rare enough that re-scanning
                // isn't worth the complexity here.
                true
            }
            _ => {
                self.error("expected '>' to close template argument list");
                false
            }
        }
    }

    fn parse_variable_decl_rest(&mut self, start: SourcePosition, first_name: String, first_ty: TypeSpecifier, top_level: bool) -> Vec<DeclId> {
        let mut ids = Vec::new();
        let mut name = first_name;
        let mut ty = first_ty;
        loop {
            let register = self.try_parse_register();
            let packoffset = self.try_parse_packoffset();
            let initializer = if matches!(self.peek().kind, TokenKind::AssignOp(crate::token::AssignOpToken::Assign)) {
                self.bump();
                Some(self.parse_assignment_expr())
            } else {
                None
            };
            let area = self.area_since(start);
            let decl = VariableDecl { name: name.clone(), ty: ty.clone(), initializer, register, packoffset, area };
            let variant = match &decl.ty.denoter {
                TypeDenoter::Sampler(_) => Decl::Sampler(decl),
                TypeDenoter::Buffer { .. } => Decl::Buffer(decl),
                _ => Decl::Variable(decl),
            };
            let id = self.program.push(variant);
            self.symbols.declare(&name, id);
            if top_level {
                self.program.top_level.push(id);
            }
            ids.push(id);
            if !self.eat_punct_comma() {
                break;
            }
            let Some(next_name) = self.expect_ident() else { break };
            name = next_name;
            // Subsequent declarators in the same statement share the base
            // type but not a freshly-parsed specifier.
            ty = TypeSpecifier { semantic: None, ..ty };
        }
        self.expect_punct(PunctToken::Semi);
        ids
    }

    fn try_parse_packoffset(&mut self) -> Option<(u32, Option<String>)> {
        if self.peek().kind != TokenKind::Colon || self.peek_at(1).kind != TokenKind::Keyword(Keyword::PackOffset) {
            return None;
        }
        self.bump();
        self.bump();
        self.expect_punct(PunctToken::LParen);
        let reg = self.expect_ident().unwrap_or_default();
        let offset: u32 = reg.trim_start_matches('c').parse().unwrap_or(0);
        let component = if self.eat_punct(PunctToken::Dot) { self.expect_ident() } else { None };
        self.expect_punct(PunctToken::RParen);
        Some((offset, component))
    }
}

fn sampler_type_from_name(name: &str) -> Option<SamplerType> {
    match name {
        "SamplerState" => Some(SamplerType::Sampler),
        "SamplerComparisonState" => Some(SamplerType::SamplerComparison),
        _ => None,
    }
}

fn buffer_type_from_name(name: &str) -> Option<BufferType> {
    Some(match name {
        "Texture1D" => BufferType::Texture1D,
        "Texture1DArray" => BufferType::Texture1DArray,
        "Texture2D" => BufferType::Texture2D,
        "Texture2DArray" => BufferType::Texture2DArray,
        "Texture2DMS" => BufferType::Texture2DMS,
        "Texture3D" => BufferType::Texture3D,
        "TextureCube" => BufferType::TextureCube,
        "TextureCubeArray" => BufferType::TextureCubeArray,
        "RWTexture1D" => BufferType::RWTexture1D,
        "RWTexture2D" => BufferType::RWTexture2D,
        "RWTexture3D" => BufferType::RWTexture3D,
        "Buffer" => BufferType::Buffer,
        "RWBuffer" => BufferType::RWBuffer,
        "StructuredBuffer" => BufferType::StructuredBuffer,
        "RWStructuredBuffer" => BufferType::RWStructuredBuffer,
        "AppendStructuredBuffer" => BufferType::AppendStructuredBuffer,
        "ConsumeStructuredBuffer" => BufferType::ConsumeStructuredBuffer,
        "ByteAddressBuffer" => BufferType::ByteAddressBuffer,
        "RWByteAddressBuffer" => BufferType::RWByteAddressBuffer,
        "ConstantBuffer" => BufferType::ConstantBuffer,
        "InputPatch" => BufferType::InputPatch,
        "OutputPatch" => BufferType::OutputPatch,
        _ => return None,
    })
}
