//! Constant-expression evaluator for `#if`/`#elif` conditions (spec §4.1).
//! Supports integer arithmetic, bitwise ops, comparisons, logical ops, and
//! the `defined(X)` operator, evaluated over an already macro-expanded
//! token-string (the caller expands `defined(X)` uses before feeding tokens
//! here is one valid strategy; this evaluator instead recognizes `defined`
//! directly so it can see identifiers that would otherwise macro-expand away).
use crate::preprocessor::macro_def::MacroTable;

pub struct CondEval<'a> {
    tokens: &'a [String],
    pos: usize,
    macros: &'a MacroTable,
}

impl<'a> CondEval<'a> {
    pub fn new(tokens: &'a [String], macros: &'a MacroTable) -> Self {
        Self { tokens, pos: 0, macros }
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn bump(&mut self) -> Option<&str> {
        let t = self.tokens.get(self.pos).map(|s| s.as_str());
        self.pos += 1;
        t
    }

    pub fn eval(&mut self) -> Result<i64, String> {
        let v = self.parse_logical_or()?;
        if self.pos < self.tokens.len() {
            return Err(format!("unexpected token '{}' in #if expression", self.tokens[self.pos]));
        }
        Ok(v)
    }

    fn parse_logical_or(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_logical_and()?;
        while self.peek() == Some("||") {
            self.bump();
            let rhs = self.parse_logical_and()?;
            lhs = ((lhs != 0) || (rhs != 0)) as i64;
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_bit_or()?;
        while self.peek() == Some("&&") {
            self.bump();
            let rhs = self.parse_bit_or()?;
            lhs = ((lhs != 0) && (rhs != 0)) as i64;
        }
        Ok(lhs)
    }

    fn parse_bit_or(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_bit_xor()?;
        while self.peek() == Some("|") {
            self.bump();
            lhs |= self.parse_bit_xor()?;
        }
        Ok(lhs)
    }

    fn parse_bit_xor(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_bit_and()?;
        while self.peek() == Some("^") {
            self.bump();
            lhs ^= self.parse_bit_and()?;
        }
        Ok(lhs)
    }

    fn parse_bit_and(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_equality()?;
        while self.peek() == Some("&") {
            self.bump();
            lhs &= self.parse_equality()?;
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_relational()?;
        loop {
            match self.peek() {
                Some("==") => { self.bump(); lhs = (lhs == self.parse_relational()?) as i64; }
                Some("!=") => { self.bump(); lhs = (lhs != self.parse_relational()?) as i64; }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_shift()?;
        loop {
            match self.peek() {
                Some("<") => { self.bump(); lhs = (lhs < self.parse_shift()?) as i64; }
                Some("<=") => { self.bump(); lhs = (lhs <= self.parse_shift()?) as i64; }
                Some(">") => { self.bump(); lhs = (lhs > self.parse_shift()?) as i64; }
                Some(">=") => { self.bump(); lhs = (lhs >= self.parse_shift()?) as i64; }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_additive()?;
        loop {
            match self.peek() {
                Some("<<") => { self.bump(); lhs <<= self.parse_additive()?; }
                Some(">>") => { self.bump(); lhs >>= self.parse_additive()?; }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            match self.peek() {
                Some("+") => { self.bump(); lhs += self.parse_multiplicative()?; }
                Some("-") => { self.bump(); lhs -= self.parse_multiplicative()?; }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some("*") => { self.bump(); lhs *= self.parse_unary()?; }
                Some("/") => {
                    self.bump();
                    let rhs = self.parse_unary()?;
                    if rhs == 0 { return Err("division by zero in #if expression".into()); }
                    lhs /= rhs;
                }
                Some("%") => {
                    self.bump();
                    let rhs = self.parse_unary()?;
                    if rhs == 0 { return Err("division by zero in #if expression".into()); }
                    lhs %= rhs;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<i64, String> {
        match self.peek() {
            Some("!") => { self.bump(); Ok((self.parse_unary()? == 0) as i64) }
            Some("~") => { self.bump(); Ok(!self.parse_unary()?) }
            Some("-") => { self.bump(); Ok(-self.parse_unary()?) }
            Some("+") => { self.bump(); self.parse_unary() }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<i64, String> {
        match self.bump() {
            Some("(") => {
                let v = self.parse_logical_or()?;
                match self.bump() {
                    Some(")") => Ok(v),
                    _ => Err("expected ')' in #if expression".into()),
                }
            }
            Some("defined") => {
                let parenthesized = self.peek() == Some("(");
                if parenthesized {
                    self.bump();
                }
                let name = self.bump().ok_or_else(|| "expected identifier after 'defined'".to_string())?;
                if parenthesized {
                    match self.bump() {
                        Some(")") => {}
                        _ => return Err("expected ')' after defined(...)".into()),
                    }
                }
                Ok(self.macros.is_defined(name) as i64)
            }
            Some(tok) => parse_int_literal(tok).ok_or_else(|| format!("unexpected token '{}' in #if expression", tok)),
            None => Err("unexpected end of #if expression".into()),
        }
    }
}

fn parse_int_literal(tok: &str) -> Option<i64> {
    let trimmed = tok.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        trimmed.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::macro_def::MacroTable;
    use crate::preprocessor::tokenize_line;

    fn eval(expr: &str, macros: &MacroTable) -> i64 {
        let tokens = tokenize_line(expr);
        CondEval::new(&tokens, macros).eval().unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        let macros = MacroTable::with_standard_macros("SHADER_MODEL_5");
        assert_eq!(eval("1 + 2 * 3", &macros), 7);
        assert_eq!(eval("(1 + 2) * 3", &macros), 9);
    }

    #[test]
    fn bitwise_and_comparison() {
        let macros = MacroTable::with_standard_macros("SHADER_MODEL_5");
        assert_eq!(eval("1 << 3", &macros), 8);
        assert_eq!(eval("5 & 3", &macros), 1);
        assert_eq!(eval("5 > 3", &macros), 1);
        assert_eq!(eval("5 > 3 && 2 < 1", &macros), 0);
    }

    #[test]
    fn defined_operator_sees_standard_and_user_macros() {
        let macros = MacroTable::with_standard_macros("SHADER_MODEL_5");
        assert_eq!(eval("defined(SHADER_MODEL_5)", &macros), 1);
        assert_eq!(eval("defined(NOT_DEFINED)", &macros), 0);
        assert_eq!(eval("defined SHADER_MODEL_5", &macros), 1);
    }

    #[test]
    fn hex_literal() {
        let macros = MacroTable::with_standard_macros("SHADER_MODEL_5");
        assert_eq!(eval("0x10", &macros), 16);
    }
}
