//! Indentation-aware text emission.

use crate::ir::Language;

const INDENT: &str = "  ";

#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    level: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.buf.push('\n');
            return self;
        }
        for _ in 0..self.level {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    /// Emit several lines at the current indentation.
    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        if !self.buf.is_empty() && !self.buf.ends_with("\n\n") {
            self.buf.push('\n');
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// `open` line, indented body, `close` line.
    pub fn block<F>(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: F) -> &mut Self
    where
        F: FnOnce(&mut CodeWriter),
    {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close);
        self
    }

    pub fn finish(self) -> String {
        let mut out = self.buf;
        while out.ends_with("\n\n") {
            out.pop();
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Language-specific rendering for emitted JavaScript/TypeScript.
#[derive(Debug, Clone, Copy)]
pub struct Lang(pub Language);

impl Lang {
    pub fn ext(&self) -> &'static str {
        self.0.ext()
    }

    pub fn is_ts(&self) -> bool {
        self.0.is_typescript()
    }

    /// `": T"` in TypeScript, nothing in JavaScript.
    pub fn annot(&self, ty: &str) -> String {
        if self.is_ts() {
            format!(": {}", ty)
        } else {
            String::new()
        }
    }

    /// `"<T>"` generic arguments in TypeScript only.
    pub fn generic(&self, ty: &str) -> String {
        if self.is_ts() {
            format!("<{}>", ty)
        } else {
            String::new()
        }
    }

    /// `" as T"` cast in TypeScript only.
    pub fn cast(&self, ty: &str) -> String {
        if self.is_ts() {
            format!(" as {}", ty)
        } else {
            String::new()
        }
    }

    /// Relative module specifier. ESM JavaScript needs the explicit extension.
    pub fn module(&self, path: &str) -> String {
        if self.is_ts() || !path.starts_with('.') {
            path.to_string()
        } else {
            format!("{}.js", path)
        }
    }

    pub fn import(&self, names: &str, from: &str) -> String {
        format!("import {} from '{}';", names, self.module(from))
    }

    /// Type-only import; omitted in JavaScript.
    pub fn import_type(&self, names: &str, from: &str) -> Option<String> {
        if self.is_ts() {
            Some(format!("import type {} from '{}';", names, self.module(from)))
        } else {
            None
        }
    }

    pub fn file(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.ext())
    }
}
