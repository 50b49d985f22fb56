//! Artifact emitters.
//!
//! Each emitter converts the IR into one category of output file. They share
//! an [`EmitContext`] and route every type decision through `type_map`.

pub mod auth;
pub mod middleware;
pub mod scaffold;
pub mod schema;
pub mod source;

use std::collections::HashSet;

use super::writer::{CodeWriter, Lang};
use crate::error::GenerationError;
use crate::ir::{
    ArtifactKind, AuthConfig, DatabaseKind, Framework, GeneratedFile, GenerationOptions, Model,
};

/// Everything an emitter may read. Emitters never see anything else.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub project_name: &'a str,
    pub models: &'a [Model],
    pub auth: &'a AuthConfig,
    pub options: &'a GenerationOptions,
}

impl<'a> EmitContext<'a> {
    pub fn lang(&self) -> Lang {
        Lang(self.options.language)
    }

    pub fn flavor(&self) -> Flavor {
        Flavor {
            framework: self.options.framework,
            lang: self.lang(),
        }
    }

    pub fn database(&self) -> DatabaseKind {
        self.options.database
    }

    pub fn auth_enabled(&self) -> bool {
        self.options.auth_type.is_enabled()
    }

    /// `src/<stem>.<ext>`
    pub fn src(&self, stem: &str) -> String {
        format!("src/{}", self.lang().file(stem))
    }

    pub fn source_file(&self, path: String, content: String) -> GeneratedFile {
        GeneratedFile::new(path, content, ArtifactKind::Source).with_language(self.options.language.as_str())
    }
}

/// Framework-specific handler shapes for emitted controllers and middleware.
#[derive(Debug, Clone, Copy)]
pub struct Flavor {
    pub framework: Framework,
    pub lang: Lang,
}

impl Flavor {
    pub fn is_express(&self) -> bool {
        matches!(self.framework, Framework::Express)
    }

    /// Name of the request binding inside handlers.
    pub fn req(&self) -> &'static str {
        if self.is_express() {
            "req"
        } else {
            "request"
        }
    }

    pub fn handler_params(&self) -> String {
        match (self.framework, self.lang.is_ts()) {
            (Framework::Express, true) => "req: Request, res: Response, next: NextFunction".to_string(),
            (Framework::Express, false) => "req, res, next".to_string(),
            (Framework::Fastify, true) => "request: FastifyRequest, reply: FastifyReply".to_string(),
            (Framework::Fastify, false) => "request, reply".to_string(),
        }
    }

    pub fn type_import(&self) -> Option<String> {
        match self.framework {
            Framework::Express => self.lang.import_type("{ NextFunction, Request, Response }", "express"),
            Framework::Fastify => self.lang.import_type("{ FastifyReply, FastifyRequest }", "fastify"),
        }
    }

    /// Arrow-function handler property; Express handlers forward errors to `next`.
    pub fn handler<F>(&self, w: &mut CodeWriter, name: &str, body: F)
    where
        F: FnOnce(&mut CodeWriter),
    {
        let open = format!("{} = async ({}) => {{", name, self.handler_params());
        if self.is_express() {
            w.block(open, "};", |w| {
                w.block("try {", "} catch (err) {", body);
                w.indent();
                w.line("next(err);");
                w.dedent();
                w.line("}");
            });
        } else {
            w.block(open, "};", body);
        }
    }

    pub fn body(&self, ty: &str) -> String {
        format!("{}.body{}", self.req(), self.lang.cast(ty))
    }

    pub fn param(&self, name: &str) -> String {
        if self.is_express() {
            format!("String(req.params.{})", name)
        } else if self.lang.is_ts() {
            format!("(request.params as Record<string, string>).{}", name)
        } else {
            format!("request.params.{}", name)
        }
    }

    pub fn query(&self, name: &str) -> String {
        if self.is_express() || !self.lang.is_ts() {
            format!("{}.query.{}", self.req(), name)
        } else {
            format!("(request.query as Record<string, string | undefined>).{}", name)
        }
    }

    pub fn send(&self, status: u16, expr: &str) -> String {
        if self.is_express() {
            format!("res.status({}).json({});", status, expr)
        } else {
            format!("return reply.code({}).send({});", status, expr)
        }
    }

    pub fn send_empty(&self, status: u16) -> String {
        if self.is_express() {
            format!("res.status({}).send();", status)
        } else {
            format!("return reply.code({}).send();", status)
        }
    }
}

/// Ordered file collection enforcing globally unique paths.
#[derive(Debug, Default)]
pub struct FileSet {
    files: Vec<GeneratedFile>,
    paths: HashSet<String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: GeneratedFile) -> Result<(), GenerationError> {
        if !self.paths.insert(file.path.clone()) {
            return Err(GenerationError::DuplicatePath(file.path));
        }
        self.files.push(file);
        Ok(())
    }

    pub fn extend<I>(&mut self, files: I) -> Result<(), GenerationError>
    where
        I: IntoIterator<Item = GeneratedFile>,
    {
        for file in files {
            self.push(file)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_vec(self) -> Vec<GeneratedFile> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Language;

    #[test]
    fn test_file_set_rejects_duplicates() {
        let mut set = FileSet::new();
        set.push(GeneratedFile::new("a.ts", "", ArtifactKind::Source)).unwrap();
        let err = set
            .push(GeneratedFile::new("a.ts", "x", ArtifactKind::Source))
            .unwrap_err();
        assert!(matches!(err, GenerationError::DuplicatePath(p) if p == "a.ts"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_express_handler_wraps_errors() {
        let flavor = Flavor {
            framework: Framework::Express,
            lang: Lang(Language::Typescript),
        };
        let mut w = CodeWriter::new();
        flavor.handler(&mut w, "get", |w| {
            w.line("res.json({});");
        });
        let out = w.finish();
        assert!(out.contains("get = async (req: Request, res: Response, next: NextFunction) => {"));
        assert!(out.contains("\n  } catch (err) {\n    next(err);\n  }\n};"));
    }

    #[test]
    fn test_fastify_flavor() {
        let flavor = Flavor {
            framework: Framework::Fastify,
            lang: Lang(Language::Javascript),
        };
        assert_eq!(flavor.send(201, "item"), "return reply.code(201).send(item);");
        assert_eq!(flavor.param("id"), "request.params.id");
        assert!(flavor.type_import().is_none());
    }
}
