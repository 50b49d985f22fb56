//! Shared middleware and the composition/entry files.

use super::source::ModelNames;
use super::EmitContext;
use crate::generator::naming;
use crate::generator::writer::CodeWriter;
use crate::ir::{AuthType, GeneratedFile};

fn error_classes(w: &mut CodeWriter, ctx: &EmitContext<'_>) {
    let lang = ctx.lang();
    let ts = lang.is_ts();

    w.block("export class HttpError extends Error {", "}", |w| {
        if ts {
            w.line("readonly status: number;");
            w.line("readonly code: string;");
            w.line("readonly details: unknown;");
            w.blank();
        }
        w.block(
            format!(
                "constructor(status{}, code{}, message{}, details{}) {{",
                lang.annot("number"),
                lang.annot("string"),
                lang.annot("string"),
                if ts { "?: unknown" } else { "" }
            ),
            "}",
            |w| {
                w.line("super(message);");
                w.line("this.name = new.target.name;");
                w.line("this.status = status;");
                w.line("this.code = code;");
                w.line("this.details = details;");
            },
        );
    });
    w.blank();

    w.block("export class ValidationError extends HttpError {", "}", |w| {
        w.block(format!("constructor(details{}) {{", lang.annot("unknown")), "}", |w| {
            w.line("super(400, 'validation_error', 'Request validation failed', details);");
        });
    });
    w.blank();
    w.block("export class UnauthorizedError extends HttpError {", "}", |w| {
        w.block("constructor(message = 'Authentication required') {", "}", |w| {
            w.line("super(401, 'unauthorized', message);");
        });
    });
    w.blank();
    w.block("export class ForbiddenError extends HttpError {", "}", |w| {
        w.block("constructor(message = 'Insufficient permissions') {", "}", |w| {
            w.line("super(403, 'forbidden', message);");
        });
    });
    w.blank();
    w.block("export class NotFoundError extends HttpError {", "}", |w| {
        w.block(
            format!(
                "constructor(resource{}, id{}) {{",
                lang.annot("string"),
                if ts { "?: string" } else { "" }
            ),
            "}",
            |w| {
                w.line("super(404, 'not_found', id ? `${resource} '${id}' not found` : `${resource} not found`);");
            },
        );
    });
    w.blank();
    w.block("export class ConflictError extends HttpError {", "}", |w| {
        w.block(format!("constructor(message{}) {{", lang.annot("string")), "}", |w| {
            w.line("super(409, 'conflict', message);");
        });
    });
}

pub fn error_handler_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let mut w = CodeWriter::new();

    if flavor.is_express() {
        if let Some(line) = lang.import_type("{ NextFunction, Request, Response }", "express") {
            w.line(line);
            w.blank();
        }
    } else if let Some(line) = lang.import_type("{ FastifyReply, FastifyRequest }", "fastify") {
        w.line(line);
        w.blank();
    }

    error_classes(&mut w, ctx);
    w.blank();

    if flavor.is_express() {
        w.block(
            format!(
                "export const errorHandler = (err{}, _req{}, res{}, _next{}) => {{",
                lang.annot("unknown"),
                lang.annot("Request"),
                lang.annot("Response"),
                lang.annot("NextFunction")
            ),
            "};",
            |w| {
                w.block("if (err instanceof HttpError) {", "}", |w| {
                    w.line("res.status(err.status).json({ error: { code: err.code, message: err.message, details: err.details } });");
                    w.line("return;");
                });
                w.block("if (err instanceof SyntaxError) {", "}", |w| {
                    w.line("res.status(400).json({ error: { code: 'bad_request', message: 'Malformed JSON body' } });");
                    w.line("return;");
                });
                w.line("console.error(err);");
                w.line("res.status(500).json({ error: { code: 'internal_error', message: 'Internal server error' } });");
            },
        );
    } else {
        w.block(
            format!(
                "export const errorHandler = (err{}, _request{}, reply{}) => {{",
                lang.annot("Error & { statusCode?: number }"),
                lang.annot("FastifyRequest"),
                lang.annot("FastifyReply")
            ),
            "};",
            |w| {
                w.block("if (err instanceof HttpError) {", "}", |w| {
                    w.line("return reply.code(err.status).send({ error: { code: err.code, message: err.message, details: err.details } });");
                });
                w.block("if (err.statusCode && err.statusCode < 500) {", "}", |w| {
                    w.line("return reply.code(err.statusCode).send({ error: { code: 'bad_request', message: err.message } });");
                });
                w.line("reply.log.error(err);");
                w.line("return reply.code(500).send({ error: { code: 'internal_error', message: 'Internal server error' } });");
            },
        );
    }
    w.finish()
}

pub fn validate_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let mut w = CodeWriter::new();

    if let Some(line) = flavor.type_import() {
        w.line(line);
    }
    if let Some(line) = lang.import_type("{ ZodTypeAny }", "zod") {
        w.line(line);
    }
    w.line(lang.import("{ ValidationError }", "./error-handler"));
    w.blank();
    w.line("/** Replace the request body with its parsed form or reject with field errors. */");
    if flavor.is_express() {
        w.block(
            format!(
                "export const validate = (schema{}) => (req{}, _res{}, next{}) => {{",
                lang.annot("ZodTypeAny"),
                lang.annot("Request"),
                lang.annot("Response"),
                lang.annot("NextFunction")
            ),
            "};",
            |w| {
                w.line("const result = schema.safeParse(req.body);");
                w.block("if (!result.success) {", "}", |w| {
                    w.line("return next(new ValidationError(result.error.flatten().fieldErrors));");
                });
                w.line("req.body = result.data;");
                w.line("return next();");
            },
        );
    } else {
        w.block(
            format!(
                "export const validate = (schema{}) => async (request{}, _reply{}) => {{",
                lang.annot("ZodTypeAny"),
                lang.annot("FastifyRequest"),
                lang.annot("FastifyReply")
            ),
            "};",
            |w| {
                w.line("const result = schema.safeParse(request.body);");
                w.block("if (!result.success) {", "}", |w| {
                    w.line("throw new ValidationError(result.error.flatten().fieldErrors);");
                });
                w.line("request.body = result.data;");
            },
        );
    }
    w.finish()
}

pub fn not_found_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let mut w = CodeWriter::new();
    if flavor.is_express() {
        if let Some(line) = lang.import_type("{ Request, Response }", "express") {
            w.line(line);
            w.blank();
        }
        w.block(
            format!(
                "export const notFound = (req{}, res{}) => {{",
                lang.annot("Request"),
                lang.annot("Response")
            ),
            "};",
            |w| {
                w.line("res.status(404).json({");
                w.indent();
                w.line("error: { code: 'not_found', message: `Route ${req.method} ${req.originalUrl} not found` },");
                w.dedent();
                w.line("});");
            },
        );
    } else {
        if let Some(line) = lang.import_type("{ FastifyReply, FastifyRequest }", "fastify") {
            w.line(line);
            w.blank();
        }
        w.block(
            format!(
                "export const notFound = (request{}, reply{}) => {{",
                lang.annot("FastifyRequest"),
                lang.annot("FastifyReply")
            ),
            "};",
            |w| {
                w.line("return reply.code(404).send({");
                w.indent();
                w.line("error: { code: 'not_found', message: `Route ${request.method} ${request.url} not found` },");
                w.dedent();
                w.line("});");
            },
        );
    }
    w.finish()
}

pub fn middleware_files(ctx: &EmitContext<'_>) -> Vec<GeneratedFile> {
    vec![
        ctx.source_file(ctx.src("middleware/error-handler"), error_handler_source(ctx)),
        ctx.source_file(ctx.src("middleware/validate"), validate_source(ctx)),
        ctx.source_file(ctx.src("middleware/not-found"), not_found_source(ctx)),
    ]
}

fn session_auth(ctx: &EmitContext<'_>) -> bool {
    ctx.auth_enabled() && ctx.options.auth_type == AuthType::Session
}

/// `src/app`: composes every router under `/api`.
pub fn app_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let mut w = CodeWriter::new();

    let mounts: Vec<(String, String, String)> = ctx
        .models
        .iter()
        .map(|model| {
            let names = ModelNames::of(model);
            (
                format!("{}Routes", names.camel),
                format!("./routes/{}.routes", names.stem),
                format!("/api{}", naming::resource_path(&model.name)),
            )
        })
        .collect();

    if flavor.is_express() {
        w.line(lang.import("express", "express"));
        w.line(lang.import("cors", "cors"));
        w.line(lang.import("helmet", "helmet"));
        if session_auth(ctx) {
            w.line(lang.import("session", "express-session"));
        }
    } else {
        w.line(lang.import("Fastify", "fastify"));
        w.line(lang.import("cors", "@fastify/cors"));
        if session_auth(ctx) {
            w.line(lang.import("cookie", "@fastify/cookie"));
            w.line(lang.import("session", "@fastify/session"));
        }
    }
    w.line(lang.import("{ config }", "./config/index"));
    if ctx.auth_enabled() {
        w.line(lang.import("authRoutes", "./auth/auth.routes"));
    }
    for (var, module, _) in &mounts {
        w.line(lang.import(var, module));
    }
    w.line(lang.import("{ errorHandler }", "./middleware/error-handler"));
    w.line(lang.import("{ notFound }", "./middleware/not-found"));
    w.blank();

    w.block("export function createApp() {", "}", |w| {
        if flavor.is_express() {
            w.line("const app = express();");
            w.blank();
            w.line("app.use(helmet());");
            w.line("app.use(cors({ origin: config.corsOrigin }));");
            w.line("app.use(express.json());");
            if session_auth(ctx) {
                w.line("app.use(");
                w.indent();
                w.block("session({", "}),", |w| {
                    w.line("name: config.sessionCookieName,");
                    w.line("secret: config.sessionSecret,");
                    w.line("resave: false,");
                    w.line("saveUninitialized: false,");
                    w.line("cookie: { httpOnly: true, sameSite: 'lax', secure: config.nodeEnv === 'production', maxAge: config.sessionMaxAge * 1000 },");
                });
                w.dedent();
                w.line(");");
            }
            w.blank();
            w.line("app.get('/health', (_req, res) => {");
            w.indent();
            w.line("res.json({ status: 'ok' });");
            w.dedent();
            w.line("});");
            if ctx.auth_enabled() {
                w.line("app.use('/api/auth', authRoutes);");
            }
            for (var, _, prefix) in &mounts {
                w.line(format!("app.use('{}', {});", prefix, var));
            }
            w.blank();
            w.line("app.use(notFound);");
            w.line("app.use(errorHandler);");
        } else {
            w.line("const app = Fastify({ logger: config.nodeEnv !== 'test' });");
            w.blank();
            w.line("app.register(cors, { origin: config.corsOrigin });");
            if session_auth(ctx) {
                w.line("app.register(cookie);");
                w.line("app.register(session, {");
                w.indent();
                w.line("cookieName: config.sessionCookieName,");
                w.line("secret: config.sessionSecret,");
                w.line("cookie: { httpOnly: true, sameSite: 'lax', secure: config.nodeEnv === 'production', maxAge: config.sessionMaxAge * 1000 },");
                w.dedent();
                w.line("});");
            }
            if ctx.auth_enabled() {
                w.line("app.decorateRequest('user', null);");
            }
            w.line("app.setErrorHandler(errorHandler);");
            w.line("app.setNotFoundHandler(notFound);");
            w.blank();
            w.line("app.get('/health', async () => ({ status: 'ok' }));");
            if ctx.auth_enabled() {
                w.line("app.register(authRoutes, { prefix: '/api/auth' });");
            }
            for (var, _, prefix) in &mounts {
                w.line(format!("app.register({}, {{ prefix: '{}' }});", var, prefix));
            }
        }
        w.blank();
        w.line("return app;");
    });
    w.finish()
}

pub fn server_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let mut w = CodeWriter::new();

    w.line(lang.import("{ createApp }", "./app"));
    w.line(lang.import("{ config }", "./config/index"));
    w.line(lang.import("{ connectDatabase, disconnectDatabase }", "./config/database"));
    w.blank();
    w.block("async function main() {", "}", |w| {
        w.line("await connectDatabase();");
        w.line("const app = createApp();");
        w.blank();
        if flavor.is_express() {
            w.line("const server = app.listen(config.port, () => {");
            w.indent();
            w.line("console.log(`Server listening on port ${config.port}`);");
            w.dedent();
            w.line("});");
            w.blank();
            w.block("const shutdown = async () => {", "};", |w| {
                w.line("server.close();");
                w.line("await disconnectDatabase();");
                w.line("process.exit(0);");
            });
        } else {
            w.line("await app.listen({ port: config.port, host: '0.0.0.0' });");
            w.blank();
            w.block("const shutdown = async () => {", "};", |w| {
                w.line("await app.close();");
                w.line("await disconnectDatabase();");
                w.line("process.exit(0);");
            });
        }
        w.line("process.on('SIGTERM', shutdown);");
        w.line("process.on('SIGINT', shutdown);");
    });
    w.blank();
    w.line("main().catch((err) => {");
    w.indent();
    w.line("console.error('Failed to start server', err);");
    w.line("process.exit(1);");
    w.dedent();
    w.line("});");
    w.finish()
}

pub fn entry_files(ctx: &EmitContext<'_>) -> Vec<GeneratedFile> {
    vec![
        ctx.source_file(ctx.src("app"), app_source(ctx)),
        ctx.source_file(ctx.src("server"), server_source(ctx)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AuthConfig, Field, FieldType, Framework, GenerationOptions, Model};

    fn render<T>(options: GenerationOptions, f: impl FnOnce(&EmitContext<'_>) -> T) -> T {
        let auth = AuthConfig::default();
        let models = [
            Model::new("Product").with_field(Field::new("name", FieldType::String)),
            Model::new("OrderItem").with_field(Field::new("quantity", FieldType::Integer)),
        ];
        let ctx = EmitContext {
            project_name: "shop",
            models: &models,
            auth: &auth,
            options: &options,
        };
        f(&ctx)
    }

    #[test]
    fn test_express_app_mounts_every_router() {
        let out = render(GenerationOptions::default(), app_source);
        assert!(out.contains("import authRoutes from './auth/auth.routes';"));
        assert!(out.contains("app.use('/api/auth', authRoutes);"));
        assert!(out.contains("app.use('/api/product', productRoutes);"));
        assert!(out.contains("app.use('/api/orderitem', orderItemRoutes);"));
        assert!(out.find("app.use(notFound);") < out.find("app.use(errorHandler);"));
    }

    #[test]
    fn test_fastify_app_registers_plugins() {
        let options = GenerationOptions {
            framework: Framework::Fastify,
            auth_type: AuthType::Session,
            ..GenerationOptions::default()
        };
        let out = render(options, app_source);
        assert!(out.contains("app.register(session, {"));
        assert!(out.contains("app.register(productRoutes, { prefix: '/api/product' });"));
        assert!(out.contains("app.setErrorHandler(errorHandler);"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let out = render(GenerationOptions::default(), error_handler_source);
        assert!(out.contains("export class NotFoundError extends HttpError {"));
        assert!(out.contains("error: { code: err.code, message: err.message, details: err.details }"));
    }

    #[test]
    fn test_middleware_paths() {
        let paths: Vec<String> = render(GenerationOptions::default(), |ctx| {
            middleware_files(ctx).into_iter().map(|f| f.path).collect()
        });
        assert_eq!(
            paths,
            vec![
                "src/middleware/error-handler.ts",
                "src/middleware/validate.ts",
                "src/middleware/not-found.ts"
            ]
        );
    }
}
