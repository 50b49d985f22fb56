//! Auth bundle emitter.
//!
//! Nine fixed files under `src/auth/`, parameterized only by the role list
//! and the auth type. Account storage reuses the ordinary repository and
//! schema emitters through an internal `AuthUser` model.

use serde_json::json;

use super::schema::{mongoose_model, standalone_ddl};
use super::source::{self, entity_types, guard_chain, handler_name, pagination_type, route_line, RepositoryImports};
use super::EmitContext;
use crate::generator::endpoints::auth_endpoints;
use crate::generator::naming::js_string;
use crate::generator::writer::CodeWriter;
use crate::ir::{
    ArtifactKind, AuthConfig, AuthType, EndpointOperation, Field, FieldType, GeneratedFile, Model,
    ModelMetadata, ValidationRule,
};

/// The account model backing the auth bundle (`auth_users`).
pub fn auth_user_model(auth: &AuthConfig) -> Model {
    Model::new("AuthUser")
        .with_field(Field::new("email", FieldType::Email).required().unique())
        .with_field(Field::new("passwordHash", FieldType::String).required())
        .with_field(
            Field::new("name", FieldType::String)
                .with_rule(ValidationRule::MaxLength { value: 100, message: None }),
        )
        .with_field(
            Field::new("role", FieldType::String)
                .required()
                .with_default(json!(auth.default_role())),
        )
        .with_metadata(ModelMetadata {
            table_name: Some("auth_users".to_string()),
            requires_auth: false,
            ..ModelMetadata::default()
        })
}

fn role_names(auth: &AuthConfig) -> Vec<String> {
    let names = auth.role_names();
    if names.is_empty() {
        vec![auth.default_role()]
    } else {
        names
    }
}

fn uses_tokens(ctx: &EmitContext<'_>) -> bool {
    ctx.options.auth_type.uses_tokens()
}

fn auth_file(ctx: &EmitContext<'_>, stem: &str, content: String) -> GeneratedFile {
    ctx.source_file(ctx.src(&format!("auth/{}", stem)), content)
}

pub fn user_types_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let ts = lang.is_ts();
    let model = auth_user_model(ctx.auth);
    let roles = role_names(ctx.auth)
        .iter()
        .map(|r| js_string(r))
        .collect::<Vec<_>>()
        .join(", ");

    let mut w = CodeWriter::new();
    w.line("// Account types for the auth bundle");
    w.blank();
    pagination_type(&mut w, lang);
    entity_types(&mut w, lang, &model);
    w.blank();
    w.line(format!("export const ROLES = [{}]{};", roles, if ts { " as const" } else { "" }));
    if ts {
        w.line("export type Role = (typeof ROLES)[number];");
        w.line(format!("export const DEFAULT_ROLE: Role = {};", js_string(&ctx.auth.default_role())));
    } else {
        w.line(format!("export const DEFAULT_ROLE = {};", js_string(&ctx.auth.default_role())));
    }
    w.blank();

    if ts {
        w.line("export type PublicUser = Omit<AuthUser, 'passwordHash'>;");
        w.blank();
        w.block("export type AuthenticatedUser = {", "};", |w| {
            w.line("id: string;");
            w.line("role: string;");
            if uses_tokens(ctx) {
                w.line("tokenId?: string;");
            }
        });
        if uses_tokens(ctx) {
            w.blank();
            w.block("export type TokenPayload = {", "};", |w| {
                w.line("sub: string;");
                w.line("role: string;");
                w.line("type: 'access' | 'refresh';");
                w.line("jti: string;");
            });
            w.blank();
            w.block("export type AuthResult = {", "};", |w| {
                w.line("user: PublicUser;");
                w.line("accessToken: string;");
                w.line("refreshToken: string;");
            });
        }
        w.blank();
        if ctx.flavor().is_express() {
            w.block("declare global {", "}", |w| {
                w.block("namespace Express {", "}", |w| {
                    w.block("interface Request {", "}", |w| {
                        w.line("user?: AuthenticatedUser;");
                    });
                });
            });
            if ctx.options.auth_type == AuthType::Session {
                w.blank();
                w.block("declare module 'express-session' {", "}", |w| {
                    w.block("interface SessionData {", "}", |w| {
                        w.line("userId: string;");
                        w.line("role: string;");
                    });
                });
            }
        } else {
            w.block("declare module 'fastify' {", "}", |w| {
                w.block("interface FastifyRequest {", "}", |w| {
                    w.line("user: AuthenticatedUser | null;");
                });
                if ctx.options.auth_type == AuthType::Session {
                    w.block("interface Session {", "}", |w| {
                        w.line("userId?: string;");
                        w.line("role?: string;");
                    });
                }
            });
        }
    } else {
        w.line("/** @typedef {{ id: string, role: string, tokenId?: string }} AuthenticatedUser */");
    }
    w.finish()
}

pub fn service_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let tokens = uses_tokens(ctx);
    let public_result = if tokens { "AuthResult" } else { "PublicUser" };

    let mut w = CodeWriter::new();
    w.line(lang.import("bcrypt", "bcryptjs"));
    if tokens {
        w.line(lang.import("jwt", "jsonwebtoken"));
        w.line(lang.import("{ randomUUID }", "crypto"));
        w.line(lang.import("{ config }", "../config/index"));
    }
    w.line(lang.import(
        "{ ConflictError, NotFoundError, UnauthorizedError }",
        "../middleware/error-handler",
    ));
    w.line(lang.import("{ authUserRepository }", "./user.repository"));
    w.line(lang.import("{ DEFAULT_ROLE }", "./user.types"));
    let type_names = if tokens {
        "{ AuthResult, AuthUser, PublicUser, TokenPayload }"
    } else {
        "{ AuthUser, PublicUser }"
    };
    if let Some(line) = lang.import_type(type_names, "./user.types") {
        w.line(line);
    }
    w.blank();
    w.line("const SALT_ROUNDS = 12;");
    if tokens {
        w.line(format!("const revokedTokens = new Set{}();", lang.generic("string")));
    }
    w.blank();
    w.block(
        format!(
            "export function toPublicUser(user{}){} {{",
            lang.annot("AuthUser"),
            lang.annot("PublicUser")
        ),
        "}",
        |w| {
            w.line("const { passwordHash: _passwordHash, ...rest } = user;");
            w.line("return rest;");
        },
    );
    w.blank();

    w.block("export class AuthService {", "}", |w| {
        w.block(
            format!(
                "async register(input{}){} {{",
                lang.annot("{ email: string; password: string; name?: string }"),
                lang.annot(&format!("Promise<{}>", public_result))
            ),
            "}",
            |w| {
                w.line("const email = input.email.toLowerCase();");
                w.block("if (await authUserRepository.findByEmail(email)) {", "}", |w| {
                    w.line("throw new ConflictError('Email is already registered');");
                });
                w.line("const passwordHash = await bcrypt.hash(input.password, SALT_ROUNDS);");
                w.line("const user = await authUserRepository.create({ email, passwordHash, name: input.name ?? null, role: DEFAULT_ROLE });");
                if tokens {
                    w.line("return this.issueTokens(user);");
                } else {
                    w.line("return toPublicUser(user);");
                }
            },
        );
        w.blank();
        w.block(
            format!(
                "async login(email{}, password{}){} {{",
                lang.annot("string"),
                lang.annot("string"),
                lang.annot(&format!("Promise<{}>", public_result))
            ),
            "}",
            |w| {
                w.line("const user = await authUserRepository.findByEmail(email.toLowerCase());");
                w.block("if (!user || !(await bcrypt.compare(password, user.passwordHash))) {", "}", |w| {
                    w.line("throw new UnauthorizedError('Invalid email or password');");
                });
                if tokens {
                    w.line("return this.issueTokens(user);");
                } else {
                    w.line("return toPublicUser(user);");
                }
            },
        );
        w.blank();
        if tokens {
            w.block(
                format!(
                    "async refresh(refreshToken{}){} {{",
                    lang.annot("string"),
                    lang.annot("Promise<AuthResult>")
                ),
                "}",
                |w| {
                    w.line("const payload = this.verify(refreshToken, 'refresh');");
                    w.line("const user = await authUserRepository.findById(payload.sub);");
                    w.block("if (!user) {", "}", |w| {
                        w.line("throw new UnauthorizedError('Account no longer exists');");
                    });
                    w.line("revokedTokens.add(payload.jti);");
                    w.line("return this.issueTokens(user);");
                },
            );
            w.blank();
            w.block(format!("logout(tokenId{}) {{", lang.annot("string")), "}", |w| {
                w.line("revokedTokens.add(tokenId);");
            });
            w.blank();
        }
        w.block(
            format!(
                "async profile(userId{}){} {{",
                lang.annot("string"),
                lang.annot("Promise<PublicUser>")
            ),
            "}",
            |w| {
                w.line("const user = await authUserRepository.findById(userId);");
                w.block("if (!user) {", "}", |w| {
                    w.line("throw new NotFoundError('User', userId);");
                });
                w.line("return toPublicUser(user);");
            },
        );
        if tokens {
            w.blank();
            w.block(
                format!(
                    "verify(token{}, type{}){} {{",
                    lang.annot("string"),
                    lang.annot("TokenPayload['type']"),
                    lang.annot("TokenPayload")
                ),
                "}",
                |w| {
                    w.line(format!("let payload{};", lang.annot("TokenPayload")));
                    w.block("try {", "} catch {", |w| {
                        w.line(format!("payload = jwt.verify(token, config.jwtSecret){};", lang.cast("TokenPayload")));
                    });
                    w.indent();
                    w.line("throw new UnauthorizedError('Invalid or expired token');");
                    w.dedent();
                    w.line("}");
                    w.block("if (payload.type !== type || revokedTokens.has(payload.jti)) {", "}", |w| {
                        w.line("throw new UnauthorizedError('Invalid or expired token');");
                    });
                    w.line("return payload;");
                },
            );
            w.blank();
            w.block(
                format!(
                    "{}issueTokens(user{}){} {{",
                    if lang.is_ts() { "private " } else { "" },
                    lang.annot("AuthUser"),
                    lang.annot("AuthResult")
                ),
                "}",
                |w| {
                    w.line("const accessToken = jwt.sign({ sub: user.id, role: user.role, type: 'access' }, config.jwtSecret, {");
                    w.indent();
                    w.line(format!("expiresIn: config.jwtExpiresIn{},", lang.cast("jwt.SignOptions['expiresIn']")));
                    w.line("jwtid: randomUUID(),");
                    w.dedent();
                    w.line("});");
                    w.line("const refreshToken = jwt.sign({ sub: user.id, role: user.role, type: 'refresh' }, config.jwtSecret, {");
                    w.indent();
                    w.line(format!("expiresIn: config.refreshExpiresIn{},", lang.cast("jwt.SignOptions['expiresIn']")));
                    w.line("jwtid: randomUUID(),");
                    w.dedent();
                    w.line("});");
                    w.line("return { user: toPublicUser(user), accessToken, refreshToken };");
                },
            );
        }
    });
    w.blank();
    w.line("export const authService = new AuthService();");
    w.finish()
}

pub fn controller_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let tokens = uses_tokens(ctx);
    let req = flavor.req();

    let mut w = CodeWriter::new();
    if let Some(line) = flavor.type_import() {
        w.line(line);
    }
    w.line(lang.import("{ authService }", "./auth.service"));
    if !tokens {
        w.line(lang.import("{ UnauthorizedError }", "../middleware/error-handler"));
        if flavor.is_express() {
            w.line(lang.import("{ config }", "../config/index"));
        }
    }
    let body_types = if tokens {
        "{ LoginBody, RefreshBody, RegisterBody }"
    } else {
        "{ LoginBody, RegisterBody }"
    };
    if let Some(line) = lang.import_type(body_types, "./auth.validation") {
        w.line(line);
    }
    w.blank();

    let start_session = |w: &mut CodeWriter| {
        w.line(format!("{}.session.userId = user.id;", req));
        w.line(format!("{}.session.role = user.role;", req));
    };

    w.block("export class AuthController {", "}", |w| {
        flavor.handler(w, "register", |w| {
            if tokens {
                w.line(format!("const result = await authService.register({});", flavor.body("RegisterBody")));
                w.line(flavor.send(201, "result"));
            } else {
                w.line(format!("const user = await authService.register({});", flavor.body("RegisterBody")));
                start_session(w);
                w.line(flavor.send(201, "{ data: user }"));
            }
        });
        w.blank();
        flavor.handler(w, "login", |w| {
            w.line(format!("const {{ email, password }} = {};", flavor.body("LoginBody")));
            if tokens {
                w.line("const result = await authService.login(email, password);");
                w.line(flavor.send(200, "result"));
            } else {
                w.line("const user = await authService.login(email, password);");
                start_session(w);
                w.line(flavor.send(200, "{ data: user }"));
            }
        });
        w.blank();
        flavor.handler(w, "refresh", |w| {
            if tokens {
                w.line(format!("const {{ refreshToken }} = {};", flavor.body("RefreshBody")));
                w.line("const result = await authService.refresh(refreshToken);");
                w.line(flavor.send(200, "result"));
            } else {
                w.line(format!("const userId = {}.session.userId;", req));
                w.block("if (!userId) {", "}", |w| {
                    w.line("throw new UnauthorizedError('No active session');");
                });
                w.line(format!("{}.session.touch();", req));
                w.line("const user = await authService.profile(userId);");
                w.line(flavor.send(200, "{ data: user }"));
            }
        });
        w.blank();
        flavor.handler(w, "logout", |w| {
            if tokens {
                w.block(format!("if ({}.user?.tokenId) {{", req), "}", |w| {
                    w.line(format!("authService.logout({}.user.tokenId);", req));
                });
            } else if flavor.is_express() {
                w.line(format!(
                    "await new Promise{}((resolve, reject) => req.session.destroy((err) => (err ? reject(err) : resolve())));",
                    lang.generic("void")
                ));
                w.line("res.clearCookie(config.sessionCookieName);");
            } else {
                w.line("await request.session.destroy();");
            }
            w.line(flavor.send_empty(204));
        });
        w.blank();
        flavor.handler(w, "profile", |w| {
            w.line(format!("const user = await authService.profile({}.user?.id ?? '');", req));
            w.line(flavor.send(200, "{ data: user }"));
        });
    });
    w.blank();
    w.line("export const authController = new AuthController();");
    w.finish()
}

pub fn authenticate_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let tokens = uses_tokens(ctx);

    let mut w = CodeWriter::new();
    if let Some(line) = flavor.type_import() {
        w.line(line);
    }
    w.line(lang.import("{ UnauthorizedError }", "../middleware/error-handler"));
    if tokens {
        w.line(lang.import("{ authService }", "./auth.service"));
    }
    w.blank();

    if flavor.is_express() {
        w.block(
            format!(
                "export const authenticate = (req{}, _res{}, next{}) => {{",
                lang.annot("Request"),
                lang.annot("Response"),
                lang.annot("NextFunction")
            ),
            "};",
            |w| {
                if tokens {
                    w.line("const header = req.headers.authorization;");
                    w.block("if (!header?.startsWith('Bearer ')) {", "}", |w| {
                        w.line("return next(new UnauthorizedError());");
                    });
                    w.block("try {", "} catch (err) {", |w| {
                        w.line("const payload = authService.verify(header.slice('Bearer '.length), 'access');");
                        w.line("req.user = { id: payload.sub, role: payload.role, tokenId: payload.jti };");
                        w.line("return next();");
                    });
                    w.indent();
                    w.line("return next(err);");
                    w.dedent();
                    w.line("}");
                } else {
                    w.block("if (!req.session.userId || !req.session.role) {", "}", |w| {
                        w.line("return next(new UnauthorizedError());");
                    });
                    w.line("req.user = { id: req.session.userId, role: req.session.role };");
                    w.line("return next();");
                }
            },
        );
    } else {
        w.block(
            format!(
                "export const authenticate = async (request{}, _reply{}) => {{",
                lang.annot("FastifyRequest"),
                lang.annot("FastifyReply")
            ),
            "};",
            |w| {
                if tokens {
                    w.line("const header = request.headers.authorization;");
                    w.block("if (!header?.startsWith('Bearer ')) {", "}", |w| {
                        w.line("throw new UnauthorizedError();");
                    });
                    w.line("const payload = authService.verify(header.slice('Bearer '.length), 'access');");
                    w.line("request.user = { id: payload.sub, role: payload.role, tokenId: payload.jti };");
                } else {
                    w.block("if (!request.session.userId || !request.session.role) {", "}", |w| {
                        w.line("throw new UnauthorizedError();");
                    });
                    w.line("request.user = { id: request.session.userId, role: request.session.role };");
                }
            },
        );
    }
    w.finish()
}

pub fn authorize_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();

    let mut w = CodeWriter::new();
    if let Some(line) = flavor.type_import() {
        w.line(line);
    }
    w.line(lang.import("{ ForbiddenError, UnauthorizedError }", "../middleware/error-handler"));
    w.blank();
    w.block(
        format!("export const ROLE_PERMISSIONS{} = {{", lang.annot("Record<string, readonly string[]>")),
        "};",
        |w| {
            for role in &ctx.auth.roles {
                let permissions = role
                    .permissions
                    .iter()
                    .map(|p| js_string(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                w.line(format!("{}: [{}],", js_string(&role.name), permissions));
            }
        },
    );
    w.blank();
    w.block(
        format!(
            "export function hasPermission(role{}, permission{}){} {{",
            lang.annot("string"),
            lang.annot("string"),
            lang.annot("boolean")
        ),
        "}",
        |w| {
            w.line("return (ROLE_PERMISSIONS[role] ?? []).includes(permission);");
        },
    );
    w.blank();
    w.line("/** Allow the request only when the authenticated user holds one of `roles`. */");
    if flavor.is_express() {
        w.block(
            format!(
                "export const authorize = (roles{}) => (req{}, _res{}, next{}) => {{",
                lang.annot("readonly string[]"),
                lang.annot("Request"),
                lang.annot("Response"),
                lang.annot("NextFunction")
            ),
            "};",
            |w| {
                w.block("if (!req.user) {", "}", |w| {
                    w.line("return next(new UnauthorizedError());");
                });
                w.block("if (roles.length > 0 && !roles.includes(req.user.role)) {", "}", |w| {
                    w.line("return next(new ForbiddenError(`Requires one of: ${roles.join(', ')}`));");
                });
                w.line("return next();");
            },
        );
    } else {
        w.block(
            format!(
                "export const authorize = (roles{}) => async (request{}, _reply{}) => {{",
                lang.annot("readonly string[]"),
                lang.annot("FastifyRequest"),
                lang.annot("FastifyReply")
            ),
            "};",
            |w| {
                w.block("if (!request.user) {", "}", |w| {
                    w.line("throw new UnauthorizedError();");
                });
                w.block("if (roles.length > 0 && !roles.includes(request.user.role)) {", "}", |w| {
                    w.line("throw new ForbiddenError(`Requires one of: ${roles.join(', ')}`);");
                });
            },
        );
    }
    w.finish()
}

pub fn routes_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let tokens = uses_tokens(ctx);

    let mut w = CodeWriter::new();
    if flavor.is_express() {
        w.line(lang.import("{ Router }", "express"));
    } else if let Some(line) = lang.import_type("{ FastifyInstance }", "fastify") {
        w.line(line);
    }
    w.line(lang.import("{ validate }", "../middleware/validate"));
    w.line(lang.import("{ authController }", "./auth.controller"));
    w.line(lang.import("{ authenticate }", "./authenticate.middleware"));
    let schemas = if tokens {
        "{ loginSchema, refreshSchema, registerSchema }"
    } else {
        "{ loginSchema, registerSchema }"
    };
    w.line(lang.import(schemas, "./auth.validation"));
    w.blank();

    let registrations: Vec<String> = auth_endpoints()
        .iter()
        .map(|endpoint| {
            let schema = match endpoint.operation {
                EndpointOperation::Register => Some("registerSchema"),
                EndpointOperation::Login => Some("loginSchema"),
                EndpointOperation::Refresh if tokens => Some("refreshSchema"),
                _ => None,
            };
            let chain = guard_chain(endpoint, true, schema);
            let handler = format!("authController.{}", handler_name(endpoint.operation));
            route_line(flavor, endpoint, endpoint.local_path(), &chain, &handler)
        })
        .collect();

    if flavor.is_express() {
        w.line("const router = Router();");
        w.blank();
        w.lines(&registrations);
        w.blank();
        w.line("export default router;");
    } else {
        w.block(
            format!("export default async function authRoutes(app{}) {{", lang.annot("FastifyInstance")),
            "}",
            |w| {
                w.lines(&registrations);
            },
        );
    }
    w.finish()
}

pub fn validation_source(ctx: &EmitContext<'_>) -> String {
    let lang = ctx.lang();
    let tokens = uses_tokens(ctx);

    let mut w = CodeWriter::new();
    w.line(lang.import("{ z }", "zod"));
    w.blank();
    w.block("export const registerSchema = z.object({", "});", |w| {
        w.line("email: z.string().email(),");
        w.line("password: z.string().min(8, 'Password must be at least 8 characters').max(128),");
        w.line("name: z.string().min(1).max(100).optional(),");
    });
    w.blank();
    w.block("export const loginSchema = z.object({", "});", |w| {
        w.line("email: z.string().email(),");
        w.line("password: z.string().min(1),");
    });
    if tokens {
        w.blank();
        w.block("export const refreshSchema = z.object({", "});", |w| {
            w.line("refreshToken: z.string().min(1),");
        });
    }
    if lang.is_ts() {
        w.blank();
        w.line("export type RegisterBody = z.infer<typeof registerSchema>;");
        w.line("export type LoginBody = z.infer<typeof loginSchema>;");
        if tokens {
            w.line("export type RefreshBody = z.infer<typeof refreshSchema>;");
        }
    }
    w.finish()
}

fn user_schema_file(ctx: &EmitContext<'_>) -> GeneratedFile {
    let model = auth_user_model(ctx.auth);
    match ctx.database().dialect() {
        Some(dialect) => GeneratedFile::new("src/auth/user.schema.sql", standalone_ddl(&model, dialect), ArtifactKind::Schema)
            .with_language("sql"),
        None => {
            let content = if ctx.database() == crate::ir::DatabaseKind::Mongodb {
                mongoose_model(ctx, &model)
            } else {
                let mut w = CodeWriter::new();
                w.line(ctx.lang().import("{ AUTH_USER_FIELDS }", "./user.types"));
                w.blank();
                w.line("// Accounts live in the in-memory repository; this describes their shape.");
                w.line("export const authUserSchema = { collection: 'auth_users', fields: AUTH_USER_FIELDS };");
                w.finish()
            };
            GeneratedFile::new(ctx.src("auth/user.schema"), content, ArtifactKind::Schema)
                .with_language(ctx.options.language.as_str())
        }
    }
}

/// The nine auth files, in a fixed order.
pub fn auth_bundle(ctx: &EmitContext<'_>) -> Vec<GeneratedFile> {
    let model = auth_user_model(ctx.auth);
    let repository = source::repository_source(
        ctx,
        &model,
        RepositoryImports {
            types: "./user.types",
            mongoose: "./user.schema",
        },
    );

    vec![
        auth_file(ctx, "user.types", user_types_source(ctx)),
        auth_file(ctx, "auth.service", service_source(ctx)),
        auth_file(ctx, "auth.controller", controller_source(ctx)),
        auth_file(ctx, "authenticate.middleware", authenticate_source(ctx)),
        auth_file(ctx, "authorize.middleware", authorize_source(ctx)),
        auth_file(ctx, "auth.routes", routes_source(ctx)),
        auth_file(ctx, "user.repository", repository),
        auth_file(ctx, "auth.validation", validation_source(ctx)),
        user_schema_file(ctx),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DatabaseKind, Framework, GenerationOptions, Language, Role};

    fn bundle(options: GenerationOptions, auth: AuthConfig) -> Vec<GeneratedFile> {
        let models: [Model; 0] = [];
        let ctx = EmitContext {
            project_name: "demo",
            models: &models,
            auth: &auth,
            options: &options,
        };
        auth_bundle(&ctx)
    }

    fn content<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
        &files.iter().find(|f| f.path == path).unwrap().content
    }

    #[test]
    fn test_bundle_has_nine_files() {
        let files = bundle(GenerationOptions::default(), AuthConfig::default());
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "src/auth/user.types.ts",
                "src/auth/auth.service.ts",
                "src/auth/auth.controller.ts",
                "src/auth/authenticate.middleware.ts",
                "src/auth/authorize.middleware.ts",
                "src/auth/auth.routes.ts",
                "src/auth/user.repository.ts",
                "src/auth/auth.validation.ts",
                "src/auth/user.schema.sql",
            ]
        );
    }

    #[test]
    fn test_roles_drive_types_and_permissions() {
        let auth = AuthConfig {
            roles: vec![Role::new("admin", &["delete"]), Role::new("editor", &["update"])],
            ..AuthConfig::default()
        };
        let files = bundle(GenerationOptions::default(), auth);
        let types = content(&files, "src/auth/user.types.ts");
        assert!(types.contains("export const ROLES = ['admin', 'editor'] as const;"));
        assert!(types.contains("export const DEFAULT_ROLE: Role = 'editor';"));
        let authorize = content(&files, "src/auth/authorize.middleware.ts");
        assert!(authorize.contains("'editor': ['update'],"));
    }

    #[test]
    fn test_routes_protect_logout_and_profile() {
        let files = bundle(GenerationOptions::default(), AuthConfig::default());
        let routes = content(&files, "src/auth/auth.routes.ts");
        assert!(routes.contains("router.post('/register', validate(registerSchema), authController.register);"));
        assert!(routes.contains("router.post('/logout', authenticate, authController.logout);"));
        assert!(routes.contains("router.get('/profile', authenticate, authController.profile);"));
    }

    #[test]
    fn test_session_auth_has_no_tokens() {
        let options = GenerationOptions {
            auth_type: AuthType::Session,
            ..GenerationOptions::default()
        };
        let files = bundle(options, AuthConfig::default());
        let service = content(&files, "src/auth/auth.service.ts");
        assert!(!service.contains("jsonwebtoken"));
        let controller = content(&files, "src/auth/auth.controller.ts");
        assert!(controller.contains("req.session.userId = user.id;"));
        let routes = content(&files, "src/auth/auth.routes.ts");
        assert!(!routes.contains("refreshSchema"));
    }

    #[test]
    fn test_user_repository_and_schema_reuse_emitters() {
        let files = bundle(GenerationOptions::default(), AuthConfig::default());
        let repository = content(&files, "src/auth/user.repository.ts");
        assert!(repository.contains("const TABLE = 'auth_users';"));
        assert!(repository.contains("async findByEmail(value: string)"));
        assert!(repository.contains("export const authUserRepository = new AuthUserRepository();"));
        let schema = content(&files, "src/auth/user.schema.sql");
        assert!(schema.contains("email VARCHAR(255) NOT NULL UNIQUE"));
        assert!(schema.contains("role VARCHAR(255) NOT NULL DEFAULT 'user'"));
    }

    #[test]
    fn test_fastify_mongo_javascript_bundle() {
        let options = GenerationOptions {
            framework: Framework::Fastify,
            database: DatabaseKind::Mongodb,
            language: Language::Javascript,
            ..GenerationOptions::default()
        };
        let files = bundle(options, AuthConfig::default());
        let schema = content(&files, "src/auth/user.schema.js");
        assert!(schema.contains("export const AuthUserModel = mongoose.model('AuthUser', authUserSchema);"));
        let authenticate = content(&files, "src/auth/authenticate.middleware.js");
        assert!(authenticate.contains("export const authenticate = async (request, _reply) => {"));
        assert!(authenticate.contains("import { UnauthorizedError } from '../middleware/error-handler.js';"));
    }
}
