//! Per-model source emitter: types, repository, service, controller,
//! routes, validation and tests.
//!
//! Every file that enumerates a model's fields walks `model.fields`
//! directly, so the files stay consistent with each other by construction.

use serde_json::{Map, Value};

use super::schema::ident;
use super::{EmitContext, Flavor};
use crate::generator::endpoints::CrudEndpoints;
use crate::generator::naming::{self, column_name, js_string, table_name};
use crate::generator::type_map::{self, js_literal, ts_type, zod_base};
use crate::generator::writer::{CodeWriter, Lang};
use crate::ir::{
    ArtifactKind, DatabaseKind, Endpoint, EndpointOperation, Field, GeneratedFile, Model, SqlDialect,
    ValidationRule,
};

/// Identifiers derived from a model name, shared by every per-model file.
#[derive(Debug, Clone)]
pub struct ModelNames {
    pub pascal: String,
    pub camel: String,
    pub stem: String,
    pub constant: String,
}

impl ModelNames {
    pub fn of(model: &Model) -> Self {
        Self {
            pascal: naming::pascal(&model.name),
            camel: naming::camel(&model.name),
            stem: naming::file_stem(&model.name),
            constant: naming::snake(&model.name).to_uppercase(),
        }
    }

    pub fn create_input(&self) -> String {
        format!("Create{}Input", self.pascal)
    }

    pub fn update_input(&self) -> String {
        format!("Update{}Input", self.pascal)
    }

    pub fn list_response(&self) -> String {
        format!("{}ListResponse", self.pascal)
    }

    pub fn fields_const(&self) -> String {
        format!("{}_FIELDS", self.constant)
    }

    pub fn repository(&self) -> String {
        format!("{}Repository", self.camel)
    }

    pub fn service(&self) -> String {
        format!("{}Service", self.camel)
    }

    pub fn controller(&self) -> String {
        format!("{}Controller", self.camel)
    }
}

/// Controller method bound to each CRUD operation.
pub fn handler_name(operation: EndpointOperation) -> &'static str {
    match operation {
        EndpointOperation::List => "list",
        EndpointOperation::Read => "get",
        EndpointOperation::Create => "create",
        EndpointOperation::Update => "update",
        EndpointOperation::Delete => "remove",
        EndpointOperation::Register => "register",
        EndpointOperation::Login => "login",
        EndpointOperation::Refresh => "refresh",
        EndpointOperation::Logout => "logout",
        EndpointOperation::Profile => "profile",
    }
}

fn find_by_name(field: &Field) -> String {
    format!("findBy{}", naming::pascal(&field.name))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn stored_type(field: &Field) -> String {
    if field.required {
        ts_type(field.field_type).to_string()
    } else {
        format!("{} | null", ts_type(field.field_type))
    }
}

/// Entity, input and list-response types for `model`, plus its field list.
pub fn entity_types(w: &mut CodeWriter, lang: Lang, model: &Model) {
    let names = ModelNames::of(model);

    if lang.is_ts() {
        w.block(format!("export type {} = {{", names.pascal), "};", |w| {
            w.line("id: string;");
            for field in &model.fields {
                w.line(format!("{}: {};", field.name, stored_type(field)));
            }
            if model.metadata.timestamps {
                w.line("createdAt: Date;");
                w.line("updatedAt: Date;");
            }
            if model.metadata.soft_delete {
                w.line("deletedAt?: Date | null;");
            }
        });
        w.blank();
        w.block(format!("export type {} = {{", names.create_input()), "};", |w| {
            for field in &model.fields {
                let optional = !field.required || field.default_value.is_some();
                w.line(format!(
                    "{}{}: {};",
                    field.name,
                    if optional { "?" } else { "" },
                    stored_type(field)
                ));
            }
        });
        w.blank();
        w.line(format!(
            "export type {} = Partial<{}>;",
            names.update_input(),
            names.create_input()
        ));
        w.blank();
        w.block(format!("export type {} = {{", names.list_response()), "};", |w| {
            w.line(format!("data: {}[];", names.pascal));
            w.line("pagination: Pagination;");
        });
    } else {
        w.line("/**");
        w.line(format!(" * @typedef {{Object}} {}", names.pascal));
        w.line(" * @property {string} id");
        for field in &model.fields {
            let ty = stored_type(field);
            if field.required {
                w.line(format!(" * @property {{{}}} {}", ty, field.name));
            } else {
                w.line(format!(" * @property {{{}}} [{}]", ty, field.name));
            }
        }
        if model.metadata.timestamps {
            w.line(" * @property {Date} createdAt");
            w.line(" * @property {Date} updatedAt");
        }
        if model.metadata.soft_delete {
            w.line(" * @property {Date | null} [deletedAt]");
        }
        w.line(" */");
    }
    w.blank();

    let names_list = model
        .fields
        .iter()
        .map(|f| js_string(&f.name))
        .collect::<Vec<_>>()
        .join(", ");
    w.line(format!(
        "export const {} = [{}]{};",
        names.fields_const(),
        names_list,
        if lang.is_ts() { " as const" } else { "" }
    ));
}

pub fn pagination_type(w: &mut CodeWriter, lang: Lang) {
    if lang.is_ts() {
        w.block("export type Pagination = {", "};", |w| {
            w.line("page: number;");
            w.line("limit: number;");
            w.line("total: number;");
            w.line("totalPages: number;");
        });
    } else {
        w.line("/**");
        w.line(" * @typedef {Object} Pagination");
        w.line(" * @property {number} page");
        w.line(" * @property {number} limit");
        w.line(" * @property {number} total");
        w.line(" * @property {number} totalPages");
        w.line(" */");
    }
    w.blank();
}

pub fn types_source(ctx: &EmitContext<'_>, model: &Model) -> String {
    let mut w = CodeWriter::new();
    w.line(format!("// {} types", model.name));
    w.blank();
    pagination_type(&mut w, ctx.lang());
    entity_types(&mut w, ctx.lang(), model);
    w.finish()
}

pub fn types_file(ctx: &EmitContext<'_>, model: &Model) -> GeneratedFile {
    let names = ModelNames::of(model);
    ctx.source_file(ctx.src(&format!("types/{}", names.stem)), types_source(ctx, model))
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Module specifiers a repository imports, relative to its own directory.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryImports<'a> {
    pub types: &'a str,
    pub mongoose: &'a str,
}

pub fn repository_source(ctx: &EmitContext<'_>, model: &Model, imports: RepositoryImports<'_>) -> String {
    let lang = ctx.lang();
    let names = ModelNames::of(model);
    let mut w = CodeWriter::new();

    match ctx.database() {
        DatabaseKind::Postgresql | DatabaseKind::Mysql => {
            let dialect = ctx.database().dialect().unwrap_or(SqlDialect::Postgres);
            relational_repository(&mut w, lang, model, &names, dialect, imports);
        }
        DatabaseKind::Mongodb => mongo_repository(&mut w, lang, model, &names, imports),
        DatabaseKind::Memory => memory_repository(&mut w, lang, model, &names, imports),
    }

    w.blank();
    w.line(format!(
        "export const {} = new {}Repository();",
        names.repository(),
        names.pascal
    ));
    w.finish()
}

fn entity_type_import(w: &mut CodeWriter, lang: Lang, names: &ModelNames, from: &str) {
    if let Some(line) = lang.import_type(
        &format!(
            "{{ {}, {}, {} }}",
            names.create_input(),
            names.pascal,
            names.update_input()
        ),
        from,
    ) {
        w.line(line);
    }
}

fn relational_repository(
    w: &mut CodeWriter,
    lang: Lang,
    model: &Model,
    names: &ModelNames,
    dialect: SqlDialect,
    imports: RepositoryImports<'_>,
) {
    let ty = &names.pascal;
    let alias = |column: &str, field: &str| -> String {
        if column == field {
            ident(column, dialect)
        } else {
            match dialect {
                SqlDialect::Postgres => format!("{} AS \"{}\"", ident(column, dialect), field),
                SqlDialect::Mysql => format!("{} AS {}", ident(column, dialect), field),
            }
        }
    };

    let mut select = vec!["id".to_string()];
    for field in &model.fields {
        select.push(alias(&column_name(&field.name), &field.name));
    }
    if model.metadata.timestamps {
        select.push(alias("created_at", "createdAt"));
        select.push(alias("updated_at", "updatedAt"));
    }
    if model.metadata.soft_delete {
        select.push(alias("deleted_at", "deletedAt"));
    }

    let scope = if model.metadata.soft_delete {
        " AND deleted_at IS NULL"
    } else {
        ""
    };
    let where_scope = if model.metadata.soft_delete {
        " WHERE deleted_at IS NULL"
    } else {
        ""
    };
    let order = if model.metadata.timestamps { "created_at DESC" } else { "id" };
    let now = match dialect {
        SqlDialect::Postgres => "NOW()",
        SqlDialect::Mysql => "CURRENT_TIMESTAMP(3)",
    };

    w.line(lang.import("{ randomUUID }", "crypto"));
    w.line(lang.import("{ execute, query }", "../config/database"));
    entity_type_import(w, lang, names, imports.types);
    w.blank();
    w.line(format!(
        "const TABLE = {};",
        js_string(&ident(&table_name(model), dialect))
    ));
    w.line(format!("const SELECT_COLUMNS = {};", js_string(&select.join(", "))));
    w.block(
        format!("const COLUMN_MAP{} = {{", lang.annot("Record<string, string>")),
        "};",
        |w| {
            for field in &model.fields {
                w.line(format!(
                    "{}: {},",
                    field.name,
                    js_string(&ident(&column_name(&field.name), dialect))
                ));
            }
        },
    );
    w.blank();
    match dialect {
        SqlDialect::Postgres => w.line(format!(
            "const placeholder = (index{}) => `$${{index}}`;",
            lang.annot("number")
        )),
        SqlDialect::Mysql => w.line(format!(
            "const placeholder = (_index{}) => '?';",
            lang.annot("number")
        )),
    };
    w.blank();
    w.block(
        format!(
            "function toColumns(data{}){} {{",
            lang.annot("Record<string, unknown>"),
            lang.annot("Array<[string, unknown]>")
        ),
        "}",
        |w| {
            w.line("return Object.entries(data)");
            w.indent();
            w.line(".filter(([key, value]) => key in COLUMN_MAP && value !== undefined)");
            w.line(format!(
                ".map(([key, value]) => [COLUMN_MAP[key], value]{});",
                lang.cast("[string, unknown]")
            ));
            w.dedent();
        },
    );
    w.blank();

    w.block(format!("export class {}Repository {{", ty), "}", |w| {
        w.block(
            format!(
                "async findAll(options{}){} {{",
                lang.annot("{ limit: number; offset: number }"),
                lang.annot(&format!("Promise<{{ items: {}[]; total: number }}>", ty))
            ),
            "}",
            |w| {
                w.line(format!("const items = await query{}(", lang.generic(ty)));
                w.indent();
                w.line(format!(
                    "`SELECT ${{SELECT_COLUMNS}} FROM ${{TABLE}}{} ORDER BY {} LIMIT ${{placeholder(1)}} OFFSET ${{placeholder(2)}}`,",
                    where_scope, order
                ));
                w.line("[options.limit, options.offset],");
                w.dedent();
                w.line(");");
                w.line(format!(
                    "const [row] = await query{}(`SELECT COUNT(*) AS count FROM ${{TABLE}}{}`);",
                    lang.generic("{ count: string | number }"),
                    where_scope
                ));
                w.line("return { items, total: Number(row?.count ?? 0) };");
            },
        );
        w.blank();

        w.block(
            format!(
                "async findById(id{}){} {{",
                lang.annot("string"),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.line(format!(
                    "const rows = await query{}(`SELECT ${{SELECT_COLUMNS}} FROM ${{TABLE}} WHERE id = ${{placeholder(1)}}{}`, [id]);",
                    lang.generic(ty),
                    scope
                ));
                w.line("return rows[0] ?? null;");
            },
        );

        for field in model.unique_fields() {
            w.blank();
            w.block(
                format!(
                    "async {}(value{}){} {{",
                    find_by_name(field),
                    lang.annot(ts_type(field.field_type)),
                    lang.annot(&format!("Promise<{} | null>", ty))
                ),
                "}",
                |w| {
                    w.line(format!("const rows = await query{}(", lang.generic(ty)));
                    w.indent();
                    w.line(format!(
                        "`SELECT ${{SELECT_COLUMNS}} FROM ${{TABLE}} WHERE {} = ${{placeholder(1)}}{} LIMIT 1`,",
                        ident(&column_name(&field.name), dialect),
                        scope
                    ));
                    w.line("[value],");
                    w.dedent();
                    w.line(");");
                    w.line("return rows[0] ?? null;");
                },
            );
        }
        w.blank();

        w.block(
            format!(
                "async create(data{}){} {{",
                lang.annot(&names.create_input()),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                w.line("const id = randomUUID();");
                w.line("const entries = toColumns(data);");
                w.line("const columns = ['id', ...entries.map(([column]) => column)];");
                w.line("const values = [id, ...entries.map(([, value]) => value)];");
                w.line("const slots = values.map((_, i) => placeholder(i + 1));");
                w.line("await execute(`INSERT INTO ${TABLE} (${columns.join(', ')}) VALUES (${slots.join(', ')})`, values);");
                w.line("const created = await this.findById(id);");
                w.block("if (!created) {", "}", |w| {
                    w.line("throw new Error(`Row ${id} was not readable after insert into ${TABLE}`);");
                });
                w.line("return created;");
            },
        );
        w.blank();

        w.block(
            format!(
                "async update(id{}, data{}){} {{",
                lang.annot("string"),
                lang.annot(&names.update_input()),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.line("const entries = toColumns(data);");
                w.block("if (entries.length === 0) {", "}", |w| {
                    w.line("return this.findById(id);");
                });
                w.line("const assignments = entries.map(([column], i) => `${column} = ${placeholder(i + 1)}`);");
                w.line("const values = [...entries.map(([, value]) => value), id];");
                w.line(format!(
                    "const affected = await execute(`UPDATE ${{TABLE}} SET ${{assignments.join(', ')}} WHERE id = ${{placeholder(values.length)}}{}`, values);",
                    scope
                ));
                w.line("return affected > 0 ? this.findById(id) : null;");
            },
        );
        w.blank();

        w.block(
            format!(
                "async delete(id{}){} {{",
                lang.annot("string"),
                lang.annot("Promise<boolean>")
            ),
            "}",
            |w| {
                if model.metadata.soft_delete {
                    w.line(format!(
                        "const affected = await execute(`UPDATE ${{TABLE}} SET deleted_at = {} WHERE id = ${{placeholder(1)}}{}`, [id]);",
                        now, scope
                    ));
                } else {
                    w.line("const affected = await execute(`DELETE FROM ${TABLE} WHERE id = ${placeholder(1)}`, [id]);");
                }
                w.line("return affected > 0;");
            },
        );
    });
}

fn mongo_repository(
    w: &mut CodeWriter,
    lang: Lang,
    model: &Model,
    names: &ModelNames,
    imports: RepositoryImports<'_>,
) {
    let ty = &names.pascal;
    let doc_model = format!("{}Model", names.pascal);

    w.line(lang.import("mongoose", "mongoose"));
    w.line(lang.import(&format!("{{ {} }}", doc_model), imports.mongoose));
    entity_type_import(w, lang, names, imports.types);
    w.blank();
    w.line(format!(
        "const SCOPE = {};",
        if model.metadata.soft_delete { "{ deletedAt: null }" } else { "{}" }
    ));
    w.blank();
    w.block(
        format!(
            "function toEntity(doc{}){} {{",
            lang.annot("Record<string, unknown>"),
            lang.annot(ty)
        ),
        "}",
        |w| {
            w.line("const { _id, __v, ...rest } = doc;");
            w.line(format!("return {{ id: String(_id), ...rest }}{};", lang.cast(ty)));
        },
    );
    w.blank();
    let as_record = lang.cast("Record<string, unknown>");
    let sort = if model.metadata.timestamps { "{ createdAt: -1 }" } else { "{ _id: 1 }" };

    w.block(format!("export class {}Repository {{", ty), "}", |w| {
        w.block(
            format!(
                "async findAll(options{}){} {{",
                lang.annot("{ limit: number; offset: number }"),
                lang.annot(&format!("Promise<{{ items: {}[]; total: number }}>", ty))
            ),
            "}",
            |w| {
                w.line("const [docs, total] = await Promise.all([");
                w.indent();
                w.line(format!(
                    "{}.find(SCOPE).sort({}).skip(options.offset).limit(options.limit).lean(),",
                    doc_model, sort
                ));
                w.line(format!("{}.countDocuments(SCOPE),", doc_model));
                w.dedent();
                w.line("]);");
                w.line(format!(
                    "return {{ items: docs.map((doc) => toEntity(doc{})), total }};",
                    as_record
                ));
            },
        );
        w.blank();
        w.block(
            format!(
                "async findById(id{}){} {{",
                lang.annot("string"),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.block("if (!mongoose.isValidObjectId(id)) {", "}", |w| {
                    w.line("return null;");
                });
                w.line(format!("const doc = await {}.findOne({{ _id: id, ...SCOPE }}).lean();", doc_model));
                w.line(format!("return doc ? toEntity(doc{}) : null;", as_record));
            },
        );
        for field in model.unique_fields() {
            w.blank();
            w.block(
                format!(
                    "async {}(value{}){} {{",
                    find_by_name(field),
                    lang.annot(ts_type(field.field_type)),
                    lang.annot(&format!("Promise<{} | null>", ty))
                ),
                "}",
                |w| {
                    w.line(format!(
                        "const doc = await {}.findOne({{ {}: value, ...SCOPE }}).lean();",
                        doc_model, field.name
                    ));
                    w.line(format!("return doc ? toEntity(doc{}) : null;", as_record));
                },
            );
        }
        w.blank();
        w.block(
            format!(
                "async create(data{}){} {{",
                lang.annot(&names.create_input()),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                w.line(format!("const doc = await {}.create(data);", doc_model));
                w.line(format!("return toEntity(doc.toObject(){});", as_record));
            },
        );
        w.blank();
        w.block(
            format!(
                "async update(id{}, data{}){} {{",
                lang.annot("string"),
                lang.annot(&names.update_input()),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.block("if (!mongoose.isValidObjectId(id)) {", "}", |w| {
                    w.line("return null;");
                });
                w.line(format!(
                    "const doc = await {}.findOneAndUpdate({{ _id: id, ...SCOPE }}, data, {{ new: true }}).lean();",
                    doc_model
                ));
                w.line(format!("return doc ? toEntity(doc{}) : null;", as_record));
            },
        );
        w.blank();
        w.block(
            format!(
                "async delete(id{}){} {{",
                lang.annot("string"),
                lang.annot("Promise<boolean>")
            ),
            "}",
            |w| {
                w.block("if (!mongoose.isValidObjectId(id)) {", "}", |w| {
                    w.line("return false;");
                });
                if model.metadata.soft_delete {
                    w.line(format!(
                        "const result = await {}.updateOne({{ _id: id, deletedAt: null }}, {{ deletedAt: new Date() }});",
                        doc_model
                    ));
                    w.line("return result.modifiedCount > 0;");
                } else {
                    w.line(format!("const result = await {}.deleteOne({{ _id: id }});", doc_model));
                    w.line("return result.deletedCount > 0;");
                }
            },
        );
    });
}

fn memory_repository(
    w: &mut CodeWriter,
    lang: Lang,
    model: &Model,
    names: &ModelNames,
    imports: RepositoryImports<'_>,
) {
    let ty = &names.pascal;

    w.line(lang.import("{ randomUUID }", "crypto"));
    entity_type_import(w, lang, names, imports.types);
    w.blank();
    w.line(format!("const store = new Map{}();", lang.generic(&format!("string, {}", ty))));
    w.blank();
    if model.metadata.soft_delete {
        w.line(format!("const isActive = (item{}) => !item.deletedAt;", lang.annot(ty)));
    } else {
        w.line(format!("const isActive = (_item{}) => true;", lang.annot(ty)));
    }
    w.blank();

    w.block(format!("export class {}Repository {{", ty), "}", |w| {
        w.block(
            format!(
                "async findAll(options{}){} {{",
                lang.annot("{ limit: number; offset: number }"),
                lang.annot(&format!("Promise<{{ items: {}[]; total: number }}>", ty))
            ),
            "}",
            |w| {
                w.line("const items = [...store.values()].filter(isActive);");
                w.line("return { items: items.slice(options.offset, options.offset + options.limit), total: items.length };");
            },
        );
        w.blank();
        w.block(
            format!(
                "async findById(id{}){} {{",
                lang.annot("string"),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.line("const item = store.get(id);");
                w.line("return item && isActive(item) ? item : null;");
            },
        );
        for field in model.unique_fields() {
            w.blank();
            w.block(
                format!(
                    "async {}(value{}){} {{",
                    find_by_name(field),
                    lang.annot(ts_type(field.field_type)),
                    lang.annot(&format!("Promise<{} | null>", ty))
                ),
                "}",
                |w| {
                    w.line(format!(
                        "return [...store.values()].find((item) => isActive(item) && item.{} === value) ?? null;",
                        field.name
                    ));
                },
            );
        }
        w.blank();
        w.block(
            format!(
                "async create(data{}){} {{",
                lang.annot(&names.create_input()),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                if model.metadata.timestamps {
                    w.line("const now = new Date();");
                    w.line(format!(
                        "const item = {{ ...data, id: randomUUID(), createdAt: now, updatedAt: now }}{};",
                        lang.cast(ty)
                    ));
                } else {
                    w.line(format!("const item = {{ ...data, id: randomUUID() }}{};", lang.cast(ty)));
                }
                w.line("store.set(item.id, item);");
                w.line("return item;");
            },
        );
        w.blank();
        w.block(
            format!(
                "async update(id{}, data{}){} {{",
                lang.annot("string"),
                lang.annot(&names.update_input()),
                lang.annot(&format!("Promise<{} | null>", ty))
            ),
            "}",
            |w| {
                w.line("const existing = await this.findById(id);");
                w.block("if (!existing) {", "}", |w| {
                    w.line("return null;");
                });
                if model.metadata.timestamps {
                    w.line(format!(
                        "const updated = {{ ...existing, ...data, updatedAt: new Date() }}{};",
                        lang.cast(ty)
                    ));
                } else {
                    w.line(format!("const updated = {{ ...existing, ...data }}{};", lang.cast(ty)));
                }
                w.line("store.set(id, updated);");
                w.line("return updated;");
            },
        );
        w.blank();
        w.block(
            format!(
                "async delete(id{}){} {{",
                lang.annot("string"),
                lang.annot("Promise<boolean>")
            ),
            "}",
            |w| {
                if model.metadata.soft_delete {
                    w.line("const existing = await this.findById(id);");
                    w.block("if (!existing) {", "}", |w| {
                        w.line("return false;");
                    });
                    w.line("store.set(id, { ...existing, deletedAt: new Date() });");
                    w.line("return true;");
                } else {
                    w.line("return store.delete(id);");
                }
            },
        );
        w.blank();
        w.block("clear() {", "}", |w| {
            w.line("store.clear();");
        });
    });
}

pub fn repository_file(ctx: &EmitContext<'_>, model: &Model) -> GeneratedFile {
    let names = ModelNames::of(model);
    let types = format!("../types/{}", names.stem);
    let mongoose = format!("../models/{}.model", names.stem);
    ctx.source_file(
        ctx.src(&format!("repositories/{}.repository", names.stem)),
        repository_source(
            ctx,
            model,
            RepositoryImports {
                types: &types,
                mongoose: &mongoose,
            },
        ),
    )
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub fn service_source(ctx: &EmitContext<'_>, model: &Model) -> String {
    let lang = ctx.lang();
    let names = ModelNames::of(model);
    let ty = &names.pascal;
    let types_module = format!("../types/{}", names.stem);
    let unique: Vec<&Field> = model.unique_fields().collect();

    let mut w = CodeWriter::new();
    let mut errors = vec!["NotFoundError"];
    if !unique.is_empty() {
        errors.insert(0, "ConflictError");
    }
    w.line(lang.import(&format!("{{ {} }}", errors.join(", ")), "../middleware/error-handler"));
    w.line(lang.import(
        &format!("{{ {} }}", names.repository()),
        &format!("../repositories/{}.repository", names.stem),
    ));
    w.line(lang.import(&format!("{{ {} }}", names.fields_const()), &types_module));
    if let Some(line) = lang.import_type(
        &format!(
            "{{ {}, {}, {}, {} }}",
            names.create_input(),
            names.list_response(),
            ty,
            names.update_input()
        ),
        &types_module,
    ) {
        w.line(line);
    }
    w.blank();

    w.line("/** Keep only declared fields; unknown keys never reach the repository. */");
    w.block(
        format!(
            "function pickFields(input{}){} {{",
            lang.annot("Record<string, unknown>"),
            lang.annot("Record<string, unknown>")
        ),
        "}",
        |w| {
            w.line(format!("const picked{} = {{}};", lang.annot("Record<string, unknown>")));
            w.block(format!("for (const key of {}) {{", names.fields_const()), "}", |w| {
                w.block("if (input[key] !== undefined) {", "}", |w| {
                    w.line("picked[key] = input[key];");
                });
            });
            w.line("return picked;");
        },
    );
    w.blank();

    let repo = names.repository();
    w.block(format!("export class {}Service {{", ty), "}", |w| {
        w.block(
            format!(
                "async list(page{}, limit{}){} {{",
                lang.annot("number"),
                lang.annot("number"),
                lang.annot(&format!("Promise<{}>", names.list_response()))
            ),
            "}",
            |w| {
                w.line("const offset = (page - 1) * limit;");
                w.line(format!("const {{ items, total }} = await {}.findAll({{ limit, offset }});", repo));
                w.line("return {");
                w.indent();
                w.line("data: items,");
                w.line("pagination: { page, limit, total, totalPages: Math.ceil(total / limit) },");
                w.dedent();
                w.line("};");
            },
        );
        w.blank();
        w.block(
            format!(
                "async get(id{}){} {{",
                lang.annot("string"),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                w.line(format!("const item = await {}.findById(id);", repo));
                w.block("if (!item) {", "}", |w| {
                    w.line(format!("throw new NotFoundError('{}', id);", model.name));
                });
                w.line("return item;");
            },
        );
        w.blank();

        let unique_checks = |w: &mut CodeWriter, input: &str, exclude_self: bool| {
            for field in &unique {
                w.block(format!("if ({}.{} !== undefined && {}.{} !== null) {{", input, field.name, input, field.name), "}", |w| {
                    w.line(format!(
                        "const existing = await {}.{}({}.{});",
                        repo,
                        find_by_name(field),
                        input,
                        field.name
                    ));
                    let condition = if exclude_self { "existing && existing.id !== id" } else { "existing" };
                    w.block(format!("if ({}) {{", condition), "}", |w| {
                        w.line(format!(
                            "throw new ConflictError(`{} with {} '${{{}.{}}}' already exists`);",
                            model.name, field.name, input, field.name
                        ));
                    });
                });
            }
        };

        w.block(
            format!(
                "async create(input{}){} {{",
                lang.annot(&names.create_input()),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                unique_checks(w, "input", false);
                w.line(format!(
                    "return {}.create(pickFields(input){});",
                    repo,
                    lang.cast(&names.create_input())
                ));
            },
        );
        w.blank();
        w.block(
            format!(
                "async update(id{}, input{}){} {{",
                lang.annot("string"),
                lang.annot(&names.update_input()),
                lang.annot(&format!("Promise<{}>", ty))
            ),
            "}",
            |w| {
                unique_checks(w, "input", true);
                w.line(format!(
                    "const updated = await {}.update(id, pickFields(input){});",
                    repo,
                    lang.cast(&names.update_input())
                ));
                w.block("if (!updated) {", "}", |w| {
                    w.line(format!("throw new NotFoundError('{}', id);", model.name));
                });
                w.line("return updated;");
            },
        );
        w.blank();
        w.block(
            format!(
                "async remove(id{}){} {{",
                lang.annot("string"),
                lang.annot("Promise<void>")
            ),
            "}",
            |w| {
                w.line(format!("const deleted = await {}.delete(id);", repo));
                w.block("if (!deleted) {", "}", |w| {
                    w.line(format!("throw new NotFoundError('{}', id);", model.name));
                });
            },
        );
    });
    w.blank();
    w.line(format!("export const {} = new {}Service();", names.service(), ty));
    w.finish()
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub fn controller_source(ctx: &EmitContext<'_>, model: &Model) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let names = ModelNames::of(model);
    let service = names.service();

    let mut w = CodeWriter::new();
    if let Some(line) = flavor.type_import() {
        w.line(line);
    }
    w.line(lang.import(
        &format!("{{ {} }}", service),
        &format!("../services/{}.service", names.stem),
    ));
    if let Some(line) = lang.import_type(
        &format!("{{ {}, {} }}", names.create_input(), names.update_input()),
        &format!("../types/{}", names.stem),
    ) {
        w.line(line);
    }
    w.blank();
    w.line("const MAX_PAGE_SIZE = 100;");
    w.blank();

    w.block(format!("export class {}Controller {{", names.pascal), "}", |w| {
        flavor.handler(w, "list", |w| {
            w.line(format!("const page = Math.max(1, Number({}) || 1);", flavor.query("page")));
            w.line(format!(
                "const limit = Math.min(MAX_PAGE_SIZE, Math.max(1, Number({}) || 20));",
                flavor.query("limit")
            ));
            w.line(format!("const result = await {}.list(page, limit);", service));
            w.line(flavor.send(200, "result"));
        });
        w.blank();
        flavor.handler(w, "get", |w| {
            w.line(format!("const item = await {}.get({});", service, flavor.param("id")));
            w.line(flavor.send(200, "{ data: item }"));
        });
        w.blank();
        flavor.handler(w, "create", |w| {
            w.line(format!(
                "const item = await {}.create({});",
                service,
                flavor.body(&names.create_input())
            ));
            w.line(flavor.send(201, "{ data: item }"));
        });
        w.blank();
        flavor.handler(w, "update", |w| {
            w.line(format!(
                "const item = await {}.update({}, {});",
                service,
                flavor.param("id"),
                flavor.body(&names.update_input())
            ));
            w.line(flavor.send(200, "{ data: item }"));
        });
        w.blank();
        flavor.handler(w, "remove", |w| {
            w.line(format!("await {}.remove({});", service, flavor.param("id")));
            w.line(flavor.send_empty(204));
        });
    });
    w.blank();
    w.line(format!(
        "export const {} = new {}Controller();",
        names.controller(),
        names.pascal
    ));
    w.finish()
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

fn roles_literal(roles: &[String]) -> String {
    let quoted: Vec<String> = roles.iter().map(|r| js_string(r)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Middleware chain for one endpoint, in execution order.
pub fn guard_chain(endpoint: &Endpoint, auth_enabled: bool, schema: Option<&str>) -> Vec<String> {
    let mut chain = Vec::new();
    if auth_enabled && endpoint.authenticated {
        chain.push("authenticate".to_string());
        if !endpoint.roles.is_empty() {
            chain.push(format!("authorize({})", roles_literal(&endpoint.roles)));
        }
    }
    if let Some(schema) = schema {
        chain.push(format!("validate({})", schema));
    }
    chain
}

/// Emit one route registration.
pub fn route_line(flavor: Flavor, endpoint: &Endpoint, local_path: &str, chain: &[String], handler: &str) -> String {
    let method = endpoint.method.lower();
    if flavor.is_express() {
        let mut args = vec![js_string(local_path)];
        args.extend(chain.iter().cloned());
        args.push(handler.to_string());
        format!("router.{}({});", method, args.join(", "))
    } else if chain.is_empty() {
        format!("app.{}({}, {});", method, js_string(local_path), handler)
    } else {
        format!(
            "app.{}({}, {{ preHandler: [{}] }}, {});",
            method,
            js_string(local_path),
            chain.join(", "),
            handler
        )
    }
}

pub fn routes_source(ctx: &EmitContext<'_>, model: &Model, crud: &CrudEndpoints) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let names = ModelNames::of(model);
    let controller = names.controller();
    let create_schema = format!("create{}Schema", names.pascal);
    let update_schema = format!("update{}Schema", names.pascal);
    let auth_enabled = ctx.auth_enabled();

    let needs_authenticate = auth_enabled && crud.iter().any(|e| e.authenticated);
    let needs_authorize = auth_enabled && crud.iter().any(|e| e.authenticated && !e.roles.is_empty());

    let mut w = CodeWriter::new();
    if flavor.is_express() {
        w.line(lang.import("{ Router }", "express"));
    } else if let Some(line) = lang.import_type("{ FastifyInstance }", "fastify") {
        w.line(line);
    }
    if needs_authenticate {
        w.line(lang.import("{ authenticate }", "../auth/authenticate.middleware"));
    }
    if needs_authorize {
        w.line(lang.import("{ authorize }", "../auth/authorize.middleware"));
    }
    w.line(lang.import(
        &format!("{{ {} }}", controller),
        &format!("../controllers/{}.controller", names.stem),
    ));
    w.line(lang.import("{ validate }", "../middleware/validate"));
    w.line(lang.import(
        &format!("{{ {}, {} }}", create_schema, update_schema),
        &format!("../validation/{}.validation", names.stem),
    ));
    w.blank();

    let registrations: Vec<String> = crud
        .iter()
        .map(|endpoint| {
            let schema = match endpoint.operation {
                EndpointOperation::Create => Some(create_schema.as_str()),
                EndpointOperation::Update => Some(update_schema.as_str()),
                _ => None,
            };
            let chain = guard_chain(endpoint, auth_enabled, schema);
            let handler = format!("{}.{}", controller, handler_name(endpoint.operation));
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
            format!(
                "export default async function {}Routes(app{}) {{",
                names.camel,
                lang.annot("FastifyInstance")
            ),
            "}",
            |w| {
                w.lines(&registrations);
            },
        );
    }
    w.finish()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn message_arg(message: Option<&str>) -> String {
    match message {
        Some(m) => format!(", {}", js_string(m)),
        None => String::new(),
    }
}

fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// zod expression for one field, rules applied in declaration order.
pub fn zod_expression(field: &Field) -> String {
    let mut expr = zod_base(field.field_type).to_string();
    for rule in &field.validation {
        match rule {
            ValidationRule::MinLength { value, message } if field.field_type.is_textual() => {
                expr.push_str(&format!(".min({}{})", value, message_arg(message.as_deref())));
            }
            ValidationRule::MaxLength { value, message } if field.field_type.is_textual() => {
                expr.push_str(&format!(".max({}{})", value, message_arg(message.as_deref())));
            }
            ValidationRule::Min { value, message } if field.field_type.is_numeric() => {
                expr.push_str(&format!(".min({}{})", number_literal(*value), message_arg(message.as_deref())));
            }
            ValidationRule::Max { value, message } if field.field_type.is_numeric() => {
                expr.push_str(&format!(".max({}{})", number_literal(*value), message_arg(message.as_deref())));
            }
            ValidationRule::Pattern { value, message } if field.field_type.is_textual() => {
                expr.push_str(&format!(
                    ".regex(new RegExp({}){})",
                    js_string(value),
                    message_arg(message.as_deref())
                ));
            }
            ValidationRule::Custom { value, message } => {
                let message = message
                    .clone()
                    .unwrap_or_else(|| format!("{} failed rule '{}'", field.name, value));
                expr.push_str(&format!(
                    ".refine((value) => customRules[{}](value), {{ message: {} }})",
                    js_string(value),
                    js_string(&message)
                ));
            }
            _ => {}
        }
    }

    match &field.default_value {
        Some(default) if !default.is_null() && type_map::default_matches(field.field_type, default) => {
            expr.push_str(&format!(".default({})", js_literal(default)));
        }
        _ if !field.required => expr.push_str(".nullable().optional()"),
        _ => {}
    }
    expr
}

/// Every custom rule name used by `models`, sorted and deduplicated.
pub fn custom_rule_names(models: &[Model]) -> Vec<String> {
    let mut names: Vec<String> = models
        .iter()
        .flat_map(|m| m.fields.iter())
        .flat_map(|f| f.validation.iter())
        .filter_map(|rule| match rule {
            ValidationRule::Custom { value, .. } => Some(value.clone()),
            _ => None,
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

pub fn validation_source(ctx: &EmitContext<'_>, model: &Model) -> String {
    let lang = ctx.lang();
    let names = ModelNames::of(model);
    let uses_custom = model
        .fields
        .iter()
        .any(|f| f.validation.iter().any(|r| matches!(r, ValidationRule::Custom { .. })));

    let mut w = CodeWriter::new();
    w.line(lang.import("{ z }", "zod"));
    if uses_custom {
        w.line(lang.import("{ customRules }", "./custom-rules"));
    }
    w.blank();
    w.block(format!("export const create{}Schema = z.object({{", names.pascal), "});", |w| {
        for field in &model.fields {
            w.line(format!("{}: {},", field.name, zod_expression(field)));
        }
    });
    w.blank();
    w.line(format!(
        "export const update{}Schema = create{}Schema.partial();",
        names.pascal, names.pascal
    ));
    if lang.is_ts() {
        w.blank();
        w.line(format!(
            "export type Create{}Body = z.infer<typeof create{}Schema>;",
            names.pascal, names.pascal
        ));
        w.line(format!(
            "export type Update{}Body = z.infer<typeof update{}Schema>;",
            names.pascal, names.pascal
        ));
    }
    w.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Sample request body built from the type map's sample values.
pub fn sample_payload(model: &Model) -> Value {
    let mut body = Map::new();
    for field in &model.fields {
        body.insert(field.name.clone(), type_map::sample_value(field));
    }
    Value::Object(body)
}

fn missing_id(database: DatabaseKind) -> &'static str {
    match database {
        DatabaseKind::Mongodb => "000000000000000000000000",
        _ => "00000000-0000-0000-0000-000000000000",
    }
}

pub fn test_source(ctx: &EmitContext<'_>, model: &Model, crud: &CrudEndpoints) -> String {
    let lang = ctx.lang();
    let flavor = ctx.flavor();
    let names = ModelNames::of(model);
    let base = format!("/api{}", naming::resource_path(&model.name));
    let payload = serde_json::to_string_pretty(&sample_payload(model)).unwrap_or_else(|_| "{}".to_string());
    let target = if flavor.is_express() { "app" } else { "app.server" };
    let create_protected = ctx.auth_enabled() && crud.create.authenticated;
    let delete_protected = ctx.auth_enabled() && crud.delete.authenticated;

    let mut w = CodeWriter::new();
    w.line(lang.import("request", "supertest"));
    w.line(lang.import("{ createApp }", "../src/app"));
    w.blank();
    w.block(format!("describe('{} API', () => {{", model.name), "});", |w| {
        w.line("const app = createApp();");
        w.lines(format!("const validPayload = {};", payload).lines());
        w.blank();
        if !flavor.is_express() {
            w.block("beforeAll(async () => {", "});", |w| {
                w.line("await app.ready();");
            });
            w.blank();
            w.block("afterAll(async () => {", "});", |w| {
                w.line("await app.close();");
            });
            w.blank();
        }

        w.block(format!("it('lists {} with pagination', async () => {{", naming::pluralize(&names.camel)), "});", |w| {
            w.line(format!("const res = await request({}).get('{}?page=1&limit=5');", target, base));
            w.line("expect(res.status).toBe(200);");
            w.line("expect(Array.isArray(res.body.data)).toBe(true);");
            w.line("expect(res.body.pagination).toMatchObject({ page: 1, limit: 5 });");
        });
        w.blank();
        w.block(format!("it('returns 404 for an unknown {}', async () => {{", names.camel), "});", |w| {
            w.line(format!(
                "const res = await request({}).get('{}/{}');",
                target,
                base,
                missing_id(ctx.database())
            ));
            w.line("expect(res.status).toBe(404);");
            w.line("expect(res.body.error.code).toBe('not_found');");
        });
        w.blank();
        if create_protected {
            w.block("it('requires authentication to create', async () => {", "});", |w| {
                w.line(format!("const res = await request({}).post('{}').send(validPayload);", target, base));
                w.line("expect(res.status).toBe(401);");
            });
        } else {
            w.block(format!("it('creates a {}', async () => {{", names.camel), "});", |w| {
                w.line(format!("const res = await request({}).post('{}').send(validPayload);", target, base));
                w.line("expect(res.status).toBe(201);");
                w.line("expect(res.body.data.id).toBeDefined();");
            });
            if model.fields.iter().any(|f| f.required && f.default_value.is_none()) {
                w.blank();
                w.block("it('rejects a payload missing required fields', async () => {", "});", |w| {
                    w.line(format!("const res = await request({}).post('{}').send({{}});", target, base));
                    w.line("expect(res.status).toBe(400);");
                    w.line("expect(res.body.error.code).toBe('validation_error');");
                });
            }
        }
        if delete_protected {
            w.blank();
            w.block("it('requires authentication to delete', async () => {", "});", |w| {
                w.line(format!(
                    "const res = await request({}).delete('{}/{}');",
                    target,
                    base,
                    missing_id(ctx.database())
                ));
                w.line("expect(res.status).toBe(401);");
            });
        }
    });
    w.finish()
}

pub fn test_file(ctx: &EmitContext<'_>, model: &Model, crud: &CrudEndpoints) -> GeneratedFile {
    let names = ModelNames::of(model);
    GeneratedFile::new(
        format!("tests/{}", ctx.lang().file(&format!("{}.test", names.stem))),
        test_source(ctx, model, crud),
        ArtifactKind::Test,
    )
    .with_language(ctx.options.language.as_str())
}

/// The CRUD bundle for one model, in a fixed order.
pub fn crud_bundle(ctx: &EmitContext<'_>, model: &Model, crud: &CrudEndpoints) -> Vec<GeneratedFile> {
    let names = ModelNames::of(model);
    let mut files = vec![
        ctx.source_file(
            ctx.src(&format!("controllers/{}.controller", names.stem)),
            controller_source(ctx, model),
        ),
        ctx.source_file(
            ctx.src(&format!("services/{}.service", names.stem)),
            service_source(ctx, model),
        ),
        repository_file(ctx, model),
        ctx.source_file(
            ctx.src(&format!("routes/{}.routes", names.stem)),
            routes_source(ctx, model, crud),
        ),
        ctx.source_file(
            ctx.src(&format!("validation/{}.validation", names.stem)),
            validation_source(ctx, model),
        ),
    ];
    if ctx.options.include_tests {
        files.push(test_file(ctx, model, crud));
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::endpoints::synthesize;
    use crate::ir::{AuthConfig, AuthType, FieldType, Framework, GenerationOptions, Language};
    use serde_json::json;

    fn product() -> Model {
        Model::new("Product")
            .with_field(
                Field::new("name", FieldType::String)
                    .required()
                    .with_rule(ValidationRule::MaxLength { value: 80, message: None }),
            )
            .with_field(Field::new("sku", FieldType::String).required().unique())
            .with_field(Field::new("price", FieldType::Decimal).with_default(json!(0)))
            .with_field(Field::new("ownerId", FieldType::Uuid))
    }

    fn with_ctx<T>(options: GenerationOptions, f: impl FnOnce(&EmitContext<'_>, &Model) -> T) -> T {
        let auth = AuthConfig::default();
        let models = [product()];
        let ctx = EmitContext {
            project_name: "shop",
            models: &models,
            auth: &auth,
            options: &options,
        };
        f(&ctx, &models[0])
    }

    #[test]
    fn test_types_enumerate_every_field() {
        let out = with_ctx(GenerationOptions::default(), |ctx, model| types_source(ctx, model));
        assert!(out.contains("export type Product = {"));
        assert!(out.contains("  sku: string;"));
        assert!(out.contains("  ownerId: string | null;"));
        assert!(out.contains("  price?: number | null;"));
        assert!(out.contains("export const PRODUCT_FIELDS = ['name', 'sku', 'price', 'ownerId'] as const;"));
    }

    #[test]
    fn test_javascript_types_use_jsdoc() {
        let options = GenerationOptions {
            language: Language::Javascript,
            ..GenerationOptions::default()
        };
        let out = with_ctx(options, |ctx, model| types_source(ctx, model));
        assert!(out.contains(" * @typedef {Object} Product"));
        assert!(out.contains(" * @property {string | null} [ownerId]"));
        assert!(!out.contains("as const"));
    }

    #[test]
    fn test_postgres_repository() {
        let out = with_ctx(GenerationOptions::default(), |ctx, model| repository_file(ctx, model));
        assert_eq!(out.path, "src/repositories/product.repository.ts");
        assert!(out.content.contains("const TABLE = 'products';"));
        assert!(out.content.contains("owner_id AS \"ownerId\""));
        assert!(out.content.contains("const placeholder = (index: number) => `$${index}`;"));
        assert!(out.content.contains("async findBySku(value: string): Promise<Product | null> {"));
    }

    #[test]
    fn test_mysql_repository_uses_question_marks() {
        let options = GenerationOptions {
            database: DatabaseKind::Mysql,
            ..GenerationOptions::default()
        };
        let out = with_ctx(options, |ctx, model| repository_file(ctx, model));
        assert!(out.content.contains("const placeholder = (_index: number) => '?';"));
        assert!(out.content.contains("owner_id AS ownerId"));
    }

    #[test]
    fn test_memory_repository_is_placeholder_store() {
        let options = GenerationOptions {
            database: DatabaseKind::Memory,
            ..GenerationOptions::default()
        };
        let out = with_ctx(options, |ctx, model| repository_file(ctx, model));
        assert!(out.content.contains("const store = new Map<string, Product>();"));
        assert!(out.content.contains("clear() {"));
    }

    #[test]
    fn test_service_checks_unique_fields() {
        let out = with_ctx(GenerationOptions::default(), |ctx, model| service_source(ctx, model));
        assert!(out.contains("import { ConflictError, NotFoundError } from '../middleware/error-handler';"));
        assert!(out.contains("await productRepository.findBySku(input.sku);"));
        assert!(out.contains("for (const key of PRODUCT_FIELDS) {"));
    }

    #[test]
    fn test_routes_follow_endpoint_flags() {
        let out = with_ctx(GenerationOptions::default(), |ctx, model| {
            let crud = synthesize(model, ctx.auth);
            routes_source(ctx, model, &crud)
        });
        assert!(out.contains("router.get('/', productController.list);"));
        assert!(out.contains("router.get('/:id', productController.get);"));
        assert!(out.contains(
            "router.post('/', authenticate, authorize(['admin', 'user']), validate(createProductSchema), productController.create);"
        ));
        assert!(out.contains("router.delete('/:id', authenticate, authorize(['admin']), productController.remove);"));
    }

    #[test]
    fn test_fastify_routes_use_prehandlers() {
        let options = GenerationOptions {
            framework: Framework::Fastify,
            auth_type: AuthType::None,
            ..GenerationOptions::default()
        };
        let out = with_ctx(options, |ctx, model| {
            let crud = synthesize(model, &AuthConfig::disabled());
            routes_source(ctx, model, &crud)
        });
        assert!(out.contains("export default async function productRoutes(app: FastifyInstance) {"));
        assert!(out.contains("app.post('/', { preHandler: [validate(createProductSchema)] }, productController.create);"));
        assert!(!out.contains("authenticate"));
    }

    #[test]
    fn test_zod_expression() {
        let field = Field::new("title", FieldType::String)
            .required()
            .with_rule(ValidationRule::MinLength { value: 3, message: Some("Too short".to_string()) })
            .with_rule(ValidationRule::Pattern { value: "^[a-z]+$".to_string(), message: None });
        assert_eq!(
            zod_expression(&field),
            "z.string().min(3, 'Too short').regex(new RegExp('^[a-z]+$'))"
        );

        let optional = Field::new("rating", FieldType::Integer).with_rule(ValidationRule::Max { value: 5.0, message: None });
        assert_eq!(zod_expression(&optional), "z.number().int().max(5).nullable().optional()");

        let defaulted = Field::new("active", FieldType::Boolean).with_default(json!(true));
        assert_eq!(zod_expression(&defaulted), "z.boolean().default(true)");
    }

    #[test]
    fn test_generated_tests_use_samples() {
        let out = with_ctx(GenerationOptions::default(), |ctx, model| {
            let crud = synthesize(model, ctx.auth);
            test_source(ctx, model, &crud)
        });
        assert!(out.contains("describe('Product API', () => {"));
        assert!(out.contains("\"sku\": \"sample text\""));
        assert!(out.contains("it('requires authentication to create', async () => {"));
    }

    #[test]
    fn test_crud_bundle_paths() {
        let paths: Vec<String> = with_ctx(GenerationOptions::default(), |ctx, model| {
            let crud = synthesize(model, ctx.auth);
            crud_bundle(ctx, model, &crud).into_iter().map(|f| f.path).collect()
        });
        assert_eq!(
            paths,
            vec![
                "src/controllers/product.controller.ts",
                "src/services/product.service.ts",
                "src/repositories/product.repository.ts",
                "src/routes/product.routes.ts",
                "src/validation/product.validation.ts",
                "tests/product.test.ts",
            ]
        );
    }
}
