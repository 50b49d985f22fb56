//! Schema emitter: relational DDL and document-store schemas.

use super::{auth::auth_user_model, EmitContext};
use crate::generator::naming::{self, column_name, table_name};
use crate::generator::type_map::{self, column_type, js_literal, mongoose_type, sql_literal};
use crate::generator::writer::CodeWriter;
use crate::ir::{ArtifactKind, GeneratedFile, Model, Relationship, RelationshipKind, SqlDialect};

const RESERVED_IDENTIFIERS: &[&str] = &[
    "user", "order", "group", "select", "table", "from", "where", "key", "index", "check", "default",
    "limit", "offset", "references", "primary", "unique", "column", "desc", "asc", "grant", "role",
];

/// Quote `name` when it collides with a SQL keyword.
pub fn ident(name: &str, dialect: SqlDialect) -> String {
    if RESERVED_IDENTIFIERS.contains(&name.to_ascii_lowercase().as_str()) {
        match dialect {
            SqlDialect::Postgres => format!("\"{}\"", name),
            SqlDialect::Mysql => format!("`{}`", name),
        }
    } else {
        name.to_string()
    }
}

fn id_column_type(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::Postgres => "UUID",
        SqlDialect::Mysql => "CHAR(36)",
    }
}

fn timestamp_type(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::Postgres => "TIMESTAMPTZ",
        SqlDialect::Mysql => "DATETIME(3)",
    }
}

fn now(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::Postgres => "NOW()",
        SqlDialect::Mysql => "CURRENT_TIMESTAMP(3)",
    }
}

const PG_UPDATED_AT_FUNCTION: &str = "CREATE OR REPLACE FUNCTION set_updated_at() RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;";

/// `CREATE TABLE` for `model` followed by its update trigger.
pub fn create_table(model: &Model, dialect: SqlDialect) -> String {
    let table = table_name(model);
    let quoted = ident(&table, dialect);

    let mut columns = Vec::new();
    columns.push(match dialect {
        SqlDialect::Postgres => "id UUID PRIMARY KEY DEFAULT gen_random_uuid()".to_string(),
        SqlDialect::Mysql => "id CHAR(36) NOT NULL PRIMARY KEY".to_string(),
    });

    for field in &model.fields {
        let mut column = format!(
            "{} {}",
            ident(&column_name(&field.name), dialect),
            column_type(field.field_type, dialect)
        );
        if field.required {
            column.push_str(" NOT NULL");
        }
        if field.unique {
            column.push_str(" UNIQUE");
        }
        if let Some(literal) = field
            .default_value
            .as_ref()
            .and_then(|value| sql_literal(field.field_type, dialect, value))
        {
            column.push_str(" DEFAULT ");
            column.push_str(&literal);
        }
        columns.push(column);
    }

    if model.metadata.timestamps {
        let ty = timestamp_type(dialect);
        columns.push(format!("created_at {} NOT NULL DEFAULT {}", ty, now(dialect)));
        columns.push(format!("updated_at {} NOT NULL DEFAULT {}", ty, now(dialect)));
    }
    if model.metadata.soft_delete {
        columns.push(format!("deleted_at {} NULL", timestamp_type(dialect)));
    }

    let mut w = CodeWriter::new();
    w.line(format!("-- {}", model.name));
    w.line(format!("CREATE TABLE IF NOT EXISTS {} (", quoted));
    w.indent();
    let last = columns.len() - 1;
    for (i, column) in columns.iter().enumerate() {
        w.line(if i == last { column.clone() } else { format!("{},", column) });
    }
    w.dedent();
    w.line(match dialect {
        SqlDialect::Postgres => ");".to_string(),
        SqlDialect::Mysql => ") ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;".to_string(),
    });

    if model.metadata.soft_delete {
        w.blank();
        w.line(format!(
            "CREATE INDEX {}idx_{}_deleted_at ON {} (deleted_at);",
            if dialect == SqlDialect::Postgres { "IF NOT EXISTS " } else { "" },
            table,
            quoted
        ));
    }

    if model.metadata.timestamps {
        let trigger = format!("trg_{}_updated_at", table);
        w.blank();
        match dialect {
            SqlDialect::Postgres => {
                w.line(format!("DROP TRIGGER IF EXISTS {} ON {};", trigger, quoted));
                w.line(format!("CREATE TRIGGER {}", trigger));
                w.indent();
                w.line(format!("BEFORE UPDATE ON {}", quoted));
                w.line("FOR EACH ROW");
                w.line("EXECUTE FUNCTION set_updated_at();");
                w.dedent();
            }
            SqlDialect::Mysql => {
                w.line(format!("DROP TRIGGER IF EXISTS {};", trigger));
                w.line(format!("CREATE TRIGGER {}", trigger));
                w.indent();
                w.line(format!("BEFORE UPDATE ON {}", quoted));
                w.line("FOR EACH ROW");
                w.line("SET NEW.updated_at = CURRENT_TIMESTAMP(3);");
                w.dedent();
            }
        }
    }

    w.finish()
}

fn referenced_column_type(model: &Model, field: &str, dialect: SqlDialect) -> &'static str {
    match model.field(field) {
        Some(f) => column_type(f.field_type, dialect),
        None => id_column_type(dialect),
    }
}

/// Foreign keys and join tables for every relationship whose endpoints exist.
pub fn relationship_constraints(models: &[Model], dialect: SqlDialect) -> Vec<String> {
    let find = |name: &str| models.iter().find(|m| m.name == name);
    let mut statements = Vec::new();

    for model in models {
        for rel in &model.relationships {
            let (Some(source), Some(target)) = (find(&rel.source_model), find(&rel.target_model)) else {
                continue;
            };
            statements.push(constraint_for(rel, source, target, dialect));
        }
    }
    statements
}

fn on_delete(rel: &Relationship, target: &Model) -> &'static str {
    if rel.cascade_delete {
        return "CASCADE";
    }
    match target.field(&rel.target_field) {
        Some(field) if field.required => "RESTRICT",
        _ => "SET NULL",
    }
}

fn constraint_for(rel: &Relationship, source: &Model, target: &Model, dialect: SqlDialect) -> String {
    let source_table = table_name(source);
    let target_table = table_name(target);
    let source_column = column_name(&rel.source_field);
    let target_column = column_name(&rel.target_field);

    match rel.kind {
        RelationshipKind::OneToMany | RelationshipKind::OneToOne => {
            let mut w = CodeWriter::new();
            w.line(format!(
                "ALTER TABLE {} ADD CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {};",
                ident(&target_table, dialect),
                target_table,
                target_column,
                ident(&target_column, dialect),
                ident(&source_table, dialect),
                ident(&source_column, dialect),
                on_delete(rel, target)
            ));
            if rel.kind == RelationshipKind::OneToOne && !target.field(&rel.target_field).is_some_and(|f| f.unique) {
                w.line(format!(
                    "ALTER TABLE {} ADD CONSTRAINT uq_{}_{} UNIQUE ({});",
                    ident(&target_table, dialect),
                    target_table,
                    target_column,
                    ident(&target_column, dialect)
                ));
            }
            w.finish()
        }
        RelationshipKind::ManyToMany => {
            let join = format!("{}_{}", source_table, target_table);
            let left = format!("{}_id", naming::snake(&source.name));
            let right = format!("{}_id", naming::snake(&target.name));
            let left_type = referenced_column_type(source, &rel.source_field, dialect);
            let right_type = referenced_column_type(target, &rel.target_field, dialect);

            let mut w = CodeWriter::new();
            w.line(format!("CREATE TABLE IF NOT EXISTS {} (", ident(&join, dialect)));
            w.indent();
            w.line(format!("{} {} NOT NULL,", left, left_type));
            w.line(format!("{} {} NOT NULL,", right, right_type));
            w.line(format!("PRIMARY KEY ({}, {}),", left, right));
            w.line(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE,",
                left,
                ident(&source_table, dialect),
                ident(&source_column, dialect)
            ));
            w.line(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
                right,
                ident(&target_table, dialect),
                ident(&target_column, dialect)
            ));
            w.dedent();
            w.line(");");
            w.finish()
        }
    }
}

fn migration_header(w: &mut CodeWriter, dialect: SqlDialect, needs_trigger: bool) {
    if dialect == SqlDialect::Postgres {
        w.line("CREATE EXTENSION IF NOT EXISTS pgcrypto;");
        if needs_trigger {
            w.blank();
            w.lines(PG_UPDATED_AT_FUNCTION.lines());
        }
        w.blank();
    }
}

/// Self-contained DDL for one model: prerequisites, table and trigger.
pub fn standalone_ddl(model: &Model, dialect: SqlDialect) -> String {
    let mut w = CodeWriter::new();
    migration_header(&mut w, dialect, model.metadata.timestamps);
    w.lines(create_table(model, dialect).lines());
    w.finish()
}

/// Migration file for one model.
pub fn migration(model: &Model, index: usize, dialect: SqlDialect) -> GeneratedFile {
    GeneratedFile::new(
        format!("database/migrations/{:03}_create_{}.sql", index, table_name(model)),
        standalone_ddl(model, dialect),
        ArtifactKind::Schema,
    )
    .with_language("sql")
}

/// Combined schema: auth users (when enabled), every model, then constraints.
pub fn combined_schema(ctx: &EmitContext<'_>, dialect: SqlDialect) -> GeneratedFile {
    let mut tables: Vec<Model> = Vec::new();
    if ctx.auth_enabled() {
        tables.push(auth_user_model(ctx.auth));
    }
    tables.extend(ctx.models.iter().cloned());

    let mut w = CodeWriter::new();
    w.line(format!("-- Schema for {}", ctx.project_name));
    w.blank();
    migration_header(&mut w, dialect, tables.iter().any(|m| m.metadata.timestamps));
    for model in &tables {
        w.lines(create_table(model, dialect).lines());
        w.blank();
    }

    let constraints = relationship_constraints(ctx.models, dialect);
    if !constraints.is_empty() {
        w.line("-- Relationships");
        for statement in constraints {
            w.lines(statement.lines());
            w.blank();
        }
    }

    GeneratedFile::new("database/schema.sql", w.finish(), ArtifactKind::Schema).with_language("sql")
}

/// Trailing migration holding relationship constraints, if any.
pub fn relationships_migration(models: &[Model], index: usize, dialect: SqlDialect) -> Option<GeneratedFile> {
    let constraints = relationship_constraints(models, dialect);
    if constraints.is_empty() {
        return None;
    }
    let mut w = CodeWriter::new();
    for statement in constraints {
        w.lines(statement.lines());
        w.blank();
    }
    Some(
        GeneratedFile::new(
            format!("database/migrations/{:03}_add_relationships.sql", index),
            w.finish(),
            ArtifactKind::Schema,
        )
        .with_language("sql"),
    )
}

/// Mongoose schema source for `model`.
pub fn mongoose_model(ctx: &EmitContext<'_>, model: &Model) -> String {
    let lang = ctx.lang();
    let schema_var = format!("{}Schema", naming::camel(&model.name));

    let mut w = CodeWriter::new();
    w.line(lang.import("mongoose, { Schema }", "mongoose"));
    w.blank();
    w.line(format!("const {} = new Schema(", schema_var));
    w.indent();
    w.block("{", "},", |w| {
        for field in &model.fields {
            let mut parts = vec![format!("type: {}", mongoose_type(field.field_type))];
            if field.required {
                parts.push("required: true".to_string());
            }
            if field.unique {
                parts.push("unique: true".to_string());
            }
            if let Some(default) = &field.default_value {
                if type_map::default_matches(field.field_type, default) {
                    parts.push(format!("default: {}", js_literal(default)));
                }
            }
            w.line(format!("{}: {{ {} }},", field.name, parts.join(", ")));
        }
        if model.metadata.soft_delete {
            w.line("deletedAt: { type: Date, default: null },");
        }
    });
    w.line(format!(
        "{{ timestamps: {}, collection: {} }},",
        model.metadata.timestamps,
        naming::js_string(&table_name(model))
    ));
    w.dedent();
    w.line(");");
    w.blank();
    w.line(format!(
        "export const {}Model = mongoose.model('{}', {});",
        model.name, model.name, schema_var
    ));
    w.finish()
}

/// Schema artifact for one model, or nothing for the in-memory store.
pub fn model_schema_file(ctx: &EmitContext<'_>, model: &Model, index: usize) -> Option<GeneratedFile> {
    match ctx.database().dialect() {
        Some(dialect) => Some(migration(model, index, dialect)),
        None if ctx.database() == crate::ir::DatabaseKind::Mongodb => Some(
            GeneratedFile::new(
                format!("src/models/{}", ctx.lang().file(&format!("{}.model", naming::file_stem(&model.name)))),
                mongoose_model(ctx, model),
                ArtifactKind::Schema,
            )
            .with_language(ctx.options.language.as_str()),
        ),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AuthConfig, DatabaseKind, Field, FieldType, GenerationOptions, ModelMetadata};
    use serde_json::json;

    fn user() -> Model {
        Model::new("User").with_field(Field::new("email", FieldType::Email).required().unique())
    }

    #[test]
    fn test_unique_not_null_email_column() {
        let sql = create_table(&user(), SqlDialect::Postgres);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS users ("));
        assert!(sql.contains("email VARCHAR(255) NOT NULL UNIQUE"));
        assert!(sql.contains("EXECUTE FUNCTION set_updated_at();"));
    }

    #[test]
    fn test_mysql_table_and_trigger() {
        let sql = create_table(&user(), SqlDialect::Mysql);
        assert!(sql.contains("id CHAR(36) NOT NULL PRIMARY KEY"));
        assert!(sql.contains("ENGINE=InnoDB"));
        assert!(sql.contains("SET NEW.updated_at = CURRENT_TIMESTAMP(3);"));
    }

    #[test]
    fn test_defaults_and_soft_delete() {
        let model = Model::new("Article")
            .with_field(Field::new("status", FieldType::String).with_default(json!("draft")))
            .with_field(Field::new("views", FieldType::Integer).with_default(json!("many")))
            .with_metadata(ModelMetadata {
                soft_delete: true,
                timestamps: false,
                ..ModelMetadata::default()
            });
        let sql = create_table(&model, SqlDialect::Postgres);
        assert!(sql.contains("status VARCHAR(255) DEFAULT 'draft'"));
        assert!(sql.contains("views INTEGER,"));
        assert!(sql.contains("deleted_at TIMESTAMPTZ NULL"));
        assert!(!sql.contains("CREATE TRIGGER"));
        assert!(!sql.contains("created_at"));
    }

    #[test]
    fn test_reserved_table_is_quoted() {
        let model = Model::new("Order").with_field(Field::new("total", FieldType::Decimal));
        let sql = create_table(
            &model.with_metadata(ModelMetadata {
                table_name: Some("order".to_string()),
                ..ModelMetadata::default()
            }),
            SqlDialect::Postgres,
        );
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"order\" ("));
    }

    #[test]
    fn test_one_to_many_foreign_key() {
        let user = user().with_relationship(
            Relationship::new(RelationshipKind::OneToMany, "User", "id", "Post", "authorId").cascade(),
        );
        let post = Model::new("Post").with_field(Field::new("authorId", FieldType::Uuid).required());
        let statements = relationship_constraints(&[user, post], SqlDialect::Postgres);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains(
            "ALTER TABLE posts ADD CONSTRAINT fk_posts_author_id FOREIGN KEY (author_id) REFERENCES users (id)"
        ));
        assert!(statements[0].contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_many_to_many_join_table() {
        let post = Model::new("Post")
            .with_field(Field::new("title", FieldType::String))
            .with_relationship(Relationship::new(RelationshipKind::ManyToMany, "Post", "id", "Tag", "id"));
        let tag = Model::new("Tag").with_field(Field::new("label", FieldType::String));
        let statements = relationship_constraints(&[post, tag], SqlDialect::Postgres);
        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS posts_tags ("));
        assert!(statements[0].contains("PRIMARY KEY (post_id, tag_id)"));
    }

    #[test]
    fn test_mongo_schema_file() {
        let options = GenerationOptions {
            database: DatabaseKind::Mongodb,
            ..GenerationOptions::default()
        };
        let auth = AuthConfig::default();
        let models = [user()];
        let ctx = EmitContext {
            project_name: "demo",
            models: &models,
            auth: &auth,
            options: &options,
        };
        let file = model_schema_file(&ctx, &models[0], 1).unwrap();
        assert_eq!(file.path, "src/models/user.model.ts");
        assert!(file.content.contains("email: { type: String, required: true, unique: true },"));
        assert!(file.content.contains("collection: 'users'"));
    }

    #[test]
    fn test_mongo_collection_is_escaped() {
        let options = GenerationOptions {
            database: DatabaseKind::Mongodb,
            ..GenerationOptions::default()
        };
        let auth = AuthConfig::default();
        let models = [user().with_metadata(ModelMetadata {
            table_name: Some("o'brien".to_string()),
            ..ModelMetadata::default()
        })];
        let ctx = EmitContext {
            project_name: "demo",
            models: &models,
            auth: &auth,
            options: &options,
        };
        let source = mongoose_model(&ctx, &models[0]);
        assert!(source.contains(r"collection: 'o\'brien'"));
    }
}
