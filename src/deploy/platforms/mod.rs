//! One adapter per supported platform.

mod aws;
mod fly;
mod heroku;
mod railway;
mod render;
mod vercel;

pub use aws::AwsAdapter;
pub use fly::FlyAdapter;
pub use heroku::HerokuAdapter;
pub use railway::RailwayAdapter;
pub use render::RenderAdapter;
pub use vercel::VercelAdapter;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::generator::{generate_project, ProjectInput};
    use crate::ir::{
        DatabaseKind, Field, FieldType, GeneratedProject, GenerationOptions, Language, Model,
    };

    pub fn project(language: Language, database: DatabaseKind) -> GeneratedProject {
        let todo = Model::new("Todo")
            .with_field(Field::new("title", FieldType::String).required())
            .with_field(Field::new("done", FieldType::Boolean));
        let options = GenerationOptions {
            language,
            database,
            ..GenerationOptions::default()
        };
        generate_project(&ProjectInput::new("Todo Service", vec![todo]).with_options(options))
            .expect("fixture project generates")
    }

    pub fn typescript() -> GeneratedProject {
        project(Language::Typescript, DatabaseKind::Postgresql)
    }
}
