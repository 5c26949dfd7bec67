#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("No template found for any of: {0}")]
    TemplateNotFound(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Dependency lookup failed: {0}")]
    Lookup(String),

    #[error("Archive creation failed: {0}")]
    Archive(String),
}
