//! The Prompt Renderer (`spec.md` §4.3): `(Spec, template_ref) -> rendered
//! prompt text`. Templates are embedded by default, with an optional
//! on-disk override directory, mirroring the teacher's `templates::engine`
//! singleton. The environment never touches the clock, randomness, or the
//! environment — determinism holds structurally, not by convention.

pub mod context;

use std::path::Path;
use std::sync::OnceLock;

use minijinja::Environment;
use vibesafe_spec::{Spec, UnitKind};
use vibesafe_utils::error::TemplateError;

pub use context::PromptContext;

mod embedded {
    pub const FUNCTION: &str = include_str!("../templates/function.jinja");
    pub const HTTP: &str = include_str!("../templates/http.jinja");
    pub const CLI: &str = include_str!("../templates/cli.jinja");
}

static ENGINE: OnceLock<Environment<'static>> = OnceLock::new();

fn init_engine() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("function", embedded::FUNCTION)
        .expect("embedded function template is valid");
    env.add_template("http", embedded::HTTP)
        .expect("embedded http template is valid");
    env.add_template("cli", embedded::CLI)
        .expect("embedded cli template is valid");
    env
}

/// The global template engine, built once from the embedded defaults.
pub fn engine() -> &'static Environment<'static> {
    ENGINE.get_or_init(init_engine)
}

/// A fresh engine seeded with the embedded defaults, then overridden by any
/// `<dir>/<name>.jinja` files that exist on disk.
pub fn engine_with_override(dir: &Path) -> Result<Environment<'static>, TemplateError> {
    let mut env = init_engine();
    for name in ["function", "http", "cli"] {
        let path = dir.join(format!("{name}.jinja"));
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|e| TemplateError::RenderError {
            template_id: name.to_string(),
            line: 0,
            reason: format!("failed to read override at {}: {e}", path.display()),
        })?;
        // Leaking is acceptable: override loading happens once per process,
        // at startup, against a bounded set of three template names.
        let leaked: &'static str = Box::leak(content.into_boxed_str());
        env.add_template(name, leaked)
            .map_err(|e| TemplateError::RenderError {
                template_id: name.to_string(),
                line: e.line().unwrap_or(0) as u32,
                reason: e.to_string(),
            })?;
    }
    Ok(env)
}

/// Default-by-kind template name, used when `options.template_ref` is unset.
#[must_use]
pub fn default_template_ref(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Function => "function",
        UnitKind::Http => "http",
        UnitKind::Cli => "cli",
    }
}

/// Resolve the template to use for a Spec: `spec.template_ref` if set and
/// non-empty, else the default-by-kind mapping.
#[must_use]
pub fn resolve_template_ref(spec: &Spec) -> &str {
    if spec.template_ref.trim().is_empty() {
        default_template_ref(spec.kind)
    } else {
        &spec.template_ref
    }
}

/// Render a Spec's prompt using the global engine.
pub fn render(spec: &Spec) -> Result<String, TemplateError> {
    render_with(engine(), spec)
}

/// Render a Spec's prompt using a caller-supplied engine (e.g. one built via
/// [`engine_with_override`]).
pub fn render_with(env: &Environment<'static>, spec: &Spec) -> Result<String, TemplateError> {
    let template_id = resolve_template_ref(spec).to_string();
    let template =
        env.get_template(&template_id)
            .map_err(|_| TemplateError::NotFound {
                template_id: template_id.clone(),
            })?;
    let ctx = PromptContext::from_spec(spec);
    template.render(&ctx).map_err(|e| TemplateError::RenderError {
        template_id,
        line: e.line().unwrap_or(0) as u32,
        reason: e.to_string(),
    })
}
