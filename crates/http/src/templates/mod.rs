//! HTML templates loaded from a directory tree.
//!
//! Every file beneath the template directory is parsed with [`tera`] and
//! registered under its path relative to that directory (see
//! [`template_name`]). Templates are loaded on the first render, explicitly
//! via [`Templates::load`], or before every render when reload is enabled.
//!
//! A load builds a complete new [`Registry`] and only then publishes it, so
//! renders running concurrently keep using the snapshot they started with
//! and a failed load leaves the previous registry in place.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::encode::with_content_type;

pub mod functions;
mod loader;

pub use functions::{DictError, build_dict, divide};
pub use loader::template_name;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Named functions callable from templates.
pub type FunctionMap = HashMap<String, Arc<dyn tera::Function>>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template directory `{}` does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read template `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot derive a template name from `{}`", .0.display())]
    InvalidName(PathBuf),

    #[error("failed to parse templates: {}", chain(.0))]
    Parse(#[source] tera::Error),

    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("failed to render '{name}': {}", chain(.source))]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("template data must serialize to a map: {}", chain(.0))]
    Context(#[source] tera::Error),

    #[error("template registry lock poisoned")]
    Poisoned,
}

/// Tera nests the useful part of an error in its source chain.
fn chain(err: &tera::Error) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

/// Immutable set of parsed templates.
pub struct Registry {
    tera: Tera,
}

impl Registry {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render `name` with `data` as its context, streaming into `writer`.
    ///
    /// Output already written stays written if rendering fails midway.
    pub fn render_to<W, T>(&self, name: &str, data: &T, writer: W) -> Result<(), TemplateError>
    where
        W: io::Write,
        T: Serialize + ?Sized,
    {
        if !self.contains(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }

        let context = Context::from_serialize(data).map_err(TemplateError::Context)?;
        self.tera
            .render_to(name, &context, writer)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("templates", &names).finish()
    }
}

/// Template store bound to a directory.
pub struct Templates {
    dir: PathBuf,
    reload: bool,
    functions: FunctionMap,
    current: RwLock<Option<Arc<Registry>>>,
}

impl Templates {
    /// Templates from `dir`. With `reload`, the directory is re-read before
    /// every render; meant for development.
    ///
    /// Loading uses blocking `std::fs` calls. From an async handler this
    /// happens on the runtime worker on the first render and, with `reload`,
    /// on every render. Call [`Templates::load`] at startup to take the first
    /// one off the request path.
    pub fn new(dir: impl Into<PathBuf>, reload: bool) -> Self {
        Self {
            dir: dir.into(),
            reload,
            functions: functions::builtins(),
            current: RwLock::new(None),
        }
    }

    /// Add (or replace) a template function.
    ///
    /// Drops any registry loaded so far; the next render loads again.
    pub fn function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: tera::Function + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self.current = RwLock::new(None);
        self
    }

    /// Merge `functions` into the function table, replacing equal names.
    pub fn functions(mut self, functions: FunctionMap) -> Self {
        self.functions.extend(functions);
        self.current = RwLock::new(None);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn reload(&self) -> bool {
        self.reload
    }

    /// Read and parse every template and publish the result.
    ///
    /// On error nothing is published and the previous registry (if any)
    /// remains in use.
    pub fn load(&self) -> Result<Arc<Registry>, TemplateError> {
        let registry = Arc::new(self.build().inspect_err(|e| {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to load templates");
        })?);

        let mut current = self.current.write().map_err(|_| TemplateError::Poisoned)?;
        *current = Some(registry.clone());
        Ok(registry)
    }

    fn build(&self) -> Result<Registry, TemplateError> {
        let sources = loader::collect(&self.dir)?;

        let mut tera = Tera::default();
        for (name, function) in &self.functions {
            tera.register_function(name, functions::Shared(function.clone()));
        }
        tera.add_raw_templates(sources.iter().map(|s| (s.name.as_str(), s.content.as_str())))
            .map_err(TemplateError::Parse)?;

        tracing::info!(
            dir = %self.dir.display(),
            templates = sources.len(),
            functions = self.functions.len(),
            "loaded templates"
        );

        Ok(Registry { tera })
    }

    /// The registry a render should use, loading it first when needed.
    pub fn registry(&self) -> Result<Arc<Registry>, TemplateError> {
        if self.reload {
            tracing::debug!(dir = %self.dir.display(), "reloading templates");
            return self.load();
        }

        {
            let current = self.current.read().map_err(|_| TemplateError::Poisoned)?;
            if let Some(registry) = current.as_ref() {
                return Ok(registry.clone());
            }
        }

        self.load()
    }

    /// Render template `name` with `data` into `writer`.
    pub fn render<W, T>(&self, writer: W, name: &str, data: &T) -> Result<(), TemplateError>
    where
        W: io::Write,
        T: Serialize + ?Sized,
    {
        self.registry()?.render_to(name, data, writer)
    }

    /// Render template `name` into an HTML response with `status`.
    pub fn html<T>(&self, status: StatusCode, name: &str, data: &T) -> Result<Response, TemplateError>
    where
        T: Serialize + ?Sized,
    {
        let mut body = Vec::new();
        self.render(&mut body, name, data)?;
        Ok(with_content_type(status, HTML_CONTENT_TYPE, body))
    }
}

impl core::fmt::Debug for Templates {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort_unstable();
        f.debug_struct("Templates")
            .field("dir", &self.dir)
            .field("reload", &self.reload)
            .field("functions", &functions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use minions_core::vars;
    use serde_json::Value;

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.html"), "A: {{ name }}").unwrap();
        fs::write(dir.path().join("sub/b.html"), "B: {{ name | upper }}").unwrap();
        dir
    }

    fn render_string(templates: &Templates, name: &str, data: &impl Serialize) -> Result<String, TemplateError> {
        let mut out = Vec::new();
        templates.render(&mut out, name, data)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn registers_files_by_relative_name() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);

        let registry = templates.load().unwrap();
        let mut names: Vec<_> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.html", "sub/b.html"]);

        let data = vars! { "name" => "ada" };
        assert_eq!(render_string(&templates, "a.html", &data).unwrap(), "A: ada");
        assert_eq!(render_string(&templates, "sub/b.html", &data).unwrap(), "B: ADA");
    }

    #[test]
    fn first_render_loads_lazily() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);

        let out = render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap();
        assert_eq!(out, "A: x");
    }

    #[test]
    fn without_reload_new_files_stay_invisible() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);
        render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap();

        fs::write(dir.path().join("late.html"), "late").unwrap();

        let err = render_string(&templates, "late.html", &vars! {}).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name) if name == "late.html"));
    }

    #[test]
    fn with_reload_new_files_appear_on_next_render() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), true);
        render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap();

        fs::write(dir.path().join("late.html"), "late").unwrap();

        assert_eq!(render_string(&templates, "late.html", &vars! {}).unwrap(), "late");
    }

    #[test]
    fn with_reload_edits_are_picked_up() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), true);
        assert_eq!(render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap(), "A: x");

        fs::write(dir.path().join("a.html"), "changed {{ name }}").unwrap();

        assert_eq!(
            render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap(),
            "changed x"
        );
    }

    #[test]
    fn parse_error_aborts_load_and_keeps_previous_registry() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);
        let before = templates.load().unwrap();

        fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();
        let err = templates.load().unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)), "{err}");

        let after = templates.registry().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(!after.contains("broken.html"));
    }

    #[test]
    fn failed_first_load_is_retried_on_next_render() {
        let dir = fixture();
        fs::write(dir.path().join("broken.html"), "{{ unclosed").unwrap();
        let templates = Templates::new(dir.path(), false);

        assert!(render_string(&templates, "a.html", &vars! { "name" => "x" }).is_err());

        fs::remove_file(dir.path().join("broken.html")).unwrap();
        assert_eq!(render_string(&templates, "a.html", &vars! { "name" => "x" }).unwrap(), "A: x");
    }

    #[test]
    fn unknown_template_is_not_found() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);

        let err = render_string(&templates, "nope.html", &vars! {}).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn runtime_error_in_template_is_reported() {
        let dir = fixture();
        fs::write(dir.path().join("dict.html"), r#"{% set d = dict(pairs=["a", 1, "b"]) %}{{ d.a }}"#).unwrap();
        let templates = Templates::new(dir.path(), false);

        let err = render_string(&templates, "dict.html", &vars! {}).unwrap_err();
        match err {
            TemplateError::Render { name, .. } => assert_eq!(name, "dict.html"),
            other => panic!("expected render error, got {other:?}"),
        }
        assert!(err_message(&templates, "dict.html").contains("invalid dict call"));
    }

    fn err_message(templates: &Templates, name: &str) -> String {
        render_string(templates, name, &vars! {}).unwrap_err().to_string()
    }

    #[test]
    fn builtin_functions_are_available() {
        let dir = fixture();
        fs::write(
            dir.path().join("funcs.html"),
            r#"{{ div(dividend=7, divisor=2) }}|{% set d = dict(pairs=["who", name]) %}{{ d.who }}"#,
        )
        .unwrap();
        let templates = Templates::new(dir.path(), false);

        let out = render_string(&templates, "funcs.html", &vars! { "name" => "eve" }).unwrap();
        assert_eq!(out, "3.5|eve");
    }

    #[test]
    fn custom_functions_overwrite_builtins() {
        let dir = fixture();
        fs::write(dir.path().join("div.html"), "{{ div(dividend=1, divisor=2) }}").unwrap();
        let templates = Templates::new(dir.path(), false).function(
            "div",
            |_: &HashMap<String, Value>| -> tera::Result<Value> { Ok(Value::from("custom")) },
        );

        assert_eq!(render_string(&templates, "div.html", &vars! {}).unwrap(), "custom");
    }

    #[test]
    fn function_map_merge_replaces_by_name_and_keeps_the_rest() {
        let dir = fixture();
        fs::write(
            dir.path().join("mixed.html"),
            r#"{{ dict(pairs=["a", 1]) }}|{{ div(dividend=1, divisor=4) }}"#,
        )
        .unwrap();

        let mut extra: FunctionMap = HashMap::new();
        extra.insert(
            "dict".to_string(),
            Arc::new(|_: &HashMap<String, Value>| -> tera::Result<Value> { Ok(Value::from("no dicts")) }),
        );
        let templates = Templates::new(dir.path(), false).functions(extra);

        let out = render_string(&templates, "mixed.html", &vars! {}).unwrap();
        assert_eq!(out, "no dicts|0.25");
    }

    #[test]
    fn binary_sibling_does_not_break_the_store() {
        let dir = fixture();
        fs::write(dir.path().join(".DS_Store"), [0x00, 0x01, 0xff, 0xfe, 0x80]).unwrap();
        let templates = Templates::new(dir.path(), false);

        assert!(templates.load().unwrap().contains(".DS_Store"));
        let out = render_string(&templates, "a.html", &vars! { "name" => "ada" }).unwrap();
        assert_eq!(out, "A: ada");
    }

    #[test]
    fn html_files_are_autoescaped() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);

        let out = render_string(&templates, "a.html", &vars! { "name" => "<b>" }).unwrap();
        assert_eq!(out, "A: &lt;b&gt;");
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let templates = Templates::new(dir.path().join("missing"), false);

        let err = render_string(&templates, "a.html", &vars! {}).unwrap_err();
        assert!(matches!(err, TemplateError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn html_response_has_status_and_content_type() {
        let dir = fixture();
        let templates = Templates::new(dir.path(), false);

        let response = templates
            .html(StatusCode::ACCEPTED, "a.html", &vars! { "name" => "zoe" })
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), HTML_CONTENT_TYPE);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"A: zoe");
    }

    #[test]
    fn concurrent_renders_during_reload_see_whole_registries() {
        let dir = fixture();
        let templates = Arc::new(Templates::new(dir.path(), true));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let templates = templates.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let out = render_string(&templates, "sub/b.html", &vars! { "name" => (format!("t{i}")) })
                            .unwrap();
                        assert_eq!(out, format!("B: T{i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
