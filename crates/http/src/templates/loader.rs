use std::path::{Component, Path, PathBuf};

use super::TemplateError;

/// A template file read from disk, not parsed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Source {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

/// Read every non-directory entry beneath `root`, sorted by path.
pub(crate) fn collect(root: &Path) -> Result<Vec<Source>, TemplateError> {
    if !root.is_dir() {
        return Err(TemplateError::NotADirectory(root.to_path_buf()));
    }

    let mut sources = Vec::new();
    walk(root, root, &mut sources)?;
    Ok(sources)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<Source>) -> Result<(), TemplateError> {
    let read_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| TemplateError::Read { path, source }
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(read_err(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err(dir))?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        // Symlinks are not followed into directories.
        let file_type = entry.file_type().map_err(read_err(&path))?;

        if file_type.is_dir() {
            walk(root, &path, out)?;
            continue;
        }

        // Content that is not UTF-8 is registered with replacement characters.
        let bytes = std::fs::read(&path).map_err(read_err(&path))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        out.push(Source {
            name: template_name(root, &path)?,
            path,
            content,
        });
    }

    Ok(())
}

/// Name under which the file at `path` is registered.
///
/// The root directory is stripped and the remaining components are joined
/// with `/`, so `templates/sub/b.html` under `templates` becomes
/// `sub/b.html` on every platform. `.` components are dropped.
pub fn template_name(root: &Path, path: &Path) -> Result<String, TemplateError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| TemplateError::InvalidName(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| TemplateError::InvalidName(path.to_path_buf()))?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => return Err(TemplateError::InvalidName(path.to_path_buf())),
        }
    }

    if parts.is_empty() {
        return Err(TemplateError::InvalidName(path.to_path_buf()));
    }

    Ok(parts.join("/"))
}
