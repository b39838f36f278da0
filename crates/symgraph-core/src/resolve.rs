//! Mapping import targets onto files of the analyzed project.

use crate::types::{DependencyKind, DependencyRecord, Language};

/// Normalize a path to `/` separators, dropping `.` segments and folding `..`.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Strip a known source extension from the last path segment.
pub fn strip_source_extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && Language::from_extension(ext).is_some() => stem,
        _ => path,
    }
}

/// Dotted module id of a file: `src/app/models.py` becomes `src.app.models`.
pub fn module_id(path: &str) -> String {
    let normalized = normalize_path(path);
    strip_source_extension(&normalized)
        .trim_start_matches('/')
        .replace('/', ".")
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        normalize_path(rest)
    } else {
        normalize_path(&format!("{dir}/{rest}"))
    }
}

/// A path to look for. Anchored candidates come from relative imports and
/// must match a file exactly; the rest may match any file whose path ends
/// with them.
#[derive(Debug, PartialEq)]
struct Candidate {
    path: String,
    anchored: bool,
}

impl Candidate {
    fn anchored(path: String) -> Self {
        Self { path, anchored: true }
    }

    fn suffix(path: String) -> Self {
        Self { path, anchored: false }
    }
}

/// Resolves import records to known project files.
pub struct ImportResolver {
    /// `(stem, file)` pairs sorted by file, where stem is the normalized
    /// path without its extension.
    files: Vec<(String, String)>,
}

impl ImportResolver {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a str>) -> Self {
        let mut files: Vec<(String, String)> = files
            .into_iter()
            .map(|f| (strip_source_extension(&normalize_path(f)).to_string(), f.to_string()))
            .collect();
        files.sort_by(|a, b| a.1.cmp(&b.1));
        files.dedup_by(|a, b| a.1 == b.1);
        Self { files }
    }

    /// File an import refers to, if it is part of the project. Candidates
    /// are tried in order; an exact path beats a suffix match and ties go to
    /// the smallest path. A file never resolves to itself.
    pub fn resolve(&self, dep: &DependencyRecord) -> Option<&str> {
        candidates(dep)
            .iter()
            .find_map(|c| self.find(c, &dep.source_file))
    }

    fn find(&self, candidate: &Candidate, importer: &str) -> Option<&str> {
        if candidate.path.is_empty() {
            return None;
        }
        let forms = [
            candidate.path.clone(),
            format!("{}/index", candidate.path),
            format!("{}/__init__", candidate.path),
        ];
        let others = || self.files.iter().filter(|(_, file)| file != importer);
        for form in &forms {
            if let Some((_, file)) = others().find(|(stem, _)| stem == form) {
                return Some(file);
            }
        }
        if candidate.anchored {
            return None;
        }
        for form in &forms {
            let suffix = format!("/{form}");
            if let Some((_, file)) = others().find(|(stem, _)| stem.ends_with(&suffix)) {
                return Some(file);
            }
        }
        None
    }
}

fn candidates(dep: &DependencyRecord) -> Vec<Candidate> {
    let target = dep.target.trim();
    let dir = parent_dir(&normalize_path(&dep.source_file)).to_string();
    let is_python = Language::from_path(&dep.source_file) == Some(Language::Python);

    if target.starts_with("./") || target.starts_with("../") || target == "." || target == ".." {
        if !is_python || target.contains('/') {
            let joined = join(&dir, target);
            return vec![Candidate::anchored(strip_source_extension(&joined).to_string())];
        }
    }

    let mut out = Vec::new();
    if is_python && target.starts_with('.') {
        // `from ..pkg import mod`: one dot is the current package.
        let dots = target.chars().take_while(|c| *c == '.').count();
        let mut base = dir.clone();
        for _ in 1..dots {
            base = parent_dir(&base).to_string();
        }
        let rest = target[dots..].replace('.', "/");
        let module = if rest.is_empty() { base } else { join(&base, &rest) };
        for name in &dep.imported_names {
            out.push(Candidate::anchored(join(&module, name)));
        }
        out.push(Candidate::anchored(module));
        return out;
    }

    let path = if target.contains('/') {
        target.to_string()
    } else {
        target.replace('.', "/")
    };
    if is_python {
        for name in dep.imported_names.iter().filter(|n| *n != "*") {
            out.push(Candidate::suffix(format!("{path}/{name}")));
        }
    }
    out.push(Candidate::suffix(path.clone()));
    if dep.kind == DependencyKind::StaticImport {
        if let Some((owner, _member)) = path.rsplit_once('/') {
            out.push(Candidate::suffix(owner.to_string()));
        }
    }
    out
}
