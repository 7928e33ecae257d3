use crate::error::ConversionError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where relative filter names are looked up, in priority order.
#[derive(Debug, Clone)]
pub struct FilterSearch {
    pub working_dir: PathBuf,
    pub defaults_dir: Option<PathBuf>,
    pub user_filter_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub name: String,
    pub path: PathBuf,
}

impl ResolvedFilter {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

impl FilterSearch {
    /// Candidate paths for `filter`, first match wins.
    ///
    /// Absolute names are only ever looked up as given. The per-user
    /// directory is searched by file name alone.
    pub fn candidates(&self, filter: &str) -> Vec<PathBuf> {
        let requested = Path::new(filter);
        if requested.is_absolute() {
            return vec![requested.to_path_buf()];
        }

        let mut paths = vec![self.working_dir.join(requested)];
        if let Some(dir) = &self.defaults_dir {
            paths.push(dir.join(requested));
        }
        let base = requested.file_name().map(Path::new).unwrap_or(requested);
        paths.push(self.user_filter_dir.join(base));
        paths
    }
}

pub fn resolve_filters(
    filters: &[String],
    search: &FilterSearch,
) -> Result<Vec<ResolvedFilter>, ConversionError> {
    filters
        .iter()
        .map(|filter| resolve_filter_with(filter, search, make_executable))
        .collect()
}

/// Resolves one filter, repairing a missing execute bit with `repair`.
pub fn resolve_filter_with<F>(
    filter: &str,
    search: &FilterSearch,
    repair: F,
) -> Result<ResolvedFilter, ConversionError>
where
    F: Fn(&Path) -> io::Result<()>,
{
    if filter.trim().is_empty() {
        return Err(ConversionError::invalid_input("filter names must not be empty"));
    }

    let candidates = search.candidates(filter);
    let Some(found) = candidates.iter().find(|path| path.is_file()) else {
        return Err(ConversionError::FilterNotFound {
            filter: filter.to_string(),
            searched: candidates,
        });
    };

    if !is_executable(found) {
        if let Err(err) = repair(found) {
            warn!(
                filter,
                path = %found.display(),
                error = %err,
                "could not make filter executable"
            );
            return Err(ConversionError::FilterNotExecutable {
                filter: filter.to_string(),
                path: found.clone(),
                reason: err.to_string(),
            });
        }
        info!(filter, path = %found.display(), "made filter executable");
    }

    info!(filter, path = %found.display(), "using filter");
    Ok(ResolvedFilter {
        name: filter.to_string(),
        path: found.clone(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use rustix::fs::{Access, access};
    use std::os::unix::fs::MetadataExt;

    if access(path, Access::EXEC_OK).is_err() {
        return false;
    }
    // Root passes EXEC_OK with any execute bit set; an owned file still needs its owner bit.
    path.metadata()
        .map(|metadata| {
            metadata.uid() != rustix::process::geteuid().as_raw() || metadata.mode() & 0o100 != 0
        })
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = path.metadata()?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
