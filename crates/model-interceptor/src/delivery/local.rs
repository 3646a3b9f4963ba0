//! Local file delivery confined to a content root.

use super::{sanitize_filename, Delivery, Payload, OCTET_STREAM};
use crate::error::{BoxError, InterceptError};
use futures::TryStreamExt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// The directory every local target must resolve inside.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// A relative root is anchored at the current working directory.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let root = normalize(&absolute).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("content root {} escapes the filesystem root", root.display()),
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `target` to an absolute path inside the root.
    ///
    /// Percent-encoded sequences are decoded first, so `%2e%2e%2f` is treated
    /// exactly like `../`.
    pub fn resolve(&self, target: &str) -> Result<PathBuf, InterceptError> {
        let decoded = urlencoding::decode(target)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| target.to_string());

        let candidate = Path::new(&decoded);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        match normalize(&joined) {
            Some(path) if path.starts_with(&self.root) => Ok(path),
            _ => Err(InterceptError::SandboxViolation(target.to_string())),
        }
    }

    /// Reject paths that only escape the root through symlinks.
    async fn confirm_canonical(&self, target: &str, path: &Path) -> Result<(), InterceptError> {
        let (real_root, real_path) = match (
            fs::canonicalize(&self.root).await,
            fs::canonicalize(path).await,
        ) {
            (Ok(root), Ok(path)) => (root, path),
            (Err(e), _) | (_, Err(e)) => {
                return Err(InterceptError::LocalNotFound {
                    target: target.to_string(),
                    cause: describe_io_error(&e).to_string(),
                })
            }
        };

        if real_path.starts_with(&real_root) {
            Ok(())
        } else {
            warn!(
                target = target,
                resolved = %real_path.display(),
                "Local target escapes content root through a symlink"
            );
            Err(InterceptError::SandboxViolation(target.to_string()))
        }
    }
}

/// Lexically normalize an absolute path. `None` if `..` climbs above `/`.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

fn describe_io_error(e: &io::Error) -> &'static str {
    if e.kind() == io::ErrorKind::NotFound {
        "File not found"
    } else {
        "Cannot read file"
    }
}

/// Stream a local file without loading it into memory.
pub async fn serve_local(sandbox: &Sandbox, target: &str) -> Result<Payload, InterceptError> {
    let path = sandbox.resolve(target)?;

    let not_found = |cause: &str| InterceptError::LocalNotFound {
        target: target.to_string(),
        cause: cause.to_string(),
    };

    let metadata = fs::metadata(&path)
        .await
        .map_err(|e| not_found(describe_io_error(&e)))?;
    if !metadata.is_file() {
        return Err(not_found("Path is not a file"));
    }
    sandbox.confirm_canonical(target, &path).await?;

    let file = fs::File::open(&path)
        .await
        .map_err(|e| not_found(describe_io_error(&e)))?;
    let size = metadata.len();
    debug!(path = %path.display(), size, "Serving local file");

    let stream =
        ReaderStream::with_capacity(file, READ_CHUNK_SIZE).map_err(|e| Box::new(e) as BoxError);

    Ok(Payload {
        content_type: OCTET_STREAM.to_string(),
        content_length: Some(size),
        filename: path
            .file_name()
            .and_then(|name| sanitize_filename(&name.to_string_lossy())),
        body: Delivery::new(stream, Some(size)),
    })
}
