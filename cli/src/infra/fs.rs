//! Filesystem infrastructure: implements `LocalFs` for `LinuxHost`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalFs};
use crate::infra::host::LinuxHost;

/// Write `content` to `path` via a sibling temp file and rename, so readers
/// never observe a partial file. The temp file gets `mode` before any bytes
/// land in it.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the temp
/// file cannot be written, chmod-ed or renamed.
pub fn write_atomic(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    use std::io::Write as _;

    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = parent.join(temp_name);

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options
        .open(&temp_path)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;
    set_mode(&temp_path, mode)?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;
    drop(file);

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

fn set_mode(path: &Path, _mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(_mode))
            .with_context(|| format!("setting permissions on {}", path.display()))?;
    }
    Ok(())
}

impl<R: CommandRunner> LocalFs for LinuxHost<R> {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("removing directory {}", path.display()))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write_private(&self, path: &Path, content: &[u8]) -> Result<()> {
        write_atomic(path, content, 0o600)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        set_mode(path, mode)
    }

    fn mode(&self, path: &Path) -> Result<Option<u32>> {
        let meta =
            std::fs::metadata(path).with_context(|| format!("inspecting {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(Some(meta.permissions().mode() & 0o7777))
        }
        #[cfg(not(unix))]
        {
            let _ = meta;
            Ok(None)
        }
    }
}
