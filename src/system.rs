//! Contains all code dealing with system access.

use std::env::{current_dir, split_paths, var_os};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use tracing::{trace, warn};

use crate::ast::{BuiltIn, ResolvedCommand};
use crate::error::BuiltinError;

/// Process state the interpreter reads and changes.
///
/// Nothing here is written back to the process: `cd` only moves
/// `current_dir`, and children are started inside it.
#[derive(Clone, Debug)]
pub struct Environment {
    /// The shell's working directory.
    pub current_dir: PathBuf,

    /// Directories searched for external commands, in order.
    pub search_path: Vec<PathBuf>,

    /// Target of `~` in `cd`.
    pub home: Option<PathBuf>,
}

impl Environment {
    /// Captures the working directory, `PATH` and home directory of the
    /// running process.
    pub fn from_process() -> io::Result<Environment> {
        Ok(Environment {
            current_dir: current_dir()?,
            search_path: get_path(),
            home: dirs::home_dir(),
        })
    }

    /// Resolves a possibly relative path against the working directory. An
    /// empty path is the working directory itself.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.current_dir.join(path)
    }
}

/// Gets a vector of all paths in the PATH environment variable.
pub fn get_path() -> Vec<PathBuf> {
    match var_os("PATH") {
        Some(path) => split_paths(&path).collect(),
        None => {
            warn!("No PATH environment variable found!");
            Vec::new()
        }
    }
}

/// Classifies a command name. Built-ins win over anything on the search path,
/// and the first search path directory holding an executable wins over later
/// ones.
pub fn resolve(env: &Environment, name: &str) -> ResolvedCommand {
    if let Some(built_in) = BuiltIn::from_name(name) {
        return ResolvedCommand::BuiltIn(built_in);
    }

    let found = if name.contains('/') {
        Some(env.resolve_path(Path::new(name))).filter(|path| is_executable(path))
    } else {
        search_for_executable_file(env, name)
    };

    match found {
        Some(path) => ResolvedCommand::External(path),
        None => ResolvedCommand::NotFound(name.to_string()),
    }
}

/// Searches for an executable file in the search path directories.
pub fn search_for_executable_file(env: &Environment, file_name: &str) -> Option<PathBuf> {
    env.search_path.iter().find_map(|dir| {
        let candidate = env.resolve_path(dir).join(file_name);
        trace!(candidate = %candidate.display(), "probing search path");
        is_executable(&candidate).then_some(candidate)
    })
}

/// Determines if a path is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

/// Expands a leading `~` to the home directory. Returns `None` when the path
/// needs a home directory and there is none.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> Option<PathBuf> {
    if path == "~" {
        home.map(Path::to_path_buf)
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

/// Changes the current directory.
pub fn change_directory(env: &mut Environment, path: &str) -> Result<(), BuiltinError> {
    let expanded = expand_tilde(path, env.home.as_deref()).ok_or(BuiltinError::CdHomeNotSet)?;
    let shown = expanded.display().to_string();

    let target = fs::canonicalize(env.resolve_path(&expanded)).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BuiltinError::CdNoSuchFile(shown.clone()),
        ErrorKind::NotADirectory => BuiltinError::CdNotADirectory(shown.clone()),
        ErrorKind::PermissionDenied => BuiltinError::CdPermissionDenied(shown.clone()),
        _ => BuiltinError::Cd {
            path: shown.clone(),
            source: e,
        },
    })?;

    if !target.is_dir() {
        return Err(BuiltinError::CdNotADirectory(shown));
    }
    if access(&target, AccessFlags::X_OK).is_err() {
        return Err(BuiltinError::CdPermissionDenied(shown));
    }

    env.current_dir = target;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// An environment rooted in a scratch directory with the given search path.
    pub(crate) fn scratch_env(dir: &TempDir, search_path: Vec<PathBuf>) -> Environment {
        Environment {
            current_dir: fs::canonicalize(dir.path()).unwrap(),
            search_path,
            home: Some(dir.path().to_path_buf()),
        }
    }

    pub(crate) fn write_file(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn builtins_shadow_the_search_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("echo"), 0o755);
        let env = scratch_env(&dir, vec![dir.path().to_path_buf()]);

        assert_eq!(resolve(&env, "echo"), ResolvedCommand::BuiltIn(BuiltIn::Echo));
    }

    #[test]
    fn first_directory_with_an_executable_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_file(&first.path().join("tool"), 0o755);
        write_file(&second.path().join("tool"), 0o755);
        let env = scratch_env(
            &first,
            vec![second.path().to_path_buf(), first.path().to_path_buf()],
        );

        assert_eq!(
            resolve(&env, "tool"),
            ResolvedCommand::External(second.path().join("tool"))
        );
    }

    #[test]
    fn files_without_execute_permission_are_skipped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_file(&first.path().join("tool"), 0o644);
        write_file(&second.path().join("tool"), 0o755);
        let env = scratch_env(
            &first,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );

        assert_eq!(
            resolve(&env, "tool"),
            ResolvedCommand::External(second.path().join("tool"))
        );
    }

    #[test]
    fn directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("tool")).unwrap();
        let env = scratch_env(&dir, vec![dir.path().to_path_buf()]);

        assert_eq!(
            resolve(&env, "tool"),
            ResolvedCommand::NotFound("tool".to_string())
        );
    }

    #[test]
    fn unknown_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let env = scratch_env(&dir, vec![dir.path().to_path_buf()]);

        assert_eq!(
            resolve(&env, "nonexistent_cmd_xyz"),
            ResolvedCommand::NotFound("nonexistent_cmd_xyz".to_string())
        );
    }

    #[test]
    fn names_with_a_slash_skip_the_search_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("script"), 0o755);
        let env = scratch_env(&dir, Vec::new());

        assert_eq!(
            resolve(&env, "./script"),
            ResolvedCommand::External(env.current_dir.join("./script"))
        );
    }

    #[test]
    fn empty_search_path_entry_is_the_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("tool"), 0o755);
        let env = scratch_env(&dir, vec![PathBuf::new()]);

        assert_eq!(
            resolve(&env, "tool"),
            ResolvedCommand::External(env.current_dir.join("tool"))
        );
    }

    #[test]
    fn tilde_expansion() {
        let home = Path::new("/home/me");
        assert_eq!(expand_tilde("~", Some(home)), Some(PathBuf::from("/home/me")));
        assert_eq!(
            expand_tilde("~/src", Some(home)),
            Some(PathBuf::from("/home/me/src"))
        );
        assert_eq!(expand_tilde("a/~", Some(home)), Some(PathBuf::from("a/~")));
        assert_eq!(expand_tilde("~", None), None);
    }

    #[test]
    fn cd_moves_only_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut env = scratch_env(&dir, Vec::new());
        let before = current_dir().unwrap();

        change_directory(&mut env, "sub").unwrap();

        assert_eq!(env.current_dir, fs::canonicalize(dir.path().join("sub")).unwrap());
        assert_eq!(current_dir().unwrap(), before);
    }

    #[test]
    fn cd_tilde_goes_home() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut env = scratch_env(&dir, Vec::new());
        env.current_dir = fs::canonicalize(dir.path().join("sub")).unwrap();

        change_directory(&mut env, "~").unwrap();

        assert_eq!(env.current_dir, fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn cd_to_a_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = scratch_env(&dir, Vec::new());
        let before = env.current_dir.clone();

        let error = change_directory(&mut env, "/nonexistent").unwrap_err();

        assert_eq!(error.to_string(), "cd: /nonexistent: No such file or directory");
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn cd_to_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("plain"), 0o644);
        let mut env = scratch_env(&dir, Vec::new());

        let error = change_directory(&mut env, "plain").unwrap_err();

        assert_eq!(error.to_string(), "cd: plain: Not a directory");
    }

    #[test]
    fn cd_through_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("plain"), 0o644);
        let mut env = scratch_env(&dir, Vec::new());
        let before = env.current_dir.clone();

        let error = change_directory(&mut env, "plain/x").unwrap_err();

        assert_eq!(error.to_string(), "cd: plain/x: Not a directory");
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn cd_tilde_without_home_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = scratch_env(&dir, Vec::new());
        env.home = None;
        let before = env.current_dir.clone();

        let error = change_directory(&mut env, "~/sub").unwrap_err();

        assert_eq!(error.to_string(), "cd: HOME not set");
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn cd_without_search_permission_fails() {
        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let mut env = scratch_env(&dir, Vec::new());
        let before = env.current_dir.clone();

        // Privileged users pass every permission check.
        if access(&locked, AccessFlags::X_OK).is_err() {
            let into_locked = change_directory(&mut env, "locked").unwrap_err();
            let through_locked = change_directory(&mut env, "locked/inner").unwrap_err();

            assert_eq!(into_locked.to_string(), "cd: locked: Permission denied");
            assert_eq!(through_locked.to_string(), "cd: locked/inner: Permission denied");
            assert_eq!(env.current_dir, before);
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
