// Copyright (c) The cts-verify Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to the reference source tree through git.
//!
//! Every git invocation runs with an explicit working directory; the process-wide current
//! directory is never changed.

use crate::{errors::SourceError, integrity::SourceRevision};
use camino::{Utf8Path, Utf8PathBuf};
use std::{borrow::Cow, fs};
use tracing::{debug, info, trace, warn};

/// A git command line, run in a given directory.
#[derive(Clone, Debug)]
struct GitCli<'a> {
    dir: &'a Utf8Path,
    args: Vec<Cow<'a, str>>,
}

impl<'a> GitCli<'a> {
    fn new(dir: &'a Utf8Path) -> Self {
        Self { dir, args: vec![] }
    }

    fn add_arg(&mut self, arg: impl Into<Cow<'a, str>>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn command_line(&self) -> String {
        let mut command = String::from("git");
        for arg in &self.args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    fn to_expression(&self) -> duct::Expression {
        duct::cmd("git", self.args.iter().map(|arg| &**arg)).dir(self.dir)
    }

    /// Runs the command, returning its trimmed standard output.
    fn read(&self) -> Result<String, SourceError> {
        let expression = self.to_expression();
        trace!("executing command: {expression:?} in `{}`", self.dir);
        let output = expression
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|err| SourceError::GitExec {
                command: self.command_line(),
                dir: self.dir.to_owned(),
                err,
            })?;

        if !output.status.success() {
            return Err(SourceError::GitFailed {
                command: self.command_line(),
                dir: self.dir.to_owned(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| SourceError::NonUtf8Output {
            command: self.command_line(),
        })?;
        Ok(stdout.trim().to_owned())
    }
}

/// A checkout of the reference source tree.
#[derive(Clone, Debug)]
pub struct SourceTree {
    root: Utf8PathBuf,
}

impl SourceTree {
    /// Opens an existing checkout, verifying that `root` is inside a git work tree.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        let inside = GitCli::new(&root)
            .add_arg("rev-parse")
            .add_arg("--is-inside-work-tree")
            .read()?;
        if inside != "true" {
            return Err(SourceError::NotWorkTree { dir: root });
        }
        debug!("using source tree at `{root}`");
        Ok(Self { root })
    }

    /// Clones the source tree into `dest`, trying each mirror in turn until one succeeds.
    ///
    /// A relative `dest` is resolved against the current directory. Missing parent directories
    /// are created.
    pub fn clone_from_mirrors(mirrors: &[String], dest: &Utf8Path) -> Result<Self, SourceError> {
        let cwd = std::env::current_dir()
            .and_then(|cwd| Utf8PathBuf::try_from(cwd).map_err(|err| err.into_io_error()))
            .map_err(|err| SourceError::CloneDest {
                dest: dest.to_owned(),
                err,
            })?;
        Self::clone_from_mirrors_in(mirrors, &cwd, dest)
    }

    fn clone_from_mirrors_in(
        mirrors: &[String],
        cwd: &Utf8Path,
        dest: &Utf8Path,
    ) -> Result<Self, SourceError> {
        let dest = &cwd.join(dest);
        let parent = dest.parent().unwrap_or(dest);
        fs::create_dir_all(parent).map_err(|err| SourceError::CloneDest {
            dest: dest.to_owned(),
            err,
        })?;

        for mirror in mirrors {
            info!("cloning `{mirror}` into `{dest}`");
            let res = GitCli::new(parent)
                .add_arg("clone")
                .add_arg(mirror.as_str())
                .add_arg(dest.as_str())
                .read()
                .and_then(|_| Self::open(dest));
            match res {
                Ok(tree) => return Ok(tree),
                Err(err) => {
                    warn!("failed to clone `{mirror}`, trying the next mirror: {err}");
                }
            }
        }

        Err(SourceError::AllMirrorsFailed {
            dest: dest.to_owned(),
            mirrors: mirrors.to_vec(),
        })
    }

    /// Returns the root of the checkout.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Checks out `tag`.
    pub fn checkout(&self, tag: &str) -> Result<(), SourceError> {
        info!("checking out `{tag}` in `{}`", self.root);
        GitCli::new(&self.root)
            .add_arg("checkout")
            .add_arg("--quiet")
            .add_arg(tag)
            .read()?;
        Ok(())
    }

    /// Returns the revision currently checked out.
    pub fn head_revision(&self) -> Result<SourceRevision, SourceError> {
        let output = GitCli::new(&self.root)
            .add_arg("rev-parse")
            .add_arg("HEAD")
            .read()?;
        Ok(output.parse()?)
    }
}
