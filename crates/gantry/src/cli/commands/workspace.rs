//! Locating the workspace and the project a command applies to

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use gantry_core::config::{load_config_from_dir, workspace_root};
use gantry_core::{Config, ConfigError, GantryError, WorkspaceGraph};

/// Loaded workspace plus the project the command targets
#[derive(Debug)]
pub struct WorkspaceContext {
    /// Directory containing the config file, or the cwd when there is none
    pub root: PathBuf,
    /// Parsed configuration
    pub config: Config,
    /// Config file path, if one was found
    pub config_path: Option<PathBuf>,
    /// Target project path
    pub project: String,
    /// Whether the target project has any configured tasks
    pub project_configured: bool,
}

impl WorkspaceContext {
    /// Load the workspace around `cwd`.
    ///
    /// A config file that exists but fails to load is an error. With no
    /// config file at all, the cwd becomes the root with an empty graph.
    pub fn load(cwd: &Path, project: Option<&str>) -> anyhow::Result<Self> {
        let (config, config_path, root) = match load_config_from_dir(cwd) {
            Ok((config, path)) => {
                let root = workspace_root(&path);
                (config, Some(path), root)
            }
            Err(GantryError::Config(ConfigError::NotFound(_))) => {
                warn!(cwd = %cwd.display(), "no config file found, using defaults");
                (Config::default(), None, cwd.to_path_buf())
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("Failed to load workspace configuration"))
            }
        };

        let project = match project {
            Some(p) => p.to_string(),
            None => project_for_dir(&root, cwd, &config.projects),
        };
        let project_configured = config.projects.contains_project(&project);
        if !project_configured {
            warn!(project = %project, "project has no configured dependencies");
        }
        debug!(root = %root.display(), project = %project, "workspace context ready");

        Ok(Self {
            root,
            config,
            config_path,
            project,
            project_configured,
        })
    }
}

/// Project path for `dir`, relative to the workspace root.
///
/// When a configured project matches modulo a leading `./` or trailing `/`,
/// its exact key is returned so graph lookups succeed.
pub fn project_for_dir(root: &Path, dir: &Path, graph: &WorkspaceGraph) -> String {
    let relative = dir
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    let wanted = normalize(&relative);

    graph
        .project_paths()
        .into_iter()
        .find(|key| normalize(key) == wanted)
        .map(str::to_string)
        .unwrap_or(wanted)
}

fn normalize(path: &str) -> String {
    let trimmed = path.strip_prefix("./").unwrap_or(path).trim_end_matches('/');
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}
