//! Saved foundation targets.
//!
//! Each target is a copy of a logged-in cf `config.json`, stored as
//! `<dir>/<name>/.cf/config.json` so that `<dir>/<name>` can be used as
//! `CF_HOME` for that foundation.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "config.json";
const CF_DIR: &str = ".cf";

/// A saved foundation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub api: String,
    pub organization: String,
    pub space: String,
}

impl Target {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api.is_empty() {
            missing.push("API endpoint");
        }
        if self.organization.is_empty() {
            missing.push("Organization");
        }
        if self.space.is_empty() {
            missing.push("Space");
        }
        missing
    }
}

/// The subset of cf's `config.json` describing the current target.
#[derive(Debug, Default, Deserialize)]
struct CfConfigFile {
    #[serde(rename = "Target", default)]
    target: String,
    #[serde(rename = "OrganizationFields", default)]
    organization: NamedFields,
    #[serde(rename = "SpaceFields", default)]
    space: NamedFields,
}

#[derive(Debug, Default, Deserialize)]
struct NamedFields {
    #[serde(rename = "Name", default)]
    name: String,
}

/// Directory of saved targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStore {
    dir: PathBuf,
}

impl TargetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<plugin home>/.cf/.mysql-tools`, where the plugin home is
    /// `plugin_home` if given, else the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn default_location(plugin_home: Option<PathBuf>) -> Result<Self> {
        let home = match plugin_home {
            Some(home) => home,
            None => directories::BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .ok_or(Error::NoHomeDirectory)?,
        };
        Ok(Self::new(home.join(CF_DIR).join(".mysql-tools")))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `CF_HOME` for the named target.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a single path component.
    pub fn target_home(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }

    /// Copy the cf configuration at `source` into the store as `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the file cannot be read or
    /// parsed, it does not target an API, organization and space, or the
    /// copy cannot be written.
    pub fn save_target(&self, source: &Path, name: &str) -> Result<Target> {
        let home = self.target_home(name)?;
        let contents = fs::read(source).map_err(|e| Error::io(source, e))?;
        let target = parse_target(name, source, &contents)?;

        let missing = target.missing_fields();
        if !missing.is_empty() {
            return Err(Error::IncompleteTarget { fields: missing });
        }

        let cf_dir = home.join(CF_DIR);
        create_private_dir(&cf_dir)?;
        let destination = cf_dir.join(CONFIG_FILE);
        write_private_file(&destination, &contents)?;

        debug!(name, path = %destination.display(), "Saved target");
        Ok(target)
    }

    /// Every saved target, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or a saved
    /// configuration does not parse.
    pub fn list_targets(&self) -> Result<Vec<Target>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.dir, e)),
        };

        let mut targets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;
            let path = entry.path().join(CF_DIR).join(CONFIG_FILE);
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let contents = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            targets.push(parse_target(&name, &path, &contents)?);
        }

        targets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(targets)
    }

    /// Delete the named target. Removing an unknown target succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the directory cannot be
    /// removed.
    pub fn remove_target(&self, name: &str) -> Result<()> {
        let home = self.target_home(name)?;
        match fs::remove_dir_all(&home) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(home, e)),
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(()),
        _ => Err(Error::invalid_target_name(name)),
    }
}

fn parse_target(name: &str, path: &Path, contents: &[u8]) -> Result<Target> {
    let file: CfConfigFile = serde_json::from_slice(contents).map_err(|e| Error::ParseFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Target {
        name: name.to_string(),
        api: file.target,
        organization: file.organization.name,
        space: file.space.name,
    })
}

fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|e| Error::io(path, e))
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| Error::io(path, e))?;
    file.write_all(contents).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    const CF_CONFIG: &str = r#"{
  "ConfigVersion": 3,
  "Target": "https://api.sys.example.com",
  "OrganizationFields": {"GUID": "org-guid", "Name": "system"},
  "SpaceFields": {"GUID": "space-guid", "Name": "mysql", "AllowSSH": true}
}"#;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.json");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_save_target_copies_config() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), CF_CONFIG);

        let target = store.save_target(&source, "primary-site").unwrap();

        assert_eq!(
            target,
            Target {
                name: "primary-site".to_string(),
                api: "https://api.sys.example.com".to_string(),
                organization: "system".to_string(),
                space: "mysql".to_string(),
            }
        );
        let saved = store.target_home("primary-site").unwrap().join(".cf/config.json");
        assert_eq!(fs::read_to_string(saved).unwrap(), CF_CONFIG);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_target_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), CF_CONFIG);

        store.save_target(&source, "primary-site").unwrap();

        let cf_dir = store.dir().join("primary-site/.cf");
        let dir_mode = fs::metadata(&cf_dir).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(cf_dir.join("config.json")).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
        assert_eq!(file_mode, 0o600);
    }

    #[test]
    fn test_save_target_requires_logged_in_config() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), r#"{"ConfigVersion": 3}"#);

        let err = store.save_target(&source, "primary-site").unwrap_err();

        assert_eq!(
            err.to_string(),
            "saved configuration must target Cloudfoundry: missing fields: [API endpoint,Organization,Space]"
        );
        assert!(!store.dir().join("primary-site").exists());
    }

    #[test]
    fn test_save_target_rejects_invalid_json() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), "not json");

        let err = store.save_target(&source, "primary-site").unwrap_err();
        assert!(matches!(err, Error::ParseFailed { .. }));
    }

    #[test]
    fn test_list_targets_sorted_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), CF_CONFIG);

        store.save_target(&source, "west").unwrap();
        store.save_target(&source, "east").unwrap();
        fs::create_dir_all(store.dir().join("stray")).unwrap();

        let targets = store.list_targets().unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["east", "west"]);
        assert_eq!(targets[0].space, "mysql");
    }

    #[test]
    fn test_list_targets_without_store_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("missing"));
        assert!(store.list_targets().unwrap().is_empty());
    }

    #[test]
    fn test_remove_target() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TargetStore::new(tmp.path().join("store"));
        let source = write_config(tmp.path(), CF_CONFIG);
        store.save_target(&source, "east").unwrap();

        store.remove_target("east").unwrap();
        store.remove_target("east").unwrap();

        assert!(store.list_targets().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_names_escaping_the_store() {
        let store = TargetStore::new("/tmp/store");
        for name in ["", ".", "..", "../etc", "a/b", "/abs"] {
            let err = store.remove_target(name).unwrap_err();
            assert_eq!(err.to_string(), format!("invalid target name {name:?}"));
        }
    }

    #[test]
    fn test_default_location_under_plugin_home() {
        let store = TargetStore::default_location(Some(PathBuf::from("/opt/plugins"))).unwrap();
        assert_eq!(store.dir(), Path::new("/opt/plugins/.cf/.mysql-tools"));
    }
}
