use anyhow::Context;
use cnetcore::io::{DiskCache, MemoryCache, TableCache};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Directory for parsed-network cache entries; in-memory cache when unset.
    pub cache_dir: Option<PathBuf>,
    pub use_cache: bool,
    /// Executable used for camera-model coordinate conversion.
    pub campt_command: PathBuf,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            use_cache: true,
            campt_command: PathBuf::from("campt"),
        }
    }
}

impl ReviewConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading review config {}", path_ref.display()))?;
        let config: ReviewConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing review config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line flags win over whatever the config file set.
    pub fn with_overrides(
        mut self,
        cache_dir: Option<PathBuf>,
        no_cache: bool,
        campt_command: Option<PathBuf>,
    ) -> Self {
        if cache_dir.is_some() {
            self.cache_dir = cache_dir;
        }
        if let Some(command) = campt_command {
            self.campt_command = command;
        }
        self.use_cache &= !no_cache;
        self
    }

    /// Disk cache when a directory is configured, in-memory otherwise; none when disabled.
    pub fn build_cache(&self) -> Option<Box<dyn TableCache>> {
        if !self.use_cache {
            return None;
        }
        match &self.cache_dir {
            Some(dir) => Some(Box::new(DiskCache::new(dir))),
            None => Some(Box::new(MemoryCache::new())),
        }
    }
}

/// Reads an ISIS cube list: one path per line, blank lines and `#` comments skipped.
/// Relative entries resolve against the list's directory.
pub fn load_cube_list<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<PathBuf>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading cube list {}", path_ref.display()))?;
    let base = path_ref.parent().unwrap_or_else(|| Path::new(""));
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let entry = PathBuf::from(line);
            if entry.is_absolute() {
                entry
            } else {
                base.join(entry)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnetcore::io::CacheKey;
    use cnetcore::model::MeasurementTable;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn no_cache_flag_disables_cache() {
        let cfg = ReviewConfig::default().with_overrides(None, true, None);
        assert!(!cfg.use_cache);
        assert!(cfg.build_cache().is_none());
        assert_eq!(cfg.campt_command, PathBuf::from("campt"));
    }

    #[test]
    fn flags_override_config_file_values() {
        let file = ReviewConfig {
            cache_dir: Some(PathBuf::from("/var/cache/cnet")),
            use_cache: true,
            campt_command: PathBuf::from("/opt/isis/bin/campt"),
        };

        let kept = file.clone().with_overrides(None, false, None);
        assert_eq!(kept, file);

        let overridden = file.with_overrides(
            Some(PathBuf::from("/scratch/cnet")),
            false,
            Some(PathBuf::from("/usr/local/bin/campt")),
        );
        assert_eq!(overridden.cache_dir, Some(PathBuf::from("/scratch/cnet")));
        assert_eq!(overridden.campt_command, PathBuf::from("/usr/local/bin/campt"));
        assert!(overridden.use_cache);
    }

    #[test]
    fn cache_lands_only_in_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let key = CacheKey::new("/data/net.csv", 1);
        let table = MeasurementTable::new(Vec::new(), Vec::new());

        let cfg =
            ReviewConfig::default().with_overrides(Some(dir.path().to_path_buf()), false, None);
        cfg.build_cache().unwrap().set(&key, &table).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let in_memory = ReviewConfig::default().build_cache().unwrap();
        assert!(in_memory.get(&key).is_none());
        in_memory.set(&key, &table).unwrap();
        assert_eq!(in_memory.get(&key), Some(table));
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"cache_dir: /tmp/cnet-cache\ncampt_command: /opt/isis/bin/campt\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ReviewConfig::load(&path).unwrap();
        assert_eq!(cfg.cache_dir, Some(PathBuf::from("/tmp/cnet-cache")));
        assert_eq!(cfg.campt_command, PathBuf::from("/opt/isis/bin/campt"));
        assert!(cfg.use_cache);
    }

    #[test]
    fn cube_list_skips_comments_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("cubes.lis");
        fs::write(&list, "# session cubes\nA.cub\n\n/abs/B.cub\n").unwrap();
        let cubes = load_cube_list(&list).unwrap();
        assert_eq!(cubes, vec![dir.path().join("A.cub"), PathBuf::from("/abs/B.cub")]);
    }
}
