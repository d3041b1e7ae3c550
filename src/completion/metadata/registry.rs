//! 规范注册表
//!
//! 三层来源：内置/已注册、补全目录中发现的动态规范、`community` 目录下的社区规范。
//! 后两层只记录名称和路径，首次查询时才读取并解析。

use super::command_spec::Spec;
use super::document::parse_spec_document;
use crate::completion::error::{CompletionError, CompletionResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

const COMMUNITY_DIR: &str = "community";
const SPEC_EXTENSION: &str = "json";

/// 各层规范数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecCount {
    pub builtin: usize,
    pub dynamic: usize,
    pub community: usize,
    pub total: usize,
}

/// 规范注册表
#[derive(Default)]
pub struct SpecRegistry {
    /// 内置、注册以及已加载的规范
    specs: RwLock<HashMap<String, Arc<Spec>>>,
    /// 尚未加载的动态规范
    dynamic: RwLock<BTreeMap<String, PathBuf>>,
    /// 尚未加载的社区规范
    community: RwLock<BTreeMap<String, PathBuf>>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册规范，覆盖同名规范
    pub fn register(&self, spec: Spec) -> Arc<Spec> {
        let spec = Arc::new(spec);
        self.specs
            .write()
            .insert(spec.name.clone(), Arc::clone(&spec));
        spec
    }

    /// 注册内置规范，已有同名规范时保留已有的
    pub fn register_builtin(&self, specs: Vec<Spec>) {
        let mut map = self.specs.write();
        for spec in specs {
            map.entry(spec.name.clone()).or_insert_with(|| Arc::new(spec));
        }
    }

    /// 扫描补全目录，记录可用的动态与社区规范
    pub fn discover(&self, root: &Path) {
        let known: BTreeSet<String> = self.specs.read().keys().cloned().collect();

        let dynamic = scan_dynamic_specs(root, &known);
        let community = scan_community_specs(&root.join(COMMUNITY_DIR), &known);

        debug!(
            "发现 {} 个动态规范, {} 个社区规范: {}",
            dynamic.len(),
            community.len(),
            root.display()
        );

        self.dynamic.write().extend(dynamic);
        self.community.write().extend(community);
    }

    /// 查找规范，必要时从文件加载；从不失败
    pub async fn get_spec(&self, name: &str) -> Option<Arc<Spec>> {
        if let Some(spec) = self.loaded(name) {
            return Some(spec);
        }

        let dynamic_path = self.dynamic.read().get(name).cloned();
        if let Some(path) = dynamic_path {
            if let Some(spec) = self.load_into(name, &path, &self.dynamic).await {
                return Some(spec);
            }
        }

        let community_path = self.community.read().get(name).cloned();
        if let Some(path) = community_path {
            return self.load_into(name, &path, &self.community).await;
        }

        None
    }

    /// 已在内存中的规范
    pub fn loaded(&self, name: &str) -> Option<Arc<Spec>> {
        self.specs.read().get(name).cloned()
    }

    async fn load_into(
        &self,
        name: &str,
        path: &Path,
        tier: &RwLock<BTreeMap<String, PathBuf>>,
    ) -> Option<Arc<Spec>> {
        let loaded = match load_spec_file(path).await {
            Ok(spec) => {
                let spec = Arc::new(spec);
                let mut specs = self.specs.write();
                let entry = specs
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::clone(&spec));
                Some(Arc::clone(entry))
            }
            Err(err) => {
                debug!("加载规范失败 {}: {}", name, err);
                None
            }
        };

        // 先写入已加载表再移出待加载表，名称始终至少出现在一处
        tier.write().remove(name);
        loaded
    }

    /// 所有可用规范名称（已排序，不触发加载）
    pub fn available_specs(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.specs.read().keys().cloned().collect();
        names.extend(self.dynamic.read().keys().cloned());
        names.extend(self.community.read().keys().cloned());
        names.into_iter().collect()
    }

    pub fn spec_count(&self) -> SpecCount {
        let builtin = self.specs.read().len();
        let dynamic = self.dynamic.read().len();
        let community = self.community.read().len();
        SpecCount {
            builtin,
            dynamic,
            community,
            total: builtin + dynamic + community,
        }
    }
}

/// 读取并解析一份规范文档
pub async fn load_spec_file(path: &Path) -> CompletionResult<Spec> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CompletionError::io(format!("reading {}", path.display()), e))?;
    parse_spec_document(&text, path)
}

fn is_excluded(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// 递归扫描补全目录，名称为去掉扩展名的相对路径
fn scan_dynamic_specs(root: &Path, known: &BTreeSet<String>) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if is_excluded(&name) {
                return false;
            }
            !(entry.file_type().is_dir() && name == COMMUNITY_DIR)
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SPEC_EXTENSION) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        let mut parts: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };

        if parts.is_empty() && (known.contains(&stem) || stem == "index" || stem == "types") {
            continue;
        }

        parts.push(stem);
        found.insert(parts.join("/"), path.to_path_buf());
    }

    found
}

/// 扫描社区目录下的规范文件（不递归）
fn scan_community_specs(dir: &Path, known: &BTreeSet<String>) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(SPEC_EXTENSION)
        {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if stem == "index" || known.contains(&stem) {
            continue;
        }
        found.insert(stem, path);
    }

    found
}
