//! 常用生成器库
//!
//! 规范文档可以通过 `{"named": "git:branches"}` 引用这里的生成器。

use super::{Generator, PostProcessContext};
use crate::completion::types::{Suggestion, SuggestionType};
use crate::utils::error::AppResult;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

static GENERATORS: Lazy<BTreeMap<&'static str, Arc<Generator>>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    map.insert("git:branches", Arc::new(git_branches()));
    map.insert("git:remotes", Arc::new(git_remotes()));
    map.insert("git:tags", Arc::new(git_tags()));
    map.insert("git:stashes", Arc::new(git_stashes()));
    map.insert("npm:scripts", Arc::new(npm_scripts()));
    map.insert("npm:packages", Arc::new(npm_packages()));
    map.insert("docker:containers", Arc::new(docker_containers()));
    map.insert("docker:images", Arc::new(docker_images()));
    map.insert("docker:running-containers", Arc::new(docker_running_containers()));
    map.insert("docker:volumes", Arc::new(docker_volumes()));
    map.insert("docker:networks", Arc::new(docker_networks()));
    map.insert("k8s:namespaces", Arc::new(k8s_namespaces()));
    map.insert("k8s:contexts", Arc::new(k8s_contexts()));
    map.insert("k8s:pods", Arc::new(k8s_pods()));
    map.insert("k8s:deployments", Arc::new(k8s_deployments()));
    map.insert("k8s:services", Arc::new(k8s_services()));
    map.insert("aws:s3-buckets", Arc::new(aws_s3_buckets()));
    map.insert("aws:ec2-instances", Arc::new(aws_ec2_instances()));
    map.insert("aws:profiles", Arc::new(aws_profiles()));
    map.insert("aws:regions", Arc::new(aws_regions()));
    map.insert("system:processes", Arc::new(system_processes()));
    map.insert("system:env-vars", Arc::new(system_env_vars()));
    map
});

/// 按名称查找常用生成器
pub fn get_generator(name: &str) -> Option<Arc<Generator>> {
    GENERATORS.get(name).cloned()
}

/// 所有常用生成器名称（已排序）
pub fn list_generators() -> Vec<&'static str> {
    GENERATORS.keys().copied().collect()
}

fn argument(name: impl Into<String>, description: impl Into<String>, icon: &str) -> Suggestion {
    Suggestion::new(name)
        .with_type(SuggestionType::Argument)
        .with_description(description)
        .with_icon(icon)
        .with_priority(100)
}

fn non_blank_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| !line.trim().is_empty())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn git_branches() -> Generator {
    Generator::script(
        "git branch -a --format='%(refname:short)\t%(objectname:short)\t%(upstream:short)'",
    )
    .with_post_process(parse_git_branches)
    .with_cache_ttl(Duration::from_secs(5))
}

pub(crate) fn parse_git_branches(
    output: &str,
    _: &PostProcessContext,
) -> AppResult<Vec<Suggestion>> {
    Ok(non_blank_lines(output)
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let name = parts.next().filter(|n| !n.is_empty())?;
            let commit = parts.next().unwrap_or("");
            let upstream = parts.next().unwrap_or("");
            let remote = name.starts_with("origin/");

            let description = if upstream.is_empty() {
                commit.to_string()
            } else {
                format!("{commit} → {upstream}")
            };
            let suggestion = argument(name, description, if remote { "🌐" } else { "🔀" });
            Some(if remote {
                suggestion.with_priority(50)
            } else {
                suggestion
            })
        })
        .collect())
}

fn git_remotes() -> Generator {
    Generator::script("git remote -v")
        .with_post_process(|output, _| {
            let mut seen = HashSet::new();
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let mut parts = line.split_whitespace();
                    let name = parts.next()?;
                    if !seen.insert(name.to_string()) {
                        return None;
                    }
                    let url = parts.next().unwrap_or("");
                    let priority = if name == "origin" { 100 } else { 80 };
                    Some(argument(name, url, "🔗").with_priority(priority))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(30))
}

fn git_tags() -> Generator {
    Generator::script("git tag -l --sort=-version:refname")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .take(50)
                .enumerate()
                .map(|(i, name)| argument(name.trim(), "Tag", "🏷️").with_priority(100 - i as i32))
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(10))
}

fn git_stashes() -> Generator {
    Generator::script("git stash list --format='%gd\t%s'")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let (reference, message) = line.split_once('\t').unwrap_or((line, ""));
                    if reference.is_empty() {
                        return None;
                    }
                    let message = if message.is_empty() { "stash" } else { message };
                    Some(argument(reference, message, "📦"))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(5))
}

fn npm_scripts() -> Generator {
    Generator::script("cat package.json 2>/dev/null")
        .with_post_process(parse_npm_scripts)
        .with_cache_ttl(Duration::from_secs(10))
}

/// 解析 package.json 中的 scripts，解析失败视为没有脚本
pub(crate) fn parse_npm_scripts(
    output: &str,
    _: &PostProcessContext,
) -> AppResult<Vec<Suggestion>> {
    let Ok(package) = serde_json::from_str::<serde_json::Value>(output) else {
        return Ok(Vec::new());
    };
    let Some(scripts) = package.get("scripts").and_then(|s| s.as_object()) else {
        return Ok(Vec::new());
    };

    Ok(scripts
        .iter()
        .map(|(name, command)| {
            let command = command
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| command.to_string());
            argument(name, truncate(&command, 50), "📜")
        })
        .collect())
}

fn npm_packages() -> Generator {
    Generator::script("npm ls --depth=0 --json 2>/dev/null")
        .with_post_process(|output, _| {
            let Ok(data) = serde_json::from_str::<serde_json::Value>(output) else {
                return Ok(Vec::new());
            };
            let Some(dependencies) = data.get("dependencies").and_then(|d| d.as_object()) else {
                return Ok(Vec::new());
            };
            Ok(dependencies
                .iter()
                .map(|(name, info)| {
                    let version = info.get("version").and_then(|v| v.as_str()).unwrap_or("");
                    argument(name, version, "📦")
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(30))
}

fn docker_containers() -> Generator {
    Generator::script("docker ps -a --format '{{.ID}}\t{{.Names}}\t{{.Status}}\t{{.Image}}'")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let parts: Vec<&str> = line.split('\t').collect();
                    let id = parts.first().filter(|id| !id.is_empty())?;
                    let name = parts.get(1).filter(|n| !n.is_empty()).unwrap_or(id);
                    let status = parts.get(2).copied().unwrap_or("");
                    let image = parts.get(3).copied().unwrap_or("");
                    let running = status.starts_with("Up");
                    let description = format!(
                        "{} {} ({})",
                        if running { "🟢" } else { "⏹️" },
                        image,
                        truncate(id, 12)
                    );
                    Some(argument(*name, description, "🐳").with_priority(if running {
                        100
                    } else {
                        50
                    }))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(5))
}

fn docker_images() -> Generator {
    Generator::script("docker images --format '{{.Repository}}:{{.Tag}}\t{{.ID}}\t{{.Size}}'")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let parts: Vec<&str> = line.split('\t').collect();
                    let name = parts.first().filter(|n| !n.is_empty() && **n != "<none>:<none>")?;
                    let id = parts.get(1).copied().unwrap_or("");
                    let size = parts.get(2).copied().unwrap_or("");
                    Some(argument(*name, format!("{} ({})", size, truncate(id, 12)), "📦"))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(10))
}

fn docker_running_containers() -> Generator {
    Generator::script("docker ps --format '{{.ID}}\t{{.Names}}\t{{.Image}}'")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let parts: Vec<&str> = line.split('\t').collect();
                    let id = parts.first().filter(|id| !id.is_empty())?;
                    let name = parts.get(1).filter(|n| !n.is_empty()).unwrap_or(id);
                    let image = parts.get(2).copied().unwrap_or("");
                    let description = format!("🟢 {} ({})", image, truncate(id, 12));
                    Some(argument(*name, description, "🐳"))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(5))
}

fn docker_volumes() -> Generator {
    Generator::script("docker volume ls --format '{{.Name}}\t{{.Driver}}'")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .filter_map(|line| {
                    let (name, driver) = line.split_once('\t').unwrap_or((line, ""));
                    if name.is_empty() {
                        return None;
                    }
                    let driver = if driver.is_empty() { "local" } else { driver };
                    Some(argument(name, format!("Volume ({})", driver), "💾"))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(10))
}

fn docker_networks() -> Generator {
    Generator::script("docker network ls --format '{{.Name}}\t{{.Driver}}\t{{.Scope}}'")
        .with_post_process(parse_docker_networks)
        .with_cache_ttl(Duration::from_secs(10))
}

/// 内置网络（bridge/host/none）排在自建网络之后
pub(crate) fn parse_docker_networks(
    output: &str,
    _: &PostProcessContext,
) -> AppResult<Vec<Suggestion>> {
    Ok(non_blank_lines(output)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            let name = parts.first().filter(|n| !n.is_empty())?;
            let driver = parts.get(1).copied().unwrap_or("");
            let scope = parts.get(2).copied().unwrap_or("");
            let priority = if matches!(*name, "bridge" | "host" | "none") {
                50
            } else {
                100
            };
            Some(
                argument(*name, format!("{} network ({})", driver, scope), "🌐")
                    .with_priority(priority),
            )
        })
        .collect())
}

fn k8s_namespaces() -> Generator {
    Generator::script("kubectl get namespaces -o jsonpath='{.items[*].metadata.name}'")
        .with_post_process(|output, _| {
            Ok(output
                .split_whitespace()
                .map(|name| {
                    let priority = if name.starts_with("kube-") { 50 } else { 100 };
                    argument(name, "Namespace", "📁").with_priority(priority)
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(30))
}

fn k8s_contexts() -> Generator {
    Generator::script("kubectl config get-contexts -o name")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .map(|name| argument(name.trim(), "Kubernetes context", "☸️"))
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(60))
}

fn k8s_pods() -> Generator {
    Generator::script(
        "kubectl get pods --all-namespaces -o jsonpath='{range .items[*]}{.metadata.name}{\"\\t\"}{.metadata.namespace}{\"\\t\"}{.status.phase}{\"\\n\"}{end}'",
    )
    .with_post_process(parse_k8s_pods)
    .with_cache_ttl(Duration::from_secs(10))
}

pub(crate) fn parse_k8s_pods(output: &str, _: &PostProcessContext) -> AppResult<Vec<Suggestion>> {
    Ok(non_blank_lines(output)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            let name = parts.first().filter(|n| !n.is_empty())?;
            let namespace = parts.get(1).copied().unwrap_or("");
            let phase = parts.get(2).copied().unwrap_or("");
            let status = match phase {
                "Running" => "🟢",
                "Pending" => "🟡",
                _ => "🔴",
            };
            let priority = if phase == "Running" { 100 } else { 50 };
            Some(
                argument(*name, format!("{} {} ({})", status, namespace, phase), "🫛")
                    .with_priority(priority),
            )
        })
        .collect())
}

fn k8s_deployments() -> Generator {
    Generator::script(
        "kubectl get deployments --all-namespaces -o jsonpath='{range .items[*]}{.metadata.name}{\"\\t\"}{.metadata.namespace}{\"\\t\"}{.status.readyReplicas}/{.status.replicas}{\"\\n\"}{end}'",
    )
    .with_post_process(|output, _| {
        Ok(non_blank_lines(output)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('\t').collect();
                let name = parts.first().filter(|n| !n.is_empty())?;
                let namespace = parts.get(1).copied().unwrap_or("");
                let replicas = parts.get(2).filter(|r| !r.is_empty()).unwrap_or(&"0/0");
                Some(argument(*name, format!("{} ({} ready)", namespace, replicas), "🚀"))
            })
            .collect())
    })
    .with_cache_ttl(Duration::from_secs(15))
}

fn k8s_services() -> Generator {
    Generator::script(
        "kubectl get services --all-namespaces -o jsonpath='{range .items[*]}{.metadata.name}{\"\\t\"}{.metadata.namespace}{\"\\t\"}{.spec.type}{\"\\n\"}{end}'",
    )
    .with_post_process(|output, _| {
        Ok(non_blank_lines(output)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('\t').collect();
                let name = parts.first().filter(|n| !n.is_empty())?;
                let namespace = parts.get(1).copied().unwrap_or("");
                let kind = parts.get(2).copied().unwrap_or("");
                Some(argument(*name, format!("{} ({})", namespace, kind), "🔌"))
            })
            .collect())
    })
    .with_cache_ttl(Duration::from_secs(30))
}

fn aws_s3_buckets() -> Generator {
    Generator::script("aws s3 ls")
        .with_post_process(parse_s3_buckets)
        .with_cache_ttl(Duration::from_secs(300))
        .with_timeout(Duration::from_secs(3))
}

/// `aws s3 ls` 每行形如 `2024-01-01 12:00:00 bucket-name`
pub(crate) fn parse_s3_buckets(output: &str, _: &PostProcessContext) -> AppResult<Vec<Suggestion>> {
    Ok(non_blank_lines(output)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let bucket = parts.get(2)?;
            Some(argument(
                format!("s3://{}/", bucket),
                format!("S3 Bucket (created {})", parts[0]),
                "🪣",
            ))
        })
        .collect())
}

fn aws_ec2_instances() -> Generator {
    Generator::script(
        "aws ec2 describe-instances --query \"Reservations[*].Instances[*].[InstanceId,Tags[?Key=='Name'].Value|[0],State.Name]\" --output text",
    )
    .with_post_process(|output, _| {
        Ok(non_blank_lines(output)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
                let id = parts.first().filter(|id| !id.is_empty())?;
                let name = parts.get(1).filter(|n| !n.is_empty() && **n != "None");
                let state = parts.get(2).copied().unwrap_or("");
                let status = match state {
                    "running" => "🟢",
                    "stopped" => "🔴",
                    _ => "🟡",
                };
                let description =
                    format!("{} {} ({})", status, name.unwrap_or(&"unnamed"), state);
                let priority = if state == "running" { 100 } else { 50 };
                Some(argument(*id, description, "💻").with_priority(priority))
            })
            .collect())
    })
    .with_cache_ttl(Duration::from_secs(60))
    .with_timeout(Duration::from_secs(5))
}

fn aws_profiles() -> Generator {
    Generator::script("aws configure list-profiles")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .map(|name| argument(name.trim(), "AWS Profile", "👤"))
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(30))
}

fn aws_regions() -> Generator {
    Generator::script(
        "aws ec2 describe-regions --query \"Regions[].RegionName\" --output text",
    )
    .with_post_process(|output, _| {
        Ok(output
            .split_whitespace()
            .map(|region| argument(region, "AWS Region", "🌍"))
            .collect())
    })
    .with_cache_ttl(Duration::from_secs(300))
}

fn system_processes() -> Generator {
    Generator::script("ps aux --sort=-%mem | head -20")
        .with_post_process(|output, _| {
            Ok(non_blank_lines(output)
                .skip(1)
                .filter_map(|line| {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    let pid = parts.get(1)?;
                    let cpu = parts.get(2).copied().unwrap_or("");
                    let mem = parts.get(3).copied().unwrap_or("");
                    let command = parts.get(10..).map(|c| c.join(" ")).unwrap_or_default();
                    let description =
                        format!("{} (CPU: {}%, MEM: {}%)", truncate(&command, 40), cpu, mem);
                    Some(argument(*pid, description, "⚙️"))
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(5))
}

fn system_env_vars() -> Generator {
    Generator::script("env")
        .with_post_process(|output, _| {
            Ok(output
                .lines()
                .filter_map(|line| line.split_once('='))
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, value)| {
                    let value = truncate(value, 50);
                    let description = if value.is_empty() {
                        "(empty)".to_string()
                    } else {
                        value
                    };
                    argument(name, description, "🔧")
                })
                .collect())
        })
        .with_cache_ttl(Duration::from_secs(60))
}
