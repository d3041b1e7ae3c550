//! 规范解析器
//!
//! 把 `loadSpec` / `generateSpec` 展开成新的节点，原始规范保持不变。
//! 结果按节点地址记忆，每个节点只展开一次；解析结果本身也登记在表中，
//! 因此对结果再次解析返回同一个节点。

use super::command_spec::{GenerateSpec, Spec, SpecRef};
use super::registry::SpecRegistry;
use crate::completion::generators::GeneratorExecutor;
use crate::completion::types::CompletionContext;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

struct ResolutionEntry {
    /// 持有源节点，保证地址在表存活期间不被复用
    _source: Arc<Spec>,
    expanded: OnceCell<Arc<Spec>>,
    unlocked: OnceCell<Arc<Spec>>,
}

impl ResolutionEntry {
    fn new(source: Arc<Spec>) -> Self {
        Self {
            _source: source,
            expanded: OnceCell::new(),
            unlocked: OnceCell::new(),
        }
    }

    /// 已是最终形态的节点
    fn settled(node: Arc<Spec>, unlocked: bool) -> Self {
        Self {
            expanded: OnceCell::new_with(Some(Arc::clone(&node))),
            unlocked: OnceCell::new_with(unlocked.then(|| Arc::clone(&node))),
            _source: node,
        }
    }
}

/// 规范解析器
pub struct SpecResolver {
    registry: Arc<SpecRegistry>,
    executor: Arc<GeneratorExecutor>,
    memo: DashMap<usize, Arc<ResolutionEntry>>,
}

fn identity(spec: &Arc<Spec>) -> usize {
    Arc::as_ptr(spec) as usize
}

impl SpecResolver {
    pub fn new(registry: Arc<SpecRegistry>, executor: Arc<GeneratorExecutor>) -> Self {
        Self {
            registry,
            executor,
            memo: DashMap::new(),
        }
    }

    fn entry(&self, spec: &Arc<Spec>) -> Arc<ResolutionEntry> {
        Arc::clone(
            self.memo
                .entry(identity(spec))
                .or_insert_with(|| Arc::new(ResolutionEntry::new(Arc::clone(spec))))
                .value(),
        )
    }

    fn settle(&self, node: &Arc<Spec>, unlocked: bool) {
        self.memo
            .entry(identity(node))
            .or_insert_with(|| Arc::new(ResolutionEntry::settled(Arc::clone(node), unlocked)));
    }

    /// 展开 `loadSpec` 与 `generateSpec`，已解锁的节点返回解锁后的形态
    pub async fn resolve(&self, spec: &Arc<Spec>, context: &CompletionContext) -> Arc<Spec> {
        let entry = self.entry(spec);

        if let Some(unlocked) = entry.unlocked.get() {
            return Arc::clone(unlocked);
        }

        let expanded = entry
            .expanded
            .get_or_init(|| async {
                let node = if spec.needs_expansion() {
                    Arc::new(self.expand(spec, context).await)
                } else {
                    Arc::clone(spec)
                };
                if !Arc::ptr_eq(&node, spec) {
                    self.settle(&node, false);
                }
                node
            })
            .await;

        Arc::clone(expanded)
    }

    /// 在 `resolve` 基础上应用参数级的 `loadSpec`
    ///
    /// 用户越过参数位置（至少两个词，或当前词以 `-` 开头）后才合并，
    /// 合并后该节点之后的每次解析都返回解锁形态。
    pub async fn resolve_with_args(
        &self,
        spec: &Arc<Spec>,
        context: &CompletionContext,
    ) -> Arc<Spec> {
        let expanded = self.resolve(spec, context).await;

        let Some(reference) = expanded.args.first().and_then(|arg| arg.load_spec.clone()) else {
            return expanded;
        };

        let past_argument =
            context.tokens.len() >= 2 || context.current_token().starts_with('-');
        if !past_argument {
            return expanded;
        }

        let entry = self.entry(spec);
        let unlocked = entry
            .unlocked
            .get_or_init(|| async {
                let mut node = (*expanded).clone();
                if let Some(arg) = node.args.first_mut() {
                    arg.load_spec = None;
                }
                if let Some(loaded) = self.resolve_ref(&reference).await {
                    node.merge_from(&loaded);
                }
                let node = Arc::new(node);
                self.settle(&node, true);
                node
            })
            .await;

        Arc::clone(unlocked)
    }

    /// 解析规范引用
    pub async fn resolve_ref(&self, reference: &SpecRef) -> Option<Arc<Spec>> {
        match reference {
            SpecRef::Named(name) => {
                let spec = self.registry.get_spec(name).await;
                if spec.is_none() {
                    debug!("loadSpec 引用的规范不存在: {}", name);
                }
                spec
            }
            SpecRef::Inline(spec) => Some(Arc::clone(spec)),
        }
    }

    async fn expand(&self, spec: &Arc<Spec>, context: &CompletionContext) -> Spec {
        let mut node = (**spec).clone();
        node.load_spec = None;
        node.generate_spec = None;

        if let Some(reference) = &spec.load_spec {
            if let Some(loaded) = self.resolve_ref(reference).await {
                node.merge_from(&loaded);
            }
        }

        match &spec.generate_spec {
            Some(GenerateSpec::Function(generate)) => match generate(context.clone()).await {
                Ok(Some(patch)) => node.merge_from(&patch),
                Ok(None) => {}
                Err(err) => debug!("generateSpec 执行失败 {}: {:#}", spec.name, err),
            },
            Some(GenerateSpec::Generators(generators)) => {
                let mut patch = Spec::default();
                for generator in generators {
                    for suggestion in self.executor.execute(generator, context).await {
                        if suggestion.name.is_empty() {
                            continue;
                        }
                        patch.subcommands.push(Arc::new(Spec {
                            name: suggestion.name,
                            description: suggestion.description,
                            priority: suggestion.priority,
                            ..Default::default()
                        }));
                    }
                }
                if !patch.subcommands.is_empty() {
                    node.merge_from(&patch);
                }
            }
            None => {}
        }

        node
    }

    /// 清空记忆表
    pub fn clear(&self) {
        self.memo.clear();
    }
}
