//! 命令规范定义
//!
//! 声明式的命令树：子命令、选项、参数，以及延迟展开的 `loadSpec` / `generateSpec`。
//! 节点一经创建就不再修改，展开结果由解析器另行生成。

use crate::completion::generators::Generator;
use crate::completion::types::{CompletionContext, Suggestion};
use crate::utils::error::AppResult;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type GenerateSpecFn =
    Arc<dyn Fn(CompletionContext) -> BoxFuture<'static, AppResult<Option<Spec>>> + Send + Sync>;

/// 对另一份规范的引用
#[derive(Debug, Clone)]
pub enum SpecRef {
    /// 通过注册表按名称查找
    Named(String),
    /// 内联规范
    Inline(Arc<Spec>),
}

/// 运行时生成规范的方式
#[derive(Clone)]
pub enum GenerateSpec {
    /// 直接返回要合并的规范
    Function(GenerateSpecFn),
    /// 生成器的结果逐条变成子命令
    Generators(Vec<Arc<Generator>>),
}

impl fmt::Debug for GenerateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Generators(generators) => f.debug_tuple("Generators").field(generators).finish(),
        }
    }
}

/// 参数模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Files,
    Folders,
    Filepaths,
    /// 未知模板，保留但不产生建议
    Other(String),
}

impl Template {
    pub fn parse(name: &str) -> Self {
        match name {
            "files" => Self::Files,
            "folders" => Self::Folders,
            "filepaths" => Self::Filepaths,
            other => Self::Other(other.to_string()),
        }
    }

    /// 是否为路径类模板
    pub fn is_path(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// 是否包含文件、目录
    pub fn includes(&self) -> (bool, bool) {
        match self {
            Self::Files => (true, false),
            Self::Folders => (false, true),
            Self::Filepaths => (true, true),
            Self::Other(_) => (false, false),
        }
    }
}

/// 命令规范
#[derive(Debug, Clone, Default)]
pub struct Spec {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub hidden: bool,
    pub subcommands: Vec<Arc<Spec>>,
    pub options: Vec<OptionSpec>,
    pub args: Vec<ArgSpec>,
    pub generate_spec: Option<GenerateSpec>,
    pub load_spec: Option<SpecRef>,
    pub additional_suggestions: Vec<Suggestion>,
    pub examples: Vec<String>,
}

impl Spec {
    /// 创建新的命令规范
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_subcommand(mut self, subcommand: Spec) -> Self {
        self.subcommands.push(Arc::new(subcommand));
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_load_spec(mut self, reference: SpecRef) -> Self {
        self.load_spec = Some(reference);
        self
    }

    /// 运行时生成规范
    pub fn with_generate_spec<F, Fut>(mut self, generate: F) -> Self
    where
        F: Fn(CompletionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Option<Spec>>> + Send + 'static,
    {
        self.generate_spec = Some(GenerateSpec::Function(Arc::new(move |context| {
            generate(context).boxed()
        })));
        self
    }

    /// 由生成器结果生成子命令
    pub fn with_generated_subcommands(mut self, generators: Vec<Arc<Generator>>) -> Self {
        self.generate_spec = Some(GenerateSpec::Generators(generators));
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// 按名称或别名查找子命令
    pub fn find_subcommand(&self, token: &str) -> Option<&Arc<Spec>> {
        self.subcommands
            .iter()
            .find(|sub| sub.name == token || sub.aliases.iter().any(|alias| alias == token))
    }

    /// 是否还有待展开的部分
    pub fn needs_expansion(&self) -> bool {
        self.load_spec.is_some() || self.generate_spec.is_some()
    }

    /// 浅合并另一份规范
    ///
    /// 子命令按名称合并，已有的优先；选项追加；参数仅在当前为空时采用；
    /// 示例与附加建议追加。
    pub fn merge_from(&mut self, patch: &Spec) {
        if !patch.subcommands.is_empty() {
            let mut seen = HashSet::new();
            let mut merged = Vec::with_capacity(self.subcommands.len() + patch.subcommands.len());

            for sub in self.subcommands.drain(..) {
                if seen.insert(sub.name.clone()) {
                    merged.push(sub);
                }
            }
            for sub in &patch.subcommands {
                if sub.name.is_empty() {
                    continue;
                }
                if seen.insert(sub.name.clone()) {
                    merged.push(Arc::clone(sub));
                }
            }

            self.subcommands = merged;
        }

        self.options.extend(patch.options.iter().cloned());

        if self.args.is_empty() {
            self.args = patch.args.clone();
        }

        self.examples.extend(patch.examples.iter().cloned());
        self.additional_suggestions
            .extend(patch.additional_suggestions.iter().cloned());
    }
}

/// 选项规范，多个名称互为别名
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    pub names: Vec<String>,
    pub description: Option<String>,
    pub args: Vec<ArgSpec>,
    pub hidden: bool,
    pub priority: Option<i32>,
    pub required: bool,
    pub is_repeatable: bool,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ..Default::default()
        }
    }

    /// 多名称选项，如 `["-m", "--message"]`
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.is_repeatable = true;
        self
    }
}

/// 参数规范
#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub generators: Vec<Arc<Generator>>,
    pub templates: Vec<Template>,
    pub load_spec: Option<SpecRef>,
    pub is_variadic: bool,
    pub is_optional: bool,
}

impl ArgSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_generator(mut self, generator: Arc<Generator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_load_spec(mut self, reference: SpecRef) -> Self {
        self.load_spec = Some(reference);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// 是否带有路径类模板
    pub fn has_path_template(&self) -> bool {
        self.templates.iter().any(Template::is_path)
    }
}
