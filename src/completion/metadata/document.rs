//! JSON 规范文档
//!
//! 补全目录下每个 `.json` 文件保存一份规范文档（camelCase 键名），
//! 加载时转换为 [`Spec`]。生成器只能是脚本，或者按名称引用常用生成器。

use super::command_spec::{ArgSpec, GenerateSpec, OptionSpec, Spec, SpecRef, Template};
use crate::completion::error::{CompletionError, CompletionResult};
use crate::completion::generators::{get_generator, Generator};
use crate::completion::types::{Suggestion, SuggestionType};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 单个值或数组
///
/// 数组优先匹配，空数组不会被当成全部字段缺省的单个对象。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// 规范文档
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    /// 数组形式时第一个为名称，其余为别名
    pub name: OneOrMany<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub subcommands: Vec<SpecDocument>,
    #[serde(default)]
    pub options: Vec<OptionDocument>,
    #[serde(default)]
    pub args: Option<OneOrMany<ArgDocument>>,
    #[serde(default)]
    pub generate_spec: Option<OneOrMany<GeneratorDocument>>,
    #[serde(default)]
    pub load_spec: Option<SpecRefDocument>,
    #[serde(default)]
    pub additional_suggestions: Vec<SuggestionDocument>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDocument {
    pub name: OneOrMany<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Option<OneOrMany<ArgDocument>>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub required: bool,
    /// 布尔值或最大次数
    #[serde(default)]
    pub is_repeatable: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<SuggestionDocument>,
    #[serde(default)]
    pub generators: Option<OneOrMany<GeneratorDocument>>,
    #[serde(default)]
    pub template: Option<OneOrMany<String>>,
    #[serde(default)]
    pub load_spec: Option<SpecRefDocument>,
    #[serde(default)]
    pub is_variadic: bool,
    #[serde(default)]
    pub is_optional: bool,
}

/// 静态建议：字符串或完整对象
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionDocument {
    Name(String),
    Full(Suggestion),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpecRefDocument {
    Named(String),
    Inline(Box<SpecDocument>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeneratorDocument {
    /// 引用常用生成器，如 `git:branches`
    Named { named: String },
    Script(ScriptGeneratorDocument),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptGeneratorDocument {
    pub script: String,
    #[serde(default)]
    pub cache: Option<CacheDocument>,
    /// 毫秒
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub split_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CacheDocument {
    Enabled(bool),
    Ttl {
        #[serde(default)]
        ttl: Option<u64>,
    },
}

/// 解析一份 JSON 文档
pub fn parse_spec_document(text: &str, path: &Path) -> CompletionResult<Spec> {
    let document: SpecDocument =
        serde_json::from_str(text).map_err(|source| CompletionError::SpecParse {
            path: path.to_path_buf(),
            source,
        })?;
    document.into_spec()
}

impl SpecDocument {
    /// 转换为规范，引用未知生成器时失败
    pub fn into_spec(self) -> CompletionResult<Spec> {
        let mut names = self.name.into_vec().into_iter();
        let name = names.next().unwrap_or_default();
        let mut aliases: Vec<String> = names.collect();
        aliases.extend(self.aliases);

        let subcommands = self
            .subcommands
            .into_iter()
            .map(|sub| sub.into_spec().map(Arc::new))
            .collect::<CompletionResult<Vec<_>>>()?;

        let options = self
            .options
            .into_iter()
            .map(OptionDocument::into_option)
            .collect::<CompletionResult<Vec<_>>>()?;

        let args = convert_args(self.args)?;

        let generate_spec = match self.generate_spec {
            Some(generators) => Some(GenerateSpec::Generators(convert_generators(Some(
                generators,
            ))?)),
            None => None,
        };

        let load_spec = self.load_spec.map(SpecRefDocument::into_ref).transpose()?;

        Ok(Spec {
            name,
            aliases,
            description: self.description,
            priority: self.priority,
            hidden: self.hidden,
            subcommands,
            options,
            args,
            generate_spec,
            load_spec,
            additional_suggestions: self
                .additional_suggestions
                .into_iter()
                .map(SuggestionDocument::into_suggestion)
                .collect(),
            examples: self.examples,
        })
    }
}

impl OptionDocument {
    fn into_option(self) -> CompletionResult<OptionSpec> {
        let is_repeatable = match &self.is_repeatable {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::Number(count)) => count.as_u64().unwrap_or(0) > 0,
            _ => false,
        };

        Ok(OptionSpec {
            names: self.name.into_vec(),
            description: self.description,
            args: convert_args(self.args)?,
            hidden: self.hidden,
            priority: self.priority,
            required: self.required,
            is_repeatable,
        })
    }
}

impl ArgDocument {
    fn into_arg(self) -> CompletionResult<ArgSpec> {
        Ok(ArgSpec {
            name: self.name,
            description: self.description,
            suggestions: self
                .suggestions
                .into_iter()
                .map(SuggestionDocument::into_suggestion)
                .collect(),
            generators: convert_generators(self.generators)?,
            templates: self
                .template
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .iter()
                .map(|name| Template::parse(name))
                .collect(),
            load_spec: self.load_spec.map(SpecRefDocument::into_ref).transpose()?,
            is_variadic: self.is_variadic,
            is_optional: self.is_optional,
        })
    }
}

impl SuggestionDocument {
    fn into_suggestion(self) -> Suggestion {
        match self {
            Self::Name(name) => Suggestion::new(name),
            Self::Full(suggestion) => suggestion,
        }
    }
}

impl SpecRefDocument {
    fn into_ref(self) -> CompletionResult<SpecRef> {
        match self {
            Self::Named(name) => Ok(SpecRef::Named(name)),
            Self::Inline(document) => Ok(SpecRef::Inline(Arc::new(document.into_spec()?))),
        }
    }
}

impl GeneratorDocument {
    fn into_generator(self) -> CompletionResult<Arc<Generator>> {
        match self {
            Self::Named { named } => {
                get_generator(&named).ok_or(CompletionError::UnknownGenerator(named))
            }
            Self::Script(document) => Ok(Arc::new(document.into_generator())),
        }
    }
}

impl ScriptGeneratorDocument {
    fn into_generator(self) -> Generator {
        let mut generator = Generator::script(self.script);

        if let Some(delimiter) = self.split_on.filter(|d| !d.is_empty()) {
            generator = generator.with_post_process(move |output, _| {
                Ok(output
                    .split(delimiter.as_str())
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Suggestion::new(part).with_type(SuggestionType::Argument))
                    .collect())
            });
        }

        generator = match self.cache {
            Some(CacheDocument::Enabled(false)) => generator.without_cache(),
            Some(CacheDocument::Ttl { ttl: Some(ttl) }) => {
                generator.with_cache_ttl(Duration::from_millis(ttl))
            }
            _ => generator,
        };

        match self.timeout {
            Some(timeout) => generator.with_timeout(Duration::from_millis(timeout)),
            None => generator,
        }
    }
}

fn convert_args(args: Option<OneOrMany<ArgDocument>>) -> CompletionResult<Vec<ArgSpec>> {
    args.map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(ArgDocument::into_arg)
        .collect()
}

fn convert_generators(
    generators: Option<OneOrMany<GeneratorDocument>>,
) -> CompletionResult<Vec<Arc<Generator>>> {
    generators
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(GeneratorDocument::into_generator)
        .collect()
}
