//! Command traits and core types

use async_trait::async_trait;
use kiln_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// 기본 카테고리
pub const DEFAULT_CATEGORY: &str = "general";

// ============================================================================
// CommandMetadata / CommandArgument - 명령어 정의
// ============================================================================

/// 명령어 메타데이터 - 등록 후 변경되지 않음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// 명령어 이름 (예: "echo")
    pub name: String,

    /// 짧은 설명
    pub description: String,

    /// 카테고리 (help 출력 그룹)
    pub category: String,

    /// 사용법 (예: "echo <msg>")
    pub usage: String,

    /// 사용 예시
    pub examples: Vec<String>,

    /// 별칭
    pub aliases: Vec<String>,

    /// 소유 플러그인 ID
    pub plugin_id: Option<String>,
}

impl CommandMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            description: description.into(),
            category: DEFAULT_CATEGORY.to_string(),
            examples: Vec::new(),
            aliases: Vec::new(),
            plugin_id: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_plugin(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }
}

/// 명령어 인자 정의 (위치 순서대로)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandArgument {
    /// 인자 이름
    pub name: String,

    /// 설명
    pub description: String,

    /// 필수 여부
    pub required: bool,

    /// 기본값
    pub default: Option<String>,

    /// 허용 값 (비어 있으면 제한 없음)
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

impl CommandArgument {
    /// 필수 인자
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
            default: None,
            allowed_values: Vec::new(),
        }
    }

    /// 선택 인자
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// CommandContext / CommandResult - I/O 타입
// ============================================================================

/// 명령어 실행 컨텍스트 - 실행마다 새로 생성
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// 위치 인자
    pub args: Vec<String>,

    /// 옵션 (`--key=value`, `--flag`)
    pub options: HashMap<String, String>,

    /// 환경 변수
    pub env: HashMap<String, String>,

    /// 작업 디렉토리
    pub working_dir: PathBuf,
}

impl CommandContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    /// 위치 인자 설정
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// 플래그 존재 여부
    pub fn has_flag(&self, flag: &str) -> bool {
        self.options.contains_key(flag)
    }
}

/// 명령어 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// 성공 여부
    pub success: bool,

    /// 출력
    pub output: String,

    /// 에러 메시지
    pub error: Option<String>,

    /// 구조화된 결과
    pub data: Option<Value>,

    /// 실행 시간 (레지스트리가 채움)
    pub duration_ms: u64,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            data: None,
            duration_ms: 0,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            data: None,
            duration_ms: 0,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ============================================================================
// CommandExecutor Trait
// ============================================================================

/// 명령어 실행기
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// 명령어 실행
    async fn execute(&self, ctx: &CommandContext) -> Result<CommandResult>;

    /// 인자 검증 (기본: 필수 인자 개수 + 허용 값)
    fn validate(&self, arguments: &[CommandArgument], ctx: &CommandContext) -> Result<()> {
        validate_arguments(arguments, ctx)
    }
}

/// 기본 인자 검증
///
/// 위치 인자 수가 필수 인자 수보다 적으면 누락된 인자 이름을 담은
/// `Error::Validation`을 반환합니다.
pub fn validate_arguments(arguments: &[CommandArgument], ctx: &CommandContext) -> Result<()> {
    let required: Vec<&CommandArgument> = arguments.iter().filter(|a| a.required).collect();

    if ctx.args.len() < required.len() {
        let missing: Vec<&str> = required[ctx.args.len()..]
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        return Err(Error::Validation(format!(
            "Missing required arguments: {}",
            missing.join(", ")
        )));
    }

    for (argument, value) in arguments.iter().zip(ctx.args.iter()) {
        if !argument.allowed_values.is_empty() && !argument.allowed_values.contains(value) {
            return Err(Error::Validation(format!(
                "Invalid value '{}' for argument '{}' (allowed: {})",
                value,
                argument.name,
                argument.allowed_values.join(", ")
            )));
        }
    }

    Ok(())
}

/// 클로저 기반 실행기
struct FnExecutor<F>(F);

#[async_trait]
impl<F> CommandExecutor for FnExecutor<F>
where
    F: Fn(&CommandContext) -> Result<CommandResult> + Send + Sync,
{
    async fn execute(&self, ctx: &CommandContext) -> Result<CommandResult> {
        (self.0)(ctx)
    }
}

// ============================================================================
// Command - 메타데이터 + 인자 + 실행기
// ============================================================================

/// 호출 가능한 명령어 단위
#[derive(Clone)]
pub struct Command {
    pub metadata: CommandMetadata,
    pub arguments: Vec<CommandArgument>,
    executor: Arc<dyn CommandExecutor>,
}

impl Command {
    pub fn new(metadata: CommandMetadata, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            metadata,
            arguments: Vec::new(),
            executor,
        }
    }

    /// 클로저로 명령어 생성
    pub fn from_fn<F>(metadata: CommandMetadata, f: F) -> Self
    where
        F: Fn(&CommandContext) -> Result<CommandResult> + Send + Sync + 'static,
    {
        Self::new(metadata, Arc::new(FnExecutor(f)))
    }

    pub fn with_argument(mut self, argument: CommandArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.metadata.aliases
    }

    /// 이름 또는 별칭 일치 여부 (대소문자 무시)
    pub fn matches(&self, name: &str) -> bool {
        self.metadata.name.eq_ignore_ascii_case(name)
            || self.metadata.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// 이름과 별칭 전체
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.metadata.name.as_str()).chain(self.metadata.aliases.iter().map(String::as_str))
    }

    pub fn validate(&self, ctx: &CommandContext) -> Result<()> {
        self.executor.validate(&self.arguments, ctx)
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<CommandResult> {
        self.executor.execute(ctx).await
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("metadata", &self.metadata)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
