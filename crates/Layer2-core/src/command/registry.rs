//! Command Registry - 명령어 등록/조회/실행

use super::traits::{Command, CommandContext, CommandMetadata, CommandResult};
use crate::fault;
use chrono::{DateTime, Utc};
use kiln_foundation::{Error, Result};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 통계에 포함할 최다 사용 명령어 수
const MOST_USED_LIMIT: usize = 5;

/// 등록된 명령어와 부가 정보
struct CommandEntry {
    command: Arc<Command>,
    owner: Option<String>,
    usage: AtomicU64,
    total_duration_ms: AtomicU64,
    registered_at: DateTime<Utc>,
}

type CommandMap = HashMap<String, Arc<CommandEntry>>;

/// 명령어 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandStatistics {
    pub total_commands: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_plugin: BTreeMap<String, usize>,
    pub total_executions: u64,
    pub total_duration_ms: u64,
    /// (이름, 실행 횟수) - 많이 쓰인 순
    pub most_used: Vec<(String, u64)>,
}

/// 명령어 레지스트리
///
/// 읽기는 스냅샷(`Arc<HashMap>`)을 복제해 잠금 경쟁 없이 수행하고,
/// 변경은 `write_gate`로 직렬화한 뒤 새 맵으로 교체합니다.
pub struct CommandRegistry {
    /// 명령어 이름 → 항목
    commands: RwLock<Arc<CommandMap>>,

    /// 변경 직렬화
    write_gate: Mutex<()>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(Arc::new(HashMap::new())),
            write_gate: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Arc<CommandMap> {
        self.commands.read().clone()
    }

    fn find_entry(&self, name: &str) -> Option<Arc<CommandEntry>> {
        let commands = self.snapshot();

        if let Some(entry) = commands.get(name) {
            return Some(entry.clone());
        }

        commands
            .values()
            .find(|entry| entry.command.matches(name))
            .cloned()
    }

    // ========================================================================
    // 등록 / 해제
    // ========================================================================

    /// 명령어 등록
    ///
    /// 이름/별칭이 기존 명령어의 이름/별칭과 겹치면 (대소문자 무시) 거부합니다.
    pub async fn register_command(&self, mut command: Command, owner: Option<&str>) -> Result<()> {
        let name = command.metadata.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Command name must not be empty".into()));
        }
        command.metadata.name = name.clone();

        let owner = owner
            .map(str::to_string)
            .or_else(|| command.metadata.plugin_id.clone());
        if command.metadata.plugin_id.is_none() {
            command.metadata.plugin_id = owner.clone();
        }

        let _gate = self.write_gate.lock().await;
        let current = self.snapshot();

        for new_name in command.all_names() {
            if let Some(existing) = current.values().find(|e| e.command.matches(new_name)) {
                return Err(Error::Validation(format!(
                    "Command '{}' conflicts with registered command '{}'",
                    new_name,
                    existing.command.name()
                )));
            }
        }

        let entry = Arc::new(CommandEntry {
            command: Arc::new(command),
            owner: owner.clone(),
            usage: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            registered_at: Utc::now(),
        });

        let mut next = (*current).clone();
        next.insert(name.clone(), entry);
        *self.commands.write() = Arc::new(next);

        debug!(command = %name, owner = ?owner, "Registered command");
        Ok(())
    }

    /// 명령어 해제 (이름 또는 별칭)
    pub async fn unregister_command(&self, name: &str) -> Option<Arc<Command>> {
        let _gate = self.write_gate.lock().await;
        let entry = self.find_entry(name)?;

        let mut next = (*self.snapshot()).clone();
        next.remove(entry.command.name());
        *self.commands.write() = Arc::new(next);

        debug!(command = %entry.command.name(), "Unregistered command");
        Some(entry.command.clone())
    }

    /// 플러그인이 등록한 명령어 전체 해제
    pub async fn unregister_plugin_commands(&self, owner: &str) -> Vec<String> {
        let _gate = self.write_gate.lock().await;
        let mut next = (*self.snapshot()).clone();

        let removed: Vec<String> = next
            .iter()
            .filter(|(_, entry)| entry.owner.as_deref() == Some(owner))
            .map(|(name, _)| name.clone())
            .collect();

        if removed.is_empty() {
            return removed;
        }

        for name in &removed {
            next.remove(name);
        }
        *self.commands.write() = Arc::new(next);

        info!(plugin_id = %owner, count = removed.len(), "Unregistered plugin commands");
        removed
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 명령어 찾기 (정확한 이름 → 대소문자 무시 이름/별칭)
    pub fn find_command(&self, name: &str) -> Option<Arc<Command>> {
        self.find_entry(name).map(|entry| entry.command.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_entry(name).is_some()
    }

    /// 등록된 명령어 메타데이터 (이름순)
    pub fn list_commands(&self) -> Vec<CommandMetadata> {
        let mut list: Vec<CommandMetadata> = self
            .snapshot()
            .values()
            .map(|entry| entry.command.metadata.clone())
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// 카테고리 목록 (정렬됨)
    pub fn categories(&self) -> Vec<String> {
        self.snapshot()
            .values()
            .map(|entry| entry.command.metadata.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 카테고리별 명령어 (이름순)
    pub fn by_category(&self, category: &str) -> Vec<Arc<Command>> {
        let mut commands: Vec<Arc<Command>> = self
            .snapshot()
            .values()
            .filter(|entry| entry.command.metadata.category == category)
            .map(|entry| entry.command.clone())
            .collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    /// 플러그인이 소유한 명령어 이름
    pub fn commands_for_plugin(&self, owner: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot()
            .iter()
            .filter(|(_, entry)| entry.owner.as_deref() == Some(owner))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// 실행 횟수
    pub fn usage_count(&self, name: &str) -> Option<u64> {
        self.find_entry(name)
            .map(|entry| entry.usage.load(Ordering::Relaxed))
    }

    /// 등록 시각
    pub fn registered_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.find_entry(name).map(|entry| entry.registered_at)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    // ========================================================================
    // 실행
    // ========================================================================

    /// 이름으로 명령어 실행
    ///
    /// 실행기의 에러와 패닉은 `Error::Execution`으로 변환됩니다.
    pub async fn execute_command(&self, name: &str, ctx: &CommandContext) -> Result<CommandResult> {
        let entry = self
            .find_entry(name)
            .ok_or_else(|| Error::NotFound(format!("Command '{}'", name)))?;
        let command = entry.command.clone();

        let label = format!("Command '{}'", command.name());
        fault::guarded(&format!("{} validation", label), async { command.validate(ctx) }).await?;

        let start = Instant::now();
        let outcome = fault::guarded(&label, command.execute(ctx)).await;
        let elapsed = start.elapsed().as_millis() as u64;

        entry.usage.fetch_add(1, Ordering::Relaxed);
        entry.total_duration_ms.fetch_add(elapsed, Ordering::Relaxed);

        match outcome {
            Ok(mut result) => {
                result.duration_ms = elapsed;
                debug!(command = %command.name(), duration_ms = elapsed, success = result.success, "Executed command");
                Ok(result)
            }
            Err(e @ Error::Execution { .. }) => {
                warn!(command = %command.name(), error = %e, "Command failed");
                Err(e)
            }
            Err(e) => {
                warn!(command = %command.name(), error = %e, "Command failed");
                Err(Error::execution(format!("{} failed", label), Some(e)))
            }
        }
    }

    /// 원본 입력 한 줄을 파싱해서 실행
    ///
    /// `deploy prod --force --region=eu "two words"` →
    /// name: `deploy`, args: `["prod", "two words"]`,
    /// options: `{force: "true", region: "eu"}`
    pub async fn execute_line(&self, input: &str, working_dir: impl Into<PathBuf>) -> Result<CommandResult> {
        let (name, ctx) = parse_command_line(input, working_dir.into())?;
        self.execute_command(&name, &ctx).await
    }

    // ========================================================================
    // 통계 / 도움말
    // ========================================================================

    pub fn statistics(&self) -> CommandStatistics {
        let commands = self.snapshot();
        let mut stats = CommandStatistics {
            total_commands: commands.len(),
            ..Default::default()
        };

        let mut usage: Vec<(String, u64)> = Vec::with_capacity(commands.len());

        for (name, entry) in commands.iter() {
            *stats
                .by_category
                .entry(entry.command.metadata.category.clone())
                .or_default() += 1;
            if let Some(owner) = &entry.owner {
                *stats.by_plugin.entry(owner.clone()).or_default() += 1;
            }

            let count = entry.usage.load(Ordering::Relaxed);
            stats.total_executions += count;
            stats.total_duration_ms += entry.total_duration_ms.load(Ordering::Relaxed);
            if count > 0 {
                usage.push((name.clone(), count));
            }
        }

        usage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        usage.truncate(MOST_USED_LIMIT);
        stats.most_used = usage;

        stats
    }

    /// 마크다운 도움말 생성 (카테고리 지정 시 해당 카테고리만)
    pub fn generate_help_text(&self, category: Option<&str>) -> String {
        let mut help = String::from("# Available Commands\n\n");

        let categories: Vec<String> = match category {
            Some(c) => vec![c.to_string()],
            None => self.categories(),
        };

        for category in categories {
            let commands = self.by_category(&category);
            if commands.is_empty() {
                continue;
            }

            help.push_str(&format!("## {}\n\n", category));

            for command in commands {
                let meta = &command.metadata;
                help.push_str(&format!("### {}\n", meta.name));
                if !meta.description.is_empty() {
                    help.push_str(&format!("{}\n\n", meta.description));
                }
                help.push_str(&format!("**Usage:** `{}`\n\n", meta.usage));

                if !meta.aliases.is_empty() {
                    help.push_str(&format!("**Aliases:** {}\n\n", meta.aliases.join(", ")));
                }

                if !command.arguments.is_empty() {
                    help.push_str("**Arguments:**\n");
                    for arg in &command.arguments {
                        let required = if arg.required { " (required)" } else { "" };
                        let default = arg
                            .default
                            .as_ref()
                            .map(|d| format!(" [default: {}]", d))
                            .unwrap_or_default();
                        help.push_str(&format!("- `{}`: {}{}{}\n", arg.name, arg.description, required, default));
                    }
                    help.push('\n');
                }

                if !meta.examples.is_empty() {
                    help.push_str("**Examples:**\n");
                    for example in &meta.examples {
                        help.push_str(&format!("- `{}`\n", example));
                    }
                    help.push('\n');
                }
            }
        }

        help
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 입력 줄을 명령어 이름과 컨텍스트로 분리
fn parse_command_line(input: &str, working_dir: PathBuf) -> Result<(String, CommandContext)> {
    let words = shlex::split(input)
        .ok_or_else(|| Error::Validation(format!("Unbalanced quotes in command line: {}", input)))?;

    let mut words = words.into_iter();
    let name = match words.next() {
        Some(first) => first.trim_start_matches('/').to_string(),
        None => return Err(Error::Validation("Empty command line".into())),
    };

    let mut ctx = CommandContext::new(working_dir);
    let mut positional_only = false;

    for word in words {
        if positional_only {
            ctx.args.push(word);
        } else if word == "--" {
            positional_only = true;
        } else if let Some(option) = word.strip_prefix("--") {
            match option.split_once('=') {
                Some((key, value)) => ctx.options.insert(key.to_string(), value.to_string()),
                None => ctx.options.insert(option.to_string(), "true".to_string()),
            };
        } else if word.len() > 1 && word.starts_with('-') && !word[1..].starts_with(|c: char| c.is_ascii_digit()) {
            ctx.options.insert(word[1..].to_string(), "true".to_string());
        } else {
            ctx.args.push(word);
        }
    }

    Ok((name, ctx))
}
