//! Text-generation port and the command-backed model client.
//!
//! The crate never talks to a model provider directly. Generation goes
//! through [`DescriptionModel`]; the shipped implementation delegates to a
//! user-configured command that reads a JSON request on stdin and writes the
//! description on stdout. Any tool works: a local model runner, a cloud CLI,
//! or a fixture script in tests.
use crate::aspect::Comment;
use crate::entity::EntityKey;
use crate::error::{Result, ScribeError};
use serde::Serialize;
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

/// Environment variable holding the model command line.
pub const LM_COMMAND_ENV: &str = "DSCRIBE_LM_COMMAND";

/// Everything the model is given about one entity.
#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub negative_examples: Vec<&'a str>,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(
        entity: &'a EntityKey,
        document_uri: Option<&'a str>,
        comments: &'a [Comment],
        negative_examples: &'a [Comment],
    ) -> Self {
        GenerationRequest {
            entity: entity.table_fqn(),
            column: entity.column.as_deref(),
            document_uri,
            comments: comments.iter().map(|comment| comment.text.as_str()).collect(),
            negative_examples: negative_examples
                .iter()
                .map(|comment| comment.text.as_str())
                .collect(),
        }
    }
}

/// External text-generation port.
///
/// Failures are reported as `TransientExternal`; the retry policy decides
/// how many attempts a call gets.
pub trait DescriptionModel {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// Model client backed by a user-configured command.
pub struct CommandModel {
    argv: Vec<String>,
}

impl CommandModel {
    /// Build from `DSCRIBE_LM_COMMAND`, or `None` when the variable is
    /// unset. The program is resolved up front so a missing tool fails at
    /// startup, not mid-batch.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(raw) = env::var(LM_COMMAND_ENV) else {
            return Ok(None);
        };
        let argv = shell_words::split(&raw)
            .map_err(|err| ScribeError::validation(format!("malformed {LM_COMMAND_ENV}: {err}")))?;
        CommandModel::new(argv).map(Some)
    }

    pub fn new(argv: Vec<String>) -> Result<Self> {
        let Some(program) = argv.first() else {
            return Err(ScribeError::validation("model command is empty"));
        };
        which::which(program).map_err(|err| {
            ScribeError::validation(format!("model command {program:?} not found: {err}"))
        })?;
        Ok(CommandModel { argv })
    }
}

impl DescriptionModel for CommandModel {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| ScribeError::transient(format!("serialize model request: {err}")))?;
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|err| ScribeError::transient(format!("spawn model command: {err}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .map_err(|err| ScribeError::transient(format!("write model request: {err}")))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|err| ScribeError::transient(format!("wait for model command: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::transient(format!(
                "model command failed: {}",
                stderr.trim()
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(ScribeError::transient("model returned empty output"));
        }
        Ok(text)
    }
}
