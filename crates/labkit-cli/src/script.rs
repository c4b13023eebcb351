//! Action scripts
//!
//! A script is a list of actions separated by commas or newlines:
//!
//! ```text
//! tool:test_tube
//! add:fe, add:hcl
//! # comments and blank lines are skipped
//! observe
//! heat
//! ```

use labkit_engine::Action;

/// Script parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// Token is not a known action
    #[error("line {line}: unknown action '{token}' (expected tool:<id>, add:<id>, heat or observe)")]
    UnknownAction {
        /// 1-based line
        line: usize,
        /// Offending token
        token: String,
    },

    /// `tool:` or `add:` without an id
    #[error("line {line}: '{token}' is missing an id")]
    MissingId {
        /// 1-based line
        line: usize,
        /// Offending token
        token: String,
    },

    /// Answer list entry is not an option index
    #[error("invalid answer '{0}', expected a zero-based option index")]
    InvalidAnswer(String),
}

/// Parse an action script
///
/// # Errors
/// The first malformed token.
pub fn parse_script(script: &str) -> Result<Vec<Action>, ScriptError> {
    let mut actions = Vec::new();
    for (number, line) in script.lines().enumerate() {
        let line_no = number + 1;
        let content = line.split('#').next().unwrap_or_default();
        for token in content.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            actions.push(parse_token(token, line_no)?);
        }
    }
    Ok(actions)
}

fn parse_token(token: &str, line: usize) -> Result<Action, ScriptError> {
    let (verb, id) = match token.split_once(':') {
        Some((verb, id)) => (verb.trim(), Some(id.trim())),
        None => (token, None),
    };
    let require_id = || match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ScriptError::MissingId {
            line,
            token: token.to_string(),
        }),
    };

    match (verb.to_ascii_lowercase().as_str(), id) {
        ("tool", _) => Ok(Action::select_tool(require_id()?)),
        ("add", _) => Ok(Action::add_resource(require_id()?)),
        ("heat", None) => Ok(Action::ApplyHeat),
        ("observe", None) => Ok(Action::Observe),
        _ => Err(ScriptError::UnknownAction {
            line,
            token: token.to_string(),
        }),
    }
}

/// Parse a comma separated answer list such as `1,0,2`
///
/// # Errors
/// [`ScriptError::InvalidAnswer`] for anything but unsigned integers.
pub fn parse_answers(answers: &str) -> Result<Vec<usize>, ScriptError> {
    answers
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| a.parse().map_err(|_| ScriptError::InvalidAnswer(a.to_string())))
        .collect()
}
