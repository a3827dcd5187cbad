//! Command validation for external tool invocations.

use crate::error::{Error, Result};

/// Validates shell commands before they are handed to `sh -c`.
///
/// The default validator allows shell features, since gate commands are
/// usually pipelines. Strict mode rejects them for configurations that must
/// run a single program.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    allow_shell: bool,
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self { allow_shell: true }
    }
}

impl CommandValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator that disallows shell features.
    pub fn strict() -> Self {
        Self { allow_shell: false }
    }

    /// Validates the command configured for `gate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolInvocation`] if the command is empty or, in
    /// strict mode, uses shell features.
    pub fn validate(&self, gate: &str, command: &str) -> Result<()> {
        if command.trim().is_empty() {
            return Err(Error::ToolInvocation {
                gate: gate.to_string(),
                message: "Command cannot be empty".to_string(),
            });
        }

        if !self.allow_shell
            && (command.contains(';')
                || command.contains("&&")
                || command.contains("||")
                || command.contains('|')
                || command.contains('`')
                || command.contains('$'))
        {
            return Err(Error::ToolInvocation {
                gate: gate.to_string(),
                message: format!(
                    "Command contains shell features, which strict mode forbids: {}",
                    command
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandValidator::new().validate("test", "   ").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_strict_rejects_pipelines() {
        assert!(CommandValidator::new().validate("lint", "lint | tee out").is_ok());
        assert!(CommandValidator::strict().validate("lint", "lint | tee out").is_err());
        assert!(CommandValidator::strict().validate("lint", "lint --json").is_ok());
    }
}
