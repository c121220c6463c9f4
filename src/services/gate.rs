//! Override gate in front of compile, check and run
//!
//! The decision is a pure function of the detected overrides, the
//! `safety.check_builtin_overrides` setting and a prompt. Persisting a
//! "remember" answer is left to the caller.

use std::io::{BufRead, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::models::shadowing::Override;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Nothing to ask about
    Proceed,
    ProceedOnce,
    /// Proceed and disable the check for this project
    ProceedAndRemember,
    Abort,
}

impl GateDecision {
    pub fn allows(self) -> bool {
        !matches!(self, Self::Abort)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    ProceedOnce,
    ProceedAndRemember,
    Abort,
}

pub trait OverridePrompt {
    fn choose(&self, overrides: &[Override]) -> PromptChoice;
}

pub fn evaluate(
    overrides: &[Override],
    check_enabled: bool,
    prompt: &dyn OverridePrompt,
) -> GateDecision {
    if !check_enabled || overrides.is_empty() {
        return GateDecision::Proceed;
    }

    tracing::debug!("{} built-in overrides found, prompting", overrides.len());
    match prompt.choose(overrides) {
        PromptChoice::ProceedOnce => GateDecision::ProceedOnce,
        PromptChoice::ProceedAndRemember => GateDecision::ProceedAndRemember,
        PromptChoice::Abort => GateDecision::Abort,
    }
}

/// How a gated command answers when overrides are found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverridePolicy {
    Ask,
    Proceed,
    Remember,
    Abort,
}

impl FromStr for OverridePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "proceed" | "once" => Ok(Self::Proceed),
            "remember" => Ok(Self::Remember),
            "abort" => Ok(Self::Abort),
            _ => Err(format!(
                "Unknown override policy: {} (expected ask, proceed, remember or abort)",
                s
            )),
        }
    }
}

impl std::fmt::Display for OverridePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ask => write!(f, "ask"),
            Self::Proceed => write!(f, "proceed"),
            Self::Remember => write!(f, "remember"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Answers every prompt the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(pub PromptChoice);

impl FixedPrompt {
    /// `None` for [`OverridePolicy::Ask`], which needs an interactive prompt
    pub fn from_policy(policy: OverridePolicy) -> Option<Self> {
        match policy {
            OverridePolicy::Ask => None,
            OverridePolicy::Proceed => Some(Self(PromptChoice::ProceedOnce)),
            OverridePolicy::Remember => Some(Self(PromptChoice::ProceedAndRemember)),
            OverridePolicy::Abort => Some(Self(PromptChoice::Abort)),
        }
    }
}

impl OverridePrompt for FixedPrompt {
    fn choose(&self, _overrides: &[Override]) -> PromptChoice {
        self.0
    }
}

/// Interactive prompt on stderr/stdin
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn parse_answer(answer: &str) -> PromptChoice {
        match answer.trim().to_ascii_lowercase().as_str() {
            "p" | "proceed" | "y" | "yes" => PromptChoice::ProceedOnce,
            "r" | "remember" => PromptChoice::ProceedAndRemember,
            _ => PromptChoice::Abort,
        }
    }

    fn ask(
        overrides: &[Override],
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> std::io::Result<PromptChoice> {
        writeln!(output, "Built-in names are redefined in this file:")?;
        for item in overrides {
            writeln!(output, "  {}", item)?;
        }
        write!(output, "[p]roceed once, proceed and [r]emember, or [a]bort? ")?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        Ok(Self::parse_answer(&answer))
    }
}

impl OverridePrompt for TerminalPrompt {
    fn choose(&self, overrides: &[Override]) -> PromptChoice {
        let stdin = std::io::stdin();
        let mut stderr = std::io::stderr();
        Self::ask(overrides, &mut stdin.lock(), &mut stderr).unwrap_or_else(|e| {
            tracing::warn!("Override prompt failed: {}", e);
            PromptChoice::Abort
        })
    }
}
