//! Console command parsing
//!
//! Each line stands in for one chat interaction: a `/start`-style command
//! or a button press on the anchor message.

use rota_core::{AnchorId, OperatorId, ScopeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a roster session on behalf of `operator`, in `scope` or the
    /// node's staff scope
    Start {
        operator: OperatorId,
        scope: Option<ScopeId>,
    },
    /// Press "join" on an anchor
    Join { anchor: AnchorId, operator: OperatorId },
    /// Press "leave" on an anchor
    Leave { anchor: AnchorId, operator: OperatorId },
    /// Record an operator's display name
    Name { operator: OperatorId, name: String },
    /// Print the live session as JSON
    Status,
    Help,
    Quit,
}

pub const USAGE: &str = "\
Commands:
  start <operator> [scope]        - Open a roster session
  join <anchor> <operator>        - Join the session on an anchor
  leave <anchor> <operator>       - Leave the session on an anchor
  name <operator> <display name>  - Set an operator's display name
  status                          - Show the live session
  quit                            - Exit";

fn parse_id(raw: Option<&str>, what: &str) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| format!("Missing {}", what))?;
    raw.parse::<i64>()
        .map_err(|_| format!("Invalid {} '{}' (must be integer)", what, raw))
}

impl Command {
    /// Parse one input line; `Ok(None)` for blank lines
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };

        let command = match verb {
            "start" => {
                let operator = parse_id(parts.next(), "operator")?;
                let scope = match parts.next() {
                    Some(raw) => Some(parse_id(Some(raw), "scope")?),
                    None => None,
                };
                Command::Start { operator, scope }
            }
            "join" => Command::Join {
                anchor: parse_id(parts.next(), "anchor")?,
                operator: parse_id(parts.next(), "operator")?,
            },
            "leave" => Command::Leave {
                anchor: parse_id(parts.next(), "anchor")?,
                operator: parse_id(parts.next(), "operator")?,
            },
            "name" => {
                let operator = parse_id(parts.next(), "operator")?;
                let name = parts.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err("Missing display name".to_string());
                }
                Command::Name { operator, name }
            }
            "status" => Command::Status,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Try: help", other)),
        };

        Ok(Some(command))
    }
}
