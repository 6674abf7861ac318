//! Command Execution Tool
//!
//! Runs a system command to completion and reports its output. The command
//! is executed directly with an argv list; there is no shell interpolation.

use async_trait::async_trait;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

/// Tool that executes a system command and captures its output
pub struct ExecuteCommandTool;

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_command".into(),
            description: "Execute a system command (e.g. 'git' with args ['status']) and return its output or an error message.".into(),
            parameters: vec![
                ParameterSchema::required_string("command", "The program to run"),
                ParameterSchema {
                    name: "args".into(),
                    param_type: "array".into(),
                    description: "Arguments passed to the program, in order".into(),
                    required: false,
                    enum_values: None,
                },
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let command = call.str_arg("command").unwrap_or_default();
        let args: Vec<String> = call
            .arguments
            .get("args")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        tracing::info!(%command, ?args, "executing command");

        let output = tokio::process::Command::new(command)
            .args(&args)
            .output()
            .await;

        Ok(match output {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                format!("COMMAND OUTPUT:\n{stdout}\nCOMMAND ERROR (if any):\n{stderr}")
            }
            Ok(output) => {
                let code = output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string());
                let stderr = String::from_utf8_lossy(&output.stderr);
                format!("ERROR: Command failed with exit code {code}. Stderr: {stderr}")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("ERROR: Command '{command}' not found on the system path.")
            }
            Err(e) => {
                format!("ERROR: An unexpected error occurred while running command: {e}")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn call(command: &str, args: &[&str]) -> ToolCall {
        let mut map: HashMap<String, serde_json::Value> = HashMap::new();
        map.insert("command".into(), serde_json::json!(command));
        map.insert("args".into(), serde_json::json!(args));
        ToolCall::new("execute_command", map)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_of_a_successful_command() {
        let result = ExecuteCommandTool
            .execute(&call("echo", &["hello"]))
            .await
            .unwrap();

        assert!(result.starts_with("COMMAND OUTPUT:"), "{result}");
        assert!(result.contains("hello"));
    }

    #[tokio::test]
    async fn unknown_binary_is_reported_distinctly() {
        let result = ExecuteCommandTool
            .execute(&call("definitely-not-a-binary-4242", &[]))
            .await
            .unwrap();

        assert_eq!(
            result,
            "ERROR: Command 'definitely-not-a-binary-4242' not found on the system path."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_the_code() {
        let result = ExecuteCommandTool
            .execute(&call("false", &[]))
            .await
            .unwrap();

        assert!(result.starts_with("ERROR: Command failed with exit code 1"), "{result}");
    }
}
