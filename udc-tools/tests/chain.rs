#[cfg(test)]
mod chain_tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use udc_executor::{CommandOutput, CommandPolicy, CommandRunner, ExecutorError};
    use udc_tools::{ChainExecutor, ChainResult};

    /// Scripted runner: `false` fails, `boom` errors, everything else echoes.
    #[derive(Default)]
    struct ScriptedRunner {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run_shell(
            &self,
            command: &str,
            _timeout: Duration,
        ) -> Result<CommandOutput, ExecutorError> {
            self.seen.lock().push(command.to_string());
            if command.starts_with('#') {
                let failing = command.contains("false");
                return Ok(CommandOutput {
                    exit_code: if failing { 1 } else { 0 },
                    stdout: String::new(),
                    stderr: String::new(),
                });
            }
            match command {
                "false" => Ok(CommandOutput {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: "failed".to_string(),
                }),
                "boom" => Err(ExecutorError::Timeout(10)),
                other => Ok(CommandOutput {
                    exit_code: 0,
                    stdout: other.trim_start_matches("echo ").to_string(),
                    stderr: String::new(),
                }),
            }
        }

        async fn run_program(
            &self,
            program: &str,
            _args: &[String],
            timeout: Duration,
        ) -> Result<CommandOutput, ExecutorError> {
            self.run_shell(program, timeout).await
        }
    }

    struct DenyContaining(&'static str);

    impl CommandPolicy for DenyContaining {
        fn is_command_allowed(&self, command: &str) -> bool {
            !command.contains(self.0)
        }
    }

    fn executor(deny: &'static str) -> (ChainExecutor, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::default());
        let chain = ChainExecutor::new(runner.clone(), Arc::new(DenyContaining(deny)));
        (chain, runner)
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    const LIMIT: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_all_steps_succeed() {
        let (chain, _) = executor("sudo");
        let results = chain.run(&commands(&["echo a", "echo b"]), LIMIT).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[1].output, "b");
    }

    #[tokio::test]
    async fn test_stops_after_first_failure() {
        let (chain, runner) = executor("sudo");
        let results = chain
            .run(&commands(&["echo a", "false", "echo b"]), LIMIT)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert_eq!(
            results[1],
            ChainResult {
                command: "false".to_string(),
                success: false,
                output: "failed".to_string(),
                exit_code: 1,
            }
        );
        assert_eq!(runner.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_comment_does_not_stop_chain() {
        let (chain, _) = executor("sudo");
        let results = chain
            .run(&commands(&["echo a", "# false", "echo b"]), LIMIT)
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[1].success);
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn test_blocked_first_step_halts_chain() {
        let (chain, runner) = executor("sudo");
        let results = chain
            .run(&commands(&["sudo reboot", "echo a"]), LIMIT)
            .await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert_eq!(results[0].output, "Command not allowed: sudo reboot");
        assert_eq!(results[0].exit_code, 1);
        assert!(runner.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_comment_still_halts() {
        let (chain, _) = executor("sudo");
        let results = chain
            .run(&commands(&["echo a", "# sudo later", "echo b"]), LIMIT)
            .await;
        assert_eq!(results.len(), 2);
        assert!(!results[1].success);
    }

    #[tokio::test]
    async fn test_runner_error_recorded_and_stops() {
        let (chain, _) = executor("sudo");
        let results = chain.run(&commands(&["boom", "echo a"]), LIMIT).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].exit_code, 1);
        assert!(results[0].output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let (chain, _) = executor("sudo");
        assert!(chain.run(&[], LIMIT).await.is_empty());
    }

    #[tokio::test]
    async fn test_result_serializes_exit_code_camel_case() {
        let (chain, _) = executor("sudo");
        let results = chain.run(&commands(&["echo a"]), LIMIT).await;
        let value = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(value["exitCode"], 0);
    }
}
