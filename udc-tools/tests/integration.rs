#[cfg(all(test, unix))]
mod integration_tests {
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;
    use udc_executor::{CommandBlocklist, ShellRunner};
    use udc_policy::UnlockGate;
    use udc_tools::os_capabilities::Platform;
    use udc_tools::*;

    struct Server {
        dispatcher: Dispatcher,
        code_file: PathBuf,
        workspace: TempDir,
        _gate_dir: TempDir,
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn server() -> Server {
        server_on(Platform::current())
    }

    fn server_on(platform: Platform) -> Server {
        init_tracing();
        let gate_dir = tempfile::tempdir().unwrap();
        let workspace = tempfile::tempdir().unwrap();
        let code_file = gate_dir.path().join("code");

        let paths = PathGuard::new([workspace.path().to_string_lossy()]).unwrap();
        let handler = SystemHandler::new(
            Arc::new(ShellRunner::new()),
            Arc::new(CommandBlocklist::default()),
            paths,
        )
        .with_platform(platform);
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::builtin()),
            Arc::new(UnlockGate::new(&code_file)),
            Arc::new(handler),
        )
        .with_default_timeout_ms(5_000);

        Server {
            dispatcher,
            code_file,
            workspace,
            _gate_dir: gate_dir,
        }
    }

    fn path_in(server: &Server, name: &str) -> String {
        server.workspace.path().join(name).to_string_lossy().to_string()
    }

    async fn unlock(server: &Server) {
        assert!(server.dispatcher.invoke("request_unlock_code", json!({})).await.ok);
        let content = std::fs::read_to_string(&server.code_file).unwrap();
        let code: String = content
            .lines()
            .next()
            .unwrap()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let envelope = server
            .dispatcher
            .invoke("verify_unlock_code", json!({ "code": code }))
            .await;
        assert!(envelope.ok, "{envelope:?}");
    }

    fn payload(envelope: Envelope) -> Value {
        assert!(envelope.ok, "{envelope:?}");
        envelope.payload.unwrap()
    }

    #[tokio::test]
    async fn test_file_round_trip_through_dispatcher() {
        let server = server();
        let file = path_in(&server, "notes/today.txt");

        payload(
            server
                .dispatcher
                .invoke("write_file", json!({ "path": file, "content": "hello" }))
                .await,
        );
        let content = payload(
            server
                .dispatcher
                .invoke("read_file", json!({ "path": file }))
                .await,
        );
        assert_eq!(content, json!("hello"));

        let listing = payload(
            server
                .dispatcher
                .invoke("list_directory", json!({ "path": path_in(&server, "notes") }))
                .await,
        );
        assert_eq!(listing, json!("[FILE] today.txt"));
    }

    #[tokio::test]
    async fn test_read_multiple_files_reports_errors_inline() {
        let server = server();
        std::fs::write(server.workspace.path().join("a.txt"), "A").unwrap();

        let results = payload(
            server
                .dispatcher
                .invoke(
                    "read_multiple_files",
                    json!({ "paths": [path_in(&server, "a.txt"), path_in(&server, "missing.txt")] }),
                )
                .await,
        );
        assert_eq!(results[0]["content"], "A");
        assert!(results[1]["error"].is_string());
    }

    #[tokio::test]
    async fn test_paths_outside_allowed_directories_are_refused() {
        let server = server();
        let envelope = server
            .dispatcher
            .invoke("read_file", json!({ "path": "/etc/hostname" }))
            .await;
        assert!(!envelope.ok);
        assert!(envelope.error.unwrap().contains("outside the allowed directories"));
    }

    #[tokio::test]
    async fn test_execute_command_requires_unlock() {
        let server = server();
        let locked = server
            .dispatcher
            .invoke("execute_command", json!({ "command": "echo hi" }))
            .await;
        assert!(!locked.ok);

        unlock(&server).await;
        let result = payload(
            server
                .dispatcher
                .invoke("execute_command", json!({ "command": "echo hi" }))
                .await,
        );
        assert_eq!(result["success"], true);
        assert_eq!(result["output"].as_str().unwrap().trim(), "hi");
        assert_eq!(result["exitCode"], 0);
    }

    #[tokio::test]
    async fn test_blocklist_tools() {
        let server = server();
        unlock(&server).await;

        payload(
            server
                .dispatcher
                .invoke("block_command", json!({ "command": "whoami" }))
                .await,
        );
        let refused = server
            .dispatcher
            .invoke("execute_command", json!({ "command": "whoami" }))
            .await;
        assert_eq!(refused.error.as_deref(), Some("Command not allowed: whoami"));

        let listed = payload(
            server
                .dispatcher
                .invoke("list_blocked_commands", json!({}))
                .await,
        );
        assert!(listed["commands"]
            .as_array()
            .unwrap()
            .contains(&json!("whoami")));

        payload(
            server
                .dispatcher
                .invoke("configure_security", json!({ "action": "disable_blocking" }))
                .await,
        );
        let allowed = server
            .dispatcher
            .invoke("execute_command", json!({ "command": "whoami" }))
            .await;
        assert!(allowed.ok);
    }

    #[tokio::test]
    async fn test_multi_word_block_entry_refuses_matching_commands() {
        let server = server();
        unlock(&server).await;
        let target = path_in(&server, "keep");
        std::fs::create_dir(&target).unwrap();

        payload(
            server
                .dispatcher
                .invoke("block_command", json!({ "command": "rm -rf" }))
                .await,
        );
        let refused = server
            .dispatcher
            .invoke("execute_command", json!({ "command": format!("rm -rf {target}") }))
            .await;
        assert!(!refused.ok);
        assert!(Path::new(&target).exists());

        let chain = payload(
            server
                .dispatcher
                .invoke(
                    "execute_command_chain",
                    json!({ "commands": ["echo start", format!("X=1 rm -rf {target}")] }),
                )
                .await,
        );
        assert_eq!(chain[1]["success"], false);
        assert!(Path::new(&target).exists());
    }

    #[tokio::test]
    async fn test_assignments_and_substitutions_do_not_bypass_blocklist() {
        let server = server();
        unlock(&server).await;

        for command in ["FOO=1 sudo -n id", "echo $(sudo -n id)", "echo `sudo -n id`"] {
            let envelope = server
                .dispatcher
                .invoke("execute_command", json!({ "command": command }))
                .await;
            assert!(!envelope.ok, "{command} was allowed");
            assert!(envelope.error.unwrap().starts_with("Command not allowed"));
        }
    }

    #[tokio::test]
    async fn test_manage_service_unsupported_on_macos() {
        let server = server_on(Platform::MacOs);
        unlock(&server).await;
        let envelope = server
            .dispatcher
            .invoke(
                "manage_service",
                json!({ "serviceName": "ssh", "action": "restart" }),
            )
            .await;
        assert!(!envelope.ok);
        assert!(envelope.error.unwrap().starts_with("Not supported on this platform"));
    }

    #[tokio::test]
    async fn test_hibernate_unsupported_on_macos() {
        let server = server_on(Platform::MacOs);
        unlock(&server).await;
        let envelope = server
            .dispatcher
            .invoke("system_power_action", json!({ "action": "hibernate" }))
            .await;
        assert!(!envelope.ok);
        assert!(envelope.error.unwrap().starts_with("Not supported on this platform"));
    }

    #[tokio::test]
    async fn test_real_command_chain() {
        let server = server();
        unlock(&server).await;

        let results = payload(
            server
                .dispatcher
                .invoke(
                    "execute_command_chain",
                    json!({ "commands": ["echo a", "# comment", "false", "echo never"] }),
                )
                .await,
        );
        let results = results.as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1]["success"], true);
        assert_eq!(results[2]["exitCode"], 1);
    }

    #[tokio::test]
    async fn test_chain_timeout_recorded_as_failure() {
        let server = server();
        unlock(&server).await;

        let results = payload(
            server
                .dispatcher
                .invoke(
                    "execute_command_chain",
                    json!({ "commands": ["sleep 5", "echo never"], "timeout_ms": 200 }),
                )
                .await,
        );
        let results = results.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["exitCode"], 1);
        assert!(results[0]["output"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_check_port_on_closed_port() {
        let server = server();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let status = payload(
            server
                .dispatcher
                .invoke("check_port", json!({ "port": port, "host": "127.0.0.1" }))
                .await,
        );
        assert_eq!(status["open"], false);
    }

    #[tokio::test]
    async fn test_change_ownership_requires_user_or_group() {
        let server = server();
        unlock(&server).await;
        let file = path_in(&server, "owned.txt");
        std::fs::write(Path::new(&file), "").unwrap();

        let envelope = server
            .dispatcher
            .invoke("change_file_ownership", json!({ "path": file }))
            .await;
        assert!(!envelope.ok);
        assert!(envelope.error.unwrap().contains("user"));
    }

    #[tokio::test]
    async fn test_registry_unsupported_off_windows() {
        let server = server();
        unlock(&server).await;
        let envelope = server
            .dispatcher
            .invoke(
                "registry_operation",
                json!({ "action": "read", "key": "HKCU\\Software" }),
            )
            .await;
        assert!(!envelope.ok);
        assert!(envelope.error.unwrap().starts_with("Not supported on this platform"));
    }

    #[tokio::test]
    async fn test_list_allowed_directories() {
        let server = server();
        let listed = payload(
            server
                .dispatcher
                .invoke("list_allowed_directories", json!({}))
                .await,
        );
        assert_eq!(listed["restricted"], true);
        assert_eq!(listed["directories"].as_array().unwrap().len(), 1);
    }
}
