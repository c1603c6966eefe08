//! 单个 agent 巡检
//!
//! 连接 agent 的 pi-socket，读取 init_state 并合并 roster 中的身份信息。
//! 任何输入都不会让这里返回错误：失败只体现在记录的 `error` 字段上。

use std::time::Duration;

use crate::client::Channel;
use crate::config::InspectConfig;
use crate::sanitize::decode;
use crate::summary::summarize;
use crate::types::{AgentSummary, Endpoint, FailureReason, Outcome};

/// 巡检单个 agent
pub async fn inspect<C: Channel>(
    channel: &C,
    endpoint: &Endpoint,
    config: &InspectConfig,
) -> AgentSummary {
    let url = config.agent_url(endpoint.port);
    inspect_url(channel, endpoint, &url, config.timeout).await
}

/// 巡检单个 agent（指定地址）
pub async fn inspect_url<C: Channel>(
    channel: &C,
    endpoint: &Endpoint,
    url: &str,
    timeout: Duration,
) -> AgentSummary {
    let outcome = match channel.receive_one(url, timeout).await {
        None => Outcome::Failed {
            error: FailureReason::NoResponse,
        },
        Some(raw) => match summarize(decode(&raw)) {
            Ok(summary) => Outcome::Summarized(summary),
            Err(failure) => Outcome::Failed {
                error: failure.into(),
            },
        },
    };

    if let Outcome::Failed { error } = &outcome {
        tracing::debug!("☠️ agent {} (:{}) {}", endpoint.id, endpoint.port, error);
    }

    AgentSummary {
        id: endpoint.id.clone(),
        machine: endpoint.machine.clone(),
        port: endpoint.port,
        working_directory: endpoint.working_directory.clone(),
        project_name: extract_project_name(&endpoint.working_directory).to_string(),
        status_tag: endpoint.status_tag.clone(),
        outcome,
    }
}

/// 从路径中提取项目名（最后一段）
pub fn extract_project_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// 按 URL 返回预置载荷的 Channel
    struct FakeChannel {
        payloads: HashMap<String, String>,
    }

    impl Channel for FakeChannel {
        async fn receive_one(&self, url: &str, _timeout: Duration) -> Option<String> {
            self.payloads.get(url).cloned()
        }
    }

    fn endpoint(port: u16, cwd: &str) -> Endpoint {
        Endpoint {
            id: format!("agent-{}", port),
            machine: String::new(),
            port,
            working_directory: cwd.to_string(),
            status_tag: "active".to_string(),
        }
    }

    fn channel(entries: &[(u16, &str)]) -> FakeChannel {
        FakeChannel {
            payloads: entries
                .iter()
                .map(|(port, body)| (format!("ws://localhost:{}", port), body.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_extract_project_name() {
        assert_eq!(extract_project_name("/home/x/proj"), "proj");
        assert_eq!(extract_project_name("/home/x/proj/"), "proj");
        assert_eq!(extract_project_name("proj"), "proj");
        assert_eq!(extract_project_name(""), "");
        assert_eq!(extract_project_name("/"), "/");
    }

    #[tokio::test]
    async fn test_inspect_no_response() {
        let config = InspectConfig::default();
        let summary = inspect(&channel(&[]), &endpoint(9001, "/home/x/proj"), &config).await;
        assert_eq!(summary.error(), Some(FailureReason::NoResponse));
        assert_eq!(summary.id, "agent-9001");
        assert_eq!(summary.project_name, "proj");
        assert_eq!(summary.status_tag, "active");
    }

    #[tokio::test]
    async fn test_inspect_unparseable() {
        let config = InspectConfig::default();
        let fake = channel(&[(9002, r#"{"messages":[{"role""#)]);
        let summary = inspect(&fake, &endpoint(9002, "/w"), &config).await;
        assert_eq!(summary.error(), Some(FailureReason::Unparseable));
        assert!(summary.summary().is_none());
    }

    #[tokio::test]
    async fn test_inspect_summarized() {
        let config = InspectConfig::default();
        let fake = channel(&[(
            9003,
            r#"{"type":"init_state","messages":[{"role":"user","content":"fix the flaky test"}],"streaming":true,"tools":[]}"#,
        )]);
        let summary = inspect(&fake, &endpoint(9003, "/home/x/api"), &config).await;
        assert!(summary.error().is_none());
        let convo = summary.summary().unwrap();
        assert_eq!(convo.total_messages, 1);
        assert_eq!(convo.last_user_text, "fix the flaky test");
        assert!(convo.streaming);
        assert_eq!(summary.project_name, "api");
    }

    #[tokio::test]
    async fn test_inspect_uses_configured_host() {
        let mut config = InspectConfig::default();
        config.host = "10.0.0.5".to_string();
        let fake = FakeChannel {
            payloads: HashMap::from([("ws://10.0.0.5:9004".to_string(), "{}".to_string())]),
        };
        let summary = inspect(&fake, &endpoint(9004, "/w"), &config).await;
        assert!(summary.summary().is_some());
    }
}
