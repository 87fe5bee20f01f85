//! Wall-clock tool.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use super::{Tool, ToolContext};

/// Report the current UTC date and time.
pub struct CurrentTime;

#[async_trait]
impl Tool for CurrentTime {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in UTC (RFC 3339). The input is ignored."
    }

    async fn execute(&self, _ctx: &ToolContext, _input: &str) -> anyhow::Result<String> {
        Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
