use super::Render;
use crate::error::{MonitorError, Result};
use crate::system::snapshot::UtilizationSnapshot;

#[derive(Debug, Clone)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Render for JsonRenderer {
    fn render(&self, snapshot: &UtilizationSnapshot) -> Result<String> {
        let mut out = if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
        .map_err(|e| MonitorError::Render(format!("json encoding failed: {e}")))?;
        out.push('\n');
        Ok(out)
    }
}
